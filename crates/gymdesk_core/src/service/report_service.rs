//! Aggregate reports and exports.
//!
//! # Invariants
//! - Reports are read-only; they never mutate the store.
//! - Every ratio over an empty denominator is `0.0`.
//! - `paid_amount + pending_amount + other_amount == total_amount`.

use super::billing_service::{STATUS_PAID, STATUS_PENDING};
use super::member_service::MemberStatus;
use super::{now_rfc3339, parse_instant, percentage, round2, ServiceError, ServiceResult};
use crate::auth::permission::{Action, Resource};
use crate::auth::session::Session;
use crate::model::collections::{BILLS, MEMBERS};
use crate::model::document::Document;
use crate::store::{DocumentStore, Filter};
use chrono::Utc;
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Month bucket for paid bills whose `paidDate` cannot be parsed.
pub const UNKNOWN_MONTH: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberReport {
    pub title: &'static str,
    pub generated_at: String,
    pub total_members: usize,
    pub active_members: usize,
    pub inactive_members: usize,
    pub suspended_members: usize,
    pub members: Option<Vec<Document>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingReport {
    pub title: &'static str,
    pub generated_at: String,
    pub total_bills: usize,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub pending_amount: f64,
    /// Amounts of bills in any status other than paid or pending.
    pub other_amount: f64,
    /// Paid share of the total amount, in percent.
    pub collection_rate: f64,
    pub bills: Option<Vec<Document>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub title: &'static str,
    pub generated_at: String,
    pub total_revenue: f64,
    /// `YYYY-MM` of `paidDate` to summed amount.
    pub monthly_revenue: BTreeMap<String, f64>,
    pub average_monthly_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub title: &'static str,
    pub generated_at: String,
    pub total_members: usize,
    pub active_members: usize,
    pub member_retention_rate: f64,
    pub total_bills: usize,
    pub total_revenue: f64,
    pub bill_payment_rate: f64,
}

pub struct ReportService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> ReportService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn load(&self, actor: &Session, collection: &str) -> ServiceResult<Vec<Document>> {
        actor.require(Action::Read, Resource::Reports)?;
        Ok(self.store.read_all(collection, &Filter::all())?)
    }

    pub fn member_report(&self, actor: &Session, detailed: bool) -> ServiceResult<MemberReport> {
        let members = self.load(actor, MEMBERS)?;
        let with_status = |status: MemberStatus| count_status(&members, status.as_str());
        let report = MemberReport {
            title: "Member Report",
            generated_at: now_rfc3339(),
            total_members: members.len(),
            active_members: with_status(MemberStatus::Active),
            inactive_members: with_status(MemberStatus::Inactive),
            suspended_members: with_status(MemberStatus::Suspended),
            members: detailed.then_some(members),
        };
        info!(
            "event=report_members module=service status=ok total={}",
            report.total_members
        );
        Ok(report)
    }

    pub fn billing_report(&self, actor: &Session, detailed: bool) -> ServiceResult<BillingReport> {
        let bills = self.load(actor, BILLS)?;
        let report = summarize_bills(bills, detailed);
        info!(
            "event=report_billing module=service status=ok total={} collection_rate={}",
            report.total_bills, report.collection_rate
        );
        Ok(report)
    }

    pub fn revenue_report(&self, actor: &Session) -> ServiceResult<RevenueReport> {
        actor.require(Action::Read, Resource::Reports)?;
        let paid = self
            .store
            .read_all(BILLS, &Filter::all().field("status", STATUS_PAID))?;

        let mut monthly_revenue: BTreeMap<String, f64> = BTreeMap::new();
        for bill in &paid {
            let month = bill
                .str_field("paidDate")
                .and_then(parse_instant)
                .map(|paid_at| paid_at.format("%Y-%m").to_string())
                .unwrap_or_else(|| UNKNOWN_MONTH.to_string());
            *monthly_revenue.entry(month).or_default() += amount(bill);
        }

        let total_revenue = paid.iter().map(amount).sum();
        let average_monthly_revenue = if monthly_revenue.is_empty() {
            0.0
        } else {
            round2(monthly_revenue.values().sum::<f64>() / monthly_revenue.len() as f64)
        };

        info!(
            "event=report_revenue module=service status=ok months={}",
            monthly_revenue.len()
        );
        Ok(RevenueReport {
            title: "Revenue Report",
            generated_at: now_rfc3339(),
            total_revenue,
            monthly_revenue,
            average_monthly_revenue,
        })
    }

    pub fn performance_metrics(&self, actor: &Session) -> ServiceResult<PerformanceMetrics> {
        let members = self.load(actor, MEMBERS)?;
        let bills = self.load(actor, BILLS)?;

        let active_members = count_status(&members, MemberStatus::Active.as_str());
        let paid_bills: Vec<&Document> = bills
            .iter()
            .filter(|bill| bill.str_field("status") == Some(STATUS_PAID))
            .collect();

        Ok(PerformanceMetrics {
            title: "Performance Metrics",
            generated_at: now_rfc3339(),
            total_members: members.len(),
            active_members,
            member_retention_rate: percentage(active_members as f64, members.len() as f64),
            total_bills: bills.len(),
            total_revenue: paid_bills.iter().map(|bill| amount(bill)).sum(),
            bill_payment_rate: percentage(paid_bills.len() as f64, bills.len() as f64),
        })
    }

    /// Renders a whole collection as CSV, headers from the first document.
    ///
    /// # Errors
    /// - `Validation` when the collection is empty.
    pub fn export_csv(&self, actor: &Session, collection: &str) -> ServiceResult<String> {
        let documents = self.load(actor, collection)?;
        let rows: Vec<Value> = documents.iter().map(Document::to_value).collect();
        let Some(Value::Object(first)) = rows.first() else {
            return Err(ServiceError::validation("No data to export"));
        };
        let headers: Vec<String> = first.keys().cloned().collect();

        let mut lines = Vec::with_capacity(rows.len() + 1);
        lines.push(
            headers
                .iter()
                .map(|header| csv_cell(header))
                .collect::<Vec<_>>()
                .join(","),
        );
        for row in &rows {
            let cells: Vec<String> = headers
                .iter()
                .map(|header| csv_value(row.get(header)))
                .collect();
            lines.push(cells.join(","));
        }

        info!(
            "event=export_csv module=service status=ok collection={collection} rows={}",
            rows.len()
        );
        Ok(lines.join("\n"))
    }

    /// Pretty-printed JSON array of the collection.
    pub fn export_json(&self, actor: &Session, collection: &str) -> ServiceResult<String> {
        let documents = self.load(actor, collection)?;
        let rendered = serde_json::to_string_pretty(&documents)
            .map_err(|err| ServiceError::validation(format!("failed to render JSON: {err}")))?;
        info!(
            "event=export_json module=service status=ok collection={collection} records={}",
            documents.len()
        );
        Ok(rendered)
    }

    /// Summary counts followed by member and bill row dumps.
    pub fn summary_csv(&self, actor: &Session) -> ServiceResult<String> {
        let members = self.load(actor, MEMBERS)?;
        let bills = self.load(actor, BILLS)?;

        let total_revenue: f64 = bills.iter().map(amount).sum();
        let paid_bills = count_status(&bills, STATUS_PAID);
        let names: HashMap<&str, &str> = members
            .iter()
            .filter_map(|member| Some((member.id.as_str(), member.str_field("name")?)))
            .collect();

        let mut out = String::from("GYM MANAGEMENT MONTHLY REPORT\n");
        out.push_str(&format!(
            "Generated Date,{}\n\n",
            Utc::now().format("%Y-%m-%d")
        ));
        out.push_str("SUMMARY\n");
        out.push_str(&format!("Total Members,{}\n", members.len()));
        out.push_str(&format!("Total Bills,{}\n", bills.len()));
        out.push_str(&format!("Total Revenue,{}\n", format_number(total_revenue)));
        out.push_str(&format!("Paid Bills,{paid_bills}\n\n"));

        out.push_str("MEMBERS\n");
        out.push_str("Name,Email,Phone,Package,Join Date\n");
        for member in &members {
            let row = ["name", "email", "phone", "feePackage", "joinDate"]
                .map(|field| csv_value(member.fields.get(field)));
            out.push_str(&row.join(","));
            out.push('\n');
        }

        out.push_str("\nBILLS\n");
        out.push_str("Member,Amount,Date,Status\n");
        for bill in &bills {
            let member = bill
                .str_field("memberId")
                .and_then(|id| names.get(id).copied())
                .or_else(|| bill.str_field("memberName"))
                .or_else(|| bill.str_field("memberId"))
                .unwrap_or_default();
            let row = [
                csv_cell(member),
                csv_value(bill.fields.get("amount")),
                csv_value(bill.fields.get("billDate")),
                csv_value(bill.fields.get("status")),
            ];
            out.push_str(&row.join(","));
            out.push('\n');
        }

        info!(
            "event=export_summary module=service status=ok members={} bills={}",
            members.len(),
            bills.len()
        );
        Ok(out)
    }
}

/// Pure billing aggregation; exposed for callers holding bills already.
pub fn summarize_bills(bills: Vec<Document>, detailed: bool) -> BillingReport {
    let (mut paid_amount, mut pending_amount, mut other_amount) = (0.0, 0.0, 0.0);
    for bill in &bills {
        let bucket = match bill.str_field("status") {
            Some(STATUS_PAID) => &mut paid_amount,
            Some(STATUS_PENDING) => &mut pending_amount,
            _ => &mut other_amount,
        };
        *bucket += amount(bill);
    }
    let total_amount = paid_amount + pending_amount + other_amount;

    BillingReport {
        title: "Billing Report",
        generated_at: now_rfc3339(),
        total_bills: bills.len(),
        total_amount,
        paid_amount,
        pending_amount,
        other_amount,
        collection_rate: percentage(paid_amount, total_amount),
        bills: detailed.then_some(bills),
    }
}

fn amount(bill: &Document) -> f64 {
    bill.f64_field("amount").unwrap_or(0.0)
}

fn count_status(documents: &[Document], status: &str) -> usize {
    documents
        .iter()
        .filter(|doc| doc.str_field("status") == Some(status))
        .count()
}

fn format_number(value: f64) -> String {
    super::number(value).to_string()
}

/// Quotes text containing a comma, doubling embedded quotes.
pub fn csv_cell(text: &str) -> String {
    if text.contains(',') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn csv_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => csv_cell(text),
        Some(other) => csv_cell(&other.to_string()),
    }
}
