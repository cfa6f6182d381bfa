//! Fee packages, bills and payments.
//!
//! # Invariants
//! - New bills start `pending` with `paidDate = null`.
//! - A paid bill cannot be paid again.
//! - Receipt numbers are best-effort unique (`RCP-<ms tail>-<random>`).

use super::{
    now_rfc3339, number, parse_instant, require_positive, require_text, with_extra, ServiceError,
    ServiceResult,
};
use crate::auth::permission::{Action, Resource};
use crate::auth::session::Session;
use crate::event::{Event, SharedNotifier};
use crate::model::collections::{BILLS, FEE_PACKAGES};
use crate::model::document::{fields_from, Document, Fields};
use crate::store::{DocumentStore, Filter};
use chrono::Utc;
use log::info;
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};

const RECEIPT_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const RECEIPT_SUFFIX_LEN: usize = 5;
const PACKAGE_DURATIONS: &[&str] = &["monthly", "quarterly", "annual"];

/// Bill lifecycle state as stored in the `status` field.
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_PAID: &str = "paid";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewFeePackage {
    pub name: String,
    pub price: f64,
    /// One of `monthly`, `quarterly`, `annual`.
    pub duration: String,
    pub extra: Fields,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewBill {
    pub member_id: String,
    pub amount: f64,
    /// `YYYY-MM-DD` or RFC 3339.
    pub due_date: String,
    pub extra: Fields,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payment {
    pub method: String,
    pub notes: Option<String>,
}

/// Receipt projection of one bill.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub receipt_number: Option<String>,
    pub bill_date: Option<String>,
    pub amount: f64,
    pub status: Option<String>,
    pub paid_date: Option<String>,
    pub member_id: Option<String>,
    pub generated_at: String,
}

impl Receipt {
    pub(crate) fn from_bill(bill: &Document) -> Self {
        let text = |name: &str| bill.str_field(name).map(str::to_string);
        Self {
            receipt_number: text("receiptNumber"),
            bill_date: text("billDate"),
            amount: bill.f64_field("amount").unwrap_or(0.0),
            status: text("status"),
            paid_date: text("paidDate"),
            member_id: text("memberId"),
            generated_at: now_rfc3339(),
        }
    }
}

pub struct BillingService<S: DocumentStore> {
    store: S,
    notifier: SharedNotifier,
}

impl<S: DocumentStore> BillingService<S> {
    pub fn new(store: S, notifier: SharedNotifier) -> Self {
        Self { store, notifier }
    }

    pub fn create_fee_package(
        &self,
        actor: &Session,
        request: NewFeePackage,
    ) -> ServiceResult<Document> {
        actor.require(Action::Create, Resource::FeePackages)?;

        let name = require_text(&request.name, "Package name is required")?;
        let price = require_positive(request.price, "Price must be a positive number")?;
        if !PACKAGE_DURATIONS.contains(&request.duration.as_str()) {
            return Err(ServiceError::validation("Invalid duration"));
        }

        let fields = with_extra(
            fields_from(json!({
                "name": name,
                "price": number(price),
                "duration": request.duration,
                "isActive": true,
            })),
            request.extra,
        );
        let package = self.store.create(FEE_PACKAGES, fields)?;
        info!("event=fee_package_create module=service status=ok package_id={}", package.id);
        Ok(package)
    }

    /// Active packages only.
    pub fn fee_packages(&self, actor: &Session) -> ServiceResult<Vec<Document>> {
        actor.require(Action::Read, Resource::FeePackages)?;
        Ok(self
            .store
            .read_all(FEE_PACKAGES, &Filter::all().field("isActive", true))?)
    }

    pub fn create_bill(&self, actor: &Session, request: NewBill) -> ServiceResult<Document> {
        actor.require(Action::Create, Resource::Bills)?;

        let member_id = require_text(&request.member_id, "Member ID is required")?;
        let amount = require_positive(request.amount, "Amount must be a positive number")?;
        let due_date = require_text(&request.due_date, "Due date is required")?;

        let fields = with_extra(
            fields_from(json!({
                "memberId": member_id,
                "amount": number(amount),
                "dueDate": due_date,
                "billDate": now_rfc3339(),
                "status": STATUS_PENDING,
                "receiptNumber": generate_receipt_number(),
                "paidDate": Value::Null,
            })),
            request.extra,
        );
        let bill = self.store.create(BILLS, fields)?;
        info!(
            "event=bill_create module=service status=ok bill_id={} amount={amount}",
            bill.id
        );
        Ok(bill)
    }

    /// Marks a pending bill as paid.
    ///
    /// # Errors
    /// - `NotFound` for an unknown bill.
    /// - `Validation` when the bill is already paid.
    pub fn record_payment(
        &self,
        actor: &Session,
        bill_id: &str,
        payment: Payment,
    ) -> ServiceResult<Document> {
        actor.require(Action::Update, Resource::Bills)?;

        let bill = self.store.read(BILLS, bill_id)?;
        if bill.str_field("status") == Some(STATUS_PAID) {
            return Err(ServiceError::validation("Bill is already paid"));
        }

        let updated = self.store.update(
            BILLS,
            bill_id,
            fields_from(json!({
                "status": STATUS_PAID,
                "paidDate": now_rfc3339(),
                "paymentMethod": payment.method,
                "paymentNotes": payment.notes,
            })),
        )?;
        info!("event=payment_record module=service status=ok bill_id={bill_id}");
        self.notifier.publish(&Event::PaymentRecorded {
            bill: updated.clone(),
        });
        Ok(updated)
    }

    pub fn generate_receipt(&self, actor: &Session, bill_id: &str) -> ServiceResult<Receipt> {
        actor.require(Action::Read, Resource::Bills)?;
        let bill = self.store.read(BILLS, bill_id)?;
        Ok(Receipt::from_bill(&bill))
    }

    pub fn delete_bill(&self, actor: &Session, bill_id: &str) -> ServiceResult<()> {
        actor.require(Action::Delete, Resource::Bills)?;
        self.store.delete(BILLS, bill_id)?;
        info!("event=bill_delete module=service status=ok bill_id={bill_id}");
        Ok(())
    }

    pub fn member_bills(&self, actor: &Session, member_id: &str) -> ServiceResult<Vec<Document>> {
        actor.require(Action::Read, Resource::Bills)?;
        Ok(self
            .store
            .read_all(BILLS, &Filter::all().field("memberId", member_id))?)
    }

    /// Pending bills whose due date lies in the past.
    ///
    /// Bills with an unparseable due date are never overdue.
    pub fn overdue_bills(&self, actor: &Session) -> ServiceResult<Vec<Document>> {
        actor.require(Action::Read, Resource::Bills)?;
        let now = Utc::now();
        let pending = self
            .store
            .read_all(BILLS, &Filter::all().field("status", STATUS_PENDING))?;
        Ok(pending
            .into_iter()
            .filter(|bill| {
                bill.str_field("dueDate")
                    .and_then(parse_instant)
                    .is_some_and(|due| due < now)
            })
            .collect())
    }
}

/// `RCP-<last four digits of the ms timestamp>-<five base-36 chars>`.
pub fn generate_receipt_number() -> String {
    let millis = Utc::now().timestamp_millis().to_string();
    let tail = &millis[millis.len().saturating_sub(4)..];
    let mut rng = rand::thread_rng();
    let suffix: String = (0..RECEIPT_SUFFIX_LEN)
        .map(|_| char::from(RECEIPT_ALPHABET[rng.gen_range(0..RECEIPT_ALPHABET.len())]))
        .collect();
    format!("RCP-{tail}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::generate_receipt_number;

    #[test]
    fn receipt_number_shape() {
        let receipt = generate_receipt_number();
        let parts: Vec<&str> = receipt.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "RCP");
        assert_eq!(parts[1].len(), 4);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 5);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
}
