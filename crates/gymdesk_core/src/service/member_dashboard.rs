//! Self-service view for a signed-in member.
//!
//! # Responsibility
//! - Resolve the member record whose `email` equals the session email.
//! - Expose that member's own bills, notifications and profile.
//!
//! # Invariants
//! - Records owned by another member are reported as not found.
//! - Profile updates only touch `phone`, `address` and `emergencyContact`.

use super::billing_service::{Receipt, STATUS_PAID, STATUS_PENDING};
use super::notification_service::mark_read;
use super::{parse_instant, ServiceError, ServiceResult};
use crate::auth::permission::{Action, Resource};
use crate::auth::session::Session;
use crate::event::{Event, SharedNotifier};
use crate::model::collections::{BILLS, MEMBERS, NOTIFICATIONS};
use crate::model::document::{Document, Fields};
use crate::store::{DocumentStore, Filter};
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Reverse;

/// Member fields a member may edit on their own profile.
pub const PROFILE_FIELDS: &[&str] = &["phone", "address", "emergencyContact"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipSummary {
    pub member_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
    pub join_date: Option<String>,
    pub outstanding_bills: usize,
    pub total_outstanding: f64,
    pub unread_notifications: usize,
    pub last_payment: Value,
    pub total_paid: f64,
}

pub struct MemberDashboard<S: DocumentStore> {
    store: S,
    notifier: SharedNotifier,
}

impl<S: DocumentStore> MemberDashboard<S> {
    pub fn new(store: S, notifier: SharedNotifier) -> Self {
        Self { store, notifier }
    }

    /// The member record linked to the session.
    pub fn profile(&self, actor: &Session) -> ServiceResult<Document> {
        actor.require(Action::Read, Resource::Profile)?;
        self.resolve(actor)
    }

    /// Own bills, newest `billDate` first.
    pub fn bills(&self, actor: &Session) -> ServiceResult<Vec<Document>> {
        let member = self.profile(actor)?;
        let mut bills = self
            .store
            .read_all(BILLS, &Filter::all().field("memberId", member.id.as_str()))?;
        bills.sort_by_key(|bill| Reverse(bill.str_field("billDate").and_then(parse_instant)));
        Ok(bills)
    }

    pub fn bill_details(&self, actor: &Session, bill_id: &str) -> ServiceResult<Document> {
        let member = self.profile(actor)?;
        self.owned(BILLS, bill_id, &member)
    }

    /// Receipt for one of the member's paid bills.
    ///
    /// # Errors
    /// - `Validation` when the bill is not paid yet.
    pub fn download_receipt(&self, actor: &Session, bill_id: &str) -> ServiceResult<Receipt> {
        let bill = self.bill_details(actor, bill_id)?;
        if bill.str_field("status") != Some(STATUS_PAID) {
            return Err(ServiceError::validation(
                "Receipt only available for paid bills",
            ));
        }
        info!("event=receipt_download module=service status=ok bill_id={bill_id}");
        Ok(Receipt::from_bill(&bill))
    }

    pub fn outstanding_bills(&self, actor: &Session) -> ServiceResult<Vec<Document>> {
        let member = self.profile(actor)?;
        self.pending_for(&member)
    }

    pub fn total_outstanding(&self, actor: &Session) -> ServiceResult<f64> {
        Ok(sum_amounts(&self.outstanding_bills(actor)?))
    }

    /// Own notifications, newest first.
    pub fn notifications(&self, actor: &Session) -> ServiceResult<Vec<Document>> {
        let member = self.profile(actor)?;
        let mut notifications = self.store.read_all(
            NOTIFICATIONS,
            &Filter::all().field("memberId", member.id.as_str()),
        )?;
        notifications.sort_by_key(|notification| Reverse(notification.created_at));
        Ok(notifications)
    }

    pub fn unread_count(&self, actor: &Session) -> ServiceResult<usize> {
        let member = self.profile(actor)?;
        self.unread_for(&member)
    }

    pub fn mark_notification_read(
        &self,
        actor: &Session,
        notification_id: &str,
    ) -> ServiceResult<Document> {
        actor.require(Action::Update, Resource::Profile)?;
        let member = self.resolve(actor)?;
        self.owned(NOTIFICATIONS, notification_id, &member)?;
        Ok(mark_read(&self.store, notification_id)?)
    }

    /// Applies the editable subset of `changes`; other keys are dropped.
    pub fn update_profile(&self, actor: &Session, changes: Fields) -> ServiceResult<Document> {
        actor.require(Action::Update, Resource::Profile)?;
        let member = self.resolve(actor)?;

        let allowed: Fields = changes
            .into_iter()
            .filter(|(key, _)| PROFILE_FIELDS.contains(&key.as_str()))
            .collect();
        let updated = self.store.update(MEMBERS, &member.id, allowed)?;

        info!(
            "event=profile_update module=service status=ok member_id={}",
            updated.id
        );
        self.notifier.publish(&Event::ProfileUpdated {
            member: updated.clone(),
        });
        Ok(updated)
    }

    pub fn membership_summary(&self, actor: &Session) -> ServiceResult<MembershipSummary> {
        let member = self.profile(actor)?;
        let outstanding = self.pending_for(&member)?;
        let text = |name: &str| member.str_field(name).map(str::to_string);

        Ok(MembershipSummary {
            member_id: member.id.clone(),
            name: text("name"),
            email: text("email"),
            status: text("status"),
            join_date: text("joinDate"),
            outstanding_bills: outstanding.len(),
            total_outstanding: sum_amounts(&outstanding),
            unread_notifications: self.unread_for(&member)?,
            last_payment: member
                .fields
                .get("lastPayment")
                .cloned()
                .unwrap_or(Value::Null),
            total_paid: member.f64_field("totalPaid").unwrap_or(0.0),
        })
    }

    fn resolve(&self, actor: &Session) -> ServiceResult<Document> {
        self.store
            .read_all(MEMBERS, &Filter::all().field("email", actor.email.as_str()))?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::not_found(MEMBERS, &actor.email))
    }

    fn owned(&self, collection: &str, id: &str, member: &Document) -> ServiceResult<Document> {
        let record = self.store.read(collection, id)?;
        if record.str_field("memberId") != Some(member.id.as_str()) {
            return Err(ServiceError::not_found(collection, id));
        }
        Ok(record)
    }

    fn pending_for(&self, member: &Document) -> ServiceResult<Vec<Document>> {
        let filter = Filter::all()
            .field("memberId", member.id.as_str())
            .field("status", STATUS_PENDING);
        Ok(self.store.read_all(BILLS, &filter)?)
    }

    fn unread_for(&self, member: &Document) -> ServiceResult<usize> {
        let filter = Filter::all()
            .field("memberId", member.id.as_str())
            .field("read", false);
        Ok(self.store.read_all(NOTIFICATIONS, &filter)?.len())
    }
}

fn sum_amounts(bills: &[Document]) -> f64 {
    bills
        .iter()
        .map(|bill| bill.f64_field("amount").unwrap_or(0.0))
        .sum()
}
