//! Member administration.
//!
//! # Invariants
//! - New members start `active` with `totalPaid = 0` and no last payment.
//! - Status only takes `active`, `inactive` or `suspended`.

use super::{
    is_valid_email, now_rfc3339, require_text, with_extra, ServiceError, ServiceResult,
};
use crate::auth::permission::{Action, Resource};
use crate::auth::session::Session;
use crate::model::collections::MEMBERS;
use crate::model::document::{fields_from, Document, Fields};
use crate::store::{DocumentStore, Filter};
use log::info;
use serde_json::{json, Value};

/// Membership lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Active,
    Inactive,
    Suspended,
}

impl MemberStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

/// Request model for registering a member.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Fee package key, e.g. `monthly`.
    pub fee_package: String,
    /// Free-form extras stored as-is (gender, age, address, ...).
    pub extra: Fields,
}

pub struct MemberService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> MemberService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validates and stores a new member.
    pub fn add_member(&self, actor: &Session, request: NewMember) -> ServiceResult<Document> {
        actor.require(Action::Create, Resource::Members)?;

        let name = require_text(&request.name, "Member name is required")?;
        let email = request.email.trim();
        if !is_valid_email(email) {
            return Err(ServiceError::validation("Valid email is required"));
        }
        let phone = require_text(&request.phone, "Phone number is required")?;
        let fee_package = require_text(&request.fee_package, "Fee package is required")?;

        let fields = with_extra(
            fields_from(json!({
                "name": name,
                "email": email,
                "phone": phone,
                "feePackage": fee_package,
                "status": MemberStatus::Active.as_str(),
                "joinDate": now_rfc3339(),
                "lastPayment": Value::Null,
                "totalPaid": 0,
            })),
            request.extra,
        );
        let member = self.store.create(MEMBERS, fields)?;
        info!("event=member_add module=service status=ok member_id={}", member.id);
        Ok(member)
    }

    /// Shallow-merges `changes` onto an existing member.
    pub fn update_member(
        &self,
        actor: &Session,
        member_id: &str,
        changes: Fields,
    ) -> ServiceResult<Document> {
        actor.require(Action::Update, Resource::Members)?;
        self.store.read(MEMBERS, member_id)?;
        let updated = self.store.update(MEMBERS, member_id, changes)?;
        info!("event=member_update module=service status=ok member_id={member_id}");
        Ok(updated)
    }

    pub fn delete_member(&self, actor: &Session, member_id: &str) -> ServiceResult<()> {
        actor.require(Action::Delete, Resource::Members)?;
        self.store.delete(MEMBERS, member_id)?;
        info!("event=member_delete module=service status=ok member_id={member_id}");
        Ok(())
    }

    pub fn get_member(&self, actor: &Session, member_id: &str) -> ServiceResult<Document> {
        actor.require(Action::Read, Resource::Members)?;
        Ok(self.store.read(MEMBERS, member_id)?)
    }

    pub fn list_members(&self, actor: &Session) -> ServiceResult<Vec<Document>> {
        actor.require(Action::Read, Resource::Members)?;
        Ok(self.store.read_all(MEMBERS, &Filter::all())?)
    }

    /// Case-insensitive name/email substring match, or phone substring.
    pub fn search_members(&self, actor: &Session, query: &str) -> ServiceResult<Vec<Document>> {
        actor.require(Action::Read, Resource::Members)?;
        let members = self.store.read_all(MEMBERS, &Filter::all())?;
        Ok(members
            .into_iter()
            .filter(|member| member_matches(member, query, true))
            .collect())
    }

    pub fn set_status(
        &self,
        actor: &Session,
        member_id: &str,
        status: &str,
    ) -> ServiceResult<Document> {
        let status = MemberStatus::parse(status)
            .ok_or_else(|| ServiceError::validation(format!("Invalid status: {status}")))?;
        self.update_member(
            actor,
            member_id,
            fields_from(json!({"status": status.as_str()})),
        )
    }
}

/// Shared member text match used by admin and public search.
pub(crate) fn member_matches(member: &Document, query: &str, include_phone: bool) -> bool {
    let needle = query.to_lowercase();
    let contains = |field: &str| {
        member
            .str_field(field)
            .is_some_and(|value| value.to_lowercase().contains(&needle))
    };
    contains("name")
        || contains("email")
        || (include_phone
            && member
                .str_field("phone")
                .is_some_and(|phone| phone.contains(query)))
}
