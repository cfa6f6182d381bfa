//! Browsing view for signed-in users.
//!
//! # Invariants
//! - Account records leave this module without their `password` field.
//! - Account updates only touch `phone`, `address`, `bio` and `profileImage`.

use super::member_service::member_matches;
use super::{parse_instant, ServiceError, ServiceResult};
use crate::auth::permission::{Action, Resource, Role};
use crate::auth::session::Session;
use crate::model::collections::{ACTIVITY_LOGS, DIETS, MEMBERS, SUPPLEMENTS, USERS};
use crate::model::document::{Document, Fields};
use crate::store::{DocumentStore, Filter};
use log::info;
use serde::Serialize;
use std::cmp::Reverse;

/// Account fields a user may edit.
pub const ACCOUNT_FIELDS: &[&str] = &["phone", "address", "bio", "profileImage"];

const SECRET_FIELDS: &[&str] = &["password"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub query: String,
    pub members: Vec<Document>,
    pub supplements: Vec<Document>,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.members.len() + self.supplements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub recent_activity: usize,
    pub supplements_available: usize,
    pub diets_available: usize,
}

pub struct UserDashboard<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> UserDashboard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The `users` record whose `email` equals the session email.
    pub fn user_profile(&self, actor: &Session) -> ServiceResult<Document> {
        actor.require(Action::Read, Resource::Account)?;
        self.account(actor).map(redact)
    }

    /// Applies the editable subset of `changes` to the caller's account.
    pub fn update_profile(&self, actor: &Session, changes: Fields) -> ServiceResult<Document> {
        actor.require(Action::Update, Resource::Account)?;
        let account = self.account(actor)?;

        let allowed: Fields = changes
            .into_iter()
            .filter(|(key, _)| ACCOUNT_FIELDS.contains(&key.as_str()))
            .collect();
        let updated = self.store.update(USERS, &account.id, allowed)?;

        info!(
            "event=account_update module=service status=ok user_id={}",
            updated.id
        );
        Ok(redact(updated))
    }

    /// Members by name or email, supplements by name or description.
    pub fn search(&self, actor: &Session, query: &str) -> ServiceResult<SearchResults> {
        actor.require(Action::Read, Resource::Search)?;
        let members = self.store.read_all(MEMBERS, &Filter::all())?;
        let supplements = self.store.read_all(SUPPLEMENTS, &Filter::all())?;

        let needle = query.to_lowercase();
        let supplement_matches = |supplement: &Document| {
            ["name", "description"].iter().any(|field| {
                supplement
                    .str_field(field)
                    .is_some_and(|value| value.to_lowercase().contains(&needle))
            })
        };

        let results = SearchResults {
            query: query.to_string(),
            members: members
                .into_iter()
                .filter(|member| member_matches(member, query, false))
                .collect(),
            supplements: supplements
                .into_iter()
                .filter(|supplement| supplement_matches(supplement))
                .collect(),
        };
        info!(
            "event=search module=service status=ok results={}",
            results.len()
        );
        Ok(results)
    }

    pub fn supplements(&self, actor: &Session) -> ServiceResult<Vec<Document>> {
        actor.require(Action::Read, Resource::Catalog)?;
        Ok(self.store.read_all(SUPPLEMENTS, &Filter::all())?)
    }

    pub fn supplement_details(
        &self,
        actor: &Session,
        supplement_id: &str,
    ) -> ServiceResult<Document> {
        actor.require(Action::Read, Resource::Catalog)?;
        Ok(self.store.read(SUPPLEMENTS, supplement_id)?)
    }

    pub fn diets(&self, actor: &Session) -> ServiceResult<Vec<Document>> {
        actor.require(Action::Read, Resource::Catalog)?;
        Ok(self.store.read_all(DIETS, &Filter::all())?)
    }

    pub fn diet_details(&self, actor: &Session, diet_id: &str) -> ServiceResult<Document> {
        actor.require(Action::Read, Resource::Catalog)?;
        Ok(self.store.read(DIETS, diet_id)?)
    }

    /// The session's activity entries (`userId == email`), newest first.
    pub fn activity_log(&self, actor: &Session) -> ServiceResult<Vec<Document>> {
        actor.require(Action::Read, Resource::Profile)?;
        let mut entries = self.store.read_all(
            ACTIVITY_LOGS,
            &Filter::all().field("userId", actor.email.as_str()),
        )?;
        entries.sort_by_key(|entry| {
            Reverse(entry.str_field("timestamp").and_then(parse_instant))
        });
        Ok(entries)
    }

    pub fn dashboard_summary(&self, actor: &Session) -> ServiceResult<DashboardSummary> {
        let recent_activity = self.activity_log(actor)?.len();
        Ok(DashboardSummary {
            email: actor.email.clone(),
            name: actor.name.clone(),
            role: actor.role,
            recent_activity,
            supplements_available: self.supplements(actor)?.len(),
            diets_available: self.diets(actor)?.len(),
        })
    }

    fn account(&self, actor: &Session) -> ServiceResult<Document> {
        self.store
            .read_all(USERS, &Filter::all().field("email", actor.email.as_str()))?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::not_found(USERS, &actor.email))
    }
}

fn redact(mut account: Document) -> Document {
    for field in SECRET_FIELDS {
        account.fields.remove(*field);
    }
    account
}
