//! Supplement store and diet plans.

use super::{number, require_positive, require_text, with_extra, ServiceResult};
use crate::auth::permission::{Action, Resource};
use crate::auth::session::Session;
use crate::model::collections::{DIETS, SUPPLEMENTS};
use crate::model::document::{fields_from, Document, Fields};
use crate::store::{DocumentStore, Filter};
use log::info;
use serde_json::json;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSupplement {
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    pub extra: Fields,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDiet {
    pub name: String,
    pub details: String,
    pub extra: Fields,
}

pub struct CatalogService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn supplements(&self, actor: &Session) -> ServiceResult<Vec<Document>> {
        actor.require(Action::Read, Resource::Catalog)?;
        Ok(self.store.read_all(SUPPLEMENTS, &Filter::all())?)
    }

    pub fn supplement(&self, actor: &Session, supplement_id: &str) -> ServiceResult<Document> {
        actor.require(Action::Read, Resource::Catalog)?;
        Ok(self.store.read(SUPPLEMENTS, supplement_id)?)
    }

    pub fn add_supplement(
        &self,
        actor: &Session,
        request: NewSupplement,
    ) -> ServiceResult<Document> {
        actor.require(Action::Create, Resource::Catalog)?;
        let fields = supplement_fields(request)?;
        let supplement = self.store.create(SUPPLEMENTS, fields)?;
        info!(
            "event=supplement_add module=service status=ok supplement_id={}",
            supplement.id
        );
        Ok(supplement)
    }

    /// Replaces name, price and description; extras are merged.
    pub fn update_supplement(
        &self,
        actor: &Session,
        supplement_id: &str,
        request: NewSupplement,
    ) -> ServiceResult<Document> {
        actor.require(Action::Update, Resource::Catalog)?;
        let fields = supplement_fields(request)?;
        let updated = self.store.update(SUPPLEMENTS, supplement_id, fields)?;
        info!("event=supplement_update module=service status=ok supplement_id={supplement_id}");
        Ok(updated)
    }

    pub fn delete_supplement(&self, actor: &Session, supplement_id: &str) -> ServiceResult<()> {
        actor.require(Action::Delete, Resource::Catalog)?;
        self.store.delete(SUPPLEMENTS, supplement_id)?;
        info!("event=supplement_delete module=service status=ok supplement_id={supplement_id}");
        Ok(())
    }

    pub fn diets(&self, actor: &Session) -> ServiceResult<Vec<Document>> {
        actor.require(Action::Read, Resource::Catalog)?;
        Ok(self.store.read_all(DIETS, &Filter::all())?)
    }

    pub fn diet(&self, actor: &Session, diet_id: &str) -> ServiceResult<Document> {
        actor.require(Action::Read, Resource::Catalog)?;
        Ok(self.store.read(DIETS, diet_id)?)
    }

    pub fn add_diet(&self, actor: &Session, request: NewDiet) -> ServiceResult<Document> {
        actor.require(Action::Create, Resource::Catalog)?;
        let fields = diet_fields(request)?;
        let diet = self.store.create(DIETS, fields)?;
        info!("event=diet_add module=service status=ok diet_id={}", diet.id);
        Ok(diet)
    }

    pub fn update_diet(
        &self,
        actor: &Session,
        diet_id: &str,
        request: NewDiet,
    ) -> ServiceResult<Document> {
        actor.require(Action::Update, Resource::Catalog)?;
        let fields = diet_fields(request)?;
        let updated = self.store.update(DIETS, diet_id, fields)?;
        info!("event=diet_update module=service status=ok diet_id={diet_id}");
        Ok(updated)
    }

    pub fn delete_diet(&self, actor: &Session, diet_id: &str) -> ServiceResult<()> {
        actor.require(Action::Delete, Resource::Catalog)?;
        self.store.delete(DIETS, diet_id)?;
        info!("event=diet_delete module=service status=ok diet_id={diet_id}");
        Ok(())
    }
}

fn supplement_fields(request: NewSupplement) -> ServiceResult<Fields> {
    let name = require_text(&request.name, "Supplement name is required")?;
    let price = require_positive(request.price, "Price must be a positive number")?;
    let mut fields = fields_from(json!({"name": name, "price": number(price)}));
    if let Some(description) = request.description {
        fields.insert("description".to_string(), description.trim().into());
    }
    Ok(with_extra(fields, request.extra))
}

fn diet_fields(request: NewDiet) -> ServiceResult<Fields> {
    let name = require_text(&request.name, "Diet name is required")?;
    let details = require_text(&request.details, "Diet details are required")?;
    Ok(with_extra(
        fields_from(json!({"name": name, "details": details})),
        request.extra,
    ))
}
