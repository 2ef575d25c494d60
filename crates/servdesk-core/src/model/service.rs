// ── Service catalog entry ──

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::{lenient_number, lenient_timestamp};
use crate::backend::{Resource, Toggle};
use crate::filter::{FilterField, FilterSchema, ListMode, SEARCH, STATUS, SortOrder};
use crate::page::PageDefinition;
use crate::refine::{FieldValue, Predicate, Refinable, Refiner, SortKey};
use crate::validation::{FieldErrors, Validate};

pub const CATEGORY: &str = "category";

/// A bookable service in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "lenient_number")]
    pub price: f64,
    /// Category display name, when the backend expands it.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub category_id: Option<EntityId>,
    #[serde(default)]
    pub is_active: bool,
    /// Image URLs.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create/update body for a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<EntityId>,
    pub is_active: bool,
}

impl ServiceDraft {
    /// Pre-fill the edit form from an existing service.
    pub fn from_service(service: &Service) -> Self {
        Self {
            name: service.name.clone(),
            description: service.description.clone(),
            price: service.price,
            category_id: service.category_id.clone(),
            is_active: service.is_active,
        }
    }
}

impl Validate for ServiceDraft {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name, "Name");
        errors.max_len("name", &self.name, 100, "Name");
        errors.max_len("description", &self.description, 1000, "Description");
        errors.positive("price", self.price, "Price");
        errors
    }
}

impl Resource for Service {
    type Draft = ServiceDraft;

    const COLLECTION: &'static str = "services";
    const SINGULAR: &'static str = "service";
    const PLURAL: &'static str = "services";

    fn id(&self) -> EntityId {
        self.id.clone()
    }
}

impl Toggle for Service {
    fn is_active(&self) -> bool {
        self.is_active
    }

    fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }
}

impl Refinable for Service {
    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        Some(match key {
            "name" => FieldValue::Text(Cow::Borrowed(&self.name)),
            "description" => FieldValue::Text(Cow::Borrowed(&self.description)),
            CATEGORY => FieldValue::Text(Cow::Borrowed(self.category.as_deref()?)),
            "price" => FieldValue::Float(self.price),
            "is_active" => FieldValue::Bool(self.is_active),
            "created_at" => FieldValue::Date(self.created_at),
            "updated_at" => FieldValue::Date(self.updated_at),
            _ => return None,
        })
    }
}

impl PageDefinition for Service {
    fn filter_schema() -> FilterSchema {
        FilterSchema::new(ListMode::ClientSide)
            .field(FilterField::text(SEARCH))
            .field(FilterField::choice(STATUS, &["active", "inactive"]))
            .field(FilterField::text(CATEGORY))
            .sorting(
                &["name", "price", "created_at", "updated_at"],
                "updated_at",
                SortOrder::Desc,
            )
    }

    fn refiner() -> Refiner {
        Refiner::new()
            .filter_by(SEARCH, Predicate::Contains(&["name", "description", CATEGORY]))
            .filter_by(
                STATUS,
                Predicate::Flag {
                    field: "is_active",
                    on: "active",
                    off: "inactive",
                },
            )
            .filter_by(CATEGORY, Predicate::Equals(CATEGORY))
            .sort_by("name", SortKey::Text("name"))
            .sort_by("price", SortKey::Number("price"))
            .sort_by("created_at", SortKey::Date("created_at"))
            .sort_by("updated_at", SortKey::Date("updated_at"))
    }
}
