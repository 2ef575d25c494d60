// ── Service area ──

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::lenient_timestamp;
use crate::backend::{Resource, Toggle};
use crate::filter::{FilterField, FilterSchema, ListMode, SEARCH, STATUS, SortOrder};
use crate::page::PageDefinition;
use crate::refine::{FieldValue, Predicate, Refinable, Refiner, SortKey};
use crate::validation::{FieldErrors, Validate};

/// A locality where services are offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceArea {
    pub id: EntityId,
    pub name: String,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub pincode: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAreaDraft {
    pub name: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub pincode: String,
    pub is_active: bool,
}

impl ServiceAreaDraft {
    pub fn from_area(area: &ServiceArea) -> Self {
        Self {
            name: area.name.clone(),
            city: area.city.clone(),
            state: area.state.clone(),
            pincode: area.pincode.clone(),
            is_active: area.is_active,
        }
    }
}

impl Validate for ServiceAreaDraft {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name, "Area name");
        errors.max_len("name", &self.name, 100, "Area name");
        errors.require("city", &self.city, "City");
        let pincode = self.pincode.trim();
        if pincode.len() != 6 || !pincode.bytes().all(|b| b.is_ascii_digit()) {
            errors.add("pincode", "Pincode must be 6 digits");
        }
        errors
    }
}

impl Resource for ServiceArea {
    type Draft = ServiceAreaDraft;

    const COLLECTION: &'static str = "service-areas";
    const SINGULAR: &'static str = "service area";
    const PLURAL: &'static str = "service areas";

    fn id(&self) -> EntityId {
        self.id.clone()
    }
}

impl Toggle for ServiceArea {
    fn is_active(&self) -> bool {
        self.is_active
    }

    fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }
}

impl Refinable for ServiceArea {
    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        Some(match key {
            "name" => FieldValue::Text(Cow::Borrowed(&self.name)),
            "city" => FieldValue::Text(Cow::Borrowed(&self.city)),
            "pincode" => FieldValue::Text(Cow::Borrowed(&self.pincode)),
            "is_active" => FieldValue::Bool(self.is_active),
            "created_at" => FieldValue::Date(self.created_at),
            "updated_at" => FieldValue::Date(self.updated_at),
            _ => return None,
        })
    }
}

impl PageDefinition for ServiceArea {
    fn filter_schema() -> FilterSchema {
        FilterSchema::new(ListMode::ClientSide)
            .field(FilterField::text(SEARCH))
            .field(FilterField::choice(STATUS, &["active", "inactive"]))
            .sorting(
                &["name", "city", "created_at", "updated_at"],
                "updated_at",
                SortOrder::Desc,
            )
    }

    fn refiner() -> Refiner {
        Refiner::new()
            .filter_by(SEARCH, Predicate::Contains(&["name", "city", "pincode"]))
            .filter_by(
                STATUS,
                Predicate::Flag {
                    field: "is_active",
                    on: "active",
                    off: "inactive",
                },
            )
            .sort_by("name", SortKey::Text("name"))
            .sort_by("city", SortKey::Text("city"))
            .sort_by("created_at", SortKey::Date("created_at"))
            .sort_by("updated_at", SortKey::Date("updated_at"))
    }
}
