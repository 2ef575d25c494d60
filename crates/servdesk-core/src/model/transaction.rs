// ── Payment transaction ──
//
// Transactions are paginated and filtered by the backend; the refiner
// table below only exists so a fetched page can still be re-sorted
// locally.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::{lenient_number, lenient_timestamp};
use crate::backend::Resource;
use crate::filter::{FilterField, FilterSchema, ListMode, SEARCH, STATUS, SortOrder};
use crate::mutation::CreatePlacement;
use crate::page::PageDefinition;
use crate::refine::{FieldValue, Predicate, Refinable, Refiner, SortKey};
use crate::validation::{FieldErrors, Validate};

pub const PAYMENT_METHOD: &str = "payment_method";

/// Settlement state of a transaction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
    /// Anything this client does not know about yet.
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    /// Values accepted by the `status` filter.
    pub const FILTERABLE: &'static [&'static str] = &["pending", "completed", "failed", "refunded"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: EntityId,
    /// Gateway reference (order or payment id).
    #[serde(default, alias = "transaction_id", alias = "reference_id")]
    pub reference: Option<String>,
    #[serde(default, alias = "user_name", alias = "customer_name")]
    pub customer: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub amount: f64,
    pub status: TransactionStatus,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Status correction sent by an admin (e.g. marking a refund).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Validate for TransactionDraft {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.status == TransactionStatus::Unknown {
            errors.add("status", "Choose a status");
        }
        if let Some(note) = &self.note {
            errors.max_len("note", note, 500, "Note");
        }
        errors
    }
}

impl Resource for Transaction {
    type Draft = TransactionDraft;

    const COLLECTION: &'static str = "transactions";
    const SINGULAR: &'static str = "transaction";
    const PLURAL: &'static str = "transactions";

    fn id(&self) -> EntityId {
        self.id.clone()
    }
}

impl Refinable for Transaction {
    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        Some(match key {
            "reference" => FieldValue::Text(Cow::Borrowed(self.reference.as_deref()?)),
            "customer" => FieldValue::Text(Cow::Borrowed(self.customer.as_deref()?)),
            STATUS => FieldValue::Text(Cow::Borrowed(self.status.as_ref())),
            PAYMENT_METHOD => FieldValue::Text(Cow::Borrowed(self.payment_method.as_deref()?)),
            "amount" => FieldValue::Float(self.amount),
            "created_at" => FieldValue::Date(self.created_at),
            _ => return None,
        })
    }
}

impl PageDefinition for Transaction {
    fn filter_schema() -> FilterSchema {
        FilterSchema::new(ListMode::ServerSide)
            .field(FilterField::text(SEARCH))
            .field(FilterField::choice(STATUS, TransactionStatus::FILTERABLE))
            .field(FilterField::text(PAYMENT_METHOD))
            .sorting(&["created_at", "amount"], "created_at", SortOrder::Desc)
    }

    fn refiner() -> Refiner {
        Refiner::new()
            .filter_by(SEARCH, Predicate::Contains(&["reference", "customer"]))
            .filter_by(STATUS, Predicate::Equals(STATUS))
            .filter_by(PAYMENT_METHOD, Predicate::Equals(PAYMENT_METHOD))
            .sort_by("created_at", SortKey::Date("created_at"))
            .sort_by("amount", SortKey::Number("amount"))
    }

    fn create_placement() -> CreatePlacement {
        CreatePlacement::Reload
    }
}
