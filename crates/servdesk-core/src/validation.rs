// ── Client-side form validation ──
//
// Validation failures never reach the network. They are reported inline,
// keyed by field name, and block submit until cleared.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

/// Field name -> message, in the order the checks ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(IndexMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. The first message for a field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Clear the error for one field (the user edited it).
    pub fn clear_field(&mut self, field: &str) -> Option<String> {
        self.0.shift_remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    // ── Common checks ────────────────────────────────────────────────

    /// Non-blank text.
    pub fn require(&mut self, field: &str, value: &str, label: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("{label} is required"));
        }
    }

    /// At most `max` characters.
    pub fn max_len(&mut self, field: &str, value: &str, max: usize, label: &str) {
        if value.chars().count() > max {
            self.add(field, format!("{label} must be at most {max} characters"));
        }
    }

    /// Strictly positive, finite number.
    pub fn positive(&mut self, field: &str, value: f64, label: &str) {
        if !value.is_finite() || value <= 0.0 {
            self.add(field, format!("{label} must be greater than zero"));
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Implemented by create/update drafts.
pub trait Validate {
    fn validate(&self) -> FieldErrors;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.require("name", "  ", "Name");
        errors.max_len("name", "  ", 1, "Name");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("name"), Some("Name is required"));
    }

    #[test]
    fn clearing_a_field_unblocks() {
        let mut errors = FieldErrors::new();
        errors.positive("price", 0.0, "Price");
        assert!(errors.clone().into_result().is_err());
        errors.clear_field("price");
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn display_lists_fields_in_order() {
        let mut errors = FieldErrors::new();
        errors.add("name", "Name is required");
        errors.add("price", "Price must be greater than zero");
        assert_eq!(
            errors.to_string(),
            "name: Name is required; price: Price must be greater than zero"
        );
    }

    #[test]
    fn nan_is_not_positive() {
        let mut errors = FieldErrors::new();
        errors.positive("price", f64::NAN, "Price");
        assert!(!errors.is_empty());
    }
}
