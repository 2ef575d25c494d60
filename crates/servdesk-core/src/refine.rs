// ── Client-side refiner ──
//
// Pure filter + sort over an already-fetched collection. Predicates are
// ANDed across every active filter field; the sort is stable and keyed by
// the state's `sortBy`, reversed for descending order.

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::filter::{FilterState, FilterValue, SortOrder};

/// A field value exposed to the refiner.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// `None` when the entity has no (or an unparseable) timestamp.
    Date(Option<DateTime<Utc>>),
}

impl FieldValue<'_> {
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::Text(_) | Self::Bool(_) | Self::Date(_) => None,
        }
    }

    /// Equality against a filter value, as the user would read it.
    fn matches(&self, wanted: &FilterValue) -> bool {
        match (self, wanted) {
            (Self::Int(n), FilterValue::Number(w)) => n == w,
            (Self::Text(s), FilterValue::Text(w)) => s.eq_ignore_ascii_case(w),
            (Self::Bool(b), FilterValue::Text(w)) => w.parse::<bool>().is_ok_and(|w| w == *b),
            (value, wanted) => value.display() == wanted.to_string(),
        }
    }

    fn display(&self) -> String {
        match self {
            Self::Text(s) => s.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => d.map(|d| d.to_rfc3339()).unwrap_or_default(),
        }
    }
}

/// Field lookup by key. Implemented by every refinable entity.
pub trait Refinable {
    fn field(&self, key: &str) -> Option<FieldValue<'_>>;
}

/// How one filter key constrains an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// Case-insensitive substring match against any of these fields.
    Contains(&'static [&'static str]),
    /// Equality against one field.
    Equals(&'static str),
    /// A boolean field behind two labels, e.g. `active` / `inactive`.
    /// Any other label matches nothing.
    Flag {
        field: &'static str,
        on: &'static str,
        off: &'static str,
    },
}

impl Predicate {
    fn test<T: Refinable>(self, item: &T, wanted: &FilterValue) -> bool {
        match self {
            Self::Contains(fields) => {
                let needle = wanted.to_string().to_lowercase();
                fields.iter().any(|f| {
                    item.field(f)
                        .is_some_and(|v| v.display().to_lowercase().contains(&needle))
                })
            }
            Self::Equals(field) => item.field(field).is_some_and(|v| v.matches(wanted)),
            Self::Flag { field, on, off } => {
                let want = match wanted.as_text() {
                    Some(label) if label.eq_ignore_ascii_case(on) => true,
                    Some(label) if label.eq_ignore_ascii_case(off) => false,
                    _ => return false,
                };
                matches!(item.field(field), Some(FieldValue::Bool(b)) if b == want)
            }
        }
    }
}

/// How one sort key compares two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Case-insensitive text order.
    Text(&'static str),
    /// Numeric order; missing values first.
    Number(&'static str),
    /// Timestamp order; missing or unparseable dates sort as the oldest.
    Date(&'static str),
}

impl SortKey {
    fn compare<T: Refinable>(self, a: &T, b: &T) -> Ordering {
        match self {
            Self::Text(field) => {
                let a = a.field(field).map(|v| v.display().to_lowercase());
                let b = b.field(field).map(|v| v.display().to_lowercase());
                a.cmp(&b)
            }
            Self::Number(field) => {
                let a = a.field(field).and_then(|v| v.as_f64());
                let b = b.field(field).and_then(|v| v.as_f64());
                match (a, b) {
                    (Some(a), Some(b)) => a.total_cmp(&b),
                    (a, b) => a.is_some().cmp(&b.is_some()),
                }
            }
            Self::Date(field) => date_of(a, field).cmp(&date_of(b, field)),
        }
    }
}

fn date_of<T: Refinable>(item: &T, field: &str) -> Option<DateTime<Utc>> {
    match item.field(field) {
        Some(FieldValue::Date(d)) => d,
        _ => None,
    }
}

/// A page's predicate and comparator tables.
#[derive(Debug, Clone, Default)]
pub struct Refiner {
    predicates: Vec<(&'static str, Predicate)>,
    sorts: Vec<(&'static str, SortKey)>,
}

impl Refiner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter key `key` applies `predicate`.
    pub fn filter_by(mut self, key: &'static str, predicate: Predicate) -> Self {
        self.predicates.push((key, predicate));
        self
    }

    /// Sort key `key` compares with `sort`.
    pub fn sort_by(mut self, key: &'static str, sort: SortKey) -> Self {
        self.sorts.push((key, sort));
        self
    }

    /// `true` when `item` passes every active filter.
    pub fn matches<T: Refinable>(&self, item: &T, filters: &FilterState) -> bool {
        filters.active().all(|(key, wanted)| {
            self.predicates
                .iter()
                .find(|(k, _)| *k == key)
                .is_none_or(|(_, p)| p.test(item, wanted))
        })
    }

    /// Order of `a` relative to `b` under the state's sort.
    pub fn compare<T: Refinable>(&self, a: &T, b: &T, filters: &FilterState) -> Ordering {
        let Some((_, sort)) = self.sorts.iter().find(|(k, _)| *k == filters.sort_by()) else {
            return Ordering::Equal;
        };
        let ord = sort.compare(a, b);
        match filters.sort_order() {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }

    /// Filter then stable-sort a fresh copy of `items`.
    pub fn refine<T: Refinable + Clone>(&self, items: &[T], filters: &FilterState) -> Vec<T> {
        let mut out: Vec<T> = items
            .iter()
            .filter(|item| self.matches(*item, filters))
            .cloned()
            .collect();
        out.sort_by(|a, b| self.compare(a, b, filters));
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::filter::{FilterField, FilterSchema, ListMode, SEARCH, STATUS};

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        name: &'static str,
        active: bool,
        price: f64,
        created: Option<DateTime<Utc>>,
    }

    impl Refinable for Row {
        fn field(&self, key: &str) -> Option<FieldValue<'_>> {
            Some(match key {
                "name" => FieldValue::Text(Cow::Borrowed(self.name)),
                "is_active" => FieldValue::Bool(self.active),
                "price" => FieldValue::Float(self.price),
                "created_at" => FieldValue::Date(self.created),
                _ => return None,
            })
        }
    }

    fn row(id: u32, name: &'static str, active: bool, price: f64, day: Option<u32>) -> Row {
        Row {
            id,
            name,
            active,
            price,
            created: day.map(|d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()),
        }
    }

    fn refiner() -> Refiner {
        Refiner::new()
            .filter_by(SEARCH, Predicate::Contains(&["name"]))
            .filter_by(
                STATUS,
                Predicate::Flag {
                    field: "is_active",
                    on: "active",
                    off: "inactive",
                },
            )
            .sort_by("name", SortKey::Text("name"))
            .sort_by("price", SortKey::Number("price"))
            .sort_by("created_at", SortKey::Date("created_at"))
    }

    fn state() -> FilterState {
        FilterState::new(Arc::new(
            FilterSchema::new(ListMode::ClientSide)
                .field(FilterField::text(SEARCH))
                .field(FilterField::choice(STATUS, &["active", "inactive"]))
                .sorting(&["name", "price", "created_at"], "created_at", SortOrder::Desc),
        ))
    }

    fn ids(rows: &[Row]) -> Vec<u32> {
        rows.iter().map(|r| r.id).collect()
    }

    fn sample() -> Vec<Row> {
        vec![
            row(1, "Deep Clean", true, 40.0, Some(3)),
            row(2, "AC Repair", false, 25.0, None),
            row(3, "Plumbing", true, 25.0, Some(1)),
            row(4, "deep fry", true, 10.0, Some(2)),
        ]
    }

    #[test]
    fn empty_filters_keep_everything() {
        let rows = sample();
        assert_eq!(refiner().refine(&rows, &state()).len(), rows.len());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let mut filters = state();
        filters.set_field(SEARCH, "DEEP").unwrap();
        let out = refiner().refine(&sample(), &filters);
        assert_eq!(ids(&out), [1, 4]);
    }

    #[test]
    fn filters_are_anded() {
        let mut filters = state();
        filters.set_field(SEARCH, "r").unwrap();
        filters.set_field(STATUS, "active").unwrap();
        let out = refiner().refine(&sample(), &filters);
        assert_eq!(ids(&out), [4]);
    }

    #[test]
    fn status_scenario() {
        let rows = vec![
            row(1, "a", true, 1.0, None),
            row(2, "b", false, 1.0, None),
            row(3, "c", true, 1.0, None),
        ];
        let mut filters = state();
        filters.set_field(STATUS, "active").unwrap();
        assert_eq!(refiner().refine(&rows, &filters).len(), 2);

        filters.reset();
        assert_eq!(filters.text(STATUS), "");
        assert_eq!(refiner().refine(&rows, &filters).len(), 3);
    }

    #[test]
    fn missing_dates_sort_as_oldest() {
        let mut filters = state();
        filters.set_sort("created_at", SortOrder::Asc).unwrap();
        assert_eq!(ids(&refiner().refine(&sample(), &filters)), [2, 3, 4, 1]);

        filters.set_sort("created_at", SortOrder::Desc).unwrap();
        assert_eq!(ids(&refiner().refine(&sample(), &filters)), [1, 4, 3, 2]);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let mut filters = state();
        filters.set_sort("price", SortOrder::Asc).unwrap();
        // 2 and 3 share a price; 2 came first.
        assert_eq!(ids(&refiner().refine(&sample(), &filters)), [4, 2, 3, 1]);

        filters.set_sort("price", SortOrder::Desc).unwrap();
        assert_eq!(ids(&refiner().refine(&sample(), &filters)), [1, 2, 3, 4]);
    }

    #[test]
    fn refine_is_idempotent() {
        let mut filters = state();
        filters.set_field(SEARCH, "e").unwrap();
        filters.set_sort("name", SortOrder::Asc).unwrap();
        let once = refiner().refine(&sample(), &filters);
        let twice = refiner().refine(&once, &filters);
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_flag_label_matches_nothing() {
        let rows = sample();
        let pred = Predicate::Flag {
            field: "is_active",
            on: "active",
            off: "inactive",
        };
        assert!(!rows.iter().any(|r| pred.test(r, &FilterValue::from("archived"))));
    }
}
