// ── Filter / sort / pagination criteria ──
//
// One structured value per list screen. The set of keys is fixed by a
// FilterSchema at construction; single-key patches reset the page to 1
// (except page/page-size changes), and reset() restores the declared
// defaults exactly.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CoreError;

// ── Query parameter names ────────────────────────────────────────────

pub const SEARCH: &str = "search";
pub const STATUS: &str = "status";
pub const SORT_BY: &str = "sortBy";
pub const SORT_ORDER: &str = "sortOrder";
pub const PAGE: &str = "page";
pub const PAGE_SIZE: &str = "limit";

/// Sentinel meaning "no constraint"; never sent to the backend.
pub const ALL: &str = "all";

// ── SortOrder ────────────────────────────────────────────────────────

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

// ── FilterValue ──────────────────────────────────────────────────────

/// Current value of one filter field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(i64),
    Text(String),
}

impl FilterValue {
    /// The cleared value.
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    /// Empty strings and the `"all"` sentinel impose no constraint.
    pub fn is_active(&self) -> bool {
        match self {
            Self::Number(_) => true,
            Self::Text(s) => !s.is_empty() && s != ALL,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

// ── Schema ───────────────────────────────────────────────────────────

/// What a filter field accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, passed through as-is.
    Text,
    /// One of a declared allow-list (plus `""` / `"all"` to clear).
    Choice(&'static [&'static str]),
    /// Integer (e.g. a category id).
    Number,
}

/// One declared filter field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterField {
    pub key: &'static str,
    pub kind: FieldKind,
    pub default: FilterValue,
}

impl FilterField {
    pub fn text(key: &'static str) -> Self {
        Self {
            key,
            kind: FieldKind::Text,
            default: FilterValue::empty(),
        }
    }

    pub fn choice(key: &'static str, allowed: &'static [&'static str]) -> Self {
        Self {
            key,
            kind: FieldKind::Choice(allowed),
            default: FilterValue::empty(),
        }
    }

    pub fn number(key: &'static str) -> Self {
        Self {
            key,
            kind: FieldKind::Number,
            default: FilterValue::empty(),
        }
    }

    pub fn with_default(mut self, default: impl Into<FilterValue>) -> Self {
        self.default = default.into();
        self
    }

    /// Check `value` against this field's kind. Only choice fields are
    /// enforced; integer-looking text in a number field is normalized and
    /// anything else passes through for the backend to judge.
    fn accept(&self, value: FilterValue) -> Result<FilterValue, CoreError> {
        if !value.is_active() {
            return Ok(value);
        }
        match &self.kind {
            FieldKind::Text => Ok(value),
            FieldKind::Choice(allowed) => match value.as_text() {
                Some(text) if allowed.contains(&text) => Ok(value),
                _ => Err(CoreError::InvalidFilterValue {
                    field: self.key.to_owned(),
                    value: value.to_string(),
                    allowed: allowed.join(", "),
                }),
            },
            FieldKind::Number => Ok(match value.as_number() {
                Some(n) => FilterValue::Number(n),
                None => value,
            }),
        }
    }
}

/// Whether a screen filters the fetched collection locally or asks the
/// backend for one page at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Fetch the whole collection once; filter, sort, and page in memory.
    ClientSide,
    /// Send criteria as query parameters; the backend returns one page.
    ServerSide,
}

/// The fixed shape of a screen's filter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSchema {
    mode: ListMode,
    fields: Vec<FilterField>,
    sort_keys: &'static [&'static str],
    default_sort: &'static str,
    default_order: SortOrder,
    page_size: u32,
}

impl FilterSchema {
    pub fn new(mode: ListMode) -> Self {
        Self {
            mode,
            fields: Vec::new(),
            sort_keys: &[],
            default_sort: "",
            default_order: SortOrder::Desc,
            page_size: 10,
        }
    }

    /// Declare a filter field. Declaration order is query-string order.
    pub fn field(mut self, field: FilterField) -> Self {
        self.fields.retain(|f| f.key != field.key);
        self.fields.push(field);
        self
    }

    /// Declare the sort allow-list and the default sort.
    pub fn sorting(
        mut self,
        keys: &'static [&'static str],
        default_sort: &'static str,
        default_order: SortOrder,
    ) -> Self {
        self.sort_keys = keys;
        self.default_sort = default_sort;
        self.default_order = default_order;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn mode(&self) -> ListMode {
        self.mode
    }

    pub fn fields(&self) -> &[FilterField] {
        &self.fields
    }

    pub fn sort_keys(&self) -> &'static [&'static str] {
        self.sort_keys
    }

    pub fn default_page_size(&self) -> u32 {
        self.page_size
    }

    fn lookup(&self, key: &str) -> Option<&FilterField> {
        self.fields.iter().find(|f| f.key == key)
    }
}

// ── FilterState ──────────────────────────────────────────────────────

/// Current filter, sort, and pagination criteria for one list.
#[derive(Debug, Clone)]
pub struct FilterState {
    schema: Arc<FilterSchema>,
    values: IndexMap<&'static str, FilterValue>,
    sort_by: &'static str,
    sort_order: SortOrder,
    page: u32,
    page_size: u32,
}

impl FilterState {
    /// Defaults as declared by `schema`.
    pub fn new(schema: Arc<FilterSchema>) -> Self {
        let values = schema
            .fields
            .iter()
            .map(|f| (f.key, f.default.clone()))
            .collect();
        Self {
            values,
            sort_by: schema.default_sort,
            sort_order: schema.default_order,
            page: 1,
            page_size: schema.page_size,
            schema,
        }
    }

    pub fn schema(&self) -> &Arc<FilterSchema> {
        &self.schema
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key)
    }

    /// Text value of a field, or `""` when unset or numeric.
    pub fn text(&self, key: &str) -> &str {
        self.get(key).and_then(FilterValue::as_text).unwrap_or("")
    }

    pub fn sort_by(&self) -> &'static str {
        self.sort_by
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fields that currently constrain the list, in declaration order.
    pub fn active(&self) -> impl Iterator<Item = (&'static str, &FilterValue)> {
        self.values
            .iter()
            .filter(|(_, v)| v.is_active())
            .map(|(k, v)| (*k, v))
    }

    /// `true` when every criterion equals its declared default.
    pub fn is_default(&self) -> bool {
        *self == Self::new(Arc::clone(&self.schema))
    }

    // ── Updates ──────────────────────────────────────────────────────

    /// Replace one field and leave the others untouched.
    ///
    /// Accepts the declared filter keys plus `sortBy`, `sortOrder`,
    /// `page`, and `limit`. Changing anything but `page`/`limit` sends
    /// the list back to page 1; writing the current value is a no-op.
    pub fn set_field(&mut self, key: &str, value: impl Into<FilterValue>) -> Result<(), CoreError> {
        let value = value.into();
        match key {
            PAGE => {
                self.page = parse_positive(key, &value)?;
                return Ok(());
            }
            PAGE_SIZE => {
                self.page_size = parse_positive(key, &value)?;
                return Ok(());
            }
            _ => {
                let before = self.clone();
                self.assign(key, value)?;
                if *self == before {
                    return Ok(());
                }
            }
        }
        self.page = 1;
        Ok(())
    }

    pub fn set_sort(&mut self, sort_by: &str, order: SortOrder) -> Result<(), CoreError> {
        let before = self.clone();
        self.assign(SORT_BY, FilterValue::from(sort_by))?;
        self.sort_order = order;
        if *self != before {
            self.page = 1;
        }
        Ok(())
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
    }

    /// Restore the declared defaults.
    pub fn reset(&mut self) {
        *self = Self::new(Arc::clone(&self.schema));
    }

    /// Write a field without touching the page.
    fn assign(&mut self, key: &str, value: FilterValue) -> Result<(), CoreError> {
        match key {
            SORT_BY => {
                let text = value.to_string();
                let Some(allowed) = self.schema.sort_keys.iter().find(|k| **k == text) else {
                    return Err(CoreError::InvalidFilterValue {
                        field: SORT_BY.into(),
                        value: text,
                        allowed: self.schema.sort_keys.join(", "),
                    });
                };
                self.sort_by = allowed;
            }
            SORT_ORDER => {
                self.sort_order = value.to_string().parse().map_err(|_| {
                    CoreError::InvalidFilterValue {
                        field: SORT_ORDER.into(),
                        value: value.to_string(),
                        allowed: "asc, desc".into(),
                    }
                })?;
            }
            _ => {
                let field = self
                    .schema
                    .lookup(key)
                    .ok_or_else(|| CoreError::UnknownFilterField { field: key.into() })?;
                let field_key = field.key;
                let value = field.accept(value)?;
                self.values.insert(field_key, value);
            }
        }
        Ok(())
    }

    // ── Query strings ────────────────────────────────────────────────

    /// Every active criterion as query parameters: filters that are
    /// neither empty nor `"all"`, then sort and pagination.
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .active()
            .map(|(k, v)| (k.to_owned(), v.to_string()))
            .collect();
        if !self.sort_by.is_empty() {
            params.push((SORT_BY.into(), self.sort_by.to_owned()));
            params.push((SORT_ORDER.into(), self.sort_order.to_string()));
        }
        params.push((PAGE.into(), self.page.to_string()));
        params.push((PAGE_SIZE.into(), self.page_size.to_string()));
        params
    }

    /// What to send with a list request. Client-side lists fetch the
    /// whole collection, so they send nothing.
    pub fn request_params(&self) -> Vec<(String, String)> {
        match self.schema.mode {
            ListMode::ClientSide => Vec::new(),
            ListMode::ServerSide => self.query_params(),
        }
    }

    /// `query_params()` encoded as `a=b&c=d`.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_params())
            .finish()
    }

    /// Read criteria from a URL query string (one-way, on mount).
    ///
    /// Unknown keys are ignored; values a field would reject are skipped
    /// with a warning. The page is applied last so it survives.
    pub fn apply_query(&mut self, query: &str) {
        let query = query.trim_start_matches('?');
        let mut page = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = FilterValue::from(value.into_owned());
            match key.as_ref() {
                PAGE => page = Some(value),
                PAGE_SIZE => match parse_positive(PAGE_SIZE, &value) {
                    Ok(size) => self.page_size = size,
                    Err(e) => warn!("ignoring query parameter: {e}"),
                },
                other if other == SORT_BY
                    || other == SORT_ORDER
                    || self.schema.lookup(other).is_some() =>
                {
                    if let Err(e) = self.assign(other, value) {
                        warn!("ignoring query parameter: {e}");
                    }
                }
                _ => {}
            }
        }
        if let Some(value) = page {
            match parse_positive(PAGE, &value) {
                Ok(p) => self.page = p,
                Err(e) => warn!("ignoring query parameter: {e}"),
            }
        }
    }
}

impl PartialEq for FilterState {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
            && self.sort_by == other.sort_by
            && self.sort_order == other.sort_order
            && self.page == other.page
            && self.page_size == other.page_size
    }
}

fn parse_positive(field: &str, value: &FilterValue) -> Result<u32, CoreError> {
    value
        .as_number()
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n >= 1)
        .ok_or_else(|| CoreError::InvalidFilterValue {
            field: field.to_owned(),
            value: value.to_string(),
            allowed: "a positive integer".into(),
        })
}
