// Wire shapes shared by every collection endpoint.
//
// The backend wraps payloads in `{ "data": … }`. List endpoints return
// either a bare array or an `{ items, pagination }` object inside `data`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// The `{ "data": … }` envelope around every successful payload.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Error body shape. Only `message` is ever read.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Server-side pagination metadata.
///
/// Accepts both camelCase and snake_case keys; the backend is not
/// consistent between collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(alias = "current_page", alias = "page")]
    pub current_page: u32,
    #[serde(alias = "total_pages")]
    pub total_pages: u32,
    #[serde(alias = "items_per_page", alias = "limit", default)]
    pub items_per_page: u32,
    #[serde(alias = "total_items", alias = "total", default)]
    pub total_items: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListPayload<T> {
    Paged {
        items: Vec<T>,
        pagination: Pagination,
    },
    Flat(Vec<T>),
}

/// One fetched list: the items plus pagination metadata when the
/// collection is paginated server-side.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ListPage<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match ListPayload::deserialize(deserializer)? {
            ListPayload::Paged { items, pagination } => Self {
                items,
                pagination: Some(pagination),
            },
            ListPayload::Flat(items) => Self {
                items,
                pagination: None,
            },
        })
    }
}

/// Response to `DELETE /{collection}/{id}`.
///
/// The status code already decided success; `success` is only `false`
/// when the backend says so explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteResponse {
    #[serde(default = "confirmed")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl Default for DeleteResponse {
    fn default() -> Self {
        Self {
            success: true,
            message: None,
        }
    }
}

fn confirmed() -> bool {
    true
}

/// A file sent as one part of a multipart create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Form field name (e.g. `"images"`).
    pub field: String,
    pub file_name: String,
    /// MIME type, e.g. `image/png`.
    pub mime: String,
    pub bytes: Bytes,
}

impl Attachment {
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn flat_list_has_no_pagination() {
        let page: DataEnvelope<ListPage<u32>> =
            serde_json::from_value(json!({ "data": [1, 2, 3] })).unwrap();
        assert_eq!(page.data.items, vec![1, 2, 3]);
        assert!(page.data.pagination.is_none());
    }

    #[test]
    fn paged_list_accepts_camel_case() {
        let page: DataEnvelope<ListPage<u32>> = serde_json::from_value(json!({
            "data": {
                "items": [4],
                "pagination": { "currentPage": 2, "totalPages": 5, "itemsPerPage": 10, "totalItems": 41 }
            }
        }))
        .unwrap();
        assert_eq!(
            page.data.pagination,
            Some(Pagination {
                current_page: 2,
                total_pages: 5,
                items_per_page: 10,
                total_items: Some(41),
            })
        );
    }

    #[test]
    fn paged_list_accepts_snake_case() {
        let page: DataEnvelope<ListPage<u32>> = serde_json::from_value(json!({
            "data": {
                "items": [],
                "pagination": { "current_page": 1, "total_pages": 0 }
            }
        }))
        .unwrap();
        let pagination = page.data.pagination.unwrap();
        assert_eq!(pagination.current_page, 1);
        assert_eq!(pagination.items_per_page, 0);
        assert_eq!(pagination.total_items, None);
    }

    #[test]
    fn delete_response_defaults_to_success() {
        let resp: DeleteResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.success);
        assert!(resp.message.is_none());

        let resp: DeleteResponse =
            serde_json::from_value(json!({ "message": "Service deleted" })).unwrap();
        assert!(resp.success);
        assert_eq!(resp.message.as_deref(), Some("Service deleted"));

        let resp: DeleteResponse =
            serde_json::from_value(json!({ "success": false, "message": "In use" })).unwrap();
        assert!(!resp.success);
    }
}
