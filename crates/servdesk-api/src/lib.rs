//! Async client for the servdesk back-office REST API.
//!
//! The backend is treated as a set of conventional collection resources
//! (`GET/POST /{collection}`, `PUT/DELETE /{collection}/{id}`,
//! `PATCH /{collection}/{id}/status`) wrapped in `{ data }` envelopes.
//! [`RestClient`] owns URL construction, envelope unwrapping, and the
//! mapping of non-2xx responses to [`Error`].

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::RestClient;
pub use error::Error;
pub use models::{Attachment, DeleteResponse, ListPage, Pagination};
pub use transport::{TlsMode, TransportConfig};
