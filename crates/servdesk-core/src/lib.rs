//! List-management core for servdesk back-office screens.
//!
//! Every management screen (services, service areas, transactions) is the
//! same machine with a different filter schema and comparator table:
//!
//! - **[`Debouncer`]**: commits typed search text only after a quiet
//!   period, so a burst of keystrokes produces one filter update.
//!
//! - **[`FilterState`]**: the screen's filter / sort / pagination
//!   criteria, with a fixed key set declared by a [`FilterSchema`].
//!   Any change other than page or page size goes back to page 1.
//!
//! - **[`RemoteList`]**: fetches through a [`Backend`] and publishes
//!   [`ListState`] on a `watch` channel. Identical concurrent loads are
//!   skipped; a newer query cancels the older request and stale results
//!   are discarded.
//!
//! - **[`Refiner`]**: pure filter + stable sort for collections fetched
//!   whole and refined in memory.
//!
//! - **[`MutationCoordinator`]**: create / update / delete confirmed by
//!   the server, optimistic toggle with rollback, and a per-entity pending
//!   set that refuses overlapping mutations.
//!
//! - **[`ModalState`]**: at most one open dialog, as a single enum.
//!
//! - **[`ManagementPage`]**: ties the above together for one
//!   [`PageDefinition`].
//!
//! Failures never escape as panics: loads and mutations report through a
//! [`Notifier`] and leave the previous list in place.

pub mod backend;
pub mod debounce;
pub mod error;
pub mod filter;
pub mod list;
pub mod modal;
pub mod model;
pub mod mutation;
pub mod notify;
pub mod page;
pub mod refine;
pub mod settings;
pub mod upload;
pub mod validation;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{Backend, Resource, Toggle};
pub use debounce::Debouncer;
pub use error::CoreError;
pub use filter::{FilterField, FilterSchema, FilterState, FilterValue, ListMode, SortOrder};
pub use list::{ListState, LoadOutcome, RemoteList};
pub use modal::{ModalKind, ModalState};
pub use mutation::{CreatePlacement, MutationCoordinator, OptimisticPatch};
pub use notify::{Level, Notification, NotificationLog, Notifier, TracingNotifier};
pub use page::{ManagementPage, PageDefinition, PageView};
pub use refine::{FieldValue, Predicate, Refinable, Refiner, SortKey};
pub use settings::ListSettings;
pub use upload::{AttachmentError, UploadPolicy};
pub use validation::{FieldErrors, Validate};

pub use model::{
    EntityId, Service, ServiceArea, ServiceAreaDraft, ServiceDraft, Transaction, TransactionDraft,
    TransactionStatus,
};

// Transport types consumers need without depending on servdesk-api.
pub use servdesk_api::{Attachment, DeleteResponse, Pagination, RestClient, TransportConfig};
