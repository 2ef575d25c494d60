// ── Mutation coordinator ──
//
// Create and update are confirmed by the server before the list changes.
// Delete is pessimistic. Toggle is optimistic: the flipped value shows
// immediately and the pre-toggle snapshot is restored on failure.
//
// A single per-entity pending set covers toggle, update, and delete. Any
// second mutation on an id that is still pending is refused with
// `CoreError::Busy`, so a row is never half-applied.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashSet;
use servdesk_api::{Attachment, DeleteResponse};
use tracing::{debug, info, warn};

use crate::backend::{Backend, Resource, Toggle};
use crate::error::CoreError;
use crate::list::RemoteList;
use crate::model::EntityId;
use crate::notify::Notifier;
use crate::upload::UploadPolicy;
use crate::validation::Validate;

/// Where a newly created entity goes in the local list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreatePlacement {
    /// Insert at the top (newest first).
    #[default]
    Prepend,
    /// Leave the list alone; the caller reloads from the server.
    Reload,
}

/// Before/after snapshot of one optimistic change.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisticPatch<T> {
    pub id: EntityId,
    pub previous: T,
    pub next: T,
}

/// Removes its id from the pending set when dropped, on every exit path.
struct PendingGuard<'a> {
    pending: &'a DashSet<EntityId>,
    id: EntityId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

pub struct MutationCoordinator<T: Resource, B> {
    list: Arc<RemoteList<T, B>>,
    notifier: Arc<dyn Notifier>,
    pending: DashSet<EntityId>,
    upload: UploadPolicy,
    placement: CreatePlacement,
}

impl<T: Resource, B: Backend<T>> MutationCoordinator<T, B> {
    pub fn new(
        list: Arc<RemoteList<T, B>>,
        notifier: Arc<dyn Notifier>,
        upload: UploadPolicy,
        placement: CreatePlacement,
    ) -> Self {
        Self {
            list,
            notifier,
            pending: DashSet::new(),
            upload,
            placement,
        }
    }

    pub fn placement(&self) -> CreatePlacement {
        self.placement
    }

    /// `true` while a toggle, update, or delete on `id` is in flight.
    pub fn is_pending(&self, id: &EntityId) -> bool {
        self.pending.contains(id)
    }

    fn claim(&self, id: &EntityId) -> Result<PendingGuard<'_>, CoreError> {
        if !self.pending.insert(id.clone()) {
            warn!(collection = T::COLLECTION, %id, "mutation refused, another is pending");
            self.notifier.warning(format!(
                "Please wait, the previous change to this {} is still in progress",
                T::SINGULAR
            ));
            return Err(CoreError::Busy {
                entity_type: T::SINGULAR.into(),
                id: id.clone(),
            });
        }
        Ok(PendingGuard {
            pending: &self.pending,
            id: id.clone(),
        })
    }

    // ── Create / update ──────────────────────────────────────────────

    /// Validate, drop unacceptable files, then `POST`.
    ///
    /// Each rejected file raises its own warning; the remaining files
    /// still go out. Validation failures never reach the network.
    pub async fn create(&self, draft: &T::Draft, files: Vec<Attachment>) -> Result<T, CoreError> {
        draft.validate().into_result().map_err(CoreError::Invalid)?;

        let (accepted, rejected) = self.upload.partition(files);
        for rejection in rejected {
            warn!(collection = T::COLLECTION, "{rejection}");
            self.notifier.warning(rejection.to_string());
        }

        match self.list.backend().create(draft.clone(), accepted).await {
            Ok(created) => {
                info!(collection = T::COLLECTION, id = %created.id(), "created");
                match self.placement {
                    CreatePlacement::Prepend => self.list.prepend(created.clone()),
                    CreatePlacement::Reload => {}
                }
                self.notifier
                    .success(format!("{} created successfully", label::<T>()));
                Ok(created)
            }
            Err(e) => {
                self.notifier
                    .error(e.user_message(&format!("Failed to create {}", T::SINGULAR)));
                Err(e)
            }
        }
    }

    /// Validate, then `PUT`; the confirmed entity replaces the row in place.
    pub async fn update(&self, id: EntityId, draft: &T::Draft) -> Result<T, CoreError> {
        draft.validate().into_result().map_err(CoreError::Invalid)?;
        let _guard = self.claim(&id)?;

        match self.list.backend().update(id, draft.clone()).await {
            Ok(updated) => {
                info!(collection = T::COLLECTION, id = %updated.id(), "updated");
                self.list.replace(updated.clone());
                self.notifier
                    .success(format!("{} updated successfully", label::<T>()));
                Ok(updated)
            }
            Err(e) => {
                self.notifier
                    .error(e.user_message(&format!("Failed to update {}", T::SINGULAR)));
                Err(e)
            }
        }
    }

    // ── Delete ───────────────────────────────────────────────────────

    /// `DELETE`, then drop the row. The row stays until the server agrees.
    pub async fn delete(&self, id: EntityId) -> Result<DeleteResponse, CoreError> {
        let _guard = self.claim(&id)?;

        let result = match self.list.backend().delete(id.clone()).await {
            Ok(resp) if resp.success => Ok(resp),
            Ok(resp) => Err(CoreError::Api {
                message: resp.message,
                status: None,
            }),
            Err(e) => Err(e),
        };

        match result {
            Ok(resp) => {
                info!(collection = T::COLLECTION, %id, "deleted");
                self.list.remove(&id);
                self.notifier
                    .success(format!("{} deleted successfully", label::<T>()));
                Ok(resp)
            }
            Err(e) => {
                self.notifier
                    .error(e.user_message(&format!("Failed to delete {}", T::SINGULAR)));
                Err(e)
            }
        }
    }

    // ── Optimistic changes ───────────────────────────────────────────

    /// Apply `apply` to the row locally, then run `request`.
    ///
    /// On success the server's entity replaces the row; on failure the
    /// pre-change snapshot is restored. Notifications are the caller's.
    pub async fn run_optimistic<F, Fut>(
        &self,
        id: EntityId,
        apply: impl FnOnce(&mut T),
        request: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(&OptimisticPatch<T>) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let _guard = self.claim(&id)?;

        let previous = self.list.find(&id).ok_or_else(|| CoreError::NotFound {
            entity_type: T::SINGULAR.into(),
            identifier: id.to_string(),
        })?;
        let mut next = previous.clone();
        apply(&mut next);
        let patch = OptimisticPatch { id, previous, next };

        self.list.replace(patch.next.clone());
        debug!(collection = T::COLLECTION, id = %patch.id, "optimistic change applied");

        match request(&patch).await {
            Ok(confirmed) => {
                self.list.replace(confirmed.clone());
                Ok(confirmed)
            }
            Err(e) => {
                debug!(collection = T::COLLECTION, id = %patch.id, "rolling back");
                self.list.replace(patch.previous);
                Err(e)
            }
        }
    }
}

impl<T: Toggle, B: Backend<T>> MutationCoordinator<T, B> {
    /// Flip the active flag optimistically and pin the new value with
    /// `PATCH /{collection}/{id}/status`.
    pub async fn toggle(&self, id: EntityId) -> Result<T, CoreError> {
        let backend = Arc::clone(self.list.backend());
        let result = self
            .run_optimistic(
                id,
                |item| item.set_active(!item.is_active()),
                |patch| {
                    let id = patch.id.clone();
                    let body = T::status_body(patch.next.is_active());
                    async move { backend.set_status(id, Some(body)).await }
                },
            )
            .await;

        match &result {
            Ok(item) => {
                let verb = if item.is_active() { "activated" } else { "deactivated" };
                info!(collection = T::COLLECTION, id = %item.id(), verb, "status changed");
                self.notifier
                    .success(format!("{} {verb} successfully", label::<T>()));
            }
            // Already reported by claim().
            Err(CoreError::Busy { .. }) => {}
            Err(e) => {
                self.notifier.error(
                    e.user_message(&format!("Failed to update {} status", T::SINGULAR)),
                );
            }
        }
        result
    }
}

/// `"service area"` -> `"Service area"`.
fn label<T: Resource>() -> String {
    let mut chars = T::SINGULAR.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
