// ── Remote list loader ──
//
// Owns the in-memory list for one screen and the single load generation
// allowed in flight. A load with the same query as the one in flight is
// skipped; a load with a different query cancels it and takes over. Only
// the current generation may write results or clear `is_loading`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use servdesk_api::Pagination;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::{Backend, Resource};
use crate::filter::FilterState;
use crate::model::EntityId;
use crate::notify::Notifier;

/// Observable state of one list.
#[derive(Debug)]
pub struct ListState<T> {
    /// Last successfully loaded items (full collection or current page).
    pub items: Arc<Vec<T>>,
    pub is_loading: bool,
    /// User-facing message from the last failed load; cleared on success.
    pub error: Option<String>,
    /// Server pagination metadata, for server-paginated collections.
    pub pagination: Option<Pagination>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            is_loading: false,
            error: None,
            pagination: None,
            loaded_at: None,
        }
    }
}

impl<T> Clone for ListState<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            is_loading: self.is_loading,
            error: self.error.clone(),
            pagination: self.pagination,
            loaded_at: self.loaded_at,
        }
    }
}

/// What happened to one `load()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LoadOutcome {
    /// Fetched and replaced the list.
    Applied,
    /// The request failed; the previous list stays visible.
    Failed,
    /// An identical load was already in flight; nothing was sent.
    Skipped,
    /// A newer load replaced this one before it finished.
    Superseded,
    /// The list was shut down.
    Cancelled,
}

struct InFlight {
    generation: u64,
    params: Vec<(String, String)>,
    cancel: CancellationToken,
}

/// Loads one collection through a [`Backend`] and publishes [`ListState`].
pub struct RemoteList<T: Resource, B> {
    backend: Arc<B>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<ListState<T>>,
    in_flight: Mutex<Option<InFlight>>,
    generation: AtomicU64,
    shutdown: CancellationToken,
}

impl<T: Resource, B: Backend<T>> RemoteList<T, B> {
    pub fn new(backend: Arc<B>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(ListState::default());
        Self {
            backend,
            notifier,
            state,
            in_flight: Mutex::new(None),
            generation: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Fetch with the request parameters `filters` calls for.
    pub async fn load(&self, filters: &FilterState) -> LoadOutcome {
        self.load_params(filters.request_params()).await
    }

    /// Fetch with explicit query parameters.
    pub async fn load_params(&self, params: Vec<(String, String)>) -> LoadOutcome {
        if self.shutdown.is_cancelled() {
            return LoadOutcome::Cancelled;
        }

        let (generation, cancel) = {
            let mut slot = self.lock_in_flight();
            if let Some(current) = slot.as_ref() {
                if current.params == params {
                    debug!(
                        collection = T::COLLECTION,
                        generation = current.generation,
                        "identical load already in flight, skipping"
                    );
                    return LoadOutcome::Skipped;
                }
                debug!(
                    collection = T::COLLECTION,
                    generation = current.generation,
                    "superseding in-flight load"
                );
                current.cancel.cancel();
            }

            let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
            let cancel = self.shutdown.child_token();
            *slot = Some(InFlight {
                generation,
                params: params.clone(),
                cancel: cancel.clone(),
            });
            self.state.send_modify(|s| s.is_loading = true);
            (generation, cancel)
        };

        debug!(collection = T::COLLECTION, generation, ?params, "loading");
        let result = tokio::select! {
            () = cancel.cancelled() => None,
            result = self.backend.list(params) => Some(result),
        };

        let mut slot = self.lock_in_flight();
        if !slot.as_ref().is_some_and(|f| f.generation == generation) {
            debug!(collection = T::COLLECTION, generation, "discarding stale load");
            return self.stale_outcome();
        }
        *slot = None;

        let Some(result) = result else {
            // Cancelled without a successor: hand back the loading flag.
            self.state.send_modify(|s| s.is_loading = false);
            return self.stale_outcome();
        };

        match result {
            Ok(page) => {
                debug!(
                    collection = T::COLLECTION,
                    generation,
                    count = page.items.len(),
                    "load applied"
                );
                self.state.send_modify(|s| {
                    s.items = Arc::new(page.items);
                    s.pagination = page.pagination;
                    s.error = None;
                    s.is_loading = false;
                    s.loaded_at = Some(Utc::now());
                });
                LoadOutcome::Applied
            }
            Err(e) => {
                let message = e.user_message(&format!("Failed to fetch {}", T::PLURAL));
                warn!(collection = T::COLLECTION, generation, error = %e, "load failed");
                self.state.send_modify(|s| {
                    s.error = Some(message.clone());
                    s.is_loading = false;
                });
                drop(slot);
                self.notifier.error(message);
                LoadOutcome::Failed
            }
        }
    }

    fn stale_outcome(&self) -> LoadOutcome {
        if self.shutdown.is_cancelled() {
            LoadOutcome::Cancelled
        } else {
            LoadOutcome::Superseded
        }
    }

    /// Cancel any in-flight load. Results that arrive afterwards are
    /// dropped and no later load will run.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        if self.lock_in_flight().take().is_some() {
            self.state.send_modify(|s| s.is_loading = false);
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Reading ──────────────────────────────────────────────────────

    pub fn subscribe(&self) -> watch::Receiver<ListState<T>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ListState<T> {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.state.borrow().items)
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn find(&self, id: &EntityId) -> Option<T> {
        self.state.borrow().items.iter().find(|i| i.id() == *id).cloned()
    }

    // ── Local edits (used by the mutation coordinator) ───────────────

    /// Replace the item with `item`'s id in place. Returns the old value.
    pub(crate) fn replace(&self, item: T) -> Option<T> {
        let id = item.id();
        let mut previous = None;
        self.state.send_if_modified(|s| {
            let Some(pos) = s.items.iter().position(|i| i.id() == id) else {
                return false;
            };
            let items = Arc::make_mut(&mut s.items);
            previous = Some(std::mem::replace(&mut items[pos], item));
            true
        });
        previous
    }

    pub(crate) fn prepend(&self, item: T) {
        self.state.send_modify(|s| Arc::make_mut(&mut s.items).insert(0, item));
    }

    /// Drop the item with `id`. Returns it if it was present.
    pub(crate) fn remove(&self, id: &EntityId) -> Option<T> {
        let mut removed = None;
        self.state.send_if_modified(|s| {
            let Some(pos) = s.items.iter().position(|i| i.id() == *id) else {
                return false;
            };
            removed = Some(Arc::make_mut(&mut s.items).remove(pos));
            true
        });
        removed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Service;
    use crate::notify::{Level, NotificationLog};
    use crate::testing::{FakeBackend, service};

    type TestList = RemoteList<Service, FakeBackend<Service>>;

    fn list(backend: &Arc<FakeBackend<Service>>) -> (TestList, Arc<NotificationLog>) {
        let log = Arc::new(NotificationLog::new());
        (RemoteList::new(Arc::clone(backend), log.clone()), log)
    }

    fn params(q: &str) -> Vec<(String, String)> {
        vec![("search".into(), q.into())]
    }

    fn names(items: &[Service]) -> Vec<&str> {
        items.iter().map(|s| s.name.as_str()).collect()
    }

    #[tokio::test]
    async fn success_replaces_wholesale() {
        let backend = Arc::new(FakeBackend::new(vec![service(1, "a", true)]));
        let (list, _) = list(&backend);
        assert_eq!(list.load_params(Vec::new()).await, LoadOutcome::Applied);
        assert_eq!(names(&list.items()), ["a"]);

        backend.set_items(vec![service(2, "b", true), service(3, "c", false)]);
        list.load_params(Vec::new()).await;
        let snap = list.snapshot();
        assert_eq!(names(&snap.items), ["b", "c"]);
        assert!(!snap.is_loading);
        assert!(snap.loaded_at.is_some());
    }

    #[tokio::test]
    async fn failure_keeps_previous_items_and_notifies() {
        let backend = Arc::new(FakeBackend::new(vec![service(1, "a", true)]));
        let (list, log) = list(&backend);
        list.load_params(Vec::new()).await;

        backend.fail_next_list(None);
        assert_eq!(list.load_params(Vec::new()).await, LoadOutcome::Failed);

        let snap = list.snapshot();
        assert_eq!(names(&snap.items), ["a"]);
        assert!(!snap.is_loading);
        assert_eq!(snap.error.as_deref(), Some("Failed to fetch services"));
        assert_eq!(log.count(Level::Error), 1);
    }

    #[tokio::test]
    async fn failure_prefers_server_message() {
        let backend = Arc::new(FakeBackend::new(Vec::new()));
        let (list, log) = list(&backend);
        backend.fail_next_list(Some("Token expired"));
        list.load_params(Vec::new()).await;
        assert_eq!(log.drain()[0].message, "Token expired");
    }

    #[tokio::test(start_paused = true)]
    async fn identical_load_in_flight_is_skipped() {
        let backend = Arc::new(FakeBackend::new(vec![service(1, "a", true)]));
        backend.delay_next_list(Duration::from_millis(100));
        let (list, _) = list(&backend);

        let (first, second) = tokio::join!(list.load_params(params("a")), async {
            tokio::task::yield_now().await;
            list.load_params(params("a")).await
        });
        assert_eq!(first, LoadOutcome::Applied);
        assert_eq!(second, LoadOutcome::Skipped);
        assert_eq!(backend.list_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_query_supersedes_slow_older_one() {
        let backend = Arc::new(FakeBackend::new(vec![service(1, "old", true)]));
        backend.delay_next_list(Duration::from_millis(500));
        let (list, _) = list(&backend);

        let (first, second) = tokio::join!(list.load_params(params("o")), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            backend.set_items(vec![service(2, "new", true)]);
            list.load_params(params("n")).await
        });

        assert_eq!(first, LoadOutcome::Superseded);
        assert_eq!(second, LoadOutcome::Applied);
        let snap = list.snapshot();
        assert_eq!(names(&snap.items), ["new"]);
        assert!(!snap.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_in_flight_load() {
        let backend = Arc::new(FakeBackend::new(vec![service(1, "a", true)]));
        backend.delay_next_list(Duration::from_millis(100));
        let (list, _) = list(&backend);

        let (outcome, ()) = tokio::join!(list.load_params(Vec::new()), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            list.shutdown();
        });
        assert_eq!(outcome, LoadOutcome::Cancelled);
        assert!(list.items().is_empty());
        assert!(!list.is_loading());
        assert_eq!(list.load_params(Vec::new()).await, LoadOutcome::Cancelled);
    }

    #[tokio::test]
    async fn local_edits() {
        let backend = Arc::new(FakeBackend::new(vec![
            service(1, "a", true),
            service(2, "b", true),
        ]));
        let (list, _) = list(&backend);
        list.load_params(Vec::new()).await;

        let previous = list.replace(service(2, "b2", false)).unwrap();
        assert_eq!(previous.name, "b");
        list.prepend(service(3, "c", true));
        assert_eq!(names(&list.items()), ["c", "a", "b2"]);

        assert!(list.remove(&EntityId::Number(1)).is_some());
        assert!(list.remove(&EntityId::Number(1)).is_none());
        assert!(list.replace(service(9, "z", true)).is_none());
        assert_eq!(names(&list.items()), ["c", "b2"]);
    }
}
