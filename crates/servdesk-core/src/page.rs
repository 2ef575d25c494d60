// ── Management page facade ──
//
// One instance per list screen: debounced search feeding the filter
// state, the remote list, the refiner for client-filtered collections,
// mutations, and the open dialog. Screens differ only in their
// PageDefinition (filter schema + refiner table).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use servdesk_api::{Attachment, DeleteResponse};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::backend::{Backend, Resource, Toggle};
use crate::debounce::Debouncer;
use crate::error::CoreError;
use crate::filter::{FilterSchema, FilterState, FilterValue, ListMode, SEARCH, SortOrder};
use crate::list::{ListState, LoadOutcome, RemoteList};
use crate::modal::ModalState;
use crate::model::EntityId;
use crate::mutation::{CreatePlacement, MutationCoordinator};
use crate::notify::Notifier;
use crate::refine::{Refinable, Refiner};
use crate::settings::ListSettings;
use crate::validation::FieldErrors;

/// What a screen declares about its entity.
pub trait PageDefinition: Resource + Refinable {
    fn filter_schema() -> FilterSchema;
    fn refiner() -> Refiner;

    fn create_placement() -> CreatePlacement {
        CreatePlacement::Prepend
    }
}

/// The rows to render plus where they sit in the whole result.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub struct ManagementPage<T: PageDefinition, B: Backend<T>> {
    list: Arc<RemoteList<T, B>>,
    mutations: MutationCoordinator<T, B>,
    filters: watch::Sender<FilterState>,
    search: Debouncer<String>,
    refiner: Refiner,
    modal: Mutex<ModalState<T>>,
    form_errors: Mutex<FieldErrors>,
    cancel: CancellationToken,
}

impl<T: PageDefinition, B: Backend<T>> ManagementPage<T, B> {
    /// Build the page and start its search task. Needs a Tokio runtime.
    pub fn new(backend: Arc<B>, settings: ListSettings, notifier: Arc<dyn Notifier>) -> Arc<Self> {
        let schema = Arc::new(T::filter_schema().page_size(settings.page_size));
        let (filters, _) = watch::channel(FilterState::new(schema));
        let list = Arc::new(RemoteList::new(backend, Arc::clone(&notifier)));
        let mutations = MutationCoordinator::new(
            Arc::clone(&list),
            notifier,
            settings.upload,
            T::create_placement(),
        );

        let page = Arc::new(Self {
            list,
            mutations,
            filters,
            search: Debouncer::new(String::new(), settings.debounce),
            refiner: T::refiner(),
            modal: Mutex::new(ModalState::Idle),
            form_errors: Mutex::new(FieldErrors::new()),
            cancel: CancellationToken::new(),
        });

        tokio::spawn(sync_search(
            Arc::downgrade(&page),
            page.search.subscribe(),
            page.cancel.clone(),
        ));
        page
    }

    pub fn mode(&self) -> ListMode {
        self.filters.borrow().schema().mode()
    }

    pub fn list(&self) -> &Arc<RemoteList<T, B>> {
        &self.list
    }

    pub fn mutations(&self) -> &MutationCoordinator<T, B> {
        &self.mutations
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Initial load with default criteria.
    pub async fn mount(&self) -> LoadOutcome {
        self.reload().await
    }

    /// Initial load with criteria read from a URL query string.
    pub async fn mount_with_query(&self, query: &str) -> LoadOutcome {
        self.filters.send_modify(|f| f.apply_query(query));
        let search = self.filters.borrow().text(SEARCH).to_owned();
        self.search.reset(search);
        self.reload().await
    }

    /// Fetch again with the current criteria.
    pub async fn reload(&self) -> LoadOutcome {
        let filters = self.filters();
        self.list.load(&filters).await
    }

    /// Server-paginated lists refetch when criteria change; client-side
    /// lists just re-render.
    async fn after_filter_change(&self, changed: bool) -> Option<LoadOutcome> {
        if changed && self.mode() == ListMode::ServerSide {
            Some(self.reload().await)
        } else {
            None
        }
    }

    // ── Filters ──────────────────────────────────────────────────────

    pub fn filters(&self) -> FilterState {
        self.filters.borrow().clone()
    }

    /// Receiver that wakes on every applied filter change.
    pub fn subscribe_filters(&self) -> watch::Receiver<FilterState> {
        self.filters.subscribe()
    }

    pub fn subscribe_list(&self) -> watch::Receiver<ListState<T>> {
        self.list.subscribe()
    }

    /// Patch the filter state without fetching. Returns whether anything
    /// changed. A rejected patch leaves the state untouched.
    pub fn update_filters(
        &self,
        patch: impl FnOnce(&mut FilterState) -> Result<(), CoreError>,
    ) -> Result<bool, CoreError> {
        let mut outcome = Ok(false);
        self.filters.send_if_modified(|state| {
            let before = state.clone();
            match patch(state) {
                Ok(()) => {
                    let changed = *state != before;
                    outcome = Ok(changed);
                    changed
                }
                Err(e) => {
                    *state = before;
                    outcome = Err(e);
                    false
                }
            }
        });
        outcome
    }

    /// Raw search text. Applied after the debounce quiet period.
    pub fn set_search_input(&self, raw: impl Into<String>) {
        self.search.set(raw.into());
    }

    pub fn search_input(&self) -> String {
        self.search.pending()
    }

    async fn apply_search(&self, term: String) -> Option<LoadOutcome> {
        debug!(collection = T::COLLECTION, %term, "search committed");
        match self.update_filters(|f| f.set_field(SEARCH, term)) {
            Ok(changed) => self.after_filter_change(changed).await,
            Err(_) => None,
        }
    }

    pub async fn set_filter(
        &self,
        key: &str,
        value: impl Into<FilterValue>,
    ) -> Result<Option<LoadOutcome>, CoreError> {
        let changed = self.update_filters(|f| f.set_field(key, value))?;
        Ok(self.after_filter_change(changed).await)
    }

    pub async fn set_sort(
        &self,
        sort_by: &str,
        order: SortOrder,
    ) -> Result<Option<LoadOutcome>, CoreError> {
        let changed = self.update_filters(|f| f.set_sort(sort_by, order))?;
        Ok(self.after_filter_change(changed).await)
    }

    pub async fn set_page(&self, page: u32) -> Option<LoadOutcome> {
        let changed = self
            .update_filters(|f| {
                f.set_page(page);
                Ok(())
            })
            .unwrap_or(false);
        self.after_filter_change(changed).await
    }

    /// Restore default criteria and clear the raw search input.
    pub async fn clear_filters(&self) -> Option<LoadOutcome> {
        self.search.reset(String::new());
        let changed = self
            .update_filters(|f| {
                f.reset();
                Ok(())
            })
            .unwrap_or(false);
        self.after_filter_change(changed).await
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Rows for the current criteria.
    ///
    /// Client-side lists are refined from scratch and windowed to the
    /// current page; server-side lists show the fetched page as-is.
    pub fn visible(&self) -> PageView<T> {
        let filters = self.filters();
        let state = self.list.snapshot();
        let page_size = filters.page_size().max(1);

        match filters.schema().mode() {
            ListMode::ClientSide => {
                let refined = self.refiner.refine(&state.items, &filters);
                let total = refined.len();
                let per_page = usize::try_from(page_size).unwrap_or(usize::MAX);
                let total_pages = u32::try_from(total.div_ceil(per_page).max(1)).unwrap_or(u32::MAX);
                let page = filters.page().min(total_pages);
                let start = usize::try_from(page - 1)
                    .unwrap_or(usize::MAX)
                    .saturating_mul(per_page);
                let items = refined.into_iter().skip(start).take(per_page).collect();
                PageView {
                    items,
                    page,
                    total_pages,
                    page_size,
                    total_items: u64::try_from(total).unwrap_or(u64::MAX),
                    is_loading: state.is_loading,
                    error: state.error,
                }
            }
            ListMode::ServerSide => {
                let items = state.items.as_ref().clone();
                let fetched = u64::try_from(items.len()).unwrap_or(u64::MAX);
                let (page, total_pages, total_items) = state.pagination.map_or(
                    (filters.page(), 1, fetched),
                    |p| (p.current_page.max(1), p.total_pages.max(1), p.total_items.unwrap_or(fetched)),
                );
                PageView {
                    items,
                    page,
                    total_pages,
                    page_size,
                    total_items,
                    is_loading: state.is_loading,
                    error: state.error,
                }
            }
        }
    }

    // ── Dialogs ──────────────────────────────────────────────────────

    pub fn modal(&self) -> ModalState<T> {
        self.lock_modal().clone()
    }

    pub fn open_create(&self) {
        *self.lock_form_errors() = FieldErrors::new();
        self.lock_modal().open_create();
    }

    pub fn open_edit(&self, target: T) {
        *self.lock_form_errors() = FieldErrors::new();
        self.lock_modal().open_edit(target);
    }

    pub fn open_delete(&self, target: T) {
        self.lock_modal().open_delete(target);
    }

    pub fn close_modal(&self) {
        self.lock_modal().close();
        *self.lock_form_errors() = FieldErrors::new();
    }

    /// Inline errors from the last rejected submit.
    pub fn form_errors(&self) -> FieldErrors {
        self.lock_form_errors().clone()
    }

    /// The user edited `field`; drop its inline error.
    pub fn clear_field_error(&self, field: &str) {
        self.lock_form_errors().clear_field(field);
    }

    /// Submit the open create or edit dialog.
    ///
    /// On success the dialog closes. On failure it stays open with the
    /// caller's draft untouched; validation failures are kept as inline
    /// field errors.
    pub async fn submit(&self, draft: &T::Draft, files: Vec<Attachment>) -> Result<T, CoreError> {
        let result = match self.modal() {
            ModalState::Create => {
                let created = self.mutations.create(draft, files).await;
                if created.is_ok() && self.mutations.placement() == CreatePlacement::Reload {
                    self.reload().await;
                }
                created
            }
            ModalState::Edit(target) => self.mutations.update(target.id(), draft).await,
            ModalState::Idle | ModalState::Delete(_) => {
                return Err(CoreError::NoActiveModal {
                    expected: "create or edit",
                });
            }
        };

        match &result {
            Ok(_) => self.close_modal(),
            Err(CoreError::Invalid(errors)) => *self.lock_form_errors() = errors.clone(),
            Err(_) => {}
        }
        result
    }

    /// Delete the entity in the open delete dialog.
    pub async fn confirm_delete(&self) -> Result<DeleteResponse, CoreError> {
        let ModalState::Delete(target) = self.modal() else {
            return Err(CoreError::NoActiveModal { expected: "delete" });
        };
        let resp = self.mutations.delete(target.id()).await?;
        self.close_modal();
        Ok(resp)
    }

    /// Delete without a dialog.
    pub async fn delete(&self, id: EntityId) -> Result<DeleteResponse, CoreError> {
        self.mutations.delete(id).await
    }

    fn lock_modal(&self) -> MutexGuard<'_, ModalState<T>> {
        self.modal.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_form_errors(&self) -> MutexGuard<'_, FieldErrors> {
        self.form_errors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Stop the search task and drop any in-flight load.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.search.shutdown();
        self.list.shutdown();
    }
}

impl<T: PageDefinition + Toggle, B: Backend<T>> ManagementPage<T, B> {
    /// Optimistic active/inactive flip, then a full reload to pick up any
    /// server-side side effects.
    pub async fn toggle(&self, id: EntityId) -> Result<T, CoreError> {
        let toggled = self.mutations.toggle(id).await?;
        self.reload().await;
        Ok(toggled)
    }
}

impl<T: PageDefinition, B: Backend<T>> Drop for ManagementPage<T, B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Apply each committed search term. Holds only a weak reference so the
/// page can drop while this task waits.
async fn sync_search<T, B>(
    page: Weak<ManagementPage<T, B>>,
    mut committed: watch::Receiver<String>,
    cancel: CancellationToken,
) where
    T: PageDefinition,
    B: Backend<T>,
{
    loop {
        tokio::select! {
            () = cancel.cancelled() => return,
            changed = committed.changed() => if changed.is_err() { return },
        }
        let term = committed.borrow_and_update().clone();
        let Some(page) = page.upgrade() else { return };
        page.apply_search(term).await;
    }
}
