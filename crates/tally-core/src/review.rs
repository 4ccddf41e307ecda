//! Review controller: the interactive session review state machine
//!
//! Presents one import session for review, mediates single and batch
//! classification edits, and drives the terminal confirm/cancel
//! transitions. The controller holds a transient copy of the session and
//! reconciles it from the store's authoritative responses on every
//! mutation: each returned item replaces the local one wholesale by id
//! match ("last authoritative response wins per id"). The local copy is
//! never assumed authoritative.
//!
//! Pagination and selection are purely local. `toggle_select_all` operates
//! on the full item set, not the current page.

use std::collections::HashSet;

use tracing::debug;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{ImportSessionWithItems, ImportStatus, ItemPatch, LineItem};
use crate::resolver::{ClassificationResolver, ResolverCache};

/// Items shown per review page
pub const PAGE_SIZE: usize = 25;

/// Persistence and query boundary consumed by the review controller
pub trait SessionStore {
    /// Fetch a session with its full item set; `NotFound` for unknown ids
    fn fetch_session(&self, session_id: i64) -> Result<ImportSessionWithItems>;

    /// Patch one item, returning the authoritative updated item
    fn update_item(&self, session_id: i64, item_id: i64, patch: &ItemPatch) -> Result<LineItem>;

    /// Patch a set of items uniformly; unknown ids are skipped in the
    /// response
    fn update_items_batch(
        &self,
        session_id: i64,
        item_ids: &[i64],
        patch: &ItemPatch,
    ) -> Result<Vec<LineItem>>;

    /// Confirm the session (terminal)
    fn confirm(&self, session_id: i64) -> Result<()>;

    /// Cancel the session (terminal)
    fn cancel(&self, session_id: i64) -> Result<()>;
}

impl SessionStore for Database {
    fn fetch_session(&self, session_id: i64) -> Result<ImportSessionWithItems> {
        self.get_import_session(session_id)?
            .ok_or_else(|| Error::NotFound(format!("Import session {}", session_id)))
    }

    fn update_item(&self, session_id: i64, item_id: i64, patch: &ItemPatch) -> Result<LineItem> {
        self.update_import_item(session_id, item_id, patch)
    }

    fn update_items_batch(
        &self,
        session_id: i64,
        item_ids: &[i64],
        patch: &ItemPatch,
    ) -> Result<Vec<LineItem>> {
        self.update_import_items_batch(session_id, item_ids, patch)
    }

    fn confirm(&self, session_id: i64) -> Result<()> {
        self.confirm_import(session_id)
    }

    fn cancel(&self, session_id: i64) -> Result<()> {
        self.cancel_import(session_id)
    }
}

/// Interactive review state over one import session
pub struct ReviewController<S> {
    store: S,
    session: Option<ImportSessionWithItems>,
    lookups: ResolverCache,
    loading: bool,
    confirming: bool,
    current_page: usize,
    selected_ids: HashSet<i64>,
}

impl<S> ReviewController<S>
where
    S: SessionStore + ClassificationResolver,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            session: None,
            lookups: ResolverCache::default(),
            loading: false,
            confirming: false,
            current_page: 0,
            selected_ids: HashSet::new(),
        }
    }

    // ========== Derived state ==========

    pub fn session(&self) -> Option<&ImportSessionWithItems> {
        self.session.as_ref()
    }

    pub fn lookups(&self) -> &ResolverCache {
        &self.lookups
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_confirming(&self) -> bool {
        self.confirming
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn selected_ids(&self) -> &HashSet<i64> {
        &self.selected_ids
    }

    fn items(&self) -> &[LineItem] {
        self.session.as_ref().map(|s| s.items.as_slice()).unwrap_or(&[])
    }

    /// Stable-order slice of items for the current page
    pub fn paged_items(&self) -> &[LineItem] {
        let items = self.items();
        let start = self.current_page.saturating_mul(PAGE_SIZE).min(items.len());
        let end = (start + PAGE_SIZE).min(items.len());
        &items[start..end]
    }

    pub fn total_pages(&self) -> usize {
        self.items().len().div_ceil(PAGE_SIZE)
    }

    pub fn total_count(&self) -> usize {
        self.items().len()
    }

    /// Items with both references set, ready for confirm
    pub fn ready_count(&self) -> usize {
        self.items().iter().filter(|i| i.is_classified()).count()
    }

    pub fn all_ready(&self) -> bool {
        let total = self.total_count();
        total > 0 && self.ready_count() == total
    }

    pub fn all_selected(&self) -> bool {
        let total = self.total_count();
        total > 0 && self.selected_ids.len() == total
    }

    pub fn is_editable(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.session.status.is_editable())
            .unwrap_or(false)
    }

    // ========== Operations ==========

    /// Fetch the session and resolver data
    ///
    /// Single attempt, no retry: on failure the session stays `None` and
    /// the error is surfaced to the caller, who decides whether to trigger
    /// an explicit reload.
    pub fn load(&mut self, session_id: i64) -> Result<()> {
        self.loading = true;
        self.session = None;
        self.selected_ids.clear();
        self.current_page = 0;

        let result = self
            .store
            .fetch_session(session_id)
            .and_then(|session| Ok((session, ResolverCache::load(&self.store)?)));

        self.loading = false;
        let (session, lookups) = result?;

        debug!(
            "Loaded session {} for review: {} items, {} lookups",
            session_id,
            session.items.len(),
            lookups.counterparty_count()
        );
        self.session = Some(session);
        self.lookups = lookups;
        Ok(())
    }

    /// Toggle one item in the selection set (pure local)
    pub fn toggle_select(&mut self, item_id: i64) {
        if !self.selected_ids.remove(&item_id) {
            self.selected_ids.insert(item_id);
        }
    }

    /// Select the full item set across all pages, or clear when everything
    /// is already selected (pure local)
    pub fn toggle_select_all(&mut self) {
        if self.all_selected() {
            self.selected_ids.clear();
        } else {
            self.selected_ids = self.items().iter().map(|i| i.id).collect();
        }
    }

    /// Pure local pagination pointer change; items are already held
    /// client-side in full, so there is no re-fetch
    pub fn go_to_page(&mut self, page: usize) {
        self.current_page = page;
    }

    /// Patch one item through the store and reconcile the response
    ///
    /// The returned item replaces the local one by id match. Selection and
    /// the current page are untouched.
    pub fn edit_single(&mut self, item_id: i64, patch: &ItemPatch) -> Result<()> {
        let session_id = self.require_session()?;
        let updated = self.store.update_item(session_id, item_id, patch)?;
        self.replace_item(updated);
        Ok(())
    }

    /// Apply one patch to the whole selection through the store
    ///
    /// Requires a non-empty selection. Every item in the response is
    /// reconciled in place; selected ids absent from the response stay
    /// unchanged, and the selection itself is not cleared.
    pub fn apply_bulk(&mut self, patch: &ItemPatch) -> Result<usize> {
        let session_id = self.require_session()?;
        if self.selected_ids.is_empty() {
            return Err(Error::InvalidData("no items selected".to_string()));
        }

        let mut ids: Vec<i64> = self.selected_ids.iter().copied().collect();
        ids.sort_unstable();

        let updated = self.store.update_items_batch(session_id, &ids, patch)?;
        let count = updated.len();
        for item in updated {
            self.replace_item(item);
        }
        Ok(count)
    }

    /// Drive the terminal confirm transition
    ///
    /// On success the view is expected to navigate away; the local status
    /// still flips to `Completed` so any further local operation sees a
    /// non-editable session.
    pub fn confirm(&mut self) -> Result<()> {
        let session_id = self.require_session()?;
        if !self.is_editable() {
            return Err(Error::SessionNotEditable);
        }

        self.confirming = true;
        let result = self.store.confirm(session_id);
        self.confirming = false;
        result?;

        if let Some(session) = self.session.as_mut() {
            session.session.status = ImportStatus::Completed;
        }
        Ok(())
    }

    /// Drive the terminal cancel transition
    pub fn cancel(&mut self) -> Result<()> {
        let session_id = self.require_session()?;
        if !self.is_editable() {
            return Err(Error::SessionNotEditable);
        }

        self.store.cancel(session_id)?;

        if let Some(session) = self.session.as_mut() {
            session.session.status = ImportStatus::Cancelled;
        }
        Ok(())
    }

    fn require_session(&self) -> Result<i64> {
        self.session
            .as_ref()
            .map(|s| s.session.id)
            .ok_or_else(|| Error::InvalidData("no session loaded".to_string()))
    }

    /// Replace-in-place reconciliation: the store's returned item fully
    /// supersedes the local copy with the same id
    fn replace_item(&mut self, updated: LineItem) {
        if let Some(session) = self.session.as_mut() {
            if let Some(slot) = session.items.iter_mut().find(|i| i.id == updated.id) {
                *slot = updated;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Client, FileKind, ImportSession, LedgerType, LineDirection, Supplier};
    use chrono::{NaiveDate, Utc};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// In-memory store mimicking the server's session semantics
    struct MockStore {
        session: Rc<RefCell<ImportSessionWithItems>>,
    }

    fn item(id: i64, description: &str) -> LineItem {
        LineItem {
            id,
            session_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            description: description.to_string(),
            amount: -100.0,
            direction: LineDirection::Debit,
            ledger_type: LedgerType::Payable,
            counterparty_id: None,
            counterparty_name: None,
            category_id: None,
            category_name: None,
            possible_duplicate: false,
            fingerprint: format!("fp-{}", id),
            original_data: None,
            created_at: Utc::now(),
        }
    }

    fn session_with_items(count: i64) -> Rc<RefCell<ImportSessionWithItems>> {
        let items: Vec<LineItem> = (1..=count).map(|i| item(i, &format!("LINE {}", i))).collect();
        Rc::new(RefCell::new(ImportSessionWithItems {
            session: ImportSession {
                id: 1,
                file_name: "extrato.csv".to_string(),
                file_kind: FileKind::Csv,
                status: ImportStatus::PendingReview,
                total_records: count,
                created_at: Utc::now(),
            },
            items,
        }))
    }

    impl MockStore {
        fn apply(&self, item_id: i64, patch: &ItemPatch) -> Option<LineItem> {
            let mut session = self.session.borrow_mut();
            let slot = session.items.iter_mut().find(|i| i.id == item_id)?;
            if let Some(id) = patch.counterparty_id {
                slot.counterparty_id = Some(id);
                slot.counterparty_name = Some(format!("counterparty-{}", id));
            }
            if let Some(id) = patch.category_id {
                slot.category_id = Some(id);
                slot.category_name = Some(format!("category-{}", id));
            }
            if let Some(lt) = patch.ledger_type {
                slot.ledger_type = lt;
            }
            Some(slot.clone())
        }

        fn assert_editable(&self) -> Result<()> {
            if self.session.borrow().session.status.is_editable() {
                Ok(())
            } else {
                Err(Error::SessionNotEditable)
            }
        }
    }

    impl SessionStore for MockStore {
        fn fetch_session(&self, session_id: i64) -> Result<ImportSessionWithItems> {
            if session_id != self.session.borrow().session.id {
                return Err(Error::NotFound(format!("Import session {}", session_id)));
            }
            Ok(self.session.borrow().clone())
        }

        fn update_item(
            &self,
            _session_id: i64,
            item_id: i64,
            patch: &ItemPatch,
        ) -> Result<LineItem> {
            self.assert_editable()?;
            self.apply(item_id, patch)
                .ok_or_else(|| Error::NotFound(format!("Import item {}", item_id)))
        }

        fn update_items_batch(
            &self,
            _session_id: i64,
            item_ids: &[i64],
            patch: &ItemPatch,
        ) -> Result<Vec<LineItem>> {
            self.assert_editable()?;
            // Unknown ids silently skipped, one response entry per found id
            Ok(item_ids.iter().filter_map(|&id| self.apply(id, patch)).collect())
        }

        fn confirm(&self, _session_id: i64) -> Result<()> {
            self.assert_editable()?;
            let incomplete = {
                let session = self.session.borrow();
                session.items.iter().filter(|i| !i.is_classified()).count() as i64
            };
            if incomplete > 0 {
                return Err(Error::IncompleteClassification(incomplete));
            }
            self.session.borrow_mut().session.status = ImportStatus::Completed;
            Ok(())
        }

        fn cancel(&self, _session_id: i64) -> Result<()> {
            self.assert_editable()?;
            self.session.borrow_mut().session.status = ImportStatus::Cancelled;
            Ok(())
        }
    }

    impl ClassificationResolver for MockStore {
        fn list_categories(&self) -> Result<Vec<Category>> {
            Ok(vec![Category {
                id: 2,
                name: "Servicos".to_string(),
                created_at: Utc::now(),
            }])
        }

        fn list_suppliers(&self) -> Result<Vec<Supplier>> {
            Ok(vec![Supplier {
                id: 1,
                name: "Acme".to_string(),
                active: true,
                created_at: Utc::now(),
            }])
        }

        fn list_clients(&self) -> Result<Vec<Client>> {
            Ok(Vec::<Client>::new())
        }
    }

    fn controller_with_items(count: i64) -> ReviewController<MockStore> {
        let store = MockStore {
            session: session_with_items(count),
        };
        let mut controller = ReviewController::new(store);
        controller.load(1).unwrap();
        controller
    }

    #[test]
    fn test_load_populates_session_and_lookups() {
        let controller = controller_with_items(2);

        assert!(!controller.is_loading());
        assert_eq!(controller.total_count(), 2);
        assert_eq!(controller.ready_count(), 0);
        assert!(!controller.all_ready());
        assert!(controller.is_editable());
        assert_eq!(controller.lookups().supplier_name(1), Some("Acme"));
    }

    #[test]
    fn test_load_failure_leaves_no_session() {
        let store = MockStore {
            session: session_with_items(1),
        };
        let mut controller = ReviewController::new(store);

        let err = controller.load(999).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(controller.session().is_none());
        assert!(!controller.is_loading());
    }

    #[test]
    fn test_edit_single_reconciles_in_place() {
        let mut controller = controller_with_items(2);

        controller
            .edit_single(
                1,
                &ItemPatch {
                    counterparty_id: Some(1),
                    category_id: Some(2),
                    ledger_type: None,
                },
            )
            .unwrap();

        assert_eq!(controller.ready_count(), 1);
        assert!(!controller.all_ready());

        // Edits never change item count, selection, or page
        assert_eq!(controller.total_count(), 2);
        assert!(controller.selected_ids().is_empty());
        assert_eq!(controller.current_page(), 0);
    }

    #[test]
    fn test_bulk_patch_is_partial_not_replace() {
        let mut controller = controller_with_items(2);

        // Classify item 1 fully first
        controller
            .edit_single(
                1,
                &ItemPatch {
                    counterparty_id: Some(1),
                    category_id: Some(2),
                    ledger_type: None,
                },
            )
            .unwrap();

        // Bulk-apply only a category to both items
        controller.toggle_select_all();
        let count = controller
            .apply_bulk(&ItemPatch {
                counterparty_id: None,
                category_id: Some(5),
                ledger_type: None,
            })
            .unwrap();
        assert_eq!(count, 2);

        let items = &controller.session().unwrap().items;
        assert_eq!(items[0].category_id, Some(5));
        assert_eq!(items[1].category_id, Some(5));
        // Prior counterparty on item 1 is preserved (patch, not replace)
        assert_eq!(items[0].counterparty_id, Some(1));
        assert_eq!(items[1].counterparty_id, None);

        // Selection survives the bulk apply
        assert!(controller.all_selected());
    }

    #[test]
    fn test_apply_bulk_requires_selection() {
        let mut controller = controller_with_items(2);
        let err = controller
            .apply_bulk(&ItemPatch {
                category_id: Some(5),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_bulk_with_stale_selection_skips_unknown_ids() {
        let mut controller = controller_with_items(2);

        controller.toggle_select(1);
        controller.toggle_select(42); // stale id, not in the session

        let count = controller
            .apply_bulk(&ItemPatch {
                category_id: Some(5),
                ..Default::default()
            })
            .unwrap();

        // One response entry per found id; the stale id is silently skipped
        assert_eq!(count, 1);
        let items = &controller.session().unwrap().items;
        assert_eq!(items[0].category_id, Some(5));
        assert_eq!(items[1].category_id, None);
        // Selection membership is untouched, stale id included
        assert!(controller.selected_ids().contains(&42));
    }

    #[test]
    fn test_toggle_select_all_spans_pages() {
        // More items than one page
        let mut controller = controller_with_items(60);

        controller.toggle_select_all();
        assert!(controller.all_selected());
        assert_eq!(controller.selected_ids().len(), 60);

        controller.toggle_select_all();
        assert!(controller.selected_ids().is_empty());
    }

    #[test]
    fn test_pagination_slices_are_stable() {
        let mut controller = controller_with_items(60);

        assert_eq!(controller.total_pages(), 3);
        assert_eq!(controller.paged_items().len(), PAGE_SIZE);
        assert_eq!(controller.paged_items()[0].id, 1);

        controller.go_to_page(2);
        assert_eq!(controller.paged_items().len(), 10);
        assert_eq!(controller.paged_items()[0].id, 51);

        // Edits do not reorder items, so page indices stay stable
        controller
            .edit_single(
                51,
                &ItemPatch {
                    category_id: Some(2),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(controller.paged_items()[0].id, 51);
        assert_eq!(controller.current_page(), 2);
    }

    #[test]
    fn test_confirm_requires_full_classification() {
        let mut controller = controller_with_items(2);

        controller
            .edit_single(
                1,
                &ItemPatch {
                    counterparty_id: Some(1),
                    category_id: Some(2),
                    ledger_type: None,
                },
            )
            .unwrap();

        let err = controller.confirm().unwrap_err();
        assert!(matches!(err, Error::IncompleteClassification(1)));

        // Recoverable: session unchanged, still editable
        assert!(controller.is_editable());
        assert!(!controller.is_confirming());
    }

    #[test]
    fn test_confirm_then_edit_fails_terminal() {
        let mut controller = controller_with_items(2);

        controller.toggle_select_all();
        controller
            .apply_bulk(&ItemPatch {
                counterparty_id: Some(1),
                category_id: Some(2),
                ledger_type: None,
            })
            .unwrap();
        assert!(controller.all_ready());

        controller.confirm().unwrap();
        assert!(!controller.is_editable());

        // Any further edit surfaces SessionNotEditable from the store
        let err = controller
            .edit_single(
                1,
                &ItemPatch {
                    category_id: Some(9),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::SessionNotEditable));

        // Re-invoking the transition also fails
        let err = controller.confirm().unwrap_err();
        assert!(matches!(err, Error::SessionNotEditable));
    }

    #[test]
    fn test_cancel_twice_fails_second_time() {
        let mut controller = controller_with_items(1);

        controller.cancel().unwrap();
        assert!(!controller.is_editable());

        let err = controller.cancel().unwrap_err();
        assert!(matches!(err, Error::SessionNotEditable));
    }

    #[test]
    fn test_all_ready_tracks_edit_sequences() {
        let mut controller = controller_with_items(2);

        // Single edit, then batch edit, then final single edit
        controller
            .edit_single(
                1,
                &ItemPatch {
                    counterparty_id: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(controller.ready_count(), 0);

        controller.toggle_select_all();
        controller
            .apply_bulk(&ItemPatch {
                category_id: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(controller.ready_count(), 1);

        controller
            .edit_single(
                2,
                &ItemPatch {
                    counterparty_id: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(controller.ready_count(), 2);
        assert!(controller.all_ready());
    }
}
