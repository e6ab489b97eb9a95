//! In-process page store.
//!
//! Backs tests and the CLI demo. Records every update call and supports
//! queued failure injection so save-failure paths can be exercised.

use crate::model::page::{NewPage, PageId, PageRecord, PageUpdate};
use crate::sync::page_store::{PageStore, StoreError, StoreResult};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// One recorded `update_page` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub id: PageId,
    pub update: PageUpdate,
}

/// Single-threaded in-memory implementation of [`PageStore`].
#[derive(Debug)]
pub struct MemoryPageStore {
    pages: RefCell<Vec<PageRecord>>,
    next_id: Cell<PageId>,
    update_calls: RefCell<Vec<UpdateCall>>,
    update_failures: RefCell<VecDeque<StoreError>>,
    unavailable: Cell<bool>,
}

impl Default for MemoryPageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self {
            pages: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            update_calls: RefCell::new(Vec::new()),
            update_failures: RefCell::new(VecDeque::new()),
            unavailable: Cell::new(false),
        }
    }

    /// Seeds the store with existing records, listed in the given order.
    pub fn with_pages(pages: Vec<PageRecord>) -> Self {
        let store = Self::new();
        let next_id = pages.iter().map(|page| page.id).max().unwrap_or(0) + 1;
        store.next_id.set(next_id);
        *store.pages.borrow_mut() = pages;
        store
    }

    /// Makes the next `update_page` call fail with `error`.
    pub fn fail_next_update(&self, error: StoreError) {
        self.update_failures.borrow_mut().push_back(error);
    }

    /// Makes every call fail with a network error until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    pub fn update_calls(&self) -> Vec<UpdateCall> {
        self.update_calls.borrow().clone()
    }

    pub fn update_count(&self) -> usize {
        self.update_calls.borrow().len()
    }

    pub fn page(&self, id: PageId) -> Option<PageRecord> {
        self.pages.borrow().iter().find(|page| page.id == id).cloned()
    }

    pub fn page_count(&self) -> usize {
        self.pages.borrow().len()
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.unavailable.get() {
            return Err(StoreError::network("store unavailable"));
        }
        Ok(())
    }
}

impl PageStore for MemoryPageStore {
    fn list_pages(&self) -> StoreResult<Vec<PageRecord>> {
        self.ensure_available()?;
        Ok(self.pages.borrow().clone())
    }

    fn create_page(&self, page: &NewPage) -> StoreResult<PageId> {
        self.ensure_available()?;
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.pages.borrow_mut().insert(
            0,
            PageRecord {
                id,
                title: page.title.clone(),
                icon: page.icon.clone(),
                content: page.content.clone(),
            },
        );
        Ok(id)
    }

    fn update_page(&self, id: PageId, update: &PageUpdate) -> StoreResult<()> {
        self.update_calls.borrow_mut().push(UpdateCall {
            id,
            update: update.clone(),
        });
        self.ensure_available()?;
        if let Some(error) = self.update_failures.borrow_mut().pop_front() {
            return Err(error);
        }

        let mut pages = self.pages.borrow_mut();
        let record = pages
            .iter_mut()
            .find(|page| page.id == id)
            .ok_or_else(|| StoreError::server(404, format!("page {id} not found")))?;
        record.title = update.title.clone();
        record.content = update.content.clone();
        Ok(())
    }

    fn delete_page(&self, id: PageId) -> StoreResult<()> {
        self.ensure_available()?;
        let mut pages = self.pages.borrow_mut();
        let before = pages.len();
        pages.retain(|page| page.id != id);
        if pages.len() == before {
            return Err(StoreError::server(404, format!("page {id} not found")));
        }
        Ok(())
    }
}
