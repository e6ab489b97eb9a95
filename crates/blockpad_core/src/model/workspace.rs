//! Working set of pages held by one editing session.
//!
//! # Responsibility
//! - Keep the ordered list of open page documents and the current page id.
//! - Enforce the "at least one page" invariant on local removal.
//!
//! # Invariants
//! - Once populated, the working set never drops to zero pages.
//! - `current` always names a page present in the set, or is `None` only
//!   while the set is still empty.

use crate::model::document::Document;
use crate::model::page::{Page, PageId};
use crate::sync::page_store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

/// Errors from page working-set operations.
#[derive(Debug)]
pub enum WorkspaceError {
    /// No page with this id is in the working set.
    PageNotFound(PageId),
    /// Operation refused locally because it would break an invariant.
    InvariantViolation(&'static str),
    /// Persistence API failure.
    Store(StoreError),
}

impl Display for WorkspaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PageNotFound(id) => write!(f, "page not found: {id}"),
            Self::InvariantViolation(details) => write!(f, "operation rejected: {details}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for WorkspaceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Ordered collection of page documents plus the current selection.
#[derive(Debug, Default)]
pub struct Workspace {
    documents: Vec<Document>,
    current: Option<PageId>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn current_id(&self) -> Option<PageId> {
        self.current
    }

    pub fn page_ids(&self) -> Vec<PageId> {
        self.documents.iter().map(Document::id).collect()
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.documents.iter().map(Document::page)
    }

    pub fn contains(&self, id: PageId) -> bool {
        self.documents.iter().any(|document| document.id() == id)
    }

    pub fn document(&self, id: PageId) -> Option<&Document> {
        self.documents.iter().find(|document| document.id() == id)
    }

    pub fn document_mut(&mut self, id: PageId) -> Option<&mut Document> {
        self.documents.iter_mut().find(|document| document.id() == id)
    }

    pub fn current(&self) -> Option<&Document> {
        self.current.and_then(|id| self.document(id))
    }

    pub fn current_mut(&mut self) -> Option<&mut Document> {
        let id = self.current?;
        self.document_mut(id)
    }

    /// Replaces the working set with freshly loaded pages.
    ///
    /// Keeps the current selection when the page is still present,
    /// otherwise selects the first page. A local document with unsaved
    /// changes wins over the loaded copy of the same page; returns how many
    /// were kept that way.
    pub fn replace_all(&mut self, pages: Vec<Page>) -> usize {
        let mut previous = std::mem::take(&mut self.documents);
        let mut kept_unsaved = 0;
        self.documents = pages
            .into_iter()
            .map(|page| {
                let local = previous
                    .iter()
                    .position(|document| document.id() == page.id && document.has_unsaved_changes());
                match local {
                    Some(index) => {
                        kept_unsaved += 1;
                        previous.swap_remove(index)
                    }
                    None => Document::new(page),
                }
            })
            .collect();
        let keep_current = self.current.is_some_and(|id| self.contains(id));
        if !keep_current {
            self.current = self.documents.first().map(Document::id);
        }
        kept_unsaved
    }

    /// Inserts a page at the front and makes it current.
    pub fn insert_front(&mut self, page: Page) {
        let id = page.id;
        self.documents.insert(0, Document::new(page));
        self.current = Some(id);
    }

    pub fn select(&mut self, id: PageId) -> WorkspaceResult<()> {
        if !self.contains(id) {
            return Err(WorkspaceError::PageNotFound(id));
        }
        self.current = Some(id);
        Ok(())
    }

    /// Checks whether `id` may be removed without emptying the set.
    pub fn check_removable(&self, id: PageId) -> WorkspaceResult<()> {
        if !self.contains(id) {
            return Err(WorkspaceError::PageNotFound(id));
        }
        if self.documents.len() <= 1 {
            return Err(WorkspaceError::InvariantViolation(
                "cannot delete the last page",
            ));
        }
        Ok(())
    }

    /// Removes a page; the first remaining page becomes current if needed.
    pub fn remove(&mut self, id: PageId) -> WorkspaceResult<Document> {
        self.check_removable(id)?;
        let index = self
            .documents
            .iter()
            .position(|document| document.id() == id)
            .ok_or(WorkspaceError::PageNotFound(id))?;
        let removed = self.documents.remove(index);
        if self.current == Some(id) {
            self.current = self.documents.first().map(Document::id);
        }
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.current = None;
    }
}
