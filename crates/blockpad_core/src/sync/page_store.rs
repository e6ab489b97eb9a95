//! Persistence API contract.
//!
//! # Responsibility
//! - Define the page CRUD operations the engine consumes.
//! - Classify transport failures into the error kinds the engine reacts to.
//!
//! # Invariants
//! - `Unauthorized` is reported for rejected credentials only; callers end
//!   the session but keep local edits dirty.
//! - Implementations never see local invariant violations.

use crate::model::page::{NewPage, PageId, PageRecord, PageUpdate};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of one persistence API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transport failure (`status == None`) or non-success response.
    NetworkOrServer {
        status: Option<u16>,
        message: String,
    },
    /// Credential missing, expired or rejected.
    Unauthorized,
    /// Response body did not match the expected shape.
    InvalidResponse(String),
}

impl StoreError {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::NetworkOrServer {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkOrServer {
            status: None,
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Stable short code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NetworkOrServer { status: None, .. } => "network",
            Self::NetworkOrServer { .. } => "server",
            Self::Unauthorized => "unauthorized",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkOrServer {
                status: Some(status),
                message,
            } => write!(f, "server error {status}: {message}"),
            Self::NetworkOrServer {
                status: None,
                message,
            } => write!(f, "network error: {message}"),
            Self::Unauthorized => write!(f, "session expired or credential rejected"),
            Self::InvalidResponse(details) => write!(f, "invalid response: {details}"),
        }
    }
}

impl Error for StoreError {}

/// Remote page storage consumed by the engine.
///
/// Calls are blocking from the caller's point of view. Hosts with an
/// asynchronous transport drive saves through `Editor::take_due_saves` and
/// `Editor::complete_save` instead of implementing this trait.
pub trait PageStore {
    /// Lists every page visible to the session.
    fn list_pages(&self) -> StoreResult<Vec<PageRecord>>;
    /// Creates one page and returns the id assigned by storage.
    fn create_page(&self, page: &NewPage) -> StoreResult<PageId>;
    /// Replaces title and content of one page.
    fn update_page(&self, id: PageId, update: &PageUpdate) -> StoreResult<()>;
    /// Deletes one page permanently.
    fn delete_page(&self, id: PageId) -> StoreResult<()>;
}

impl<S: PageStore + ?Sized> PageStore for &S {
    fn list_pages(&self) -> StoreResult<Vec<PageRecord>> {
        (**self).list_pages()
    }

    fn create_page(&self, page: &NewPage) -> StoreResult<PageId> {
        (**self).create_page(page)
    }

    fn update_page(&self, id: PageId, update: &PageUpdate) -> StoreResult<()> {
        (**self).update_page(id, update)
    }

    fn delete_page(&self, id: PageId) -> StoreResult<()> {
        (**self).delete_page(id)
    }
}
