//! Persistence boundary and save synchronization.
//!
//! # Responsibility
//! - Define the page persistence contract and its adapters.
//! - Debounce local mutations into serialized per-page saves.
//!
//! # Invariants
//! - At most one update call is in flight per page.
//! - Independent pages save independently.

pub mod autosave;
pub mod http_store;
pub mod memory_store;
pub mod page_store;
