//! Block-structured page model.
//!
//! # Responsibility
//! - Define pages, blocks and the serialized content exchanged with storage.
//! - Own the structural mutation primitives every controller goes through.
//!
//! # Invariants
//! - Every block is identified by a stable `BlockId`.
//! - Every page holds at least one block; the working set at least one page.

pub mod block;
pub mod content;
pub mod document;
pub mod page;
pub mod workspace;
