//! Editing use-case services.
//!
//! # Responsibility
//! - Translate host input events into document mutations.
//! - Keep rendering hosts decoupled from persistence details.

pub mod block_edit;
pub mod drag_reorder;
pub mod editor;
pub mod input;
pub mod slash_command;
