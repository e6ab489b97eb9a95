//! Core engine for Blockpad, a block-based page editor.
//! This crate is the single source of truth for editing and autosave
//! invariants; rendering hosts only forward events and draw the view.

pub mod config;
pub mod logging;
pub mod model;
pub mod service;
pub mod session;
pub mod sync;

pub use config::{ConfigError, EditorConfig};
pub use logging::{default_log_level, init_logging, init_logging_with_config, logging_status};
pub use model::block::{Block, BlockId, BlockKind};
pub use model::content::{decode_content, encode_content, CONTENT_VERSION};
pub use model::document::{Document, DocumentChange, DocumentError, DocumentResult};
pub use model::page::{NewPage, Page, PageId, PageRecord, PageUpdate, UNTITLED_LABEL};
pub use model::workspace::{Workspace, WorkspaceError, WorkspaceResult};
pub use service::block_edit::{BlockEditController, EditOutcome};
pub use service::drag_reorder::{DragOutcome, DragReorderController, DragSource};
pub use service::editor::{
    Editor, EditorEvent, EditorView, PageSummary, PageView, PaletteItem, PaletteView, SaveRequest,
};
pub use service::input::{CaretOffset, Focus, Key, KeyDisposition, KeyInput};
pub use service::slash_command::{
    CancelReason, SlashCommand, SlashCommandEngine, SlashEvent, SLASH_COMMANDS, SLASH_TRIGGER,
};
pub use session::Session;
pub use sync::autosave::{AutosaveSynchronizer, SaveOutcome, SaveStatus, DEFAULT_QUIET_PERIOD};
pub use sync::http_store::HttpPageStore;
pub use sync::memory_store::{MemoryPageStore, UpdateCall};
pub use sync::page_store::{PageStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
