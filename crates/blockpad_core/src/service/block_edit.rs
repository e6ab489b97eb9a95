//! Keystroke-level block editing.
//!
//! # Responsibility
//! - Turn Enter / Backspace / text changes into document mutations.
//! - Decide where focus and caret land after a structural edit.
//!
//! # Invariants
//! - Shift+Enter and Backspace inside non-empty text are left to the host.
//! - Backspace never removes the last block of a page.
//! - After a merge the caret lands at the end of the predecessor's text.

use crate::model::block::BlockId;
use crate::model::document::{Document, DocumentResult};
use crate::service::input::{Focus, Key, KeyDisposition, KeyInput};

/// Result of routing one event through the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
    pub disposition: KeyDisposition,
    pub focus: Option<Focus>,
}

impl EditOutcome {
    fn pass_through() -> Self {
        Self {
            disposition: KeyDisposition::PassThrough,
            focus: None,
        }
    }

    fn handled(focus: Option<Focus>) -> Self {
        Self {
            disposition: KeyDisposition::Handled,
            focus,
        }
    }
}

/// Stateless translator from key events to document calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockEditController;

impl BlockEditController {
    pub fn new() -> Self {
        Self
    }

    /// Dispatches a key press inside `block_id`.
    pub fn handle_key(
        &self,
        document: &mut Document,
        block_id: BlockId,
        input: KeyInput,
    ) -> DocumentResult<EditOutcome> {
        match input.key {
            Key::Enter if !input.shift => self.enter(document, block_id, input.caret_offset),
            Key::Backspace => Ok(self.backspace(document, block_id)),
            _ => Ok(EditOutcome::pass_through()),
        }
    }

    /// Splits the block at the caret and focuses the start of the new block.
    pub fn enter(
        &self,
        document: &mut Document,
        block_id: BlockId,
        caret_offset: usize,
    ) -> DocumentResult<EditOutcome> {
        let created = document.split_block(block_id, caret_offset)?;
        Ok(EditOutcome::handled(Some(Focus::start_of(created))))
    }

    /// Removes an empty block in favour of its predecessor.
    ///
    /// Only intercepted when the block is blank and the page has more than
    /// one block. A blank first block is swallowed without mutation since
    /// there is nothing to merge into.
    pub fn backspace(&self, document: &mut Document, block_id: BlockId) -> EditOutcome {
        let is_blank = document.block(block_id).is_some_and(|block| block.is_blank());
        if !is_blank || document.len() <= 1 {
            return EditOutcome::pass_through();
        }

        let predecessor = document
            .index_of(block_id)
            .and_then(|index| index.checked_sub(1))
            .map(|index| document.blocks()[index].id);

        match predecessor {
            Some(previous_id) if document.merge_into_previous(block_id) => {
                EditOutcome::handled(Some(Focus::end_of(previous_id)))
            }
            _ => EditOutcome::handled(None),
        }
    }

    /// Mirrors the host's edited block content into the model.
    pub fn text_changed(
        &self,
        document: &mut Document,
        block_id: BlockId,
        text: &str,
    ) -> DocumentResult<()> {
        document.set_block_text(block_id, text)
    }
}
