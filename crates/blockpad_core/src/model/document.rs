//! Document model for one open page.
//!
//! # Responsibility
//! - Own the ordered block list of a page and its title.
//! - Expose the structural mutation primitives used by every controller.
//! - Record one change notification per applied mutation.
//!
//! # Invariants
//! - The block list is never empty.
//! - Block order is a total order; a move never duplicates or drops a block.
//! - A rejected or no-op operation leaves state and change log untouched.

use crate::model::block::{byte_index_for_char_offset, Block, BlockId, BlockKind};
use crate::model::page::{Page, PageId, PageUpdate};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors raised by addressed document operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// No block with this id exists on the page.
    BlockNotFound(BlockId),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlockNotFound(id) => write!(f, "block not found: {id}"),
        }
    }
}

impl Error for DocumentError {}

/// Change notification emitted by a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentChange {
    TitleChanged,
    TextChanged {
        block_id: BlockId,
    },
    BlockSplit {
        source: BlockId,
        created: BlockId,
    },
    BlockMerged {
        removed: BlockId,
        into: BlockId,
    },
    BlockMoved {
        block_id: BlockId,
        before: BlockId,
    },
    BlockRetyped {
        block_id: BlockId,
        kind: BlockKind,
    },
    Cleared {
        block_id: BlockId,
    },
}

/// Mutable document state for one page.
#[derive(Debug, Clone)]
pub struct Document {
    page: Page,
    revision: u64,
    persisted_revision: u64,
    changes: Vec<DocumentChange>,
}

impl Document {
    /// Wraps a page, restoring the non-empty block invariant if needed.
    pub fn new(mut page: Page) -> Self {
        if page.blocks.is_empty() {
            page.blocks.push(Block::new());
        }
        Self {
            page,
            revision: 0,
            persisted_revision: 0,
            changes: Vec::new(),
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn id(&self) -> PageId {
        self.page.id
    }

    pub fn title(&self) -> &str {
        &self.page.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.page.blocks
    }

    pub fn len(&self) -> usize {
        self.page.blocks.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.page.blocks.is_empty()
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.page.blocks.iter().find(|block| block.id == id)
    }

    pub fn index_of(&self, id: BlockId) -> Option<usize> {
        self.page.blocks.iter().position(|block| block.id == id)
    }

    pub fn first_block_id(&self) -> BlockId {
        self.page.blocks[0].id
    }

    pub fn block_ids(&self) -> Vec<BlockId> {
        self.page.blocks.iter().map(|block| block.id).collect()
    }

    /// Monotonic counter bumped by every applied mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether mutations happened after the last persisted snapshot.
    pub fn has_unsaved_changes(&self) -> bool {
        self.revision != self.persisted_revision
    }

    /// Records that the snapshot taken at `revision` reached the store.
    pub fn mark_persisted(&mut self, revision: u64) {
        if revision > self.persisted_revision && revision <= self.revision {
            self.persisted_revision = revision;
        }
    }

    /// Snapshot of title and serialized blocks for the update call.
    pub fn snapshot(&self) -> PageUpdate {
        PageUpdate {
            title: self.page.title.clone(),
            content: self.page.encoded_content(),
        }
    }

    /// Drains pending change notifications in application order.
    pub fn take_changes(&mut self) -> Vec<DocumentChange> {
        std::mem::take(&mut self.changes)
    }

    /// Splits a block at a character offset.
    ///
    /// The source keeps the text before `caret_offset`; a new paragraph
    /// placed right after it receives the remainder. Offsets past the end
    /// are clamped. Returns the new block id.
    pub fn split_block(&mut self, block_id: BlockId, caret_offset: usize) -> DocumentResult<BlockId> {
        let index = self
            .index_of(block_id)
            .ok_or(DocumentError::BlockNotFound(block_id))?;

        let source = &mut self.page.blocks[index];
        let split_at = byte_index_for_char_offset(&source.text, caret_offset);
        let remainder = source.text.split_off(split_at);

        let created = Block::paragraph(remainder);
        let created_id = created.id;
        self.page.blocks.insert(index + 1, created);

        debug!(
            "event=block_split module=document status=ok page_id={} index={} block_count={}",
            self.page.id,
            index,
            self.page.blocks.len()
        );
        self.record(DocumentChange::BlockSplit {
            source: block_id,
            created: created_id,
        });
        Ok(created_id)
    }

    /// Removes a block in favour of its predecessor.
    ///
    /// The predecessor keeps its own text unchanged and the removed block's
    /// text is discarded. Returns `false` without mutating when the block is
    /// unknown, is the only block, or has no predecessor.
    pub fn merge_into_previous(&mut self, block_id: BlockId) -> bool {
        if self.page.blocks.len() <= 1 {
            return false;
        }
        let Some(index) = self.index_of(block_id) else {
            return false;
        };
        if index == 0 {
            return false;
        }

        self.page.blocks.remove(index);
        let into = self.page.blocks[index - 1].id;

        debug!(
            "event=block_merge module=document status=ok page_id={} index={} block_count={}",
            self.page.id,
            index,
            self.page.blocks.len()
        );
        self.record(DocumentChange::BlockMerged {
            removed: block_id,
            into,
        });
        true
    }

    /// Relocates `block_id` so that it sits immediately before `target_id`.
    ///
    /// No-op when both ids are equal or either id is unknown. Returns whether
    /// the block order changed.
    pub fn move_block_before(&mut self, block_id: BlockId, target_id: BlockId) -> bool {
        if block_id == target_id {
            return false;
        }
        let (Some(from), Some(target)) = (self.index_of(block_id), self.index_of(target_id)) else {
            return false;
        };
        if from + 1 == target {
            return false;
        }

        let moved = self.page.blocks.remove(from);
        let insert_at = if from < target { target - 1 } else { target };
        self.page.blocks.insert(insert_at, moved);

        debug!(
            "event=block_move module=document status=ok page_id={} from={} to={}",
            self.page.id, from, insert_at
        );
        self.record(DocumentChange::BlockMoved {
            block_id,
            before: target_id,
        });
        true
    }

    /// Replaces the text of one block. Identical text is not a change.
    pub fn set_block_text(&mut self, block_id: BlockId, text: impl Into<String>) -> DocumentResult<()> {
        let text = text.into();
        let block = self.block_mut(block_id)?;
        if block.text == text {
            return Ok(());
        }
        block.text = text;
        self.record(DocumentChange::TextChanged { block_id });
        Ok(())
    }

    /// Changes the kind of one block. Identical kind is not a change.
    pub fn retype_block(&mut self, block_id: BlockId, kind: BlockKind) -> DocumentResult<()> {
        let page_id = self.page.id;
        let block = self.block_mut(block_id)?;
        if block.kind == kind {
            return Ok(());
        }
        block.kind = kind;
        debug!(
            "event=block_retype module=document status=ok page_id={} kind={}",
            page_id,
            kind.as_str()
        );
        self.record(DocumentChange::BlockRetyped { block_id, kind });
        Ok(())
    }

    /// Replaces the page title. Identical title is not a change.
    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        if self.page.title == title {
            return;
        }
        self.page.title = title;
        self.record(DocumentChange::TitleChanged);
    }

    /// Resets the page body to one empty paragraph and returns its id.
    pub fn clear(&mut self) -> BlockId {
        let block = Block::new();
        let block_id = block.id;
        self.page.blocks = vec![block];
        self.record(DocumentChange::Cleared { block_id });
        block_id
    }

    fn block_mut(&mut self, block_id: BlockId) -> DocumentResult<&mut Block> {
        self.page
            .blocks
            .iter_mut()
            .find(|block| block.id == block_id)
            .ok_or(DocumentError::BlockNotFound(block_id))
    }

    fn record(&mut self, change: DocumentChange) {
        self.revision += 1;
        self.changes.push(change);
    }
}
