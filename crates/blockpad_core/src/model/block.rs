//! Block domain model.
//!
//! # Responsibility
//! - Define the unit of page content addressed by every editing operation.
//! - Own the closed set of block kinds a slash command can retype to.
//!
//! # Invariants
//! - `id` is assigned at creation and never reused for another block.
//! - A new block is an empty `Paragraph`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a block inside a page.
///
/// Operations address blocks by id, never by position, so reorder and merge
/// stay correct regardless of how the host renders the page.
pub type BlockId = Uuid;

/// Visual/semantic type of one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    #[default]
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    BulletedItem,
    NumberedItem,
}

impl BlockKind {
    pub const ALL: [BlockKind; 6] = [
        BlockKind::Paragraph,
        BlockKind::Heading1,
        BlockKind::Heading2,
        BlockKind::Heading3,
        BlockKind::BulletedItem,
        BlockKind::NumberedItem,
    ];

    /// Stable wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading1 => "heading1",
            Self::Heading2 => "heading2",
            Self::Heading3 => "heading3",
            Self::BulletedItem => "bulleted-item",
            Self::NumberedItem => "numbered-item",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(normalized))
    }
}

/// One typed line of plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    pub text: String,
}

impl Block {
    /// Creates an empty paragraph with a fresh id.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4(), BlockKind::Paragraph, String::new())
    }

    /// Creates a paragraph with a fresh id carrying `text`.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), BlockKind::Paragraph, text)
    }

    /// Creates a block with a caller-provided id.
    ///
    /// Used when decoding persisted content where identity already exists.
    pub fn with_id(id: BlockId, kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            text: text.into(),
        }
    }

    /// Blank means nothing but whitespace; Backspace treats it as empty.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a character offset into a byte index, clamped to the text end.
pub(crate) fn byte_index_for_char_offset(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map_or(text.len(), |(index, _)| index)
}
