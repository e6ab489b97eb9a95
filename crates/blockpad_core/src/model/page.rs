//! Page domain model and its persisted wire shape.
//!
//! # Responsibility
//! - Define the page aggregate edited by the engine.
//! - Define the record exchanged with the persistence API.
//!
//! # Invariants
//! - A `Page` always holds at least one block.
//! - `PageRecord::content` is opaque outside `model::content`.

use crate::model::block::Block;
use crate::model::content::{decode_content, encode_content};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the persistence API on creation.
pub type PageId = i64;

/// Title shown for pages whose title is still blank.
pub const UNTITLED_LABEL: &str = "Untitled";

/// Icon glyph used when configuration does not provide one.
pub const DEFAULT_PAGE_ICON: &str = "📄";

/// In-memory page aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    pub icon: String,
    pub blocks: Vec<Block>,
}

impl Page {
    /// Creates a page with an empty title and one empty paragraph.
    pub fn new(id: PageId, icon: impl Into<String>) -> Self {
        Self {
            id,
            title: String::new(),
            icon: icon.into(),
            blocks: vec![Block::new()],
        }
    }

    /// Builds a page from a persisted record, decoding its content.
    pub fn from_record(record: PageRecord) -> Self {
        let blocks = decode_content(&record.content);
        Self {
            id: record.id,
            title: record.title,
            icon: record.icon,
            blocks,
        }
    }

    /// Title for display, falling back to `Untitled` when blank.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED_LABEL
        } else {
            self.title.as_str()
        }
    }

    /// Serialized block sequence as stored by the persistence API.
    pub fn encoded_content(&self) -> String {
        encode_content(&self.blocks)
    }
}

/// Page as listed by the persistence API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: PageId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub content: String,
}

/// Payload of the create operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPage {
    pub title: String,
    pub icon: String,
    pub content: String,
}

/// Payload of the update operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageUpdate {
    pub title: String,
    pub content: String,
}
