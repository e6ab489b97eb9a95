//! Host-agnostic input and focus types shared by the controllers.

use crate::model::block::BlockId;

/// Keys the engine interprets; everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Escape,
    ArrowUp,
    ArrowDown,
    Other,
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_dom_key(value: &str) -> Self {
        match value {
            "Enter" => Self::Enter,
            "Backspace" => Self::Backspace,
            "Escape" | "Esc" => Self::Escape,
            "ArrowUp" | "Up" => Self::ArrowUp,
            "ArrowDown" | "Down" => Self::ArrowDown,
            _ => Self::Other,
        }
    }
}

/// One key press inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub shift: bool,
    /// Caret offset in characters within the focused block.
    pub caret_offset: usize,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            caret_offset: 0,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn at(mut self, caret_offset: usize) -> Self {
        self.caret_offset = caret_offset;
        self
    }
}

/// Whether the host must suppress its default handling of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Handled,
    PassThrough,
}

impl KeyDisposition {
    pub fn is_handled(self) -> bool {
        matches!(self, Self::Handled)
    }
}

/// Where the caret goes inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretOffset {
    Start,
    End,
}

/// Focus request for the rendering collaborator.
///
/// This is metadata for the host; the engine only keeps the latest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Focus {
    pub block_id: BlockId,
    pub caret: CaretOffset,
}

impl Focus {
    pub fn start_of(block_id: BlockId) -> Self {
        Self {
            block_id,
            caret: CaretOffset::Start,
        }
    }

    pub fn end_of(block_id: BlockId) -> Self {
        Self {
            block_id,
            caret: CaretOffset::End,
        }
    }
}
