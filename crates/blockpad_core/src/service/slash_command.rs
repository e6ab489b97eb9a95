//! Slash command palette state machine.
//!
//! # Responsibility
//! - Recognize a `/` trigger at the start of a block and filter commands.
//! - Track the highlighted command with circular navigation.
//! - Retype the block on commit, clearing the `/query` text.
//!
//! # Invariants
//! - States are `Closed` and `Open`; commit and cancel always end `Closed`.
//! - Cancel never mutates the document.
//! - While open, the highlighted index is always inside the match list
//!   (or zero when the list is empty).

use crate::model::block::{BlockId, BlockKind};
use crate::model::document::{Document, DocumentResult};
use crate::service::input::{Key, KeyDisposition};
use log::debug;

/// Character that opens the palette when it starts a block.
pub const SLASH_TRIGGER: char = '/';

/// One retype command offered by the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlashCommand {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: BlockKind,
}

impl SlashCommand {
    /// Case-insensitive substring match against label or name.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.label.to_lowercase().contains(&needle) || self.name.to_lowercase().contains(&needle)
    }
}

/// Fixed, ordered command list.
pub const SLASH_COMMANDS: [SlashCommand; 5] = [
    SlashCommand {
        name: "h1",
        label: "Heading 1",
        kind: BlockKind::Heading1,
    },
    SlashCommand {
        name: "h2",
        label: "Heading 2",
        kind: BlockKind::Heading2,
    },
    SlashCommand {
        name: "h3",
        label: "Heading 3",
        kind: BlockKind::Heading3,
    },
    SlashCommand {
        name: "bullet",
        label: "Bulleted list",
        kind: BlockKind::BulletedItem,
    },
    SlashCommand {
        name: "numbered",
        label: "Numbered list",
        kind: BlockKind::NumberedItem,
    },
];

/// Why the palette closed without committing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Escape,
    /// The block no longer starts with the trigger character.
    TriggerRemoved,
    /// Pointer interaction outside both palette and editing surface.
    PointerOutside,
    /// Enter pressed while no command matched.
    NoMatch,
    /// Editing moved to another block.
    FocusMoved,
    /// The target block disappeared from the document.
    BlockMissing,
}

impl CancelReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::Escape => "escape",
            Self::TriggerRemoved => "trigger_removed",
            Self::PointerOutside => "pointer_outside",
            Self::NoMatch => "no_match",
            Self::FocusMoved => "focus_moved",
            Self::BlockMissing => "block_missing",
        }
    }
}

/// Transition reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashEvent {
    /// Nothing observable changed.
    Unchanged,
    Opened,
    /// Query, match list or highlight changed while open.
    Updated,
    Committed { block_id: BlockId, kind: BlockKind },
    Cancelled(CancelReason),
}

impl SlashEvent {
    /// Whether the palette overlay must be re-rendered.
    pub fn changes_view(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Open palette state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPalette {
    pub block_id: BlockId,
    pub query: String,
    /// Indexes into the command list, in command order.
    pub matches: Vec<usize>,
    pub highlighted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PaletteState {
    Closed,
    Open(OpenPalette),
}

/// Slash command engine bound to the command list it filters.
#[derive(Debug, Clone)]
pub struct SlashCommandEngine {
    commands: Vec<SlashCommand>,
    state: PaletteState,
}

impl Default for SlashCommandEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SlashCommandEngine {
    pub fn new() -> Self {
        Self::with_commands(SLASH_COMMANDS.to_vec())
    }

    pub fn with_commands(commands: Vec<SlashCommand>) -> Self {
        Self {
            commands,
            state: PaletteState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PaletteState::Open(_))
    }

    pub fn open_palette(&self) -> Option<&OpenPalette> {
        match &self.state {
            PaletteState::Open(palette) => Some(palette),
            PaletteState::Closed => None,
        }
    }

    /// Commands currently matching the query, in list order.
    pub fn filtered(&self) -> Vec<&SlashCommand> {
        self.open_palette()
            .map(|palette| {
                palette
                    .matches
                    .iter()
                    .filter_map(|&index| self.commands.get(index))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn highlighted_command(&self) -> Option<&SlashCommand> {
        let palette = self.open_palette()?;
        let index = *palette.matches.get(palette.highlighted)?;
        self.commands.get(index)
    }

    /// Observes the text of the focused block after every change.
    pub fn text_changed(&mut self, block_id: BlockId, text: &str) -> SlashEvent {
        let open_block = self.open_palette().map(|palette| palette.block_id);

        let Some(query) = text.strip_prefix(SLASH_TRIGGER) else {
            return match open_block {
                Some(open_id) if open_id == block_id => self.close(CancelReason::TriggerRemoved),
                Some(_) => self.close(CancelReason::FocusMoved),
                None => SlashEvent::Unchanged,
            };
        };

        let matches = self.match_indexes(query);
        if let PaletteState::Open(palette) = &mut self.state {
            if palette.block_id == block_id {
                if palette.query == query && palette.matches == matches {
                    return SlashEvent::Unchanged;
                }
                if palette.matches != matches {
                    palette.highlighted = 0;
                    palette.matches = matches;
                }
                palette.query = query.to_string();
                return SlashEvent::Updated;
            }
        }

        debug!(
            "event=palette_open module=slash_command status=ok match_count={}",
            matches.len()
        );
        self.state = PaletteState::Open(OpenPalette {
            block_id,
            query: query.to_string(),
            matches,
            highlighted: 0,
        });
        SlashEvent::Opened
    }

    /// Moves the highlight down, wrapping after the last match.
    pub fn move_down(&mut self) -> SlashEvent {
        self.step(1)
    }

    /// Moves the highlight up, wrapping before the first match.
    pub fn move_up(&mut self) -> SlashEvent {
        self.step(-1)
    }

    /// Handles a key while open. Closed palettes never claim keys.
    ///
    /// Arrow keys, Enter and Escape are claimed; every other key passes
    /// through to the host's text editing.
    pub fn handle_key(
        &mut self,
        document: &mut Document,
        key: Key,
    ) -> DocumentResult<(KeyDisposition, SlashEvent)> {
        if !self.is_open() {
            return Ok((KeyDisposition::PassThrough, SlashEvent::Unchanged));
        }
        let event = match key {
            Key::ArrowDown => self.move_down(),
            Key::ArrowUp => self.move_up(),
            Key::Enter => self.commit(document)?,
            Key::Escape => self.cancel(CancelReason::Escape),
            Key::Backspace | Key::Other => {
                return Ok((KeyDisposition::PassThrough, SlashEvent::Unchanged))
            }
        };
        Ok((KeyDisposition::Handled, event))
    }

    /// Applies the highlighted command.
    pub fn commit(&mut self, document: &mut Document) -> DocumentResult<SlashEvent> {
        let Some(palette) = self.open_palette() else {
            return Ok(SlashEvent::Unchanged);
        };
        let highlighted = palette.highlighted;
        self.commit_match(document, highlighted)
    }

    /// Applies the command at `index` of the filtered list (pointer pick).
    pub fn select(&mut self, document: &mut Document, index: usize) -> DocumentResult<SlashEvent> {
        let in_range = self
            .open_palette()
            .is_some_and(|palette| index < palette.matches.len());
        if !in_range {
            return Ok(SlashEvent::Unchanged);
        }
        self.commit_match(document, index)
    }

    /// Closes without touching the document.
    pub fn cancel(&mut self, reason: CancelReason) -> SlashEvent {
        if !self.is_open() {
            return SlashEvent::Unchanged;
        }
        self.close(reason)
    }

    /// Pointer pressed outside both palette and editing surface.
    pub fn pointer_down_outside(&mut self) -> SlashEvent {
        self.cancel(CancelReason::PointerOutside)
    }

    /// Drops palette state without reporting, e.g. on page switch.
    pub fn reset(&mut self) {
        self.state = PaletteState::Closed;
    }

    fn commit_match(&mut self, document: &mut Document, index: usize) -> DocumentResult<SlashEvent> {
        let PaletteState::Open(palette) = &self.state else {
            return Ok(SlashEvent::Unchanged);
        };
        let block_id = palette.block_id;
        let Some(command) = palette
            .matches
            .get(index)
            .and_then(|&command_index| self.commands.get(command_index))
            .copied()
        else {
            return Ok(self.close(CancelReason::NoMatch));
        };
        if document.block(block_id).is_none() {
            return Ok(self.close(CancelReason::BlockMissing));
        }

        self.state = PaletteState::Closed;
        document.retype_block(block_id, command.kind)?;
        document.set_block_text(block_id, "")?;
        debug!(
            "event=palette_commit module=slash_command status=ok command={} kind={}",
            command.name,
            command.kind.as_str()
        );
        Ok(SlashEvent::Committed {
            block_id,
            kind: command.kind,
        })
    }

    fn step(&mut self, delta: isize) -> SlashEvent {
        let PaletteState::Open(palette) = &mut self.state else {
            return SlashEvent::Unchanged;
        };
        let len = palette.matches.len();
        if len == 0 {
            return SlashEvent::Unchanged;
        }
        let next = (palette.highlighted as isize + delta).rem_euclid(len as isize) as usize;
        if next == palette.highlighted {
            return SlashEvent::Unchanged;
        }
        palette.highlighted = next;
        SlashEvent::Updated
    }

    fn match_indexes(&self, query: &str) -> Vec<usize> {
        self.commands
            .iter()
            .enumerate()
            .filter(|(_, command)| command.matches(query))
            .map(|(index, _)| index)
            .collect()
    }

    fn close(&mut self, reason: CancelReason) -> SlashEvent {
        self.state = PaletteState::Closed;
        debug!(
            "event=palette_cancel module=slash_command status=ok reason={}",
            reason.as_str()
        );
        SlashEvent::Cancelled(reason)
    }
}
