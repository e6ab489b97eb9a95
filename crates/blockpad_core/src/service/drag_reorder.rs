//! Drag gesture state machine for single-block reorder.
//!
//! # Responsibility
//! - Capture the dragged block when a gesture starts from its handle.
//! - Track the single drop-target marker while hovering.
//! - Move the subject before the block it is released over.
//!
//! # Invariants
//! - At most one block is marked as drop target.
//! - The subject is never its own drop target.
//! - Cancel never mutates the document.

use crate::model::block::BlockId;
use crate::model::document::Document;
use log::debug;

/// Part of a block where a drag gesture started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSource {
    /// The dedicated drag handle next to the block.
    Handle,
    /// Anywhere else; such gestures belong to the host (text selection).
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    Idle,
    Dragging {
        subject: BlockId,
        target: Option<BlockId>,
    },
}

/// Outcome of a drop or gesture end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    Moved { subject: BlockId, before: BlockId },
    /// Dropped on a valid target that already follows the subject.
    Unchanged,
    Cancelled,
    /// No gesture was active.
    Idle,
}

/// Reorder controller for one editing surface.
#[derive(Debug, Clone)]
pub struct DragReorderController {
    state: DragState,
}

impl Default for DragReorderController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragReorderController {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn subject(&self) -> Option<BlockId> {
        match self.state {
            DragState::Dragging { subject, .. } => Some(subject),
            DragState::Idle => None,
        }
    }

    /// Block currently marked with the drop indicator.
    pub fn drop_target(&self) -> Option<BlockId> {
        match self.state {
            DragState::Dragging { target, .. } => target,
            DragState::Idle => None,
        }
    }

    /// Starts a gesture. Returns `false` when the gesture is not ours.
    pub fn begin(&mut self, block_id: BlockId, source: DragSource) -> bool {
        if source != DragSource::Handle {
            return false;
        }
        self.state = DragState::Dragging {
            subject: block_id,
            target: None,
        };
        true
    }

    /// Pointer moved over `over` while dragging.
    ///
    /// Hovering the subject itself or empty space keeps the previous marker.
    /// Returns whether the marker moved.
    pub fn hover(&mut self, over: Option<BlockId>) -> bool {
        let DragState::Dragging { subject, target } = &mut self.state else {
            return false;
        };
        match over {
            Some(block_id) if block_id != *subject && *target != Some(block_id) => {
                *target = Some(block_id);
                true
            }
            _ => false,
        }
    }

    /// Releases the gesture over `over`.
    pub fn drop_on(&mut self, document: &mut Document, over: Option<BlockId>) -> DragOutcome {
        let DragState::Dragging { subject, .. } = self.state else {
            return DragOutcome::Idle;
        };
        self.state = DragState::Idle;

        let target = over.filter(|&target| target != subject && document.block(target).is_some());
        let Some(target) = target else {
            debug!("event=drag_cancel module=drag_reorder status=ok reason=no_target");
            return DragOutcome::Cancelled;
        };
        if document.block(subject).is_none() {
            debug!("event=drag_cancel module=drag_reorder status=ok reason=subject_missing");
            return DragOutcome::Cancelled;
        }

        if !document.move_block_before(subject, target) {
            debug!("event=drag_drop module=drag_reorder status=unchanged");
            return DragOutcome::Unchanged;
        }
        debug!("event=drag_drop module=drag_reorder status=ok");
        DragOutcome::Moved {
            subject,
            before: target,
        }
    }

    /// Gesture ended (drop already handled, or aborted by the host).
    pub fn end(&mut self) -> DragOutcome {
        if !self.is_dragging() {
            return DragOutcome::Idle;
        }
        self.state = DragState::Idle;
        debug!("event=drag_cancel module=drag_reorder status=ok reason=gesture_end");
        DragOutcome::Cancelled
    }
}
