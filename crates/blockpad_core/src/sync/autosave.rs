//! Debounced save policy for one page.
//!
//! # Responsibility
//! - Collapse bursts of dirty notifications into one save after a quiet
//!   period.
//! - Serialize saves: at most one update call in flight per page.
//! - Re-arm after completion when edits arrived during the save.
//!
//! # Invariants
//! - `begin_save` only succeeds from `Dirty` with an elapsed deadline, so two
//!   saves for the same page never overlap.
//! - A notification received while saving is never dropped; it restarts the
//!   quiet period as soon as the save completes.
//! - Failures are not retried automatically; the next edit re-arms.
//!
//! Time is always passed in by the caller, which keeps the state machine
//! independent of any timer facility.

use crate::model::page::PageId;
use crate::sync::page_store::StoreError;
use log::{debug, info, warn};
use std::time::Duration;
use web_time::Instant;

/// Quiet period used when configuration does not override it.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1000);

/// Save state reported to the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Clean,
    Dirty,
    Saving,
    Failed,
}

impl SaveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Dirty => "dirty",
            Self::Saving => "saving",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncState {
    Clean,
    /// `deadline == None` keeps the page dirty without a scheduled save.
    Dirty { deadline: Option<Instant> },
    Saving { pending: bool },
    SaveFailed,
}

/// Result of reporting a finished save back to the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Saved and no edits arrived meanwhile.
    Saved,
    /// Save succeeded or failed on transport/server, and edits arrived
    /// meanwhile; re-armed.
    Rearmed { failure: Option<StoreError> },
    /// Save failed; waits for the next edit.
    Failed(StoreError),
    /// Credential rejected; local state stays dirty, nothing scheduled.
    Unauthorized,
    /// No save was in flight; the report was ignored.
    Ignored,
}

/// Per-page debounce and in-flight tracking.
#[derive(Debug, Clone)]
pub struct AutosaveSynchronizer {
    page_id: PageId,
    quiet_period: Duration,
    state: SyncState,
}

impl AutosaveSynchronizer {
    pub fn new(page_id: PageId, quiet_period: Duration) -> Self {
        Self {
            page_id,
            quiet_period,
            state: SyncState::Clean,
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn status(&self) -> SaveStatus {
        match self.state {
            SyncState::Clean => SaveStatus::Clean,
            SyncState::Dirty { .. } => SaveStatus::Dirty,
            SyncState::Saving { .. } => SaveStatus::Saving,
            SyncState::SaveFailed => SaveStatus::Failed,
        }
    }

    /// Whether a notification is waiting for the in-flight save to finish.
    pub fn has_pending(&self) -> bool {
        matches!(self.state, SyncState::Saving { pending: true })
    }

    /// Instant at which the scheduled save becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            SyncState::Dirty { deadline } => deadline,
            _ => None,
        }
    }

    /// Records a mutation observed at `now`.
    ///
    /// Restarts the quiet period, or marks the notification pending while a
    /// save is in flight.
    pub fn notify_dirty(&mut self, now: Instant) {
        self.state = match self.state {
            SyncState::Saving { .. } => SyncState::Saving { pending: true },
            SyncState::Clean | SyncState::Dirty { .. } | SyncState::SaveFailed => {
                SyncState::Dirty {
                    deadline: Some(now + self.quiet_period),
                }
            }
        };
    }

    /// Whether a save should start at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.state, SyncState::Dirty { deadline: Some(deadline) } if now >= deadline)
    }

    /// Transitions to `Saving` when the quiet period has elapsed.
    ///
    /// Returns `true` when the caller must now snapshot the page and issue
    /// exactly one update call.
    pub fn begin_save(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.state = SyncState::Saving { pending: false };
        info!(
            "event=autosave_start module=autosave status=start page_id={}",
            self.page_id
        );
        true
    }

    /// Reports the result of the in-flight update call.
    pub fn complete_save(&mut self, result: Result<(), StoreError>, now: Instant) -> SaveOutcome {
        let SyncState::Saving { pending } = self.state else {
            warn!(
                "event=autosave_done module=autosave status=ignored page_id={} reason=not_saving",
                self.page_id
            );
            return SaveOutcome::Ignored;
        };

        if let Err(StoreError::Unauthorized) = result {
            // Takes precedence over a pending edit; nothing is rescheduled.
            self.state = SyncState::Dirty { deadline: None };
            warn!(
                "event=autosave_done module=autosave status=error page_id={} error_code=unauthorized pending={}",
                self.page_id, pending
            );
            return SaveOutcome::Unauthorized;
        }

        if pending {
            self.state = SyncState::Dirty {
                deadline: Some(now + self.quiet_period),
            };
            let failure = result.err();
            debug!(
                "event=autosave_done module=autosave status=rearmed page_id={} failed={}",
                self.page_id,
                failure.is_some()
            );
            return SaveOutcome::Rearmed { failure };
        }

        match result {
            Ok(()) => {
                self.state = SyncState::Clean;
                info!(
                    "event=autosave_done module=autosave status=ok page_id={}",
                    self.page_id
                );
                SaveOutcome::Saved
            }
            Err(err) => {
                self.state = SyncState::SaveFailed;
                warn!(
                    "event=autosave_done module=autosave status=error page_id={} error_code={}",
                    self.page_id,
                    err.code()
                );
                SaveOutcome::Failed(err)
            }
        }
    }
}
