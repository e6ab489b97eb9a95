//! Editing session use-case service.
//!
//! # Responsibility
//! - Own the session context: credential, working set, controllers and
//!   per-page autosave state.
//! - Route input and gesture events to the right controller.
//! - Forward document change notifications to the autosave synchronizer.
//! - Expose page, palette and save-status state to the rendering host.
//!
//! # Invariants
//! - While the slash palette is open it claims the keyboard of its own
//!   block; a key from any other block closes it first.
//! - Mutations are applied in event order; every applied mutation re-arms
//!   the debounce of its own page.
//! - At most one save per page is handed out until its completion is
//!   reported.
//! - Local invariant violations never reach the store.

use crate::config::EditorConfig;
use crate::model::block::{Block, BlockId, BlockKind};
use crate::model::content::encode_content;
use crate::model::document::Document;
use crate::model::page::{NewPage, Page, PageId, PageUpdate};
use crate::model::workspace::{Workspace, WorkspaceError, WorkspaceResult};
use crate::service::block_edit::BlockEditController;
use crate::service::drag_reorder::{DragOutcome, DragReorderController, DragSource};
use crate::service::input::{Focus, KeyDisposition, KeyInput};
use crate::service::slash_command::{CancelReason, SlashCommandEngine, SlashEvent};
use crate::session::Session;
use crate::sync::autosave::{AutosaveSynchronizer, SaveOutcome, SaveStatus};
use crate::sync::page_store::{PageStore, StoreError};
use log::{info, warn};
use std::collections::BTreeMap;
use web_time::Instant;

/// Notification for the rendering host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// Title, blocks, or focus of a page changed.
    PageChanged(PageId),
    /// Pages were added, removed, reloaded, or the selection changed.
    PageListChanged,
    /// Palette opened, closed, or its filter/highlight changed.
    PaletteChanged,
    SaveStatusChanged { page_id: PageId, status: SaveStatus },
    SaveFailed { page_id: PageId, error: StoreError },
    /// The store rejected the credential; the host should end the session.
    SessionExpired,
}

/// One update call handed to the host transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub page_id: PageId,
    /// Document revision the snapshot was taken at.
    pub revision: u64,
    pub update: PageUpdate,
}

/// Render model of the open page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub id: PageId,
    pub title: String,
    pub display_title: String,
    pub icon: String,
    pub blocks: Vec<Block>,
    pub active_block: Option<BlockId>,
    /// Latest caret request; applied by the host after re-render.
    pub focus: Option<Focus>,
    pub drop_target: Option<BlockId>,
}

/// One row of the command overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteItem {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: BlockKind,
}

/// Render model of the command overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaletteView {
    pub open: bool,
    pub block_id: Option<BlockId>,
    pub query: String,
    pub items: Vec<PaletteItem>,
    pub highlighted: usize,
}

/// Sidebar row for one page of the working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub id: PageId,
    pub display_title: String,
    pub icon: String,
    pub is_current: bool,
}

/// Complete render model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorView {
    pub page: Option<PageView>,
    pub palette: PaletteView,
    pub save_status: SaveStatus,
}

/// Block editing session over a page store.
pub struct Editor<S: PageStore> {
    store: S,
    config: EditorConfig,
    session: Session,
    ended: bool,
    workspace: Workspace,
    block_edit: BlockEditController,
    slash: SlashCommandEngine,
    drag: DragReorderController,
    autosave: BTreeMap<PageId, AutosaveSynchronizer>,
    in_flight: BTreeMap<PageId, u64>,
    active_block: Option<BlockId>,
    focus: Option<Focus>,
    events: Vec<EditorEvent>,
}

impl<S: PageStore> Editor<S> {
    /// Starts a session; call `load_pages` before editing.
    pub fn new(store: S, config: EditorConfig, session: Session) -> Self {
        Self {
            store,
            config,
            session,
            ended: false,
            workspace: Workspace::new(),
            block_edit: BlockEditController::new(),
            slash: SlashCommandEngine::new(),
            drag: DragReorderController::new(),
            autosave: BTreeMap::new(),
            in_flight: BTreeMap::new(),
            active_block: None,
            focus: None,
            events: Vec::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn current_page_id(&self) -> Option<PageId> {
        self.workspace.current_id()
    }

    pub fn current_document(&self) -> Option<&Document> {
        self.workspace.current()
    }

    pub fn palette(&self) -> &SlashCommandEngine {
        &self.slash
    }

    pub fn drag(&self) -> &DragReorderController {
        &self.drag
    }

    pub fn active_block(&self) -> Option<BlockId> {
        self.active_block
    }

    pub fn focus(&self) -> Option<Focus> {
        self.focus
    }

    // ---- page working set -------------------------------------------------

    /// Loads the working set; creates a first page when none exist.
    ///
    /// On reload, pages with unsaved local edits keep the local copy and
    /// their autosave schedule.
    pub fn load_pages(&mut self) -> WorkspaceResult<()> {
        let started_at = Instant::now();
        let records = match self.store.list_pages() {
            Ok(records) => records,
            Err(err) => {
                warn!(
                    "event=page_load module=editor status=error error_code={}",
                    err.code()
                );
                return Err(self.surface_store_error(err));
            }
        };

        if records.is_empty() {
            info!("event=page_load module=editor status=ok page_count=0 action=create_first");
            return self.create_page().map(|_| ());
        }

        let count = records.len();
        let kept_unsaved = self
            .workspace
            .replace_all(records.into_iter().map(Page::from_record).collect());
        let present = self.workspace.page_ids();
        self.autosave.retain(|id, _| present.contains(id));
        self.in_flight.retain(|id, _| present.contains(id));
        self.reset_surface();
        info!(
            "event=page_load module=editor status=ok page_count={} kept_unsaved_count={} duration_ms={}",
            count,
            kept_unsaved,
            started_at.elapsed().as_millis()
        );
        self.events.push(EditorEvent::PageListChanged);
        if let Some(id) = self.workspace.current_id() {
            self.events.push(EditorEvent::PageChanged(id));
        }
        Ok(())
    }

    /// Creates an empty page at the front of the working set and opens it.
    pub fn create_page(&mut self) -> WorkspaceResult<PageId> {
        let page_icon = self.config.default_page_icon.clone();
        let first_block = Block::new();
        let draft = NewPage {
            title: String::new(),
            icon: page_icon.clone(),
            content: encode_content(std::slice::from_ref(&first_block)),
        };
        let id = match self.store.create_page(&draft) {
            Ok(id) => id,
            Err(err) => {
                warn!(
                    "event=page_create module=editor status=error error_code={}",
                    err.code()
                );
                return Err(self.surface_store_error(err));
            }
        };

        self.workspace.insert_front(Page {
            id,
            title: String::new(),
            icon: page_icon,
            blocks: vec![first_block],
        });
        self.reset_surface();
        info!("event=page_create module=editor status=ok page_id={}", id);
        self.events.push(EditorEvent::PageListChanged);
        self.events.push(EditorEvent::PageChanged(id));
        Ok(id)
    }

    /// Deletes a page; the last remaining page is refused locally.
    pub fn delete_page(&mut self, id: PageId) -> WorkspaceResult<()> {
        if let Err(err) = self.workspace.check_removable(id) {
            warn!(
                "event=page_delete module=editor status=rejected page_id={} reason={}",
                id, err
            );
            return Err(err);
        }
        if let Err(err) = self.store.delete_page(id) {
            warn!(
                "event=page_delete module=editor status=error page_id={} error_code={}",
                id,
                err.code()
            );
            return Err(self.surface_store_error(err));
        }

        let was_current = self.workspace.current_id() == Some(id);
        self.workspace.remove(id)?;
        self.autosave.remove(&id);
        self.in_flight.remove(&id);
        if was_current {
            self.reset_surface();
            if let Some(current) = self.workspace.current_id() {
                self.events.push(EditorEvent::PageChanged(current));
            }
        }
        info!("event=page_delete module=editor status=ok page_id={}", id);
        self.events.push(EditorEvent::PageListChanged);
        Ok(())
    }

    /// Opens another page of the working set.
    pub fn select_page(&mut self, id: PageId) -> WorkspaceResult<()> {
        if self.workspace.current_id() == Some(id) {
            return Ok(());
        }
        self.workspace.select(id)?;
        self.reset_surface();
        self.events.push(EditorEvent::PageListChanged);
        self.events.push(EditorEvent::PageChanged(id));
        Ok(())
    }

    /// Sidebar rows in working-set order.
    pub fn page_list(&self) -> Vec<PageSummary> {
        let current = self.workspace.current_id();
        self.workspace
            .pages()
            .map(|page| PageSummary {
                id: page.id,
                display_title: page.display_title().to_string(),
                icon: page.icon.clone(),
                is_current: Some(page.id) == current,
            })
            .collect()
    }

    // ---- input routing ----------------------------------------------------

    /// Routes one key press inside `block_id` of the current page.
    pub fn handle_key(&mut self, block_id: BlockId, input: KeyInput, now: Instant) -> KeyDisposition {
        let Some(document) = self.workspace.current_mut() else {
            return KeyDisposition::PassThrough;
        };

        // A key from another block means focus left the palette's block.
        let palette_elsewhere = self
            .slash
            .open_palette()
            .is_some_and(|palette| palette.block_id != block_id);
        if palette_elsewhere {
            self.slash.cancel(CancelReason::FocusMoved);
            self.events.push(EditorEvent::PaletteChanged);
        }

        let disposition = if self.slash.is_open() {
            match self.slash.handle_key(document, input.key) {
                Ok((disposition, event)) => {
                    if let SlashEvent::Committed { block_id, .. } = event {
                        self.active_block = Some(block_id);
                        self.focus = Some(Focus::start_of(block_id));
                    }
                    if event.changes_view() {
                        self.events.push(EditorEvent::PaletteChanged);
                    }
                    disposition
                }
                Err(err) => {
                    warn!("event=key_input module=editor status=error source=palette error={err}");
                    KeyDisposition::Handled
                }
            }
        } else {
            match self.block_edit.handle_key(document, block_id, input) {
                Ok(outcome) => {
                    if let Some(focus) = outcome.focus {
                        self.active_block = Some(focus.block_id);
                        self.focus = Some(focus);
                    }
                    outcome.disposition
                }
                Err(err) => {
                    warn!("event=key_input module=editor status=error source=block_edit error={err}");
                    KeyDisposition::PassThrough
                }
            }
        };

        self.dispatch_changes(now);
        disposition
    }

    /// Mirrors edited block text and feeds the slash trigger recognizer.
    pub fn handle_text_input(&mut self, block_id: BlockId, text: &str, now: Instant) {
        let Some(document) = self.workspace.current_mut() else {
            return;
        };
        if let Err(err) = self.block_edit.text_changed(document, block_id, text) {
            warn!("event=text_input module=editor status=error error={err}");
            return;
        }
        self.active_block = Some(block_id);
        if self.slash.text_changed(block_id, text).changes_view() {
            self.events.push(EditorEvent::PaletteChanged);
        }
        self.dispatch_changes(now);
    }

    /// Mirrors the edited page title.
    pub fn handle_title_input(&mut self, title: &str, now: Instant) {
        let Some(document) = self.workspace.current_mut() else {
            return;
        };
        document.set_title(title);
        self.dispatch_changes(now);
    }

    /// Records that the host moved focus into `block_id`.
    pub fn focus_block(&mut self, block_id: BlockId) {
        let known = self
            .workspace
            .current()
            .is_some_and(|document| document.block(block_id).is_some());
        if !known {
            return;
        }
        self.active_block = Some(block_id);
        let palette_elsewhere = self
            .slash
            .open_palette()
            .is_some_and(|palette| palette.block_id != block_id);
        if palette_elsewhere {
            self.slash.cancel(CancelReason::FocusMoved);
            self.events.push(EditorEvent::PaletteChanged);
        }
    }

    /// Pointer pick of the filtered palette entry at `index`.
    pub fn palette_select(&mut self, index: usize, now: Instant) {
        let Some(document) = self.workspace.current_mut() else {
            return;
        };
        match self.slash.select(document, index) {
            Ok(SlashEvent::Committed { block_id, .. }) => {
                self.active_block = Some(block_id);
                self.focus = Some(Focus::start_of(block_id));
                self.events.push(EditorEvent::PaletteChanged);
            }
            Ok(event) if event.changes_view() => self.events.push(EditorEvent::PaletteChanged),
            Ok(_) => {}
            Err(err) => warn!("event=palette_select module=editor status=error error={err}"),
        }
        self.dispatch_changes(now);
    }

    /// Pointer pressed outside both the palette and the editing surface.
    pub fn pointer_down_outside(&mut self) {
        if self.slash.pointer_down_outside().changes_view() {
            self.events.push(EditorEvent::PaletteChanged);
        }
    }

    pub fn drag_start(&mut self, block_id: BlockId, source: DragSource) -> bool {
        let known = self
            .workspace
            .current()
            .is_some_and(|document| document.block(block_id).is_some());
        known && self.drag.begin(block_id, source)
    }

    /// Pointer hovers `over` during a drag; returns whether the marker moved.
    pub fn drag_over(&mut self, over: Option<BlockId>) -> bool {
        let moved = self.drag.hover(over);
        if moved {
            if let Some(id) = self.workspace.current_id() {
                self.events.push(EditorEvent::PageChanged(id));
            }
        }
        moved
    }

    pub fn drop_on(&mut self, over: Option<BlockId>, now: Instant) -> DragOutcome {
        let Some(document) = self.workspace.current_mut() else {
            return self.drag.end();
        };
        let outcome = self.drag.drop_on(document, over);
        self.dispatch_changes(now);
        if matches!(outcome, DragOutcome::Cancelled | DragOutcome::Unchanged) {
            if let Some(id) = self.workspace.current_id() {
                self.events.push(EditorEvent::PageChanged(id));
            }
        }
        outcome
    }

    /// Gesture finished; clears any leftover marker.
    pub fn drag_end(&mut self) -> DragOutcome {
        let outcome = self.drag.end();
        if outcome == DragOutcome::Cancelled {
            if let Some(id) = self.workspace.current_id() {
                self.events.push(EditorEvent::PageChanged(id));
            }
        }
        outcome
    }

    // ---- autosave ---------------------------------------------------------

    /// Save status of the current page.
    pub fn save_status(&self) -> SaveStatus {
        self.workspace
            .current_id()
            .map_or(SaveStatus::Clean, |id| self.save_status_of(id))
    }

    pub fn save_status_of(&self, page_id: PageId) -> SaveStatus {
        self.autosave
            .get(&page_id)
            .map_or(SaveStatus::Clean, AutosaveSynchronizer::status)
    }

    /// Earliest instant at which `take_due_saves` will return work.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.autosave
            .values()
            .filter_map(AutosaveSynchronizer::deadline)
            .min()
    }

    /// Starts every save whose quiet period elapsed by `now`.
    ///
    /// Each returned request must be answered with `complete_save`.
    pub fn take_due_saves(&mut self, now: Instant) -> Vec<SaveRequest> {
        if self.ended {
            return Vec::new();
        }
        let mut requests = Vec::new();
        for (&page_id, sync) in self.autosave.iter_mut() {
            let Some(document) = self.workspace.document(page_id) else {
                continue;
            };
            if !sync.begin_save(now) {
                continue;
            }
            let revision = document.revision();
            self.in_flight.insert(page_id, revision);
            requests.push(SaveRequest {
                page_id,
                revision,
                update: document.snapshot(),
            });
            self.events.push(EditorEvent::SaveStatusChanged {
                page_id,
                status: SaveStatus::Saving,
            });
        }
        requests
    }

    /// Reports the result of a save handed out by `take_due_saves`.
    pub fn complete_save(
        &mut self,
        page_id: PageId,
        result: Result<(), StoreError>,
        now: Instant,
    ) -> SaveOutcome {
        let Some(sync) = self.autosave.get_mut(&page_id) else {
            return SaveOutcome::Ignored;
        };
        let revision = self.in_flight.remove(&page_id);
        let succeeded = result.is_ok();
        let outcome = sync.complete_save(result, now);
        let status = sync.status();

        if outcome == SaveOutcome::Ignored {
            return outcome;
        }
        if succeeded {
            if let (Some(document), Some(revision)) =
                (self.workspace.document_mut(page_id), revision)
            {
                document.mark_persisted(revision);
            }
            self.events.push(EditorEvent::PageListChanged);
        }
        match &outcome {
            SaveOutcome::Failed(error)
            | SaveOutcome::Rearmed {
                failure: Some(error),
            } => {
                if error.is_unauthorized() {
                    self.events.push(EditorEvent::SessionExpired);
                }
                self.events.push(EditorEvent::SaveFailed {
                    page_id,
                    error: error.clone(),
                });
            }
            SaveOutcome::Unauthorized => self.events.push(EditorEvent::SessionExpired),
            _ => {}
        }
        self.events
            .push(EditorEvent::SaveStatusChanged { page_id, status });
        outcome
    }

    /// Runs every due save synchronously against the owned store.
    pub fn flush_due_saves(&mut self, now: Instant) -> Vec<(PageId, SaveOutcome)> {
        let requests = self.take_due_saves(now);
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            let result = self.store.update_page(request.page_id, &request.update);
            let outcome = self.complete_save(request.page_id, result, now);
            outcomes.push((request.page_id, outcome));
        }
        outcomes
    }

    // ---- render surface ---------------------------------------------------

    pub fn view(&self) -> EditorView {
        EditorView {
            page: self.page_view(),
            palette: self.palette_view(),
            save_status: self.save_status(),
        }
    }

    pub fn page_view(&self) -> Option<PageView> {
        let page = self.workspace.current()?.page();
        Some(PageView {
            id: page.id,
            title: page.title.clone(),
            display_title: page.display_title().to_string(),
            icon: page.icon.clone(),
            blocks: page.blocks.clone(),
            active_block: self.active_block,
            focus: self.focus,
            drop_target: self.drag.drop_target(),
        })
    }

    pub fn palette_view(&self) -> PaletteView {
        let Some(palette) = self.slash.open_palette() else {
            return PaletteView::default();
        };
        PaletteView {
            open: true,
            block_id: Some(palette.block_id),
            query: palette.query.clone(),
            items: self
                .slash
                .filtered()
                .into_iter()
                .map(|command| PaletteItem {
                    name: command.name,
                    label: command.label,
                    kind: command.kind,
                })
                .collect(),
            highlighted: palette.highlighted,
        }
    }

    /// Drains notifications accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Ends the session: drops the credential, pages and scheduled saves.
    pub fn logout(&mut self) {
        let unsaved = self
            .autosave
            .values()
            .filter(|sync| sync.status() != SaveStatus::Clean)
            .count();
        if unsaved > 0 {
            warn!(
                "event=logout module=editor status=ok unsaved_page_count={}",
                unsaved
            );
        } else {
            info!("event=logout module=editor status=ok unsaved_page_count=0");
        }
        self.session.end();
        self.ended = true;
        self.workspace.clear();
        self.autosave.clear();
        self.in_flight.clear();
        self.reset_surface();
        self.events.push(EditorEvent::PageListChanged);
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    // ---- internals ----------------------------------------------------------

    /// Forwards pending change notifications of every page to autosave.
    fn dispatch_changes(&mut self, now: Instant) {
        let quiet_period = self.config.quiet_period();
        for page_id in self.workspace.page_ids() {
            let Some(document) = self.workspace.document_mut(page_id) else {
                continue;
            };
            if document.take_changes().is_empty() {
                continue;
            }
            let sync = self
                .autosave
                .entry(page_id)
                .or_insert_with(|| AutosaveSynchronizer::new(page_id, quiet_period));
            let before = sync.status();
            sync.notify_dirty(now);
            let after = sync.status();

            self.events.push(EditorEvent::PageChanged(page_id));
            if before != after {
                self.events.push(EditorEvent::SaveStatusChanged {
                    page_id,
                    status: after,
                });
            }
        }
    }

    /// Clears transient UI state and focuses the first block of the page.
    fn reset_surface(&mut self) {
        if self.slash.is_open() {
            self.events.push(EditorEvent::PaletteChanged);
        }
        self.slash.reset();
        self.drag.end();
        let first = self.workspace.current().map(Document::first_block_id);
        self.active_block = first;
        self.focus = first.map(Focus::start_of);
    }

    fn surface_store_error(&mut self, err: StoreError) -> WorkspaceError {
        if err.is_unauthorized() {
            self.events.push(EditorEvent::SessionExpired);
        }
        WorkspaceError::Store(err)
    }
}
