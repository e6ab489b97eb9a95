use blockpad_core::{
    decode_content, Editor, EditorConfig, EditorEvent, MemoryPageStore, PageRecord, SaveStatus,
    Session, StoreError, WorkspaceError,
};
use web_time::Instant;

fn record(id: i64, title: &str, content: &str) -> PageRecord {
    PageRecord {
        id,
        title: title.to_string(),
        icon: "📝".to_string(),
        content: content.to_string(),
    }
}

fn session() -> Session {
    Session::new("token", "writer@example.com")
}

#[test]
fn empty_account_gets_a_first_page_on_load() {
    let mut editor = Editor::new(MemoryPageStore::new(), EditorConfig::default(), session());

    editor.load_pages().unwrap();

    assert_eq!(editor.store().page_count(), 1);
    assert_eq!(editor.workspace().len(), 1);
    let document = editor.current_document().unwrap();
    assert_eq!(document.len(), 1);
    assert!(document.blocks()[0].is_blank());
    assert_eq!(document.page().icon, EditorConfig::default().default_page_icon);
    assert_eq!(editor.page_view().unwrap().display_title, "Untitled");
}

#[test]
fn load_selects_first_listed_page_and_decodes_legacy_markup() {
    let store = MemoryPageStore::with_pages(vec![
        record(
            4,
            "Legacy",
            r#"<div class="editable-block" contenteditable="true">Milk &amp; eggs</div><div class="editable-block">Bread</div>"#,
        ),
        record(2, "Plain", "just text"),
    ]);
    let mut editor = Editor::new(store, EditorConfig::default(), session());

    editor.load_pages().unwrap();

    assert_eq!(editor.current_page_id(), Some(4));
    let texts: Vec<_> = editor
        .current_document()
        .unwrap()
        .blocks()
        .iter()
        .map(|block| block.text.clone())
        .collect();
    assert_eq!(texts, vec!["Milk & eggs", "Bread"]);
    let summaries = editor.page_list();
    assert_eq!(summaries.len(), 2);
    assert!(summaries[0].is_current);
    assert_eq!(summaries[1].display_title, "Plain");
}

#[test]
fn created_page_goes_first_and_becomes_current() {
    let store = MemoryPageStore::with_pages(vec![record(1, "Old", "")]);
    let mut editor = Editor::new(store, EditorConfig::default(), session());
    editor.load_pages().unwrap();

    let id = editor.create_page().unwrap();

    assert_eq!(editor.current_page_id(), Some(id));
    assert_eq!(editor.workspace().page_ids(), vec![id, 1]);
    let stored = editor.store().page(id).unwrap();
    assert_eq!(stored.title, "");
    assert_eq!(decode_content(&stored.content).len(), 1);
}

#[test]
fn deleting_the_last_page_is_rejected_locally() {
    let mut editor = Editor::new(MemoryPageStore::new(), EditorConfig::default(), session());
    editor.load_pages().unwrap();
    let only = editor.current_page_id().unwrap();
    editor.store().set_unavailable(true);

    let result = editor.delete_page(only);

    assert!(matches!(result, Err(WorkspaceError::InvariantViolation(_))));
    assert_eq!(editor.workspace().len(), 1);
    editor.store().set_unavailable(false);
    assert_eq!(editor.store().page_count(), 1);
}

#[test]
fn working_set_never_reaches_zero_pages() {
    let store = MemoryPageStore::with_pages(vec![
        record(1, "a", ""),
        record(2, "b", ""),
        record(3, "c", ""),
    ]);
    let mut editor = Editor::new(store, EditorConfig::default(), session());
    editor.load_pages().unwrap();

    for id in [2, 1, 3, 3, 2] {
        let _ = editor.delete_page(id);
        assert!(editor.workspace().len() >= 1);
    }
    assert_eq!(editor.workspace().page_ids(), vec![3]);
    assert_eq!(editor.current_page_id(), Some(3));
}

#[test]
fn deleting_current_page_opens_the_first_remaining() {
    let store = MemoryPageStore::with_pages(vec![record(1, "a", ""), record(2, "b", "")]);
    let mut editor = Editor::new(store, EditorConfig::default(), session());
    editor.load_pages().unwrap();
    editor.select_page(2).unwrap();

    editor.delete_page(2).unwrap();

    assert_eq!(editor.current_page_id(), Some(1));
    assert_eq!(editor.store().page_count(), 1);
}

#[test]
fn store_failure_on_delete_keeps_page() {
    let store = MemoryPageStore::with_pages(vec![record(1, "a", ""), record(2, "b", "")]);
    let mut editor = Editor::new(store, EditorConfig::default(), session());
    editor.load_pages().unwrap();
    editor.store().set_unavailable(true);

    let result = editor.delete_page(2);

    assert!(matches!(
        result,
        Err(WorkspaceError::Store(StoreError::NetworkOrServer { .. }))
    ));
    assert_eq!(editor.workspace().len(), 2);
}

#[test]
fn selecting_unknown_page_fails_and_keeps_current() {
    let store = MemoryPageStore::with_pages(vec![record(1, "a", "")]);
    let mut editor = Editor::new(store, EditorConfig::default(), session());
    editor.load_pages().unwrap();

    assert!(matches!(
        editor.select_page(99),
        Err(WorkspaceError::PageNotFound(99))
    ));
    assert_eq!(editor.current_page_id(), Some(1));
}

#[test]
fn switching_pages_closes_palette() {
    let store = MemoryPageStore::with_pages(vec![record(1, "a", ""), record(2, "b", "")]);
    let mut editor = Editor::new(store, EditorConfig::default(), session());
    editor.load_pages().unwrap();
    let block = editor.current_document().unwrap().first_block_id();
    editor.handle_text_input(block, "/", Instant::now());
    assert!(editor.palette_view().open);
    editor.take_events();

    editor.select_page(2).unwrap();

    assert!(!editor.palette_view().open);
    let events = editor.take_events();
    assert!(events.contains(&EditorEvent::PaletteChanged));
    assert!(events.contains(&EditorEvent::PageChanged(2)));
}

#[test]
fn unauthorized_listing_signals_session_expiry() {
    struct RejectingStore;

    impl blockpad_core::PageStore for RejectingStore {
        fn list_pages(&self) -> blockpad_core::StoreResult<Vec<PageRecord>> {
            Err(StoreError::Unauthorized)
        }
        fn create_page(&self, _page: &blockpad_core::NewPage) -> blockpad_core::StoreResult<i64> {
            Err(StoreError::Unauthorized)
        }
        fn update_page(
            &self,
            _id: i64,
            _update: &blockpad_core::PageUpdate,
        ) -> blockpad_core::StoreResult<()> {
            Err(StoreError::Unauthorized)
        }
        fn delete_page(&self, _id: i64) -> blockpad_core::StoreResult<()> {
            Err(StoreError::Unauthorized)
        }
    }

    let mut editor = Editor::new(RejectingStore, EditorConfig::default(), session());

    assert!(matches!(
        editor.load_pages(),
        Err(WorkspaceError::Store(StoreError::Unauthorized))
    ));
    assert_eq!(editor.take_events(), vec![EditorEvent::SessionExpired]);
    assert!(editor.workspace().is_empty());
}

#[test]
fn saved_title_shows_up_in_page_list() {
    let mut editor = Editor::new(MemoryPageStore::new(), EditorConfig::default(), session());
    editor.load_pages().unwrap();
    let start = Instant::now();

    editor.handle_title_input("Roadmap", start);
    editor.flush_due_saves(start + editor.config().quiet_period());

    let id = editor.current_page_id().unwrap();
    assert_eq!(editor.page_list()[0].display_title, "Roadmap");
    assert_eq!(editor.store().page(id).unwrap().title, "Roadmap");
}

#[test]
fn reload_keeps_unsaved_edits_and_their_pending_save() {
    let store = MemoryPageStore::with_pages(vec![record(1, "a", "stored"), record(2, "b", "")]);
    let mut editor = Editor::new(store, EditorConfig::default(), session());
    editor.load_pages().unwrap();
    let start = Instant::now();
    let block = editor.current_document().unwrap().first_block_id();
    editor.handle_text_input(block, "typed locally", start);

    editor.load_pages().unwrap();

    let document = editor.current_document().unwrap();
    assert_eq!(document.blocks()[0].text, "typed locally");
    assert!(document.has_unsaved_changes());
    assert_eq!(editor.save_status(), SaveStatus::Dirty);
    assert_eq!(editor.next_deadline(), Some(start + editor.config().quiet_period()));

    editor.flush_due_saves(start + editor.config().quiet_period());

    let stored = editor.store().page(1).unwrap();
    assert_eq!(decode_content(&stored.content)[0].text, "typed locally");
    assert_eq!(editor.save_status(), SaveStatus::Clean);
}
