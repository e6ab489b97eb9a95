use blockpad_core::{
    AutosaveSynchronizer, BlockId, Editor, EditorConfig, EditorEvent, MemoryPageStore, SaveOutcome,
    SaveStatus, Session, StoreError, DEFAULT_QUIET_PERIOD,
};
use std::time::Duration;
use web_time::Instant;

fn editor() -> Editor<MemoryPageStore> {
    let mut editor = Editor::new(
        MemoryPageStore::new(),
        EditorConfig::default(),
        Session::new("token", "writer@example.com"),
    );
    editor.load_pages().unwrap();
    editor.take_events();
    editor
}

fn first_block(editor: &Editor<MemoryPageStore>) -> BlockId {
    editor.current_document().unwrap().first_block_id()
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[test]
fn five_quick_edits_produce_one_save_a_quiet_period_after_the_last() {
    let mut editor = editor();
    let block = first_block(&editor);
    let start = Instant::now();
    let edits = ["h", "he", "hel", "hell", "hello"];
    for (step, text) in edits.iter().enumerate() {
        editor.handle_text_input(block, text, start + ms(step as u64 * 200));
    }
    let last_edit = start + ms(800);

    let mut saved_at = Vec::new();
    for tick in 0..=80 {
        let now = start + ms(tick * 50);
        if !editor.flush_due_saves(now).is_empty() {
            saved_at.push(now);
        }
    }

    assert_eq!(editor.store().update_count(), 1);
    assert_eq!(saved_at, vec![last_edit + ms(1000)]);
    let call = &editor.store().update_calls()[0];
    let stored = blockpad_core::decode_content(&call.update.content);
    assert_eq!(stored[0].text, "hello");
    assert_eq!(editor.save_status(), SaveStatus::Clean);
}

#[test]
fn nothing_is_due_before_the_quiet_period_elapses() {
    let mut editor = editor();
    let block = first_block(&editor);
    let start = Instant::now();
    editor.handle_text_input(block, "draft", start);

    assert_eq!(editor.next_deadline(), Some(start + DEFAULT_QUIET_PERIOD));
    assert!(editor.take_due_saves(start + ms(999)).is_empty());
    assert_eq!(editor.save_status(), SaveStatus::Dirty);
}

#[test]
fn save_snapshot_carries_title_and_blocks() {
    let mut editor = editor();
    let block = first_block(&editor);
    let start = Instant::now();
    editor.handle_title_input("Journal", start);
    editor.handle_text_input(block, "Dear diary", start);

    let requests = editor.take_due_saves(start + DEFAULT_QUIET_PERIOD);

    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].update.title, "Journal");
    assert_eq!(requests[0].page_id, editor.current_page_id().unwrap());
    assert_eq!(editor.save_status(), SaveStatus::Saving);
}

#[test]
fn edit_during_save_is_pending_and_rearms_after_completion() {
    let mut editor = editor();
    let block = first_block(&editor);
    let start = Instant::now();
    editor.handle_text_input(block, "one", start);
    let due = start + DEFAULT_QUIET_PERIOD;
    let requests = editor.take_due_saves(due);
    assert_eq!(requests.len(), 1);

    editor.handle_text_input(block, "one two", due + ms(100));
    assert!(editor.take_due_saves(due + ms(5000)).is_empty());

    let finished = due + ms(300);
    let outcome = editor.complete_save(requests[0].page_id, Ok(()), finished);
    assert_eq!(outcome, SaveOutcome::Rearmed { failure: None });
    assert_eq!(editor.save_status(), SaveStatus::Dirty);
    assert!(editor.current_document().unwrap().has_unsaved_changes());
    assert_eq!(editor.next_deadline(), Some(finished + DEFAULT_QUIET_PERIOD));

    let second = editor.take_due_saves(finished + DEFAULT_QUIET_PERIOD);
    assert_eq!(second.len(), 1);
    let stored = blockpad_core::decode_content(&second[0].update.content);
    assert_eq!(stored[0].text, "one two");
}

#[test]
fn at_most_one_save_in_flight_per_page() {
    let mut sync = AutosaveSynchronizer::new(3, DEFAULT_QUIET_PERIOD);
    let start = Instant::now();
    sync.notify_dirty(start);

    assert!(sync.begin_save(start + DEFAULT_QUIET_PERIOD));
    sync.notify_dirty(start + ms(1100));
    assert!(!sync.begin_save(start + ms(9000)));
    assert!(sync.has_pending());
}

#[test]
fn failed_save_reports_failed_and_next_edit_retries_after_quiet_period() {
    let mut editor = editor();
    let block = first_block(&editor);
    let page_id = editor.current_page_id().unwrap();
    let start = Instant::now();
    editor.store().fail_next_update(StoreError::server(500, "boom"));
    editor.handle_text_input(block, "a", start);

    let due = start + DEFAULT_QUIET_PERIOD;
    let outcomes = editor.flush_due_saves(due);
    assert!(matches!(outcomes[0].1, SaveOutcome::Failed(_)));
    assert_eq!(editor.save_status(), SaveStatus::Failed);
    assert!(editor.take_events().contains(&EditorEvent::SaveFailed {
        page_id,
        error: StoreError::server(500, "boom"),
    }));

    assert!(editor.flush_due_saves(due + ms(10_000)).is_empty());
    assert_eq!(editor.store().update_count(), 1);

    let retry_edit = due + ms(10_000);
    editor.handle_text_input(block, "ab", retry_edit);
    assert_eq!(editor.save_status(), SaveStatus::Dirty);
    assert!(editor.flush_due_saves(retry_edit + ms(999)).is_empty());
    let outcomes = editor.flush_due_saves(retry_edit + DEFAULT_QUIET_PERIOD);
    assert_eq!(outcomes, vec![(page_id, SaveOutcome::Saved)]);
    assert_eq!(editor.store().update_count(), 2);
    assert_eq!(editor.save_status(), SaveStatus::Clean);
}

#[test]
fn unauthorized_keeps_page_dirty_and_signals_session_expiry() {
    let mut editor = editor();
    let block = first_block(&editor);
    let start = Instant::now();
    editor.store().fail_next_update(StoreError::Unauthorized);
    editor.handle_text_input(block, "secret plan", start);

    let outcomes = editor.flush_due_saves(start + DEFAULT_QUIET_PERIOD);

    assert_eq!(outcomes[0].1, SaveOutcome::Unauthorized);
    assert_eq!(editor.save_status(), SaveStatus::Dirty);
    assert_eq!(editor.next_deadline(), None);
    assert!(editor.current_document().unwrap().has_unsaved_changes());
    assert!(editor.take_events().contains(&EditorEvent::SessionExpired));
}

#[test]
fn independent_pages_save_in_the_same_cycle() {
    let mut editor = editor();
    let start = Instant::now();
    let first_page = editor.current_page_id().unwrap();
    let first_block_id = first_block(&editor);
    editor.handle_text_input(first_block_id, "first", start);

    let second_page = editor.create_page().unwrap();
    let second_block_id = first_block(&editor);
    editor.handle_text_input(second_block_id, "second", start);

    let requests = editor.take_due_saves(start + DEFAULT_QUIET_PERIOD);
    let mut page_ids: Vec<_> = requests.iter().map(|request| request.page_id).collect();
    page_ids.sort_unstable();
    let mut expected = vec![first_page, second_page];
    expected.sort_unstable();
    assert_eq!(page_ids, expected);
    assert_eq!(editor.save_status_of(first_page), SaveStatus::Saving);
    assert_eq!(editor.save_status_of(second_page), SaveStatus::Saving);
}

#[test]
fn completion_for_idle_page_is_ignored() {
    let mut editor = editor();
    let page_id = editor.current_page_id().unwrap();

    assert_eq!(
        editor.complete_save(page_id, Ok(()), Instant::now()),
        SaveOutcome::Ignored
    );
}

#[test]
fn logout_drops_scheduled_saves() {
    let mut editor = editor();
    let block = first_block(&editor);
    let start = Instant::now();
    editor.handle_text_input(block, "unsent", start);

    editor.logout();

    assert!(editor.is_ended());
    assert!(!editor.session().is_active());
    assert!(editor.flush_due_saves(start + DEFAULT_QUIET_PERIOD).is_empty());
    assert_eq!(editor.store().update_count(), 0);
    assert!(editor.page_view().is_none());
}

#[test]
fn unauthorized_with_edit_pending_sends_no_further_saves() {
    let mut editor = editor();
    let block = first_block(&editor);
    let start = Instant::now();
    editor.handle_text_input(block, "draft", start);
    let due = start + DEFAULT_QUIET_PERIOD;
    let requests = editor.take_due_saves(due);
    editor.handle_text_input(block, "draft two", due + ms(100));

    let page_id = requests[0].page_id;
    let outcome = editor.complete_save(page_id, Err(StoreError::Unauthorized), due + ms(200));

    assert_eq!(outcome, SaveOutcome::Unauthorized);
    assert_eq!(editor.save_status(), SaveStatus::Dirty);
    assert_eq!(editor.next_deadline(), None);
    assert!(editor.take_due_saves(due + ms(60_000)).is_empty());
    assert_eq!(editor.current_document().unwrap().blocks()[0].text, "draft two");
    assert!(editor.take_events().contains(&EditorEvent::SessionExpired));
}
