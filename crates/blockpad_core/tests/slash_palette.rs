use blockpad_core::{
    BlockKind, CancelReason, Editor, EditorConfig, EditorEvent, Key, KeyDisposition, KeyInput,
    MemoryPageStore, Session, SlashCommandEngine, SlashEvent, SLASH_COMMANDS,
};
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

fn first_block(editor: &Editor<MemoryPageStore>) -> blockpad_core::BlockId {
    editor.current_document().unwrap().first_block_id()
}

fn labels(editor: &Editor<MemoryPageStore>) -> Vec<&'static str> {
    editor
        .palette_view()
        .items
        .iter()
        .map(|item| item.label)
        .collect()
}

#[test]
fn typing_h1_filters_to_heading_one_and_enter_retypes_block() {
    let mut editor = editor();
    let now = Instant::now();
    let block = first_block(&editor);

    editor.handle_text_input(block, "/h1", now);
    let palette = editor.palette_view();
    assert!(palette.open);
    assert_eq!(palette.block_id, Some(block));
    assert_eq!(palette.query, "h1");
    assert_eq!(labels(&editor), vec!["Heading 1"]);

    let disposition = editor.handle_key(block, KeyInput::new(Key::Enter), now);

    let retyped = editor.current_document().unwrap().block(block).unwrap().clone();
    assert_eq!(disposition, KeyDisposition::Handled);
    assert_eq!(retyped.kind, BlockKind::Heading1);
    assert_eq!(retyped.text, "");
    assert!(!editor.palette_view().open);
    assert_eq!(editor.focus().map(|focus| focus.block_id), Some(block));
    assert_eq!(editor.current_document().unwrap().len(), 1);
}

#[test]
fn filter_is_case_insensitive_on_label_and_name() {
    let mut engine = SlashCommandEngine::new();
    let block = uuid::Uuid::new_v4();

    engine.text_changed(block, "/H1");
    let names: Vec<_> = engine.filtered().iter().map(|command| command.name).collect();
    assert_eq!(names, vec!["h1"]);

    engine.text_changed(block, "/LIST");
    let names: Vec<_> = engine.filtered().iter().map(|command| command.name).collect();
    assert_eq!(names, vec!["bullet", "numbered"]);

    engine.text_changed(block, "/heading");
    assert_eq!(engine.filtered().len(), 3);
}

#[test]
fn down_wraps_from_last_match_to_first_and_up_wraps_back() {
    let mut engine = SlashCommandEngine::new();
    let block = uuid::Uuid::new_v4();
    engine.text_changed(block, "/");
    let count = SLASH_COMMANDS.len();

    for _ in 0..count - 1 {
        engine.move_down();
    }
    assert_eq!(engine.highlighted_command().unwrap().name, "numbered");
    engine.move_down();
    assert_eq!(engine.highlighted_command().unwrap().name, "h1");
    engine.move_up();
    assert_eq!(engine.highlighted_command().unwrap().name, "numbered");
}

#[test]
fn highlight_resets_when_match_set_changes() {
    let mut engine = SlashCommandEngine::new();
    let block = uuid::Uuid::new_v4();
    engine.text_changed(block, "/");
    engine.move_down();
    engine.move_down();

    assert_eq!(engine.text_changed(block, "/h"), SlashEvent::Updated);
    assert_eq!(engine.open_palette().unwrap().highlighted, 0);
}

#[test]
fn arrow_navigation_then_enter_commits_highlighted_command() {
    let mut editor = editor();
    let now = Instant::now();
    let block = first_block(&editor);

    editor.handle_text_input(block, "/", now);
    editor.handle_key(block, KeyInput::new(Key::ArrowDown), now);
    editor.handle_key(block, KeyInput::new(Key::ArrowDown), now);
    editor.handle_key(block, KeyInput::new(Key::ArrowDown), now);
    assert_eq!(editor.palette_view().highlighted, 3);
    editor.handle_key(block, KeyInput::new(Key::Enter), now);

    let kind = editor.current_document().unwrap().block(block).unwrap().kind;
    assert_eq!(kind, BlockKind::BulletedItem);
}

#[test]
fn open_palette_claims_enter_so_no_split_happens() {
    let mut editor = editor();
    let now = Instant::now();
    let block = first_block(&editor);

    editor.handle_text_input(block, "/zzz", now);
    assert!(editor.palette_view().open);
    assert!(editor.palette_view().items.is_empty());

    let disposition = editor.handle_key(block, KeyInput::new(Key::Enter), now);

    assert_eq!(disposition, KeyDisposition::Handled);
    assert!(!editor.palette_view().open);
    let document = editor.current_document().unwrap();
    assert_eq!(document.len(), 1);
    assert_eq!(document.blocks()[0].text, "/zzz");
    assert_eq!(document.blocks()[0].kind, BlockKind::Paragraph);
}

#[test]
fn escape_cancels_without_touching_document() {
    let mut editor = editor();
    let now = Instant::now();
    let block = first_block(&editor);
    editor.handle_text_input(block, "/hea", now);
    let before = editor.current_document().unwrap().blocks().to_vec();
    let revision = editor.current_document().unwrap().revision();

    let disposition = editor.handle_key(block, KeyInput::new(Key::Escape), now);

    assert_eq!(disposition, KeyDisposition::Handled);
    assert!(!editor.palette_view().open);
    assert_eq!(editor.current_document().unwrap().blocks(), before.as_slice());
    assert_eq!(editor.current_document().unwrap().revision(), revision);
}

#[test]
fn deleting_the_slash_closes_palette() {
    let mut engine = SlashCommandEngine::new();
    let block = uuid::Uuid::new_v4();
    engine.text_changed(block, "/h");

    assert_eq!(
        engine.text_changed(block, "h"),
        SlashEvent::Cancelled(CancelReason::TriggerRemoved)
    );
    assert!(!engine.is_open());
}

#[test]
fn backspace_while_open_passes_through_to_host() {
    let mut editor = editor();
    let now = Instant::now();
    let block = first_block(&editor);
    editor.handle_text_input(block, "/h", now);

    let disposition = editor.handle_key(block, KeyInput::new(Key::Backspace), now);

    assert_eq!(disposition, KeyDisposition::PassThrough);
    assert!(editor.palette_view().open);
}

#[test]
fn pointer_outside_cancels_and_notifies_host() {
    let mut editor = editor();
    let block = first_block(&editor);
    editor.handle_text_input(block, "/", Instant::now());
    editor.take_events();

    editor.pointer_down_outside();

    assert!(!editor.palette_view().open);
    assert_eq!(editor.take_events(), vec![EditorEvent::PaletteChanged]);
}

#[test]
fn pointer_pick_commits_filtered_entry() {
    let mut editor = editor();
    let now = Instant::now();
    let block = first_block(&editor);
    editor.handle_text_input(block, "/list", now);

    editor.palette_select(1, now);

    let retyped = editor.current_document().unwrap().block(block).unwrap().clone();
    assert_eq!(retyped.kind, BlockKind::NumberedItem);
    assert!(retyped.text.is_empty());
    assert!(!editor.palette_view().open);
}

#[test]
fn out_of_range_pointer_pick_keeps_palette_open() {
    let mut editor = editor();
    let now = Instant::now();
    let block = first_block(&editor);
    editor.handle_text_input(block, "/h1", now);

    editor.palette_select(4, now);

    assert!(editor.palette_view().open);
    assert_eq!(
        editor.current_document().unwrap().block(block).unwrap().kind,
        BlockKind::Paragraph
    );
}

#[test]
fn focusing_another_block_cancels_palette() {
    let mut editor = editor();
    let now = Instant::now();
    let first = first_block(&editor);
    editor.handle_key(first, KeyInput::new(Key::Enter), now);
    let second = editor.focus().unwrap().block_id;
    editor.handle_text_input(second, "/", now);

    editor.focus_block(first);

    assert!(!editor.palette_view().open);
}

#[test]
fn committing_schedules_an_autosave() {
    let mut editor = editor();
    let now = Instant::now();
    let block = first_block(&editor);
    editor.handle_text_input(block, "/h3", now);
    editor.handle_key(block, KeyInput::new(Key::Enter), now);

    let outcomes = editor.flush_due_saves(now + editor.config().quiet_period());

    assert_eq!(outcomes.len(), 1);
    let saved = editor.store().page(editor.current_page_id().unwrap()).unwrap();
    let stored = blockpad_core::decode_content(&saved.content);
    assert_eq!(stored[0].kind, BlockKind::Heading3);
    assert!(stored[0].text.is_empty());
}

#[test]
fn key_from_another_block_closes_palette_and_edits_that_block() {
    let mut editor = editor();
    let now = Instant::now();
    let first = first_block(&editor);
    editor.handle_key(first, KeyInput::new(Key::Enter), now);
    let second = editor.focus().unwrap().block_id;
    editor.handle_text_input(first, "/h1", now);
    assert_eq!(editor.palette_view().block_id, Some(first));
    editor.take_events();

    let disposition = editor.handle_key(second, KeyInput::new(Key::Enter), now);

    assert_eq!(disposition, KeyDisposition::Handled);
    assert!(!editor.palette_view().open);
    assert!(editor.take_events().contains(&EditorEvent::PaletteChanged));
    let document = editor.current_document().unwrap();
    assert_eq!(document.len(), 3);
    let untouched = document.block(first).unwrap();
    assert_eq!(untouched.kind, BlockKind::Paragraph);
    assert_eq!(untouched.text, "/h1");
    assert_ne!(editor.focus().unwrap().block_id, first);
    assert_ne!(editor.focus().unwrap().block_id, second);
}
