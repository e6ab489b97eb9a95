//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable that drives one scripted editing session.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `blockpad_cli [config.json] [log_dir]`
//!
//! With `BLOCKPAD_TOKEN` set, the page list of the configured API is printed
//! instead of running the scripted session.

use blockpad_core::{
    core_version, init_logging_with_config, DragSource, Editor, EditorConfig, HttpPageStore, Key,
    KeyInput, MemoryPageStore, Session,
};
use log::error;
use std::process::ExitCode;
use web_time::Instant;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match EditorConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("blockpad config error: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => EditorConfig::default(),
    };
    if let Some(log_dir) = args.next() {
        if let Err(err) = init_logging_with_config(&config, &log_dir) {
            eprintln!("blockpad logging disabled: {err}");
        }
    }

    println!("blockpad_core version={}", core_version());
    let result = match std::env::var("BLOCKPAD_TOKEN") {
        Ok(token) => list_remote(config, token),
        Err(_) => run_demo(config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_demo module=cli status=error error={err}");
            eprintln!("blockpad demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn list_remote(config: EditorConfig, token: String) -> Result<(), Box<dyn std::error::Error>> {
    let user = std::env::var("BLOCKPAD_USER").unwrap_or_default();
    let session = Session::new(token, user);
    let store = HttpPageStore::from_config(&config, session.clone());
    let mut editor = Editor::new(store, config, session);
    editor.load_pages()?;
    for page in editor.page_list() {
        let marker = if page.is_current { "*" } else { " " };
        println!("{marker} {} {} {}", page.id, page.icon, page.display_title);
    }
    Ok(())
}

fn run_demo(config: EditorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let quiet_period = config.quiet_period();
    let mut editor = Editor::new(MemoryPageStore::new(), config, Session::anonymous());
    editor.load_pages()?;

    let start = Instant::now();
    editor.handle_title_input("Groceries", start);
    let first = editor
        .current_document()
        .map(|document| document.first_block_id())
        .ok_or("no page open after load")?;

    editor.handle_text_input(first, "/h1", start);
    editor.handle_key(first, KeyInput::new(Key::Enter), start);
    editor.handle_text_input(first, "Weekly list", start);
    editor.handle_key(first, KeyInput::new(Key::Enter).at(11), start);

    let second = editor.focus().map(|focus| focus.block_id).ok_or("no focus after split")?;
    editor.handle_text_input(second, "/bullet", start);
    editor.handle_key(second, KeyInput::new(Key::Enter), start);
    editor.handle_text_input(second, "Milk", start);
    editor.handle_key(second, KeyInput::new(Key::Enter).at(4), start);

    let third = editor.focus().map(|focus| focus.block_id).ok_or("no focus after split")?;
    editor.handle_text_input(third, "Eggs", start);
    if editor.drag_start(third, DragSource::Handle) {
        editor.drag_over(Some(second));
        editor.drop_on(Some(second), start);
    }

    let due = start + quiet_period;
    let outcomes = editor.flush_due_saves(due);
    println!("saves={} status={}", outcomes.len(), editor.save_status().as_str());

    if let Some(page) = editor.page_view() {
        println!("page id={} title={}", page.id, page.display_title);
        for block in &page.blocks {
            println!("  [{}] {}", block.kind.as_str(), block.text);
        }
    }
    editor.take_events();
    Ok(())
}
