//! Faxmachine browser
//!
//! Terminal user interface for browsing, injecting and managing stored files.
//!
//! ## Layout
//!
//! Three-pane layout:
//! - Left: Categories (All, Recent, Untagged, then the category tree)
//! - Middle: Files in the selected category
//! - Right: Detail (metadata and content, or the diff before an overwrite)
//!
//! ## Navigation
//!
//! - j/k or ↑/↓: Move selection up/down
//! - h/l or ←/→: Switch focus between panes
//! - Tab: Cycle through panes
//! - Enter: Select category / Inject file
//! - q: Quit
//!
//! ## Commands
//!
//! - i: Inject file into the current directory
//! - e: Edit metadata
//! - o: Open with the default application
//! - d: Delete file
//! - u: Undo delete
//! - /: Filter current view
//! - :: Command mode

mod app;
mod ui;

use std::fs::File;
use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use faxmachine_core::{Config, Metadata, Store};

use app::{App, CommandResult, CommandType, EditorTask, InputMode};

use crate::editor;

/// Run the browser
pub fn run(config: Config) -> Result<()> {
    // Initialize TUI logging (file-based, only if FAXMACHINE_LOG is set)
    init_tui_logging(&config);

    let mut store = Store::open_with_config(config)?;
    if !store.is_initialized() {
        store.init().context("Failed to initialize database")?;
    }

    let dest_dir = std::env::current_dir().context("Failed to read current directory")?;
    let mut app = App::new(&store, dest_dir)?;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_app(&mut terminal, &mut app, &mut store);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, store: &mut Store) -> Result<()> {
    loop {
        app.check_status_timeout();
        app.load_detail(store);

        terminal.draw(|frame| ui::draw(frame, app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        // Only handle key press events (not release)
        if key.kind != KeyEventKind::Press {
            continue;
        }

        // If error modal is showing, any key dismisses it
        if app.has_error() {
            app.clear_error();
            continue;
        }

        // If help is showing, any key dismisses it
        if app.show_help {
            app.show_help = false;
            continue;
        }

        // An overwrite waits for y; anything else cancels it
        if app.pending_inject.is_some() {
            if key.code == KeyCode::Char('y') {
                if let Err(e) = app.confirm_inject(store) {
                    app.set_error(format!("Inject failed: {}", e));
                }
            } else {
                app.cancel_inject();
            }
            continue;
        }

        match app.input_mode {
            InputMode::Normal => {
                if let Some(EditorTask::EditMetadata) =
                    handle_normal_mode(app, store, key.code, key.modifiers)
                {
                    edit_metadata(terminal, app, store)?;
                }
            }
            InputMode::Command => handle_command_mode(terminal, app, store, key.code, key.modifiers)?,
            InputMode::Filter => handle_filter_mode(app, store, key.code),
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle key events in normal mode
///
/// Returns the editor task to run when a key needs the terminal suspended.
fn handle_normal_mode(
    app: &mut App,
    store: &mut Store,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Option<EditorTask> {
    // Clear status message on navigation keys
    if matches!(
        code,
        KeyCode::Char('j' | 'k' | 'h' | 'l' | 'g' | 'G')
            | KeyCode::Up
            | KeyCode::Down
            | KeyCode::Left
            | KeyCode::Right
            | KeyCode::Tab
            | KeyCode::BackTab
    ) {
        app.status_message = None;
    }

    // Clear pending 'g' if timeout expired (500ms)
    if let Some(time) = app.pending_g {
        if time.elapsed() > Duration::from_millis(500) {
            app.pending_g = None;
        }
    }

    match code {
        // Quit
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }

        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),
        KeyCode::Char('h') | KeyCode::Left => app.prev_pane(),
        KeyCode::Char('l') | KeyCode::Right => app.next_pane(),
        KeyCode::Tab => app.next_pane(),
        KeyCode::BackTab => app.prev_pane(),

        // Enter: select/activate
        KeyCode::Enter => {
            if let Err(e) = app.handle_enter(store) {
                app.set_error(format!("Action failed: {}", e));
            }
        }

        // View the selected file's content
        KeyCode::Char('v') => {
            app.active_pane = app::ActivePane::Detail;
        }

        KeyCode::Char('i') => {
            if let Err(e) = app.inject_current(store, None) {
                app.set_error(format!("Inject failed: {}", e));
            }
        }
        KeyCode::Char('I') => app.enter_command_mode(CommandType::Inject),
        KeyCode::Char('a') => app.enter_command_mode(CommandType::Add),
        KeyCode::Char('t') => app.enter_command_mode(CommandType::Tag),
        KeyCode::Char('s') => app.enter_command_mode(CommandType::Search),
        KeyCode::Char('e') => return Some(EditorTask::EditMetadata),
        KeyCode::Char('o') => open_current(app, store),
        KeyCode::Char('d') => {
            if let Err(e) = app.delete_current(store) {
                app.set_error(format!("Failed to delete file: {}", e));
            }
        }
        KeyCode::Char('u') => {
            if let Err(e) = app.undo_delete(store) {
                app.set_error(format!("Failed to undo delete: {}", e));
            }
        }

        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Char(':') => app.enter_command_mode(CommandType::Generic),
        KeyCode::Char('?') => app.toggle_help(),

        // Vim navigation: G (go to last)
        KeyCode::Char('G') => {
            app.pending_g = None;
            app.move_to_last();
        }

        // Vim navigation: g (start of gg sequence)
        KeyCode::Char('g') => {
            if app.pending_g.is_some() {
                app.pending_g = None;
                app.move_to_first();
            } else {
                app.pending_g = Some(Instant::now());
            }
        }

        _ => {
            // Any other key clears pending 'g'
            app.pending_g = None;
        }
    }

    None
}

/// Open the selected file with the system's default application
fn open_current(app: &mut App, store: &Store) {
    let Some(key) = app.current_entry().map(|e| e.key.clone()) else {
        return;
    };

    match open::that_detached(store.entry_path(&key)) {
        Ok(()) => app.set_status(format!("Opened '{}'", key)),
        Err(e) => app.set_status(format!("Failed to open: {}", e)),
    }
}

/// Handle key events in command mode
fn handle_command_mode<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &mut Store,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<()> {
    match code {
        // Cancel command
        KeyCode::Esc => app.exit_input_mode(),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => app.exit_input_mode(),

        // Execute command
        KeyCode::Enter => {
            let result = app.execute_command(store);
            app.exit_input_mode();

            match result {
                Ok(CommandResult::Done) => {}
                Ok(CommandResult::NeedEditor(EditorTask::EditMetadata)) => {
                    edit_metadata(terminal, app, store)?;
                }
                Err(e) => app.set_error(format!("Command failed: {}", e)),
            }
        }

        // Text input
        KeyCode::Char(c) => app.insert_char(c),
        KeyCode::Backspace => app.delete_char(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),

        _ => {}
    }

    Ok(())
}

/// Suspend the terminal, edit the selected entry's metadata, resume
fn edit_metadata<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &mut Store,
) -> Result<()> {
    let Some(entry) = app.current_entry().cloned() else {
        app.set_status("No file selected");
        return Ok(());
    };

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(cursor::Show)?;

    let template = metadata_template(&entry.key.to_string(), &entry.metadata);
    let edited = editor::edit_text(&template, store.config().editor.as_deref());

    // Re-enter TUI before showing any result
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    terminal.clear()?;

    let content = match edited {
        Ok(content) => content,
        Err(e) => {
            app.set_error(format!("Editor failed: {}", e));
            return Ok(());
        }
    };

    match parse_metadata_edit(&content, &entry.metadata) {
        Some(updated) => {
            if let Err(e) = app.update_metadata(store, &updated) {
                app.set_error(format!("Failed to update metadata: {}", e));
            }
        }
        None => app.set_status("Edit cancelled"),
    }

    Ok(())
}

/// Handle key events in filter mode
fn handle_filter_mode(app: &mut App, store: &Store, code: KeyCode) {
    match code {
        // Cancel filter
        KeyCode::Esc => {
            app.exit_input_mode();
            if let Err(e) = app.clear_filter(store) {
                app.set_error(format!("Failed to clear filter: {}", e));
            }
        }

        // Confirm filter (stay in filtered view)
        KeyCode::Enter => app.exit_input_mode(),

        // Text input
        KeyCode::Char(c) => app.insert_char(c),
        KeyCode::Backspace => app.delete_char(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),

        _ => {}
    }
}

/// Editor template for an entry's metadata
fn metadata_template(key: &str, metadata: &Metadata) -> String {
    format!(
        "# Edit metadata for {}\n\
         # Lines starting with # are ignored\n\n\
         description: {}\n\
         tags: {}\n",
        key,
        metadata.description,
        metadata.tags.join(", ")
    )
}

/// Parse edited metadata from the editor, `None` when nothing changed
fn parse_metadata_edit(content: &str, original: &Metadata) -> Option<Metadata> {
    let mut metadata = original.clone();

    for line in content.lines() {
        let line = line.trim();

        if line.starts_with('#') || line.is_empty() {
            continue;
        }

        if let Some(value) = line.strip_prefix("description:") {
            metadata.set_description(value.trim());
        } else if let Some(value) = line.strip_prefix("tags:") {
            metadata.set_tags(faxmachine_core::parse_tag_list(value));
        }
    }

    if metadata != *original {
        Some(metadata)
    } else {
        None
    }
}

/// Initialize logging for TUI mode
///
/// Only initializes if FAXMACHINE_LOG environment variable is set.
/// Logs to file (config.log_file or default {data_dir}/debug.log).
fn init_tui_logging(config: &Config) {
    let Ok(log_level) = std::env::var("FAXMACHINE_LOG") else {
        return;
    };

    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "faxmachine_core={},faxmachine={}",
        log_level, log_level
    ));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("TUI logging initialized to {:?}", log_path);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Metadata {
        let mut metadata = Metadata::new("Standard gitignore", "/home/me/.gitignore");
        metadata.set_tags(["python", "git"]);
        metadata
    }

    #[test]
    fn test_parse_metadata_edit_roundtrips_template() {
        let original = sample();
        let template = metadata_template("git/python-gitignore", &original);

        assert!(parse_metadata_edit(&template, &original).is_none());
    }

    #[test]
    fn test_parse_metadata_edit_changes() {
        let original = sample();
        let edited = "# header\n\ndescription:  Python ignores \ntags: py, Git ,venv\n";

        let updated = parse_metadata_edit(edited, &original).unwrap();
        assert_eq!(updated.description, "Python ignores");
        assert_eq!(updated.tags, vec!["py", "Git", "venv"]);
        assert_eq!(updated.source_path, original.source_path);
        assert_eq!(updated.added_date, original.added_date);
    }

    #[test]
    fn test_parse_metadata_edit_clears_tags() {
        let original = sample();

        let updated = parse_metadata_edit("description: Standard gitignore\ntags:\n", &original)
            .unwrap();
        assert!(updated.tags.is_empty());
    }
}
