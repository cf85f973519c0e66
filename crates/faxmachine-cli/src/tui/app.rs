//! Application state and logic

use std::path::PathBuf;
use std::time::{Duration, Instant};

use faxmachine_core::preview::is_binary;
use faxmachine_core::{
    parse_tag_list, AddRequest, Entry, EntryKey, InjectOptions, Metadata, Preview, SearchQuery,
    Store, TreeNode,
};

/// Lines of stored content shown in the detail pane
const PREVIEW_LINES: usize = 200;

/// Metadata lines above the content in the detail pane (without Modified)
const DETAIL_HEADER_LINES: usize = 9;

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode
    Normal,
    /// Command input mode (after pressing : or command key)
    Command,
    /// Filter/search mode (after pressing /)
    Filter,
}

/// Type of command being entered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandType {
    /// Generic command starting with :
    Generic,
    /// Add a file from disk
    Add,
    /// Edit tags on selected entry
    Tag,
    /// Inject selected entry under another name
    Inject,
    /// Search the whole database
    Search,
}

/// Which pane has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePane {
    Filters,
    Items,
    Detail,
}

impl ActivePane {
    /// Move to the next pane (wrapping)
    pub fn next(self) -> Self {
        match self {
            ActivePane::Filters => ActivePane::Items,
            ActivePane::Items => ActivePane::Detail,
            ActivePane::Detail => ActivePane::Filters,
        }
    }

    /// Move to the previous pane (wrapping)
    pub fn prev(self) -> Self {
        match self {
            ActivePane::Filters => ActivePane::Detail,
            ActivePane::Items => ActivePane::Filters,
            ActivePane::Detail => ActivePane::Items,
        }
    }
}

/// Entries in the left pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    Recent,
    Untagged,
    /// A category or nested subcategory directory
    Location {
        category: String,
        subcategory: Option<String>,
        depth: usize,
    },
}

impl Filter {
    /// Label shown in the filters pane
    pub fn label(&self) -> String {
        match self {
            Filter::All => "▤ All".to_string(),
            Filter::Recent => "⏱ Recent".to_string(),
            Filter::Untagged => "○ Untagged".to_string(),
            Filter::Location {
                category,
                subcategory,
                depth,
            } => {
                let name = subcategory
                    .as_deref()
                    .and_then(|s| s.rsplit('/').next())
                    .unwrap_or(category);
                format!("{}{}/", "  ".repeat(*depth), name)
            }
        }
    }
}

/// Build the left-pane filters from the category tree
pub fn build_filters(tree: &[TreeNode]) -> Vec<Filter> {
    let mut filters = vec![Filter::All, Filter::Recent, Filter::Untagged];
    for node in tree {
        if let TreeNode::Directory { name, children } = node {
            filters.push(Filter::Location {
                category: name.clone(),
                subcategory: None,
                depth: 0,
            });
            push_subcategories(&mut filters, name, None, children, 1);
        }
    }
    filters
}

fn push_subcategories(
    filters: &mut Vec<Filter>,
    category: &str,
    parent: Option<&str>,
    children: &[TreeNode],
    depth: usize,
) {
    for child in children {
        if let TreeNode::Directory { name, children } = child {
            let subcategory = match parent {
                Some(parent) => format!("{}/{}", parent, name),
                None => name.clone(),
            };
            filters.push(Filter::Location {
                category: category.to_string(),
                subcategory: Some(subcategory.clone()),
                depth,
            });
            push_subcategories(filters, category, Some(&subcategory), children, depth + 1);
        }
    }
}

/// A deleted entry kept for undo
#[derive(Debug, Clone)]
pub struct DeletedEntry {
    pub entry: Entry,
    pub content: Vec<u8>,
}

/// An inject waiting for overwrite confirmation
#[derive(Debug, Clone)]
pub struct PendingInject {
    pub key: EntryKey,
    pub options: InjectOptions,
    pub preview: Preview,
}

/// Content of the selected entry as shown in the detail pane
#[derive(Debug, Clone)]
pub struct DetailContent {
    pub key: EntryKey,
    pub text: Option<String>,
}

/// Application state
pub struct App {
    /// Whether the app should exit
    pub should_quit: bool,
    /// Current input mode
    pub input_mode: InputMode,
    /// Type of command being entered
    pub command_type: Option<CommandType>,
    /// Command input buffer
    pub command_input: String,
    /// Cursor position in command input (in characters)
    pub command_cursor: usize,
    /// Which pane has focus
    pub active_pane: ActivePane,
    /// Available filters (smart filters, then the category tree)
    pub filters: Vec<Filter>,
    /// Currently selected filter index
    pub filter_index: usize,
    /// All entries in the database
    pub all_entries: Vec<Entry>,
    /// Entries of the selected filter or search, before the realtime filter
    pub view_entries: Vec<Entry>,
    /// Current list of entries (filtered)
    pub entries: Vec<Entry>,
    /// Currently selected entry index
    pub entry_index: usize,
    /// Status message to display temporarily
    pub status_message: Option<String>,
    /// When the status message was set (for auto-dismiss)
    pub status_message_time: Option<Instant>,
    /// Error shown in a modal until a key is pressed
    pub error_message: Option<String>,
    /// Last deleted entry (for undo)
    pub deleted: Option<DeletedEntry>,
    /// Filter text for real-time filtering
    pub filter_text: String,
    /// Scroll offset for detail pane
    pub detail_scroll: u16,
    /// Cached content of the selected entry
    pub detail: Option<DetailContent>,
    /// Whether help overlay is visible
    pub show_help: bool,
    /// Pending 'g' keypress for gg sequence (with timestamp)
    pub pending_g: Option<Instant>,
    /// Inject waiting for the user to confirm an overwrite
    pub pending_inject: Option<PendingInject>,
    /// Directory injected files are written to
    pub dest_dir: PathBuf,
}

impl App {
    /// Create a new app with data from store
    pub fn new(store: &Store, dest_dir: PathBuf) -> anyhow::Result<Self> {
        let filters = build_filters(&store.tree(None)?);
        let all_entries = store.all_entries()?;
        let view_entries = all_entries.clone();
        let entries = all_entries.clone();

        Ok(Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            command_type: None,
            command_input: String::new(),
            command_cursor: 0,
            active_pane: ActivePane::Items,
            filters,
            filter_index: 0, // Start on "All"
            all_entries,
            view_entries,
            entries,
            entry_index: 0,
            status_message: None,
            status_message_time: None,
            error_message: None,
            deleted: None,
            filter_text: String::new(),
            detail_scroll: 0,
            detail: None,
            show_help: false,
            pending_g: None,
            pending_inject: None,
            dest_dir,
        })
    }

    /// Get the currently selected filter
    pub fn current_filter(&self) -> Option<&Filter> {
        self.filters.get(self.filter_index)
    }

    /// Set a status message (will auto-dismiss after 3 seconds)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Check and clear expired status message
    pub fn check_status_timeout(&mut self) {
        if let Some(time) = self.status_message_time {
            if time.elapsed() > Duration::from_secs(3) {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    /// Show an error modal
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    /// Whether the error modal is visible
    pub fn has_error(&self) -> bool {
        self.error_message.is_some()
    }

    /// Dismiss the error modal
    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Get the currently selected entry
    pub fn current_entry(&self) -> Option<&Entry> {
        self.entries.get(self.entry_index)
    }

    /// Move selection up in the current pane
    pub fn move_up(&mut self) {
        match self.active_pane {
            ActivePane::Filters => {
                if self.filter_index > 0 {
                    self.filter_index -= 1;
                }
            }
            ActivePane::Items => {
                if self.entry_index > 0 {
                    self.entry_index -= 1;
                    self.detail_scroll = 0; // Reset scroll when changing selection
                }
            }
            ActivePane::Detail => {
                self.detail_scroll = self.detail_scroll.saturating_sub(1);
            }
        }
    }

    /// Move selection down in the current pane
    pub fn move_down(&mut self) {
        match self.active_pane {
            ActivePane::Filters => {
                if self.filter_index < self.filters.len().saturating_sub(1) {
                    self.filter_index += 1;
                }
            }
            ActivePane::Items => {
                if self.entry_index < self.entries.len().saturating_sub(1) {
                    self.entry_index += 1;
                    self.detail_scroll = 0; // Reset scroll when changing selection
                }
            }
            ActivePane::Detail => {
                self.detail_scroll = self
                    .detail_scroll
                    .saturating_add(1)
                    .min(self.max_detail_scroll());
            }
        }
    }

    /// Move selection to first item in the current pane (vim 'gg')
    pub fn move_to_first(&mut self) {
        match self.active_pane {
            ActivePane::Filters => {
                self.filter_index = 0;
            }
            ActivePane::Items => {
                self.entry_index = 0;
                self.detail_scroll = 0;
            }
            ActivePane::Detail => {
                self.detail_scroll = 0;
            }
        }
    }

    /// Move selection to last item in the current pane (vim 'G')
    pub fn move_to_last(&mut self) {
        match self.active_pane {
            ActivePane::Filters => {
                self.filter_index = self.filters.len().saturating_sub(1);
            }
            ActivePane::Items => {
                self.entry_index = self.entries.len().saturating_sub(1);
                self.detail_scroll = 0;
            }
            ActivePane::Detail => {
                self.detail_scroll = self.max_detail_scroll();
            }
        }
    }

    /// Scroll the detail pane by a page
    pub fn page_detail(&mut self) {
        self.detail_scroll = self
            .detail_scroll
            .saturating_add(10)
            .min(self.max_detail_scroll());
    }

    /// Number of lines the detail pane renders for the current selection
    pub fn detail_line_count(&self) -> usize {
        if let Some(pending) = &self.pending_inject {
            return match &pending.preview {
                Preview::Diff { diff, .. } => diff.lines().count(),
                other => other.text().lines().count(),
            };
        }

        let Some(entry) = self.current_entry() else {
            return 2;
        };
        let header = DETAIL_HEADER_LINES + usize::from(entry.modified.is_some());
        let body = match self.detail.as_ref().filter(|d| d.key == entry.key) {
            Some(DetailContent {
                text: Some(text), ..
            }) => text.lines().count(),
            _ => 1,
        };
        header + body
    }

    fn max_detail_scroll(&self) -> u16 {
        let last = self.detail_line_count().saturating_sub(1);
        u16::try_from(last).unwrap_or(u16::MAX)
    }

    /// Move focus to the next pane
    pub fn next_pane(&mut self) {
        self.active_pane = self.active_pane.next();
    }

    /// Move focus to the previous pane
    pub fn prev_pane(&mut self) {
        self.active_pane = self.active_pane.prev();
    }

    /// Handle Enter key in current pane
    pub fn handle_enter(&mut self, store: &mut Store) -> anyhow::Result<()> {
        match self.active_pane {
            ActivePane::Filters => {
                self.apply_filter(store)?;
                // Auto-switch to Items pane after selecting a filter
                self.active_pane = ActivePane::Items;
            }
            ActivePane::Items => {
                self.inject_current(store, None)?;
            }
            ActivePane::Detail => {
                self.page_detail();
            }
        }
        Ok(())
    }

    /// Apply the currently selected filter
    pub fn apply_filter(&mut self, store: &Store) -> anyhow::Result<()> {
        let filter = self.current_filter().cloned();

        self.view_entries = match filter {
            Some(Filter::All) | None => self.all_entries.clone(),
            Some(Filter::Recent) => store
                .recent()
                .iter()
                .filter_map(|key| self.all_entries.iter().find(|e| &e.key == key))
                .cloned()
                .collect(),
            Some(Filter::Untagged) => self
                .all_entries
                .iter()
                .filter(|e| e.metadata.tags.is_empty())
                .cloned()
                .collect(),
            Some(Filter::Location {
                category,
                subcategory,
                ..
            }) => store.entries_in(&category, subcategory.as_deref())?,
        };

        self.apply_realtime_filter();
        Ok(())
    }

    fn clamp_selection(&mut self) {
        // Preserve position when possible
        if self.entries.is_empty() {
            self.entry_index = 0;
        } else {
            self.entry_index = self.entry_index.min(self.entries.len() - 1);
        }
    }

    /// Refresh data from store
    pub fn refresh(&mut self, store: &Store) -> anyhow::Result<()> {
        self.filters = build_filters(&store.tree(None)?);
        if self.filter_index >= self.filters.len() {
            self.filter_index = 0;
        }
        self.all_entries = store.all_entries()?;
        self.detail = None;
        self.apply_filter(store)?;
        Ok(())
    }

    /// Load the selected entry's content for the detail pane if it changed
    pub fn load_detail(&mut self, store: &Store) {
        let Some(key) = self.current_entry().map(|e| e.key.clone()) else {
            self.detail = None;
            return;
        };
        if self.detail.as_ref().is_some_and(|d| d.key == key) {
            return;
        }

        let text = match store.read_content(&key) {
            Ok(content) if is_binary(&content) => None,
            Ok(content) => Some(
                String::from_utf8_lossy(&content)
                    .lines()
                    .take(PREVIEW_LINES)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Err(e) => Some(format!("(could not read file: {})", e)),
        };
        self.detail = Some(DetailContent { key, text });
    }

    /// Enter command mode with a specific command type
    pub fn enter_command_mode(&mut self, cmd_type: CommandType) {
        self.input_mode = InputMode::Command;
        self.command_type = Some(cmd_type.clone());
        self.command_input.clear();

        // Pre-fill based on command type
        self.command_input = match cmd_type {
            CommandType::Generic => String::new(),
            CommandType::Add => "add ".to_string(),
            CommandType::Search => "search ".to_string(),
            CommandType::Tag => match self.current_entry() {
                Some(entry) => format!("tag {}", entry.metadata.tags.join(", ")),
                None => "tag ".to_string(),
            },
            CommandType::Inject => match self.current_entry() {
                Some(entry) => format!("inject {}", entry.key.name),
                None => "inject ".to_string(),
            },
        };
        self.command_cursor = self.command_input.chars().count();
    }

    /// Enter filter mode
    pub fn enter_filter_mode(&mut self) {
        self.input_mode = InputMode::Filter;
        self.filter_text.clear();
        self.command_input.clear();
        self.command_cursor = 0;
    }

    /// Exit command/filter mode
    pub fn exit_input_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command_type = None;
        self.command_input.clear();
        self.command_cursor = 0;
    }

    /// Clear filter and show all items
    pub fn clear_filter(&mut self, store: &Store) -> anyhow::Result<()> {
        self.filter_text.clear();
        self.apply_filter(store)?;
        Ok(())
    }

    /// Apply real-time filter to current view
    pub fn apply_realtime_filter(&mut self) {
        if self.filter_text.is_empty() {
            self.entries = self.view_entries.clone();
            self.clamp_selection();
            return;
        }

        let needle = self.filter_text.to_lowercase();
        self.entries = self
            .view_entries
            .iter()
            .filter(|entry| entry_matches(entry, &needle))
            .cloned()
            .collect();

        // Reset selection if out of bounds
        if self.entry_index >= self.entries.len() {
            self.entry_index = 0;
        }
    }

    /// Insert character at cursor position
    pub fn insert_char(&mut self, c: char) {
        let at = byte_offset(&self.command_input, self.command_cursor);
        self.command_input.insert(at, c);
        self.command_cursor += 1;

        // Update filter in real-time if in filter mode
        if self.input_mode == InputMode::Filter {
            self.filter_text = self.command_input.clone();
            self.apply_realtime_filter();
        }
    }

    /// Delete character before cursor
    pub fn delete_char(&mut self) {
        if self.command_cursor > 0 {
            self.command_cursor -= 1;
            let at = byte_offset(&self.command_input, self.command_cursor);
            self.command_input.remove(at);

            // Update filter in real-time if in filter mode
            if self.input_mode == InputMode::Filter {
                self.filter_text = self.command_input.clone();
                self.apply_realtime_filter();
            }
        }
    }

    /// Move cursor left
    pub fn cursor_left(&mut self) {
        if self.command_cursor > 0 {
            self.command_cursor -= 1;
        }
    }

    /// Move cursor right
    pub fn cursor_right(&mut self) {
        if self.command_cursor < self.command_input.chars().count() {
            self.command_cursor += 1;
        }
    }

    /// Delete the selected entry and keep it for undo
    pub fn delete_current(&mut self, store: &mut Store) -> anyhow::Result<()> {
        let Some(key) = self.current_entry().map(|e| e.key.clone()) else {
            return Ok(());
        };

        let saved_index = self.entry_index;
        let content = store.read_content(&key)?;
        let entry = store.delete(&key)?;
        self.deleted = Some(DeletedEntry { entry, content });
        self.set_status(format!("Deleted '{}'. Press u to undo", key));
        self.refresh(store)?;

        // Restore index, clamped to new list bounds
        if !self.entries.is_empty() {
            self.entry_index = saved_index.min(self.entries.len() - 1);
        }
        Ok(())
    }

    /// Undo last delete
    pub fn undo_delete(&mut self, store: &mut Store) -> anyhow::Result<()> {
        if let Some(deleted) = self.deleted.take() {
            let key = deleted.entry.key.clone();
            store.restore(&key, &deleted.content, &deleted.entry.metadata)?;
            self.set_status(format!("Restored '{}'", key));
            self.refresh(store)?;
        } else {
            self.set_status("Nothing to undo");
        }
        Ok(())
    }

    /// Add a file from disk; `location` is `category[/subcategory]`
    pub fn add_file(&mut self, store: &mut Store, path: &str, location: Option<&str>) -> anyhow::Result<()> {
        let (category, subcategory) = split_location(location.unwrap_or("other"));
        let request = AddRequest {
            subcategory,
            ..AddRequest::new(expand_home(path), category)
        };

        let entry = store.add(request)?;
        self.set_status(format!("Added '{}'", entry.key));
        self.refresh(store)?;
        Ok(())
    }

    /// Replace the tags on the selected entry
    pub fn update_tags(&mut self, store: &mut Store, tags: &str) -> anyhow::Result<()> {
        if let Some(entry) = self.current_entry().cloned() {
            let mut metadata = entry.metadata;
            metadata.set_tags(parse_tag_list(tags));
            store.update_metadata(&entry.key, &metadata)?;
            self.set_status("Tags updated");
            self.refresh(store)?;
        }
        Ok(())
    }

    /// Replace the metadata of the selected entry
    pub fn update_metadata(&mut self, store: &mut Store, metadata: &Metadata) -> anyhow::Result<()> {
        if let Some(key) = self.current_entry().map(|e| e.key.clone()) {
            store.update_metadata(&key, metadata)?;
            self.set_status("Metadata updated");
            self.refresh(store)?;
        }
        Ok(())
    }

    /// Inject the selected entry into the destination directory
    ///
    /// When the destination exists the diff is kept in `pending_inject` and
    /// nothing is written until `confirm_inject`.
    pub fn inject_current(&mut self, store: &mut Store, name: Option<String>) -> anyhow::Result<()> {
        let Some(key) = self.current_entry().map(|e| e.key.clone()) else {
            self.set_status("No file selected");
            return Ok(());
        };

        let options = InjectOptions {
            dest_dir: self.dest_dir.clone(),
            dest_name: name,
            overwrite: false,
        };

        if options.dest_path(&key).exists() {
            let preview = store.preview_inject(&key, &options)?;
            if let Preview::Identical { name } = &preview {
                self.set_status(format!("'{}' is already up to date", name));
                return Ok(());
            }
            self.set_status("File exists. Press y to overwrite, any other key to cancel");
            self.pending_inject = Some(PendingInject {
                key,
                options,
                preview,
            });
            self.detail_scroll = 0;
            return Ok(());
        }

        let dest = store.inject(&key, &options)?;
        self.set_status(format!("Injected '{}' to {}", key, dest.display()));
        Ok(())
    }

    /// Overwrite the destination of the pending inject
    pub fn confirm_inject(&mut self, store: &mut Store) -> anyhow::Result<()> {
        if let Some(mut pending) = self.pending_inject.take() {
            pending.options.overwrite = true;
            let dest = store.inject(&pending.key, &pending.options)?;
            self.set_status(format!("Injected '{}' to {}", pending.key, dest.display()));
        }
        Ok(())
    }

    /// Drop the pending inject
    pub fn cancel_inject(&mut self) {
        if self.pending_inject.take().is_some() {
            self.set_status("Inject cancelled");
        }
    }

    /// Search the whole database
    pub fn search(&mut self, store: &Store, query: &str) -> anyhow::Result<()> {
        if query.is_empty() {
            self.apply_filter(store)?;
            return Ok(());
        }

        let query = SearchQuery::new(query).with_content(store.config().search_content);
        let hits = store.search(&query)?;
        self.view_entries = hits
            .iter()
            .filter_map(|hit| self.all_entries.iter().find(|e| e.key == hit.key))
            .cloned()
            .collect();
        self.filter_text.clear();
        self.entries = self.view_entries.clone();
        self.entry_index = 0;
        self.set_status(format!("Found {} results", self.entries.len()));
        Ok(())
    }

    /// Parse and execute command from input
    pub fn execute_command(&mut self, store: &mut Store) -> anyhow::Result<CommandResult> {
        let input = self.command_input.trim().to_string();
        let (command, rest) = match input.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (input.as_str(), ""),
        };

        match command {
            "" => {}
            "add" => {
                if rest.is_empty() {
                    self.set_status("Usage: add <path> [category[/subcategory]]");
                } else {
                    let (path, location) = split_add_args(rest);
                    self.add_file(store, path, location)?;
                }
            }
            "tag" => self.update_tags(store, rest)?,
            "inject" | "i" => {
                let name = (!rest.is_empty()).then(|| rest.to_string());
                self.inject_current(store, name)?;
            }
            "delete" | "d" => self.delete_current(store)?,
            "search" => self.search(store, rest)?,
            "edit" | "e" => return Ok(CommandResult::NeedEditor(EditorTask::EditMetadata)),
            "q" | "quit" => self.should_quit = true,
            _ => self.set_status(format!("Unknown command: {}", input)),
        }

        Ok(CommandResult::Done)
    }
}

/// Result of command execution
#[derive(Debug)]
pub enum CommandResult {
    /// Command completed
    Done,
    /// Need to open editor
    NeedEditor(EditorTask),
}

/// Type of editor task
#[derive(Debug)]
pub enum EditorTask {
    /// Edit description and tags of the selected entry
    EditMetadata,
}

/// Case-insensitive match against key, description and tags
fn entry_matches(entry: &Entry, needle: &str) -> bool {
    entry.key.to_string().to_lowercase().contains(needle)
        || entry.metadata.description.to_lowercase().contains(needle)
        || entry
            .metadata
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(needle))
}

/// Split `category[/subcategory...]`
fn split_location(location: &str) -> (String, Option<String>) {
    let location = location.trim().trim_matches('/');
    match location.split_once('/') {
        Some((category, sub)) => (category.to_string(), Some(sub.to_string())),
        None => (location.to_string(), None),
    }
}

/// Split `:add` arguments into a source path and an optional location
///
/// The path may contain spaces. A trailing word is taken as the location
/// only when the whole input is not an existing file and the word is a
/// valid `category[/subcategory]`.
fn split_add_args(rest: &str) -> (&str, Option<&str>) {
    let rest = rest.trim();
    if expand_home(rest).is_file() {
        return (rest, None);
    }
    match rest.rsplit_once(char::is_whitespace) {
        Some((path, location)) if is_location(location) => (path.trim_end(), Some(location)),
        _ => (rest, None),
    }
}

/// Whether `location` names a valid `category[/subcategory]`
fn is_location(location: &str) -> bool {
    let (category, subcategory) = split_location(location);
    EntryKey::new(category, subcategory, "_").is_ok()
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Byte offset of the character at `char_index`
fn byte_offset(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxmachine_core::Config;
    use std::fs;
    use tempfile::TempDir;

    fn test_store(temp_dir: &TempDir) -> Store {
        let config = Config {
            data_dir: temp_dir.path().join("data"),
            ..Config::default()
        };
        let mut store = Store::open_with_config(config).unwrap();
        store.init().unwrap();
        store
    }

    fn test_app(temp_dir: &TempDir, store: &Store) -> App {
        let dest = temp_dir.path().join("project");
        fs::create_dir_all(&dest).unwrap();
        App::new(store, dest).unwrap()
    }

    #[test]
    fn test_active_pane_next() {
        assert_eq!(ActivePane::Filters.next(), ActivePane::Items);
        assert_eq!(ActivePane::Items.next(), ActivePane::Detail);
        assert_eq!(ActivePane::Detail.next(), ActivePane::Filters);
    }

    #[test]
    fn test_active_pane_prev() {
        assert_eq!(ActivePane::Filters.prev(), ActivePane::Detail);
        assert_eq!(ActivePane::Items.prev(), ActivePane::Filters);
        assert_eq!(ActivePane::Detail.prev(), ActivePane::Items);
    }

    #[test]
    fn test_build_filters_indents_subcategories() {
        let tree = vec![TreeNode::Directory {
            name: "web".to_string(),
            children: vec![TreeNode::Directory {
                name: "react".to_string(),
                children: vec![TreeNode::Directory {
                    name: "hooks".to_string(),
                    children: vec![],
                }],
            }],
        }];

        let filters = build_filters(&tree);
        assert_eq!(filters.len(), 6);
        assert_eq!(filters[3].label(), "web/");
        assert_eq!(filters[4].label(), "  react/");
        assert_eq!(
            filters[5],
            Filter::Location {
                category: "web".to_string(),
                subcategory: Some("react/hooks".to_string()),
                depth: 2,
            }
        );
        assert_eq!(filters[5].label(), "    hooks/");
    }

    #[test]
    fn test_split_location() {
        assert_eq!(split_location("git"), ("git".to_string(), None));
        assert_eq!(
            split_location("/web/react/hooks/"),
            ("web".to_string(), Some("react/hooks".to_string()))
        );
    }

    #[test]
    fn test_cursor_handles_multibyte_input() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let mut app = test_app(&temp_dir, &store);

        app.enter_command_mode(CommandType::Generic);
        for c in "tag äb".chars() {
            app.insert_char(c);
        }
        app.cursor_left();
        app.delete_char();
        assert_eq!(app.command_input, "tag b");
    }

    #[test]
    fn test_filters_and_realtime_filter() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let mut app = test_app(&temp_dir, &store);
        assert_eq!(app.entries.len(), 1);

        app.filter_index = 2; // Untagged
        app.apply_filter(&store).unwrap();
        assert!(app.entries.is_empty());

        app.enter_filter_mode();
        for c in "IGNORE".chars() {
            app.insert_char(c);
        }
        assert!(app.entries.is_empty());

        app.exit_input_mode();
        app.filter_index = 0; // All
        app.apply_filter(&store).unwrap();
        assert_eq!(app.entries.len(), 1);
    }

    #[test]
    fn test_realtime_filter_stays_within_selected_category() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);
        for (name, category, description) in [
            ("index.html", "web", "Landing page"),
            ("page-notes.md", "other", ""),
        ] {
            let source = temp_dir.path().join(name);
            fs::write(&source, "x").unwrap();
            let mut request = AddRequest::new(&source, category);
            request.description = description.to_string();
            store.add(request).unwrap();
        }
        let mut app = test_app(&temp_dir, &store);

        app.filter_index = app
            .filters
            .iter()
            .position(|f| matches!(f, Filter::Location { category, .. } if category == "web"))
            .unwrap();
        app.apply_filter(&store).unwrap();

        app.enter_filter_mode();
        for c in "page".chars() {
            app.insert_char(c);
        }
        let keys: Vec<String> = app.entries.iter().map(|e| e.key.to_string()).collect();
        assert_eq!(keys, vec!["web/index.html"]);

        app.exit_input_mode();
        app.clear_filter(&store).unwrap();
        assert_eq!(app.entries.len(), 1);
    }

    #[test]
    fn test_detail_scroll_is_clamped_to_content() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let mut app = test_app(&temp_dir, &store);
        app.load_detail(&store);
        app.active_pane = ActivePane::Detail;

        // Nine metadata lines, Modified, eight lines of content
        let lines = app.detail_line_count();
        assert_eq!(lines, 18);

        app.move_to_last();
        assert_eq!(app.detail_scroll as usize, lines - 1);
        app.page_detail();
        app.move_down();
        assert_eq!(app.detail_scroll as usize, lines - 1);

        app.move_up();
        assert_eq!(app.detail_scroll as usize, lines - 2);
    }

    #[test]
    fn test_split_add_args_allows_spaces_in_path() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("my notes.txt");
        fs::write(&source, "x").unwrap();
        let path = source.to_str().unwrap();

        assert_eq!(split_add_args(path), (path, None));

        let input = format!("{} web/react", path);
        assert_eq!(split_add_args(&input), (path, Some("web/react")));

        assert_eq!(
            split_add_args("/missing/a b.txt ../up"),
            ("/missing/a b.txt ../up", None)
        );
    }

    #[test]
    fn test_delete_and_undo() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);
        let mut app = test_app(&temp_dir, &store);

        app.delete_current(&mut store).unwrap();
        assert!(app.entries.is_empty());

        app.undo_delete(&mut store).unwrap();
        assert_eq!(app.entries.len(), 1);
        assert_eq!(
            app.entries[0].metadata.description,
            "Standard gitignore for Python projects"
        );

        app.undo_delete(&mut store).unwrap();
        assert_eq!(app.status_message.as_deref(), Some("Nothing to undo"));
    }

    #[test]
    fn test_inject_needs_confirmation_for_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);
        let mut app = test_app(&temp_dir, &store);
        let dest = app.dest_dir.join("python-gitignore");

        app.inject_current(&mut store, None).unwrap();
        assert!(dest.exists());
        assert!(app.pending_inject.is_none());

        fs::write(&dest, "changed\n").unwrap();
        app.inject_current(&mut store, None).unwrap();
        assert!(app.pending_inject.is_some());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "changed\n");

        app.confirm_inject(&mut store).unwrap();
        assert!(fs::read_to_string(&dest).unwrap().contains("__pycache__/"));
    }

    #[test]
    fn test_execute_commands() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);
        let mut app = test_app(&temp_dir, &store);
        let source = temp_dir.path().join("compose.yml");
        fs::write(&source, "services: {}\n").unwrap();

        app.command_input = format!("add {} web/docker", source.display());
        app.execute_command(&mut store).unwrap();
        assert!(store.contains(&EntryKey::parse("web/docker/compose.yml").unwrap()));

        app.command_input = "search compose".to_string();
        app.execute_command(&mut store).unwrap();
        assert_eq!(app.entries.len(), 1);

        app.command_input = "tag yaml, docker".to_string();
        app.execute_command(&mut store).unwrap();
        let entry = store.get(&EntryKey::parse("web/docker/compose.yml").unwrap()).unwrap();
        assert_eq!(entry.metadata.tags, vec!["yaml", "docker"]);

        app.command_input = "inject docker-compose.yml".to_string();
        app.execute_command(&mut store).unwrap();
        assert!(app.dest_dir.join("docker-compose.yml").exists());

        let spaced = temp_dir.path().join("my notes.txt");
        fs::write(&spaced, "x").unwrap();
        app.command_input = format!("add {} other", spaced.display());
        app.execute_command(&mut store).unwrap();
        assert!(store.contains(&EntryKey::parse("other/my notes.txt").unwrap()));

        app.command_input = "frobnicate".to_string();
        app.execute_command(&mut store).unwrap();
        assert_eq!(
            app.status_message.as_deref(),
            Some("Unknown command: frobnicate")
        );
    }

    #[test]
    fn test_load_detail_caches_content() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let mut app = test_app(&temp_dir, &store);

        app.load_detail(&store);
        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.key.to_string(), "git/python-gitignore");
        assert!(detail.text.as_deref().unwrap().starts_with("# Python gitignore"));
    }
}
