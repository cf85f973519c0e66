//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use std::path::Path;

use serde::Serialize;

use faxmachine_core::preview::is_binary;
use faxmachine_core::{Entry, EntryKey, Preview, SearchHit, TreeNode};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print an entry's metadata block followed by its content
    pub fn print_entry(&self, entry: &Entry, path: &Path, content: &[u8]) {
        let binary = is_binary(content);

        match self.format {
            OutputFormat::Human => {
                println!("── {} ──", entry.key);
                if !entry.metadata.description.is_empty() {
                    println!("Description: {}", entry.metadata.description);
                }
                if !entry.metadata.added_date.is_empty() {
                    println!("Added:       {}", entry.metadata.added_day());
                }
                if !entry.metadata.tags.is_empty() {
                    println!("Tags:        {}", entry.metadata.tags.join(", "));
                }
                if !entry.metadata.source_path.is_empty() {
                    println!("Source:      {}", entry.metadata.source_path);
                }
                println!("Path:        {}", path.display());
                println!("Size:        {}", format_size(entry.size));
                if let Some(modified) = entry.modified {
                    println!("Modified:    {}", modified.format("%Y-%m-%d %H:%M"));
                }
                println!();
                print!("{}", entry_body(content, entry.size));
            }
            OutputFormat::Json => {
                let text = (!binary).then(|| String::from_utf8_lossy(content).into_owned());
                print_json(&serde_json::json!({
                    "entry": entry,
                    "path": path,
                    "binary": binary,
                    "content": text,
                }));
            }
            OutputFormat::Quiet => {
                if !binary {
                    print!("{}", String::from_utf8_lossy(content));
                }
            }
        }
    }

    /// Print the category tree with descriptions
    pub fn print_tree(&self, nodes: &[TreeNode]) {
        match self.format {
            OutputFormat::Human => {
                if nodes.is_empty() {
                    println!("No categories found. Run `faxmachine init` first.");
                    return;
                }
                for node in nodes {
                    println!("{}/", node.name());
                    if let TreeNode::Directory { children, .. } = node {
                        print_tree_children(children, "");
                    }
                }
                let total: usize = nodes.iter().map(TreeNode::file_count).sum();
                println!("\n{} file(s)", total);
            }
            OutputFormat::Json => print_json(&nodes),
            OutputFormat::Quiet => {
                for node in nodes {
                    print_tree_keys(node);
                }
            }
        }
    }

    /// Print numbered search results
    pub fn print_hits(&self, hits: &[SearchHit]) {
        match self.format {
            OutputFormat::Human => {
                for (i, hit) in hits.iter().enumerate() {
                    println!("{:>3}. {} ({})", i + 1, hit.key, hit.kind);
                    if !hit.description.is_empty() {
                        println!("     {}", truncate_line(&hit.description, 70));
                    }
                }
            }
            OutputFormat::Json => print_json(&hits),
            OutputFormat::Quiet => {
                for hit in hits {
                    println!("{}", hit.key);
                }
            }
        }
    }

    /// Print the numbered recently-accessed list
    pub fn print_recent(&self, entries: &[Entry]) {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("No recently accessed files.");
                    return;
                }
                for (i, entry) in entries.iter().enumerate() {
                    if entry.metadata.description.is_empty() {
                        println!("{:>3}. {}", i + 1, entry.key);
                    } else {
                        println!(
                            "{:>3}. {} - {}",
                            i + 1,
                            entry.key,
                            truncate_line(&entry.metadata.description, 50)
                        );
                    }
                }
            }
            OutputFormat::Json => print_json(&entries),
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.key);
                }
            }
        }
    }

    /// Print a list of tags
    pub fn print_tags(&self, tags: &[(String, usize)]) {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return;
                }
                for (name, count) in tags {
                    println!("{} ({})", name, count);
                }
                println!("\n{} tag(s)", tags.len());
            }
            OutputFormat::Json => {
                let json_tags: Vec<_> = tags
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                print_json(&json_tags);
            }
            OutputFormat::Quiet => {
                for (name, _) in tags {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print an inject preview
    pub fn print_preview(&self, preview: &Preview) {
        match self.format {
            OutputFormat::Human => {
                println!("── Preview ──");
                println!("{}", preview.text().trim_end());
                println!();
            }
            OutputFormat::Json => print_json(preview),
            OutputFormat::Quiet => {}
        }
    }

    /// Print the result of an inject
    pub fn print_injected(&self, key: &EntryKey, dest: &Path) {
        match self.format {
            OutputFormat::Human => println!("✓ Injected '{}' to {}", key, dest.display()),
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "status": "success",
                    "key": key,
                    "path": dest,
                }));
            }
            OutputFormat::Quiet => println!("{}", dest.display()),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Content shown below an entry's metadata; binary content is only reported
fn entry_body(content: &[u8], size: u64) -> String {
    if is_binary(content) {
        return format!("(binary file, {} not shown)\n", format_size(size));
    }
    let mut text = String::from_utf8_lossy(content).into_owned();
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode JSON output: {}", e),
    }
}

fn print_tree_children(nodes: &[TreeNode], indent: &str) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let branch = if last { "└── " } else { "├── " };
        match node {
            TreeNode::Directory { name, children } => {
                println!("{}{}{}/", indent, branch, name);
                let next = format!("{}{}", indent, if last { "    " } else { "│   " });
                print_tree_children(children, &next);
            }
            TreeNode::File {
                name, description, ..
            } => {
                if description.is_empty() {
                    println!("{}{}{}", indent, branch, name);
                } else {
                    println!(
                        "{}{}{} - {}",
                        indent,
                        branch,
                        name,
                        truncate_line(description, 50)
                    );
                }
            }
        }
    }
}

fn print_tree_keys(node: &TreeNode) {
    match node {
        TreeNode::Directory { children, .. } => children.iter().for_each(print_tree_keys),
        TreeNode::File { key, .. } => println!("{}", key),
    }
}

/// Human-readable byte size
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Truncate a string to max length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("ääääääääääää", 5), "ää...");
    }

    #[test]
    fn test_truncate_line() {
        assert_eq!(truncate_line("single line", 20), "single line");
        assert_eq!(truncate_line("line one\nline two", 20), "line one");
        assert_eq!(
            truncate_line("very long single line here", 10),
            "very lo..."
        );
    }

    #[test]
    fn test_entry_body_reports_binary_content() {
        let body = entry_body(b"\x7fELF\0\x02needle", 2048);
        assert_eq!(body, "(binary file, 2.0 KB not shown)\n");
        assert!(!body.contains("needle"));
    }

    #[test]
    fn test_entry_body_ends_text_with_newline() {
        assert_eq!(entry_body(b"a = 1", 5), "a = 1\n");
        assert_eq!(entry_body(b"a = 1\n", 6), "a = 1\n");
        assert_eq!(entry_body(b"", 0), "");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
