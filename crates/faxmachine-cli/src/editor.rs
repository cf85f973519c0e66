//! Interactive editing support
//!
//! Opens the configured editor for metadata and stored files, and reads
//! answers to simple prompts.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

/// Open content in the user's preferred editor
///
/// Uses the configured editor, $EDITOR, $VISUAL, or falls back to common
/// editors.
pub fn edit_text(initial_content: &str, configured: Option<&str>) -> Result<String> {
    let temp_path = env::temp_dir().join(format!("faxmachine_edit_{}.txt", std::process::id()));

    fs::write(&temp_path, initial_content)
        .with_context(|| format!("Failed to create temp file: {:?}", temp_path))?;

    let result = edit_file(&temp_path, configured).and_then(|_| {
        fs::read_to_string(&temp_path)
            .with_context(|| format!("Failed to read edited file: {:?}", temp_path))
    });

    let _ = fs::remove_file(&temp_path);
    result
}

/// Open an existing file in the user's preferred editor and wait for it
pub fn edit_file(path: &Path, configured: Option<&str>) -> Result<()> {
    let editor = find_editor(configured)?;

    // Editor commands may carry arguments ("code --wait")
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or(editor.as_str());

    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor))?;

    if !status.success() {
        bail!(
            "Editor '{}' exited with non-zero status. Check that your editor is configured correctly.",
            editor
        );
    }

    Ok(())
}

/// Find the user's preferred editor
fn find_editor(configured: Option<&str>) -> Result<String> {
    if let Some(editor) = configured.map(str::trim).filter(|e| !e.is_empty()) {
        return Ok(editor.to_string());
    }

    // Check environment variables
    for var in ["EDITOR", "VISUAL"] {
        if let Ok(editor) = env::var(var) {
            if !editor.trim().is_empty() {
                return Ok(editor);
            }
        }
    }

    // Try common editors
    let common_editors = ["nano", "vim", "vi", "emacs", "code", "notepad"];

    for editor in common_editors {
        if command_exists(editor) {
            return Ok(editor.to_string());
        }
    }

    bail!(
        "No editor found. Set $EDITOR or the `editor` config key.\n\
         Example: faxmachine config set editor nano"
    )
}

/// Check if a command exists in PATH
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Whether stdin is attached to a terminal
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin)
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !is_interactive() {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

/// Prompt with a default value, returns None if user keeps default
pub fn prompt_with_default(prompt: &str, default: &str) -> Result<Option<String>> {
    if default.is_empty() {
        print!("{}: ", prompt);
    } else {
        print!("{} [{}]: ", prompt, default);
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        Ok(None)
    } else {
        Ok(Some(input.to_string()))
    }
}

/// Prompt for an optional value
pub fn prompt_optional(prompt: &str) -> Result<Option<String>> {
    prompt_with_default(prompt, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_editor_prefers_configured() {
        assert_eq!(find_editor(Some("hx")).unwrap(), "hx");
        assert_eq!(find_editor(Some("  code --wait ")).unwrap(), "code --wait");
    }

    #[test]
    fn test_find_editor_blank_config_falls_back_to_env() {
        let saved = env::var("EDITOR").ok();
        env::set_var("EDITOR", "faxmachine-test-editor");

        let found = find_editor(Some("   "));

        match saved {
            Some(value) => env::set_var("EDITOR", value),
            None => env::remove_var("EDITOR"),
        }
        assert_eq!(found.unwrap(), "faxmachine-test-editor");
    }

    #[test]
    fn test_command_exists() {
        // "ls" should exist on Unix systems
        #[cfg(unix)]
        assert!(command_exists("ls"));

        // Random nonsense should not exist
        assert!(!command_exists("definitely_not_a_real_command_12345"));
    }

    #[cfg(unix)]
    #[test]
    fn test_edit_text_with_noop_editor() {
        // `true` leaves the file untouched and exits successfully
        let edited = edit_text("description: keep me\n", Some("true")).unwrap();
        assert_eq!(edited, "description: keep me\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_edit_file_reports_failing_editor() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("f");
        fs::write(&path, "x").unwrap();
        assert!(edit_file(&path, Some("false")).is_err());
    }
}
