//! Inject command handler and the numbered pick prompt shared by
//! `search` and `recent`

use std::env;

use anyhow::{bail, Context, Result};

use faxmachine_core::{EntryKey, InjectOptions, Preview, Store};

use crate::commands::{entry, parse_key};
use crate::editor::{confirm, is_interactive, prompt_optional};
use crate::output::Output;

/// Arguments for `inject`
#[derive(Debug, Clone)]
pub struct InjectArgs {
    pub key: String,
    pub name: Option<String>,
    pub no_preview: bool,
    pub force: bool,
}

/// Copy an entry into the current directory
pub fn inject(store: &mut Store, args: InjectArgs, output: &Output) -> Result<()> {
    let key = parse_key(store, &args.key)?;
    inject_key(store, &key, args.name, !args.no_preview, args.force, output)
}

/// Copy an already-resolved entry into the current directory
///
/// An existing destination is previewed (when enabled) and only replaced
/// after confirmation or with `force`.
pub fn inject_key(
    store: &mut Store,
    key: &EntryKey,
    name: Option<String>,
    preview: bool,
    force: bool,
    output: &Output,
) -> Result<()> {
    let dest_dir = env::current_dir().context("Failed to read current directory")?;
    let mut options = InjectOptions {
        dest_dir,
        dest_name: name,
        overwrite: force,
    };

    let dest = options.dest_path(key);
    let dest_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| key.name.clone());

    if dest.exists() && !force {
        if preview && store.config().preview_before_inject {
            let entry = store.get(key)?;
            if output.should_prompt() && !entry.metadata.description.is_empty() {
                println!("{} - {}", key, entry.metadata.description);
            }

            let diff = store.preview_inject(key, &options)?;
            if let Preview::Identical { .. } = diff {
                output.message(&format!("'{}' is already identical to {}", dest_name, key));
                return Ok(());
            }
            output.print_preview(&diff);
        }

        if !output.should_prompt() {
            bail!("File '{}' already exists. Use --force to overwrite.", dest_name);
        }
        if !confirm(&format!("File '{}' already exists. Overwrite?", dest_name))? {
            println!("Operation cancelled.");
            return Ok(());
        }
        options.overwrite = true;
    }

    let dest = store.inject(key, &options).context("Failed to inject file")?;
    output.print_injected(key, &dest);
    Ok(())
}

/// Answer to the numbered pick prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    /// Inject the entry at this index
    Inject(usize),
    /// Show the entry at this index
    View(usize),
    /// No choice made
    Cancel,
}

/// Parse `N` (inject), `vN` (view) or an empty answer (cancel)
///
/// Numbers are 1-based; out-of-range or malformed answers give `None`.
pub fn parse_pick(answer: &str, len: usize) -> Option<Pick> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Some(Pick::Cancel);
    }

    let (view, number) = match answer.strip_prefix(['v', 'V']) {
        Some(rest) => (true, rest.trim()),
        None => (false, answer),
    };

    let index = number.parse::<usize>().ok()?.checked_sub(1)?;
    if index >= len {
        return None;
    }

    Some(if view {
        Pick::View(index)
    } else {
        Pick::Inject(index)
    })
}

/// Offer to inject or view one of a numbered list of entries
///
/// Only prompts in human mode on a terminal.
pub fn prompt_pick(
    store: &mut Store,
    keys: &[EntryKey],
    name: Option<String>,
    output: &Output,
) -> Result<()> {
    if keys.is_empty() || !output.should_prompt() || !is_interactive() {
        return Ok(());
    }

    println!();
    let answer =
        prompt_optional("Enter number to inject file, v<number> to view, or Enter to cancel")?;

    match parse_pick(answer.as_deref().unwrap_or(""), keys.len()) {
        Some(Pick::Cancel) => Ok(()),
        Some(Pick::View(i)) => entry::show_key(store, &keys[i], output),
        Some(Pick::Inject(i)) => {
            let name = match name {
                Some(name) => Some(name),
                None => prompt_optional("Destination filename (leave blank for original)")?,
            };
            inject_key(store, &keys[i], name, true, false, output)
        }
        None => bail!("Invalid choice"),
    }
}

/// Pick a 1-based index out of a result list
pub fn nth_key(keys: &[EntryKey], index: usize) -> Result<&EntryKey> {
    match index.checked_sub(1).and_then(|i| keys.get(i)) {
        Some(key) => Ok(key),
        None => bail!("Invalid index {}: {} result(s)", index, keys.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pick() {
        assert_eq!(parse_pick("", 3), Some(Pick::Cancel));
        assert_eq!(parse_pick("  \n", 3), Some(Pick::Cancel));
        assert_eq!(parse_pick("1", 3), Some(Pick::Inject(0)));
        assert_eq!(parse_pick("v3", 3), Some(Pick::View(2)));
        assert_eq!(parse_pick("V 2", 3), Some(Pick::View(1)));
    }

    #[test]
    fn test_parse_pick_rejects_out_of_range() {
        assert_eq!(parse_pick("0", 3), None);
        assert_eq!(parse_pick("4", 3), None);
        assert_eq!(parse_pick("v", 3), None);
        assert_eq!(parse_pick("x1", 3), None);
        assert_eq!(parse_pick("-1", 3), None);
    }

    #[test]
    fn test_nth_key() {
        let keys = vec![
            EntryKey::parse("git/a").unwrap(),
            EntryKey::parse("git/b").unwrap(),
        ];

        assert_eq!(nth_key(&keys, 2).unwrap().name, "b");
        assert!(nth_key(&keys, 0).is_err());
        assert!(nth_key(&keys, 3).is_err());
    }
}
