//! Entry command handlers (list, add, show, edit, delete)

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use faxmachine_core::{parse_tag_list, AddRequest, EntryKey, Store, StoreError};

use crate::commands::parse_key;
use crate::editor::{confirm, edit_file, is_interactive, prompt_optional, prompt_with_default};
use crate::output::Output;

/// Category used when none is given and no prompt is possible
const FALLBACK_CATEGORY: &str = "other";

/// Arguments for `add`
#[derive(Debug, Clone)]
pub struct AddArgs {
    pub file: PathBuf,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub force: bool,
}

/// Show the category tree, optionally for one category
pub fn list(store: &Store, category: Option<String>, output: &Output) -> Result<()> {
    let tree = store.tree(category.as_deref())?;
    output.print_tree(&tree);
    Ok(())
}

/// Copy a file into the database
pub fn add(store: &mut Store, args: AddArgs, output: &Output) -> Result<()> {
    let interactive = output.should_prompt() && is_interactive();

    if !args.file.is_file() {
        bail!("File not found: {}", args.file.display());
    }

    let category = match args.category {
        Some(category) => category,
        None if interactive => prompt_category(store)?,
        None => FALLBACK_CATEGORY.to_string(),
    };

    let description = match args.description {
        Some(description) => description,
        None if interactive => prompt_optional("Description (optional)")?.unwrap_or_default(),
        None => String::new(),
    };

    let tags = match args.tags {
        Some(tags) => parse_tag_list(&tags),
        None if interactive => prompt_optional("Tags (comma-separated, optional)")?
            .map(|t| parse_tag_list(&t))
            .unwrap_or_default(),
        None => Vec::new(),
    };

    let mut request = AddRequest {
        source: args.file,
        category,
        subcategory: args.subcategory,
        name: args.name,
        description,
        tags,
        overwrite: args.force,
    };

    let entry = match store.add(request.clone()) {
        Ok(entry) => entry,
        Err(StoreError::AlreadyExists { key }) => {
            if !interactive {
                bail!("'{}' already exists. Use --force to replace it.", key);
            }
            if !confirm(&format!("'{}' already exists in the database. Replace it?", key))? {
                println!("Cancelled.");
                return Ok(());
            }
            request.overwrite = true;
            store.add(request).context("Failed to add file")?
        }
        Err(e) => return Err(e).context("Failed to add file"),
    };

    output.success(&format!("Added {}", entry.key));
    Ok(())
}

/// Ask for a category by number or new name
fn prompt_category(store: &Store) -> Result<String> {
    let categories = store.categories()?;

    if !categories.is_empty() {
        println!("Categories:");
        for (i, category) in categories.iter().enumerate() {
            println!("  {}. {}", i + 1, category);
        }
    }

    let answer = prompt_with_default("Category number or new name", FALLBACK_CATEGORY)?;
    Ok(resolve_category_choice(answer.as_deref(), &categories))
}

/// Interpret a category prompt answer
///
/// A valid number picks an existing category, anything else is taken as a
/// (possibly new) category name, and no answer falls back to the default.
fn resolve_category_choice(answer: Option<&str>, categories: &[String]) -> String {
    let Some(answer) = answer.map(str::trim).filter(|a| !a.is_empty()) else {
        return FALLBACK_CATEGORY.to_string();
    };

    match answer.parse::<usize>() {
        Ok(n) if n >= 1 && n <= categories.len() => categories[n - 1].clone(),
        _ => answer.to_string(),
    }
}

/// Show an entry by key
pub fn show(store: &mut Store, key: &str, output: &Output) -> Result<()> {
    let key = parse_key(store, key)?;
    show_key(store, &key, output)
}

/// Show an already-resolved entry and mark it as recently accessed
pub fn show_key(store: &mut Store, key: &EntryKey, output: &Output) -> Result<()> {
    let entry = store.get(key)?;
    let content = store.read_content(key)?;
    output.print_entry(&entry, &store.entry_path(key), &content);
    store.record_access(key)?;
    Ok(())
}

/// Edit an entry's metadata, or its stored content with `--content`
pub fn edit(store: &mut Store, key: &str, content: bool, output: &Output) -> Result<()> {
    let key = parse_key(store, key)?;
    let entry = store.get(&key)?;

    if content {
        edit_file(&store.entry_path(&key), store.config().editor.as_deref())?;
        output.success(&format!("Edited {}", key));
        return Ok(());
    }

    if !is_interactive() {
        bail!("Editing metadata needs a terminal. Use `faxmachine browse` or --content.");
    }

    let mut metadata = entry.metadata;

    println!("Editing metadata: {}", key);
    println!("Press Enter to keep current value, or type new value.\n");

    if let Some(description) = prompt_with_default("Description", &metadata.description)? {
        metadata.set_description(description);
    }

    let current_tags = metadata.tags.join(", ");
    println!(
        "Current tags: {}",
        if current_tags.is_empty() {
            "(none)"
        } else {
            &current_tags
        }
    );
    if let Some(tags) = prompt_optional("New tags (comma-separated)")? {
        metadata.set_tags(parse_tag_list(&tags));
    }

    store
        .update_metadata(&key, &metadata)
        .context("Failed to update metadata")?;

    output.success(&format!("Updated {}", key));
    Ok(())
}

/// Delete an entry by key
pub fn delete(store: &mut Store, key: &str, output: &Output) -> Result<()> {
    let key = parse_key(store, key)?;
    delete_key(store, &key, output)
}

/// Delete an already-resolved entry, confirming first in human mode
pub fn delete_key(store: &mut Store, key: &EntryKey, output: &Output) -> Result<()> {
    let entry = store.get(key)?;

    if output.should_prompt() {
        if entry.metadata.description.is_empty() {
            println!("Delete: {}", key);
        } else {
            println!("Delete: {} - {}", key, entry.metadata.description);
        }
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.delete(key).context("Failed to delete file")?;
    output.success(&format!("Deleted {}", key));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use faxmachine_core::Config;
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

    fn add_args(file: PathBuf) -> AddArgs {
        AddArgs {
            file,
            category: None,
            subcategory: None,
            name: None,
            description: None,
            tags: None,
            force: false,
        }
    }

    #[test]
    fn test_resolve_category_choice() {
        let categories = vec!["config".to_string(), "git".to_string()];

        assert_eq!(resolve_category_choice(None, &categories), "other");
        assert_eq!(resolve_category_choice(Some("  "), &categories), "other");
        assert_eq!(resolve_category_choice(Some("2"), &categories), "git");
        assert_eq!(resolve_category_choice(Some("3"), &categories), "3");
        assert_eq!(resolve_category_choice(Some("docker"), &categories), "docker");
    }

    #[test]
    fn test_add_non_interactive_uses_fallback_category() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);
        let file = temp_dir.path().join("notes.md");
        std::fs::write(&file, "# notes").unwrap();

        let mut args = add_args(file);
        args.tags = Some("md, docs".to_string());
        add(&mut store, args, &Output::new(OutputFormat::Quiet)).unwrap();

        let entry = store.get(&EntryKey::parse("other/notes.md").unwrap()).unwrap();
        assert_eq!(entry.metadata.tags, vec!["md", "docs"]);
    }

    #[test]
    fn test_add_existing_without_force_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);
        let file = temp_dir.path().join("a.txt");
        std::fs::write(&file, "x").unwrap();
        let output = Output::new(OutputFormat::Quiet);

        add(&mut store, add_args(file.clone()), &output).unwrap();
        let err = add(&mut store, add_args(file.clone()), &output).unwrap_err();
        assert!(err.to_string().contains("--force"));

        let mut args = add_args(file);
        args.force = true;
        add(&mut store, args, &output).unwrap();
    }

    #[test]
    fn test_add_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        let err = add(
            &mut store,
            add_args(temp_dir.path().join("missing")),
            &Output::new(OutputFormat::Quiet),
        )
        .unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_delete_quiet_skips_confirmation() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        delete(
            &mut store,
            "git/python-gitignore",
            &Output::new(OutputFormat::Quiet),
        )
        .unwrap();
        assert!(store.all_entries().unwrap().is_empty());
    }
}
