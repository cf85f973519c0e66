//! Command handlers

pub mod config;
pub mod entry;
pub mod init;
pub mod inject;
pub mod recent;
pub mod search;
pub mod tag;

use std::path::Path;

use anyhow::{Context, Result};

use faxmachine_core::{EntryKey, Store};

/// Parse a key given on the command line
///
/// Accepts `category[/subcategory]/name` or an absolute path inside the
/// database directory.
pub fn parse_key(store: &Store, input: &str) -> Result<EntryKey> {
    let input = input.trim();
    let path = Path::new(input);
    if path.is_absolute() {
        if let Ok(relative) = path.strip_prefix(store.db_dir()) {
            return EntryKey::from_relative_path(relative)
                .with_context(|| format!("Not a stored file: {}", input));
        }
    }

    EntryKey::parse(input).with_context(|| format!("Invalid entry key: {}", input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxmachine_core::Config;
    use tempfile::TempDir;

    fn test_store(temp_dir: &TempDir) -> Store {
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        Store::open_with_config(config).unwrap()
    }

    #[test]
    fn test_parse_key_relative() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        let key = parse_key(&store, "web/react/hook.ts").unwrap();
        assert_eq!(key.subcategory.as_deref(), Some("react"));
        assert_eq!(
            parse_key(&store, "  git/python-gitignore\n").unwrap().to_string(),
            "git/python-gitignore"
        );
        assert!(parse_key(&store, "lonely").is_err());
    }

    #[test]
    fn test_parse_key_absolute() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        let path = store.db_dir().join("git").join("python-gitignore");
        let key = parse_key(&store, path.to_str().unwrap()).unwrap();
        assert_eq!(key.to_string(), "git/python-gitignore");
    }
}
