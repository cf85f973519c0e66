//! Recently accessed entries
//!
//! A bounded most-recent-first list of entry keys, persisted as JSON next to
//! the database so that recording an access never rewrites the user's
//! settings file.

use std::path::PathBuf;

use tracing::warn;

use crate::models::EntryKey;
use crate::storage::persistence::{read_json, write_json};
use crate::storage::StoreResult;

/// Bounded list of recently accessed entries
#[derive(Debug, Clone)]
pub struct RecentList {
    path: PathBuf,
    limit: usize,
    keys: Vec<EntryKey>,
}

impl RecentList {
    /// Load the list from disk (missing or corrupt files start empty)
    pub fn load(path: impl Into<PathBuf>, limit: usize) -> Self {
        let path = path.into();
        let keys = match read_json::<Vec<EntryKey>>(&path) {
            Ok(Some(keys)) => keys,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Ignoring unreadable recent list: {}", e);
                Vec::new()
            }
        };

        let mut list = Self { path, limit, keys };
        list.dedupe();
        list.keys.truncate(list.limit);
        list
    }

    /// Keys, most recent first
    pub fn keys(&self) -> &[EntryKey] {
        &self.keys
    }

    /// Move a key to the front, dropping the oldest entries past the limit
    pub fn push(&mut self, key: &EntryKey) {
        self.keys.retain(|k| k != key);
        self.keys.insert(0, key.clone());
        self.keys.truncate(self.limit);
    }

    /// Remove a key, returning whether it was present
    pub fn remove(&mut self, key: &EntryKey) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| k != key);
        self.keys.len() != before
    }

    /// Persist the list
    pub fn save(&self) -> StoreResult<()> {
        write_json(&self.path, &self.keys)
    }

    fn dedupe(&mut self) {
        let mut seen = Vec::with_capacity(self.keys.len());
        self.keys.retain(|k| {
            if seen.contains(k) {
                false
            } else {
                seen.push(k.clone());
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(s: &str) -> EntryKey {
        EntryKey::parse(s).unwrap()
    }

    #[test]
    fn test_push_moves_to_front() {
        let temp_dir = TempDir::new().unwrap();
        let mut recent = RecentList::load(temp_dir.path().join("recent.json"), 10);

        recent.push(&key("git/a"));
        recent.push(&key("git/b"));
        recent.push(&key("git/a"));

        assert_eq!(recent.keys(), &[key("git/a"), key("git/b")]);
    }

    #[test]
    fn test_push_respects_limit() {
        let temp_dir = TempDir::new().unwrap();
        let mut recent = RecentList::load(temp_dir.path().join("recent.json"), 3);

        for name in ["a", "b", "c", "d"] {
            recent.push(&key(&format!("other/{}", name)));
        }

        assert_eq!(
            recent.keys(),
            &[key("other/d"), key("other/c"), key("other/b")]
        );
    }

    #[test]
    fn test_remove() {
        let temp_dir = TempDir::new().unwrap();
        let mut recent = RecentList::load(temp_dir.path().join("recent.json"), 10);
        recent.push(&key("git/a"));

        assert!(recent.remove(&key("git/a")));
        assert!(!recent.remove(&key("git/a")));
        assert!(recent.keys().is_empty());
    }

    #[test]
    fn test_persists_across_loads() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recent.json");

        {
            let mut recent = RecentList::load(&path, 10);
            recent.push(&key("web/index.html"));
            recent.push(&key("git/python-gitignore"));
            recent.save().unwrap();
        }

        let recent = RecentList::load(&path, 1);
        assert_eq!(recent.keys(), &[key("git/python-gitignore")]);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recent.json");
        std::fs::write(&path, "[\"git/a\", 42]").unwrap();

        assert!(RecentList::load(&path, 10).keys().is_empty());
    }
}
