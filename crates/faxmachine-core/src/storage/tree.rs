//! Stored file tree
//!
//! The database is a plain directory: one subdirectory per category, nested
//! directories for subcategories, files copied in verbatim.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::models::EntryKey;
use crate::storage::error::{StoreError, StoreResult};

/// Filesystem view of the database root
pub struct FileTree {
    root: PathBuf,
}

/// Size and modification time of a stored file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileStat {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl FileTree {
    /// Create a view rooted at the database directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The database root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a stored file
    pub fn path_for(&self, key: &EntryKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Absolute path of a category directory
    pub fn category_path(&self, category: &str) -> PathBuf {
        self.root.join(category)
    }

    /// Check whether a regular file exists for the key
    pub fn contains(&self, key: &EntryKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Create the root directory (and any named categories)
    pub fn create_dirs<'a>(&self, categories: impl IntoIterator<Item = &'a str>) -> StoreResult<()> {
        create_dir(&self.root)?;
        for category in categories {
            create_dir(&self.category_path(category))?;
        }
        Ok(())
    }

    /// Sorted names of the top-level category directories
    pub fn categories(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        if !self.root.exists() {
            return Ok(names);
        }

        let entries =
            fs::read_dir(&self.root).map_err(|e| StoreError::from_read(e, self.root.clone()))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::from_read(e, self.root.clone()))?;
            if entry.path().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Every stored file below the root, sorted by key
    ///
    /// Files sitting directly in the root have no category and are skipped.
    pub fn keys(&self) -> StoreResult<Vec<EntryKey>> {
        self.keys_under(&self.root)
    }

    /// Every stored file below a directory, sorted by key
    pub fn keys_under(&self, dir: &Path) -> StoreResult<Vec<EntryKey>> {
        let mut keys = Vec::new();
        if !dir.exists() {
            return Ok(keys);
        }

        for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|e| StoreError::Walk {
                path: dir.to_path_buf(),
                source: e,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            match EntryKey::from_relative_path(relative) {
                Ok(key) => keys.push(key),
                Err(e) => warn!("Skipping {:?}: {}", entry.path(), e),
            }
        }

        keys.sort();
        Ok(keys)
    }

    /// Size and modification time of a stored file
    pub fn stat(&self, key: &EntryKey) -> StoreResult<FileStat> {
        let path = self.path_for(key);
        let meta = fs::metadata(&path).map_err(|e| StoreError::from_read(e, path.clone()))?;
        Ok(FileStat {
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    /// Read the raw content of a stored file
    pub fn read(&self, key: &EntryKey) -> StoreResult<Vec<u8>> {
        let path = self.path_for(key);
        fs::read(&path).map_err(|e| StoreError::from_read(e, path))
    }

    /// Copy a source file into the tree, creating directories as needed
    ///
    /// Copying a stored file onto itself is refused; it would truncate it.
    pub fn copy_in(&self, source: &Path, key: &EntryKey) -> StoreResult<u64> {
        let dest = self.path_for(key);
        if same_file(source, &dest) {
            return Err(StoreError::SameFile { path: dest });
        }
        if let Some(parent) = dest.parent() {
            create_dir(parent)?;
        }
        let bytes = fs::copy(source, &dest).map_err(|e| StoreError::from_io(e, dest.clone()))?;
        debug!("Copied {:?} to {:?} ({} bytes)", source, dest, bytes);
        Ok(bytes)
    }

    /// Write raw content for a key, creating directories as needed
    pub fn write(&self, key: &EntryKey, content: &[u8]) -> StoreResult<()> {
        let dest = self.path_for(key);
        if let Some(parent) = dest.parent() {
            create_dir(parent)?;
        }
        fs::write(&dest, content).map_err(|e| StoreError::from_io(e, dest))
    }

    /// Remove a stored file and prune empty subcategory directories
    ///
    /// The top-level category directory is kept even when it becomes empty.
    pub fn remove(&self, key: &EntryKey) -> StoreResult<()> {
        let path = self.path_for(key);
        fs::remove_file(&path).map_err(|e| StoreError::from_io(e, path.clone()))?;

        let category_dir = self.category_path(&key.category);
        let mut dir = path.parent().map(Path::to_path_buf);
        while let Some(current) = dir {
            if current == category_dir || !current.starts_with(&category_dir) {
                break;
            }
            // read_dir failing or finding anything stops the pruning
            let is_empty = fs::read_dir(&current)
                .map(|mut it| it.next().is_none())
                .unwrap_or(false);
            if !is_empty || fs::remove_dir(&current).is_err() {
                break;
            }
            debug!("Pruned empty directory {:?}", current);
            dir = current.parent().map(Path::to_path_buf);
        }

        Ok(())
    }
}

/// Whether two paths resolve to the same existing file
pub(crate) fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn create_dir(path: &Path) -> StoreResult<()> {
    fs::create_dir_all(path).map_err(|e| StoreError::CreateDirectory {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(s: &str) -> EntryKey {
        EntryKey::parse(s).unwrap()
    }

    fn tree_with_files(temp_dir: &TempDir, files: &[&str]) -> FileTree {
        let tree = FileTree::new(temp_dir.path().join("db"));
        for f in files {
            tree.write(&key(f), f.as_bytes()).unwrap();
        }
        tree
    }

    #[test]
    fn test_keys_sorted_and_nested() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree_with_files(
            &temp_dir,
            &["web/index.html", "git/python-gitignore", "web/react/hook.ts"],
        );

        let keys: Vec<String> = tree.keys().unwrap().iter().map(|k| k.to_string()).collect();
        assert_eq!(
            keys,
            vec!["git/python-gitignore", "web/index.html", "web/react/hook.ts"]
        );
    }

    #[test]
    fn test_root_files_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree_with_files(&temp_dir, &["git/a"]);
        fs::write(tree.root().join("stray.txt"), "x").unwrap();

        assert_eq!(tree.keys().unwrap().len(), 1);
    }

    #[test]
    fn test_categories() {
        let temp_dir = TempDir::new().unwrap();
        let tree = FileTree::new(temp_dir.path().join("db"));
        assert!(tree.categories().unwrap().is_empty());

        tree.create_dirs(["python", "git"]).unwrap();
        assert_eq!(tree.categories().unwrap(), vec!["git", "python"]);
    }

    #[test]
    fn test_remove_prunes_empty_subcategories() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree_with_files(&temp_dir, &["web/react/hooks/use.ts"]);

        tree.remove(&key("web/react/hooks/use.ts")).unwrap();

        assert!(!tree.root().join("web").join("react").exists());
        assert!(tree.root().join("web").is_dir());
    }

    #[test]
    fn test_remove_keeps_non_empty_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree_with_files(&temp_dir, &["web/react/a.ts", "web/react/b.ts"]);

        tree.remove(&key("web/react/a.ts")).unwrap();

        assert!(tree.contains(&key("web/react/b.ts")));
    }

    #[test]
    fn test_stat_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree_with_files(&temp_dir, &["git/a"]);

        let stat = tree.stat(&key("git/a")).unwrap();
        assert_eq!(stat.size, 5);
        assert!(stat.modified.is_some());
        assert_eq!(tree.read(&key("git/a")).unwrap(), b"git/a");
        assert!(tree.read(&key("git/missing")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_copy_in_refuses_the_stored_file_itself() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree_with_files(&temp_dir, &["git/a"]);
        let stored = tree.path_for(&key("git/a"));

        let err = tree.copy_in(&stored, &key("git/a")).unwrap_err();
        assert!(matches!(err, StoreError::SameFile { .. }));
        assert_eq!(fs::read(&stored).unwrap(), b"git/a");
    }

    #[test]
    fn test_whitespace_edged_names_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree_with_files(&temp_dir, &["other/notes.md"]);
        fs::write(tree.root().join("other").join("notes.md "), "x").unwrap();

        assert_eq!(tree.keys().unwrap(), vec![key("other/notes.md")]);
    }
}
