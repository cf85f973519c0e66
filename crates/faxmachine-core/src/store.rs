//! Unified storage interface
//!
//! The `Store` coordinates the three pieces of on-disk state:
//! - the file tree (`db/`), source of truth for which entries exist
//! - the metadata sidecars (`metadata/`)
//! - the recently-accessed list (`recent.json`)
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open()?;
//!
//! // Add a template
//! let entry = store.add(AddRequest::new("./.gitignore", "git"))?;
//!
//! // Find it again and copy it into another project
//! let hits = store.search(&SearchQuery::new("gitignore"))?;
//! store.inject(&hits[0].key, &InjectOptions::new(project_dir))?;
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{Entry, EntryKey, Metadata, TreeNode};
use crate::preview::{diff_preview, Preview};
use crate::recent::RecentList;
use crate::search::{self, SearchHit, SearchQuery};
use crate::storage::tree::same_file;
use crate::storage::{FileTree, MetadataPersistence, StoreError, StoreResult};

/// Categories created by `init`
pub const DEFAULT_CATEGORIES: &[&str] = &["git", "web", "python", "config", "other"];

const EXAMPLE_KEY: &str = "git/python-gitignore";
const EXAMPLE_CONTENT: &str = "# Python gitignore
__pycache__/
*.py[cod]
*$py.class
.env
venv/
ENV/
.vscode/
";

/// Parameters for adding a file to the store
#[derive(Debug, Clone, Default)]
pub struct AddRequest {
    /// File to copy into the store
    pub source: PathBuf,
    /// Target category
    pub category: String,
    /// Optional subcategory below the category
    pub subcategory: Option<String>,
    /// Stored name (defaults to the source file name)
    pub name: Option<String>,
    /// Description for the metadata record
    pub description: String,
    /// Tags for the metadata record
    pub tags: Vec<String>,
    /// Replace an existing entry with the same key
    pub overwrite: bool,
}

impl AddRequest {
    /// Add `source` to `category` under its own file name
    pub fn new(source: impl Into<PathBuf>, category: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    /// Key the file will be stored under
    pub fn key(&self) -> StoreResult<EntryKey> {
        let name = match &self.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => self
                .source
                .file_name()
                .map(|n| n.to_string_lossy().trim().to_string())
                .ok_or_else(|| StoreError::SourceNotFound {
                    path: self.source.clone(),
                })?,
        };
        EntryKey::new(self.category.trim(), self.subcategory.clone(), name)
    }
}

/// Parameters for copying an entry out of the store
#[derive(Debug, Clone)]
pub struct InjectOptions {
    /// Directory the file is written to
    pub dest_dir: PathBuf,
    /// File name to write (defaults to the entry name)
    pub dest_name: Option<String>,
    /// Replace an existing destination file
    pub overwrite: bool,
}

impl InjectOptions {
    /// Inject into `dest_dir` under the entry's own name
    pub fn new(dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            dest_dir: dest_dir.into(),
            dest_name: None,
            overwrite: false,
        }
    }

    /// Destination path for an entry
    pub fn dest_path(&self, key: &EntryKey) -> PathBuf {
        let name = self
            .dest_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&key.name);
        self.dest_dir.join(name)
    }
}

/// Outcome of `Store::init`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitResult {
    /// The database directory did not exist before
    pub created: bool,
    /// The example entry was written
    pub seeded: bool,
}

/// Unified storage interface for Faxmachine
pub struct Store {
    config: Config,
    tree: FileTree,
    sidecars: MetadataPersistence,
    recent: RecentList,
}

impl Store {
    /// Open the store using the default configuration
    pub fn open() -> anyhow::Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config).context("Failed to open template database")
    }

    /// Open the store with a specific configuration
    ///
    /// Directories are not created here; see `init`.
    pub fn open_with_config(config: Config) -> StoreResult<Self> {
        let tree = FileTree::new(config.db_dir());
        let sidecars = MetadataPersistence::new(config.metadata_dir());
        let recent = RecentList::load(config.recent_path(), config.recent_limit);

        Ok(Self {
            config,
            tree,
            sidecars,
            recent,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Root of the stored file tree
    pub fn db_dir(&self) -> &Path {
        self.tree.root()
    }

    /// Whether the database directory exists
    pub fn is_initialized(&self) -> bool {
        self.tree.root().is_dir()
    }

    /// Create the database layout, default categories and example entry
    ///
    /// Safe to run repeatedly; existing content is never touched.
    pub fn init(&mut self) -> StoreResult<InitResult> {
        let created = !self.is_initialized();

        self.tree.create_dirs(DEFAULT_CATEGORIES.iter().copied())?;
        fs::create_dir_all(self.sidecars.dir()).map_err(|e| StoreError::CreateDirectory {
            path: self.sidecars.dir().to_path_buf(),
            source: e,
        })?;

        let git_dir = self.tree.category_path("git");
        let git_is_empty = fs::read_dir(&git_dir)
            .map_err(|e| StoreError::from_read(e, git_dir.clone()))?
            .next()
            .is_none();

        let mut seeded = false;
        if git_is_empty {
            let key = EntryKey::parse(EXAMPLE_KEY)?;
            self.tree.write(&key, EXAMPLE_CONTENT.as_bytes())?;

            let mut metadata = Metadata::new("Standard gitignore for Python projects", "");
            metadata.set_tags(["python", "git", "ignore"]);
            self.sidecars.save(&key, &metadata)?;
            seeded = true;
        }

        debug!("Initialized database at {:?}", self.tree.root());
        Ok(InitResult { created, seeded })
    }

    // ==================== Browsing ====================

    /// Sorted top-level category names
    pub fn categories(&self) -> StoreResult<Vec<String>> {
        self.tree.categories()
    }

    /// Directory tree of the whole database or of one category
    pub fn tree(&self, category: Option<&str>) -> StoreResult<Vec<TreeNode>> {
        match category {
            Some(name) => {
                let path = self.tree.category_path(name);
                if name.contains(['/', '\\']) || name == ".." || !path.is_dir() {
                    return Err(StoreError::CategoryNotFound {
                        name: name.to_string(),
                    });
                }
                Ok(vec![TreeNode::Directory {
                    name: name.to_string(),
                    children: self.build_tree(&path)?,
                }])
            }
            None => {
                let root = self.tree.root().to_path_buf();
                if !root.exists() {
                    return Ok(Vec::new());
                }
                let nodes = self.build_tree(&root)?;
                // Files directly in the root have no category and are not entries
                Ok(nodes
                    .into_iter()
                    .filter(|n| matches!(n, TreeNode::Directory { .. }))
                    .collect())
            }
        }
    }

    fn build_tree(&self, dir: &Path) -> StoreResult<Vec<TreeNode>> {
        let mut children: Vec<(String, PathBuf)> = fs::read_dir(dir)
            .map_err(|e| StoreError::from_read(e, dir.to_path_buf()))?
            .filter_map(|e| e.ok())
            .map(|e| (e.file_name().to_string_lossy().into_owned(), e.path()))
            .collect();
        children.sort();

        let mut nodes = Vec::with_capacity(children.len());
        for (name, path) in children {
            if path.is_dir() {
                nodes.push(TreeNode::Directory {
                    children: self.build_tree(&path)?,
                    name,
                });
            } else if path.is_file() {
                let relative = path.strip_prefix(self.tree.root()).unwrap_or(&path);
                let Ok(key) = EntryKey::from_relative_path(relative) else {
                    continue;
                };
                let description = self.sidecars.load(&key).description;
                nodes.push(TreeNode::File {
                    name,
                    key,
                    description,
                });
            }
        }
        Ok(nodes)
    }

    // ==================== Entry Operations ====================

    /// Copy a file into the store and write its metadata
    pub fn add(&mut self, request: AddRequest) -> StoreResult<Entry> {
        if !request.source.is_file() {
            return Err(StoreError::SourceNotFound {
                path: request.source.clone(),
            });
        }

        let key = request.key()?;
        if self.tree.contains(&key) && !request.overwrite {
            return Err(StoreError::AlreadyExists {
                key: key.to_string(),
            });
        }

        let source = fs::canonicalize(&request.source)
            .unwrap_or_else(|_| request.source.clone());

        // Re-adding the stored file itself only rewrites its metadata
        let mut metadata = if same_file(&source, &self.tree.path_for(&key)) {
            let mut existing = self.sidecars.load(&key);
            existing.set_description(request.description.trim());
            existing
        } else {
            self.tree.copy_in(&source, &key)?;
            Metadata::new(
                request.description.trim(),
                source.to_string_lossy().into_owned(),
            )
        };
        metadata.set_tags(request.tags);
        self.sidecars.save(&key, &metadata)?;

        debug!("Added {} from {:?}", key, source);
        self.get(&key)
    }

    /// Get a stored entry with its metadata
    pub fn get(&self, key: &EntryKey) -> StoreResult<Entry> {
        if !self.tree.contains(key) {
            return Err(StoreError::EntryNotFound {
                key: key.to_string(),
            });
        }

        let stat = self.tree.stat(key)?;
        Ok(Entry {
            key: key.clone(),
            metadata: self.sidecars.load(key),
            size: stat.size,
            modified: stat.modified,
        })
    }

    /// Check whether an entry exists
    pub fn contains(&self, key: &EntryKey) -> bool {
        self.tree.contains(key)
    }

    /// Absolute path of a stored file
    pub fn entry_path(&self, key: &EntryKey) -> PathBuf {
        self.tree.path_for(key)
    }

    /// Raw content of a stored file
    pub fn read_content(&self, key: &EntryKey) -> StoreResult<Vec<u8>> {
        if !self.tree.contains(key) {
            return Err(StoreError::EntryNotFound {
                key: key.to_string(),
            });
        }
        self.tree.read(key)
    }

    /// Every stored entry, sorted by key
    pub fn all_entries(&self) -> StoreResult<Vec<Entry>> {
        Ok(self.entries_for(self.tree.keys()?))
    }

    /// Entries below a category (and optional subcategory), sorted by key
    pub fn entries_in(&self, category: &str, subcategory: Option<&str>) -> StoreResult<Vec<Entry>> {
        let mut dir = self.tree.category_path(category);
        if let Some(sub) = subcategory {
            dir.push(sub);
        }
        Ok(self.entries_for(self.tree.keys_under(&dir)?))
    }

    /// Load entries for listed keys, skipping any that cannot be read
    fn entries_for(&self, keys: Vec<EntryKey>) -> Vec<Entry> {
        keys.iter()
            .filter_map(|key| match self.get(key) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping {}: {}", key, e);
                    None
                }
            })
            .collect()
    }

    /// Replace the metadata record of an existing entry
    pub fn update_metadata(&mut self, key: &EntryKey, metadata: &Metadata) -> StoreResult<()> {
        if !self.tree.contains(key) {
            return Err(StoreError::EntryNotFound {
                key: key.to_string(),
            });
        }
        self.sidecars.save(key, metadata)?;
        debug!("Updated metadata for {}", key);
        Ok(())
    }

    /// Delete an entry, its metadata and its recent-list slot
    ///
    /// Returns the entry as it was before deletion.
    pub fn delete(&mut self, key: &EntryKey) -> StoreResult<Entry> {
        let entry = self.get(key)?;

        self.tree.remove(key)?;
        self.sidecars.delete(key)?;
        if self.recent.remove(key) {
            self.recent.save()?;
        }

        debug!("Deleted {}", key);
        Ok(entry)
    }

    /// Write an entry back from saved content and metadata (undo of `delete`)
    pub fn restore(&mut self, key: &EntryKey, content: &[u8], metadata: &Metadata) -> StoreResult<()> {
        self.tree.write(key, content)?;
        self.sidecars.save(key, metadata)?;
        debug!("Restored {}", key);
        Ok(())
    }

    // ==================== Inject ====================

    /// Describe what injecting an entry would do, without writing anything
    pub fn preview_inject(&self, key: &EntryKey, options: &InjectOptions) -> StoreResult<Preview> {
        let template = self.read_content(key)?;
        let dest = options.dest_path(key);
        let dest_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.name.clone());

        let current = if dest.is_file() {
            Some(fs::read(&dest).map_err(|e| StoreError::from_read(e, dest.clone()))?)
        } else {
            None
        };

        Ok(diff_preview(&key.name, &template, &dest_name, current.as_deref()))
    }

    /// Copy an entry into the destination directory
    ///
    /// An existing destination is only replaced when `overwrite` is set.
    /// Successful injects move the entry to the front of the recent list.
    pub fn inject(&mut self, key: &EntryKey, options: &InjectOptions) -> StoreResult<PathBuf> {
        if !self.tree.contains(key) {
            return Err(StoreError::EntryNotFound {
                key: key.to_string(),
            });
        }

        let source = self.tree.path_for(key);
        let dest = options.dest_path(key);
        if same_file(&source, &dest) {
            return Err(StoreError::SameFile { path: dest });
        }
        if dest.exists() && !options.overwrite {
            return Err(StoreError::DestinationExists { path: dest });
        }

        fs::copy(&source, &dest).map_err(|e| StoreError::from_io(e, dest.clone()))?;
        debug!("Injected {} to {:?}", key, dest);

        self.record_access(key)?;
        Ok(dest)
    }

    // ==================== Search & Tags ====================

    /// Search names, descriptions, tags and optionally contents
    pub fn search(&self, query: &SearchQuery) -> StoreResult<Vec<SearchHit>> {
        search::search(&self.tree, &self.sidecars, query)
    }

    /// Every tag with the number of entries carrying it, sorted by name
    ///
    /// Tags are grouped case-insensitively; the first spelling seen wins.
    pub fn tags_with_counts(&self) -> StoreResult<Vec<(String, usize)>> {
        let mut counts: BTreeMap<String, (String, usize)> = BTreeMap::new();
        for key in self.tree.keys()? {
            for tag in self.sidecars.load(&key).tags {
                counts
                    .entry(tag.to_lowercase())
                    .or_insert_with(|| (tag.clone(), 0))
                    .1 += 1;
            }
        }
        Ok(counts.into_values().collect())
    }

    // ==================== Recent ====================

    /// Recently accessed entries that still exist, most recent first
    pub fn recent(&self) -> Vec<EntryKey> {
        self.recent
            .keys()
            .iter()
            .filter(|k| self.tree.contains(k))
            .cloned()
            .collect()
    }

    /// Move an entry to the front of the recent list
    pub fn record_access(&mut self, key: &EntryKey) -> StoreResult<()> {
        self.recent.push(key);
        self.recent.save()
    }
}
