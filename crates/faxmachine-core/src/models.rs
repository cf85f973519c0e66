//! Data models for Faxmachine
//!
//! Defines the core data structures: the entry key that addresses a stored
//! file, the metadata sidecar attached to it, and the views built from the
//! file tree.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::StoreError;

/// Identifier of a stored file: `category[/subcategory]/name`
///
/// The subcategory may span several directory levels (`web/react/hooks`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryKey {
    /// Top-level category directory
    pub category: String,
    /// Optional nested directory below the category
    pub subcategory: Option<String>,
    /// File name, unique within category + subcategory
    pub name: String,
}

impl EntryKey {
    /// Build a key from its parts, validating every path segment
    pub fn new(
        category: impl Into<String>,
        subcategory: Option<String>,
        name: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let category = category.into();
        let name = name.into();
        let subcategory = subcategory
            .map(|s| s.trim_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let display = match &subcategory {
            Some(sub) => format!("{}/{}/{}", category, sub, name),
            None => format!("{}/{}", category, name),
        };

        validate_segment(&category, &display)?;
        validate_segment(&name, &display)?;
        if let Some(sub) = &subcategory {
            for segment in sub.split('/') {
                validate_segment(segment, &display)?;
            }
        }

        Ok(Self {
            category,
            subcategory,
            name,
        })
    }

    /// Parse a `category[/subcategory]/name` string
    pub fn parse(key: &str) -> Result<Self, StoreError> {
        let trimmed = key.trim_matches('/');
        let segments: Vec<&str> = trimmed.split('/').collect();

        if segments.len() < 2 {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                reason: "expected <category>/<name>".to_string(),
            });
        }

        let category = segments[0];
        let name = segments[segments.len() - 1];
        let subcategory = if segments.len() > 2 {
            Some(segments[1..segments.len() - 1].join("/"))
        } else {
            None
        };

        Self::new(category, subcategory, name)
    }

    /// Build a key from a path relative to the database root
    pub fn from_relative_path(path: &Path) -> Result<Self, StoreError> {
        let parts: Vec<String> = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Self::parse(&parts.join("/"))
    }

    /// Path of the stored file relative to the database root
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::from(&self.category);
        if let Some(sub) = &self.subcategory {
            for segment in sub.split('/') {
                path.push(segment);
            }
        }
        path.push(&self.name);
        path
    }

    /// The directory part of the key (`category[/subcategory]`)
    pub fn location(&self) -> String {
        match &self.subcategory {
            Some(sub) => format!("{}/{}", self.category, sub),
            None => self.category.clone(),
        }
    }

    /// File name of the JSON sidecar holding this entry's metadata
    ///
    /// Path separators are flattened to `_`, so `git/python-gitignore`
    /// becomes `git_python-gitignore.json`.
    pub fn sidecar_file_name(&self) -> String {
        format!("{}.json", self.to_string().replace(['/', '\\'], "_"))
    }
}

fn validate_segment(segment: &str, key: &str) -> Result<(), StoreError> {
    let reason = if segment.is_empty() {
        Some("empty path segment")
    } else if segment.trim() != segment {
        Some("leading or trailing whitespace in path segment")
    } else if segment == "." || segment == ".." {
        Some("relative path segments are not allowed")
    } else if segment.contains('\\') || segment.contains('\0') {
        Some("invalid character in path segment")
    } else if segment.contains('/') {
        Some("unexpected path separator")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.location(), self.name)
    }
}

impl FromStr for EntryKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntryKey {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntryKey> for String {
    fn from(key: EntryKey) -> Self {
        key.to_string()
    }
}

/// Metadata sidecar attached to a stored file
///
/// Every field defaults so that partial or hand-edited sidecars still load.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Absolute path the file was added from
    #[serde(default)]
    pub source_path: String,
    /// ISO-8601 timestamp of when the file was added
    #[serde(default)]
    pub added_date: String,
    /// Tags for organization
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Metadata {
    /// Create a record stamped with the current time
    pub fn new(description: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            source_path: source_path.into(),
            added_date: Utc::now().to_rfc3339(),
            tags: Vec::new(),
        }
    }

    /// Update the description
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Add a tag, ignoring blanks and case-insensitive duplicates
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into().trim().to_string();
        if !tag.is_empty() && !self.has_tag(&tag) {
            self.tags.push(tag);
        }
    }

    /// Set all tags (replacing existing)
    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.clear();
        for tag in tags {
            self.add_tag(tag);
        }
    }

    /// Check whether the record carries a tag (case-insensitive)
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == tag)
    }

    /// Date part of `added_date` (`2024-05-01T...` -> `2024-05-01`)
    pub fn added_day(&self) -> &str {
        self.added_date
            .split('T')
            .next()
            .unwrap_or(&self.added_date)
    }
}

/// Split a comma-separated tag list into trimmed, non-empty tags
pub fn parse_tag_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A stored file with its metadata and filesystem attributes
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Entry {
    /// Identifier within the database
    pub key: EntryKey,
    /// Sidecar metadata (empty when the sidecar is missing)
    #[serde(flatten)]
    pub metadata: Metadata,
    /// Size of the stored file in bytes
    pub size: u64,
    /// Last modification time of the stored file
    pub modified: Option<DateTime<Utc>>,
}

/// A node of the database tree as shown by `list`
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    /// A category or subcategory directory
    Directory {
        name: String,
        children: Vec<TreeNode>,
    },
    /// A stored file
    File {
        name: String,
        key: EntryKey,
        description: String,
    },
}

impl TreeNode {
    /// Display name of the node
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Directory { name, .. } | TreeNode::File { name, .. } => name,
        }
    }

    /// Number of files below (or at) this node
    pub fn file_count(&self) -> usize {
        match self {
            TreeNode::Directory { children, .. } => children.iter().map(|c| c.file_count()).sum(),
            TreeNode::File { .. } => 1,
        }
    }
}
