//! Search over stored files
//!
//! A linear scan over every entry. Each entry is tested against the query in
//! priority order and the first criterion that matches decides its rank:
//!
//! 1. file name contains the query
//! 2. description contains the query
//! 3. a tag equals the query
//! 4. file content contains the query (only when content search is on)
//!
//! All comparisons are case-insensitive. A tag filter then keeps only hits
//! carrying at least one of the requested tags.

use std::fmt;

use serde::Serialize;

use crate::models::{parse_tag_list, EntryKey, Metadata};
use crate::preview::is_binary;
use crate::storage::{FileTree, MetadataPersistence, StoreResult};

/// Why an entry matched a query, in ranking order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Filename,
    Description,
    Tag,
    Content,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchKind::Filename => "Filename match",
            MatchKind::Description => "Description match",
            MatchKind::Tag => "Tag match",
            MatchKind::Content => "Content match",
        };
        f.write_str(label)
    }
}

/// Search parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Text to look for; empty matches every entry
    pub text: String,
    /// Whether file contents are searched
    pub content: bool,
    /// Keep only entries carrying at least one of these tags
    pub tags: Vec<String>,
}

impl SearchQuery {
    /// Query on names, descriptions and tags only
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Enable or disable content search
    pub fn with_content(mut self, content: bool) -> Self {
        self.content = content;
        self
    }

    /// Restrict results to a comma-separated tag list
    pub fn with_tag_filter(mut self, tags: &str) -> Self {
        self.tags = parse_tag_list(tags);
        self
    }
}

/// A single search result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub key: EntryKey,
    pub kind: MatchKind,
    pub description: String,
}

/// Decide whether an entry matches, without touching its content
///
/// Returns `None` when only a content match could still succeed.
pub fn match_metadata(needle: &str, key: &EntryKey, metadata: &Metadata) -> Option<MatchKind> {
    if needle.is_empty() || key.name.to_lowercase().contains(needle) {
        return Some(MatchKind::Filename);
    }
    if !metadata.description.is_empty() && metadata.description.to_lowercase().contains(needle) {
        return Some(MatchKind::Description);
    }
    if metadata.tags.iter().any(|t| t.to_lowercase() == needle) {
        return Some(MatchKind::Tag);
    }
    None
}

/// Case-insensitive substring test over file content
///
/// Content containing a NUL byte is treated as binary and never matches.
pub fn content_matches(needle: &str, content: &[u8]) -> bool {
    if is_binary(content) {
        return false;
    }
    String::from_utf8_lossy(content)
        .to_lowercase()
        .contains(needle)
}

/// Content test for a stored file; unreadable files never match
fn stored_content_matches(tree: &FileTree, key: &EntryKey, needle: &str) -> bool {
    match tree.read(key) {
        Ok(content) => content_matches(needle, &content),
        Err(e) => {
            tracing::debug!("Skipping content of {}: {}", key, e);
            false
        }
    }
}

/// Run a query against the stored tree and its sidecars
///
/// Hits are ordered by match kind, then by key.
pub fn search(
    tree: &FileTree,
    sidecars: &MetadataPersistence,
    query: &SearchQuery,
) -> StoreResult<Vec<SearchHit>> {
    let needle = query.text.trim().to_lowercase();
    let mut hits = Vec::new();

    for key in tree.keys()? {
        let metadata = sidecars.load(&key);

        let kind = match match_metadata(&needle, &key, &metadata) {
            Some(kind) => kind,
            None if query.content && stored_content_matches(tree, &key, &needle) => {
                MatchKind::Content
            }
            None => continue,
        };

        if !query.tags.is_empty() && !query.tags.iter().any(|t| metadata.has_tag(t)) {
            continue;
        }

        hits.push(SearchHit {
            key,
            kind,
            description: metadata.description,
        });
    }

    hits.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.key.cmp(&b.key)));
    Ok(hits)
}
