//! Faxmachine Core Library
//!
//! This crate provides the core functionality for Faxmachine, a personal
//! library of reusable files (gitignores, configs, snippets) that can be
//! searched and copied into any project.
//!
//! # Architecture
//!
//! - **File tree**: source of truth for which entries exist
//! - **Sidecars**: one JSON metadata record per stored file
//!
//! Nothing is cached between calls; every query reads the disk.
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open()?;
//!
//! // Add a template
//! let mut request = AddRequest::new(".gitignore", "git");
//! request.tags = vec!["rust".into()];
//! store.add(request)?;
//!
//! // Find and inject it
//! let hits = store.search(&SearchQuery::new("rust"))?;
//! store.inject(&hits[0].key, &InjectOptions::new("."))?;
//! ```
//!
//! # Modules
//!
//! - `store`: Unified storage interface (main entry point)
//! - `models`: Entry keys, metadata records and tree nodes
//! - `search`: Ranked search over names, descriptions, tags and content
//! - `recent`: Bounded recently-accessed list
//! - `preview`: Diff previews for inject
//! - `storage`: File tree and sidecar persistence
//! - `config`: Application configuration

pub mod config;
pub mod models;
pub mod preview;
pub mod recent;
pub mod search;
pub mod storage;
pub mod store;

pub use config::Config;
pub use models::{parse_tag_list, Entry, EntryKey, Metadata, TreeNode};
pub use preview::Preview;
pub use search::{MatchKind, SearchHit, SearchQuery};
pub use storage::{StoreError, StoreResult};
pub use store::{AddRequest, InitResult, InjectOptions, Store};
