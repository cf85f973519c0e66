//! Storage layer
//!
//! Handles the stored file tree and the metadata sidecars.
//!
//! ## Architecture
//!
//! - **File tree**: `db/<category>/[<subcategory>/]<name>`, files copied verbatim
//! - **Sidecars**: `metadata/<flattened key>.json`, one record per stored file
//!
//! The two are kept in step by the `Store`; a sidecar without a file is
//! tolerated and simply never listed.

pub mod error;
pub mod persistence;
pub mod tree;

pub use error::{StoreError, StoreResult};
pub use persistence::MetadataPersistence;
pub use tree::{FileStat, FileTree};
