//! Metadata sidecar persistence
//!
//! Each stored file has one pretty-printed JSON record in the metadata
//! directory. Writes are atomic (write to temp file, then rename) so a crash
//! never leaves a half-written sidecar.
//!
//! Storage location: `~/.local/share/faxmachine/metadata/` (configurable via `Config`)
//!
//! Files:
//! - `<category>_<subcategory>_<name>.json` - one record per stored file

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{EntryKey, Metadata};
use crate::storage::error::{StoreError, StoreResult};

/// Persistence layer for metadata sidecars
pub struct MetadataPersistence {
    dir: PathBuf,
}

impl MetadataPersistence {
    /// Create a handler rooted at the given metadata directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the sidecars
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the sidecar for a key
    pub fn path_for(&self, key: &EntryKey) -> PathBuf {
        self.dir.join(key.sidecar_file_name())
    }

    /// Load the metadata for a key
    ///
    /// A missing or unparsable sidecar reads as an empty record.
    pub fn load(&self, key: &EntryKey) -> Metadata {
        let path = self.path_for(key);
        match read_json::<Metadata>(&path) {
            Ok(Some(meta)) => meta,
            Ok(None) => Metadata::default(),
            Err(e) => {
                warn!("Ignoring unreadable metadata for {}: {}", key, e);
                Metadata::default()
            }
        }
    }

    /// Save the metadata for a key
    pub fn save(&self, key: &EntryKey, metadata: &Metadata) -> StoreResult<()> {
        let path = self.path_for(key);
        write_json(&path, metadata)?;
        debug!("Saved metadata for {} to {:?}", key, path);
        Ok(())
    }

    /// Remove the sidecar for a key, returning whether one existed
    pub fn delete(&self, key: &EntryKey) -> StoreResult<bool> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::from_io(e, path)),
        }
    }
}

/// Read a JSON file, returning `None` when it does not exist
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::from_read(e, path.to_path_buf())),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StoreError::ReadError {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
}

/// Serialize a value as pretty JSON and write it atomically
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let content = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Encode {
        path: path.to_path_buf(),
        source: e,
    })?;
    atomic_write(path, &content)
}

/// Write a file atomically
///
/// Writes to a temp file in the same directory, syncs it, then renames it
/// over the target.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::CreateDirectory {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut temp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file =
        File::create(&temp_path).map_err(|e| StoreError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StoreError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StoreError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|e| StoreError::from_io(e, path.to_path_buf()))?;

    Ok(())
}
