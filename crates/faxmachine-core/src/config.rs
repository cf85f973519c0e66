//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/faxmachine/config.toml)
//! 3. Environment variables (FAXMACHINE_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "FAXMACHINE";

/// Default number of entries kept in the recently-accessed list
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the template database, metadata and recent list
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Editor command used for `edit --content` and metadata editing
    #[serde(default)]
    pub editor: Option<String>,

    /// Whether search looks inside file contents by default
    #[serde(default = "default_true")]
    pub search_content: bool,

    /// Whether inject shows a preview (diff) before overwriting
    #[serde(default = "default_true")]
    pub preview_before_inject: bool,

    /// Maximum length of the recently-accessed list
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    /// Log file used by the browser when FAXMACHINE_LOG is set
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            editor: None,
            search_content: true,
            preview_before_inject: true,
            recent_limit: DEFAULT_RECENT_LIMIT,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (FAXMACHINE_DATA_DIR, FAXMACHINE_EDITOR, ...)
    /// 2. Config file (~/.config/faxmachine/config.toml or FAXMACHINE_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // FAXMACHINE_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // FAXMACHINE_EDITOR
        if let Ok(val) = std::env::var(format!("{}_EDITOR", ENV_PREFIX)) {
            self.editor = if val.is_empty() { None } else { Some(val) };
        }

        // FAXMACHINE_SEARCH_CONTENT
        if let Ok(val) = std::env::var(format!("{}_SEARCH_CONTENT", ENV_PREFIX)) {
            self.search_content = parse_flag(&val);
        }

        // FAXMACHINE_PREVIEW
        if let Ok(val) = std::env::var(format!("{}_PREVIEW", ENV_PREFIX)) {
            self.preview_before_inject = parse_flag(&val);
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with FAXMACHINE_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("faxmachine")
            .join("config.toml")
    }

    /// Root of the stored file tree (one directory per category)
    pub fn db_dir(&self) -> PathBuf {
        self.data_dir.join("db")
    }

    /// Directory holding one JSON sidecar per stored file
    pub fn metadata_dir(&self) -> PathBuf {
        self.data_dir.join("metadata")
    }

    /// Path of the persisted recently-accessed list
    pub fn recent_path(&self) -> PathBuf {
        self.data_dir.join("recent.json")
    }

    /// Effective log file path (configured or `{data_dir}/debug.log`)
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("debug.log"))
    }
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

fn default_true() -> bool {
    true
}

fn default_recent_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("faxmachine")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "FAXMACHINE_DATA_DIR",
        "FAXMACHINE_EDITOR",
        "FAXMACHINE_SEARCH_CONTENT",
        "FAXMACHINE_PREVIEW",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.search_content);
        assert!(config.preview_before_inject);
        assert!(config.editor.is_none());
        assert_eq!(config.recent_limit, 10);
        assert!(config.data_dir.ends_with("faxmachine"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config {
            data_dir: PathBuf::from("/data/fax"),
            ..Config::default()
        };

        assert_eq!(config.db_dir(), PathBuf::from("/data/fax/db"));
        assert_eq!(config.metadata_dir(), PathBuf::from("/data/fax/metadata"));
        assert!(config.recent_path().ends_with("recent.json"));
        assert!(config.log_path().ends_with("debug.log"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("FAXMACHINE_DATA_DIR", "/tmp/fax-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/fax-test"));
    }

    #[test]
    fn test_env_override_flags() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("FAXMACHINE_SEARCH_CONTENT", "false");
        env::set_var("FAXMACHINE_PREVIEW", "0");
        config.apply_env_overrides();
        assert!(!config.search_content);
        assert!(!config.preview_before_inject);

        env::set_var("FAXMACHINE_SEARCH_CONTENT", "TRUE");
        env::set_var("FAXMACHINE_PREVIEW", "1");
        config.apply_env_overrides();
        assert!(config.search_content);
        assert!(config.preview_before_inject);
    }

    #[test]
    fn test_env_override_editor() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("FAXMACHINE_EDITOR", "nvim");
        config.apply_env_overrides();
        assert_eq!(config.editor.as_deref(), Some("nvim"));

        // Empty string clears it
        env::set_var("FAXMACHINE_EDITOR", "");
        config.apply_env_overrides();
        assert!(config.editor.is_none());
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/fax"),
            editor: Some("hx".to_string()),
            search_content: false,
            preview_before_inject: true,
            recent_limit: 5,
            log_file: None,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("search_content"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.editor, config.editor);
        assert_eq!(parsed.search_content, config.search_content);
        assert_eq!(parsed.recent_limit, 5);
    }

    #[test]
    fn test_load_from_path_fills_defaults() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("custom");
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            format!(
                "data_dir = {:?}\nsearch_content = false\n",
                data_dir.to_string_lossy()
            ),
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.data_dir, data_dir);
        assert!(!config.search_content);
        assert!(config.preview_before_inject);
        assert_eq!(config.recent_limit, DEFAULT_RECENT_LIMIT);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        env::set_var("FAXMACHINE_DATA_DIR", temp_dir.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert!(config.search_content);
        assert!(config.data_dir.exists());
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            preview_before_inject: false,
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.data_dir, config.data_dir);
        assert!(!loaded.preview_before_inject);
    }
}
