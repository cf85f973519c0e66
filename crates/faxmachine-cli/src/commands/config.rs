//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use faxmachine_core::Config;

use crate::output::{Output, OutputFormat};

/// Keys accepted by `config set`
const VALID_KEYS: &str =
    "data_dir, editor, search_content, preview_before_inject, recent_limit, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "editor": config.editor,
                    "search_content": config.search_content,
                    "preview_before_inject": config.preview_before_inject,
                    "recent_limit": config.recent_limit,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:              {}", config.data_dir.display());
            println!(
                "  editor:                {}",
                config.editor.as_deref().unwrap_or("(not set)")
            );
            println!("  search_content:        {}", config.search_content);
            println!("  preview_before_inject: {}", config.preview_before_inject);
            println!("  recent_limit:          {}", config.recent_limit);
            println!(
                "  log_file:              {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "editor" => {
            config.editor = optional(value).map(str::to_string);
        }
        "search_content" => {
            config.search_content = value
                .parse()
                .context("Invalid value for search_content. Use 'true' or 'false'.")?;
        }
        "preview_before_inject" => {
            config.preview_before_inject = value
                .parse()
                .context("Invalid value for preview_before_inject. Use 'true' or 'false'.")?;
        }
        "recent_limit" => {
            let limit: usize = value
                .parse()
                .context("Invalid value for recent_limit. Use a positive number.")?;
            if limit == 0 {
                bail!("recent_limit must be at least 1");
            }
            config.recent_limit = limit;
        }
        "log_file" => {
            config.log_file = optional(value).map(PathBuf::from);
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                VALID_KEYS
            );
        }
    }
    Ok(())
}

fn optional(value: &str) -> Option<&str> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_values() {
        let mut config = Config::default();

        apply(&mut config, "editor", "hx").unwrap();
        apply(&mut config, "search_content", "false").unwrap();
        apply(&mut config, "recent_limit", "25").unwrap();
        apply(&mut config, "log_file", "/tmp/fax.log").unwrap();

        assert_eq!(config.editor.as_deref(), Some("hx"));
        assert!(!config.search_content);
        assert_eq!(config.recent_limit, 25);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/fax.log")));

        apply(&mut config, "editor", "none").unwrap();
        assert!(config.editor.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();

        assert!(apply(&mut config, "preview_before_inject", "maybe").is_err());
        assert!(apply(&mut config, "recent_limit", "0").is_err());
        assert!(apply(&mut config, "recent_limit", "-3").is_err());

        let err = apply(&mut config, "sync_url", "x").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
    }

    #[test]
    fn test_set_writes_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            format!("data_dir = {:?}\n", temp_dir.path().join("data")),
        )
        .unwrap();

        let output = Output::new(OutputFormat::Quiet);
        set(
            "preview_before_inject".to_string(),
            "false".to_string(),
            Some(&config_path),
            &output,
        )
        .unwrap();

        let saved = std::fs::read_to_string(&config_path).unwrap();
        assert!(saved.contains("preview_before_inject = false"));
    }
}
