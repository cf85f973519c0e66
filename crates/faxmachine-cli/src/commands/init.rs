//! Init command handler

use anyhow::{Context, Result};

use faxmachine_core::{Config, Store};

use crate::output::{Output, OutputFormat};

/// Create the database layout, default categories and example entry
pub fn run(config: Config, output: &Output) -> Result<()> {
    let mut store = Store::open_with_config(config)?;
    let result = store.init().context("Failed to initialize database")?;
    let db_dir = store.db_dir().to_path_buf();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "db_dir": db_dir,
                    "created": result.created,
                    "seeded": result.seeded
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", db_dir.display());
        }
        OutputFormat::Human => {
            if result.created {
                println!("✓ Initialized Faxmachine database at {}", db_dir.display());
            } else {
                println!("Database already initialized at {}", db_dir.display());
            }
            if result.seeded {
                println!("  Added example entry: git/python-gitignore");
            }
            println!();
            println!("Add your first template with:");
            println!("  faxmachine add <file> -c <category>");
        }
    }

    Ok(())
}
