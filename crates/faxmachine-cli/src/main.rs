//! Faxmachine CLI
//!
//! Command-line interface for Faxmachine - a personal library of reusable
//! files and templates.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use faxmachine_core::{Config, Store, StoreError};

mod commands;
mod editor;
mod output;
mod tui;

use commands::entry::AddArgs;
use commands::inject::InjectArgs;
use commands::search::SearchArgs;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "faxmachine")]
#[command(about = "Faxmachine - store, search and re-inject reusable files")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a specific config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the database interactively (default)
    Browse,
    /// Create the database and default categories
    Init,
    /// List stored files by category
    #[command(alias = "ls")]
    List {
        /// Only show this category
        category: Option<String>,
    },
    /// Add a file to the database
    Add {
        /// File to add
        file: PathBuf,
        /// Category to store it in
        #[arg(short, long)]
        category: Option<String>,
        /// Subcategory below the category
        #[arg(short, long)]
        subcategory: Option<String>,
        /// Name to store it under (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
        /// Comma-separated tags
        #[arg(short, long)]
        tags: Option<String>,
        /// Replace an existing entry with the same name
        #[arg(short, long)]
        force: bool,
    },
    /// Copy a stored file into the current directory
    #[command(alias = "print")]
    Inject {
        /// Entry key (category[/subcategory]/name)
        key: String,
        /// Destination file name
        #[arg(short, long)]
        name: Option<String>,
        /// Skip the diff preview
        #[arg(long)]
        no_preview: bool,
        /// Overwrite an existing file without asking
        #[arg(short, long)]
        force: bool,
    },
    /// Search names, descriptions, tags and contents
    Search {
        /// Search query
        query: String,
        /// Search file contents
        #[arg(short = 'c', long = "content", conflicts_with = "no_content")]
        content: bool,
        /// Do not search file contents
        #[arg(long)]
        no_content: bool,
        /// Only keep results with one of these comma-separated tags
        #[arg(short, long)]
        tags: Option<String>,
        /// Print results without prompting
        #[arg(short, long)]
        list_only: bool,
        /// Show the Nth result
        #[arg(long, value_name = "N")]
        show_index: Option<usize>,
        /// Inject the Nth result
        #[arg(long, value_name = "N")]
        inject_index: Option<usize>,
        /// Delete the Nth result
        #[arg(long, value_name = "N")]
        delete_index: Option<usize>,
        /// Destination file name when injecting
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Show a stored file with its metadata
    Show {
        /// Entry key (category[/subcategory]/name)
        key: String,
    },
    /// Edit a stored file's metadata
    Edit {
        /// Entry key (category[/subcategory]/name)
        key: String,
        /// Open the stored file itself in the editor
        #[arg(long)]
        content: bool,
    },
    /// Delete a stored file
    #[command(alias = "rm")]
    Delete {
        /// Entry key (category[/subcategory]/name)
        key: String,
    },
    /// Show recently accessed files
    Recent,
    /// List all tags
    Tags,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, editor, search_content, preview_before_inject, recent_limit, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = run(cli);

    if let Err(e) = &result {
        let hint = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<StoreError>())
            .and_then(StoreError::recovery_suggestion);
        if let Some(hint) = hint {
            eprintln!("hint: {}", hint);
        }
    }

    result
}

fn run(cli: Cli) -> Result<()> {
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Commands that don't need the store
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config = Config::load_with_cli_override(config_path)?;

    // The browser logs to a file; everything else may log to stderr
    if matches!(&cli.command, Some(Commands::Browse) | None) {
        return tui::run(config);
    }
    init_cli_logging();

    if let Some(Commands::Init) = &cli.command {
        return commands::init::run(config, &output);
    }

    let mut store = Store::open_with_config(config)?;
    if !store.is_initialized() {
        let result = store.init()?;
        if result.created && output.should_prompt() {
            eprintln!(
                "Initialized template database at {}",
                store.db_dir().display()
            );
        }
    }

    match cli.command {
        Some(Commands::List { category }) => commands::entry::list(&store, category, &output),
        Some(Commands::Add {
            file,
            category,
            subcategory,
            name,
            description,
            tags,
            force,
        }) => commands::entry::add(
            &mut store,
            AddArgs {
                file,
                category,
                subcategory,
                name,
                description,
                tags,
                force,
            },
            &output,
        ),
        Some(Commands::Inject {
            key,
            name,
            no_preview,
            force,
        }) => commands::inject::inject(
            &mut store,
            InjectArgs {
                key,
                name,
                no_preview,
                force,
            },
            &output,
        ),
        Some(Commands::Search {
            query,
            content,
            no_content,
            tags,
            list_only,
            show_index,
            inject_index,
            delete_index,
            name,
        }) => commands::search::search(
            &mut store,
            SearchArgs {
                query,
                content,
                no_content,
                tags,
                list_only,
                show_index,
                inject_index,
                delete_index,
                name,
            },
            &output,
        ),
        Some(Commands::Show { key }) => commands::entry::show(&mut store, &key, &output),
        Some(Commands::Edit { key, content }) => {
            commands::entry::edit(&mut store, &key, content, &output)
        }
        Some(Commands::Delete { key }) => commands::entry::delete(&mut store, &key, &output),
        Some(Commands::Recent) => commands::recent::list(&mut store, &output),
        Some(Commands::Tags) => commands::tag::list(&store, &output),
        // Handled above
        Some(Commands::Browse | Commands::Init | Commands::Config { .. }) | None => Ok(()),
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize stderr logging for one-shot commands
///
/// Only initializes if FAXMACHINE_LOG is set (e.g. `FAXMACHINE_LOG=debug`).
fn init_cli_logging() {
    let Ok(log_level) = std::env::var("FAXMACHINE_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "faxmachine_core={},faxmachine={}",
        log_level, log_level
    ));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_command_means_browse() {
        let cli = Cli::try_parse_from(["faxmachine"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_aliases() {
        let cli = Cli::try_parse_from(["faxmachine", "print", "git/python-gitignore"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Inject { .. })));

        let cli = Cli::try_parse_from(["faxmachine", "rm", "git/python-gitignore"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Delete { .. })));
    }

    #[test]
    fn test_search_flags() {
        let cli = Cli::try_parse_from([
            "faxmachine",
            "search",
            "docker",
            "-c",
            "-t",
            "web,ops",
            "--inject-index",
            "2",
            "-n",
            "Dockerfile",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Search {
                content,
                tags,
                inject_index,
                name,
                ..
            }) => {
                assert!(content);
                assert_eq!(tags.as_deref(), Some("web,ops"));
                assert_eq!(inject_index, Some(2));
                assert_eq!(name.as_deref(), Some("Dockerfile"));
            }
            _ => panic!("expected search command"),
        }

        assert!(Cli::try_parse_from(["faxmachine", "search", "x", "-c", "--no-content"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["faxmachine", "tags", "--json", "--config", "/tmp/c.toml"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }
}
