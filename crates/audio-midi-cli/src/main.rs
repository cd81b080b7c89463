use anyhow::{Context, Result};
use audio_midi_setup::Config;
use clap::Parser;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "audio-midi", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the annotation store (default: ~/.local/share/audio-midi/audio_midi.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Declare the annotation collections, validators and indexes
    ///
    /// Creates the four annotation collections (beat_position, chord,
    /// note_midi, pitch_contour) in the store:
    ///
    /// - Each collection gets a $jsonSchema validator at the "moderate" level
    /// - Each collection gets a unique index on (title, dataset_name)
    ///
    /// Re-running is safe: declarations that already match are left alone.
    /// A collection whose stored validator differs from the catalog is an
    /// error unless --update-validators is given. Index conflicts always
    /// abort the run.
    Init {
        /// Re-apply catalog validators to collections that have drifted
        #[arg(long)]
        update_validators: bool,
    },
    /// Show collections, validation rules, indexes and document counts
    Status,
    /// Print catalog validators as JSON
    Schema {
        /// Only print this collection's validator
        collection: Option<String>,
    },
    /// Check a JSON document (or array of documents) against a validator
    ///
    /// Uses the catalog validator only; the store is not opened.
    Validate {
        /// Collection whose validator to apply
        collection: String,
        /// JSON file holding a document or an array of documents
        file: PathBuf,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Print one config value, or the whole config file
    Get {
        /// Config key (database_path, log_level)
        key: Option<String>,
    },
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.db {
        Some(db) => Config::load_with_db_path(db),
        None => Config::load(),
    }?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let db_path = config.database_path.clone();

    match cli.command {
        Commands::Init { update_validators } => {
            // Ensure store directory exists
            if let Some(parent) = db_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            commands::run_init(&db_path, update_validators)?;
        }
        Commands::Status => {
            commands::show_status(&db_path)?;
        }
        Commands::Schema { collection } => {
            commands::show_schema(collection.as_deref())?;
        }
        Commands::Validate { collection, file } => {
            commands::validate_file(&collection, &file)?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config::show_config(&config)?,
            ConfigCommands::Get { key } => commands::config::get_config(&config, key.as_deref())?,
            ConfigCommands::Path => commands::config::show_path(),
            ConfigCommands::Example => commands::config::show_example(),
            ConfigCommands::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
