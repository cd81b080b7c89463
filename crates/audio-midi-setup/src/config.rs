use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for audio-midi.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (AMIDI_* prefix)
/// 3. Config file (~/.config/audio-midi/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the annotation store (the logical database).
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/audio_midi.db
    /// - ENV: AMIDI_DATABASE_PATH
    /// - Config: database_path = "/path/to/audio_midi.db"
    /// - Default: ~/.local/share/audio-midi/audio_midi.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Log filter used when `RUST_LOG` is not set.
    ///
    /// Can be set via:
    /// - ENV: AMIDI_LOG_LEVEL
    /// - Config: log_level = "debug"
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/audio-midi/config.toml
    /// Reads environment variables with AMIDI_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("amidi");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with a custom store path (the --db CLI flag).
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }
}

/// Default store path: ~/.local/share/audio-midi/audio_midi.db (or platform
/// equivalent).
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("audio-midi")
        .join("audio_midi.db")
}

fn default_log_level() -> String {
    String::from("info")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/audio-midi/config.toml
/// - macOS: ~/Library/Application Support/audio-midi/config.toml
/// - Windows: %APPDATA%\audio-midi\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("audio-midi")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# audio-midi Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (AMIDI_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the annotation store
#
# Holds the beat_position, chord, note_midi and pitch_contour collections
# together with their validators and indexes.
#
# Can also be set via:
# - CLI: audio-midi --db /custom/path.db init
# - Environment: AMIDI_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/audio_midi.db"

# Log filter used when RUST_LOG is not set (error, warn, info, debug, trace)
#
# Can also be set via:
# - Environment: AMIDI_LOG_LEVEL=debug
log_level = "info"
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
