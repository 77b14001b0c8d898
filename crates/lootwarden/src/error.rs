//! # Plugin Error Types

use std::path::PathBuf;

use lootwarden_shared::PersistError;
use thiserror::Error;

/// Errors surfaced by enable and reload.
#[derive(Error, Debug)]
pub enum PluginError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ReadConfig {
        /// Config file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the expected layout.
    #[error("failed to parse config {path}: {source}")]
    ParseConfig {
        /// Config file.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },

    /// A setting is out of range.
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting {
        /// Setting name.
        name: &'static str,
        /// What is wrong.
        reason: String,
    },

    /// The data directory could not be created.
    #[error("failed to create data directory {path}: {source}")]
    DataDir {
        /// Directory.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A timer thread could not be started.
    #[error("failed to start task {name}: {source}")]
    Task {
        /// Task name.
        name: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Durable state could not be saved.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// The plugin was already disabled.
    #[error("plugin is disabled")]
    Disabled,
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
