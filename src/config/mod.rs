//! Configuration management for clipbox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use clipbox::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `CLIPBOX__<section>__<key>`
//!
//! Examples:
//! - `CLIPBOX__SERVER__BIND_ADDR=127.0.0.1:8787`
//! - `CLIPBOX__WORKER__CONCURRENCY=4`
//! - `CLIPBOX__DOWNLOADER__BINARY=/opt/yt-dlp/yt-dlp`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/clipbox.toml`.
//! This can be overridden using the `CLIPBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{Config, DownloaderConfig, OutcomeLogConfig, ServerConfig, WorkerConfig};
pub use validation::{MAX_CONCURRENCY, ValidationError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`CLIPBOX__*`)
    /// 2. TOML file (default: `config/clipbox.toml`)
    /// 3. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Re-run validation, e.g. after applying command line overrides
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)?;
        Ok(())
    }
}
