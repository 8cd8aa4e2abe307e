use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "CLIPBOX_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/clipbox.toml";
const ENV_PREFIX: &str = "CLIPBOX";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    load_from_sources(config_path)
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // CLIPBOX__WORKER__CONCURRENCY -> worker.concurrency
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8787");
        assert_eq!(config.worker.concurrency, 2);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
bind_addr = "127.0.0.1:9000"
max_body_bytes = 1024

[worker]
concurrency = 3
loop_error_backoff_ms = 250

[downloader]
binary = "/usr/local/bin/yt-dlp"
video_dir = "/data/video"
audio_dir = "/data/audio"

[outcomes]
dir = "/var/log/clipbox"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.server.max_body_bytes, 1024);
        assert_eq!(config.worker.concurrency, 3);
        assert_eq!(config.worker.loop_error_backoff_ms, 250);
        assert_eq!(config.downloader.binary, "/usr/local/bin/yt-dlp");
        assert_eq!(config.downloader.video_dir, PathBuf::from("/data/video"));
        assert_eq!(config.outcomes.dir, PathBuf::from("/var/log/clipbox"));
        assert_eq!(config.outcomes.success_file, "success.log");
    }

    // Environment overrides are not exercised here: mutating the process
    // environment is unsafe under edition 2024 and races with parallel tests.

    #[test]
    fn test_malformed_toml_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "[worker\nconcurrency = ").unwrap();

        assert!(load_from_sources(config_path).is_err());
    }
}
