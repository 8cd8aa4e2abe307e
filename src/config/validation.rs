use super::models::Config;
use thiserror::Error;

/// Upper bound on simultaneous yt-dlp processes
pub const MAX_CONCURRENCY: usize = 64;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("worker.concurrency must be between 1 and {max}, got {value}")]
    InvalidConcurrency { value: usize, max: usize },

    #[error("worker.loop_error_backoff_ms must be greater than zero")]
    InvalidBackoff,

    #[error("server.max_body_bytes must be greater than zero")]
    InvalidBodyLimit,

    #[error("downloader.{field} must not be empty")]
    EmptyDownloaderField { field: &'static str },

    #[error("outcomes.{field} must not be empty")]
    EmptyLogFile { field: &'static str },

    #[error("outcomes.success_file and outcomes.failure_file must differ (both '{0}')")]
    SameLogFile(String),
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_worker(config)?;
    validate_server(config)?;
    validate_downloader(config)?;
    validate_outcomes(config)?;
    Ok(())
}

fn validate_worker(config: &Config) -> Result<(), ValidationError> {
    let concurrency = config.worker.concurrency;
    if !(1..=MAX_CONCURRENCY).contains(&concurrency) {
        return Err(ValidationError::InvalidConcurrency {
            value: concurrency,
            max: MAX_CONCURRENCY,
        });
    }

    if config.worker.loop_error_backoff_ms == 0 {
        return Err(ValidationError::InvalidBackoff);
    }

    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    if config.server.max_body_bytes == 0 {
        return Err(ValidationError::InvalidBodyLimit);
    }
    Ok(())
}

fn validate_downloader(config: &Config) -> Result<(), ValidationError> {
    let downloader = &config.downloader;
    let fields = [
        ("binary", downloader.binary.as_str()),
        ("output_template", downloader.output_template.as_str()),
        ("video_format", downloader.video_format.as_str()),
        ("audio_format", downloader.audio_format.as_str()),
    ];

    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyDownloaderField { field });
        }
    }

    Ok(())
}

fn validate_outcomes(config: &Config) -> Result<(), ValidationError> {
    let outcomes = &config.outcomes;

    if outcomes.success_file.trim().is_empty() {
        return Err(ValidationError::EmptyLogFile {
            field: "success_file",
        });
    }
    if outcomes.failure_file.trim().is_empty() {
        return Err(ValidationError::EmptyLogFile {
            field: "failure_file",
        });
    }
    if outcomes.success_file == outcomes.failure_file {
        return Err(ValidationError::SameLogFile(outcomes.success_file.clone()));
    }

    Ok(())
}
