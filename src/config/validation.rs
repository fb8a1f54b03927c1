use crate::config::types::{Config, CrawlerConfig, OutputConfig, PipelineConfig, RelayConfig};
use crate::sink::OutputFormat;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    if let Some(relay) = &config.relay {
        validate_relay_config(relay)?;
    }
    validate_pipeline_config(&config.pipeline)?;
    validate_output_config(&config.output)?;
    validate_keywords(&config.keywords)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_retries >= 0 is always true for u32, so no check needed

    if config.max_workers < 1 || config.max_workers > 100 {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and 100, got {}",
            config.max_workers
        )));
    }

    Ok(())
}

/// Validates relay configuration
fn validate_relay_config(config: &RelayConfig) -> Result<(), ConfigError> {
    if config.api_key.trim().is_empty() {
        return Err(ConfigError::Validation(
            "relay api-key cannot be empty".to_string(),
        ));
    }

    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid relay endpoint: {}", e)))?;

    if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "relay endpoint must be http(s), got '{}'",
            config.endpoint
        )));
    }

    if config.location.trim().is_empty() {
        return Err(ConfigError::Validation(
            "relay location cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates pipeline configuration
fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.batch_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_capacity must be >= 1, got {}",
            config.batch_capacity
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.results_dir.is_empty() {
        return Err(ConfigError::Validation(
            "results_dir cannot be empty".to_string(),
        ));
    }

    if config.metadata_path.is_empty() {
        return Err(ConfigError::Validation(
            "metadata_path cannot be empty".to_string(),
        ));
    }

    // Unknown format tags are fatal before any job starts
    OutputFormat::parse(&config.results_format)?;
    OutputFormat::parse(&config.metadata_format)?;

    Ok(())
}

/// Validates the keyword list
///
/// An empty list is allowed (the run is a no-op); blank keywords are not.
fn validate_keywords(keywords: &[String]) -> Result<(), ConfigError> {
    for keyword in keywords {
        if keyword.trim().is_empty() {
            return Err(ConfigError::Validation(
                "keywords cannot be empty or whitespace".to_string(),
            ));
        }
    }
    Ok(())
}
