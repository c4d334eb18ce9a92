use crate::config::types::{Config, CrawlerConfig, ExtractorConfig, SearchConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    if let Some(extractor) = &config.extractor {
        validate_extractor_config(extractor)?;
    }
    validate_search_config(&config.search)?;
    validate_schema(config)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_workers < 1 || config.max_concurrent_workers > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_workers must be between 1 and 100, got {}",
            config.max_concurrent_workers
        )));
    }

    if config.min_host_interval_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "min_host_interval_ms must be >= 100ms, got {}ms",
            config.min_host_interval_ms
        )));
    }

    // Every fetch must have a bounded timeout
    if config.request_timeout_secs < 1 || config.request_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 300, got {}",
            config.request_timeout_secs
        )));
    }

    if config.max_retries > 5 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 5, got {}",
            config.max_retries
        )));
    }

    if config.identifying_fields.is_empty() {
        return Err(ConfigError::Validation(
            "identifying_fields must name at least one field".to_string(),
        ));
    }

    if config.default_max_pages == 0 {
        return Err(ConfigError::UnboundedCrawl);
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the AI extraction collaborator settings
fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    Url::parse(&config.api_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid extractor api_base: {}", e)))?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "extractor model cannot be empty".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::Validation(format!(
            "extractor temperature must be between 0.0 and 2.0, got {}",
            config.temperature
        )));
    }

    if config.max_input_chars == 0 {
        return Err(ConfigError::Validation(
            "extractor max_input_chars must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates the search collaborator settings
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search endpoint: {}", e)))?;
    Ok(())
}

/// Validates extraction schema field names
fn validate_schema(config: &Config) -> Result<(), ConfigError> {
    for field in config.schema.keys() {
        if field.trim().is_empty() {
            return Err(ConfigError::Validation(
                "schema field names cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
