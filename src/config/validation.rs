use crate::config::types::{
    AuditConfig, Config, FetcherConfig, InsightsConfig, OutputConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Shortest timeout accepted anywhere in the configuration (milliseconds)
const MIN_TIMEOUT_MS: u64 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_audit_config(&config.audit)?;
    validate_insights_config(&config.insights)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_timeout(name: &str, value_ms: u64) -> Result<(), ConfigError> {
    if value_ms < MIN_TIMEOUT_MS {
        return Err(ConfigError::Validation(format!(
            "{} must be >= {}ms, got {}ms",
            name, MIN_TIMEOUT_MS, value_ms
        )));
    }
    Ok(())
}

/// Validates primary fetch configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    validate_timeout("request_timeout_ms", config.request_timeout_ms)?;
    validate_timeout("connect_timeout_ms", config.connect_timeout_ms)?;

    if config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be <= 20, got {}",
            config.max_redirects
        )));
    }

    if config.max_page_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "max_page_bytes must be >= 1024, got {}",
            config.max_page_bytes
        )));
    }

    Ok(())
}

/// Validates link audit configuration
fn validate_audit_config(config: &AuditConfig) -> Result<(), ConfigError> {
    if config.max_links < 1 {
        return Err(ConfigError::Validation(format!(
            "max_links must be >= 1, got {}",
            config.max_links
        )));
    }

    if config.max_concurrent_probes < 1 || config.max_concurrent_probes > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_probes must be between 1 and 64, got {}",
            config.max_concurrent_probes
        )));
    }

    validate_timeout("probe_timeout_ms", config.probe_timeout_ms)
}

/// Validates narrative insight configuration
fn validate_insights_config(config: &InsightsConfig) -> Result<(), ConfigError> {
    validate_timeout("insights timeout_ms", config.timeout_ms)?;

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::Validation(format!(
            "temperature must be between 0.0 and 2.0, got {}",
            config.temperature
        )));
    }

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api_key_env cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.api_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api_base: {}", e)))?;

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
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
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.reports_dir.is_empty() {
        return Err(ConfigError::Validation(
            "reports_dir cannot be empty".to_string(),
        ));
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

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
