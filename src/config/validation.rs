use crate::config::types::{BrowserConfig, Config, IdentityConfig, PathsConfig, ProbeKind};
use crate::ConfigError;
use url::Url;

/// Placeholder in the connect command that receives the region name
pub const REGION_PLACEHOLDER: &str = "{region}";

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_identity_config(&config.identity)?;
    validate_browser_config(&config.browser)?;
    validate_paths_config(&config.paths)?;
    Ok(())
}

/// Validates network identity configuration
fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    if config.home_region.trim().is_empty() {
        return Err(ConfigError::Validation(
            "home_region cannot be empty".to_string(),
        ));
    }

    if config.connect_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_attempts must be >= 1, got {}",
            config.connect_attempts
        )));
    }

    if config.disconnect_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "disconnect_attempts must be >= 1, got {}",
            config.disconnect_attempts
        )));
    }

    if config.poll_interval_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms must be >= 10ms, got {}ms",
            config.poll_interval_ms
        )));
    }

    validate_command("connect_command", &config.connect_command)?;
    validate_command("disconnect_command", &config.disconnect_command)?;

    if !config
        .connect_command
        .iter()
        .any(|arg| arg.contains(REGION_PLACEHOLDER))
    {
        return Err(ConfigError::Validation(format!(
            "connect_command must contain the {} placeholder",
            REGION_PLACEHOLDER
        )));
    }

    match config.probe {
        ProbeKind::Interface => validate_command("interface_command", &config.interface_command)?,
        ProbeKind::Http => {
            Url::parse(&config.probe_url)
                .map_err(|e| ConfigError::InvalidUrl(format!("Invalid probe_url: {}", e)))?;
        }
    }

    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' cannot be used as a base",
            config.base_url
        )));
    }

    if config.window_width == 0 || config.window_height == 0 {
        return Err(ConfigError::Validation(format!(
            "window dimensions must be non-zero, got {}x{}",
            config.window_width, config.window_height
        )));
    }

    // The load timeout is what decides that a list is exhausted.
    if config.load_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "load_timeout_ms must be >= 100ms, got {}ms",
            config.load_timeout_ms
        )));
    }

    if config.load_poll_interval_ms == 0 || config.load_poll_interval_ms > config.load_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "load_poll_interval_ms must be between 1 and load_timeout_ms, got {}ms",
            config.load_poll_interval_ms
        )));
    }

    if config.max_scroll_rounds < 1 {
        return Err(ConfigError::Validation(
            "max_scroll_rounds must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates input and output locations
fn validate_paths_config(config: &PathsConfig) -> Result<(), ConfigError> {
    if config.input_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "input_dir cannot be empty".to_string(),
        ));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// A command must name a program as its first element
fn validate_command(name: &str, command: &[String]) -> Result<(), ConfigError> {
    match command.first() {
        Some(program) if !program.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::Validation(format!(
            "{} must name a program",
            name
        ))),
    }
}
