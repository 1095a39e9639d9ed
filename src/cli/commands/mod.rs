//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module. A command exposes
//! `output()` declaring its registered result cases and an async `run`
//! returning a [`CommandResult`](crate::output::CommandResult) or a
//! [`CliError`](crate::error::CliError) for the shared failure funnel.

pub mod app;
pub mod config;
pub mod operations;
pub mod schema;

use crate::config::Settings;
use crate::error::CliError;
use crate::registry::TargetRef;

/// Flag > environment/config-file > built-in default.
pub(crate) fn resolve_endpoint(
    flag: Option<String>,
    settings: &Settings,
) -> Result<String, CliError> {
    let endpoint = flag.unwrap_or_else(|| settings.registry.endpoint.clone());
    if endpoint.trim().is_empty() {
        return Err(CliError::MissingEndpoint);
    }
    Ok(endpoint)
}

/// Flag > environment/config-file. There is no default token.
pub(crate) fn resolve_token(
    flag: Option<String>,
    settings: &Settings,
) -> Result<String, CliError> {
    flag.or_else(|| settings.registry.access_token.clone())
        .filter(|token| !token.trim().is_empty())
        .ok_or(CliError::MissingAccessToken)
}

pub(crate) fn parse_target(value: Option<&str>) -> Result<Option<TargetRef>, CliError> {
    value.map(str::parse).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_flag_beats_settings() {
        let settings = Settings::default();
        let endpoint =
            resolve_endpoint(Some("https://flagged/api".into()), &settings).unwrap();
        assert_eq!(endpoint, "https://flagged/api");
    }

    #[test]
    fn endpoint_falls_back_to_settings_default() {
        let settings = Settings::default();
        let endpoint = resolve_endpoint(None, &settings).unwrap();
        assert_eq!(endpoint, crate::config::DEFAULT_REGISTRY_ENDPOINT);
    }

    #[test]
    fn missing_token_is_a_user_input_error() {
        let settings = Settings::default();
        assert!(matches!(
            resolve_token(None, &settings),
            Err(CliError::MissingAccessToken)
        ));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let mut settings = Settings::default();
        settings.registry.access_token = Some("  ".into());
        assert!(resolve_token(None, &settings).is_err());
    }
}
