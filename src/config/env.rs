use crate::error::{McpFlowError, Result};
use std::env;
use std::str::FromStr;

/// Environment variable lookups.
pub struct EnvConfig;

impl EnvConfig {
    /// Resolves a credential.
    ///
    /// - `${VAR_NAME}` reads the named environment variable.
    /// - Any other non-empty value is returned as is.
    /// - Blank values and unset variables yield `None`, so the connector is never registered.
    pub fn get_api_key(api_key: &str) -> Option<String> {
        let trimmed = api_key.trim();
        if let Some(var) = trimmed
            .strip_prefix("${")
            .and_then(|rest| rest.strip_suffix('}'))
        {
            Self::get_env_optional(var)
        } else if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Required variable; unset or blank is a config error.
    pub fn get_env(key: &str) -> Result<String> {
        Self::get_env_optional(key).ok_or_else(|| {
            McpFlowError::Config(format!(
                "environment variable `{key}` is not set; define it in the environment or a .env loader"
            ))
        })
    }

    /// Optional variable; a blank value counts as unset.
    pub fn get_env_optional(key: &str) -> Option<String> {
        env::var(key)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Parses a variable, e.g. a timeout in seconds.
    pub fn get_env_parsed<T: FromStr>(key: &str) -> Result<Option<T>> {
        match Self::get_env_optional(key) {
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
                McpFlowError::Config(format!("environment variable `{key}` has invalid value `{raw}`"))
            }),
            None => Ok(None),
        }
    }

    /// Boolean switch: `1`, `true`, `yes` or `on`.
    pub fn get_env_flag(key: &str) -> bool {
        Self::get_env_optional(key)
            .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false)
    }

    /// `MCPFLOW_DEBUG` is set.
    pub fn is_debug_mode() -> bool {
        env::var("MCPFLOW_DEBUG").is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_api_key_direct() {
        assert_eq!(
            EnvConfig::get_api_key("sk-1234567890abcdef1234567890").as_deref(),
            Some("sk-1234567890abcdef1234567890")
        );
        assert_eq!(EnvConfig::get_api_key("   "), None);
    }

    #[test]
    fn test_get_api_key_env_var() {
        env::set_var("MCPFLOW_TEST_GEMINI_KEY", "test_key_value");
        assert_eq!(
            EnvConfig::get_api_key("${MCPFLOW_TEST_GEMINI_KEY}").as_deref(),
            Some("test_key_value")
        );
        env::remove_var("MCPFLOW_TEST_GEMINI_KEY");
        assert_eq!(EnvConfig::get_api_key("${MCPFLOW_TEST_GEMINI_KEY}"), None);
    }

    #[test]
    fn test_get_env_parsed() {
        env::set_var("MCPFLOW_TEST_TIMEOUT", "45");
        assert_eq!(EnvConfig::get_env_parsed::<u64>("MCPFLOW_TEST_TIMEOUT").unwrap(), Some(45));
        env::set_var("MCPFLOW_TEST_TIMEOUT", "soon");
        assert!(EnvConfig::get_env_parsed::<u64>("MCPFLOW_TEST_TIMEOUT").is_err());
        env::remove_var("MCPFLOW_TEST_TIMEOUT");
    }
}
