use crate::error::{McpFlowError, Result};

/// Checks for settings and incoming requests.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Rejects empty and placeholder credentials.
    pub fn validate_api_key(api_key: &str) -> Result<()> {
        if api_key.trim().is_empty() {
            return Err(McpFlowError::Config("API key must not be empty".to_string()));
        }

        if api_key.starts_with("your_") || api_key.starts_with("sk-") && api_key.len() < 20 {
            return Err(McpFlowError::Config(
                "API key looks like a placeholder; provide a real credential".to_string(),
            ));
        }

        Ok(())
    }

    /// Requires an http(s) URL.
    pub fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(McpFlowError::Config("URL must not be empty".to_string()));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(McpFlowError::Config(format!(
                "URL `{url}` must start with http:// or https://"
            )));
        }

        Ok(())
    }

    /// Tool ids: letters, digits, `_`, `-` and `.`.
    pub fn validate_tool_id(tool_id: &str) -> Result<()> {
        if tool_id.is_empty() {
            return Err(McpFlowError::Config("tool id must not be empty".to_string()));
        }

        if !tool_id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err(McpFlowError::Config(format!(
                "tool id `{tool_id}` may only contain letters, digits, `_`, `-` and `.`"
            )));
        }

        Ok(())
    }

    /// Priority must be within 1-10.
    pub fn validate_priority(priority: u8) -> Result<()> {
        if !(1..=10).contains(&priority) {
            return Err(McpFlowError::InvalidRequest(format!(
                "priority must be between 1 and 10, got {priority}"
            )));
        }
        Ok(())
    }
}
