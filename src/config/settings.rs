use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::env::EnvConfig;
use crate::error::{McpFlowError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Provider {
    Gemini,
    Figma,
    OpenAi,
    GitHub,
    Cursor,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::Gemini,
        Provider::Figma,
        Provider::OpenAi,
        Provider::GitHub,
        Provider::Cursor,
    ];

    /// Tool id the provider's connector registers under.
    pub fn id(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Figma => "figma",
            Provider::OpenAi => "openai",
            Provider::GitHub => "github",
            Provider::Cursor => "cursor",
        }
    }

    pub fn credential_env(&self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::Figma => "FIGMA_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::GitHub => "GITHUB_ACCESS_TOKEN",
            Provider::Cursor => "CURSOR_API_KEY",
        }
    }

    pub fn base_url_env(&self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_BASE_URL",
            Provider::Figma => "FIGMA_BASE_URL",
            Provider::OpenAi => "OPENAI_BASE_URL",
            Provider::GitHub => "GITHUB_BASE_URL",
            Provider::Cursor => "CURSOR_BASE_URL",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl ProviderSettings {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Resolved credential; `None` means the provider is not configured.
    pub fn credential(&self) -> Option<String> {
        self.api_key.as_deref().and_then(EnvConfig::get_api_key)
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpSettings {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub health_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            health_timeout_secs: 10,
        }
    }
}

/// Everything the server facade needs to build its connectors.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub gemini: ProviderSettings,
    pub figma: ProviderSettings,
    pub openai: ProviderSettings,
    pub github: ProviderSettings,
    pub cursor: ProviderSettings,
    pub http: HttpSettings,
    /// Registers the offline `echo` connector.
    pub local_echo: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let mut settings = Settings::default();
        for provider in Provider::ALL {
            *settings.provider_mut(provider) = ProviderSettings {
                api_key: EnvConfig::get_env_optional(provider.credential_env()),
                base_url: EnvConfig::get_env_optional(provider.base_url_env()),
            };
        }
        if let Some(secs) = EnvConfig::get_env_parsed("MCPFLOW_HTTP_TIMEOUT_SECS")? {
            settings.http.request_timeout_secs = secs;
        }
        if let Some(secs) = EnvConfig::get_env_parsed("MCPFLOW_CONNECT_TIMEOUT_SECS")? {
            settings.http.connect_timeout_secs = secs;
        }
        settings.local_echo = EnvConfig::get_env_flag("MCPFLOW_LOCAL_ECHO");
        Ok(settings)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| McpFlowError::Config(format!("invalid settings: {e}")))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn provider(&self, provider: Provider) -> &ProviderSettings {
        match provider {
            Provider::Gemini => &self.gemini,
            Provider::Figma => &self.figma,
            Provider::OpenAi => &self.openai,
            Provider::GitHub => &self.github,
            Provider::Cursor => &self.cursor,
        }
    }

    pub fn provider_mut(&mut self, provider: Provider) -> &mut ProviderSettings {
        match provider {
            Provider::Gemini => &mut self.gemini,
            Provider::Figma => &mut self.figma,
            Provider::OpenAi => &mut self.openai,
            Provider::GitHub => &mut self.github,
            Provider::Cursor => &mut self.cursor,
        }
    }

    pub fn with_provider(mut self, provider: Provider, settings: ProviderSettings) -> Self {
        *self.provider_mut(provider) = settings;
        self
    }

    /// Providers with a resolvable credential, in registration order.
    pub fn configured_providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|provider| self.provider(*provider).credential().is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_settings_configure_nothing() {
        let settings = Settings::default();
        assert!(settings.configured_providers().is_empty());
        assert!(!settings.local_echo);
        assert_eq!(settings.http.request_timeout_secs, 30);
    }

    #[test]
    fn json_settings_resolve_env_references() {
        std::env::set_var("MCPFLOW_TEST_FIGMA_TOKEN", "figd_token_value");
        let settings = Settings::from_json_str(
            r#"{
                "figma": { "api_key": "${MCPFLOW_TEST_FIGMA_TOKEN}" },
                "github": { "api_key": "${MCPFLOW_TEST_UNSET_TOKEN}" },
                "openai": { "api_key": "", "base_url": "http://localhost:8080/v1" },
                "http": { "request_timeout_secs": 5 }
            }"#,
        )
        .unwrap();
        std::env::remove_var("MCPFLOW_TEST_FIGMA_TOKEN");

        assert_eq!(settings.configured_providers(), vec![Provider::Figma]);
        assert_eq!(settings.http.request_timeout_secs, 5);
        assert_eq!(settings.http.connect_timeout_secs, 10);
        assert_eq!(
            settings.openai.base_url.as_deref(),
            Some("http://localhost:8080/v1")
        );
    }

    #[test]
    fn settings_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "gemini": {{ "api_key": "AIza-test" }}, "local_echo": true }}"#).unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.configured_providers(), vec![Provider::Gemini]);
        assert!(settings.local_echo);
    }

    #[test]
    fn malformed_settings_are_a_config_error() {
        let err = Settings::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, McpFlowError::Config(_)));
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let settings = ProviderSettings::with_api_key("super-secret");
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("redacted"));
    }
}
