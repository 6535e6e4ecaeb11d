use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::tools::{
    Connector, ConnectorCore, JsonMap, ProviderOutput, ToolCapability, ToolInfo, ToolRequest,
};

use super::http::{param, param_str, trim_base_url, HttpTransport};

pub const CURSOR_BASE_URL: &str = "https://api.cursor.sh/v1";

/// Cursor code completion.
pub struct CursorConnector {
    core: ConnectorCore,
    transport: HttpTransport,
    api_key: String,
    base_url: String,
}

impl CursorConnector {
    pub fn new(api_key: impl Into<String>, base_url: Option<&str>, transport: HttpTransport) -> Self {
        let base_url = trim_base_url(base_url.unwrap_or(CURSOR_BASE_URL));
        let info = ToolInfo::builder("cursor")
            .name("Cursor AI")
            .description("AI-powered code editor with intelligent code completion")
            .capability(ToolCapability::CodeGeneration)
            .capability(ToolCapability::TextGeneration)
            .config("base_url", base_url.clone())
            .rate_limit(100)
            .cost_per_request(0.001)
            .build();
        Self {
            core: ConnectorCore::new(info),
            transport,
            api_key: api_key.into(),
            base_url,
        }
    }
}

#[async_trait]
impl Connector for CursorConnector {
    fn core(&self) -> &ConnectorCore {
        &self.core
    }

    fn validate_input(&self, input: &JsonMap) -> bool {
        input
            .get("prompt")
            .and_then(Value::as_str)
            .is_some_and(|prompt| !prompt.trim().is_empty())
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<ProviderOutput> {
        let prompt = request.input_str("prompt").unwrap_or_default();
        let code_context = request.input_str("code_context").unwrap_or_default();
        let language = param_str(request, "language", "typescript");
        let body = json!({
            "prompt": prompt,
            "code_context": code_context,
            "language": language,
            "temperature": param(request, "temperature", 0.7),
            "max_tokens": param(request, "max_tokens", 2048),
        });

        let payload = self
            .transport
            .send_json(
                self.id(),
                self.transport
                    .client()
                    .post(format!("{}/completions", self.base_url))
                    .bearer_auth(&self.api_key)
                    .json(&body),
            )
            .await?;

        let completion = payload
            .get("completion")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let mut output = JsonMap::new();
        output.insert("completion".to_string(), Value::from(completion));
        output.insert("language".to_string(), Value::from(language.clone()));
        output.insert("context".to_string(), Value::from(code_context));
        Ok(ProviderOutput::new(output)
            .with_metadata("language", language)
            .with_metadata("provider", "cursor"))
    }

    async fn health_check(&self) -> bool {
        let request = self
            .transport
            .client()
            .get(format!("{}/health", self.base_url))
            .bearer_auth(&self.api_key);
        self.transport.probe(self.id(), request).await
    }
}
