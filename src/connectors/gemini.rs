use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::tools::{
    Connector, ConnectorCore, JsonMap, ProviderOutput, ToolCapability, ToolInfo, ToolRequest,
};

use super::http::{param, param_str, trim_base_url, HttpTransport};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Google Gemini `generateContent`.
pub struct GeminiConnector {
    core: ConnectorCore,
    transport: HttpTransport,
    api_key: String,
    base_url: String,
}

impl GeminiConnector {
    pub fn new(api_key: impl Into<String>, base_url: Option<&str>, transport: HttpTransport) -> Self {
        let base_url = trim_base_url(base_url.unwrap_or(GEMINI_BASE_URL));
        let info = ToolInfo::builder("gemini")
            .name("Google Gemini")
            .description("Google's advanced AI model for text generation and analysis")
            .capability(ToolCapability::TextGeneration)
            .capability(ToolCapability::CodeGeneration)
            .capability(ToolCapability::DataAnalysis)
            .capability(ToolCapability::Translation)
            .config("base_url", base_url.clone())
            .rate_limit(60)
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

fn extract_text(payload: &Value) -> String {
    payload["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl Connector for GeminiConnector {
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
        let model = param_str(request, "model", DEFAULT_MODEL);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": param(request, "temperature", 0.7),
                "topK": param(request, "top_k", 40),
                "topP": param(request, "top_p", 0.95),
                "maxOutputTokens": param(request, "max_tokens", 2048),
            }
        });

        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let payload = self
            .transport
            .send_json(
                self.id(),
                self.transport
                    .client()
                    .post(url)
                    .query(&[("key", self.api_key.as_str())])
                    .json(&body),
            )
            .await?;

        let mut output = JsonMap::new();
        output.insert("text".to_string(), Value::from(extract_text(&payload)));
        output.insert("model".to_string(), Value::from(model.clone()));
        output.insert(
            "usage".to_string(),
            payload.get("usageMetadata").cloned().unwrap_or_else(|| json!({})),
        );
        Ok(ProviderOutput::new(output)
            .with_metadata("model", model)
            .with_metadata("provider", "google"))
    }

    async fn health_check(&self) -> bool {
        let request = self
            .transport
            .client()
            .get(format!("{}/models", self.base_url))
            .query(&[("key", self.api_key.as_str())]);
        self.transport.probe(self.id(), request).await
    }
}
