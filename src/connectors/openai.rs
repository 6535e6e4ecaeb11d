use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::tools::{
    Connector, ConnectorCore, JsonMap, ProviderOutput, ToolCapability, ToolInfo, ToolRequest,
};

use super::http::{param, param_str, trim_base_url, HttpTransport};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// OpenAI chat completions.
pub struct OpenAiConnector {
    core: ConnectorCore,
    transport: HttpTransport,
    api_key: String,
    base_url: String,
}

impl OpenAiConnector {
    pub fn new(api_key: impl Into<String>, base_url: Option<&str>, transport: HttpTransport) -> Self {
        let base_url = trim_base_url(base_url.unwrap_or(OPENAI_BASE_URL));
        let info = ToolInfo::builder("openai")
            .name("OpenAI ChatGPT")
            .description("OpenAI's ChatGPT for conversational AI and code generation")
            .capability(ToolCapability::TextGeneration)
            .capability(ToolCapability::CodeGeneration)
            .capability(ToolCapability::DataAnalysis)
            .capability(ToolCapability::Translation)
            .config("base_url", base_url.clone())
            .rate_limit(60)
            .cost_per_request(0.002)
            .build();
        Self {
            core: ConnectorCore::new(info),
            transport,
            api_key: api_key.into(),
            base_url,
        }
    }
}

fn extract_content(payload: &Value) -> String {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl Connector for OpenAiConnector {
    fn core(&self) -> &ConnectorCore {
        &self.core
    }

    fn validate_input(&self, input: &JsonMap) -> bool {
        input.get("messages").is_some_and(Value::is_array)
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<ProviderOutput> {
        let model = param_str(request, "model", DEFAULT_MODEL);
        let body = json!({
            "model": model,
            "messages": request.input_data.get("messages").cloned().unwrap_or_else(|| json!([])),
            "temperature": param(request, "temperature", 0.7),
            "max_tokens": param(request, "max_tokens", 2048),
            "top_p": param(request, "top_p", 1.0),
            "frequency_penalty": param(request, "frequency_penalty", 0.0),
            "presence_penalty": param(request, "presence_penalty", 0.0),
        });

        let payload = self
            .transport
            .send_json(
                self.id(),
                self.transport
                    .client()
                    .post(format!("{}/chat/completions", self.base_url))
                    .bearer_auth(&self.api_key)
                    .json(&body),
            )
            .await?;

        let mut output = JsonMap::new();
        output.insert("text".to_string(), Value::from(extract_content(&payload)));
        output.insert("model".to_string(), Value::from(model.clone()));
        output.insert(
            "usage".to_string(),
            payload.get("usage").cloned().unwrap_or_else(|| json!({})),
        );
        Ok(ProviderOutput::new(output)
            .with_metadata("model", model)
            .with_metadata("provider", "openai"))
    }

    async fn health_check(&self) -> bool {
        let request = self
            .transport
            .client()
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key);
        self.transport.probe(self.id(), request).await
    }
}
