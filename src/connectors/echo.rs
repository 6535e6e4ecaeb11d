use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::tools::{
    Connector, ConnectorCore, JsonMap, ProviderOutput, ToolCapability, ToolInfo, ToolRequest,
};

/// Offline text generator that echoes the prompt back, for demos and tests.
///
/// A `delay_ms` parameter makes it sleep before answering.
pub struct EchoConnector {
    core: ConnectorCore,
    prefix: String,
}

impl EchoConnector {
    pub fn new() -> Self {
        Self::with_prefix("echo", "Echo")
    }

    pub fn with_prefix(id: impl Into<String>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let info = ToolInfo::builder(id)
            .name("Local Echo")
            .description("Echoes the prompt back without any network access")
            .capability(ToolCapability::TextGeneration)
            .config("prefix", prefix.clone())
            .cost_per_request(0.0)
            .build();
        Self {
            core: ConnectorCore::new(info),
            prefix,
        }
    }

    pub fn from_info(info: ToolInfo) -> Self {
        let prefix = info
            .config
            .get("prefix")
            .and_then(Value::as_str)
            .unwrap_or("Echo")
            .to_string();
        Self {
            core: ConnectorCore::new(info),
            prefix,
        }
    }
}

impl Default for EchoConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for EchoConnector {
    fn core(&self) -> &ConnectorCore {
        &self.core
    }

    fn validate_input(&self, input: &JsonMap) -> bool {
        input
            .get("prompt")
            .and_then(Value::as_str)
            .is_some_and(|prompt| !prompt.is_empty())
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<ProviderOutput> {
        if let Some(delay) = request.parameter("delay_ms").and_then(Value::as_u64) {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let prompt = request.input_str("prompt").unwrap_or_default();

        let mut output = JsonMap::new();
        output.insert(
            "text".to_string(),
            Value::from(format!("{}: {}", self.prefix, prompt)),
        );
        output.insert("echo".to_string(), Value::Object(request.input_data.clone()));
        Ok(ProviderOutput::new(output).with_metadata("provider", "local"))
    }

    async fn health_check(&self) -> bool {
        true
    }
}
