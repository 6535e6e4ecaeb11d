use async_trait::async_trait;
use serde_json::Value;

use crate::error::{McpFlowError, Result};
use crate::tools::{
    Connector, ConnectorCore, JsonMap, ProviderOutput, ToolCapability, ToolInfo, ToolRequest,
};

use super::http::{into_object, param, param_str, trim_base_url, HttpTransport};

pub const FIGMA_BASE_URL: &str = "https://api.figma.com/v1";

pub const FIGMA_ACTIONS: [&str; 3] = ["get_file", "get_images", "get_comments"];

/// Figma REST API: files, rendered images and comments.
pub struct FigmaConnector {
    core: ConnectorCore,
    transport: HttpTransport,
    access_token: String,
    base_url: String,
}

impl FigmaConnector {
    pub fn new(
        access_token: impl Into<String>,
        base_url: Option<&str>,
        transport: HttpTransport,
    ) -> Self {
        let base_url = trim_base_url(base_url.unwrap_or(FIGMA_BASE_URL));
        let info = ToolInfo::builder("figma")
            .name("Figma")
            .description("Design collaboration platform for UI/UX design")
            .capability(ToolCapability::DesignAssistance)
            .capability(ToolCapability::ImageGeneration)
            .config("base_url", base_url.clone())
            .rate_limit(100)
            .cost_per_request(0.0)
            .build();
        Self {
            core: ConnectorCore::new(info),
            transport,
            access_token: access_token.into(),
            base_url,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.transport
            .client()
            .get(format!("{}{}", self.base_url, path))
            .header("X-Figma-Token", &self.access_token)
    }
}

#[async_trait]
impl Connector for FigmaConnector {
    fn core(&self) -> &ConnectorCore {
        &self.core
    }

    fn validate_input(&self, input: &JsonMap) -> bool {
        input
            .get("action")
            .and_then(Value::as_str)
            .is_some_and(|action| FIGMA_ACTIONS.contains(&action))
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<ProviderOutput> {
        let action = request.input_str("action").unwrap_or("get_file");
        let file_key = request.input_str("file_key").unwrap_or_default();

        let http_request = match action {
            "get_file" => self.get(&format!("/files/{file_key}")),
            "get_images" => {
                let node_ids: Vec<&str> = request
                    .input_data
                    .get("node_ids")
                    .and_then(Value::as_array)
                    .map(|ids| ids.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();
                let scale = match param(request, "scale", 1) {
                    Value::String(scale) => scale,
                    other => other.to_string(),
                };
                self.get(&format!("/images/{file_key}")).query(&[
                    ("ids", node_ids.join(",")),
                    ("format", param_str(request, "format", "png")),
                    ("scale", scale),
                ])
            }
            "get_comments" => self.get(&format!("/files/{file_key}/comments")),
            other => {
                return Err(McpFlowError::provider(
                    self.id(),
                    format!("unsupported action: {other}"),
                ))
            }
        };

        let payload = self.transport.send_json(self.id(), http_request).await?;
        Ok(ProviderOutput::new(into_object(payload))
            .with_metadata("action", action)
            .with_metadata("provider", "figma"))
    }

    async fn health_check(&self) -> bool {
        self.transport.probe(self.id(), self.get("/me")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpSettings;
    use serde_json::json;

    #[test]
    fn requires_action_field() {
        let transport = HttpTransport::new(&HttpSettings::default()).unwrap();
        let connector = FigmaConnector::new("figd_token", None, transport);

        assert!(connector.validate_input(json!({"action": "get_file"}).as_object().unwrap()));
        assert!(!connector.validate_input(json!({"file_key": "abc"}).as_object().unwrap()));
        assert!(!connector.validate_input(json!({"action": "bogus"}).as_object().unwrap()));
    }
}
