use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::HttpSettings;
use crate::error::{McpFlowError, Result};
use crate::tools::{JsonMap, ToolRequest};

const ERROR_BODY_LIMIT: usize = 512;

/// Shared HTTP client plus the probe timeout used by health checks.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    health_timeout: Duration,
}

impl HttpTransport {
    /// Pooled client with connect/request timeouts from the settings.
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(concat!("mcpflow/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            health_timeout: Duration::from_secs(settings.health_timeout_secs),
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Sends the request and decodes a JSON body, mapping non-2xx and bad payloads to provider errors.
    pub async fn send_json(&self, tool: &str, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.map_err(|e| {
            McpFlowError::provider(tool, format!("request could not be sent: {e}"))
        })?;
        read_json(tool, response).await
    }

    /// `true` only for a 200 answer within the probe timeout.
    pub async fn probe(&self, tool: &str, request: RequestBuilder) -> bool {
        match request.timeout(self.health_timeout).send().await {
            Ok(response) => {
                let healthy = response.status() == StatusCode::OK;
                debug!(tool, status = %response.status(), healthy, "health probe answered");
                healthy
            }
            Err(err) => {
                debug!(tool, error = %err, "health probe failed");
                false
            }
        }
    }
}

async fn read_json(tool: &str, response: Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > ERROR_BODY_LIMIT {
            let mut cut = ERROR_BODY_LIMIT;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        return Err(McpFlowError::Provider {
            tool: tool.to_string(),
            status: Some(status.as_u16()),
            message: body,
        });
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| McpFlowError::provider(tool, format!("malformed response: {e}")))
}

/// Object payloads pass through; anything else is wrapped under `data`.
pub fn into_object(value: Value) -> JsonMap {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = JsonMap::new();
            map.insert("data".to_string(), other);
            map
        }
    }
}

pub fn param(request: &ToolRequest, key: &str, default: impl Into<Value>) -> Value {
    request
        .parameter(key)
        .cloned()
        .unwrap_or_else(|| default.into())
}

pub fn param_str(request: &ToolRequest, key: &str, default: &str) -> String {
    request
        .parameter(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

pub fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_object_payloads_are_wrapped() {
        assert_eq!(into_object(json!([1, 2])).get("data"), Some(&json!([1, 2])));
        assert_eq!(into_object(json!({"a": 1})).get("a"), Some(&json!(1)));
    }

    #[test]
    fn parameters_fall_back_to_defaults() {
        let request = ToolRequest::new("openai", JsonMap::new()).with_parameter("model", "gpt-4o");
        assert_eq!(param_str(&request, "model", "gpt-3.5-turbo"), "gpt-4o");
        assert_eq!(param(&request, "temperature", 0.7), json!(0.7));
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        assert_eq!(trim_base_url("https://api.github.com/"), "https://api.github.com");
    }
}
