use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{McpFlowError, Result};

use super::info::{ToolInfo, ToolStatus};
use super::rate_limit::RateLimiter;
use super::request::{JsonMap, ToolRequest, ToolResponse};

/// What a provider call yields before it is wrapped into a [`ToolResponse`].
#[derive(Clone, Debug, Default)]
pub struct ProviderOutput {
    pub output: JsonMap,
    pub metadata: JsonMap,
}

impl ProviderOutput {
    pub fn new(output: JsonMap) -> Self {
        Self {
            output,
            metadata: JsonMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// State every connector carries: its descriptor and its own rate limiter.
#[derive(Debug)]
pub struct ConnectorCore {
    id: String,
    info: RwLock<ToolInfo>,
    limiter: RateLimiter,
}

impl ConnectorCore {
    pub fn new(info: ToolInfo) -> Self {
        Self {
            id: info.id.clone(),
            limiter: RateLimiter::new(info.rate_limit),
            info: RwLock::new(info),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn info(&self) -> ToolInfo {
        self.info.read().clone()
    }

    pub fn status(&self) -> ToolStatus {
        self.info.read().status
    }

    pub fn set_status(&self, status: ToolStatus) {
        let mut info = self.info.write();
        if info.status != status {
            debug!(tool = %self.id, from = %info.status, to = %status, "tool status changed");
            info.status = status;
        }
    }

    pub fn cost_per_request(&self) -> Option<f64> {
        self.info.read().cost_per_request
    }

    pub async fn throttle(&self) {
        self.limiter.acquire().await;
    }

    fn recover(&self) {
        let mut info = self.info.write();
        if info.status == ToolStatus::Error {
            info.status = ToolStatus::Available;
        }
    }
}

/// Adapter over one external provider.
///
/// Implementors supply `validate_input`, `invoke` and `health_check`; the
/// provided `execute` wraps them into the uniform contract: validation first,
/// then self-throttling, then the outbound call, with every fault returned as a
/// failed [`ToolResponse`] rather than an error.
#[async_trait]
pub trait Connector: Send + Sync {
    fn core(&self) -> &ConnectorCore;

    fn validate_input(&self, input: &JsonMap) -> bool;

    async fn invoke(&self, request: &ToolRequest) -> Result<ProviderOutput>;

    async fn health_check(&self) -> bool;

    fn id(&self) -> &str {
        self.core().id()
    }

    fn info(&self) -> ToolInfo {
        self.core().info()
    }

    fn status(&self) -> ToolStatus {
        self.core().status()
    }

    fn set_status(&self, status: ToolStatus) {
        self.core().set_status(status);
    }

    async fn execute(&self, request: ToolRequest) -> ToolResponse {
        let started = Instant::now();
        let core = self.core();

        if !self.validate_input(&request.input_data) {
            let err = McpFlowError::InvalidInput(core.id().to_string());
            warn!(tool = %core.id(), "rejecting request: {err}");
            return ToolResponse::failure(
                core.id(),
                err.to_string(),
                started.elapsed().as_secs_f64(),
                "invalid_input",
            );
        }

        core.throttle().await;

        match self.invoke(&request).await {
            Ok(provider) => {
                core.recover();
                ToolResponse::success(core.id(), provider.output, started.elapsed().as_secs_f64())
                    .with_cost(core.cost_per_request())
                    .with_metadata(provider.metadata)
            }
            Err(err) => {
                warn!(tool = %core.id(), error = %err, "tool invocation failed");
                core.set_status(ToolStatus::Error);
                ToolResponse::failure(
                    core.id(),
                    err.to_string(),
                    started.elapsed().as_secs_f64(),
                    "provider",
                )
                .with_cost(core.cost_per_request())
            }
        }
    }
}
