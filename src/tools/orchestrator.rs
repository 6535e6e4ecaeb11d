use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::{future, FutureExt};
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{McpFlowError, Result};

use super::aggregate::aggregate;
use super::registry::ToolRegistry;
use super::request::{OrchestrationRequest, OrchestrationResponse, Strategy, ToolRequest, ToolResponse};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrchestrationPhase {
    Validating,
    Dispatching,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for OrchestrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrchestrationPhase::Validating => "validating",
            OrchestrationPhase::Dispatching => "dispatching",
            OrchestrationPhase::Aggregating => "aggregating",
            OrchestrationPhase::Done => "done",
            OrchestrationPhase::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Fans one orchestration request out over the registered connectors.
///
/// All per-request state lives on the stack of [`OrchestrationEngine::execute`];
/// the engine itself only holds a handle to the shared registry.
#[derive(Clone)]
pub struct OrchestrationEngine {
    registry: Arc<ToolRegistry>,
}

impl OrchestrationEngine {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    #[instrument(skip_all, fields(workflow = %request.workflow_id, strategy = %request.strategy))]
    pub async fn execute(&self, request: &OrchestrationRequest) -> OrchestrationResponse {
        let started = Instant::now();
        info!(tools = ?request.tools, "executing orchestration");

        debug!(phase = %OrchestrationPhase::Validating);
        let (strategy, per_call) = match self.validate(request) {
            Ok(plan) => plan,
            Err(err) => {
                error!(phase = %OrchestrationPhase::Failed, error = %err, "orchestration rejected");
                return OrchestrationResponse::failed(
                    request.workflow_id.clone(),
                    err.to_string(),
                    started.elapsed().as_secs_f64(),
                );
            }
        };

        debug!(phase = %OrchestrationPhase::Dispatching);
        let results = match strategy {
            Strategy::Parallel => self.execute_parallel(request, &request.tools, per_call).await,
            Strategy::Sequential => self.execute_sequential(request, per_call).await,
            Strategy::Hybrid => self.execute_hybrid(request, per_call).await,
        };

        debug!(phase = %OrchestrationPhase::Aggregating, results = results.len());
        let aggregated_output = aggregate(&results);
        let total_cost = results.iter().filter_map(|r| r.cost).sum();
        let total_execution_time = started.elapsed().as_secs_f64();

        info!(
            phase = %OrchestrationPhase::Done,
            successful = aggregated_output.successful_tools,
            failed = aggregated_output.failed_tools,
            elapsed = total_execution_time,
            "orchestration finished"
        );

        OrchestrationResponse {
            workflow_id: request.workflow_id.clone(),
            success: true,
            results,
            aggregated_output,
            total_execution_time,
            total_cost,
            errors: Vec::new(),
        }
    }

    fn validate(&self, request: &OrchestrationRequest) -> Result<(Strategy, Duration)> {
        let unavailable: Vec<String> = request
            .tools
            .iter()
            .filter(|id| !self.registry.is_available(id))
            .cloned()
            .collect();
        if !unavailable.is_empty() {
            return Err(McpFlowError::UnavailableTools(unavailable));
        }
        if request.tools.is_empty() {
            return Err(McpFlowError::InvalidRequest("no tools requested".to_string()));
        }

        let strategy: Strategy = request.strategy.parse()?;
        if strategy == Strategy::Hybrid && request.max_parallel == 0 {
            return Err(McpFlowError::InvalidRequest(
                "max_parallel must be at least 1".to_string(),
            ));
        }

        if !request.timeout.is_finite() || request.timeout <= 0.0 {
            return Err(McpFlowError::InvalidRequest(format!(
                "timeout must be a positive number of seconds, got {}",
                request.timeout
            )));
        }
        let per_call = Duration::try_from_secs_f64(request.timeout)
            .map_err(|e| McpFlowError::InvalidRequest(format!("timeout out of range: {e}")))?;

        Ok((strategy, per_call))
    }

    async fn execute_parallel(
        &self,
        request: &OrchestrationRequest,
        tools: &[String],
        per_call: Duration,
    ) -> Vec<ToolResponse> {
        let calls = tools
            .iter()
            .map(|tool_id| self.execute_step(request.tool_request(tool_id), per_call));
        future::join_all(calls).await
    }

    async fn execute_sequential(
        &self,
        request: &OrchestrationRequest,
        per_call: Duration,
    ) -> Vec<ToolResponse> {
        let stop_on_error = request.stop_on_error();
        let mut results = Vec::with_capacity(request.tools.len());
        for tool_id in &request.tools {
            let response = self.execute_step(request.tool_request(tool_id), per_call).await;
            let failed = !response.success;
            results.push(response);
            if failed && stop_on_error {
                info!(tool = %tool_id, "stopping sequential run after failure");
                break;
            }
        }
        results
    }

    async fn execute_hybrid(
        &self,
        request: &OrchestrationRequest,
        per_call: Duration,
    ) -> Vec<ToolResponse> {
        let mut results = Vec::with_capacity(request.tools.len());
        for (index, batch) in request.tools.chunks(request.max_parallel).enumerate() {
            debug!(
                batch = %format!("{}_batch_{}", request.workflow_id, index),
                tools = ?batch,
                "dispatching batch"
            );
            results.extend(self.execute_parallel(request, batch, per_call).await);
        }
        results
    }

    /// One time-boxed call; timeouts and panics come back as failed responses.
    async fn execute_step(&self, call: ToolRequest, per_call: Duration) -> ToolResponse {
        let tool_id = call.tool_id.clone();
        let Some(connector) = self.registry.get(&tool_id) else {
            let err = McpFlowError::ToolNotFound(tool_id.clone());
            return ToolResponse::failure(tool_id, err.to_string(), 0.0, "unavailable");
        };

        let started = Instant::now();
        let guarded = AssertUnwindSafe(connector.execute(call)).catch_unwind();
        match timeout(per_call, guarded).await {
            Ok(Ok(response)) => {
                if !response.success {
                    warn!(tool = %tool_id, error = ?response.error_message, "tool returned failure");
                }
                response
            }
            Ok(Err(panic)) => {
                let message = panic_message(panic.as_ref());
                warn!(tool = %tool_id, %message, "tool panicked");
                ToolResponse::failure(
                    tool_id,
                    format!("tool panicked: {message}"),
                    started.elapsed().as_secs_f64(),
                    "panic",
                )
            }
            Err(_) => {
                warn!(tool = %tool_id, timeout = per_call.as_secs_f64(), "tool invocation timed out");
                ToolResponse::failure(
                    tool_id,
                    format!(
                        "Tool execution timed out after {} seconds",
                        per_call.as_secs_f64()
                    ),
                    per_call.as_secs_f64(),
                    "timeout",
                )
            }
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
