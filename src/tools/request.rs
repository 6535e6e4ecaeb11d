use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::McpFlowError;

use super::aggregate::AggregatedOutput;

pub type JsonMap = Map<String, Value>;

pub const DEFAULT_PRIORITY: u8 = 1;
pub const DEFAULT_MAX_PARALLEL: usize = 3;
pub const DEFAULT_TIMEOUT_SECS: f64 = 300.0;

pub const STOP_ON_ERROR_KEY: &str = "stop_on_error";
pub const PARAMETERS_KEY: &str = "parameters";
pub const PRIORITY_KEY: &str = "priority";

/// One invocation of one tool.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolRequest {
    pub tool_id: String,
    #[serde(default)]
    pub input_data: JsonMap,
    #[serde(default)]
    pub parameters: JsonMap,
    #[serde(default)]
    pub context: JsonMap,
    /// Advisory, 1-10.
    #[serde(default = "default_priority")]
    pub priority: u8,
}

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

impl ToolRequest {
    pub fn new(tool_id: impl Into<String>, input_data: JsonMap) -> Self {
        Self {
            tool_id: tool_id.into(),
            input_data,
            parameters: JsonMap::new(),
            context: JsonMap::new(),
            priority: DEFAULT_PRIORITY,
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_parameters(mut self, parameters: JsonMap) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_context(mut self, context: JsonMap) -> Self {
        self.context = context;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.clamp(1, 10);
        self
    }

    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.input_data.get(key).and_then(Value::as_str)
    }

    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }
}

/// Outcome of one invocation. A failed response always carries an error message.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolResponse {
    pub tool_id: String,
    pub success: bool,
    #[serde(default)]
    pub output_data: JsonMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Seconds.
    pub execution_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default)]
    pub metadata: JsonMap,
}

impl ToolResponse {
    pub fn success(tool_id: impl Into<String>, output_data: JsonMap, execution_time: f64) -> Self {
        Self {
            tool_id: tool_id.into(),
            success: true,
            output_data,
            error_message: None,
            execution_time,
            cost: None,
            metadata: JsonMap::new(),
        }
    }

    pub fn failure(
        tool_id: impl Into<String>,
        error: impl Into<String>,
        execution_time: f64,
        error_type: &str,
    ) -> Self {
        let mut metadata = JsonMap::new();
        metadata.insert("error_type".to_string(), Value::from(error_type));
        Self {
            tool_id: tool_id.into(),
            success: false,
            output_data: JsonMap::new(),
            error_message: Some(error.into()),
            execution_time,
            cost: None,
            metadata,
        }
    }

    pub fn with_cost(mut self, cost: Option<f64>) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_metadata(mut self, metadata: JsonMap) -> Self {
        self.metadata.extend(metadata);
        self
    }

    pub fn error_type(&self) -> Option<&str> {
        self.metadata.get("error_type").and_then(Value::as_str)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Parallel,
    Sequential,
    Hybrid,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Parallel => "parallel",
            Strategy::Sequential => "sequential",
            Strategy::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = McpFlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parallel" => Ok(Strategy::Parallel),
            "sequential" => Ok(Strategy::Sequential),
            "hybrid" => Ok(Strategy::Hybrid),
            other => Err(McpFlowError::UnknownStrategy(other.to_string())),
        }
    }
}

/// A single logical request fanned out across several tools.
///
/// `strategy` stays a plain string on the wire so an unknown name reaches the
/// engine and is reported as an orchestration error rather than a decode error.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OrchestrationRequest {
    pub workflow_id: String,
    pub tools: Vec<String>,
    #[serde(default)]
    pub input_data: JsonMap,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    #[serde(default)]
    pub context: JsonMap,
}

fn default_strategy() -> String {
    Strategy::Parallel.as_str().to_string()
}

fn default_max_parallel() -> usize {
    DEFAULT_MAX_PARALLEL
}

fn default_timeout() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

impl OrchestrationRequest {
    pub fn new<I, S>(workflow_id: impl Into<String>, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            workflow_id: workflow_id.into(),
            tools: tools.into_iter().map(Into::into).collect(),
            input_data: JsonMap::new(),
            strategy: default_strategy(),
            max_parallel: DEFAULT_MAX_PARALLEL,
            timeout: DEFAULT_TIMEOUT_SECS,
            context: JsonMap::new(),
        }
    }

    pub fn with_input(mut self, input_data: JsonMap) -> Self {
        self.input_data = input_data;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy.as_str().to_string();
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.as_secs_f64();
        self
    }

    pub fn with_context(mut self, context: JsonMap) -> Self {
        self.context = context;
        self
    }

    pub fn with_context_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn stop_on_error(&self) -> bool {
        self.context
            .get(STOP_ON_ERROR_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Builds the per-tool request, applying `parameters`/`priority` overrides from the context.
    pub fn tool_request(&self, tool_id: &str) -> ToolRequest {
        let parameters = self
            .context
            .get(PARAMETERS_KEY)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let priority = self
            .context
            .get(PRIORITY_KEY)
            .and_then(Value::as_u64)
            .map(|p| p.clamp(1, 10) as u8)
            .unwrap_or(DEFAULT_PRIORITY);

        ToolRequest {
            tool_id: tool_id.to_string(),
            input_data: self.input_data.clone(),
            parameters,
            context: self.context.clone(),
            priority,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OrchestrationResponse {
    pub workflow_id: String,
    /// True iff `errors` is empty; per-tool failures live in `aggregated_output`.
    pub success: bool,
    pub results: Vec<ToolResponse>,
    pub aggregated_output: AggregatedOutput,
    pub total_execution_time: f64,
    pub total_cost: f64,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl OrchestrationResponse {
    pub fn failed(workflow_id: impl Into<String>, error: String, total_execution_time: f64) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            success: false,
            results: Vec::new(),
            aggregated_output: AggregatedOutput::default(),
            total_execution_time,
            total_cost: 0.0,
            errors: vec![error],
        }
    }

    /// Stricter than `success`: also requires every dispatched tool to have succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.success && self.results.iter().all(|r| r.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn orchestration_request_applies_wire_defaults() {
        let request: OrchestrationRequest = serde_json::from_value(json!({
            "workflow_id": "wf",
            "tools": ["gemini"],
        }))
        .unwrap();

        assert_eq!(request.strategy, "parallel");
        assert_eq!(request.max_parallel, 3);
        assert_eq!(request.timeout, 300.0);
        assert!(!request.stop_on_error());
    }

    #[test]
    fn tool_request_takes_parameter_and_priority_overrides_from_context() {
        let request = OrchestrationRequest::new("wf", ["openai"])
            .with_context_value("parameters", json!({"temperature": 0.1}))
            .with_context_value("priority", 42);
        let call = request.tool_request("openai");

        assert_eq!(call.parameters.get("temperature"), Some(&json!(0.1)));
        assert_eq!(call.priority, 10);
        assert_eq!(call.context, request.context);
    }

    #[test]
    fn unknown_strategy_name_is_rejected() {
        assert_eq!("hybrid".parse::<Strategy>().unwrap(), Strategy::Hybrid);
        let err = "round_robin".parse::<Strategy>().unwrap_err();
        assert!(err.to_string().contains("round_robin"));
    }

    #[test]
    fn failure_response_carries_error_and_type() {
        let response = ToolResponse::failure("figma", "boom", 0.5, "provider");
        assert!(!response.success);
        assert_eq!(response.error_message.as_deref(), Some("boom"));
        assert_eq!(response.error_type(), Some("provider"));
        assert!(response.output_data.is_empty());
    }
}
