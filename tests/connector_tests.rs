use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcpflow::{
    Connector, ConnectorCore, EchoConnector, FigmaConnector, GeminiConnector, GitHubConnector,
    HttpSettings, HttpTransport, JsonMap, OpenAiConnector, OrchestrationEngine,
    OrchestrationRequest, ProviderOutput, ToolInfo, ToolRegistry, ToolRequest, ToolStatus,
};
use parking_lot::Mutex;
use serde_json::json;
use tokio::time::Instant;

const UNREACHABLE: &str = "http://127.0.0.1:9";

struct CountingTool {
    core: ConnectorCore,
    calls: AtomicUsize,
    started: Mutex<Vec<Instant>>,
}

impl CountingTool {
    fn new(rate_limit: u32) -> Self {
        let info = ToolInfo::builder("counting")
            .rate_limit(rate_limit)
            .cost_per_request(0.5)
            .build();
        Self {
            core: ConnectorCore::new(info),
            calls: AtomicUsize::new(0),
            started: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Connector for CountingTool {
    fn core(&self) -> &ConnectorCore {
        &self.core
    }

    fn validate_input(&self, input: &JsonMap) -> bool {
        input.contains_key("prompt")
    }

    async fn invoke(&self, _request: &ToolRequest) -> mcpflow::Result<ProviderOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.lock().push(Instant::now());
        Ok(ProviderOutput::new(JsonMap::new()).with_metadata("model", "counting-1"))
    }

    async fn health_check(&self) -> bool {
        true
    }
}

fn prompt(text: &str) -> JsonMap {
    let mut input = JsonMap::new();
    input.insert("prompt".to_string(), json!(text));
    input
}

fn fast_transport() -> HttpTransport {
    let settings = HttpSettings {
        connect_timeout_secs: 2,
        request_timeout_secs: 2,
        health_timeout_secs: 2,
    };
    HttpTransport::new(&settings).expect("http client should build")
}

#[tokio::test]
async fn invalid_input_never_reaches_the_provider() {
    let tool = CountingTool::new(60);

    let response = tool.execute(ToolRequest::new("counting", JsonMap::new())).await;

    assert!(!response.success);
    assert_eq!(response.error_type(), Some("invalid_input"));
    assert_eq!(response.cost, None);
    assert!(response
        .error_message
        .as_deref()
        .is_some_and(|m| m.contains("invalid input data")));
    assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    assert_eq!(tool.status(), ToolStatus::Available);
}

#[tokio::test]
async fn successful_call_carries_cost_and_metadata() {
    let tool = CountingTool::new(0);

    let response = tool.execute(ToolRequest::new("counting", prompt("hi"))).await;

    assert!(response.success);
    assert_eq!(response.cost, Some(0.5));
    assert_eq!(response.metadata.get("model"), Some(&json!("counting-1")));
}

#[tokio::test(start_paused = true)]
async fn concurrent_calls_respect_the_rate_limit() {
    let tool = Arc::new(CountingTool::new(60));

    let calls = (0..3).map(|_| {
        let tool = Arc::clone(&tool);
        tokio::spawn(async move { tool.execute(ToolRequest::new("counting", prompt("go"))).await })
    });
    for handle in futures::future::join_all(calls).await {
        assert!(handle.expect("task should not panic").success);
    }

    let mut started = tool.started.lock().clone();
    started.sort();
    assert_eq!(started.len(), 3);
    for pair in started.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= Duration::from_secs(1));
    }
}

#[tokio::test]
async fn echo_is_deterministic() {
    let echo = EchoConnector::new();

    let first = echo.execute(ToolRequest::new("echo", prompt("ping"))).await;
    let second = echo.execute(ToolRequest::new("echo", prompt("ping"))).await;

    assert!(first.success);
    assert_eq!(first.output_data, second.output_data);
    assert_eq!(first.output_data["text"], json!("Echo: ping"));
    assert!(echo.health_check().await);
}

#[tokio::test]
async fn echo_rejects_missing_prompt() {
    let echo = EchoConnector::with_prefix("shout", "SHOUT");

    let response = echo.execute(ToolRequest::new("shout", JsonMap::new())).await;

    assert!(!response.success);
    assert_eq!(response.tool_id, "shout");
}

#[tokio::test]
async fn provider_fault_fails_the_call_and_flags_the_tool() {
    let gemini = GeminiConnector::new("AIza-test-key", Some(UNREACHABLE), fast_transport());

    let response = gemini.execute(ToolRequest::new("gemini", prompt("hello"))).await;

    assert!(!response.success);
    assert_eq!(response.error_type(), Some("provider"));
    assert!(response.error_message.is_some());
    assert_eq!(gemini.status(), ToolStatus::Error);
}

#[tokio::test]
async fn openai_requires_a_message_list() {
    let openai = OpenAiConnector::new("sk-test-1234567890abcdef", Some(UNREACHABLE), fast_transport());

    let response = openai.execute(ToolRequest::new("openai", prompt("no messages"))).await;

    assert_eq!(response.error_type(), Some("invalid_input"));
    assert_eq!(openai.status(), ToolStatus::Available);
}

#[tokio::test]
async fn unknown_action_is_rejected_without_disabling_the_tool() {
    let registry = Arc::new(ToolRegistry::new());
    registry.register(Arc::new(FigmaConnector::new(
        "figd_test_token",
        Some(UNREACHABLE),
        fast_transport(),
    )));
    let engine = OrchestrationEngine::new(Arc::clone(&registry));

    let mut bogus = JsonMap::new();
    bogus.insert("action".to_string(), json!("bogus"));
    let response = engine
        .execute(&OrchestrationRequest::new("wf-bogus", ["figma"]).with_input(bogus))
        .await;

    assert!(response.success);
    assert_eq!(response.results[0].error_type(), Some("invalid_input"));
    assert!(registry.is_available("figma"));

    let mut get_file = JsonMap::new();
    get_file.insert("action".to_string(), json!("get_file"));
    get_file.insert("file_key".to_string(), json!("abc"));
    let next = engine
        .execute(&OrchestrationRequest::new("wf-next", ["figma"]).with_input(get_file))
        .await;
    assert!(next.errors.is_empty());
    assert_eq!(next.results[0].error_type(), Some("provider"));
}

#[tokio::test]
async fn github_rejects_unknown_actions_as_invalid_input() {
    let github = GitHubConnector::new("ghp_test_token", Some(UNREACHABLE), fast_transport());
    let mut input = JsonMap::new();
    input.insert("action".to_string(), json!("delete_repo"));

    let response = github.execute(ToolRequest::new("github", input)).await;

    assert_eq!(response.error_type(), Some("invalid_input"));
    assert_eq!(github.status(), ToolStatus::Available);
}

#[tokio::test]
async fn health_check_fails_for_unreachable_provider() {
    let github = GitHubConnector::new("ghp_test_token", Some(UNREACHABLE), fast_transport());

    assert!(!github.health_check().await);
}

#[test]
fn provider_descriptors_hide_credentials() {
    let gemini = GeminiConnector::new("AIza-secret-key", Some(UNREACHABLE), fast_transport());

    let info = gemini.info();
    assert_eq!(info.rate_limit, Some(60));
    assert_eq!(info.cost_per_request, Some(0.001));
    let rendered = serde_json::to_string(&info).expect("info should serialize");
    assert!(!rendered.contains("AIza-secret-key"));
    assert!(rendered.contains(UNREACHABLE));
}
