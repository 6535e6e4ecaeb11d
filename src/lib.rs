pub mod config;
pub mod connectors;
pub mod error;
pub mod server;
pub mod tools;
pub mod utils;

pub use config::{EnvConfig, HttpSettings, Provider, ProviderSettings, Settings};
pub use connectors::{
    ConnectorFactoryRegistry, ConnectorSpec, CursorConnector, EchoConnector, FigmaConnector,
    GeminiConnector, GitHubConnector, HttpTransport, OpenAiConnector,
};
pub use error::{McpFlowError, Result};
pub use server::McpServer;
pub use tools::{
    aggregate, builtin_templates, AggregatedOutput, CombinedOutput, Connector, ConnectorCore,
    DynConnector, JsonMap, OrchestrationEngine, OrchestrationPhase, OrchestrationRequest,
    OrchestrationResponse, ProviderOutput, RateLimiter, Strategy, TemplateStore, ToolBreakdown,
    ToolCapability, ToolInfo, ToolInfoBuilder, ToolRegistry, ToolRequest, ToolResponse,
    ToolStatus, WorkflowTemplate,
};
pub use utils::{logging, validation};
