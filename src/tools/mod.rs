pub mod aggregate;
pub mod connector;
pub mod info;
pub mod orchestrator;
pub mod rate_limit;
pub mod registry;
pub mod request;
pub mod templates;

pub use aggregate::{aggregate, AggregatedOutput, CombinedOutput, ToolBreakdown};
pub use connector::{Connector, ConnectorCore, ProviderOutput};
pub use info::{ToolCapability, ToolInfo, ToolInfoBuilder, ToolStatus};
pub use orchestrator::{OrchestrationEngine, OrchestrationPhase};
pub use rate_limit::RateLimiter;
pub use registry::{DynConnector, ToolRegistry};
pub use request::{
    JsonMap, OrchestrationRequest, OrchestrationResponse, Strategy, ToolRequest, ToolResponse,
};
pub use templates::{builtin_templates, TemplateStore, WorkflowTemplate};
