use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{future, FutureExt};
use once_cell::sync::OnceCell;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::config::{Provider, Settings};
use crate::connectors::{ConnectorFactoryRegistry, ConnectorSpec, EchoConnector, HttpTransport};
use crate::error::{McpFlowError, Result};
use crate::tools::orchestrator::panic_message;
use crate::tools::{
    DynConnector, JsonMap, OrchestrationEngine, OrchestrationRequest, OrchestrationResponse,
    TemplateStore, ToolInfo, ToolRegistry, ToolRequest, ToolResponse, ToolStatus, WorkflowTemplate,
};
use crate::utils::ConfigValidator;

struct ServerState {
    registry: Arc<ToolRegistry>,
    engine: OrchestrationEngine,
    templates: TemplateStore,
}

impl ServerState {
    fn new(registry: Arc<ToolRegistry>, templates: TemplateStore) -> Self {
        Self {
            engine: OrchestrationEngine::new(Arc::clone(&registry)),
            registry,
            templates,
        }
    }
}

/// Entry point for the API layer.
///
/// Construct one per process and hand it to request handlers. The registry and
/// templates are built from the settings on first use.
pub struct McpServer {
    settings: Settings,
    factories: ConnectorFactoryRegistry,
    state: OnceCell<ServerState>,
}

impl McpServer {
    pub fn new(settings: Settings) -> Self {
        Self::with_factories(settings, ConnectorFactoryRegistry::with_builtin())
    }

    pub fn with_factories(settings: Settings, factories: ConnectorFactoryRegistry) -> Self {
        Self {
            settings,
            factories,
            state: OnceCell::new(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Settings::from_env()?))
    }

    /// Already-initialized server over a caller-built registry and template set.
    pub fn with_parts(registry: Arc<ToolRegistry>, templates: TemplateStore) -> Self {
        Self {
            settings: Settings::default(),
            factories: ConnectorFactoryRegistry::new(),
            state: OnceCell::with_value(ServerState::new(registry, templates)),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_initialized(&self) -> bool {
        self.state.get().is_some()
    }

    fn state(&self) -> &ServerState {
        self.state.get_or_init(|| {
            let registry = Arc::new(self.build_registry());
            ServerState::new(registry, TemplateStore::with_builtin())
        })
    }

    fn build_registry(&self) -> ToolRegistry {
        let registry = ToolRegistry::new();

        let providers = self.settings.configured_providers();
        if !providers.is_empty() {
            match HttpTransport::new(&self.settings.http) {
                Ok(transport) => {
                    for provider in providers {
                        match self.build_connector(provider, transport.clone()) {
                            Ok(connector) => registry.register(connector),
                            Err(err) => warn!(%provider, error = %err, "skipping provider"),
                        }
                    }
                }
                Err(err) => error!(error = %err, "failed to build http client; no provider registered"),
            }
        }

        if self.settings.local_echo {
            registry.register(Arc::new(EchoConnector::new()));
        }

        info!(tools = registry.len(), "initialized tools");
        registry
    }

    fn build_connector(&self, provider: Provider, transport: HttpTransport) -> Result<DynConnector> {
        let provider_settings = self.settings.provider(provider);
        let credential = provider_settings
            .credential()
            .ok_or_else(|| McpFlowError::Config(format!("{provider} has no credential")))?;
        ConfigValidator::validate_api_key(&credential)?;
        if let Some(base_url) = &provider_settings.base_url {
            ConfigValidator::validate_url(base_url)?;
        }

        self.factories.build(
            provider.id(),
            ConnectorSpec {
                credential,
                base_url: provider_settings.base_url.clone(),
                transport,
            },
        )
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.state().registry
    }

    pub fn engine(&self) -> &OrchestrationEngine {
        &self.state().engine
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.state().templates
    }

    /// Runs one tool directly, rejecting unknown or non-available tools.
    pub async fn execute_tool(&self, request: ToolRequest) -> Result<ToolResponse> {
        ConfigValidator::validate_priority(request.priority)?;
        let connector = self.registry().require_available(&request.tool_id)?;

        let started = Instant::now();
        let tool_id = request.tool_id.clone();
        match AssertUnwindSafe(connector.execute(request)).catch_unwind().await {
            Ok(response) => Ok(response),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(tool = %tool_id, %message, "tool panicked");
                Ok(ToolResponse::failure(
                    tool_id,
                    format!("tool panicked: {message}"),
                    started.elapsed().as_secs_f64(),
                    "panic",
                ))
            }
        }
    }

    pub async fn execute_orchestration(&self, request: &OrchestrationRequest) -> OrchestrationResponse {
        self.engine().execute(request).await
    }

    pub async fn execute_template(
        &self,
        template_id: &str,
        input_data: JsonMap,
        context: JsonMap,
    ) -> Result<OrchestrationResponse> {
        let template = self
            .templates()
            .get(template_id)
            .ok_or_else(|| McpFlowError::TemplateNotFound(template_id.to_string()))?;
        let request = template.instantiate(input_data, context);
        Ok(self.engine().execute(&request).await)
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.registry().infos()
    }

    pub fn available_tools(&self) -> Vec<String> {
        self.registry().list_available()
    }

    pub fn tool_info(&self, tool_id: &str) -> Option<ToolInfo> {
        self.registry().get(tool_id).map(|connector| connector.info())
    }

    pub fn list_templates(&self) -> Vec<WorkflowTemplate> {
        self.templates().list()
    }

    pub fn template(&self, template_id: &str) -> Option<WorkflowTemplate> {
        self.templates().get(template_id).cloned()
    }

    /// Probes every registered tool concurrently and refreshes its status.
    ///
    /// A passing probe moves an `error` tool back to `available`; a failing one
    /// moves an `available` tool to `error`. Other statuses are left alone.
    pub async fn health_check(&self) -> BTreeMap<String, bool> {
        let connectors = self.registry().connectors();
        let probes = connectors.iter().map(|connector| async move {
            let healthy = AssertUnwindSafe(connector.health_check())
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    error!(tool = %connector.id(), message = %panic_message(panic.as_ref()), "health check panicked");
                    false
                });

            match (connector.status(), healthy) {
                (ToolStatus::Error, true) => connector.set_status(ToolStatus::Available),
                (ToolStatus::Available, false) => connector.set_status(ToolStatus::Error),
                _ => {}
            }
            (connector.id().to_string(), healthy)
        });
        future::join_all(probes).await.into_iter().collect()
    }

    pub fn register_custom_tool(&self, connector: DynConnector) -> Result<()> {
        ConfigValidator::validate_tool_id(connector.id())?;
        self.registry().register(connector);
        Ok(())
    }

    pub fn unregister_tool(&self, tool_id: &str) -> bool {
        self.registry().unregister(tool_id).is_some()
    }
}
