use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Provider;
use crate::error::{McpFlowError, Result};
use crate::tools::DynConnector;

use super::{
    CursorConnector, FigmaConnector, GeminiConnector, GitHubConnector, HttpTransport,
    OpenAiConnector,
};

/// What a factory gets to build one provider connector.
#[derive(Clone, Debug)]
pub struct ConnectorSpec {
    pub credential: String,
    pub base_url: Option<String>,
    pub transport: HttpTransport,
}

pub type ConnectorFactory = Arc<dyn Fn(ConnectorSpec) -> Result<DynConnector> + Send + Sync>;

#[derive(Default)]
pub struct ConnectorFactoryRegistry {
    factories: HashMap<String, ConnectorFactory>,
}

impl ConnectorFactoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        register_builtin_connector_factories(&mut registry);
        registry
    }

    pub fn register_factory<T: Into<String>>(&mut self, name: T, factory: ConnectorFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn build(&self, name: &str, spec: ConnectorSpec) -> Result<DynConnector> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| McpFlowError::Config(format!("no connector factory named `{name}`")))?;
        factory(spec)
    }
}

pub fn register_builtin_connector_factories(registry: &mut ConnectorFactoryRegistry) {
    registry.register_factory(
        Provider::Gemini.id(),
        Arc::new(|spec: ConnectorSpec| {
            Ok(Arc::new(GeminiConnector::new(
                spec.credential,
                spec.base_url.as_deref(),
                spec.transport,
            )) as DynConnector)
        }),
    );
    registry.register_factory(
        Provider::Figma.id(),
        Arc::new(|spec: ConnectorSpec| {
            Ok(Arc::new(FigmaConnector::new(
                spec.credential,
                spec.base_url.as_deref(),
                spec.transport,
            )) as DynConnector)
        }),
    );
    registry.register_factory(
        Provider::OpenAi.id(),
        Arc::new(|spec: ConnectorSpec| {
            Ok(Arc::new(OpenAiConnector::new(
                spec.credential,
                spec.base_url.as_deref(),
                spec.transport,
            )) as DynConnector)
        }),
    );
    registry.register_factory(
        Provider::GitHub.id(),
        Arc::new(|spec: ConnectorSpec| {
            Ok(Arc::new(GitHubConnector::new(
                spec.credential,
                spec.base_url.as_deref(),
                spec.transport,
            )) as DynConnector)
        }),
    );
    registry.register_factory(
        Provider::Cursor.id(),
        Arc::new(|spec: ConnectorSpec| {
            Ok(Arc::new(CursorConnector::new(
                spec.credential,
                spec.base_url.as_deref(),
                spec.transport,
            )) as DynConnector)
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpSettings;

    #[test]
    fn builds_every_builtin_provider() {
        let registry = ConnectorFactoryRegistry::with_builtin();
        let transport = HttpTransport::new(&HttpSettings::default()).unwrap();

        for provider in Provider::ALL {
            let connector = registry
                .build(
                    provider.id(),
                    ConnectorSpec {
                        credential: "token-value".to_string(),
                        base_url: None,
                        transport: transport.clone(),
                    },
                )
                .unwrap();
            assert_eq!(connector.id(), provider.id());
        }
    }

    #[test]
    fn unknown_factory_is_a_config_error() {
        let registry = ConnectorFactoryRegistry::new();
        let transport = HttpTransport::new(&HttpSettings::default()).unwrap();
        let err = registry
            .build(
                "notion",
                ConnectorSpec {
                    credential: String::new(),
                    base_url: None,
                    transport,
                },
            )
            .err()
            .unwrap();
        assert!(matches!(err, McpFlowError::Config(_)));
    }
}
