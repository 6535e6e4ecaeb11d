use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::error::{McpFlowError, Result};

use super::connector::Connector;
use super::info::{ToolInfo, ToolStatus};

pub type DynConnector = Arc<dyn Connector>;

/// Live connectors keyed by tool id.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, DynConnector>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts the connector, replacing any previous one with the same id.
    pub fn register(&self, connector: DynConnector) {
        let id = connector.id().to_string();
        info!(tool = %id, name = %connector.info().name, "registered tool");
        self.tools.write().insert(id, connector);
    }

    pub fn unregister(&self, id: &str) -> Option<DynConnector> {
        let removed = self.tools.write().remove(id);
        if removed.is_some() {
            info!(tool = %id, "unregistered tool");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<DynConnector> {
        self.tools.read().get(id).map(Arc::clone)
    }

    /// Returns the connector only if it is registered and `available`.
    pub fn require_available(&self, id: &str) -> Result<DynConnector> {
        let connector = self
            .get(id)
            .ok_or_else(|| McpFlowError::ToolNotFound(id.to_string()))?;
        if connector.status() != ToolStatus::Available {
            return Err(McpFlowError::ToolUnavailable(id.to_string()));
        }
        Ok(connector)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tools.read().contains_key(id)
    }

    pub fn is_available(&self, id: &str) -> bool {
        self.get(id)
            .map(|connector| connector.status() == ToolStatus::Available)
            .unwrap_or(false)
    }

    pub fn list_available(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .tools
            .read()
            .iter()
            .filter(|(_, connector)| connector.status() == ToolStatus::Available)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn infos(&self) -> Vec<ToolInfo> {
        let mut infos: Vec<ToolInfo> = self.tools.read().values().map(|c| c.info()).collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    /// Snapshot of every connector, so callers can await on them without holding the lock.
    pub fn connectors(&self) -> Vec<DynConnector> {
        self.tools.read().values().map(Arc::clone).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
