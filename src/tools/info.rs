use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    #[default]
    Available,
    Busy,
    Error,
    Unavailable,
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ToolStatus::Available => "available",
            ToolStatus::Busy => "busy",
            ToolStatus::Error => "error",
            ToolStatus::Unavailable => "unavailable",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolCapability {
    TextGeneration,
    CodeGeneration,
    DesignAssistance,
    ImageGeneration,
    DataAnalysis,
    Search,
    Translation,
}

/// Identity and capability descriptor of a connector.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<ToolCapability>,
    #[serde(default)]
    pub status: ToolStatus,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub config: Map<String, Value>,
    /// Requests per minute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u32>,
    /// USD per request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_request: Option<f64>,
}

impl ToolInfo {
    pub fn builder(id: impl Into<String>) -> ToolInfoBuilder {
        ToolInfoBuilder::new(id)
    }

    pub fn is_available(&self) -> bool {
        self.status == ToolStatus::Available
    }

    pub fn has_capability(&self, capability: ToolCapability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[derive(Clone, Debug)]
pub struct ToolInfoBuilder {
    info: ToolInfo,
}

impl ToolInfoBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            info: ToolInfo {
                name: id.clone(),
                id,
                description: String::new(),
                capabilities: Vec::new(),
                status: ToolStatus::Available,
                config: Map::new(),
                rate_limit: None,
                cost_per_request: None,
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.info.name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.info.description = description.into();
        self
    }

    pub fn capability(mut self, capability: ToolCapability) -> Self {
        if !self.info.capabilities.contains(&capability) {
            self.info.capabilities.push(capability);
        }
        self
    }

    pub fn status(mut self, status: ToolStatus) -> Self {
        self.info.status = status;
        self
    }

    pub fn config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.info.config.insert(key.into(), value.into());
        self
    }

    pub fn rate_limit(mut self, per_minute: u32) -> Self {
        self.info.rate_limit = Some(per_minute);
        self
    }

    pub fn cost_per_request(mut self, cost: f64) -> Self {
        self.info.cost_per_request = Some(cost);
        self
    }

    pub fn build(self) -> ToolInfo {
        self.info
    }
}

impl Default for ToolInfoBuilder {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_name_to_id_and_dedups_capabilities() {
        let info = ToolInfo::builder("gemini")
            .capability(ToolCapability::TextGeneration)
            .capability(ToolCapability::TextGeneration)
            .rate_limit(60)
            .build();

        assert_eq!(info.name, "gemini");
        assert_eq!(info.capabilities, vec![ToolCapability::TextGeneration]);
        assert!(info.is_available());
        assert_eq!(info.rate_limit, Some(60));
    }

    #[test]
    fn status_and_capability_use_snake_case_on_the_wire() {
        let info = ToolInfo::builder("figma")
            .capability(ToolCapability::DesignAssistance)
            .status(ToolStatus::Unavailable)
            .build();
        let value = serde_json::to_value(&info).unwrap();

        assert_eq!(value["status"], "unavailable");
        assert_eq!(value["capabilities"][0], "design_assistance");
        assert!(value.get("rate_limit").is_none());
    }
}
