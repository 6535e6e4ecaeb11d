use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::request::{JsonMap, OrchestrationRequest, Strategy, PARAMETERS_KEY};

/// Named, reusable orchestration preset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkflowTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tools: Vec<String>,
    #[serde(default)]
    pub parameters: JsonMap,
    #[serde(default)]
    pub strategy: Strategy,
}

impl WorkflowTemplate {
    /// Builds the orchestration for this template.
    ///
    /// The template defaults are merged under the caller's context (caller wins).
    /// The same defaults also seed the context's `parameters` map so they reach
    /// the connectors as call knobs. Layering there, later wins: template
    /// defaults, caller context values for the same keys, caller `parameters`.
    pub fn instantiate(&self, input_data: JsonMap, context: JsonMap) -> OrchestrationRequest {
        let mut parameters = self.parameters.clone();
        for (key, value) in parameters.iter_mut() {
            if let Some(caller) = context.get(key) {
                *value = caller.clone();
            }
        }
        if let Some(caller) = context.get(PARAMETERS_KEY).and_then(Value::as_object) {
            parameters.extend(caller.clone());
        }

        let mut merged = self.parameters.clone();
        merged.extend(context);
        if !parameters.is_empty() {
            merged.insert(PARAMETERS_KEY.to_string(), Value::Object(parameters));
        }

        OrchestrationRequest::new(self.workflow_id_for(&input_data), self.tools.clone())
            .with_input(input_data)
            .with_strategy(self.strategy)
            .with_context(merged)
    }

    fn workflow_id_for(&self, input_data: &JsonMap) -> String {
        let mut hasher = DefaultHasher::new();
        Value::Object(input_data.clone()).to_string().hash(&mut hasher);
        format!("{}_{:x}", self.id, hasher.finish())
    }
}

/// Read-only after startup.
#[derive(Clone, Debug, Default)]
pub struct TemplateStore {
    templates: HashMap<String, WorkflowTemplate>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    pub fn with_builtin() -> Self {
        let mut store = Self::new();
        for template in builtin_templates() {
            store.register(template);
        }
        info!(count = store.templates.len(), "initialized workflow templates");
        store
    }

    pub fn register(&mut self, template: WorkflowTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn get(&self, id: &str) -> Option<&WorkflowTemplate> {
        self.templates.get(id)
    }

    pub fn list(&self) -> Vec<WorkflowTemplate> {
        let mut templates: Vec<_> = self.templates.values().cloned().collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn template(
    id: &str,
    name: &str,
    description: &str,
    tools: &[&str],
    parameters: Value,
    strategy: Strategy,
) -> WorkflowTemplate {
    WorkflowTemplate {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        tools: tools.iter().map(|t| t.to_string()).collect(),
        parameters: parameters.as_object().cloned().unwrap_or_default(),
        strategy,
    }
}

pub fn builtin_templates() -> Vec<WorkflowTemplate> {
    vec![
        template(
            "ideation_workflow",
            "AI Ideation Workflow",
            "Generate ideas using multiple AI tools",
            &["gemini", "openai"],
            json!({"temperature": 0.8, "max_tokens": 2048}),
            Strategy::Parallel,
        ),
        template(
            "design_workflow",
            "Design & Code Workflow",
            "Design with Figma and generate code",
            &["figma", "cursor", "github"],
            json!({"format": "png", "language": "typescript"}),
            Strategy::Hybrid,
        ),
        template(
            "code_review_workflow",
            "Code Review Workflow",
            "Review code using multiple AI tools",
            &["openai", "cursor", "github"],
            json!({"temperature": 0.3, "max_tokens": 1024}),
            Strategy::Sequential,
        ),
        template(
            "research_workflow",
            "Research Workflow",
            "Research topics using multiple sources",
            &["gemini", "openai", "github"],
            json!({"temperature": 0.7, "max_tokens": 4096}),
            Strategy::Parallel,
        ),
    ]
}
