use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::request::{JsonMap, ToolResponse};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolBreakdown {
    pub success: bool,
    pub output: JsonMap,
    pub execution_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Best-effort merge of the textual fields of successful outputs.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CombinedOutput {
    /// `text` fields, newline-joined in dispatch order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// `completion` fields, newline-joined in dispatch order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregatedOutput {
    pub total_tools: usize,
    pub successful_tools: usize,
    pub failed_tools: usize,
    pub results_by_tool: BTreeMap<String, ToolBreakdown>,
    pub combined_output: CombinedOutput,
    /// `"<tool_id>: <error>"` for every failed tool.
    pub errors: Vec<String>,
}

pub fn aggregate(results: &[ToolResponse]) -> AggregatedOutput {
    let mut aggregated = AggregatedOutput {
        total_tools: results.len(),
        ..AggregatedOutput::default()
    };
    let mut texts = Vec::new();
    let mut completions = Vec::new();

    for result in results {
        aggregated.results_by_tool.insert(
            result.tool_id.clone(),
            ToolBreakdown {
                success: result.success,
                output: result.output_data.clone(),
                execution_time: result.execution_time,
                cost: result.cost,
                error: result.error_message.clone(),
            },
        );

        if result.success {
            aggregated.successful_tools += 1;
            if let Some(text) = result.output_data.get("text").and_then(Value::as_str) {
                texts.push(text);
            }
            if let Some(code) = result.output_data.get("completion").and_then(Value::as_str) {
                completions.push(code);
            }
        } else {
            aggregated.failed_tools += 1;
            let error = result.error_message.as_deref().unwrap_or("unknown error");
            aggregated.errors.push(format!("{}: {}", result.tool_id, error));
        }
    }

    if !texts.is_empty() {
        aggregated.combined_output.text = Some(texts.join("\n"));
    }
    if !completions.is_empty() {
        aggregated.combined_output.code = Some(completions.join("\n"));
    }
    aggregated
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output(value: serde_json::Value) -> JsonMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn combines_text_and_completion_in_dispatch_order() {
        let results = vec![
            ToolResponse::success("gemini", output(json!({"text": "first"})), 0.1),
            ToolResponse::success("github", output(json!({"items": []})), 0.2),
            ToolResponse::success("cursor", output(json!({"completion": "fn main() {}"})), 0.1),
            ToolResponse::success("openai", output(json!({"text": "second"})), 0.3),
        ];

        let aggregated = aggregate(&results);

        assert_eq!(aggregated.combined_output.text.as_deref(), Some("first\nsecond"));
        assert_eq!(aggregated.combined_output.code.as_deref(), Some("fn main() {}"));
        assert_eq!(aggregated.successful_tools, 4);
        assert!(aggregated.errors.is_empty());
    }

    #[test]
    fn failed_tools_are_counted_and_listed_but_not_combined() {
        let mut failed = ToolResponse::failure("openai", "status 500", 1.0, "provider");
        failed.output_data = output(json!({"text": "partial"}));
        let results = vec![
            failed,
            ToolResponse::success("gemini", output(json!({"text": "ok"})), 0.1),
        ];

        let aggregated = aggregate(&results);

        assert_eq!(aggregated.total_tools, 2);
        assert_eq!(aggregated.failed_tools, 1);
        assert_eq!(aggregated.errors, vec!["openai: status 500".to_string()]);
        assert_eq!(aggregated.combined_output.text.as_deref(), Some("ok"));
        assert_eq!(
            aggregated.results_by_tool["openai"].error.as_deref(),
            Some("status 500")
        );
    }

    #[test]
    fn empty_combined_output_serializes_as_empty_object() {
        let aggregated = aggregate(&[]);
        let value = serde_json::to_value(&aggregated).unwrap();
        assert_eq!(value["combined_output"], json!({}));
    }
}
