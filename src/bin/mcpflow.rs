use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use mcpflow::utils::LoggingConfig;
use mcpflow::{JsonMap, McpServer, OrchestrationRequest, Settings, ToolRequest};
use serde::Serialize;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "mcpflow", version, about = "Multi-tool orchestration CLI", author)]
struct Cli {
    /// JSON settings file; the environment is used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Register the offline `echo` tool.
    #[arg(long, global = true)]
    echo: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered tools.
    Tools,
    /// List workflow templates.
    Templates,
    /// Probe every registered tool.
    Health,
    /// Run a single tool.
    Exec {
        tool: String,
        #[arg(long, default_value = "{}")]
        input: String,
        #[arg(long, default_value = "{}")]
        params: String,
        #[arg(long, default_value_t = 1)]
        priority: u8,
    },
    /// Fan a request out over several tools.
    Orchestrate {
        #[arg(long, value_delimiter = ',', required = true)]
        tools: Vec<String>,
        #[arg(long, default_value = "{}")]
        input: String,
        #[arg(long, default_value = "parallel")]
        strategy: String,
        #[arg(long, default_value_t = 3)]
        max_parallel: usize,
        #[arg(long, default_value_t = 300.0)]
        timeout: f64,
        #[arg(long, default_value = "{}")]
        context: String,
        #[arg(long, default_value = "cli")]
        workflow_id: String,
    },
    /// Run a workflow template.
    Template {
        id: String,
        #[arg(long, default_value = "{}")]
        input: String,
        #[arg(long, default_value = "{}")]
        context: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    LoggingConfig::init();

    let cli = Cli::parse();
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load settings from `{}`", path.display()))?,
        None => Settings::from_env()?,
    };
    settings.local_echo |= cli.echo;
    let server = McpServer::new(settings);

    match cli.command {
        Command::Tools => print_json(&server.list_tools())?,
        Command::Templates => print_json(&server.list_templates())?,
        Command::Health => print_json(&server.health_check().await)?,
        Command::Exec {
            tool,
            input,
            params,
            priority,
        } => {
            let request = ToolRequest::new(tool, parse_map("input", &input)?)
                .with_parameters(parse_map("params", &params)?)
                .with_priority(priority);
            print_json(&server.execute_tool(request).await?)?;
        }
        Command::Orchestrate {
            tools,
            input,
            strategy,
            max_parallel,
            timeout,
            context,
            workflow_id,
        } => {
            let mut request = OrchestrationRequest::new(workflow_id, tools)
                .with_input(parse_map("input", &input)?)
                .with_max_parallel(max_parallel)
                .with_context(parse_map("context", &context)?);
            request.strategy = strategy;
            request.timeout = timeout;
            print_json(&server.execute_orchestration(&request).await)?;
        }
        Command::Template { id, input, context } => {
            let response = server
                .execute_template(&id, parse_map("input", &input)?, parse_map("context", &context)?)
                .await?;
            print_json(&response)?;
        }
    }
    Ok(())
}

fn parse_map(flag: &str, raw: &str) -> anyhow::Result<JsonMap> {
    let value: Value =
        serde_json::from_str(raw).with_context(|| format!("--{flag} is not valid JSON"))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("--{flag} must be a JSON object"),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", to_json(value)?);
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_listing_renders_as_json() {
        let server = McpServer::new(Settings {
            local_echo: true,
            ..Settings::default()
        });

        let rendered = to_json(&server.list_tools()).unwrap();
        let parsed: Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(parsed[0]["id"], "echo");
        assert_eq!(parsed[0]["status"], "available");
    }

    #[test]
    fn object_flags_must_be_json_objects() {
        assert!(parse_map("input", r#"{"prompt": "hi"}"#).is_ok());
        assert!(parse_map("input", "[1, 2]").is_err());
        assert!(parse_map("input", "not json").is_err());
    }

    #[test]
    fn orchestrate_parses_comma_separated_tools() {
        let cli = Cli::parse_from(["mcpflow", "orchestrate", "--tools", "echo,gemini"]);
        match cli.command {
            Command::Orchestrate { tools, strategy, max_parallel, .. } => {
                assert_eq!(tools, vec!["echo", "gemini"]);
                assert_eq!(strategy, "parallel");
                assert_eq!(max_parallel, 3);
            }
            _ => panic!("expected orchestrate"),
        }
    }
}
