use async_trait::async_trait;
use serde_json::Value;

use crate::error::{McpFlowError, Result};
use crate::tools::{
    Connector, ConnectorCore, JsonMap, ProviderOutput, ToolCapability, ToolInfo, ToolRequest,
};

use super::http::{into_object, trim_base_url, HttpTransport};

pub const GITHUB_BASE_URL: &str = "https://api.github.com";

pub const GITHUB_ACTIONS: [&str; 4] = [
    "search_repositories",
    "get_repository",
    "get_file_contents",
    "get_issues",
];

/// GitHub allows 5000 requests per hour for an authenticated token.
const REQUESTS_PER_MINUTE: u32 = 5000 / 60;

/// GitHub REST API: repository search, metadata, contents and issues.
pub struct GitHubConnector {
    core: ConnectorCore,
    transport: HttpTransport,
    access_token: String,
    base_url: String,
}

impl GitHubConnector {
    pub fn new(
        access_token: impl Into<String>,
        base_url: Option<&str>,
        transport: HttpTransport,
    ) -> Self {
        let base_url = trim_base_url(base_url.unwrap_or(GITHUB_BASE_URL));
        let info = ToolInfo::builder("github")
            .name("GitHub")
            .description("GitHub code search and repository access")
            .capability(ToolCapability::CodeGeneration)
            .capability(ToolCapability::Search)
            .config("base_url", base_url.clone())
            .rate_limit(REQUESTS_PER_MINUTE)
            .cost_per_request(0.0)
            .build();
        Self {
            core: ConnectorCore::new(info),
            transport,
            access_token: access_token.into(),
            base_url,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.transport
            .client()
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("token {}", self.access_token))
            .header("Accept", "application/vnd.github.v3+json")
    }
}

fn repo_path(request: &ToolRequest) -> String {
    let owner = request.input_str("owner").unwrap_or_default();
    let repo = request.input_str("repo").unwrap_or_default();
    format!("/repos/{owner}/{repo}")
}

#[async_trait]
impl Connector for GitHubConnector {
    fn core(&self) -> &ConnectorCore {
        &self.core
    }

    fn validate_input(&self, input: &JsonMap) -> bool {
        input
            .get("action")
            .and_then(Value::as_str)
            .is_some_and(|action| GITHUB_ACTIONS.contains(&action))
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<ProviderOutput> {
        let action = request.input_str("action").unwrap_or("search_repositories");

        let http_request = match action {
            "search_repositories" => {
                let query = request.input_str("query").unwrap_or_default();
                self.get("/search/repositories").query(&[("q", query)])
            }
            "get_repository" => self.get(&repo_path(request)),
            "get_file_contents" => {
                let path = request.input_str("path").unwrap_or_default();
                self.get(&format!("{}/contents/{path}", repo_path(request)))
            }
            "get_issues" => self.get(&format!("{}/issues", repo_path(request))),
            other => {
                return Err(McpFlowError::provider(
                    self.id(),
                    format!("unsupported action: {other}"),
                ))
            }
        };

        let payload = self.transport.send_json(self.id(), http_request).await?;
        Ok(ProviderOutput::new(into_object(payload))
            .with_metadata("action", action)
            .with_metadata("provider", "github"))
    }

    async fn health_check(&self) -> bool {
        self.transport.probe(self.id(), self.get("/user")).await
    }
}
