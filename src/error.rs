use thiserror::Error;

pub type Result<T> = std::result::Result<T, McpFlowError>;

#[derive(Debug, Error)]
pub enum McpFlowError {
    #[error("tool `{0}` not found")]
    ToolNotFound(String),
    #[error("tool `{0}` is not available")]
    ToolUnavailable(String),
    #[error("workflow template `{0}` not found")]
    TemplateNotFound(String),
    #[error("unavailable tools: {0:?}")]
    UnavailableTools(Vec<String>),
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
    #[error("invalid orchestration request: {0}")]
    InvalidRequest(String),
    #[error("invalid input data for tool `{0}`")]
    InvalidInput(String),
    #[error("{tool} request failed{}: {message}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
    Provider {
        tool: String,
        status: Option<u16>,
        message: String,
    },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl McpFlowError {
    pub fn provider(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            tool: tool.into(),
            status: None,
            message: message.into(),
        }
    }
}
