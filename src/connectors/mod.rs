pub mod cursor;
pub mod echo;
pub mod factory;
pub mod figma;
pub mod gemini;
pub mod github;
pub mod http;
pub mod openai;

pub use cursor::CursorConnector;
pub use echo::EchoConnector;
pub use factory::{
    register_builtin_connector_factories, ConnectorFactory, ConnectorFactoryRegistry,
    ConnectorSpec,
};
pub use figma::FigmaConnector;
pub use gemini::GeminiConnector;
pub use github::GitHubConnector;
pub use http::HttpTransport;
pub use openai::OpenAiConnector;
