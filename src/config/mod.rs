pub mod env;
pub mod settings;

pub use env::EnvConfig;
pub use settings::{HttpSettings, Provider, ProviderSettings, Settings};
