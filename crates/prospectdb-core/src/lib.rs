use thiserror::Error;

mod app_config;
mod config;
pub mod knowledge;
pub mod prospect;
pub mod scoring;
pub mod template;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
