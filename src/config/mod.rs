pub mod cli;
pub mod toml_config;

pub use cli::{CliConfig, LogFormat};
pub use toml_config::RunnerConfig;
