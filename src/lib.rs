pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{JsonRpcClient, LocalStorage, SystemCommandRunner};
pub use app::{build_bootstrap_sequence, Backends, RunReport};
pub use config::{CliConfig, RunnerConfig};
pub use core::{FundingWaiter, StepSequence};
pub use utils::error::{Result, RunnerError};
