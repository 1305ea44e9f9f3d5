pub mod funding;
pub mod parsing;
pub mod sequence;

pub use crate::domain::model::{Address, KeyPair, ServiceId, ServiceInfo, ServiceState, Wei};
pub use crate::domain::ports::{ChainRpc, CommandOutput, CommandRunner, CommandSpec, Storage};
pub use crate::utils::error::Result;
pub use funding::FundingWaiter;
pub use sequence::{BootstrapStep, StepContext, StepResult, StepSequence};
