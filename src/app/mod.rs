pub mod autonomy;
pub mod environment;
pub mod report;
pub mod steps;

pub use autonomy::{AutonomyCli, ServiceAction};
pub use environment::AgentEnvironment;
pub use report::RunReport;
pub use steps::{build_bootstrap_sequence, Backends};
