pub mod deployment;
pub mod funding;
pub mod keys;
pub mod preflight;
pub mod repository;
pub mod service;

use crate::app::autonomy::{AutonomyCli, ServiceAction};
use crate::app::environment::AgentEnvironment;
use crate::config::RunnerConfig;
use crate::core::{ChainRpc, CommandRunner, FundingWaiter, StepSequence, Storage};
use crate::utils::error::Result;
use std::sync::Arc;

pub use deployment::RunDeployment;
pub use funding::{AwaitFunding, FundingTarget};
pub use keys::GenerateKeys;
pub use preflight::{CheckDependencies, ProbeRpc};
pub use repository::PrepareRepository;
pub use service::{MintService, ServiceLifecycleStep, VerifyDeployment};

/// 步驟共用的外部系統介面
#[derive(Clone)]
pub struct Backends {
    pub rpc: Arc<dyn ChainRpc>,
    pub runner: Arc<dyn CommandRunner>,
    /// Rooted at the runner's working directory.
    pub storage: Arc<dyn Storage>,
}

/// Assembles the full bootstrap sequence in execution order.
pub fn build_bootstrap_sequence(
    config: Arc<RunnerConfig>,
    backends: Backends,
    run_id: String,
) -> Result<StepSequence> {
    let rpc_url = config.rpc_url()?.to_string();
    let chain_env = AgentEnvironment::chain(&config, &rpc_url);
    let autonomy = AutonomyCli::new(
        backends.runner.clone(),
        config.repo_dir(),
        chain_env.vars().to_vec(),
    );

    let waiter = || {
        FundingWaiter::new(backends.rpc.clone(), config.poll_interval())
            .with_timeout(config.funding_timeout())
    };

    let mut sequence = StepSequence::new(run_id, backends.storage.clone());

    sequence.add_step(Box::new(CheckDependencies::new(
        backends.runner.clone(),
        vec!["git".to_string(), "poetry".to_string()],
    )));
    sequence.add_step(Box::new(ProbeRpc::new(backends.rpc.clone())));
    sequence.add_step(Box::new(PrepareRepository::new(
        config.clone(),
        backends.runner.clone(),
        backends.storage.clone(),
        autonomy.clone(),
    )));
    sequence.add_step(Box::new(GenerateKeys::new(
        config.clone(),
        backends.storage.clone(),
        autonomy.clone(),
    )));
    sequence.add_step(Box::new(AwaitFunding::new(
        FundingTarget::AgentAndOperator,
        waiter(),
        config.funding_threshold(),
    )));
    sequence.add_step(Box::new(MintService::new(
        config.clone(),
        backends.storage.clone(),
        autonomy.clone(),
    )));
    for action in [ServiceAction::Activate, ServiceAction::Register, ServiceAction::Deploy] {
        sequence.add_step(Box::new(ServiceLifecycleStep::new(
            action,
            config.clone(),
            backends.storage.clone(),
            autonomy.clone(),
        )));
    }
    sequence.add_step(Box::new(VerifyDeployment::new(autonomy.clone())));
    sequence.add_step(Box::new(AwaitFunding::new(
        FundingTarget::Safe,
        waiter(),
        config.safe_funding_threshold(),
    )));
    sequence.add_step(Box::new(RunDeployment::new(
        config.clone(),
        backends.storage.clone(),
        autonomy,
        rpc_url,
    )));

    Ok(sequence)
}
