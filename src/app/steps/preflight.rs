use crate::core::{BootstrapStep, ChainRpc, CommandRunner, CommandSpec, StepContext};
use crate::utils::error::{RunnerError, Result};
use std::sync::Arc;

/// 確認外部 CLI 已安裝
pub struct CheckDependencies {
    runner: Arc<dyn CommandRunner>,
    programs: Vec<String>,
}

impl CheckDependencies {
    pub fn new(runner: Arc<dyn CommandRunner>, programs: Vec<String>) -> Self {
        Self { runner, programs }
    }
}

#[async_trait::async_trait]
impl BootstrapStep for CheckDependencies {
    fn name(&self) -> &str {
        "check-dependencies"
    }

    fn description(&self) -> &str {
        "Check that required programs are installed"
    }

    async fn run(&self, _context: &mut StepContext) -> Result<()> {
        for program in &self.programs {
            let spec = CommandSpec::new(program.clone()).arg("--version");
            match self.runner.run(&spec).await {
                Ok(output) if output.success() => {
                    tracing::debug!("{} found: {}", program, output.stdout.trim());
                }
                Ok(_) | Err(RunnerError::CommandNotFound { .. }) => {
                    return Err(RunnerError::MissingDependency {
                        program: program.clone(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// 探測 RPC 是否支援 eth_newFilter
pub struct ProbeRpc {
    rpc: Arc<dyn ChainRpc>,
}

impl ProbeRpc {
    pub fn new(rpc: Arc<dyn ChainRpc>) -> Self {
        Self { rpc }
    }
}

#[async_trait::async_trait]
impl BootstrapStep for ProbeRpc {
    fn name(&self) -> &str {
        "probe-rpc"
    }

    fn description(&self) -> &str {
        "Check that the RPC endpoint supports eth_newFilter"
    }

    async fn run(&self, _context: &mut StepContext) -> Result<()> {
        if self.rpc.supports_filters().await? {
            tracing::info!("🔌 RPC {} supports filters", self.rpc.endpoint());
            Ok(())
        } else {
            Err(RunnerError::RpcUnsupported {
                endpoint: self.rpc.endpoint().to_string(),
                reason: "the eth_newFilter probe did not return the expected error".to_string(),
            })
        }
    }
}
