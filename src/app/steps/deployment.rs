use crate::app::autonomy::AutonomyCli;
use crate::app::environment::AgentEnvironment;
use crate::app::steps::keys::AGENT_KEYS_FILE;
use crate::config::RunnerConfig;
use crate::core::{BootstrapStep, StepContext, Storage};
use crate::utils::error::Result;
use std::sync::Arc;

/// 建置並啟動容器化部署
pub struct RunDeployment {
    config: Arc<RunnerConfig>,
    storage: Arc<dyn Storage>,
    autonomy: AutonomyCli,
    rpc_url: String,
}

impl RunDeployment {
    pub fn new(
        config: Arc<RunnerConfig>,
        storage: Arc<dyn Storage>,
        autonomy: AutonomyCli,
        rpc_url: String,
    ) -> Self {
        Self {
            config,
            storage,
            autonomy,
            rpc_url,
        }
    }
}

#[async_trait::async_trait]
impl BootstrapStep for RunDeployment {
    fn name(&self) -> &str {
        "run-deployment"
    }

    fn description(&self) -> &str {
        "Build and run the agent deployment"
    }

    async fn run(&self, context: &mut StepContext) -> Result<()> {
        let agent = context.require_agent()?;
        let safe = context.require_safe()?;
        let env = AgentEnvironment::agent(&self.config, &self.rpc_url, &agent.address, safe)?;
        tracing::debug!("Agent environment has {} variables", env.len());

        let service = &self.config.service;
        let service_dir = self.config.service_dir_rel();
        let build_dir = self.config.build_dir_rel();
        let autonomy = self.autonomy.in_dir(&service.alias).with_env(env.vars());

        if self.storage.exists(&build_dir).await {
            tracing::info!("🧹 Detected an existing build, removing {}", build_dir);
            self.storage.remove(&build_dir).await?;
        } else {
            tracing::info!("🛠️ Setting up the service...");
            if !self.storage.exists(&service_dir).await {
                self.autonomy
                    .with_env(env.vars())
                    .fetch_service(&service.package, &service.alias)
                    .await?;
            }
            autonomy.build_image().await?;
            self.storage
                .copy(
                    &self.config.repo_file(AGENT_KEYS_FILE),
                    &format!("{}/{}", service_dir, AGENT_KEYS_FILE),
                )
                .await?;
        }

        autonomy.deploy_build(service.n_agents).await?;
        autonomy.deploy_run(&service.build_dir).await?;

        tracing::info!("🚀 Deployment {} is running", service.alias);
        Ok(())
    }
}
