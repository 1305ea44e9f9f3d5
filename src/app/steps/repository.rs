use crate::app::autonomy::AutonomyCli;
use crate::config::RunnerConfig;
use crate::core::{BootstrapStep, CommandRunner, CommandSpec, StepContext, Storage};
use crate::utils::error::{RunnerError, Result};
use std::sync::Arc;

/// Clones the service repository at the pinned tag (or reuses it) and installs it.
pub struct PrepareRepository {
    config: Arc<RunnerConfig>,
    runner: Arc<dyn CommandRunner>,
    storage: Arc<dyn Storage>,
    autonomy: AutonomyCli,
}

impl PrepareRepository {
    pub fn new(
        config: Arc<RunnerConfig>,
        runner: Arc<dyn CommandRunner>,
        storage: Arc<dyn Storage>,
        autonomy: AutonomyCli,
    ) -> Self {
        Self {
            config,
            runner,
            storage,
            autonomy,
        }
    }

    async fn ensure_git_work_tree(&self) -> Result<()> {
        let spec = CommandSpec::new("git")
            .args(["rev-parse", "--is-inside-work-tree"])
            .current_dir(self.config.repo_dir());

        let output = self.runner.run(&spec).await?;

        if output.success() && output.stdout.trim() == "true" {
            Ok(())
        } else {
            Err(RunnerError::NotAGitRepository {
                path: self.config.repo_dir().display().to_string(),
            })
        }
    }
}

#[async_trait::async_trait]
impl BootstrapStep for PrepareRepository {
    fn name(&self) -> &str {
        "prepare-repository"
    }

    fn description(&self) -> &str {
        "Clone and install the service repository"
    }

    async fn run(&self, _context: &mut StepContext) -> Result<()> {
        let service = &self.config.service;

        if self.storage.exists(&service.directory).await {
            tracing::info!("📂 Detected an existing {} repo. Using this one...", service.directory);
        } else {
            tracing::info!("📥 Cloning {} at {}...", service.repository, service.version);
            let clone = CommandSpec::new("git")
                .args([
                    "clone",
                    "--depth",
                    "1",
                    "--branch",
                    service.version.as_str(),
                    service.repository.as_str(),
                    service.directory.as_str(),
                ])
                .current_dir(self.config.working_directory())
                .inherit_output();
            self.runner.run_checked(&clone).await?;
        }

        self.ensure_git_work_tree().await?;

        let install = CommandSpec::new("poetry")
            .arg("install")
            .current_dir(self.config.repo_dir())
            .inherit_output();
        self.runner.run_checked(&install).await?;

        self.autonomy.packages_sync().await
    }
}
