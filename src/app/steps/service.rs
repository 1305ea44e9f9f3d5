use crate::app::autonomy::{AutonomyCli, ServiceAction};
use crate::app::report::{load_service_id, save_service_id, SERVICE_ID_FILE};
use crate::app::steps::keys::OPERATOR_KEY_SCRATCH_FILE;
use crate::config::RunnerConfig;
use crate::core::parsing::parse_service_id;
use crate::core::{BootstrapStep, ServiceState, StepContext, Storage};
use crate::utils::error::{RunnerError, Result};
use std::sync::Arc;

/// 在 registry 上 mint 服務；已有 service id 時沿用
pub struct MintService {
    config: Arc<RunnerConfig>,
    storage: Arc<dyn Storage>,
    autonomy: AutonomyCli,
}

impl MintService {
    pub fn new(config: Arc<RunnerConfig>, storage: Arc<dyn Storage>, autonomy: AutonomyCli) -> Self {
        Self {
            config,
            storage,
            autonomy,
        }
    }
}

#[async_trait::async_trait]
impl BootstrapStep for MintService {
    fn name(&self) -> &str {
        "mint-service"
    }

    fn description(&self) -> &str {
        "Mint the service on the registry"
    }

    async fn run(&self, context: &mut StepContext) -> Result<()> {
        let id_path = self.config.store_file(SERVICE_ID_FILE);

        if let Some(service_id) = load_service_id(self.storage.as_ref(), &id_path).await? {
            tracing::info!("🪪 Reusing service id {} from {}", service_id, id_path);
            context.service_id = Some(service_id);
            return Ok(());
        }

        let service = &self.config.service;
        let output = self
            .autonomy
            .mint(
                &service.package_path,
                OPERATOR_KEY_SCRATCH_FILE,
                &service.nft,
                service.agent_id,
                service.n_agents,
                service.cost_of_bonding,
            )
            .await?;

        if !output.success() {
            return Err(RunnerError::MintFailed {
                output: format!("{}{}", output.stdout, output.stderr),
            });
        }

        let service_id = parse_service_id(&output.stdout)?;
        save_service_id(self.storage.as_ref(), &id_path, service_id).await?;

        tracing::info!("🪪 Minted service {}", service_id);
        context.service_id = Some(service_id);
        Ok(())
    }
}

/// activate / register / deploy，依目前鏈上狀態決定是否需要執行
pub struct ServiceLifecycleStep {
    action: ServiceAction,
    config: Arc<RunnerConfig>,
    storage: Arc<dyn Storage>,
    autonomy: AutonomyCli,
}

impl ServiceLifecycleStep {
    pub fn new(
        action: ServiceAction,
        config: Arc<RunnerConfig>,
        storage: Arc<dyn Storage>,
        autonomy: AutonomyCli,
    ) -> Self {
        Self {
            action,
            config,
            storage,
            autonomy,
        }
    }

    fn expected_state(&self) -> ServiceState {
        match self.action {
            ServiceAction::Activate => ServiceState::PreRegistration,
            ServiceAction::Register => ServiceState::ActiveRegistration,
            ServiceAction::Deploy => ServiceState::FinishedRegistration,
        }
    }
}

/// Position in the registry lifecycle; `None` for states a run cannot move forward from.
fn lifecycle_rank(state: &ServiceState) -> Option<u8> {
    match state {
        ServiceState::PreRegistration => Some(1),
        ServiceState::ActiveRegistration => Some(2),
        ServiceState::FinishedRegistration => Some(3),
        ServiceState::Deployed => Some(4),
        _ => None,
    }
}

#[async_trait::async_trait]
impl BootstrapStep for ServiceLifecycleStep {
    fn name(&self) -> &str {
        match self.action {
            ServiceAction::Activate => "activate-service",
            ServiceAction::Register => "register-agents",
            ServiceAction::Deploy => "deploy-service",
        }
    }

    fn description(&self) -> &str {
        match self.action {
            ServiceAction::Activate => "Activate service registration",
            ServiceAction::Register => "Register the agent instance",
            ServiceAction::Deploy => "Deploy the service multisig",
        }
    }

    async fn run(&self, context: &mut StepContext) -> Result<()> {
        let service_id = context.require_service_id()?;
        let info = self.autonomy.service_info(service_id).await?;
        let expected = self.expected_state();

        if info.state == expected {
            let agent = match self.action {
                ServiceAction::Register => {
                    Some((self.config.service.agent_id, &context.require_agent()?.address))
                }
                _ => None,
            };
            self.autonomy
                .service_action(self.action, service_id, OPERATOR_KEY_SCRATCH_FILE, agent)
                .await?;
            tracing::info!("⛓️ Service {}: {} done", service_id, self.action);
        } else {
            match (lifecycle_rank(&info.state), lifecycle_rank(&expected)) {
                (Some(current), Some(wanted)) if current > wanted => {
                    tracing::info!(
                        "⏭️ Service {} is already {}, no {} needed",
                        service_id,
                        info.state,
                        self.action
                    );
                }
                _ => {
                    return Err(RunnerError::UnexpectedServiceState {
                        expected: expected.to_string(),
                        actual: info.state.to_string(),
                    });
                }
            }
        }

        if self.action == ServiceAction::Deploy {
            // operator 私鑰不再需要
            self.storage
                .remove(&self.config.repo_file(OPERATOR_KEY_SCRATCH_FILE))
                .await?;
        }

        context.service_state = Some(info.state);
        Ok(())
    }
}

/// 確認服務為 DEPLOYED 並取得 safe 地址
pub struct VerifyDeployment {
    autonomy: AutonomyCli,
}

impl VerifyDeployment {
    pub fn new(autonomy: AutonomyCli) -> Self {
        Self { autonomy }
    }
}

#[async_trait::async_trait]
impl BootstrapStep for VerifyDeployment {
    fn name(&self) -> &str {
        "verify-deployment"
    }

    fn description(&self) -> &str {
        "Verify the on-chain deployment and read the safe address"
    }

    async fn run(&self, context: &mut StepContext) -> Result<()> {
        let service_id = context.require_service_id()?;
        let info = self.autonomy.service_info(service_id).await?;

        if info.state != ServiceState::Deployed {
            return Err(RunnerError::UnexpectedServiceState {
                expected: ServiceState::Deployed.to_string(),
                actual: info.state.to_string(),
            });
        }

        let safe = info
            .multisig_address
            .ok_or_else(|| RunnerError::OutputParseError {
                source_name: "service info".to_string(),
                message: "deployed service has no multisig address".to_string(),
            })?;

        tracing::info!("🔐 Service {} safe: {}", service_id, safe);
        context.service_state = Some(info.state);
        context.safe_address = Some(safe);
        Ok(())
    }
}
