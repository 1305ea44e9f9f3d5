use crate::app::autonomy::AutonomyCli;
use crate::config::RunnerConfig;
use crate::core::parsing::parse_keys_file;
use crate::core::{BootstrapStep, KeyPair, StepContext, Storage};
use crate::utils::error::Result;
use std::sync::Arc;

pub const AGENT_KEYS_FILE: &str = "keys.json";
pub const OPERATOR_KEYS_FILE: &str = "operator_keys.json";
pub const OPERATOR_KEY_SCRATCH_FILE: &str = "pkey.txt";

/// 產生 operator 與 agent 金鑰，已存在的金鑰檔會被沿用
pub struct GenerateKeys {
    config: Arc<RunnerConfig>,
    storage: Arc<dyn Storage>,
    autonomy: AutonomyCli,
}

impl GenerateKeys {
    pub fn new(config: Arc<RunnerConfig>, storage: Arc<dyn Storage>, autonomy: AutonomyCli) -> Self {
        Self {
            config,
            storage,
            autonomy,
        }
    }

    async fn load_first_key(&self, path: &str) -> Result<KeyPair> {
        let content = self.storage.read_file(path).await?;
        let mut keys = parse_keys_file(&String::from_utf8_lossy(&content))?;
        Ok(keys.remove(0))
    }
}

#[async_trait::async_trait]
impl BootstrapStep for GenerateKeys {
    fn name(&self) -> &str {
        "generate-keys"
    }

    fn description(&self) -> &str {
        "Generate the operator and agent keys"
    }

    async fn run(&self, context: &mut StepContext) -> Result<()> {
        let agent_path = self.config.repo_file(AGENT_KEYS_FILE);
        let operator_path = self.config.repo_file(OPERATOR_KEYS_FILE);

        // generate-key 一律寫入 keys.json，所以 operator 要先產生再改名
        if self.storage.exists(&operator_path).await {
            tracing::info!("🔑 Reusing operator key from {}", operator_path);
        } else {
            self.autonomy.generate_key().await?;
            self.storage.rename(&agent_path, &operator_path).await?;
            tracing::info!("🔑 Generated operator key");
        }

        if self.storage.exists(&agent_path).await {
            tracing::info!("🔑 Reusing agent key from {}", agent_path);
        } else {
            self.autonomy.generate_key().await?;
            tracing::info!("🔑 Generated agent key");
        }

        let operator = self.load_first_key(&operator_path).await?;
        let agent = self.load_first_key(&agent_path).await?;

        let scratch = self.config.repo_file(OPERATOR_KEY_SCRATCH_FILE);
        self.storage
            .write_file(&scratch, operator.private_key.as_bytes())
            .await?;
        context.register_scratch_file(scratch);

        tracing::info!("👤 Operator address: {}", operator.address);
        tracing::info!("🤖 Agent address: {}", agent.address);

        context.operator = Some(operator);
        context.agent = Some(agent);
        Ok(())
    }
}
