use crate::domain::model::{Address, KeyPair, ServiceId, ServiceState};
use crate::domain::ports::Storage;
use crate::utils::error::{RunnerError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 單一步驟的執行結果
#[derive(Debug, Clone)]
pub struct StepResult {
    pub step_name: String,
    pub duration: Duration,
}

/// 步驟之間傳遞的執行上下文
#[derive(Debug, Clone)]
pub struct StepContext {
    pub run_id: String,
    pub agent: Option<KeyPair>,
    pub operator: Option<KeyPair>,
    pub service_id: Option<ServiceId>,
    pub service_state: Option<ServiceState>,
    pub safe_address: Option<Address>,
    pub results: Vec<StepResult>,
    shared_data: HashMap<String, serde_json::Value>,
    scratch_files: Vec<String>,
}

impl StepContext {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            agent: None,
            operator: None,
            service_id: None,
            service_state: None,
            safe_address: None,
            results: Vec::new(),
            shared_data: HashMap::new(),
            scratch_files: Vec::new(),
        }
    }

    pub fn require_agent(&self) -> Result<&KeyPair> {
        self.agent.as_ref().ok_or_else(|| missing("agent key"))
    }

    pub fn require_operator(&self) -> Result<&KeyPair> {
        self.operator.as_ref().ok_or_else(|| missing("operator key"))
    }

    pub fn require_service_id(&self) -> Result<ServiceId> {
        self.service_id.ok_or_else(|| missing("service id"))
    }

    pub fn require_safe(&self) -> Result<&Address> {
        self.safe_address.as_ref().ok_or_else(|| missing("safe address"))
    }

    /// 登記暫存檔，序列結束時一律刪除
    pub fn register_scratch_file(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.scratch_files.contains(&path) {
            self.scratch_files.push(path);
        }
    }

    pub fn scratch_files(&self) -> &[String] {
        &self.scratch_files
    }

    pub fn add_shared_data(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.shared_data.insert(key.into(), value);
    }

    pub fn shared_data(&self) -> &HashMap<String, serde_json::Value> {
        &self.shared_data
    }
}

fn missing(what: &str) -> RunnerError {
    RunnerError::StepInputError {
        message: format!("{} is not available; an earlier step was skipped or failed", what),
    }
}

#[async_trait::async_trait]
pub trait BootstrapStep: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// 根據上下文決定是否執行
    fn should_execute(&self, _context: &StepContext) -> bool {
        true
    }

    async fn run(&self, context: &mut StepContext) -> Result<()>;
}

/// 依序執行部署步驟
pub struct StepSequence {
    steps: Vec<Box<dyn BootstrapStep>>,
    storage: Arc<dyn Storage>,
    run_id: String,
}

impl StepSequence {
    pub fn new(run_id: String, storage: Arc<dyn Storage>) -> Self {
        Self {
            steps: Vec::new(),
            storage,
            run_id,
        }
    }

    pub fn add_step(&mut self, step: Box<dyn BootstrapStep>) {
        self.steps.push(step);
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn describe(&self) -> Vec<(&str, &str)> {
        self.steps.iter().map(|s| (s.name(), s.description())).collect()
    }

    /// Keeps steps named in `only` (all when empty) minus those named in `skip`.
    pub fn filter(&mut self, only: &[String], skip: &[String]) {
        self.steps.retain(|step| {
            let name = step.name().to_string();
            (only.is_empty() || only.contains(&name)) && !skip.contains(&name)
        });
    }

    pub async fn execute_all(&self) -> Result<StepContext> {
        let mut context = StepContext::new(self.run_id.clone());
        let outcome = self.execute_steps(&mut context).await;

        self.cleanup_scratch_files(&context).await;

        outcome.map(|_| context)
    }

    async fn execute_steps(&self, context: &mut StepContext) -> Result<()> {
        let total = self.steps.len();

        for (index, step) in self.steps.iter().enumerate() {
            if !step.should_execute(context) {
                tracing::info!("⏭️ Skipping step: {} (condition not met)", step.name());
                continue;
            }

            tracing::info!("▶️ [{}/{}] {}", index + 1, total, step.description());
            let start_time = Instant::now();

            if let Err(e) = step.run(context).await {
                tracing::error!("❌ Step '{}' failed: {}", step.name(), e);
                return Err(e);
            }

            let result = StepResult {
                step_name: step.name().to_string(),
                duration: start_time.elapsed(),
            };
            tracing::info!("✅ Step completed: {} ({:?})", result.step_name, result.duration);
            context.results.push(result);
        }

        Ok(())
    }

    async fn cleanup_scratch_files(&self, context: &StepContext) {
        for path in context.scratch_files() {
            if !self.storage.exists(path).await {
                continue;
            }
            match self.storage.remove(path).await {
                Ok(()) => tracing::debug!("🧹 Removed scratch file {}", path),
                Err(e) => tracing::warn!("⚠️ Could not remove scratch file {}: {}", path, e),
            }
        }
    }

    /// 獲取執行摘要
    pub fn execution_summary(results: &[StepResult]) -> HashMap<String, serde_json::Value> {
        let mut summary = HashMap::new();

        let total_duration: Duration = results.iter().map(|r| r.duration).sum();

        summary.insert("total_steps".to_string(), serde_json::Value::Number(results.len().into()));
        summary.insert(
            "total_duration_ms".to_string(),
            serde_json::Value::Number((total_duration.as_millis() as u64).into()),
        );

        let step_names: Vec<serde_json::Value> = results
            .iter()
            .map(|r| serde_json::Value::String(r.step_name.clone()))
            .collect();
        summary.insert("executed_steps".to_string(), serde_json::Value::Array(step_names));

        summary
    }
}
