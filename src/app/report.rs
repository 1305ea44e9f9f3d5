use crate::core::{ServiceId, StepContext, StepSequence, Storage};
use crate::utils::error::{RunnerError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

pub const SERVICE_ID_FILE: &str = "service_id.txt";
pub const RUN_REPORT_FILE: &str = "run_report.json";

/// 讀取先前 mint 的 service id
pub async fn load_service_id(storage: &dyn Storage, path: &str) -> Result<Option<ServiceId>> {
    if !storage.exists(path).await {
        return Ok(None);
    }

    let content = storage.read_file(path).await?;
    let raw = String::from_utf8_lossy(&content);
    raw.trim()
        .parse::<u64>()
        .map(|id| Some(ServiceId(id)))
        .map_err(|_| RunnerError::OutputParseError {
            source_name: path.to_string(),
            message: format!("'{}' is not a service id", raw.trim()),
        })
}

pub async fn save_service_id(storage: &dyn Storage, path: &str, service_id: ServiceId) -> Result<()> {
    storage
        .write_file(path, service_id.to_string().as_bytes())
        .await
}

/// Summary of a finished run. Never carries private keys.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub completed_at: DateTime<Utc>,
    pub agent_address: Option<String>,
    pub operator_address: Option<String>,
    pub service_id: Option<u64>,
    pub service_state: Option<String>,
    pub safe_address: Option<String>,
    pub balances: HashMap<String, serde_json::Value>,
    pub summary: HashMap<String, serde_json::Value>,
}

impl RunReport {
    pub fn from_context(context: &StepContext) -> Self {
        let balances = context
            .shared_data()
            .iter()
            .filter(|(key, _)| key.ends_with("_balance_wei"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            run_id: context.run_id.clone(),
            completed_at: Utc::now(),
            agent_address: context.agent.as_ref().map(|k| k.address.to_string()),
            operator_address: context.operator.as_ref().map(|k| k.address.to_string()),
            service_id: context.service_id.map(|id| id.0),
            service_state: context.service_state.as_ref().map(|s| s.to_string()),
            safe_address: context.safe_address.as_ref().map(|a| a.to_string()),
            balances,
            summary: StepSequence::execution_summary(&context.results),
        }
    }

    pub async fn write(&self, storage: &dyn Storage, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        storage.write_file(path, json.as_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LocalStorage;
    use crate::core::{Address, KeyPair, ServiceState, StepResult};
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_service_id_round_trip_and_missing() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        assert_eq!(
            load_service_id(&storage, ".trader_runner/service_id.txt").await.unwrap(),
            None
        );

        save_service_id(&storage, ".trader_runner/service_id.txt", ServiceId(42))
            .await
            .unwrap();
        assert_eq!(
            load_service_id(&storage, ".trader_runner/service_id.txt").await.unwrap(),
            Some(ServiceId(42))
        );
    }

    #[tokio::test]
    async fn test_corrupt_service_id_is_an_error() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.write_file("service_id.txt", b"abc").await.unwrap();

        assert!(load_service_id(&storage, "service_id.txt").await.is_err());
    }

    #[tokio::test]
    async fn test_report_excludes_private_keys() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        let mut context = StepContext::new("run_test".to_string());
        context.operator = Some(KeyPair {
            address: Address::parse("0x2000000000000000000000000000000000000002").unwrap(),
            private_key: "0xsupersecret".to_string(),
        });
        context.service_id = Some(ServiceId(5));
        context.service_state = Some(ServiceState::Deployed);
        context.add_shared_data("safe_balance_wei", serde_json::json!("1"));
        context.results.push(StepResult {
            step_name: "mint-service".to_string(),
            duration: Duration::from_millis(10),
        });

        let report = RunReport::from_context(&context);
        report.write(&storage, "run_report.json").await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("run_report.json")).unwrap();
        assert!(!written.contains("supersecret"));

        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed["service_id"], 5);
        assert_eq!(parsed["service_state"], "DEPLOYED");
        assert_eq!(parsed["balances"]["safe_balance_wei"], "1");
        assert_eq!(parsed["summary"]["total_steps"], 1);
    }
}
