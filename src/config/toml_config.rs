use crate::domain::model::Wei;
use crate::utils::error::{RunnerError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PROMPT_TEMPLATE: &str = "With the given question \"@{question}\" and the `yes` option represented by `@{yes}` and the `no` option represented by `@{no}`, what are the respective probabilities of `p_yes` and `p_no` occurring?";

/// 部署設定。所有欄位皆有預設值，設定檔可省略
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub runner: RunnerSection,
    pub service: ServiceConfig,
    pub chain: ChainConfig,
    pub funding: FundingConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSection {
    pub working_directory: String,
    pub store_directory: String,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            working_directory: ".".to_string(),
            store_directory: ".trader_runner".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub repository: String,
    pub version: String,
    pub directory: String,
    pub package: String,
    pub package_path: String,
    pub nft: String,
    pub agent_id: u64,
    pub n_agents: u64,
    pub cost_of_bonding: u64,
    pub alias: String,
    pub build_dir: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            repository: "https://github.com/valory-xyz/trader.git".to_string(),
            version: "v0.1.0".to_string(),
            directory: "trader".to_string(),
            package: "valory/trader".to_string(),
            package_path: "packages/valory/services/trader/".to_string(),
            nft: "bafybeig64atqaladigoc3ds4arltdu63wkdrk3gesjfvnfdmz35amv7faq".to_string(),
            agent_id: 12,
            n_agents: 1,
            cost_of_bonding: 10_000_000_000_000_000,
            alias: "trader_service".to_string(),
            build_dir: "abci_build".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub rpc_url: Option<String>,
    pub chain_id: u64,
    pub service_manager_address: String,
    pub service_registry_address: String,
    pub gnosis_safe_multisig_address: String,
    /// eth_newFilter 探測時預期的錯誤訊息
    pub filter_probe_error: String,
    pub request_timeout_seconds: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            chain_id: 100,
            service_manager_address: "0xE3607b00E75f6405248323A9417ff6b39B244b50".to_string(),
            service_registry_address: "0x9338b5153AE39BB89f50468E608eD9d764B755fD".to_string(),
            gnosis_safe_multisig_address: "0x3C1fF68f5aa342D296d4DEe4Bb1cACCA912D95fE"
                .to_string(),
            filter_probe_error: "Invalid params".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FundingConfig {
    pub threshold_wei: Wei,
    pub safe_threshold_wei: Wei,
    pub poll_interval_seconds: u64,
    pub timeout_seconds: Option<u64>,
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            threshold_wei: Wei(500_000_000_000_000_000),
            safe_threshold_wei: Wei(500_000_000_000_000_000),
            poll_interval_seconds: 5,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub omen_creators: Vec<String>,
    pub bet_threshold: u64,
    /// 依機率十分位 (000, 010, ..., 100) 的下注金額
    pub bet_amount_per_threshold: Vec<u64>,
    pub prompt_template: String,
    pub extra_environment: BTreeMap<String, String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            omen_creators: vec!["0x89c5cc945dd550BcFfb72Fe42BfF002429F46Fec".to_string()],
            bet_threshold: 5_000_000_000_000_000,
            bet_amount_per_threshold: vec![
                0,
                0,
                0,
                0,
                0,
                0,
                30_000_000_000_000_000,
                40_000_000_000_000_000,
                60_000_000_000_000_000,
                80_000_000_000_000_000,
                100_000_000_000_000_000,
            ],
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            extra_environment: BTreeMap::new(),
        }
    }
}

impl RunnerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RunnerError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RunnerError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GNOSIS_RPC})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RunnerError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(rpc_url) = &self.chain.rpc_url {
            validation::validate_url("chain.rpc_url", rpc_url)?;
        }
        validation::validate_url("service.repository", &self.service.repository)?;

        validation::validate_path("runner.working_directory", &self.runner.working_directory)?;
        validation::validate_path("runner.store_directory", &self.runner.store_directory)?;
        validation::validate_path("service.directory", &self.service.directory)?;
        validation::validate_path("service.alias", &self.service.alias)?;
        validation::validate_path("service.build_dir", &self.service.build_dir)?;

        validation::validate_non_empty_string("service.version", &self.service.version)?;
        validation::validate_non_empty_string("service.package", &self.service.package)?;
        validation::validate_non_empty_string("service.package_path", &self.service.package_path)?;
        validation::validate_non_empty_string("service.nft", &self.service.nft)?;
        validation::validate_non_empty_string(
            "chain.filter_probe_error",
            &self.chain.filter_probe_error,
        )?;

        validation::validate_positive_number("service.n_agents", self.service.n_agents, 1)?;
        validation::validate_positive_number(
            "funding.poll_interval_seconds",
            self.funding.poll_interval_seconds,
            1,
        )?;
        validation::validate_positive_number(
            "chain.request_timeout_seconds",
            self.chain.request_timeout_seconds,
            1,
        )?;

        validation::validate_address(
            "chain.service_manager_address",
            &self.chain.service_manager_address,
        )?;
        validation::validate_address(
            "chain.service_registry_address",
            &self.chain.service_registry_address,
        )?;
        validation::validate_address(
            "chain.gnosis_safe_multisig_address",
            &self.chain.gnosis_safe_multisig_address,
        )?;
        for creator in &self.agent.omen_creators {
            validation::validate_address("agent.omen_creators", creator)?;
        }

        validation::validate_length(
            "agent.bet_amount_per_threshold",
            &self.agent.bet_amount_per_threshold,
            11,
        )?;

        Ok(())
    }

    pub fn rpc_url(&self) -> Result<&str> {
        self.chain
            .rpc_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| RunnerError::MissingConfigError {
                field: "chain.rpc_url".to_string(),
            })
    }

    pub fn working_directory(&self) -> PathBuf {
        PathBuf::from(&self.runner.working_directory)
    }

    /// 服務 repo 內的檔案路徑（相對於工作目錄）
    pub fn repo_file(&self, name: &str) -> String {
        format!("{}/{}", self.service.directory, name)
    }

    pub fn repo_dir(&self) -> PathBuf {
        self.working_directory().join(&self.service.directory)
    }

    pub fn service_dir_rel(&self) -> String {
        self.repo_file(&self.service.alias)
    }

    pub fn build_dir_rel(&self) -> String {
        format!("{}/{}", self.service_dir_rel(), self.service.build_dir)
    }

    pub fn store_file(&self, name: &str) -> String {
        format!("{}/{}", self.runner.store_directory, name)
    }

    pub fn funding_threshold(&self) -> Wei {
        self.funding.threshold_wei
    }

    pub fn safe_funding_threshold(&self) -> Wei {
        self.funding.safe_threshold_wei
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.funding.poll_interval_seconds)
    }

    pub fn funding_timeout(&self) -> Option<Duration> {
        self.funding.timeout_seconds.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.chain.request_timeout_seconds)
    }
}

impl Validate for RunnerConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
