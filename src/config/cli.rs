use crate::config::toml_config::RunnerConfig;
use crate::utils::error::Result;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "trader-runner")]
#[command(about = "Bootstrap, fund and deploy a trader agent service")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// JSON-RPC endpoint of the chain (falls back to TRADER_RPC_URL, then a prompt)
    #[arg(long)]
    pub rpc: Option<String>,

    /// Directory the service repository is cloned into
    #[arg(long)]
    pub workdir: Option<String>,

    #[arg(long)]
    pub poll_interval_secs: Option<u64>,

    /// Give up waiting for funds after this many seconds
    #[arg(long)]
    pub funding_timeout_secs: Option<u64>,

    /// Execute only these steps (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Skip these steps (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    #[arg(long)]
    pub run_id: Option<String>,

    /// Show the execution plan without running anything
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 載入設定檔（若有）並套用命令列覆蓋
    pub fn resolve(&self) -> Result<RunnerConfig> {
        let mut config = match &self.config {
            Some(path) => RunnerConfig::from_file(path)?,
            None => RunnerConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut RunnerConfig) {
        if let Some(rpc) = &self.rpc {
            config.chain.rpc_url = Some(rpc.clone());
        } else if config.chain.rpc_url.is_none() {
            if let Ok(rpc) = std::env::var("TRADER_RPC_URL") {
                config.chain.rpc_url = Some(rpc);
            }
        }
        if let Some(workdir) = &self.workdir {
            config.runner.working_directory = workdir.clone();
        }
        if let Some(interval) = self.poll_interval_secs {
            config.funding.poll_interval_seconds = interval;
        }
        if let Some(timeout) = self.funding_timeout_secs {
            config.funding.timeout_seconds = Some(timeout);
        }
    }
}
