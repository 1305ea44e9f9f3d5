use crate::core::parsing::parse_service_info;
use crate::domain::model::{Address, ServiceId, ServiceInfo};
use crate::domain::ports::{CommandOutput, CommandRunner, CommandSpec};
use crate::utils::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Activate,
    Register,
    Deploy,
}

impl ServiceAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceAction::Activate => "activate",
            ServiceAction::Register => "register",
            ServiceAction::Deploy => "deploy",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thin wrapper over `poetry run autonomy ...`.
#[derive(Clone)]
pub struct AutonomyCli {
    runner: Arc<dyn CommandRunner>,
    cwd: PathBuf,
    env: Vec<(String, String)>,
}

impl AutonomyCli {
    pub fn new(runner: Arc<dyn CommandRunner>, cwd: PathBuf, env: Vec<(String, String)>) -> Self {
        Self { runner, cwd, env }
    }

    /// 同一個 CLI，換到另一個目錄執行
    pub fn in_dir(&self, dir: impl AsRef<Path>) -> Self {
        Self {
            runner: self.runner.clone(),
            cwd: self.cwd.join(dir),
            env: self.env.clone(),
        }
    }

    /// 額外的環境變數（同名者覆蓋）
    pub fn with_env(&self, env: &[(String, String)]) -> Self {
        let mut merged: Vec<(String, String)> = self
            .env
            .iter()
            .filter(|(key, _)| !env.iter().any(|(k, _)| k == key))
            .cloned()
            .collect();
        merged.extend(env.iter().cloned());
        Self {
            runner: self.runner.clone(),
            cwd: self.cwd.clone(),
            env: merged,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn command<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new("poetry")
            .args(["run", "autonomy"])
            .args(args)
            .current_dir(self.cwd.clone())
            .envs(&self.env)
    }

    async fn run_checked(&self, spec: CommandSpec) -> Result<CommandOutput> {
        self.runner.run_checked(&spec).await
    }

    pub async fn packages_sync(&self) -> Result<()> {
        self.run_checked(self.command(["packages", "sync"]).inherit_output())
            .await
            .map(|_| ())
    }

    /// 於目前目錄產生 keys.json
    pub async fn generate_key(&self) -> Result<()> {
        self.run_checked(self.command(["generate-key", "-n1", "ethereum"]))
            .await
            .map(|_| ())
    }

    /// Returns the raw mint output; the exit status is left to the caller.
    pub async fn mint(
        &self,
        package_path: &str,
        key_file: &str,
        nft: &str,
        agent_id: u64,
        n_agents: u64,
        cost_of_bonding: u64,
    ) -> Result<CommandOutput> {
        let spec = self.command([
            "mint".to_string(),
            "--skip-hash-check".to_string(),
            "--use-custom-chain".to_string(),
            "service".to_string(),
            package_path.to_string(),
            "--key".to_string(),
            key_file.to_string(),
            "--nft".to_string(),
            nft.to_string(),
            "-a".to_string(),
            agent_id.to_string(),
            "-n".to_string(),
            n_agents.to_string(),
            "--threshold".to_string(),
            n_agents.to_string(),
            "-c".to_string(),
            cost_of_bonding.to_string(),
        ]);
        self.runner.run(&spec).await
    }

    pub async fn service_action(
        &self,
        action: ServiceAction,
        service_id: ServiceId,
        key_file: &str,
        agent: Option<(u64, &Address)>,
    ) -> Result<()> {
        let mut args = vec![
            "service".to_string(),
            "--use-custom-chain".to_string(),
            action.as_str().to_string(),
            "--key".to_string(),
            key_file.to_string(),
            service_id.to_string(),
        ];
        if let Some((agent_id, instance)) = agent {
            args.extend([
                "-a".to_string(),
                agent_id.to_string(),
                "-i".to_string(),
                instance.to_string(),
            ]);
        }

        self.run_checked(self.command(args)).await.map(|_| ())
    }

    pub async fn service_info(&self, service_id: ServiceId) -> Result<ServiceInfo> {
        let output = self
            .run_checked(self.command([
                "service".to_string(),
                "--use-custom-chain".to_string(),
                "info".to_string(),
                service_id.to_string(),
            ]))
            .await?;
        parse_service_info(&output.stdout)
    }

    pub async fn fetch_service(&self, package: &str, alias: &str) -> Result<()> {
        self.run_checked(
            self.command(["fetch", "--local", "--service", package, "--alias", alias])
                .inherit_output(),
        )
        .await
        .map(|_| ())
    }

    pub async fn build_image(&self) -> Result<()> {
        self.run_checked(self.command(["build-image"]).inherit_output())
            .await
            .map(|_| ())
    }

    pub async fn deploy_build(&self, n_agents: u64) -> Result<()> {
        self.run_checked(
            self.command([
                "deploy".to_string(),
                "build".to_string(),
                "--n".to_string(),
                n_agents.to_string(),
                "-ltm".to_string(),
            ])
            .inherit_output(),
        )
        .await
        .map(|_| ())
    }

    pub async fn deploy_run(&self, build_dir: &str) -> Result<()> {
        self.run_checked(
            self.command(["deploy", "run", "--build-dir", build_dir, "--detach"])
                .inherit_output(),
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ServiceState;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingRunner {
        specs: Mutex<Vec<CommandSpec>>,
        stdout: String,
    }

    impl RecordingRunner {
        fn new(stdout: &str) -> Self {
            Self {
                specs: Mutex::new(Vec::new()),
                stdout: stdout.to_string(),
            }
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
            self.specs.lock().unwrap().push(spec.clone());
            Ok(CommandOutput {
                code: Some(0),
                stdout: self.stdout.clone(),
                stderr: String::new(),
            })
        }
    }

    fn cli(runner: Arc<RecordingRunner>) -> AutonomyCli {
        AutonomyCli::new(
            runner,
            PathBuf::from("/work/trader"),
            vec![("CUSTOM_CHAIN_ID".to_string(), "100".to_string())],
        )
    }

    #[tokio::test]
    async fn test_mint_arguments() {
        let runner = Arc::new(RecordingRunner::new("Service token ID: 7"));
        let output = cli(runner.clone())
            .mint(
                "packages/valory/services/trader/",
                "pkey.txt",
                "bafy",
                12,
                1,
                10_000_000_000_000_000,
            )
            .await
            .unwrap();

        assert_eq!(output.stdout, "Service token ID: 7");
        let specs = runner.specs.lock().unwrap();
        assert_eq!(
            specs[0].display(),
            "poetry run autonomy mint --skip-hash-check --use-custom-chain service \
             packages/valory/services/trader/ --key pkey.txt --nft bafy -a 12 -n 1 \
             --threshold 1 -c 10000000000000000"
        );
        assert_eq!(specs[0].cwd, Some(PathBuf::from("/work/trader")));
        assert_eq!(specs[0].env, vec![("CUSTOM_CHAIN_ID".to_string(), "100".to_string())]);
    }

    #[tokio::test]
    async fn test_register_passes_agent_instance() {
        let runner = Arc::new(RecordingRunner::new(""));
        let agent = Address::parse("0x1000000000000000000000000000000000000001").unwrap();

        cli(runner.clone())
            .service_action(ServiceAction::Register, ServiceId(3), "pkey.txt", Some((12, &agent)))
            .await
            .unwrap();

        let specs = runner.specs.lock().unwrap();
        assert_eq!(
            specs[0].display(),
            "poetry run autonomy service --use-custom-chain register --key pkey.txt 3 \
             -a 12 -i 0x1000000000000000000000000000000000000001"
        );
    }

    #[tokio::test]
    async fn test_service_info_is_parsed() {
        let runner = Arc::new(RecordingRunner::new(
            "| Service State             | DEPLOYED                                     |\n",
        ));
        let info = cli(runner).service_info(ServiceId(3)).await.unwrap();
        assert_eq!(info.state, ServiceState::Deployed);
    }

    #[test]
    fn test_in_dir_and_with_env() {
        let runner = Arc::new(RecordingRunner::new(""));
        let nested = cli(runner)
            .in_dir("trader_service")
            .with_env(&[
                ("CUSTOM_CHAIN_ID".to_string(), "10200".to_string()),
                ("BET_THRESHOLD".to_string(), "1".to_string()),
            ]);

        assert_eq!(nested.cwd(), Path::new("/work/trader/trader_service"));
        let spec = nested.command(["build-image"]);
        assert_eq!(
            spec.env,
            vec![
                ("CUSTOM_CHAIN_ID".to_string(), "10200".to_string()),
                ("BET_THRESHOLD".to_string(), "1".to_string()),
            ]
        );
    }
}
