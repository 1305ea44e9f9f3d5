#![allow(dead_code)]

use async_trait::async_trait;
use httpmock::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use trader_runner::core::{CommandOutput, CommandRunner, CommandSpec, ServiceState};
use trader_runner::{Result, RunnerError};

pub const OPERATOR_ADDRESS: &str = "0x2000000000000000000000000000000000000002";
pub const AGENT_ADDRESS: &str = "0x1000000000000000000000000000000000000001";
pub const SAFE_ADDRESS: &str = "0x5aB4E1b4B3F8e4A2fEbE0fe1a2D43aC4d5e4a0B1";
pub const FUNDED_HEX: &str = "0x6f05b59d3b20000";

#[derive(Debug, Clone)]
pub struct RecordedCommand {
    pub line: String,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

struct FakeState {
    commands: Vec<RecordedCommand>,
    generated: usize,
    service_state: ServiceState,
}

/// Stands in for git, poetry and the autonomy CLI.
pub struct FakeCli {
    state: Mutex<FakeState>,
    missing_programs: HashSet<String>,
    mint_output: String,
    inside_work_tree: bool,
    stuck_state: Option<ServiceState>,
    deployed_state: ServiceState,
    zero_multisig: bool,
}

impl FakeCli {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                commands: Vec::new(),
                generated: 0,
                service_state: ServiceState::NonExistent,
            }),
            missing_programs: HashSet::new(),
            mint_output: "Building service...\nService token ID: 7\n".to_string(),
            inside_work_tree: true,
            stuck_state: None,
            deployed_state: ServiceState::Deployed,
            zero_multisig: false,
        }
    }

    pub fn with_missing_program(mut self, program: &str) -> Self {
        self.missing_programs.insert(program.to_string());
        self
    }

    pub fn with_mint_output(mut self, output: &str) -> Self {
        self.mint_output = output.to_string();
        self
    }

    pub fn outside_work_tree(mut self) -> Self {
        self.inside_work_tree = false;
        self
    }

    /// `service info` always reports this state.
    pub fn with_stuck_state(mut self, state: ServiceState) -> Self {
        self.stuck_state = Some(state);
        self
    }

    /// `service deploy` succeeds but leaves the service in this state.
    pub fn with_deploy_leaving(mut self, state: ServiceState) -> Self {
        self.deployed_state = state;
        self
    }

    /// `service info` never reports a multisig address.
    pub fn without_multisig(mut self) -> Self {
        self.zero_multisig = true;
        self
    }

    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.line.contains(needle))
            .count()
    }

    pub fn find(&self, needle: &str) -> Option<RecordedCommand> {
        self.commands().into_iter().find(|c| c.line.contains(needle))
    }

    fn ok(stdout: impl Into<String>) -> Result<CommandOutput> {
        Ok(CommandOutput {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        })
    }

    fn keys_json(address: &str, private_key: &str) -> String {
        format!(
            "[\n    {{\n        \"address\": \"{}\",\n        \"private_key\": \"{}\"\n    }}\n]",
            address, private_key
        )
    }

    fn info_table(&self, state: &ServiceState) -> String {
        let multisig = if *state == ServiceState::Deployed && !self.zero_multisig {
            SAFE_ADDRESS
        } else {
            "0x0000000000000000000000000000000000000000"
        };
        format!(
            "| Property                  | Value                                        |\n\
             |:--------------------------|:---------------------------------------------|\n\
             | Service State             | {:<44} |\n\
             | Multisig Address          | {:<44} |\n",
            state.label(),
            multisig
        )
    }
}

#[async_trait]
impl CommandRunner for FakeCli {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        if self.missing_programs.contains(&spec.program) {
            return Err(RunnerError::CommandNotFound {
                program: spec.program.clone(),
            });
        }

        let mut state = self.state.lock().unwrap();
        state.commands.push(RecordedCommand {
            line: spec.display(),
            cwd: spec.cwd.clone(),
            env: spec.env.clone(),
        });

        let cwd = spec.cwd.clone().unwrap_or_default();
        let args: Vec<&str> = spec.args.iter().map(String::as_str).collect();

        match (spec.program.as_str(), args.as_slice()) {
            (_, ["--version"]) => Self::ok("1.0.0\n"),
            ("git", ["clone", .., target]) => {
                std::fs::create_dir_all(cwd.join(target))?;
                Self::ok("")
            }
            ("git", ["rev-parse", "--is-inside-work-tree"]) => {
                if self.inside_work_tree {
                    Self::ok("true\n")
                } else {
                    Ok(CommandOutput {
                        code: Some(128),
                        stdout: String::new(),
                        stderr: "fatal: not a git repository".to_string(),
                    })
                }
            }
            ("poetry", ["install"]) => Self::ok(""),
            ("poetry", ["run", "autonomy", rest @ ..]) => match rest {
                ["packages", "sync"] => Self::ok(""),
                ["generate-key", ..] => {
                    let (address, key) = if state.generated == 0 {
                        (OPERATOR_ADDRESS, "0xoperatorsecret")
                    } else {
                        (AGENT_ADDRESS, "0xagentsecret")
                    };
                    state.generated += 1;
                    std::fs::write(cwd.join("keys.json"), Self::keys_json(address, key))?;
                    Self::ok("")
                }
                ["mint", ..] => {
                    state.service_state = ServiceState::PreRegistration;
                    Self::ok(self.mint_output.clone())
                }
                ["service", "--use-custom-chain", "info", _] => {
                    let current = self
                        .stuck_state
                        .clone()
                        .unwrap_or_else(|| state.service_state.clone());
                    Self::ok(self.info_table(&current))
                }
                ["service", "--use-custom-chain", action, ..] => {
                    state.service_state = match *action {
                        "activate" => ServiceState::ActiveRegistration,
                        "register" => ServiceState::FinishedRegistration,
                        "deploy" => self.deployed_state.clone(),
                        other => ServiceState::Unknown(other.to_string()),
                    };
                    Self::ok("")
                }
                ["fetch", .., "--alias", alias] => {
                    std::fs::create_dir_all(cwd.join(alias))?;
                    Self::ok("")
                }
                ["build-image"] => Self::ok(""),
                ["deploy", "build", ..] => {
                    std::fs::create_dir_all(cwd.join("abci_build"))?;
                    Self::ok("")
                }
                ["deploy", "run", ..] => Self::ok(""),
                other => panic!("unexpected autonomy call: {:?}", other),
            },
            other => panic!("unexpected command: {:?}", other),
        }
    }
}

/// Mock endpoint that supports filters and reports every address as funded.
pub fn funded_rpc(server: &MockServer) {
    server.mock(|when, then| {
        when.method(POST).path("/").body_contains("eth_newFilter");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32602, "message": "Invalid params"}
            }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/").body_contains("eth_getBalance");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": FUNDED_HEX}));
    });
}

pub fn shared(cli: FakeCli) -> Arc<FakeCli> {
    Arc::new(cli)
}
