use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Required program '{program}' is not installed")]
    MissingDependency { program: String },

    #[error("Program '{program}' could not be found on PATH")]
    CommandNotFound { program: String },

    #[error("Command `{command}` failed with exit code {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("JSON-RPC error {code}: {message}")]
    RpcError { code: i64, message: String },

    #[error("The given RPC ({endpoint}) does not support 'eth_newFilter': {reason}")]
    RpcUnsupported { endpoint: String, reason: String },

    #[error("Invalid wei amount: '{value}'")]
    InvalidHexQuantity { value: String },

    #[error("Invalid address: '{value}'")]
    InvalidAddress { value: String },

    #[error("Could not parse {source_name}: {message}")]
    OutputParseError {
        source_name: String,
        message: String,
    },

    #[error("Service minting failed: {output}")]
    MintFailed { output: String },

    #[error("{path} is not a git repository")]
    NotAGitRepository { path: String },

    #[error("Unexpected service state: expected {expected}, found {actual}")]
    UnexpectedServiceState { expected: String, actual: String },

    #[error("Address {address} was not funded within {elapsed:?}")]
    FundingTimeout { address: String, elapsed: Duration },

    #[error("Missing step input: {message}")]
    StepInputError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Dependency,
    Network,
    Chain,
    External,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 對應的程序退出碼
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl RunnerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RunnerError::ConfigError { .. }
            | RunnerError::ConfigValidationError { .. }
            | RunnerError::InvalidConfigValueError { .. }
            | RunnerError::MissingConfigError { .. } => ErrorCategory::Configuration,
            RunnerError::MissingDependency { .. } | RunnerError::CommandNotFound { .. } => {
                ErrorCategory::Dependency
            }
            RunnerError::HttpError(_) | RunnerError::FundingTimeout { .. } => {
                ErrorCategory::Network
            }
            RunnerError::RpcError { .. }
            | RunnerError::RpcUnsupported { .. }
            | RunnerError::UnexpectedServiceState { .. }
            | RunnerError::MintFailed { .. } => ErrorCategory::Chain,
            RunnerError::CommandFailed { .. } | RunnerError::NotAGitRepository { .. } => {
                ErrorCategory::External
            }
            RunnerError::SerializationError(_)
            | RunnerError::InvalidHexQuantity { .. }
            | RunnerError::InvalidAddress { .. }
            | RunnerError::OutputParseError { .. }
            | RunnerError::StepInputError { .. } => ErrorCategory::Data,
            RunnerError::IoError(_) => ErrorCategory::System,
        }
    }

    /// 連線、逾時等傳輸層失敗，值得重試
    pub fn is_transient(&self) -> bool {
        match self {
            RunnerError::HttpError(e) => {
                e.is_connect() || e.is_timeout() || e.is_request() || e.is_body()
            }
            _ => false,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            RunnerError::MissingDependency { program } | RunnerError::CommandNotFound { program } => {
                format!("Install '{}' and make sure it is on your PATH", program)
            }
            RunnerError::RpcUnsupported { .. } => {
                "Use an RPC provider that supports filter methods (eth_newFilter)".to_string()
            }
            RunnerError::HttpError(_) => {
                "Check that the RPC endpoint is reachable and try again".to_string()
            }
            RunnerError::RpcError { .. } => {
                "Check the RPC endpoint and the queried address".to_string()
            }
            RunnerError::FundingTimeout { address, .. } => format!(
                "Send funds to {} or raise funding.timeout_seconds, then rerun",
                address
            ),
            RunnerError::NotAGitRepository { path } => format!(
                "Remove or rename '{}' so it can be cloned again",
                path
            ),
            RunnerError::MintFailed { .. } => {
                "Check the operator balance and the registry addresses, then rerun".to_string()
            }
            RunnerError::UnexpectedServiceState { .. } => {
                "Inspect the service with `autonomy service info` and rerun once it is consistent"
                    .to_string()
            }
            RunnerError::CommandFailed { .. } => {
                "Inspect the command output above and rerun".to_string()
            }
            RunnerError::ConfigError { .. }
            | RunnerError::ConfigValidationError { .. }
            | RunnerError::InvalidConfigValueError { .. }
            | RunnerError::MissingConfigError { .. } => {
                "Fix the configuration file or command-line flags".to_string()
            }
            RunnerError::IoError(_) => {
                "Check file permissions and free disk space in the working directory".to_string()
            }
            _ => "Rerun with --verbose for more details".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RunnerError::HttpError(e) => format!("Could not reach the RPC endpoint: {}", e),
            RunnerError::IoError(e) => format!("File system error: {}", e),
            RunnerError::MintFailed { output } => {
                format!("Service minting failed. Output was: {}", output.trim())
            }
            RunnerError::UnexpectedServiceState { actual, .. } => format!(
                "Something went wrong while deploying the service. The service's state is: {}",
                actual
            ),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;
