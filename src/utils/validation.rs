use crate::domain::model::Address;
use crate::utils::error::{RunnerError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(RunnerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(RunnerError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(RunnerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(RunnerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(RunnerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(RunnerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_address(field_name: &str, value: &str) -> Result<()> {
    Address::parse(value)
        .map(|_| ())
        .map_err(|_| RunnerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Expected a 0x-prefixed 20-byte hex address".to_string(),
        })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RunnerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_length<T>(field_name: &str, values: &[T], expected: usize) -> Result<()> {
    if values.len() != expected {
        return Err(RunnerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: values.len().to_string(),
            reason: format!("Expected exactly {} entries", expected),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("chain.rpc_url", "https://rpc.gnosischain.com").is_ok());
        assert!(validate_url("chain.rpc_url", "http://localhost:8545").is_ok());
        assert!(validate_url("chain.rpc_url", "").is_err());
        assert!(validate_url("chain.rpc_url", "invalid-url").is_err());
        assert!(validate_url("chain.rpc_url", "ws://localhost:8546").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("service.n_agents", 1, 1).is_ok());
        assert!(validate_positive_number("service.n_agents", 0, 1).is_err());
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address(
            "chain.service_manager_address",
            "0xE3607b00E75f6405248323A9417ff6b39B244b50"
        )
        .is_ok());
        assert!(validate_address("chain.service_manager_address", "0x1234").is_err());
    }

    #[test]
    fn test_validate_length() {
        assert!(validate_length("agent.bet_amount_per_threshold", &[0u64; 11], 11).is_ok());
        assert!(validate_length("agent.bet_amount_per_threshold", &[0u64; 10], 11).is_err());
    }
}
