use crate::domain::model::{Address, KeyPair, ServiceId, ServiceInfo, ServiceState};
use crate::utils::error::{RunnerError, Result};
use std::collections::HashMap;

/// 解析 `autonomy generate-key` 產生的 keys.json
pub fn parse_keys_file(content: &str) -> Result<Vec<KeyPair>> {
    let keys: Vec<KeyPair> =
        serde_json::from_str(content).map_err(|e| RunnerError::OutputParseError {
            source_name: "keys file".to_string(),
            message: e.to_string(),
        })?;

    if keys.is_empty() {
        return Err(RunnerError::OutputParseError {
            source_name: "keys file".to_string(),
            message: "no keys found".to_string(),
        });
    }

    Ok(keys)
}

/// Service id is whatever follows the last `": "` in the mint output.
pub fn parse_service_id(output: &str) -> Result<ServiceId> {
    let trimmed = output.trim();
    let candidate = trimmed
        .rsplit_once(": ")
        .map(|(_, tail)| tail.trim())
        .unwrap_or(trimmed);

    if candidate.is_empty() || !candidate.chars().all(|c| c.is_ascii_digit()) {
        return Err(RunnerError::MintFailed {
            output: output.to_string(),
        });
    }

    candidate
        .parse::<u64>()
        .map(ServiceId)
        .map_err(|_| RunnerError::MintFailed {
            output: output.to_string(),
        })
}

/// 解析 `autonomy service info` 的表格輸出
pub fn parse_service_info(output: &str) -> Result<ServiceInfo> {
    let mut fields = HashMap::new();

    for line in output.lines() {
        let line = line.trim();
        if !line.starts_with('|') {
            continue;
        }

        let cells: Vec<&str> = line
            .trim_matches('|')
            .split('|')
            .map(str::trim)
            .collect();
        if cells.len() < 2 {
            continue;
        }

        // 分隔列，例如 |:----|:----|
        if cells[0].chars().all(|c| c == '-' || c == ':') {
            continue;
        }

        fields.insert(cells[0].to_string(), cells[1].to_string());
    }

    let state = fields
        .get("Service State")
        .map(|label| ServiceState::from_label(label))
        .ok_or_else(|| RunnerError::OutputParseError {
            source_name: "service info".to_string(),
            message: "no 'Service State' row".to_string(),
        })?;

    let multisig_address = match fields.get("Multisig Address") {
        Some(raw) => {
            let address = Address::parse(raw)?;
            (!address.is_zero()).then_some(address)
        }
        None => None,
    };

    Ok(ServiceInfo {
        state,
        multisig_address,
        fields,
    })
}
