use crate::utils::error::{RunnerError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// EVM 地址，保留原始大小寫
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let valid = trimmed.len() == 42
            && (trimmed.starts_with("0x") || trimmed.starts_with("0X"))
            && trimmed[2..].chars().all(|c| c.is_ascii_hexdigit());

        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(RunnerError::InvalidAddress {
                value: value.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0[2..].chars().all(|c| c == '0')
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Address::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// 以 wei 為單位的原生代幣數量
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Wei(pub u128);

impl Wei {
    pub const PER_UNIT: u128 = 1_000_000_000_000_000_000;

    /// Parses a JSON-RPC hex quantity such as `"0x6f05b59d3b20000"`.
    pub fn from_hex_quantity(value: &str) -> Result<Self> {
        let invalid = || RunnerError::InvalidHexQuantity {
            value: value.to_string(),
        };

        let digits = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .ok_or_else(invalid)?;

        if digits.is_empty() {
            return Err(invalid());
        }

        u128::from_str_radix(digits, 16).map(Wei).map_err(|_| invalid())
    }

    /// Parses a decimal amount such as `"20000000000000000000"`.
    pub fn from_decimal(value: &str) -> Result<Self> {
        let digits = value.trim();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(RunnerError::InvalidHexQuantity {
                value: value.to_string(),
            });
        }
        digits
            .parse::<u128>()
            .map(Wei)
            .map_err(|_| RunnerError::InvalidHexQuantity {
                value: value.to_string(),
            })
    }

    pub fn as_u128(self) -> u128 {
        self.0
    }
}

// TOML 整數只到 i64，超過時以字串表示
impl Serialize for Wei {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Wei {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawWei {
            Integer(u64),
            Text(String),
        }

        match RawWei::deserialize(deserializer)? {
            RawWei::Integer(value) => Ok(Wei(u128::from(value))),
            RawWei::Text(text) if text.trim().starts_with("0x") => {
                Wei::from_hex_quantity(text.trim()).map_err(serde::de::Error::custom)
            }
            RawWei::Text(text) => Wei::from_decimal(&text).map_err(serde::de::Error::custom),
        }
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::PER_UNIT;
        let fraction = self.0 % Self::PER_UNIT;
        if fraction == 0 {
            write!(f, "{}", whole)
        } else {
            let fraction = format!("{:018}", fraction);
            write!(f, "{}.{}", whole, fraction.trim_end_matches('0'))
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub address: Address,
    pub private_key: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceId(pub u64);

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 服務在 registry 上的生命週期狀態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceState {
    NonExistent,
    PreRegistration,
    ActiveRegistration,
    FinishedRegistration,
    Deployed,
    TerminatedBonded,
    Unknown(String),
}

impl ServiceState {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "NON_EXISTENT" => ServiceState::NonExistent,
            "PRE_REGISTRATION" => ServiceState::PreRegistration,
            "ACTIVE_REGISTRATION" => ServiceState::ActiveRegistration,
            "FINISHED_REGISTRATION" => ServiceState::FinishedRegistration,
            "DEPLOYED" => ServiceState::Deployed,
            "TERMINATED_BONDED" => ServiceState::TerminatedBonded,
            other => ServiceState::Unknown(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ServiceState::NonExistent => "NON_EXISTENT",
            ServiceState::PreRegistration => "PRE_REGISTRATION",
            ServiceState::ActiveRegistration => "ACTIVE_REGISTRATION",
            ServiceState::FinishedRegistration => "FINISHED_REGISTRATION",
            ServiceState::Deployed => "DEPLOYED",
            ServiceState::TerminatedBonded => "TERMINATED_BONDED",
            ServiceState::Unknown(label) => label,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub state: ServiceState,
    pub multisig_address: Option<Address>,
    pub fields: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_quantity_conversion() {
        let wei = Wei::from_hex_quantity("0x6f05b59d3b20000").unwrap();
        assert_eq!(wei, Wei(500_000_000_000_000_000));
        assert_eq!(Wei::from_hex_quantity("0x0").unwrap(), Wei(0));
        assert_eq!(Wei::from_hex_quantity("0xDE0B6B3A7640000").unwrap(), Wei(Wei::PER_UNIT));
    }

    #[test]
    fn test_hex_quantity_rejects_garbage() {
        assert!(Wei::from_hex_quantity("0x").is_err());
        assert!(Wei::from_hex_quantity("6f05b59d3b20000").is_err());
        assert!(Wei::from_hex_quantity("0xzz").is_err());
        assert!(Wei::from_hex_quantity(&format!("0x1{}", "0".repeat(32))).is_err());
    }

    #[test]
    fn test_wei_from_decimal() {
        assert_eq!(
            Wei::from_decimal("20000000000000000000").unwrap(),
            Wei(20 * Wei::PER_UNIT)
        );
        assert!(Wei::from_decimal("").is_err());
        assert!(Wei::from_decimal("-1").is_err());
        assert!(Wei::from_decimal("1.5").is_err());
    }

    #[test]
    fn test_wei_display() {
        assert_eq!(Wei(500_000_000_000_000_000).to_string(), "0.5");
        assert_eq!(Wei(2 * Wei::PER_UNIT).to_string(), "2");
        assert_eq!(Wei(1).to_string(), "0.000000000000000001");
    }

    #[test]
    fn test_address_parse() {
        let address = Address::parse("0x89c5cc945dd550BcFfb72Fe42BfF002429F46Fec").unwrap();
        assert_eq!(address.as_str(), "0x89c5cc945dd550BcFfb72Fe42BfF002429F46Fec");
        assert!(!address.is_zero());
        assert!(Address::parse("0x0000000000000000000000000000000000000000")
            .unwrap()
            .is_zero());
        assert!(Address::parse("89c5cc945dd550BcFfb72Fe42BfF002429F46Fec").is_err());
        assert!(Address::parse("0x89c5").is_err());
    }

    #[test]
    fn test_key_pair_debug_redacts_private_key() {
        let pair = KeyPair {
            address: Address::parse("0x89c5cc945dd550BcFfb72Fe42BfF002429F46Fec").unwrap(),
            private_key: "0xdeadbeef".to_string(),
        };
        let debug = format!("{:?}", pair);
        assert!(!debug.contains("deadbeef"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_service_state_labels() {
        assert_eq!(ServiceState::from_label(" DEPLOYED "), ServiceState::Deployed);
        assert_eq!(
            ServiceState::from_label("SOMETHING"),
            ServiceState::Unknown("SOMETHING".to_string())
        );
        assert_eq!(ServiceState::ActiveRegistration.to_string(), "ACTIVE_REGISTRATION");
    }
}
