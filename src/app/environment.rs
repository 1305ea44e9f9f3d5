use crate::config::RunnerConfig;
use crate::domain::model::Address;
use crate::utils::error::Result;

/// 傳給 autonomy 與部署後 agent 的環境變數
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentEnvironment {
    vars: Vec<(String, String)>,
}

impl AgentEnvironment {
    /// Variables every `autonomy` invocation needs to talk to the custom chain.
    pub fn chain(config: &RunnerConfig, rpc_url: &str) -> Self {
        let mut env = Self::default();
        env.set("CUSTOM_CHAIN_RPC", rpc_url);
        env.set("CUSTOM_CHAIN_ID", config.chain.chain_id.to_string());
        env.set(
            "CUSTOM_SERVICE_MANAGER_ADDRESS",
            &config.chain.service_manager_address,
        );
        env.set(
            "CUSTOM_SERVICE_REGISTRY_ADDRESS",
            &config.chain.service_registry_address,
        );
        env.set(
            "CUSTOM_GNOSIS_SAFE_MULTISIG_ADDRESS",
            &config.chain.gnosis_safe_multisig_address,
        );
        env
    }

    /// Chain variables plus everything the deployed trader agent reads.
    pub fn agent(
        config: &RunnerConfig,
        rpc_url: &str,
        agent_address: &Address,
        safe_address: &Address,
    ) -> Result<Self> {
        let mut env = Self::chain(config, rpc_url);

        env.set(
            "ALL_PARTICIPANTS",
            serde_json::to_string(&[agent_address.as_str()])?,
        );
        env.set("SAFE_CONTRACT_ADDRESS", safe_address.as_str());
        env.set(
            "OMEN_CREATORS",
            serde_json::to_string(&config.agent.omen_creators)?,
        );

        for (decile, amount) in config.agent.bet_amount_per_threshold.iter().enumerate() {
            env.set(
                format!("BET_AMOUNT_PER_THRESHOLD_{:03}", decile * 10),
                amount.to_string(),
            );
        }
        env.set("BET_THRESHOLD", config.agent.bet_threshold.to_string());
        env.set("PROMPT_TEMPLATE", &config.agent.prompt_template);

        for (key, value) in &config.agent.extra_environment {
            env.set(key.clone(), value);
        }

        Ok(env)
    }

    /// 同名變數會被覆蓋
    pub fn set(&mut self, key: impl Into<String>, value: impl AsRef<str>) {
        let key = key.into();
        let value = value.as_ref().to_string();
        match self.vars.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.vars.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn vars(&self) -> &[(String, String)] {
        &self.vars
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addresses() -> (Address, Address) {
        (
            Address::parse("0x1000000000000000000000000000000000000001").unwrap(),
            Address::parse("0x5aB4E1b4B3F8e4A2fEbE0fe1a2D43aC4d5e4a0B1").unwrap(),
        )
    }

    #[test]
    fn test_chain_environment() {
        let config = RunnerConfig::default();
        let env = AgentEnvironment::chain(&config, "https://rpc.gnosischain.com");

        assert_eq!(env.len(), 5);
        assert_eq!(env.get("CUSTOM_CHAIN_RPC"), Some("https://rpc.gnosischain.com"));
        assert_eq!(env.get("CUSTOM_CHAIN_ID"), Some("100"));
        assert_eq!(
            env.get("CUSTOM_SERVICE_REGISTRY_ADDRESS"),
            Some("0x9338b5153AE39BB89f50468E608eD9d764B755fD")
        );
    }

    #[test]
    fn test_agent_environment() {
        let config = RunnerConfig::default();
        let (agent, safe) = addresses();
        let env = AgentEnvironment::agent(&config, "http://localhost:8545", &agent, &safe).unwrap();

        assert_eq!(
            env.get("ALL_PARTICIPANTS"),
            Some(r#"["0x1000000000000000000000000000000000000001"]"#)
        );
        assert_eq!(env.get("SAFE_CONTRACT_ADDRESS"), Some(safe.as_str()));
        assert_eq!(
            env.get("OMEN_CREATORS"),
            Some(r#"["0x89c5cc945dd550BcFfb72Fe42BfF002429F46Fec"]"#)
        );
        assert_eq!(env.get("BET_AMOUNT_PER_THRESHOLD_000"), Some("0"));
        assert_eq!(
            env.get("BET_AMOUNT_PER_THRESHOLD_100"),
            Some("100000000000000000")
        );
        assert_eq!(env.get("BET_THRESHOLD"), Some("5000000000000000"));
        assert!(env.get("PROMPT_TEMPLATE").unwrap().contains("@{question}"));
        // 5 chain + 3 addresses + 11 deciles + threshold + template
        assert_eq!(env.len(), 21);
    }

    #[test]
    fn test_extra_environment_overrides() {
        let mut config = RunnerConfig::default();
        config
            .agent
            .extra_environment
            .insert("BET_THRESHOLD".to_string(), "1".to_string());
        config
            .agent
            .extra_environment
            .insert("MECH_AGENT_ADDRESS".to_string(), "0xabc".to_string());
        let (agent, safe) = addresses();

        let env = AgentEnvironment::agent(&config, "http://localhost:8545", &agent, &safe).unwrap();
        assert_eq!(env.get("BET_THRESHOLD"), Some("1"));
        assert_eq!(env.get("MECH_AGENT_ADDRESS"), Some("0xabc"));
        assert_eq!(env.len(), 22);
    }
}
