use crate::core::{Address, BootstrapStep, FundingWaiter, StepContext, Wei};
use crate::utils::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingTarget {
    AgentAndOperator,
    Safe,
}

pub struct AwaitFunding {
    target: FundingTarget,
    waiter: FundingWaiter,
    threshold: Wei,
}

impl AwaitFunding {
    pub fn new(target: FundingTarget, waiter: FundingWaiter, threshold: Wei) -> Self {
        Self {
            target,
            waiter,
            threshold,
        }
    }

    fn targets(&self, context: &StepContext) -> Result<Vec<(&'static str, Address)>> {
        Ok(match self.target {
            FundingTarget::AgentAndOperator => vec![
                ("agent", context.require_agent()?.address.clone()),
                ("operator", context.require_operator()?.address.clone()),
            ],
            FundingTarget::Safe => vec![("safe", context.require_safe()?.clone())],
        })
    }
}

#[async_trait::async_trait]
impl BootstrapStep for AwaitFunding {
    fn name(&self) -> &str {
        match self.target {
            FundingTarget::AgentAndOperator => "await-funding",
            FundingTarget::Safe => "await-safe-funding",
        }
    }

    fn description(&self) -> &str {
        match self.target {
            FundingTarget::AgentAndOperator => "Wait for the agent and operator to be funded",
            FundingTarget::Safe => "Wait for the service safe to be funded",
        }
    }

    async fn run(&self, context: &mut StepContext) -> Result<()> {
        let targets = self.targets(context)?;

        let listing = targets
            .iter()
            .map(|(role, address)| format!("the {} ({})", role, address))
            .collect::<Vec<_>>()
            .join(" and ");
        println!(
            "💸 Please fund {} with at least {} xDAI each to continue.",
            listing, self.threshold
        );

        let addresses: Vec<Address> = targets.iter().map(|(_, a)| a.clone()).collect();
        let balances = self.waiter.wait_for(&addresses, self.threshold).await?;

        for ((role, _), balance) in targets.iter().zip(&balances) {
            tracing::info!("💰 {} balance: {} xDAI", role, balance);
            context.add_shared_data(
                format!("{}_balance_wei", role),
                serde_json::Value::String(balance.as_u128().to_string()),
            );
        }
        Ok(())
    }
}
