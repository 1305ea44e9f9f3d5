use crate::domain::model::{Address, Wei};
use crate::domain::ports::ChainRpc;
use crate::utils::error::{RunnerError, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 輪詢餘額直到所有地址都達到門檻
pub struct FundingWaiter {
    rpc: Arc<dyn ChainRpc>,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl FundingWaiter {
    pub fn new(rpc: Arc<dyn ChainRpc>, poll_interval: Duration) -> Self {
        Self {
            rpc,
            poll_interval,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Blocks until every target holds at least `threshold`. Returns the final balances
    /// in target order.
    pub async fn wait_for(&self, targets: &[Address], threshold: Wei) -> Result<Vec<Wei>> {
        let started = Instant::now();
        let mut polls: u64 = 0;
        let mut waiting_on = targets.first().map(|a| a.to_string()).unwrap_or_default();

        loop {
            polls += 1;
            match self.poll_once(targets).await {
                Ok(balances) => {
                    let pending: Vec<&Address> = targets
                        .iter()
                        .zip(&balances)
                        .filter(|(_, balance)| **balance < threshold)
                        .map(|(address, _)| address)
                        .collect();

                    if pending.is_empty() {
                        tracing::info!("💰 All {} address(es) funded after {} poll(s)", targets.len(), polls);
                        return Ok(balances);
                    }

                    for (address, balance) in targets.iter().zip(&balances) {
                        tracing::debug!("Balance of {}: {} (threshold {})", address, balance, threshold);
                    }
                    waiting_on = pending[0].to_string();
                }
                // 傳輸層錯誤在下一輪重試，其餘直接中止
                Err(e) if e.is_transient() => {
                    tracing::warn!("⚠️ Balance query failed, retrying: {}", e);
                }
                Err(e) => return Err(e),
            }

            if let Some(timeout) = self.timeout {
                let elapsed = started.elapsed();
                if elapsed >= timeout {
                    return Err(RunnerError::FundingTimeout {
                        address: waiting_on,
                        elapsed,
                    });
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn poll_once(&self, targets: &[Address]) -> Result<Vec<Wei>> {
        let mut balances = Vec::with_capacity(targets.len());
        for address in targets {
            balances.push(self.rpc.get_balance(address).await?);
        }
        Ok(balances)
    }
}
