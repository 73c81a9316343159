use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::oracle::{BalanceOracle, WalletBalances};

/// Periodic balance refresher for a connected wallet.
///
/// Publishes the latest display balances on a watch channel at a fixed
/// interval. Runs independently of any in-flight activation and its output
/// must never be used to re-validate an already-passed funding gate; the
/// gate is a snapshot-in-time check owned by the oracle.
pub struct BalanceRefresher {
    receiver: watch::Receiver<WalletBalances>,
    task: JoinHandle<()>,
}

impl BalanceRefresher {
    /// Start refreshing `address` every `interval`. The first tick fires
    /// immediately so the UI has data before the interval elapses.
    pub fn spawn(oracle: Arc<BalanceOracle>, address: String, interval: Duration) -> Self {
        let (sender, receiver) = watch::channel(WalletBalances::default());

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                // fetch_balances fails safe to zero, so the loop never dies
                let balances = oracle.fetch_balances(&address).await;
                debug!(
                    "Refreshed balances for {}: gas={}, stable={}",
                    address, balances.native_gas, balances.stable
                );
                if sender.send(balances).is_err() {
                    // All receivers dropped; wallet disconnected.
                    break;
                }
            }
        });

        Self { receiver, task }
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletBalances> {
        self.receiver.clone()
    }

    /// Stop the refresh loop. Called on wallet disconnect.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for BalanceRefresher {
    fn drop(&mut self) {
        self.task.abort();
    }
}
