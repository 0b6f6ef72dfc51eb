//! On-chain mint event feed.
//!
//! Watches the token contract for `TokensMinted` logs and forwards them to a
//! subscriber. The subscription owns its polling task: dropping it stops the
//! watch, so no callback outlives the purchase attempt that started it.

use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::Provider;
use alloy::rpc::types::Filter;
use alloy::sol_types::SolEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::constants::FEED_POLL_INTERVAL;
use crate::error::OnrampError;
use crate::purchase::MintedEvent;
use crate::TokensMinted;

/// Polls the chain for `TokensMinted` logs on one token contract.
pub struct MintEventFeed<P> {
    provider: P,
    token_contract: Address,
    poll_interval: Duration,
}

impl<P> MintEventFeed<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    pub fn new(provider: P, token_contract: Address) -> Self {
        Self {
            provider,
            token_contract,
            poll_interval: FEED_POLL_INTERVAL,
        }
    }

    /// Override the poll cadence.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Start watching from the current block height. Decoded events land on
    /// the returned subscription's channel until it is dropped.
    pub async fn subscribe(&self) -> Result<MintSubscription, OnrampError> {
        let from_block = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| OnrampError::ChainError(format!("get_block_number failed: {e}")))?;

        let (events_tx, events) = mpsc::channel(64);
        let provider = self.provider.clone();
        let contract = self.token_contract;
        let poll_interval = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut next_block = from_block + 1;
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let latest = match provider.get_block_number().await {
                    Ok(n) => n,
                    Err(e) => {
                        tracing::warn!(error = %e, "mint feed: block number poll failed");
                        continue;
                    }
                };
                if latest < next_block {
                    continue;
                }

                let filter = Filter::new()
                    .address(contract)
                    .event_signature(TokensMinted::SIGNATURE_HASH)
                    .from_block(next_block)
                    .to_block(latest);

                let logs = match provider.get_logs(&filter).await {
                    Ok(logs) => logs,
                    Err(e) => {
                        tracing::warn!(error = %e, "mint feed: log poll failed");
                        continue;
                    }
                };
                next_block = latest + 1;

                for log in logs {
                    let decoded = match log.log_decode::<TokensMinted>() {
                        Ok(decoded) => decoded,
                        Err(e) => {
                            tracing::warn!(error = %e, "mint feed: undecodable log");
                            continue;
                        }
                    };
                    let Some(tx_hash) = log.transaction_hash else {
                        continue;
                    };

                    let data = decoded.inner.data;
                    let event = MintedEvent {
                        minted_to: data.mintedTo,
                        quantity: data.quantityMinted,
                        tx_hash,
                    };
                    if events_tx.send(event).await.is_err() {
                        // Subscriber gone
                        return;
                    }
                }
            }
        });

        Ok(MintSubscription { events, task })
    }
}

/// A live watch on the mint feed. Dropping it aborts the polling task.
pub struct MintSubscription {
    pub events: mpsc::Receiver<MintedEvent>,
    task: JoinHandle<()>,
}

impl Drop for MintSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
