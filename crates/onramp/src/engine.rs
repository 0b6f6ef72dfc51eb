//! Client for the minting service.
//!
//! Minting is fire-and-forget: a call succeeds once the service has queued
//! the transaction, not once it is confirmed on-chain. The buyer's client
//! learns the real outcome from the chain itself, or times out.

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;

use crate::error::OnrampError;

/// Receipt for a queued mint request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintSubmission {
    pub queue_id: String,
}

/// Seam for issuing mint calls. Object-safe so server state can hold an
/// `Arc<dyn TokenMinter>` and tests can substitute a recorder.
#[async_trait]
pub trait TokenMinter: Send + Sync {
    /// Mint `amount` (human-readable token units) to `to`.
    async fn mint_to(&self, to: &str, amount: &str) -> Result<MintSubmission, OnrampError>;
}

/// Production minter backed by the minting service's REST API.
pub struct EngineClient {
    http: reqwest::Client,
    url: String,
    access_token: String,
    chain: String,
    token_contract: Address,
    backend_wallet: Address,
}

impl EngineClient {
    pub fn new(
        url: impl Into<String>,
        access_token: impl Into<String>,
        chain: impl Into<String>,
        token_contract: Address,
        backend_wallet: Address,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            chain: chain.into(),
            token_contract,
            backend_wallet,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EngineResponse {
    result: MintSubmission,
}

#[async_trait]
impl TokenMinter for EngineClient {
    async fn mint_to(&self, to: &str, amount: &str) -> Result<MintSubmission, OnrampError> {
        let url = format!(
            "{}/contract/{}/{}/erc20/mint-to",
            self.url, self.chain, self.token_contract
        );

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header("x-backend-wallet-address", self.backend_wallet.to_string())
            .json(&serde_json::json!({ "toAddress": to, "amount": amount }))
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| OnrampError::MintingError(format!("minting request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OnrampError::MintingError(format!(
                "minting service returned {status}: {body}"
            )));
        }

        let parsed: EngineResponse = resp.json().await.map_err(|e| {
            OnrampError::MintingError(format!("minting service response parse failed: {e}"))
        })?;

        tracing::info!(
            queue_id = %parsed.result.queue_id,
            to,
            amount,
            "mint queued"
        );

        Ok(parsed.result)
    }
}
