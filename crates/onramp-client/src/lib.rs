//! Purchase client for the onramp.
//!
//! Stands in for the browser page: fetches a payment intent from the onramp
//! server, confirms the card payment with the processor, then watches the
//! chain until the purchased tokens land in the buyer's wallet — or the
//! deadline passes and the attempt is reported failed.

use alloy::primitives::{Address, U256};
use alloy::providers::Provider;

use onramp::config::ClientConfig;
use onramp::constants::MINT_DEADLINE;
use onramp::error::OnrampError;
use onramp::stripe::{PaymentConfirmer, PaymentOutcome, StripeClient, STATUS_SUCCEEDED};
use onramp::{await_mint, MintEventFeed, PurchaseSession, ERC20};

/// Fetches the payment client secret from the onramp server.
pub struct IntentClient {
    http: reqwest::Client,
    server_url: String,
}

impl IntentClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Ask the server to create a payment intent for `buyer`.
    pub async fn create_intent(&self, buyer: Address) -> Result<String, OnrampError> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct IntentResponse {
            client_secret: String,
        }

        let url = format!("{}/api/create-payment-intent", self.server_url);
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "buyerWalletAddress": buyer.to_string() }))
            .send()
            .await
            .map_err(|e| OnrampError::HttpError(format!("intent request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(OnrampError::HttpError(format!(
                "intent request returned {status}"
            )));
        }

        let parsed: IntentResponse = resp
            .json()
            .await
            .map_err(|e| OnrampError::HttpError(format!("intent response parse failed: {e}")))?;
        Ok(parsed.client_secret)
    }
}

/// Confirms intents directly with the processor using the publishable key,
/// standing in for the browser SDK's confirm call.
pub struct StripeConfirmer {
    stripe: StripeClient,
    payment_method: String,
}

impl StripeConfirmer {
    pub fn new(publishable_key: impl Into<String>, payment_method: impl Into<String>) -> Self {
        Self {
            stripe: StripeClient::new(publishable_key),
            payment_method: payment_method.into(),
        }
    }
}

impl PaymentConfirmer for StripeConfirmer {
    async fn confirm(&self, client_secret: &str) -> Result<PaymentOutcome, OnrampError> {
        let intent = self
            .stripe
            .confirm_payment_intent(client_secret, &self.payment_method)
            .await?;
        if intent.status == STATUS_SUCCEEDED {
            Ok(PaymentOutcome::Succeeded)
        } else {
            Ok(PaymentOutcome::Declined(intent.status))
        }
    }
}

/// Token facts shown before purchase, mirroring the page header.
pub struct TokenDisplay {
    pub symbol: String,
    pub balance: U256,
    pub total_supply: U256,
}

/// Read the buyer's balance and the token supply for display.
pub async fn token_display<P: Provider>(
    provider: &P,
    token: Address,
    owner: Address,
) -> Result<TokenDisplay, OnrampError> {
    let contract = ERC20::new(token, provider);
    let symbol = contract
        .symbol()
        .call()
        .await
        .map_err(|e| OnrampError::ChainError(format!("symbol failed: {e}")))?;
    let balance = contract
        .balanceOf(owner)
        .call()
        .await
        .map_err(|e| OnrampError::ChainError(format!("balanceOf failed: {e}")))?;
    let total_supply = contract
        .totalSupply()
        .call()
        .await
        .map_err(|e| OnrampError::ChainError(format!("totalSupply failed: {e}")))?;

    Ok(TokenDisplay {
        symbol,
        balance,
        total_supply,
    })
}

/// Run one purchase attempt end-to-end and return the settled session.
///
/// Confirms the payment; only on success does the flow subscribe to the mint
/// feed and start the deadline. The subscription is torn down when this
/// returns, whatever the outcome — no watch survives the attempt.
pub async fn run_purchase<C, P>(
    config: &ClientConfig,
    confirmer: &C,
    feed: &MintEventFeed<P>,
    client_secret: &str,
) -> Result<PurchaseSession, OnrampError>
where
    C: PaymentConfirmer,
    P: Provider + Clone + Send + Sync + 'static,
{
    let mut session = PurchaseSession::new(config.buyer_wallet_address);
    session.request_payment();
    tracing::info!("processing your request");

    match confirmer.confirm(client_secret).await {
        Ok(PaymentOutcome::Succeeded) => {
            session.payment_confirmed();
        }
        Ok(PaymentOutcome::Declined(status)) => {
            session.payment_failed();
            tracing::warn!(%status, "payment failed, please try again");
            return Ok(session);
        }
        Err(e) => {
            session.payment_failed();
            tracing::warn!(error = %e, "there was an error with the payment");
            return Ok(session);
        }
    }

    tracing::info!("thank you for your payment, minting your tokens now");

    let mut subscription = feed.subscribe().await?;
    let outcome = await_mint(
        &mut subscription.events,
        session.buyer(),
        MINT_DEADLINE,
    )
    .await;
    session.resolve_mint(outcome);
    drop(subscription);

    Ok(session)
}
