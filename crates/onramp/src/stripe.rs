//! Minimal client for the payment processor's REST API.
//!
//! Only what this system needs: creating a payment intent, confirming it,
//! and the webhook event model. Everything else about the processor is an
//! external concern.

use std::collections::HashMap;

use serde::Deserialize;

use crate::constants::{
    PURCHASE_AMOUNT_MINOR, PURCHASE_CURRENCY, PURCHASE_DESCRIPTION, STRIPE_API_BASE,
    STRIPE_API_VERSION,
};
use crate::error::OnrampError;

/// Metadata key correlating a charge with the buyer's wallet.
pub const BUYER_METADATA_KEY: &str = "buyerWalletAddress";

/// Intent status the processor reports for a completed payment.
pub const STATUS_SUCCEEDED: &str = "succeeded";

/// A payment intent as returned by the processor.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub status: String,
}

/// A charge object carried inside webhook events.
#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    pub id: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Charge {
    /// Buyer wallet address attached at intent-creation time, if present.
    pub fn buyer_wallet_address(&self) -> Option<&str> {
        self.metadata
            .get(BUYER_METADATA_KEY)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// A webhook event envelope. Only `charge.succeeded` is acted on; every
/// other kind is acknowledged and ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: Charge,
}

/// Outcome of a payment confirmation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded,
    /// The processor answered with a non-succeeded intent status.
    Declined(String),
}

/// Client-side seam for confirming a payment. The purchase flow drives this
/// without knowing the transport behind it.
pub trait PaymentConfirmer: Send + Sync {
    /// Confirm the intent identified by `client_secret` with the processor.
    fn confirm(
        &self,
        client_secret: &str,
    ) -> impl std::future::Future<Output = Result<PaymentOutcome, OnrampError>> + Send;
}

/// Thin client over the processor's REST API.
///
/// Authenticates with whichever key it is given: the secret key for
/// server-side intent creation, the publishable key for client-side
/// confirmation.
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    key: String,
}

impl StripeClient {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: STRIPE_API_BASE.to_string(),
            key: key.into(),
        }
    }

    /// Point the client at a different API base.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Create a fixed-amount card payment intent tagged with the buyer's
    /// wallet address. No idempotency key — a retried call creates a
    /// distinct intent.
    pub async fn create_payment_intent(
        &self,
        buyer_wallet_address: &str,
    ) -> Result<PaymentIntent, OnrampError> {
        let url = format!("{}/v1/payment_intents", self.api_base);
        let params = [
            ("amount", PURCHASE_AMOUNT_MINOR.to_string()),
            ("currency", PURCHASE_CURRENCY.to_string()),
            ("description", PURCHASE_DESCRIPTION.to_string()),
            ("payment_method_types[]", "card".to_string()),
            (
                "metadata[buyerWalletAddress]",
                buyer_wallet_address.to_string(),
            ),
        ];
        self.post_form(&url, &params).await
    }

    /// Confirm an intent using its client secret, standing in for the
    /// browser SDK's confirm call.
    pub async fn confirm_payment_intent(
        &self,
        client_secret: &str,
        payment_method: &str,
    ) -> Result<PaymentIntent, OnrampError> {
        let id = intent_id_from_secret(client_secret)?;
        let url = format!("{}/v1/payment_intents/{id}/confirm", self.api_base);
        let params = [
            ("client_secret", client_secret.to_string()),
            ("payment_method", payment_method.to_string()),
        ];
        self.post_form(&url, &params).await
    }

    async fn post_form(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<PaymentIntent, OnrampError> {
        let resp = self
            .http
            .post(url)
            .basic_auth(&self.key, None::<&str>)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .form(params)
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| OnrampError::PaymentError(format!("processor request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OnrampError::PaymentError(format!(
                "processor returned {status}: {body}"
            )));
        }

        resp.json::<PaymentIntent>()
            .await
            .map_err(|e| OnrampError::PaymentError(format!("processor response parse failed: {e}")))
    }
}

/// Extract the intent id from a client secret of the form
/// `pi_..._secret_...`.
fn intent_id_from_secret(client_secret: &str) -> Result<&str, OnrampError> {
    client_secret
        .split_once("_secret")
        .map(|(id, _)| id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| OnrampError::ValidationError("malformed client secret".to_string()))
}
