use std::time::Duration;

use alloy::primitives::TxHash;

/// Chain the token contract lives on (minting-service chain slug).
pub const CHAIN: &str = "avalanche-fuji";

/// Avalanche Fuji chain ID.
pub const CHAIN_ID: u64 = 43113;

/// Charge amount in the processor's minor-unit convention ($100.00).
pub const PURCHASE_AMOUNT_MINOR: u64 = 100_00;

/// Charge currency.
pub const PURCHASE_CURRENCY: &str = "usd";

/// Description attached to every payment intent.
pub const PURCHASE_DESCRIPTION: &str = "Token delivered by the minting service";

/// Token units minted per successful charge, human-readable.
pub const MINT_AMOUNT: &str = "100";

/// How long the client waits for the mint to land on-chain.
pub const MINT_DEADLINE: Duration = Duration::from_secs(30);

/// How often the mint event feed polls for new logs.
pub const FEED_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Payment processor REST API base URL.
pub const STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Processor API version pinned on every request.
pub const STRIPE_API_VERSION: &str = "2023-10-16";

/// Maximum accepted age of a webhook signature timestamp.
pub const SIGNATURE_TOLERANCE: Duration = Duration::from_secs(300);

/// Block explorer base URL.
pub const EXPLORER_BASE: &str = "https://testnet.snowtrace.io";

/// Block-explorer link for a transaction.
pub fn explorer_tx_url(tx: TxHash) -> String {
    format!("{EXPLORER_BASE}/tx/{tx}?chainId={CHAIN_ID}")
}
