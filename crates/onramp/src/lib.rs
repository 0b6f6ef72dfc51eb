//! Card checkout that mints ERC-20 tokens to the payer's wallet.
//!
//! A buyer pays a fixed amount by credit card through the payment processor;
//! when the processor's webhook reports the charge succeeded, the server asks
//! the minting service to mint a fixed token quantity to the buyer's wallet,
//! and the buyer's client watches the chain for the mint to land — or gives
//! up after a fixed deadline.
//!
//! # Three-party model
//!
//! - **Client** ([`PurchaseSession`] + [`MintEventFeed`]) — confirms the card
//!   payment and races the on-chain mint event against the deadline
//! - **Server** (`onramp-server`) — issues payment intents and turns webhook
//!   notifications into mint calls
//! - **Minting service** ([`TokenMinter`]) — submits the on-chain mint;
//!   fire-and-forget past submission

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod feed;
pub mod purchase;
pub mod signature;
pub mod stripe;

use alloy::sol;

// Mint event emitted by the token contract when tokens are issued.
sol! {
    #[derive(Debug)]
    event TokensMinted(address indexed mintedTo, uint256 quantityMinted);
}

// ERC-20 view interface for the balance/supply display.
sol! {
    #[sol(rpc)]
    interface ERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function symbol() external view returns (string);
    }
}

// Re-exports
pub use constants::*;
pub use error::OnrampError;

pub use config::{ClientConfig, ServerConfig};
pub use engine::{EngineClient, MintSubmission, TokenMinter};
pub use feed::{MintEventFeed, MintSubscription};
pub use purchase::{await_mint, MintOutcome, MintedEvent, PurchaseSession, PurchaseStatus};
pub use stripe::{
    Charge, PaymentConfirmer, PaymentIntent, PaymentOutcome, StripeClient, WebhookEvent,
};
