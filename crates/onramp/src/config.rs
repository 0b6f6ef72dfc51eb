//! Process configuration.
//!
//! Every secret and address is read once at startup into an explicit struct;
//! request handlers never consult the environment, so a missing value fails
//! deterministically before the server binds.

use std::str::FromStr;

use alloy::primitives::Address;

use crate::constants::CHAIN;
use crate::error::OnrampError;

/// Server-side configuration for the intent and webhook endpoints.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Payment processor secret key.
    pub stripe_secret_key: String,
    /// Shared secret for webhook signature verification.
    pub webhook_secret: String,
    /// Minting service base URL.
    pub engine_url: String,
    /// Minting service access token.
    pub engine_access_token: String,
    /// ERC-20 token contract being sold.
    pub token_contract: Address,
    /// Wallet the minting service mints from.
    pub backend_wallet: Address,
    /// Chain slug understood by the minting service.
    pub chain: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub rate_limit_rpm: u64,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, OnrampError> {
        Ok(Self {
            stripe_secret_key: require("STRIPE_SECRET_KEY")?,
            webhook_secret: require("WEBHOOK_SECRET_KEY")?,
            engine_url: require("ENGINE_URL")?,
            engine_access_token: require("ENGINE_ACCESS_TOKEN")?,
            token_contract: require_address("TOKEN_CONTRACT_ADDRESS")?,
            backend_wallet: require_address("BACKEND_WALLET_ADDRESS")?,
            chain: or_default("CHAIN", CHAIN),
            port: parse_or("PORT", 3000),
            allowed_origins: parse_list("ALLOWED_ORIGINS"),
            rate_limit_rpm: parse_or("RATE_LIMIT_RPM", 60),
        })
    }
}

/// Client-side configuration for the purchase flow.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the onramp server.
    pub server_url: String,
    /// Payment processor publishable key (client-exposed).
    pub stripe_publishable_key: String,
    /// ERC-20 token contract being sold (client-exposed).
    pub token_contract: Address,
    /// Chain RPC endpoint for the mint event feed.
    pub rpc_url: String,
    /// The connected wallet's address.
    pub buyer_wallet_address: Address,
    /// Payment method confirmed against the intent.
    pub payment_method: String,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, OnrampError> {
        Ok(Self {
            server_url: or_default("ONRAMP_SERVER_URL", "http://localhost:3000"),
            stripe_publishable_key: require("STRIPE_PUBLISHABLE_KEY")?,
            token_contract: require_address("TOKEN_CONTRACT_ADDRESS")?,
            rpc_url: require("RPC_URL")?,
            buyer_wallet_address: require_address("BUYER_WALLET_ADDRESS")?,
            payment_method: or_default("STRIPE_PAYMENT_METHOD", "pm_card_visa"),
        })
    }
}

fn require(name: &str) -> Result<String, OnrampError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| OnrampError::ConfigError(format!("{name} is not set")))
}

fn require_address(name: &str) -> Result<Address, OnrampError> {
    require(name)?
        .parse()
        .map_err(|_| OnrampError::ConfigError(format!("{name} is not a valid address")))
}

fn or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_list(name: &str) -> Vec<String> {
    std::env::var(name)
        .ok()
        .map(|values| {
            values
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
