use alloy::providers::RootProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use onramp::config::ClientConfig;
use onramp::constants::explorer_tx_url;
use onramp::{MintEventFeed, PurchaseStatus};
use onramp_client::{run_purchase, token_display, IntentClient, StripeConfirmer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}. Did you forget to add a \".env\" file?");
            std::process::exit(1);
        }
    };

    let provider: RootProvider =
        RootProvider::new_http(config.rpc_url.parse().expect("invalid RPC_URL"));

    tracing::info!("Buy tokens with a credit card");
    tracing::info!("Connected wallet: {}", config.buyer_wallet_address);

    match token_display(&provider, config.token_contract, config.buyer_wallet_address).await {
        Ok(token) => {
            tracing::info!("Your balance: {} {}", token.balance, token.symbol);
            tracing::info!("Total supply: {} {}", token.total_supply, token.symbol);
        }
        Err(e) => tracing::warn!(error = %e, "token display unavailable"),
    }

    let intent = IntentClient::new(config.server_url.clone());
    let client_secret = match intent.create_intent(config.buyer_wallet_address).await {
        Ok(secret) => secret,
        Err(e) => {
            tracing::error!(error = %e, "could not create a payment intent");
            std::process::exit(1);
        }
    };

    let confirmer = StripeConfirmer::new(
        config.stripe_publishable_key.clone(),
        config.payment_method.clone(),
    );
    let feed = MintEventFeed::new(provider.clone(), config.token_contract);

    let session = match run_purchase(&config, &confirmer, &feed, &client_secret).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "purchase flow failed");
            std::process::exit(1);
        }
    };

    match session.status() {
        PurchaseStatus::TokensMinted => {
            let tx = session
                .mint_tx()
                .expect("a minted session records its transaction");
            tracing::info!("You have received your tokens.");
            tracing::info!("View your transaction: {}", explorer_tx_url(tx));
        }
        PurchaseStatus::ProcessFailed => {
            tracing::error!("Oops, something went wrong. Please reach out to our support.");
            std::process::exit(1);
        }
        // Payment declined or errored; a fresh attempt starts over
        _ => std::process::exit(1),
    }
}
