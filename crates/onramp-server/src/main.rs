use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{web, App, HttpServer};

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use onramp::config::ServerConfig;
use onramp::engine::{EngineClient, TokenMinter};
use onramp::stripe::StripeClient;
use onramp_server::routes;
use onramp_server::state::AppState;

fn build_cors(origins: &[String]) -> Cors {
    if origins.is_empty() {
        // Default: allow localhost on any port
        Cors::default()
            .allowed_origin_fn(|origin, _| {
                origin
                    .to_str()
                    .map(|o| {
                        // Match http://localhost or http://localhost:PORT exactly
                        o == "http://localhost" || o.starts_with("http://localhost:")
                    })
                    .unwrap_or(false)
            })
            .allow_any_method()
            .allowed_headers(vec!["content-type", "stripe-signature"])
            .max_age(3600)
    } else {
        let mut cors = Cors::default();
        for origin in origins {
            cors = cors.allowed_origin(origin);
        }
        cors.allow_any_method()
            .allowed_headers(vec!["content-type", "stripe-signature"])
            .max_age(3600)
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}. Did you forget to add a \".env\" file?");
            std::process::exit(1);
        }
    };

    let stripe = StripeClient::new(config.stripe_secret_key.clone());
    let minter: Arc<dyn TokenMinter> = Arc::new(EngineClient::new(
        config.engine_url.clone(),
        config.engine_access_token.clone(),
        config.chain.clone(),
        config.token_contract,
        config.backend_wallet,
    ));

    let port = config.port;
    let rate_limit_rpm = config.rate_limit_rpm;
    let cors_origins = config.allowed_origins.clone();

    tracing::info!("Onramp server listening on port {port}");
    tracing::info!("Token contract: {}", config.token_contract);
    tracing::info!("Minting chain: {}", config.chain);
    tracing::info!("Rate limit: {rate_limit_rpm} req/min per IP");
    tracing::info!("  POST http://localhost:{port}/api/create-payment-intent");
    tracing::info!("  POST http://localhost:{port}/api/payment-webhook");

    let state = web::Data::new(AppState {
        config,
        stripe,
        minter,
    });

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(rate_limit_rpm)
        .finish()
        .expect("failed to build rate limiter config");

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&cors_origins))
            .wrap(Governor::new(&governor_conf))
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(65_536))
            .app_data(web::PayloadConfig::new(65_536))
            .service(routes::health)
            .service(routes::create_payment_intent)
            .service(routes::payment_webhook)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
