use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use onramp::constants::MINT_AMOUNT;
use onramp::signature;
use onramp::stripe::WebhookEvent;

use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    #[serde(default)]
    pub buyer_wallet_address: String,
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "onramp-server",
    }))
}

#[post("/api/create-payment-intent")]
pub async fn create_payment_intent(
    state: web::Data<AppState>,
    body: web::Json<CreateIntentRequest>,
) -> HttpResponse {
    let buyer = body.buyer_wallet_address.trim();
    if buyer.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "request is missing \"buyerWalletAddress\""
        }));
    }

    match state.stripe.create_payment_intent(buyer).await {
        Ok(intent) => {
            tracing::info!(intent = %intent.id, buyer, "payment intent created");
            HttpResponse::Ok().json(serde_json::json!({
                "clientSecret": intent.client_secret,
            }))
        }
        Err(e) => {
            tracing::error!(error = %e, "payment intent creation failed");
            HttpResponse::BadGateway().json(serde_json::json!({
                "error": "payment intent creation failed"
            }))
        }
    }
}

#[post("/api/payment-webhook")]
pub async fn payment_webhook(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> HttpResponse {
    let header = req
        .headers()
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok());

    let Some(header) = header else {
        tracing::warn!("webhook signature header missing");
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "authentication required"
        }));
    };

    if let Err(e) =
        signature::verify_webhook(state.config.webhook_secret.as_bytes(), &body, header)
    {
        tracing::warn!(error = %e, "webhook signature verification failed");
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "authentication failed"
        }));
    }

    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(_) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid event body"
            }));
        }
    };

    match event.kind.as_str() {
        "charge.succeeded" => {
            let charge = event.data.object;
            let Some(buyer) = charge.buyer_wallet_address() else {
                tracing::warn!(charge = %charge.id, "charge metadata is missing the buyer address");
                return HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "charge metadata is missing \"buyerWalletAddress\""
                }));
            };

            // TODO: deduplicate by charge id — the processor delivers
            // at-least-once, so a redelivered charge.succeeded mints twice.
            match state.minter.mint_to(buyer, MINT_AMOUNT).await {
                Ok(submission) => {
                    tracing::info!(
                        charge = %charge.id,
                        queue_id = %submission.queue_id,
                        buyer,
                        "mint submitted"
                    );
                }
                Err(e) => {
                    tracing::error!(charge = %charge.id, error = %e, "mint submission failed");
                    return HttpResponse::BadGateway().json(serde_json::json!({
                        "error": "minting request failed"
                    }));
                }
            }
        }
        // Any other processor event is acknowledged with 2xx and ignored,
        // otherwise the processor retries the delivery.
        other => {
            tracing::debug!(kind = other, "ignoring webhook event");
        }
    }

    HttpResponse::Ok().json(serde_json::json!({ "message": "OK" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use actix_web::{test, App};
    use alloy::primitives::Address;
    use async_trait::async_trait;

    use onramp::config::ServerConfig;
    use onramp::engine::{MintSubmission, TokenMinter};
    use onramp::error::OnrampError;
    use onramp::signature::sign_payload;
    use onramp::stripe::StripeClient;

    const WEBHOOK_SECRET: &str = "whsec_route_test";
    const BUYER: &str = "0x1111111111111111111111111111111111111111";

    #[derive(Default)]
    struct RecordingMinter {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl TokenMinter for RecordingMinter {
        async fn mint_to(&self, to: &str, amount: &str) -> Result<MintSubmission, OnrampError> {
            self.calls
                .lock()
                .unwrap()
                .push((to.to_string(), amount.to_string()));
            Ok(MintSubmission {
                queue_id: "queued-1".to_string(),
            })
        }
    }

    fn test_config() -> ServerConfig {
        ServerConfig {
            stripe_secret_key: "sk_test_dummy".to_string(),
            webhook_secret: WEBHOOK_SECRET.to_string(),
            engine_url: "http://localhost:3005".to_string(),
            engine_access_token: "test-token".to_string(),
            token_contract: Address::ZERO,
            backend_wallet: Address::ZERO,
            chain: "avalanche-fuji".to_string(),
            port: 3000,
            allowed_origins: vec![],
            rate_limit_rpm: 60,
        }
    }

    fn test_state(minter: Arc<RecordingMinter>) -> web::Data<AppState> {
        web::Data::new(AppState {
            config: test_config(),
            stripe: StripeClient::new("sk_test_dummy"),
            minter,
        })
    }

    fn signed_header(body: &str) -> String {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let sig = sign_payload(WEBHOOK_SECRET.as_bytes(), now, body.as_bytes());
        format!("t={now},v1={sig}")
    }

    fn charge_succeeded_body() -> String {
        serde_json::json!({
            "type": "charge.succeeded",
            "data": { "object": {
                "id": "ch_1",
                "metadata": { "buyerWalletAddress": BUYER }
            }}
        })
        .to_string()
    }

    #[actix_web::test]
    async fn test_charge_succeeded_mints_once() {
        let minter = Arc::new(RecordingMinter::default());
        let app = test::init_service(
            App::new()
                .app_data(test_state(minter.clone()))
                .service(payment_webhook),
        )
        .await;

        let body = charge_succeeded_body();
        let req = test::TestRequest::post()
            .uri("/api/payment-webhook")
            .insert_header(("Stripe-Signature", signed_header(&body)))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        let calls = minter.calls.lock().unwrap();
        assert_eq!(*calls, vec![(BUYER.to_string(), "100".to_string())]);
    }

    #[actix_web::test]
    async fn test_other_event_kinds_ack_without_minting() {
        let minter = Arc::new(RecordingMinter::default());
        let app = test::init_service(
            App::new()
                .app_data(test_state(minter.clone()))
                .service(payment_webhook),
        )
        .await;

        let body = serde_json::json!({
            "type": "payment_intent.created",
            "data": { "object": { "id": "pi_1" } }
        })
        .to_string();
        let req = test::TestRequest::post()
            .uri("/api/payment-webhook")
            .insert_header(("Stripe-Signature", signed_header(&body)))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        assert!(minter.calls.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_missing_signature_never_mints() {
        let minter = Arc::new(RecordingMinter::default());
        let app = test::init_service(
            App::new()
                .app_data(test_state(minter.clone()))
                .service(payment_webhook),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/payment-webhook")
            .set_payload(charge_succeeded_body())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
        assert!(minter.calls.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_invalid_signature_never_mints() {
        let minter = Arc::new(RecordingMinter::default());
        let app = test::init_service(
            App::new()
                .app_data(test_state(minter.clone()))
                .service(payment_webhook),
        )
        .await;

        let body = charge_succeeded_body();
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let sig = sign_payload(b"whsec_wrong_secret", now, body.as_bytes());
        let req = test::TestRequest::post()
            .uri("/api/payment-webhook")
            .insert_header(("Stripe-Signature", format!("t={now},v1={sig}")))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
        assert!(minter.calls.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_tampered_body_never_mints() {
        let minter = Arc::new(RecordingMinter::default());
        let app = test::init_service(
            App::new()
                .app_data(test_state(minter.clone()))
                .service(payment_webhook),
        )
        .await;

        let header = signed_header(&charge_succeeded_body());
        let tampered = serde_json::json!({
            "type": "charge.succeeded",
            "data": { "object": {
                "id": "ch_1",
                "metadata": { "buyerWalletAddress": "0x2222222222222222222222222222222222222222" }
            }}
        })
        .to_string();
        let req = test::TestRequest::post()
            .uri("/api/payment-webhook")
            .insert_header(("Stripe-Signature", header))
            .set_payload(tampered)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
        assert!(minter.calls.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_missing_buyer_metadata_is_a_data_error() {
        let minter = Arc::new(RecordingMinter::default());
        let app = test::init_service(
            App::new()
                .app_data(test_state(minter.clone()))
                .service(payment_webhook),
        )
        .await;

        let body = serde_json::json!({
            "type": "charge.succeeded",
            "data": { "object": { "id": "ch_1", "metadata": {} } }
        })
        .to_string();
        let req = test::TestRequest::post()
            .uri("/api/payment-webhook")
            .insert_header(("Stripe-Signature", signed_header(&body)))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
        assert!(minter.calls.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_create_intent_rejects_empty_buyer_address() {
        let minter = Arc::new(RecordingMinter::default());
        let app = test::init_service(
            App::new()
                .app_data(test_state(minter))
                .service(create_payment_intent),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/create-payment-intent")
            .set_json(serde_json::json!({ "buyerWalletAddress": "" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_create_intent_rejects_absent_buyer_address() {
        let minter = Arc::new(RecordingMinter::default());
        let app = test::init_service(
            App::new()
                .app_data(test_state(minter))
                .service(create_payment_intent),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/create-payment-intent")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_health_reports_ok() {
        let app = test::init_service(App::new().service(health)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }
}
