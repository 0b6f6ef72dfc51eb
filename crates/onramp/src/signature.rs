//! Webhook signature verification for the payment processor.
//!
//! Each delivery carries a `Stripe-Signature` header of the form
//! `t=<unix seconds>,v1=<hex hmac>`: HMAC-SHA256 with the shared webhook
//! secret over `"{t}.{raw body}"`. Multiple `v1` entries may appear during
//! secret rotation; any valid one accepts the delivery. Timestamps outside
//! the tolerance window are rejected to bound replay.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::constants::SIGNATURE_TOLERANCE;
use crate::error::OnrampError;

type HmacSha256 = Hmac<Sha256>;

/// Verify a webhook delivery against the shared secret.
///
/// `header` is the raw `Stripe-Signature` header value.
pub fn verify_webhook(secret: &[u8], body: &[u8], header: &str) -> Result<(), OnrampError> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    verify_webhook_at(secret, body, header, now)
}

/// Verification against an explicit clock.
pub fn verify_webhook_at(
    secret: &[u8],
    body: &[u8],
    header: &str,
    now: u64,
) -> Result<(), OnrampError> {
    let (timestamp, candidates) = parse_header(header)?;

    let age = now.abs_diff(timestamp);
    if age > SIGNATURE_TOLERANCE.as_secs() {
        return Err(OnrampError::SignatureError(format!(
            "timestamp outside tolerance ({age}s)"
        )));
    }

    let signed = signed_payload(timestamp, body);

    for candidate in &candidates {
        let mut mac =
            HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
        mac.update(&signed);

        // Invalid hex compares against zeros to stay constant-time.
        let expected = hex::decode(candidate).unwrap_or_else(|_| vec![0u8; 32]);

        // hmac crate's verify_slice uses constant-time comparison
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }

    Err(OnrampError::SignatureError(
        "no matching v1 signature".to_string(),
    ))
}

/// Compute the hex `v1` signature for a timestamp and body. Used to produce
/// valid deliveries in tests and local tooling.
pub fn sign_payload(secret: &[u8], timestamp: u64, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(&signed_payload(timestamp, body));
    hex::encode(mac.finalize().into_bytes())
}

fn signed_payload(timestamp: u64, body: &[u8]) -> Vec<u8> {
    let mut signed = Vec::with_capacity(body.len() + 21);
    signed.extend_from_slice(timestamp.to_string().as_bytes());
    signed.push(b'.');
    signed.extend_from_slice(body);
    signed
}

fn parse_header(header: &str) -> Result<(u64, Vec<&str>), OnrampError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(value.parse::<u64>().map_err(|_| {
                    OnrampError::SignatureError("malformed timestamp".to_string())
                })?);
            }
            Some(("v1", value)) => candidates.push(value),
            // Unknown scheme entries (e.g. v0) are ignored
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| OnrampError::SignatureError("missing t entry".to_string()))?;
    if candidates.is_empty() {
        return Err(OnrampError::SignatureError("missing v1 entry".to_string()));
    }

    Ok((timestamp, candidates))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().fold(String::new(), |mut s, b| {
            use std::fmt::Write;
            let _ = write!(s, "{b:02x}");
            s
        })
    }

    pub fn decode(s: &str) -> Result<Vec<u8>, ()> {
        if !s.len().is_multiple_of(2) || !s.is_ascii() {
            return Err(());
        }
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| ()))
            .collect()
    }
}
