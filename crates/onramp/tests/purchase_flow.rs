use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};
use tokio::sync::mpsc;

use onramp::stripe::{PaymentConfirmer, PaymentOutcome};
use onramp::{await_mint, MintOutcome, MintedEvent, OnrampError, PurchaseSession, PurchaseStatus};

const DEADLINE: Duration = Duration::from_secs(30);

struct ScriptedConfirmer {
    outcome: Result<PaymentOutcome, ()>,
}

impl PaymentConfirmer for ScriptedConfirmer {
    async fn confirm(&self, _client_secret: &str) -> Result<PaymentOutcome, OnrampError> {
        self.outcome
            .clone()
            .map_err(|_| OnrampError::PaymentError("card declined".to_string()))
    }
}

fn buyer() -> Address {
    Address::repeat_byte(0x11)
}

fn mint_for(minted_to: Address, tag: u8) -> MintedEvent {
    MintedEvent {
        minted_to,
        quantity: U256::from(100u64),
        tx_hash: TxHash::repeat_byte(tag),
    }
}

/// Drive a session the way the client binary does: confirm, then race the
/// feed against the deadline and settle on the first signal.
async fn drive<C: PaymentConfirmer>(
    session: &mut PurchaseSession,
    confirmer: &C,
    events: &mut mpsc::Receiver<MintedEvent>,
) {
    assert!(session.request_payment());
    match confirmer.confirm("pi_test_secret_123").await {
        Ok(PaymentOutcome::Succeeded) => {
            assert!(session.payment_confirmed());
        }
        Ok(PaymentOutcome::Declined(_)) | Err(_) => {
            assert!(session.payment_failed());
            return;
        }
    }
    let outcome = await_mint(events, session.buyer(), DEADLINE).await;
    session.resolve_mint(outcome);
}

#[tokio::test(start_paused = true)]
async fn mint_before_deadline_ends_in_tokens_minted() {
    let confirmer = ScriptedConfirmer {
        outcome: Ok(PaymentOutcome::Succeeded),
    };
    let (tx, mut rx) = mpsc::channel(8);
    tx.send(mint_for(Address::repeat_byte(0x22), 0x01))
        .await
        .unwrap();
    tx.send(mint_for(buyer(), 0x02)).await.unwrap();

    let mut session = PurchaseSession::new(buyer());
    drive(&mut session, &confirmer, &mut rx).await;

    assert_eq!(session.status(), PurchaseStatus::TokensMinted);
    assert_eq!(session.mint_tx(), Some(TxHash::repeat_byte(0x02)));
}

#[tokio::test(start_paused = true)]
async fn deadline_without_matching_mint_ends_in_process_failed() {
    let confirmer = ScriptedConfirmer {
        outcome: Ok(PaymentOutcome::Succeeded),
    };
    let (tx, mut rx) = mpsc::channel(8);
    tx.send(mint_for(Address::repeat_byte(0x22), 0x01))
        .await
        .unwrap();

    let mut session = PurchaseSession::new(buyer());
    drive(&mut session, &confirmer, &mut rx).await;

    assert_eq!(session.status(), PurchaseStatus::ProcessFailed);
    assert_eq!(session.mint_tx(), None);
    drop(tx);
}

#[tokio::test(start_paused = true)]
async fn confirmation_error_returns_to_initial_without_racing() {
    let confirmer = ScriptedConfirmer { outcome: Err(()) };
    let (_tx, mut rx) = mpsc::channel(8);

    let start = tokio::time::Instant::now();
    let mut session = PurchaseSession::new(buyer());
    drive(&mut session, &confirmer, &mut rx).await;

    assert_eq!(session.status(), PurchaseStatus::Initial);
    // No deadline was started: the flow returned immediately
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn declined_status_is_treated_like_an_error() {
    let confirmer = ScriptedConfirmer {
        outcome: Ok(PaymentOutcome::Declined("requires_payment_method".to_string())),
    };
    let (_tx, mut rx) = mpsc::channel(8);

    let mut session = PurchaseSession::new(buyer());
    drive(&mut session, &confirmer, &mut rx).await;

    assert_eq!(session.status(), PurchaseStatus::Initial);
}

#[tokio::test(start_paused = true)]
async fn exactly_one_terminal_state_per_attempt() {
    let confirmer = ScriptedConfirmer {
        outcome: Ok(PaymentOutcome::Succeeded),
    };
    let (tx, mut rx) = mpsc::channel(8);
    tx.send(mint_for(buyer(), 0x0a)).await.unwrap();

    let mut session = PurchaseSession::new(buyer());
    drive(&mut session, &confirmer, &mut rx).await;
    assert_eq!(session.status(), PurchaseStatus::TokensMinted);

    // A stale deadline signal after settlement must be discarded
    assert!(!session.resolve_mint(MintOutcome::DeadlineExpired));
    assert_eq!(session.status(), PurchaseStatus::TokensMinted);
    assert_eq!(session.mint_tx(), Some(TxHash::repeat_byte(0x0a)));
}
