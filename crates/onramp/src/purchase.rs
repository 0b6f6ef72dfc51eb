//! Purchase lifecycle: payment confirmation through mint settlement.
//!
//! A purchase attempt walks `Initial → PaymentRequested → PaymentConfirmed`
//! and then races the on-chain mint event against a fixed deadline. The race
//! is decided exactly once: the first signal wins and the loser is discarded.

use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};
use tokio::sync::mpsc;

/// A `TokensMinted` observation from the token contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedEvent {
    pub minted_to: Address,
    pub quantity: U256,
    pub tx_hash: TxHash,
}

/// Status of a single purchase attempt.
///
/// `TokensMinted` and `ProcessFailed` are terminal; a new attempt starts a
/// fresh session at `Initial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseStatus {
    Initial,
    PaymentRequested,
    PaymentConfirmed,
    TokensMinted,
    ProcessFailed,
}

impl PurchaseStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PurchaseStatus::TokensMinted | PurchaseStatus::ProcessFailed
        )
    }
}

/// Outcome of the mint race for a confirmed payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintOutcome {
    /// A mint addressed to the session's buyer landed before the deadline.
    Minted(MintedEvent),
    /// The deadline elapsed with no matching mint observed.
    DeadlineExpired,
}

/// State machine for one purchase attempt.
///
/// Transition methods return whether the transition applied; a call that does
/// not match the current status is a no-op. In particular,
/// [`resolve_mint`](Self::resolve_mint) refuses to touch a terminal session,
/// so a deadline firing after a mint was observed cannot revert the session
/// to failure.
#[derive(Debug)]
pub struct PurchaseSession {
    buyer: Address,
    status: PurchaseStatus,
    mint_tx: Option<TxHash>,
}

impl PurchaseSession {
    /// Start a new attempt for `buyer` at `Initial`.
    pub fn new(buyer: Address) -> Self {
        Self {
            buyer,
            status: PurchaseStatus::Initial,
            mint_tx: None,
        }
    }

    pub fn buyer(&self) -> Address {
        self.buyer
    }

    pub fn status(&self) -> PurchaseStatus {
        self.status
    }

    /// Transaction hash of the observed mint, once `TokensMinted`.
    pub fn mint_tx(&self) -> Option<TxHash> {
        self.mint_tx
    }

    /// `Initial → PaymentRequested`: the buyer submitted the payment form.
    pub fn request_payment(&mut self) -> bool {
        if self.status != PurchaseStatus::Initial {
            return false;
        }
        self.status = PurchaseStatus::PaymentRequested;
        true
    }

    /// `PaymentRequested → Initial`: confirmation errored or reported a
    /// non-succeeded status. The buyer may resubmit; nothing retries
    /// automatically.
    pub fn payment_failed(&mut self) -> bool {
        if self.status != PurchaseStatus::PaymentRequested {
            return false;
        }
        self.status = PurchaseStatus::Initial;
        true
    }

    /// `PaymentRequested → PaymentConfirmed`: the processor reported success.
    /// The caller now subscribes to the mint feed and starts the deadline.
    pub fn payment_confirmed(&mut self) -> bool {
        if self.status != PurchaseStatus::PaymentRequested {
            return false;
        }
        self.status = PurchaseStatus::PaymentConfirmed;
        true
    }

    /// Apply the race outcome. Only a `PaymentConfirmed` session moves; once
    /// terminal, later outcomes are discarded.
    pub fn resolve_mint(&mut self, outcome: MintOutcome) -> bool {
        if self.status != PurchaseStatus::PaymentConfirmed {
            return false;
        }
        match outcome {
            MintOutcome::Minted(event) => {
                self.mint_tx = Some(event.tx_hash);
                self.status = PurchaseStatus::TokensMinted;
            }
            MintOutcome::DeadlineExpired => {
                self.status = PurchaseStatus::ProcessFailed;
            }
        }
        true
    }
}

/// Race the mint feed against `deadline` for a mint addressed to `buyer`.
///
/// The first signal wins: a matching event discards the remaining deadline,
/// and an expired deadline discards any later event. Mints for other
/// addresses never resolve the race. A feed that closes early does not fail
/// the race — the deadline still decides, so a dropped subscription looks
/// like a mint that never landed.
pub async fn await_mint(
    events: &mut mpsc::Receiver<MintedEvent>,
    buyer: Address,
    deadline: Duration,
) -> MintOutcome {
    let timer = tokio::time::sleep(deadline);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            _ = &mut timer => return MintOutcome::DeadlineExpired,
            event = events.recv() => match event {
                Some(event) if event.minted_to == buyer => {
                    return MintOutcome::Minted(event);
                }
                // Mint for another buyer
                Some(_) => {}
                None => {
                    timer.as_mut().await;
                    return MintOutcome::DeadlineExpired;
                }
            },
        }
    }
}
