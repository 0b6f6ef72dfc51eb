//! Onramp server: issues payment intents and turns the processor's webhook
//! notifications into mint calls against the minting service.

pub mod routes;
pub mod state;
