use thiserror::Error;

/// Errors returned by onramp operations.
#[derive(Debug, Error)]
pub enum OnrampError {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("signature error: {0}")]
    SignatureError(String),

    #[error("payment error: {0}")]
    PaymentError(String),

    #[error("minting error: {0}")]
    MintingError(String),

    #[error("chain error: {0}")]
    ChainError(String),

    #[error("http error: {0}")]
    HttpError(String),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
