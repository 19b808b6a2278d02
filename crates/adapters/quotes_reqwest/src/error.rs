//! Errors raised while talking to the quote provider.

use pockethub_domain::error::PocketError;
use pockethub_domain::quote::QuoteError;

#[derive(Debug, thiserror::Error)]
pub enum QuotesError {
    /// Transport failure: DNS, connect, TLS, timeout.
    #[error("request to quote provider failed")]
    Http(#[from] reqwest::Error),

    #[error("quote provider answered with status {0}")]
    Status(u16),

    #[error("quote provider answered with invalid JSON")]
    Decode(#[from] serde_json::Error),

    #[error("unusable quote payload")]
    Payload(#[from] QuoteError),
}

impl From<QuotesError> for PocketError {
    fn from(err: QuotesError) -> Self {
        Self::Upstream(Box::new(err))
    }
}
