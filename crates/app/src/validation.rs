//! ISIN validation for user input.
//!
//! A submitted ISIN must be well formed *and* known to the quote provider.

use pockethub_domain::flow::FormError;
use pockethub_domain::isin::Isin;

use crate::ports::QuoteSource;

/// Validate a raw ISIN typed into a form.
///
/// The local format check runs first; a malformed value never reaches the
/// network. Any failure of the remote lookup (unknown ISIN, timeout,
/// transport error) is reported as `invalid_isin`.
///
/// # Errors
///
/// Returns [`FormError::InvalidIsin`] when the ISIN is malformed or the
/// provider does not confirm it.
pub async fn validate_isin<Q: QuoteSource>(raw: &str, quotes: &Q) -> Result<Isin, FormError> {
    let isin = Isin::parse(raw).map_err(|err| {
        tracing::debug!(raw, %err, "rejecting malformed ISIN");
        FormError::InvalidIsin
    })?;

    match quotes.instrument_exists(&isin).await {
        Ok(true) => Ok(isin),
        Ok(false) => {
            tracing::info!(%isin, "ISIN not known to the quote provider");
            Err(FormError::InvalidIsin)
        }
        Err(err) => {
            tracing::error!(%isin, error = %err, "error validating ISIN");
            Err(FormError::InvalidIsin)
        }
    }
}
