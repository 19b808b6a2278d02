//! Quote source port: market data lookups by ISIN.

use std::future::Future;

use pockethub_domain::error::PocketError;
use pockethub_domain::isin::Isin;
use pockethub_domain::quote::Quote;

/// Remote market data provider.
pub trait QuoteSource {
    /// Lightweight existence check used while validating user input.
    ///
    /// A provider answering "not found" yields `Ok(false)`; transport
    /// failures and unexpected answers are errors.
    fn instrument_exists(&self, isin: &Isin)
    -> impl Future<Output = Result<bool, PocketError>> + Send;

    /// Fetch the current quote of an instrument.
    fn fetch_quote(&self, isin: &Isin) -> impl Future<Output = Result<Quote, PocketError>> + Send;
}

impl<T: QuoteSource + Send + Sync> QuoteSource for std::sync::Arc<T> {
    fn instrument_exists(
        &self,
        isin: &Isin,
    ) -> impl Future<Output = Result<bool, PocketError>> + Send {
        (**self).instrument_exists(isin)
    }

    fn fetch_quote(&self, isin: &Isin) -> impl Future<Output = Result<Quote, PocketError>> + Send {
        (**self).fetch_quote(isin)
    }
}
