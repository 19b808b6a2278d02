//! HTTP client for the instrument header endpoint.

use reqwest::StatusCode;
use serde_json::Value;

use pockethub_app::ports::QuoteSource;
use pockethub_domain::error::PocketError;
use pockethub_domain::isin::Isin;
use pockethub_domain::quote::Quote;

use crate::config::QuotesConfig;
use crate::error::QuotesError;

const INSTRUMENT_HEADER_PATH: &str = "api/v1/components/instrumentheader";

/// [`QuoteSource`] backed by the ING instrument header API.
///
/// One shared `reqwest::Client`, so connections are pooled across sensors.
#[derive(Debug, Clone)]
pub struct IngQuoteSource {
    client: reqwest::Client,
    base_url: String,
}

impl IngQuoteSource {
    /// Build a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`QuotesError::Http`] if the TLS backend cannot be initialised.
    pub fn new(config: &QuotesConfig) -> Result<Self, QuotesError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("pockethub/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, isin: &Isin) -> String {
        format!("{}/{INSTRUMENT_HEADER_PATH}/{isin}", self.base_url)
    }

    async fn lookup(&self, isin: &Isin) -> Result<bool, QuotesError> {
        let response = self.client.get(self.url(isin)).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if status.is_success() {
            return Ok(true);
        }
        Err(QuotesError::Status(status.as_u16()))
    }

    async fn fetch(&self, isin: &Isin) -> Result<Quote, QuotesError> {
        let response = self.client.get(self.url(isin)).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(QuotesError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        let payload: Value = serde_json::from_str(&body)?;
        Ok(Quote::from_payload(payload)?)
    }
}

impl QuoteSource for IngQuoteSource {
    #[tracing::instrument(skip(self, isin), fields(isin = %isin))]
    async fn instrument_exists(&self, isin: &Isin) -> Result<bool, PocketError> {
        let found = self.lookup(isin).await.inspect_err(|err| {
            tracing::warn!(error = %err, "instrument lookup failed");
        })?;
        tracing::debug!(found, "instrument lookup");
        Ok(found)
    }

    #[tracing::instrument(skip(self, isin), fields(isin = %isin))]
    async fn fetch_quote(&self, isin: &Isin) -> Result<Quote, PocketError> {
        let quote = self.fetch(isin).await.inspect_err(|err| {
            tracing::warn!(error = %err, "quote fetch failed");
        })?;
        tracing::debug!(price = ?quote.price(), "quote fetched");
        Ok(quote)
    }
}
