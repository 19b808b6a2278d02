//! # pockethub-adapter-quotes-reqwest
//!
//! [`QuoteSource`](pockethub_app::ports::QuoteSource) implementation backed by
//! the public ING instrument header API, using [reqwest](https://docs.rs/reqwest).
//!
//! ## Dependency rule
//! Depends on `pockethub-app` (for the port trait) and `pockethub-domain`
//! (for ISINs and quotes). The `app` and `domain` crates must never
//! reference this adapter.

mod client;
mod config;
mod error;

pub use client::IngQuoteSource;
pub use config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, QuotesConfig};
pub use error::QuotesError;
