//! # pockethub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Drive the setup and options wizards over JSON (`/api/flows`)
//! - Expose hubs and their price sensors (`/api/hubs`, `/api/entities`)
//! - Stream domain events to clients as Server-Sent Events
//! - Map [`PocketError`](pockethub_domain::error::PocketError) into HTTP status codes
//!
//! ## Dependency rule
//! Depends on `pockethub-app` (for port traits and services) and `pockethub-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod test_support;
