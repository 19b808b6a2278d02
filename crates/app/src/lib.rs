//! # pockethub-app
//!
//! Application layer: use-cases, flows and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `HubRepository`: CRUD for hubs
//!   - `EntityRepository`: CRUD for price sensor entities
//!   - `EventPublisher`: broadcast domain events
//!   - `QuoteSource`: market data lookups by ISIN
//! - Define **driving/inbound ports** as use-case structs:
//!   - `HubService`: set up, unload, reload and remove hubs
//!   - `EntityService`: register, update, list, get, remove sensors
//!   - `RefreshService`: poll quotes and update sensor state
//!   - `FlowService`: run the setup and options wizards
//! - Provide **in-process infrastructure** (event bus, loaded-hub registry)
//!   that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `pockethub-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod flows;
pub mod ports;
pub mod registry;
pub mod services;
pub mod validation;

#[cfg(test)]
mod test_support;
