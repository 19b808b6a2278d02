//! # pockethub-domain
//!
//! Pure domain model for the pockethub security price tracker.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **ISINs** and **quantities** with their invariants
//! - Define **Hubs** (a named list of tracked instruments, created by the setup wizard)
//! - Define **Quotes** and the per-instrument-type attribute mapping
//! - Define **Entities** (one price sensor per tracked instrument)
//! - Define **Events** (state-change and lifecycle records)
//! - Define the **flow** vocabulary shared by the setup and options wizards
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod entity;
pub mod event;
pub mod flow;
pub mod hub;
pub mod instrument;
pub mod isin;
pub mod quantity;
pub mod quote;
