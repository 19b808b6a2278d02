//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod entity_service;
pub mod flow_service;
pub mod hub_service;
pub mod integration_context;
pub mod refresh_service;
