//! # pockethub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement [`HubRepository`](pockethub_app::ports::HubRepository) and
//!   [`EntityRepository`](pockethub_app::ports::EntityRepository)
//! - Manage the `SQLite` connection pool and run the embedded migrations
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `pockethub-app` (for port traits) and `pockethub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod entity_repo;
mod error;
mod hub_repo;
mod pool;

pub use entity_repo::SqliteEntityRepository;
pub use error::StorageError;
pub use hub_repo::SqliteHubRepository;
pub use pool::{Config, Database};
