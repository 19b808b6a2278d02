//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`PocketError`]
//! via `From` at the port boundaries.

use crate::isin::IsinError;

/// Boxed error coming from an adapter (storage, upstream HTTP, …).
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Base error type shared by the domain, application and adapter layers.
#[derive(Debug, thiserror::Error)]
pub enum PocketError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// The market data provider failed or answered with something unusable.
    #[error("upstream error")]
    Upstream(#[source] BoxedError),

    #[error("storage error")]
    Storage(#[source] BoxedError),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("entity_id must not be empty")]
    EmptyEntityId,

    #[error("quantity must not be negative")]
    NegativeQuantity,

    #[error("quantity is not a finite decimal number")]
    InvalidQuantity,

    #[error("invalid ISIN")]
    InvalidIsin(#[from] IsinError),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("ISIN {0} is already tracked")]
    DuplicateIsin(String),
}

/// A lookup did not find anything.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A write collided with an existing record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {key} already exists")]
pub struct ConflictError {
    pub entity: &'static str,
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_pocket_error() {
        let err: PocketError = ValidationError::EmptyName.into();
        assert!(matches!(err, PocketError::Validation(ValidationError::EmptyName)));
    }

    #[test]
    fn should_display_not_found_with_entity_and_id() {
        let err = NotFoundError {
            entity: "Hub",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Hub abc not found");
    }

    #[test]
    fn should_display_conflict_with_key() {
        let err: PocketError = ConflictError {
            entity: "Hub",
            key: "Depot".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Hub Depot already exists");
    }
}
