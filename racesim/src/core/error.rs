//! Error types shared by the lifecycle service, the engine and the store.

use crate::interfaces::store::StoreError;
use helpers::general::InputValueError;

/// Errors reported synchronously to the caller of a rally operation.
#[derive(Debug, thiserror::Error)]
pub enum RallyError {
    /// The referenced race or vehicle does not exist.
    #[error("{entity} with id {id} is not found")]
    NotFound {
        /// Kind of record that was looked up ("race", "vehicle").
        entity: &'static str,
        /// Key that was looked up.
        id: u64,
    },

    /// The operation collides with existing state, e.g. a duplicate race year or another race
    /// that is already running.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The owning race is not in the state the operation requires.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed input at the boundary (year range, field lengths, probabilities).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The store rejected a read or write.
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl RallyError {
    pub fn race_not_found(id: u32) -> RallyError {
        RallyError::NotFound {
            entity: "race",
            id: u64::from(id),
        }
    }

    pub fn vehicle_not_found(id: u64) -> RallyError {
        RallyError::NotFound {
            entity: "vehicle",
            id,
        }
    }
}

impl From<InputValueError> for RallyError {
    fn from(err: InputValueError) -> Self {
        RallyError::Validation(err.to_string())
    }
}
