//! # Service Error Type
//!
//! Unified error type for use-case operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Error Flow in Stockroom                             │
//! │                                                                         │
//! │  Caller                          Service Layer                          │
//! │  ──────                          ─────────────                          │
//! │                                                                         │
//! │  sales.create_sale(...)                                                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │  Use Case                                                        │   │
//! │  │  Result<T, ServiceError>                                         │   │
//! │  │         │                                                        │   │
//! │  │         ▼                                                        │   │
//! │  │  Reference missing?  ── ServiceError::NotFound ─────────────────►│   │
//! │  │         │                                                        │   │
//! │  │         ▼                                                        │   │
//! │  │  Domain rule broken? ── CoreError::InsufficientStock ── Core ───►│   │
//! │  │         │                                                        │   │
//! │  │         ▼                                                        │   │
//! │  │  Storage conflict?   ── DbError::Conflict ────────────── Db ────►│   │
//! │  │         │                                                        │   │
//! │  │         ▼                                                        │   │
//! │  │  Success (transaction committed) ───────────────────────────────►│   │
//! │  └──────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Any error before commit rolls the whole transaction back.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use stockroom_core::CoreError;
use stockroom_db::DbError;

/// Errors surfaced by use-case operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A referenced entity does not exist (or belongs to another store,
    /// which reads the same from the caller's side).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness rule would be violated.
    #[error("{field} already exists: {value}")]
    AlreadyExists { field: &'static str, value: String },

    /// A domain rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The storage layer failed or detected concurrent interference.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl ServiceError {
    /// Creates a NotFound error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates an AlreadyExists error.
    pub fn already_exists(field: &'static str, value: impl Into<String>) -> Self {
        ServiceError::AlreadyExists {
            field,
            value: value.into(),
        }
    }
}

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================
