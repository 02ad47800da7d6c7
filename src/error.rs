//! Typed errors for the civic services store.
//!
//! Mutating store operations never return these to the caller; they are
//! rendered into `StoreState::error` at the operation boundary. Reads that can
//! genuinely fail (export, storage access) return them directly.

use thiserror::Error;

use crate::civic_model::EntityKind;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Update or lookup on an id that is not in the collection.
    #[error("{} not found", kind.label())]
    NotFound { kind: EntityKind, id: String },

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] lmdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown record kind: {0}")]
    UnknownKind(String),

    #[error("unknown data format: {0}")]
    UnknownFormat(String),

    /// Some rows of an import could not be turned into records.
    #[error("failed to import {failed} of {total} {} rows", kind.as_str())]
    Import {
        kind: EntityKind,
        failed: usize,
        total: usize,
    },
}
