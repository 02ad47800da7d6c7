use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

use crate::error::StoreError;

/// JSON envelope returned by every C ABI function.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub enum AppResponse {
    DatabaseError(String),
    SerializationError(String),
    NotFound(String),
    ValidationError(String),
    BadRequest(String),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppResponse::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl From<StoreError> for AppResponse {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => AppResponse::NotFound(err.to_string()),
            StoreError::Serialization(e) => AppResponse::from(e),
            StoreError::Storage(e) => AppResponse::from(e),
            StoreError::Io(e) => AppResponse::DatabaseError(format!("IO error: {}", e)),
            StoreError::UnknownKind(_) | StoreError::UnknownFormat(_) => {
                AppResponse::BadRequest(err.to_string())
            }
            StoreError::Import { .. } => AppResponse::ValidationError(err.to_string()),
        }
    }
}

impl From<lmdb::Error> for AppResponse {
    fn from(err: lmdb::Error) -> Self {
        match err {
            lmdb::Error::NotFound => AppResponse::NotFound("Key not found".to_string()),
            lmdb::Error::Corrupted => {
                AppResponse::DatabaseError("Database is corrupted".to_string())
            }
            lmdb::Error::MapFull => {
                AppResponse::DatabaseError("Storage map is full".to_string())
            }
            _ => AppResponse::DatabaseError(format!("Database error: {}", err)),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }
}
