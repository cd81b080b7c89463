use thiserror::Error;

use crate::schema::Violation;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error(
        "document failed validation for collection {collection}: {}",
        summarize(.violations)
    )]
    Validation {
        collection: String,
        violations: Vec<Violation>,
    },

    #[error("duplicate key in collection {collection}: {message}")]
    DuplicateKey { collection: String, message: String },

    #[error("collection {name} already exists with a different definition")]
    CollectionConflict { name: String },

    #[error("index {name} on collection {collection} conflicts: {reason}")]
    IndexConflict {
        collection: String,
        name: String,
        reason: String,
    },
}

impl Error {
    /// Returns `true` when a write was rejected by a unique index.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    /// Returns `true` when a write was rejected by a collection validator.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
