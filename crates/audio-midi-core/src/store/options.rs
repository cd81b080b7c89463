use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{ValidationAction, ValidationLevel, Validator};

/// How a collection validates writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionOptions {
    pub validator: Option<Validator>,
    pub validation_level: ValidationLevel,
    pub validation_action: ValidationAction,
}

impl CollectionOptions {
    /// Options with `validator` at the default (moderate, error) strictness.
    #[must_use]
    pub fn with_validator(validator: Validator) -> Self {
        Self {
            validator: Some(validator),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn level(mut self, level: ValidationLevel) -> Self {
        self.validation_level = level;
        self
    }

    #[must_use]
    pub fn action(mut self, action: ValidationAction) -> Self {
        self.validation_action = action;
        self
    }
}

/// A declared collection as recorded in the store catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    pub name: String,
    pub options: CollectionOptions,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub(crate) const fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// One component of an index key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexKey {
    pub field: String,
    pub direction: SortDirection,
}

/// An index declaration: ordered keys, a name and a uniqueness flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexModel {
    pub name: String,
    pub keys: Vec<IndexKey>,
    pub unique: bool,
}

impl IndexModel {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: Vec::new(),
            unique: false,
        }
    }

    #[must_use]
    pub fn ascending(mut self, field: impl Into<String>) -> Self {
        self.keys.push(IndexKey {
            field: field.into(),
            direction: SortDirection::Ascending,
        });
        self
    }

    #[must_use]
    pub fn descending(mut self, field: impl Into<String>) -> Self {
        self.keys.push(IndexKey {
            field: field.into(),
            direction: SortDirection::Descending,
        });
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Check the name and key paths before they are spliced into DDL.
    pub fn check(&self) -> Result<()> {
        check_identifier("index name", &self.name)?;
        if self.keys.is_empty() {
            return Err(Error::InvalidData(format!("index {} has no keys", self.name)));
        }
        for key in &self.keys {
            check_field_path(&key.field)?;
        }
        Ok(())
    }
}

/// Outcome of an idempotent declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Declaration {
    Created,
    Unchanged,
    Updated,
}

impl std::fmt::Display for Declaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Unchanged => "unchanged",
            Self::Updated => "updated",
        })
    }
}

/// Collection and index names: `[A-Za-z_][A-Za-z0-9_]*`, at most 64 bytes.
pub(crate) fn check_identifier(what: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest && name.len() <= 64 {
        Ok(())
    } else {
        Err(Error::InvalidData(format!("invalid {what} '{name}'")))
    }
}

/// Field paths: identifiers joined by dots.
pub(crate) fn check_field_path(path: &str) -> Result<()> {
    path.split('.')
        .try_for_each(|segment| check_identifier("field path", segment))
        .map_err(|_| Error::InvalidData(format!("invalid field path '{path}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_rules() {
        assert!(check_identifier("collection", "beat_position").is_ok());
        assert!(check_identifier("collection", "_private").is_ok());
        assert!(check_identifier("collection", "").is_err());
        assert!(check_identifier("collection", "9lives").is_err());
        assert!(check_identifier("collection", "drop table").is_err());
        assert!(check_identifier("collection", "a\"b").is_err());
    }

    #[test]
    fn test_field_paths() {
        assert!(check_field_path("title").is_ok());
        assert!(check_field_path("meta.source").is_ok());
        assert!(check_field_path("meta..source").is_err());
        assert!(check_field_path("title')").is_err());
    }

    #[test]
    fn test_index_builder() {
        let index = IndexModel::new("unique_title_dataset")
            .ascending("title")
            .ascending("dataset_name")
            .unique();
        assert!(index.unique);
        assert_eq!(index.keys.len(), 2);
        assert_eq!(index.keys[1].field, "dataset_name");
        assert!(index.check().is_ok());
        assert!(IndexModel::new("empty").check().is_err());
    }
}
