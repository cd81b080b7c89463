use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::json_schema::{JsonSchema, Violation};
use crate::error::{Error, Result};

/// A collection validator: `{ "$jsonSchema": { .. } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Validator {
    #[serde(rename = "$jsonSchema")]
    pub json_schema: JsonSchema,
}

impl Validator {
    #[must_use]
    pub fn new(json_schema: JsonSchema) -> Self {
        Self { json_schema }
    }

    /// Compile a raw validator document.
    pub fn from_value(value: Value) -> Result<Self> {
        let validator: Self =
            serde_json::from_value(value).map_err(|e| Error::InvalidSchema(e.to_string()))?;
        validator.check()?;
        Ok(validator)
    }

    pub fn check(&self) -> Result<()> {
        self.json_schema.check("")
    }

    #[must_use]
    pub fn validate(&self, document: &Value) -> Vec<Violation> {
        self.json_schema.validate(document)
    }

    #[must_use]
    pub fn accepts(&self, document: &Value) -> bool {
        self.validate(document).is_empty()
    }
}

/// Which writes a validator applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// No validation.
    Off,
    /// Inserts, and updates to documents that already pass validation.
    #[default]
    Moderate,
    /// Every insert and update.
    Strict,
}

/// What happens when a write fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationAction {
    #[default]
    Error,
    /// Log the violations and accept the write.
    Warn,
}

impl ValidationLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Moderate => "moderate",
            Self::Strict => "strict",
        }
    }
}

impl ValidationAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
        }
    }
}

impl FromStr for ValidationLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "off" => Ok(Self::Off),
            "moderate" => Ok(Self::Moderate),
            "strict" => Ok(Self::Strict),
            other => Err(Error::InvalidData(format!("unknown validation level '{other}'"))),
        }
    }
}

impl FromStr for ValidationAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            other => Err(Error::InvalidData(format!("unknown validation action '{other}'"))),
        }
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ValidationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validator_from_value() {
        let validator = Validator::from_value(json!({
            "$jsonSchema": { "bsonType": "object", "required": ["title"] }
        }))
        .unwrap();
        assert!(validator.accepts(&json!({ "title": "t" })));
        assert!(!validator.accepts(&json!({ "name": "t" })));
    }

    #[test]
    fn test_validator_requires_json_schema_key() {
        let err = Validator::from_value(json!({ "title": { "$type": "string" } })).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
    }

    #[test]
    fn test_validator_serializes_with_operator_key() {
        let validator = Validator::new(JsonSchema::object());
        assert_eq!(
            serde_json::to_value(&validator).unwrap(),
            json!({ "$jsonSchema": { "bsonType": "object" } })
        );
    }

    #[test]
    fn test_level_and_action_parse() {
        assert_eq!("moderate".parse::<ValidationLevel>().unwrap(), ValidationLevel::Moderate);
        assert_eq!("warn".parse::<ValidationAction>().unwrap(), ValidationAction::Warn);
        assert!("lenient".parse::<ValidationLevel>().is_err());
        assert_eq!(ValidationLevel::default(), ValidationLevel::Moderate);
    }
}
