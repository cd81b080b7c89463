//! The `$jsonSchema` subset understood by collection validators.
//!
//! Supported keywords are `bsonType`, `required`, `properties`, `items`,
//! `additionalProperties`, `title` and `description`. Anything else is
//! rejected when the schema is parsed, so a typo in a validator surfaces as
//! an [`Error::InvalidSchema`] at declaration time instead of silently
//! accepting every document.
//!
//! Keyword semantics follow JSON Schema: `required` and `properties` only
//! constrain objects, `items` only constrains arrays, and a field that is
//! present with a `null` value satisfies `required`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::bson_type::BsonType;
use crate::error::{Error, Result};

/// One or several accepted `bsonType`s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    One(BsonType),
    Any(Vec<BsonType>),
}

impl TypeSet {
    #[must_use]
    pub fn types(&self) -> &[BsonType] {
        match self {
            Self::One(t) => std::slice::from_ref(t),
            Self::Any(types) => types,
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        self.types().iter().any(|t| t.matches(value))
    }
}

/// A node of a `$jsonSchema` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JsonSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bson_type: Option<TypeSet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, JsonSchema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonSchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,
}

/// Why a value failed a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    MissingField(String),
    TypeMismatch {
        expected: Vec<BsonType>,
        found: BsonType,
    },
    UnexpectedField(String),
}

/// A single schema failure, located by a dotted path (`chord.3.value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = if self.path.is_empty() {
            "document"
        } else {
            self.path.as_str()
        };
        match &self.kind {
            ViolationKind::MissingField(field) => {
                write!(f, "{}: missing required field '{}'", at, field)
            }
            ViolationKind::TypeMismatch { expected, found } => {
                let expected: Vec<&str> = expected.iter().map(|t| t.as_str()).collect();
                write!(f, "{}: expected {}, found {}", at, expected.join(" or "), found)
            }
            ViolationKind::UnexpectedField(field) => {
                write!(f, "{}: field '{}' is not allowed", at, field)
            }
        }
    }
}

// Builders used by the collection catalog.
impl JsonSchema {
    #[must_use]
    pub fn of(bson_type: BsonType) -> Self {
        Self {
            bson_type: Some(TypeSet::One(bson_type)),
            ..Self::default()
        }
    }

    /// A schema accepting `bson_type` or `null`.
    #[must_use]
    pub fn nullable(bson_type: BsonType) -> Self {
        Self {
            bson_type: Some(TypeSet::Any(vec![bson_type, BsonType::Null])),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn object() -> Self {
        Self::of(BsonType::Object)
    }

    #[must_use]
    pub fn array_of(items: JsonSchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(BsonType::Array)
        }
    }

    #[must_use]
    pub fn required<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(fields.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: JsonSchema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

impl JsonSchema {
    /// Parse and check a raw `$jsonSchema` value.
    pub fn from_value(value: Value) -> Result<Self> {
        let schema: Self =
            serde_json::from_value(value).map_err(|e| Error::InvalidSchema(e.to_string()))?;
        schema.check("")?;
        Ok(schema)
    }

    /// Reject structurally valid but meaningless schemas.
    pub fn check(&self, path: &str) -> Result<()> {
        let at = if path.is_empty() { "$jsonSchema" } else { path };

        if let Some(TypeSet::Any(types)) = &self.bson_type {
            if types.is_empty() {
                return Err(Error::InvalidSchema(format!("{at}: bsonType list is empty")));
            }
            let distinct: BTreeSet<_> = types.iter().collect();
            if distinct.len() != types.len() {
                return Err(Error::InvalidSchema(format!(
                    "{at}: bsonType list contains duplicates"
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for field in &self.required {
            if field.is_empty() {
                return Err(Error::InvalidSchema(format!("{at}: empty required field name")));
            }
            if !seen.insert(field.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "{at}: required field '{field}' listed twice"
                )));
            }
        }

        for (name, child) in &self.properties {
            child.check(&join(path, name))?;
        }
        if let Some(items) = &self.items {
            items.check(&join(path, "items"))?;
        }
        Ok(())
    }

    /// Validate `value`, returning every violation found.
    #[must_use]
    pub fn validate(&self, value: &Value) -> Vec<Violation> {
        let mut violations = Vec::new();
        self.collect(value, "", &mut violations);
        violations
    }

    fn collect(&self, value: &Value, path: &str, out: &mut Vec<Violation>) {
        if let Some(types) = &self.bson_type {
            if !types.accepts(value) {
                out.push(Violation {
                    path: path.to_string(),
                    kind: ViolationKind::TypeMismatch {
                        expected: types.types().to_vec(),
                        found: BsonType::of(value),
                    },
                });
                return;
            }
        }

        match value {
            Value::Object(map) if BsonType::Object.matches(value) => {
                for field in &self.required {
                    if !map.contains_key(field) {
                        out.push(Violation {
                            path: path.to_string(),
                            kind: ViolationKind::MissingField(field.clone()),
                        });
                    }
                }
                for (name, field_value) in map {
                    match self.properties.get(name) {
                        Some(child) => child.collect(field_value, &join(path, name), out),
                        None if self.additional_properties == Some(false) => {
                            out.push(Violation {
                                path: path.to_string(),
                                kind: ViolationKind::UnexpectedField(name.clone()),
                            });
                        }
                        None => {}
                    }
                }
            }
            Value::Array(elements) => {
                if let Some(items) = &self.items {
                    for (index, element) in elements.iter().enumerate() {
                        items.collect(element, &join(path, &index.to_string()), out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}.{segment}")
    }
}
