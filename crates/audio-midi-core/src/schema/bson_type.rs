use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Extended-JSON key wrapping a date value.
pub const DATE_KEY: &str = "$date";

/// Extended-JSON key wrapping an object id.
pub const OID_KEY: &str = "$oid";

/// A `bsonType` name as accepted by `$jsonSchema`.
///
/// Documents are stored as JSON, so each type is matched against the JSON
/// shape that stands in for it: `double` only matches numbers written with a
/// fractional part (`1.0`), `int` only matches integers, and `date` /
/// `objectId` match the extended-JSON wrappers `{"$date": ..}` and
/// `{"$oid": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BsonType {
    Double,
    String,
    Object,
    Array,
    ObjectId,
    Bool,
    Date,
    Null,
    Int,
    Long,
    Number,
}

impl BsonType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::String => "string",
            Self::Object => "object",
            Self::Array => "array",
            Self::ObjectId => "objectId",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Null => "null",
            Self::Int => "int",
            Self::Long => "long",
            Self::Number => "number",
        }
    }

    /// Whether `value` is an instance of this type.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Double => matches!(value, Value::Number(n) if n.is_f64()),
            Self::Int => matches!(value, Value::Number(n)
                if n.as_i64().is_some_and(|v| i32::try_from(v).is_ok())),
            Self::Long => matches!(value, Value::Number(n) if n.as_i64().is_some()),
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Null => value.is_null(),
            Self::Array => value.is_array(),
            Self::Date => as_date(value).is_some(),
            Self::ObjectId => is_object_id(value),
            Self::Object => {
                matches!(value, Value::Object(_))
                    && as_date(value).is_none()
                    && !is_object_id(value)
            }
        }
    }

    /// The most specific type name describing `value`, for error messages.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Number(n) if n.is_f64() => Self::Double,
            Value::Number(_) if Self::Int.matches(value) => Self::Int,
            Value::Number(n) if n.is_i64() => Self::Long,
            Value::Number(_) => Self::Number,
            Value::Object(_) if as_date(value).is_some() => Self::Date,
            Value::Object(_) if is_object_id(value) => Self::ObjectId,
            Value::Object(_) => Self::Object,
        }
    }
}

impl fmt::Display for BsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wrap a timestamp as an extended-JSON date.
#[must_use]
pub fn date_value(at: DateTime<Utc>) -> Value {
    let mut map = Map::new();
    map.insert(
        DATE_KEY.to_string(),
        Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    Value::Object(map)
}

/// Read an extended-JSON date, either RFC 3339 text or epoch milliseconds.
#[must_use]
pub fn as_date(value: &Value) -> Option<DateTime<Utc>> {
    let inner = single_entry(value, DATE_KEY)?;
    match inner {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn is_object_id(value: &Value) -> bool {
    single_entry(value, OID_KEY)
        .and_then(Value::as_str)
        .is_some_and(|hex| hex.len() == 24 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

fn single_entry<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get(key),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_double_requires_fractional_representation() {
        assert!(BsonType::Double.matches(&json!(0.0)));
        assert!(BsonType::Double.matches(&json!(1.5)));
        assert!(!BsonType::Double.matches(&json!(1)));
    }

    #[test]
    fn test_int_is_bounded_to_32_bits() {
        assert!(BsonType::Int.matches(&json!(4)));
        assert!(BsonType::Int.matches(&json!(-4)));
        assert!(!BsonType::Int.matches(&json!(4_000_000_000_i64)));
        assert!(BsonType::Long.matches(&json!(4_000_000_000_i64)));
        assert!(!BsonType::Int.matches(&json!(4.0)));
    }

    #[test]
    fn test_date_wrapper() {
        let now = Utc::now();
        let value = date_value(now);
        assert!(BsonType::Date.matches(&value));
        assert!(!BsonType::Object.matches(&value));
        assert!(BsonType::Date.matches(&json!({"$date": 1_700_000_000_000_i64})));
        assert!(!BsonType::Date.matches(&json!({"$date": "yesterday"})));
        assert!(!BsonType::Date.matches(&json!("2024-01-01T00:00:00Z")));
    }

    #[test]
    fn test_object_id_wrapper() {
        let oid = json!({"$oid": "65a1f0c2e4b0a1b2c3d4e5f6"});
        assert!(BsonType::ObjectId.matches(&oid));
        assert!(!BsonType::Object.matches(&oid));
        assert!(!BsonType::ObjectId.matches(&json!({"$oid": "nope"})));
    }

    #[test]
    fn test_type_names_round_trip_through_serde() {
        let parsed: BsonType = serde_json::from_value(json!("objectId")).unwrap();
        assert_eq!(parsed, BsonType::ObjectId);
        assert_eq!(serde_json::to_value(BsonType::Double).unwrap(), json!("double"));
        assert!(serde_json::from_value::<BsonType>(json!("float")).is_err());
    }

    #[test]
    fn test_of_reports_most_specific_type() {
        assert_eq!(BsonType::of(&json!(1)), BsonType::Int);
        assert_eq!(BsonType::of(&json!(1.0)), BsonType::Double);
        assert_eq!(BsonType::of(&json!(null)), BsonType::Null);
        assert_eq!(BsonType::of(&json!({"a": 1})), BsonType::Object);
    }
}
