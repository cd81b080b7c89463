//! Serde adapter writing `Option<DateTime<Utc>>` as an extended-JSON date
//! (`{"$date": "2024-05-01T12:00:00.000Z"}`), the shape `bsonType: "date"`
//! accepts. Reading takes either `$date` form the validator accepts.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::schema::{as_date, date_value};

pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    value.map(date_value).serialize(serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer)?
        .map(|value| {
            as_date(&value).ok_or_else(|| {
                de::Error::custom(format!("expected an extended-JSON date, found {value}"))
            })
        })
        .transpose()
}
