use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::extended_date;

/// A chord label spanning `[time, time + duration)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordEvent {
    pub time: f64,
    pub duration: f64,
    /// Chord symbol, e.g. `"C:maj"` or `"A:min7"`.
    pub value: String,
}

impl ChordEvent {
    #[must_use]
    pub fn new(time: f64, duration: f64, value: impl Into<String>) -> Self {
        Self {
            time,
            duration,
            value: value.into(),
        }
    }
}

/// Chord annotations of one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordRecord {
    pub title: String,
    pub dataset_name: String,
    pub chord: Vec<ChordEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "extended_date")]
    pub inserted_at: Option<DateTime<Utc>>,
}

impl ChordRecord {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        dataset_name: impl Into<String>,
        chord: Vec<ChordEvent>,
    ) -> Self {
        Self {
            title: title.into(),
            dataset_name: dataset_name.into(),
            chord,
            inserted_at: None,
        }
    }
}
