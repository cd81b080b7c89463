use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::extended_date;

/// One beat marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatPosition {
    /// Onset in seconds.
    pub time: f64,
    /// Position of the beat within its measure (1-based).
    pub position: i32,
    /// Beat unit of the time signature (the denominator).
    pub beat_units: i32,
    pub measure: i32,
    /// Beats per measure (the numerator).
    pub num_beats: i32,
}

/// Beat annotations of one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatPositionRecord {
    pub title: String,
    pub dataset_name: String,
    pub beat_position: Vec<BeatPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "extended_date")]
    pub inserted_at: Option<DateTime<Utc>>,
}

impl BeatPositionRecord {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        dataset_name: impl Into<String>,
        beat_position: Vec<BeatPosition>,
    ) -> Self {
        Self {
            title: title.into(),
            dataset_name: dataset_name.into(),
            beat_position,
            inserted_at: None,
        }
    }
}
