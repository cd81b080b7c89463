use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::extended_date;

/// A sampled fundamental-frequency estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourPoint {
    /// Where the estimate came from (annotator or algorithm name).
    pub data_source: String,
    pub time: f64,
    /// Frequency in Hz.
    pub frequency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchContourRecord {
    pub title: String,
    pub dataset_name: String,
    pub pitch_contour: Vec<ContourPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "extended_date")]
    pub inserted_at: Option<DateTime<Utc>>,
}

impl PitchContourRecord {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        dataset_name: impl Into<String>,
        pitch_contour: Vec<ContourPoint>,
    ) -> Self {
        Self {
            title: title.into(),
            dataset_name: dataset_name.into(),
            pitch_contour,
            inserted_at: None,
        }
    }
}
