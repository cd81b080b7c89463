use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::extended_date;

/// A MIDI note event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidiNote {
    pub data_source: String,
    pub time: f64,
    pub duration: f64,
    /// MIDI pitch, fractional when the annotation carries pitch bends.
    pub value: f64,
}

/// A note of a guitar transcription.
///
/// Every attribute is optional: transcriptions come from several datasets
/// that annotate different subsets of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionNote {
    pub pitch: Option<i32>,
    pub onset: Option<f64>,
    pub offset: Option<f64>,
    pub fret_number: Option<i32>,
    pub string_number: Option<i32>,
    pub excitation_style: Option<String>,
    pub expression_style: Option<String>,
    pub loudness: Option<String>,
    pub modulation_frequency_range: Option<f64>,
    pub modulation_frequency: Option<f64>,
}

/// Note-level annotations of one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteMidiRecord {
    pub title: String,
    pub dataset_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_midi: Option<Vec<MidiNote>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<Vec<TranscriptionNote>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "extended_date")]
    pub inserted_at: Option<DateTime<Utc>>,
}

impl NoteMidiRecord {
    #[must_use]
    pub fn new(title: impl Into<String>, dataset_name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            dataset_name: dataset_name.into(),
            note_midi: None,
            transcription: None,
            inserted_at: None,
        }
    }

    #[must_use]
    pub fn with_notes(mut self, notes: Vec<MidiNote>) -> Self {
        self.note_midi = Some(notes);
        self
    }

    #[must_use]
    pub fn with_transcription(mut self, transcription: Vec<TranscriptionNote>) -> Self {
        self.transcription = Some(transcription);
        self
    }
}
