use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use super::beat_position::{BeatPosition, BeatPositionRecord};
use super::chord::{ChordEvent, ChordRecord};
use super::collections;
use super::note_midi::{MidiNote, NoteMidiRecord};
use super::pitch_contour::{ContourPoint, PitchContourRecord};

/// A record stored in one of the annotation collections, identified by its
/// `(title, dataset_name)` pair.
pub trait Annotation: Serialize + DeserializeOwned + Clone {
    /// The collection this record kind lives in.
    const COLLECTION: &'static str;

    fn title(&self) -> &str;

    fn dataset_name(&self) -> &str;

    fn set_inserted_at(&mut self, at: DateTime<Utc>);
}

macro_rules! impl_annotation {
    ($record:ty, $collection:expr) => {
        impl Annotation for $record {
            const COLLECTION: &'static str = $collection;

            fn title(&self) -> &str {
                &self.title
            }

            fn dataset_name(&self) -> &str {
                &self.dataset_name
            }

            fn set_inserted_at(&mut self, at: DateTime<Utc>) {
                self.inserted_at = Some(at);
            }
        }
    };
}

impl_annotation!(BeatPositionRecord, collections::BEAT_POSITION);
impl_annotation!(ChordRecord, collections::CHORD);
impl_annotation!(NoteMidiRecord, collections::NOTE_MIDI);
impl_annotation!(PitchContourRecord, collections::PITCH_CONTOUR);

/// Every annotation extracted from one recording.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSet {
    pub title: String,
    pub dataset_name: String,
    pub pitch_contour: Vec<ContourPoint>,
    pub note_midi: Vec<MidiNote>,
    pub beat_position: Vec<BeatPosition>,
    pub chord: Vec<ChordEvent>,
}

/// An [`AnnotationSet`] split into one record per collection.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecords {
    pub pitch_contour: PitchContourRecord,
    pub note_midi: NoteMidiRecord,
    pub beat_position: BeatPositionRecord,
    pub chord: ChordRecord,
}

impl AnnotationSet {
    #[must_use]
    pub fn new(title: impl Into<String>, dataset_name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            dataset_name: dataset_name.into(),
            pitch_contour: Vec::new(),
            note_midi: Vec::new(),
            beat_position: Vec::new(),
            chord: Vec::new(),
        }
    }

    #[must_use]
    pub fn into_records(self) -> AnnotationRecords {
        let Self {
            title,
            dataset_name,
            pitch_contour,
            note_midi,
            beat_position,
            chord,
        } = self;

        AnnotationRecords {
            pitch_contour: PitchContourRecord::new(
                title.clone(),
                dataset_name.clone(),
                pitch_contour,
            ),
            note_midi: NoteMidiRecord::new(title.clone(), dataset_name.clone())
                .with_notes(note_midi),
            beat_position: BeatPositionRecord::new(
                title.clone(),
                dataset_name.clone(),
                beat_position,
            ),
            chord: ChordRecord::new(title, dataset_name, chord),
        }
    }
}
