pub mod annotation;
pub mod beat_position;
pub mod chord;
pub mod extended_date;
pub mod note_midi;
pub mod pitch_contour;

pub use annotation::{Annotation, AnnotationRecords, AnnotationSet};
pub use beat_position::{BeatPosition, BeatPositionRecord};
pub use chord::{ChordEvent, ChordRecord};
pub use note_midi::{MidiNote, NoteMidiRecord, TranscriptionNote};
pub use pitch_contour::{ContourPoint, PitchContourRecord};

/// Collection names of the annotation store.
pub mod collections {
    pub const BEAT_POSITION: &str = "beat_position";
    pub const CHORD: &str = "chord";
    pub const NOTE_MIDI: &str = "note_midi";
    pub const PITCH_CONTOUR: &str = "pitch_contour";

    pub const ALL: [&str; 4] = [BEAT_POSITION, CHORD, NOTE_MIDI, PITCH_CONTOUR];
}
