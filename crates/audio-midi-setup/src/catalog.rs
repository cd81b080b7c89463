//! Definitions of the four annotation collections.
//!
//! Every collection requires `title` and `dataset_name` strings, accepts an
//! optional `inserted_at` date, validates at the `moderate` level, and is
//! indexed by [`UNIQUE_TITLE_DATASET`] so that a recording's annotations
//! appear at most once per dataset.

use audio_midi_core::model::collections as names;
use audio_midi_core::schema::{BsonType, JsonSchema, ValidationLevel, Validator};
use audio_midi_core::store::{CollectionOptions, IndexModel};

/// Name of the compound unique index shared by all collections.
pub const UNIQUE_TITLE_DATASET: &str = "unique_title_dataset";

/// A collection with its validation rules and indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub options: CollectionOptions,
    pub indexes: Vec<IndexModel>,
}

/// The full catalog, in declaration order.
pub fn collections() -> Vec<CollectionSpec> {
    vec![beat_position(), chord(), note_midi(), pitch_contour()]
}

/// Look up one collection of the catalog by name.
pub fn find(name: &str) -> Option<CollectionSpec> {
    collections().into_iter().find(|spec| spec.name == name)
}

fn spec(name: &'static str, schema: JsonSchema) -> CollectionSpec {
    CollectionSpec {
        name,
        options: CollectionOptions::with_validator(Validator::new(schema))
            .level(ValidationLevel::Moderate),
        indexes: vec![title_dataset_index()],
    }
}

/// `(title, dataset_name)` ascending, unique.
pub fn title_dataset_index() -> IndexModel {
    IndexModel::new(UNIQUE_TITLE_DATASET)
        .ascending("title")
        .ascending("dataset_name")
        .unique()
}

/// Root schema shared by every collection, requiring `extra_required` on
/// top of the natural key.
fn document(extra_required: &[&str]) -> JsonSchema {
    JsonSchema::object()
        .required(["title", "dataset_name"])
        .required(extra_required.iter().copied())
        .property(
            "title",
            JsonSchema::of(BsonType::String).description("Title is required and must be a string"),
        )
        .property(
            "dataset_name",
            JsonSchema::of(BsonType::String)
                .description("Dataset name is required and must be a string"),
        )
        .property(
            "inserted_at",
            JsonSchema::of(BsonType::Date).description("Insertion date"),
        )
}

fn field(bson_type: BsonType, description: &str) -> JsonSchema {
    JsonSchema::of(bson_type).description(description)
}

pub fn beat_position() -> CollectionSpec {
    let item = JsonSchema::object()
        .required(["time", "position", "beat_units", "measure", "num_beats"])
        .property("time", field(BsonType::Double, "Time (double), required"))
        .property("position", field(BsonType::Int, "Position (int), required"))
        .property("beat_units", field(BsonType::Int, "Beat units (int), required"))
        .property("measure", field(BsonType::Int, "Measure (int), required"))
        .property("num_beats", field(BsonType::Int, "Number of beats (int), required"));

    let schema = document(&["beat_position"]).property(
        "beat_position",
        JsonSchema::array_of(item).description("List of beat position objects"),
    );
    spec(names::BEAT_POSITION, schema)
}

pub fn chord() -> CollectionSpec {
    let item = JsonSchema::object()
        .required(["time", "duration", "value"])
        .property("time", field(BsonType::Double, "Start time (double)"))
        .property("duration", field(BsonType::Double, "Duration (double)"))
        .property("value", field(BsonType::String, "Chord name or value (string)"));

    let schema = document(&["chord"]).property(
        "chord",
        JsonSchema::array_of(item).description("List of chord objects"),
    );
    spec(names::CHORD, schema)
}

pub fn note_midi() -> CollectionSpec {
    let note = JsonSchema::object()
        .required(["data_source", "time", "duration", "value"])
        .property("data_source", JsonSchema::of(BsonType::String))
        .property("time", JsonSchema::of(BsonType::Double))
        .property("duration", JsonSchema::of(BsonType::Double))
        .property("value", JsonSchema::of(BsonType::Double));

    // No required fields: every attribute is independently nullable.
    let transcription = JsonSchema::object()
        .property("pitch", JsonSchema::nullable(BsonType::Int))
        .property("onset", JsonSchema::nullable(BsonType::Double))
        .property("offset", JsonSchema::nullable(BsonType::Double))
        .property("fret_number", JsonSchema::nullable(BsonType::Int))
        .property("string_number", JsonSchema::nullable(BsonType::Int))
        .property("excitation_style", JsonSchema::nullable(BsonType::String))
        .property("expression_style", JsonSchema::nullable(BsonType::String))
        .property("loudness", JsonSchema::nullable(BsonType::String))
        .property("modulation_frequency_range", JsonSchema::nullable(BsonType::Double))
        .property("modulation_frequency", JsonSchema::nullable(BsonType::Double));

    let schema = document(&[])
        .property(
            "note_midi",
            JsonSchema::array_of(note).description("List of MIDI source data objects"),
        )
        .property(
            "transcription",
            JsonSchema::array_of(transcription).description("List of transcription detail objects"),
        );
    spec(names::NOTE_MIDI, schema)
}

pub fn pitch_contour() -> CollectionSpec {
    let item = JsonSchema::object()
        .required(["data_source", "time", "frequency"])
        .property(
            "data_source",
            field(BsonType::String, "Data source (e.g. algorithm name)"),
        )
        .property("time", field(BsonType::Double, "Timestamp (double)"))
        .property("frequency", field(BsonType::Double, "Frequency in Hz (double)"));

    let schema = document(&["pitch_contour"]).property(
        "pitch_contour",
        JsonSchema::array_of(item).description("List of melodic contour objects"),
    );
    spec(names::PITCH_CONTOUR, schema)
}
