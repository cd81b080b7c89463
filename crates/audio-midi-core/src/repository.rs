//! Writing typed annotation records into their collections.
//!
//! Records are upserted on their `(title, dataset_name)` key and stamped
//! with `inserted_at` on every write, so re-ingesting a recording replaces
//! its previous annotations instead of tripping the unique index.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::model::{Annotation, AnnotationSet};
use crate::store::{DocumentStore, Filter, ReplaceOutcome};

/// Whether a save created a new document or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveOutcome {
    Inserted,
    Updated,
}

/// Counts of a batch save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub inserted: usize,
    pub updated: usize,
    pub errors: usize,
}

impl SaveSummary {
    fn record(&mut self, collection: &str, result: Result<SaveOutcome>) {
        match result {
            Ok(SaveOutcome::Inserted) => self.inserted += 1,
            Ok(SaveOutcome::Updated) => self.updated += 1,
            Err(e) => {
                log::error!("Document save into {} failed: {}", collection, e);
                self.errors += 1;
            }
        }
    }
}

/// Upsert one record on its natural key.
pub fn save<A: Annotation>(store: &DocumentStore, record: &A) -> Result<SaveOutcome> {
    let mut record = record.clone();
    record.set_inserted_at(Utc::now());

    let filter = Filter::title_dataset(record.title(), record.dataset_name());
    let document = serde_json::to_value(&record)?;

    match store.replace_one(A::COLLECTION, &filter, document, true)? {
        ReplaceOutcome::Inserted(id) => {
            log::debug!("Document inserted into {}: {}", A::COLLECTION, id);
            Ok(SaveOutcome::Inserted)
        }
        ReplaceOutcome::Replaced(id) => {
            log::debug!("Document updated in {}: {}", A::COLLECTION, id);
            Ok(SaveOutcome::Updated)
        }
        ReplaceOutcome::NoMatch => Err(Error::InvalidData(format!(
            "upsert into {} neither matched nor inserted",
            A::COLLECTION
        ))),
    }
}

/// Save every record, counting failures instead of stopping at them.
pub fn save_all<'a, A, I>(store: &DocumentStore, records: I) -> SaveSummary
where
    A: Annotation + 'a,
    I: IntoIterator<Item = &'a A>,
{
    let mut summary = SaveSummary::default();
    for record in records {
        summary.record(A::COLLECTION, save(store, record));
    }
    summary
}

/// Save the four records of an annotated recording.
pub fn save_annotation_set(store: &DocumentStore, set: AnnotationSet) -> SaveSummary {
    let records = set.into_records();
    let mut summary = SaveSummary::default();

    summary.record(
        crate::model::collections::PITCH_CONTOUR,
        save(store, &records.pitch_contour),
    );
    summary.record(crate::model::collections::NOTE_MIDI, save(store, &records.note_midi));
    summary.record(
        crate::model::collections::BEAT_POSITION,
        save(store, &records.beat_position),
    );
    summary.record(crate::model::collections::CHORD, save(store, &records.chord));

    log::info!(
        "Saved annotations: {} inserted, {} updated, {} errors",
        summary.inserted,
        summary.updated,
        summary.errors
    );
    summary
}
