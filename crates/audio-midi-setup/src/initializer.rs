//! Applying the collection catalog to a store.
//!
//! Initialization is a linear sequence of independent declarations: for
//! each collection, declare it with its validator, then declare its
//! indexes. The first failing declaration aborts the run and its error is
//! returned unchanged; declarations that already succeeded stay applied.

use audio_midi_core::store::{CollectionOptions, Declaration, DocumentStore, IndexModel};
use audio_midi_core::{Error, Result};

use crate::catalog::CollectionSpec;

/// The declarative operations initialization needs from a store.
pub trait SchemaTarget {
    /// Declare a collection; identical re-declaration is a no-op.
    fn create_collection(&self, name: &str, options: &CollectionOptions) -> Result<Declaration>;

    /// Replace the validation rules of an existing collection.
    fn modify_collection(&self, name: &str, options: &CollectionOptions) -> Result<()>;

    /// Declare an index; identical re-declaration is a no-op.
    fn create_index(&self, collection: &str, index: &IndexModel) -> Result<Declaration>;
}

impl SchemaTarget for DocumentStore {
    fn create_collection(&self, name: &str, options: &CollectionOptions) -> Result<Declaration> {
        DocumentStore::create_collection(self, name, options)
    }

    fn modify_collection(&self, name: &str, options: &CollectionOptions) -> Result<()> {
        DocumentStore::modify_collection(self, name, options)
    }

    fn create_index(&self, collection: &str, index: &IndexModel) -> Result<Declaration> {
        DocumentStore::create_index(self, collection, index)
    }
}

/// What happened to one collection during initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    pub name: String,
    pub collection: Declaration,
    pub indexes: Vec<(String, Declaration)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    pub collections: Vec<CollectionReport>,
}

impl InitReport {
    /// Whether the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.collections.iter().all(|c| {
            c.collection == Declaration::Unchanged
                && c.indexes.iter().all(|(_, d)| *d == Declaration::Unchanged)
        })
    }
}

/// Declares catalog collections against a [`SchemaTarget`].
#[derive(Debug)]
pub struct SchemaInitializer<'a, T: SchemaTarget> {
    target: &'a T,
    update_validators: bool,
}

impl<'a, T: SchemaTarget> SchemaInitializer<'a, T> {
    pub fn new(target: &'a T) -> Self {
        Self {
            target,
            update_validators: false,
        }
    }

    /// Re-apply catalog validators to collections whose stored definition
    /// drifted, instead of failing with a conflict.
    #[must_use]
    pub fn update_validators(mut self, enabled: bool) -> Self {
        self.update_validators = enabled;
        self
    }

    pub fn run(&self, specs: &[CollectionSpec]) -> Result<InitReport> {
        let mut report = InitReport::default();

        for spec in specs {
            let collection = self.declare_collection(spec)?;

            let mut indexes = Vec::with_capacity(spec.indexes.len());
            for index in &spec.indexes {
                let declared = self.target.create_index(spec.name, index)?;
                log::info!("Index {} on {}: {}", index.name, spec.name, declared);
                indexes.push((index.name.clone(), declared));
            }

            report.collections.push(CollectionReport {
                name: spec.name.to_string(),
                collection,
                indexes,
            });
        }

        Ok(report)
    }

    fn declare_collection(&self, spec: &CollectionSpec) -> Result<Declaration> {
        let declared = match self.target.create_collection(spec.name, &spec.options) {
            Err(Error::CollectionConflict { .. }) if self.update_validators => {
                self.target.modify_collection(spec.name, &spec.options)?;
                Declaration::Updated
            }
            other => other?,
        };
        log::info!(
            "Collection {}: {} (validation level {})",
            spec.name,
            declared,
            spec.options.validation_level
        );
        Ok(declared)
    }
}

/// Apply the full catalog to `target`.
pub fn initialize<T: SchemaTarget>(target: &T) -> Result<InitReport> {
    SchemaInitializer::new(target).run(&crate::catalog::collections())
}
