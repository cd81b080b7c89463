use anyhow::{Context, Result};
use audio_midi_core::store::Declaration;
use audio_midi_core::DocumentStore;
use audio_midi_setup::{catalog, SchemaInitializer};
use std::path::Path;

/// Declare the catalog collections and indexes in the store.
pub fn run_init(db_path: &Path, update_validators: bool) -> Result<()> {
    log::debug!("Opening annotation store at {}", db_path.display());
    let store = DocumentStore::open(db_path)
        .with_context(|| format!("Failed to open annotation store {}", db_path.display()))?;

    let report = SchemaInitializer::new(&store)
        .update_validators(update_validators)
        .run(&catalog::collections())
        .context("Schema initialization failed")?;

    println!("\nInitialized annotation store: {}\n", db_path.display());
    for collection in &report.collections {
        println!(
            "  {} {} ({})",
            marker(collection.collection),
            collection.name,
            collection.collection
        );
        for (index, declared) in &collection.indexes {
            println!("      index {} ({})", index, declared);
        }
    }

    if report.is_noop() {
        println!("\nNothing to do: the store already matches the catalog.");
    }

    Ok(())
}

const fn marker(declared: Declaration) -> &'static str {
    match declared {
        Declaration::Created => "+",
        Declaration::Updated => "~",
        Declaration::Unchanged => "=",
    }
}
