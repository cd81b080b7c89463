use anyhow::{Context, Result};
use audio_midi_setup::catalog;
use serde_json::Value;
use std::path::Path;

use super::schema::unknown_collection;

/// Check the documents in `file` against a collection's validator.
///
/// Fails when any document is rejected.
pub fn validate_file(collection: &str, file: &Path) -> Result<()> {
    let spec = catalog::find(collection).ok_or_else(|| unknown_collection(collection))?;

    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let parsed: Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;
    let documents = match parsed {
        Value::Array(documents) => documents,
        document => vec![document],
    };

    let Some(validator) = &spec.options.validator else {
        println!("{} has no validator; {} document(s) accepted", collection, documents.len());
        return Ok(());
    };

    let mut rejected = 0;
    for (position, document) in documents.iter().enumerate() {
        let violations = validator.validate(document);
        if violations.is_empty() {
            println!("✓ document {}", position);
        } else {
            rejected += 1;
            println!("✗ document {}", position);
            for violation in &violations {
                println!("    {}", violation);
            }
        }
    }

    if rejected > 0 {
        anyhow::bail!(
            "{} of {} document(s) rejected by the {} validator",
            rejected,
            documents.len(),
            collection
        );
    }

    println!("\nAll {} document(s) valid for {}", documents.len(), collection);
    Ok(())
}
