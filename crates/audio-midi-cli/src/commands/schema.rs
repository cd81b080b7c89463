use anyhow::{Context, Result};
use audio_midi_setup::catalog;
use serde_json::{Map, Value};

/// Print catalog validators as pretty JSON, keyed by collection.
pub fn show_schema(collection: Option<&str>) -> Result<()> {
    let specs = match collection {
        Some(name) => vec![catalog::find(name).ok_or_else(|| unknown_collection(name))?],
        None => catalog::collections(),
    };

    let mut validators = Map::new();
    for spec in specs {
        let validator = serde_json::to_value(&spec.options.validator)
            .context("Failed to serialize validator")?;
        validators.insert(spec.name.to_string(), validator);
    }

    let output = match (collection, validators.len()) {
        (Some(_), 1) => validators.into_iter().map(|(_, v)| v).next().unwrap_or(Value::Null),
        _ => Value::Object(validators),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub(crate) fn unknown_collection(name: &str) -> anyhow::Error {
    let known: Vec<&str> = catalog::collections().iter().map(|spec| spec.name).collect();
    anyhow::anyhow!("Unknown collection: {}\n\nKnown collections: {}", name, known.join(", "))
}
