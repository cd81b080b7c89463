use anyhow::{Context, Result};
use audio_midi_core::store::{Filter, IndexModel, SortDirection};
use audio_midi_core::DocumentStore;
use audio_midi_setup::catalog;
use std::path::Path;

pub fn show_status(db_path: &Path) -> Result<()> {
    println!("\nAudio-MIDI Status\n");
    println!("  Store: {}", db_path.display());

    if !db_path.exists() {
        println!("\n  The store does not exist yet.");
        println!("  Run `audio-midi init` to create it.");
        return Ok(());
    }

    let store = DocumentStore::open(db_path).context("Failed to open annotation store")?;
    let collections = store.list_collections()?;

    for info in &collections {
        let count = store.count(&info.name, &Filter::all())?;
        println!("\n  {} ({} documents)", info.name, count);
        println!(
            "    validation: {} / {}{}",
            info.options.validation_level,
            info.options.validation_action,
            if info.options.validator.is_some() { "" } else { " (no validator)" }
        );
        println!("    created: {}", info.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
        for index in store.list_indexes(&info.name)? {
            println!("    index {}", describe_index(&index));
        }
    }

    let missing: Vec<&str> = catalog::collections()
        .iter()
        .map(|spec| spec.name)
        .filter(|name| !collections.iter().any(|info| info.name == *name))
        .collect();
    if !missing.is_empty() {
        println!("\n  Missing collections: {}", missing.join(", "));
        println!("  Run `audio-midi init` to declare them.");
    }

    Ok(())
}

fn describe_index(index: &IndexModel) -> String {
    let keys: Vec<String> = index
        .keys
        .iter()
        .map(|key| {
            let direction = match key.direction {
                SortDirection::Ascending => 1,
                SortDirection::Descending => -1,
            };
            format!("{}: {}", key.field, direction)
        })
        .collect();
    format!(
        "{} {{ {} }}{}",
        index.name,
        keys.join(", "),
        if index.unique { " unique" } else { "" }
    )
}
