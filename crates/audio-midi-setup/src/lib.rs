//! Setup for the audio-midi annotation store.
//!
//! Declares the four annotation collections (`beat_position`, `chord`,
//! `note_midi`, `pitch_contour`) with their validators and unique
//! `(title, dataset_name)` indexes, and loads the tool's configuration.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod catalog;
pub mod config;
pub mod initializer;

pub use catalog::{collections, CollectionSpec};
pub use config::Config;
pub use initializer::{initialize, CollectionReport, InitReport, SchemaInitializer, SchemaTarget};
