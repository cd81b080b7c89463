//! Core of the audio-midi annotation store.
//!
//! This crate defines the validator dialect (`bsonType` / `$jsonSchema`),
//! the embedded document store that enforces validators and unique indexes,
//! and the typed records of the four annotation collections.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod repository;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
pub use store::DocumentStore;
