//! Embedded document store backed by SQLite.

pub mod db;
pub mod filter;
pub mod migrations;
pub mod options;

pub use db::{DocumentStore, ReplaceOutcome};
pub use filter::{Filter, FindOptions};
pub use options::{
    CollectionInfo, CollectionOptions, Declaration, IndexKey, IndexModel, SortDirection,
};
