/// A store catalog migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
PRAGMA foreign_keys = ON;

-- Declared collections and their validation rules
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    validator TEXT,
    validation_level TEXT NOT NULL,
    validation_action TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Declared indexes, keyed per collection (index names are collection-scoped)
CREATE TABLE IF NOT EXISTS collection_indexes (
    collection TEXT NOT NULL REFERENCES collections(name) ON DELETE CASCADE,
    name TEXT NOT NULL,
    keys TEXT NOT NULL,
    is_unique INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (collection, name)
);
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "collection_catalog",
    sql: MIGRATION_001,
}];
