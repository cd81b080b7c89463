use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::Path;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::schema::{BsonType, ValidationAction, ValidationLevel, Validator};

use super::filter::{Filter, FindOptions};
use super::migrations::MIGRATIONS;
use super::options::{
    check_field_path, check_identifier, CollectionInfo, CollectionOptions, Declaration,
    IndexModel,
};

const ID_FIELD: &str = "_id";

type CollectionRow = (String, Option<String>, String, String, String);

/// An embedded document store.
///
/// Each collection is a table of JSON documents keyed by `_id`; the
/// `collections` and `collection_indexes` tables record validators and
/// index declarations. Unique indexes are SQLite expression indexes over
/// the document body, so uniqueness is enforced by the database itself.
#[derive(Debug)]
pub struct DocumentStore {
    conn: Connection,
}

/// What [`DocumentStore::replace_one`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplaceOutcome {
    Inserted(Value),
    Replaced(Value),
    NoMatch,
}

impl DocumentStore {
    /// Open (or create) a store at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open an in-memory store (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self { conn };
        store.apply_migrations()?;
        Ok(store)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying store migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }
}

// Collection declarations
impl DocumentStore {
    /// Declare a collection.
    ///
    /// Declaring an existing collection with identical options is a no-op;
    /// any difference is a [`Error::CollectionConflict`].
    pub fn create_collection(
        &self,
        name: &str,
        options: &CollectionOptions,
    ) -> Result<Declaration> {
        check_identifier("collection name", name)?;
        if let Some(validator) = &options.validator {
            validator.check()?;
        }

        if let Some(existing) = self.collection_info(name)? {
            if existing.options == *options {
                log::debug!("Collection {} already declared", name);
                return Ok(Declaration::Unchanged);
            }
            return Err(Error::CollectionConflict {
                name: name.to_string(),
            });
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (
                id TEXT PRIMARY KEY,
                body TEXT NOT NULL
            )",
            table_name(name)
        ))?;
        tx.execute(
            "INSERT INTO collections
                 (name, validator, validation_level, validation_action, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                name,
                validator_json(options.validator.as_ref())?,
                options.validation_level.as_str(),
                options.validation_action.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        log::info!(
            "Created collection {} (validation level {}, action {})",
            name,
            options.validation_level,
            options.validation_action
        );
        Ok(Declaration::Created)
    }

    /// Replace the validator, level and action of an existing collection.
    ///
    /// Documents already stored are not re-validated.
    pub fn modify_collection(&self, name: &str, options: &CollectionOptions) -> Result<()> {
        if let Some(validator) = &options.validator {
            validator.check()?;
        }

        let updated = self.conn.execute(
            "UPDATE collections
             SET validator = ?2, validation_level = ?3, validation_action = ?4
             WHERE name = ?1",
            rusqlite::params![
                name,
                validator_json(options.validator.as_ref())?,
                options.validation_level.as_str(),
                options.validation_action.as_str(),
            ],
        )?;
        if updated == 0 {
            return Err(not_found(name));
        }

        log::info!("Updated validation rules of collection {}", name);
        Ok(())
    }

    /// Drop a collection with its documents and indexes.
    ///
    /// Returns `false` when the collection was not declared.
    pub fn drop_collection(&self, name: &str) -> Result<bool> {
        if self.collection_info(name)?.is_none() {
            return Ok(false);
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS \"{}\"", table_name(name)))?;
        tx.execute("DELETE FROM collection_indexes WHERE collection = ?1", [name])?;
        tx.execute("DELETE FROM collections WHERE name = ?1", [name])?;
        tx.commit()?;

        log::warn!("Dropped collection {}", name);
        Ok(true)
    }

    pub fn collection_info(&self, name: &str) -> Result<Option<CollectionInfo>> {
        let row: Option<CollectionRow> = self
            .conn
            .query_row(
                "SELECT name, validator, validation_level, validation_action, created_at
                 FROM collections WHERE name = ?1",
                [name],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()?;

        row.map(info_from_row).transpose()
    }

    pub fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, validator, validation_level, validation_action, created_at
             FROM collections ORDER BY name",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?
            .collect::<rusqlite::Result<Vec<CollectionRow>>>()?;

        rows.into_iter().map(info_from_row).collect()
    }

    fn require_collection(&self, name: &str) -> Result<CollectionInfo> {
        self.collection_info(name)?.ok_or_else(|| not_found(name))
    }
}

// Index declarations
impl DocumentStore {
    /// Declare an index on a collection.
    ///
    /// Re-declaring an identical index is a no-op. An index with the same
    /// name but a different definition, or with the same keys under another
    /// name, is an [`Error::IndexConflict`]. Building a unique index over
    /// documents that already collide fails with [`Error::DuplicateKey`].
    pub fn create_index(&self, collection: &str, index: &IndexModel) -> Result<Declaration> {
        index.check()?;
        self.require_collection(collection)?;

        for existing in self.list_indexes(collection)? {
            if existing.name == index.name {
                if existing == *index {
                    log::debug!("Index {} on {} already declared", index.name, collection);
                    return Ok(Declaration::Unchanged);
                }
                return Err(Error::IndexConflict {
                    collection: collection.to_string(),
                    name: index.name.clone(),
                    reason: "an index with this name exists with a different definition".into(),
                });
            }
            if existing.keys == index.keys {
                return Err(Error::IndexConflict {
                    collection: collection.to_string(),
                    name: index.name.clone(),
                    reason: format!("the same keys are already indexed as {}", existing.name),
                });
            }
        }

        let columns = index
            .keys
            .iter()
            .map(|key| format!("json_extract(body, '$.{}') {}", key.field, key.direction.sql()))
            .collect::<Vec<_>>()
            .join(", ");
        let ddl = format!(
            "CREATE {}INDEX \"{}\" ON \"{}\" ({})",
            if index.unique { "UNIQUE " } else { "" },
            sqlite_index_name(collection, &index.name),
            table_name(collection),
            columns
        );

        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(&ddl)
            .map_err(|e| write_error(collection, e))?;
        tx.execute(
            "INSERT INTO collection_indexes (collection, name, keys, is_unique, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                collection,
                index.name,
                serde_json::to_string(&index.keys)?,
                index.unique,
                Utc::now().to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        log::info!(
            "Created {}index {} on {}",
            if index.unique { "unique " } else { "" },
            index.name,
            collection
        );
        Ok(Declaration::Created)
    }

    /// List the indexes declared on a collection, in declaration order.
    pub fn list_indexes(&self, collection: &str) -> Result<Vec<IndexModel>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, keys, is_unique FROM collection_indexes
             WHERE collection = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(name, keys, unique)| {
                Ok(IndexModel {
                    name,
                    keys: serde_json::from_str(&keys)?,
                    unique,
                })
            })
            .collect()
    }
}

// Document writes
impl DocumentStore {
    /// Insert a document, generating an `_id` when it has none.
    ///
    /// Returns the document's `_id`.
    pub fn insert_one(&self, collection: &str, document: Value) -> Result<Value> {
        let info = self.require_collection(collection)?;
        let mut map = into_object(document)?;
        let id = map
            .entry(ID_FIELD)
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()))
            .clone();
        let document = Value::Object(map);

        check_write(&info, &document, None)?;

        self.conn
            .execute(
                &format!("INSERT INTO \"{}\" (id, body) VALUES (?1, ?2)", table_name(collection)),
                rusqlite::params![serde_json::to_string(&id)?, serde_json::to_string(&document)?],
            )
            .map_err(|e| write_error(collection, e))?;

        log::debug!("Inserted document {} into {}", id, collection);
        Ok(id)
    }

    /// Insert documents in order, stopping at the first failure.
    ///
    /// Documents inserted before the failure stay inserted.
    pub fn insert_many<I>(&self, collection: &str, documents: I) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = Value>,
    {
        documents
            .into_iter()
            .map(|document| self.insert_one(collection, document))
            .collect()
    }

    /// Replace the first document matching `filter`.
    ///
    /// The replacement keeps the matched document's `_id`. With `upsert`,
    /// a replacement that matches nothing is inserted instead.
    pub fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        replacement: Value,
        upsert: bool,
    ) -> Result<ReplaceOutcome> {
        let info = self.require_collection(collection)?;
        let mut map = into_object(replacement)?;

        let current = self.scan(collection, filter, 1)?.into_iter().next();

        match current {
            Some((key, existing)) => {
                let id = existing.get(ID_FIELD).cloned().unwrap_or(Value::Null);
                if let Some(new_id) = map.get(ID_FIELD) {
                    if *new_id != id {
                        return Err(Error::InvalidData(format!(
                            "_id is immutable (document {} in {})",
                            id, collection
                        )));
                    }
                }
                map.insert(ID_FIELD.to_string(), id.clone());
                let document = Value::Object(map);

                check_write(&info, &document, Some(&existing))?;

                let sql = format!(
                    "UPDATE \"{}\" SET body = ?2 WHERE id = ?1",
                    table_name(collection)
                );
                self.conn
                    .execute(&sql, rusqlite::params![key, serde_json::to_string(&document)?])
                    .map_err(|e| write_error(collection, e))?;

                log::debug!("Replaced document {} in {}", id, collection);
                Ok(ReplaceOutcome::Replaced(id))
            }
            None if upsert => self
                .insert_one(collection, Value::Object(map))
                .map(ReplaceOutcome::Inserted),
            None => Ok(ReplaceOutcome::NoMatch),
        }
    }

    /// Delete every document matching `filter`, returning how many went.
    pub fn delete_many(&self, collection: &str, filter: &Filter) -> Result<usize> {
        self.require_collection(collection)?;

        let keys: Vec<String> = self
            .scan(collection, filter, usize::MAX)?
            .into_iter()
            .map(|(key, _)| key)
            .collect();

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt =
                tx.prepare(&format!("DELETE FROM \"{}\" WHERE id = ?1", table_name(collection)))?;
            for key in &keys {
                stmt.execute([key])?;
            }
        }
        tx.commit()?;

        if !keys.is_empty() {
            log::warn!("Deleted {} document(s) from {}", keys.len(), collection);
        }
        Ok(keys.len())
    }
}

// Document reads
impl DocumentStore {
    /// Find documents matching `filter` in insertion order.
    pub fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<Vec<Value>> {
        if self.collection_info(collection)?.is_none() {
            return Ok(Vec::new());
        }

        Ok(self
            .scan(collection, filter, options.skip.saturating_add(options.limit))?
            .into_iter()
            .skip(options.skip)
            .map(|(_, document)| document)
            .collect())
    }

    pub fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>> {
        let options = FindOptions { limit: 1, skip: 0 };
        Ok(self.find(collection, filter, options)?.into_iter().next())
    }

    pub fn count(&self, collection: &str, filter: &Filter) -> Result<usize> {
        if self.collection_info(collection)?.is_none() {
            return Ok(0);
        }

        if filter.is_empty() {
            let count: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM \"{}\"", table_name(collection)),
                [],
                |row| row.get(0),
            )?;
            return Ok(count as usize);
        }

        Ok(self.scan(collection, filter, usize::MAX)?.len())
    }

    /// Up to `limit` documents of a declared collection matching `filter`,
    /// in insertion order, with their storage keys.
    ///
    /// Scalar conditions on plain field paths are evaluated in SQL with the
    /// same `json_extract` expressions the indexes are built on; every
    /// candidate row is then checked against the full filter.
    fn scan(
        &self,
        collection: &str,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<(String, Value)>> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        for (path, expected) in filter.conditions() {
            if check_field_path(path).is_err() {
                continue;
            }
            if let Some(param) = sql_scalar(expected) {
                params.push(param);
                clauses.push(format!("json_extract(body, '$.{}') = ?{}", path, params.len()));
            }
        }
        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, body FROM \"{}\"{} ORDER BY rowid",
            table_name(collection),
            where_clause
        ))?;
        let mut rows = stmt.query(rusqlite::params_from_iter(params))?;

        let mut matches = Vec::new();
        while matches.len() < limit {
            let Some(row) = rows.next()? else {
                break;
            };
            let document: Value = serde_json::from_str(&row.get::<_, String>(1)?)?;
            if filter.matches(&document) {
                matches.push((row.get::<_, String>(0)?, document));
            }
        }
        Ok(matches)
    }
}

fn check_write(
    info: &CollectionInfo,
    document: &Value,
    current: Option<&Value>,
) -> Result<()> {
    let Some(validator) = &info.options.validator else {
        return Ok(());
    };

    let applies = match info.options.validation_level {
        ValidationLevel::Off => false,
        ValidationLevel::Strict => true,
        // Documents that already fail the validator may be updated freely.
        ValidationLevel::Moderate => current.map_or(true, |existing| validator.accepts(existing)),
    };
    if !applies {
        return Ok(());
    }

    let violations = validator.validate(document);
    if violations.is_empty() {
        return Ok(());
    }

    match info.options.validation_action {
        ValidationAction::Error => Err(Error::Validation {
            collection: info.name.clone(),
            violations,
        }),
        ValidationAction::Warn => {
            for violation in &violations {
                log::warn!("Accepting invalid document in {}: {}", info.name, violation);
            }
            Ok(())
        }
    }
}

fn table_name(collection: &str) -> String {
    format!("docs_{collection}")
}

/// SQLite index names are database-wide. Identifiers never contain a dot, so
/// every (collection, index) pair maps to its own name.
fn sqlite_index_name(collection: &str, index: &str) -> String {
    format!("{collection}.{index}")
}

/// The SQL value `json_extract` yields for a scalar JSON value.
fn sql_scalar(value: &Value) -> Option<SqlValue> {
    match value {
        Value::String(text) => Some(SqlValue::Text(text.clone())),
        Value::Bool(flag) => Some(SqlValue::Integer(i64::from(*flag))),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real)),
        _ => None,
    }
}

fn not_found(collection: &str) -> Error {
    Error::NotFound {
        entity: "collection",
        id: collection.to_string(),
    }
}

fn into_object(document: Value) -> Result<Map<String, Value>> {
    match document {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidData(format!(
            "document must be an object, found {}",
            BsonType::of(&other)
        ))),
    }
}

fn validator_json(validator: Option<&Validator>) -> Result<Option<String>> {
    Ok(validator.map(serde_json::to_string).transpose()?)
}

fn info_from_row(row: CollectionRow) -> Result<CollectionInfo> {
    let (name, validator, level, action, created_at) = row;
    let validator = validator
        .map(|text| serde_json::from_str::<Validator>(&text))
        .transpose()?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::InvalidData(format!("bad created_at for {name}: {e}")))?
        .with_timezone(&Utc);

    Ok(CollectionInfo {
        name,
        options: CollectionOptions {
            validator,
            validation_level: level.parse()?,
            validation_action: action.parse()?,
        },
        created_at,
    })
}

fn write_error(collection: &str, err: rusqlite::Error) -> Error {
    if err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
        Error::DuplicateKey {
            collection: collection.to_string(),
            message: err.to_string(),
        }
    } else {
        Error::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BsonType, JsonSchema};
    use serde_json::json;

    fn chord_options() -> CollectionOptions {
        let item = JsonSchema::object()
            .required(["time", "duration", "value"])
            .property("time", JsonSchema::of(BsonType::Double))
            .property("duration", JsonSchema::of(BsonType::Double))
            .property("value", JsonSchema::of(BsonType::String));
        let schema = JsonSchema::object()
            .required(["title", "dataset_name", "chord"])
            .property("title", JsonSchema::of(BsonType::String))
            .property("dataset_name", JsonSchema::of(BsonType::String))
            .property("chord", JsonSchema::array_of(item));
        CollectionOptions::with_validator(Validator::new(schema))
    }

    fn title_dataset_index() -> IndexModel {
        IndexModel::new("unique_title_dataset")
            .ascending("title")
            .ascending("dataset_name")
            .unique()
    }

    fn chord_doc(title: &str) -> Value {
        json!({
            "title": title,
            "dataset_name": "d1",
            "chord": [{ "time": 0.0, "duration": 1.0, "value": "Cmaj" }]
        })
    }

    fn chord_store() -> DocumentStore {
        let store = DocumentStore::open_in_memory().unwrap();
        store.create_collection("chord", &chord_options()).unwrap();
        store.create_index("chord", &title_dataset_index()).unwrap();
        store
    }

    #[test]
    fn test_store_open_in_memory() {
        let store = DocumentStore::open_in_memory().unwrap();
        let count: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert!(store.list_collections().unwrap().is_empty());
    }

    #[test]
    fn test_create_collection_is_idempotent() {
        let store = DocumentStore::open_in_memory().unwrap();
        assert_eq!(
            store.create_collection("chord", &chord_options()).unwrap(),
            Declaration::Created
        );
        assert_eq!(
            store.create_collection("chord", &chord_options()).unwrap(),
            Declaration::Unchanged
        );

        let info = store.collection_info("chord").unwrap().unwrap();
        assert_eq!(info.options, chord_options());
        assert_eq!(info.options.validation_level, ValidationLevel::Moderate);
    }

    #[test]
    fn test_create_collection_with_drifted_options_conflicts() {
        let store = DocumentStore::open_in_memory().unwrap();
        store.create_collection("chord", &chord_options()).unwrap();

        let drifted = chord_options().level(ValidationLevel::Strict);
        let err = store.create_collection("chord", &drifted).unwrap_err();
        assert!(matches!(err, Error::CollectionConflict { .. }));

        store.modify_collection("chord", &drifted).unwrap();
        let info = store.collection_info("chord").unwrap().unwrap();
        assert_eq!(info.options.validation_level, ValidationLevel::Strict);
    }

    #[test]
    fn test_invalid_collection_name_rejected() {
        let store = DocumentStore::open_in_memory().unwrap();
        let err = store
            .create_collection("chord\"; DROP TABLE collections; --", &CollectionOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_insert_generates_id_and_validates() {
        let store = chord_store();
        let id = store.insert_one("chord", chord_doc("t1")).unwrap();
        assert!(id.is_string());

        let stored = store.find_one("chord", &Filter::all().eq("_id", id.clone())).unwrap();
        assert_eq!(stored.unwrap()["title"], "t1");

        let err = store
            .insert_one("chord", json!({ "title": "t2", "dataset_name": "d1" }))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.count("chord", &Filter::all()).unwrap(), 1);
    }

    #[test]
    fn test_insert_rejects_non_object_and_unknown_collection() {
        let store = chord_store();
        assert!(matches!(
            store.insert_one("chord", json!([1, 2])).unwrap_err(),
            Error::InvalidData(_)
        ));
        assert!(matches!(
            store.insert_one("chords", chord_doc("t1")).unwrap_err(),
            Error::NotFound { .. }
        ));
    }

    #[test]
    fn test_unique_index_rejects_duplicate_pair() {
        let store = chord_store();
        store.insert_one("chord", chord_doc("t1")).unwrap();
        let err = store.insert_one("chord", chord_doc("t1")).unwrap_err();
        assert!(err.is_duplicate_key());

        // Same title in another dataset is a different key.
        let mut other = chord_doc("t1");
        other["dataset_name"] = json!("d2");
        store.insert_one("chord", other).unwrap();
        assert_eq!(store.count("chord", &Filter::all()).unwrap(), 2);
    }

    #[test]
    fn test_create_index_is_idempotent() {
        let store = chord_store();
        assert_eq!(
            store.create_index("chord", &title_dataset_index()).unwrap(),
            Declaration::Unchanged
        );
        assert_eq!(store.list_indexes("chord").unwrap(), vec![title_dataset_index()]);
    }

    #[test]
    fn test_create_index_conflicts() {
        let store = chord_store();

        let reordered = IndexModel::new("unique_title_dataset")
            .ascending("dataset_name")
            .ascending("title")
            .unique();
        assert!(matches!(
            store.create_index("chord", &reordered).unwrap_err(),
            Error::IndexConflict { .. }
        ));

        let renamed = IndexModel::new("title_dataset")
            .ascending("title")
            .ascending("dataset_name");
        assert!(matches!(
            store.create_index("chord", &renamed).unwrap_err(),
            Error::IndexConflict { .. }
        ));
        assert_eq!(store.list_indexes("chord").unwrap().len(), 1);
    }

    #[test]
    fn test_unique_index_over_existing_duplicates_fails() {
        let store = DocumentStore::open_in_memory().unwrap();
        store.create_collection("chord", &CollectionOptions::default()).unwrap();
        store.insert_one("chord", chord_doc("t1")).unwrap();
        store.insert_one("chord", chord_doc("t1")).unwrap();

        let err = store.create_index("chord", &title_dataset_index()).unwrap_err();
        assert!(err.is_duplicate_key());
        assert!(store.list_indexes("chord").unwrap().is_empty());
    }

    #[test]
    fn test_moderate_allows_updating_non_conforming_documents() {
        let store = DocumentStore::open_in_memory().unwrap();
        store.create_collection("chord", &CollectionOptions::default()).unwrap();
        store
            .insert_one("chord", json!({ "title": "legacy", "dataset_name": "d1" }))
            .unwrap();
        store.insert_one("chord", chord_doc("good")).unwrap();
        store.modify_collection("chord", &chord_options()).unwrap();

        // The legacy document never passed, so moderate does not check it.
        let outcome = store
            .replace_one(
                "chord",
                &Filter::all().eq("title", "legacy"),
                json!({ "title": "legacy", "dataset_name": "d1", "note": "still invalid" }),
                false,
            )
            .unwrap();
        assert!(matches!(outcome, ReplaceOutcome::Replaced(_)));

        // A conforming document stays conforming.
        let err = store
            .replace_one(
                "chord",
                &Filter::all().eq("title", "good"),
                json!({ "title": "good", "dataset_name": "d1" }),
                false,
            )
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_strict_checks_every_update() {
        let store = DocumentStore::open_in_memory().unwrap();
        store.create_collection("chord", &CollectionOptions::default()).unwrap();
        store
            .insert_one("chord", json!({ "title": "legacy", "dataset_name": "d1" }))
            .unwrap();
        store
            .modify_collection("chord", &chord_options().level(ValidationLevel::Strict))
            .unwrap();

        let err = store
            .replace_one(
                "chord",
                &Filter::all().eq("title", "legacy"),
                json!({ "title": "legacy", "dataset_name": "d1" }),
                false,
            )
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_warn_action_accepts_invalid_documents() {
        let store = DocumentStore::open_in_memory().unwrap();
        store
            .create_collection("chord", &chord_options().action(ValidationAction::Warn))
            .unwrap();
        store.insert_one("chord", json!({ "title": "t1" })).unwrap();
        assert_eq!(store.count("chord", &Filter::all()).unwrap(), 1);
    }

    #[test]
    fn test_off_level_skips_validation() {
        let store = DocumentStore::open_in_memory().unwrap();
        store
            .create_collection("chord", &chord_options().level(ValidationLevel::Off))
            .unwrap();
        store.insert_one("chord", json!({ "anything": true })).unwrap();
    }

    #[test]
    fn test_replace_one_upsert_and_id_immutability() {
        let store = chord_store();
        let filter = Filter::title_dataset("t1", "d1");

        let outcome = store.replace_one("chord", &filter, chord_doc("t1"), false).unwrap();
        assert_eq!(outcome, ReplaceOutcome::NoMatch);

        let ReplaceOutcome::Inserted(id) =
            store.replace_one("chord", &filter, chord_doc("t1"), true).unwrap()
        else {
            panic!("expected an insert");
        };
        assert_eq!(
            store.replace_one("chord", &filter, chord_doc("t1"), true).unwrap(),
            ReplaceOutcome::Replaced(id)
        );

        let mut moved = chord_doc("t1");
        moved["_id"] = json!("another-id");
        assert!(matches!(
            store.replace_one("chord", &filter, moved, true).unwrap_err(),
            Error::InvalidData(_)
        ));
    }

    #[test]
    fn test_find_count_delete() {
        let store = chord_store();
        for title in ["a", "b", "c", "d"] {
            store.insert_one("chord", chord_doc(title)).unwrap();
        }

        let page = store
            .find("chord", &Filter::all(), FindOptions { limit: 2, skip: 1 })
            .unwrap();
        let titles: Vec<&str> = page.iter().map(|d| d["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["b", "c"]);

        assert_eq!(store.count("chord", &Filter::all().eq("title", "a")).unwrap(), 1);
        assert_eq!(store.delete_many("chord", &Filter::all().eq("title", "a")).unwrap(), 1);
        assert_eq!(store.count("chord", &Filter::all()).unwrap(), 3);

        assert!(store
            .find("missing", &Filter::all(), FindOptions::default())
            .unwrap()
            .is_empty());
        assert_eq!(store.count("missing", &Filter::all()).unwrap(), 0);
        assert!(matches!(
            store.delete_many("missing", &Filter::all()).unwrap_err(),
            Error::NotFound { .. }
        ));
    }

    #[test]
    fn test_insert_many_stops_at_first_failure() {
        let store = chord_store();
        let documents = vec![chord_doc("t1"), chord_doc("t1"), chord_doc("t2")];

        let err = store.insert_many("chord", documents).unwrap_err();
        assert!(err.is_duplicate_key());
        assert_eq!(store.count("chord", &Filter::all()).unwrap(), 1);
        assert!(store
            .find_one("chord", &Filter::all().eq("title", "t2"))
            .unwrap()
            .is_none());

        let ids = store
            .insert_many("chord", vec![chord_doc("t2"), chord_doc("t3")])
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(store.count("chord", &Filter::all()).unwrap(), 3);
    }

    #[test]
    fn test_index_names_do_not_collide_across_collections() {
        let store = DocumentStore::open_in_memory().unwrap();
        store.create_collection("a", &CollectionOptions::default()).unwrap();
        store.create_collection("a__b", &CollectionOptions::default()).unwrap();

        let first = IndexModel::new("b__c").ascending("x").unique();
        let second = IndexModel::new("c").ascending("x").unique();
        assert_eq!(store.create_index("a", &first).unwrap(), Declaration::Created);
        assert_eq!(store.create_index("a__b", &second).unwrap(), Declaration::Created);

        // Each index only constrains its own collection.
        store.insert_one("a", json!({ "x": 1 })).unwrap();
        store.insert_one("a__b", json!({ "x": 1 })).unwrap();
        assert!(store.insert_one("a__b", json!({ "x": 1 })).unwrap_err().is_duplicate_key());
    }

    #[test]
    fn test_filters_match_exact_json_values() {
        let store = DocumentStore::open_in_memory().unwrap();
        store.create_collection("notes", &CollectionOptions::default()).unwrap();
        store
            .insert_many(
                "notes",
                vec![
                    json!({ "n": 1, "flag": true, "tags": ["a"] }),
                    json!({ "n": 1.0, "flag": 1, "tags": ["b"] }),
                    json!({ "n": 2, "flag": false, "meta": { "k": "v" } }),
                ],
            )
            .unwrap();

        assert_eq!(store.count("notes", &Filter::all().eq("n", 1)).unwrap(), 1);
        assert_eq!(store.count("notes", &Filter::all().eq("n", 1.0)).unwrap(), 1);
        assert_eq!(store.count("notes", &Filter::all().eq("flag", true)).unwrap(), 1);
        assert_eq!(store.count("notes", &Filter::all().eq("tags.0", "b")).unwrap(), 1);
        assert_eq!(store.count("notes", &Filter::all().eq("meta.k", "v")).unwrap(), 1);
        assert_eq!(store.count("notes", &Filter::all().eq("tags", json!(["a"]))).unwrap(), 1);
    }

    #[test]
    fn test_natural_key_lookup_uses_unique_index() {
        let store = chord_store();
        let plan: Vec<String> = store
            .conn()
            .prepare(
                "EXPLAIN QUERY PLAN SELECT id, body FROM \"docs_chord\"
                 WHERE json_extract(body, '$.title') = ?1
                 AND json_extract(body, '$.dataset_name') = ?2 ORDER BY rowid",
            )
            .unwrap()
            .query_map(["t1", "d1"], |row| row.get::<_, String>(3))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert!(
            plan.iter().any(|step| step.contains("chord.unique_title_dataset")),
            "{plan:?}"
        );

        store.insert_one("chord", chord_doc("t1")).unwrap();
        let replaced = store
            .replace_one("chord", &Filter::title_dataset("t1", "d1"), chord_doc("t1"), false)
            .unwrap();
        assert!(matches!(replaced, ReplaceOutcome::Replaced(_)));
    }

    #[test]
    fn test_drop_collection() {
        let store = chord_store();
        store.insert_one("chord", chord_doc("t1")).unwrap();

        assert!(store.drop_collection("chord").unwrap());
        assert!(!store.drop_collection("chord").unwrap());
        assert!(store.collection_info("chord").unwrap().is_none());
        assert!(store.list_indexes("chord").unwrap().is_empty());

        // Redeclaring starts from scratch.
        store.create_collection("chord", &chord_options()).unwrap();
        store.create_index("chord", &title_dataset_index()).unwrap();
        store.insert_one("chord", chord_doc("t1")).unwrap();
    }

    #[test]
    fn test_declarations_persist_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("audio_midi.db");

        {
            let store = DocumentStore::open(&path).unwrap();
            store.create_collection("chord", &chord_options()).unwrap();
            store.create_index("chord", &title_dataset_index()).unwrap();
            store.insert_one("chord", chord_doc("t1")).unwrap();
        }

        let store = DocumentStore::open(&path).unwrap();
        let migrations: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(migrations, MIGRATIONS.len() as i64);

        assert_eq!(
            store.create_collection("chord", &chord_options()).unwrap(),
            Declaration::Unchanged
        );
        assert_eq!(
            store.create_index("chord", &title_dataset_index()).unwrap(),
            Declaration::Unchanged
        );
        assert!(store.insert_one("chord", chord_doc("t1")).unwrap_err().is_duplicate_key());
    }
}
