// used for persistence
use rusqlite::{params, Connection};
use serde_json::Value;
use std::fs;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::command::Document;
use crate::error::{GumshoeError, Result};
use crate::matcher::{compare_values, project, resolve, sort_documents, Matcher};
use crate::policy::RESTRICTED_COLLECTION;
use crate::store::{DocumentStore, UpdateSummary};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY,
        collection TEXT NOT NULL,
        body TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS documents_collection ON documents (collection);
";

// A single statement, so concurrent guesses cannot lose an increment.
const INCREMENT_COUNTER: &str = "
    UPDATE documents
    SET body = json_set(body, '$.count', COALESCE(json_extract(body, '$.count'), 0) + 1)
    WHERE collection = ?1 AND json_extract(body, '$._id') = ?2
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceMode {
    InMemory,
    File(String),
}

impl From<Option<String>> for PersistenceMode {
    fn from(path: Option<String>) -> Self {
        path.map_or(PersistenceMode::InMemory, PersistenceMode::File)
    }
}

// ------------- Persistence -------------
/// SQLite-backed document store. Documents are kept as JSON text, one row
/// each, in insertion order; filters are evaluated by [`Matcher`].
pub struct Persistor {
    connection: Mutex<Connection>,
}

impl Persistor {
    pub fn new(mode: PersistenceMode) -> Result<Self> {
        let connection = match &mode {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        };
        connection.execute_batch(SCHEMA)?;
        info!(?mode, "document store ready");
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|e| GumshoeError::Storage(format!("lock poisoned: {e}")))
    }

    /// Append documents to a collection, creating it if needed.
    pub fn insert_documents(&self, collection: &str, documents: &[Document]) -> Result<usize> {
        let mut connection = self.connection()?;
        let transaction = connection.transaction()?;
        {
            let mut insert =
                transaction.prepare("INSERT INTO documents (collection, body) VALUES (?1, ?2)")?;
            for document in documents {
                let body = serde_json::to_string(document)
                    .map_err(|e| GumshoeError::Storage(e.to_string()))?;
                insert.execute(params![collection, body])?;
            }
        }
        transaction.commit()?;
        debug!(collection, inserted = documents.len(), "documents inserted");
        Ok(documents.len())
    }

    /// Load `{ "<collection>": [documents...] }` from JSON text.
    pub fn seed_from_str(&self, json: &str) -> Result<usize> {
        let seed: serde_json::Map<String, Value> =
            serde_json::from_str(json).map_err(|e| GumshoeError::Storage(format!("bad seed: {e}")))?;
        let mut total = 0;
        for (collection, documents) in seed {
            let documents: Vec<Document> = serde_json::from_value(documents)
                .map_err(|e| GumshoeError::Storage(format!("bad seed for {collection}: {e}")))?;
            total += self.insert_documents(&collection, &documents)?;
        }
        Ok(total)
    }

    pub fn seed_from_file(&self, path: &str) -> Result<usize> {
        let json = fs::read_to_string(path)
            .map_err(|e| GumshoeError::Storage(format!("cannot read seed file {path}: {e}")))?;
        let total = self.seed_from_str(&json)?;
        info!(path, documents = total, "seeded document store");
        Ok(total)
    }

    fn documents(&self, collection: &str) -> Result<Vec<Document>> {
        let connection = self.connection()?;
        let mut select =
            connection.prepare("SELECT body FROM documents WHERE collection = ?1 ORDER BY id")?;
        let bodies = select
            .query_map(params![collection], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        bodies
            .iter()
            .map(|body| {
                serde_json::from_str::<Document>(body)
                    .map_err(|e| GumshoeError::Storage(format!("corrupt document in {collection}: {e}")))
            })
            .collect()
    }
}

impl DocumentStore for Persistor {
    fn list_collection_names(&self) -> Result<Vec<String>> {
        let connection = self.connection()?;
        let mut select =
            connection.prepare("SELECT DISTINCT collection FROM documents ORDER BY collection")?;
        let names = select
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    fn distinct(&self, collection: &str, field: &str) -> Result<Vec<Value>> {
        let mut values: Vec<Value> = Vec::new();
        for document in self.documents(collection)? {
            for value in resolve(&document, field) {
                let candidates = match value {
                    Value::Array(items) => items.iter().collect::<Vec<_>>(),
                    other => vec![other],
                };
                for candidate in candidates {
                    if !values.iter().any(|v| compare_values(v, candidate).is_eq()) {
                        values.push(candidate.clone());
                    }
                }
            }
        }
        values.sort_by(compare_values);
        Ok(values)
    }

    fn count(&self, collection: &str) -> Result<u64> {
        let connection = self.connection()?;
        let count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn find(
        &self,
        collection: &str,
        filter: &Document,
        projection: &Document,
        sort: &Document,
        limit: usize,
    ) -> Result<Vec<Document>> {
        let matcher = Matcher::compile(filter)?;
        let mut matched: Vec<Document> = self
            .documents(collection)?
            .into_iter()
            .filter(|document| matcher.matches(document))
            .collect();
        sort_documents(&mut matched, sort);
        matched.truncate(limit);
        Ok(matched
            .iter()
            .map(|document| project(document, projection))
            .collect())
    }

    fn increment_solution_counter(&self, key: &str) -> Result<UpdateSummary> {
        let connection = self.connection()?;
        let changed = connection.execute(INCREMENT_COUNTER, params![RESTRICTED_COLLECTION, key])? as u64;
        Ok(UpdateSummary {
            modified_count: changed,
        })
    }
}
