//! The narrow contract between the interpreter and a document store.
//!
//! Implementations report every failure as [`crate::GumshoeError::Storage`].
//! Nothing in the interpreter calls a store directly; [`crate::engine::Engine`]
//! maps each built [`crate::command::Command`] onto exactly one of these calls.

use serde_json::Value;

use crate::command::Document;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateSummary {
    pub modified_count: u64,
}

pub trait DocumentStore {
    fn list_collection_names(&self) -> Result<Vec<String>>;
    fn distinct(&self, collection: &str, field: &str) -> Result<Vec<Value>>;
    fn count(&self, collection: &str) -> Result<u64>;
    fn find(
        &self,
        collection: &str,
        filter: &Document,
        projection: &Document,
        sort: &Document,
        limit: usize,
    ) -> Result<Vec<Document>>;
    /// Atomically add one to the `count` of the restricted-collection document whose `_id` is `key`.
    fn increment_solution_counter(&self, key: &str) -> Result<UpdateSummary>;
}
