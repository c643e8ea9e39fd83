//! Runs a raw query string end to end: validate, recognise, build, execute,
//! then apply the access policy and clue annotation to the result.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::clue;
use crate::command::{build, Command, Document};
use crate::error::Result;
use crate::policy::{self, Verdict};
use crate::recognize::recognize;
use crate::settings::{Limits, Settings};
use crate::store::DocumentStore;
use crate::validate::validate_query;

/// What a successful query returns to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Names(Vec<String>),
    Values(Vec<Value>),
    Count(u64),
    Documents(Vec<Document>),
    Verdict(Verdict),
}

/// Turn a raw, percent-encoded query parameter into a command. Performs no I/O.
pub fn interpret(raw: Option<&str>, limits: &Limits) -> Result<Command> {
    let query = validate_query(raw, limits)?;
    let shape = recognize(&query)?;
    let command = build(shape, limits)?;
    debug!(%query, %command, "interpreted query");
    Ok(command)
}

pub struct Engine<'en, S: DocumentStore> {
    store: &'en S,
    settings: &'en Settings,
}

impl<'en, S: DocumentStore> Engine<'en, S> {
    pub fn new(store: &'en S, settings: &'en Settings) -> Self {
        Self { store, settings }
    }

    pub fn interpret(&self, raw: Option<&str>) -> Result<Command> {
        interpret(raw, &self.settings.limits)
    }

    pub fn evaluate(&self, raw: Option<&str>) -> Result<Outcome> {
        let command = self.interpret(raw)?;
        self.execute(command)
    }

    /// Run a built command against the store.
    pub fn execute(&self, command: Command) -> Result<Outcome> {
        let outcome = match command {
            Command::ListCollections => {
                let names = self.store.list_collection_names()?;
                Outcome::Names(policy::visible_collections(names))
            }
            Command::Distinct { collection, field } => {
                let values = self.store.distinct(&collection, &field)?;
                debug!(%collection, %field, distinct = values.len(), "distinct values");
                Outcome::Values(values)
            }
            Command::Count { collection } => {
                let count = self.store.count(&collection)?;
                debug!(%collection, count, "counted documents");
                Outcome::Count(count)
            }
            Command::Find {
                collection,
                filter,
                projection,
                sort,
                limit,
            } => {
                let mut documents = self
                    .store
                    .find(&collection, &filter, &projection, &sort, limit)?;
                info!(%collection, matched = documents.len(), "find complete");
                clue::annotate(&collection, &mut documents, &self.settings.clues);
                Outcome::Documents(documents)
            }
            Command::SolutionCheck { suspect_name } => {
                let key = policy::solution_key(&suspect_name, &self.settings.salt);
                let summary = self.store.increment_solution_counter(&key)?;
                let verdict = Verdict::from_modified(summary.modified_count);
                info!(?verdict, "solution checked");
                Outcome::Verdict(verdict)
            }
        };
        Ok(outcome)
    }
}
