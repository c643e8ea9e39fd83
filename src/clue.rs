//! Flags single-document `find` results that are clues in the game.
//!
//! A matching crime document gets `isClue: true`, a matching person gets
//! `isClue: 1`.

use serde_json::Value;
use tracing::info;

use crate::command::Document;
use crate::settings::ClueConfig;

pub const CRIME_COLLECTION: &str = "crime";
pub const PERSON_COLLECTION: &str = "person";
const CLUE_FIELD: &str = "isClue";

/// Annotate `results` in place. Returns whether a clue was flagged.
pub fn annotate(collection: &str, results: &mut [Document], clues: &ClueConfig) -> bool {
    let [document] = results else {
        return false;
    };
    match collection {
        CRIME_COLLECTION if document_id(document) == Some(clues.crime.as_str()) => {
            document.insert(CLUE_FIELD.into(), Value::Bool(true));
            info!("clue found for crime");
            true
        }
        PERSON_COLLECTION => {
            let Some(name) = document.get("name").and_then(Value::as_str) else {
                return false;
            };
            let suspects = [&clues.witness1, &clues.witness2, &clues.suspect];
            if suspects.iter().any(|clue| clue.as_str() == name) {
                document.insert(CLUE_FIELD.into(), Value::from(1));
                info!("clue found for person");
                true
            } else {
                false
            }
        }
        _ => false,
    }
}

/// A document's `_id` as text, whether stored plainly or as `{"$oid": ...}`.
pub fn document_id(document: &Document) -> Option<&str> {
    match document.get("_id")? {
        Value::String(id) => Some(id),
        Value::Object(id) => id.get("$oid").and_then(Value::as_str),
        _ => None,
    }
}
