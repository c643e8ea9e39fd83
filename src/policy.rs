//! Rules for the restricted `solution` collection.
//!
//! The collection never shows up in a collection listing and accepts exactly
//! one query shape, `db.solution.find({"name": "<suspect>"})`, which becomes a
//! counter increment answered with a verdict rather than with documents.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::{GumshoeError, Result};
use crate::normalize::{quote_keys, KeyPattern};

pub const RESTRICTED_COLLECTION: &str = "solution";

const SOLVED: &str = "YOU DID IT! YOU SOLVED THE MONGODB MURDER MYSTERY!!!";
const WRONG: &str = "OH NO YOU HAVE ACCUSED THE WRONG PERSON. YIKES.";

lazy_static! {
    static ref SOLUTION_CHECK: Regex = Regex::new(r#"^\{\s*"name"\s*:\s*"([^"]*)"\s*\}$"#).unwrap();
}

/// Collection names with the restricted one removed.
pub fn visible_collections(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| name != RESTRICTED_COLLECTION)
        .collect()
}

/// The suspect named by a solution check, from the raw `find(...)` argument.
pub fn solution_suspect(argument: &str) -> Result<String> {
    let argument = quote_keys(argument.trim(), KeyPattern::Field);
    let captures = SOLUTION_CHECK
        .captures(&argument)
        .ok_or(GumshoeError::RestrictedCollection)?;
    let suspect = &captures[1];
    if suspect.is_empty() {
        return Err(GumshoeError::MissingSuspectName);
    }
    Ok(suspect.to_string())
}

/// The `_id` of the counter document a guess increments.
pub fn solution_key(suspect: &str, salt: &str) -> String {
    format!("{suspect}{salt}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Solved,
    Wrong,
}

impl Verdict {
    /// A guess is right when exactly one counter document was modified.
    pub fn from_modified(modified_count: u64) -> Self {
        if modified_count == 1 {
            Verdict::Solved
        } else {
            Verdict::Wrong
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Verdict::Solved => SOLVED,
            Verdict::Wrong => WRONG,
        }
    }
}

impl Serialize for Verdict {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut body = serializer.serialize_struct("Verdict", 1)?;
        body.serialize_field("verdict", self.message())?;
        body.end()
    }
}
