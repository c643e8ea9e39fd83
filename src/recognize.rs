//! Classifies a validated query into one of the supported command shapes.
//!
//! The rules are tried in a fixed priority order and the first one that
//! applies decides the shape; a rule that rejects the query ends the chain
//! with its error instead of falling through.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::clause::{Clauses, Keyword};
use crate::error::{GumshoeError, Result};
use crate::policy;

lazy_static! {
    static ref GET_COLLECTIONS: Regex = Regex::new(r"^db\.getCollectionNames\(\);?$").unwrap();
    static ref COLLECTION_NAME: Regex = Regex::new(r#"^db(\.\w+\.|\['\w+'\]|\["\w+"\])"#).unwrap();
    static ref STRING_FIELD: Regex = Regex::new(r#"['"]([^'"]+)['"]"#).unwrap();
}

/// What a query asks for, before its documents are parsed.
#[derive(Debug, Clone)]
pub enum Shape<'q> {
    ListCollections,
    SolutionCheck { suspect_name: String },
    Distinct { collection: String, field: String },
    Count { collection: String },
    Find { collection: String, clauses: Clauses<'q> },
}

/// `db.getCollectionNames()`, optionally followed by a semicolon, and nothing else.
pub fn is_list_collections(query: &str) -> bool {
    GET_COLLECTIONS.is_match(query)
}

/// The collection named by `db.name.`, `db["name"]` or `db['name']`.
pub fn collection_name(query: &str) -> Option<String> {
    let captures = COLLECTION_NAME.captures(query)?;
    Some(strip_collection_delimiters(&captures[1]).to_string())
}

/// Remove the `.` / `["` / `['` delimiters around a collection name.
pub fn strip_collection_delimiters(raw: &str) -> &str {
    if let Some(bracketed) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        bracketed.trim_matches(|c| c == '"' || c == '\'')
    } else if let Some(dotted) = raw.strip_prefix('.') {
        dotted.strip_suffix('.').unwrap_or(dotted)
    } else {
        raw
    }
}

/// The first single- or double-quoted run in a clause argument.
pub fn string_field(argument: &str) -> Option<&str> {
    STRING_FIELD
        .captures(argument)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

pub fn recognize(query: &str) -> Result<Shape<'_>> {
    if is_list_collections(query) {
        return Ok(Shape::ListCollections);
    }
    let collection = collection_name(query).ok_or(GumshoeError::MissingCollectionName)?;
    let clauses = Clauses::locate(query);
    debug!(%collection, "recognizing query");

    if collection == policy::RESTRICTED_COLLECTION {
        let argument = clauses
            .argument(Keyword::Find)
            .ok_or(GumshoeError::RestrictedCollection)?;
        let suspect_name = policy::solution_suspect(argument)?;
        return Ok(Shape::SolutionCheck { suspect_name });
    }
    if let Some(argument) = clauses.argument(Keyword::Distinct) {
        let field = string_field(argument).ok_or(GumshoeError::DistinctFieldMissing)?;
        return Ok(Shape::Distinct {
            collection,
            field: field.to_string(),
        });
    }
    if clauses.has(Keyword::Count) && !clauses.has(Keyword::Find) {
        // the count argument is accepted but never applied
        return Ok(Shape::Count { collection });
    }
    if clauses.has(Keyword::Find) {
        return Ok(Shape::Find { collection, clauses });
    }
    Err(GumshoeError::UnsupportedQuery)
}
