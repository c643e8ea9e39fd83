//! The structured command handed to a [`crate::store::DocumentStore`], and the
//! builder that turns a recognised [`Shape`] into one.

use std::fmt;

use serde_json::{Map, Value};

use crate::arguments::parse_find_arguments;
use crate::clause::Keyword;
use crate::error::{GumshoeError, Result};
use crate::policy::RESTRICTED_COLLECTION;
use crate::recognize::Shape;
use crate::settings::Limits;

/// A JSON object with its key order preserved.
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ListCollections,
    Distinct {
        collection: String,
        field: String,
    },
    /// Always unconditional; a filter written inside `count(...)` is ignored.
    Count {
        collection: String,
    },
    Find {
        collection: String,
        filter: Document,
        projection: Document,
        sort: Document,
        limit: usize,
    },
    SolutionCheck {
        suspect_name: String,
    },
}

impl Command {
    pub fn collection(&self) -> Option<&str> {
        match self {
            Command::ListCollections => None,
            Command::SolutionCheck { .. } => Some(RESTRICTED_COLLECTION),
            Command::Distinct { collection, .. }
            | Command::Count { collection }
            | Command::Find { collection, .. } => Some(collection),
        }
    }
}

// The shell form of the command as it is executed, with defaults filled in.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::ListCollections => write!(f, "db.listCollections().toArray()"),
            Command::Distinct { collection, field } => {
                write!(f, "db.{collection}.distinct('{field}')")
            }
            Command::Count { collection } => write!(f, "db.{collection}.count()"),
            Command::Find {
                collection,
                filter,
                projection,
                sort,
                limit,
            } => write!(
                f,
                "db.{collection}.find({}, {}).limit({limit}).sort({}).toArray()",
                compact(filter),
                compact(projection),
                compact(sort)
            ),
            Command::SolutionCheck { suspect_name } => write!(
                f,
                "db.{RESTRICTED_COLLECTION}.find({{\"name\":{}}})",
                Value::from(suspect_name.as_str())
            ),
        }
    }
}

fn compact(document: &Document) -> String {
    serde_json::to_string(document).unwrap_or_default()
}

/// Assemble the executable command, parsing documents and applying limit and sort defaults.
pub fn build(shape: Shape<'_>, limits: &Limits) -> Result<Command> {
    let command = match shape {
        Shape::ListCollections => Command::ListCollections,
        Shape::SolutionCheck { suspect_name } => Command::SolutionCheck { suspect_name },
        Shape::Distinct { collection, field } => {
            if field.is_empty() {
                return Err(GumshoeError::DistinctFieldMissing);
            }
            Command::Distinct { collection, field }
        }
        Shape::Count { collection } => Command::Count { collection },
        Shape::Find { collection, clauses } => {
            let (filter, projection) =
                parse_find_arguments(clauses.argument(Keyword::Find).unwrap_or_default())?;
            let limit = parse_limit(clauses.argument(Keyword::Limit), limits)?;
            let sort = parse_sort(clauses.argument(Keyword::Sort))?;
            Command::Find {
                collection,
                filter,
                projection,
                sort,
                limit,
            }
        }
    };
    Ok(command)
}

/// Absent → the default; not a number → [`GumshoeError::InvalidLimit`];
/// a number outside `1..=max_limit` → `max_limit`.
pub fn parse_limit(argument: Option<&str>, limits: &Limits) -> Result<usize> {
    let Some(argument) = argument else {
        return Ok(limits.default_limit);
    };
    let value = leading_integer(argument).ok_or(GumshoeError::InvalidLimit)?;
    match usize::try_from(value) {
        Ok(limit) if (1..=limits.max_limit).contains(&limit) => Ok(limit),
        _ => Ok(limits.max_limit),
    }
}

// Integer prefix of the text after leading whitespace, like a lenient
// `parseInt`: "15" and "15abc" are 15, "abc" is nothing.
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let len = digits.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    let magnitude = digits[..len].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Absent → `{"_id": 1}`; otherwise the argument must be a JSON object.
pub fn parse_sort(argument: Option<&str>) -> Result<Document> {
    match argument {
        None => {
            let mut sort = Document::new();
            sort.insert("_id".into(), Value::from(1));
            Ok(sort)
        }
        Some(argument) => serde_json::from_str::<Document>(argument.trim())
            .map_err(|e| GumshoeError::InvalidSortJson(e.to_string())),
    }
}
