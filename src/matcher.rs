//! Evaluation of filter, sort and projection documents over JSON documents.
//!
//! A filter is compiled once into a [`Matcher`] (regular expressions
//! included) and then tested against each stored document. Field paths may
//! be dotted and descend through arrays; a field holding an array matches a
//! condition when the array itself or any of its elements does.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::command::Document;
use crate::error::{GumshoeError, Result};

// compiled regex programs from untrusted patterns stay below this size
const REGEX_SIZE_LIMIT: usize = 1 << 20;

static NULL: Value = Value::Null;

#[derive(Debug)]
enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Nor(Vec<Predicate>),
    Field { path: String, condition: Condition },
}

#[derive(Debug)]
enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
    Size(usize),
    Regex(Regex),
    Not(Box<Condition>),
    All(Vec<Condition>),
}

/// A compiled filter document.
#[derive(Debug)]
pub struct Matcher {
    predicate: Predicate,
}

impl Matcher {
    pub fn compile(filter: &Document) -> Result<Self> {
        Ok(Self {
            predicate: compile_document(filter)?,
        })
    }

    pub fn matches(&self, document: &Document) -> bool {
        evaluate(&self.predicate, document)
    }
}

fn unsupported(message: String) -> GumshoeError {
    GumshoeError::Storage(message)
}

fn compile_document(filter: &Document) -> Result<Predicate> {
    let mut predicates = Vec::with_capacity(filter.len());
    for (key, value) in filter {
        let predicate = match key.as_str() {
            "$and" => Predicate::And(compile_list(key, value)?),
            "$or" => Predicate::Or(compile_list(key, value)?),
            "$nor" => Predicate::Nor(compile_list(key, value)?),
            op if op.starts_with('$') => {
                return Err(unsupported(format!("unknown top level operator: {op}")));
            }
            path => Predicate::Field {
                path: path.to_string(),
                condition: compile_condition(value)?,
            },
        };
        predicates.push(predicate);
    }
    Ok(Predicate::And(predicates))
}

fn compile_list(operator: &str, value: &Value) -> Result<Vec<Predicate>> {
    let items = value
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or_else(|| unsupported(format!("{operator} argument must be a non-empty array")))?;
    items
        .iter()
        .map(|item| match item {
            Value::Object(filter) => compile_document(filter),
            _ => Err(unsupported(format!("{operator} entries must be objects"))),
        })
        .collect()
}

fn is_operator_document(value: &Value) -> bool {
    matches!(value, Value::Object(map) if !map.is_empty() && map.keys().all(|k| k.starts_with('$')))
}

fn compile_condition(value: &Value) -> Result<Condition> {
    let Value::Object(operators) = value else {
        return Ok(Condition::Eq(value.clone()));
    };
    if !is_operator_document(value) {
        return Ok(Condition::Eq(value.clone()));
    }
    let mut conditions = Vec::with_capacity(operators.len());
    for (op, argument) in operators {
        let condition = match op.as_str() {
            "$eq" => Condition::Eq(argument.clone()),
            "$ne" => Condition::Ne(argument.clone()),
            "$gt" => Condition::Gt(argument.clone()),
            "$gte" => Condition::Gte(argument.clone()),
            "$lt" => Condition::Lt(argument.clone()),
            "$lte" => Condition::Lte(argument.clone()),
            "$in" => Condition::In(array_argument(op, argument)?),
            "$nin" => Condition::Nin(array_argument(op, argument)?),
            "$exists" => Condition::Exists(truthy(argument)),
            "$size" => Condition::Size(
                argument
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| unsupported("$size needs a non-negative integer".into()))?,
            ),
            "$regex" => {
                let options = operators.get("$options").and_then(Value::as_str).unwrap_or("");
                Condition::Regex(compile_regex(argument, options)?)
            }
            "$options" if operators.contains_key("$regex") => continue,
            "$options" => return Err(unsupported("$options without $regex".into())),
            "$not" => Condition::Not(Box::new(compile_condition(argument)?)),
            other => return Err(unsupported(format!("unknown operator: {other}"))),
        };
        conditions.push(condition);
    }
    Ok(match conditions.len() {
        1 => conditions.remove(0),
        _ => Condition::All(conditions),
    })
}

fn array_argument(op: &str, argument: &Value) -> Result<Vec<Value>> {
    argument
        .as_array()
        .cloned()
        .ok_or_else(|| unsupported(format!("{op} needs an array")))
}

fn compile_regex(pattern: &Value, options: &str) -> Result<Regex> {
    let pattern = pattern
        .as_str()
        .ok_or_else(|| unsupported("$regex needs a string pattern".into()))?;
    RegexBuilder::new(pattern)
        .case_insensitive(options.contains('i'))
        .multi_line(options.contains('m'))
        .dot_matches_new_line(options.contains('s'))
        .ignore_whitespace(options.contains('x'))
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| unsupported(format!("invalid $regex: {e}")))
}

fn evaluate(predicate: &Predicate, document: &Document) -> bool {
    match predicate {
        Predicate::And(all) => all.iter().all(|p| evaluate(p, document)),
        Predicate::Or(any) => any.iter().any(|p| evaluate(p, document)),
        Predicate::Nor(none) => !none.iter().any(|p| evaluate(p, document)),
        Predicate::Field { path, condition } => {
            let values = resolve(document, path);
            test(condition, &values)
        }
    }
}

fn test(condition: &Condition, values: &[&Value]) -> bool {
    match condition {
        Condition::Eq(expected) => equals_any(values, expected),
        Condition::Ne(expected) => !equals_any(values, expected),
        Condition::Gt(bound) => compares_any(values, bound, |o| o == Ordering::Greater),
        Condition::Gte(bound) => compares_any(values, bound, |o| o != Ordering::Less),
        Condition::Lt(bound) => compares_any(values, bound, |o| o == Ordering::Less),
        Condition::Lte(bound) => compares_any(values, bound, |o| o != Ordering::Greater),
        Condition::In(options) => options.iter().any(|option| equals_any(values, option)),
        Condition::Nin(options) => !options.iter().any(|option| equals_any(values, option)),
        Condition::Exists(expected) => !values.is_empty() == *expected,
        Condition::Size(size) => values
            .iter()
            .any(|value| value.as_array().is_some_and(|items| items.len() == *size)),
        Condition::Regex(regex) => expand(values)
            .any(|value| value.as_str().is_some_and(|text| regex.is_match(text))),
        Condition::Not(inner) => !test(inner, values),
        Condition::All(conditions) => conditions.iter().all(|c| test(c, values)),
    }
}

// Each value, followed by the elements of those values that are arrays.
fn expand<'a>(values: &'a [&'a Value]) -> impl Iterator<Item = &'a Value> {
    values.iter().flat_map(|value| {
        let elements = value.as_array().map(|items| items.iter()).into_iter().flatten();
        std::iter::once(*value).chain(elements)
    })
}

fn equals_any(values: &[&Value], expected: &Value) -> bool {
    if values.is_empty() {
        return expected.is_null();
    }
    expand(values).any(|value| compare_values(value, expected) == Ordering::Equal)
}

// Range comparisons only hold between values of the same type class.
fn compares_any(values: &[&Value], bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    expand(values)
        .filter(|value| type_rank(value) == type_rank(bound))
        .any(|value| accept(compare_values(value, bound)))
}

/// All values reachable through a dotted path, descending into arrays.
pub fn resolve<'a>(document: &'a Document, path: &str) -> Vec<&'a Value> {
    let mut current: Vec<&Value> = Vec::new();
    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return current;
    };
    if let Some(value) = document.get(first) {
        current.push(value);
    }
    for segment in segments {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(map) => next.extend(map.get(segment)),
                Value::Array(items) => match segment.parse::<usize>() {
                    Ok(index) => next.extend(items.get(index)),
                    Err(_) => next.extend(
                        items
                            .iter()
                            .filter_map(|item| item.as_object().and_then(|map| map.get(segment))),
                    ),
                },
                _ => {}
            }
        }
        current = next;
    }
    current
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

/// Total order over JSON values: null < numbers < strings < objects < arrays < booleans.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(l, r)| compare_values(l, r))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Object(x), Value::Object(y)) => x
            .iter()
            .zip(y)
            .map(|((lk, lv), (rk, rv))| lk.cmp(rk).then_with(|| compare_values(lv, rv)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Order documents by each sort key in turn; a negative direction reverses that key.
pub fn sort_documents(documents: &mut [Document], sort: &Document) {
    if sort.is_empty() {
        return;
    }
    documents.sort_by(|left, right| {
        for (path, direction) in sort {
            let l = resolve(left, path).first().copied().unwrap_or(&NULL);
            let r = resolve(right, path).first().copied().unwrap_or(&NULL);
            let ordering = compare_values(l, r);
            let ordering = if direction.as_f64().is_some_and(|d| d < 0.0) {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => true,
    }
}

/// Apply an inclusion or exclusion projection. `_id` is kept unless excluded explicitly.
pub fn project(document: &Document, projection: &Document) -> Document {
    if projection.is_empty() {
        return document.clone();
    }
    let keep_id = projection.get("_id").is_none_or(truthy);
    let inclusion = projection
        .iter()
        .any(|(path, flag)| path != "_id" && truthy(flag));
    if inclusion {
        let mut projected = Document::new();
        if keep_id {
            if let Some(id) = document.get("_id") {
                projected.insert("_id".into(), id.clone());
            }
        }
        for (path, flag) in projection {
            if path != "_id" && truthy(flag) {
                copy_path(document, &mut projected, path);
            }
        }
        projected
    } else {
        let mut projected = document.clone();
        for (path, flag) in projection {
            if !truthy(flag) {
                remove_path(&mut projected, path);
            }
        }
        projected
    }
}

fn copy_path(source: &Document, target: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            if let Some(value) = source.get(path) {
                target.insert(path.to_string(), value.clone());
            }
        }
        Some((head, rest)) => {
            let Some(Value::Object(inner)) = source.get(head) else {
                return;
            };
            let entry = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Document::new()));
            if let Value::Object(inner_target) = entry {
                copy_path(inner, inner_target, rest);
            }
        }
    }
}

fn remove_path(target: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            target.shift_remove(path);
        }
        Some((head, rest)) => {
            if let Some(Value::Object(inner)) = target.get_mut(head) {
                remove_path(inner, rest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn matches(filter: Value, document: Value) -> bool {
        Matcher::compile(&doc(filter)).unwrap().matches(&doc(document))
    }

    #[test]
    fn implicit_equality_and_arrays() {
        assert!(matches(json!({"name": "Ann"}), json!({"name": "Ann"})));
        assert!(!matches(json!({"name": "Ann"}), json!({"name": "Bob"})));
        assert!(matches(json!({"tags": "a"}), json!({"tags": ["b", "a"]})));
        assert!(matches(json!({"missing": null}), json!({"name": "Ann"})));
    }

    #[test]
    fn comparison_operators_respect_type_class() {
        let person = json!({"age": 42, "name": "Ann"});
        assert!(matches(json!({"age": {"$gt": 40}}), person.clone()));
        assert!(matches(json!({"age": {"$gte": 42, "$lt": 50}}), person.clone()));
        assert!(!matches(json!({"age": {"$gt": "40"}}), person.clone()));
        assert!(matches(json!({"age": {"$in": [1, 42]}}), person.clone()));
        assert!(matches(json!({"age": {"$nin": [1, 2]}}), person));
    }

    #[test]
    fn dotted_paths_and_logical_operators() {
        let person = json!({"driversLicense": {"age": 30, "eyeColor": "blue"}});
        assert!(matches(json!({"driversLicense.age": 30}), person.clone()));
        assert!(matches(
            json!({"$or": [{"driversLicense.age": 1}, {"driversLicense.eyeColor": "blue"}]}),
            person.clone()
        ));
        assert!(!matches(json!({"$nor": [{"driversLicense.age": 30}]}), person.clone()));
        assert!(matches(json!({"driversLicense.height": {"$exists": false}}), person));
    }

    #[test]
    fn regex_with_options() {
        let person = json!({"name": "Annabel Miller"});
        assert!(matches(json!({"name": {"$regex": "^annabel", "$options": "i"}}), person.clone()));
        assert!(!matches(json!({"name": {"$regex": "^annabel"}}), person.clone()));
        assert!(matches(json!({"name": {"$not": {"$regex": "^Z"}}}), person));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        assert!(Matcher::compile(&doc(json!({"a": {"$where": "1"}}))).is_err());
        assert!(Matcher::compile(&doc(json!({"$where": "1"}))).is_err());
    }

    #[test]
    fn sort_by_multiple_keys() {
        let mut documents = vec![
            doc(json!({"_id": 1, "city": "B", "n": 1})),
            doc(json!({"_id": 2, "city": "A", "n": 2})),
            doc(json!({"_id": 3, "city": "B", "n": 3})),
        ];
        sort_documents(&mut documents, &doc(json!({"city": 1, "n": -1})));
        let ids: Vec<_> = documents.iter().map(|d| d["_id"].clone()).collect();
        assert_eq!(ids, vec![json!(2), json!(3), json!(1)]);
    }

    #[test]
    fn projection_modes() {
        let person = doc(json!({"_id": "p1", "name": "Ann", "gym": {"level": "gold", "id": 4}}));
        let included = project(&person, &doc(json!({"name": 1, "gym.level": 1})));
        assert_eq!(Value::Object(included), json!({"_id": "p1", "name": "Ann", "gym": {"level": "gold"}}));
        let excluded = project(&person, &doc(json!({"_id": 0, "gym": 0})));
        assert_eq!(Value::Object(excluded), json!({"name": "Ann"}));
    }
}
