//! Splits the argument of a `find(...)` clause into its filter and projection
//! documents and parses each one.

use crate::command::Document;
use crate::error::{GumshoeError, Result};
use crate::normalize::{normalize, split_literals, Segment};

const INVALID_FORMAT: &str = "Invalid input format";

/// Parse `filter[, projection]`. An empty argument yields two empty documents.
pub fn parse_find_arguments(arguments: &str) -> Result<(Document, Document)> {
    let arguments = arguments.trim();
    if arguments.is_empty() {
        return Ok((Document::new(), Document::new()));
    }
    let (filter, projection) = split_documents(arguments)?;
    let filter = parse_document(filter).map_err(GumshoeError::FilterParse)?;
    let projection = match projection {
        Some(projection) => parse_document(projection).map_err(GumshoeError::ProjectionParse)?,
        None => Document::new(),
    };
    Ok((filter, projection))
}

fn parse_document(text: &str) -> std::result::Result<Document, String> {
    let normalized = normalize(text);
    serde_json::from_str::<Document>(&normalized).map_err(|e| e.to_string())
}

// Top-level `{...}` blocks: one filter, optionally a comma and one projection,
// nothing else.
fn split_documents(arguments: &str) -> Result<(&str, Option<&str>)> {
    let filter_error = || GumshoeError::FilterParse(INVALID_FORMAT.into());
    let projection_error = || GumshoeError::ProjectionParse(INVALID_FORMAT.into());

    let filter_end = balanced_block(arguments, 0).ok_or_else(filter_error)?;
    let filter = &arguments[..filter_end];
    let rest = arguments[filter_end..].trim_start();
    if rest.is_empty() {
        return Ok((filter, None));
    }
    let rest = rest.strip_prefix(',').ok_or_else(filter_error)?.trim();
    let projection_end = balanced_block(rest, 0).ok_or_else(projection_error)?;
    if !rest[projection_end..].trim().is_empty() {
        return Err(projection_error());
    }
    Ok((filter, Some(&rest[..projection_end])))
}

// End offset (exclusive) of the brace block opening at `start`, skipping over
// string and regex literals.
fn balanced_block(text: &str, start: usize) -> Option<usize> {
    if text.as_bytes().get(start) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    let mut offset = start;
    for segment in split_literals(&text[start..]) {
        let code = match segment {
            Segment::Code(code) => code,
            Segment::Literal(literal) => {
                offset += literal.len();
                continue;
            }
        };
        for (i, b) in code.bytes().enumerate() {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(offset + i + 1);
                    }
                }
                _ => {}
            }
        }
        offset += code.len();
    }
    None
}
