//! Rewrites the two non-JSON literal forms that show up in copy-pasted shell
//! snippets into strict JSON: bare object keys (`{ $gt: 5 }`, `{ name: "x" }`)
//! and regular-expression literals (`/pattern/flags`).
//!
//! Both passes are idempotent. [`normalize`] runs them in order and keeps the
//! result only if it is valid JSON; otherwise the input is returned as-is so
//! that the JSON parser downstream reports the real problem.

use std::borrow::Cow;
use std::ops::Range;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::debug;

lazy_static! {
    static ref OPERATOR_KEY: Regex = Regex::new(r"(^|[{,\s])(\$[A-Za-z_]\w*)\s*:").unwrap();
    static ref FIELD_KEY: Regex = Regex::new(r"(^|[{,\s])([A-Za-z_][\w.]*)\s*:").unwrap();
    static ref ANY_KEY: Regex = Regex::new(r"(^|[{,\s])(\$?[A-Za-z_][\w.]*)\s*:").unwrap();

    // { "$regex": "pattern", "$options": "<imxsu>" }
    static ref REGEX_DOC_JSON: Regex = Regex::new(
        r#"\{\s*"\$regex"\s*:\s*"(?:[^"\\]|\\.)*"(?:\s*,\s*"\$options"\s*:\s*"[imxsu]*")?\s*\}"#
    ).unwrap();
    // { "$regex": /pattern/, "$options": "<imxsu>" }
    static ref REGEX_DOC_HYBRID: Regex = Regex::new(
        r#"\{\s*"\$regex"\s*:\s*/((?:\\.|[^/\\\n])*)/(?:\s*,\s*"\$options"\s*:\s*"([imxsu]*)")?\s*\}"#
    ).unwrap();
    // { "$regex": /pattern/<imxsu> }
    static ref REGEX_DOC_OBJECT: Regex = Regex::new(
        r#"\{\s*"\$regex"\s*:\s*/((?:\\.|[^/\\\n])*)/([imxsu]*)\s*\}"#
    ).unwrap();
    // /pattern/<imxsu> in value position
    static ref REGEX_VALUE: Regex = Regex::new(
        r"([:\[]\s*)/((?:\\.|[^/\\\n])*)/([imxsu]*)"
    ).unwrap();
}

/// Which bare keys [`quote_keys`] rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPattern {
    /// `$`-prefixed operator keys only.
    Operator,
    /// Plain identifiers (dots allowed after the first character).
    Field,
    Any,
}

impl KeyPattern {
    fn regex(self) -> &'static Regex {
        match self {
            KeyPattern::Operator => &OPERATOR_KEY,
            KeyPattern::Field => &FIELD_KEY,
            KeyPattern::Any => &ANY_KEY,
        }
    }
}

/// Run both passes and keep the result only if it parses as JSON.
pub fn normalize(input: &str) -> Cow<'_, str> {
    let quoted = quote_keys(input, KeyPattern::Any);
    let rewritten = normalize_regex(&quoted).into_owned();
    if rewritten == input {
        return Cow::Borrowed(input);
    }
    match serde_json::from_str::<serde_json::Value>(&rewritten) {
        Ok(_) => {
            debug!(from = input, to = %rewritten, "normalized literal");
            Cow::Owned(rewritten)
        }
        Err(e) => {
            debug!(input, error = %e, "normalization discarded");
            Cow::Borrowed(input)
        }
    }
}

/// Double-quote bare keys that are immediately followed by `:`.
///
/// String literals and regular-expression literals are copied through
/// untouched, so a `word:` inside a value is never rewritten.
pub fn quote_keys(input: &str, pattern: KeyPattern) -> Cow<'_, str> {
    let regex = pattern.regex();
    let segments = split_literals(input);
    if !segments
        .iter()
        .any(|segment| matches!(segment, Segment::Code(code) if regex.is_match(code)))
    {
        return Cow::Borrowed(input);
    }
    let mut quoted = String::with_capacity(input.len() + 8);
    for segment in segments {
        match segment {
            Segment::Code(code) => quoted.push_str(&regex.replace_all(code, r#"${1}"${2}":"#)),
            Segment::Literal(literal) => quoted.push_str(literal),
        }
    }
    Cow::Owned(quoted)
}

/// Convert the first regular-expression literal into a `$regex` document.
///
/// The forms are tried in a fixed order and only the first one found outside
/// a quoted string is rewritten; an input already in JSON form is returned
/// unchanged.
pub fn normalize_regex(input: &str) -> Cow<'_, str> {
    let strings = string_spans(input);
    if first_in_code(&REGEX_DOC_JSON, input, &strings).is_some() {
        return Cow::Borrowed(input);
    }
    let (whole, replacement) = if let Some((whole, caps)) =
        first_in_code(&REGEX_DOC_HYBRID, input, &strings)
    {
        (whole, regex_document(&caps[1], caps.get(2).map_or("", |m| m.as_str())))
    } else if let Some((whole, caps)) = first_in_code(&REGEX_DOC_OBJECT, input, &strings) {
        (whole, regex_document(&caps[1], &caps[2]))
    } else if let Some((whole, caps)) = first_in_code(&REGEX_VALUE, input, &strings) {
        (whole, format!("{}{}", &caps[1], regex_document(&caps[2], &caps[3])))
    } else {
        return Cow::Borrowed(input);
    };
    let mut rewritten = String::with_capacity(input.len() + replacement.len());
    rewritten.push_str(&input[..whole.start]);
    rewritten.push_str(&replacement);
    rewritten.push_str(&input[whole.end..]);
    Cow::Owned(rewritten)
}

fn first_in_code<'h>(
    regex: &Regex,
    input: &'h str,
    strings: &[Range<usize>],
) -> Option<(Range<usize>, Captures<'h>)> {
    let mut from = 0;
    while let Some(caps) = regex.captures_at(input, from) {
        let whole = caps.get(0)?.range();
        match strings.iter().find(|span| span.contains(&whole.start)) {
            // resume after the string, a match starting inside it may have
            // swallowed the opening slash of a real literal
            Some(span) => from = span.end,
            None => return Some((whole, caps)),
        }
    }
    None
}

fn regex_document(pattern: &str, options: &str) -> String {
    let pattern = serde_json::Value::from(pattern);
    if options.is_empty() {
        format!(r#"{{"$regex":{pattern}}}"#)
    } else {
        let options = serde_json::Value::from(options);
        format!(r#"{{"$regex":{pattern},"$options":{options}}}"#)
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum Segment<'a> {
    Code(&'a str),
    Literal(&'a str),
}

// Splits the input into code and literal runs. A `/` only opens a regex
// literal in value position, i.e. after `:`, `[` or `,`.
pub(crate) fn split_literals(input: &str) -> Vec<Segment<'_>> {
    let bytes = input.as_bytes();
    let mut segments = Vec::new();
    let mut code_start = 0;
    let mut last_significant = None;
    let mut i = 0;
    while i < bytes.len() {
        let end = match bytes[i] {
            quote @ (b'"' | b'\'') => Some(closing(bytes, i, quote).map_or(bytes.len(), |j| j + 1)),
            b'/' if matches!(last_significant, Some(b':' | b'[' | b',')) => {
                closing(bytes, i, b'/').map(|j| {
                    let mut k = j + 1;
                    while k < bytes.len() && bytes[k].is_ascii_alphabetic() {
                        k += 1;
                    }
                    k
                })
            }
            _ => None,
        };
        match end {
            Some(end) => {
                if code_start < i {
                    segments.push(Segment::Code(&input[code_start..i]));
                }
                segments.push(Segment::Literal(&input[i..end]));
                last_significant = Some(bytes[end - 1]);
                code_start = end;
                i = end;
            }
            None => {
                if !bytes[i].is_ascii_whitespace() {
                    last_significant = Some(bytes[i]);
                }
                i += 1;
            }
        }
    }
    if code_start < bytes.len() {
        segments.push(Segment::Code(&input[code_start..]));
    }
    segments
}

// Byte ranges of the quoted string literals.
fn string_spans(input: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut offset = 0;
    for segment in split_literals(input) {
        let text = match segment {
            Segment::Literal(text) if text.starts_with(['"', '\'']) => {
                spans.push(offset..offset + text.len());
                text
            }
            Segment::Code(text) | Segment::Literal(text) => text,
        };
        offset += text.len();
    }
    spans
}

// Index of the unescaped delimiter closing the literal opened at `open`.
// Regex literals do not span lines.
fn closing(bytes: &[u8], open: usize, delimiter: u8) -> Option<usize> {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' if delimiter == b'/' => return None,
            b if b == delimiter => return Some(i),
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_are_split_out() {
        let segments = split_literals(r#"{ a: "x: y", b: /c:d/i }"#);
        assert_eq!(
            segments,
            vec![
                Segment::Code("{ a: "),
                Segment::Literal(r#""x: y""#),
                Segment::Code(", b: "),
                Segment::Literal("/c:d/i"),
                Segment::Code(" }"),
            ]
        );
    }

    #[test]
    fn slash_outside_value_position_is_code() {
        let segments = split_literals("a/b/c");
        assert_eq!(segments, vec![Segment::Code("a/b/c")]);
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        let segments = split_literals(r#"{"a": "open"#);
        assert_eq!(segments.last(), Some(&Segment::Literal(r#""open"#)));
    }

    #[test]
    fn slashes_inside_strings_are_not_regex_literals() {
        let input = r#"{"url": "http://a/b", "name": /x/}"#;
        let out = normalize_regex(input);
        assert_eq!(out, r#"{"url": "http://a/b", "name": {"$regex":"x"}}"#);
    }

    #[test]
    fn colon_slash_inside_a_string_does_not_hide_the_next_literal() {
        let out = normalize_regex(r#"{"file": "C:/temp", "name": /Jer/}"#);
        assert_eq!(out, r#"{"file": "C:/temp", "name": {"$regex":"Jer"}}"#);
    }

    #[test]
    fn escaped_slash_stays_in_pattern() {
        let out = normalize_regex(r#"{"path": /a\/b/}"#);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["path"]["$regex"], r"a\/b");
    }
}
