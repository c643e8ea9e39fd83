use percent_encoding::percent_decode_str;

use crate::error::{GumshoeError, Result};
use crate::settings::Limits;

/// Decode and bounds-check the raw `query` parameter.
///
/// The length limit applies to the encoded text, before decoding. A `%` that
/// is not followed by two hex digits is rejected rather than passed through.
pub fn validate_query(raw: Option<&str>, limits: &Limits) -> Result<String> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(GumshoeError::InvalidInput("Query is required".into())),
    };
    if raw.chars().count() > limits.max_query_length {
        return Err(GumshoeError::InvalidInput("Query too large".into()));
    }
    if !well_formed_escapes(raw) {
        return Err(GumshoeError::InvalidInput("Bad input".into()));
    }
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| GumshoeError::InvalidInput("Bad input".into()))?;
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        return Err(GumshoeError::InvalidInput("Bad input".into()));
    }
    Ok(trimmed.to_string())
}

fn well_formed_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            match escape {
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
                _ => return false,
            }
        } else {
            i += 1;
        }
    }
    true
}
