//! Plan Extractor
//!
//! Finds the first well-formed JSON object (or array) inside free model text.
//! Models wrap their JSON in prose and markdown fences, so extraction is two
//! stages: locate a balanced candidate with a bracket-depth scanner that
//! understands string literals, then parse it.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// What kind of top-level JSON value to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonMode {
    Object,
    Array,
}

impl JsonMode {
    fn delimiters(self) -> (u8, u8) {
        match self {
            JsonMode::Object => (b'{', b'}'),
            JsonMode::Array => (b'[', b']'),
        }
    }
}

impl std::fmt::Display for JsonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonMode::Object => write!(f, "object"),
            JsonMode::Array => write!(f, "array"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no JSON {mode} found in model output")]
    NoJsonFound { mode: JsonMode },

    #[error("malformed JSON in model output: {0}")]
    MalformedJson(String),
}

/// Extract and parse the first well-formed JSON value of the given mode
///
/// Top-level candidates are tried in order. A balanced candidate that fails to
/// parse is skipped as a whole, so its interior is never searched; the scan
/// resumes after its closing bracket. `MalformedJson` is reported only when no
/// candidate parses, carrying the first parse error.
pub fn extract(raw: &str, mode: JsonMode) -> Result<Value, ExtractError> {
    debug!(raw_len = %raw.len(), %mode, "extract: called");
    let (open, close) = mode.delimiters();
    let bytes = raw.as_bytes();

    let mut first_error: Option<String> = None;
    let mut pos = 0;
    while let Some(rel) = bytes[pos..].iter().position(|&b| b == open) {
        let start = pos + rel;
        let Some(end) = balanced_end(bytes, start, open, close) else {
            pos = start + 1;
            continue;
        };

        // Delimiters are ASCII, so both ends sit on char boundaries
        let candidate = &raw[start..=end];
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => {
                debug!(%start, %end, "extract: parsed candidate");
                return Ok(value);
            }
            Err(e) => {
                debug!(%start, %end, error = %e, "extract: candidate failed to parse");
                first_error.get_or_insert_with(|| e.to_string());
            }
        }
        pos = end + 1;
    }

    match first_error {
        Some(message) => Err(ExtractError::MalformedJson(message)),
        None => {
            debug!("extract: no balanced candidate");
            Err(ExtractError::NoJsonFound { mode })
        }
    }
}

/// Index of the bracket closing the one at `start`, if the text balances
fn balanced_end(bytes: &[u8], start: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        if b == b'"' {
            in_string = true;
        } else if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(start + offset);
            }
        }
    }

    None
}
