//! Strict validation of a located document span.
//!
//! A thin total wrapper over `serde_json`: success yields the parsed
//! value, failure yields the byte offset where parsing gave up. Nothing
//! here panics or returns an error; repair and fallback are plain
//! fallthrough stages downstream, not catch blocks.

use serde_json::Value;

/// Outcome of a strict parse attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// The span parsed as a document.
    Valid(Value),
    /// Parsing failed at (approximately) this byte offset into the span.
    Invalid {
        /// Byte offset of the first rejected token, clamped to the span.
        offset: usize,
    },
}

impl Validation {
    /// Whether this outcome carries a document.
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }
}

/// Strictly parse `text` as a single document.
///
/// # Examples
///
/// ```
/// use lessonmail::extract::{validate, Validation};
///
/// assert!(validate(r#"{"a": 1}"#).is_valid());
/// assert!(matches!(validate(r#"{"a": }"#), Validation::Invalid { .. }));
/// ```
pub fn validate(text: &str) -> Validation {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Validation::Valid(value),
        Err(err) => Validation::Invalid {
            offset: byte_offset(text, err.line(), err.column()),
        },
    }
}

/// Convert serde_json's one-based line/column into a byte offset.
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let mut line_start = 0;
    if line > 1 {
        let mut seen = 1;
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                seen += 1;
                if seen == line {
                    line_start = i + 1;
                    break;
                }
            }
        }
    }
    (line_start + column.saturating_sub(1)).min(text.len())
}
