//! # Resilient structured-content extraction
//!
//! The model is instructed to answer with a single JSON document, but
//! real responses arrive wrapped in prose, fenced in markdown,
//! HTML-escaped, or truncated mid-token at the output limit. This module
//! turns any such response into a valid document plus diagnostics, and
//! never returns an error or panics, whatever the input.
//!
//! ## Pipeline
//!
//! The raw reply first gets a direct locate-and-parse: a valid document
//! must pass through untouched, including one whose string values mention
//! `` ``` ``. Only when that attempt fails does the staircase engage:
//!
//! | Stage | Function | Role |
//! |-------|----------|------|
//! | Preprocess | [`strip_fences`], [`unescape_entities`] | peel markdown fences and HTML entities |
//! | Locate | [`locate()`] | find the document span by depth/quote scanning |
//! | Validate | [`validate()`] | strict parse, total result |
//! | Repair | [`repair()`] | truncate to the last sound position, close containers |
//! | Fallback | [`fallback()`] | salvage anchor content, or a fixed marker document |
//!
//! [`extract_document`] runs the stages in order and stops at the first
//! one that yields a valid document. Worst case is degraded content,
//! never a failure.

pub mod fallback;
pub mod locate;
pub mod repair;
pub mod validate;

// Re-export the stage functions at module level
pub use fallback::{fallback, CONTENT_UNAVAILABLE};
pub use locate::{locate, strip_fences, unescape_entities, DocumentSpan};
pub use repair::repair;
pub use validate::{validate, Validation};

use std::borrow::Cow;

use serde_json::Value;

use crate::diagnostics::{ExtractDiagnostics, ExtractStage};

/// A document pulled out of a model response, with the record of how.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// The extracted document. Always a valid value; possibly salvaged
    /// or placeholder-only, as the diagnostics tell.
    pub document: Value,
    /// What the pipeline saw and did along the way.
    pub diagnostics: ExtractDiagnostics,
}

/// Extract a document from a raw model response. Total; never fails.
///
/// # Examples
///
/// ```
/// use lessonmail::extract::extract_document;
///
/// let raw = "Sure!\n```json\n{\"summary\": \"All done\"}\n```";
/// let extraction = extract_document(raw);
/// assert_eq!(extraction.document["summary"], "All done");
/// assert!(extraction.diagnostics.intact());
/// ```
pub fn extract_document(raw: &str) -> Extraction {
    let mut diagnostics = ExtractDiagnostics::default();

    // A valid reply must pass through untouched, including one whose
    // string values mention ``` — so the raw text gets a direct
    // locate-and-parse, and fences are only stripped when that fails.
    let direct = unescape_entities(raw);
    if let Some(span) = locate(&direct) {
        if let Validation::Valid(document) = validate(span.slice(&direct)) {
            diagnostics.unescaped = matches!(direct, Cow::Owned(_));
            diagnostics.located = true;
            return Extraction {
                document,
                diagnostics,
            };
        }
    }

    let inner = strip_fences(raw);
    diagnostics.fenced = inner != raw;

    // Entities are replaced before any scanning so a wholly HTML-escaped
    // document still locates correctly.
    let text = unescape_entities(inner);
    diagnostics.unescaped = matches!(text, Cow::Owned(_));

    let Some(span) = locate(&text) else {
        return finish_with_fallback(&text, diagnostics);
    };
    diagnostics.located = true;
    diagnostics.truncated = span.is_truncated();

    let span_text = span.slice(&text);
    match validate(span_text) {
        Validation::Valid(document) => {
            return Extraction {
                document,
                diagnostics,
            };
        }
        Validation::Invalid { offset } => diagnostics.parse_offset = Some(offset),
    }

    let repaired = repair(span_text);
    match validate(&repaired) {
        Validation::Valid(document) => {
            diagnostics.stage = ExtractStage::Repaired;
            return Extraction {
                document,
                diagnostics,
            };
        }
        Validation::Invalid { offset } => diagnostics.repaired_parse_offset = Some(offset),
    }

    finish_with_fallback(&text, diagnostics)
}

fn finish_with_fallback(text: &str, mut diagnostics: ExtractDiagnostics) -> Extraction {
    match fallback::salvage(text) {
        Some(document) => {
            diagnostics.stage = ExtractStage::Fallback;
            diagnostics.anchor_found = true;
            Extraction {
                document,
                diagnostics,
            }
        }
        None => {
            diagnostics.stage = ExtractStage::Unavailable;
            Extraction {
                document: fallback::unavailable_document(),
                diagnostics,
            }
        }
    }
}
