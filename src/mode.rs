//! Content modes: which sections a lesson carries and how it is asked for.
//!
//! Shapes are static compile-time tables, not runtime configuration. The
//! extraction core is mode-agnostic; modes only matter to the prompt that
//! is sent and to the projection of the returned document.

use serde::{Deserialize, Serialize};

use crate::section::{FieldKind, FieldSpec};

/// How much ground a lesson covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    /// Core concept, key points, and a summary.
    #[default]
    Overview,
    /// Everything in an overview plus worked examples and pitfalls.
    Detailed,
}

/// Shape of an overview lesson document.
pub const OVERVIEW_SHAPE: &[FieldSpec] = &[
    FieldSpec {
        key: "concept",
        title: "Concept",
        kind: FieldKind::SectionList,
    },
    FieldSpec {
        key: "key_points",
        title: "Key points",
        kind: FieldKind::List,
    },
    FieldSpec {
        key: "summary",
        title: "Summary",
        kind: FieldKind::Scalar,
    },
];

/// Shape of a detailed lesson document.
pub const DETAILED_SHAPE: &[FieldSpec] = &[
    FieldSpec {
        key: "concept",
        title: "Concept",
        kind: FieldKind::SectionList,
    },
    FieldSpec {
        key: "key_points",
        title: "Key points",
        kind: FieldKind::List,
    },
    FieldSpec {
        key: "examples",
        title: "Examples",
        kind: FieldKind::SectionList,
    },
    FieldSpec {
        key: "pitfalls",
        title: "Common pitfalls",
        kind: FieldKind::List,
    },
    FieldSpec {
        key: "summary",
        title: "Summary",
        kind: FieldKind::Scalar,
    },
];

const OVERVIEW_TEMPLATE: &str = r#"You are writing a short educational lesson about {topic}.

Respond with a single JSON object and nothing else: no prose around it, no
markdown fences. Use exactly this shape:

{{
  "concept": {{
    "definition": "one-sentence definition of {topic}",
    "explanation": "one short paragraph explaining the idea"
  }},
  "key_points": ["three to five short bullet points"],
  "summary": "a two-sentence wrap-up"
}}"#;

const DETAILED_TEMPLATE: &str = r#"You are writing an in-depth educational lesson about {topic}.

Respond with a single JSON object and nothing else: no prose around it, no
markdown fences. Use exactly this shape:

{{
  "concept": {{
    "definition": "one-sentence definition of {topic}",
    "explanation": "one short paragraph explaining the idea"
  }},
  "key_points": ["three to five short bullet points"],
  "examples": [
    {{
      "title": "short example name",
      "code": "a minimal code or usage sample",
      "explanation": "what the example shows"
    }}
  ],
  "pitfalls": ["common mistakes and how to avoid them"],
  "summary": "a two-sentence wrap-up"
}}"#;

impl ContentMode {
    /// Stable lowercase identifier, for events and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentMode::Overview => "overview",
            ContentMode::Detailed => "detailed",
        }
    }

    /// The section shape documents of this mode are projected through.
    pub fn shape(self) -> &'static [FieldSpec] {
        match self {
            ContentMode::Overview => OVERVIEW_SHAPE,
            ContentMode::Detailed => DETAILED_SHAPE,
        }
    }

    /// The prompt template asking for this mode's document.
    pub fn template(self) -> &'static str {
        match self {
            ContentMode::Overview => OVERVIEW_TEMPLATE,
            ContentMode::Detailed => DETAILED_TEMPLATE,
        }
    }

    /// Subject line for the delivery email.
    pub fn subject(self, topic: &str) -> String {
        match self {
            ContentMode::Overview => format!("Quick lesson: {topic}"),
            ContentMode::Detailed => format!("Deep dive: {topic}"),
        }
    }
}
