//! Renderer-facing section tree and the projection from documents.
//!
//! [`project`] is the trust boundary between unpredictable model output
//! and strongly-typed renderers: every key a shape asks for comes back as
//! a [`Section`], with wrong types coerced to text and missing keys
//! replaced by an explicit placeholder. Templates never need null checks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder text substituted for missing or null fields.
pub const PLACEHOLDER: &str = "Not available";

/// A named leaf or composite extracted from a document for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Human title, when one is known.
    pub title: Option<String>,
    /// The section body.
    pub content: SectionContent,
}

/// The body of a [`Section`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionContent {
    /// A single text value.
    Text(String),
    /// A flat list of text items.
    Items(Vec<String>),
    /// Nested subsections.
    Sections(Vec<Section>),
}

/// How a document key is expected to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A single text value.
    Scalar,
    /// A flat list of text items.
    List,
    /// Titled subsections: an array of objects, or a single object whose
    /// keys become subsection titles.
    SectionList,
}

/// One entry of a content shape: which key to pull and how to treat it.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Key looked up at the document's top level.
    pub key: &'static str,
    /// Title given to the resulting section.
    pub title: &'static str,
    /// Expected kind of the value.
    pub kind: FieldKind,
}

/// Project a document into sections following `shape`.
///
/// Total: one output section per shape entry, in shape order, no matter
/// what the document contains.
///
/// # Examples
///
/// ```
/// use lessonmail::section::{project, FieldKind, FieldSpec, SectionContent, PLACEHOLDER};
/// use serde_json::json;
///
/// const SHAPE: &[FieldSpec] = &[
///     FieldSpec { key: "summary", title: "Summary", kind: FieldKind::Scalar },
///     FieldSpec { key: "pitfalls", title: "Pitfalls", kind: FieldKind::List },
/// ];
///
/// let doc = json!({"summary": "Closures capture their environment."});
/// let sections = project(&doc, SHAPE);
/// assert_eq!(
///     sections[0].content,
///     SectionContent::Text("Closures capture their environment.".into())
/// );
/// // The absent key is present in the output anyway
/// assert_eq!(sections[1].content, SectionContent::Text(PLACEHOLDER.into()));
/// ```
pub fn project(doc: &Value, shape: &[FieldSpec]) -> Vec<Section> {
    shape.iter().map(|spec| project_field(doc, spec)).collect()
}

fn project_field(doc: &Value, spec: &FieldSpec) -> Section {
    let content = match doc.get(spec.key) {
        None | Some(Value::Null) => SectionContent::Text(PLACEHOLDER.to_string()),
        Some(value) => match spec.kind {
            FieldKind::Scalar => SectionContent::Text(scalar_text(value)),
            FieldKind::List => list_items(value),
            FieldKind::SectionList => section_list(value),
        },
    };
    Section {
        title: Some(spec.title.to_string()),
        content,
    }
}

/// String form of a value: strings as-is, everything else as its
/// document notation.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn list_items(value: &Value) -> SectionContent {
    match value {
        Value::Array(items) => SectionContent::Items(items.iter().map(scalar_text).collect()),
        // Wrong type: keep the list nature, one coerced item
        other => SectionContent::Items(vec![scalar_text(other)]),
    }
}

fn section_list(value: &Value) -> SectionContent {
    match value {
        Value::Array(items) => {
            SectionContent::Sections(items.iter().map(element_section).collect())
        }
        Value::Object(map) => SectionContent::Sections(object_sections(map)),
        other => SectionContent::Text(scalar_text(other)),
    }
}

/// One element of a section-list array. Objects contribute their `title`
/// key as the section title; a single remaining field collapses into the
/// body, several become titled subsections.
fn element_section(value: &Value) -> Section {
    match value {
        Value::Object(map) => {
            let title = map.get("title").and_then(Value::as_str).map(str::to_string);
            let rest: Vec<(&String, &Value)> = map
                .iter()
                .filter(|(key, _)| !(key.as_str() == "title" && title.is_some()))
                .collect();
            let content = if rest.is_empty() {
                SectionContent::Text(PLACEHOLDER.to_string())
            } else if rest.len() == 1 {
                content_for(rest[0].1)
            } else {
                SectionContent::Sections(
                    rest.iter()
                        .map(|&(key, value)| Section {
                            title: Some(title_from_key(key)),
                            content: content_for(value),
                        })
                        .collect(),
                )
            };
            Section { title, content }
        }
        other => Section {
            title: None,
            content: SectionContent::Text(scalar_text(other)),
        },
    }
}

/// Subsections for a plain object value, keys in document order.
fn object_sections(map: &Map<String, Value>) -> Vec<Section> {
    map.iter()
        .map(|(key, value)| Section {
            title: Some(title_from_key(key)),
            content: content_for(value),
        })
        .collect()
}

fn content_for(value: &Value) -> SectionContent {
    match value {
        Value::String(s) => SectionContent::Text(s.clone()),
        Value::Array(_) => list_items(value),
        Value::Object(map) => SectionContent::Sections(object_sections(map)),
        other => SectionContent::Text(other.to_string()),
    }
}

/// `"key_points"` becomes `"Key points"`.
fn title_from_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => spaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SHAPE: &[FieldSpec] = &[
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

    fn text(s: &str) -> SectionContent {
        SectionContent::Text(s.to_string())
    }

    #[test]
    fn well_shaped_document_maps_directly() {
        let doc = json!({
            "concept": {
                "definition": "A trait is a shared interface.",
                "explanation": "Types opt in by implementing it."
            },
            "key_points": ["traits define behavior", "impl blocks opt in"],
            "summary": "Traits are Rust's interfaces."
        });
        let sections = project(&doc, SHAPE);
        assert_eq!(sections.len(), 3);

        assert_eq!(sections[0].title.as_deref(), Some("Concept"));
        match &sections[0].content {
            SectionContent::Sections(subs) => {
                assert_eq!(subs[0].title.as_deref(), Some("Definition"));
                assert_eq!(subs[0].content, text("A trait is a shared interface."));
                assert_eq!(subs[1].title.as_deref(), Some("Explanation"));
            }
            other => panic!("expected subsections, got {other:?}"),
        }

        assert_eq!(
            sections[1].content,
            SectionContent::Items(vec![
                "traits define behavior".to_string(),
                "impl blocks opt in".to_string()
            ])
        );
        assert_eq!(sections[2].content, text("Traits are Rust's interfaces."));
    }

    #[test]
    fn missing_keys_become_placeholders() {
        let sections = project(&json!({}), SHAPE);
        assert_eq!(sections.len(), 3);
        for section in &sections {
            assert_eq!(section.content, text(PLACEHOLDER));
        }
    }

    #[test]
    fn null_is_treated_as_missing() {
        let sections = project(&json!({"summary": null}), SHAPE);
        assert_eq!(sections[2].content, text(PLACEHOLDER));
    }

    #[test]
    fn wrong_typed_scalar_is_coerced() {
        let sections = project(&json!({"summary": 42}), SHAPE);
        assert_eq!(sections[2].content, text("42"));

        let sections = project(&json!({"summary": ["a", "b"]}), SHAPE);
        assert_eq!(sections[2].content, text(r#"["a","b"]"#));
    }

    #[test]
    fn wrong_typed_list_becomes_single_item() {
        let sections = project(&json!({"key_points": "just one"}), SHAPE);
        assert_eq!(
            sections[1].content,
            SectionContent::Items(vec!["just one".to_string()])
        );
    }

    #[test]
    fn list_items_are_each_coerced() {
        let sections = project(&json!({"key_points": ["a", 1, true]}), SHAPE);
        assert_eq!(
            sections[1].content,
            SectionContent::Items(vec!["a".to_string(), "1".to_string(), "true".to_string()])
        );
    }

    #[test]
    fn string_concept_degrades_to_text() {
        let sections = project(&json!({"concept": "Content unavailable"}), SHAPE);
        assert_eq!(sections[0].content, text("Content unavailable"));
    }

    #[test]
    fn example_array_uses_title_keys() {
        const EXAMPLES: &[FieldSpec] = &[FieldSpec {
            key: "examples",
            title: "Examples",
            kind: FieldKind::SectionList,
        }];
        let doc = json!({
            "examples": [
                {"title": "Hello world", "code": "fn main() {}"},
                {"title": "With args", "code": "fn main() { ... }", "explanation": "Arguments come from env"},
                "a bare string example"
            ]
        });
        let sections = project(&doc, EXAMPLES);
        let subs = match &sections[0].content {
            SectionContent::Sections(subs) => subs,
            other => panic!("expected subsections, got {other:?}"),
        };

        // Single non-title field collapses into the body
        assert_eq!(subs[0].title.as_deref(), Some("Hello world"));
        assert_eq!(subs[0].content, text("fn main() {}"));

        // Several fields become titled subsections in document order
        assert_eq!(subs[1].title.as_deref(), Some("With args"));
        match &subs[1].content {
            SectionContent::Sections(inner) => {
                assert_eq!(inner[0].title.as_deref(), Some("Code"));
                assert_eq!(inner[1].title.as_deref(), Some("Explanation"));
            }
            other => panic!("expected subsections, got {other:?}"),
        }

        assert_eq!(subs[2].title, None);
        assert_eq!(subs[2].content, text("a bare string example"));
    }

    #[test]
    fn title_from_key_formats() {
        assert_eq!(title_from_key("definition"), "Definition");
        assert_eq!(title_from_key("key_points"), "Key points");
        assert_eq!(title_from_key(""), "");
    }
}
