//! Document location: find the JSON candidate inside arbitrary model text.
//!
//! Model responses wrap the document in prose, markdown fences, or
//! HTML-escaped entities. [`strip_fences`] and [`unescape_entities`] peel
//! those layers off; [`locate`] then finds the document span by depth and
//! quote aware scanning. All three are pure functions over the input text.

use std::borrow::Cow;

/// Offsets of a candidate document inside preprocessed text.
///
/// `start` points at the opening brace. `end`, when present, is the byte
/// offset of the balancing closing brace outside any string. `end` of
/// `None` means the text ran out with containers still open — the
/// truncation signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentSpan {
    /// Byte offset of the opening `{`.
    pub start: usize,
    /// Byte offset of the balancing `}`, or `None` when truncated.
    pub end: Option<usize>,
}

impl DocumentSpan {
    /// Whether the span ran off the end of the input.
    pub fn is_truncated(&self) -> bool {
        self.end.is_none()
    }

    /// The candidate document text inside `text`.
    ///
    /// `text` must be the same string the span was located in.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        match self.end {
            Some(end) => &text[self.start..=end],
            None => &text[self.start..],
        }
    }
}

/// Strip the first markdown code fence, returning its inner content.
///
/// Handles `` ```json `` and bare `` ``` `` fences. An unterminated fence
/// yields everything after it; text without a fence is returned unchanged.
///
/// # Examples
///
/// ```
/// use lessonmail::extract::strip_fences;
///
/// let input = "Here:\n```json\n{\"a\": 1}\n```\nThanks!";
/// assert_eq!(strip_fences(input), "{\"a\": 1}");
/// assert_eq!(strip_fences("no fence"), "no fence");
/// ```
pub fn strip_fences(text: &str) -> &str {
    let Some(fence_start) = text.find("```") else {
        return text;
    };
    let after_backticks = fence_start + 3;

    // The fence line may carry a language tag; content starts after the
    // first newline. A fence with no newline at all has nothing inside it.
    let content_start = match text[after_backticks..].find('\n') {
        Some(line_end) => after_backticks + line_end + 1,
        None => return text,
    };

    match text[content_start..].find("```") {
        Some(close_offset) => text[content_start..content_start + close_offset].trim(),
        None => text[content_start..].trim(),
    }
}

/// Replace the HTML entities models emit when they escape code samples.
///
/// `&amp;` is replaced last so that a double-escaped entity unescapes by
/// exactly one level (`&amp;lt;` becomes `&lt;`, not `<`).
///
/// # Examples
///
/// ```
/// use lessonmail::extract::unescape_entities;
///
/// assert_eq!(unescape_entities("a &lt; b &amp;&amp; c &gt; d"), "a < b && c > d");
/// assert_eq!(unescape_entities("&quot;quoted&quot;"), "\"quoted\"");
/// ```
pub fn unescape_entities(text: &str) -> Cow<'_, str> {
    const ENTITIES: [(&str, &str); 4] = [
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&amp;", "&"),
    ];

    if !ENTITIES.iter().any(|(entity, _)| text.contains(entity)) {
        return Cow::Borrowed(text);
    }

    let mut out = text.to_string();
    for (entity, replacement) in ENTITIES {
        out = out.replace(entity, replacement);
    }
    Cow::Owned(out)
}

/// Find the first candidate document in `text`.
///
/// Scans from the first `{`, tracking string and escape state so braces
/// inside string values are ignored. Returns `None` when the text contains
/// no opening brace at all (the caller goes straight to the fallback).
///
/// # Examples
///
/// ```
/// use lessonmail::extract::locate;
///
/// let text = r#"Sure! {"a": 1} Hope that helps."#;
/// let span = locate(text).unwrap();
/// assert_eq!(span.slice(text), r#"{"a": 1}"#);
///
/// let cut = r#"{"a": [1, 2"#;
/// assert!(locate(cut).unwrap().is_truncated());
/// ```
pub fn locate(text: &str) -> Option<DocumentSpan> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        if ch == '\\' && in_string {
            escape_next = true;
            continue;
        }
        if ch == '"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(DocumentSpan {
                        start,
                        end: Some(start + i),
                    });
                }
            }
            _ => {}
        }
    }

    Some(DocumentSpan { start, end: None })
}
