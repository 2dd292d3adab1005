//! Extraction diagnostics and telemetry.
//!
//! [`ExtractDiagnostics`] records what happened while a model response was
//! turned into a document — whether a fence was stripped, where strict
//! parsing failed, whether structural repair or the partial-content
//! fallback was involved.

/// Which stage of the extraction pipeline produced the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractStage {
    /// The located document parsed as-is.
    #[default]
    Direct,
    /// Structural repair was needed before the document parsed.
    Repaired,
    /// Repair was not enough; content was salvaged by anchor search.
    Fallback,
    /// Nothing recognizable was found. Every section is a placeholder.
    Unavailable,
}

impl ExtractStage {
    /// Stable lowercase identifier, for events and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractStage::Direct => "direct",
            ExtractStage::Repaired => "repaired",
            ExtractStage::Fallback => "fallback",
            ExtractStage::Unavailable => "unavailable",
        }
    }
}

/// Records what happened during document extraction.
///
/// Attached to every [`Extraction`](crate::extract::Extraction) produced by
/// [`extract_document`](crate::extract::extract_document) and carried on the
/// final [`Lesson`](crate::generate::Lesson). Tells the caller which stage of
/// the pipeline yielded the document and what the preprocessor and parser saw
/// along the way.
///
/// # Example
///
/// ```
/// use lessonmail::diagnostics::ExtractDiagnostics;
///
/// let diag = ExtractDiagnostics::default();
/// assert!(diag.intact()); // Direct stage means no intervention
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExtractDiagnostics {
    /// Which pipeline stage ultimately produced the document.
    pub stage: ExtractStage,

    /// Whether a markdown code fence was stripped to find the document.
    /// Stripping only runs when the raw text does not parse directly.
    pub fenced: bool,

    /// Whether HTML entities were replaced during preprocessing.
    pub unescaped: bool,

    /// Whether a candidate document was located at all (an opening brace
    /// was found). `false` sends the input straight to the fallback.
    pub located: bool,

    /// Whether the span scan ran off the end of the input with containers
    /// still open (the truncation signature).
    pub truncated: bool,

    /// Byte offset at which strict parsing of the located span first
    /// failed. `None` means the span parsed directly.
    pub parse_offset: Option<usize>,

    /// Byte offset at which the repaired text still failed to parse.
    /// `None` means repair was not attempted or its output parsed.
    pub repaired_parse_offset: Option<usize>,

    /// Whether the fallback found its anchor chain. Only meaningful when
    /// `stage` is `Fallback` or `Unavailable`.
    pub anchor_found: bool,
}

impl ExtractDiagnostics {
    /// Quick check: did the response yield real content, even if repaired
    /// or salvaged? `false` means the document is placeholder-only.
    pub fn usable(&self) -> bool {
        self.stage != ExtractStage::Unavailable
    }

    /// Quick check: did the document parse without any intervention?
    pub fn intact(&self) -> bool {
        self.stage == ExtractStage::Direct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_intact() {
        let d = ExtractDiagnostics::default();
        assert!(d.intact());
        assert!(d.usable());
        assert!(!d.fenced);
        assert!(!d.truncated);
        assert!(d.parse_offset.is_none());
    }

    #[test]
    fn test_fallback_stage_is_usable_but_not_intact() {
        let d = ExtractDiagnostics {
            stage: ExtractStage::Fallback,
            anchor_found: true,
            ..Default::default()
        };
        assert!(d.usable());
        assert!(!d.intact());
    }

    #[test]
    fn test_unavailable_stage_is_not_usable() {
        let d = ExtractDiagnostics {
            stage: ExtractStage::Unavailable,
            ..Default::default()
        };
        assert!(!d.usable());
    }

    #[test]
    fn test_stage_identifiers() {
        assert_eq!(ExtractStage::Direct.as_str(), "direct");
        assert_eq!(ExtractStage::Repaired.as_str(), "repaired");
        assert_eq!(ExtractStage::Fallback.as_str(), "fallback");
        assert_eq!(ExtractStage::Unavailable.as_str(), "unavailable");
    }
}
