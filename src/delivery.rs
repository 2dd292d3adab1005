//! Delivery: email assembly, the mailer port, and the plain-text renderer.
//!
//! A [`Lesson`] leaves the crate as an [`OutboundEmail`] through the
//! [`Mailer`] trait. The trait is the seam for real transports (SMTP,
//! provider APIs); [`MemoryMailer`] records messages for tests and dry
//! runs. [`render_text`] turns the section tree into a markdown-flavored
//! body; callers with their own templates pass any `Fn(&Lesson) -> String`
//! to [`send_lesson`] instead.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::events::{emit, Event, EventHandler};
use crate::generate::Lesson;
use crate::section::{Section, SectionContent};

/// A fully assembled email, ready for a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEmail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Rendered body text.
    pub body: String,
}

/// Transport port for sending email.
///
/// Implementors wrap SMTP or a provider API and map transport failures to
/// [`LessonError::Delivery`](crate::LessonError::Delivery).
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn Mailer>`.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Hand one message to the transport.
    async fn send(&self, email: &OutboundEmail) -> Result<()>;

    /// Human-readable name for events and diagnostics.
    fn name(&self) -> &'static str;
}

/// A mailer that records messages instead of sending them.
///
/// # Example
///
/// ```
/// use lessonmail::delivery::{MemoryMailer, OutboundEmail};
///
/// let mailer = MemoryMailer::new();
/// assert!(mailer.sent().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl MemoryMailer {
    /// Create an empty recording mailer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far, in send order.
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Assemble a lesson into an email and hand it to the mailer.
///
/// The body comes from `render`; [`render_text`] is the built-in renderer.
/// Emits [`Event::DeliveryEnd`] with the outcome either way, and returns
/// the assembled email on success so callers can archive it.
pub async fn send_lesson(
    mailer: &Arc<dyn Mailer>,
    to: &str,
    lesson: &Lesson,
    render: impl Fn(&Lesson) -> String,
    events: &Option<Arc<dyn EventHandler>>,
) -> Result<OutboundEmail> {
    let email = OutboundEmail {
        to: to.to_string(),
        subject: lesson.subject.clone(),
        body: render(lesson),
    };

    let outcome = mailer.send(&email).await;
    emit(
        events,
        Event::DeliveryEnd {
            to: email.to.clone(),
            subject: email.subject.clone(),
            ok: outcome.is_ok(),
        },
    );
    outcome.map(|()| email)
}

/// Render a lesson as a markdown-flavored plain-text email body.
///
/// The subject becomes the top heading, each section a subheading; item
/// lists become bullet lists and nested sections step one heading level
/// down. Placeholder sections render like any other, so a degraded lesson
/// still produces a readable message.
pub fn render_text(lesson: &Lesson) -> String {
    let mut out = format!("# {}\n\n", lesson.subject);
    for section in &lesson.sections {
        render_section(&mut out, section, 2);
    }
    let mut body = out.trim_end().to_string();
    body.push('\n');
    body
}

fn render_section(out: &mut String, section: &Section, level: usize) {
    if let Some(ref title) = section.title {
        out.push_str(&"#".repeat(level.min(6)));
        out.push(' ');
        out.push_str(title);
        out.push_str("\n\n");
    }
    match &section.content {
        SectionContent::Text(text) => {
            out.push_str(text);
            out.push_str("\n\n");
        }
        SectionContent::Items(items) => {
            for item in items {
                out.push_str("- ");
                out.push_str(item);
                out.push('\n');
            }
            out.push('\n');
        }
        SectionContent::Sections(subs) => {
            for sub in subs {
                render_section(out, sub, level + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ExtractDiagnostics;
    use crate::events::FnEventHandler;
    use crate::mode::ContentMode;
    use crate::section::project;
    use crate::LessonError;
    use serde_json::json;

    fn sample_lesson() -> Lesson {
        let doc = json!({
            "concept": {"definition": "A trait is a shared interface."},
            "key_points": ["behavior, not data", "impl opts in"],
            "summary": "Traits are interfaces."
        });
        Lesson {
            topic: "traits".into(),
            mode: ContentMode::Overview,
            subject: ContentMode::Overview.subject("traits"),
            sections: project(&doc, ContentMode::Overview.shape()),
            diagnostics: ExtractDiagnostics::default(),
            raw_response: doc.to_string(),
        }
    }

    #[test]
    fn test_render_text_full_lesson() {
        let body = render_text(&sample_lesson());
        assert_eq!(
            body,
            "# Quick lesson: traits\n\n\
             ## Concept\n\n\
             ### Definition\n\n\
             A trait is a shared interface.\n\n\
             ## Key points\n\n\
             - behavior, not data\n\
             - impl opts in\n\n\
             ## Summary\n\n\
             Traits are interfaces.\n"
        );
    }

    #[test]
    fn test_render_text_placeholder_lesson() {
        let mut lesson = sample_lesson();
        lesson.sections = project(&json!({}), ContentMode::Overview.shape());

        let body = render_text(&lesson);
        assert!(body.contains("## Concept\n\nNot available"));
        assert!(body.contains("## Summary\n\nNot available"));
    }

    #[tokio::test]
    async fn test_memory_mailer_records() {
        let memory = Arc::new(MemoryMailer::new());
        let mailer: Arc<dyn Mailer> = memory.clone();
        let lesson = sample_lesson();

        let email = send_lesson(&mailer, "learner@example.com", &lesson, render_text, &None)
            .await
            .unwrap();

        assert_eq!(email.to, "learner@example.com");
        assert_eq!(email.subject, "Quick lesson: traits");
        assert!(email.body.starts_with("# Quick lesson: traits"));
        assert_eq!(memory.sent(), vec![email]);
    }

    #[tokio::test]
    async fn test_failed_send_reports_and_propagates() {
        struct RejectingMailer;

        #[async_trait]
        impl Mailer for RejectingMailer {
            async fn send(&self, _email: &OutboundEmail) -> Result<()> {
                Err(LessonError::Delivery("relay refused the message".into()))
            }

            fn name(&self) -> &'static str {
                "rejecting"
            }
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let events: Option<Arc<dyn EventHandler>> =
            Some(Arc::new(FnEventHandler(move |event: Event| {
                if let Event::DeliveryEnd { to, ok, .. } = event {
                    sink.lock().unwrap().push(format!("{to} ok={ok}"));
                }
            })));

        let mailer: Arc<dyn Mailer> = Arc::new(RejectingMailer);
        let result = send_lesson(
            &mailer,
            "learner@example.com",
            &sample_lesson(),
            render_text,
            &events,
        )
        .await;

        assert!(matches!(result, Err(LessonError::Delivery(_))));
        assert_eq!(*log.lock().unwrap(), vec!["learner@example.com ok=false"]);
    }

    #[test]
    fn test_mailer_names() {
        assert_eq!(MemoryMailer::new().name(), "memory");
    }
}
