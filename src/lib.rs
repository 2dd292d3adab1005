//! # lessonmail
//!
//! Topic-to-inbox lessons: prompt a model for a structured lesson, survive
//! whatever it actually returns, and deliver the result as email.
//!
//! The crate is built around one hard guarantee: once a model response is
//! in hand, everything downstream is total. Extraction never fails, and a
//! lesson always ships — worst case with placeholder sections and
//! diagnostics saying so.
//!
//! ## Core Concepts
//!
//! - **[`Generator`]** — renders the prompt for a topic, calls the model
//!   with transport retry, and turns the response into a [`Lesson`].
//! - **[`extract_document`]** — the resilient core: preprocess, locate,
//!   validate, repair, fall back. Total over arbitrary input.
//! - **[`project`]** — maps any extracted document through a
//!   [`ContentMode`]'s shape into renderer-ready [`Section`]s, with
//!   placeholders for whatever is missing.
//! - **[`Mailer`]** — the delivery port. [`MemoryMailer`] records instead
//!   of sending; [`send_lesson`] assembles and dispatches the email.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lessonmail::{ContentMode, Generator, LessonRequest, Mailer, MemoryMailer};
//! use lessonmail::{render_text, send_lesson};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let generator = Generator::builder("https://api.openai.com")
//!         .openai_with_key(std::env::var("OPENAI_API_KEY")?)
//!         .build();
//!
//!     let request = LessonRequest::new("B-tree indexes")
//!         .with_mode(ContentMode::Detailed);
//!     let lesson = generator.generate(&request).await?;
//!
//!     if !lesson.usable() {
//!         eprintln!("warning: placeholder-only lesson for {}", lesson.topic);
//!     }
//!
//!     let mailer: Arc<dyn Mailer> = Arc::new(MemoryMailer::new());
//!     send_lesson(&mailer, "you@example.com", &lesson, render_text, &None).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Why extraction is a staircase
//!
//! Models are asked for a bare JSON document and routinely return it fenced
//! in markdown, wrapped in prose, HTML-escaped, or cut off at the token
//! limit. [`extract_document`] walks down a fixed staircase — parse as-is,
//! structurally repair, salvage by anchor, placeholder — and reports on the
//! attached [`ExtractDiagnostics`] which step produced the document. Callers
//! that care can listen for
//! [`Event::ContentUnavailable`](events::Event::ContentUnavailable); callers
//! that don't still get a well-formed lesson.

pub mod delivery;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod extract;
pub mod generate;
pub mod mode;
pub mod model;
pub mod prompt;
pub mod section;

pub use delivery::{render_text, send_lesson, Mailer, MemoryMailer, OutboundEmail};
pub use diagnostics::{ExtractDiagnostics, ExtractStage};
pub use error::{LessonError, Result};
pub use events::{Event, EventHandler, FnEventHandler};
pub use extract::{extract_document, Extraction};
pub use generate::{Generator, GeneratorBuilder, Lesson, LessonRequest};
pub use mode::ContentMode;
pub use model::{BackoffConfig, MockModel, ModelClient, ModelConfig, OpenAiClient};
pub use prompt::PromptVars;
pub use section::{project, Section, SectionContent};
