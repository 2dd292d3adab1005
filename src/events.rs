//! Event system for generation and delivery lifecycle hooks.
//!
//! Provides an optional, non-intrusive way to observe the pipeline.
//! The generator emits events as each lesson is produced and the
//! extractor classifies the model's response. Users can implement
//! [`EventHandler`] to receive these events for logging, progress
//! tracking, or alerting on degraded content.

use std::sync::Arc;

use crate::diagnostics::ExtractStage;

/// Events emitted during lesson generation and delivery.
#[derive(Debug, Clone)]
pub enum Event {
    /// Lesson generation has started for a topic.
    GenerationStart {
        /// The topic being generated.
        topic: String,
        /// Stable mode identifier (e.g. `"overview"`, `"detailed"`).
        mode: &'static str,
    },
    /// The extractor finished classifying a model response.
    Extracted {
        /// The topic whose response was processed.
        topic: String,
        /// Which stage of the pipeline produced the document.
        stage: ExtractStage,
    },
    /// No recognizable content could be salvaged from the model response.
    ///
    /// The lesson still ships, with placeholder text in every section.
    /// This is the one extraction outcome an operator should look at.
    ContentUnavailable {
        /// The topic whose response was unusable.
        topic: String,
    },
    /// Lesson generation has finished.
    GenerationEnd {
        /// The topic that was generated.
        topic: String,
        /// Whether the model call and post-processing succeeded.
        ok: bool,
    },
    /// A transport-level retry due to HTTP error.
    TransportRetry {
        /// Operation description (usually the client name).
        name: String,
        /// The retry attempt number (1-indexed).
        attempt: u32,
        /// Delay before this retry attempt in milliseconds.
        delay_ms: u64,
        /// Reason for the retry (error description).
        reason: String,
    },
    /// An outbound email was handed to a mailer.
    DeliveryEnd {
        /// Recipient address.
        to: String,
        /// Subject line of the message.
        subject: String,
        /// Whether the mailer accepted the message.
        ok: bool,
    },
}

/// Handler for pipeline lifecycle events.
///
/// Implement this trait to receive generation progress, extraction
/// outcomes, and delivery signals.
///
/// This is entirely optional -- the pipeline works without an event handler.
///
/// # Example
///
/// ```
/// use lessonmail::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         match event {
///             Event::GenerationStart { topic, .. } => println!("[start] {}", topic),
///             Event::ContentUnavailable { topic } => {
///                 eprintln!("warning: no content salvaged for {}", topic)
///             }
///             Event::GenerationEnd { topic, ok } => println!("[end] {} ok={}", topic, ok),
///             _ => {} // Extracted, TransportRetry, DeliveryEnd
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Called when the pipeline emits an event.
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// # Example
///
/// ```
/// use lessonmail::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     if let Event::ContentUnavailable { topic } = event {
///         eprintln!("warning: no content salvaged for {}", topic);
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
