//! Lesson generation: prompt assembly, model call, extraction, projection.
//!
//! [`Generator`] is constructed once and reused across topics. For each
//! [`LessonRequest`] it renders the mode's prompt, calls the model with
//! transport retry, runs the response through
//! [`extract_document`](crate::extract::extract_document), and projects the
//! result into renderer-ready sections. The model call can fail; everything
//! after it is total, so a reachable model always means a deliverable
//! [`Lesson`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::diagnostics::ExtractDiagnostics;
use crate::error::Result;
use crate::events::{emit, Event, EventHandler};
use crate::extract::extract_document;
use crate::mode::ContentMode;
use crate::model::{
    with_backoff, BackoffConfig, ModelClient, ModelConfig, ModelRequest, ModelResponse,
    OpenAiClient,
};
use crate::prompt::{numbered_list, render, section, PromptVars};
use crate::section::Section;
use crate::LessonError;

/// System prompt sent ahead of every lesson prompt.
pub const SYSTEM_PROMPT: &str = "You are an expert teacher writing short, self-contained \
lessons. You always answer with exactly the JSON document you are asked for.";

/// What to generate: a topic plus how to cover it.
///
/// Serializable so topic lists can live in config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRequest {
    /// The topic to teach.
    pub topic: String,

    /// How much ground to cover.
    #[serde(default)]
    pub mode: ContentMode,

    /// Who the lesson is for, appended to the prompt when set.
    #[serde(default)]
    pub audience: Option<String>,

    /// Specific points the lesson must touch, appended as a numbered list.
    #[serde(default)]
    pub focus: Vec<String>,
}

impl LessonRequest {
    /// Create an overview request for a topic.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            mode: ContentMode::default(),
            audience: None,
            focus: Vec::new(),
        }
    }

    /// Set the content mode.
    pub fn with_mode(mut self, mode: ContentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the audience description.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Set the points the lesson must cover.
    pub fn with_focus(mut self, focus: Vec<String>) -> Self {
        self.focus = focus;
        self
    }
}

/// A generated lesson, ready for rendering and delivery.
#[derive(Debug, Clone)]
pub struct Lesson {
    /// The topic that was taught.
    pub topic: String,

    /// The mode it was generated in.
    pub mode: ContentMode,

    /// Subject line for the delivery email.
    pub subject: String,

    /// Renderer-ready sections, one per shape entry of the mode.
    pub sections: Vec<Section>,

    /// What extraction saw and did with the model response.
    pub diagnostics: ExtractDiagnostics,

    /// The verbatim model response, for archiving and debugging.
    pub raw_response: String,
}

impl Lesson {
    /// Whether real content was extracted, even if repaired or salvaged.
    /// `false` means every section is a placeholder.
    pub fn usable(&self) -> bool {
        self.diagnostics.usable()
    }
}

/// Generates lessons by prompting a model and extracting its response.
///
/// # Example
///
/// ```no_run
/// use lessonmail::generate::{Generator, LessonRequest};
/// use lessonmail::mode::ContentMode;
///
/// # async fn run() -> lessonmail::Result<()> {
/// let generator = Generator::builder("https://api.openai.com")
///     .openai_with_key(std::env::var("OPENAI_API_KEY").unwrap_or_default())
///     .model_id("gpt-4o-mini")
///     .build();
///
/// let request = LessonRequest::new("the borrow checker")
///     .with_mode(ContentMode::Detailed)
///     .with_audience("working engineers new to Rust");
///
/// let lesson = generator.generate(&request).await?;
/// println!("{}: {} sections", lesson.subject, lesson.sections.len());
/// # Ok(())
/// # }
/// ```
pub struct Generator {
    client: Client,
    base_url: String,
    model: Arc<dyn ModelClient>,
    model_id: String,
    config: ModelConfig,
    backoff: BackoffConfig,
    system_prompt: Option<String>,
    template: Option<String>,
    vars: PromptVars,
    events: Option<Arc<dyn EventHandler>>,
}

impl Generator {
    /// Create a new builder targeting the given provider base URL.
    pub fn builder(base_url: impl Into<String>) -> GeneratorBuilder {
        GeneratorBuilder {
            client: None,
            base_url: base_url.into(),
            model: None,
            model_id: "gpt-4o-mini".to_string(),
            config: None,
            backoff: None,
            system_prompt: None,
            template: None,
            vars: PromptVars::new(),
            events: None,
            timeout: None,
        }
    }

    /// The normalized provider base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The model identifier sent with each request.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Generate one lesson.
    ///
    /// Fails only when the model cannot be reached (after retries) or the
    /// request is unusable. A degraded response still yields `Ok`; check
    /// [`Lesson::usable`] or listen for
    /// [`Event::ContentUnavailable`](crate::events::Event::ContentUnavailable)
    /// to notice.
    pub async fn generate(&self, request: &LessonRequest) -> Result<Lesson> {
        if request.topic.trim().is_empty() {
            return Err(LessonError::InvalidConfig("lesson topic is empty".into()));
        }

        emit(
            &self.events,
            Event::GenerationStart {
                topic: request.topic.clone(),
                mode: request.mode.as_str(),
            },
        );

        let model_request = ModelRequest {
            model: self.model_id.clone(),
            system_prompt: self.system_prompt.clone(),
            prompt: self.build_prompt(request),
            config: self.config.clone(),
        };

        let response = match self.call_model(&model_request).await {
            Ok(response) => response,
            Err(e) => {
                emit(
                    &self.events,
                    Event::GenerationEnd {
                        topic: request.topic.clone(),
                        ok: false,
                    },
                );
                return Err(e);
            }
        };

        let extraction = extract_document(&response.text);
        emit(
            &self.events,
            Event::Extracted {
                topic: request.topic.clone(),
                stage: extraction.diagnostics.stage,
            },
        );
        if !extraction.diagnostics.usable() {
            emit(
                &self.events,
                Event::ContentUnavailable {
                    topic: request.topic.clone(),
                },
            );
        }

        let sections = crate::section::project(&extraction.document, request.mode.shape());

        emit(
            &self.events,
            Event::GenerationEnd {
                topic: request.topic.clone(),
                ok: true,
            },
        );

        Ok(Lesson {
            topic: request.topic.clone(),
            mode: request.mode,
            subject: request.mode.subject(&request.topic),
            sections,
            diagnostics: extraction.diagnostics,
            raw_response: response.text,
        })
    }

    /// Render the prompt: mode template (or override), then the optional
    /// audience and focus sections.
    fn build_prompt(&self, request: &LessonRequest) -> String {
        let template = self
            .template
            .as_deref()
            .unwrap_or_else(|| request.mode.template());
        let mut prompt = render(template, &request.topic, &self.vars);

        if let Some(ref audience) = request.audience {
            prompt.push_str("\n\n");
            prompt.push_str(&section("Audience", audience));
        }
        if !request.focus.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&section(
                "Make sure to cover",
                &numbered_list(&request.focus),
            ));
        }

        prompt
    }

    /// Execute the model call, bridging transport retries into events.
    async fn call_model(&self, request: &ModelRequest) -> Result<ModelResponse> {
        let name = self.model.name();
        let events = self.events.clone();

        let mut on_retry = |attempt: u32, delay: Duration, reason: &str| {
            emit(
                &events,
                Event::TransportRetry {
                    name: name.to_string(),
                    attempt,
                    delay_ms: delay.as_millis() as u64,
                    reason: reason.to_string(),
                },
            );
        };

        with_backoff(
            &self.model,
            &self.client,
            &self.base_url,
            request,
            &self.backoff,
            Some(&mut on_retry),
        )
        .await
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("base_url", &self.base_url)
            .field("model", &self.model.name())
            .field("model_id", &self.model_id)
            .field("backoff", &self.backoff)
            .field("has_event_handler", &self.events.is_some())
            .finish()
    }
}

/// Builder for [`Generator`].
pub struct GeneratorBuilder {
    client: Option<Client>,
    base_url: String,
    model: Option<Arc<dyn ModelClient>>,
    model_id: String,
    config: Option<ModelConfig>,
    backoff: Option<BackoffConfig>,
    system_prompt: Option<String>,
    template: Option<String>,
    vars: PromptVars,
    events: Option<Arc<dyn EventHandler>>,
    timeout: Option<Duration>,
}

impl GeneratorBuilder {
    /// Set the HTTP client. If not set, a default client is created.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the model client. Default: [`OpenAiClient`] without authentication.
    pub fn model(mut self, model: Arc<dyn ModelClient>) -> Self {
        self.model = Some(model);
        self
    }

    /// Use the OpenAI-compatible client with API key authentication.
    pub fn openai_with_key(mut self, api_key: impl Into<String>) -> Self {
        self.model = Some(Arc::new(OpenAiClient::new().with_api_key(api_key)));
        self
    }

    /// Set the model identifier. Default: `"gpt-4o-mini"`.
    pub fn model_id(mut self, id: impl Into<String>) -> Self {
        self.model_id = id.into();
        self
    }

    /// Set the sampling configuration. Default: [`ModelConfig::default()`]
    /// with `json_mode` enabled.
    pub fn config(mut self, config: ModelConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the transport retry policy. Default: [`BackoffConfig::standard()`].
    pub fn backoff(mut self, config: BackoffConfig) -> Self {
        self.backoff = Some(config);
        self
    }

    /// Override the system prompt. Default: [`SYSTEM_PROMPT`]. An empty
    /// string disables the system message entirely.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Override the prompt template for every mode. The template may use
    /// `{topic}` and any `{key}` placeholder set via [`var`](Self::var).
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set all template variables at once.
    pub fn vars(mut self, vars: PromptVars) -> Self {
        self.vars = vars;
        self
    }

    /// Insert a single template variable.
    pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars = self.vars.insert(key, value);
        self
    }

    /// Set the event handler.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.events = Some(handler);
        self
    }

    /// Set the request timeout for the default HTTP client. Default: 60
    /// seconds. Ignored when a custom client is provided via
    /// [`client`](Self::client).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the generator.
    pub fn build(self) -> Generator {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(60));
        let client = self.client.unwrap_or_else(|| {
            Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client")
        });
        Generator {
            client,
            base_url: normalize_base_url(&self.base_url),
            model: self.model.unwrap_or_else(|| Arc::new(OpenAiClient::new())),
            model_id: self.model_id,
            config: self.config.unwrap_or_else(|| ModelConfig {
                json_mode: true,
                ..ModelConfig::default()
            }),
            backoff: self.backoff.unwrap_or_else(BackoffConfig::standard),
            system_prompt: self
                .system_prompt
                .or_else(|| Some(SYSTEM_PROMPT.to_string())),
            template: self.template,
            vars: self.vars,
            events: self.events,
        }
    }
}

/// Strip known provider path suffixes from a base URL.
/// Prevents double-pathing when the client appends its own path.
/// e.g. "https://api.openai.com/v1" -> "https://api.openai.com"
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    // Longest suffix first
    for suffix in &["/v1/chat/completions", "/v1/chat", "/v1"] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ExtractStage;
    use crate::events::FnEventHandler;
    use crate::model::MockModel;
    use crate::section::SectionContent;
    use std::sync::Mutex;

    const GOOD_OVERVIEW: &str = r#"{
        "concept": {
            "definition": "A closure is a function that captures its environment.",
            "explanation": "Captured variables travel with the closure."
        },
        "key_points": ["closures borrow by default", "move closures take ownership"],
        "summary": "Closures pair code with captured state."
    }"#;

    fn recording_handler() -> (Arc<dyn EventHandler>, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let handler: Arc<dyn EventHandler> = Arc::new(FnEventHandler(move |event: Event| {
            let line = match event {
                Event::GenerationStart { topic, mode } => format!("start {topic} {mode}"),
                Event::Extracted { stage, .. } => format!("extracted {}", stage.as_str()),
                Event::ContentUnavailable { topic } => format!("unavailable {topic}"),
                Event::GenerationEnd { ok, .. } => format!("end ok={ok}"),
                Event::TransportRetry { attempt, .. } => format!("retry {attempt}"),
                Event::DeliveryEnd { ok, .. } => format!("delivery ok={ok}"),
            };
            sink.lock().unwrap().push(line);
        }));
        (handler, log)
    }

    fn mock_generator(mock: MockModel) -> Generator {
        Generator::builder("http://localhost:11434")
            .model(Arc::new(mock))
            .backoff(BackoffConfig::none())
            .build()
    }

    #[tokio::test]
    async fn test_generate_happy_path() {
        let (handler, log) = recording_handler();
        let generator = Generator::builder("http://localhost:11434")
            .model(Arc::new(MockModel::fixed(GOOD_OVERVIEW)))
            .backoff(BackoffConfig::none())
            .event_handler(handler)
            .build();

        let request = LessonRequest::new("closures");
        let lesson = generator.generate(&request).await.unwrap();

        assert!(lesson.usable());
        assert!(lesson.diagnostics.intact());
        assert_eq!(lesson.subject, "Quick lesson: closures");
        assert_eq!(lesson.sections.len(), 3);
        assert_eq!(lesson.sections[0].title.as_deref(), Some("Concept"));
        assert_eq!(lesson.raw_response, GOOD_OVERVIEW);

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                "start closures overview",
                "extracted direct",
                "end ok=true"
            ]
        );
    }

    #[tokio::test]
    async fn test_generate_repairs_truncated_response() {
        let truncated = r#"{"concept": {"definition": "A closure captures variables."}, "key_points": ["closures borrow", "move closures own"#;
        let generator = mock_generator(MockModel::fixed(truncated));

        let lesson = generator
            .generate(&LessonRequest::new("closures"))
            .await
            .unwrap();

        assert!(lesson.usable());
        assert_eq!(lesson.diagnostics.stage, ExtractStage::Repaired);
        assert!(lesson.diagnostics.truncated);
        // The cut list keeps its complete items
        assert_eq!(
            lesson.sections[1].content,
            SectionContent::Items(vec!["closures borrow".to_string()])
        );
    }

    #[tokio::test]
    async fn test_generate_flags_unusable_content() {
        let (handler, log) = recording_handler();
        let generator = Generator::builder("http://localhost:11434")
            .model(Arc::new(MockModel::fixed("I cannot help with that.")))
            .backoff(BackoffConfig::none())
            .event_handler(handler)
            .build();

        let lesson = generator
            .generate(&LessonRequest::new("closures"))
            .await
            .unwrap();

        // The lesson ships anyway, placeholders throughout
        assert!(!lesson.usable());
        assert_eq!(lesson.diagnostics.stage, ExtractStage::Unavailable);
        assert_eq!(lesson.sections.len(), 3);

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                "start closures overview",
                "extracted unavailable",
                "unavailable closures",
                "end ok=true"
            ]
        );
    }

    #[tokio::test]
    async fn test_generate_propagates_transport_errors() {
        struct DownModel;

        #[async_trait::async_trait]
        impl ModelClient for DownModel {
            async fn complete(
                &self,
                _client: &Client,
                _base_url: &str,
                _request: &ModelRequest,
            ) -> Result<ModelResponse> {
                Err(LessonError::HttpError {
                    status: 400,
                    body: "bad request".into(),
                    retry_after: None,
                })
            }

            fn name(&self) -> &'static str {
                "down"
            }
        }

        let (handler, log) = recording_handler();
        let generator = Generator::builder("http://localhost:11434")
            .model(Arc::new(DownModel))
            .backoff(BackoffConfig::none())
            .event_handler(handler)
            .build();

        let result = generator.generate(&LessonRequest::new("closures")).await;
        assert!(matches!(
            result,
            Err(LessonError::HttpError { status: 400, .. })
        ));

        let log = log.lock().unwrap();
        assert_eq!(*log, vec!["start closures overview", "end ok=false"]);
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_topic() {
        let generator = mock_generator(MockModel::fixed("{}"));
        let result = generator.generate(&LessonRequest::new("   ")).await;
        assert!(matches!(result, Err(LessonError::InvalidConfig(_))));
    }

    #[test]
    fn test_prompt_includes_audience_and_focus() {
        let generator = mock_generator(MockModel::fixed("{}"));
        let request = LessonRequest::new("iterators")
            .with_audience("beginners")
            .with_focus(vec!["laziness".to_string(), "adapters".to_string()]);

        let prompt = generator.build_prompt(&request);
        assert!(prompt.contains("lesson about iterators"));
        assert!(prompt.contains("## Audience\nbeginners"));
        assert!(prompt.contains("## Make sure to cover\n1. laziness\n2. adapters"));
    }

    #[test]
    fn test_prompt_template_override_uses_vars() {
        let generator = Generator::builder("http://localhost:11434")
            .model(Arc::new(MockModel::fixed("{}")))
            .template("Explain {topic} in the style of {style}.")
            .var("style", "a field guide")
            .build();

        let prompt = generator.build_prompt(&LessonRequest::new("lifetimes"));
        assert_eq!(prompt, "Explain lifetimes in the style of a field guide.");
    }

    #[test]
    fn test_builder_defaults() {
        let generator = Generator::builder("https://api.openai.com/v1/").build();
        assert_eq!(generator.base_url(), "https://api.openai.com");
        assert_eq!(generator.model_id(), "gpt-4o-mini");
        assert!(generator.config.json_mode);
        assert_eq!(generator.backoff.max_retries, 3);
        assert_eq!(generator.system_prompt.as_deref(), Some(SYSTEM_PROMPT));
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://api.openai.com/v1"),
            "https://api.openai.com"
        );
        assert_eq!(
            normalize_base_url("https://api.openai.com/v1/chat/completions"),
            "https://api.openai.com"
        );
        assert_eq!(
            normalize_base_url("http://localhost:11434/"),
            "http://localhost:11434"
        );
        assert_eq!(
            normalize_base_url("http://localhost:11434"),
            "http://localhost:11434"
        );
    }
}
