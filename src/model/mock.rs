//! Mock model for testing without a live LLM.
//!
//! [`MockModel`] returns pre-configured responses in order, so lesson
//! generation and extraction can be tested deterministically, including
//! against deliberately truncated or malformed replies.
//!
//! # Example
//!
//! ```
//! use lessonmail::model::MockModel;
//!
//! let mock = MockModel::fixed(r#"{"concept": {"definition": "A stack frame is..."}}"#);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::Client;

use super::{ModelClient, ModelRequest, ModelResponse};
use crate::error::Result;

/// A test model that returns canned responses in order.
///
/// Cycles back to the beginning when all responses have been consumed.
#[derive(Debug)]
pub struct MockModel {
    responses: Vec<String>,
    index: AtomicUsize,
}

impl MockModel {
    /// Create a mock with the given canned responses.
    ///
    /// Responses are returned in order. When exhausted, cycles from the
    /// beginning.
    pub fn new(responses: Vec<String>) -> Self {
        assert!(
            !responses.is_empty(),
            "MockModel requires at least one response"
        );
        Self {
            responses,
            index: AtomicUsize::new(0),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    fn next_response(&self) -> String {
        let idx = self.index.fetch_add(1, Ordering::Relaxed) % self.responses.len();
        self.responses[idx].clone()
    }
}

#[async_trait]
impl ModelClient for MockModel {
    async fn complete(
        &self,
        _client: &Client,
        _base_url: &str,
        _request: &ModelRequest,
    ) -> Result<ModelResponse> {
        let text = self.next_response();
        Ok(ModelResponse {
            text,
            status: 200,
            metadata: None,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
