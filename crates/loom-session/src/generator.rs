//! Generation back-end contract
//!
//! A [`Generator`] turns a prompt into continuations. Provider-specific
//! request shaping lives behind the trait.

use crate::error::GenerationError;
use async_trait::async_trait;
use loom_core::NodeId;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::time::Duration;

/// One request to a back-end
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Node whose text is being continued
    pub parent: NodeId,
    /// Rendered text of `parent`
    pub prompt: String,
    /// Opaque sampler settings passed through to the back-end
    pub settings: Option<serde_json::Value>,
}

/// One continuation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Text appended to the prompt
    pub text: String,
    pub model: Option<String>,
    pub finish_reason: Option<String>,
}

impl Generation {
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
            finish_reason: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = Some(reason.into());
        self
    }
}

/// Text generation back-end
#[async_trait]
pub trait Generator: Send + Sync + Debug {
    /// Produce continuations of `request.prompt`
    ///
    /// # Errors
    /// Returns [`GenerationError`] when the back-end fails
    async fn generate(&self, request: GenerationRequest)
        -> Result<Vec<Generation>, GenerationError>;
}

/// Stand-in for sessions without a configured back-end
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackend;

#[async_trait]
impl Generator for NoBackend {
    async fn generate(
        &self,
        _request: GenerationRequest,
    ) -> Result<Vec<Generation>, GenerationError> {
        Err(GenerationError::Backend(
            "no generation backend configured".to_string(),
        ))
    }
}

/// Scripted reply with an optional delay
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    pub delay: Duration,
    pub result: Result<Vec<Generation>, GenerationError>,
}

/// Generator replaying queued replies in order
///
/// Once the script is exhausted every request echoes a fixed suffix.
#[derive(Debug)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<ScriptedReply>>,
    fallback: String,
    model: String,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: " ...".to_string(),
            model: "scripted".to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }

    /// Queue a successful single continuation
    #[must_use]
    pub fn then_text(self, text: impl Into<String>, delay: Duration) -> Self {
        let generation = Generation::new(text).with_model(self.model.clone());
        self.then(ScriptedReply {
            delay,
            result: Ok(vec![generation]),
        })
    }

    /// Queue a failure
    #[must_use]
    pub fn then_error(self, error: GenerationError, delay: Duration) -> Self {
        self.then(ScriptedReply {
            delay,
            result: Err(error),
        })
    }

    #[must_use]
    pub fn then(self, reply: ScriptedReply) -> Self {
        self.script.lock().push_back(reply);
        self
    }

    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<Vec<Generation>, GenerationError> {
        self.requests.lock().push(request);
        let reply = self.script.lock().pop_front();
        match reply {
            Some(reply) => {
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                reply.result
            }
            None => Ok(vec![
                Generation::new(self.fallback.clone()).with_model(self.model.clone())
            ]),
        }
    }
}
