//! Tutor service
//!
//! Answers learner questions about the catalog algorithms. When an LLM
//! provider is configured the service proxies to it with the session history
//! as context; on any provider error (logged, never surfaced) or when no
//! provider exists, the rule-based fallback answers instead. A tutor request
//! therefore never fails because the LLM did.

use crate::catalog::AlgorithmKind;
use crate::llm::provider::{CompletionRequest, LlmError, LlmProvider, Message, MessageRole};
use crate::observability::metrics::metrics;
use crate::session::{SessionError, SessionStore};
use crate::tutor::fallback;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Messages of prior history included in each LLM request
const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Fixed system prompt; algorithm context is appended per request
const SYSTEM_PROMPT: &str = "You are a patient algorithms tutor embedded in a step-by-step \
    visualizer. Explain concepts in plain language, refer to the animation steps the learner \
    can see, and keep answers short enough to read between frames.";

/// Errors a tutor request can fail with before any LLM is involved
#[derive(Debug, Error)]
pub enum TutorError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("question must not be empty")]
    EmptyQuestion,
}

/// Where a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Llm,
    Fallback,
}

/// Reply returned by chat and explain
#[derive(Debug, Clone, Serialize)]
pub struct TutorReply {
    pub reply: String,
    pub source: ReplySource,
    /// Model that produced the reply; None for fallback replies
    pub model: Option<String>,
    /// Messages now held in the session (0 for sessionless requests)
    pub session_len: usize,
}

/// Generation settings for tutor completions
#[derive(Debug, Clone)]
pub struct TutorSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub history_window: usize,
}

impl Default for TutorSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: None,
            max_tokens: Some(600),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

/// Chat and explanation service over the algorithm catalog
pub struct TutorService {
    /// LLM provider; None runs the service in fallback-only mode
    provider: Option<Arc<dyn LlmProvider>>,
    sessions: SessionStore,
    settings: TutorSettings,
}

impl TutorService {
    pub fn new(
        provider: Option<Arc<dyn LlmProvider>>,
        sessions: SessionStore,
        settings: TutorSettings,
    ) -> Self {
        Self {
            provider,
            sessions,
            settings,
        }
    }

    /// Whether an LLM provider is configured
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Name of the configured provider, if any
    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref().map(|p| p.name())
    }

    /// Answer a question within a session
    ///
    /// The user message is recorded first, so the session history is intact
    /// even when the reply comes from the fallback.
    pub async fn chat(
        &self,
        session_id: &str,
        question: &str,
        algorithm: Option<AlgorithmKind>,
    ) -> Result<TutorReply, TutorError> {
        if question.trim().is_empty() {
            return Err(TutorError::EmptyQuestion);
        }
        metrics().tutor_request();

        self.sessions
            .append(session_id, MessageRole::User, question)?;

        let messages = self.conversation_messages(session_id, algorithm);
        let (reply, source, model) = match self.try_complete(messages).await {
            Some((text, model)) => {
                metrics().tutor_llm_reply();
                (text, ReplySource::Llm, Some(model))
            }
            None => {
                metrics().tutor_fallback_reply();
                (fallback::answer(question, algorithm), ReplySource::Fallback, None)
            }
        };

        let snapshot = self
            .sessions
            .append(session_id, MessageRole::Assistant, &reply)?;

        Ok(TutorReply {
            reply,
            source,
            model,
            session_len: snapshot.message_count,
        })
    }

    /// Sessionless one-shot explanation of an algorithm or one of its steps
    pub async fn explain(
        &self,
        algorithm: AlgorithmKind,
        step_message: Option<&str>,
    ) -> TutorReply {
        metrics().tutor_request();

        let question = match step_message {
            Some(step) => format!(
                "Explain this step of {}: {}",
                algorithm.info().name,
                step
            ),
            None => format!("Explain how {} works.", algorithm.info().name),
        };

        let messages = vec![
            Message::system(Self::system_prompt(Some(algorithm))),
            Message::user(question),
        ];

        match self.try_complete(messages).await {
            Some((text, model)) => {
                metrics().tutor_llm_reply();
                TutorReply {
                    reply: text,
                    source: ReplySource::Llm,
                    model: Some(model),
                    session_len: 0,
                }
            }
            None => {
                metrics().tutor_fallback_reply();
                TutorReply {
                    reply: fallback::explain(algorithm, step_message),
                    source: ReplySource::Fallback,
                    model: None,
                    session_len: 0,
                }
            }
        }
    }

    /// Provider health; fallback-only mode is always healthy
    pub async fn health(&self) -> Result<(), LlmError> {
        match self.provider.as_ref() {
            Some(provider) => provider.health_check().await,
            None => Ok(()),
        }
    }

    /// Build the message list for a session-backed completion
    fn conversation_messages(
        &self,
        session_id: &str,
        algorithm: Option<AlgorithmKind>,
    ) -> Vec<Message> {
        let mut messages = vec![Message::system(Self::system_prompt(algorithm))];
        messages.extend(
            self.sessions
                .recent_messages(session_id, self.settings.history_window),
        );
        messages
    }

    /// Compose the system prompt with optional algorithm context (pure function)
    fn system_prompt(algorithm: Option<AlgorithmKind>) -> String {
        let mut prompt = String::from(SYSTEM_PROMPT);
        if let Some(kind) = algorithm {
            let info = kind.info();
            prompt.push_str(&format!(
                "\n\nThe learner is currently looking at {}: {}",
                info.name, info.description
            ));
        }
        prompt
    }

    /// One completion attempt; None means the fallback should answer
    async fn try_complete(&self, messages: Vec<Message>) -> Option<(String, String)> {
        let provider = self.provider.as_ref()?;

        let mut request = CompletionRequest::new(self.settings.model.clone(), messages);
        request.temperature = self.settings.temperature;
        request.max_tokens = self.settings.max_tokens;

        debug!(
            provider = provider.name(),
            model = %request.model,
            messages = request.messages.len(),
            "Sending tutor completion request"
        );

        match provider.complete(request).await {
            Ok(response) => {
                let model = response.model.clone();
                match response.content {
                    Some(text) if !text.trim().is_empty() => Some((text, model)),
                    _ => {
                        warn!("LLM returned an empty completion, answering from fallback rules");
                        metrics().llm_failure();
                        None
                    }
                }
            }
            Err(e) => {
                warn!("LLM request failed, answering from fallback rules: {}", e);
                metrics().llm_failure();
                None
            }
        }
    }
}
