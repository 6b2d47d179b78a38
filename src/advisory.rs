//! Boundary with the hosted language model: transcript types, the service
//! contract, and the classification every advisory failure is reduced to.

use crate::narrative::NarrativeRequestBuilder;
use crate::schema::StatementAnalysis;
use log::warn;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

pub const ASSISTANT_GREETING: &str = "Hello! I'm your financial analysis assistant. Upload a \
two-period statement to get started, or ask me anything in the chat below.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    /// Opening assistant turn for a fresh transcript.
    pub fn greeting() -> Self {
        Self::assistant(ASSISTANT_GREETING)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvisoryErrorKind {
    MissingCredential,
    Authentication,
    RateLimited,
    Transport,
    Unknown,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdvisoryError {
    #[error("No API key configured for the advisory model")]
    MissingCredential,

    #[error("API key rejected: {0}")]
    Authentication(String),

    #[error("Rate limit or quota exceeded: {0}")]
    RateLimited(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected advisory error: {0}")]
    Unknown(String),
}

impl AdvisoryError {
    pub fn kind(&self) -> AdvisoryErrorKind {
        match self {
            AdvisoryError::MissingCredential => AdvisoryErrorKind::MissingCredential,
            AdvisoryError::Authentication(_) => AdvisoryErrorKind::Authentication,
            AdvisoryError::RateLimited(_) => AdvisoryErrorKind::RateLimited,
            AdvisoryError::Transport(_) => AdvisoryErrorKind::Transport,
            AdvisoryError::Unknown(_) => AdvisoryErrorKind::Unknown,
        }
    }

    /// Rate limits and transport failures may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdvisoryError::RateLimited(_) | AdvisoryError::Transport(_)
        )
    }

    /// Message for the end user, one per class.
    pub fn user_message(&self) -> String {
        match self {
            AdvisoryError::MissingCredential => {
                "Error: no API key found. Set GEMINI_API_KEY and try again.".to_string()
            }
            AdvisoryError::Authentication(detail) => format!(
                "Error: the API key was rejected. Please check the key. Details: {}",
                detail
            ),
            AdvisoryError::RateLimited(detail) => format!(
                "Error: usage limit reached. Please wait and retry later. Details: {}",
                detail
            ),
            AdvisoryError::Transport(detail) => format!(
                "Error: could not reach the advisory service. Details: {}",
                detail
            ),
            AdvisoryError::Unknown(detail) => {
                format!("An unknown error occurred. Details: {}", detail)
            }
        }
    }
}

/// Maps an HTTP failure from the hosted model to an error class.
pub fn classify_status(status: u16, body: &str) -> AdvisoryError {
    let detail = format!("status {}: {}", status, body.trim());

    if status == 429 || body.contains("RESOURCE_EXHAUSTED") {
        AdvisoryError::RateLimited(detail)
    } else if status == 401
        || status == 403
        || body.contains("API_KEY_INVALID")
        || body.contains("PERMISSION_DENIED")
    {
        AdvisoryError::Authentication(detail)
    } else if status == 408 || (500..600).contains(&status) {
        AdvisoryError::Transport(detail)
    } else {
        AdvisoryError::Unknown(detail)
    }
}

/// Text in, text out. Implemented by the hosted-model client and by test doubles.
pub trait AdvisoryService {
    /// One-shot assessment of a prepared narrative payload.
    fn assess(
        &self,
        payload: &str,
    ) -> impl Future<Output = Result<String, AdvisoryError>> + Send;

    /// Continues a conversation. The transcript is forwarded as given.
    fn chat(
        &self,
        transcript: &[ChatMessage],
    ) -> impl Future<Output = Result<String, AdvisoryError>> + Send;
}

/// Collapses an advisory outcome into text the host can always display.
pub fn display_outcome(outcome: Result<String, AdvisoryError>) -> String {
    match outcome {
        Ok(text) => text,
        Err(e) => {
            warn!("Advisory call failed ({:?}): {}", e.kind(), e);
            e.user_message()
        }
    }
}

pub async fn request_assessment<S: AdvisoryService>(
    service: &S,
    analysis: &StatementAnalysis,
) -> String {
    let payload = NarrativeRequestBuilder::new(analysis).build();
    display_outcome(service.assess(&payload).await)
}

/// Appends the user prompt and the reply (or its error message) to `transcript`
/// and returns the reply text.
pub async fn exchange<S: AdvisoryService>(
    service: &S,
    transcript: &mut Vec<ChatMessage>,
    prompt: &str,
) -> String {
    transcript.push(ChatMessage::user(prompt));
    let reply = display_outcome(service.chat(transcript.as_slice()).await);
    transcript.push(ChatMessage::assistant(reply.clone()));
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Row, StatementTable};
    use crate::RatioEngine;
    use std::sync::Mutex;

    struct ScriptedService {
        reply: Result<String, AdvisoryError>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedService {
        fn new(reply: Result<String, AdvisoryError>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl AdvisoryService for ScriptedService {
        async fn assess(&self, payload: &str) -> Result<String, AdvisoryError> {
            self.seen.lock().unwrap().push(payload.to_string());
            self.reply.clone()
        }

        async fn chat(&self, transcript: &[ChatMessage]) -> Result<String, AdvisoryError> {
            self.seen
                .lock()
                .unwrap()
                .push(format!("{} turns", transcript.len()));
            self.reply.clone()
        }
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(
            classify_status(429, "quota").kind(),
            AdvisoryErrorKind::RateLimited
        );
        assert_eq!(
            classify_status(400, r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#).kind(),
            AdvisoryErrorKind::RateLimited
        );
        assert_eq!(
            classify_status(400, r#"{"error":{"details":[{"reason":"API_KEY_INVALID"}]}}"#).kind(),
            AdvisoryErrorKind::Authentication
        );
        assert_eq!(
            classify_status(403, "").kind(),
            AdvisoryErrorKind::Authentication
        );
        assert_eq!(classify_status(503, "").kind(), AdvisoryErrorKind::Transport);
        assert_eq!(classify_status(404, "").kind(), AdvisoryErrorKind::Unknown);
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let errors = [
            AdvisoryError::MissingCredential,
            AdvisoryError::Authentication("x".into()),
            AdvisoryError::RateLimited("x".into()),
            AdvisoryError::Transport("x".into()),
            AdvisoryError::Unknown("x".into()),
        ];
        let mut messages: Vec<String> = errors.iter().map(|e| e.user_message()).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), errors.len());
        assert!(errors[2].is_retryable());
        assert!(!errors[1].is_retryable());
    }

    #[test]
    fn test_chat_message_json_roles() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[tokio::test]
    async fn test_request_assessment_sends_payload() {
        let table = StatementTable::new(vec![Row::new("TOTAL ASSETS", 100.0, 120.0)]);
        let analysis = RatioEngine::default().analyze(&table);
        let service = ScriptedService::new(Ok("Looks healthy.".to_string()));

        let text = request_assessment(&service, &analysis).await;

        assert_eq!(text, "Looks healthy.");
        let seen = service.seen.lock().unwrap();
        assert!(seen[0].contains("TOTAL ASSETS"));
    }

    #[tokio::test]
    async fn test_exchange_records_error_as_reply() {
        let service = ScriptedService::new(Err(AdvisoryError::MissingCredential));
        let mut transcript = vec![ChatMessage::greeting()];

        let reply = exchange(&service, &mut transcript, "What is a current ratio?").await;

        assert_eq!(reply, AdvisoryError::MissingCredential.user_message());
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1], ChatMessage::user("What is a current ratio?"));
        assert_eq!(transcript[2].role, ChatRole::Assistant);
        assert_eq!(service.seen.lock().unwrap()[0], "2 turns");
    }
}
