//! Chat relay
//!
//! Carries messages from the public chat surface to the inference backend
//! (`POST {backendBaseUrl}/api/chat/public`) and folds every failure mode
//! into an agent-role error turn. Transport problems never surface to the
//! frame as an error status — the surface degrades to an error message in
//! the transcript.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::session::{prepare_message, ChatTurn, SessionRegistry};

/// Path of the chat endpoint on the backend.
pub const BACKEND_CHAT_PATH: &str = "/api/chat/public";

/// Default backend request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transcript text for a transport-level failure (no backend-reported
/// error text to show). The page script uses the same text for a failed
/// fetch.
pub const NETWORK_ERROR_TEXT: &str = "The chat service could not be reached. Please try again.";

/// Outgoing message to the chat backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub agent_id: String,
    pub message: String,
    pub session_id: String,
}

/// Successful backend response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
}

/// Error body the backend sends on non-2xx statuses.
#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    error: Option<String>,
}

/// Relay failure, distinguishing backend-reported error text from
/// transport-level failure.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("chat backend returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("chat backend unreachable: {0}")]
    Network(String),
}

impl RelayError {
    /// The agent-role turn text rendered into the transcript for this
    /// failure.
    pub fn turn_text(&self) -> String {
        match self {
            RelayError::Server { message, .. } => message.clone(),
            RelayError::Network(_) => NETWORK_ERROR_TEXT.to_string(),
        }
    }
}

/// The backend the relay talks to. Abstracted so tests can substitute a
/// scripted backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, RelayError>;
}

/// reqwest-backed [`ChatBackend`] for the real inference service.
pub struct HttpChatBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpChatBackend {
    /// Build a backend client for `base_url` with the given request
    /// timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpChatBackend {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), BACKEND_CHAT_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, RelayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| RelayError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<ChatReply>()
                .await
                .map_err(|e| RelayError::Network(format!("invalid backend response: {}", e)))
        } else {
            let message = response
                .json::<BackendErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| format!("Chat backend error ({})", status.as_u16()));
            Err(RelayError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Outcome of a send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message was blank after trimming: no turns appended, no backend
    /// request issued.
    Ignored,
    /// The send ran; the appended agent turn (reply or synthesized error).
    Replied(ChatTurn),
}

/// Run one send through a session: append the user turn, relay to the
/// backend, append the reply or a synthesized error turn, and clear the
/// in-flight flag. The registry lock is never held across the backend
/// call.
pub async fn perform_send(
    registry: &SessionRegistry,
    backend: &dyn ChatBackend,
    agent_id: &str,
    session_id: &str,
    raw_message: &str,
) -> SendOutcome {
    let Some(message) = prepare_message(raw_message) else {
        return SendOutcome::Ignored;
    };

    registry.with_session(session_id, |session| {
        session.push_user(message.as_str());
        session.set_in_flight(true);
    });

    let request = ChatRequest {
        agent_id: agent_id.to_string(),
        message,
        session_id: session_id.to_string(),
    };
    let result = backend.send(&request).await;

    let turn = registry.with_session(session_id, |session| {
        session.set_in_flight(false);
        match &result {
            Ok(reply) => {
                debug!(target: "embed", session = %session_id, "backend replied");
                session.push_agent(reply.message.as_str())
            }
            Err(err) => {
                warn!(target: "embed", session = %session_id, error = %err, "relay failed");
                session.push_agent(err.turn_text())
            }
        }
    });

    SendOutcome::Replied(turn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::session::Role;
    use parking_lot::Mutex;

    /// Scripted backend: returns canned results and counts calls.
    struct ScriptedBackend {
        calls: Mutex<usize>,
        result: fn() -> Result<ChatReply, RelayError>,
    }

    impl ScriptedBackend {
        fn new(result: fn() -> Result<ChatReply, RelayError>) -> Self {
            ScriptedBackend {
                calls: Mutex::new(0),
                result,
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send(&self, _request: &ChatRequest) -> Result<ChatReply, RelayError> {
            *self.calls.lock() += 1;
            (self.result)()
        }
    }

    #[tokio::test]
    async fn test_successful_send_appends_user_and_agent_turns() {
        let registry = SessionRegistry::new();
        let backend = ScriptedBackend::new(|| {
            Ok(ChatReply {
                message: "Hello there".to_string(),
            })
        });

        let outcome = perform_send(&registry, &backend, "agent-1", "s1", "  Hi  ").await;

        let turns = registry.transcript("s1").unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "Hi");
        assert_eq!(turns[1].role, Role::Agent);
        assert_eq!(turns[1].content, "Hello there");
        assert_eq!(
            outcome,
            SendOutcome::Replied(ChatTurn {
                role: Role::Agent,
                content: "Hello there".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_blank_message_is_ignored_without_backend_call() {
        let registry = SessionRegistry::new();
        let backend = ScriptedBackend::new(|| {
            Ok(ChatReply {
                message: "unreachable".to_string(),
            })
        });

        let outcome = perform_send(&registry, &backend, "agent-1", "s1", "   \n ").await;

        assert_eq!(outcome, SendOutcome::Ignored);
        assert_eq!(backend.calls(), 0);
        assert!(registry.transcript("s1").is_none());
    }

    #[tokio::test]
    async fn test_server_error_appends_one_error_turn_and_clears_in_flight() {
        let registry = SessionRegistry::new();
        let backend = ScriptedBackend::new(|| {
            Err(RelayError::Server {
                status: 500,
                message: "Agent is unavailable".to_string(),
            })
        });

        perform_send(&registry, &backend, "agent-1", "s1", "Hi").await;

        let turns = registry.transcript("s1").unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, Role::Agent);
        assert_eq!(turns[1].content, "Agent is unavailable");
        registry.with_session("s1", |session| {
            assert!(!session.is_in_flight());
        });
    }

    #[tokio::test]
    async fn test_network_error_appends_generic_error_turn() {
        let registry = SessionRegistry::new();
        let backend =
            ScriptedBackend::new(|| Err(RelayError::Network("connection refused".to_string())));

        perform_send(&registry, &backend, "agent-1", "s1", "Hi").await;

        let turns = registry.transcript("s1").unwrap();
        assert_eq!(turns[1].content, NETWORK_ERROR_TEXT);
        // Transport detail stays in the logs, not the transcript.
        assert!(!turns[1].content.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_stale_replies_append_in_arrival_order() {
        let registry = SessionRegistry::new();
        let ok = ScriptedBackend::new(|| {
            Ok(ChatReply {
                message: "reply".to_string(),
            })
        });

        perform_send(&registry, &ok, "agent-1", "s1", "one").await;
        perform_send(&registry, &ok, "agent-1", "s1", "two").await;

        let contents: Vec<String> = registry
            .transcript("s1")
            .unwrap()
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(contents, vec!["one", "reply", "two", "reply"]);
    }

    #[test]
    fn test_relay_error_turn_text() {
        let server = RelayError::Server {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert_eq!(server.turn_text(), "overloaded");

        let network = RelayError::Network("dns".to_string());
        assert_eq!(network.turn_text(), NETWORK_ERROR_TEXT);
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let request = ChatRequest {
            agent_id: "a1".to_string(),
            message: "hi".to_string(),
            session_id: "s1".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["agentId"], "a1");
        assert_eq!(json["message"], "hi");
        assert_eq!(json["sessionId"], "s1");
    }

    #[test]
    fn test_http_backend_endpoint() {
        let backend =
            HttpChatBackend::new("https://api.example.com/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(backend.endpoint(), "https://api.example.com/api/chat/public");
    }
}
