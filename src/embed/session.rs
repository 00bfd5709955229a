//! Embed chat sessions
//!
//! In-memory transcript state for the public chat surface, keyed by the
//! client-generated session id. Sessions live for the life of the process
//! and are never written to disk.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Who produced a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One entry in a session transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// A single widget load's conversation.
///
/// Turns are appended in arrival order; a response landing after the user
/// has already sent another message is appended where it arrives, with no
/// reordering or de-duplication.
#[derive(Debug)]
pub struct EmbedSession {
    session_id: String,
    turns: Vec<ChatTurn>,
    in_flight: bool,
}

impl EmbedSession {
    pub fn new(session_id: impl Into<String>) -> Self {
        EmbedSession {
            session_id: session_id.into(),
            turns: Vec::new(),
            in_flight: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Whether a send is currently awaiting the backend.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn set_in_flight(&mut self, in_flight: bool) {
        self.in_flight = in_flight;
    }

    /// Append a user turn and return it.
    pub fn push_user(&mut self, content: impl Into<String>) -> ChatTurn {
        self.push(Role::User, content.into())
    }

    /// Append an agent turn (backend reply or synthesized error) and
    /// return it.
    pub fn push_agent(&mut self, content: impl Into<String>) -> ChatTurn {
        self.push(Role::Agent, content.into())
    }

    fn push(&mut self, role: Role, content: String) -> ChatTurn {
        let turn = ChatTurn { role, content };
        self.turns.push(turn.clone());
        turn
    }
}

/// Trim a raw outgoing message. `None` means "nothing to send": no turn is
/// appended and no backend request is issued for it.
pub fn prepare_message(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Process-wide session map. Entries are created on first use and dropped
/// with the process.
#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<HashMap<String, EmbedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry::default()
    }

    /// Run `f` against the session for `session_id`, creating it first if
    /// this is the id's first appearance. The registry lock is held for the
    /// duration of `f` — keep `f` short and never await inside it.
    pub fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut EmbedSession) -> R) -> R {
        let mut sessions = self.inner.write();
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| EmbedSession::new(session_id));
        f(session)
    }

    /// A copy of a session's transcript, if the session exists.
    pub fn transcript(&self, session_id: &str) -> Option<Vec<ChatTurn>> {
        self.inner
            .read()
            .get(session_id)
            .map(|s| s.turns().to_vec())
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
