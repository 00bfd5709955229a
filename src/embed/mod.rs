//! Public chat surface
//!
//! The page the widget's frame loads, and the machinery behind it:
//! [`page`] renders the surface for `GET /public/agent/{agentId}`,
//! [`session`] holds the in-memory per-session transcript, and [`relay`]
//! carries messages to the chat backend and folds failures into
//! user-visible error turns. Nothing in this module touches disk.

pub mod page;
pub mod relay;
pub mod session;

pub use relay::{perform_send, ChatBackend, ChatReply, ChatRequest, HttpChatBackend, RelayError, SendOutcome};
pub use session::{ChatTurn, EmbedSession, Role, SessionRegistry};
