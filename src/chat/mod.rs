//! Chat panel core for the learning assistant.
//!
//! A panel owns a conversation log and runs at most one request/response
//! cycle at a time against the conversational backend. Raw payloads are
//! interpreted into display text plus optional result panels (web pages,
//! videos, code repositories).
//!
//! ## Layout
//! - [`types`]: domain records (modes, users, entries, result records).
//! - [`normalize`]: tolerant mapping of loose result objects into records.
//! - [`interpret`]: mode-aware reading of backend payloads.
//! - [`store`]: append-only conversation log.
//! - [`session`]: the Idle/Pending state machine as a reducer.
//! - [`backend`]: the backend seam and its HTTP implementation.
//! - [`controller`]: drives one panel end to end.

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod ids;
pub mod interpret;
pub mod normalize;
pub mod session;
pub mod store;
pub mod types;

pub use backend::{ChatBackend, HttpChatBackend};
pub use config::ChatConfig;
pub use controller::{SubmissionController, SubmitOutcome};
pub use error::{ChatError, ChatResult};
pub use ids::SessionId;
pub use interpret::{Interpretation, interpret};
pub use session::{IgnoredReason, PendingRequest, SessionSnapshot, SessionState};
pub use types::{
    ChatRequest, ConversationEntry, Mode, RepoResult, ResultBundle, User, VideoResult, WebResult,
};
