//! Session state and the event reducer driving one chat panel.
//!
//! The reducer is synchronous and side-effect free: it mutates
//! [`SessionState`] and returns the effects the caller must perform
//! (currently only dispatching the backend request). This keeps the
//! Idle → Pending → Idle machine testable without any transport.
//!
//! Every dispatch carries a per-session sequence number and the response
//! must quote it back. A reset while Pending abandons the outstanding
//! request but stays Pending until its response arrives, so a panel never
//! has two backend calls in flight.

use serde::Serialize;
use serde_json::Value;

use crate::chat::interpret::interpret;
use crate::chat::store::ConversationStore;
use crate::chat::types::{ChatRequest, ConversationEntry, EntryKind, Mode, User};

/// A request handed to the backend and not yet answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    /// Dispatch number, unique within the session.
    pub seq: u64,
    /// Body sent to the backend.
    pub request: ChatRequest,
}

/// Everything one panel owns for its lifetime.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    entries: ConversationStore,
    in_flight: Option<PendingRequest>,
    abandoned: bool,
    next_seq: u64,
    draft_input: String,
}

impl SessionState {
    /// Create an idle, empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation log.
    #[must_use]
    pub const fn store(&self) -> &ConversationStore {
        &self.entries
    }

    /// Entries in append order.
    #[must_use]
    pub fn entries(&self) -> &[ConversationEntry] {
        self.entries.entries()
    }

    /// Whether a request is outstanding.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Request currently outstanding, if any.
    #[must_use]
    pub const fn in_flight(&self) -> Option<&PendingRequest> {
        self.in_flight.as_ref()
    }

    /// Current draft text.
    #[must_use]
    pub fn draft_input(&self) -> &str {
        &self.draft_input
    }

    /// Serializable copy for hosts.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            entries: self.entries.entries().to_vec(),
            pending_request: self.is_pending(),
            draft_input: self.draft_input.clone(),
        }
    }
}

/// Point-in-time view of a session.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Entries in append order.
    pub entries: Vec<ConversationEntry>,
    /// Whether a request is outstanding.
    pub pending_request: bool,
    /// Current draft text.
    pub draft_input: String,
}

/// Discrete events a panel reacts to.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// The draft text changed.
    InputChanged(String),
    /// The user submitted the current draft.
    Submit {
        /// Asking user.
        user: User,
        /// Mode active at submit time.
        mode: Mode,
    },
    /// The backend answered with a success status.
    ResponseOk {
        /// Dispatch number the response belongs to.
        seq: u64,
        /// Decoded response body.
        payload: Value,
    },
    /// The exchange failed (status, transport or body decoding).
    ResponseErr {
        /// Dispatch number the failure belongs to.
        seq: u64,
        /// Failure description, logged only.
        reason: String,
    },
    /// The panel was reset: log and draft are cleared, and an outstanding
    /// request is abandoned.
    Reset,
}

/// Work the caller must carry out after a reduction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEffect {
    /// Send exactly this request to the backend and report back with
    /// [`SessionEvent::ResponseOk`] or [`SessionEvent::ResponseErr`]
    /// quoting its `seq`.
    Dispatch(PendingRequest),
}

/// Why a submit or response produced no entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoredReason {
    /// Draft was empty after trimming.
    EmptyInput,
    /// Another request is still outstanding.
    Busy,
    /// The session was reset while the request was outstanding.
    Discarded,
}

/// Apply one event to the session.
pub fn reduce(state: &mut SessionState, event: SessionEvent) -> Vec<SessionEffect> {
    match event {
        SessionEvent::InputChanged(text) => {
            state.draft_input = text;
            Vec::new()
        }
        SessionEvent::Submit { user, mode } => match submit(state, &user, mode) {
            Ok(pending) => vec![SessionEffect::Dispatch(pending)],
            Err(reason) => {
                tracing::debug!(?reason, "submit ignored");
                Vec::new()
            }
        },
        SessionEvent::ResponseOk { seq, payload } => {
            if let Err(ignored) = resolve(state, seq, Ok(payload)) {
                tracing::debug!(seq, ?ignored, "response produced no entry");
            }
            Vec::new()
        }
        SessionEvent::ResponseErr { seq, reason } => {
            if let Err(ignored) = resolve(state, seq, Err(reason)) {
                tracing::debug!(seq, ?ignored, "response produced no entry");
            }
            Vec::new()
        }
        SessionEvent::Reset => {
            state.entries.clear();
            state.draft_input.clear();
            if let Some(pending) = &state.in_flight {
                tracing::info!(seq = pending.seq, "session reset with a request in flight, abandoning it");
                state.abandoned = true;
            }
            Vec::new()
        }
    }
}

/// Idle + non-empty draft → user entry appended, draft cleared, Pending.
///
/// # Errors
/// Returns the reason when the submit is a no-op.
pub fn submit(
    state: &mut SessionState,
    user: &User,
    mode: Mode,
) -> Result<PendingRequest, IgnoredReason> {
    if state.is_pending() {
        return Err(IgnoredReason::Busy);
    }
    let query = state.draft_input.trim();
    if query.is_empty() {
        return Err(IgnoredReason::EmptyInput);
    }
    let query = query.to_string();

    let id = state.entries.next_id(EntryKind::User);
    state.entries.append(ConversationEntry::user(id, query.clone()));
    state.draft_input.clear();

    state.next_seq += 1;
    let pending = PendingRequest {
        seq: state.next_seq,
        request: ChatRequest::new(user, mode, query),
    };
    state.in_flight = Some(pending.clone());
    state.abandoned = false;
    Ok(pending)
}

/// Settle the outstanding request `seq` with the backend's outcome.
///
/// Returns the entry appended to the log. A response for a sequence number
/// that is not in flight leaves the session untouched; the response to an
/// abandoned request returns the session to Idle without appending.
///
/// # Errors
/// Returns the reason when no entry was appended.
pub fn resolve(
    state: &mut SessionState,
    seq: u64,
    outcome: Result<Value, String>,
) -> Result<ConversationEntry, IgnoredReason> {
    let pending = match state.in_flight.take() {
        Some(pending) if pending.seq == seq => pending,
        other => {
            state.in_flight = other;
            tracing::warn!(seq, "response for a request not in flight, dropping it");
            return Err(IgnoredReason::Discarded);
        }
    };
    if std::mem::take(&mut state.abandoned) {
        tracing::debug!(seq, "response to an abandoned request dropped");
        return Err(IgnoredReason::Discarded);
    }

    let entry = match outcome {
        Ok(payload) => {
            let interpretation = interpret(&payload, pending.request.mode);
            tracing::debug!(
                seq,
                mode = %pending.request.mode,
                panels = interpretation.bundle.as_ref().map_or(0, |b| b.len()),
                "chat response interpreted"
            );
            let id = state.entries.next_id(EntryKind::Assistant);
            ConversationEntry::assistant(id, interpretation.text, interpretation.bundle)
        }
        Err(reason) => {
            tracing::error!(seq, %reason, "chat exchange failed");
            let id = state.entries.next_id(EntryKind::Error);
            ConversationEntry::failure(id)
        }
    };
    state.entries.append(entry.clone());
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::{EntryRole, FAILURE_REPLY};
    use serde_json::json;

    fn learner() -> User {
        User::new("u1", "Sam", "learner")
    }

    fn submit_text(state: &mut SessionState, text: &str, mode: Mode) -> Vec<SessionEffect> {
        reduce(state, SessionEvent::InputChanged(text.to_string()));
        reduce(state, SessionEvent::Submit { user: learner(), mode })
    }

    fn in_flight_seq(state: &SessionState) -> u64 {
        state.in_flight().map_or(0, |p| p.seq)
    }

    fn answer(state: &mut SessionState, payload: Value) {
        let seq = in_flight_seq(state);
        reduce(state, SessionEvent::ResponseOk { seq, payload });
    }

    fn fail(state: &mut SessionState, reason: &str) {
        let seq = in_flight_seq(state);
        reduce(state, SessionEvent::ResponseErr { seq, reason: reason.to_string() });
    }

    #[test]
    fn test_submit_enters_pending_and_dispatches() {
        let mut state = SessionState::new();
        let effects = submit_text(&mut state, "  what is ownership?  ", Mode::External);

        assert_eq!(
            effects,
            vec![SessionEffect::Dispatch(PendingRequest {
                seq: 1,
                request: ChatRequest {
                    role: "learner".to_string(),
                    mode: Mode::External,
                    query: "what is ownership?".to_string(),
                },
            })]
        );
        assert!(state.is_pending());
        assert_eq!(state.draft_input(), "");
        assert_eq!(state.entries().len(), 1);
        assert_eq!(state.entries()[0].role, EntryRole::User);
        assert_eq!(state.entries()[0].content, "what is ownership?");
    }

    #[test]
    fn test_blank_submit_is_ignored() {
        let mut state = SessionState::new();
        let effects = submit_text(&mut state, "   \n", Mode::Internal);
        assert!(effects.is_empty());
        assert!(!state.is_pending());
        assert!(state.entries().is_empty());
        assert_eq!(submit(&mut state, &learner(), Mode::Internal), Err(IgnoredReason::EmptyInput));
    }

    #[test]
    fn test_submit_while_pending_is_ignored() {
        let mut state = SessionState::new();
        submit_text(&mut state, "first", Mode::Internal);
        let effects = submit_text(&mut state, "second", Mode::Internal);

        assert!(effects.is_empty());
        assert_eq!(state.entries().len(), 1);
        assert_eq!(state.draft_input(), "second");
        assert_eq!(submit(&mut state, &learner(), Mode::Internal), Err(IgnoredReason::Busy));
    }

    #[test]
    fn test_success_appends_assistant_entry() {
        let mut state = SessionState::new();
        submit_text(&mut state, "hi", Mode::Internal);
        answer(&mut state, json!({"response": {"answer": "Hello", "git": [{"name": "r"}]}}));

        assert!(!state.is_pending());
        let last = state.entries().last().cloned();
        let last = last.map(|e| (e.role, e.content, e.result_bundle.is_some()));
        assert_eq!(last, Some((EntryRole::Assistant, "Hello".to_string(), true)));
    }

    #[test]
    fn test_response_uses_mode_captured_at_submit() {
        let mut state = SessionState::new();
        submit_text(&mut state, "hi", Mode::Internal);
        answer(&mut state, json!({"response": "{\"answer\":\"x\"}"}));
        assert_eq!(
            state.entries().last().map(|e| e.content.as_str()),
            Some("{\"answer\":\"x\"}")
        );
    }

    #[test]
    fn test_failure_appends_fixed_reply() {
        let mut state = SessionState::new();
        submit_text(&mut state, "hi", Mode::External);
        fail(&mut state, "connection refused");

        assert!(!state.is_pending());
        let last = state.entries().last();
        assert_eq!(last.map(|e| e.content.as_str()), Some(FAILURE_REPLY));
        assert_eq!(last.map(|e| e.role), Some(EntryRole::Assistant));
        assert!(last.is_some_and(|e| e.id.as_str().ends_with("-error")));
    }

    #[test]
    fn test_resolve_returns_appended_entry() {
        let mut state = SessionState::new();
        submit_text(&mut state, "hi", Mode::Internal);
        let entry = resolve(&mut state, 1, Ok(json!({"response": "hey"})));
        assert_eq!(entry.as_ref().map(|e| e.content.as_str()), Ok("hey"));
        assert_eq!(entry.ok().as_ref(), state.entries().last());
    }

    #[test]
    fn test_stray_responses_are_dropped() {
        let mut state = SessionState::new();
        reduce(&mut state, SessionEvent::ResponseOk { seq: 1, payload: json!({"response": "late"}) });
        reduce(&mut state, SessionEvent::ResponseErr { seq: 1, reason: "late".to_string() });
        assert!(state.entries().is_empty());
    }

    #[test]
    fn test_mismatched_sequence_is_dropped() {
        let mut state = SessionState::new();
        submit_text(&mut state, "hi", Mode::Internal);
        let stale = resolve(&mut state, 7, Ok(json!({"response": "wrong"})));

        assert_eq!(stale, Err(IgnoredReason::Discarded));
        assert!(state.is_pending());
        assert_eq!(state.entries().len(), 1);

        answer(&mut state, json!({"response": "right"}));
        assert_eq!(state.entries().last().map(|e| e.content.as_str()), Some("right"));
    }

    #[test]
    fn test_reset_while_pending_abandons_request() {
        let mut state = SessionState::new();
        submit_text(&mut state, "first", Mode::Internal);
        reduce(&mut state, SessionEvent::Reset);

        assert!(state.entries().is_empty());
        assert!(state.is_pending());
        assert!(submit_text(&mut state, "second", Mode::Internal).is_empty());
        assert!(state.entries().is_empty());

        answer(&mut state, json!({"response": "answer to first"}));
        assert!(state.entries().is_empty());
        assert!(!state.is_pending());
        assert_eq!(state.draft_input(), "second");

        let effects = reduce(&mut state, SessionEvent::Submit { user: learner(), mode: Mode::External });
        assert!(matches!(
            effects.as_slice(),
            [SessionEffect::Dispatch(PendingRequest { seq: 2, .. })]
        ));
        answer(&mut state, json!({"response": "answer to second"}));
        let contents: Vec<&str> = state.entries().iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["second", "answer to second"]);
    }

    #[test]
    fn test_log_persists_across_cycles() {
        let mut state = SessionState::new();
        submit_text(&mut state, "one", Mode::Internal);
        answer(&mut state, json!({"response": "first"}));
        submit_text(&mut state, "two", Mode::Internal);
        fail(&mut state, "boom");

        let roles: Vec<EntryRole> = state.entries().iter().map(|e| e.role).collect();
        assert_eq!(
            roles,
            vec![EntryRole::User, EntryRole::Assistant, EntryRole::User, EntryRole::Assistant]
        );
    }

    #[test]
    fn test_reset_clears_log_and_draft() {
        let mut state = SessionState::new();
        submit_text(&mut state, "one", Mode::Internal);
        answer(&mut state, json!({"response": "first"}));
        reduce(&mut state, SessionEvent::InputChanged("draft".to_string()));
        reduce(&mut state, SessionEvent::Reset);

        let snapshot = state.snapshot();
        assert!(snapshot.entries.is_empty());
        assert!(!snapshot.pending_request);
        assert_eq!(snapshot.draft_input, "");
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let mut state = SessionState::new();
        reduce(&mut state, SessionEvent::InputChanged("typing".to_string()));
        let json = serde_json::to_value(state.snapshot()).unwrap_or_default();
        assert_eq!(json["draftInput"], "typing");
        assert_eq!(json["pendingRequest"], false);
    }
}
