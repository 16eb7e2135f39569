//! Submission controller: one request/response cycle at a time per panel.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::chat::backend::ChatBackend;
use crate::chat::session::{
    IgnoredReason, PendingRequest, SessionEvent, SessionSnapshot, SessionState, reduce, resolve,
    submit,
};
use crate::chat::types::{ConversationEntry, Mode, User};

/// What a submit ended up doing.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Nothing was sent.
    Ignored {
        /// Why the submit was a no-op.
        reason: IgnoredReason,
    },
    /// The backend answered; the interpreted entry was appended.
    Answered {
        /// Appended assistant entry.
        entry: ConversationEntry,
    },
    /// The exchange failed; the fixed failure entry was appended.
    Failed {
        /// Appended failure entry.
        entry: ConversationEntry,
    },
}

/// Drives the session and the backend for one panel.
///
/// The session lock is never held across the backend call, so snapshots stay
/// readable while a request is outstanding. Single-flight is enforced by the
/// pending flag inside the session: a submit arriving while Pending is
/// ignored instead of queued, including after a reset that abandoned the
/// outstanding request.
pub struct SubmissionController {
    backend: Arc<dyn ChatBackend>,
    session: RwLock<SessionState>,
}

impl SubmissionController {
    /// Create a controller with an empty, idle session.
    #[must_use]
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            session: RwLock::new(SessionState::new()),
        }
    }

    /// Replace the draft text.
    pub async fn set_draft(&self, text: impl Into<String>) {
        let mut session = self.session.write().await;
        reduce(&mut session, SessionEvent::InputChanged(text.into()));
    }

    /// Submit `text` as the user's question.
    ///
    /// The draft is only replaced when the submit goes through; a blank
    /// `text` or a busy session leaves it as it was.
    pub async fn submit_text(
        &self,
        user: &User,
        mode: Mode,
        text: impl Into<String>,
    ) -> SubmitOutcome {
        let text = text.into();
        let pending = {
            let mut session = self.session.write().await;
            if session.is_pending() {
                return SubmitOutcome::Ignored {
                    reason: IgnoredReason::Busy,
                };
            }
            if text.trim().is_empty() {
                return SubmitOutcome::Ignored {
                    reason: IgnoredReason::EmptyInput,
                };
            }
            reduce(&mut session, SessionEvent::InputChanged(text));
            submit(&mut session, user, mode)
        };
        self.run_cycle(pending).await
    }

    /// Submit whatever the draft currently holds.
    pub async fn submit_draft(&self, user: &User, mode: Mode) -> SubmitOutcome {
        let pending = {
            let mut session = self.session.write().await;
            submit(&mut session, user, mode)
        };
        self.run_cycle(pending).await
    }

    async fn run_cycle(&self, pending: Result<PendingRequest, IgnoredReason>) -> SubmitOutcome {
        let pending = match pending {
            Ok(pending) => pending,
            Err(reason) => return SubmitOutcome::Ignored { reason },
        };

        let outcome = self
            .backend
            .send(&pending.request)
            .await
            .map_err(|e| e.to_string());
        let failed = outcome.is_err();

        let mut session = self.session.write().await;
        match resolve(&mut session, pending.seq, outcome) {
            Ok(entry) if failed => SubmitOutcome::Failed { entry },
            Ok(entry) => SubmitOutcome::Answered { entry },
            Err(reason) => SubmitOutcome::Ignored { reason },
        }
    }

    /// Clear the log and draft. An outstanding request is abandoned: its
    /// response is dropped and the session stays busy until it arrives.
    pub async fn reset(&self) {
        let mut session = self.session.write().await;
        reduce(&mut session, SessionEvent::Reset);
    }

    /// Whether a request is outstanding.
    pub async fn is_pending(&self) -> bool {
        self.session.read().await.is_pending()
    }

    /// Copy of the current session.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.read().await.snapshot()
    }
}
