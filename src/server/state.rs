//! Application state shared across all request handlers.

use std::sync::Arc;

use dashmap::DashMap;

use crate::chat::{ChatBackend, ChatConfig, ChatResult, HttpChatBackend, SessionId, SubmissionController};

/// Shared application state.
pub struct AppState {
    /// Configuration the backend client was built from.
    pub config: ChatConfig,
    backend: Arc<dyn ChatBackend>,
    sessions: DashMap<SessionId, Arc<SubmissionController>>,
}

impl AppState {
    /// Create state talking to the HTTP backend described by `config`.
    ///
    /// # Errors
    /// Returns an error if the backend client cannot be built.
    pub fn new(config: ChatConfig) -> ChatResult<Arc<Self>> {
        let backend = HttpChatBackend::new(&config)?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Create state around an existing backend.
    #[must_use]
    pub fn with_backend(config: ChatConfig, backend: Arc<dyn ChatBackend>) -> Arc<Self> {
        Arc::new(Self {
            config,
            backend,
            sessions: DashMap::new(),
        })
    }

    /// Open a new panel and return its id.
    pub fn open_session(&self) -> SessionId {
        let id = SessionId::new();
        self.sessions
            .insert(id, Arc::new(SubmissionController::new(Arc::clone(&self.backend))));
        tracing::info!(session = %id, "session opened");
        id
    }

    /// Look up a panel.
    #[must_use]
    pub fn session(&self, id: &SessionId) -> Option<Arc<SubmissionController>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Drop a panel. Returns whether it existed.
    pub fn close_session(&self, id: &SessionId) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "session closed");
        }
        removed
    }

    /// Number of open panels.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
