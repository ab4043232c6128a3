use crate::session::{SessionId, SessionState};

/// Precondition violations on a session. These are programmer errors and
/// abort the operation that hit them.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session {session} cannot {operation} while {state}")]
    InvalidState {
        session: SessionId,
        operation: &'static str,
        state: SessionState,
    },
}

/// Failure reported by a [`PromptSurface`](crate::host::PromptSurface).
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// The prompt was already removed, by the user or by someone else.
    #[error("prompt is already gone")]
    Gone,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
