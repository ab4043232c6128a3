//! Collaborators the session engine consumes but does not implement.
//!
//! The bot supplies twilight-backed implementations; tests supply fakes.

use async_trait::async_trait;
use tracing::Level;

use crate::error::PromptError;
use crate::session::{SessionId, SessionReport};
use crate::target::{ScopeKey, Target};

/// Performs the removal of a single target.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn remove(&self, scope: ScopeKey, target: &Target, reason: &str) -> anyhow::Result<()>;
}

/// The interactive confirmation prompt a gate is attached to.
#[async_trait]
pub trait PromptSurface: Send + Sync {
    /// Remove the prompt. Must report [`PromptError::Gone`] when it no longer exists.
    async fn dismiss(&self) -> Result<(), PromptError>;
}

/// Opens the durable, per-session audit log.
pub trait SessionLogFactory: Send + Sync {
    fn open(&self, scope: ScopeKey, session_name: &str)
    -> anyhow::Result<Box<dyn SessionLogWriter>>;
}

/// An open session log handle.
pub trait SessionLogWriter: Send {
    fn write_line(&mut self, level: Level, message: &str) -> anyhow::Result<()>;
    fn close(&mut self) -> anyhow::Result<()>;
}

/// Receives the final result of every session, exactly once.
#[async_trait]
pub trait CompletionSink: Send + Sync {
    async fn session_finished(&self, report: &SessionReport, was_cancelled: bool);
}

/// Selects the ordered target list from a pool of candidates.
///
/// Evaluated once, before a confirmation gate is created.
pub trait CandidateFilter<C> {
    fn select(&self, candidates: &[C]) -> Vec<Target>;
}

/// An unrecovered background task failure, handed to the process-level
/// failure handler.
#[derive(Debug)]
pub struct TaskFailure {
    pub scope: ScopeKey,
    pub session: SessionId,
    pub error: anyhow::Error,
}
