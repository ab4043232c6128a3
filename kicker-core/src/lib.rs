//! Kick session engine: confirmation gates, one running session per guild,
//! cancellable background removal, and exactly-once completion.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use twilight_http::Client;

pub mod error;
pub mod gate;
pub mod host;
pub mod log;
pub mod registry;
pub mod service;
pub mod session;
pub mod target;

#[cfg(test)]
mod testing;

pub use error::{PromptError, SessionError};
pub use gate::{ConfirmationGate, PendingGates};
pub use host::{
    ActionExecutor, CandidateFilter, CompletionSink, PromptSurface, SessionLogFactory,
    SessionLogWriter, TaskFailure,
};
pub use log::{FileLogFactory, SessionLog};
pub use registry::SessionRegistry;
pub use service::{BeginOutcome, ConfirmOutcome, PurgeService, StopOutcome};
pub use session::{
    PurgeRequest, PurgeSession, RunMode, SessionId, SessionReport, SessionRun, SessionState,
    Termination,
};
pub use target::{ScopeKey, Target};

/// Shared application context passed into command handlers.
///
/// Cheap to clone because it only stores reference-counted shared state.
#[derive(Clone)]
pub struct Context {
    pub http: Arc<Client>,
    pub purge: Arc<PurgeService>,
}

impl Context {
    /// Create a new application context.
    pub fn new(http: Arc<Client>, purge: Arc<PurgeService>) -> Self {
        Self { http, purge }
    }
}

/// Lock a std mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
