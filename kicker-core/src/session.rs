//! One guild's kick session and its background task.
//!
//! Lifecycle: `Created -> Running -> {Completed, Cancelled, Failed} -> Released`.
//! A session that is never started goes straight from `Created` to `Released`.

use std::{
    collections::HashSet,
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use chrono::Utc;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use twilight_model::id::{Id, marker::ChannelMarker};

use crate::error::SessionError;
use crate::host::{ActionExecutor, SessionLogFactory};
use crate::lock;
use crate::log::SessionLog;
use crate::target::{ScopeKey, Target, dedup_targets};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique session identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Running,
    Completed,
    Cancelled,
    Failed,
    Released,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Released => "released",
        };
        f.write_str(name)
    }
}

/// Whether the executor is actually invoked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunMode {
    Live,
    #[default]
    Simulated,
}

impl RunMode {
    /// Prefix used in user-facing and audit text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Live => "",
            Self::Simulated => "Simulated",
        }
    }
}

/// How the background task ended.
#[derive(Debug)]
pub enum Termination {
    Completed,
    Cancelled,
    Failed(anyhow::Error),
}

impl Termination {
    pub fn state(&self) -> SessionState {
        match self {
            Self::Completed => SessionState::Completed,
            Self::Cancelled => SessionState::Cancelled,
            Self::Failed(_) => SessionState::Failed,
        }
    }

    pub fn was_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// What a new session should act on.
#[derive(Clone, Debug)]
pub struct PurgeRequest {
    pub scope: ScopeKey,
    pub targets: Vec<Target>,
    pub reason: String,
    /// Channel the request came from; results are reported there.
    pub origin: Option<Id<ChannelMarker>>,
}

impl PurgeRequest {
    pub fn new(scope: ScopeKey, targets: Vec<Target>, reason: impl Into<String>) -> Self {
        Self {
            scope,
            targets,
            reason: reason.into(),
            origin: None,
        }
    }

    pub fn origin(mut self, channel_id: Id<ChannelMarker>) -> Self {
        self.origin = Some(channel_id);
        self
    }
}

/// Point-in-time snapshot of a session.
#[derive(Clone, Debug)]
pub struct SessionReport {
    pub session: SessionId,
    pub scope: ScopeKey,
    pub origin: Option<Id<ChannelMarker>>,
    pub mode: RunMode,
    /// Terminal state once the run has ended, otherwise the lifecycle state.
    pub state: SessionState,
    pub total: usize,
    pub removed: Vec<Target>,
    pub failure: Option<String>,
}

impl SessionReport {
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.removed.len())
    }

    pub fn was_cancelled(&self) -> bool {
        self.state == SessionState::Cancelled
    }

    pub fn status_line(&self) -> String {
        let condition = match self.state {
            SessionState::Completed => "Completed Successfully",
            SessionState::Cancelled => "was Cancelled",
            SessionState::Failed => "Failed",
            SessionState::Created => "is Awaiting Confirmation",
            SessionState::Running => "is Running",
            SessionState::Released => "was Discarded",
        };
        format!("{} Kick Session {condition}", self.mode.label())
            .trim_start()
            .to_owned()
    }
}

enum Phase {
    Created,
    Running {
        cancel: CancellationToken,
        stopped: watch::Receiver<bool>,
    },
    Finished(SessionState),
    Released,
}

impl Phase {
    fn state(&self) -> SessionState {
        match self {
            Self::Created => SessionState::Created,
            Self::Running { .. } => SessionState::Running,
            Self::Finished(state) => *state,
            Self::Released => SessionState::Released,
        }
    }
}

struct Inner {
    id: SessionId,
    scope: ScopeKey,
    origin: Option<Id<ChannelMarker>>,
    reason: String,
    mode: RunMode,
    targets: Vec<Target>,
    removed: Mutex<Vec<Target>>,
    phase: Mutex<Phase>,
    outcome: Mutex<Option<(SessionState, Option<String>)>>,
    executor: Mutex<Option<Arc<dyn ActionExecutor>>>,
    log: SessionLog,
}

/// Shared handle to a kick session.
#[derive(Clone)]
pub struct PurgeSession {
    inner: Arc<Inner>,
}

impl PurgeSession {
    pub fn new(
        request: PurgeRequest,
        mode: RunMode,
        executor: Arc<dyn ActionExecutor>,
        log_factory: Arc<dyn SessionLogFactory>,
    ) -> Self {
        let id = SessionId::next();
        let name = format!(
            "session_{}_{id}",
            Utc::now().format("%Y%m%d_%H-%M-%S-%p-Z")
        );

        Self {
            inner: Arc::new(Inner {
                id,
                scope: request.scope,
                origin: request.origin,
                reason: request.reason,
                mode,
                targets: dedup_targets(request.targets),
                removed: Mutex::new(Vec::new()),
                phase: Mutex::new(Phase::Created),
                outcome: Mutex::new(None),
                executor: Mutex::new(Some(executor)),
                log: SessionLog::new(request.scope, name, log_factory),
            }),
        }
    }

    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    pub fn scope(&self) -> ScopeKey {
        self.inner.scope
    }

    pub fn mode(&self) -> RunMode {
        self.inner.mode
    }

    pub fn reason(&self) -> &str {
        &self.inner.reason
    }

    pub fn log_name(&self) -> &str {
        self.inner.log.name()
    }

    pub fn targets(&self) -> &[Target] {
        &self.inner.targets
    }

    pub fn state(&self) -> SessionState {
        lock(&self.inner.phase).state()
    }

    /// Members kicked so far, in processing order.
    pub fn removed(&self) -> Vec<Target> {
        lock(&self.inner.removed).clone()
    }

    /// Targets not yet acted upon, in original order.
    pub fn remaining_targets(&self) -> Vec<Target> {
        let removed: HashSet<_> = lock(&self.inner.removed)
            .iter()
            .map(|target| target.id)
            .collect();
        self.inner
            .targets
            .iter()
            .filter(|target| !removed.contains(&target.id))
            .cloned()
            .collect()
    }

    /// Whether cancellation has been requested for the running task.
    pub fn cancel_requested(&self) -> bool {
        match &*lock(&self.inner.phase) {
            Phase::Running { cancel, .. } => cancel.is_cancelled(),
            _ => false,
        }
    }

    pub fn report(&self) -> SessionReport {
        let (state, failure) = match lock(&self.inner.outcome).clone() {
            Some((state, failure)) => (state, failure),
            None => (self.state(), None),
        };

        SessionReport {
            session: self.inner.id,
            scope: self.inner.scope,
            origin: self.inner.origin,
            mode: self.inner.mode,
            state,
            total: self.inner.targets.len(),
            removed: self.removed(),
            failure,
        }
    }

    /// Launch the background task.
    ///
    /// The returned [`SessionRun`] resolves once, when the task has stopped
    /// touching the session.
    pub fn start(&self) -> Result<SessionRun, SessionError> {
        let (cancel, stopped_tx, executor) = {
            let mut phase = lock(&self.inner.phase);
            let executor = match &*phase {
                Phase::Created => lock(&self.inner.executor).take(),
                _ => None,
            };
            let Some(executor) = executor else {
                return Err(SessionError::InvalidState {
                    session: self.inner.id,
                    operation: "start",
                    state: phase.state(),
                });
            };

            let cancel = CancellationToken::new();
            let (stopped_tx, stopped_rx) = watch::channel(false);
            *phase = Phase::Running {
                cancel: cancel.clone(),
                stopped: stopped_rx,
            };
            (cancel, stopped_tx, executor)
        };

        let guild_id = self.inner.scope.get();
        let start_line = match self.inner.mode {
            RunMode::Live => format!("Starting kick session in guild {guild_id}"),
            RunMode::Simulated => format!("Starting simulated kick session in guild {guild_id}"),
        };
        self.inner.log.info(&start_line);
        info!(
            guild_id,
            session = %self.inner.id,
            targets = self.inner.targets.len(),
            mode = ?self.inner.mode,
            "kick session started"
        );

        let handle = tokio::spawn(run_targets(Arc::clone(&self.inner), executor, cancel));

        Ok(SessionRun {
            session: self.clone(),
            handle,
            stopped: stopped_tx,
        })
    }

    /// Request cooperative cancellation of the running task, if any.
    ///
    /// With `release`, waits until the task has acknowledged the request and
    /// then releases the session's resources. Stopping a session that has no
    /// running task, or that is already released, does nothing else.
    pub async fn stop(&self, release: bool) {
        let stopped = {
            let phase = lock(&self.inner.phase);
            match &*phase {
                Phase::Running { cancel, stopped } => {
                    cancel.cancel();
                    Some(stopped.clone())
                }
                Phase::Released => {
                    debug!(session = %self.inner.id, "stop on released kick session ignored");
                    return;
                }
                Phase::Created | Phase::Finished(_) => None,
            }
        };

        if !release {
            return;
        }

        if let Some(mut stopped) = stopped {
            // An error means the run handle was dropped, so nothing is left to wait on.
            let _ = stopped.wait_for(|done| *done).await;
        }

        self.release();
    }

    /// Release the log handle and executor. Returns `false` if already released.
    pub(crate) fn release(&self) -> bool {
        {
            let mut phase = lock(&self.inner.phase);
            match &*phase {
                Phase::Released => {
                    debug!(session = %self.inner.id, "kick session already released");
                    return false;
                }
                Phase::Running { cancel, .. } => cancel.cancel(),
                Phase::Created | Phase::Finished(_) => {}
            }
            *phase = Phase::Released;
        }

        lock(&self.inner.executor).take();
        let log_closed = self.inner.log.close();
        debug!(session = %self.inner.id, log_closed, "kick session released");
        true
    }

    fn record_termination(&self, termination: &Termination) {
        let failure = match termination {
            Termination::Failed(source) => Some(format!("{source:#}")),
            Termination::Completed | Termination::Cancelled => None,
        };
        *lock(&self.inner.outcome) = Some((termination.state(), failure));

        let mut phase = lock(&self.inner.phase);
        if matches!(*phase, Phase::Running { .. }) {
            *phase = Phase::Finished(termination.state());
        }
    }
}

impl fmt::Debug for PurgeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PurgeSession")
            .field("id", &self.inner.id)
            .field("scope", &self.inner.scope)
            .field("state", &self.state())
            .field("targets", &self.inner.targets.len())
            .finish()
    }
}

/// The single completion signal of a started session.
#[must_use = "a started session must be driven to completion"]
pub struct SessionRun {
    session: PurgeSession,
    handle: JoinHandle<Termination>,
    stopped: watch::Sender<bool>,
}

impl SessionRun {
    pub fn session(&self) -> &PurgeSession {
        &self.session
    }

    /// Wait for the background task to end and record its terminal state.
    pub async fn finish(self) -> Termination {
        let termination = match self.handle.await {
            Ok(termination) => termination,
            Err(source) => {
                Termination::Failed(anyhow::anyhow!("kick session task aborted: {source}"))
            }
        };

        self.session.record_termination(&termination);
        let status = self.session.report().status_line();
        self.session.inner.log.info(&status);
        info!(
            guild_id = self.session.scope().get(),
            session = %self.session.id(),
            state = %termination.state(),
            "kick session finished"
        );

        self.stopped.send_replace(true);
        termination
    }
}

async fn run_targets(
    inner: Arc<Inner>,
    executor: Arc<dyn ActionExecutor>,
    cancel: CancellationToken,
) -> Termination {
    let guild_id = inner.scope.get();

    for target in &inner.targets {
        if cancel.is_cancelled() {
            debug!(guild_id, session = %inner.id, "kick session observed cancellation");
            return Termination::Cancelled;
        }

        let removal = match inner.mode {
            RunMode::Live => executor.remove(inner.scope, target, &inner.reason).await,
            RunMode::Simulated => {
                tokio::task::yield_now().await;
                Ok(())
            }
        };

        // A stop that landed mid-removal wins over whatever the removal returned.
        if cancel.is_cancelled() {
            inner.log.info(&format!(
                "Cancelled while kicking Guild: {guild_id} / Member: {target}"
            ));
            debug!(
                guild_id,
                session = %inner.id,
                member_id = target.id.get(),
                "kick session cancelled during removal"
            );
            return Termination::Cancelled;
        }

        if let Err(source) = removal {
            inner.log.error(&format!(
                "Kick failed Guild: {guild_id} / Member: {target}: {source:#}"
            ));
            return Termination::Failed(
                source.context(format!("failed to kick member {}", target.id)),
            );
        }

        lock(&inner.removed).push(target.clone());
        inner.log.info(
            format!(
                "{} Kicked Guild: {guild_id} / Member: {target}",
                inner.mode.label()
            )
            .trim_start(),
        );
        debug!(guild_id, session = %inner.id, member_id = target.id.get(), "member kicked");
    }

    Termination::Completed
}
