//! Begin/confirm/stop orchestration across the gate table and the registry.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::SessionError;
use crate::gate::{ConfirmationGate, PendingGates, dismiss_prompt};
use crate::host::{
    ActionExecutor, CandidateFilter, CompletionSink, PromptSurface, SessionLogFactory, TaskFailure,
};
use crate::registry::SessionRegistry;
use crate::session::{
    PurgeRequest, PurgeSession, RunMode, SessionId, SessionReport, SessionRun, Termination,
};
use crate::target::ScopeKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeginOutcome {
    /// A confirmation gate is waiting for this session.
    Pending(SessionId),
    AlreadyRunning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Started(SessionId),
    AlreadyRunning,
    /// The gate was superseded, declined or already confirmed.
    Stale,
}

#[derive(Clone, Debug)]
pub enum StopOutcome {
    Stopped(SessionReport),
    NothingRunning,
}

pub struct PurgeService {
    registry: Arc<SessionRegistry>,
    gates: PendingGates,
    executor: Arc<dyn ActionExecutor>,
    log_factory: Arc<dyn SessionLogFactory>,
    sink: Arc<dyn CompletionSink>,
    failures: mpsc::UnboundedSender<TaskFailure>,
    mode: RunMode,
}

impl PurgeService {
    /// Build the service and the receiving end of its task-failure channel.
    pub fn new(
        executor: Arc<dyn ActionExecutor>,
        log_factory: Arc<dyn SessionLogFactory>,
        sink: Arc<dyn CompletionSink>,
        mode: RunMode,
    ) -> (Self, mpsc::UnboundedReceiver<TaskFailure>) {
        let (failures, failure_rx) = mpsc::unbounded_channel();
        let service = Self {
            registry: Arc::new(SessionRegistry::new()),
            gates: PendingGates::new(),
            executor,
            log_factory,
            sink,
            failures,
            mode,
        };
        (service, failure_rx)
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn gates(&self) -> &PendingGates {
        &self.gates
    }

    pub async fn is_running(&self, scope: ScopeKey) -> bool {
        self.registry.contains(scope).await
    }

    /// Create an unstarted session for `request`.
    pub fn prepare(&self, request: PurgeRequest) -> PurgeSession {
        PurgeSession::new(
            request,
            self.mode,
            Arc::clone(&self.executor),
            Arc::clone(&self.log_factory),
        )
    }

    /// Create an unstarted session whose targets are selected by `filter`.
    pub fn prepare_from<C, F>(
        &self,
        mut request: PurgeRequest,
        candidates: &[C],
        filter: &F,
    ) -> PurgeSession
    where
        F: CandidateFilter<C>,
    {
        request.targets = filter.select(candidates);
        self.prepare(request)
    }

    /// Put `session` behind a confirmation gate.
    ///
    /// Refused while a session is running for the guild; the prompt is then
    /// dismissed and the session discarded.
    pub async fn begin(
        &self,
        session: PurgeSession,
        prompt: Box<dyn PromptSurface>,
    ) -> BeginOutcome {
        let gate = ConfirmationGate::new(session, prompt);
        let scope = gate.scope();

        if self.registry.contains(scope).await {
            info!(guild_id = scope.get(), "kick session already running, refusing new request");
            gate.destroy().await;
            return BeginOutcome::AlreadyRunning;
        }

        let session = gate.session().id();
        self.gates.install(gate).await;
        info!(guild_id = scope.get(), %session, "kick session awaiting confirmation");
        BeginOutcome::Pending(session)
    }

    /// Confirm the pending gate for `scope` and start its session.
    pub async fn confirm(
        &self,
        scope: ScopeKey,
        session: SessionId,
    ) -> Result<ConfirmOutcome, SessionError> {
        let Some(gate) = self.gates.take(scope, session).await else {
            debug!(guild_id = scope.get(), %session, "confirmation no longer pending");
            return Ok(ConfirmOutcome::Stale);
        };

        let (session, prompt) = gate.into_parts();
        let launched = self.registry.launch(&session).await;
        dismiss_prompt(prompt.as_ref()).await;

        match launched {
            Ok(Some(run)) => {
                self.supervise(run);
                Ok(ConfirmOutcome::Started(session.id()))
            }
            Ok(None) => {
                session.stop(true).await;
                Ok(ConfirmOutcome::AlreadyRunning)
            }
            Err(source) => {
                session.stop(true).await;
                Err(source)
            }
        }
    }

    /// Drop the pending gate for `scope` without starting it.
    pub async fn decline(&self, scope: ScopeKey, session: SessionId) -> bool {
        self.gates.discard(scope, session).await
    }

    /// Cancel the running session for `scope`.
    ///
    /// The registry entry is removed right away; the completion path's own
    /// removal then finds nothing to do.
    pub async fn stop(&self, scope: ScopeKey) -> StopOutcome {
        let Some(session) = self.registry.take(scope).await else {
            return StopOutcome::NothingRunning;
        };

        info!(guild_id = scope.get(), session = %session.id(), "stopping kick session");
        session.stop(true).await;
        StopOutcome::Stopped(session.report())
    }

    pub async fn status(&self, scope: ScopeKey) -> Option<SessionReport> {
        self.registry
            .get(scope)
            .await
            .map(|session| session.report())
    }

    /// Drive `run` to its end and perform the completion protocol once.
    fn supervise(&self, run: SessionRun) {
        let registry = Arc::clone(&self.registry);
        let sink = Arc::clone(&self.sink);
        let failures = self.failures.clone();

        tokio::spawn(async move {
            let session = run.session().clone();
            let termination = run.finish().await;

            registry.remove_if_current(session.scope(), session.id()).await;
            session.release();

            let report = session.report();
            sink.session_finished(&report, termination.was_cancelled()).await;

            if let Termination::Failed(error) = termination {
                error!(
                    guild_id = session.scope().get(),
                    session = %session.id(),
                    error = %format!("{error:#}"),
                    "kick session task failed"
                );
                let failure = TaskFailure {
                    scope: session.scope(),
                    session: session.id(),
                    error,
                };
                if failures.send(failure).is_err() {
                    warn!("task failure handler is gone");
                }
            }
        });
    }
}
