//! In-memory collaborators for engine tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};
use tracing::Level;
use twilight_model::id::Id;

use crate::error::PromptError;
use crate::host::{
    ActionExecutor, CompletionSink, PromptSurface, SessionLogFactory, SessionLogWriter,
};
use crate::lock;
use crate::session::SessionReport;
use crate::target::{ScopeKey, Target};

pub(crate) fn targets(ids: &[u64]) -> Vec<Target> {
    ids.iter()
        .map(|id| Target::new(Id::new(*id), format!("member-{id}")))
        .collect()
}

struct Hold {
    member: u64,
    entered: Notify,
    release: Notify,
}

/// Executor that records attempts, optionally fails or panics on one member,
/// and optionally blocks on one member until released.
#[derive(Default)]
pub(crate) struct ScriptedExecutor {
    attempts: Mutex<Vec<u64>>,
    fail_on: Option<u64>,
    panic_on: Option<u64>,
    hold: Option<Hold>,
}

impl ScriptedExecutor {
    pub(crate) fn failing_on(member: u64) -> Self {
        Self {
            fail_on: Some(member),
            ..Self::default()
        }
    }

    pub(crate) fn panicking_on(member: u64) -> Self {
        Self {
            panic_on: Some(member),
            ..Self::default()
        }
    }

    pub(crate) fn holding(member: u64) -> Self {
        Self {
            hold: Some(Hold {
                member,
                entered: Notify::new(),
                release: Notify::new(),
            }),
            ..Self::default()
        }
    }

    pub(crate) fn attempts(&self) -> Vec<u64> {
        lock(&self.attempts).clone()
    }

    /// Wait until the held member's removal is in flight.
    pub(crate) async fn wait_for_hold(&self) {
        if let Some(hold) = &self.hold {
            hold.entered.notified().await;
        }
    }

    pub(crate) fn release_hold(&self) {
        if let Some(hold) = &self.hold {
            hold.release.notify_one();
        }
    }
}

#[async_trait]
impl ActionExecutor for ScriptedExecutor {
    async fn remove(&self, _scope: ScopeKey, target: &Target, _reason: &str) -> anyhow::Result<()> {
        let member = target.id.get();
        lock(&self.attempts).push(member);

        if let Some(hold) = &self.hold
            && hold.member == member
        {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        if self.panic_on == Some(member) {
            panic!("executor blew up on member {member}");
        }

        if self.fail_on == Some(member) {
            anyhow::bail!("missing kick permission");
        }

        Ok(())
    }
}

#[derive(Default)]
struct LogCounters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    lines: Mutex<Vec<String>>,
}

#[derive(Default)]
pub(crate) struct MemoryLogFactory {
    counters: Arc<LogCounters>,
}

impl MemoryLogFactory {
    pub(crate) fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        lock(&self.counters.lines).clone()
    }
}

impl SessionLogFactory for MemoryLogFactory {
    fn open(
        &self,
        _scope: ScopeKey,
        _session_name: &str,
    ) -> anyhow::Result<Box<dyn SessionLogWriter>> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryLogWriter {
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct MemoryLogWriter {
    counters: Arc<LogCounters>,
}

impl SessionLogWriter for MemoryLogWriter {
    fn write_line(&mut self, _level: Level, message: &str) -> anyhow::Result<()> {
        lock(&self.counters.lines).push(message.to_owned());
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Prompt that reports `Gone` after its first dismissal, like a deleted message.
#[derive(Clone, Default)]
pub(crate) struct RecordingPrompt {
    dismissals: Arc<AtomicUsize>,
    gone_from_start: bool,
}

impl RecordingPrompt {
    pub(crate) fn gone() -> Self {
        Self {
            gone_from_start: true,
            ..Self::default()
        }
    }

    pub(crate) fn dismissals(&self) -> usize {
        self.dismissals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PromptSurface for RecordingPrompt {
    async fn dismiss(&self) -> Result<(), PromptError> {
        let previous = self.dismissals.fetch_add(1, Ordering::SeqCst);
        if self.gone_from_start || previous > 0 {
            return Err(PromptError::Gone);
        }
        Ok(())
    }
}

pub(crate) struct RecordingSink {
    finished: mpsc::UnboundedSender<(SessionReport, bool)>,
}

impl RecordingSink {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<(SessionReport, bool)>) {
        let (finished, receiver) = mpsc::unbounded_channel();
        (Self { finished }, receiver)
    }
}

#[async_trait]
impl CompletionSink for RecordingSink {
    async fn session_finished(&self, report: &SessionReport, was_cancelled: bool) {
        let _ = self.finished.send((report.clone(), was_cancelled));
    }
}
