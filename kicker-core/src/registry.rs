use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::SessionError;
use crate::session::{PurgeSession, SessionId, SessionRun};
use crate::target::ScopeKey;

/// Running sessions, at most one per guild.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<ScopeKey, PurgeSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register and start `session` unless its guild already has one running.
    ///
    /// The check, the insert and the start happen under one lock acquisition.
    /// Returns `Ok(None)` when the guild is taken.
    pub async fn launch(&self, session: &PurgeSession) -> Result<Option<SessionRun>, SessionError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&session.scope()) {
            return Ok(None);
        }

        let run = session.start()?;
        sessions.insert(session.scope(), session.clone());
        Ok(Some(run))
    }

    pub async fn get(&self, scope: ScopeKey) -> Option<PurgeSession> {
        self.sessions.lock().await.get(&scope).cloned()
    }

    pub async fn contains(&self, scope: ScopeKey) -> bool {
        self.sessions.lock().await.contains_key(&scope)
    }

    /// Remove the entry for `scope` unconditionally.
    pub async fn take(&self, scope: ScopeKey) -> Option<PurgeSession> {
        self.sessions.lock().await.remove(&scope)
    }

    /// Remove the entry for `scope` only if it is still `session`.
    pub async fn remove_if_current(&self, scope: ScopeKey, session: SessionId) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&scope) {
            Some(current) if current.id() == session => {
                sessions.remove(&scope);
                true
            }
            _ => {
                debug!(guild_id = scope.get(), %session, "registry entry already removed");
                false
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use twilight_model::id::Id;

    use super::*;
    use crate::session::{PurgeRequest, RunMode, SessionState};
    use crate::testing::{MemoryLogFactory, ScriptedExecutor, targets};

    fn session(scope: u64, executor: Arc<ScriptedExecutor>) -> PurgeSession {
        PurgeSession::new(
            PurgeRequest::new(Id::new(scope), targets(&[1, 2, 3]), "registry test"),
            RunMode::Live,
            executor,
            Arc::new(MemoryLogFactory::default()),
        )
    }

    #[tokio::test]
    async fn second_launch_for_same_guild_is_refused() {
        let executor = Arc::new(ScriptedExecutor::holding(1));
        let registry = SessionRegistry::new();
        let first = session(1, executor.clone());
        let second = session(1, executor.clone());

        let run = registry.launch(&first).await.expect("launch").expect("free guild");
        assert!(registry.launch(&second).await.expect("launch").is_none());
        assert_eq!(second.state(), SessionState::Created);
        assert_eq!(registry.len().await, 1);

        executor.release_hold();
        run.finish().await;
    }

    #[tokio::test]
    async fn remove_if_current_ignores_other_sessions() {
        let registry = SessionRegistry::new();
        let running = session(1, Arc::new(ScriptedExecutor::default()));
        let run = registry.launch(&running).await.expect("launch").expect("free guild");

        assert!(!registry.remove_if_current(Id::new(1), SessionId::new(u64::MAX)).await);
        assert!(registry.contains(Id::new(1)).await);
        assert!(registry.remove_if_current(Id::new(1), running.id()).await);
        assert!(!registry.remove_if_current(Id::new(1), running.id()).await);
        assert!(registry.is_empty().await);

        run.finish().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_launches_admit_one_session_per_guild() {
        let executor = Arc::new(ScriptedExecutor::holding(1));
        let registry = Arc::new(SessionRegistry::new());

        let attempts: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let candidate = session(5, executor.clone());
                tokio::spawn(async move { registry.launch(&candidate).await })
            })
            .collect();

        let mut runs = Vec::new();
        for attempt in attempts {
            if let Some(run) = attempt.await.expect("join").expect("launch") {
                runs.push(run);
            }
        }

        assert_eq!(runs.len(), 1);
        assert_eq!(registry.len().await, 1);

        executor.release_hold();
        for run in runs {
            run.finish().await;
        }
    }
}
