//! Pending confirmations: at most one per guild.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::PromptError;
use crate::host::PromptSurface;
use crate::session::{PurgeSession, SessionId};
use crate::target::ScopeKey;

/// An unstarted session waiting for the requester to press Start.
pub struct ConfirmationGate {
    session: PurgeSession,
    prompt: Box<dyn PromptSurface>,
}

impl ConfirmationGate {
    pub fn new(session: PurgeSession, prompt: Box<dyn PromptSurface>) -> Self {
        Self { session, prompt }
    }

    pub fn scope(&self) -> ScopeKey {
        self.session.scope()
    }

    pub fn session(&self) -> &PurgeSession {
        &self.session
    }

    /// Dismiss the prompt and discard the session without starting it.
    pub async fn destroy(self) {
        dismiss_prompt(self.prompt.as_ref()).await;
        self.session.stop(true).await;
        debug!(
            guild_id = self.session.scope().get(),
            session = %self.session.id(),
            "confirmation gate destroyed"
        );
    }

    pub(crate) fn into_parts(self) -> (PurgeSession, Box<dyn PromptSurface>) {
        (self.session, self.prompt)
    }
}

/// Dismiss a prompt, treating an already-gone prompt as done.
pub(crate) async fn dismiss_prompt(prompt: &dyn PromptSurface) {
    match prompt.dismiss().await {
        Ok(()) => {}
        Err(PromptError::Gone) => debug!("confirmation prompt already dismissed"),
        Err(PromptError::Other(source)) => {
            warn!(?source, "failed to dismiss confirmation prompt");
        }
    }
}

#[derive(Default)]
pub struct PendingGates {
    gates: Mutex<HashMap<ScopeKey, ConfirmationGate>>,
}

impl PendingGates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a gate, destroying any gate it supersedes for the same guild.
    pub async fn install(&self, gate: ConfirmationGate) {
        let scope = gate.scope();
        let previous = self.gates.lock().await.insert(scope, gate);

        if let Some(previous) = previous {
            info!(
                guild_id = scope.get(),
                session = %previous.session().id(),
                "superseding pending kick confirmation"
            );
            previous.destroy().await;
        }
    }

    /// Remove and return the gate for `scope` if it still wraps `session`.
    pub async fn take(&self, scope: ScopeKey, session: SessionId) -> Option<ConfirmationGate> {
        let mut gates = self.gates.lock().await;
        match gates.get(&scope) {
            Some(gate) if gate.session().id() == session => gates.remove(&scope),
            _ => None,
        }
    }

    /// Destroy the gate for `scope` if it still wraps `session`.
    pub async fn discard(&self, scope: ScopeKey, session: SessionId) -> bool {
        match self.take(scope, session).await {
            Some(gate) => {
                gate.destroy().await;
                true
            }
            None => false,
        }
    }

    pub async fn pending(&self, scope: ScopeKey) -> Option<SessionId> {
        self.gates
            .lock()
            .await
            .get(&scope)
            .map(|gate| gate.session().id())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use twilight_model::id::Id;

    use super::*;
    use crate::session::{PurgeRequest, RunMode, SessionState};
    use crate::testing::{MemoryLogFactory, RecordingPrompt, ScriptedExecutor, targets};

    fn session(scope: u64) -> PurgeSession {
        PurgeSession::new(
            PurgeRequest::new(Id::new(scope), targets(&[1, 2]), "gate test"),
            RunMode::Live,
            Arc::new(ScriptedExecutor::default()),
            Arc::new(MemoryLogFactory::default()),
        )
    }

    #[tokio::test]
    async fn second_gate_supersedes_first() {
        let gates = PendingGates::new();
        let first = session(1);
        let second = session(1);
        let first_prompt = RecordingPrompt::default();
        let second_prompt = RecordingPrompt::default();

        gates
            .install(ConfirmationGate::new(first.clone(), Box::new(first_prompt.clone())))
            .await;
        gates
            .install(ConfirmationGate::new(second.clone(), Box::new(second_prompt.clone())))
            .await;

        assert_eq!(first_prompt.dismissals(), 1);
        assert_eq!(second_prompt.dismissals(), 0);
        assert_eq!(first.state(), SessionState::Released);
        assert_eq!(second.state(), SessionState::Created);
        assert_eq!(gates.pending(Id::new(1)).await, Some(second.id()));
        assert!(gates.take(Id::new(1), first.id()).await.is_none());
    }

    #[tokio::test]
    async fn gates_in_different_guilds_are_independent() {
        let gates = PendingGates::new();
        let first = session(1);
        let second = session(2);
        let first_prompt = RecordingPrompt::default();

        gates
            .install(ConfirmationGate::new(first.clone(), Box::new(first_prompt.clone())))
            .await;
        gates
            .install(ConfirmationGate::new(second.clone(), Box::new(RecordingPrompt::default())))
            .await;

        assert_eq!(first_prompt.dismissals(), 0);
        assert_eq!(gates.pending(Id::new(1)).await, Some(first.id()));
        assert_eq!(gates.pending(Id::new(2)).await, Some(second.id()));
    }

    #[tokio::test]
    async fn take_requires_matching_session() {
        let gates = PendingGates::new();
        let pending = session(1);
        gates
            .install(ConfirmationGate::new(pending.clone(), Box::new(RecordingPrompt::default())))
            .await;

        assert!(gates.take(Id::new(1), SessionId::new(u64::MAX)).await.is_none());
        assert_eq!(gates.pending(Id::new(1)).await, Some(pending.id()));

        let gate = gates.take(Id::new(1), pending.id()).await;
        assert!(gate.is_some());
        assert_eq!(gates.pending(Id::new(1)).await, None);
    }

    #[tokio::test]
    async fn destroy_tolerates_prompt_already_gone() {
        let prompt = RecordingPrompt::gone();
        let pending = session(1);

        ConfirmationGate::new(pending.clone(), Box::new(prompt.clone()))
            .destroy()
            .await;

        assert_eq!(prompt.dismissals(), 1);
        assert_eq!(pending.state(), SessionState::Released);
    }

    #[tokio::test]
    async fn discard_destroys_matching_gate() {
        let gates = PendingGates::new();
        let prompt = RecordingPrompt::default();
        let pending = session(3);
        gates
            .install(ConfirmationGate::new(pending.clone(), Box::new(prompt.clone())))
            .await;

        assert!(gates.discard(Id::new(3), pending.id()).await);
        assert!(!gates.discard(Id::new(3), pending.id()).await);
        assert_eq!(prompt.dismissals(), 1);
        assert_eq!(pending.state(), SessionState::Released);
    }
}
