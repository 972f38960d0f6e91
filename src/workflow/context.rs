// Workflow context - an entity's current state, payload and history

use std::sync::Arc;

use super::errors::{RegistryError, TransitionError};
use super::executor::TransitionExecutor;
use super::history::{TransitionLog, TransitionRecord};
use super::registry::StateRegistry;
use super::snapshot::ContextSnapshot;
use super::types::{ActionId, StateId};

/// An entity moving through a workflow.
///
/// The current state is private and only changes through
/// [`TransitionExecutor`], so it is always a member of the registry the
/// context was created with. The payload is the caller's business data.
#[derive(Debug, Clone)]
pub struct WorkflowContext<P> {
    registry: Arc<StateRegistry>,
    state: StateId,
    payload: P,
    history: TransitionLog,
    record_history: bool,
}

impl<P> WorkflowContext<P> {
    /// Start a new entity in the registry's initial state
    pub fn new(registry: Arc<StateRegistry>, payload: P) -> Self {
        let state = registry.initial_state().clone();
        Self {
            registry,
            state,
            payload,
            history: TransitionLog::new(),
            record_history: true,
        }
    }

    /// Rehydrate an entity in an explicit state, e.g. one loaded by the caller
    pub fn in_state(
        registry: Arc<StateRegistry>,
        state: &str,
        payload: P,
    ) -> Result<Self, RegistryError> {
        let state = registry.resolve(state)?.clone();
        Ok(Self {
            registry,
            state,
            payload,
            history: TransitionLog::new(),
            record_history: true,
        })
    }

    /// Keep at most `capacity` history records, 0 for unbounded
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        let mut history = TransitionLog::with_capacity(capacity);
        history.replace(self.history.to_vec());
        self.history = history;
        self
    }

    pub fn without_history(mut self) -> Self {
        self.record_history = false;
        self
    }

    pub fn registry(&self) -> &Arc<StateRegistry> {
        &self.registry
    }

    pub fn current_state(&self) -> &StateId {
        &self.state
    }

    pub fn is_in(&self, state: &str) -> bool {
        self.state == *state
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    pub fn history(&self) -> &TransitionLog {
        &self.history
    }

    /// Actions the transition table accepts from the current state.
    /// Guards may still veto them.
    pub fn available_actions(&self) -> Vec<&ActionId> {
        self.registry.actions_for(self.state.as_str())
    }

    pub fn can_apply(&self, action: &str) -> bool {
        self.registry.is_valid_transition(self.state.as_str(), action)
    }

    pub fn is_terminal(&self) -> bool {
        self.registry
            .state(self.state.as_str())
            .is_some_and(|spec| spec.is_terminal())
    }

    /// Commit a transition that the executor has fully validated
    pub(crate) fn commit(&mut self, target: StateId, payload: P, record: TransitionRecord) {
        self.state = target;
        self.payload = payload;
        if self.record_history {
            self.history.push(record);
        }
    }

    pub(crate) fn shares_registry(&self, registry: &Arc<StateRegistry>) -> bool {
        Arc::ptr_eq(&self.registry, registry) || *self.registry == **registry
    }
}

impl<P: Clone> WorkflowContext<P> {
    /// Delegate `action` to the executor
    pub fn apply(
        &mut self,
        executor: &TransitionExecutor<P>,
        action: &str,
    ) -> Result<&StateId, TransitionError> {
        executor.execute(self, action)?;
        Ok(&self.state)
    }

    /// Delegate `action` to the executor, applying the action's arguments to
    /// the payload first
    pub fn apply_with<F>(
        &mut self,
        executor: &TransitionExecutor<P>,
        action: &str,
        input: F,
    ) -> Result<&StateId, TransitionError>
    where
        F: FnOnce(&mut P) -> anyhow::Result<()>,
    {
        executor.execute_with(self, action, input)?;
        Ok(&self.state)
    }

    pub fn snapshot(&self) -> ContextSnapshot<P> {
        ContextSnapshot::new(self.state.clone(), self.payload.clone(), self.history.to_vec())
    }
}

impl<P> WorkflowContext<P> {
    /// Roll the entity back to a snapshot. Fails without touching the context
    /// when the snapshot's state is not in this context's registry.
    pub fn restore(&mut self, snapshot: ContextSnapshot<P>) -> Result<(), RegistryError> {
        let state = self.registry.resolve(snapshot.state.as_str())?.clone();

        tracing::debug!(
            from = %self.state,
            to = %state,
            taken_at = %snapshot.taken_at,
            "Restoring workflow context from snapshot"
        );

        self.state = state;
        self.payload = snapshot.payload;
        if self.record_history {
            self.history.replace(snapshot.history);
        }
        Ok(())
    }
}
