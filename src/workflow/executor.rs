// Transition executor - validates a requested action and performs it all-or-nothing

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::context::WorkflowContext;
use super::errors::{RegistryError, TransitionError};
use super::history::TransitionRecord;
use super::registry::StateRegistry;
use super::types::{ActionId, EffectPhase, StateId, TransitionInfo};
use crate::config::{self, EngineConfig, HistoryConfig};
use crate::observability::{EngineMetrics, OperationTimer};
use crate::telemetry::{create_transition_span, generate_correlation_id};

/// Code run when leaving a state, crossing an edge or entering a state.
/// Receives the staged payload; returning an error aborts the transition.
pub type Effect<P> = Box<dyn Fn(&mut P, &TransitionInfo<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Predicate over the staged payload that can veto an allowed transition
pub type GuardFn<P> = Box<dyn Fn(&P) -> bool + Send + Sync>;

struct Guard<P> {
    reason: String,
    check: GuardFn<P>,
}

type EdgeMap<T> = HashMap<StateId, HashMap<ActionId, Vec<T>>>;

/// Performs transitions against contexts built from one registry.
///
/// Immutable once built, so a single executor can be shared between threads.
/// Calls against the same context are serialized by `&mut WorkflowContext`.
pub struct TransitionExecutor<P> {
    registry: Arc<StateRegistry>,
    on_exit: HashMap<StateId, Vec<Effect<P>>>,
    on_entry: HashMap<StateId, Vec<Effect<P>>>,
    on_transition: EdgeMap<Effect<P>>,
    guards: EdgeMap<Guard<P>>,
    history: HistoryConfig,
    metrics: Arc<EngineMetrics>,
}

impl<P> fmt::Debug for TransitionExecutor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionExecutor")
            .field("registry", &self.registry.name())
            .field("on_exit", &self.on_exit.len())
            .field("on_entry", &self.on_entry.len())
            .field("on_transition", &self.on_transition.len())
            .field("guards", &self.guards.len())
            .field("history", &self.history)
            .finish()
    }
}

impl<P> TransitionExecutor<P> {
    pub fn builder(registry: Arc<StateRegistry>) -> ExecutorBuilder<P> {
        ExecutorBuilder::new(registry)
    }

    /// Executor with no effects or guards. History settings come from the
    /// global configuration, falling back to the defaults when it failed to load.
    pub fn new(registry: Arc<StateRegistry>) -> Self {
        let history = match config::config() {
            Ok(config) => config.history.clone(),
            Err(e) => {
                warn!(error = %e, "Using default history settings");
                HistoryConfig::default()
            }
        };

        Self {
            registry,
            on_exit: HashMap::new(),
            on_entry: HashMap::new(),
            on_transition: HashMap::new(),
            guards: HashMap::new(),
            history,
            metrics: Arc::new(EngineMetrics::new()),
        }
    }

    pub fn registry(&self) -> &Arc<StateRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    /// Create a context in the initial state, with this executor's history settings
    pub fn start(&self, payload: P) -> WorkflowContext<P> {
        self.configure(WorkflowContext::new(self.registry.clone(), payload))
    }

    /// Create a context in an explicit state, with this executor's history settings
    pub fn resume(&self, state: &str, payload: P) -> Result<WorkflowContext<P>, RegistryError> {
        WorkflowContext::in_state(self.registry.clone(), state, payload)
            .map(|ctx| self.configure(ctx))
    }

    fn configure(&self, ctx: WorkflowContext<P>) -> WorkflowContext<P> {
        if !self.history.enabled {
            return ctx.without_history();
        }
        match self.history.capacity_limit() {
            Some(capacity) => ctx.with_history_capacity(capacity),
            None => ctx,
        }
    }

    fn effects<'a>(map: &'a HashMap<StateId, Vec<Effect<P>>>, state: &str) -> &'a [Effect<P>] {
        map.get(state).map(Vec::as_slice).unwrap_or(&[])
    }

    fn edge<'a, T>(map: &'a EdgeMap<T>, state: &str, action: &str) -> &'a [T] {
        map.get(state)
            .and_then(|actions| actions.get(action))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn reject(&self, state: &StateId, action: &str, reason: Option<String>) -> TransitionError {
        self.metrics.record_rejection();
        debug!(state = %state, action = action, reason = ?reason, "Action rejected");
        TransitionError::InvalidAction {
            state: state.clone(),
            action: ActionId::new(action),
            reason,
        }
    }

    fn run_effects(
        &self,
        phase: EffectPhase,
        effects: &[Effect<P>],
        staged: &mut P,
        info: &TransitionInfo<'_>,
    ) -> Result<(), TransitionError> {
        for effect in effects {
            if let Err(source) = effect(&mut *staged, info) {
                self.metrics.record_effect_failure();
                warn!(
                    phase = %phase,
                    from = %info.from,
                    to = %info.to,
                    action = %info.action,
                    error = %source,
                    "Effect failed, transition rolled back"
                );
                return Err(TransitionError::EffectFailed {
                    phase,
                    from: info.from.clone(),
                    to: info.to.clone(),
                    action: info.action.clone(),
                    source,
                });
            }
        }
        Ok(())
    }
}

impl<P: Clone> TransitionExecutor<P> {
    /// Perform `action` on `context`
    pub fn execute(
        &self,
        context: &mut WorkflowContext<P>,
        action: &str,
    ) -> Result<(), TransitionError> {
        self.execute_with(context, action, |_| Ok(()))
    }

    /// Perform `action` on `context`, first applying the action's arguments
    /// to the payload through `input`.
    ///
    /// Order: table lookup, input, guards, exit effects, transition effects,
    /// entry effects, commit. Everything before the commit works on a staged
    /// copy of the payload, so a rejection or failure at any step leaves the
    /// context exactly as it was.
    pub fn execute_with<F>(
        &self,
        context: &mut WorkflowContext<P>,
        action: &str,
        input: F,
    ) -> Result<(), TransitionError>
    where
        F: FnOnce(&mut P) -> anyhow::Result<()>,
    {
        let timer = OperationTimer::new("transition");
        let correlation_id = generate_correlation_id();
        let span = create_transition_span(
            self.registry.name(),
            context.current_state().as_str(),
            action,
            &correlation_id,
        );
        let _enter = span.enter();

        let from = context.current_state().clone();

        if !context.shares_registry(&self.registry) {
            return Err(self.reject(
                &from,
                action,
                Some("context was created for a different registry".to_string()),
            ));
        }

        let (action_id, target) = match self.registry.transition(from.as_str(), action) {
            Ok((action_id, target)) => (action_id.clone(), target.clone()),
            Err(_) => return Err(self.reject(&from, action, None)),
        };

        let mut staged = context.payload().clone();

        if let Err(e) = input(&mut staged) {
            return Err(self.reject(&from, action, Some(e.to_string())));
        }

        for guard in Self::edge(&self.guards, from.as_str(), action) {
            if !(guard.check)(&staged) {
                self.metrics.record_guard_rejection();
                debug!(state = %from, action = action, reason = %guard.reason, "Guard vetoed transition");
                return Err(TransitionError::InvalidAction {
                    state: from,
                    action: action_id,
                    reason: Some(guard.reason.clone()),
                });
            }
        }

        let info = TransitionInfo {
            action: &action_id,
            from: &from,
            to: &target,
        };

        self.run_effects(
            EffectPhase::Exit,
            Self::effects(&self.on_exit, from.as_str()),
            &mut staged,
            &info,
        )?;
        self.run_effects(
            EffectPhase::Transition,
            Self::edge(&self.on_transition, from.as_str(), action),
            &mut staged,
            &info,
        )?;
        self.run_effects(
            EffectPhase::Entry,
            Self::effects(&self.on_entry, target.as_str()),
            &mut staged,
            &info,
        )?;

        let duration = timer.finish();
        let record = TransitionRecord {
            action: action_id.clone(),
            from: from.clone(),
            to: target.clone(),
            timestamp: chrono::Utc::now(),
            duration_us: duration.as_micros() as u64,
        };

        info!(
            from = %from,
            to = %target,
            action = %action_id,
            duration_us = record.duration_us,
            "Workflow transition committed"
        );

        context.commit(target, staged, record);
        self.metrics.record_transition();
        Ok(())
    }
}

/// Collects effects and guards; validates them against the registry in `build`
pub struct ExecutorBuilder<P> {
    executor: TransitionExecutor<P>,
    errors: Vec<RegistryError>,
}

impl<P> ExecutorBuilder<P> {
    pub fn new(registry: Arc<StateRegistry>) -> Self {
        Self {
            executor: TransitionExecutor::new(registry),
            errors: Vec::new(),
        }
    }

    fn check_state(&mut self, state: &StateId) -> bool {
        if self.executor.registry.contains(state.as_str()) {
            true
        } else {
            self.errors.push(RegistryError::UnknownState(state.clone()));
            false
        }
    }

    fn check_edge(&mut self, state: &StateId, action: &ActionId) -> bool {
        if self
            .executor
            .registry
            .is_valid_transition(state.as_str(), action.as_str())
        {
            true
        } else {
            self.errors.push(RegistryError::UnknownTransition {
                state: state.clone(),
                action: action.clone(),
            });
            false
        }
    }

    /// Run `effect` whenever an entity enters `state`
    pub fn on_enter<F>(mut self, state: impl Into<StateId>, effect: F) -> Self
    where
        F: Fn(&mut P, &TransitionInfo<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let state = state.into();
        if self.check_state(&state) {
            self.executor
                .on_entry
                .entry(state)
                .or_default()
                .push(Box::new(effect));
        }
        self
    }

    /// Run `effect` whenever an entity leaves `state`
    pub fn on_exit<F>(mut self, state: impl Into<StateId>, effect: F) -> Self
    where
        F: Fn(&mut P, &TransitionInfo<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let state = state.into();
        if self.check_state(&state) {
            self.executor
                .on_exit
                .entry(state)
                .or_default()
                .push(Box::new(effect));
        }
        self
    }

    /// Run `effect` when `action` is taken from `state`
    pub fn on_transition<F>(
        mut self,
        state: impl Into<StateId>,
        action: impl Into<ActionId>,
        effect: F,
    ) -> Self
    where
        F: Fn(&mut P, &TransitionInfo<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let state = state.into();
        let action = action.into();
        if self.check_edge(&state, &action) {
            self.executor
                .on_transition
                .entry(state)
                .or_default()
                .entry(action)
                .or_default()
                .push(Box::new(effect));
        }
        self
    }

    /// Veto `action` from `state` unless `check` holds for the staged payload
    pub fn guard<F>(
        mut self,
        state: impl Into<StateId>,
        action: impl Into<ActionId>,
        reason: impl Into<String>,
        check: F,
    ) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        let state = state.into();
        let action = action.into();
        if self.check_edge(&state, &action) {
            self.executor
                .guards
                .entry(state)
                .or_default()
                .entry(action)
                .or_default()
                .push(Guard {
                    reason: reason.into(),
                    check: Box::new(check),
                });
        }
        self
    }

    pub fn history(mut self, history: HistoryConfig) -> Self {
        self.executor.history = history;
        self
    }

    /// Take history settings from an explicitly loaded configuration
    pub fn with_config(self, config: &EngineConfig) -> Self {
        self.history(config.history.clone())
    }

    /// Share counters with other executors
    pub fn metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.executor.metrics = metrics;
        self
    }

    pub fn build(self) -> Result<TransitionExecutor<P>, RegistryError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.executor),
        }
    }
}
