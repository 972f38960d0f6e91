// State registry - the transition table every context is validated against

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::errors::RegistryError;
use super::types::{ActionId, StateId};

/// A single state and the actions it accepts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSpec {
    pub description: Option<String>,
    pub transitions: BTreeMap<ActionId, StateId>,
}

impl StateSpec {
    pub fn is_terminal(&self) -> bool {
        self.transitions.is_empty()
    }
}

/// Validated, read-only transition table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRegistry {
    name: Option<String>,
    initial: StateId,
    states: BTreeMap<StateId, StateSpec>,
}

impl StateRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn initial_state(&self) -> &StateId {
        &self.initial
    }

    pub fn contains(&self, state: &str) -> bool {
        self.states.contains_key(state)
    }

    /// Look up a registered state, returning the registry's own id
    pub fn resolve(&self, state: &str) -> Result<&StateId, RegistryError> {
        self.states
            .get_key_value(state)
            .map(|(id, _)| id)
            .ok_or_else(|| RegistryError::UnknownState(StateId::new(state)))
    }

    pub fn state(&self, state: &str) -> Option<&StateSpec> {
        self.states.get(state)
    }

    pub fn states(&self) -> impl Iterator<Item = &StateId> {
        self.states.keys()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn is_valid_transition(&self, state: &str, action: &str) -> bool {
        self.states
            .get(state)
            .is_some_and(|spec| spec.transitions.contains_key(action))
    }

    pub fn next_state(&self, state: &str, action: &str) -> Result<&StateId, RegistryError> {
        self.transition(state, action).map(|(_, target)| target)
    }

    /// Like `next_state`, but also hands back the registry's own action id
    pub fn transition(
        &self,
        state: &str,
        action: &str,
    ) -> Result<(&ActionId, &StateId), RegistryError> {
        self.states
            .get(state)
            .and_then(|spec| spec.transitions.get_key_value(action))
            .ok_or_else(|| RegistryError::UnknownTransition {
                state: StateId::new(state),
                action: ActionId::new(action),
            })
    }

    /// Actions accepted in `state`, in name order. Empty for unknown states.
    pub fn actions_for(&self, state: &str) -> Vec<&ActionId> {
        self.states
            .get(state)
            .map(|spec| spec.transitions.keys().collect())
            .unwrap_or_default()
    }

    /// States with no outgoing actions
    pub fn terminal_states(&self) -> Vec<&StateId> {
        self.states
            .iter()
            .filter(|(_, spec)| spec.is_terminal())
            .map(|(id, _)| id)
            .collect()
    }

    /// Every state reachable from the initial state, the initial state included
    pub fn reachable_states(&self) -> BTreeSet<&StateId> {
        let mut seen: BTreeSet<&StateId> = BTreeSet::new();
        let mut queue: VecDeque<&StateId> = VecDeque::new();

        seen.insert(&self.initial);
        queue.push_back(&self.initial);

        while let Some(current) = queue.pop_front() {
            if let Some(spec) = self.states.get(current) {
                for target in spec.transitions.values() {
                    if seen.insert(target) {
                        queue.push_back(target);
                    }
                }
            }
        }

        seen
    }

    pub fn unreachable_states(&self) -> Vec<&StateId> {
        let reachable = self.reachable_states();
        self.states
            .keys()
            .filter(|id| !reachable.contains(id))
            .collect()
    }

    /// Every (state, action, target) triple in the table
    pub fn transitions(&self) -> impl Iterator<Item = (&StateId, &ActionId, &StateId)> {
        self.states.iter().flat_map(|(state, spec)| {
            spec.transitions
                .iter()
                .map(move |(action, target)| (state, action, target))
        })
    }
}

/// Builds a `StateRegistry`; all validation happens in `build`
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    name: Option<String>,
    initial: Option<StateId>,
    states: BTreeMap<StateId, StateSpec>,
    conflicts: Vec<RegistryError>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Designate the state new contexts start in. It must be declared
    /// through `state` or `define` before `build`.
    pub fn initial(mut self, state: impl Into<StateId>) -> Self {
        self.initial = Some(state.into());
        self
    }

    /// Declare a state, possibly without outgoing actions
    pub fn state(mut self, state: impl Into<StateId>) -> Self {
        self.states.entry(state.into()).or_default();
        self
    }

    pub fn describe(mut self, state: impl Into<StateId>, description: impl Into<String>) -> Self {
        self.states.entry(state.into()).or_default().description = Some(description.into());
        self
    }

    /// Add `state --action--> next` to the table. The source state is declared
    /// implicitly; the target must be declared somewhere before `build`.
    pub fn define(
        mut self,
        state: impl Into<StateId>,
        action: impl Into<ActionId>,
        next: impl Into<StateId>,
    ) -> Self {
        let state = state.into();
        let action = action.into();
        let next = next.into();

        let spec = self.states.entry(state.clone()).or_default();
        match spec.transitions.get(&action) {
            Some(existing) if *existing != next => {
                self.conflicts.push(RegistryError::ConflictingTransition {
                    state,
                    action,
                    existing: existing.clone(),
                    requested: next,
                });
            }
            Some(_) => {}
            None => {
                spec.transitions.insert(action, next);
            }
        }
        self
    }

    pub fn build(self) -> Result<StateRegistry, RegistryError> {
        if let Some(conflict) = self.conflicts.into_iter().next() {
            return Err(conflict);
        }

        if self.states.is_empty() {
            return Err(RegistryError::EmptyRegistry);
        }

        let initial = self.initial.ok_or(RegistryError::MissingInitialState)?;
        if !self.states.contains_key(&initial) {
            return Err(RegistryError::UnknownState(initial));
        }

        for (from, spec) in &self.states {
            for (action, target) in &spec.transitions {
                if !self.states.contains_key(target) {
                    return Err(RegistryError::UnknownTargetState {
                        from: from.clone(),
                        action: action.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        let registry = StateRegistry {
            name: self.name,
            initial,
            states: self.states,
        };

        let unreachable = registry.unreachable_states();
        if !unreachable.is_empty() {
            tracing::debug!(
                workflow = ?registry.name,
                unreachable = ?unreachable,
                "Registry contains states unreachable from the initial state"
            );
        }

        Ok(registry)
    }
}
