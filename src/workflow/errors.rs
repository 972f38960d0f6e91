use thiserror::Error;

use super::types::{ActionId, EffectPhase, StateId};

/// Configuration errors raised while building or querying a registry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry defines no states")]
    EmptyRegistry,

    #[error("no initial state designated")]
    MissingInitialState,

    #[error("unknown state: {0}")]
    UnknownState(StateId),

    #[error("transition {from} --{action}--> {target} targets an unknown state")]
    UnknownTargetState {
        from: StateId,
        action: ActionId,
        target: StateId,
    },

    #[error("conflicting transition for {state} --{action}: already targets {existing}, requested {requested}")]
    ConflictingTransition {
        state: StateId,
        action: ActionId,
        existing: StateId,
        requested: StateId,
    },

    #[error("no transition defined for action {action} in state {state}")]
    UnknownTransition { state: StateId, action: ActionId },
}

/// Errors surfaced by `TransitionExecutor::execute`
#[derive(Debug, Error)]
pub enum TransitionError {
    /// The action is not accepted in the current state, or a guard vetoed it.
    /// State and payload are unchanged.
    #[error("cannot perform {action} in current state {state}{}", reason_suffix(.reason))]
    InvalidAction {
        state: StateId,
        action: ActionId,
        reason: Option<String>,
    },

    /// An effect failed mid-transition. State and payload were rolled back.
    #[error("{phase} effect failed during {from} --{action}--> {to}: {source}")]
    EffectFailed {
        phase: EffectPhase,
        from: StateId,
        to: StateId,
        action: ActionId,
        #[source]
        source: anyhow::Error,
    },
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|r| format!(": {}", r))
        .unwrap_or_default()
}

impl TransitionError {
    /// True for the recoverable "not allowed right now" outcome
    pub fn is_invalid_action(&self) -> bool {
        matches!(self, TransitionError::InvalidAction { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            TransitionError::InvalidAction { reason, .. } => reason.as_deref(),
            TransitionError::EffectFailed { .. } => None,
        }
    }
}

/// Errors raised while loading a workflow definition
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("state {0} is declared more than once")]
    DuplicateState(String),

    #[error("invalid workflow definition: {0}")]
    Registry(#[from] RegistryError),
}
