// Snapshots and undo support for workflow contexts

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::context::WorkflowContext;
use super::errors::RegistryError;
use super::history::TransitionRecord;
use super::types::StateId;

/// Captured state, payload and history of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot<P> {
    pub state: StateId,
    pub payload: P,
    pub history: Vec<TransitionRecord>,
    pub taken_at: DateTime<Utc>,
}

impl<P> ContextSnapshot<P> {
    pub fn new(state: StateId, payload: P, history: Vec<TransitionRecord>) -> Self {
        Self {
            state,
            payload,
            history,
            taken_at: Utc::now(),
        }
    }
}

impl<P: Serialize> ContextSnapshot<P> {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl<P: DeserializeOwned> ContextSnapshot<P> {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Undo stack of snapshots for a single context.
///
/// With a capacity set, the oldest snapshots are dropped first.
#[derive(Debug, Clone)]
pub struct Caretaker<P> {
    snapshots: VecDeque<ContextSnapshot<P>>,
    capacity: Option<usize>,
}

impl<P> Default for Caretaker<P> {
    fn default() -> Self {
        Self {
            snapshots: VecDeque::new(),
            capacity: None,
        }
    }
}

impl<P> Caretaker<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` snapshots. The most recent save is always kept.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            capacity: Some(capacity.max(1)),
        }
    }

    pub fn push(&mut self, snapshot: ContextSnapshot<P>) {
        self.snapshots.push_back(snapshot);
        if let Some(capacity) = self.capacity {
            while self.snapshots.len() > capacity {
                self.snapshots.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn peek(&self) -> Option<&ContextSnapshot<P>> {
        self.snapshots.back()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Restore the most recent snapshot into `context`.
    ///
    /// Returns `Ok(false)` when there is nothing to undo. A snapshot that
    /// fails to restore is put back on the stack.
    pub fn undo(&mut self, context: &mut WorkflowContext<P>) -> Result<bool, RegistryError>
    where
        P: Clone,
    {
        let Some(snapshot) = self.snapshots.pop_back() else {
            return Ok(false);
        };

        match context.restore(snapshot.clone()) {
            Ok(()) => Ok(true),
            Err(e) => {
                self.snapshots.push_back(snapshot);
                Err(e)
            }
        }
    }
}

impl<P: Clone> Caretaker<P> {
    /// Snapshot `context` onto the stack
    pub fn save(&mut self, context: &WorkflowContext<P>) {
        self.push(context.snapshot());
    }
}
