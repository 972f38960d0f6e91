// Append-only transition history kept per entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::types::{ActionId, StateId};

/// One committed transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub action: ActionId,
    pub from: StateId,
    pub to: StateId,
    pub timestamp: DateTime<Utc>,
    pub duration_us: u64,
}

/// Audit trail of transitions, oldest first.
///
/// A capacity of `None` keeps everything; otherwise the oldest records are
/// pruned once the log grows past the capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionLog {
    records: VecDeque<TransitionRecord>,
    capacity: Option<usize>,
    pruned: u64,
}

impl TransitionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log keeping at most `capacity` records; 0 keeps everything
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(1024)),
            capacity: (capacity > 0).then_some(capacity),
            pruned: 0,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn push(&mut self, record: TransitionRecord) {
        self.records.push_back(record);
        self.prune();
    }

    fn prune(&mut self) {
        if let Some(capacity) = self.capacity {
            while self.records.len() > capacity {
                self.records.pop_front();
                self.pruned += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records dropped so far because of the capacity limit
    pub fn pruned(&self) -> u64 {
        self.pruned
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    /// The sequence of actions applied, oldest first
    pub fn actions(&self) -> Vec<&ActionId> {
        self.records.iter().map(|r| &r.action).collect()
    }

    pub fn to_vec(&self) -> Vec<TransitionRecord> {
        self.records.iter().cloned().collect()
    }

    /// Replace the contents, keeping this log's capacity
    pub fn replace(&mut self, records: Vec<TransitionRecord>) {
        self.records = records.into();
        self.prune();
    }
}
