//! Keystroke debounce for free-typing fields.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use formbar_model::FieldName;

/// Delay after the last keystroke before a typed value is dispatched.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(750);

/// One pending deadline per field. A new keystroke on the same field pushes
/// its deadline back; the other fields are unaffected.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: HashMap<FieldName, Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: HashMap::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Register a keystroke on `field` at `now`.
    pub fn touch(&mut self, field: FieldName, now: Instant) {
        self.pending.insert(field, now + self.delay);
    }

    pub fn is_pending(&self, field: &str) -> bool {
        self.pending.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Remove and return fields whose deadline is at or before `now`, ordered
    /// by deadline.
    pub fn take_due(&mut self, now: Instant) -> Vec<FieldName> {
        let mut due: Vec<(Instant, FieldName)> = self
            .pending
            .iter()
            .filter(|&(_, deadline)| *deadline <= now)
            .map(|(field, deadline)| (*deadline, field.clone()))
            .collect();
        due.sort();
        for (_, field) in &due {
            self.pending.remove(field);
        }
        due.into_iter().map(|(_, field)| field).collect()
    }

    /// Remove and return every pending field, ordered by deadline.
    pub fn take_all(&mut self) -> Vec<FieldName> {
        let mut all: Vec<(Instant, FieldName)> =
            self.pending.drain().map(|(field, deadline)| (deadline, field)).collect();
        all.sort();
        all.into_iter().map(|(_, field)| field).collect()
    }
}
