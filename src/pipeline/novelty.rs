// src/pipeline/novelty.rs

//! In-process novelty tracking.
//!
//! Remembers the leading event of the last batch acted on during this
//! process lifetime. The event store remains the durable record across
//! restarts.

use crate::models::EventRecord;

/// Tracker state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NoveltyState {
    /// Nothing observed yet
    #[default]
    Empty,
    /// Leading record of the last new batch
    HasLast(Box<EventRecord>),
}

/// Detects when the newest feed entry differs from the last one seen.
#[derive(Debug, Clone, Default)]
pub struct NoveltyTracker {
    state: NoveltyState,
}

impl NoveltyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the leading record of a batch (feeds list newest first).
    ///
    /// Returns `true` and remembers the record when its code differs from
    /// the remembered one, or when nothing is remembered yet. An empty batch
    /// is never new and leaves the state untouched.
    pub fn is_new(&mut self, batch: &[EventRecord]) -> bool {
        let changed = self.peek_is_new(batch);
        if let (true, Some(current)) = (changed, batch.first()) {
            self.remember(current);
        }
        changed
    }

    /// Same check as [`is_new`](Self::is_new) without updating state.
    pub fn peek_is_new(&self, batch: &[EventRecord]) -> bool {
        let Some(current) = batch.first() else {
            return false;
        };
        match &self.state {
            NoveltyState::Empty => true,
            NoveltyState::HasLast(last) => last.code != current.code,
        }
    }

    /// Record `record` as the last event acted on.
    pub fn remember(&mut self, record: &EventRecord) {
        log::debug!("New leading event {}", record.code);
        self.state = NoveltyState::HasLast(Box::new(record.clone()));
    }

    /// Code of the remembered record, if any.
    pub fn last_code(&self) -> Option<&str> {
        match &self.state {
            NoveltyState::Empty => None,
            NoveltyState::HasLast(last) => Some(&last.code),
        }
    }

    pub fn state(&self) -> &NoveltyState {
        &self.state
    }
}
