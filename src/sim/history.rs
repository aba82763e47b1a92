//! Interaction history log
//!
//! Append-only within a run. Every gate the state machine consults is a pure
//! function of this log, so nothing needs a cached "has seen enough" flag.

use serde::{Deserialize, Serialize};

use super::station::StationId;
use crate::consts::REQUIRED_LINES;

/// Ordered station visits of the current run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionHistory {
    entries: Vec<StationId>,
}

impl InteractionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: StationId) {
        self.entries.push(id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[StationId] {
        &self.entries
    }

    pub fn contains(&self, id: StationId) -> bool {
        self.entries.contains(&id)
    }

    pub fn non_exit_count(&self) -> usize {
        non_exit_count(&self.entries)
    }

    pub fn has_exit(&self) -> bool {
        self.entries.iter().any(|id| id.is_exit())
    }

    /// Enough material for the exit object to accept the player
    pub fn can_approach_exit(&self) -> bool {
        self.non_exit_count() >= REQUIRED_LINES
    }

    pub fn can_finalize(&self) -> bool {
        can_finalize(&self.entries)
    }

    /// Non-exit visits still missing before the exit will listen
    pub fn lines_needed(&self) -> usize {
        REQUIRED_LINES.saturating_sub(self.non_exit_count())
    }
}

pub fn non_exit_count(history: &[StationId]) -> usize {
    history.iter().filter(|id| !id.is_exit()).count()
}

/// Finalize gate: the exit was visited and at least two other visits exist
pub fn can_finalize(history: &[StationId]) -> bool {
    history.iter().any(|id| id.is_exit()) && non_exit_count(history) >= REQUIRED_LINES
}
