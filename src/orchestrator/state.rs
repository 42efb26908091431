//! Run state and the events published to observers.

use std::fmt;

use crate::item::ItemId;

/// Aggregate status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunStatus {
    /// No run has started.
    #[default]
    Idle,
    /// Items are being converted.
    Running,
    /// Every item converted successfully.
    Completed,
    /// At least one item failed.
    Failed,
    /// The run was cancelled.
    Cancelled,
}

impl RunStatus {
    /// Returns a stable lowercase label for display.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a run's progress.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
    /// Aggregate status.
    pub status: RunStatus,
    /// Items processed so far, successful or not.
    pub completed_count: usize,
    /// Items in the run.
    pub total_count: usize,
    /// Item currently being converted.
    pub current_item_name: Option<String>,
    /// Most recent failure message.
    pub last_error: Option<String>,
}

impl RunState {
    pub(crate) fn started(total_count: usize) -> Self {
        Self {
            status: RunStatus::Running,
            total_count,
            ..Self::default()
        }
    }

    /// Percentage of processed items, rounded to the nearest integer.
    #[must_use]
    pub fn progress(&self) -> u8 {
        progress_percent(self.completed_count, self.total_count)
    }
}

/// `round(done / total * 100)`, clamped to 100. An empty run counts as done.
#[must_use]
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let done = done.min(total);
    let percent = (done * 100 + total / 2) / total;
    u8::try_from(percent).unwrap_or(100)
}

/// Something that happened during a run, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// The run started.
    Started {
        /// Number of items.
        total: usize,
    },
    /// An item is about to be converted.
    ItemStarted {
        /// Item id.
        id: ItemId,
        /// Item name.
        name: String,
    },
    /// Aggregate progress, 0..=100, never decreasing within a run.
    Progress(u8),
    /// An item reached a terminal state.
    ItemFinished {
        /// Item id.
        id: ItemId,
        /// Whether it converted.
        success: bool,
        /// Failure message.
        error: Option<String>,
    },
    /// The run finished.
    Finished(RunState),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent_rounds() {
        assert_eq!(progress_percent(0, 3), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(1, 2), 50);
        assert_eq!(progress_percent(1, 8), 13);
    }

    #[test]
    fn test_progress_percent_edges() {
        assert_eq!(progress_percent(0, 0), 100);
        assert_eq!(progress_percent(5, 3), 100);
    }

    #[test]
    fn test_started_state() {
        let state = RunState::started(4);
        assert_eq!(state.status, RunStatus::Running);
        assert_eq!(state.total_count, 4);
        assert_eq!(state.progress(), 0);
        assert_eq!(RunState::default().status, RunStatus::Idle);
    }
}
