//! Per-item outcomes and the run report.

use super::state::RunState;
use crate::convert::ConversionResult;
use crate::error::ConversionError;
use crate::item::ConversionItem;

/// The result of converting one item.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Run-local copy of the item, with its final status and error.
    pub item: ConversionItem,
    /// Converted result or the failure.
    pub result: Result<ConversionResult, ConversionError>,
}

impl Outcome {
    /// Returns true when the item converted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns true when the run was cancelled before this item converted.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.result, Err(ConversionError::Cancelled))
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Final run state.
    pub state: RunState,
    /// One outcome per submitted item, in submission order.
    pub outcomes: Vec<Outcome>,
}

impl RunReport {
    /// Clones the successful results, in submission order.
    #[must_use]
    pub fn successful_results(&self) -> Vec<ConversionResult> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok().cloned())
            .collect()
    }

    /// Returns the failed outcomes, excluding items skipped by cancellation.
    #[must_use]
    pub fn failures(&self) -> Vec<&Outcome> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.is_success() && !outcome.is_cancelled())
            .collect()
    }

    /// Number of items skipped by cancellation.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_cancelled()).count()
    }

    /// Number of successful outcomes.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }
}
