//! Exit code logic for conversion runs.
//!
//! Single responsibility: map converted/unconverted counts to the process exit outcome.

use crate::ProcessExit;

/// `not_converted` counts failed items plus items a cancelled run never reached.
pub(crate) fn determine_exit_outcome(converted: usize, not_converted: usize) -> ProcessExit {
    if not_converted == 0 {
        ProcessExit::Success
    } else if converted > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}
