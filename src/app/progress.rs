//! Progress bar for conversion runs, driven by run events.

use indicatif::{ProgressBar, ProgressStyle};
use note_converter_core::RunEvent;

/// Renders [`RunEvent`]s as a percentage bar. Does nothing when disabled.
pub(crate) struct RunProgress {
    bar: Option<ProgressBar>,
}

impl RunProgress {
    pub(crate) fn new(enabled: bool) -> Self {
        Self::with_bar(enabled.then(|| ProgressBar::new(100)))
    }

    fn with_bar(bar: Option<ProgressBar>) -> Self {
        if let Some(bar) = &bar {
            bar.set_length(100);
            bar.set_style(
                ProgressStyle::with_template("{bar:40} {pos:>3}% {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
        }
        Self { bar }
    }

    pub(crate) fn observe(&self, event: &RunEvent) {
        let Some(bar) = &self.bar else {
            return;
        };
        match event {
            RunEvent::Started { total } => bar.set_message(format!("converting {total} item(s)")),
            RunEvent::ItemStarted { name, .. } => bar.set_message(name.clone()),
            RunEvent::Progress(percent) => bar.set_position(u64::from(*percent)),
            RunEvent::ItemFinished { .. } => {}
            RunEvent::Finished(_) => bar.finish_and_clear(),
        }
    }

    #[cfg(test)]
    fn position(&self) -> Option<u64> {
        self.bar.as_ref().map(ProgressBar::position)
    }
}
