//! Conversion orchestrator: sequences items through a backend.
//!
//! A run takes a slice of normalized items and an API key, converts every
//! item (one request per item, or a single batch request), and returns a
//! [`RunReport`]. Progress is published to an observer callback as
//! [`RunEvent`]s.
//!
//! # Overview
//!
//! - **Sequential** mode converts items one at a time in submission order. A
//!   failed item is recorded and the run continues.
//! - **Batched** mode (more than one item and [`RunOptions::use_batch`]) sends
//!   one batch request; a batch-level failure fails every member.
//! - Cancellation through [`RunOptions::cancel`] is checked between items in
//!   sequential mode and aborts the in-flight request in batched mode.
//!   Finished outcomes are kept; items the run never converted are recorded
//!   as [`ConversionError::Cancelled`].
//!
//! # Example
//!
//! ```no_run
//! use note_converter_core::convert::ApiBackend;
//! use note_converter_core::credentials::ApiKey;
//! use note_converter_core::item::{Normalizer, RawInput};
//! use note_converter_core::orchestrator::{Orchestrator, RunEvent, RunOptions};
//! use note_converter_core::transport::{ApiClient, TransportConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = ApiBackend::new(ApiClient::new(TransportConfig::default())?);
//! let orchestrator = Orchestrator::new(backend);
//! let items = vec![Normalizer::default().normalize(RawInput::url("example.com"))?];
//! let key = ApiKey::new("my-key")?;
//!
//! let report = orchestrator
//!     .run(&items, Some(&key), &RunOptions::default(), |event: &RunEvent| {
//!         if let RunEvent::Progress(percent) = event {
//!             println!("{percent}%");
//!         }
//!     })
//!     .await?;
//! println!("{} converted", report.success_count());
//! # Ok(())
//! # }
//! ```

mod outcome;
mod state;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::convert::{ConversionBackend, ConversionResult};
use crate::credentials::ApiKey;
use crate::error::ConversionError;
use crate::item::{ConversionItem, ItemKind, ValidationError};
use crate::transport::{Endpoint, TransportError};

pub use outcome::{Outcome, RunReport};
pub use state::{RunEvent, RunState, RunStatus, progress_percent};

/// Options for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Send all items in one batch request when there is more than one.
    pub use_batch: bool,
    /// Cancels the run when triggered.
    pub cancel: CancellationToken,
}

/// Drives conversion runs against a backend.
#[derive(Debug, Clone)]
pub struct Orchestrator<B> {
    backend: B,
}

impl<B: ConversionBackend> Orchestrator<B> {
    /// Creates an orchestrator over `backend`.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Converts `items` and reports progress to `observer`.
    ///
    /// `items` is never modified; the report holds run-local copies with
    /// their final status.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoItems`] for an empty slice and
    /// [`ValidationError::MissingApiKey`] without a key. No request is sent in
    /// either case. Item failures do not fail the run; they are recorded in
    /// the report.
    #[instrument(skip_all, fields(items = items.len(), batch = options.use_batch))]
    pub async fn run<F>(
        &self,
        items: &[ConversionItem],
        api_key: Option<&ApiKey>,
        options: &RunOptions,
        mut observer: F,
    ) -> Result<RunReport, ConversionError>
    where
        F: FnMut(&RunEvent),
    {
        if items.is_empty() {
            return Err(ValidationError::NoItems.into());
        }
        let api_key = api_key.ok_or(ValidationError::MissingApiKey)?;

        let mut state = RunState::started(items.len());
        info!(total = items.len(), "conversion run started");
        observer(&RunEvent::Started { total: items.len() });
        observer(&RunEvent::Progress(0));

        let mut outcomes = if options.use_batch && items.len() > 1 {
            self.run_batched(items, api_key, options, &mut state, &mut observer)
                .await
        } else {
            self.run_sequential(items, api_key, options, &mut state, &mut observer)
                .await
        };
        let processed = outcomes.len();
        let skipped = items.len() - processed;
        outcomes.extend(items[processed..].iter().map(|item| Outcome {
            item: item.clone(),
            result: Err(ConversionError::Cancelled),
        }));

        state.current_item_name = None;
        state.status = if skipped > 0 {
            RunStatus::Cancelled
        } else if outcomes.iter().all(Outcome::is_success) {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };

        info!(
            status = %state.status,
            converted = outcomes.iter().filter(|o| o.is_success()).count(),
            skipped,
            total = items.len(),
            "conversion run finished"
        );
        observer(&RunEvent::Finished(state.clone()));

        Ok(RunReport { state, outcomes })
    }

    async fn run_sequential<F>(
        &self,
        items: &[ConversionItem],
        api_key: &ApiKey,
        options: &RunOptions,
        state: &mut RunState,
        observer: &mut F,
    ) -> Vec<Outcome>
    where
        F: FnMut(&RunEvent),
    {
        let mut outcomes = Vec::with_capacity(items.len());

        for original in items {
            if options.cancel.is_cancelled() {
                debug!(remaining = items.len() - outcomes.len(), "run cancelled between items");
                break;
            }

            let mut item = original.clone();
            item.mark_converting();
            state.current_item_name = Some(item.name.clone());
            observer(&RunEvent::ItemStarted {
                id: item.id,
                name: item.name.clone(),
            });

            // An item that has started always runs to completion.
            let result = self.backend.convert_item(&item, api_key).await;
            let outcome = finish_item(item, result, state);
            observer(&RunEvent::ItemFinished {
                id: outcome.item.id,
                success: outcome.is_success(),
                error: outcome.item.error.clone(),
            });
            outcomes.push(outcome);

            state.completed_count = outcomes.len();
            observer(&RunEvent::Progress(state.progress()));
        }

        outcomes
    }

    async fn run_batched<F>(
        &self,
        items: &[ConversionItem],
        api_key: &ApiKey,
        options: &RunOptions,
        state: &mut RunState,
        observer: &mut F,
    ) -> Vec<Outcome>
    where
        F: FnMut(&RunEvent),
    {
        let mut working: Vec<ConversionItem> = items.to_vec();
        for item in &mut working {
            item.mark_converting();
            observer(&RunEvent::ItemStarted {
                id: item.id,
                name: item.name.clone(),
            });
        }

        let batch = tokio::select! {
            biased;
            () = options.cancel.cancelled() => {
                debug!("run cancelled during batch request");
                return Vec::new();
            }
            batch = self.backend.convert_batch(&working, api_key) => batch,
        };

        let mut results: Vec<Option<Result<ConversionResult, ConversionError>>> = match batch {
            Ok(results) => results.into_iter().map(|r| Some(Ok(r))).collect(),
            Err(error) => {
                warn!(code = error.code(), error = %error, "batch request failed");
                working.iter().map(|_| Some(Err(error.clone()))).collect()
            }
        };
        results.resize_with(working.len(), || None);

        let outcomes: Vec<Outcome> = working
            .into_iter()
            .zip(results)
            .map(|(mut item, result)| {
                item.kind = ItemKind::BatchMember;
                let result = result.unwrap_or_else(|| {
                    Err(TransportError::unsuccessful(
                        Endpoint::ConvertBatch.to_string(),
                        200,
                        "batch response has no result for this item",
                        None,
                    )
                    .into())
                });
                let outcome = finish_item(item, result, state);
                observer(&RunEvent::ItemFinished {
                    id: outcome.item.id,
                    success: outcome.is_success(),
                    error: outcome.item.error.clone(),
                });
                outcome
            })
            .collect();

        state.completed_count = outcomes.len();
        observer(&RunEvent::Progress(state.progress()));
        outcomes
    }
}

fn finish_item(
    mut item: ConversionItem,
    result: Result<ConversionResult, ConversionError>,
    state: &mut RunState,
) -> Outcome {
    match &result {
        Ok(_) => {
            item.mark_completed();
            debug!(id = %item.id, name = %item.name, "item completed");
        }
        Err(error) => {
            let message = error.to_string();
            warn!(id = %item.id, name = %item.name, code = error.code(), error = %message, "item failed");
            item.mark_failed(message.clone());
            state.last_error = Some(message);
        }
    }
    Outcome { item, result }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::item::{ItemStatus, Normalizer, RawInput};

    struct EchoBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ConversionBackend for EchoBackend {
        async fn convert_item(
            &self,
            item: &ConversionItem,
            _api_key: &ApiKey,
        ) -> Result<ConversionResult, ConversionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ConversionResult::text(item.name.clone(), "# ok"))
        }

        async fn convert_batch(
            &self,
            items: &[ConversionItem],
            _api_key: &ApiKey,
        ) -> Result<Vec<ConversionResult>, ConversionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // One result short, to exercise the missing-result path.
            Ok(items
                .iter()
                .skip(1)
                .map(|item| ConversionResult::text(item.name.clone(), "# ok"))
                .collect())
        }
    }

    fn backend() -> EchoBackend {
        EchoBackend {
            calls: AtomicUsize::new(0),
        }
    }

    fn items(urls: &[&str]) -> Vec<ConversionItem> {
        let normalizer = Normalizer::default();
        urls.iter()
            .map(|url| normalizer.normalize(RawInput::url(*url)).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_empty_items_rejected_without_calls() {
        let orchestrator = Orchestrator::new(backend());
        let key = ApiKey::new("k").unwrap();
        let err = orchestrator
            .run(&[], Some(&key), &RunOptions::default(), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NO_ITEMS");
        assert_eq!(orchestrator.backend().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_key_rejected_without_calls() {
        let orchestrator = Orchestrator::new(backend());
        let err = orchestrator
            .run(&items(&["example.com"]), None, &RunOptions::default(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConversionError::Validation(ValidationError::MissingApiKey)
        ));
        assert_eq!(orchestrator.backend().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_caller_items_untouched() {
        let orchestrator = Orchestrator::new(backend());
        let key = ApiKey::new("k").unwrap();
        let input = items(&["example.com", "example.org"]);
        let before = input.clone();
        let report = orchestrator
            .run(&input, Some(&key), &RunOptions::default(), |_| {})
            .await
            .unwrap();
        assert_eq!(input, before);
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.item.status == ItemStatus::Completed));
        assert_eq!(report.state.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_single_item_never_batches() {
        let orchestrator = Orchestrator::new(backend());
        let key = ApiKey::new("k").unwrap();
        let options = RunOptions {
            use_batch: true,
            ..RunOptions::default()
        };
        let report = orchestrator
            .run(&items(&["example.com"]), Some(&key), &options, |_| {})
            .await
            .unwrap();
        assert!(report.outcomes[0].is_success());
        assert_ne!(report.outcomes[0].item.kind, ItemKind::BatchMember);
    }

    #[tokio::test]
    async fn test_batch_missing_result_fails_member() {
        let orchestrator = Orchestrator::new(backend());
        let key = ApiKey::new("k").unwrap();
        let options = RunOptions {
            use_batch: true,
            ..RunOptions::default()
        };
        let report = orchestrator
            .run(&items(&["example.com", "example.org"]), Some(&key), &options, |_| {})
            .await
            .unwrap();
        assert_eq!(orchestrator.backend().calls.load(Ordering::SeqCst), 1);
        assert!(report.outcomes[0].is_success());
        assert!(!report.outcomes[1].is_success());
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.item.kind == ItemKind::BatchMember));
        assert_eq!(report.state.status, RunStatus::Failed);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_skips_every_item() {
        let orchestrator = Orchestrator::new(backend());
        let key = ApiKey::new("k").unwrap();
        let options = RunOptions::default();
        options.cancel.cancel();
        let report = orchestrator
            .run(&items(&["example.com", "example.org"]), Some(&key), &options, |_| {})
            .await
            .unwrap();
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.outcomes.iter().all(Outcome::is_cancelled));
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.item.status == ItemStatus::Pending));
        assert_eq!(report.state.status, RunStatus::Cancelled);
        assert_eq!(report.state.completed_count, 0);
        assert_eq!(orchestrator.backend().calls.load(Ordering::SeqCst), 0);
    }

    /// Cancels the run from inside the first conversion, then finishes it.
    struct CancelInFlightBackend {
        cancel: CancellationToken,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ConversionBackend for CancelInFlightBackend {
        async fn convert_item(
            &self,
            item: &ConversionItem,
            _api_key: &ApiKey,
        ) -> Result<ConversionResult, ConversionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.cancel.cancel();
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok(ConversionResult::text(item.name.clone(), "# done"))
        }

        async fn convert_batch(
            &self,
            _items: &[ConversionItem],
            _api_key: &ApiKey,
        ) -> Result<Vec<ConversionResult>, ConversionError> {
            unreachable!("sequential run")
        }
    }

    #[tokio::test]
    async fn test_cancel_during_item_keeps_its_result() {
        let cancel = CancellationToken::new();
        let orchestrator = Orchestrator::new(CancelInFlightBackend {
            cancel: cancel.clone(),
            calls: AtomicUsize::new(0),
        });
        let key = ApiKey::new("k").unwrap();
        let options = RunOptions {
            use_batch: false,
            cancel,
        };
        let report = orchestrator
            .run(&items(&["example.com", "example.org"]), Some(&key), &options, |_| {})
            .await
            .unwrap();

        assert_eq!(orchestrator.backend().calls.load(Ordering::SeqCst), 1);
        assert!(report.outcomes[0].is_success());
        assert_eq!(report.outcomes[0].item.status, ItemStatus::Completed);
        assert!(report.outcomes[1].is_cancelled());
        assert_eq!(report.state.completed_count, 1);
        assert_eq!(report.state.status, RunStatus::Cancelled);
        assert_eq!(report.successful_results().len(), 1);
    }
}
