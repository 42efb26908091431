//! Convert command handler: build the working set, run it, write the archive.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result};
use note_converter_core::credentials::{API_KEY_ENV, open_key_store, resolve_api_key};
use note_converter_core::{
    ApiBackend, ApiClient, ApiKey, Normalizer, Orchestrator, RunOptions, RunReport, RunStatus,
    ValidationError, WorkingSet, pack_async,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::ProcessExit;
use crate::app::config_runtime::load_effective_config;
use crate::app::exit_handler::determine_exit_outcome;
use crate::app::inputs::collect_inputs;
use crate::app::progress::RunProgress;
use crate::app::terminal;
use crate::cli::ConvertArgs;

pub async fn run_convert_command(
    args: &ConvertArgs,
    config_path: Option<PathBuf>,
    quiet: bool,
) -> Result<ProcessExit> {
    if args.input_count() == 0 {
        return Err(ValidationError::NoItems.into());
    }

    let loaded = load_effective_config(config_path, Some(&args.service))?;
    let config = loaded.config;

    let inputs = collect_inputs(args, &config).await?;
    let mut working_set = WorkingSet::new(Normalizer::new(config.normalizer_config()));
    working_set.add_all(inputs)?;
    info!(items = working_set.len(), batch = args.batch, "working set ready");

    let store = open_key_store(config.key_storage).context("failed to open API key storage")?;
    if args.remember {
        let key = ApiKey::new(args.api_key.as_deref().unwrap_or_default())?;
        store.save(&key).context("failed to store API key")?;
        info!("API key stored for later runs");
    }
    let env_key = std::env::var(API_KEY_ENV).ok();
    let api_key = resolve_api_key(args.api_key.as_deref(), env_key.as_deref(), store.as_ref())
        .context("failed to read stored API key")?;

    let client =
        ApiClient::new(config.transport_config()).context("failed to build HTTP client")?;
    let orchestrator = Orchestrator::new(ApiBackend::new(client));

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling run");
            interrupt.cancel();
        }
    });

    let progress = RunProgress::new(terminal::should_use_progress_bar(
        io::stderr().is_terminal(),
        quiet,
        terminal::is_dumb_terminal(),
    ));
    let options = RunOptions {
        use_batch: args.batch,
        cancel,
    };
    let run = orchestrator
        .run(working_set.items(), api_key.as_ref(), &options, |event| {
            progress.observe(event);
        })
        .await;
    signal_task.abort();
    let report = run?;

    print_outcomes(&report);

    let converted = report.success_count();
    let not_converted = working_set.len() - converted;
    if converted == 0 {
        warn!("nothing converted, no archive written");
        return Ok(determine_exit_outcome(converted, not_converted));
    }

    let archive = pack_async(report.successful_results()).await?;
    tokio::fs::write(&args.output, &archive)
        .await
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    info!(
        path = %args.output.display(),
        notes = converted,
        bytes = archive.len(),
        "archive written"
    );
    println!("wrote {converted} note(s) to {}", args.output.display());

    Ok(determine_exit_outcome(converted, not_converted))
}

fn print_outcomes(report: &RunReport) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(_) => println!("converted {}", outcome.item.name),
            Err(_) if outcome.is_cancelled() => {}
            Err(err) => println!("failed    {}: [{}] {err}", outcome.item.name, err.code()),
        }
    }
    if report.state.status == RunStatus::Cancelled {
        println!("cancelled, {} item(s) not processed", report.skipped_count());
    }
}
