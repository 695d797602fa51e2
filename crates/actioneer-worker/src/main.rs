// Entry point for the `actioneer` command-line driver.
//
// Resolves the workflow document, loads engine settings, runs the workflow
// and maps the outcome to the process exit code (0 success, 1 failure).

use actioneer_common::SettingsStore;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use actioneer_worker::{Workflow, WorkflowRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "actioneer", version, about = "Run a workflow of built-in actions")]
struct Args {
    /// Workflow file, or a name under .actioneer/workflows/.
    workflow: PathBuf,

    /// Engine settings file (JSON). Defaults to .actioneer/settings.json when present.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Diagnostic log format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Enable debug diagnostics.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.log_format, args.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to build Tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let exit_code = runtime.block_on(async move {
        match run(args).await {
            Ok(()) => 0,
            Err(e) => {
                tracing::error!("{:#}", e);
                eprintln!("Error: {:#}", e);
                1
            }
        }
    });

    std::process::exit(exit_code);
}

fn init_tracing(format: LogFormat, verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Diagnostics go to stderr; stdout carries action output.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(args: Args) -> Result<()> {
    let settings = SettingsStore::new(args.settings.clone())
        .load()
        .context("Failed to load engine settings")?;

    let path = Workflow::resolve_default_path(&args.workflow);
    let workflow = Workflow::load(&path)?;
    tracing::info!(
        workflow = %path.display(),
        name = workflow.name.as_deref().unwrap_or_default(),
        "Loaded workflow"
    );

    let cancel = CancellationToken::new();
    install_signal_handlers(cancel.clone());

    let runner = WorkflowRunner::new(settings).with_cancellation(cancel);
    runner
        .run_workflow(&workflow)
        .await
        .with_context(|| format!("Workflow '{}' failed", path.display()))
}

/// Cancel the run on Ctrl-C (and SIGTERM on unix). Running subprocesses are
/// interrupted and the current step fails.
fn install_signal_handlers(cancel: CancellationToken) {
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl-C received, cancelling workflow");
                on_ctrl_c.cancel();
            }
            Err(e) => tracing::warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    #[cfg(unix)]
    {
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                    tracing::info!("SIGTERM received, cancelling workflow");
                    cancel.cancel();
                }
                Err(e) => tracing::warn!("Failed to listen for SIGTERM: {}", e),
            }
        });
    }
}
