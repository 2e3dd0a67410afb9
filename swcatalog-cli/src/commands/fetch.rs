//! Fetch command - resolve the installer and replicate it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use swcatalog::context::RunContext;
use swcatalog::events::{drain_events, event_channel, DEFAULT_POLL_INTERVAL};
use swcatalog::install::CommandInstall;
use swcatalog::orchestrator::{spawn_worker, RunError};
use swcatalog::ErrorKind;
use tracing::{info, warn};

use super::common::RunArgs;
use crate::error::CliError;
use crate::runner::CliRunner;
use crate::ui::ConsoleSink;

/// Arguments for the fetch command.
pub struct FetchArgs {
    pub run: RunArgs,
    pub installer_only: bool,
    pub system_installer: bool,
    pub wait: bool,
    pub install_command: Vec<String>,
}

/// Run the fetch command.
pub fn run(runner: &CliRunner, args: FetchArgs) -> Result<(), CliError> {
    runner.log_startup("fetch");

    let mut config = args.run.apply(runner.run_config());
    if args.installer_only {
        config = config.with_installer_only(true);
    }
    let error_grace = config.error_grace;

    let mut orchestrator = runner.orchestrator(&config)?;
    let command = if !args.install_command.is_empty() {
        Some(CommandInstall::new(args.install_command))
    } else if args.system_installer {
        Some(CommandInstall::system_installer())
    } else {
        None
    };
    if let Some(command) = command {
        orchestrator =
            orchestrator.with_install_step(Arc::new(command.with_completion_signal(args.wait)));
    }

    println!("swcatalog v{}", swcatalog::VERSION);
    println!("Working directory: {}", config.workdir.display());
    if let Some(ref mirror) = config.mirror {
        println!("Mirror:            {}", mirror);
    }
    println!();

    // Ctrl+C and SIGTERM clear the running flag; the worker stops at the
    // next phase boundary, or finishes the completion wait.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let (sender, receiver) = event_channel();
    let ctx = RunContext::new(config, sender).with_running_flag(running);

    let handle = spawn_worker(ctx, orchestrator)
        .map_err(|e| CliError::Worker(format!("failed to start worker: {}", e)))?;

    let mut sink = ConsoleSink::new();
    drain_events(&receiver, &mut sink, DEFAULT_POLL_INTERVAL);

    let result = handle
        .join()
        .map_err(|_| CliError::Worker("worker thread panicked".to_string()))?;

    match result {
        Ok(outcome) => {
            sink.finish();
            println!();
            println!("Product:  {} ({})", outcome.label, outcome.product_id);
            println!("Files:    {}", outcome.report.replicated.len());
            if outcome.refetched {
                println!("Note:     some files had to be downloaded twice");
            }
            info!(product = %outcome.product_id, "Fetch complete");
            Ok(())
        }
        Err(e) => {
            sink.abandon();
            if e.kind() != ErrorKind::Cancelled {
                wait_error_grace(&e, error_grace);
            }
            Err(e.into())
        }
    }
}

/// Leave a fatal error on screen before exiting.
fn wait_error_grace(error: &RunError, grace: std::time::Duration) {
    if grace.is_zero() {
        return;
    }
    warn!(kind = %error.kind(), grace_secs = grace.as_secs(), "Exiting after error");
    thread::sleep(grace);
}
