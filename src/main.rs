mod commands;
mod config;
mod context;
mod discovery;
mod error;
mod executor;
mod import;
mod naming;
mod output;
mod test_helpers;
mod traits;

use clap::{ArgAction, Parser};
use commands::ImportCommand;
use context::Context;
use error::ImportError;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tfstate-import")]
#[command(about = "Import existing AWS state-backend resources into Terraform state", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    import: ImportCommand,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = Context::new();
    install_interrupt_handler(&ctx);

    let result = cli.import.execute(&ctx);
    // Checked on Ok too: a Ctrl-C that hit the tool surfaces as an ordinary failure
    let interrupted = ctx.interrupted.load(Ordering::SeqCst)
        || matches!(
            result.as_ref().err().and_then(|e| e.downcast_ref::<ImportError>()),
            Some(ImportError::Interrupted { .. })
        );

    if interrupted {
        ctx.output.blank();
        ctx.output.error("Import process interrupted by user");
        return ExitCode::from(1);
    }

    match result {
        Ok(report) => {
            tracing::debug!(
                status = ?report.status,
                imported = report.imported(),
                failed = report.failed(),
                "run finished"
            );
            // Failed imports are reported above but do not change the exit code
            ExitCode::SUCCESS
        }
        Err(e) => {
            ctx.output.error(&format!("Error: {:#}", e));
            ExitCode::from(1)
        }
    }
}

/// Default level for our own events; `RUST_LOG` overrides it
fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_tracing(verbose: u8) {
    let level = level_for(verbose);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tfstate_import={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// First Ctrl-C lets the current import finish and stops the loop; a second one exits at once
fn install_interrupt_handler(ctx: &Context) {
    let interrupted = ctx.interrupted.clone();

    let result = ctrlc::set_handler(move || {
        if interrupted.swap(true, Ordering::SeqCst) {
            std::process::exit(1);
        }
    });

    if let Err(e) = result {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }
}
