//! Faultline probe
//!
//! Wires a capture registry to the real process host, then deliberately
//! triggers one pathway so its logging and exit behavior can be observed
//! from outside the process.

use anyhow::Context;
use clap::{Parser, Subcommand};
use faultline_core::capture::{FaultCaptureRegistry, ProcessHost};
use faultline_core::logging_facility::{init, Profile};
use faultline_core::sink::StreamSink;
use faultline_core::CaptureConfig;
use std::path::PathBuf;
use std::sync::Arc;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "faultline-probe")]
#[command(about = "Trigger fault capture pathways", long_about = None)]
struct Cli {
    /// JSON-lines file every pathway logs to
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    /// TOML capture configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Human-readable debug logging of the capture machinery on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fail an assertion, then carry on
    Assertion(commands::assertion::AssertionArgs),
    /// Let a fault escape main
    Uncaught(commands::uncaught::UncaughtArgs),
    /// Panic, recover locally, then carry on
    Recover(commands::recover::RecoverArgs),
    /// Report a fatal runtime condition
    Fatal(commands::fatal::FatalArgs),
    /// Report a non-fatal runtime condition through the escalation pathway
    Escalate(commands::escalate::EscalateArgs),
}

fn main() {
    let cli = Cli::parse();
    init(if cli.verbose {
        Profile::Development
    } else {
        Profile::Production
    });

    let host = ProcessHost::global();
    let _exit = host.exit_guard();

    let registry = match build_registry(&host, &cli) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            host.exit(2);
        }
    };

    let result = host.run(|| match cli.command {
        Commands::Assertion(args) => commands::assertion::execute(args),
        Commands::Uncaught(args) => commands::uncaught::execute(args),
        Commands::Recover(args) => commands::recover::execute(args),
        Commands::Fatal(args) => commands::fatal::execute(&host, args),
        Commands::Escalate(args) => commands::escalate::execute(&host, &registry, args),
    });

    if let Err(e) = result {
        let err: &(dyn std::error::Error + 'static) = e.as_ref();
        host.report_uncaught(err);
    }
}

fn build_registry(host: &Arc<ProcessHost>, cli: &Cli) -> anyhow::Result<FaultCaptureRegistry> {
    let config = match &cli.config {
        Some(path) => CaptureConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CaptureConfig::default(),
    };
    let assertion_severity = config.assertion_severity;
    let escalation_mask = config.escalation_mask();
    let registry = FaultCaptureRegistry::with_config(host.clone(), config);

    if let Some(path) = &cli.log {
        let sink = Arc::new(
            StreamSink::append(path).with_context(|| format!("opening {}", path.display()))?,
        );
        registry.register_assertion_sink(sink.clone(), assertion_severity);
        registry.register_fatal_sink(sink.clone());
        registry.register_uncaught_sink(sink);
    }
    registry.enable_escalation(escalation_mask);
    Ok(registry)
}
