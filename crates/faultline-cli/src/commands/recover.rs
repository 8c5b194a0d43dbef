//! Recover command
//!
//! Usage: faultline-probe recover [--on-thread] [--message <TEXT>]

use clap::Args;
use std::{panic, thread};

#[derive(Debug, Args)]
pub struct RecoverArgs {
    /// Panic on a worker thread and observe it through the join handle
    #[arg(long)]
    pub on_thread: bool,

    #[arg(long, default_value = "handled locally")]
    pub message: String,
}

/// Panic where the panic is caught, then continue
pub fn execute(args: RecoverArgs) -> anyhow::Result<()> {
    let message = args.message;
    let recovered = if args.on_thread {
        thread::spawn(move || panic!("{}", message)).join().is_err()
    } else {
        panic::catch_unwind(move || panic!("{}", message)).is_err()
    };

    if recovered {
        println!("recovered; continuing");
    }
    Ok(())
}
