//! Uncaught command
//!
//! Usage: faultline-probe uncaught [--mode panic|error] [--message <TEXT>]

use clap::{Args, ValueEnum};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// `panic!` with the message
    Panic,
    /// Return an error (with an I/O cause) out of main
    Error,
}

#[derive(Debug, Args)]
pub struct UncaughtArgs {
    #[arg(long, value_enum, default_value_t = Mode::Panic)]
    pub mode: Mode,

    #[arg(long, default_value = "boom")]
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ProbeFailure {
    message: String,
    #[source]
    cause: io::Error,
}

pub fn execute(args: UncaughtArgs) -> anyhow::Result<()> {
    match args.mode {
        Mode::Panic => panic!("{}", args.message),
        Mode::Error => Err(ProbeFailure {
            message: args.message,
            cause: io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"),
        }
        .into()),
    }
}
