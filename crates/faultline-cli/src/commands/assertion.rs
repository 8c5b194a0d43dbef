//! Assertion command
//!
//! Usage: faultline-probe assertion [--left <N>] [--right <N>]

use clap::Args;
use std::panic;

#[derive(Debug, Args)]
pub struct AssertionArgs {
    /// Left operand of the failing `assert_eq!`
    #[arg(long, default_value_t = 1)]
    pub left: i64,

    /// Right operand of the failing `assert_eq!`
    #[arg(long, default_value_t = 2)]
    pub right: i64,
}

/// Fail `assert_eq!(left, right)` inside `catch_unwind`, then continue
pub fn execute(args: AssertionArgs) -> anyhow::Result<()> {
    let outcome = panic::catch_unwind(|| {
        assert_eq!(args.left, args.right);
    });
    match outcome {
        Ok(()) => println!("assertion held"),
        Err(_) => println!("assertion failed; continuing"),
    }
    Ok(())
}
