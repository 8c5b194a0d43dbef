//! Fatal command
//!
//! Usage: faultline-probe fatal [--function <NAME>]

use clap::Args;
use faultline_core::capture::{ConditionKind, ProcessHost, RuntimeCondition};

#[derive(Debug, Args)]
pub struct FatalArgs {
    /// Identifier named in the fatal condition
    #[arg(long, default_value = "nonExistingFunctionForFatalTest")]
    pub function: String,
}

/// Report a fatal condition; the host exits with status 255
pub fn execute(host: &ProcessHost, args: FatalArgs) -> anyhow::Result<()> {
    let condition = RuntimeCondition::new(
        ConditionKind::Error,
        format!("Call to undefined function {}()", args.function),
        file!(),
        line!(),
    );
    host.report_condition(condition)?;
    Ok(())
}
