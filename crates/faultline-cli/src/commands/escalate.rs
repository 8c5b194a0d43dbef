//! Escalate command
//!
//! Usage: faultline-probe escalate [--kind <KIND>] [--only <KIND>...] [--suppress]

use clap::Args;
use faultline_core::capture::{
    ConditionKind, ConditionMask, ConditionOutcome, ProcessHost, RuntimeCondition,
};
use faultline_core::FaultCaptureRegistry;

#[derive(Debug, Args)]
pub struct EscalateArgs {
    /// Kind of the reported condition
    #[arg(long, default_value = "warning", value_parser = parse_kind)]
    pub kind: ConditionKind,

    #[arg(long, default_value = "Division by zero")]
    pub message: String,

    /// Restrict escalation to these kinds
    #[arg(long, value_parser = parse_kind)]
    pub only: Vec<ConditionKind>,

    /// Suppress condition reporting before reporting
    #[arg(long)]
    pub suppress: bool,
}

fn parse_kind(s: &str) -> Result<ConditionKind, String> {
    s.parse().map_err(|e: faultline_core::FaultlineError| e.to_string())
}

/// Prints `escalated: <message>` or `proceeded`
pub fn execute(
    host: &ProcessHost,
    registry: &FaultCaptureRegistry,
    args: EscalateArgs,
) -> anyhow::Result<()> {
    if !args.only.is_empty() {
        registry.enable_escalation(args.only.iter().copied().collect::<ConditionMask>());
    }
    host.set_reporting(!args.suppress);

    let condition = RuntimeCondition::new(args.kind, args.message, file!(), line!());
    match host.report_condition(condition) {
        Err(fault) => println!("escalated: {}", fault),
        Ok(ConditionOutcome::Proceed) => println!("proceeded"),
        Ok(ConditionOutcome::Handled) => println!("handled"),
    }
    Ok(())
}
