//! Human-readable rendering of faults for last-resort diagnostics

pub mod fault_render;

pub use fault_render::{render_fault, write_fault, PREVIOUS_INTRO};
