//! Fault renderer
//!
//! Produces the multi-line dump written to the diagnostic stream when a fault
//! escapes every handler:
//!
//! ```text
//! Fatal error: Uncaught: [Panic] boom
//! #0  src/main.rs:12
//!     app::jobs::Runner::run(int, array2)
//! #1  unknown:0
//!
//! Previous: [Io] disk full
//! ```
//!
//! Rendering never fails: absent frame fields fall back to placeholders. At
//! most `max_depth` predecessors are rendered; a longer chain, or one already
//! cut when the fault was adapted, ends with `Previous: [truncated]`.

use crate::fault::{Fault, UNKNOWN_FILE};
use std::io::{self, Write};

/// Intro used for every predecessor in the causal chain
pub const PREVIOUS_INTRO: &str = "Previous: ";

/// Render `fault` and up to `max_depth` of its predecessors
pub fn render_fault(fault: &Fault, intro: &str, max_depth: usize) -> String {
    let mut out = String::new();
    render_into(&mut out, fault, intro, 0, max_depth);
    out
}

/// Render `fault` into `writer`
///
/// # Errors
///
/// Returns the writer's I/O error, if any.
pub fn write_fault(
    fault: &Fault,
    intro: &str,
    max_depth: usize,
    writer: &mut dyn Write,
) -> io::Result<()> {
    writer.write_all(render_fault(fault, intro, max_depth).as_bytes())?;
    writer.flush()
}

fn render_into(out: &mut String, fault: &Fault, intro: &str, depth: usize, max_depth: usize) {
    out.push_str(&format!("{}[{}] {}\n", intro, fault.kind(), fault.message()));

    for (idx, frame) in fault.trace().iter().enumerate() {
        out.push_str(&format!(
            "#{:<3}{}:{}\n",
            idx,
            frame.file.as_deref().unwrap_or(UNKNOWN_FILE),
            frame.line.unwrap_or(0)
        ));
        if let Some(signature) = frame.call_signature() {
            out.push_str(&format!("    {}\n", signature));
        }
    }

    match fault.previous() {
        Some(previous) if depth < max_depth => {
            out.push('\n');
            render_into(out, previous, PREVIOUS_INTRO, depth + 1, max_depth);
        }
        Some(_) => push_truncated(out),
        None if fault.is_chain_truncated() => push_truncated(out),
        None => {}
    }
}

fn push_truncated(out: &mut String) {
    out.push('\n');
    out.push_str(PREVIOUS_INTRO);
    out.push_str("[truncated]\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{FrameArg, StackFrame};
    use crate::record::DEFAULT_MAX_CHAIN_DEPTH;

    #[test]
    fn test_header_and_frames() {
        let fault = Fault::new("Panic", "boom")
            .with_frame(
                StackFrame::at("src/main.rs", 12)
                    .with_owning_type("app::jobs::Runner")
                    .with_call_kind("::")
                    .with_function("run")
                    .with_args(vec![
                        FrameArg::Int(1),
                        FrameArg::Array(vec![FrameArg::Null, FrameArg::Null]),
                    ]),
            )
            .with_frame(StackFrame::new());

        let text = render_fault(&fault, "Fatal error: Uncaught: ", DEFAULT_MAX_CHAIN_DEPTH);
        assert_eq!(
            text,
            "Fatal error: Uncaught: [Panic] boom\n\
             #0  src/main.rs:12\n\
             \x20   app::jobs::Runner::run(int, array2)\n\
             #1  unknown:0\n"
        );
    }

    #[test]
    fn test_previous_chain_separated_by_blank_line() {
        let fault = Fault::new("Store", "write failed")
            .with_previous(Fault::new("Io", "disk full"));
        let text = render_fault(&fault, "", DEFAULT_MAX_CHAIN_DEPTH);
        assert_eq!(text, "[Store] write failed\n\nPrevious: [Io] disk full\n");
    }

    #[test]
    fn test_wide_index_is_not_padded_away() {
        let frames = (0..12).map(|i| StackFrame::at("f.rs", i)).collect();
        let fault = Fault::new("E", "m").with_frames(frames);
        let text = render_fault(&fault, "", DEFAULT_MAX_CHAIN_DEPTH);
        assert!(text.contains("#9  f.rs:9\n"));
        assert!(text.contains("#11 f.rs:11\n"));
    }

    #[test]
    fn test_chain_rendering_is_bounded() {
        let mut fault = Fault::new("E", "root");
        for i in 0..(DEFAULT_MAX_CHAIN_DEPTH + 10) {
            fault = Fault::new("E", i.to_string()).with_previous(fault);
        }
        let text = render_fault(&fault, "", DEFAULT_MAX_CHAIN_DEPTH);
        assert!(text.ends_with("Previous: [truncated]\n"));
        assert!(!text.contains("root"));

        let deeper = render_fault(&fault, "", DEFAULT_MAX_CHAIN_DEPTH + 20);
        assert!(deeper.ends_with("Previous: [E] root\n"));
        assert!(!deeper.contains("[truncated]"));
    }

    #[test]
    fn test_adapter_cut_is_rendered_as_truncated() {
        let fault =
            Fault::new("E", "head").with_previous(Fault::new("E", "kept").with_chain_truncated());
        assert_eq!(
            render_fault(&fault, "", 10),
            "[E] head\n\nPrevious: [E] kept\n\nPrevious: [truncated]\n"
        );
    }

    #[test]
    fn test_write_fault_to_buffer() {
        let mut buf = Vec::new();
        write_fault(&Fault::new("E", "m"), "> ", DEFAULT_MAX_CHAIN_DEPTH, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "> [E] m\n");
    }
}
