//! Adapters from Rust failure shapes into [`Fault`]

use super::{Fault, StackFrame};
use crate::record::DEFAULT_MAX_CHAIN_DEPTH;
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::panic::{Location, PanicHookInfo};

/// Kind name given to faults built from a panic
pub const PANIC_KIND: &str = "Panic";

/// Kind name used when a source error's type cannot be recovered
const GENERIC_ERROR_KIND: &str = "Error";

const PANIC_MACHINERY_PREFIXES: [&str; 2] = ["std::panicking::", "core::panicking::"];

impl Fault {
    /// Adapt an error and its `source()` chain, keeping at most
    /// [`DEFAULT_MAX_CHAIN_DEPTH`] sources
    ///
    /// The head takes the caller's location as origin. Sources carry no
    /// location and get a best-effort kind name taken from their `Debug` form.
    #[track_caller]
    pub fn from_error<E: Error + ?Sized + 'static>(err: &E) -> Fault {
        Self::from_error_with_depth(err, DEFAULT_MAX_CHAIN_DEPTH)
    }

    /// Like [`Fault::from_error`], keeping at most `max_depth` sources
    ///
    /// When the chain is longer, the last kept fault is marked with
    /// [`Fault::is_chain_truncated`].
    #[track_caller]
    pub fn from_error_with_depth<E: Error + ?Sized + 'static>(
        err: &E,
        max_depth: usize,
    ) -> Fault {
        let caller = Location::caller();
        let head_kind = match std::any::type_name::<E>() {
            name if name.starts_with("dyn ") => debug_kind(err),
            name => name.to_string(),
        };

        let mut chain = std::iter::successors(err.source(), |e| (*e).source());
        let mut sources: Vec<Fault> = chain
            .by_ref()
            .take(max_depth)
            .map(|source| Fault::new(debug_kind(source), source.to_string()))
            .collect();
        let cut = chain.next().is_some();

        let head = Fault::new(head_kind, err.to_string()).with_origin(caller.file(), caller.line());
        if cut {
            match sources.pop() {
                Some(last) => sources.push(last.with_chain_truncated()),
                None => return head.with_chain_truncated(),
            }
        }

        let mut previous: Option<Fault> = None;
        while let Some(fault) = sources.pop() {
            previous = Some(match previous {
                Some(prev) => fault.with_previous(prev),
                None => fault,
            });
        }

        match previous {
            Some(prev) => head.with_previous(prev),
            None => head,
        }
    }

    /// Adapt a panic as seen by a panic hook
    pub fn from_panic(info: &PanicHookInfo<'_>, backtrace: &Backtrace) -> Fault {
        let mut fault = Fault::new(PANIC_KIND, panic_message(info.payload()));
        if let Some(location) = info.location() {
            fault = fault.with_origin(location.file(), location.line());
        }
        if backtrace.status() == BacktraceStatus::Captured {
            fault = fault.with_frames(frames_below_panic(parse_backtrace(&backtrace.to_string())));
        }
        fault
    }
}

/// Drop the leading frames that belong to the capture and panic machinery
///
/// The first frame kept is the one directly below the topmost contiguous run
/// of `std::panicking`/`core::panicking` frames. Frames are returned unchanged
/// when no such run exists.
pub fn frames_below_panic(mut frames: Vec<StackFrame>) -> Vec<StackFrame> {
    let start = match frames.iter().position(is_panic_machinery) {
        Some(start) => start,
        None => return frames,
    };
    let end = frames[start..]
        .iter()
        .position(|frame| !is_panic_machinery(frame))
        .map_or(frames.len(), |offset| start + offset);
    frames.drain(..end);
    frames
}

fn is_panic_machinery(frame: &StackFrame) -> bool {
    let path = match (&frame.owning_type, &frame.function) {
        (Some(owner), Some(function)) => format!("{}::{}", owner, function),
        (None, Some(function)) => function.clone(),
        (Some(owner), None) => owner.clone(),
        (None, None) => return false,
    };
    PANIC_MACHINERY_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
        || path.ends_with("rust_begin_unwind")
        || path.ends_with("__rust_end_short_backtrace")
}

/// Text carried by a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

fn debug_kind<E: Error + ?Sized>(err: &E) -> String {
    let debug = format!("{:?}", err);
    let name: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    match name.chars().next() {
        Some(c) if c.is_uppercase() => name,
        _ => GENERIC_ERROR_KIND.to_string(),
    }
}

/// Parse the display form of a captured `std::backtrace::Backtrace`
///
/// Frame lines look like `  3: crate::module::function` and are optionally
/// followed by `at path/to/file.rs:LINE:COL`. Unrecognised lines are skipped.
pub fn parse_backtrace(text: &str) -> Vec<StackFrame> {
    let mut frames: Vec<StackFrame> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(location) = trimmed.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                let (file, line) = split_location(location);
                frame.file = Some(file.to_string());
                frame.line = line;
            }
            continue;
        }
        if let Some((index, symbol)) = trimmed.split_once(": ") {
            if !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()) {
                frames.push(frame_from_symbol(symbol));
            }
        }
    }
    frames
}

fn split_location(location: &str) -> (&str, Option<u32>) {
    let mut parts = location.rsplitn(3, ':');
    let col = parts.next();
    let line = parts.next();
    let file = parts.next();
    match (file, line, col) {
        (Some(file), Some(line), Some(_)) => match line.parse() {
            Ok(line) => (file, Some(line)),
            Err(_) => (location, None),
        },
        _ => (location, None),
    }
}

fn frame_from_symbol(symbol: &str) -> StackFrame {
    let symbol = strip_hash_suffix(symbol.trim());
    match last_path_separator(symbol) {
        Some(idx) => StackFrame::new()
            .with_owning_type(&symbol[..idx])
            .with_call_kind("::")
            .with_function(&symbol[idx + 2..]),
        None => StackFrame::new().with_function(symbol),
    }
}

fn strip_hash_suffix(symbol: &str) -> &str {
    match symbol.rsplit_once("::") {
        Some((head, tail))
            if tail.len() == 17
                && tail.starts_with('h')
                && tail[1..].chars().all(|c| c.is_ascii_hexdigit()) =>
        {
            head
        }
        _ => symbol,
    }
}

/// Byte index of the last `::` outside generic brackets
fn last_path_separator(symbol: &str) -> Option<usize> {
    let bytes = symbol.as_bytes();
    let mut depth = 0usize;
    let mut last = None;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                last = Some(i);
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Outer {
        inner: Inner,
    }

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("request failed")
        }
    }

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection reset")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.inner)
        }
    }

    impl Error for Inner {}

    #[test]
    fn test_from_error_walks_source_chain() {
        let err = Outer { inner: Inner };
        let fault = Fault::from_error(&err);

        assert!(fault.kind().ends_with("Outer"));
        assert_eq!(fault.message(), "request failed");
        assert!(fault.origin().file.ends_with("adapt.rs"));
        assert_eq!(fault.chain_depth(), 1);

        let prev = fault.previous().unwrap();
        assert_eq!(prev.kind(), "Inner");
        assert_eq!(prev.message(), "connection reset");
    }

    #[test]
    fn test_from_dyn_error_uses_debug_name() {
        let err: Box<dyn Error> = Box::new(Inner);
        let fault = Fault::from_error(err.as_ref());
        assert_eq!(fault.kind(), "Inner");
    }

    #[test]
    fn test_panic_message_payloads() {
        let s: Box<dyn Any + Send> = Box::new("static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(17u8);
        assert_eq!(panic_message(s.as_ref()), "static");
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(other.as_ref()), "Box<dyn Any>");
    }

    #[test]
    fn test_parse_backtrace_frames() {
        let text = "   0: std::backtrace::Backtrace::force_capture
             at /rustc/abc/library/std/src/backtrace.rs:312:13
   1: probe::jobs::Runner::run::{{closure}}
             at ./src/jobs.rs:40:9
   2: <alloc::boxed::Box<F,A> as core::ops::function::Fn<Args>>::call::h0123456789abcdef
   3: main
";
        let frames = parse_backtrace(text);
        assert_eq!(frames.len(), 4);

        assert_eq!(frames[0].owning_type.as_deref(), Some("std::backtrace::Backtrace"));
        assert_eq!(frames[0].function.as_deref(), Some("force_capture"));
        assert_eq!(frames[0].line, Some(312));

        assert_eq!(frames[1].file.as_deref(), Some("./src/jobs.rs"));
        assert_eq!(frames[1].display_function(), "{closure}");

        assert_eq!(
            frames[2].owning_type.as_deref(),
            Some("<alloc::boxed::Box<F,A> as core::ops::function::Fn<Args>>")
        );
        assert_eq!(frames[2].function.as_deref(), Some("call"));
        assert!(frames[2].file.is_none());

        assert!(frames[3].owning_type.is_none());
        assert_eq!(frames[3].function.as_deref(), Some("main"));
    }

    #[test]
    fn test_frames_below_panic_skip_hook_and_machinery() {
        let text = "   0: std::backtrace::Backtrace::force_capture
   1: faultline_core::capture::process_host::ProcessHost::observe_panic
             at ./src/capture/process_host.rs:179:17
   2: std::panicking::rust_panic_with_hook
   3: std::panicking::begin_panic_handler::{{closure}}
   4: std::sys::backtrace::__rust_end_short_backtrace
   5: rust_begin_unwind
   6: core::panicking::panic_fmt
   7: app::jobs::run
             at ./src/jobs.rs:12:5
   8: std::panicking::try
   9: main
";
        let frames = frames_below_panic(parse_backtrace(text));
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].function.as_deref(), Some("run"));
        assert_eq!(frames[0].file.as_deref(), Some("./src/jobs.rs"));
        assert_eq!(frames[1].function.as_deref(), Some("try"));
    }

    #[test]
    fn test_frames_below_panic_without_machinery_are_kept() {
        let frames = parse_backtrace("   0: app::run\n   1: main\n");
        assert_eq!(frames_below_panic(frames.clone()), frames);
    }

    #[test]
    fn test_from_error_with_zero_depth_marks_head() {
        let fault = Fault::from_error_with_depth(&Outer { inner: Inner }, 0);
        assert_eq!(fault.chain_depth(), 0);
        assert!(fault.is_chain_truncated());
    }

    #[test]
    fn test_split_location_without_column() {
        assert_eq!(split_location("weird-location"), ("weird-location", None));
        assert_eq!(split_location("src/a.rs:10:2"), ("src/a.rs", Some(10)));
    }
}
