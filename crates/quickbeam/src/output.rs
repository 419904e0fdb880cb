//! Destinations for `print` output

use std::cell::RefCell;
use std::io::Write;

/// Receives the text of every `print` statement.
pub trait PrintSink {
    /// Called once per `print` with the printed value's textual form.
    fn write(&self, text: &str);
}

/// Writes each printed line to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl PrintSink for StdoutSink {
    fn write(&self, text: &str) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        // A closed stdout is not an evaluation error
        if writeln!(out, "{}", text).and_then(|_| out.flush()).is_err() {
            tracing::warn!("failed to write print output to stdout");
        }
    }
}

/// Records printed lines in memory.
///
/// # Example
///
/// ```
/// use quickbeam::{CaptureSink, PrintSink};
///
/// let sink = CaptureSink::new();
/// sink.write("hello");
/// assert_eq!(sink.lines(), vec!["hello".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct CaptureSink {
    lines: RefCell<Vec<String>>,
}

impl CaptureSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything printed so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Take everything printed so far, leaving the sink empty.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.borrow_mut())
    }

    /// Printed lines joined with `sep`.
    pub fn joined(&self, sep: &str) -> String {
        self.lines.borrow().join(sep)
    }
}

impl PrintSink for CaptureSink {
    fn write(&self, text: &str) {
        self.lines.borrow_mut().push(text.to_string());
    }
}
