//! Evaluation context configuration

use std::fmt;
use std::rc::Rc;

use crate::output::{PrintSink, StdoutSink};

/// Configuration for evaluation.
///
/// This is passed through all evaluation calls and controls the recursion
/// limit and where `print` output goes.
#[derive(Clone)]
pub struct EvalContext {
    /// Maximum call depth (stack overflow protection)
    pub max_call_depth: usize,

    /// Destination of `print` statements
    pub output: Rc<dyn PrintSink>,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            max_call_depth: 1000,
            output: Rc::new(StdoutSink),
        }
    }
}

impl fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("max_call_depth", &self.max_call_depth)
            .finish_non_exhaustive()
    }
}

impl EvalContext {
    /// Create a new context with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the call depth limit.
    pub fn with_max_call_depth(mut self, max_depth: usize) -> Self {
        self.max_call_depth = max_depth;
        self
    }

    /// Send `print` output to `sink`.
    pub fn with_output(mut self, sink: Rc<dyn PrintSink>) -> Self {
        self.output = sink;
        self
    }

    /// Hand printed text to the configured sink.
    pub fn print(&self, text: &str) {
        self.output.write(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::CaptureSink;

    #[test]
    fn test_default_depth() {
        assert_eq!(EvalContext::new().max_call_depth, 1000);
    }

    #[test]
    fn test_builders_chain() {
        let sink = Rc::new(CaptureSink::new());
        let ctx = EvalContext::new()
            .with_max_call_depth(7)
            .with_output(sink.clone());
        ctx.print("hi");
        assert_eq!(ctx.max_call_depth, 7);
        assert_eq!(sink.lines(), vec!["hi".to_string()]);
    }
}
