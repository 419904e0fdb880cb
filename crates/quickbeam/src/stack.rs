//! Stack growth for deep recursion in the parser, resolver and evaluator

/// Grow the stack when less than this much remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if it is close to exhausted.
///
/// Recursive entry points (expression parsing, resolution and every
/// interpreted call) go through this so that the configured call-depth
/// limit is hit before the host stack overflows.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
