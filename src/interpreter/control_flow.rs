// File: src/interpreter/control_flow.rs
//
// Outcome of executing a single statement.
//
// Statement execution reports whether it produced a rendered result for the
// enclosing block, or hit a `return` that must unwind to the nearest call.

use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ControlFlow {
    /// Nothing to report, continue with the next statement
    None,
    /// Rendered value of an expression statement or a non-empty block
    ///
    /// `slot` is the length the result list had when the first of those
    /// values was produced; `print` output written later goes after it.
    Emit { text: String, slot: usize },
    /// `return` reached; carries the returned value (Void for a bare return)
    Return(Value),
}
