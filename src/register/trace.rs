// src/register/trace.rs

//! The optional operation trace.

use std::fmt;

/// One recorded operation: which qubits controlled it, which it acted on,
/// and its name. Entries are append-only and consumed by external tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// Indices of the qubits controlling the operation (usually empty).
    pub controls: Vec<usize>,
    /// Indices of the qubits the operation acted on.
    pub targets: Vec<usize>,
    /// Name of the operation, as reported by the operation itself.
    pub operation: String,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.controls.is_empty() {
            write!(f, "{} -> {:?}", self.operation, self.targets)
        } else {
            write!(f, "{} -> {:?} ctl {:?}", self.operation, self.targets, self.controls)
        }
    }
}
