// src/core/config.rs

//! Behavior switches for a qubit register.
//!
//! Every register owns a [`Config`]; there is no process-wide mutable
//! options object. Temporary overrides are expressed with
//! [`QubitRegister::scoped_config`](crate::register::QubitRegister::scoped_config),
//! which restores the previous configuration on every exit path.

/// Bit-significance convention for the flattened amplitude readout.
///
/// This controls only the enumeration order of
/// [`QubitRegister::amplitudes`](crate::register::QubitRegister::amplitudes),
/// never the underlying storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    /// Qubit 0 is the most significant bit of the flattened index.
    MostSignificantFirst,
    /// Qubit 0 is the least significant bit of the flattened index.
    LeastSignificantFirst,
}

/// Which implementation backs the quantum Fourier transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QftBackend {
    /// Hadamard and controlled phase-rotation gates. Traceable; honours
    /// active control qubits.
    Gates,
    /// A direct discrete Fourier transform over the group's axes. Faster
    /// and always exact, but the inner steps bypass tracing.
    Transform,
}

/// Per-register behavior switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Renormalize the whole tensor after each gate application,
    /// compensating accumulated floating error. Disabling trades accuracy
    /// for throughput.
    pub auto_normalize: bool,
    /// Record an operation trace entry for each trackable operation.
    pub tracing: bool,
    /// Bit-significance convention for flattened readout.
    pub bit_order: BitOrder,
    /// QFT implementation selection.
    pub qft_backend: QftBackend,
    /// Whether the QFT ends with the bit-reversal swap cascade. Callers
    /// composing the QFT into a larger circuit that already accounts for
    /// qubit order turn this off.
    pub qft_swap: bool,
    /// Validate distinctness and cross-register use of operands before
    /// composite operations.
    pub strict_checks: bool,
    /// Scan for probability mass outside the canonical |0⟩ sub-tensor when
    /// qubits are removed or the register is released. The scan is the
    /// dominant cost of scope exit for large registers; disabling it trades
    /// a correctness guard for throughput.
    pub check_release: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_normalize: true,
            tracing: false,
            bit_order: BitOrder::MostSignificantFirst,
            qft_backend: QftBackend::Transform,
            qft_swap: true,
            strict_checks: true,
            check_release: true,
        }
    }
}
