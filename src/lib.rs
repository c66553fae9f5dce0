// src/lib.rs

//! `qureg` - dense state-vector simulation of small qubit registers
//!
//! This library maintains the full complex amplitude vector of an n-qubit
//! register and applies single-qubit unitaries, controlled operations,
//! swaps, the quantum Fourier transform, measurement with stochastic
//! collapse and reset, with an optional operation trace for external
//! tooling.

pub mod core;
pub mod operations;
pub mod qft;
pub mod register;
pub mod validation;

// Re-export the most common types for easier top-level use
pub use core::{AmplitudeTensor, BitOrder, Config, QftBackend, QuregError, SystemId};
pub use operations::{Operation, SingleQubitGate};
pub use qft::QftEngine;
pub use register::{Qubit, QubitGroup, QubitRegister, TraceEntry};

// Example 1: Bell state
// Demonstrates preparing an entangled pair with a Hadamard and a CNOT and
// reading the flattened amplitudes back.
/// ```
/// use qureg::{QubitRegister, operations};
///
/// let mut register = QubitRegister::new(2).unwrap();
/// let q0 = register.qubit(0).unwrap();
/// let q1 = register.qubit(1).unwrap();
///
/// register.apply_gate(&operations::h(), q0).unwrap();
/// register.cnot(q0, q1).unwrap();
///
/// // (1/√2)(|00⟩ + |11⟩)
/// let amplitudes = register.amplitudes();
/// let expected = std::f64::consts::FRAC_1_SQRT_2;
/// assert!((amplitudes[0].norm() - expected).abs() < 1e-9);
/// assert!((amplitudes[3].norm() - expected).abs() < 1e-9);
/// assert!(amplitudes[1].norm() < 1e-9);
/// assert!(amplitudes[2].norm() < 1e-9);
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item

// Example 2: Measurement consistency and scoped tracing
// Demonstrates that a measured qubit keeps its outcome on immediate
// re-measurement, and that tracing can be enabled for one scope only.
/// ```
/// use qureg::{QubitRegister, operations};
///
/// let mut register = QubitRegister::seeded(1, 42).unwrap();
/// let q0 = register.qubit(0).unwrap();
///
/// register
///     .scoped_config(
///         |config| config.tracing = true,
///         |register| {
///             register.apply_gate(&operations::h(), q0)?;
///             let first = register.measure(q0)?;
///             let second = register.measure(q0)?;
///             assert_eq!(first, second);
///             Ok(())
///         },
///     )
///     .unwrap();
///
/// // Tracing was restored to its default (off), but the entries remain.
/// assert!(!register.config().tracing);
/// let names: Vec<&str> = register.trace().iter().map(|e| e.operation.as_str()).collect();
/// assert_eq!(names, vec!["H", "MEASURE", "MEASURE"]);
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item
