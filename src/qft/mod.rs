// src/qft/mod.rs

//! The quantum Fourier transform over a qubit group.
//!
//! Two interchangeable implementations sit behind [`QftEngine`], selected
//! by [`QftBackend`](crate::core::config::QftBackend): a gate-level form
//! built from Hadamards and controlled phase rotations (traceable step by
//! step, honours active controls) and a transform-level form that runs a
//! discrete Fourier transform directly over the group's axes (faster,
//! always exact, inner steps invisible to the trace). Both agree within
//! floating tolerance for every setting of the trailing bit-reversal
//! swap.
//!
//! The phase-rotation gates `R_k = diag(1, e^{iπ/2^(k-1)})` are built on
//! demand and cached per `k` inside the engine instance; there is no
//! shared mutable gate table.

use std::collections::HashMap;
use std::f64::consts::PI;

use num_complex::Complex;
use num_traits::Zero;
use rustfft::FftPlanner;

use crate::core::config::QftBackend;
use crate::core::error::QuregError;
use crate::operations::{self, Operation, SingleQubitGate};
use crate::register::{Qubit, QubitGroup, QubitRegister};

/// Applies forward and inverse quantum Fourier transforms to qubit
/// groups, caching its rotation gates across calls.
#[derive(Debug, Default)]
pub struct QftEngine {
    rotations: HashMap<u32, SingleQubitGate>,
    inverse_rotations: HashMap<u32, SingleQubitGate>,
}

impl QftEngine {
    /// Creates an engine with empty rotation caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the QFT to the group, front qubit treated as the most
    /// significant.
    pub fn forward(
        &mut self,
        register: &mut QubitRegister,
        group: &QubitGroup,
    ) -> Result<(), QuregError> {
        self.run(register, group, false, None)
    }

    /// Applies the inverse QFT to the group.
    pub fn inverse(
        &mut self,
        register: &mut QubitRegister,
        group: &QubitGroup,
    ) -> Result<(), QuregError> {
        self.run(register, group, true, None)
    }

    /// The `m`-term truncated QFT: phase rotations are only applied
    /// between qubits at most `m - 1` positions apart. Always gate-level;
    /// `m` must lie in `[1, group.len()]`.
    pub fn forward_approximate(
        &mut self,
        register: &mut QubitRegister,
        group: &QubitGroup,
        m: usize,
    ) -> Result<(), QuregError> {
        self.run(register, group, false, Some(m))
    }

    /// The `m`-term truncated inverse QFT.
    pub fn inverse_approximate(
        &mut self,
        register: &mut QubitRegister,
        group: &QubitGroup,
        m: usize,
    ) -> Result<(), QuregError> {
        self.run(register, group, true, Some(m))
    }

    fn run(
        &mut self,
        register: &mut QubitRegister,
        group: &QubitGroup,
        inverse: bool,
        span: Option<usize>,
    ) -> Result<(), QuregError> {
        register.validate_group(group, true, true)?;
        if group.is_empty() {
            return Ok(());
        }
        let k = group.len();
        if let Some(m) = span {
            if m < 1 || m > k {
                return Err(QuregError::ConfigurationRange {
                    message: format!("QFT truncation parameter {} outside [1, {}]", m, k),
                });
            }
        }
        let qubits: Vec<Qubit> = group.iter().collect();
        let targets = group.indexes().to_vec();
        let name = if inverse { "IQFT" } else { "QFT" };
        register.traced(name, &[], &targets, |inner| {
            if k == 1 {
                // The FFT of a 2-element axis is a Hadamard; skip the
                // transform setup and apply it directly.
                return inner.apply_gate(&operations::h(), qubits[0]);
            }
            // The numeric path transforms the whole tensor and cannot be
            // restricted to the controls-all-one hyperplane.
            let use_gates = span.is_some()
                || inner.config().qft_backend == QftBackend::Gates
                || inner.has_controls();
            if use_gates {
                let m = span.unwrap_or(k);
                if inverse {
                    self.gate_inverse(inner, &qubits, m)
                } else {
                    self.gate_forward(inner, &qubits, m)
                }
            } else {
                self.transform_path(inner, &targets, &qubits, inverse)
            }
        })
    }

    // --- Gate-level implementation ---

    fn rotation(&mut self, k: u32) -> SingleQubitGate {
        self.rotations
            .entry(k)
            .or_insert_with(|| {
                operations::r1(PI / (1u64 << (k - 1)) as f64).with_name(&format!("R_{}", k))
            })
            .clone()
    }

    fn inverse_rotation(&mut self, k: u32) -> SingleQubitGate {
        self.inverse_rotations
            .entry(k)
            .or_insert_with(|| {
                operations::r1(-PI / (1u64 << (k - 1)) as f64).with_name(&format!("iR_{}", k))
            })
            .clone()
    }

    fn gate_forward(
        &mut self,
        register: &mut QubitRegister,
        qubits: &[Qubit],
        span: usize,
    ) -> Result<(), QuregError> {
        let k = qubits.len();
        for i in 0..k {
            register.apply_gate(&operations::h(), qubits[i])?;
            for j in (i + 1)..k {
                let distance = j - i;
                if distance > span - 1 {
                    break;
                }
                let rotation = self.rotation((distance + 1) as u32);
                register.controlled(
                    &Operation::Gate(rotation),
                    &qubits[j].as_group(),
                    &qubits[i].as_group(),
                )?;
            }
        }
        if register.config().qft_swap {
            bit_reversal(register, qubits)?;
        }
        Ok(())
    }

    fn gate_inverse(
        &mut self,
        register: &mut QubitRegister,
        qubits: &[Qubit],
        span: usize,
    ) -> Result<(), QuregError> {
        let k = qubits.len();
        if register.config().qft_swap {
            bit_reversal(register, qubits)?;
        }
        // Walk the forward circuit backwards: reversed qubit order,
        // conjugated rotations before each Hadamard.
        let reversed: Vec<Qubit> = qubits.iter().rev().copied().collect();
        for i in 0..k {
            for j in 0..i {
                let distance = i - j;
                if distance <= span - 1 {
                    let rotation = self.inverse_rotation((distance + 1) as u32);
                    register.controlled(
                        &Operation::Gate(rotation),
                        &reversed[j].as_group(),
                        &reversed[i].as_group(),
                    )?;
                }
            }
            register.apply_gate(&operations::h(), reversed[i])?;
        }
        Ok(())
    }

    // --- Transform-level implementation ---

    fn transform_path(
        &mut self,
        register: &mut QubitRegister,
        indexes: &[usize],
        qubits: &[Qubit],
        inverse: bool,
    ) -> Result<(), QuregError> {
        // The numeric transform always produces the standard bit order,
        // equivalent to the gate circuit with its trailing swaps. With the
        // swaps configured off, reverse the group to match the gate-level
        // output (forward) or input (inverse).
        if inverse && !register.config().qft_swap {
            bit_reversal(register, qubits)?;
        }
        fourier(register, indexes, inverse);
        if !inverse && !register.config().qft_swap {
            bit_reversal(register, qubits)?;
        }
        if register.config().auto_normalize {
            register.normalize();
        }
        Ok(())
    }
}

fn bit_reversal(register: &mut QubitRegister, qubits: &[Qubit]) -> Result<(), QuregError> {
    let k = qubits.len();
    for idx in 0..k / 2 {
        register.swap(qubits[idx], qubits[k - 1 - idx])?;
    }
    Ok(())
}

/// Runs a DFT along the group's axes: the tensor is transposed so the
/// group forms one leading axis of extent `2^k`, each column is
/// transformed, and the transposition is undone.
///
/// The QFT is the inverse DFT scaled by `2^(k/2)`, its inverse the
/// forward DFT scaled by `2^(-k/2)`; against rustfft's unnormalized
/// transforms both reduce to a `2^(-k/2)` factor.
fn fourier(register: &mut QubitRegister, indexes: &[usize], inverse: bool) {
    let n = register.num_qubits();
    let physical: Vec<usize> = indexes.iter().map(|&q| register.axis_of(q)).collect();
    let mut order = physical.clone();
    order.extend((0..n).filter(|axis| !physical.contains(axis)));
    let mut restore = vec![0usize; n];
    for (new_axis, &old_axis) in order.iter().enumerate() {
        restore[old_axis] = new_axis;
    }

    let tensor = register.tensor_mut();
    *tensor = tensor.permuted(&order);

    let lead = 1usize << indexes.len();
    let rest = tensor.dim() / lead;
    let mut planner = FftPlanner::new();
    let fft = if inverse {
        planner.plan_fft_forward(lead)
    } else {
        planner.plan_fft_inverse(lead)
    };
    let scale = 1.0 / (lead as f64).sqrt();
    let mut buffer = vec![Complex::zero(); lead];
    let amps = tensor.amplitudes_mut();
    for tail in 0..rest {
        for (j, slot) in buffer.iter_mut().enumerate() {
            *slot = amps[j * rest + tail];
        }
        fft.process(&mut buffer);
        for (j, value) in buffer.iter().enumerate() {
            amps[j * rest + tail] = *value * scale;
        }
    }

    *tensor = tensor.permuted(&restore);
}
