// src/core/tensor.rs

//! Dense amplitude storage for an n-qubit register.
//!
//! The state vector is held as a flat `Vec<Complex<f64>>` of length `2^n`,
//! addressed as a conceptual rank-n tensor with one axis of extent 2 per
//! qubit. Axis 0 is the most significant bit of the flat index (row-major
//! layout), so the bit position of axis `a` is `n - 1 - a`. All slice and
//! kernel operations below are expressed in that bit arithmetic.

use num_complex::Complex;
use num_traits::Zero;

use super::config::BitOrder;
use super::constants::near_zero;
use super::error::QuregError;

/// The rank-n complex amplitude tensor of a qubit register.
///
/// Read access is public; every mutation goes through the register so that
/// validation, tracing and normalization policy stay in one place.
#[derive(Debug, Clone, PartialEq)] // Avoid Eq for floating-point complex numbers
pub struct AmplitudeTensor {
    amps: Vec<Complex<f64>>,
    rank: usize,
}

impl AmplitudeTensor {
    /// Creates the all-zero basis state `|0...0⟩` over `rank` qubits.
    pub(crate) fn new(rank: usize) -> Result<Self, QuregError> {
        let dim = 1usize.checked_shl(rank as u32).ok_or_else(|| {
            QuregError::ConfigurationRange {
                message: format!(
                    "cannot address the state vector of {} qubits on this platform", rank
                ),
            }
        })?;
        let mut amps = vec![Complex::zero(); dim];
        amps[0] = Complex::new(1.0, 0.0);
        Ok(Self { amps, rank })
    }

    /// Number of axes (qubits) of the tensor.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of amplitudes, `2^rank`.
    pub fn dim(&self) -> usize {
        self.amps.len()
    }

    /// Read-only access to the raw amplitudes in physical (axis) order.
    pub fn amplitudes(&self) -> &[Complex<f64>] {
        &self.amps
    }

    /// Mutable access for the engine modules.
    pub(crate) fn amplitudes_mut(&mut self) -> &mut [Complex<f64>] {
        &mut self.amps
    }

    /// `sum(|amplitude|^2)` over the whole tensor.
    pub fn norm_sqr(&self) -> f64 {
        self.amps.iter().map(|c| c.norm_sqr()).sum()
    }

    /// Divides every amplitude by the square root of the total squared
    /// magnitude, restoring unit norm.
    pub(crate) fn normalize(&mut self) {
        let total = self.norm_sqr();
        if total > 0.0 {
            let inv = 1.0 / total.sqrt();
            for amp in &mut self.amps {
                *amp *= inv;
            }
        }
    }

    /// Probability mass outside the `|0...0⟩` basis state.
    pub(crate) fn residual_off_zero(&self) -> f64 {
        self.norm_sqr() - self.amps[0].norm_sqr()
    }

    fn bit_position(&self, axis: usize) -> usize {
        debug_assert!(axis < self.rank);
        self.rank - 1 - axis
    }

    /// `sum(|amplitude|^2)` over the slice where `axis` holds `bit`.
    pub(crate) fn slice_norm_sqr(&self, axis: usize, bit: usize) -> f64 {
        let pos = self.bit_position(axis);
        self.amps
            .iter()
            .enumerate()
            .filter(|(i, _)| (i >> pos) & 1 == bit)
            .map(|(_, c)| c.norm_sqr())
            .sum()
    }

    /// Probabilities of the two values of `axis`, unnormalized.
    pub(crate) fn axis_probabilities(&self, axis: usize) -> (f64, f64) {
        let pos = self.bit_position(axis);
        let mut p0 = 0.0;
        let mut p1 = 0.0;
        for (i, amp) in self.amps.iter().enumerate() {
            if (i >> pos) & 1 == 0 {
                p0 += amp.norm_sqr();
            } else {
                p1 += amp.norm_sqr();
            }
        }
        (p0, p1)
    }

    /// Zeroes the slice where `axis` holds `bit`.
    pub(crate) fn zero_slice(&mut self, axis: usize, bit: usize) {
        let pos = self.bit_position(axis);
        for (i, amp) in self.amps.iter_mut().enumerate() {
            if (i >> pos) & 1 == bit {
                *amp = Complex::zero();
            }
        }
    }

    /// Multiplies the slice where `axis` holds `bit` by a real factor.
    pub(crate) fn scale_slice(&mut self, axis: usize, bit: usize, factor: f64) {
        let pos = self.bit_position(axis);
        for (i, amp) in self.amps.iter_mut().enumerate() {
            if (i >> pos) & 1 == bit {
                *amp *= factor;
            }
        }
    }

    /// Copies the `axis == from_bit` slice onto the `axis == to_bit` slice.
    /// This is a move of amplitude data, not a measurement.
    pub(crate) fn copy_slice(&mut self, axis: usize, from_bit: usize, to_bit: usize) {
        let pos = self.bit_position(axis);
        let flip = 1usize << pos;
        for i in 0..self.amps.len() {
            if (i >> pos) & 1 == to_bit {
                let src = if from_bit == to_bit { i } else { i ^ flip };
                self.amps[i] = self.amps[src];
            }
        }
    }

    /// Exchanges two axes by swapping amplitude data in place.
    pub(crate) fn swap_axes(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let pa = self.bit_position(a);
        let pb = self.bit_position(b);
        for i in 0..self.amps.len() {
            if (i >> pa) & 1 == 1 && (i >> pb) & 1 == 0 {
                let j = i ^ (1usize << pa) ^ (1usize << pb);
                self.amps.swap(i, j);
            }
        }
    }

    /// Returns the tensor transposed so that new axis `a` holds what old
    /// axis `qubit_of_axis[a]` held, the flat-storage equivalent of an
    /// ndarray `transpose(qubit_of_axis)`.
    pub(crate) fn permuted(&self, qubit_of_axis: &[usize]) -> Self {
        debug_assert_eq!(qubit_of_axis.len(), self.rank);
        let n = self.rank;
        let mut out = vec![Complex::zero(); self.amps.len()];
        for (i, &amp) in self.amps.iter().enumerate() {
            let mut dest = 0usize;
            for (new_axis, &old_axis) in qubit_of_axis.iter().enumerate() {
                let bit = (i >> (n - 1 - old_axis)) & 1;
                dest |= bit << (n - 1 - new_axis);
            }
            out[dest] = amp;
        }
        Self { amps: out, rank: n }
    }

    /// Applies a 2×2 matrix to `axis`, restricted to the hyperplane where
    /// the `trailing_controls` last axes all hold 1.
    ///
    /// Both old slices are read before either new slice is written, since
    /// each output depends on both inputs.
    pub(crate) fn apply_single_qubit(
        &mut self,
        axis: usize,
        trailing_controls: usize,
        m: &[[Complex<f64>; 2]; 2],
    ) {
        let n = self.rank;
        let c = trailing_controls;
        let t_pos = self.bit_position(axis);
        // The target axis always sits before the control block.
        debug_assert!(t_pos >= c);
        let ctl_mask = (1usize << c) - 1;
        let low_mask = (1usize << (t_pos - c)) - 1;
        let free_bits = n - 1 - c;
        for f in 0..(1usize << free_bits) {
            let low = f & low_mask;
            let high = f >> (t_pos - c);
            let i0 = (high << (t_pos + 1)) | (low << c) | ctl_mask;
            let i1 = i0 | (1usize << t_pos);
            let a0 = self.amps[i0];
            let a1 = self.amps[i1];
            self.amps[i0] = m[0][0] * a0 + m[0][1] * a1;
            self.amps[i1] = m[1][0] * a0 + m[1][1] * a1;
        }
    }

    /// Appends `extra` trailing axes, each starting in `|0⟩`.
    pub(crate) fn grow(&mut self, extra: usize) -> Result<(), QuregError> {
        let new_rank = self.rank + extra;
        let new_dim = 1usize.checked_shl(new_rank as u32).ok_or_else(|| {
            QuregError::ConfigurationRange {
                message: format!(
                    "cannot address the state vector of {} qubits on this platform", new_rank
                ),
            }
        })?;
        let mut out = vec![Complex::zero(); new_dim];
        for (i, &amp) in self.amps.iter().enumerate() {
            out[i << extra] = amp;
        }
        self.amps = out;
        self.rank = new_rank;
        Ok(())
    }

    /// Removes the `drop` trailing axes.
    ///
    /// With `verify` set, first scans for probability mass outside the
    /// sub-block where every dropped axis holds `|0⟩` and fails with
    /// [`QuregError::UnreleasedState`] before touching the tensor. Without
    /// it the scan is skipped and the caller vouches for the state.
    pub(crate) fn shrink(&mut self, drop: usize, verify: bool) -> Result<(), QuregError> {
        debug_assert!(drop <= self.rank);
        let mask = (1usize << drop) - 1;
        if verify {
            let leaked: f64 = self
                .amps
                .iter()
                .enumerate()
                .filter(|(i, _)| i & mask != 0)
                .map(|(_, c)| c.norm_sqr())
                .sum();
            if !near_zero(leaked) {
                return Err(QuregError::UnreleasedState {
                    message: format!(
                        "trailing qubits hold probability mass {:.3e} outside |0⟩", leaked
                    ),
                });
            }
        }
        let new_dim = self.amps.len() >> drop;
        let mut out = vec![Complex::zero(); new_dim];
        for (j, slot) in out.iter_mut().enumerate() {
            *slot = self.amps[j << drop];
        }
        self.amps = out;
        self.rank -= drop;
        Ok(())
    }

    /// The amplitudes as a `2^n`-length column in logical qubit order.
    ///
    /// `axis_of_qubit` undoes any active control transposition; `order`
    /// selects which end of the qubit list is the most significant bit of
    /// the output index. Only the enumeration order changes, never the
    /// stored data.
    pub(crate) fn flattened(
        &self,
        axis_of_qubit: &[usize],
        order: BitOrder,
    ) -> Vec<Complex<f64>> {
        let n = self.rank;
        let mut out = vec![Complex::zero(); self.amps.len()];
        for (i, &amp) in self.amps.iter().enumerate() {
            let mut logical = 0usize;
            for (qubit, &axis) in axis_of_qubit.iter().enumerate() {
                let bit = (i >> (n - 1 - axis)) & 1;
                let shift = match order {
                    BitOrder::MostSignificantFirst => n - 1 - qubit,
                    BitOrder::LeastSignificantFirst => qubit,
                };
                logical |= bit << shift;
            }
            out[logical] = amp;
        }
        out
    }
}
