// src/operations/mod.rs

//! Single-qubit gates and the operations applied to registers.
//!
//! A [`SingleQubitGate`] is a checked 2×2 unitary with a name (for the
//! operation trace) and a controllability flag. Multi-qubit operations
//! with their own names (SWAP, CNOT, CCNOT) are covered together with
//! single-qubit gates by the [`Operation`] sum type, which is what
//! controlled execution dispatches on.

use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;

use num_complex::Complex;
use num_traits::Zero;

use crate::core::constants::near_zero;
use crate::core::error::QuregError;
use crate::register::{QubitGroup, QubitRegister};

/// A 2×2 unitary gate on one qubit.
///
/// Unitarity is checked once at construction, never at application time.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleQubitGate {
    matrix: [[Complex<f64>; 2]; 2],
    name: String,
    controllable: bool,
    trackable: bool,
}

impl SingleQubitGate {
    /// Builds a gate from matrix entries `[[a, b], [c, d]]`, verifying
    /// unitarity within tolerance.
    pub fn new(
        a: Complex<f64>,
        b: Complex<f64>,
        c: Complex<f64>,
        d: Complex<f64>,
        name: &str,
    ) -> Result<Self, QuregError> {
        if !Self::check_unitary(a, b, c, d) {
            return Err(QuregError::NotUnitary {
                message: format!("matrix entries for '{}' do not form a unitary gate", name),
            });
        }
        Ok(Self::raw([[a, b], [c, d]], name))
    }

    /// Constructs without the unitarity check. Reserved for the built-in
    /// gates and for products of already-checked gates.
    fn raw(matrix: [[Complex<f64>; 2]; 2], name: &str) -> Self {
        Self {
            matrix,
            name: name.to_string(),
            controllable: true,
            trackable: true,
        }
    }

    /// Whether four entries form a unitary 2×2 matrix within tolerance:
    /// rows and columns orthogonal, all row/column norms 1.
    pub fn check_unitary(
        a: Complex<f64>,
        b: Complex<f64>,
        c: Complex<f64>,
        d: Complex<f64>,
    ) -> bool {
        let abs_a = a.norm_sqr();
        let abs_b = b.norm_sqr();
        let abs_c = c.norm_sqr();
        let abs_d = d.norm_sqr();
        near_zero((a * c.conj() + b * d.conj()).norm())
            && near_zero((a * b.conj() + c * d.conj()).norm())
            && near_zero(abs_a + abs_b - 1.0)
            && near_zero(abs_a + abs_c - 1.0)
            && near_zero(abs_d + abs_b - 1.0)
            && near_zero(abs_d + abs_c - 1.0)
    }

    /// The gate matrix.
    pub fn matrix(&self) -> &[[Complex<f64>; 2]; 2] {
        &self.matrix
    }

    /// Name recorded in the operation trace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the gate may run under active control qubits.
    pub fn is_controllable(&self) -> bool {
        self.controllable
    }

    /// Whether applications of this gate are recorded in the trace.
    pub fn is_trackable(&self) -> bool {
        self.trackable
    }

    /// The same gate under a different trace name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Marks whether the gate supports a controlled form. Gates are
    /// controllable by default; user-defined operations whose controlled
    /// form would differ physically can opt out.
    pub fn with_controllable(mut self, controllable: bool) -> Self {
        self.controllable = controllable;
        self
    }

    /// The matrix product `self · right`: applying the result equals
    /// applying `right` first, then `self`.
    pub fn compose(&self, right: &Self) -> Self {
        let mut matrix = [[Complex::zero(); 2]; 2];
        for (row, out_row) in matrix.iter_mut().enumerate() {
            for (col, slot) in out_row.iter_mut().enumerate() {
                *slot = self.matrix[row][0] * right.matrix[0][col]
                    + self.matrix[row][1] * right.matrix[1][col];
            }
        }
        Self::raw(matrix, &format!("{}·{}", self.name, right.name))
    }

    /// The conjugate transpose, which for a unitary is the inverse.
    pub fn adjoint(&self) -> Self {
        let m = &self.matrix;
        Self::raw(
            [[m[0][0].conj(), m[1][0].conj()], [m[0][1].conj(), m[1][1].conj()]],
            &format!("{}^-1", self.name),
        )
    }

    /// The gate multiplied by a global phase factor of unit magnitude.
    pub fn phased(&self, factor: Complex<f64>) -> Result<Self, QuregError> {
        if !near_zero(factor.norm() - 1.0) {
            return Err(QuregError::NotUnitary {
                message: format!(
                    "global phase factor must have magnitude 1, got {}",
                    factor.norm()
                ),
            });
        }
        let m = &self.matrix;
        let mut gate = Self::raw(
            [[m[0][0] * factor, m[0][1] * factor], [m[1][0] * factor, m[1][1] * factor]],
            &self.name,
        );
        gate.controllable = self.controllable;
        gate.trackable = self.trackable;
        Ok(gate)
    }
}

impl fmt::Display for SingleQubitGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Gate", self.name)
    }
}

// --- Built-in gates ---

fn re(x: f64) -> Complex<f64> {
    Complex::new(x, 0.0)
}

/// The identity gate. Applications are not traced.
pub fn i() -> SingleQubitGate {
    let mut gate = SingleQubitGate::raw([[re(1.0), re(0.0)], [re(0.0), re(1.0)]], "I");
    gate.trackable = false;
    gate
}

/// The Hadamard gate.
pub fn h() -> SingleQubitGate {
    let r = re(FRAC_1_SQRT_2);
    SingleQubitGate::raw([[r, r], [r, -r]], "H")
}

/// The Pauli X (bit-flip) gate.
pub fn x() -> SingleQubitGate {
    SingleQubitGate::raw([[re(0.0), re(1.0)], [re(1.0), re(0.0)]], "X")
}

/// The Pauli Y gate.
pub fn y() -> SingleQubitGate {
    SingleQubitGate::raw(
        [[Complex::zero(), -Complex::i()], [Complex::i(), Complex::zero()]],
        "Y",
    )
}

/// The Pauli Z (phase-flip) gate.
pub fn z() -> SingleQubitGate {
    SingleQubitGate::raw([[re(1.0), re(0.0)], [re(0.0), re(-1.0)]], "Z")
}

/// The S gate, `diag(1, i)`.
pub fn s() -> SingleQubitGate {
    SingleQubitGate::raw([[re(1.0), re(0.0)], [re(0.0), Complex::i()]], "S")
}

/// The inverse S gate, `diag(1, -i)`.
pub fn s_adj() -> SingleQubitGate {
    SingleQubitGate::raw([[re(1.0), re(0.0)], [re(0.0), -Complex::i()]], "S^-1")
}

/// The T gate, `diag(1, e^{iπ/4})`.
pub fn t() -> SingleQubitGate {
    SingleQubitGate::raw(
        [[re(1.0), re(0.0)], [re(0.0), Complex::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2)]],
        "T",
    )
}

/// The inverse T gate, `diag(1, e^{-iπ/4})`.
pub fn t_adj() -> SingleQubitGate {
    SingleQubitGate::raw(
        [[re(1.0), re(0.0)], [re(0.0), Complex::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2)]],
        "T^-1",
    )
}

/// Rotation about the X axis by `theta`.
pub fn rx(theta: f64) -> SingleQubitGate {
    let a = re((theta / 2.0).cos());
    let b = -Complex::i() * (theta / 2.0).sin();
    SingleQubitGate::raw([[a, b], [b, a]], &format!("Rx({:.4})", theta))
}

/// Rotation about the Y axis by `theta`.
pub fn ry(theta: f64) -> SingleQubitGate {
    let a = (theta / 2.0).cos();
    let b = (theta / 2.0).sin();
    SingleQubitGate::raw(
        [[re(a), re(-b)], [re(b), re(a)]],
        &format!("Ry({:.4})", theta),
    )
}

/// Rotation about the Z axis by `theta`,
/// `diag(e^{-iθ/2}, e^{+iθ/2})`.
pub fn rz(theta: f64) -> SingleQubitGate {
    SingleQubitGate::raw(
        [
            [Complex::from_polar(1.0, -theta / 2.0), re(0.0)],
            [re(0.0), Complex::from_polar(1.0, theta / 2.0)],
        ],
        &format!("Rz({:.4})", theta),
    )
}

/// Phase rotation of the `|1⟩` component, `diag(1, e^{iθ})`.
pub fn r1(theta: f64) -> SingleQubitGate {
    SingleQubitGate::raw(
        [[re(1.0), re(0.0)], [re(0.0), Complex::from_polar(1.0, theta)]],
        &format!("R1({:.4})", theta),
    )
}

/// Global phase, `diag(e^{iθ}, e^{iθ})`.
pub fn phase(theta: f64) -> SingleQubitGate {
    let factor = Complex::from_polar(1.0, theta);
    SingleQubitGate::raw([[factor, re(0.0)], [re(0.0), factor]], &format!("Ph({:.4})", theta))
}

// --- Tagged operations ---

/// An operation applicable to a register: either a single-qubit gate
/// applied to each target, or a named multi-qubit operation.
///
/// Every variant carries a name and a controllability flag, and is
/// invoked through [`Operation::invoke`]; controlled execution dispatches
/// on this sum type. The QFT is deliberately absent: it does not support
/// a controlled form and runs through
/// [`QftEngine`](crate::qft::QftEngine) instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// A 2×2 unitary, applied to each target qubit in group order.
    Gate(SingleQubitGate),
    /// Exchange of two qubits.
    Swap,
    /// Controlled NOT: first target controls, second is flipped.
    Cnot,
    /// Toffoli: first two targets control, third is flipped.
    Ccnot,
}

impl Operation {
    /// Name recorded in the operation trace.
    pub fn name(&self) -> &str {
        match self {
            Operation::Gate(gate) => gate.name(),
            Operation::Swap => "SWAP",
            Operation::Cnot => "CNOT",
            Operation::Ccnot => "CCNOT",
        }
    }

    /// Whether the operation may run under active control qubits.
    pub fn is_controllable(&self) -> bool {
        match self {
            Operation::Gate(gate) => gate.is_controllable(),
            Operation::Swap | Operation::Cnot | Operation::Ccnot => true,
        }
    }

    /// Applies the operation to the given targets.
    pub fn invoke(
        &self,
        register: &mut QubitRegister,
        targets: &QubitGroup,
    ) -> Result<(), QuregError> {
        match self {
            Operation::Gate(gate) => {
                for qubit in targets.iter() {
                    register.apply_gate(gate, qubit)?;
                }
                Ok(())
            }
            Operation::Swap => {
                expect_arity("SWAP", targets, 2)?;
                register.swap(targets.get(0)?, targets.get(1)?)
            }
            Operation::Cnot => {
                expect_arity("CNOT", targets, 2)?;
                register.cnot(targets.get(0)?, targets.get(1)?)
            }
            Operation::Ccnot => {
                expect_arity("CCNOT", targets, 3)?;
                register.ccnot(targets.get(0)?, targets.get(1)?, targets.get(2)?)
            }
        }
    }
}

fn expect_arity(name: &str, targets: &QubitGroup, expected: usize) -> Result<(), QuregError> {
    if targets.len() != expected {
        return Err(QuregError::OperationArity {
            name: name.to_string(),
            expected,
            found: targets.len(),
        });
    }
    Ok(())
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn assert_matrices_close(a: &SingleQubitGate, b: &SingleQubitGate) {
        for row in 0..2 {
            for col in 0..2 {
                let diff = a.matrix()[row][col] - b.matrix()[row][col];
                assert!(
                    diff.norm() < 1e-10,
                    "matrix mismatch at ({}, {}): {} vs {}",
                    row,
                    col,
                    a.matrix()[row][col],
                    b.matrix()[row][col]
                );
            }
        }
    }

    #[test]
    fn builtins_are_unitary() {
        for gate in [i(), h(), x(), y(), z(), s(), s_adj(), t(), t_adj()] {
            let m = gate.matrix();
            assert!(
                SingleQubitGate::check_unitary(m[0][0], m[0][1], m[1][0], m[1][1]),
                "{} failed the unitarity check",
                gate.name()
            );
        }
    }

    #[test]
    fn rotations_are_unitary_for_sampled_angles() {
        for step in 0..8 {
            let theta = 2.0 * PI * (step as f64) / 8.0;
            for gate in [rx(theta), ry(theta), rz(theta), r1(theta), phase(theta)] {
                let m = gate.matrix();
                assert!(SingleQubitGate::check_unitary(m[0][0], m[0][1], m[1][0], m[1][1]));
            }
        }
    }

    #[test]
    fn non_unitary_matrix_is_rejected() {
        let one = Complex::new(1.0, 0.0);
        let result = SingleQubitGate::new(one, one, one, one, "bad");
        assert!(matches!(result, Err(QuregError::NotUnitary { .. })));
    }

    #[test]
    fn z_t_t_s_composes_to_identity() {
        let product = z().compose(&t()).compose(&t()).compose(&s());
        assert_matrices_close(&product, &i());
    }

    #[test]
    fn z_x_z_is_minus_x() {
        let conjugated = z().compose(&x()).compose(&z());
        let minus_x = x().phased(Complex::new(-1.0, 0.0)).unwrap();
        assert_matrices_close(&conjugated, &minus_x);
    }

    #[test]
    fn adjoint_inverts_s() {
        assert_matrices_close(&s().adjoint(), &s_adj());
    }

    #[test]
    fn phased_rejects_non_unit_factor() {
        let result = x().phased(Complex::new(2.0, 0.0));
        assert!(matches!(result, Err(QuregError::NotUnitary { .. })));
    }
}
