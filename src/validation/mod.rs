// src/validation/mod.rs

//! Structural checks on amplitude vectors.

use num_complex::Complex;

use crate::core::constants::qureg_constants::NORM_TOLERANCE;
use crate::core::error::QuregError;

/// `sum(|amplitude|^2)` over a raw amplitude slice.
pub fn norm_sqr(amplitudes: &[Complex<f64>]) -> f64 {
    amplitudes.iter().map(|c| c.norm_sqr()).sum()
}

/// Checks that the amplitude vector is normalized
/// (`sum(|amplitude|^2) ≈ 1`).
///
/// # Arguments
/// * `amplitudes` - The amplitude vector to check.
/// * `tolerance` - Allowed deviation from 1.0; defaults to
///   [`NORM_TOLERANCE`].
pub fn check_normalization(
    amplitudes: &[Complex<f64>],
    tolerance: Option<f64>,
) -> Result<(), QuregError> {
    let effective_tolerance = tolerance.unwrap_or(NORM_TOLERANCE);
    let total = norm_sqr(amplitudes);
    if (total - 1.0).abs() > effective_tolerance {
        Err(QuregError::StateInvalid {
            message: format!(
                "state vector normalization failed: sum(|c_i|^2) = {} (deviation > {})",
                total, effective_tolerance
            ),
        })
    } else {
        Ok(())
    }
}

/// Checks that an amplitude vector has the dimension of a qubit register:
/// exactly `2^rank` entries, one axis of extent 2 per qubit.
pub fn check_dimension(amplitudes: &[Complex<f64>], rank: usize) -> Result<(), QuregError> {
    let expected = 1usize.checked_shl(rank as u32);
    if expected != Some(amplitudes.len()) {
        return Err(QuregError::StateInvalid {
            message: format!(
                "amplitude vector of length {} does not hold {} qubit axes of extent 2",
                amplitudes.len(),
                rank
            ),
        });
    }
    Ok(())
}

/// Whether two amplitude vectors agree component-wise within `tolerance`.
pub fn states_approx_equal(
    left: &[Complex<f64>],
    right: &[Complex<f64>],
    tolerance: f64,
) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right.iter())
            .all(|(a, b)| (a - b).norm_sqr() < tolerance * tolerance)
}
