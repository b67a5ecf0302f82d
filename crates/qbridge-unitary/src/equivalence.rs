//! Phase-free and exact comparison of unitaries.

use num_complex::Complex64;

use crate::matrix::{Matrix, dagger};

/// Default absolute tolerance for equivalence checks.
pub const DEFAULT_ATOL: f64 = 1e-7;

/// Return the global phase `λ` with `u1 ≈ λ·u2`, if there is one.
///
/// Computes `M = u1·u2†` and accepts when every off-diagonal entry of `M`
/// is within `atol` of zero and every diagonal entry is within `atol` of
/// the mean diagonal value.
pub fn global_phase_between(u1: &Matrix, u2: &Matrix, atol: f64) -> Option<Complex64> {
    if u1.dim() != u2.dim() || u1.nrows() != u1.ncols() || u1.nrows() == 0 {
        return None;
    }
    let m = u1.dot(&dagger(u2));
    let dim = m.nrows();
    let lambda = m.diag().sum() / dim as f64;
    if (lambda.norm() - 1.0).abs() > atol {
        return None;
    }
    for ((r, col), value) in m.indexed_iter() {
        let residual = if r == col { *value - lambda } else { *value };
        if residual.norm() > atol {
            return None;
        }
    }
    Some(lambda)
}

/// Compare two unitaries up to global phase.
pub fn equivalent(u1: &Matrix, u2: &Matrix, atol: f64) -> bool {
    global_phase_between(u1, u2, atol).is_some()
}

/// Compare two unitaries requiring the global phase to be 1.
pub fn equivalent_strict(u1: &Matrix, u2: &Matrix, atol: f64) -> bool {
    global_phase_between(u1, u2, atol).is_some_and(|lambda| (lambda - 1.0).norm() <= atol)
}

/// Entry-wise comparison.
pub fn allclose(a: &Matrix, b: &Matrix, atol: f64) -> bool {
    a.dim() == b.dim() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).norm() <= atol)
}
