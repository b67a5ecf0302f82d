//! Dense complex matrices and the algebra the oracle needs.

use ndarray::Array2;
use num_complex::Complex64;
use qbridge_ir::{IrResult, UnitaryMatrix};
use std::f64::consts::PI;

/// Dense complex matrix.
pub type Matrix = Array2<Complex64>;

/// Shorthand for a complex literal.
#[inline]
pub fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// Identity of the given dimension.
pub fn identity(dim: usize) -> Matrix {
    Array2::eye(dim)
}

/// Convert a [`UnitaryMatrix`] into a dense [`Matrix`].
pub fn from_unitary(matrix: &UnitaryMatrix) -> Matrix {
    let dim = matrix.dim();
    Array2::from_shape_fn((dim, dim), |(r, col)| matrix.get(r, col))
}

/// Convert a dense [`Matrix`] back into a validated [`UnitaryMatrix`].
pub fn to_unitary(matrix: &Matrix) -> IrResult<UnitaryMatrix> {
    let dim = matrix.nrows();
    UnitaryMatrix::new(dim, matrix.iter().copied().collect())
}

/// Conjugate transpose.
pub fn dagger(matrix: &Matrix) -> Matrix {
    matrix.t().mapv(|z| z.conj())
}

/// Kronecker product `a ⊗ b`, with `a` on the more significant qubits.
pub fn kron(a: &Matrix, b: &Matrix) -> Matrix {
    let (ar, ac) = a.dim();
    let (br, bc) = b.dim();
    Array2::from_shape_fn((ar * br, ac * bc), |(r, col)| {
        a[[r / br, col / bc]] * b[[r % br, col % bc]]
    })
}

/// Add one control qubit in front of `target`: `|0⟩⟨0| ⊗ I + |1⟩⟨1| ⊗ target`.
pub fn controlled(target: &Matrix) -> Matrix {
    let d = target.nrows();
    let mut out = identity(2 * d);
    for r in 0..d {
        for col in 0..d {
            out[[d + r, d + col]] = target[[r, col]];
        }
    }
    out
}

/// Power of an involution (`A² = I`) in the eigen-gate convention.
///
/// `A^t = e^{iπ·t·s} · ((I + A)/2 + e^{iπt}·(I − A)/2)`, where `s` is the
/// global shift applied to both eigenvalues.
pub fn involution_power(a: &Matrix, exponent: f64, global_shift: f64) -> Matrix {
    let id = identity(a.nrows());
    let plus = (&id + a).mapv(|z| z * 0.5);
    let minus = (&id - a).mapv(|z| z * 0.5);
    let turn = Complex64::from_polar(1.0, PI * exponent);
    let shift = Complex64::from_polar(1.0, PI * exponent * global_shift);
    (plus + minus.mapv(|z| z * turn)).mapv(|z| z * shift)
}

/// `exp(-iθ/2 · P)` for an involution `P`.
pub fn involution_rotation(p: &Matrix, theta: f64) -> Matrix {
    let id = identity(p.nrows());
    let cos = c((theta / 2.0).cos(), 0.0);
    let sin = c(0.0, -(theta / 2.0).sin());
    id.mapv(|z| z * cos) + p.mapv(|z| z * sin)
}

/// Diagonal matrix from its entries.
pub fn diagonal(entries: &[Complex64]) -> Matrix {
    let mut out = Array2::zeros((entries.len(), entries.len()));
    for (i, &z) in entries.iter().enumerate() {
        out[[i, i]] = z;
    }
    out
}

/// Check `U·U† = I` within `atol`.
pub fn is_unitary(matrix: &Matrix, atol: f64) -> bool {
    if matrix.nrows() != matrix.ncols() {
        return false;
    }
    let product = matrix.dot(&dagger(matrix));
    let id = identity(matrix.nrows());
    product
        .iter()
        .zip(id.iter())
        .all(|(a, b)| (a - b).norm() <= atol)
}
