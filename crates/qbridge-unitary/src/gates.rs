//! Matrices of the standard gate library.
//!
//! Multi-qubit matrices are big-endian over operand order: for `cx`, the
//! control is the first operand and the most significant bit.

use ndarray::array;
use num_complex::Complex64;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::matrix::{Matrix, c, controlled, diagonal, identity, involution_rotation, kron};

/// Create the identity matrix on one qubit.
pub fn id() -> Matrix {
    identity(2)
}

/// Create a Hadamard matrix.
pub fn h() -> Matrix {
    let s = c(FRAC_1_SQRT_2, 0.0);
    array![[s, s], [s, -s]]
}

/// Create a Pauli-X matrix.
pub fn x() -> Matrix {
    array![[c(0.0, 0.0), c(1.0, 0.0)], [c(1.0, 0.0), c(0.0, 0.0)]]
}

/// Create a Pauli-Y matrix.
pub fn y() -> Matrix {
    array![[c(0.0, 0.0), c(0.0, -1.0)], [c(0.0, 1.0), c(0.0, 0.0)]]
}

/// Create a Pauli-Z matrix.
pub fn z() -> Matrix {
    diagonal(&[c(1.0, 0.0), c(-1.0, 0.0)])
}

/// Create an S gate (sqrt(Z)).
pub fn s() -> Matrix {
    p(PI / 2.0)
}

/// Create an S-dagger gate.
pub fn sdg() -> Matrix {
    p(-PI / 2.0)
}

/// Create a T gate (fourth root of Z).
pub fn t() -> Matrix {
    p(PI / 4.0)
}

/// Create a T-dagger gate.
pub fn tdg() -> Matrix {
    p(-PI / 4.0)
}

/// Create an SX gate (sqrt(X)).
pub fn sx() -> Matrix {
    let a = c(0.5, 0.5);
    let b = c(0.5, -0.5);
    array![[a, b], [b, a]]
}

/// Create an SX-dagger gate.
pub fn sxdg() -> Matrix {
    let a = c(0.5, -0.5);
    let b = c(0.5, 0.5);
    array![[a, b], [b, a]]
}

/// Create an RX rotation matrix.
pub fn rx(theta: f64) -> Matrix {
    involution_rotation(&x(), theta)
}

/// Create an RY rotation matrix.
pub fn ry(theta: f64) -> Matrix {
    involution_rotation(&y(), theta)
}

/// Create an RZ rotation matrix.
pub fn rz(theta: f64) -> Matrix {
    diagonal(&[
        Complex64::from_polar(1.0, -theta / 2.0),
        Complex64::from_polar(1.0, theta / 2.0),
    ])
}

/// Create a phase gate `diag(1, e^{iλ})`.
pub fn p(lambda: f64) -> Matrix {
    diagonal(&[c(1.0, 0.0), Complex64::from_polar(1.0, lambda)])
}

/// Create a U gate (general single-qubit rotation).
///
/// `U(θ, φ, λ) = [[cos(θ/2), -e^{iλ} sin(θ/2)], [e^{iφ} sin(θ/2), e^{i(φ+λ)} cos(θ/2)]]`
pub fn u3(theta: f64, phi: f64, lambda: f64) -> Matrix {
    let cos = (theta / 2.0).cos();
    let sin = (theta / 2.0).sin();
    array![
        [c(cos, 0.0), -Complex64::from_polar(sin, lambda)],
        [
            Complex64::from_polar(sin, phi),
            Complex64::from_polar(cos, phi + lambda)
        ]
    ]
}

/// Create a CNOT matrix.
pub fn cx() -> Matrix {
    controlled(&x())
}

/// Create a controlled-Y matrix.
pub fn cy() -> Matrix {
    controlled(&y())
}

/// Create a controlled-Z matrix.
pub fn cz() -> Matrix {
    controlled(&z())
}

/// Create a controlled-phase matrix `diag(1, 1, 1, e^{iλ})`.
pub fn cp(lambda: f64) -> Matrix {
    controlled(&p(lambda))
}

/// Create a SWAP matrix.
pub fn swap() -> Matrix {
    let o = c(0.0, 0.0);
    let l = c(1.0, 0.0);
    array![[l, o, o, o], [o, o, l, o], [o, l, o, o], [o, o, o, l]]
}

/// Create an iSWAP matrix.
pub fn iswap() -> Matrix {
    let o = c(0.0, 0.0);
    let l = c(1.0, 0.0);
    let i = c(0.0, 1.0);
    array![[l, o, o, o], [o, o, i, o], [o, i, o, o], [o, o, o, l]]
}

/// Create `exp(-iθ/2 X⊗X)`.
pub fn rxx(theta: f64) -> Matrix {
    involution_rotation(&kron(&x(), &x()), theta)
}

/// Create `exp(-iθ/2 Y⊗Y)`.
pub fn ryy(theta: f64) -> Matrix {
    involution_rotation(&kron(&y(), &y()), theta)
}

/// Create `exp(-iθ/2 Z⊗Z)`.
pub fn rzz(theta: f64) -> Matrix {
    involution_rotation(&kron(&z(), &z()), theta)
}

/// Create a Toffoli matrix.
pub fn ccx() -> Matrix {
    controlled(&cx())
}

/// Create a Fredkin matrix.
pub fn cswap() -> Matrix {
    controlled(&swap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equivalence::{allclose, equivalent};
    use crate::matrix::is_unitary;

    const ATOL: f64 = 1e-10;

    #[test]
    fn test_all_unitary() {
        for m in [
            h(),
            x(),
            y(),
            z(),
            s(),
            t(),
            sx(),
            sxdg(),
            rx(0.3),
            ry(1.1),
            rz(-0.7),
            p(0.2),
            u3(0.1, 0.2, 0.3),
            cx(),
            cy(),
            cz(),
            cp(0.4),
            swap(),
            iswap(),
            rxx(0.5),
            ryy(0.6),
            rzz(0.7),
            ccx(),
            cswap(),
        ] {
            assert!(is_unitary(&m, ATOL));
        }
    }

    #[test]
    fn test_sx_squared_is_x() {
        assert!(allclose(&sx().dot(&sx()), &x(), ATOL));
        assert!(allclose(&sx().dot(&sxdg()), &id(), ATOL));
    }

    #[test]
    fn test_s_t_relations() {
        assert!(allclose(&t().dot(&t()), &s(), ATOL));
        assert!(allclose(&s().dot(&s()), &z(), ATOL));
        assert!(allclose(&s().dot(&sdg()), &id(), ATOL));
    }

    #[test]
    fn test_u3_is_zyz_up_to_phase() {
        let (theta, phi, lambda) = (0.7, -1.3, 2.1);
        let zyz = rz(phi).dot(&ry(theta)).dot(&rz(lambda));
        assert!(equivalent(&u3(theta, phi, lambda), &zyz, ATOL));
    }

    #[test]
    fn test_rz_is_phase_up_to_phase() {
        assert!(equivalent(&rz(0.9), &p(0.9), ATOL));
        assert!(!allclose(&rz(0.9), &p(0.9), ATOL));
    }

    #[test]
    fn test_rzz_from_cnots() {
        let theta = 0.37;
        let expected = cx().dot(&kron(&id(), &rz(theta))).dot(&cx());
        assert!(allclose(&rzz(theta), &expected, ATOL));
    }

    #[test]
    fn test_toffoli_action() {
        let m = ccx();
        assert_eq!(m[[7, 6]], c(1.0, 0.0));
        assert_eq!(m[[5, 5]], c(1.0, 0.0));
    }
}
