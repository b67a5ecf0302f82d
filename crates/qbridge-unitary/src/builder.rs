//! Accumulates gate matrices into a full-register unitary.

use num_complex::Complex64;

use crate::error::{UnitaryError, UnitaryResult};
use crate::matrix::{Matrix, identity};

/// Widest register for which a dense unitary is built.
pub const MAX_ORACLE_QUBITS: usize = 12;

/// Composes gates in application order into a `2^n × 2^n` unitary.
///
/// Qubit 0 is the most significant bit of the basis index. Each applied
/// gate left-multiplies the accumulated matrix, acting column by column
/// the way a statevector update would, so the full tensor-product embedding
/// is never materialized.
#[derive(Debug, Clone)]
pub struct UnitaryBuilder {
    num_qubits: usize,
    matrix: Matrix,
}

impl UnitaryBuilder {
    /// Start from the identity on `num_qubits` qubits.
    pub fn new(num_qubits: usize) -> UnitaryResult<Self> {
        if num_qubits > MAX_ORACLE_QUBITS {
            return Err(UnitaryError::TooManyQubits {
                num_qubits,
                max: MAX_ORACLE_QUBITS,
            });
        }
        Ok(Self {
            num_qubits,
            matrix: identity(1 << num_qubits),
        })
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Apply `gate` to `qubits`, big-endian over the operand order.
    pub fn apply(&mut self, gate: &Matrix, qubits: &[usize]) -> UnitaryResult<()> {
        let k = qubits.len();
        let sub = 1usize << k;
        if gate.nrows() != sub || gate.ncols() != sub {
            return Err(UnitaryError::DimensionMismatch {
                dim: gate.nrows(),
                num_qubits: k,
            });
        }
        let n = self.num_qubits;
        let mut masks = Vec::with_capacity(k);
        for (i, &q) in qubits.iter().enumerate() {
            if q >= n {
                return Err(UnitaryError::QubitOutOfRange {
                    qubit: q,
                    num_qubits: n,
                });
            }
            if qubits[..i].contains(&q) {
                return Err(UnitaryError::DuplicateQubit(q));
            }
            masks.push(1usize << (n - 1 - q));
        }
        let target_mask = masks.iter().fold(0, |acc, m| acc | m);

        // offsets[s] is the basis index contribution of local state s.
        let offsets: Vec<usize> = (0..sub)
            .map(|s| {
                masks
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| (s >> (k - 1 - j)) & 1 == 1)
                    .fold(0, |acc, (_, m)| acc | m)
            })
            .collect();

        let dim = 1usize << n;
        let mut gathered = vec![Complex64::new(0.0, 0.0); sub];
        for col in 0..dim {
            for base in (0..dim).filter(|i| i & target_mask == 0) {
                for (s, off) in offsets.iter().enumerate() {
                    gathered[s] = self.matrix[[base | off, col]];
                }
                for (r, off) in offsets.iter().enumerate() {
                    let mut acc = Complex64::new(0.0, 0.0);
                    for (s, amp) in gathered.iter().enumerate() {
                        acc += gate[[r, s]] * amp;
                    }
                    self.matrix[[base | off, col]] = acc;
                }
            }
        }
        Ok(())
    }

    /// Borrow the unitary accumulated so far.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Finish and return the unitary.
    pub fn finish(self) -> Matrix {
        self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equivalence::allclose;
    use crate::gates;
    use crate::matrix::kron;

    const ATOL: f64 = 1e-12;

    #[test]
    fn test_bell_unitary() {
        let mut b = UnitaryBuilder::new(2).unwrap();
        b.apply(&gates::h(), &[0]).unwrap();
        b.apply(&gates::cx(), &[0, 1]).unwrap();
        let expected = gates::cx().dot(&kron(&gates::h(), &gates::id()));
        assert!(allclose(b.matrix(), &expected, ATOL));
    }

    #[test]
    fn test_single_qubit_embedding() {
        let mut b = UnitaryBuilder::new(3).unwrap();
        b.apply(&gates::x(), &[1]).unwrap();
        let expected = kron(&kron(&gates::id(), &gates::x()), &gates::id());
        assert!(allclose(&b.finish(), &expected, ATOL));
    }

    #[test]
    fn test_reversed_operands() {
        // CX with control on qubit 1 equals (H⊗H)·CX·(H⊗H).
        let mut b = UnitaryBuilder::new(2).unwrap();
        b.apply(&gates::cx(), &[1, 0]).unwrap();
        let hh = kron(&gates::h(), &gates::h());
        let expected = hh.dot(&gates::cx()).dot(&hh);
        assert!(allclose(b.matrix(), &expected, 1e-10));
    }

    #[test]
    fn test_non_adjacent_toffoli() {
        let mut b = UnitaryBuilder::new(4).unwrap();
        b.apply(&gates::ccx(), &[3, 0, 2]).unwrap();
        // |1001⟩ (q0=1, q3=1) → |1011⟩
        assert_eq!(b.matrix()[[0b1011, 0b1001]], Complex64::new(1.0, 0.0));
        assert_eq!(b.matrix()[[0b0001, 0b0001]], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_errors() {
        let mut b = UnitaryBuilder::new(2).unwrap();
        assert!(matches!(
            b.apply(&gates::cx(), &[0]),
            Err(UnitaryError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            b.apply(&gates::x(), &[2]),
            Err(UnitaryError::QubitOutOfRange { .. })
        ));
        assert!(matches!(
            b.apply(&gates::cx(), &[1, 1]),
            Err(UnitaryError::DuplicateQubit(1))
        ));
        assert!(UnitaryBuilder::new(MAX_ORACLE_QUBITS + 1).is_err());
    }
}
