//! Dense unitary matrices carried by `RawUnitary` gates.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};

/// Tolerance used when validating that a matrix is unitary.
pub const UNITARITY_TOLERANCE: f64 = 1e-7;

/// A square, power-of-two sized unitary matrix, stored row-major.
///
/// Basis states are big-endian over the qubit tuple the matrix is applied
/// to: the first qubit is the most significant bit of the row/column index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawUnitaryMatrix")]
pub struct UnitaryMatrix {
    dim: usize,
    data: Vec<Complex64>,
}

/// Unchecked wire form, validated by [`UnitaryMatrix::new`].
#[derive(Deserialize)]
struct RawUnitaryMatrix {
    dim: usize,
    data: Vec<Complex64>,
}

impl TryFrom<RawUnitaryMatrix> for UnitaryMatrix {
    type Error = IrError;

    fn try_from(raw: RawUnitaryMatrix) -> IrResult<Self> {
        Self::new(raw.dim, raw.data)
    }
}

impl UnitaryMatrix {
    /// Create a matrix from row-major data, validating shape and unitarity.
    pub fn new(dim: usize, data: Vec<Complex64>) -> IrResult<Self> {
        if dim < 2 || !dim.is_power_of_two() {
            return Err(IrError::InvalidMatrix(format!(
                "dimension {dim} is not a power of two >= 2"
            )));
        }
        if data.len() != dim * dim {
            return Err(IrError::InvalidMatrix(format!(
                "expected {} entries for a {dim}x{dim} matrix, got {}",
                dim * dim,
                data.len()
            )));
        }
        let matrix = Self { dim, data };
        if !matrix.is_unitary(UNITARITY_TOLERANCE) {
            return Err(IrError::InvalidMatrix("matrix is not unitary".into()));
        }
        Ok(matrix)
    }

    /// Create a matrix from a list of rows.
    pub fn from_rows(rows: Vec<Vec<Complex64>>) -> IrResult<Self> {
        let dim = rows.len();
        if let Some(row) = rows.iter().find(|r| r.len() != dim) {
            return Err(IrError::InvalidMatrix(format!(
                "row of length {} in a matrix with {dim} rows",
                row.len()
            )));
        }
        Self::new(dim, rows.into_iter().flatten().collect())
    }

    /// Side length of the matrix.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of qubits the matrix acts on.
    pub fn num_qubits(&self) -> u32 {
        self.dim.trailing_zeros()
    }

    /// Entry at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.dim + col]
    }

    /// Row-major entries.
    pub fn data(&self) -> &[Complex64] {
        &self.data
    }

    /// Rows as owned vectors.
    pub fn rows(&self) -> Vec<Vec<Complex64>> {
        self.data.chunks(self.dim).map(<[Complex64]>::to_vec).collect()
    }

    /// Conjugate transpose.
    pub fn dagger(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for r in 0..self.dim {
            for c in 0..self.dim {
                data.push(self.get(c, r).conj());
            }
        }
        Self {
            dim: self.dim,
            data,
        }
    }

    /// Check `U·U† = I` within `atol`.
    pub fn is_unitary(&self, atol: f64) -> bool {
        for r in 0..self.dim {
            for c in 0..self.dim {
                let mut acc = Complex64::new(0.0, 0.0);
                for k in 0..self.dim {
                    acc += self.get(r, k) * self.get(c, k).conj();
                }
                let expected = if r == c { 1.0 } else { 0.0 };
                if (acc - Complex64::new(expected, 0.0)).norm() > atol {
                    return false;
                }
            }
        }
        true
    }

    /// Reinterpret the matrix with the qubit order reversed.
    ///
    /// Converts between big-endian and little-endian basis conventions over
    /// the same qubit list.
    pub fn reverse_qubit_order(&self) -> Self {
        let n = self.num_qubits();
        let rev = |i: usize| -> usize {
            (0..n).fold(0, |acc, b| acc | (((i >> b) & 1) << (n - 1 - b)))
        };
        let mut data = vec![Complex64::new(0.0, 0.0); self.data.len()];
        for r in 0..self.dim {
            for c in 0..self.dim {
                data[rev(r) * self.dim + rev(c)] = self.get(r, c);
            }
        }
        Self {
            dim: self.dim,
            data,
        }
    }
}
