//! qbridge Equivalence Oracle
//!
//! Dense unitaries for small circuits and comparisons that tolerate a
//! global phase.
//!
//! # Overview
//!
//! - [`gates`]: the standard gate library as [`Matrix`] constructors
//! - [`UnitaryBuilder`]: composes gate matrices on arbitrary qubit
//!   placements, in application order
//! - [`circuit_unitary`]: unitary of a [`qbridge_ir::CanonicalCircuit`]
//! - [`equivalent`] / [`equivalent_strict`]: `u1·u2†` must be a scalar
//!   multiple of the identity (exactly the identity, for the strict form)
//!
//! All matrices are big-endian: qubit 0 is the most significant bit of a
//! basis index.
//!
//! # Example
//!
//! ```rust
//! use qbridge_ir::CanonicalCircuit;
//! use qbridge_unitary::{DEFAULT_ATOL, circuit_unitary, equivalent, gates, matrix::kron};
//!
//! let u = circuit_unitary(&CanonicalCircuit::bell().unwrap()).unwrap();
//! let expected = gates::cx().dot(&kron(&gates::h(), &gates::id()));
//! assert!(equivalent(&u, &expected, DEFAULT_ATOL));
//! ```

pub mod builder;
pub mod canonical;
pub mod equivalence;
pub mod error;
pub mod gates;
pub mod matrix;

pub use builder::{MAX_ORACLE_QUBITS, UnitaryBuilder};
pub use canonical::{bound_args, circuit_unitary, gate_matrix};
pub use equivalence::{DEFAULT_ATOL, allclose, equivalent, equivalent_strict, global_phase_between};
pub use error::{UnitaryError, UnitaryResult};
pub use matrix::Matrix;
