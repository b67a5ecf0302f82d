//! qbridge Canonical Circuit Model
//!
//! This crate provides the framework-neutral intermediate representation that
//! every qbridge importer produces and every exporter consumes.
//!
//! # Core Components
//!
//! - **Identifiers**: [`QubitId`], [`ClbitId`] for canonical wires and
//!   [`ParamId`] for free parameters
//! - **Indices**: [`QubitIndex`] and [`ParamIndex`] intern native qubit and
//!   parameter objects in first-seen order
//! - **Parameters**: [`ParameterExpression`], generic over the symbol type, with
//!   [`Angle`] as the canonical instantiation
//! - **Gates**: [`GateKind`] (a flat vocabulary) and [`CanonicalGate`]
//! - **Circuit**: [`CanonicalCircuit`] with a builder API and depth tracking
//!
//! # Example
//!
//! ```rust
//! use qbridge_ir::{CanonicalCircuit, ParamId, QubitId};
//!
//! let mut circuit = CanonicalCircuit::new(2, 0);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.rz(ParamId::new(0, "theta"), QubitId(1)).unwrap();
//!
//! assert_eq!(circuit.depth(), 3);
//! assert_eq!(circuit.params().len(), 1);
//! ```
//!
//! # Gate Vocabulary
//!
//! | Kind | Qubits | Parameters |
//! |------|--------|------------|
//! | `I`, `X`, `Y`, `Z`, `H` | 1 | - |
//! | `S`, `Sdg`, `T`, `Tdg`, `SX`, `SXdg` | 1 | - |
//! | `Rx`, `Ry`, `Rz`, `Phase` | 1 | θ |
//! | `U3` | 1 | θ, φ, λ |
//! | `CX`, `CY`, `CZ`, `Swap`, `ISwap` | 2 | - |
//! | `CPhase`, `Rxx`, `Ryy`, `Rzz` | 2 | θ |
//! | `CCX`, `CSwap` | 3 | - |
//! | `RawUnitary` | any | dense matrix |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod index;
pub mod matrix;
pub mod parameter;
pub mod qubit;

pub use circuit::{CanonicalCircuit, DepthTracker, Measurement};
pub use error::{IrError, IrResult};
pub use gate::{CanonicalGate, GateKind};
pub use index::{ParamIndex, QubitIndex};
pub use matrix::{UNITARITY_TOLERANCE, UnitaryMatrix};
pub use parameter::{Angle, NamedSymbol, ParamId, ParameterExpression};
pub use qubit::{ClbitId, QubitId};
