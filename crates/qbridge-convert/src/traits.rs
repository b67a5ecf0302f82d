//! Importer, exporter and native-program contracts.
//!
//! # Conversion contract
//!
//! ```text
//!   native program ──→ Importer::import() ──→ CanonicalCircuit ──→ Exporter::export() ──→ native program
//!                        (qubit_map, param_map)                       (param_map, emissions)
//! ```
//!
//! ## Method table
//!
//! | Trait | Method | Returns |
//! |-------|--------|---------|
//! | [`Importer`] | `format()` | `ProgramFormat` |
//! | [`Importer`] | `import()` | `ConvertResult<ImportedCircuit<..>>` |
//! | [`Exporter`] | `format()` | `ProgramFormat` |
//! | [`Exporter`] | `export()` | `ConvertResult<Exported<..>>` |
//! | [`Exporter`] | `strategy()` | `Option<Strategy>` |
//! | [`NativeProgram`] | `metadata()` | `ConvertResult<ProgramMetadata>` |
//! | [`NativeProgram`] | `unitary()` | `ConvertResult<Matrix>` |
//! | [`NativeProgram`] | `bind_parameters()` | `Self` |
//!
//! Importers and exporters are stateless unit structs. Everything a single
//! conversion needs lives in values scoped to that call.

use std::hash::Hash;

use qbridge_ir::{CanonicalCircuit, GateKind, NamedSymbol};
use qbridge_unitary::Matrix;

use crate::context::{ExportOptions, Exported, ImportedCircuit, ProgramMetadata};
use crate::error::ConvertResult;
use crate::format::ProgramFormat;
use crate::mapping::Strategy;

/// Parses one native format into the canonical model.
pub trait Importer: Send + Sync {
    /// The native program type.
    type Program;
    /// The native qubit reference type.
    type Qubit: Clone + Eq + Hash;
    /// The native free-parameter type.
    type Symbol: Clone + Eq + Hash + NamedSymbol;

    /// Source format tag.
    fn format(&self) -> ProgramFormat;

    /// Import a program.
    ///
    /// Qubits and parameters are numbered in the order the format defines
    /// (first-seen for most formats). Constructs with no canonical mapping
    /// and no numeric matrix are rejected.
    fn import(
        &self,
        program: &Self::Program,
    ) -> ConvertResult<ImportedCircuit<Self::Qubit, Self::Symbol>>;
}

/// Emits the canonical model as one native format.
pub trait Exporter: Send + Sync {
    /// The native program type.
    type Program;

    /// Target format tag.
    fn format(&self) -> ProgramFormat;

    /// Export a circuit.
    ///
    /// The whole program is built before it is returned.
    fn export(
        &self,
        circuit: &CanonicalCircuit,
        options: &ExportOptions,
    ) -> ConvertResult<Exported<Self::Program>>;

    /// Mapping-table bucket for `kind`.
    fn strategy(&self, kind: GateKind) -> Option<Strategy>;

    /// Kinds with no mapping-table entry.
    fn missing(&self) -> Vec<GateKind> {
        GateKind::ALL
            .into_iter()
            .filter(|k| self.strategy(*k).is_none())
            .collect()
    }
}

/// Behaviour every native program model provides on its own terms,
/// without going through the canonical model.
pub trait NativeProgram: Sized {
    /// The model's format tag.
    const FORMAT: ProgramFormat;

    /// Qubit count, depth and parameters read from the native structure.
    fn metadata(&self) -> ConvertResult<ProgramMetadata>;

    /// Unitary of the program's gates under the format's own semantics.
    ///
    /// Measurements are skipped; unbound parameters are an error.
    fn unitary(&self) -> ConvertResult<Matrix>;

    /// Substitute values for free parameters, looked up by display name.
    ///
    /// Parameters the lookup does not know stay free.
    fn bind_parameters(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Self;
}
