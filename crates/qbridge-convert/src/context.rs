//! State threaded through one import or export.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

use qbridge_ir::{
    Angle, CanonicalCircuit, CanonicalGate, ClbitId, DepthTracker, GateKind, IrError,
    NamedSymbol, ParamId, ParamIndex, ParameterExpression, QubitId, QubitIndex,
};

use crate::angles::WellKnownAngle;
use crate::error::{ConvertError, ConvertResult};
use crate::format::ProgramFormat;
use crate::mapping::Strategy;

/// Knobs that change how exporters render a canonical circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Emit named gates for well-known phase angles.
    pub snap_well_known_angles: bool,
    /// Pad untouched qubits with an identity in formats that do not
    /// declare qubits up front.
    pub pad_idle_qubits: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            snap_well_known_angles: true,
            pad_idle_qubits: true,
        }
    }
}

/// A target format's free-parameter type.
pub trait NativeSymbol: Clone {
    /// Construct a fresh symbol with the given (already sanitized) name.
    fn from_name(name: &str) -> Self;

    /// Rewrite a name into one the format accepts.
    fn sanitize(name: &str) -> String {
        name.to_string()
    }
}

/// Per-export state: options and the ParamId → native symbol allocation.
#[derive(Debug, Clone)]
pub struct ExportContext<S> {
    options: ExportOptions,
    symbols: FxHashMap<ParamId, S>,
    names: FxHashMap<ParamId, String>,
    used: FxHashSet<String>,
}

impl<S: NativeSymbol> ExportContext<S> {
    /// Create a context.
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            symbols: FxHashMap::default(),
            names: FxHashMap::default(),
            used: FxHashSet::default(),
        }
    }

    /// Create a context with every parameter of `circuit` allocated in
    /// index order.
    pub fn for_circuit(circuit: &CanonicalCircuit, options: ExportOptions) -> Self {
        let mut ctx = Self::new(options);
        let mut params = circuit.params();
        params.sort();
        for p in &params {
            ctx.symbol(p);
        }
        ctx
    }

    /// Get the export options.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Native symbol for a parameter, allocated on first use.
    ///
    /// Names are sanitized for the target and made unique with a `_2`,
    /// `_3`… suffix on collision.
    pub fn symbol(&mut self, id: &ParamId) -> S {
        if let Some(s) = self.symbols.get(id) {
            return s.clone();
        }
        let mut base = S::sanitize(&id.name);
        if base.is_empty() {
            base = format!("p{}", id.index);
        }
        let mut name = base.clone();
        let mut suffix = 2;
        while self.used.contains(&name) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        let symbol = S::from_name(&name);
        self.used.insert(name.clone());
        self.names.insert(id.clone(), name);
        self.symbols.insert(id.clone(), symbol.clone());
        symbol
    }

    /// Rewrite a canonical argument over native symbols.
    pub fn lower(&mut self, angle: &Angle) -> ParameterExpression<S> {
        angle.map_symbols(&mut |p| self.symbol(p))
    }

    /// Rewrite a canonical argument in half-turns (`θ/π`).
    pub fn lower_half_turns(&mut self, angle: &Angle) -> ParameterExpression<S> {
        self.lower(&angle.to_half_turns())
    }

    /// Well-known angle match, honouring [`ExportOptions::snap_well_known_angles`].
    pub fn well_known(&self, angle: &Angle) -> Option<WellKnownAngle> {
        if self.options.snap_well_known_angles {
            WellKnownAngle::from_angle(angle)
        } else {
            None
        }
    }

    /// Allocated `(ParamId, native symbol)` pairs in index order.
    pub fn symbols(&self) -> Vec<(ParamId, S)> {
        let mut out: Vec<(ParamId, S)> = self
            .symbols
            .iter()
            .map(|(p, s)| (p.clone(), s.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// The out-of-band ParamId → native name mapping, in index order.
    pub fn param_map(&self) -> Vec<(ParamId, String)> {
        let mut out: Vec<(ParamId, String)> = self
            .names
            .iter()
            .map(|(p, n)| (p.clone(), n.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

/// How one canonical gate was rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateEmission {
    /// The canonical kind.
    pub kind: GateKind,
    /// Strategy the mapping table chose.
    pub strategy: Strategy,
    /// Number of native operations produced.
    pub native_ops: usize,
}

/// Result of an export.
#[derive(Debug, Clone)]
pub struct Exported<P> {
    /// The target program.
    pub program: P,
    /// ParamId → native symbol name, in index order.
    pub param_map: Vec<(ParamId, String)>,
    /// One entry per canonical gate, in circuit order.
    pub emissions: Vec<GateEmission>,
}

impl<P> Exported<P> {
    /// Check that every gate took the direct path.
    pub fn all_direct(&self) -> bool {
        self.emissions.iter().all(|e| e.strategy == Strategy::Direct)
    }

    /// Total number of native gate operations emitted.
    pub fn native_gate_count(&self) -> usize {
        self.emissions.iter().map(|e| e.native_ops).sum()
    }
}

/// Result of an import.
#[derive(Debug, Clone)]
pub struct ImportedCircuit<Q, S> {
    /// The canonical circuit.
    pub circuit: CanonicalCircuit,
    /// Native qubit → canonical qubit.
    pub qubit_map: QubitIndex<Q>,
    /// Native symbol → canonical parameter.
    pub param_map: ParamIndex<S>,
}

impl<Q: Clone + Eq + Hash, S: Clone + Eq + Hash + NamedSymbol> ImportedCircuit<Q, S> {
    /// Discard the maps.
    pub fn into_circuit(self) -> CanonicalCircuit {
        self.circuit
    }
}

/// Builder an importer drives while walking a native program.
///
/// Wraps the canonical circuit under construction together with the qubit
/// and parameter indices, and translates structural IR errors into the
/// conversion taxonomy.
#[derive(Debug, Clone)]
pub struct ImportState<Q, S> {
    format: ProgramFormat,
    circuit: CanonicalCircuit,
    qubits: QubitIndex<Q>,
    params: ParamIndex<S>,
}

impl<Q, S> ImportState<Q, S>
where
    Q: Clone + Eq + Hash + fmt::Display,
    S: Clone + Eq + Hash + NamedSymbol,
{
    /// Start an import of a `format` program.
    pub fn new(format: ProgramFormat) -> Self {
        Self {
            format,
            circuit: CanonicalCircuit::new(0, 0),
            qubits: QubitIndex::new(),
            params: ParamIndex::new(),
        }
    }

    /// Source format.
    pub fn format(&self) -> ProgramFormat {
        self.format
    }

    /// Intern `qubits` in the given order, idle or not.
    pub fn declare_qubits(&mut self, qubits: &[Q]) {
        for q in qubits {
            self.qubit(q);
        }
    }

    /// Allocate classical bits up to `num_clbits`.
    pub fn declare_clbits(&mut self, num_clbits: u32) {
        while self.circuit.num_clbits() < num_clbits {
            self.circuit.add_clbit();
        }
    }

    /// Canonical id for a native qubit.
    pub fn qubit(&mut self, qubit: &Q) -> QubitId {
        let id = self.qubits.intern(qubit);
        self.circuit.ensure_qubits(self.qubits.len() as u32);
        id
    }

    /// Canonical ids for an operation's operands.
    pub fn operands(&mut self, qubits: &[Q]) -> Vec<QubitId> {
        qubits.iter().map(|q| self.qubit(q)).collect()
    }

    /// Canonical argument for a native expression.
    pub fn lower(&mut self, expr: &ParameterExpression<S>) -> Angle {
        self.params.lower(expr)
    }

    /// Append a gate.
    pub fn push(&mut self, gate: CanonicalGate) -> ConvertResult<()> {
        match self.circuit.push(gate) {
            Ok(_) => Ok(()),
            Err(IrError::GateAfterMeasurement { qubit, gate_name }) => {
                let native = self
                    .qubits
                    .native(qubit)
                    .map_or_else(|| qubit.to_string(), ToString::to_string);
                Err(ConvertError::unsupported(
                    self.format,
                    format!("{gate_name} on {native}"),
                    "mid-circuit measurement: gate follows a measurement of the same qubit",
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Build a gate and append it.
    pub fn gate(&mut self, kind: GateKind, qubits: &[QubitId], args: Vec<Angle>) -> ConvertResult<()> {
        self.push(CanonicalGate::new(kind, qubits, args)?)
    }

    /// Record a measurement into a fresh classical bit.
    pub fn measure(&mut self, qubit: QubitId) -> ConvertResult<ClbitId> {
        let clbit = self.circuit.add_clbit();
        self.circuit.measure(qubit, clbit)?;
        Ok(clbit)
    }

    /// Record a measurement into a declared classical bit.
    pub fn measure_into(&mut self, qubit: QubitId, clbit: ClbitId) -> ConvertResult<()> {
        self.declare_clbits(clbit.0 + 1);
        self.circuit.measure(qubit, clbit)?;
        Ok(())
    }

    /// Finish the import.
    pub fn finish(self) -> ImportedCircuit<Q, S> {
        ImportedCircuit {
            circuit: self.circuit,
            qubit_map: self.qubits,
            param_map: self.params,
        }
    }
}

/// Format-native metadata computed without importing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramMetadata {
    /// Number of qubits.
    pub num_qubits: usize,
    /// Number of classical bits.
    pub num_clbits: usize,
    /// Longest qubit-wise chain of unitary operations.
    pub depth: usize,
    /// Free parameters in first-seen order.
    pub params: Vec<ParamId>,
}

impl ProgramMetadata {
    /// Parameter names in first-seen order.
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Accumulates [`ProgramMetadata`] during a scan of native operations.
#[derive(Debug, Clone)]
pub struct MetadataScan<S> {
    num_qubits: usize,
    num_clbits: usize,
    depth: DepthTracker,
    params: ParamIndex<S>,
}

impl<S: Clone + Eq + Hash + NamedSymbol> MetadataScan<S> {
    /// Start a scan over a program with `num_qubits` qubits.
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            num_clbits: 0,
            depth: DepthTracker::new(),
            params: ParamIndex::new(),
        }
    }

    /// Record a unitary operation on `wires` with the given arguments.
    pub fn gate<'a>(
        &mut self,
        wires: &[usize],
        args: impl IntoIterator<Item = &'a ParameterExpression<S>>,
    ) where
        S: 'a,
    {
        self.depth.touch(wires);
        for arg in args {
            for symbol in arg.symbols() {
                self.params.intern(symbol);
            }
        }
    }

    /// Set the classical bit count.
    pub fn clbits(&mut self, num_clbits: usize) {
        self.num_clbits = self.num_clbits.max(num_clbits);
    }

    /// Finish the scan.
    pub fn finish(self) -> ProgramMetadata {
        ProgramMetadata {
            num_qubits: self.num_qubits,
            num_clbits: self.num_clbits,
            depth: self.depth.depth(),
            params: self.params.params().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Sym(String);

    impl NativeSymbol for Sym {
        fn from_name(name: &str) -> Self {
            Sym(name.to_string())
        }

        fn sanitize(name: &str) -> String {
            name.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_').collect()
        }
    }

    #[test]
    fn test_symbol_is_memoized() {
        let mut ctx: ExportContext<Sym> = ExportContext::new(ExportOptions::default());
        let p = ParamId::new(0, "theta");
        assert_eq!(ctx.symbol(&p), Sym("theta".into()));
        assert_eq!(ctx.symbol(&p), Sym("theta".into()));
        assert_eq!(ctx.param_map().len(), 1);
    }

    #[test]
    fn test_sanitized_collisions_are_suffixed() {
        let mut ctx: ExportContext<Sym> = ExportContext::new(ExportOptions::default());
        ctx.symbol(&ParamId::new(0, "a-b"));
        ctx.symbol(&ParamId::new(1, "ab"));
        let names: Vec<String> = ctx.param_map().into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["ab".to_string(), "ab_2".to_string()]);
    }

    #[test]
    fn test_suffix_skips_names_already_taken() {
        let mut ctx: ExportContext<Sym> = ExportContext::new(ExportOptions::default());
        ctx.symbol(&ParamId::new(0, "a_2"));
        ctx.symbol(&ParamId::new(1, "a"));
        ctx.symbol(&ParamId::new(2, "a"));
        ctx.symbol(&ParamId::new(3, ""));
        let names: Vec<String> = ctx.param_map().into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["a_2", "a", "a_3", "p3"]);
    }

    #[test]
    fn test_for_circuit_allocates_in_index_order() {
        let mut circuit = CanonicalCircuit::new(1, 0);
        circuit
            .rx(ParamId::new(1, "b"), QubitId(0))
            .unwrap()
            .ry(ParamId::new(0, "a"), QubitId(0))
            .unwrap();
        let ctx: ExportContext<Sym> = ExportContext::for_circuit(&circuit, ExportOptions::default());
        let symbols: Vec<Sym> = ctx.symbols().into_iter().map(|(_, s)| s).collect();
        assert_eq!(symbols, vec![Sym("a".into()), Sym("b".into())]);
    }

    #[test]
    fn test_snapping_can_be_disabled() {
        let quarter = Angle::constant(std::f64::consts::FRAC_PI_2);
        let on: ExportContext<Sym> = ExportContext::new(ExportOptions::default());
        assert!(on.well_known(&quarter).is_some());
        let off: ExportContext<Sym> = ExportContext::new(ExportOptions {
            snap_well_known_angles: false,
            ..ExportOptions::default()
        });
        assert!(off.well_known(&quarter).is_none());
    }

    #[test]
    fn test_import_state_reports_mid_circuit_measurement() {
        let mut state: ImportState<String, String> = ImportState::new(ProgramFormat::Cirq);
        let q = state.qubit(&"a".to_string());
        state.gate(GateKind::H, &[q], vec![]).unwrap();
        state.measure(q).unwrap();
        let err = state.gate(GateKind::X, &[q], vec![]).unwrap_err();
        assert!(err.is_unsupported());
        assert!(err.to_string().contains("x on a"));
    }

    #[test]
    fn test_import_state_declares_idle_qubits() {
        let mut state: ImportState<u32, String> = ImportState::new(ProgramFormat::Qiskit);
        state.declare_qubits(&[0, 1, 2]);
        state.declare_clbits(2);
        let q2 = state.qubit(&2);
        assert_eq!(q2, QubitId(2));
        state.measure_into(q2, ClbitId(1)).unwrap();
        let imported = state.finish();
        assert_eq!(imported.circuit.num_qubits(), 3);
        assert_eq!(imported.circuit.num_clbits(), 2);
        assert_eq!(imported.qubit_map.len(), 3);
    }
}
