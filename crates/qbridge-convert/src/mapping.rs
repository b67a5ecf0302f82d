//! Per-target gate mapping tables.
//!
//! A [`MappingTable`] maps every [`GateKind`] to one of three strategies:
//!
//! | Strategy | Produces | Exact |
//! |----------|----------|-------|
//! | [`Strategy::Direct`] | one native gate with the identical unitary | bit-for-bit, modulo angle rescaling |
//! | [`Strategy::Decompose`] | a fixed sequence of native gates | up to global phase |
//! | [`Strategy::Matrix`] | the native arbitrary-unitary gate | always |
//!
//! Tables are plain data built once (exporters keep them in a
//! `LazyLock`) and only read afterwards.

use rustc_hash::FxHashMap;
use std::fmt;
use tracing::trace;

use qbridge_ir::{CanonicalCircuit, CanonicalGate, GateKind, QubitId, UnitaryMatrix};
use qbridge_unitary::{gate_matrix, matrix};

use crate::context::{ExportContext, GateEmission};
use crate::error::{ConvertError, ConvertResult};
use crate::format::ProgramFormat;

/// Which bucket a kind sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strategy {
    /// Structurally equivalent native gate.
    Direct,
    /// Sequence of native gates.
    Decompose,
    /// Native arbitrary-unitary gate.
    Matrix,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Direct => write!(f, "direct"),
            Strategy::Decompose => write!(f, "decompose"),
            Strategy::Matrix => write!(f, "matrix"),
        }
    }
}

/// Builds one native operation for a canonical gate.
pub type DirectFn<Op, S> = fn(&CanonicalGate, &mut ExportContext<S>) -> ConvertResult<Op>;

/// Builds a native gate sequence for a canonical gate.
pub type DecomposeFn<Op, S> = fn(&CanonicalGate, &mut ExportContext<S>) -> ConvertResult<Vec<Op>>;

/// Builds the native arbitrary-unitary gate.
pub type MatrixFn<Op, S> =
    fn(&UnitaryMatrix, &[QubitId], &mut ExportContext<S>) -> ConvertResult<Op>;

/// One table entry.
pub enum GateMapping<Op, S> {
    /// Direct native constructor.
    Direct(DirectFn<Op, S>),
    /// Decomposition recipe.
    Decompose(DecomposeFn<Op, S>),
    /// Raw-matrix fallback.
    Matrix(MatrixFn<Op, S>),
}

impl<Op, S> GateMapping<Op, S> {
    /// The entry's strategy.
    pub fn strategy(&self) -> Strategy {
        match self {
            GateMapping::Direct(_) => Strategy::Direct,
            GateMapping::Decompose(_) => Strategy::Decompose,
            GateMapping::Matrix(_) => Strategy::Matrix,
        }
    }
}

/// Static `kind → strategy` table for one target format.
pub struct MappingTable<Op, S> {
    format: ProgramFormat,
    entries: FxHashMap<GateKind, GateMapping<Op, S>>,
}

impl<Op, S> MappingTable<Op, S> {
    /// Create an empty table.
    pub fn new(format: ProgramFormat) -> Self {
        Self {
            format,
            entries: FxHashMap::default(),
        }
    }

    /// Register direct constructors for `kinds`.
    #[must_use]
    pub fn direct(mut self, kinds: &[GateKind], f: DirectFn<Op, S>) -> Self {
        for &kind in kinds {
            self.entries.insert(kind, GateMapping::Direct(f));
        }
        self
    }

    /// Register a decomposition recipe for `kind`.
    #[must_use]
    pub fn decompose(mut self, kind: GateKind, f: DecomposeFn<Op, S>) -> Self {
        self.entries.insert(kind, GateMapping::Decompose(f));
        self
    }

    /// Register the raw-matrix fallback for `kinds`.
    #[must_use]
    pub fn matrix(mut self, kinds: &[GateKind], f: MatrixFn<Op, S>) -> Self {
        for &kind in kinds {
            self.entries.insert(kind, GateMapping::Matrix(f));
        }
        self
    }

    /// Target format of the table.
    pub fn format(&self) -> ProgramFormat {
        self.format
    }

    /// Entry for `kind`.
    pub fn get(&self, kind: GateKind) -> Option<&GateMapping<Op, S>> {
        self.entries.get(&kind)
    }

    /// Strategy for `kind`.
    pub fn strategy(&self, kind: GateKind) -> Option<Strategy> {
        self.get(kind).map(GateMapping::strategy)
    }

    /// Kinds with no entry.
    pub fn missing(&self) -> Vec<GateKind> {
        GateKind::ALL
            .into_iter()
            .filter(|k| !self.entries.contains_key(k))
            .collect()
    }

    /// Check that every kind has an entry and `RawUnitary` takes the
    /// matrix path.
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty() && self.strategy(GateKind::RawUnitary) == Some(Strategy::Matrix)
    }

    /// Render one canonical gate.
    pub fn emit(
        &self,
        gate: &CanonicalGate,
        ctx: &mut ExportContext<S>,
    ) -> ConvertResult<(Vec<Op>, GateEmission)> {
        let entry = self.get(gate.kind()).ok_or(ConvertError::MappingGap {
            format: self.format,
            kind: gate.kind(),
        })?;
        let ops = match entry {
            GateMapping::Direct(f) => vec![f(gate, ctx)?],
            GateMapping::Decompose(f) => f(gate, ctx)?,
            GateMapping::Matrix(f) => match gate.matrix() {
                Some(m) => vec![f(m, gate.qubits(), ctx)?],
                None => {
                    if gate.is_parameterized() {
                        return Err(ConvertError::unsupported(
                            self.format,
                            gate.to_string(),
                            "parameterized gate has no native equivalent and no numeric matrix",
                        ));
                    }
                    let m = matrix::to_unitary(&gate_matrix(gate)?)?;
                    vec![f(&m, gate.qubits(), ctx)?]
                }
            },
        };
        let emission = GateEmission {
            kind: gate.kind(),
            strategy: entry.strategy(),
            native_ops: ops.len(),
        };
        trace!(
            "{}: {} via {} ({} ops)",
            self.format,
            gate,
            emission.strategy,
            emission.native_ops
        );
        Ok((ops, emission))
    }

    /// Render every gate of `circuit` in order.
    ///
    /// Fails on the first gate that cannot be rendered; nothing is returned
    /// in that case.
    pub fn emit_circuit(
        &self,
        circuit: &CanonicalCircuit,
        ctx: &mut ExportContext<S>,
    ) -> ConvertResult<(Vec<Op>, Vec<GateEmission>)> {
        let mut ops = Vec::with_capacity(circuit.num_gates());
        let mut emissions = Vec::with_capacity(circuit.num_gates());
        for gate in circuit.gates() {
            let (mut gate_ops, emission) = self.emit(gate, ctx)?;
            ops.append(&mut gate_ops);
            emissions.push(emission);
        }
        Ok((ops, emissions))
    }
}

impl<Op, S> fmt::Debug for MappingTable<Op, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<(GateKind, Strategy)> = self
            .entries
            .iter()
            .map(|(k, v)| (*k, v.strategy()))
            .collect();
        entries.sort();
        f.debug_struct("MappingTable")
            .field("format", &self.format)
            .field("entries", &entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ExportOptions, NativeSymbol};

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Named(&'static str),
        Matrix(usize),
    }

    #[derive(Clone)]
    struct Sym;

    impl NativeSymbol for Sym {
        fn from_name(_: &str) -> Self {
            Sym
        }
    }

    fn named(gate: &CanonicalGate, _: &mut ExportContext<Sym>) -> ConvertResult<Op> {
        Ok(Op::Named(gate.kind().name()))
    }

    fn two(gate: &CanonicalGate, _: &mut ExportContext<Sym>) -> ConvertResult<Vec<Op>> {
        Ok(vec![Op::Named(gate.kind().name()); 2])
    }

    fn raw(m: &UnitaryMatrix, _: &[QubitId], _: &mut ExportContext<Sym>) -> ConvertResult<Op> {
        Ok(Op::Matrix(m.dim()))
    }

    fn table() -> MappingTable<Op, Sym> {
        MappingTable::new(ProgramFormat::Braket)
            .direct(&[GateKind::H], named)
            .decompose(GateKind::U3, two)
            .matrix(&[GateKind::CX, GateKind::RawUnitary], raw)
    }

    #[test]
    fn test_strategies_and_gaps() {
        let t = table();
        assert_eq!(t.strategy(GateKind::H), Some(Strategy::Direct));
        assert_eq!(t.strategy(GateKind::U3), Some(Strategy::Decompose));
        assert_eq!(t.strategy(GateKind::X), None);
        assert_eq!(t.missing().len(), GateKind::ALL.len() - 4);
        assert!(!t.is_complete());
    }

    #[test]
    fn test_debug_lists_entries_in_kind_order() {
        let out = format!("{:?}", table());
        assert!(out.starts_with("MappingTable { format: Braket"));
        let h = out.find("(H, Direct)").unwrap();
        let cx = out.find("(CX, Matrix)").unwrap();
        let raw = out.find("(RawUnitary, Matrix)").unwrap();
        assert!(h < cx && cx < raw);
    }

    #[test]
    fn test_emit() {
        let t = table();
        let mut ctx = ExportContext::new(ExportOptions::default());
        let h = CanonicalGate::new(GateKind::H, vec![QubitId(0)], vec![]).unwrap();
        let (ops, emission) = t.emit(&h, &mut ctx).unwrap();
        assert_eq!(ops, vec![Op::Named("h")]);
        assert_eq!(emission.strategy, Strategy::Direct);

        let u = CanonicalGate::new(
            GateKind::U3,
            vec![QubitId(0)],
            vec![0.1.into(), 0.2.into(), 0.3.into()],
        )
        .unwrap();
        let (ops, emission) = t.emit(&u, &mut ctx).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(emission.native_ops, 2);
    }

    #[test]
    fn test_matrix_fallback_for_named_kind() {
        let t = table();
        let mut ctx = ExportContext::new(ExportOptions::default());
        let cx = CanonicalGate::new(GateKind::CX, vec![QubitId(0), QubitId(1)], vec![]).unwrap();
        let (ops, emission) = t.emit(&cx, &mut ctx).unwrap();
        assert_eq!(ops, vec![Op::Matrix(4)]);
        assert_eq!(emission.strategy, Strategy::Matrix);
    }

    #[test]
    fn test_gap_is_reported() {
        let t = table();
        let mut ctx = ExportContext::new(ExportOptions::default());
        let x = CanonicalGate::new(GateKind::X, vec![QubitId(0)], vec![]).unwrap();
        let err = t.emit(&x, &mut ctx).unwrap_err();
        assert_eq!(
            err,
            ConvertError::MappingGap {
                format: ProgramFormat::Braket,
                kind: GateKind::X
            }
        );
    }

    #[test]
    fn test_emit_circuit_is_atomic() {
        let t = table();
        let mut ctx = ExportContext::new(ExportOptions::default());
        let mut circuit = CanonicalCircuit::new(2, 0);
        circuit.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();
        let (ops, emissions) = t.emit_circuit(&circuit, &mut ctx).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(emissions.len(), 2);

        circuit.x(QubitId(1)).unwrap();
        assert!(t.emit_circuit(&circuit, &mut ctx).is_err());
    }
}
