//! Canonical circuit: the conversion pivot between native formats.

use crate::error::{IrError, IrResult};
use crate::gate::{CanonicalGate, GateKind};
use crate::matrix::UnitaryMatrix;
use crate::parameter::{Angle, ParamId};
use crate::qubit::{ClbitId, QubitId};

/// Longest qubit-wise dependency chain over a sequence of operations.
///
/// Every operation extends the chain of each wire it touches to one past
/// the deepest of them.
#[derive(Debug, Clone, Default)]
pub struct DepthTracker {
    wires: Vec<usize>,
    depth: usize,
}

impl DepthTracker {
    /// Create a tracker with no wires.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one operation on `wires`.
    pub fn touch(&mut self, wires: &[usize]) {
        if wires.is_empty() {
            return;
        }
        if let Some(&max_wire) = wires.iter().max() {
            if max_wire >= self.wires.len() {
                self.wires.resize(max_wire + 1, 0);
            }
        }
        let level = wires.iter().map(|&w| self.wires[w]).max().unwrap_or(0) + 1;
        for &w in wires {
            self.wires[w] = level;
        }
        self.depth = self.depth.max(level);
    }

    /// Current circuit depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Depth reached on one wire.
    pub fn wire_depth(&self, wire: usize) -> usize {
        self.wires.get(wire).copied().unwrap_or(0)
    }
}

/// A terminal measurement of one qubit into one classical bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    /// The measured qubit.
    pub qubit: QubitId,
    /// The classical bit receiving the result.
    pub clbit: ClbitId,
}

/// An ordered sequence of canonical gates plus terminal measurements.
#[derive(Debug, Clone)]
pub struct CanonicalCircuit {
    num_qubits: u32,
    num_clbits: u32,
    gates: Vec<CanonicalGate>,
    measurements: Vec<Measurement>,
    measured: Vec<bool>,
    depth: DepthTracker,
}

impl CanonicalCircuit {
    /// Create an empty circuit.
    pub fn new(num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            num_qubits,
            num_clbits,
            gates: Vec::new(),
            measurements: Vec::new(),
            measured: vec![false; num_qubits as usize],
            depth: DepthTracker::new(),
        }
    }

    /// Grow the qubit range to at least `num_qubits`.
    pub fn ensure_qubits(&mut self, num_qubits: u32) {
        if num_qubits > self.num_qubits {
            self.num_qubits = num_qubits;
            self.measured.resize(num_qubits as usize, false);
        }
    }

    /// Allocate one more classical bit.
    pub fn add_clbit(&mut self) -> ClbitId {
        let id = ClbitId(self.num_clbits);
        self.num_clbits += 1;
        id
    }

    /// Append a gate.
    pub fn push(&mut self, gate: CanonicalGate) -> IrResult<&mut Self> {
        for &q in gate.qubits() {
            if q.0 >= self.num_qubits {
                return Err(IrError::QubitNotFound {
                    qubit: q,
                    num_qubits: self.num_qubits,
                    gate_name: Some(gate.kind().name().to_string()),
                });
            }
            if self.measured[q.index()] {
                return Err(IrError::GateAfterMeasurement {
                    qubit: q,
                    gate_name: gate.kind().name().to_string(),
                });
            }
        }
        let wires: Vec<usize> = gate.qubits().iter().map(|q| q.index()).collect();
        self.depth.touch(&wires);
        self.gates.push(gate);
        Ok(self)
    }

    /// Record a terminal measurement.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        if qubit.0 >= self.num_qubits {
            return Err(IrError::QubitNotFound {
                qubit,
                num_qubits: self.num_qubits,
                gate_name: Some("measure".into()),
            });
        }
        if clbit.0 >= self.num_clbits {
            return Err(IrError::ClbitNotFound {
                clbit,
                num_clbits: self.num_clbits,
            });
        }
        self.measured[qubit.index()] = true;
        self.measurements.push(Measurement { qubit, clbit });
        Ok(self)
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Number of classical bits.
    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    /// Gates in program order.
    pub fn gates(&self) -> &[CanonicalGate] {
        &self.gates
    }

    /// Number of gates.
    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    /// Terminal measurements in program order.
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Length of the longest qubit-wise dependency chain. Measurements do
    /// not contribute.
    pub fn depth(&self) -> usize {
        self.depth.depth()
    }

    /// Check if a qubit is touched by any gate.
    pub fn is_idle(&self, qubit: QubitId) -> bool {
        self.depth.wire_depth(qubit.index()) == 0
    }

    /// Distinct free parameters, in first-seen order.
    pub fn params(&self) -> Vec<ParamId> {
        let mut out: Vec<ParamId> = Vec::new();
        for gate in &self.gates {
            for p in gate.params() {
                if !out.contains(p) {
                    out.push(p.clone());
                }
            }
        }
        out
    }

    /// Check if any gate argument is symbolic.
    pub fn is_parameterized(&self) -> bool {
        self.gates.iter().any(CanonicalGate::is_parameterized)
    }

    /// Bind parameters, returning a new circuit.
    #[must_use]
    pub fn bind(&self, lookup: &impl Fn(&ParamId) -> Option<f64>) -> Self {
        Self {
            gates: self.gates.iter().map(|g| g.bind(lookup)).collect(),
            ..self.clone()
        }
    }

    fn gate(&mut self, kind: GateKind, qubits: &[QubitId], args: Vec<Angle>) -> IrResult<&mut Self> {
        self.push(CanonicalGate::new(kind, qubits, args)?)
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Apply identity.
    pub fn id(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::I, &[q], vec![])
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::H, &[q], vec![])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::X, &[q], vec![])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::Y, &[q], vec![])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::Z, &[q], vec![])
    }

    /// Apply S gate.
    pub fn s(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::S, &[q], vec![])
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::Sdg, &[q], vec![])
    }

    /// Apply T gate.
    pub fn t(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::T, &[q], vec![])
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::Tdg, &[q], vec![])
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::SX, &[q], vec![])
    }

    /// Apply sqrt(X)-dagger gate.
    pub fn sxdg(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::SXdg, &[q], vec![])
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: impl Into<Angle>, q: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::Rx, &[q], vec![theta.into()])
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: impl Into<Angle>, q: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::Ry, &[q], vec![theta.into()])
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: impl Into<Angle>, q: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::Rz, &[q], vec![theta.into()])
    }

    /// Apply phase gate.
    pub fn p(&mut self, lambda: impl Into<Angle>, q: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::Phase, &[q], vec![lambda.into()])
    }

    /// Apply U(θ, φ, λ).
    pub fn u3(
        &mut self,
        theta: impl Into<Angle>,
        phi: impl Into<Angle>,
        lambda: impl Into<Angle>,
        q: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(
            GateKind::U3,
            &[q],
            vec![theta.into(), phi.into(), lambda.into()],
        )
    }

    /// Apply CNOT.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::CX, &[control, target], vec![])
    }

    /// Apply controlled-Y.
    pub fn cy(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::CY, &[control, target], vec![])
    }

    /// Apply controlled-Z.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::CZ, &[control, target], vec![])
    }

    /// Apply controlled phase.
    pub fn cp(
        &mut self,
        lambda: impl Into<Angle>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(GateKind::CPhase, &[control, target], vec![lambda.into()])
    }

    /// Apply SWAP.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::Swap, &[q1, q2], vec![])
    }

    /// Apply iSWAP.
    pub fn iswap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::ISwap, &[q1, q2], vec![])
    }

    /// Apply exp(-iθ/2 XX).
    pub fn rxx(&mut self, theta: impl Into<Angle>, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::Rxx, &[q1, q2], vec![theta.into()])
    }

    /// Apply exp(-iθ/2 YY).
    pub fn ryy(&mut self, theta: impl Into<Angle>, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::Ryy, &[q1, q2], vec![theta.into()])
    }

    /// Apply exp(-iθ/2 ZZ).
    pub fn rzz(&mut self, theta: impl Into<Angle>, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::Rzz, &[q1, q2], vec![theta.into()])
    }

    /// Apply Toffoli.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::CCX, &[c1, c2, target], vec![])
    }

    /// Apply Fredkin.
    pub fn cswap(&mut self, control: QubitId, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::CSwap, &[control, q1, q2], vec![])
    }

    /// Apply a dense unitary, big-endian over `qubits`.
    pub fn unitary(&mut self, matrix: UnitaryMatrix, qubits: &[QubitId]) -> IrResult<&mut Self> {
        self.push(CanonicalGate::raw_unitary(matrix, qubits)?)
    }

    // =========================================================================
    // Standard circuits
    // =========================================================================

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::new(2, 0);
        circuit.h(QubitId(0))?.cx(QubitId(0), QubitId(1))?;
        Ok(circuit)
    }

    /// Create a GHZ state circuit.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::new(n, 0);
        if n == 0 {
            return Ok(circuit);
        }
        circuit.h(QubitId(0))?;
        for i in 1..n {
            circuit.cx(QubitId(0), QubitId(i))?;
        }
        Ok(circuit)
    }
}
