//! Braket → canonical import.

use rustc_hash::FxHashMap;
use std::sync::LazyLock;
use tracing::{debug, trace};

use qbridge_convert::{
    ConvertError, ConvertResult, ImportState, ImportedCircuit, Importer, ProgramFormat,
};
use qbridge_ir::{CanonicalGate, GateKind, QubitId};
use qbridge_unitary::matrix::to_unitary;

use crate::model::{BraketGate, Circuit, FreeParameter, Instruction, Operator};
use crate::unitary::gate_unitary;

type State = ImportState<u32, FreeParameter>;

/// Braket gates with a canonical kind of the same arity, keyed by
/// `(class name, qubit count)`. The rest go through their matrix.
static DISPATCH: LazyLock<FxHashMap<(&'static str, u32), GateKind>> = LazyLock::new(|| {
    [
        ("I", 1, GateKind::I),
        ("X", 1, GateKind::X),
        ("Y", 1, GateKind::Y),
        ("Z", 1, GateKind::Z),
        ("H", 1, GateKind::H),
        ("S", 1, GateKind::S),
        ("Si", 1, GateKind::Sdg),
        ("T", 1, GateKind::T),
        ("Ti", 1, GateKind::Tdg),
        ("V", 1, GateKind::SX),
        ("Vi", 1, GateKind::SXdg),
        ("Rx", 1, GateKind::Rx),
        ("Ry", 1, GateKind::Ry),
        ("Rz", 1, GateKind::Rz),
        ("PhaseShift", 1, GateKind::Phase),
        ("CNot", 2, GateKind::CX),
        ("CY", 2, GateKind::CY),
        ("CZ", 2, GateKind::CZ),
        ("Swap", 2, GateKind::Swap),
        ("ISwap", 2, GateKind::ISwap),
        ("CPhaseShift", 2, GateKind::CPhase),
        ("XX", 2, GateKind::Rxx),
        ("YY", 2, GateKind::Ryy),
        ("ZZ", 2, GateKind::Rzz),
        ("CCNot", 3, GateKind::CCX),
        ("CSwap", 3, GateKind::CSwap),
    ]
    .into_iter()
    .map(|(name, arity, kind)| ((name, arity), kind))
    .collect()
});

fn convert_gate(
    inst: &Instruction,
    gate: &BraketGate,
    qubits: &[QubitId],
    state: &mut State,
) -> ConvertResult<CanonicalGate> {
    if let BraketGate::Unitary { matrix, .. } = gate {
        return Ok(CanonicalGate::raw_unitary(matrix.clone(), qubits)?);
    }
    if let Some(kind) = DISPATCH.get(&(gate.name(), gate.qubit_count())) {
        let args = gate.angle().map(|a| state.lower(a)).into_iter().collect();
        return Ok(CanonicalGate::new(*kind, qubits, args)?);
    }
    if gate.is_parameterized() {
        return Err(ConvertError::unsupported(
            ProgramFormat::Braket,
            inst.to_string(),
            "symbolic gate has no canonical equivalent and no numeric matrix",
        ));
    }
    debug!("braket: {} has no canonical equivalent, using its matrix", gate);
    let matrix = to_unitary(&gate_unitary(gate)?)?;
    Ok(CanonicalGate::raw_unitary(matrix, qubits)?)
}

/// Importer for Braket circuits.
///
/// Qubits are numbered by ascending label, so `Circuit().h(1).cnot(1, 6)`
/// imports onto canonical qubits 0 and 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct BraketImporter;

impl Importer for BraketImporter {
    type Program = Circuit;
    type Qubit = u32;
    type Symbol = FreeParameter;

    fn format(&self) -> ProgramFormat {
        ProgramFormat::Braket
    }

    fn import(&self, program: &Circuit) -> ConvertResult<ImportedCircuit<u32, FreeParameter>> {
        let mut state = State::new(ProgramFormat::Braket);
        state.declare_qubits(&program.qubits());

        for inst in &program.instructions {
            let qubits = state.operands(&inst.target);
            match &inst.operator {
                Operator::Gate(gate) => {
                    let canonical = convert_gate(inst, gate, &qubits, &mut state)?;
                    trace!("braket: {} -> {}", inst, canonical);
                    state.push(canonical)?;
                }
                Operator::Measure => {
                    for q in qubits {
                        state.measure(q)?;
                    }
                }
                Operator::Noise(_) => {
                    return Err(ConvertError::unsupported(
                        ProgramFormat::Braket,
                        inst.to_string(),
                        "noise channels are not unitary",
                    ));
                }
            }
        }

        let imported = state.finish();
        debug!(
            "braket: imported {} gates on {} qubits",
            imported.circuit.num_gates(),
            imported.circuit.num_qubits()
        );
        Ok(imported)
    }
}
