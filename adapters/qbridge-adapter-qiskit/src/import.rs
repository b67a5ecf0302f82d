//! Qiskit → canonical import.

use rustc_hash::FxHashMap;
use std::f64::consts::FRAC_PI_2;
use std::sync::LazyLock;
use tracing::{debug, trace};

use qbridge_convert::{
    ConvertError, ConvertResult, ImportState, ImportedCircuit, Importer, ProgramFormat,
};
use qbridge_ir::{Angle, CanonicalGate, ClbitId, GateKind, QubitId};
use qbridge_unitary::matrix::to_unitary;

use crate::model::{CircuitInstruction, Operation, Parameter, QiskitGate, QuantumCircuit, Qubit};
use crate::unitary::gate_unitary;

type State = ImportState<Qubit, Parameter>;

/// Rewrites lowered Qiskit parameters into a canonical kind and arguments.
type Rewrite = fn(Vec<Angle>) -> (GateKind, Vec<Angle>);

static DISPATCH: LazyLock<FxHashMap<(&'static str, u32), Rewrite>> = LazyLock::new(|| {
    let entries: [(&'static str, u32, Rewrite); 30] = [
        ("id", 1, |a| (GateKind::I, a)),
        ("x", 1, |a| (GateKind::X, a)),
        ("y", 1, |a| (GateKind::Y, a)),
        ("z", 1, |a| (GateKind::Z, a)),
        ("h", 1, |a| (GateKind::H, a)),
        ("s", 1, |a| (GateKind::S, a)),
        ("sdg", 1, |a| (GateKind::Sdg, a)),
        ("t", 1, |a| (GateKind::T, a)),
        ("tdg", 1, |a| (GateKind::Tdg, a)),
        ("sx", 1, |a| (GateKind::SX, a)),
        ("sxdg", 1, |a| (GateKind::SXdg, a)),
        ("rx", 1, |a| (GateKind::Rx, a)),
        ("ry", 1, |a| (GateKind::Ry, a)),
        ("rz", 1, |a| (GateKind::Rz, a)),
        ("p", 1, |a| (GateKind::Phase, a)),
        ("u1", 1, |a| (GateKind::Phase, a)),
        ("u2", 1, u2),
        ("u", 1, |a| (GateKind::U3, a)),
        ("r", 1, r),
        ("cx", 2, |a| (GateKind::CX, a)),
        ("cy", 2, |a| (GateKind::CY, a)),
        ("cz", 2, |a| (GateKind::CZ, a)),
        ("cp", 2, |a| (GateKind::CPhase, a)),
        ("swap", 2, |a| (GateKind::Swap, a)),
        ("iswap", 2, |a| (GateKind::ISwap, a)),
        ("rxx", 2, |a| (GateKind::Rxx, a)),
        ("ryy", 2, |a| (GateKind::Ryy, a)),
        ("rzz", 2, |a| (GateKind::Rzz, a)),
        ("ccx", 3, |a| (GateKind::CCX, a)),
        ("cswap", 3, |a| (GateKind::CSwap, a)),
    ];
    entries
        .into_iter()
        .map(|(name, arity, f)| ((name, arity), f))
        .collect()
});

/// `U2(φ, λ) = U(π/2, φ, λ)`.
fn u2(args: Vec<Angle>) -> (GateKind, Vec<Angle>) {
    let mut out = vec![Angle::constant(FRAC_PI_2)];
    out.extend(args);
    (GateKind::U3, out)
}

/// `R(θ, φ) = U(θ, φ − π/2, π/2 − φ)`.
fn r(args: Vec<Angle>) -> (GateKind, Vec<Angle>) {
    let mut args = args.into_iter();
    let theta = args.next().unwrap_or(Angle::constant(0.0));
    let phi = args.next().unwrap_or(Angle::constant(0.0));
    let half = Angle::constant(FRAC_PI_2);
    (
        GateKind::U3,
        vec![
            theta,
            (phi.clone() - half.clone()).simplify(),
            (half - phi).simplify(),
        ],
    )
}

fn convert_gate(
    inst: &CircuitInstruction,
    gate: &QiskitGate,
    qubits: &[QubitId],
    state: &mut State,
) -> ConvertResult<CanonicalGate> {
    if let QiskitGate::Unitary(m) = gate {
        return Ok(CanonicalGate::raw_unitary(m.reverse_qubit_order(), qubits)?);
    }
    if let Some(rewrite) = DISPATCH.get(&(gate.name(), gate.num_qubits())) {
        let args = gate.params().into_iter().map(|p| state.lower(p)).collect();
        let (kind, args) = rewrite(args);
        return Ok(CanonicalGate::new(kind, qubits, args)?);
    }
    if gate.is_parameterized() {
        return Err(ConvertError::unsupported(
            ProgramFormat::Qiskit,
            inst.to_string(),
            "symbolic gate has no canonical equivalent and no numeric matrix",
        ));
    }
    debug!("qiskit: {} has no canonical equivalent, using its matrix", gate);
    let matrix = to_unitary(&gate_unitary(gate)?)?;
    Ok(CanonicalGate::raw_unitary(matrix, qubits)?)
}

/// Importer for Qiskit circuits.
///
/// Qubits are numbered in register-declaration order, so idle declared
/// qubits are kept. Classical bits keep their flat index.
#[derive(Debug, Clone, Copy, Default)]
pub struct QiskitImporter;

impl Importer for QiskitImporter {
    type Program = QuantumCircuit;
    type Qubit = Qubit;
    type Symbol = Parameter;

    fn format(&self) -> ProgramFormat {
        ProgramFormat::Qiskit
    }

    fn import(&self, program: &QuantumCircuit) -> ConvertResult<ImportedCircuit<Qubit, Parameter>> {
        let mut state = State::new(ProgramFormat::Qiskit);
        state.declare_qubits(&program.qubits());
        state.declare_clbits(program.num_clbits());
        if program.global_phase != 0.0 {
            debug!("qiskit: dropping global phase {}", program.global_phase);
        }

        for inst in &program.data {
            if inst.condition.is_some() {
                return Err(ConvertError::unsupported(
                    ProgramFormat::Qiskit,
                    inst.to_string(),
                    "classically controlled operation",
                ));
            }
            let qubits = state.operands(&inst.qubits);
            match &inst.operation {
                Operation::Gate(gate) => {
                    let canonical = convert_gate(inst, gate, &qubits, &mut state)?;
                    trace!("qiskit: {} -> {}", inst, canonical);
                    state.push(canonical)?;
                }
                Operation::Measure => {
                    for (q, c) in qubits.iter().zip(&inst.clbits) {
                        let index = program.find_clbit(c).ok_or_else(|| {
                            ConvertError::invalid(
                                ProgramFormat::Qiskit,
                                format!("{c} is not in the circuit"),
                            )
                        })?;
                        state.measure_into(*q, ClbitId(index as u32))?;
                    }
                }
                Operation::Reset => {
                    return Err(ConvertError::unsupported(
                        ProgramFormat::Qiskit,
                        inst.to_string(),
                        "reset is not unitary",
                    ));
                }
                Operation::Barrier | Operation::Delay(_) => {
                    debug!("qiskit: dropping scheduling hint {}", inst);
                }
            }
        }

        let imported = state.finish();
        debug!(
            "qiskit: imported {} gates on {} qubits",
            imported.circuit.num_gates(),
            imported.circuit.num_qubits()
        );
        Ok(imported)
    }
}
