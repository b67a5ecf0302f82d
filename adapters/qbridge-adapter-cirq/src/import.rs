//! Cirq → canonical import.

use rustc_hash::FxHashMap;
use std::sync::LazyLock;
use tracing::{debug, trace};

use qbridge_convert::{
    ANGLE_TOLERANCE, ConvertError, ConvertResult, ImportState, ImportedCircuit, Importer,
    ProgramFormat,
};
use qbridge_ir::{CanonicalGate, GateKind, QubitId};
use qbridge_unitary::matrix::to_unitary;

use crate::model::{Circuit, CirqGate, EigenPow, GateClass, Operation, Qid, Symbol};
use crate::unitary::gate_unitary;

type State = ImportState<Qid, Symbol>;

/// Maps one gate to a canonical gate, or `None` when this instance has no
/// canonical equivalent and must go through its matrix.
type ImportFn = fn(&CirqGate, &[QubitId], &mut State) -> ConvertResult<Option<CanonicalGate>>;

static DISPATCH: LazyLock<FxHashMap<(GateClass, u32), ImportFn>> = LazyLock::new(|| {
    let entries: [((GateClass, u32), ImportFn); 16] = [
        ((GateClass::Identity, 1), identity),
        ((GateClass::XPow, 1), x_pow),
        ((GateClass::YPow, 1), y_pow),
        ((GateClass::ZPow, 1), z_pow),
        ((GateClass::HPow, 1), h_pow),
        ((GateClass::CZPow, 2), cz_pow),
        ((GateClass::CXPow, 2), cx_pow),
        ((GateClass::SwapPow, 2), swap_pow),
        ((GateClass::ISwapPow, 2), iswap_pow),
        ((GateClass::XXPow, 2), xx_pow),
        ((GateClass::YYPow, 2), yy_pow),
        ((GateClass::ZZPow, 2), zz_pow),
        ((GateClass::CCXPow, 3), ccx_pow),
        ((GateClass::CSwap, 3), cswap),
        ((GateClass::Controlled, 2), controlled),
        ((GateClass::Controlled, 3), controlled),
    ];
    entries.into_iter().collect()
});

const X_NAMED: [(f64, GateKind); 4] = [
    (1.0, GateKind::X),
    (-1.0, GateKind::X),
    (0.5, GateKind::SX),
    (-0.5, GateKind::SXdg),
];
const Y_NAMED: [(f64, GateKind); 2] = [(1.0, GateKind::Y), (-1.0, GateKind::Y)];
const Z_NAMED: [(f64, GateKind); 6] = [
    (1.0, GateKind::Z),
    (-1.0, GateKind::Z),
    (0.5, GateKind::S),
    (-0.5, GateKind::Sdg),
    (0.25, GateKind::T),
    (-0.25, GateKind::Tdg),
];

fn near(a: f64, b: f64) -> bool {
    (a - b).abs() < ANGLE_TOLERANCE
}

fn exponent_is(pow: &EigenPow, values: &[f64]) -> bool {
    pow.exponent
        .as_f64()
        .is_some_and(|t| values.iter().any(|v| near(t, *v)))
}

fn fixed(kind: GateKind, qubits: &[QubitId]) -> ConvertResult<Option<CanonicalGate>> {
    Ok(Some(CanonicalGate::new(kind, qubits, vec![])?))
}

fn half_turns(kind: GateKind, pow: &EigenPow, qubits: &[QubitId], state: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    let angle = state.lower(&pow.exponent).from_half_turns();
    Ok(Some(CanonicalGate::new(kind, qubits, vec![angle])?))
}

/// Single-qubit power: `global_shift = -0.5` is the rotation form, an
/// unshifted power is a named gate when the exponent is one, else the
/// unshifted parametric form.
fn single_qubit(
    gate: &CirqGate,
    qubits: &[QubitId],
    state: &mut State,
    named: &[(f64, GateKind)],
    rotation: GateKind,
    unshifted: GateKind,
) -> ConvertResult<Option<CanonicalGate>> {
    let Some(pow) = gate.eigen() else {
        return Ok(None);
    };
    if near(pow.global_shift, -0.5) {
        return half_turns(rotation, pow, qubits, state);
    }
    if let Some(t) = pow.exponent.as_f64() {
        if let Some((_, kind)) = named.iter().find(|(e, _)| near(t, *e)) {
            return fixed(*kind, qubits);
        }
    }
    half_turns(unshifted, pow, qubits, state)
}

fn identity(_: &CirqGate, qubits: &[QubitId], _: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    fixed(GateKind::I, qubits)
}

fn x_pow(gate: &CirqGate, qubits: &[QubitId], state: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    single_qubit(gate, qubits, state, &X_NAMED, GateKind::Rx, GateKind::Rx)
}

fn y_pow(gate: &CirqGate, qubits: &[QubitId], state: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    single_qubit(gate, qubits, state, &Y_NAMED, GateKind::Ry, GateKind::Ry)
}

fn z_pow(gate: &CirqGate, qubits: &[QubitId], state: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    single_qubit(gate, qubits, state, &Z_NAMED, GateKind::Rz, GateKind::Phase)
}

/// Powers that only have a canonical equivalent at exponent ±1.
fn involution(gate: &CirqGate, kind: GateKind, qubits: &[QubitId]) -> ConvertResult<Option<CanonicalGate>> {
    match gate.eigen() {
        Some(pow) if exponent_is(pow, &[1.0, -1.0]) => fixed(kind, qubits),
        _ => Ok(None),
    }
}

fn h_pow(gate: &CirqGate, qubits: &[QubitId], _: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    involution(gate, GateKind::H, qubits)
}

fn cx_pow(gate: &CirqGate, qubits: &[QubitId], _: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    involution(gate, GateKind::CX, qubits)
}

fn swap_pow(gate: &CirqGate, qubits: &[QubitId], _: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    involution(gate, GateKind::Swap, qubits)
}

fn ccx_pow(gate: &CirqGate, qubits: &[QubitId], _: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    involution(gate, GateKind::CCX, qubits)
}

fn iswap_pow(gate: &CirqGate, qubits: &[QubitId], _: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    match gate.eigen() {
        Some(pow) if exponent_is(pow, &[1.0]) => fixed(GateKind::ISwap, qubits),
        _ => Ok(None),
    }
}

fn cz_pow(gate: &CirqGate, qubits: &[QubitId], state: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    let Some(pow) = gate.eigen() else {
        return Ok(None);
    };
    if exponent_is(pow, &[1.0, -1.0]) {
        return fixed(GateKind::CZ, qubits);
    }
    half_turns(GateKind::CPhase, pow, qubits, state)
}

fn xx_pow(gate: &CirqGate, qubits: &[QubitId], state: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    match gate.eigen() {
        Some(pow) => half_turns(GateKind::Rxx, pow, qubits, state),
        None => Ok(None),
    }
}

fn yy_pow(gate: &CirqGate, qubits: &[QubitId], state: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    match gate.eigen() {
        Some(pow) => half_turns(GateKind::Ryy, pow, qubits, state),
        None => Ok(None),
    }
}

fn zz_pow(gate: &CirqGate, qubits: &[QubitId], state: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    match gate.eigen() {
        Some(pow) => half_turns(GateKind::Rzz, pow, qubits, state),
        None => Ok(None),
    }
}

fn cswap(_: &CirqGate, qubits: &[QubitId], _: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    fixed(GateKind::CSwap, qubits)
}

/// `ControlledGate` of an unshifted gate that has a canonical controlled
/// form. A shifted sub-gate turns its global phase into a relative one, so
/// it always goes through the matrix.
fn controlled(gate: &CirqGate, qubits: &[QubitId], state: &mut State) -> ConvertResult<Option<CanonicalGate>> {
    let CirqGate::Controlled {
        sub_gate,
        num_controls,
    } = gate
    else {
        return Ok(None);
    };
    let Some(pow) = sub_gate.eigen() else {
        return Ok(None);
    };
    if !near(pow.global_shift, 0.0) {
        return Ok(None);
    }
    let unit = exponent_is(pow, &[1.0, -1.0]);
    match (sub_gate.as_ref(), num_controls) {
        (CirqGate::XPow(_), 1) if unit => fixed(GateKind::CX, qubits),
        (CirqGate::YPow(_), 1) if unit => fixed(GateKind::CY, qubits),
        (CirqGate::ZPow(_), 1) if unit => fixed(GateKind::CZ, qubits),
        (CirqGate::ZPow(_), 1) => half_turns(GateKind::CPhase, pow, qubits, state),
        (CirqGate::XPow(_), 2) | (CirqGate::CXPow(_), 1) if unit => fixed(GateKind::CCX, qubits),
        (CirqGate::SwapPow(_), 1) if unit => fixed(GateKind::CSwap, qubits),
        _ => Ok(None),
    }
}

/// Matrix fallback for gates with no table entry.
fn matrix_fallback(op: &Operation, qubits: &[QubitId]) -> ConvertResult<CanonicalGate> {
    if op.gate.is_parameterized() {
        return Err(ConvertError::unsupported(
            ProgramFormat::Cirq,
            op.to_string(),
            "symbolic gate has no canonical equivalent and no numeric matrix",
        ));
    }
    debug!("cirq: {} has no canonical equivalent, using its matrix", op.gate);
    let matrix = to_unitary(&gate_unitary(&op.gate)?)?;
    Ok(CanonicalGate::raw_unitary(matrix, qubits)?)
}

/// Importer for Cirq circuits.
///
/// Qubits are numbered in Cirq's default (sorted) qubit order, parameters
/// in first-seen order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CirqImporter;

impl Importer for CirqImporter {
    type Program = Circuit;
    type Qubit = Qid;
    type Symbol = Symbol;

    fn format(&self) -> ProgramFormat {
        ProgramFormat::Cirq
    }

    fn import(&self, program: &Circuit) -> ConvertResult<ImportedCircuit<Qid, Symbol>> {
        let mut state = State::new(ProgramFormat::Cirq);
        state.declare_qubits(&program.all_qubits());

        for op in program.all_operations() {
            if let Some(key) = &op.condition {
                return Err(ConvertError::unsupported(
                    ProgramFormat::Cirq,
                    op.to_string(),
                    format!("classically controlled by measurement '{key}'"),
                ));
            }
            let qubits = state.operands(&op.qubits);
            match &op.gate {
                CirqGate::Measurement { .. } => {
                    for q in qubits {
                        state.measure(q)?;
                    }
                    continue;
                }
                CirqGate::Reset => {
                    return Err(ConvertError::unsupported(
                        ProgramFormat::Cirq,
                        op.to_string(),
                        "reset is not unitary",
                    ));
                }
                g if !g.is_unitary() => {
                    return Err(ConvertError::unsupported(
                        ProgramFormat::Cirq,
                        op.to_string(),
                        "noise channels are not unitary",
                    ));
                }
                _ => {}
            }

            let key = (op.gate.class(), op.gate.num_qubits());
            let mapped = match DISPATCH.get(&key) {
                Some(f) => f(&op.gate, &qubits, &mut state)?,
                None => None,
            };
            let gate = match mapped {
                Some(gate) => gate,
                None => matrix_fallback(op, &qubits)?,
            };
            trace!("cirq: {} -> {}", op, gate);
            state.push(gate)?;
        }

        let imported = state.finish();
        debug!(
            "cirq: imported {} gates on {} qubits",
            imported.circuit.num_gates(),
            imported.circuit.num_qubits()
        );
        Ok(imported)
    }
}
