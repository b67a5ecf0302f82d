//! Unitaries of canonical gates and circuits.

use qbridge_ir::{Angle, CanonicalCircuit, CanonicalGate, GateKind};

use crate::builder::UnitaryBuilder;
use crate::error::{UnitaryError, UnitaryResult};
use crate::gates;
use crate::matrix::{Matrix, from_unitary};

/// Evaluate every argument of `gate`, failing on the first free parameter.
pub fn bound_args(gate: &CanonicalGate) -> UnitaryResult<Vec<f64>> {
    gate.args()
        .iter()
        .map(|arg| evaluate(gate.kind().name(), arg))
        .collect()
}

fn evaluate(gate: &str, arg: &Angle) -> UnitaryResult<f64> {
    arg.as_f64().ok_or_else(|| UnitaryError::UnboundParameter {
        gate: gate.to_string(),
        parameter: arg
            .symbols()
            .first()
            .map_or_else(|| arg.to_string(), |p| p.name.clone()),
    })
}

/// Matrix of one canonical gate, big-endian over its qubit tuple.
pub fn gate_matrix(gate: &CanonicalGate) -> UnitaryResult<Matrix> {
    let a = bound_args(gate)?;
    Ok(match gate.kind() {
        GateKind::I => gates::id(),
        GateKind::X => gates::x(),
        GateKind::Y => gates::y(),
        GateKind::Z => gates::z(),
        GateKind::H => gates::h(),
        GateKind::S => gates::s(),
        GateKind::Sdg => gates::sdg(),
        GateKind::T => gates::t(),
        GateKind::Tdg => gates::tdg(),
        GateKind::SX => gates::sx(),
        GateKind::SXdg => gates::sxdg(),
        GateKind::Rx => gates::rx(a[0]),
        GateKind::Ry => gates::ry(a[0]),
        GateKind::Rz => gates::rz(a[0]),
        GateKind::Phase => gates::p(a[0]),
        GateKind::U3 => gates::u3(a[0], a[1], a[2]),
        GateKind::CX => gates::cx(),
        GateKind::CY => gates::cy(),
        GateKind::CZ => gates::cz(),
        GateKind::CPhase => gates::cp(a[0]),
        GateKind::Swap => gates::swap(),
        GateKind::ISwap => gates::iswap(),
        GateKind::Rxx => gates::rxx(a[0]),
        GateKind::Ryy => gates::ryy(a[0]),
        GateKind::Rzz => gates::rzz(a[0]),
        GateKind::CCX => gates::ccx(),
        GateKind::CSwap => gates::cswap(),
        GateKind::RawUnitary => {
            from_unitary(gate.matrix().ok_or(UnitaryError::MissingMatrix(gate.kind()))?)
        }
    })
}

/// Unitary of the gate portion of a canonical circuit. Measurements are
/// ignored.
pub fn circuit_unitary(circuit: &CanonicalCircuit) -> UnitaryResult<Matrix> {
    let mut builder = UnitaryBuilder::new(circuit.num_qubits() as usize)?;
    for gate in circuit.gates() {
        let qubits: Vec<usize> = gate.qubits().iter().map(|q| q.index()).collect();
        builder.apply(&gate_matrix(gate)?, &qubits)?;
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equivalence::{DEFAULT_ATOL, equivalent};
    use crate::matrix::kron;
    use qbridge_ir::{ParamId, QubitId};
    use std::f64::consts::PI;

    #[test]
    fn test_bell_circuit() {
        let circuit = CanonicalCircuit::bell().unwrap();
        let u = circuit_unitary(&circuit).unwrap();
        let expected = gates::cx().dot(&kron(&gates::h(), &gates::id()));
        assert!(equivalent(&u, &expected, DEFAULT_ATOL));
    }

    #[test]
    fn test_unbound_parameter() {
        let mut circuit = CanonicalCircuit::new(1, 0);
        circuit.rx(ParamId::new(0, "theta"), QubitId(0)).unwrap();
        let err = circuit_unitary(&circuit).unwrap_err();
        assert_eq!(
            err,
            UnitaryError::UnboundParameter {
                gate: "rx".into(),
                parameter: "theta".into()
            }
        );

        let bound = circuit.bind(&|_| Some(PI));
        let u = circuit_unitary(&bound).unwrap();
        assert!(equivalent(&u, &gates::x(), DEFAULT_ATOL));
    }

    #[test]
    fn test_idle_qubit_is_identity() {
        let mut circuit = CanonicalCircuit::new(2, 0);
        circuit.x(QubitId(1)).unwrap();
        let u = circuit_unitary(&circuit).unwrap();
        assert!(equivalent(&u, &kron(&gates::id(), &gates::x()), DEFAULT_ATOL));
    }
}
