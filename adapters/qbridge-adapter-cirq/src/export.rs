//! Canonical → Cirq export.

use std::sync::LazyLock;
use tracing::debug;

use qbridge_convert::{
    ConvertError, ConvertResult, ExportContext, ExportOptions, Exported, Exporter, MappingTable,
    ProgramFormat, Strategy,
};
use qbridge_ir::{Angle, CanonicalCircuit, CanonicalGate, GateKind, QubitId, UnitaryMatrix};

use crate::model::{Circuit, CirqGate, EigenPow, Operation, Qid, Symbol, Value};

type Ctx = ExportContext<Symbol>;

static TABLE: LazyLock<MappingTable<Operation, Symbol>> = LazyLock::new(|| {
    use GateKind::*;
    MappingTable::new(ProgramFormat::Cirq)
        .direct(
            &[I, X, Y, Z, H, S, Sdg, T, Tdg, SX, SXdg, CX, CY, CZ, Swap, ISwap, CCX, CSwap],
            fixed,
        )
        .direct(&[Rx, Ry, Rz], rotation)
        .direct(&[Phase], phase)
        .direct(&[CPhase], cphase)
        .direct(&[Rxx, Ryy, Rzz], ising)
        .decompose(U3, u3)
        .matrix(&[RawUnitary], matrix_gate)
});

/// The Cirq mapping table.
pub fn mapping_table() -> &'static MappingTable<Operation, Symbol> {
    &TABLE
}

fn line(q: QubitId) -> Qid {
    Qid::Line(i64::from(q.0))
}

fn qids(qubits: &[QubitId]) -> Vec<Qid> {
    qubits.iter().copied().map(line).collect()
}

fn named(kind: GateKind) -> Option<CirqGate> {
    Some(match kind {
        GateKind::I => CirqGate::i(),
        GateKind::X => CirqGate::x(),
        GateKind::Y => CirqGate::y(),
        GateKind::Z => CirqGate::z(),
        GateKind::H => CirqGate::h(),
        GateKind::S => CirqGate::s(),
        GateKind::Sdg => CirqGate::ZPow(EigenPow::new(-0.5)),
        GateKind::T => CirqGate::t(),
        GateKind::Tdg => CirqGate::ZPow(EigenPow::new(-0.25)),
        GateKind::SX => CirqGate::XPow(EigenPow::new(0.5)),
        GateKind::SXdg => CirqGate::XPow(EigenPow::new(-0.5)),
        GateKind::CX => CirqGate::cnot(),
        GateKind::CY => CirqGate::controlled(CirqGate::y()),
        GateKind::CZ => CirqGate::cz(),
        GateKind::Swap => CirqGate::swap(),
        GateKind::ISwap => CirqGate::iswap(),
        GateKind::CCX => CirqGate::toffoli(),
        GateKind::CSwap => CirqGate::fredkin(),
        _ => return None,
    })
}

fn fixed(gate: &CanonicalGate, _: &mut Ctx) -> ConvertResult<Operation> {
    let cirq = named(gate.kind()).ok_or(ConvertError::MappingGap {
        format: ProgramFormat::Cirq,
        kind: gate.kind(),
    })?;
    Operation::new(cirq, qids(gate.qubits()))
}

fn first_arg(gate: &CanonicalGate) -> ConvertResult<&Angle> {
    gate.args().first().ok_or_else(|| {
        ConvertError::invalid(ProgramFormat::Cirq, format!("{gate} is missing its angle"))
    })
}

fn rotation(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<Operation> {
    let pow = EigenPow::shifted(ctx.lower_half_turns(first_arg(gate)?), -0.5);
    let cirq = match gate.kind() {
        GateKind::Rx => CirqGate::XPow(pow),
        GateKind::Ry => CirqGate::YPow(pow),
        _ => CirqGate::ZPow(pow),
    };
    Operation::new(cirq, qids(gate.qubits()))
}

/// `Phase(λ)` is `Z**(λ/π)` exactly; well-known angles become named gates.
fn phase(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<Operation> {
    let lambda = first_arg(gate)?;
    if let Some(angle) = ctx.well_known(lambda) {
        if let Some(cirq) = named(angle.phase_alias()) {
            return Operation::new(cirq, qids(gate.qubits()));
        }
    }
    let pow = EigenPow::new(ctx.lower_half_turns(lambda));
    Operation::new(CirqGate::ZPow(pow), qids(gate.qubits()))
}

fn cphase(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<Operation> {
    let lambda = first_arg(gate)?;
    if let Some(kind) = ctx.well_known(lambda).and_then(|a| a.cphase_alias()) {
        if let Some(cirq) = named(kind) {
            return Operation::new(cirq, qids(gate.qubits()));
        }
    }
    let pow = EigenPow::new(ctx.lower_half_turns(lambda));
    Operation::new(CirqGate::CZPow(pow), qids(gate.qubits()))
}

/// `Rxx(θ)` is `XXPowGate(θ/π, global_shift=-0.5)` exactly.
fn ising(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<Operation> {
    let pow = EigenPow::shifted(ctx.lower_half_turns(first_arg(gate)?), -0.5);
    let cirq = match gate.kind() {
        GateKind::Rxx => CirqGate::XXPow(pow),
        GateKind::Ryy => CirqGate::YYPow(pow),
        _ => CirqGate::ZZPow(pow),
    };
    Operation::new(cirq, qids(gate.qubits()))
}

/// `U3(θ, φ, λ) ≅ Rz(φ) · Ry(θ) · Rz(λ)`.
fn u3(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<Vec<Operation>> {
    let [theta, phi, lambda] = gate.args() else {
        return Err(ConvertError::invalid(
            ProgramFormat::Cirq,
            format!("{gate} needs three angles"),
        ));
    };
    let q = qids(gate.qubits());
    let rz = |e: Value| CirqGate::ZPow(EigenPow::shifted(e, -0.5));
    let ry = |e: Value| CirqGate::YPow(EigenPow::shifted(e, -0.5));
    Ok(vec![
        Operation::new(rz(ctx.lower_half_turns(lambda)), q.clone())?,
        Operation::new(ry(ctx.lower_half_turns(theta)), q.clone())?,
        Operation::new(rz(ctx.lower_half_turns(phi)), q)?,
    ])
}

fn matrix_gate(matrix: &UnitaryMatrix, qubits: &[QubitId], _: &mut Ctx) -> ConvertResult<Operation> {
    Operation::new(CirqGate::Matrix(matrix.clone()), qids(qubits))
}

/// Exporter for Cirq circuits.
///
/// Canonical qubit `i` becomes `LineQubit(i)`; measurements become one
/// `MeasurementGate` per bit keyed `m{clbit}`.
///
/// Cirq circuits only know the qubits their operations touch, so with
/// [`ExportOptions::pad_idle_qubits`] each idle qubit gets an identity in
/// the first moment. A circuit with no gates therefore exports as a single
/// moment of identities, one deeper than the canonical circuit.
#[derive(Debug, Clone, Copy, Default)]
pub struct CirqExporter;

impl Exporter for CirqExporter {
    type Program = Circuit;

    fn format(&self) -> ProgramFormat {
        ProgramFormat::Cirq
    }

    fn export(
        &self,
        circuit: &CanonicalCircuit,
        options: &ExportOptions,
    ) -> ConvertResult<Exported<Circuit>> {
        let mut ctx = Ctx::for_circuit(circuit, *options);
        let (ops, emissions) = TABLE.emit_circuit(circuit, &mut ctx)?;

        let mut program = Circuit::new();
        if options.pad_idle_qubits {
            for q in (0..circuit.num_qubits()).map(QubitId) {
                if circuit.is_idle(q) {
                    program.push(CirqGate::i(), [line(q)])?;
                }
            }
        }
        for op in ops {
            program.append(op);
        }
        for m in circuit.measurements() {
            program.push(
                CirqGate::measure(format!("m{}", m.clbit.0), 1),
                [line(m.qubit)],
            )?;
        }

        debug!(
            "cirq: exported {} gates into {} moments",
            circuit.num_gates(),
            program.moments.len()
        );
        Ok(Exported {
            program,
            param_map: ctx.param_map(),
            emissions,
        })
    }

    fn strategy(&self, kind: GateKind) -> Option<Strategy> {
        TABLE.strategy(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::CirqImporter;
    use qbridge_convert::{Importer, NativeProgram};
    use qbridge_ir::ParamId;
    use qbridge_unitary::{DEFAULT_ATOL, circuit_unitary, equivalent};
    use std::f64::consts::PI;

    fn export(circuit: &CanonicalCircuit) -> Exported<Circuit> {
        CirqExporter.export(circuit, &ExportOptions::default()).unwrap()
    }

    #[test]
    fn test_table_is_complete() {
        assert!(mapping_table().is_complete());
        assert!(CirqExporter.missing().is_empty());
        assert_eq!(CirqExporter.strategy(GateKind::U3), Some(Strategy::Decompose));
    }

    #[test]
    fn test_bell_export() {
        let circuit = CanonicalCircuit::bell().unwrap();
        let exported = export(&circuit);
        assert!(exported.all_direct());
        assert_eq!(exported.program.all_qubits(), Qid::line_range(2));
        assert!(equivalent(
            &exported.program.unitary().unwrap(),
            &circuit_unitary(&circuit).unwrap(),
            DEFAULT_ATOL
        ));
    }

    #[test]
    fn test_phase_snaps_to_named_gate() {
        let mut circuit = CanonicalCircuit::new(1, 0);
        circuit.p(PI / 4.0, QubitId(0)).unwrap();
        let exported = export(&circuit);
        let op = exported.program.all_operations().next().unwrap();
        assert_eq!(op.gate, CirqGate::t());

        let exported = CirqExporter
            .export(
                &circuit,
                &ExportOptions {
                    snap_well_known_angles: false,
                    ..ExportOptions::default()
                },
            )
            .unwrap();
        let op = exported.program.all_operations().next().unwrap();
        assert!(matches!(op.gate, CirqGate::ZPow(ref p) if p.global_shift == 0.0));
    }

    #[test]
    fn test_idle_qubits_are_padded() {
        let mut circuit = CanonicalCircuit::new(3, 0);
        circuit.h(QubitId(2)).unwrap();
        let exported = export(&circuit);
        assert_eq!(exported.program.num_qubits(), 3);
        assert_eq!(exported.program.unitary().unwrap().nrows(), 8);

        let bare = CirqExporter
            .export(
                &circuit,
                &ExportOptions {
                    pad_idle_qubits: false,
                    ..ExportOptions::default()
                },
            )
            .unwrap();
        assert_eq!(bare.program.num_qubits(), 1);
    }

    #[test]
    fn test_empty_circuit_exports_one_identity_moment() {
        let exported = export(&CanonicalCircuit::new(2, 0));
        assert_eq!(exported.program.num_qubits(), 2);
        assert_eq!(exported.program.moments.len(), 1);
        assert!(exported.emissions.is_empty());
    }

    #[test]
    fn test_u3_decomposes_up_to_phase() {
        let mut circuit = CanonicalCircuit::new(1, 0);
        circuit.u3(0.4, -1.1, 2.3, QubitId(0)).unwrap();
        let exported = export(&circuit);
        assert_eq!(exported.emissions[0].strategy, Strategy::Decompose);
        assert_eq!(exported.native_gate_count(), 3);
        assert!(equivalent(
            &exported.program.unitary().unwrap(),
            &circuit_unitary(&circuit).unwrap(),
            DEFAULT_ATOL
        ));
    }

    #[test]
    fn test_symbolic_params_survive_round_trip() {
        let mut circuit = CanonicalCircuit::new(2, 0);
        circuit
            .rx(ParamId::new(0, "theta"), QubitId(0))
            .unwrap()
            .rzz(ParamId::new(1, "gamma"), QubitId(0), QubitId(1))
            .unwrap();
        let exported = export(&circuit);
        assert_eq!(
            exported.program.metadata().unwrap().param_names(),
            vec!["theta", "gamma"]
        );
        let back = CirqImporter.import(&exported.program).unwrap().into_circuit();
        let names: Vec<String> = back.params().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["theta".to_string(), "gamma".to_string()]);
        assert_eq!(back.gates()[1].kind(), GateKind::Rzz);
    }

    #[test]
    fn test_measurements_follow_gates() {
        let mut circuit = CanonicalCircuit::new(2, 2);
        circuit.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();
        circuit.measure(QubitId(0), qbridge_ir::ClbitId(0)).unwrap();
        circuit.measure(QubitId(1), qbridge_ir::ClbitId(1)).unwrap();
        let exported = export(&circuit);
        let meta = exported.program.metadata().unwrap();
        assert_eq!(meta.num_clbits, 2);
        assert_eq!(meta.depth, 2);
        let last = exported.program.moments.last().unwrap();
        assert!(last
            .operations
            .iter()
            .all(|op| matches!(op.gate, CirqGate::Measurement { .. })));
    }
}
