//! Canonical → Braket export.

use std::sync::LazyLock;
use tracing::debug;

use qbridge_convert::{
    ConvertError, ConvertResult, ExportContext, ExportOptions, Exported, Exporter, MappingTable,
    ProgramFormat, Strategy,
};
use qbridge_ir::{Angle, CanonicalCircuit, CanonicalGate, GateKind, QubitId, UnitaryMatrix};

use crate::model::{BraketGate, Circuit, FreeParameter, Instruction, Operator};

type Ctx = ExportContext<FreeParameter>;

static TABLE: LazyLock<MappingTable<Instruction, FreeParameter>> = LazyLock::new(|| {
    use GateKind::*;
    MappingTable::new(ProgramFormat::Braket)
        .direct(
            &[I, X, Y, Z, H, S, Sdg, T, Tdg, SX, SXdg, CX, CY, CZ, Swap, ISwap, CCX, CSwap],
            fixed,
        )
        .direct(&[Rx, Ry, Rz, Rxx, Ryy, Rzz], rotation)
        .direct(&[Phase], phase)
        .direct(&[CPhase], cphase)
        .decompose(U3, u3)
        .matrix(&[RawUnitary], matrix_gate)
});

/// The Braket mapping table.
pub fn mapping_table() -> &'static MappingTable<Instruction, FreeParameter> {
    &TABLE
}

fn targets(qubits: &[QubitId]) -> Vec<u32> {
    qubits.iter().map(|q| q.0).collect()
}

fn named(kind: GateKind) -> Option<BraketGate> {
    Some(match kind {
        GateKind::I => BraketGate::I,
        GateKind::X => BraketGate::X,
        GateKind::Y => BraketGate::Y,
        GateKind::Z => BraketGate::Z,
        GateKind::H => BraketGate::H,
        GateKind::S => BraketGate::S,
        GateKind::Sdg => BraketGate::Si,
        GateKind::T => BraketGate::T,
        GateKind::Tdg => BraketGate::Ti,
        GateKind::SX => BraketGate::V,
        GateKind::SXdg => BraketGate::Vi,
        GateKind::CX => BraketGate::CNot,
        GateKind::CY => BraketGate::CY,
        GateKind::CZ => BraketGate::CZ,
        GateKind::Swap => BraketGate::Swap,
        GateKind::ISwap => BraketGate::ISwap,
        GateKind::CCX => BraketGate::CCNot,
        GateKind::CSwap => BraketGate::CSwap,
        _ => return None,
    })
}

fn instruction(gate: BraketGate, qubits: &[QubitId]) -> ConvertResult<Instruction> {
    Instruction::new(Operator::Gate(gate), targets(qubits))
}

fn fixed(gate: &CanonicalGate, _: &mut Ctx) -> ConvertResult<Instruction> {
    let braket = named(gate.kind()).ok_or(ConvertError::MappingGap {
        format: ProgramFormat::Braket,
        kind: gate.kind(),
    })?;
    instruction(braket, gate.qubits())
}

fn first_arg(gate: &CanonicalGate) -> ConvertResult<&Angle> {
    gate.args().first().ok_or_else(|| {
        ConvertError::invalid(ProgramFormat::Braket, format!("{gate} is missing its angle"))
    })
}

fn rotation(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<Instruction> {
    let angle = ctx.lower(first_arg(gate)?);
    let braket = match gate.kind() {
        GateKind::Rx => BraketGate::Rx(angle),
        GateKind::Ry => BraketGate::Ry(angle),
        GateKind::Rz => BraketGate::Rz(angle),
        GateKind::Rxx => BraketGate::XX(angle),
        GateKind::Ryy => BraketGate::YY(angle),
        _ => BraketGate::ZZ(angle),
    };
    instruction(braket, gate.qubits())
}

fn phase(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<Instruction> {
    let lambda = first_arg(gate)?;
    if let Some(braket) = ctx.well_known(lambda).and_then(|a| named(a.phase_alias())) {
        return instruction(braket, gate.qubits());
    }
    instruction(BraketGate::PhaseShift(ctx.lower(lambda)), gate.qubits())
}

fn cphase(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<Instruction> {
    let lambda = first_arg(gate)?;
    if let Some(braket) = ctx
        .well_known(lambda)
        .and_then(|a| a.cphase_alias())
        .and_then(named)
    {
        return instruction(braket, gate.qubits());
    }
    instruction(BraketGate::CPhaseShift(ctx.lower(lambda)), gate.qubits())
}

/// `U3(θ, φ, λ) ≅ Rz(φ) · Ry(θ) · Rz(λ)`.
fn u3(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<Vec<Instruction>> {
    let [theta, phi, lambda] = gate.args() else {
        return Err(ConvertError::invalid(
            ProgramFormat::Braket,
            format!("{gate} needs three angles"),
        ));
    };
    let q = gate.qubits();
    Ok(vec![
        instruction(BraketGate::Rz(ctx.lower(lambda)), q)?,
        instruction(BraketGate::Ry(ctx.lower(theta)), q)?,
        instruction(BraketGate::Rz(ctx.lower(phi)), q)?,
    ])
}

fn matrix_gate(matrix: &UnitaryMatrix, qubits: &[QubitId], _: &mut Ctx) -> ConvertResult<Instruction> {
    let gate = BraketGate::Unitary {
        matrix: matrix.clone(),
        display_name: "U".to_string(),
    };
    instruction(gate, qubits)
}

/// Exporter for Braket circuits.
///
/// Canonical qubit `i` becomes target `i`. Terminal measurements are
/// emitted as one `measure` instruction in measurement order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BraketExporter;

impl Exporter for BraketExporter {
    type Program = Circuit;

    fn format(&self) -> ProgramFormat {
        ProgramFormat::Braket
    }

    fn export(
        &self,
        circuit: &CanonicalCircuit,
        options: &ExportOptions,
    ) -> ConvertResult<Exported<Circuit>> {
        let mut ctx = Ctx::for_circuit(circuit, *options);
        let (instructions, emissions) = TABLE.emit_circuit(circuit, &mut ctx)?;

        let mut program = Circuit::new();
        if options.pad_idle_qubits {
            for q in (0..circuit.num_qubits()).map(QubitId) {
                if circuit.is_idle(q) {
                    program.add(BraketGate::I, [q.0])?;
                }
            }
        }
        program.instructions.extend(instructions);
        if !circuit.measurements().is_empty() {
            let measured: Vec<u32> = circuit.measurements().iter().map(|m| m.qubit.0).collect();
            program.measure(measured)?;
        }

        debug!(
            "braket: exported {} gates as {} instructions",
            circuit.num_gates(),
            program.instructions.len()
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
    use crate::import::BraketImporter;
    use qbridge_convert::{Importer, NativeProgram};
    use qbridge_ir::ParamId;
    use qbridge_unitary::{DEFAULT_ATOL, circuit_unitary, equivalent};
    use std::f64::consts::PI;

    fn export(circuit: &CanonicalCircuit) -> Exported<Circuit> {
        BraketExporter.export(circuit, &ExportOptions::default()).unwrap()
    }

    #[test]
    fn test_table_is_complete() {
        assert!(mapping_table().is_complete());
        let decomposed: Vec<GateKind> = GateKind::ALL
            .into_iter()
            .filter(|k| BraketExporter.strategy(*k) == Some(Strategy::Decompose))
            .collect();
        assert_eq!(decomposed, vec![GateKind::U3]);
    }

    #[test]
    fn test_toffoli_is_one_instruction() {
        let mut circuit = CanonicalCircuit::new(3, 0);
        circuit.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        let exported = export(&circuit);
        assert_eq!(exported.native_gate_count(), 1);
        assert_eq!(
            exported.program.instructions[0].operator,
            Operator::Gate(BraketGate::CCNot)
        );
    }

    #[test]
    fn test_cphase_at_pi_is_cz() {
        let mut circuit = CanonicalCircuit::new(2, 0);
        circuit
            .cp(PI, QubitId(0), QubitId(1))
            .unwrap()
            .cp(0.3, QubitId(0), QubitId(1))
            .unwrap();
        let exported = export(&circuit);
        let ops: Vec<&str> = exported.program.gates().map(BraketGate::name).collect();
        assert_eq!(ops, vec!["CZ", "CPhaseShift"]);
    }

    #[test]
    fn test_free_parameter_maps_back() {
        let mut circuit = CanonicalCircuit::new(1, 0);
        circuit.rx(ParamId::new(0, "theta"), QubitId(0)).unwrap();
        let exported = export(&circuit);
        assert_eq!(exported.param_map, vec![(ParamId::new(0, "theta"), "theta".to_string())]);
        assert_eq!(exported.program.parameters().len(), 1);

        let back = BraketImporter.import(&exported.program).unwrap();
        assert_eq!(back.circuit.params()[0].index, 0);

        let bound_native = exported
            .program
            .bind_parameters(&|name| (name == "theta").then_some(PI / 3.0));
        let bound = circuit.bind(&|p| (p.index == 0).then_some(PI / 3.0));
        assert!(equivalent(
            &bound_native.unitary().unwrap(),
            &circuit_unitary(&bound).unwrap(),
            DEFAULT_ATOL
        ));
    }

    #[test]
    fn test_raw_unitary_round_trip() {
        let mut circuit = CanonicalCircuit::new(2, 0);
        let m = qbridge_unitary::matrix::to_unitary(&qbridge_unitary::gates::iswap()).unwrap();
        circuit.unitary(m, &[QubitId(1), QubitId(0)]).unwrap();
        let exported = export(&circuit);
        assert_eq!(exported.emissions[0].strategy, Strategy::Matrix);
        assert!(equivalent(
            &exported.program.unitary().unwrap(),
            &circuit_unitary(&circuit).unwrap(),
            DEFAULT_ATOL
        ));
    }

    #[test]
    fn test_measurements_and_padding() {
        let mut circuit = CanonicalCircuit::new(3, 1);
        circuit.h(QubitId(0)).unwrap();
        circuit.measure(QubitId(0), qbridge_ir::ClbitId(0)).unwrap();
        let exported = export(&circuit);
        assert_eq!(exported.program.qubit_count(), 3);
        assert_eq!(
            exported.program.instructions.last().unwrap().operator,
            Operator::Measure
        );
        assert_eq!(exported.program.metadata().unwrap().num_clbits, 1);
    }
}
