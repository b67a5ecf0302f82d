//! Canonical → Qiskit export.

use std::sync::LazyLock;
use tracing::debug;

use qbridge_convert::{
    ConvertError, ConvertResult, ExportContext, ExportOptions, Exported, Exporter, MappingTable,
    ProgramFormat, Strategy,
};
use qbridge_ir::{Angle, CanonicalCircuit, CanonicalGate, GateKind, QubitId, UnitaryMatrix};

use crate::model::{Parameter, QiskitGate, QuantumCircuit};

type Ctx = ExportContext<Parameter>;

/// A gate on flat qubit indices.
pub type GateOp = (QiskitGate, Vec<u32>);

static TABLE: LazyLock<MappingTable<GateOp, Parameter>> = LazyLock::new(|| {
    use GateKind::*;
    MappingTable::new(ProgramFormat::Qiskit)
        .direct(
            &[I, X, Y, Z, H, S, Sdg, T, Tdg, SX, SXdg, CX, CY, CZ, Swap, ISwap, CCX, CSwap],
            fixed,
        )
        .direct(&[Rx, Ry, Rz, Rxx, Ryy, Rzz], rotation)
        .direct(&[Phase], phase)
        .direct(&[CPhase], cphase)
        .direct(&[U3], u)
        .matrix(&[RawUnitary], matrix_gate)
});

/// The Qiskit mapping table.
pub fn mapping_table() -> &'static MappingTable<GateOp, Parameter> {
    &TABLE
}

fn indices(qubits: &[QubitId]) -> Vec<u32> {
    qubits.iter().map(|q| q.0).collect()
}

fn named(kind: GateKind) -> Option<QiskitGate> {
    Some(match kind {
        GateKind::I => QiskitGate::I,
        GateKind::X => QiskitGate::X,
        GateKind::Y => QiskitGate::Y,
        GateKind::Z => QiskitGate::Z,
        GateKind::H => QiskitGate::H,
        GateKind::S => QiskitGate::S,
        GateKind::Sdg => QiskitGate::Sdg,
        GateKind::T => QiskitGate::T,
        GateKind::Tdg => QiskitGate::Tdg,
        GateKind::SX => QiskitGate::SX,
        GateKind::SXdg => QiskitGate::SXdg,
        GateKind::CX => QiskitGate::CX,
        GateKind::CY => QiskitGate::CY,
        GateKind::CZ => QiskitGate::CZ,
        GateKind::Swap => QiskitGate::Swap,
        GateKind::ISwap => QiskitGate::ISwap,
        GateKind::CCX => QiskitGate::CCX,
        GateKind::CSwap => QiskitGate::CSwap,
        _ => return None,
    })
}

fn fixed(gate: &CanonicalGate, _: &mut Ctx) -> ConvertResult<GateOp> {
    let qiskit = named(gate.kind()).ok_or(ConvertError::MappingGap {
        format: ProgramFormat::Qiskit,
        kind: gate.kind(),
    })?;
    Ok((qiskit, indices(gate.qubits())))
}

fn first_arg(gate: &CanonicalGate) -> ConvertResult<&Angle> {
    gate.args().first().ok_or_else(|| {
        ConvertError::invalid(ProgramFormat::Qiskit, format!("{gate} is missing its angle"))
    })
}

fn rotation(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<GateOp> {
    let angle = ctx.lower(first_arg(gate)?);
    let qiskit = match gate.kind() {
        GateKind::Rx => QiskitGate::RX(angle),
        GateKind::Ry => QiskitGate::RY(angle),
        GateKind::Rz => QiskitGate::RZ(angle),
        GateKind::Rxx => QiskitGate::RXX(angle),
        GateKind::Ryy => QiskitGate::RYY(angle),
        _ => QiskitGate::RZZ(angle),
    };
    Ok((qiskit, indices(gate.qubits())))
}

fn phase(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<GateOp> {
    let lambda = first_arg(gate)?;
    let qiskit = match ctx.well_known(lambda).and_then(|a| named(a.phase_alias())) {
        Some(g) => g,
        None => QiskitGate::P(ctx.lower(lambda)),
    };
    Ok((qiskit, indices(gate.qubits())))
}

fn cphase(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<GateOp> {
    let lambda = first_arg(gate)?;
    let snapped = ctx
        .well_known(lambda)
        .and_then(|a| a.cphase_alias())
        .and_then(named);
    let qiskit = match snapped {
        Some(g) => g,
        None => QiskitGate::CP(ctx.lower(lambda)),
    };
    Ok((qiskit, indices(gate.qubits())))
}

/// Qiskit's `U` is `U3` exactly, phase included.
fn u(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<GateOp> {
    let [theta, phi, lambda] = gate.args() else {
        return Err(ConvertError::invalid(
            ProgramFormat::Qiskit,
            format!("{gate} needs three angles"),
        ));
    };
    let qiskit = QiskitGate::U(ctx.lower(theta), ctx.lower(phi), ctx.lower(lambda));
    Ok((qiskit, indices(gate.qubits())))
}

fn matrix_gate(matrix: &UnitaryMatrix, qubits: &[QubitId], _: &mut Ctx) -> ConvertResult<GateOp> {
    Ok((QiskitGate::Unitary(matrix.reverse_qubit_order()), indices(qubits)))
}

/// Exporter for Qiskit circuits.
///
/// Emits one register `q` holding every canonical qubit and, when the
/// circuit has classical bits, one register `c`. Canonical qubit `i` is
/// `q[i]`; measurements keep their classical bit.
#[derive(Debug, Clone, Copy, Default)]
pub struct QiskitExporter;

impl Exporter for QiskitExporter {
    type Program = QuantumCircuit;

    fn format(&self) -> ProgramFormat {
        ProgramFormat::Qiskit
    }

    fn export(
        &self,
        circuit: &CanonicalCircuit,
        options: &ExportOptions,
    ) -> ConvertResult<Exported<QuantumCircuit>> {
        let mut ctx = Ctx::for_circuit(circuit, *options);
        let (ops, emissions) = TABLE.emit_circuit(circuit, &mut ctx)?;

        let mut program = QuantumCircuit::new(circuit.num_qubits(), circuit.num_clbits());
        for (gate, qubits) in ops {
            program.gate(gate, &qubits)?;
        }
        for m in circuit.measurements() {
            program.measure(m.qubit.0, m.clbit.0)?;
        }

        debug!(
            "qiskit: exported {} gates as {} instructions",
            circuit.num_gates(),
            program.data.len()
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
