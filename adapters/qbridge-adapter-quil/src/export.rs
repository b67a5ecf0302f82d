//! Canonical → Quil export.

use std::f64::consts::FRAC_PI_2;
use std::sync::LazyLock;
use tracing::debug;

use qbridge_convert::{
    ConvertError, ConvertResult, ExportContext, ExportOptions, Exported, Exporter, MappingTable,
    ProgramFormat, Strategy,
};
use qbridge_ir::{Angle, CanonicalCircuit, CanonicalGate, GateKind, QubitId, UnitaryMatrix};

use crate::model::{GateApplication, Instruction, MemoryRef, MemoryType, Program, QuilGate, Value};

type Ctx = ExportContext<MemoryRef>;

/// One rendered operation.
///
/// Matrices become `DEFGATE`s when the program is assembled; identical
/// matrices share one definition.
#[derive(Debug, Clone, PartialEq)]
pub enum QuilOp {
    /// A gate application.
    Gate(GateApplication),
    /// An arbitrary unitary on `qubits`, big-endian.
    Matrix {
        matrix: UnitaryMatrix,
        qubits: Vec<u32>,
    },
}

static TABLE: LazyLock<MappingTable<QuilOp, MemoryRef>> = LazyLock::new(|| {
    use GateKind::*;
    MappingTable::new(ProgramFormat::Quil)
        .direct(
            &[I, X, Y, Z, H, S, Sdg, T, Tdg, CX, CY, CZ, Swap, ISwap, CCX, CSwap],
            fixed,
        )
        .direct(&[Rx, Ry, Rz], rotation)
        .direct(&[Phase], phase)
        .direct(&[CPhase], cphase)
        .decompose(SX, sx)
        .decompose(SXdg, sx)
        .decompose(U3, u3)
        .decompose(Rxx, rxx)
        .decompose(Ryy, ryy)
        .decompose(Rzz, rzz)
        .matrix(&[RawUnitary], matrix_gate)
});

/// The Quil mapping table.
pub fn mapping_table() -> &'static MappingTable<QuilOp, MemoryRef> {
    &TABLE
}

fn targets(qubits: &[QubitId]) -> Vec<u32> {
    qubits.iter().map(|q| q.0).collect()
}

/// Application for a fixed kind. `Sdg`, `Tdg` and `CY` use modifiers.
fn named(kind: GateKind, qubits: &[u32]) -> Option<GateApplication> {
    let plain = |gate| Some(GateApplication::new(gate, qubits));
    match kind {
        GateKind::I => plain(QuilGate::I),
        GateKind::X => plain(QuilGate::X),
        GateKind::Y => plain(QuilGate::Y),
        GateKind::Z => plain(QuilGate::Z),
        GateKind::H => plain(QuilGate::H),
        GateKind::S => plain(QuilGate::S),
        GateKind::T => plain(QuilGate::T),
        GateKind::Sdg => plain(QuilGate::S).map(GateApplication::dagger),
        GateKind::Tdg => plain(QuilGate::T).map(GateApplication::dagger),
        GateKind::CX => plain(QuilGate::CNOT),
        GateKind::CY => match qubits {
            [control, target] => {
                Some(GateApplication::new(QuilGate::Y, [*target]).controlled(*control))
            }
            _ => None,
        },
        GateKind::CZ => plain(QuilGate::CZ),
        GateKind::Swap => plain(QuilGate::SWAP),
        GateKind::ISwap => plain(QuilGate::ISWAP),
        GateKind::CCX => plain(QuilGate::CCNOT),
        GateKind::CSwap => plain(QuilGate::CSWAP),
        _ => None,
    }
}

fn fixed(gate: &CanonicalGate, _: &mut Ctx) -> ConvertResult<QuilOp> {
    named(gate.kind(), &targets(gate.qubits()))
        .map(QuilOp::Gate)
        .ok_or(ConvertError::MappingGap {
            format: ProgramFormat::Quil,
            kind: gate.kind(),
        })
}

fn first_arg(gate: &CanonicalGate) -> ConvertResult<&Angle> {
    gate.args().first().ok_or_else(|| {
        ConvertError::invalid(ProgramFormat::Quil, format!("{gate} is missing its angle"))
    })
}

fn op(gate: QuilGate, qubits: &[u32]) -> QuilOp {
    QuilOp::Gate(GateApplication::new(gate, qubits))
}

fn rotation(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<QuilOp> {
    let angle = ctx.lower(first_arg(gate)?);
    let quil = match gate.kind() {
        GateKind::Rx => QuilGate::RX(angle),
        GateKind::Ry => QuilGate::RY(angle),
        _ => QuilGate::RZ(angle),
    };
    Ok(op(quil, &targets(gate.qubits())))
}

fn phase(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<QuilOp> {
    let lambda = first_arg(gate)?;
    let qubits = targets(gate.qubits());
    if let Some(app) = ctx.well_known(lambda).and_then(|a| named(a.phase_alias(), &qubits)) {
        return Ok(QuilOp::Gate(app));
    }
    Ok(op(QuilGate::PHASE(ctx.lower(lambda)), &qubits))
}

fn cphase(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<QuilOp> {
    let lambda = first_arg(gate)?;
    let qubits = targets(gate.qubits());
    if let Some(app) = ctx
        .well_known(lambda)
        .and_then(|a| a.cphase_alias())
        .and_then(|kind| named(kind, &qubits))
    {
        return Ok(QuilOp::Gate(app));
    }
    Ok(op(QuilGate::CPHASE(ctx.lower(lambda)), &qubits))
}

/// `SX ≅ RX(π/2)`, `SXdg ≅ RX(-π/2)`.
fn sx(gate: &CanonicalGate, _: &mut Ctx) -> ConvertResult<Vec<QuilOp>> {
    let theta = if gate.kind() == GateKind::SX { FRAC_PI_2 } else { -FRAC_PI_2 };
    Ok(vec![op(QuilGate::RX(theta.into()), &targets(gate.qubits()))])
}

/// `U3(θ, φ, λ) ≅ RZ(φ) · RY(θ) · RZ(λ)`.
fn u3(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<Vec<QuilOp>> {
    let [theta, phi, lambda] = gate.args() else {
        return Err(ConvertError::invalid(
            ProgramFormat::Quil,
            format!("{gate} needs three angles"),
        ));
    };
    let q = targets(gate.qubits());
    Ok(vec![
        op(QuilGate::RZ(ctx.lower(lambda)), &q),
        op(QuilGate::RY(ctx.lower(theta)), &q),
        op(QuilGate::RZ(ctx.lower(phi)), &q),
    ])
}

fn pair(gate: &CanonicalGate) -> ConvertResult<(u32, u32)> {
    match gate.qubits() {
        [a, b] => Ok((a.0, b.0)),
        _ => Err(ConvertError::invalid(
            ProgramFormat::Quil,
            format!("{gate} needs two qubits"),
        )),
    }
}

/// `Rzz(θ) = CNOT · RZ(θ)_b · CNOT`, exactly.
fn zz(a: u32, b: u32, theta: Value) -> Vec<QuilOp> {
    vec![
        op(QuilGate::CNOT, &[a, b]),
        op(QuilGate::RZ(theta), &[b]),
        op(QuilGate::CNOT, &[a, b]),
    ]
}

/// Conjugate `Rzz` by a single-qubit basis change on both qubits.
fn conjugated(a: u32, b: u32, theta: Value, before: QuilGate, after: QuilGate) -> Vec<QuilOp> {
    let mut ops = vec![op(before.clone(), &[a]), op(before, &[b])];
    ops.extend(zz(a, b, theta));
    ops.push(op(after.clone(), &[a]));
    ops.push(op(after, &[b]));
    ops
}

fn rzz(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<Vec<QuilOp>> {
    let (a, b) = pair(gate)?;
    Ok(zz(a, b, ctx.lower(first_arg(gate)?)))
}

fn rxx(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<Vec<QuilOp>> {
    let (a, b) = pair(gate)?;
    let theta = ctx.lower(first_arg(gate)?);
    Ok(conjugated(a, b, theta, QuilGate::H, QuilGate::H))
}

fn ryy(gate: &CanonicalGate, ctx: &mut Ctx) -> ConvertResult<Vec<QuilOp>> {
    let (a, b) = pair(gate)?;
    let theta = ctx.lower(first_arg(gate)?);
    Ok(conjugated(
        a,
        b,
        theta,
        QuilGate::RX(FRAC_PI_2.into()),
        QuilGate::RX((-FRAC_PI_2).into()),
    ))
}

fn matrix_gate(matrix: &UnitaryMatrix, qubits: &[QubitId], _: &mut Ctx) -> ConvertResult<QuilOp> {
    Ok(QuilOp::Matrix {
        matrix: matrix.clone(),
        qubits: targets(qubits),
    })
}

/// Replace matrix operations by applications of shared `DEFGATE`s named
/// `UNITARY0`, `UNITARY1`, ... in first-use order.
fn define_matrices(ops: Vec<QuilOp>) -> (Vec<(String, UnitaryMatrix)>, Vec<GateApplication>) {
    let mut definitions: Vec<(String, UnitaryMatrix)> = Vec::new();
    let mut gates = Vec::with_capacity(ops.len());
    for op in ops {
        match op {
            QuilOp::Gate(app) => gates.push(app),
            QuilOp::Matrix { matrix, qubits } => {
                let name = match definitions.iter().find(|(_, m)| *m == matrix) {
                    Some((name, _)) => name.clone(),
                    None => {
                        let name = format!("UNITARY{}", definitions.len());
                        definitions.push((name.clone(), matrix));
                        name
                    }
                };
                gates.push(GateApplication::new(QuilGate::Defined(name), qubits));
            }
        }
    }
    (definitions, gates)
}

/// Exporter for Quil programs.
///
/// Canonical qubit `i` becomes Quil qubit `i`. Classical bits are the
/// `ro` region, and each free parameter gets its own `REAL[1]` region
/// named after it.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuilExporter;

impl Exporter for QuilExporter {
    type Program = Program;

    fn format(&self) -> ProgramFormat {
        ProgramFormat::Quil
    }

    fn export(
        &self,
        circuit: &CanonicalCircuit,
        options: &ExportOptions,
    ) -> ConvertResult<Exported<Program>> {
        let mut ctx = Ctx::for_circuit(circuit, *options);
        let (ops, emissions) = TABLE.emit_circuit(circuit, &mut ctx)?;
        let (definitions, gates) = define_matrices(ops);

        let mut program = Program::new();
        if circuit.num_clbits() > 0 {
            program.declare("ro", MemoryType::Bit, circuit.num_clbits())?;
        }
        for (_, symbol) in ctx.symbols() {
            program.declare(symbol.name, MemoryType::Real, 1)?;
        }
        for (name, matrix) in definitions {
            program.defgate(name, matrix)?;
        }
        if options.pad_idle_qubits {
            for q in (0..circuit.num_qubits()).map(QubitId) {
                if circuit.is_idle(q) {
                    program.gate(QuilGate::I, &[q.0])?;
                }
            }
        }
        for app in gates {
            program.push(Instruction::Gate(app))?;
        }
        for m in circuit.measurements() {
            program.measure(m.qubit.0, m.clbit.0)?;
        }

        debug!(
            "quil: exported {} gates as {} instructions",
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
