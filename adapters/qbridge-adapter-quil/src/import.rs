//! Quil → canonical import.

use rustc_hash::FxHashMap;
use std::sync::LazyLock;
use tracing::{debug, trace};

use qbridge_convert::{
    ConvertError, ConvertResult, ImportState, ImportedCircuit, Importer, ProgramFormat,
};
use qbridge_ir::{Angle, CanonicalGate, ClbitId, GateKind, QubitId};
use qbridge_unitary::matrix::to_unitary;

use crate::model::{GateApplication, Instruction, MemoryRef, Program};
use crate::unitary::application_unitary;

type State = ImportState<u32, MemoryRef>;

/// Standard gates with a canonical kind of the same arity, keyed by
/// `(name, qubit count)` before modifiers.
static DISPATCH: LazyLock<FxHashMap<(&'static str, u32), GateKind>> = LazyLock::new(|| {
    [
        ("I", 1, GateKind::I),
        ("X", 1, GateKind::X),
        ("Y", 1, GateKind::Y),
        ("Z", 1, GateKind::Z),
        ("H", 1, GateKind::H),
        ("S", 1, GateKind::S),
        ("T", 1, GateKind::T),
        ("RX", 1, GateKind::Rx),
        ("RY", 1, GateKind::Ry),
        ("RZ", 1, GateKind::Rz),
        ("PHASE", 1, GateKind::Phase),
        ("CNOT", 2, GateKind::CX),
        ("CZ", 2, GateKind::CZ),
        ("SWAP", 2, GateKind::Swap),
        ("ISWAP", 2, GateKind::ISwap),
        ("CPHASE", 2, GateKind::CPhase),
        ("CCNOT", 3, GateKind::CCX),
        ("CSWAP", 3, GateKind::CSwap),
    ]
    .into_iter()
    .map(|(name, arity, kind)| ((name, arity), kind))
    .collect()
});

/// Canonical form of `DAGGER kind(args)`, when one exists.
fn dagger(kind: GateKind, args: Vec<Angle>) -> Option<(GateKind, Vec<Angle>)> {
    let kind = match kind {
        GateKind::S => GateKind::Sdg,
        GateKind::Sdg => GateKind::S,
        GateKind::T => GateKind::Tdg,
        GateKind::Tdg => GateKind::T,
        GateKind::SX => GateKind::SXdg,
        GateKind::SXdg => GateKind::SX,
        GateKind::I
        | GateKind::X
        | GateKind::Y
        | GateKind::Z
        | GateKind::H
        | GateKind::CX
        | GateKind::CY
        | GateKind::CZ
        | GateKind::Swap
        | GateKind::CCX
        | GateKind::CSwap => kind,
        GateKind::Rx
        | GateKind::Ry
        | GateKind::Rz
        | GateKind::Phase
        | GateKind::CPhase
        | GateKind::Rxx
        | GateKind::Ryy
        | GateKind::Rzz => {
            let args = args.into_iter().map(|a| (-a).simplify()).collect();
            return Some((kind, args));
        }
        _ => return None,
    };
    Some((kind, args))
}

/// Canonical form of `CONTROLLED kind`, when one exists.
fn control(kind: GateKind) -> Option<GateKind> {
    match kind {
        GateKind::X => Some(GateKind::CX),
        GateKind::Y => Some(GateKind::CY),
        GateKind::Z => Some(GateKind::CZ),
        GateKind::Phase => Some(GateKind::CPhase),
        GateKind::CX => Some(GateKind::CCX),
        GateKind::Swap => Some(GateKind::CSwap),
        _ => None,
    }
}

/// Structural rewrite of a standard gate with its modifiers.
fn native_kind(app: &GateApplication, state: &mut State) -> Option<(GateKind, Vec<Angle>)> {
    let arity = app.gate.num_qubits()?;
    let mut kind = *DISPATCH.get(&(app.gate.name(), arity))?;
    let mut args: Vec<Angle> = app.gate.param().map(|v| state.lower(v)).into_iter().collect();
    if app.is_inverted() {
        (kind, args) = dagger(kind, args)?;
    }
    for _ in 0..app.num_controls() {
        kind = control(kind)?;
    }
    Some((kind, args))
}

fn convert_gate(
    app: &GateApplication,
    program: &Program,
    qubits: &[QubitId],
    state: &mut State,
) -> ConvertResult<CanonicalGate> {
    if let Some((kind, args)) = native_kind(app, state) {
        return Ok(CanonicalGate::new(kind, qubits, args)?);
    }
    if app.gate.is_parameterized() {
        return Err(ConvertError::unsupported(
            ProgramFormat::Quil,
            app.to_string(),
            "symbolic gate has no canonical equivalent and no numeric matrix",
        ));
    }
    debug!("quil: {} has no canonical equivalent, using its matrix", app);
    let matrix = to_unitary(&application_unitary(app, program)?)?;
    Ok(CanonicalGate::raw_unitary(matrix, qubits)?)
}

/// Importer for Quil programs.
///
/// Qubits are numbered by ascending index. `MEASURE q ro[k]` fills the
/// classical bit at `ro[k]`'s position across the declared `BIT`
/// regions.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuilImporter;

impl Importer for QuilImporter {
    type Program = Program;
    type Qubit = u32;
    type Symbol = MemoryRef;

    fn format(&self) -> ProgramFormat {
        ProgramFormat::Quil
    }

    fn import(&self, program: &Program) -> ConvertResult<ImportedCircuit<u32, MemoryRef>> {
        let mut state = State::new(ProgramFormat::Quil);
        state.declare_qubits(&program.qubits());
        state.declare_clbits(program.num_bits());

        for inst in &program.instructions {
            match inst {
                Instruction::Gate(app) => {
                    let qubits = state.operands(&app.qubits);
                    let canonical = convert_gate(app, program, &qubits, &mut state)?;
                    trace!("quil: {} -> {}", app, canonical);
                    state.push(canonical)?;
                }
                Instruction::Measure { qubit, target } => {
                    let q = state.qubit(qubit);
                    match target {
                        Some(cell) => {
                            let bit = program.bit_index(cell).ok_or_else(|| {
                                ConvertError::invalid(
                                    ProgramFormat::Quil,
                                    format!("{inst}: {cell} is not a declared BIT cell"),
                                )
                            })?;
                            state.measure_into(q, ClbitId(bit))?;
                        }
                        None => {
                            state.measure(q)?;
                        }
                    }
                }
                Instruction::Reset(_) => {
                    return Err(ConvertError::unsupported(
                        ProgramFormat::Quil,
                        inst.to_string(),
                        "reset is not unitary",
                    ));
                }
                other if other.is_control_flow() => {
                    return Err(ConvertError::unsupported(
                        ProgramFormat::Quil,
                        other.to_string(),
                        "classical control flow has no canonical equivalent",
                    ));
                }
                Instruction::Pragma(_) | Instruction::Halt => {
                    debug!("quil: dropping {}", inst);
                }
                _ => {}
            }
        }

        let imported = state.finish();
        debug!(
            "quil: imported {} gates on {} qubits",
            imported.circuit.num_gates(),
            imported.circuit.num_qubits()
        );
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use qbridge_convert::NativeProgram;
    use qbridge_unitary::{DEFAULT_ATOL, circuit_unitary, equivalent};

    fn import(source: &str) -> ImportedCircuit<u32, MemoryRef> {
        let program: Program = source.parse().unwrap();
        QuilImporter.import(&program).unwrap()
    }

    fn kinds(source: &str) -> Vec<GateKind> {
        import(source).circuit.gates().iter().map(|g| g.kind()).collect()
    }

    #[test]
    fn test_direct_gates() {
        assert_eq!(
            kinds("H 0\nCNOT 0 1\nPHASE(0.3) 1\nCCNOT 0 1 2\nISWAP 2 0"),
            vec![GateKind::H, GateKind::CX, GateKind::Phase, GateKind::CCX, GateKind::ISwap]
        );
    }

    #[test]
    fn test_modifiers_rewrite_structurally() {
        assert_eq!(
            kinds("DAGGER S 0\nDAGGER T 1\nCONTROLLED Y 0 1\nCONTROLLED CONTROLLED X 0 1 2\nCONTROLLED SWAP 0 1 2\nDAGGER DAGGER S 0"),
            vec![GateKind::Sdg, GateKind::Tdg, GateKind::CY, GateKind::CCX, GateKind::CSwap, GateKind::S]
        );
        let imported = import("DAGGER RX(0.5) 0");
        assert_eq!(imported.circuit.gates()[0].args()[0].as_f64(), Some(-0.5));
    }

    #[test]
    fn test_matrix_fallback_matches_native() {
        let source = "DEFGATE SQRTX:\n    0.5+0.5i, 0.5-0.5i\n    0.5-0.5i, 0.5+0.5i\nSQRTX 3\nPSWAP(0.4) 3 1\nCONTROLLED RX(0.2) 1 3\nDAGGER XY(0.7) 1 3";
        let program: Program = source.parse().unwrap();
        let imported = QuilImporter.import(&program).unwrap();
        assert!(imported
            .circuit
            .gates()
            .iter()
            .all(|g| g.kind() == GateKind::RawUnitary));
        assert!(equivalent(
            &program.unitary().unwrap(),
            &circuit_unitary(&imported.circuit).unwrap(),
            DEFAULT_ATOL
        ));
    }

    #[test]
    fn test_symbolic_fallback_is_unsupported() {
        let err = QuilImporter
            .import(&"DECLARE t REAL[1]\nPSWAP(t) 0 1".parse().unwrap())
            .unwrap_err();
        assert!(err.is_unsupported());
        assert!(err.to_string().contains("PSWAP"));
    }

    #[test]
    fn test_measurements_follow_memory_layout() {
        let imported = import("DECLARE ro BIT[2]\nDECLARE aux BIT[2]\nH 5\nMEASURE 5 aux[1]\nMEASURE 2 ro[0]");
        assert_eq!(imported.circuit.num_clbits(), 4);
        assert_eq!(imported.qubit_map.get(&2), Some(QubitId(0)));
        assert_eq!(imported.qubit_map.get(&5), Some(QubitId(1)));
        let targets: Vec<u32> = imported.circuit.measurements().iter().map(|m| m.clbit.0).collect();
        assert_eq!(targets, vec![3, 0]);

        let bad: Program = "DECLARE theta REAL[1]\nMEASURE 0 theta[0]".parse().unwrap();
        assert!(QuilImporter.import(&bad).is_err());
    }

    #[test]
    fn test_non_unitary_instructions() {
        let program: Program = "H 0\nRESET".parse().unwrap();
        assert!(QuilImporter.import(&program).unwrap_err().is_unsupported());
        let program: Program = "LABEL @loop\nH 0\nJUMP @loop".parse().unwrap();
        assert!(QuilImporter.import(&program).unwrap_err().to_string().contains("LABEL"));
        assert_eq!(kinds("PRAGMA INITIAL_REWIRING \"NAIVE\"\nH 0\nHALT"), vec![GateKind::H]);
    }

    #[test]
    fn test_parameters_by_memory_cell() {
        let mut program = Program::new();
        program
            .declare("theta", crate::model::MemoryType::Real, 2)
            .unwrap()
            .rx(Value::symbol(MemoryRef::new("theta", 1)), 0)
            .unwrap()
            .rz(Value::symbol(MemoryRef::from("theta")), 0)
            .unwrap();
        let imported = QuilImporter.import(&program).unwrap();
        let names: Vec<String> = imported.circuit.params().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["theta[1]".to_string(), "theta".to_string()]);
    }
}
