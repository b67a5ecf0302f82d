//! Import → canonical circuit → export.

use tracing::{debug, instrument};

use qbridge_adapter_braket::{BraketExporter, BraketImporter};
use qbridge_adapter_cirq::{CirqExporter, CirqImporter};
use qbridge_adapter_qiskit::{QiskitExporter, QiskitImporter};
use qbridge_adapter_quil::{QuilExporter, QuilImporter};
use qbridge_convert::{
    ConvertResult, ExportOptions, Exported, Exporter, Importer, ProgramFormat, Strategy,
};
use qbridge_ir::{CanonicalCircuit, GateKind};

use crate::error::{Stage, TranspileError, TranspileResult};
use crate::program::Program;

/// Import any program into the canonical model.
pub fn import(program: &Program) -> ConvertResult<CanonicalCircuit> {
    let circuit = match program {
        Program::Cirq(c) => CirqImporter.import(c)?.into_circuit(),
        Program::Braket(c) => BraketImporter.import(c)?.into_circuit(),
        Program::Qiskit(c) => QiskitImporter.import(c)?.into_circuit(),
        Program::Quil(p) => QuilImporter.import(p)?.into_circuit(),
    };
    Ok(circuit)
}

fn lift<P: Into<Program>>(exported: Exported<P>) -> Exported<Program> {
    Exported {
        program: exported.program.into(),
        param_map: exported.param_map,
        emissions: exported.emissions,
    }
}

/// Export a canonical circuit to `target`.
pub fn export(
    circuit: &CanonicalCircuit,
    target: ProgramFormat,
    options: &ExportOptions,
) -> ConvertResult<Exported<Program>> {
    Ok(match target {
        ProgramFormat::Cirq => lift(CirqExporter.export(circuit, options)?),
        ProgramFormat::Braket => lift(BraketExporter.export(circuit, options)?),
        ProgramFormat::Qiskit => lift(QiskitExporter.export(circuit, options)?),
        ProgramFormat::Quil => lift(QuilExporter.export(circuit, options)?),
    })
}

/// Mapping-table strategy `target` uses for `kind`.
pub fn strategy(target: ProgramFormat, kind: GateKind) -> Option<Strategy> {
    match target {
        ProgramFormat::Cirq => CirqExporter.strategy(kind),
        ProgramFormat::Braket => BraketExporter.strategy(kind),
        ProgramFormat::Qiskit => QiskitExporter.strategy(kind),
        ProgramFormat::Quil => QuilExporter.strategy(kind),
    }
}

/// Kinds `target`'s mapping table has no entry for.
pub fn missing(target: ProgramFormat) -> Vec<GateKind> {
    GateKind::ALL
        .into_iter()
        .filter(|k| strategy(target, *k).is_none())
        .collect()
}

/// Import, then export with the given options.
///
/// Always runs both halves, even when `target` is the program's own
/// format.
pub fn convert_with(
    program: &Program,
    target: ProgramFormat,
    options: &ExportOptions,
) -> TranspileResult<Exported<Program>> {
    let source = program.format();
    let circuit = import(program).map_err(|e| TranspileError::at(Stage::Import, source, e))?;
    debug!(
        "{} -> canonical: {} gates on {} qubits, depth {}",
        source,
        circuit.num_gates(),
        circuit.num_qubits(),
        circuit.depth()
    );
    let exported =
        export(&circuit, target, options).map_err(|e| TranspileError::at(Stage::Export, target, e))?;
    debug!(
        "canonical -> {}: {} native gates",
        target,
        exported.native_gate_count()
    );
    Ok(exported)
}

/// Convert `program` to `target`.
///
/// A program already in `target` is returned as is.
#[instrument(skip(program), fields(source = %program.format()))]
pub fn convert(program: &Program, target: ProgramFormat) -> TranspileResult<Program> {
    if program.format() == target {
        debug!("{} is already the target format", target);
        return Ok(program.clone());
    }
    Ok(convert_with(program, target, &ExportOptions::default())?.program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbridge_adapter_qiskit::QuantumCircuit;

    #[test]
    fn test_every_table_is_complete() {
        for format in ProgramFormat::ALL {
            assert!(missing(format).is_empty(), "{format}");
            assert_eq!(strategy(format, GateKind::RawUnitary), Some(Strategy::Matrix));
        }
    }

    #[test]
    fn test_identity_shortcut_returns_same_program() {
        let mut circuit = QuantumCircuit::new(2, 0);
        circuit.h(0).unwrap().cx(0, 1).unwrap();
        let program = Program::from(circuit);
        assert_eq!(convert(&program, ProgramFormat::Qiskit).unwrap(), program);
    }

    #[test]
    fn test_reset_fails_on_import() {
        let mut circuit = QuantumCircuit::new(1, 0);
        circuit.h(0).unwrap().reset(0).unwrap();
        let err = convert(&circuit.into(), ProgramFormat::Braket).unwrap_err();
        assert!(err.is_unsupported());
        assert!(err.to_string().contains("reset"));
    }
}
