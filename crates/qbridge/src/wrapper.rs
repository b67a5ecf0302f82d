//! The conversion façade.

use std::borrow::Cow;
use tracing::{debug, instrument};

use qbridge_convert::{ConvertResult, ProgramFormat, ProgramMetadata};
use qbridge_ir::ParamId;

use crate::config::ConversionConfig;
use crate::convert::convert_with;
use crate::error::{Stage, TranspileError, TranspileResult};
use crate::oracle::unitaries_allclose;
use crate::program::Program;

/// A source program plus metadata derived from it at construction.
///
/// ```rust
/// use qbridge::{ProgramFormat, ProgramWrapper};
/// use qbridge_adapter_cirq::{Circuit, CirqGate, Qid};
///
/// let mut circuit = Circuit::new();
/// circuit.push(CirqGate::h(), [Qid::Line(0)])?;
/// circuit.push(CirqGate::cnot(), [Qid::Line(0), Qid::Line(1)])?;
///
/// let wrapper = ProgramWrapper::new(circuit)?;
/// assert_eq!(wrapper.num_qubits(), 2);
/// let quil = wrapper.transpile(ProgramFormat::Quil)?;
/// assert_eq!(quil.as_quil().map(ToString::to_string).as_deref(), Some("H 0\nCNOT 0 1\n"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramWrapper {
    program: Program,
    qubits: Vec<String>,
    metadata: ProgramMetadata,
}

impl ProgramWrapper {
    /// Wrap a program, reading its metadata.
    pub fn new(program: impl Into<Program>) -> ConvertResult<Self> {
        let program = program.into();
        let metadata = program.metadata()?;
        let qubits = program.qubit_labels();
        Ok(Self {
            program,
            qubits,
            metadata,
        })
    }

    /// The wrapped program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Unwrap the program.
    pub fn into_program(self) -> Program {
        self.program
    }

    /// Format of the wrapped program.
    pub fn format(&self) -> ProgramFormat {
        self.program.format()
    }

    /// Native qubit labels in canonical order.
    pub fn qubits(&self) -> &[String] {
        &self.qubits
    }

    pub fn num_qubits(&self) -> usize {
        self.metadata.num_qubits
    }

    pub fn num_clbits(&self) -> usize {
        self.metadata.num_clbits
    }

    pub fn depth(&self) -> usize {
        self.metadata.depth
    }

    /// Free parameters in first-seen order.
    pub fn parameters(&self) -> &[ParamId] {
        &self.metadata.params
    }

    /// Each free parameter paired with the display name of the native
    /// symbol it was read from.
    pub fn input_param_mapping(&self) -> Vec<(ParamId, String)> {
        self.metadata
            .params
            .iter()
            .map(|p| (p.clone(), p.name.clone()))
            .collect()
    }

    pub fn metadata(&self) -> &ProgramMetadata {
        &self.metadata
    }

    /// Convert to `target` with the default configuration.
    ///
    /// Borrows the wrapped program when it is already in `target`.
    #[instrument(skip(self), fields(source = %self.format()))]
    pub fn transpile(&self, target: ProgramFormat) -> TranspileResult<Cow<'_, Program>> {
        self.transpile_with(target, &ConversionConfig::default())
    }

    /// [`Self::transpile`] with the target given as a tag such as
    /// `"braket"`.
    pub fn transpile_str(&self, target: &str) -> TranspileResult<Cow<'_, Program>> {
        let target: ProgramFormat = target
            .parse()
            .map_err(TranspileError::UnsupportedProgram)?;
        self.transpile(target)
    }

    /// Convert to `target` honouring `config`'s export options and, when
    /// enabled, checking the result against the source unitary.
    ///
    /// The check is skipped for programs with free parameters and for
    /// programs wider than `verify.max_qubits`.
    pub fn transpile_with(
        &self,
        target: ProgramFormat,
        config: &ConversionConfig,
    ) -> TranspileResult<Cow<'_, Program>> {
        config.validate()?;
        if self.format() == target {
            debug!("{} is already the target format", target);
            return Ok(Cow::Borrowed(&self.program));
        }
        let converted = convert_with(&self.program, target, &config.export)?.program;
        if config.verify.enabled {
            self.verify(&converted, config)?;
        }
        Ok(Cow::Owned(converted))
    }

    fn verify(&self, converted: &Program, config: &ConversionConfig) -> TranspileResult<()> {
        if !self.metadata.params.is_empty() {
            debug!("skipping verification: {} free parameters", self.metadata.params.len());
            return Ok(());
        }
        if self.num_qubits() > config.verify.max_qubits {
            debug!(
                "skipping verification: {} qubits exceeds {}",
                self.num_qubits(),
                config.verify.max_qubits
            );
            return Ok(());
        }
        let source = self
            .program
            .unitary()
            .map_err(|e| TranspileError::at(Stage::Import, self.format(), e))?;
        let target = converted
            .unitary()
            .map_err(|e| TranspileError::at(Stage::Export, converted.format(), e))?;
        let atol = config.verify.atol;
        if unitaries_allclose(&source, &target, atol, config.verify.strict_global_phase) {
            debug!("verified {} -> {} within {}", self.format(), converted.format(), atol);
            Ok(())
        } else {
            Err(TranspileError::VerificationFailed {
                source_format: self.format(),
                target: converted.format(),
                atol,
            })
        }
    }

    /// Bind free parameters by display name and re-read the metadata.
    pub fn bind_parameters(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> ConvertResult<Self> {
        Self::new(self.program.bind_parameters(lookup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbridge_adapter_qiskit::{Parameter, ParameterValue, QuantumCircuit};
    use std::f64::consts::PI;

    fn bell() -> QuantumCircuit {
        let mut circuit = QuantumCircuit::new(2, 2);
        circuit
            .h(0)
            .unwrap()
            .cx(0, 1)
            .unwrap()
            .measure(0, 0)
            .unwrap()
            .measure(1, 1)
            .unwrap();
        circuit
    }

    #[test]
    fn test_metadata() {
        let wrapper = ProgramWrapper::new(bell()).unwrap();
        assert_eq!(wrapper.num_qubits(), 2);
        assert_eq!(wrapper.num_clbits(), 2);
        assert_eq!(wrapper.depth(), 2);
        assert_eq!(wrapper.qubits().len(), 2);
        assert!(wrapper.parameters().is_empty());
    }

    #[test]
    fn test_identity_shortcut_borrows() {
        let wrapper = ProgramWrapper::new(bell()).unwrap();
        let out = wrapper.transpile(ProgramFormat::Qiskit).unwrap();
        assert!(matches!(out, Cow::Borrowed(p) if std::ptr::eq(p, wrapper.program())));
    }

    #[test]
    fn test_transpile_str() {
        let wrapper = ProgramWrapper::new(bell()).unwrap();
        let out = wrapper.transpile_str("braket").unwrap();
        assert_eq!(out.format(), ProgramFormat::Braket);
        let err = wrapper.transpile_str("pennylane").unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_verification() {
        let mut config = ConversionConfig::default();
        config.verify.enabled = true;
        let wrapper = ProgramWrapper::new(bell()).unwrap();
        for target in [ProgramFormat::Cirq, ProgramFormat::Braket, ProgramFormat::Quil] {
            assert!(wrapper.transpile_with(target, &config).is_ok(), "{target}");
        }

        // Without padding the idle qubit disappears from the Quil program.
        let mut idle = QuantumCircuit::new(2, 0);
        idle.h(0).unwrap();
        config.export.pad_idle_qubits = false;
        let err = ProgramWrapper::new(idle)
            .unwrap()
            .transpile_with(ProgramFormat::Quil, &config)
            .unwrap_err();
        assert!(matches!(err, TranspileError::VerificationFailed { .. }));
    }

    #[test]
    fn test_verification_skips_free_parameters() {
        let mut circuit = QuantumCircuit::new(1, 0);
        circuit.rx(ParameterValue::symbol(Parameter::new("theta")), 0).unwrap();
        let mut config = ConversionConfig::default();
        config.verify.enabled = true;
        let wrapper = ProgramWrapper::new(circuit).unwrap();
        let mapping = wrapper.input_param_mapping();
        assert_eq!(mapping.len(), 1);
        assert_eq!((mapping[0].0.index, mapping[0].1.as_str()), (0, "theta"));
        assert!(wrapper.transpile_with(ProgramFormat::Cirq, &config).is_ok());

        let bound = wrapper.bind_parameters(&|_| Some(PI / 3.0)).unwrap();
        assert!(bound.parameters().is_empty());
        assert!(bound.transpile_with(ProgramFormat::Cirq, &config).is_ok());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ConversionConfig::default();
        config.verify.atol = -1.0;
        let wrapper = ProgramWrapper::new(bell()).unwrap();
        let err = wrapper.transpile_with(ProgramFormat::Braket, &config).unwrap_err();
        assert!(matches!(err, TranspileError::Config(_)));
    }
}
