//! Conversion walkthroughs.

use std::f64::consts::PI;

use anyhow::Context;

use qbridge::{
    ExportOptions, GateKind, Program, ProgramFormat, Strategy, TranspileError, circuits_allclose,
    convert_with,
};
use qbridge_adapter_braket as braket;
use qbridge_adapter_cirq::{Circuit, CirqGate, EigenPow, Qid};
use qbridge_adapter_qiskit::{Parameter, ParameterValue, QuantumCircuit};

/// One scenario run against one target.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub target: ProgramFormat,
    pub passed: bool,
    pub detail: String,
}

/// A named scenario with one outcome per target.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub title: &'static str,
    pub source: ProgramFormat,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }
}

fn targets(source: ProgramFormat) -> impl Iterator<Item = ProgramFormat> {
    ProgramFormat::ALL.into_iter().filter(move |t| *t != source)
}

fn run(
    title: &'static str,
    source: Program,
    mut check: impl FnMut(&Program, ProgramFormat) -> anyhow::Result<(bool, String)>,
) -> anyhow::Result<ScenarioReport> {
    let format = source.format();
    let mut outcomes = Vec::new();
    for target in targets(format) {
        let (passed, detail) = check(&source, target)?;
        outcomes.push(ScenarioOutcome {
            target,
            passed,
            detail,
        });
    }
    Ok(ScenarioReport {
        title,
        source: format,
        outcomes,
    })
}

/// `H(q0); CNOT(q0, q1)` must reproduce `CNOT·(H⊗I)`.
pub fn bell() -> anyhow::Result<ScenarioReport> {
    let mut circuit = braket::Circuit::new();
    circuit.h(0)?.cnot(0, 1)?;
    run("Bell pair", circuit.into(), |source, target| {
        let exported = convert_with(source, target, &ExportOptions::default())?;
        let ok = circuits_allclose(source, &exported.program, false)?;
        Ok((ok, format!("{} native gates", exported.native_gate_count())))
    })
}

/// A `-1/14` power of H has no direct equivalent anywhere.
pub fn fractional_power() -> anyhow::Result<ScenarioReport> {
    let mut circuit = Circuit::new();
    circuit.push(CirqGate::HPow(EigenPow::new(-1.0 / 14.0)), [Qid::Line(0)])?;
    run("Fractional power H**(-1/14)", circuit.into(), |source, target| {
        let exported = convert_with(source, target, &ExportOptions::default())?;
        let ok = exported.native_gate_count() >= 1
            && circuits_allclose(source, &exported.program, false)?;
        let strategies: Vec<String> = exported
            .emissions
            .iter()
            .map(|e| e.strategy.to_string())
            .collect();
        Ok((ok, format!("via {}", strategies.join(", "))))
    })
}

/// Toffoli is primitive in every target.
pub fn toffoli() -> anyhow::Result<ScenarioReport> {
    let mut circuit = Circuit::new();
    circuit.push(CirqGate::toffoli(), Qid::line_range(3))?;
    run("Toffoli", circuit.into(), |source, target| {
        let exported = convert_with(source, target, &ExportOptions::default())?;
        let direct = exported.emissions.iter().all(|e| {
            e.kind == GateKind::CCX && e.strategy == Strategy::Direct && e.native_ops == 1
        });
        let ok = direct && circuits_allclose(source, &exported.program, false)?;
        Ok((ok, format!("{} native gate(s)", exported.native_gate_count())))
    })
}

/// One free parameter survives conversion and binds to the same unitary.
pub fn free_parameter() -> anyhow::Result<ScenarioReport> {
    let mut circuit = QuantumCircuit::new(1, 0);
    circuit.rx(ParameterValue::symbol(Parameter::new("theta")), 0)?;
    let bind = |name: &str| (name == "theta").then_some(PI / 3.0);
    run("Free parameter θ", circuit.into(), |source, target| {
        let exported = convert_with(source, target, &ExportOptions::default())?;
        let Some((id, symbol)) = exported.param_map.first() else {
            return Ok((false, "no symbol emitted".to_string()));
        };
        let bound_source = source.bind_parameters(&bind);
        let bound_target = exported.program.bind_parameters(&bind);
        let ok = exported.param_map.len() == 1
            && id.index == 0
            && circuits_allclose(&bound_source, &bound_target, false)
                .context("comparing bound programs")?;
        Ok((ok, format!("{id} -> {symbol}")))
    })
}

/// A mid-circuit reset is rejected before anything is exported.
pub fn reset() -> anyhow::Result<ScenarioReport> {
    let mut circuit = QuantumCircuit::new(1, 0);
    circuit.h(0)?.reset(0)?.x(0)?;
    run("Mid-circuit reset", circuit.into(), |source, target| {
        match convert_with(source, target, &ExportOptions::default()) {
            Err(e @ TranspileError::UnsupportedProgram(_)) => Ok((true, e.to_string())),
            Err(e) => Ok((false, format!("unexpected error: {e}"))),
            Ok(_) => Ok((false, "converted a reset".to_string())),
        }
    })
}

/// Every scenario in order.
pub fn all() -> anyhow::Result<Vec<ScenarioReport>> {
    Ok(vec![
        bell()?,
        fractional_power()?,
        toffoli()?,
        free_parameter()?,
        reset()?,
    ])
}
