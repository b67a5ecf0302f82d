//! Quil emitter.
//!
//! Output parses back with [`crate::parse`] to the same program. Floats
//! are written with Rust's shortest round-trip formatting.

use num_complex::Complex64;
use std::fmt;

use qbridge_ir::ParameterExpression;

use crate::model::{GateApplication, Instruction, Modifier, Program, Value};

/// Write a gate parameter in Quil syntax.
pub fn write_value(f: &mut impl fmt::Write, value: &Value) -> fmt::Result {
    match value {
        ParameterExpression::Constant(v) => write!(f, "{v}"),
        ParameterExpression::Symbol(m) => write!(f, "{m}"),
        ParameterExpression::Pi => f.write_str("pi"),
        ParameterExpression::Neg(e) => {
            f.write_str("-(")?;
            write_value(f, e)?;
            f.write_str(")")
        }
        ParameterExpression::Add(a, b) => write_binary(f, a, "+", b),
        ParameterExpression::Sub(a, b) => write_binary(f, a, "-", b),
        ParameterExpression::Mul(a, b) => write_binary(f, a, "*", b),
        ParameterExpression::Div(a, b) => write_binary(f, a, "/", b),
    }
}

fn write_binary(f: &mut impl fmt::Write, a: &Value, op: &str, b: &Value) -> fmt::Result {
    f.write_str("(")?;
    write_value(f, a)?;
    write!(f, " {op} ")?;
    write_value(f, b)?;
    f.write_str(")")
}

/// Format a matrix entry as a Quil complex literal.
fn complex(z: Complex64) -> String {
    match (z.re == 0.0, z.im == 0.0) {
        (_, true) => format!("{}", z.re),
        (true, false) => format!("{}i", z.im),
        (false, false) if z.im < 0.0 => format!("{}-{}i", z.re, -z.im),
        (false, false) => format!("{}+{}i", z.re, z.im),
    }
}

impl fmt::Display for GateApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.modifiers {
            f.write_str(match m {
                Modifier::Dagger => "DAGGER ",
                Modifier::Controlled => "CONTROLLED ",
            })?;
        }
        f.write_str(self.gate.name())?;
        if let Some(v) = self.gate.param() {
            f.write_str("(")?;
            write_value(f, v)?;
            f.write_str(")")?;
        }
        for q in &self.qubits {
            write!(f, " {q}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Declare(d) => write!(f, "DECLARE {} {}[{}]", d.name, d.data_type, d.length),
            Instruction::DefGate(d) => {
                write!(f, "DEFGATE {}:", d.name)?;
                for row in d.matrix.rows() {
                    let entries: Vec<String> = row.into_iter().map(complex).collect();
                    write!(f, "\n    {}", entries.join(", "))?;
                }
                Ok(())
            }
            Instruction::Gate(app) => app.fmt(f),
            Instruction::Measure { qubit, target } => {
                write!(f, "MEASURE {qubit}")?;
                match target {
                    Some(t) => write!(f, " {t}"),
                    None => Ok(()),
                }
            }
            Instruction::Reset(None) => f.write_str("RESET"),
            Instruction::Reset(Some(q)) => write!(f, "RESET {q}"),
            Instruction::Pragma(payload) => write!(f, "PRAGMA {payload}"),
            Instruction::Halt => f.write_str("HALT"),
            Instruction::Label(l) => write!(f, "LABEL @{l}"),
            Instruction::Jump(l) => write!(f, "JUMP @{l}"),
            Instruction::JumpWhen { label, condition } => write!(f, "JUMP-WHEN @{label} {condition}"),
            Instruction::JumpUnless { label, condition } => {
                write!(f, "JUMP-UNLESS @{label} {condition}")
            }
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inst in &self.instructions {
            writeln!(f, "{inst}")?;
        }
        Ok(())
    }
}
