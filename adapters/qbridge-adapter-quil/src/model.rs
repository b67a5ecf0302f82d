//! Quil program model.
//!
//! A program is a flat list of instructions over integer qubits. Gate
//! parameters are expressions over classical memory references such as
//! `theta[0]`; the memory itself is introduced with `DECLARE`.

use serde::{Deserialize, Serialize};
use std::fmt;

use qbridge_convert::{ConvertError, ConvertResult, NativeSymbol, ProgramFormat};
use qbridge_ir::{NamedSymbol, ParameterExpression, UnitaryMatrix};

/// Words that cannot name a memory region.
const RESERVED: &[&str] = &[
    "ro", "pi", "i", "sin", "cos", "sqrt", "exp", "cis", "DECLARE", "DEFGATE", "MEASURE",
    "RESET", "DAGGER", "CONTROLLED", "FORKED", "PRAGMA", "HALT", "LABEL", "JUMP", "AS",
    "MATRIX", "PERMUTATION", "BIT", "REAL", "OCTET", "INTEGER",
];

/// A reference into classical memory: `name[index]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemoryRef {
    pub name: String,
    pub index: u32,
}

impl MemoryRef {
    pub fn new(name: impl Into<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

impl From<&str> for MemoryRef {
    fn from(name: &str) -> Self {
        Self::new(name, 0)
    }
}

impl fmt::Display for MemoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.index)
    }
}

impl NamedSymbol for MemoryRef {
    /// `theta[0]` is named `theta`; other cells keep their index.
    fn symbol_name(&self) -> String {
        if self.index == 0 {
            self.name.clone()
        } else {
            self.to_string()
        }
    }
}

impl NativeSymbol for MemoryRef {
    fn from_name(name: &str) -> Self {
        Self::new(name, 0)
    }

    /// Memory names are identifiers that are not reserved words.
    fn sanitize(name: &str) -> String {
        let mut out: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if out.starts_with(|c: char| c.is_ascii_digit()) {
            out.insert(0, '_');
        }
        if RESERVED.contains(&out.as_str()) {
            out.push('_');
        }
        out
    }
}

/// A numeric or symbolic gate parameter.
pub type Value = ParameterExpression<MemoryRef>;

/// `DECLARE` data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryType {
    Bit,
    Octet,
    Integer,
    Real,
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemoryType::Bit => "BIT",
            MemoryType::Octet => "OCTET",
            MemoryType::Integer => "INTEGER",
            MemoryType::Real => "REAL",
        })
    }
}

/// `DECLARE name TYPE[length]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub data_type: MemoryType,
    pub length: u32,
}

/// Quil standard gates, plus gates introduced with `DEFGATE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum QuilGate {
    I,
    X,
    Y,
    Z,
    H,
    S,
    T,
    RX(Value),
    RY(Value),
    RZ(Value),
    PHASE(Value),
    CNOT,
    CZ,
    SWAP,
    ISWAP,
    CPHASE(Value),
    CPHASE00(Value),
    CPHASE01(Value),
    CPHASE10(Value),
    PSWAP(Value),
    XY(Value),
    CCNOT,
    CSWAP,
    /// A gate defined by `DEFGATE name`.
    Defined(String),
}

impl QuilGate {
    /// `(qubits, parameters)` of a standard gate.
    pub fn signature(name: &str) -> Option<(u32, usize)> {
        Some(match name {
            "I" | "X" | "Y" | "Z" | "H" | "S" | "T" => (1, 0),
            "RX" | "RY" | "RZ" | "PHASE" => (1, 1),
            "CNOT" | "CZ" | "SWAP" | "ISWAP" => (2, 0),
            "CPHASE" | "CPHASE00" | "CPHASE01" | "CPHASE10" | "PSWAP" | "XY" => (2, 1),
            "CCNOT" | "CSWAP" => (3, 0),
            _ => return None,
        })
    }

    /// Build a standard gate. `None` for unknown names or a wrong
    /// parameter count.
    pub fn standard(name: &str, params: Vec<Value>) -> Option<Self> {
        let (_, expected) = Self::signature(name)?;
        if params.len() != expected {
            return None;
        }
        let mut params = params.into_iter();
        let mut p = || params.next().unwrap_or(Value::constant(0.0));
        Some(match name {
            "I" => QuilGate::I,
            "X" => QuilGate::X,
            "Y" => QuilGate::Y,
            "Z" => QuilGate::Z,
            "H" => QuilGate::H,
            "S" => QuilGate::S,
            "T" => QuilGate::T,
            "RX" => QuilGate::RX(p()),
            "RY" => QuilGate::RY(p()),
            "RZ" => QuilGate::RZ(p()),
            "PHASE" => QuilGate::PHASE(p()),
            "CNOT" => QuilGate::CNOT,
            "CZ" => QuilGate::CZ,
            "SWAP" => QuilGate::SWAP,
            "ISWAP" => QuilGate::ISWAP,
            "CPHASE" => QuilGate::CPHASE(p()),
            "CPHASE00" => QuilGate::CPHASE00(p()),
            "CPHASE01" => QuilGate::CPHASE01(p()),
            "CPHASE10" => QuilGate::CPHASE10(p()),
            "PSWAP" => QuilGate::PSWAP(p()),
            "XY" => QuilGate::XY(p()),
            "CCNOT" => QuilGate::CCNOT,
            _ => QuilGate::CSWAP,
        })
    }

    /// Gate name as written in Quil.
    pub fn name(&self) -> &str {
        match self {
            QuilGate::I => "I",
            QuilGate::X => "X",
            QuilGate::Y => "Y",
            QuilGate::Z => "Z",
            QuilGate::H => "H",
            QuilGate::S => "S",
            QuilGate::T => "T",
            QuilGate::RX(_) => "RX",
            QuilGate::RY(_) => "RY",
            QuilGate::RZ(_) => "RZ",
            QuilGate::PHASE(_) => "PHASE",
            QuilGate::CNOT => "CNOT",
            QuilGate::CZ => "CZ",
            QuilGate::SWAP => "SWAP",
            QuilGate::ISWAP => "ISWAP",
            QuilGate::CPHASE(_) => "CPHASE",
            QuilGate::CPHASE00(_) => "CPHASE00",
            QuilGate::CPHASE01(_) => "CPHASE01",
            QuilGate::CPHASE10(_) => "CPHASE10",
            QuilGate::PSWAP(_) => "PSWAP",
            QuilGate::XY(_) => "XY",
            QuilGate::CCNOT => "CCNOT",
            QuilGate::CSWAP => "CSWAP",
            QuilGate::Defined(name) => name,
        }
    }

    /// Qubit count; `None` for defined gates, whose size comes from the
    /// definition.
    pub fn num_qubits(&self) -> Option<u32> {
        Self::signature(self.name()).map(|(n, _)| n)
    }

    /// The gate's parameter, if it has one.
    pub fn param(&self) -> Option<&Value> {
        match self {
            QuilGate::RX(v)
            | QuilGate::RY(v)
            | QuilGate::RZ(v)
            | QuilGate::PHASE(v)
            | QuilGate::CPHASE(v)
            | QuilGate::CPHASE00(v)
            | QuilGate::CPHASE01(v)
            | QuilGate::CPHASE10(v)
            | QuilGate::PSWAP(v)
            | QuilGate::XY(v) => Some(v),
            _ => None,
        }
    }

    /// Check if the parameter is symbolic.
    pub fn is_parameterized(&self) -> bool {
        self.param().is_some_and(Value::is_symbolic)
    }

    /// Same gate with its parameter replaced.
    #[must_use]
    pub fn with_param(&self, value: Value) -> Self {
        match self {
            QuilGate::RX(_) => QuilGate::RX(value),
            QuilGate::RY(_) => QuilGate::RY(value),
            QuilGate::RZ(_) => QuilGate::RZ(value),
            QuilGate::PHASE(_) => QuilGate::PHASE(value),
            QuilGate::CPHASE(_) => QuilGate::CPHASE(value),
            QuilGate::CPHASE00(_) => QuilGate::CPHASE00(value),
            QuilGate::CPHASE01(_) => QuilGate::CPHASE01(value),
            QuilGate::CPHASE10(_) => QuilGate::CPHASE10(value),
            QuilGate::PSWAP(_) => QuilGate::PSWAP(value),
            QuilGate::XY(_) => QuilGate::XY(value),
            other => other.clone(),
        }
    }
}

/// Gate modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    /// Inverse of the modified gate.
    Dagger,
    /// Adds one control qubit in front of the operands.
    Controlled,
}

/// A gate applied to qubits, with modifiers outermost first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateApplication {
    pub modifiers: Vec<Modifier>,
    pub gate: QuilGate,
    pub qubits: Vec<u32>,
}

impl GateApplication {
    /// An unmodified gate.
    pub fn new(gate: QuilGate, qubits: impl Into<Vec<u32>>) -> Self {
        Self {
            modifiers: Vec::new(),
            gate,
            qubits: qubits.into(),
        }
    }

    /// Prefix `DAGGER`.
    #[must_use]
    pub fn dagger(mut self) -> Self {
        self.modifiers.insert(0, Modifier::Dagger);
        self
    }

    /// Prefix `CONTROLLED` with a new leading control qubit.
    #[must_use]
    pub fn controlled(mut self, control: u32) -> Self {
        self.modifiers.insert(0, Modifier::Controlled);
        self.qubits.insert(0, control);
        self
    }

    /// Number of `CONTROLLED` modifiers.
    pub fn num_controls(&self) -> usize {
        self.modifiers
            .iter()
            .filter(|m| **m == Modifier::Controlled)
            .count()
    }

    /// Whether the modifiers invert the gate.
    pub fn is_inverted(&self) -> bool {
        self.modifiers.iter().filter(|m| **m == Modifier::Dagger).count() % 2 == 1
    }
}

/// `DEFGATE name:` followed by matrix rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDefinition {
    pub name: String,
    pub matrix: UnitaryMatrix,
}

/// One Quil instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    Declare(Declaration),
    DefGate(GateDefinition),
    Gate(GateApplication),
    /// `MEASURE q` or `MEASURE q ro[i]`.
    Measure {
        qubit: u32,
        target: Option<MemoryRef>,
    },
    /// `RESET` or `RESET q`.
    Reset(Option<u32>),
    /// `PRAGMA` with its raw payload.
    Pragma(String),
    Halt,
    Label(String),
    Jump(String),
    JumpWhen {
        label: String,
        condition: MemoryRef,
    },
    JumpUnless {
        label: String,
        condition: MemoryRef,
    },
}

impl Instruction {
    /// Check if the instruction is control flow.
    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            Instruction::Label(_)
                | Instruction::Jump(_)
                | Instruction::JumpWhen { .. }
                | Instruction::JumpUnless { .. }
        )
    }
}

/// A Quil program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction.
    ///
    /// Gate applications are checked for distinct qubits and, for standard
    /// gates, for the operand count including controls.
    pub fn push(&mut self, instruction: Instruction) -> ConvertResult<&mut Self> {
        if let Instruction::Gate(app) = &instruction {
            check_application(app).map_err(|message| ConvertError::invalid(ProgramFormat::Quil, message))?;
        }
        self.instructions.push(instruction);
        Ok(self)
    }

    /// Append an unmodified gate.
    pub fn gate(&mut self, gate: QuilGate, qubits: &[u32]) -> ConvertResult<&mut Self> {
        self.push(Instruction::Gate(GateApplication::new(gate, qubits)))
    }

    pub fn h(&mut self, q: u32) -> ConvertResult<&mut Self> {
        self.gate(QuilGate::H, &[q])
    }

    pub fn cnot(&mut self, control: u32, target: u32) -> ConvertResult<&mut Self> {
        self.gate(QuilGate::CNOT, &[control, target])
    }

    pub fn rx(&mut self, theta: impl Into<Value>, q: u32) -> ConvertResult<&mut Self> {
        self.gate(QuilGate::RX(theta.into()), &[q])
    }

    pub fn rz(&mut self, theta: impl Into<Value>, q: u32) -> ConvertResult<&mut Self> {
        self.gate(QuilGate::RZ(theta.into()), &[q])
    }

    /// `DECLARE name TYPE[length]`.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        data_type: MemoryType,
        length: u32,
    ) -> ConvertResult<&mut Self> {
        let name = name.into();
        if self.declaration(&name).is_some() {
            return Err(ConvertError::invalid(
                ProgramFormat::Quil,
                format!("memory region '{name}' is declared twice"),
            ));
        }
        self.push(Instruction::Declare(Declaration {
            name,
            data_type,
            length,
        }))
    }

    /// `DEFGATE name:` with the given matrix.
    pub fn defgate(&mut self, name: impl Into<String>, matrix: UnitaryMatrix) -> ConvertResult<&mut Self> {
        let name = name.into();
        if QuilGate::signature(&name).is_some() || self.definition(&name).is_some() {
            return Err(ConvertError::invalid(
                ProgramFormat::Quil,
                format!("gate '{name}' is already defined"),
            ));
        }
        self.push(Instruction::DefGate(GateDefinition { name, matrix }))
    }

    /// `MEASURE qubit ro[index]`.
    pub fn measure(&mut self, qubit: u32, index: u32) -> ConvertResult<&mut Self> {
        self.push(Instruction::Measure {
            qubit,
            target: Some(MemoryRef::new("ro", index)),
        })
    }

    /// Memory declarations in program order.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.instructions.iter().filter_map(|inst| match inst {
            Instruction::Declare(d) => Some(d),
            _ => None,
        })
    }

    /// Look up a memory declaration.
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations().find(|d| d.name == name)
    }

    /// Look up a `DEFGATE`.
    pub fn definition(&self, name: &str) -> Option<&GateDefinition> {
        self.instructions.iter().find_map(|inst| match inst {
            Instruction::DefGate(d) if d.name == name => Some(d),
            _ => None,
        })
    }

    /// Gate applications in program order.
    pub fn gates(&self) -> impl Iterator<Item = &GateApplication> {
        self.instructions.iter().filter_map(|inst| match inst {
            Instruction::Gate(app) => Some(app),
            _ => None,
        })
    }

    /// Distinct qubits used by any instruction, ascending.
    pub fn qubits(&self) -> Vec<u32> {
        let mut qubits: Vec<u32> = self
            .instructions
            .iter()
            .flat_map(|inst| match inst {
                Instruction::Gate(app) => app.qubits.clone(),
                Instruction::Measure { qubit, .. } | Instruction::Reset(Some(qubit)) => vec![*qubit],
                _ => Vec::new(),
            })
            .collect();
        qubits.sort_unstable();
        qubits.dedup();
        qubits
    }

    /// Total length of `BIT` memory.
    pub fn num_bits(&self) -> u32 {
        self.declarations()
            .filter(|d| d.data_type == MemoryType::Bit)
            .map(|d| d.length)
            .sum()
    }

    /// Flat classical-bit index of a `BIT` memory cell, counting `BIT`
    /// regions in declaration order.
    pub fn bit_index(&self, cell: &MemoryRef) -> Option<u32> {
        let mut offset = 0;
        for d in self.declarations().filter(|d| d.data_type == MemoryType::Bit) {
            if d.name == cell.name {
                return (cell.index < d.length).then_some(offset + cell.index);
            }
            offset += d.length;
        }
        None
    }

    /// Memory references used as gate parameters, first-seen.
    pub fn parameters(&self) -> Vec<MemoryRef> {
        let mut out: Vec<MemoryRef> = Vec::new();
        for p in self.gates().filter_map(|app| app.gate.param()).flat_map(Value::symbols) {
            if !out.contains(p) {
                out.push(p.clone());
            }
        }
        out
    }

    /// Substitute values for memory references, looked up by name.
    #[must_use]
    pub fn bind(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Self {
        let instructions = self
            .instructions
            .iter()
            .map(|inst| match inst {
                Instruction::Gate(app) => match app.gate.param() {
                    Some(v) => Instruction::Gate(GateApplication {
                        gate: app.gate.with_param(v.bind_named(&|name: &str| lookup(name)).simplify()),
                        ..app.clone()
                    }),
                    None => inst.clone(),
                },
                _ => inst.clone(),
            })
            .collect();
        Self { instructions }
    }
}

/// Structural check shared by [`Program::push`] and the parser.
pub(crate) fn check_application(app: &GateApplication) -> Result<(), String> {
    if let Some(base) = app.gate.num_qubits() {
        let expected = base as usize + app.num_controls();
        if app.qubits.len() != expected {
            return Err(format!(
                "{} acts on {expected} qubits but was given {}",
                app.gate.name(),
                app.qubits.len()
            ));
        }
    }
    for (i, q) in app.qubits.iter().enumerate() {
        if app.qubits[..i].contains(q) {
            return Err(format!("duplicate qubit {q} in {}", app.gate.name()));
        }
    }
    Ok(())
}
