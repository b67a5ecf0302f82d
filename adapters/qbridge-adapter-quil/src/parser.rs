//! Parser for Quil.

use num_complex::Complex64;

use qbridge_ir::UnitaryMatrix;

use crate::error::{QuilParseError, QuilParseResult};
use crate::lexer::{SpannedToken, Token, tokenize};
use crate::model::{
    Declaration, GateApplication, GateDefinition, Instruction, MemoryRef, MemoryType, Modifier,
    Program, QuilGate, Value, check_application,
};

/// Parse Quil source into a [`Program`].
pub fn parse(source: &str) -> QuilParseResult<Program> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Function {
    Sin,
    Cos,
    Sqrt,
    Exp,
    Cis,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "sqrt" => Function::Sqrt,
            "exp" => Function::Exp,
            "cis" => Function::Cis,
            _ => return None,
        })
    }

    fn apply(self, z: Complex64) -> Complex64 {
        match self {
            Function::Sin => z.sin(),
            Function::Cos => z.cos(),
            Function::Sqrt => z.sqrt(),
            Function::Exp => z.exp(),
            Function::Cis => (Complex64::i() * z).exp(),
        }
    }
}

/// Arithmetic expression as written.
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Imaginary(f64),
    Pi,
    Memory(MemoryRef),
    Neg(Box<Expr>),
    Binary(Box<Expr>, BinOp, Box<Expr>),
    Call(Function, Box<Expr>),
}

impl Expr {
    fn is_numeric(&self) -> bool {
        match self {
            Expr::Number(_) | Expr::Imaginary(_) | Expr::Pi => true,
            Expr::Memory(_) => false,
            Expr::Neg(e) | Expr::Call(_, e) => e.is_numeric(),
            Expr::Binary(a, _, b) => a.is_numeric() && b.is_numeric(),
        }
    }

    /// Evaluate a numeric expression over the complex numbers.
    fn evaluate(&self) -> Option<Complex64> {
        Some(match self {
            Expr::Number(v) => Complex64::new(*v, 0.0),
            Expr::Imaginary(v) => Complex64::new(0.0, *v),
            Expr::Pi => Complex64::new(std::f64::consts::PI, 0.0),
            Expr::Memory(_) => return None,
            Expr::Neg(e) => -e.evaluate()?,
            Expr::Call(f, e) => f.apply(e.evaluate()?),
            Expr::Binary(a, op, b) => {
                let (a, b) = (a.evaluate()?, b.evaluate()?);
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Pow => a.powc(b),
                }
            }
        })
    }

    /// Lower to a real gate parameter, keeping memory references symbolic.
    fn to_value(&self, line: usize) -> QuilParseResult<Value> {
        if self.is_numeric() {
            let z = self.evaluate().unwrap_or_default();
            if z.im.abs() > 1e-12 {
                return Err(QuilParseError::UnexpectedToken {
                    line,
                    expected: "real gate parameter".into(),
                    found: format!("{z}"),
                });
            }
            return Ok(match self {
                Expr::Pi => Value::pi(),
                _ => Value::constant(z.re),
            });
        }
        Ok(match self {
            Expr::Memory(m) => Value::symbol(m.clone()),
            Expr::Neg(e) => -e.to_value(line)?,
            Expr::Binary(a, op, b) => {
                let (a, b) = (a.to_value(line)?, b.to_value(line)?);
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Pow => {
                        return Err(QuilParseError::Unsupported {
                            line,
                            construct: "power of a memory reference".into(),
                        });
                    }
                }
            }
            Expr::Call(..) => {
                return Err(QuilParseError::Unsupported {
                    line,
                    construct: "function of a memory reference".into(),
                });
            }
            Expr::Number(_) | Expr::Imaginary(_) | Expr::Pi => Value::constant(0.0),
        })
    }
}

/// Parser state.
struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    /// Create a new parser from source.
    fn new(source: &str) -> QuilParseResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    /// Check if we've reached the end.
    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Line of the current token.
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    /// Peek at the current token.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Advance and return the current token.
    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        Some(token)
    }

    fn unexpected(&self, expected: &str, found: Option<Token>) -> QuilParseError {
        match found {
            Some(found) => QuilParseError::UnexpectedToken {
                line: self.line(),
                expected: expected.into(),
                found: found.to_string(),
            },
            None => QuilParseError::UnexpectedEof(expected.into()),
        }
    }

    /// Expect a specific token.
    fn expect(&mut self, expected: &Token) -> QuilParseResult<()> {
        if self.check(expected) {
            self.advance();
            return Ok(());
        }
        let found = self.peek().cloned();
        Err(self.unexpected(&expected.to_string(), found))
    }

    /// Check if current token matches.
    fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    /// Consume token if it matches.
    fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_newlines(&mut self) {
        while self.consume(&Token::Newline) {}
    }

    fn at_line_end(&self) -> bool {
        self.is_eof() || self.check(&Token::Newline)
    }

    /// Parse the entire program.
    fn parse_program(&mut self) -> QuilParseResult<Program> {
        let mut program = Program::new();
        loop {
            self.skip_newlines();
            if self.is_eof() {
                break;
            }
            let instruction = self.parse_instruction()?;
            program.instructions.push(instruction);
            if !self.at_line_end() {
                let found = self.peek().cloned();
                return Err(self.unexpected("end of line", found));
            }
        }
        Ok(program)
    }

    /// Parse one instruction.
    fn parse_instruction(&mut self) -> QuilParseResult<Instruction> {
        let line = self.line();
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| QuilParseError::UnexpectedEof("instruction".into()))?;

        match token {
            Token::Declare => self.parse_declare(),
            Token::DefGate => self.parse_defgate(),
            Token::Measure => self.parse_measure(),
            Token::Reset => {
                self.advance();
                let qubit = if self.at_line_end() {
                    None
                } else {
                    Some(self.parse_qubit()?)
                };
                Ok(Instruction::Reset(qubit))
            }
            Token::Pragma => {
                self.advance();
                let mut words = Vec::new();
                while !self.at_line_end() {
                    if let Some(t) = self.advance() {
                        words.push(t.to_string());
                    }
                }
                Ok(Instruction::Pragma(words.join(" ")))
            }
            Token::Halt => {
                self.advance();
                Ok(Instruction::Halt)
            }
            Token::Label => {
                self.advance();
                Ok(Instruction::Label(self.parse_label()?))
            }
            Token::Jump => {
                self.advance();
                Ok(Instruction::Jump(self.parse_label()?))
            }
            Token::JumpWhen | Token::JumpUnless => {
                self.advance();
                let label = self.parse_label()?;
                let condition = self.parse_memory_ref()?;
                Ok(if token == Token::JumpWhen {
                    Instruction::JumpWhen { label, condition }
                } else {
                    Instruction::JumpUnless { label, condition }
                })
            }
            Token::Dagger | Token::Controlled | Token::Identifier(_) => self.parse_gate(),
            Token::Forked => Err(QuilParseError::Unsupported {
                line,
                construct: "FORKED".into(),
            }),
            other => Err(self.unexpected("instruction", Some(other))),
        }
    }

    /// `DECLARE name TYPE[length]`.
    fn parse_declare(&mut self) -> QuilParseResult<Instruction> {
        self.expect(&Token::Declare)?;
        let name = self.parse_identifier()?;
        let data_type = match self.advance() {
            Some(Token::Bit) => MemoryType::Bit,
            Some(Token::Octet) => MemoryType::Octet,
            Some(Token::Integer) => MemoryType::Integer,
            Some(Token::Real) => MemoryType::Real,
            other => return Err(self.unexpected("memory type", other)),
        };
        let length = if self.consume(&Token::LBracket) {
            let length = self.parse_int()?;
            self.expect(&Token::RBracket)?;
            length
        } else {
            1
        };
        if !self.at_line_end() {
            return Err(QuilParseError::Unsupported {
                line: self.line(),
                construct: format!("DECLARE {name} ... SHARING"),
            });
        }
        Ok(Instruction::Declare(Declaration {
            name,
            data_type,
            length,
        }))
    }

    /// `DEFGATE name [AS MATRIX]:` followed by one row per line.
    fn parse_defgate(&mut self) -> QuilParseResult<Instruction> {
        self.expect(&Token::DefGate)?;
        let line = self.line();
        let name = self.parse_identifier()?;
        if self.check(&Token::LParen) {
            return Err(QuilParseError::Unsupported {
                line,
                construct: format!("parametric DEFGATE {name}"),
            });
        }
        if self.consume(&Token::As) && !self.consume(&Token::Matrix) {
            let kind = self.peek().map_or_else(String::new, ToString::to_string);
            return Err(QuilParseError::Unsupported {
                line,
                construct: format!("DEFGATE {name} AS {kind}"),
            });
        }
        self.expect(&Token::Colon)?;

        let mut rows: Vec<Vec<Complex64>> = Vec::new();
        loop {
            self.expect(&Token::Newline)?;
            self.skip_newlines();
            let row_line = self.line();
            let row = self
                .parse_expression_list()?
                .into_iter()
                .map(|e| {
                    e.evaluate().ok_or_else(|| QuilParseError::InvalidMatrix {
                        line: row_line,
                        message: "entries must be numeric".into(),
                    })
                })
                .collect::<QuilParseResult<Vec<_>>>()?;
            let dim = rows.first().map_or(row.len(), Vec::len);
            rows.push(row);
            if rows.len() >= dim {
                break;
            }
        }

        let matrix = UnitaryMatrix::from_rows(rows).map_err(|e| QuilParseError::InvalidMatrix {
            line,
            message: e.to_string(),
        })?;
        Ok(Instruction::DefGate(GateDefinition { name, matrix }))
    }

    /// `MEASURE q [target]`.
    fn parse_measure(&mut self) -> QuilParseResult<Instruction> {
        self.expect(&Token::Measure)?;
        let qubit = self.parse_qubit()?;
        let target = if self.at_line_end() {
            None
        } else {
            Some(self.parse_memory_ref()?)
        };
        Ok(Instruction::Measure { qubit, target })
    }

    /// Modifiers, a gate name, optional parameters and qubits.
    fn parse_gate(&mut self) -> QuilParseResult<Instruction> {
        let line = self.line();
        let mut modifiers = Vec::new();
        loop {
            if self.consume(&Token::Dagger) {
                modifiers.push(Modifier::Dagger);
            } else if self.consume(&Token::Controlled) {
                modifiers.push(Modifier::Controlled);
            } else if self.check(&Token::Forked) {
                return Err(QuilParseError::Unsupported {
                    line,
                    construct: "FORKED".into(),
                });
            } else {
                break;
            }
        }

        let name = self.parse_identifier()?;
        let mut params = Vec::new();
        if self.consume(&Token::LParen) {
            for expr in self.parse_expression_list()? {
                params.push(expr.to_value(line)?);
            }
            self.expect(&Token::RParen)?;
        }

        let mut qubits = Vec::new();
        while !self.at_line_end() {
            qubits.push(self.parse_qubit()?);
        }

        let gate = match QuilGate::signature(&name) {
            Some((_, expected)) if params.len() != expected => {
                return Err(QuilParseError::WrongParameterCount {
                    line,
                    gate: name,
                    expected,
                    got: params.len(),
                });
            }
            Some(_) => QuilGate::standard(&name, params).ok_or_else(|| QuilParseError::UnexpectedToken {
                line,
                expected: "gate".into(),
                found: name.clone(),
            })?,
            None if !params.is_empty() => {
                return Err(QuilParseError::Unsupported {
                    line,
                    construct: format!("parametric gate {name}"),
                });
            }
            None => QuilGate::Defined(name),
        };

        let app = GateApplication {
            modifiers,
            gate,
            qubits,
        };
        check_application(&app).map_err(|message| QuilParseError::InvalidApplication { line, message })?;
        Ok(Instruction::Gate(app))
    }

    /// Parse an expression.
    fn parse_expression(&mut self) -> QuilParseResult<Expr> {
        self.parse_binary_expr(0)
    }

    /// Parse binary expression with precedence climbing.
    fn parse_binary_expr(&mut self, min_prec: u8) -> QuilParseResult<Expr> {
        let mut left = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op() {
            let prec = op_precedence(op);
            if prec < min_prec {
                break;
            }
            self.advance();

            // `^` is right-associative
            let next = if op == BinOp::Pow { prec } else { prec + 1 };
            let right = self.parse_binary_expr(next)?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    /// Parse unary expression.
    fn parse_unary_expr(&mut self) -> QuilParseResult<Expr> {
        if self.consume(&Token::Minus) {
            let expr = self.parse_unary_expr()?;
            return Ok(Expr::Neg(Box::new(expr)));
        }
        if self.consume(&Token::Plus) {
            return self.parse_unary_expr();
        }
        self.parse_primary_expr()
    }

    /// Parse primary expression.
    #[allow(clippy::cast_precision_loss)]
    fn parse_primary_expr(&mut self) -> QuilParseResult<Expr> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| QuilParseError::UnexpectedEof("expression".into()))?;

        match token {
            Token::IntLiteral(v) => {
                self.advance();
                Ok(Expr::Number(v as f64))
            }
            Token::FloatLiteral(v) => {
                self.advance();
                Ok(Expr::Number(v))
            }
            Token::ImaginaryLiteral(v) => {
                self.advance();
                Ok(Expr::Imaginary(v))
            }
            Token::Pi => {
                self.advance();
                Ok(Expr::Pi)
            }
            Token::Identifier(name) if name == "i" => {
                self.advance();
                Ok(Expr::Imaginary(1.0))
            }
            Token::Identifier(name) => {
                if let Some(function) = Function::from_name(&name) {
                    self.advance();
                    self.expect(&Token::LParen)?;
                    let arg = self.parse_expression()?;
                    self.expect(&Token::RParen)?;
                    return Ok(Expr::Call(function, Box::new(arg)));
                }
                Ok(Expr::Memory(self.parse_memory_ref()?))
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            other => Err(self.unexpected("expression", Some(other))),
        }
    }

    /// Peek at binary operator.
    fn peek_binary_op(&self) -> Option<BinOp> {
        match self.peek()? {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Caret => Some(BinOp::Pow),
            _ => None,
        }
    }

    /// Parse a comma-separated expression list.
    fn parse_expression_list(&mut self) -> QuilParseResult<Vec<Expr>> {
        let mut exprs = vec![self.parse_expression()?];
        while self.consume(&Token::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }

    /// `name[index]`, or a bare `name` for `name[0]`.
    fn parse_memory_ref(&mut self) -> QuilParseResult<MemoryRef> {
        let name = self.parse_identifier()?;
        let index = if self.consume(&Token::LBracket) {
            let index = self.parse_int()?;
            self.expect(&Token::RBracket)?;
            index
        } else {
            0
        };
        Ok(MemoryRef::new(name, index))
    }

    fn parse_label(&mut self) -> QuilParseResult<String> {
        match self.advance() {
            Some(Token::LabelName(s)) => Ok(s),
            other => Err(self.unexpected("label", other)),
        }
    }

    /// Parse an identifier.
    fn parse_identifier(&mut self) -> QuilParseResult<String> {
        match self.advance() {
            Some(Token::Identifier(s)) => Ok(s),
            other => Err(self.unexpected("identifier", other)),
        }
    }

    fn parse_qubit(&mut self) -> QuilParseResult<u32> {
        match self.advance() {
            Some(Token::IntLiteral(v)) => u32::try_from(v).map_err(|_| QuilParseError::UnexpectedToken {
                line: self.line(),
                expected: "qubit index".into(),
                found: v.to_string(),
            }),
            Some(Token::Identifier(name)) => Err(QuilParseError::Unsupported {
                line: self.line(),
                construct: format!("qubit placeholder {name}"),
            }),
            other => Err(self.unexpected("qubit index", other)),
        }
    }

    fn parse_int(&mut self) -> QuilParseResult<u32> {
        match self.advance() {
            Some(Token::IntLiteral(v)) => u32::try_from(v).map_err(|_| QuilParseError::UnexpectedToken {
                line: self.line(),
                expected: "32-bit integer".into(),
                found: v.to_string(),
            }),
            other => Err(self.unexpected("integer", other)),
        }
    }
}

fn op_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Add | BinOp::Sub => 1,
        BinOp::Mul | BinOp::Div => 2,
        BinOp::Pow => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_1_SQRT_2, PI};

    #[test]
    fn test_parse_bell() {
        let program = parse("DECLARE ro BIT[2]\nH 0\nCNOT 0 1\nMEASURE 0 ro[0]\nMEASURE 1 ro[1]\n").unwrap();
        assert_eq!(program.instructions.len(), 5);
        assert_eq!(program.num_bits(), 2);
        assert_eq!(program.qubits(), vec![0, 1]);
    }

    #[test]
    fn test_parse_parameters() {
        let program = parse("DECLARE theta REAL[2]\nRX(pi/2) 0\nRZ(2*theta[1] - 0.5) 0\nRY(-theta) 1").unwrap();
        let gates: Vec<&GateApplication> = program.gates().collect();
        let rx = gates[0].gate.param().unwrap();
        assert!((rx.as_f64().unwrap() - PI / 2.0).abs() < 1e-12);
        assert_eq!(program.parameters(), vec![MemoryRef::new("theta", 1), MemoryRef::new("theta", 0)]);
    }

    #[test]
    fn test_parse_modifiers() {
        let program = parse("DAGGER CONTROLLED RX(0.3) 2 0\nCONTROLLED CONTROLLED X 0 1 2").unwrap();
        let gates: Vec<&GateApplication> = program.gates().collect();
        assert_eq!(gates[0].modifiers, vec![Modifier::Dagger, Modifier::Controlled]);
        assert_eq!(gates[0].qubits, vec![2, 0]);
        assert_eq!(gates[1].num_controls(), 2);
        assert!(parse("CONTROLLED X 0").is_err());
    }

    #[test]
    fn test_parse_defgate() {
        let source = "DEFGATE HADAMARD:\n    1/sqrt(2), 1/sqrt(2)\n    1/sqrt(2), -1/sqrt(2)\n\nHADAMARD 3\n";
        let program = parse(source).unwrap();
        let def = program.definition("HADAMARD").unwrap();
        assert_eq!(def.matrix.num_qubits(), 1);
        assert!((def.matrix.get(1, 1).re + FRAC_1_SQRT_2).abs() < 1e-12);
        assert_eq!(program.gates().next().unwrap().gate, QuilGate::Defined("HADAMARD".into()));
    }

    #[test]
    fn test_parse_complex_defgate() {
        let source = "DEFGATE SQRTISWAP AS MATRIX:\n    1, 0, 0, 0\n    0, 1/sqrt(2), i/sqrt(2), 0\n    0, i/sqrt(2), 1/sqrt(2), 0\n    0, 0, 0, 1\n";
        let program = parse(source).unwrap();
        let def = program.definition("SQRTISWAP").unwrap();
        assert_eq!(def.matrix.num_qubits(), 2);
        assert!((def.matrix.get(1, 2).im - FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_non_unitary_defgate_is_rejected() {
        let err = parse("DEFGATE BAD:\n    1, 1\n    0, 1\n").unwrap_err();
        assert!(matches!(err, QuilParseError::InvalidMatrix { .. }));
    }

    #[test]
    fn test_control_flow_and_pragmas_parse() {
        let program = parse("PRAGMA INITIAL_REWIRING \"NAIVE\"\nLABEL @loop\nH 0\nJUMP-WHEN @loop ro[0]\nHALT").unwrap();
        assert!(matches!(program.instructions[0], Instruction::Pragma(_)));
        assert!(program.instructions[1].is_control_flow());
        assert!(program.instructions[3].is_control_flow());
        assert_eq!(program.instructions[4], Instruction::Halt);
    }

    #[test]
    fn test_errors_carry_lines() {
        let err = parse("H 0\nRX 0\n").unwrap_err();
        assert!(matches!(err, QuilParseError::WrongParameterCount { line: 2, .. }));
        let err = parse("H 0\n\nCNOT 0 0\n").unwrap_err();
        assert_eq!(err.line(), Some(3));
        let err = parse("DEFGATE G(%a):\n    1, 0\n    0, 1\n").unwrap_err();
        assert!(matches!(err, QuilParseError::Unsupported { .. }));
    }

    #[test]
    fn test_semicolon_separates_instructions() {
        let program = parse("H 0; CNOT 0 1").unwrap();
        assert_eq!(program.gates().count(), 2);
    }
}
