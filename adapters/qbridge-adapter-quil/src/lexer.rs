//! Lexer for Quil.

use logos::Logos;

use crate::error::{QuilParseError, QuilParseResult};

/// Tokens for Quil.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    // Statement separators
    #[regex(r"\r?\n")]
    #[token(";")]
    Newline,

    // Keywords
    #[token("DECLARE")]
    Declare,

    #[token("DEFGATE")]
    DefGate,

    #[token("AS")]
    As,

    #[token("MATRIX")]
    Matrix,

    #[token("DAGGER")]
    Dagger,

    #[token("CONTROLLED")]
    Controlled,

    #[token("FORKED")]
    Forked,

    #[token("MEASURE")]
    Measure,

    #[token("RESET")]
    Reset,

    #[token("PRAGMA")]
    Pragma,

    #[token("HALT")]
    Halt,

    #[token("LABEL")]
    Label,

    #[token("JUMP")]
    Jump,

    #[token("JUMP-WHEN")]
    JumpWhen,

    #[token("JUMP-UNLESS")]
    JumpUnless,

    #[token("BIT")]
    Bit,

    #[token("OCTET")]
    Octet,

    #[token("INTEGER")]
    Integer,

    #[token("REAL")]
    Real,

    // Constants
    #[token("pi")]
    Pi,

    // Literals
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?i", |lex| {
        let s = lex.slice();
        s[..s.len() - 1].parse::<f64>().ok()
    })]
    ImaginaryLiteral(f64),

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    IntLiteral(u64),

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        Some(s[1..s.len()-1].to_string())
    })]
    StringLiteral(String),

    // Identifiers
    #[regex(r"@[a-zA-Z_][a-zA-Z0-9_\-]*", |lex| lex.slice()[1..].to_string())]
    LabelName(String),

    #[regex(r"%[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Variable(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("^")]
    Caret,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Newline => write!(f, "end of line"),
            Token::Declare => write!(f, "DECLARE"),
            Token::DefGate => write!(f, "DEFGATE"),
            Token::As => write!(f, "AS"),
            Token::Matrix => write!(f, "MATRIX"),
            Token::Dagger => write!(f, "DAGGER"),
            Token::Controlled => write!(f, "CONTROLLED"),
            Token::Forked => write!(f, "FORKED"),
            Token::Measure => write!(f, "MEASURE"),
            Token::Reset => write!(f, "RESET"),
            Token::Pragma => write!(f, "PRAGMA"),
            Token::Halt => write!(f, "HALT"),
            Token::Label => write!(f, "LABEL"),
            Token::Jump => write!(f, "JUMP"),
            Token::JumpWhen => write!(f, "JUMP-WHEN"),
            Token::JumpUnless => write!(f, "JUMP-UNLESS"),
            Token::Bit => write!(f, "BIT"),
            Token::Octet => write!(f, "OCTET"),
            Token::Integer => write!(f, "INTEGER"),
            Token::Real => write!(f, "REAL"),
            Token::Pi => write!(f, "pi"),
            Token::ImaginaryLiteral(v) => write!(f, "{v}i"),
            Token::FloatLiteral(v) => write!(f, "{v}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::LabelName(s) => write!(f, "@{s}"),
            Token::Variable(s) => write!(f, "%{s}"),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
        }
    }
}

/// A token with the line it starts on.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub line: usize,
}

/// Tokenize Quil source.
pub fn tokenize(source: &str) -> QuilParseResult<Vec<SpannedToken>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut counted = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        line += source[counted..span.start].matches('\n').count();
        counted = span.start;
        match result {
            Ok(token) => tokens.push(SpannedToken { token, line }),
            Err(()) => {
                return Err(QuilParseError::LexerError {
                    line,
                    message: format!("Invalid token: '{}'", &source[span]),
                });
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn test_gate_line() {
        assert_eq!(
            kinds("RX(pi/2) 0\n"),
            vec![
                Token::Identifier("RX".into()),
                Token::LParen,
                Token::Pi,
                Token::Slash,
                Token::IntLiteral(2),
                Token::RParen,
                Token::IntLiteral(0),
                Token::Newline,
            ]
        );
    }

    #[test]
    fn test_hyphenated_keywords() {
        assert_eq!(
            kinds("JUMP-WHEN @end ro[0]"),
            vec![
                Token::JumpWhen,
                Token::LabelName("end".into()),
                Token::Identifier("ro".into()),
                Token::LBracket,
                Token::IntLiteral(0),
                Token::RBracket,
            ]
        );
        assert_eq!(kinds("JUMP @a")[0], Token::Jump);
    }

    #[test]
    fn test_complex_literals() {
        let tokens = kinds("0.5-0.5i, 1i");
        assert!(matches!(tokens[0], Token::FloatLiteral(v) if (v - 0.5).abs() < 1e-12));
        assert_eq!(tokens[1], Token::Minus);
        assert!(matches!(tokens[2], Token::ImaginaryLiteral(v) if (v - 0.5).abs() < 1e-12));
        assert!(matches!(tokens[4], Token::ImaginaryLiteral(v) if (v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_comments_and_lines() {
        let tokens = tokenize("# header\nH 0\n\n# note\nMEASURE 0 ro[0]").unwrap();
        let measure = tokens.iter().find(|t| t.token == Token::Measure).unwrap();
        assert_eq!(measure.line, 5);
        assert!(!tokens.iter().any(|t| matches!(t.token, Token::Identifier(ref s) if s == "header")));
    }

    #[test]
    fn test_invalid_character() {
        let err = tokenize("H 0\nX $1").unwrap_err();
        assert_eq!(err.line(), Some(2));
    }
}
