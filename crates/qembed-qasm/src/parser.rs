//! Line-oriented parser for `OpenQASM` 2 programs.
//!
//! Each non-empty line holds one statement. The header (`OPENQASM`,
//! `include`, `qreg`, `creg`) fixes the register width; every following
//! line is a gate instruction from the supported vocabulary.

use std::f64::consts::PI;

use qembed_ir::{Circuit, Gate, GateName, QubitId};

use crate::error::{TranslationError, TranslationResult};
use crate::gates::gate_for;
use crate::lexer::{Token, tokenize};

/// Parse OpenQASM 2 text into a circuit.
pub fn parse(source: &str) -> TranslationResult<Circuit> {
    let mut register: Option<(String, u32)> = None;
    let mut circuit = Circuit::new();

    for (index, text) in source.lines().enumerate() {
        let line = index + 1;
        let tokens =
            tokenize(text).map_err(|message| TranslationError::Lexer { line, message })?;
        if tokens.is_empty() {
            continue;
        }

        let mut parser = LineParser::new(tokens, line);
        match parser.peek() {
            Some(Token::OpenQasm) => parser.parse_version()?,
            Some(Token::Include) => parser.parse_include()?,
            Some(Token::Creg) => {
                parser.parse_register(Token::Creg)?;
            }
            Some(Token::Qreg) => {
                if register.is_some() {
                    return Err(TranslationError::Unsupported {
                        line,
                        feature: "more than one quantum register".into(),
                    });
                }
                let (name, size) = parser.parse_register(Token::Qreg)?;
                circuit = Circuit::with_width(size);
                register = Some((name, size));
            }
            Some(Token::If) => {
                return Err(TranslationError::Unsupported {
                    line,
                    feature: "classically-conditioned operations".into(),
                });
            }
            _ => {
                let (reg_name, size) = register
                    .as_ref()
                    .ok_or(TranslationError::MissingRegister { line })?;
                let gate = parser.parse_instruction(reg_name, *size)?;
                circuit
                    .add_gate(gate)
                    .map_err(|source| TranslationError::InvalidGate { line, source })?;
            }
        }
    }

    if register.is_none() {
        return Err(TranslationError::MissingRegister {
            line: source.lines().count() + 1,
        });
    }
    Ok(circuit)
}

/// Cursor over the tokens of a single line.
struct LineParser {
    tokens: Vec<Token>,
    pos: usize,
    line: usize,
}

impl LineParser {
    fn new(tokens: Vec<Token>, line: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            line,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn malformed(&self, expected: &str) -> TranslationError {
        TranslationError::Malformed {
            line: self.line,
            expected: expected.into(),
            found: self
                .peek()
                .map_or_else(|| "end of line".to_string(), ToString::to_string),
        }
    }

    fn expect(&mut self, token: &Token) -> TranslationResult<()> {
        if self.consume(token) {
            Ok(())
        } else {
            Err(self.malformed(&format!("'{token}'")))
        }
    }

    fn expect_identifier(&mut self) -> TranslationResult<String> {
        match self.peek() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.malformed("identifier")),
        }
    }

    fn expect_int(&mut self) -> TranslationResult<u64> {
        match self.peek() {
            Some(Token::IntLiteral(v)) => {
                let v = *v;
                self.pos += 1;
                Ok(v)
            }
            _ => Err(self.malformed("integer")),
        }
    }

    fn expect_end(&mut self) -> TranslationResult<()> {
        self.expect(&Token::Semicolon)?;
        if self.peek().is_some() {
            return Err(self.malformed("end of line"));
        }
        Ok(())
    }

    // =========================================================================
    // Header statements
    // =========================================================================

    fn parse_version(&mut self) -> TranslationResult<()> {
        self.advance();
        let version = match self.advance() {
            Some(Token::FloatLiteral(v)) => v,
            Some(Token::IntLiteral(v)) => v as f64,
            _ => return Err(self.malformed("version number")),
        };
        if version.trunc() != 2.0 {
            return Err(TranslationError::Unsupported {
                line: self.line,
                feature: format!("OPENQASM version {version}"),
            });
        }
        self.expect_end()
    }

    fn parse_include(&mut self) -> TranslationResult<()> {
        self.advance();
        match self.advance() {
            Some(Token::StringLiteral(_)) => self.expect_end(),
            _ => Err(self.malformed("include path")),
        }
    }

    fn parse_register(&mut self, keyword: Token) -> TranslationResult<(String, u32)> {
        self.expect(&keyword)?;
        let name = self.expect_identifier()?;
        self.expect(&Token::LBracket)?;
        let size = self.expect_int()?;
        self.expect(&Token::RBracket)?;
        self.expect_end()?;
        let size = u32::try_from(size).map_err(|_| self.malformed("register size"))?;
        Ok((name, size))
    }

    // =========================================================================
    // Gate instructions
    // =========================================================================

    fn parse_instruction(&mut self, register: &str, size: u32) -> TranslationResult<Gate> {
        let mnemonic = self.expect_identifier()?;
        let name = gate_for(&mnemonic).ok_or_else(|| TranslationError::UnsupportedGate {
            line: self.line,
            gate: mnemonic.clone(),
        })?;

        let mut parameters = Vec::new();
        if self.consume(&Token::LParen) {
            parameters.push(self.parse_expression(0)?);
            while self.consume(&Token::Comma) {
                parameters.push(self.parse_expression(0)?);
            }
            self.expect(&Token::RParen)?;
        }
        if parameters.len() > 1 {
            return Err(TranslationError::Unsupported {
                line: self.line,
                feature: format!("gate '{mnemonic}' with {} parameters", parameters.len()),
            });
        }

        let mut operands = vec![self.parse_operand(register, size)?];
        if name == GateName::Measure {
            // The classical destination carries no information for the circuit model.
            if self.consume(&Token::Arrow) {
                self.expect_identifier()?;
                self.expect(&Token::LBracket)?;
                self.expect_int()?;
                self.expect(&Token::RBracket)?;
            }
        } else {
            while self.consume(&Token::Comma) {
                operands.push(self.parse_operand(register, size)?);
            }
        }
        self.expect_end()?;

        if operands.len() != name.num_qubits() {
            return Err(TranslationError::WrongOperandCount {
                line: self.line,
                gate: mnemonic,
                expected: name.num_qubits(),
                got: operands.len(),
            });
        }

        let n_controls = name.num_controls();
        let mut gate = Gate::new(name, operands[n_controls..].iter().copied())
            .with_control(operands[..n_controls].iter().copied());
        if let Some(&parameter) = parameters.first() {
            gate = gate.with_parameter(parameter);
        }
        Ok(gate)
    }

    fn parse_operand(&mut self, register: &str, size: u32) -> TranslationResult<QubitId> {
        let name = self.expect_identifier()?;
        if name != register {
            return Err(TranslationError::UnknownRegister {
                line: self.line,
                register: name,
            });
        }
        self.expect(&Token::LBracket)?;
        let index = self.expect_int()?;
        self.expect(&Token::RBracket)?;
        match u32::try_from(index) {
            Ok(i) if i < size => Ok(QubitId(i)),
            _ => Err(TranslationError::IndexOutOfBounds {
                line: self.line,
                index,
                size,
            }),
        }
    }

    // =========================================================================
    // Parameter expressions
    // =========================================================================

    /// Evaluate an arithmetic expression with precedence climbing.
    fn parse_expression(&mut self, min_prec: u8) -> TranslationResult<f64> {
        let mut left = self.parse_unary()?;

        while let Some((prec, right_assoc)) = self.peek().and_then(binary_precedence) {
            if prec < min_prec {
                break;
            }
            let op = self.advance();
            let next_min = if right_assoc { prec } else { prec + 1 };
            let right = self.parse_expression(next_min)?;
            left = match op {
                Some(Token::Plus) => left + right,
                Some(Token::Minus) => left - right,
                Some(Token::Star) => left * right,
                Some(Token::Slash) => left / right,
                Some(Token::Caret) => left.powf(right),
                _ => return Err(self.malformed("operator")),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> TranslationResult<f64> {
        if self.consume(&Token::Minus) {
            return Ok(-self.parse_unary()?);
        }
        if self.consume(&Token::Plus) {
            return self.parse_unary();
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> TranslationResult<f64> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| self.malformed("expression"))?;
        match token {
            Token::FloatLiteral(v) => {
                self.pos += 1;
                Ok(v)
            }
            Token::IntLiteral(v) => {
                self.pos += 1;
                Ok(v as f64)
            }
            Token::Pi => {
                self.pos += 1;
                Ok(PI)
            }
            Token::LParen => {
                self.pos += 1;
                let value = self.parse_expression(0)?;
                self.expect(&Token::RParen)?;
                Ok(value)
            }
            Token::Identifier(name) => {
                self.pos += 1;
                let function = unary_function(&name).ok_or_else(|| {
                    TranslationError::UnknownIdentifier {
                        line: self.line,
                        name: name.clone(),
                    }
                })?;
                self.expect(&Token::LParen)?;
                let argument = self.parse_expression(0)?;
                self.expect(&Token::RParen)?;
                Ok(function(argument))
            }
            _ => Err(self.malformed("expression")),
        }
    }
}

/// Precedence and associativity of a binary operator token.
fn binary_precedence(token: &Token) -> Option<(u8, bool)> {
    match token {
        Token::Plus | Token::Minus => Some((1, false)),
        Token::Star | Token::Slash => Some((2, false)),
        Token::Caret => Some((3, true)),
        _ => None,
    }
}

/// Built-in unary functions of OpenQASM 2 parameter expressions.
fn unary_function(name: &str) -> Option<fn(f64) -> f64> {
    match name {
        "sin" => Some(f64::sin),
        "cos" => Some(f64::cos),
        "tan" => Some(f64::tan),
        "exp" => Some(f64::exp),
        "ln" => Some(f64::ln),
        "sqrt" => Some(f64::sqrt),
        _ => None,
    }
}
