//! Error types for the OpenQASM translator.

use qembed_ir::{GateName, IrError};
use thiserror::Error;

/// Errors raised while converting circuits to or from OpenQASM text.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TranslationError {
    /// Lexer error (invalid token).
    #[error("Lexer error at line {line}: {message}")]
    Lexer { line: usize, message: String },

    /// Gate mnemonic outside the supported vocabulary.
    #[error("Unsupported gate '{gate}' at line {line}")]
    UnsupportedGate { line: usize, gate: String },

    /// Recognised construct that the translator deliberately does not handle.
    #[error("Unsupported construct at line {line}: {feature}")]
    Unsupported { line: usize, feature: String },

    /// Syntax error.
    #[error("Malformed instruction at line {line}: expected {expected}, found {found}")]
    Malformed {
        line: usize,
        expected: String,
        found: String,
    },

    /// No `qreg` declaration precedes the first instruction.
    #[error("Missing quantum register declaration (qreg) before line {line}")]
    MissingRegister { line: usize },

    /// Operand refers to an unknown register.
    #[error("Unknown register '{register}' at line {line}")]
    UnknownRegister { line: usize, register: String },

    /// Operand index beyond the declared register.
    #[error("Index {index} out of bounds for register of size {size} at line {line}")]
    IndexOutOfBounds {
        line: usize,
        index: u64,
        size: u32,
    },

    /// Gate received the wrong number of qubit operands.
    #[error("Gate '{gate}' at line {line} expects {expected} qubits, got {got}")]
    WrongOperandCount {
        line: usize,
        gate: String,
        expected: usize,
        got: usize,
    },

    /// Identifier in a parameter expression that is neither `pi` nor a known function.
    #[error("Unknown identifier '{name}' in parameter at line {line}")]
    UnknownIdentifier { line: usize, name: String },

    /// The parsed gate failed circuit validation.
    #[error("Invalid gate at line {line}: {source}")]
    InvalidGate {
        line: usize,
        #[source]
        source: IrError,
    },

    /// A gate parameter cannot be written as a finite number.
    #[error("Gate '{gate}' has non-finite parameter {value}")]
    NonFiniteParameter { gate: GateName, value: f64 },

    /// A gate in the circuit has no OpenQASM mnemonic.
    #[error("Gate '{0}' has no OpenQASM mnemonic")]
    NoMnemonic(GateName),
}

/// Result type for translation.
pub type TranslationResult<T> = Result<T, TranslationError>;
