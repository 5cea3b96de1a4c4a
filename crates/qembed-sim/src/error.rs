//! Error types for the sim crate.

use thiserror::Error;

/// Errors produced by operator algebra, synthesis and simulation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// A Pauli string references a qubit index that is out of range.
    #[error("Pauli string references qubit {qubit} but the register only has {n_qubits} qubits")]
    QubitOutOfRange {
        /// The offending qubit index.
        qubit: u32,
        /// Number of qubits in the register.
        n_qubits: u32,
    },

    /// A circuit is wider than the statevector it is applied to.
    #[error("Circuit of width {circuit} does not fit a {state}-qubit statevector")]
    WidthMismatch {
        /// Circuit width.
        circuit: u32,
        /// Statevector width.
        state: u32,
    },

    /// Statevector register too large to allocate.
    #[error("Statevector of {0} qubits exceeds the supported maximum")]
    TooManyQubits(u32),

    /// Amplitude vector length is not a power of two.
    #[error("Amplitude vector of length {0} is not a power of two")]
    InvalidAmplitudes(usize),

    /// Text does not describe a Pauli string.
    #[error("Invalid Pauli string '{0}'")]
    InvalidPauliString(String),

    /// Sampling was asked for zero shots or an empty distribution.
    #[error("Cannot sample: {0}")]
    Sampling(String),

    /// Circuit builder returned an error.
    #[error("Circuit IR error: {0}")]
    Ir(#[from] qembed_ir::IrError),
}

/// Result type for sim operations.
pub type SimResult<T> = Result<T, SimError>;
