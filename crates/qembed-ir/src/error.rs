//! Error types for the IR crate.

use crate::gate::GateName;
use crate::qubit::QubitId;
use thiserror::Error;

/// Errors that can occur while building circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Gate received the wrong number of target qubits.
    #[error("Gate '{gate}' requires {expected} target qubits, got {got}")]
    TargetCountMismatch {
        /// The offending gate.
        gate: GateName,
        /// Expected number of targets.
        expected: usize,
        /// Actual number of targets.
        got: usize,
    },

    /// Gate received the wrong number of control qubits.
    #[error("Gate '{gate}' requires {expected} control qubits, got {got}")]
    ControlCountMismatch {
        /// The offending gate.
        gate: GateName,
        /// Expected number of controls.
        expected: usize,
        /// Actual number of controls.
        got: usize,
    },

    /// A parameterized gate has no parameter.
    #[error("Gate '{0}' requires a parameter")]
    MissingParameter(GateName),

    /// A fixed gate was given a parameter.
    #[error("Gate '{0}' does not take a parameter")]
    UnexpectedParameter(GateName),

    /// Parameter is NaN or infinite.
    #[error("Gate '{gate}' has non-finite parameter {value}")]
    NonFiniteParameter {
        /// The offending gate.
        gate: GateName,
        /// The parameter value.
        value: f64,
    },

    /// The same qubit appears twice in one gate.
    #[error("Duplicate qubit {qubit} in gate '{gate}'")]
    DuplicateQubit {
        /// The duplicated qubit.
        qubit: QubitId,
        /// The offending gate.
        gate: GateName,
    },

    /// Qubit index beyond a fixed-width circuit.
    #[error("Qubit {qubit} out of range for circuit of width {width}")]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Circuit width.
        width: u32,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
