//! Gate vocabulary and gate operations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::qubit::QubitId;

/// The fixed set of gate operations understood by the circuit model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GateName {
    /// Hadamard gate.
    H,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// S gate (sqrt(Z)).
    S,
    /// T gate (fourth root of Z).
    T,
    /// Rotation around X axis.
    Rx,
    /// Rotation around Y axis.
    Ry,
    /// Rotation around Z axis.
    Rz,
    /// Single-qubit phase gate diag(1, e^{iθ}).
    Phase,
    /// Controlled-X (CNOT) gate.
    Cnot,
    /// Controlled-Y gate.
    Cy,
    /// Controlled-Z gate.
    Cz,
    /// Controlled-Rz gate.
    Crz,
    /// Controlled-phase gate.
    CPhase,
    /// SWAP gate.
    Swap,
    /// Controlled-SWAP (Fredkin) gate.
    CSwap,
    /// Computational-basis measurement of a single qubit.
    Measure,
}

impl GateName {
    /// Every gate in the vocabulary, in declaration order.
    pub const ALL: [GateName; 18] = [
        GateName::H,
        GateName::X,
        GateName::Y,
        GateName::Z,
        GateName::S,
        GateName::T,
        GateName::Rx,
        GateName::Ry,
        GateName::Rz,
        GateName::Phase,
        GateName::Cnot,
        GateName::Cy,
        GateName::Cz,
        GateName::Crz,
        GateName::CPhase,
        GateName::Swap,
        GateName::CSwap,
        GateName::Measure,
    ];

    /// Canonical upper-case label of the gate.
    pub fn label(&self) -> &'static str {
        match self {
            GateName::H => "H",
            GateName::X => "X",
            GateName::Y => "Y",
            GateName::Z => "Z",
            GateName::S => "S",
            GateName::T => "T",
            GateName::Rx => "RX",
            GateName::Ry => "RY",
            GateName::Rz => "RZ",
            GateName::Phase => "PHASE",
            GateName::Cnot => "CNOT",
            GateName::Cy => "CY",
            GateName::Cz => "CZ",
            GateName::Crz => "CRZ",
            GateName::CPhase => "CPHASE",
            GateName::Swap => "SWAP",
            GateName::CSwap => "CSWAP",
            GateName::Measure => "MEASURE",
        }
    }

    /// Number of target qubits.
    pub fn num_targets(&self) -> usize {
        match self {
            GateName::Swap | GateName::CSwap => 2,
            _ => 1,
        }
    }

    /// Number of control qubits.
    pub fn num_controls(&self) -> usize {
        match self {
            GateName::Cnot
            | GateName::Cy
            | GateName::Cz
            | GateName::Crz
            | GateName::CPhase
            | GateName::CSwap => 1,
            _ => 0,
        }
    }

    /// Total number of qubits the gate acts on.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_targets() + self.num_controls()
    }

    /// Whether the gate carries a single real parameter.
    pub fn is_parameterized(&self) -> bool {
        matches!(
            self,
            GateName::Rx
                | GateName::Ry
                | GateName::Rz
                | GateName::Phase
                | GateName::Crz
                | GateName::CPhase
        )
    }
}

impl fmt::Display for GateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single gate operation: name, targets, controls and an optional parameter.
///
/// Controls are listed separately from targets, so a CNOT is
/// `target = [t], control = [c]` and a SWAP is `target = [a, b]` with no
/// control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// Operation type.
    pub name: GateName,
    /// Target qubits.
    pub target: Vec<QubitId>,
    /// Control qubits (empty for uncontrolled gates).
    #[serde(default)]
    pub control: Vec<QubitId>,
    /// Rotation angle or phase, for parameterized gates.
    #[serde(default)]
    pub parameter: Option<f64>,
    /// Marks gates whose parameter is optimised by a variational algorithm.
    #[serde(default)]
    pub is_variational: bool,
}

impl Gate {
    /// Create an uncontrolled, unparameterized gate.
    pub fn new(name: GateName, target: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            name,
            target: target.into_iter().collect(),
            control: Vec::new(),
            parameter: None,
            is_variational: false,
        }
    }

    /// Add control qubits.
    pub fn with_control(mut self, control: impl IntoIterator<Item = QubitId>) -> Self {
        self.control = control.into_iter().collect();
        self
    }

    /// Set the gate parameter.
    pub fn with_parameter(mut self, parameter: f64) -> Self {
        self.parameter = Some(parameter);
        self
    }

    /// Mark the gate as variational.
    pub fn variational(mut self) -> Self {
        self.is_variational = true;
        self
    }

    /// Controls followed by targets.
    pub fn qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        self.control.iter().chain(self.target.iter()).copied()
    }

    /// Check arity, parameter presence and qubit distinctness.
    pub fn validate(&self) -> IrResult<()> {
        if self.target.len() != self.name.num_targets() {
            return Err(IrError::TargetCountMismatch {
                gate: self.name,
                expected: self.name.num_targets(),
                got: self.target.len(),
            });
        }
        if self.control.len() != self.name.num_controls() {
            return Err(IrError::ControlCountMismatch {
                gate: self.name,
                expected: self.name.num_controls(),
                got: self.control.len(),
            });
        }
        match (self.name.is_parameterized(), self.parameter) {
            (true, None) => return Err(IrError::MissingParameter(self.name)),
            (false, Some(_)) => return Err(IrError::UnexpectedParameter(self.name)),
            (true, Some(value)) if !value.is_finite() => {
                return Err(IrError::NonFiniteParameter {
                    gate: self.name,
                    value,
                });
            }
            _ => {}
        }
        let qubits: Vec<QubitId> = self.qubits().collect();
        for (i, q) in qubits.iter().enumerate() {
            if qubits[..i].contains(q) {
                return Err(IrError::DuplicateQubit {
                    qubit: *q,
                    gate: self.name,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<8}target : {:?}", self.name.label(), self.target)?;
        if !self.control.is_empty() {
            write!(f, "   control : {:?}", self.control)?;
        }
        if let Some(p) = self.parameter {
            write!(f, "   parameter : {p}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_table() {
        assert_eq!(GateName::CSwap.num_qubits(), 3);
        assert_eq!(GateName::Swap.num_controls(), 0);
        assert_eq!(GateName::Crz.num_qubits(), 2);
        assert!(GateName::CPhase.is_parameterized());
        assert!(!GateName::Measure.is_parameterized());
    }

    #[test]
    fn test_validate_rejects_missing_control() {
        let gate = Gate::new(GateName::Cnot, [QubitId(1)]);
        assert!(matches!(
            gate.validate(),
            Err(IrError::ControlCountMismatch { expected: 1, got: 0, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_qubit() {
        let gate = Gate::new(GateName::Cz, [QubitId(0)]).with_control([QubitId(0)]);
        assert!(matches!(
            gate.validate(),
            Err(IrError::DuplicateQubit { .. })
        ));
    }

    #[test]
    fn test_validate_parameter_rules() {
        assert!(Gate::new(GateName::Rx, [QubitId(0)]).validate().is_err());
        assert!(
            Gate::new(GateName::H, [QubitId(0)])
                .with_parameter(1.0)
                .validate()
                .is_err()
        );
        assert!(
            Gate::new(GateName::Rz, [QubitId(0)])
                .with_parameter(f64::NAN)
                .validate()
                .is_err()
        );
        assert!(
            Gate::new(GateName::Rz, [QubitId(0)])
                .with_parameter(0.25)
                .validate()
                .is_ok()
        );
    }
}
