//! Circuit container and builder API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, GateName};
use crate::qubit::QubitId;

/// An ordered sequence of gates acting on `width` qubits.
///
/// A circuit created with [`Circuit::new`] grows its width to fit the
/// highest qubit index it sees. A circuit created with
/// [`Circuit::with_width`] has a fixed register and rejects out-of-range
/// qubits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    gates: Vec<Gate>,
    width: u32,
    fixed_width: bool,
}

impl Circuit {
    /// Create an empty circuit whose width follows the gates added to it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty circuit over a fixed register of `width` qubits.
    pub fn with_width(width: u32) -> Self {
        Self {
            gates: Vec::new(),
            width,
            fixed_width: true,
        }
    }

    /// Append a gate after validating it.
    pub fn add_gate(&mut self, gate: Gate) -> IrResult<&mut Self> {
        gate.validate()?;
        let highest = gate.qubits().map(|q| q.0).max().unwrap_or(0);
        if highest >= self.width {
            if self.fixed_width {
                return Err(IrError::QubitOutOfRange {
                    qubit: QubitId(highest),
                    width: self.width,
                });
            }
            self.width = highest + 1;
        }
        self.gates.push(gate);
        Ok(self)
    }

    /// Append every gate of `other`.
    pub fn extend(&mut self, other: &Circuit) -> IrResult<&mut Self> {
        for gate in &other.gates {
            self.add_gate(gate.clone())?;
        }
        if !self.fixed_width {
            self.width = self.width.max(other.width);
        }
        Ok(self)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::H, [qubit]))
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::X, [qubit]))
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::Y, [qubit]))
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::Z, [qubit]))
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::S, [qubit]))
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::T, [qubit]))
    }

    /// Apply Rx rotation.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::Rx, [qubit]).with_parameter(theta))
    }

    /// Apply Ry rotation.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::Ry, [qubit]).with_parameter(theta))
    }

    /// Apply Rz rotation.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::Rz, [qubit]).with_parameter(theta))
    }

    /// Apply phase gate.
    pub fn p(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::Phase, [qubit]).with_parameter(theta))
    }

    /// Measure one qubit.
    pub fn measure(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::Measure, [qubit]))
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::Cnot, [target]).with_control([control]))
    }

    /// Apply CY gate.
    pub fn cy(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::Cy, [target]).with_control([control]))
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::Cz, [target]).with_control([control]))
    }

    /// Apply controlled-Rz gate.
    pub fn crz(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.add_gate(
            Gate::new(GateName::Crz, [target])
                .with_control([control])
                .with_parameter(theta),
        )
    }

    /// Apply controlled-phase gate.
    pub fn cp(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.add_gate(
            Gate::new(GateName::CPhase, [target])
                .with_control([control])
                .with_parameter(theta),
        )
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::Swap, [q1, q2]))
    }

    /// Apply Fredkin gate.
    pub fn cswap(&mut self, control: QubitId, t1: QubitId, t2: QubitId) -> IrResult<&mut Self> {
        self.add_gate(Gate::new(GateName::CSwap, [t1, t2]).with_control([control]))
    }

    // =========================================================================
    // Accessors and statistics
    // =========================================================================

    /// Gates in application order.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Number of qubits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of gates.
    pub fn size(&self) -> usize {
        self.gates.len()
    }

    /// True when the circuit has no gates.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Gate histogram keyed by gate name.
    pub fn counts(&self) -> BTreeMap<GateName, usize> {
        let mut counts = BTreeMap::new();
        for gate in &self.gates {
            *counts.entry(gate.name).or_insert(0) += 1;
        }
        counts
    }

    /// Number of gates acting on exactly two qubits.
    pub fn two_qubit_gate_count(&self) -> usize {
        self.gates
            .iter()
            .filter(|g| g.name.num_qubits() == 2)
            .count()
    }

    /// Number of gates marked variational.
    pub fn variational_gate_count(&self) -> usize {
        self.gates.iter().filter(|g| g.is_variational).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growing_width() {
        let mut circuit = Circuit::new();
        circuit.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(3)).unwrap();
        assert_eq!(circuit.width(), 4);
        assert_eq!(circuit.size(), 2);
    }

    #[test]
    fn test_fixed_width_rejects_out_of_range() {
        let mut circuit = Circuit::with_width(2);
        let err = circuit.x(QubitId(2)).unwrap_err();
        assert!(matches!(err, IrError::QubitOutOfRange { width: 2, .. }));
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_counts_and_statistics() {
        let mut circuit = Circuit::new();
        circuit
            .h(QubitId(0))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .cx(QubitId(1), QubitId(2))
            .unwrap()
            .cswap(QubitId(0), QubitId(1), QubitId(2))
            .unwrap();
        circuit
            .add_gate(
                Gate::new(GateName::Rz, [QubitId(2)])
                    .with_parameter(0.3)
                    .variational(),
            )
            .unwrap();

        assert_eq!(circuit.counts()[&GateName::Cnot], 2);
        assert_eq!(circuit.two_qubit_gate_count(), 2);
        assert_eq!(circuit.variational_gate_count(), 1);
    }

    #[test]
    fn test_controls_are_separate_from_targets() {
        let mut circuit = Circuit::new();
        circuit.crz(0.5, QubitId(1), QubitId(0)).unwrap();
        let gate = &circuit.gates()[0];
        assert_eq!(gate.control, vec![QubitId(1)]);
        assert_eq!(gate.target, vec![QubitId(0)]);
        assert_eq!(gate.parameter, Some(0.5));
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut circuit = Circuit::new();
        circuit.ry(1.25, QubitId(0)).unwrap().swap(QubitId(0), QubitId(1)).unwrap();
        let json = serde_json::to_string(&circuit).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, circuit);
    }
}
