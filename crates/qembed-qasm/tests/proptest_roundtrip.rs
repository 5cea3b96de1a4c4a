//! Property-based tests for OpenQASM 2 roundtrip conversion.
//!
//! circuit → OpenQASM → circuit must reproduce the same gate sequence:
//! same names, same targets and controls, bit-identical parameters.

use proptest::prelude::*;
use qembed_ir::{Circuit, Gate, GateName, QubitId};
use qembed_qasm::{from_openqasm, to_openqasm};

/// One gate over the whole vocabulary, on distinct qubits of a `width`-qubit register.
fn arb_gate(width: u32) -> impl Strategy<Value = Gate> {
    (
        0..GateName::ALL.len(),
        Just((0..width).collect::<Vec<u32>>()).prop_shuffle(),
        -8.0_f64..8.0,
    )
        .prop_map(|(index, qubits, angle)| {
            let name = GateName::ALL[index];
            let mut qubits = qubits.into_iter().map(QubitId);
            let controls: Vec<QubitId> = qubits.by_ref().take(name.num_controls()).collect();
            let targets: Vec<QubitId> = qubits.take(name.num_targets()).collect();
            let gate = Gate::new(name, targets).with_control(controls);
            if name.is_parameterized() {
                gate.with_parameter(angle)
            } else {
                gate
            }
        })
}

/// Generate circuits with 3-6 qubits and 0-20 gates.
fn arb_circuit() -> impl Strategy<Value = Circuit> {
    (3_u32..=6).prop_flat_map(|width| {
        prop::collection::vec(arb_gate(width), 0..=20).prop_map(move |gates| {
            let mut circuit = Circuit::with_width(width);
            for gate in gates {
                circuit.add_gate(gate).expect("generated gate is valid");
            }
            circuit
        })
    })
}

proptest! {
    #[test]
    fn test_roundtrip_preserves_gates(circuit in arb_circuit()) {
        let text = to_openqasm(&circuit).expect("emit failed");
        let parsed = from_openqasm(&text).expect("parse failed");

        prop_assert_eq!(parsed.width(), circuit.width());
        prop_assert_eq!(parsed.gates(), circuit.gates());
    }

    #[test]
    fn test_emission_is_deterministic(circuit in arb_circuit()) {
        let first = to_openqasm(&circuit).expect("first emit failed");
        let second = to_openqasm(&circuit).expect("second emit failed");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_empty_circuit_roundtrip(width in 1_u32..=12) {
        let circuit = Circuit::with_width(width);
        let parsed = from_openqasm(&to_openqasm(&circuit).expect("emit failed"))
            .expect("parse failed");
        prop_assert_eq!(parsed.width(), width);
        prop_assert!(parsed.is_empty());
    }
}
