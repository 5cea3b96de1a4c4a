//! Translation tests against hand-written OpenQASM programs.

use std::f64::consts::PI;

use qembed_ir::{GateName, QubitId};
use qembed_qasm::{TranslationError, from_openqasm, to_openqasm};

const HEADER: &str = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[4];\ncreg c[4];\n";

// ---------------------------------------------------------------------------
// Operand order
// ---------------------------------------------------------------------------

#[test]
fn test_controlled_rotation_control_then_target() {
    let circuit = from_openqasm(&format!("{HEADER}crz(pi/4) q[3],q[1];\n")).unwrap();
    let gate = &circuit.gates()[0];
    assert_eq!(gate.name, GateName::Crz);
    assert_eq!(gate.control, vec![QubitId(3)]);
    assert_eq!(gate.target, vec![QubitId(1)]);
    assert!((gate.parameter.unwrap() - PI / 4.0).abs() < 1e-12);
}

#[test]
fn test_swap_has_no_control() {
    let circuit = from_openqasm(&format!("{HEADER}swap q[3],q[1];\n")).unwrap();
    let gate = &circuit.gates()[0];
    assert_eq!(gate.name, GateName::Swap);
    assert!(gate.control.is_empty());
    assert_eq!(gate.target, vec![QubitId(3), QubitId(1)]);
}

#[test]
fn test_cswap_operands() {
    let circuit = from_openqasm(&format!("{HEADER}cswap q[0],q[2],q[3];\n")).unwrap();
    let gate = &circuit.gates()[0];
    assert_eq!(gate.control, vec![QubitId(0)]);
    assert_eq!(gate.target, vec![QubitId(2), QubitId(3)]);
}

#[test]
fn test_irregular_mnemonics() {
    let circuit =
        from_openqasm(&format!("{HEADER}cx q[0],q[1];\np(0.1) q[2];\ncp(0.2) q[2],q[3];\n"))
            .unwrap();
    let names: Vec<GateName> = circuit.gates().iter().map(|g| g.name).collect();
    assert_eq!(names, vec![GateName::Cnot, GateName::Phase, GateName::CPhase]);
}

#[test]
fn test_measure_and_comments() {
    let source =
        format!("{HEADER}// prepare\nh q[0];\n\nmeasure q[0] -> c[0];\nmeasure q[1] -> c[1];\n");
    let circuit = from_openqasm(&source).unwrap();
    assert_eq!(circuit.size(), 3);
    assert_eq!(circuit.counts()[&GateName::Measure], 2);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn test_unsupported_three_qubit_gate() {
    let err = from_openqasm(&format!("{HEADER}ccx q[0],q[1],q[2];\n")).unwrap_err();
    match err {
        TranslationError::UnsupportedGate { gate, line } => {
            assert_eq!(gate, "ccx");
            assert_eq!(line, 5);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_error_message_names_gate() {
    let err = from_openqasm(&format!("{HEADER}barrier q[0],q[1];\n")).unwrap_err();
    assert!(err.to_string().contains("barrier"));
}

#[test]
fn test_multi_parameter_gate_rejected() {
    let err = from_openqasm(&format!("{HEADER}rz(0.1, 0.2) q[0];\n")).unwrap_err();
    assert!(matches!(err, TranslationError::Unsupported { .. }));
}

#[test]
fn test_conditioned_operation_rejected() {
    let err = from_openqasm(&format!("{HEADER}if (c==1) x q[0];\n")).unwrap_err();
    assert!(matches!(err, TranslationError::Unsupported { .. }));
}

#[test]
fn test_wrong_operand_count() {
    let err = from_openqasm(&format!("{HEADER}cz q[0];\n")).unwrap_err();
    assert!(matches!(
        err,
        TranslationError::WrongOperandCount { expected: 2, got: 1, .. }
    ));
}

#[test]
fn test_missing_parameter() {
    let err = from_openqasm(&format!("{HEADER}rx q[0];\n")).unwrap_err();
    assert!(matches!(err, TranslationError::InvalidGate { .. }));
}

#[test]
fn test_missing_register() {
    let err = from_openqasm("OPENQASM 2.0;\n").unwrap_err();
    assert!(matches!(err, TranslationError::MissingRegister { .. }));
}

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

#[test]
fn test_emit_then_parse_keeps_width() {
    let source = format!("{HEADER}h q[0];\n");
    let circuit = from_openqasm(&source).unwrap();
    let text = to_openqasm(&circuit).unwrap();
    assert_eq!(text, source);
}
