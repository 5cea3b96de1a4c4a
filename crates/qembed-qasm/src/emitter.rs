//! OpenQASM 2 emitter.

use qembed_ir::{Circuit, Gate, GateName};

use crate::error::{TranslationError, TranslationResult};
use crate::gates::mnemonic;

/// Emit a circuit as OpenQASM 2.0 source.
///
/// Parameters are written with Rust's shortest round-trip float formatting,
/// so parsing the output recovers every parameter bit-for-bit.
pub fn emit(circuit: &Circuit) -> TranslationResult<String> {
    let mut emitter = Qasm2Emitter::new();
    emitter.emit_circuit(circuit)?;
    Ok(emitter.output)
}

struct Qasm2Emitter {
    output: String,
}

impl Qasm2Emitter {
    fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    fn writeln(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }

    fn emit_circuit(&mut self, circuit: &Circuit) -> TranslationResult<()> {
        let width = circuit.width();
        self.writeln("OPENQASM 2.0;");
        self.writeln("include \"qelib1.inc\";");
        self.writeln(&format!("qreg q[{width}];"));
        self.writeln(&format!("creg c[{width}];"));

        for gate in circuit.gates() {
            let line = self.emit_gate(gate)?;
            self.writeln(&line);
        }
        Ok(())
    }

    fn emit_gate(&self, gate: &Gate) -> TranslationResult<String> {
        let name = mnemonic(gate.name).ok_or(TranslationError::NoMnemonic(gate.name))?;

        if gate.name == GateName::Measure {
            let operands: Vec<String> = gate
                .target
                .iter()
                .map(|q| format!("measure q[{0}] -> c[{0}];", q.0))
                .collect();
            return Ok(operands.join("\n"));
        }

        let mut line = String::from(name);
        if let Some(value) = gate.parameter {
            if !value.is_finite() {
                return Err(TranslationError::NonFiniteParameter {
                    gate: gate.name,
                    value,
                });
            }
            line.push_str(&format!("({value:?})"));
        }

        let operands: Vec<String> = gate.qubits().map(|q| format!("q[{}]", q.0)).collect();
        line.push(' ');
        line.push_str(&operands.join(","));
        line.push(';');
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qembed_ir::QubitId;

    #[test]
    fn test_header() {
        let circuit = Circuit::with_width(2);
        let qasm = emit(&circuit).unwrap();
        assert_eq!(
            qasm,
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncreg c[2];\n"
        );
    }

    #[test]
    fn test_controls_precede_targets() {
        let mut circuit = Circuit::new();
        circuit.cx(QubitId(2), QubitId(0)).unwrap();
        circuit.cswap(QubitId(1), QubitId(0), QubitId(2)).unwrap();
        let qasm = emit(&circuit).unwrap();
        assert!(qasm.contains("cx q[2],q[0];"));
        assert!(qasm.contains("cswap q[1],q[0],q[2];"));
    }

    #[test]
    fn test_parameter_formatting() {
        let mut circuit = Circuit::new();
        circuit.rx(0.5, QubitId(0)).unwrap();
        circuit.p(1e-9, QubitId(0)).unwrap();
        circuit.measure(QubitId(0)).unwrap();
        let qasm = emit(&circuit).unwrap();
        assert!(qasm.contains("rx(0.5) q[0];"));
        assert!(qasm.contains("p(1e-9) q[0];"));
        assert!(qasm.contains("measure q[0] -> c[0];"));
    }
}
