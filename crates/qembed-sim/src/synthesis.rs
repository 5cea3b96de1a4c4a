//! Pauli-rotation synthesis.
//!
//!   exp(-i · θ · P),   P = P_{q1} ⊗ … ⊗ P_{qk}
//!
//! is built as basis change, CNOT ladder onto the last qubit, `Rz(2θ)`, and
//! the mirror image. X factors rotate through `H`; Y factors through
//! `Rx(π/2)` and back through `Rx(-π/2)`.
//!
//! Gate count per string: 2·(k-1) CNOT + 2 basis gates per X/Y factor + 1 Rz.

use std::f64::consts::FRAC_PI_2;

use qembed_ir::{Circuit, Gate, GateName, QubitId};

use crate::error::SimResult;
use crate::operator::QubitOperator;
use crate::pauli::{PauliOp, PauliString};

/// Append `exp(-i · angle · pauli)` to `circuit`.
///
/// When `variational` is set the central `Rz` is marked as carrying a
/// variational parameter. The identity string is a global phase and appends
/// nothing.
pub fn append_exp_pauli(
    circuit: &mut Circuit,
    pauli: &PauliString,
    angle: f64,
    variational: bool,
) -> SimResult<()> {
    let ops = pauli.ops();
    let Some(&(last, _)) = ops.last() else {
        return Ok(());
    };

    basis_change(circuit, ops, false)?;
    let qubits: Vec<u32> = ops.iter().map(|(q, _)| *q).collect();
    for pair in qubits.windows(2) {
        circuit.cx(QubitId(pair[0]), QubitId(pair[1]))?;
    }

    let mut rz = Gate::new(GateName::Rz, [QubitId(last)]).with_parameter(2.0 * angle);
    if variational {
        rz = rz.variational();
    }
    circuit.add_gate(rz)?;

    for pair in qubits.windows(2).rev() {
        circuit.cx(QubitId(pair[0]), QubitId(pair[1]))?;
    }
    basis_change(circuit, ops, true)?;
    Ok(())
}

/// Append one first-order Trotter step of `exp(-i · t · H)` for a Hermitian `H`.
///
/// Imaginary parts of the coefficients are ignored.
pub fn append_trotter_step(
    circuit: &mut Circuit,
    operator: &QubitOperator,
    t: f64,
    variational: bool,
) -> SimResult<()> {
    for (pauli, coeff) in operator.terms() {
        append_exp_pauli(circuit, pauli, coeff.re * t, variational)?;
    }
    Ok(())
}

fn basis_change(circuit: &mut Circuit, ops: &[(u32, PauliOp)], undo: bool) -> SimResult<()> {
    for &(q, op) in ops {
        let qid = QubitId(q);
        match op {
            PauliOp::X => {
                circuit.h(qid)?;
            }
            PauliOp::Y => {
                let angle = if undo { -FRAC_PI_2 } else { FRAC_PI_2 };
                circuit.rx(angle, qid)?;
            }
            PauliOp::Z | PauliOp::I => {}
        }
    }
    Ok(())
}
