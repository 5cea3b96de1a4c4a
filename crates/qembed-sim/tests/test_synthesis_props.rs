//! Property tests for Pauli-rotation synthesis against the statevector.

use proptest::prelude::*;

use qembed_ir::{Circuit, QubitId};
use qembed_sim::synthesis::append_exp_pauli;
use qembed_sim::{PauliOp, PauliString, Statevector};

const WIDTH: u32 = 4;

fn arb_pauli() -> impl Strategy<Value = PauliString> {
    prop::collection::vec(0u8..4, WIDTH as usize).prop_map(|codes| {
        PauliString::from_ops(codes.into_iter().enumerate().map(|(q, c)| {
            let op = match c {
                0 => PauliOp::I,
                1 => PauliOp::X,
                2 => PauliOp::Y,
                _ => PauliOp::Z,
            };
            (q as u32, op)
        }))
    })
}

/// A product state with a few single-qubit rotations so every Pauli has a
/// non-trivial expectation.
fn prepared_state(angles: &[f64]) -> Statevector {
    let mut c = Circuit::with_width(WIDTH);
    for (q, &a) in angles.iter().enumerate() {
        c.ry(a, QubitId(q as u32)).unwrap();
        c.rz(0.5 * a, QubitId(q as u32)).unwrap();
    }
    let mut sv = Statevector::new(WIDTH).unwrap();
    sv.apply_circuit(&c).unwrap();
    sv
}

proptest! {
    #[test]
    fn rotation_preserves_norm_and_generator(
        pauli in arb_pauli(),
        angle in -3.0f64..3.0,
        angles in prop::collection::vec(-3.0f64..3.0, WIDTH as usize),
    ) {
        let mut sv = prepared_state(&angles);
        let before = sv.expectation(&pauli).unwrap();

        let mut c = Circuit::with_width(WIDTH);
        append_exp_pauli(&mut c, &pauli, angle, false).unwrap();
        sv.apply_circuit(&c).unwrap();

        prop_assert!((sv.norm_sqr() - 1.0).abs() < 1e-10);
        let after = sv.expectation(&pauli).unwrap();
        prop_assert!((before - after).norm() < 1e-10);
        prop_assert!(after.im.abs() < 1e-10);
    }

    #[test]
    fn rotation_by_pi_is_global_phase_times_pauli(pauli in arb_pauli()) {
        // exp(-i π/2 P) = -i P, so conjugating Z0 matches P Z0 P.
        let angles = [0.3, -1.1, 0.8, 2.0];
        let mut sv = prepared_state(&angles);
        let mut c = Circuit::with_width(WIDTH);
        append_exp_pauli(&mut c, &pauli, std::f64::consts::FRAC_PI_2, false).unwrap();
        sv.apply_circuit(&c).unwrap();

        let z0 = PauliString::zz([0]);
        let flip = matches!(pauli.op_at(0), PauliOp::X | PauliOp::Y);
        let reference = prepared_state(&angles).expectation(&z0).unwrap().re;
        let value = sv.expectation(&z0).unwrap().re;
        let expected = if flip { -reference } else { reference };
        prop_assert!((value - expected).abs() < 1e-10);
    }
}
