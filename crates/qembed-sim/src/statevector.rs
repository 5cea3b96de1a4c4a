//! Dense statevector simulation.
//!
//! Amplitudes are indexed little-endian: bit `q` of the index is the state of
//! qubit `q`. Bitstrings handed out to callers list qubit 0 first.

use num_complex::Complex64;
use rand::Rng;
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

use qembed_ir::{Circuit, Gate, GateName};

use crate::error::{SimError, SimResult};
use crate::operator::QubitOperator;
use crate::pauli::{PauliOp, PauliString};

/// Largest register the simulator will allocate.
pub const MAX_QUBITS: u32 = 26;

type Matrix2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// A pure state on `n_qubits` qubits.
#[derive(Debug, Clone, PartialEq)]
pub struct Statevector {
    amplitudes: Vec<Complex64>,
    n_qubits: u32,
}

impl Statevector {
    /// |0…0⟩ on `n_qubits` qubits.
    pub fn new(n_qubits: u32) -> SimResult<Self> {
        Self::basis_state(n_qubits, 0)
    }

    /// The computational basis state `|index⟩`.
    pub fn basis_state(n_qubits: u32, index: usize) -> SimResult<Self> {
        if n_qubits > MAX_QUBITS {
            return Err(SimError::TooManyQubits(n_qubits));
        }
        let size = 1usize << n_qubits;
        if index >= size {
            return Err(SimError::InvalidAmplitudes(index));
        }
        let mut amplitudes = vec![ZERO; size];
        amplitudes[index] = ONE;
        Ok(Self {
            amplitudes,
            n_qubits,
        })
    }

    /// Wrap an existing amplitude vector (length must be a power of two).
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> SimResult<Self> {
        let len = amplitudes.len();
        if len == 0 || !len.is_power_of_two() {
            return Err(SimError::InvalidAmplitudes(len));
        }
        let n_qubits = len.trailing_zeros();
        if n_qubits > MAX_QUBITS {
            return Err(SimError::TooManyQubits(n_qubits));
        }
        Ok(Self {
            amplitudes,
            n_qubits,
        })
    }

    /// Number of qubits.
    pub fn n_qubits(&self) -> u32 {
        self.n_qubits
    }

    /// Raw amplitudes.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// ⟨ψ|ψ⟩.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum()
    }

    /// Run every gate of `circuit` on this state. Measurements are ignored.
    pub fn apply_circuit(&mut self, circuit: &Circuit) -> SimResult<()> {
        if circuit.width() > self.n_qubits {
            return Err(SimError::WidthMismatch {
                circuit: circuit.width(),
                state: self.n_qubits,
            });
        }
        tracing::trace!(gates = circuit.size(), n_qubits = self.n_qubits, "applying circuit");
        for gate in circuit.gates() {
            self.apply_gate(gate)?;
        }
        Ok(())
    }

    /// Apply one gate.
    pub fn apply_gate(&mut self, gate: &Gate) -> SimResult<()> {
        gate.validate()?;
        for q in gate.qubits() {
            self.check_qubit(q.0)?;
        }
        let ctrl_mask = gate
            .control
            .iter()
            .fold(0usize, |mask, q| mask | (1usize << q.0));
        let t0 = gate.target[0].index();
        let theta = gate.parameter.unwrap_or(0.0);

        match gate.name {
            GateName::Measure => {}
            GateName::H => {
                let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
                self.apply_1q(ctrl_mask, t0, [[h, h], [h, -h]]);
            }
            GateName::X | GateName::Cnot => self.apply_1q(ctrl_mask, t0, [[ZERO, ONE], [ONE, ZERO]]),
            GateName::Y | GateName::Cy => self.apply_1q(ctrl_mask, t0, [[ZERO, -I], [I, ZERO]]),
            GateName::Z | GateName::Cz => self.apply_phase(ctrl_mask, t0, -ONE),
            GateName::S => self.apply_phase(ctrl_mask, t0, I),
            GateName::T => self.apply_phase(ctrl_mask, t0, Complex64::from_polar(1.0, FRAC_PI_4)),
            GateName::Phase | GateName::CPhase => {
                self.apply_phase(ctrl_mask, t0, Complex64::from_polar(1.0, theta));
            }
            GateName::Rx => {
                let c = Complex64::new((theta / 2.0).cos(), 0.0);
                let s = Complex64::new(0.0, -(theta / 2.0).sin());
                self.apply_1q(ctrl_mask, t0, [[c, s], [s, c]]);
            }
            GateName::Ry => {
                let c = Complex64::new((theta / 2.0).cos(), 0.0);
                let s = Complex64::new((theta / 2.0).sin(), 0.0);
                self.apply_1q(ctrl_mask, t0, [[c, -s], [s, c]]);
            }
            GateName::Rz | GateName::Crz => {
                let lo = Complex64::from_polar(1.0, -theta / 2.0);
                let hi = Complex64::from_polar(1.0, theta / 2.0);
                self.apply_1q(ctrl_mask, t0, [[lo, ZERO], [ZERO, hi]]);
            }
            GateName::Swap | GateName::CSwap => {
                self.apply_swap(ctrl_mask, t0, gate.target[1].index());
            }
        }
        Ok(())
    }

    fn check_qubit(&self, qubit: u32) -> SimResult<()> {
        if qubit >= self.n_qubits {
            return Err(SimError::QubitOutOfRange {
                qubit,
                n_qubits: self.n_qubits,
            });
        }
        Ok(())
    }

    /// Apply a 2×2 unitary to `target` on every index whose control bits are set.
    fn apply_1q(&mut self, ctrl_mask: usize, target: usize, m: Matrix2) {
        let tgt_mask = 1usize << target;
        for i in 0..self.amplitudes.len() {
            if i & tgt_mask == 0 && i & ctrl_mask == ctrl_mask {
                let j = i | tgt_mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = m[0][0] * a + m[0][1] * b;
                self.amplitudes[j] = m[1][0] * a + m[1][1] * b;
            }
        }
    }

    /// Multiply amplitudes with `target` set (and controls set) by `phase`.
    fn apply_phase(&mut self, ctrl_mask: usize, target: usize, phase: Complex64) {
        let mask = ctrl_mask | (1usize << target);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask == mask {
                *amp *= phase;
            }
        }
    }

    fn apply_swap(&mut self, ctrl_mask: usize, q1: usize, q2: usize) {
        let mask1 = 1usize << q1;
        let mask2 = 1usize << q2;
        for i in 0..self.amplitudes.len() {
            if i & ctrl_mask == ctrl_mask && i & mask1 != 0 && i & mask2 == 0 {
                let j = (i & !mask1) | mask2;
                self.amplitudes.swap(i, j);
            }
        }
    }

    /// ⟨ψ|P|ψ⟩ for a Pauli string.
    ///
    /// P|i⟩ = i^{n_Y} · (-1)^{|i ∧ z|} · |i ⊕ x⟩ in the symplectic masks.
    pub fn expectation(&self, pauli: &PauliString) -> SimResult<Complex64> {
        if let Some(q) = pauli.max_qubit() {
            self.check_qubit(q)?;
        }
        let (x, z) = pauli.masks();
        let (x, z) = (x as usize, z as usize);
        let n_y = pauli.ops().iter().filter(|(_, op)| *op == PauliOp::Y).count();
        let y_phase = I.powu(n_y as u32);

        let mut acc = ZERO;
        for (i, amp) in self.amplitudes.iter().enumerate() {
            let sign = if (i & z).count_ones() % 2 == 0 { 1.0 } else { -1.0 };
            acc += self.amplitudes[i ^ x].conj() * amp * sign;
        }
        Ok(acc * y_phase)
    }

    /// ⟨ψ|O|ψ⟩ for a qubit operator.
    pub fn expectation_operator(&self, operator: &QubitOperator) -> SimResult<Complex64> {
        operator
            .terms()
            .try_fold(ZERO, |acc, (p, c)| Ok(acc + c * self.expectation(p)?))
    }

    /// Born-rule probabilities per basis index.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    /// Bitstring of a basis index, qubit 0 first.
    pub fn bitstring(&self, index: usize) -> String {
        (0..self.n_qubits)
            .map(|q| if index >> q & 1 == 1 { '1' } else { '0' })
            .collect()
    }

    /// Exact outcome distribution keyed by bitstring, omitting zero entries.
    pub fn distribution(&self, cutoff: f64) -> BTreeMap<String, f64> {
        self.probabilities()
            .into_iter()
            .enumerate()
            .filter(|(_, p)| *p > cutoff)
            .map(|(i, p)| (self.bitstring(i), p))
            .collect()
    }

    /// Draw `n_shots` measurement outcomes of every qubit.
    pub fn sample_counts<R: Rng + ?Sized>(
        &self,
        n_shots: u64,
        rng: &mut R,
    ) -> SimResult<BTreeMap<String, u64>> {
        if n_shots == 0 {
            return Err(SimError::Sampling("zero shots requested".into()));
        }
        let dist = WeightedIndex::new(self.probabilities())
            .map_err(|e| SimError::Sampling(e.to_string()))?;
        let mut counts = BTreeMap::new();
        for _ in 0..n_shots {
            *counts.entry(self.bitstring(dist.sample(rng))).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qembed_ir::QubitId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    fn run(circuit: &Circuit, n: u32) -> Statevector {
        let mut sv = Statevector::new(n).unwrap();
        sv.apply_circuit(circuit).unwrap();
        sv
    }

    #[test]
    fn test_bell_state() {
        let mut c = Circuit::new();
        c.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();
        let sv = run(&c, 2);
        let r = Complex64::new(FRAC_1_SQRT_2, 0.0);
        assert!(approx_eq(sv.amplitudes()[0], r));
        assert!(approx_eq(sv.amplitudes()[3], r));
        let zz = PauliString::zz([0, 1]);
        assert!(approx_eq(sv.expectation(&zz).unwrap(), ONE));
        let xx: PauliString = "X0 X1".parse().unwrap();
        assert!(approx_eq(sv.expectation(&xx).unwrap(), ONE));
        let yy: PauliString = "Y0 Y1".parse().unwrap();
        assert!(approx_eq(sv.expectation(&yy).unwrap(), -ONE));
    }

    #[test]
    fn test_little_endian_bitstrings() {
        let mut c = Circuit::new();
        c.x(QubitId(0)).unwrap();
        let sv = run(&c, 3);
        assert_eq!(sv.distribution(1e-12).keys().collect::<Vec<_>>(), vec!["100"]);
        let z0: PauliString = "Z0".parse().unwrap();
        assert!(approx_eq(sv.expectation(&z0).unwrap(), -ONE));
    }

    #[test]
    fn test_rotations_match_closed_form() {
        let theta = 0.7;
        let mut c = Circuit::new();
        c.ry(theta, QubitId(0)).unwrap();
        let sv = run(&c, 1);
        let z0: PauliString = "Z0".parse().unwrap();
        let x0: PauliString = "X0".parse().unwrap();
        assert!((sv.expectation(&z0).unwrap().re - theta.cos()).abs() < 1e-12);
        assert!((sv.expectation(&x0).unwrap().re - theta.sin()).abs() < 1e-12);

        let mut c = Circuit::new();
        c.rx(theta, QubitId(0)).unwrap();
        let sv = run(&c, 1);
        let y0: PauliString = "Y0".parse().unwrap();
        assert!((sv.expectation(&y0).unwrap().re + theta.sin()).abs() < 1e-12);
    }

    #[test]
    fn test_controlled_gates_respect_control() {
        let mut c = Circuit::with_width(3);
        c.x(QubitId(2)).unwrap();
        c.cswap(QubitId(2), QubitId(0), QubitId(1)).unwrap();
        c.x(QubitId(0)).unwrap();
        c.cswap(QubitId(2), QubitId(0), QubitId(1)).unwrap();
        let sv = run(&c, 3);
        assert_eq!(sv.distribution(1e-12).keys().collect::<Vec<_>>(), vec!["011"]);

        let mut c = Circuit::new();
        c.crz(1.0, QubitId(0), QubitId(1)).unwrap();
        let sv = run(&c, 2);
        assert!(approx_eq(sv.amplitudes()[0], ONE));
    }

    #[test]
    fn test_width_mismatch() {
        let mut c = Circuit::new();
        c.h(QubitId(3)).unwrap();
        let mut sv = Statevector::new(2).unwrap();
        assert!(matches!(
            sv.apply_circuit(&c),
            Err(SimError::WidthMismatch { circuit: 4, state: 2 })
        ));
    }

    #[test]
    fn test_sampling_is_seeded() {
        let mut c = Circuit::new();
        c.h(QubitId(0)).unwrap();
        let sv = run(&c, 1);
        let a = sv.sample_counts(1000, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = sv.sample_counts(1000, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.values().sum::<u64>(), 1000);
        assert!(a["0"] > 400 && a["1"] > 400);
    }

    #[test]
    fn test_zero_shots_rejected() {
        let sv = Statevector::new(1).unwrap();
        assert!(sv.sample_counts(0, &mut StdRng::seed_from_u64(0)).is_err());
    }
}
