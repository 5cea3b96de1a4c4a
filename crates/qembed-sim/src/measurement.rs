//! Measurement in the eigenbasis of a Pauli string.
//!
//! A term is measured by rotating each factor onto Z (`H` for X, `Rx(π/2)`
//! for Y) and reading every qubit out. Outcome frequencies are keyed by
//! bitstring with qubit 0 first and sum to one.

use rand::Rng;
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use std::collections::BTreeMap;
use std::f64::consts::FRAC_PI_2;

use qembed_ir::{Circuit, QubitId};

use crate::error::{SimError, SimResult};
use crate::pauli::{PauliOp, PauliString};
use crate::statevector::Statevector;

/// Outcome bitstring → relative frequency.
pub type Frequencies = BTreeMap<String, f64>;

/// Probabilities below this are left out of exact distributions.
const PROBABILITY_CUTOFF: f64 = 1e-14;

/// Rotations that map the eigenbasis of `pauli` onto the computational basis.
pub fn measurement_basis_circuit(pauli: &PauliString, width: u32) -> SimResult<Circuit> {
    let mut circuit = Circuit::with_width(width);
    for &(q, op) in pauli.ops() {
        match op {
            PauliOp::X => {
                circuit.h(QubitId(q))?;
            }
            PauliOp::Y => {
                circuit.rx(FRAC_PI_2, QubitId(q))?;
            }
            PauliOp::Z | PauliOp::I => {}
        }
    }
    Ok(circuit)
}

fn rotated(state: &Statevector, pauli: &PauliString) -> SimResult<Statevector> {
    let mut rotated = state.clone();
    rotated.apply_circuit(&measurement_basis_circuit(pauli, state.n_qubits())?)?;
    Ok(rotated)
}

/// Exact outcome distribution for measuring `pauli` on `state`.
pub fn term_frequencies(state: &Statevector, pauli: &PauliString) -> SimResult<Frequencies> {
    Ok(rotated(state, pauli)?.distribution(PROBABILITY_CUTOFF))
}

/// Outcome frequencies estimated from `n_shots` samples.
pub fn sampled_term_frequencies<R: Rng + ?Sized>(
    state: &Statevector,
    pauli: &PauliString,
    n_shots: u64,
    rng: &mut R,
) -> SimResult<Frequencies> {
    let counts = rotated(state, pauli)?.sample_counts(n_shots, rng)?;
    Ok(counts
        .into_iter()
        .map(|(bits, n)| (bits, n as f64 / n_shots as f64))
        .collect())
}

/// ⟨P⟩ from outcome frequencies: Σ f(b) · (-1)^{parity of b on P's qubits}.
pub fn expectation_from_frequencies(frequencies: &Frequencies, pauli: &PauliString) -> f64 {
    let qubits: Vec<usize> = pauli.ops().iter().map(|(q, _)| *q as usize).collect();
    frequencies
        .iter()
        .map(|(bits, f)| {
            let bytes = bits.as_bytes();
            let ones = qubits
                .iter()
                .filter(|&&q| bytes.get(q) == Some(&b'1'))
                .count();
            if ones % 2 == 0 { *f } else { -*f }
        })
        .sum()
}

/// Draw `n_shots` outcomes from `frequencies` and return the new frequencies.
pub fn resample_frequencies<R: Rng + ?Sized>(
    frequencies: &Frequencies,
    n_shots: u64,
    rng: &mut R,
) -> SimResult<Frequencies> {
    if n_shots == 0 {
        return Err(SimError::Sampling("zero shots requested".into()));
    }
    let outcomes: Vec<&String> = frequencies.keys().collect();
    let dist = WeightedIndex::new(frequencies.values().copied())
        .map_err(|e| SimError::Sampling(e.to_string()))?;
    let mut counts = vec![0u64; outcomes.len()];
    for _ in 0..n_shots {
        counts[dist.sample(rng)] += 1;
    }
    Ok(outcomes
        .into_iter()
        .zip(counts)
        .filter(|(_, n)| *n > 0)
        .map(|(bits, n)| (bits.clone(), n as f64 / n_shots as f64))
        .collect())
}
