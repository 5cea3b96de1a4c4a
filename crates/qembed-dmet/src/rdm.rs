//! Reduced density matrices from Pauli-term measurements, and purification.

use ndarray::{Array2, Array4};
use std::collections::{BTreeMap, BTreeSet};

use qembed_chem::FermionMapper;
use qembed_chem::linalg::{matrix_function, transform_one, transform_two};
use qembed_sim::measurement::expectation_from_frequencies;
use qembed_sim::{Frequencies, PauliString};

use crate::error::{DmetError, DmetResult};

/// Coefficients with smaller real part are not measured.
const TERM_CUTOFF: f64 = 1e-12;

type Expansion = Vec<(PauliString, f64)>;

/// Rebuilds spin-summed RDMs from per-term outcome frequencies.
///
/// `E_pq` and `e_pqrs` are expanded in Pauli strings once. For a real
/// wavefunction only the real parts of the coefficients contribute, so the
/// imaginary ones are dropped up front.
#[derive(Debug, Clone)]
pub struct RdmEstimator {
    n_orbitals: usize,
    one_body: Vec<Expansion>,
    two_body: Vec<Expansion>,
    /// Embedding × MO coefficients of the basis the operators were built in.
    mo_coeff: Array2<f64>,
}

fn expansion(op: &qembed_sim::QubitOperator) -> Expansion {
    op.terms()
        .filter(|(_, c)| c.re.abs() > TERM_CUTOFF)
        .map(|(p, c)| (p.clone(), c.re))
        .collect()
}

impl RdmEstimator {
    /// Expand every RDM element of an `n_orbitals` problem with `mapper`.
    pub fn new(mapper: &FermionMapper, n_orbitals: usize, mo_coeff: Array2<f64>) -> DmetResult<Self> {
        let n = n_orbitals;
        let mut one_body = Vec::with_capacity(n * n);
        for p in 0..n {
            for q in 0..n {
                one_body.push(expansion(&mapper.one_body(p, q)?));
            }
        }
        let mut two_body = Vec::with_capacity(n * n * n * n);
        for p in 0..n {
            for q in 0..n {
                for r in 0..n {
                    for s in 0..n {
                        two_body.push(expansion(&mapper.two_body(p, q, r, s)?));
                    }
                }
            }
        }
        Ok(Self {
            n_orbitals,
            one_body,
            two_body,
            mo_coeff,
        })
    }

    /// Number of orbitals.
    pub fn n_orbitals(&self) -> usize {
        self.n_orbitals
    }

    /// Non-identity Pauli strings that must be measured.
    pub fn measured_terms(&self) -> BTreeSet<PauliString> {
        self.one_body
            .iter()
            .chain(&self.two_body)
            .flatten()
            .map(|(p, _)| p)
            .filter(|p| !p.is_identity())
            .cloned()
            .collect()
    }

    /// RDMs in the MO basis the operators were expanded in.
    pub fn mo_rdms(
        &self,
        frequencies: &BTreeMap<PauliString, Frequencies>,
    ) -> DmetResult<(Array2<f64>, Array4<f64>)> {
        let value = |terms: &Expansion| -> DmetResult<f64> {
            let mut total = 0.0;
            for (pauli, coeff) in terms {
                let expectation = if pauli.is_identity() {
                    1.0
                } else {
                    let freq = frequencies.get(pauli).ok_or_else(|| {
                        DmetError::MeasurementRecord(format!("no outcomes recorded for term {pauli}"))
                    })?;
                    expectation_from_frequencies(freq, pauli)
                };
                total += coeff * expectation;
            }
            Ok(total)
        };

        let n = self.n_orbitals;
        let mut one = Array2::zeros((n, n));
        for (k, terms) in self.one_body.iter().enumerate() {
            one[[k / n, k % n]] = value(terms)?;
        }
        let mut two = Array4::zeros((n, n, n, n));
        for (k, terms) in self.two_body.iter().enumerate() {
            two[[k / (n * n * n), (k / (n * n)) % n, (k / n) % n, k % n]] = value(terms)?;
        }
        Ok((one, two))
    }

    /// RDMs transformed back to the embedding basis.
    pub fn embedding_rdms(
        &self,
        frequencies: &BTreeMap<PauliString, Frequencies>,
    ) -> DmetResult<(Array2<f64>, Array4<f64>)> {
        let (one, two) = self.mo_rdms(frequencies)?;
        let ct = self.mo_coeff.t();
        Ok((transform_one(one.view(), ct), transform_two(&two, ct)))
    }
}

/// Nearest 1-RDM with occupations in [0, 2] and trace `n_electrons`.
pub fn purify_one_rdm(one_rdm: &Array2<f64>, n_electrons: usize) -> DmetResult<Array2<f64>> {
    let sym = (one_rdm + &one_rdm.t()) * 0.5;
    let clipped = matrix_function(sym.view(), |x| x.clamp(0.0, 2.0))?;
    Ok(rescale_trace(clipped, n_electrons as f64))
}

/// Nearest 2-RDM whose pair matrix `M[(p,r),(q,s)] = Γ_pqrs` is positive
/// semidefinite with trace `N(N−1)`.
pub fn purify_two_rdm(two_rdm: &Array4<f64>, n_electrons: usize) -> DmetResult<Array4<f64>> {
    let n = two_rdm.shape()[0];
    let pair = Array2::from_shape_fn((n * n, n * n), |(pr, qs)| {
        let (p, r, q, s) = (pr / n, pr % n, qs / n, qs % n);
        0.5 * (two_rdm[[p, q, r, s]] + two_rdm[[q, p, s, r]])
    });
    let clipped = matrix_function(pair.view(), |x| x.max(0.0))?;
    let ne = n_electrons as f64;
    let pair = rescale_trace(clipped, ne * (ne - 1.0));
    Ok(Array4::from_shape_fn((n, n, n, n), |(p, q, r, s)| {
        pair[[p * n + r, q * n + s]]
    }))
}

fn rescale_trace(m: Array2<f64>, target: f64) -> Array2<f64> {
    let trace = m.diag().sum();
    if trace.abs() < f64::EPSILON {
        return m;
    }
    m * (target / trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qembed_chem::QubitMapping;
    use qembed_sim::Statevector;
    use qembed_sim::measurement::term_frequencies;

    fn hf_frequencies(
        mapper: &FermionMapper,
        estimator: &RdmEstimator,
    ) -> BTreeMap<PauliString, Frequencies> {
        let mut state = Statevector::new(mapper.n_qubits() as u32).unwrap();
        state.apply_circuit(&mapper.hf_circuit().unwrap()).unwrap();
        estimator
            .measured_terms()
            .into_iter()
            .map(|p| {
                let f = term_frequencies(&state, &p).unwrap();
                (p, f)
            })
            .collect()
    }

    #[test]
    fn test_hartree_fock_rdms() {
        for (mapping, up_then_down) in [(QubitMapping::Jw, false), (QubitMapping::Scbk, true)] {
            let mapper = FermionMapper::new(mapping, 2, 2, up_then_down).unwrap();
            let estimator = RdmEstimator::new(&mapper, 2, Array2::eye(2)).unwrap();
            let freq = hf_frequencies(&mapper, &estimator);
            let (one, two) = estimator.mo_rdms(&freq).unwrap();
            assert!((one[[0, 0]] - 2.0).abs() < 1e-10, "{mapping}");
            assert!(one[[1, 1]].abs() < 1e-10);
            assert!(one[[0, 1]].abs() < 1e-10);
            assert!((two[[0, 0, 0, 0]] - 2.0).abs() < 1e-10);
            assert!(two[[1, 1, 1, 1]].abs() < 1e-10);
        }
    }

    #[test]
    fn test_missing_term() {
        let mapper = FermionMapper::new(QubitMapping::Jw, 2, 2, false).unwrap();
        let estimator = RdmEstimator::new(&mapper, 2, Array2::eye(2)).unwrap();
        let mut freq = hf_frequencies(&mapper, &estimator);
        let first = freq.keys().next().cloned().unwrap();
        freq.remove(&first);
        let err = estimator.mo_rdms(&freq).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MeasurementRecord);
    }

    #[test]
    fn test_purify_one_rdm() {
        let gamma = ndarray::array![[2.1, 0.0], [0.0, -0.05]];
        let pure = purify_one_rdm(&gamma, 2).unwrap();
        assert!((pure.diag().sum() - 2.0).abs() < 1e-12);
        assert!(pure[[1, 1]].abs() < 1e-12);
        // physical input is a fixed point
        let ok = ndarray::array![[1.5, 0.2], [0.2, 0.5]];
        let same = purify_one_rdm(&ok, 2).unwrap();
        assert!((&same - &ok).iter().all(|d| d.abs() < 1e-10));
    }

    #[test]
    fn test_purify_two_rdm_fixed_point() {
        // closed-shell determinant in orbital 0
        let mut two = Array4::zeros((2, 2, 2, 2));
        two[[0, 0, 0, 0]] = 2.0;
        let pure = purify_two_rdm(&two, 2).unwrap();
        assert!((&pure - &two).iter().all(|d| d.abs() < 1e-10));

        let mut noisy = two.clone();
        noisy[[1, 1, 1, 1]] = -0.1;
        let pure = purify_two_rdm(&noisy, 2).unwrap();
        assert!(pure[[1, 1, 1, 1]].abs() < 1e-10);
        let trace: f64 = (0..2).flat_map(|p| (0..2).map(move |r| (p, r))).map(|(p, r)| pure[[p, p, r, r]]).sum();
        assert!((trace - 2.0).abs() < 1e-10);
    }
}
