//! Resource estimation and bootstrap error bars.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use qembed_sim::measurement::resample_frequencies;
use qembed_sim::{Frequencies, PauliString};

use crate::config::SolverOptions;
use crate::embedding::{EmbeddedProblem, EmbeddingSpace};
use crate::error::{DmetError, DmetResult};
use crate::rdm::{RdmEstimator, purify_one_rdm, purify_two_rdm};
use crate::solvers::FragmentSolver;

/// Quantum cost of one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReport {
    /// Pauli terms in the qubit Hamiltonian, identity included.
    pub qubit_hamiltonian_terms: usize,
    /// Qubits.
    pub circuit_width: usize,
    /// Total gates.
    pub circuit_gates: usize,
    /// Two-qubit gates.
    pub circuit_2qubit_gates: usize,
    /// Gates carrying a variational parameter.
    pub circuit_var_gates: usize,
    /// Independent variational parameters.
    pub vqe_variational_parameters: usize,
}

/// Resources `solver` needs for `problem`. `None` for classical solvers.
pub fn estimate_resources(
    solver: &dyn FragmentSolver,
    problem: &EmbeddedProblem,
    options: &SolverOptions,
) -> DmetResult<Option<ResourceReport>> {
    solver.resources(problem, options)
}

/// Raw measurement outcomes of every measurement-based fragment.
///
/// Keyed by fragment index, then Pauli term. Serializes to JSON so a record
/// can be stored and resampled later without re-running any solver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementRecord {
    fragments: BTreeMap<usize, BTreeMap<PauliString, Frequencies>>,
}

impl MeasurementRecord {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the outcomes of `fragment`.
    pub fn insert(&mut self, fragment: usize, frequencies: BTreeMap<PauliString, Frequencies>) {
        self.fragments.insert(fragment, frequencies);
    }

    /// Outcomes of `fragment`.
    pub fn fragment(&self, fragment: usize) -> Option<&BTreeMap<PauliString, Frequencies>> {
        self.fragments.get(&fragment)
    }

    /// Indices of recorded fragments.
    pub fn fragment_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.fragments.keys().copied()
    }

    /// No fragment recorded.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> DmetResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DmetError::MeasurementRecord(format!("cannot serialize record: {e}")))
    }

    /// Parse a record written by [`MeasurementRecord::to_json`].
    pub fn from_json(text: &str) -> DmetResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| DmetError::MeasurementRecord(format!("cannot parse record: {e}")))
    }
}

/// How one fragment enters a bootstrap trial.
#[derive(Debug, Clone, Copy)]
pub enum BootstrapFragment<'a> {
    /// Classical fragment: its energy is reused as is.
    Fixed {
        /// Fragment energy.
        energy: f64,
    },
    /// Measurement-based fragment: RDMs are rebuilt from resampled outcomes.
    Measured {
        /// RDM reconstruction.
        estimator: &'a RdmEstimator,
        /// Embedding integrals for the fragment energy.
        space: &'a EmbeddingSpace,
    },
}

/// Bootstrap resampling of the global energy.
#[derive(Debug, Clone)]
pub struct Bootstrap<'a> {
    fragments: Vec<BootstrapFragment<'a>>,
    nuclear_repulsion: f64,
}

impl<'a> Bootstrap<'a> {
    /// Fragments in order, plus the constant added to every trial.
    pub fn new(fragments: Vec<BootstrapFragment<'a>>, nuclear_repulsion: f64) -> Self {
        Self {
            fragments,
            nuclear_repulsion,
        }
    }

    /// Check that `record` holds exactly the measured fragments and all their terms.
    fn check(&self, record: &MeasurementRecord) -> DmetResult<()> {
        let measured: BTreeSet<usize> = self
            .fragments
            .iter()
            .enumerate()
            .filter(|(_, f)| matches!(f, BootstrapFragment::Measured { .. }))
            .map(|(i, _)| i)
            .collect();
        for index in record.fragment_indices() {
            if !measured.contains(&index) {
                return Err(DmetError::MeasurementRecord(format!(
                    "fragment {index} is not solved by a measurement-based solver"
                )));
            }
        }
        for (index, fragment) in self.fragments.iter().enumerate() {
            let BootstrapFragment::Measured { estimator, .. } = fragment else {
                continue;
            };
            let outcomes = record.fragment(index).ok_or_else(|| {
                DmetError::MeasurementRecord(format!("no outcomes recorded for fragment {index}"))
            })?;
            for term in estimator.measured_terms() {
                match outcomes.get(&term) {
                    Some(f) if !f.is_empty() => {}
                    _ => {
                        return Err(DmetError::MeasurementRecord(format!(
                            "fragment {index}: no outcomes recorded for term {term}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn trial(
        &self,
        record: &MeasurementRecord,
        n_shots: u64,
        purify: bool,
        rng: &mut StdRng,
    ) -> DmetResult<f64> {
        let mut energy = self.nuclear_repulsion;
        for (index, fragment) in self.fragments.iter().enumerate() {
            match fragment {
                BootstrapFragment::Fixed { energy: e } => energy += e,
                BootstrapFragment::Measured { estimator, space } => {
                    let outcomes = record.fragment(index).ok_or_else(|| {
                        DmetError::MeasurementRecord(format!("no outcomes recorded for fragment {index}"))
                    })?;
                    let mut resampled = BTreeMap::new();
                    for (term, freq) in outcomes {
                        resampled.insert(term.clone(), resample_frequencies(freq, n_shots, rng)?);
                    }
                    let (mut one, mut two) = estimator.embedding_rdms(&resampled)?;
                    if purify {
                        one = purify_one_rdm(&one, space.n_electrons)?;
                        two = purify_two_rdm(&two, space.n_electrons)?;
                    }
                    energy += space.fragment_energy(&one, &two);
                }
            }
        }
        Ok(energy)
    }

    /// `n_resamples` trial energies, each from `n_shots` draws per measured term.
    ///
    /// Trial seeds are drawn from `rng` up front, so the result depends only
    /// on the record and the state of `rng`.
    pub fn run(
        &self,
        record: &MeasurementRecord,
        n_shots: u64,
        n_resamples: usize,
        purify: bool,
        rng: &mut impl Rng,
    ) -> DmetResult<Vec<f64>> {
        if n_shots == 0 || n_resamples == 0 {
            return Err(DmetError::Configuration(
                "bootstrap needs at least one shot and one resample".into(),
            ));
        }
        self.check(record)?;
        let seeds: Vec<u64> = (0..n_resamples).map(|_| rng.next_u64()).collect();
        let trials = seeds
            .into_par_iter()
            .map(|seed| {
                let mut trial_rng = StdRng::seed_from_u64(seed);
                self.trial(record, n_shots, purify, &mut trial_rng)
            })
            .collect::<DmetResult<Vec<f64>>>()?;
        tracing::debug!(n_resamples, n_shots, purify, "bootstrap finished");
        Ok(trials)
    }
}

/// Mean and sample standard deviation (zero for fewer than two values).
pub fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}
