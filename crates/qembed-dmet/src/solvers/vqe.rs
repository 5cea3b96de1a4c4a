//! Variational quantum eigensolver on a simulated statevector.
//!
//! The embedded Hamiltonian is mapped to qubits, a UCCSD ansatz is optimized
//! against its exact expectation value, and the RDMs are then read out by
//! measuring every Pauli term they need. Those outcome frequencies are the
//! fragment's measurement record.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use qembed_chem::FermionMapper;
use qembed_sim::measurement::{sampled_term_frequencies, term_frequencies};
use qembed_sim::{Frequencies, PauliString, QubitOperator};

use super::optimizer::{NelderMead, Optimizer};
use super::uccsd::UccsdAnsatz;
use super::{FragmentResult, FragmentSolver, RdmMeasurements};
use crate::config::SolverOptions;
use crate::embedding::EmbeddedProblem;
use crate::error::{DmetError, DmetResult};
use crate::estimator::ResourceReport;
use crate::rdm::RdmEstimator;

/// UCCSD-VQE.
#[derive(Debug, Clone, Copy, Default)]
pub struct VqeSolver;

impl VqeSolver {
    fn mapper(problem: &EmbeddedProblem, options: &SolverOptions) -> DmetResult<FermionMapper> {
        Ok(FermionMapper::new(
            options.qubit_mapping,
            problem.n_orbitals(),
            problem.n_electrons,
            options.up_then_down,
        )?)
    }

    /// Ansatz and qubit Hamiltonian for `problem`.
    pub fn build(
        problem: &EmbeddedProblem,
        options: &SolverOptions,
    ) -> DmetResult<(FermionMapper, UccsdAnsatz, QubitOperator)> {
        let mapper = Self::mapper(problem, options)?;
        let ham = &problem.hamiltonian;
        let qubit_hamiltonian = mapper.hamiltonian(&ham.one_body, &ham.two_body, ham.constant)?;
        let ansatz = UccsdAnsatz::new(&mapper, problem.n_orbitals(), problem.n_electrons / 2)?;
        Ok((mapper, ansatz, qubit_hamiltonian))
    }

    fn initial_parameters(ansatz: &UccsdAnsatz, options: &SolverOptions) -> DmetResult<Vec<f64>> {
        match &options.initial_parameters {
            None => Ok(vec![0.0; ansatz.n_parameters()]),
            Some(p) if p.len() == ansatz.n_parameters() => Ok(p.clone()),
            Some(p) => Err(DmetError::Configuration(format!(
                "initial_parameters has {} entries, the ansatz takes {}",
                p.len(),
                ansatz.n_parameters()
            ))),
        }
    }
}

impl FragmentSolver for VqeSolver {
    fn name(&self) -> &str {
        "vqe"
    }

    fn validate_options(&self, options: &SolverOptions) -> DmetResult<()> {
        if options.qubit_mapping == qembed_chem::QubitMapping::Scbk && !options.up_then_down {
            return Err(DmetError::Configuration(
                "qubit_mapping scbk requires up_then_down: true".into(),
            ));
        }
        if options.n_shots == Some(0) {
            return Err(DmetError::Configuration("n_shots must be positive".into()));
        }
        Ok(())
    }

    fn solve(&self, problem: &EmbeddedProblem, options: &SolverOptions) -> DmetResult<FragmentResult> {
        let (mapper, ansatz, hamiltonian) = Self::build(problem, options)?;
        let x0 = Self::initial_parameters(&ansatz, options)?;

        let mut failure: Option<DmetError> = None;
        let objective = |params: &[f64]| {
            let energy = ansatz
                .prepare(params)
                .and_then(|state| Ok(state.expectation_operator(&hamiltonian)?.re));
            match energy {
                Ok(e) => e,
                Err(e) => {
                    failure.get_or_insert(e);
                    f64::INFINITY
                }
            }
        };
        let mut optimizer = NelderMead::new();
        if let Some(maxiter) = options.max_iterations {
            optimizer = optimizer.with_maxiter(maxiter);
        }
        if let Some(tol) = options.tolerance {
            optimizer = optimizer.with_tol(tol);
        }
        let result = optimizer.minimize(objective, x0);
        if let Some(e) = failure {
            return Err(e);
        }
        if !result.converged {
            tracing::warn!(
                fragment = problem.fragment,
                iterations = result.num_iterations,
                energy = result.optimal_value,
                "vqe optimizer stopped at the iteration limit"
            );
            return Err(DmetError::solver(
                self.name(),
                problem.fragment,
                format!(
                    "optimizer did not converge in {} iterations (last energy {:.10})",
                    result.num_iterations, result.optimal_value
                ),
            ));
        }

        let state = ansatz.prepare(&result.optimal_params)?;
        let estimator =
            RdmEstimator::new(&mapper, problem.n_orbitals(), problem.mean_field.mo_coeff.clone())?;
        let terms = estimator.measured_terms();
        let mut frequencies: BTreeMap<PauliString, Frequencies> = BTreeMap::new();
        match options.n_shots {
            Some(n_shots) => {
                let seed = options.seed.unwrap_or(0) ^ problem.fragment as u64;
                let mut rng = StdRng::seed_from_u64(seed);
                for term in terms {
                    let f = sampled_term_frequencies(&state, &term, n_shots, &mut rng)?;
                    frequencies.insert(term, f);
                }
            }
            None => {
                for term in terms {
                    let f = term_frequencies(&state, &term)?;
                    frequencies.insert(term, f);
                }
            }
        }
        let (one_rdm, two_rdm) = estimator.embedding_rdms(&frequencies)?;

        tracing::debug!(
            fragment = problem.fragment,
            energy = result.optimal_value,
            n_parameters = ansatz.n_parameters(),
            evaluations = result.num_evaluations,
            n_measured_terms = frequencies.len(),
            mapping = %options.qubit_mapping,
            "vqe"
        );
        Ok(FragmentResult {
            energy: result.optimal_value,
            one_rdm,
            two_rdm,
            measurements: Some(RdmMeasurements {
                frequencies,
                estimator,
            }),
        })
    }

    fn resources(
        &self,
        problem: &EmbeddedProblem,
        options: &SolverOptions,
    ) -> DmetResult<Option<ResourceReport>> {
        let (_, ansatz, hamiltonian) = Self::build(problem, options)?;
        let circuit = ansatz.circuit(&Self::initial_parameters(&ansatz, options)?)?;
        Ok(Some(ResourceReport {
            qubit_hamiltonian_terms: hamiltonian.n_terms(),
            circuit_width: circuit.width() as usize,
            circuit_gates: circuit.size(),
            circuit_2qubit_gates: circuit.two_qubit_gate_count(),
            circuit_var_gates: circuit.variational_gate_count(),
            vqe_variational_parameters: ansatz.n_parameters(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{EmbeddingSpace, LocalizedMeanField};
    use crate::partition::Fragment;
    use qembed_chem::{BasisSetName, Molecule, QubitMapping, solve_fci};

    fn h2_problem() -> EmbeddedProblem {
        let mol = Molecule::from_symbols(
            [("H", [0.0, 0.0, 0.0]), ("H", [0.0, 0.0, 0.7414])],
            BasisSetName::Sto3g,
        )
        .unwrap();
        let mf = LocalizedMeanField::compute(&mol, Default::default()).unwrap();
        let fragment = Fragment {
            index: 0,
            atoms: 0..2,
            orbitals: vec![0, 1],
        };
        EmbeddingSpace::build(&fragment, &mf).unwrap().problem(0.0).unwrap()
    }

    fn options(mapping: QubitMapping, up_then_down: bool) -> SolverOptions {
        SolverOptions {
            qubit_mapping: mapping,
            up_then_down,
            ..Default::default()
        }
    }

    #[test]
    fn test_vqe_matches_fci() {
        let problem = h2_problem();
        let exact = solve_fci(&problem.hamiltonian, 2).unwrap().energy;
        for (mapping, utd) in [(QubitMapping::Jw, false), (QubitMapping::Scbk, true)] {
            let result = VqeSolver.solve(&problem, &options(mapping, utd)).unwrap();
            assert!((result.energy - exact).abs() < 1e-6, "{mapping}: {} vs {exact}", result.energy);
            let trace = result.one_rdm.diag().sum();
            assert!((trace - 2.0).abs() < 1e-8);
            let m = result.measurements.unwrap();
            assert_eq!(m.frequencies.len(), m.estimator.measured_terms().len());
        }
    }

    #[test]
    fn test_sampled_measurements_are_seeded() {
        let problem = h2_problem();
        let opts = SolverOptions {
            n_shots: Some(2000),
            seed: Some(7),
            ..Default::default()
        };
        let a = VqeSolver.solve(&problem, &opts).unwrap();
        let b = VqeSolver.solve(&problem, &opts).unwrap();
        assert_eq!(
            a.measurements.unwrap().frequencies,
            b.measurements.unwrap().frequencies
        );
        assert_eq!(a.one_rdm, b.one_rdm);
    }

    #[test]
    fn test_resources_depend_on_mapping() {
        let problem = h2_problem();
        let jw = VqeSolver
            .resources(&problem, &options(QubitMapping::Jw, false))
            .unwrap()
            .unwrap();
        let scbk = VqeSolver
            .resources(&problem, &options(QubitMapping::Scbk, true))
            .unwrap()
            .unwrap();
        assert_eq!(jw.circuit_width, 4);
        assert_eq!(scbk.circuit_width, 2);
        assert_eq!(jw.qubit_hamiltonian_terms, 15);
        assert_eq!(scbk.qubit_hamiltonian_terms, 5);
        assert_eq!(jw.vqe_variational_parameters, 2);
        assert!(jw.circuit_var_gates > 0);
    }

    #[test]
    fn test_option_validation() {
        assert!(VqeSolver.validate_options(&options(QubitMapping::Scbk, false)).is_err());
        assert!(VqeSolver.validate_options(&options(QubitMapping::Scbk, true)).is_ok());
        let bad = SolverOptions {
            initial_parameters: Some(vec![0.0; 5]),
            ..Default::default()
        };
        let err = VqeSolver.solve(&h2_problem(), &bad).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_iteration_limit_is_a_solver_error() {
        let capped = SolverOptions {
            max_iterations: Some(1),
            ..Default::default()
        };
        let err = VqeSolver.solve(&h2_problem(), &capped).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Solver);
        assert!(matches!(err, DmetError::Solver { fragment: 0, .. }));
        assert!(err.to_string().contains("did not converge"));
    }
}
