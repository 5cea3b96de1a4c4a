//! Coupled-cluster singles and doubles on the embedded problem.

use qembed_chem::{CcsdOptions, solve_ccsd};

use super::{FragmentResult, FragmentSolver};
use crate::config::SolverOptions;
use crate::embedding::EmbeddedProblem;
use crate::error::DmetResult;

/// Closed-shell CCSD. Honours `tolerance` and `max_iterations`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CcsdSolver;

impl FragmentSolver for CcsdSolver {
    fn name(&self) -> &str {
        "ccsd"
    }

    fn solve(&self, problem: &EmbeddedProblem, options: &SolverOptions) -> DmetResult<FragmentResult> {
        let defaults = CcsdOptions::default();
        let cc_options = CcsdOptions {
            tolerance: options.tolerance.unwrap_or(defaults.tolerance),
            max_iterations: options.max_iterations.unwrap_or(defaults.max_iterations),
        };
        let cc = solve_ccsd(&problem.hamiltonian, problem.n_electrons, cc_options)?;
        let (one_rdm, two_rdm) = problem.to_embedding_basis(&cc.one_rdm, &cc.two_rdm);
        tracing::debug!(
            fragment = problem.fragment,
            energy = cc.energy,
            correlation = cc.correlation_energy,
            iterations = cc.iterations,
            "ccsd"
        );
        Ok(FragmentResult {
            energy: cc.energy,
            one_rdm,
            two_rdm,
            measurements: None,
        })
    }
}
