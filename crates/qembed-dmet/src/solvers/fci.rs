//! Exact diagonalization in the embedding space.

use qembed_chem::solve_fci;

use super::{FragmentResult, FragmentSolver};
use crate::config::SolverOptions;
use crate::embedding::EmbeddedProblem;
use crate::error::DmetResult;

/// Full configuration interaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct FciSolver;

impl FragmentSolver for FciSolver {
    fn name(&self) -> &str {
        "fci"
    }

    fn solve(&self, problem: &EmbeddedProblem, _options: &SolverOptions) -> DmetResult<FragmentResult> {
        let fci = solve_fci(&problem.hamiltonian, problem.n_electrons)?;
        let (one_rdm, two_rdm) = problem.to_embedding_basis(&fci.one_rdm, &fci.two_rdm);
        tracing::debug!(fragment = problem.fragment, energy = fci.energy, "fci");
        Ok(FragmentResult {
            energy: fci.energy,
            one_rdm,
            two_rdm,
            measurements: None,
        })
    }
}
