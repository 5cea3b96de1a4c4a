//! Fragment solvers and the registry that dispatches to them.
//!
//! Every solver implements [`FragmentSolver`]. The driver only ever talks to
//! solvers through a [`SolverRegistry`], so new methods are added by
//! registering them, not by editing the driver.

mod ccsd;
mod fci;
pub mod optimizer;
pub mod uccsd;
mod vqe;

pub use ccsd::CcsdSolver;
pub use fci::FciSolver;
pub use vqe::VqeSolver;

use ndarray::{Array2, Array4};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::debug;

use qembed_sim::{Frequencies, PauliString};

use crate::config::SolverOptions;
use crate::embedding::EmbeddedProblem;
use crate::error::{DmetError, DmetResult, ErrorKind};
use crate::estimator::ResourceReport;
use crate::rdm::RdmEstimator;

/// Measured Pauli-term distributions and how to turn them into RDMs.
#[derive(Debug, Clone)]
pub struct RdmMeasurements {
    /// Outcome frequencies per measured term.
    pub frequencies: BTreeMap<PauliString, Frequencies>,
    /// RDM reconstruction for this fragment.
    pub estimator: RdmEstimator,
}

/// Output of a fragment solver. RDMs are in the embedding basis.
#[derive(Debug, Clone)]
pub struct FragmentResult {
    /// Electronic energy of the embedded Hamiltonian.
    pub energy: f64,
    /// Spin-summed 1-RDM.
    pub one_rdm: Array2<f64>,
    /// Spin-summed 2-RDM, `Γ_pqrs = ⟨Σ_στ a†_pσ a†_rτ a_sτ a_qσ⟩`.
    pub two_rdm: Array4<f64>,
    /// Present for measurement-based solvers.
    pub measurements: Option<RdmMeasurements>,
}

/// A method that solves one embedded fragment problem.
pub trait FragmentSolver: Send + Sync {
    /// Registry identifier.
    fn name(&self) -> &str;

    /// Reject options this solver cannot honour. Called at build time.
    fn validate_options(&self, _options: &SolverOptions) -> DmetResult<()> {
        Ok(())
    }

    /// Solve the embedded problem.
    fn solve(&self, problem: &EmbeddedProblem, options: &SolverOptions) -> DmetResult<FragmentResult>;

    /// Quantum resources needed to solve `problem`, if the solver uses any.
    fn resources(
        &self,
        _problem: &EmbeddedProblem,
        _options: &SolverOptions,
    ) -> DmetResult<Option<ResourceReport>> {
        Ok(None)
    }
}

/// Solvers keyed by lowercase identifier.
pub struct SolverRegistry {
    solvers: FxHashMap<String, Box<dyn FragmentSolver>>,
}

impl SolverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            solvers: FxHashMap::default(),
        }
    }

    /// Registry with `fci`, `ccsd` and `vqe`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(FciSolver);
        registry.register(CcsdSolver);
        registry.register(VqeSolver);
        registry
    }

    /// Register `solver` under its name, replacing any previous entry.
    pub fn register(&mut self, solver: impl FragmentSolver + 'static) {
        let name = solver.name().to_ascii_lowercase();
        debug!("Registering fragment solver: {}", name);
        self.solvers.insert(name, Box::new(solver));
    }

    /// Look up a solver.
    pub fn get(&self, solver_id: &str) -> DmetResult<&dyn FragmentSolver> {
        self.solvers
            .get(&solver_id.to_ascii_lowercase())
            .map(|s| s.as_ref())
            .ok_or_else(|| {
                DmetError::Configuration(format!(
                    "unknown solver '{}', available: {}",
                    solver_id,
                    self.available().join(", ")
                ))
            })
    }

    /// Solve `problem` with `solver_id`.
    ///
    /// Numerical failures are reported as [`DmetError::Solver`] with the
    /// solver and fragment attached; they are not retried.
    pub fn solve(
        &self,
        solver_id: &str,
        problem: &EmbeddedProblem,
        options: &SolverOptions,
    ) -> DmetResult<FragmentResult> {
        let solver = self.get(solver_id)?;
        solver.solve(problem, options).map_err(|e| match e.kind() {
            ErrorKind::Solver | ErrorKind::Numerical if !matches!(e, DmetError::Solver { .. }) => {
                DmetError::solver(solver.name(), problem.fragment, e)
            }
            _ => e,
        })
    }

    /// Sorted identifiers.
    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<_> = self.solvers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether `solver_id` is registered.
    pub fn contains(&self, solver_id: &str) -> bool {
        self.solvers.contains_key(&solver_id.to_ascii_lowercase())
    }
}

impl Default for SolverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for SolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverRegistry")
            .field("solvers", &self.available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl FragmentSolver for Failing {
        fn name(&self) -> &str {
            "Failing"
        }

        fn solve(&self, _: &EmbeddedProblem, _: &SolverOptions) -> DmetResult<FragmentResult> {
            Err(qembed_chem::ChemError::CcsdNotConverged {
                iterations: 1,
                residual: 1.0,
            }
            .into())
        }
    }

    #[test]
    fn test_defaults() {
        let registry = SolverRegistry::with_defaults();
        assert_eq!(registry.available(), vec!["ccsd", "fci", "vqe"]);
        assert!(registry.contains("CCSD"));
        assert_eq!(registry.get("VQE").unwrap().name(), "vqe");
    }

    #[test]
    fn test_unknown_solver() {
        let registry = SolverRegistry::with_defaults();
        let err = registry.get("dmrg").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("dmrg"));
    }

    #[test]
    fn test_register_custom() {
        let mut registry = SolverRegistry::new();
        registry.register(Failing);
        assert_eq!(registry.available(), vec!["failing"]);
        assert!(registry.get("failing").is_ok());
    }

    #[test]
    fn test_failures_carry_context() {
        use crate::embedding::{EmbeddingSpace, LocalizedMeanField};
        use crate::partition::Fragment;

        let mol = qembed_chem::Molecule::from_symbols(
            [("H", [0.0, 0.0, 0.0]), ("H", [0.0, 0.0, 0.74])],
            qembed_chem::BasisSetName::Sto3g,
        )
        .unwrap();
        let mf = LocalizedMeanField::compute(&mol, Default::default()).unwrap();
        let fragment = Fragment {
            index: 0,
            atoms: 0..2,
            orbitals: vec![0, 1],
        };
        let problem = EmbeddingSpace::build(&fragment, &mf).unwrap().problem(0.0).unwrap();

        let mut registry = SolverRegistry::new();
        registry.register(Failing);
        let err = registry
            .solve("failing", &problem, &SolverOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Solver);
        assert!(matches!(err, DmetError::Solver { fragment: 0, .. }));
    }
}
