//! DMET configuration.
//!
//! Loaded from YAML (or built in code) and validated eagerly:
//!
//! ```yaml
//! molecule:
//!   atoms:
//!     - [H, [0.0, 0.0, 0.0]]
//!     - [H, [0.0, 0.0, 0.74]]
//!   basis: sto-3g
//! fragment_atoms: [1, 1]
//! fragment_solvers: [vqe, ccsd]
//! electron_localization: meta_lowdin
//! solvers_options:
//!   vqe:
//!     qubit_mapping: scbk
//!     up_then_down: true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use qembed_chem::{LocalizationScheme, Molecule, QubitMapping};

use crate::error::{DmetError, DmetResult};
use crate::partition::validate_fragment_atoms;

/// Options understood by the built-in solvers.
///
/// Solvers ignore the fields that do not concern them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverOptions {
    /// Fermion-to-qubit mapping.
    #[serde(default)]
    pub qubit_mapping: QubitMapping,
    /// Order spin orbitals all-α then all-β instead of interleaved.
    #[serde(default)]
    pub up_then_down: bool,
    /// Shots per measured Pauli term; exact distributions when absent.
    #[serde(default)]
    pub n_shots: Option<u64>,
    /// Seed for sampled measurements.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Iteration limit of the solver's optimizer or amplitude loop.
    #[serde(default)]
    pub max_iterations: Option<usize>,
    /// Convergence tolerance of the solver's optimizer or amplitude loop.
    #[serde(default)]
    pub tolerance: Option<f64>,
    /// Starting variational parameters; zeros when absent.
    #[serde(default)]
    pub initial_parameters: Option<Vec<f64>>,
}

/// `solvers_options`: one option set for every solver, or one per solver id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SolversOptions {
    /// Applied to all solvers.
    Shared(SolverOptions),
    /// Keyed by solver id; missing ids use defaults.
    PerSolver(BTreeMap<String, SolverOptions>),
}

impl Default for SolversOptions {
    fn default() -> Self {
        SolversOptions::Shared(SolverOptions::default())
    }
}

impl SolversOptions {
    /// Options for `solver_id`.
    pub fn for_solver(&self, solver_id: &str) -> SolverOptions {
        match self {
            SolversOptions::Shared(o) => o.clone(),
            SolversOptions::PerSolver(map) => map
                .get(&solver_id.to_ascii_lowercase())
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// `fragment_solvers`: one id for all fragments, or one per fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FragmentSolvers {
    /// Same solver everywhere.
    All(String),
    /// One solver per fragment, in fragment order.
    PerFragment(Vec<String>),
}

impl Default for FragmentSolvers {
    fn default() -> Self {
        FragmentSolvers::All("ccsd".into())
    }
}

impl FragmentSolvers {
    /// Lowercased solver id per fragment.
    pub fn resolve(&self, n_fragments: usize) -> DmetResult<Vec<String>> {
        match self {
            FragmentSolvers::All(id) => Ok(vec![id.to_ascii_lowercase(); n_fragments]),
            FragmentSolvers::PerFragment(ids) if ids.len() == n_fragments => {
                Ok(ids.iter().map(|s| s.to_ascii_lowercase()).collect())
            }
            FragmentSolvers::PerFragment(ids) => Err(DmetError::Configuration(format!(
                "{} fragment solvers given for {} fragments",
                ids.len(),
                n_fragments
            ))),
        }
    }
}

/// Top-level DMET configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DmetConfig {
    /// Molecule to decompose.
    pub molecule: Molecule,
    /// Atoms per fragment, in atom order.
    pub fragment_atoms: Vec<usize>,
    /// Solver ids.
    #[serde(default)]
    pub fragment_solvers: FragmentSolvers,
    /// Orbital localization scheme.
    #[serde(default)]
    pub electron_localization: LocalizationScheme,
    /// Solver options.
    #[serde(default)]
    pub solvers_options: SolversOptions,
    /// Report per-fragment progress at `info` level.
    #[serde(default)]
    pub verbose: bool,
}

impl DmetConfig {
    /// Configuration with default solvers and localization.
    pub fn new(molecule: Molecule, fragment_atoms: Vec<usize>) -> Self {
        Self {
            molecule,
            fragment_atoms,
            fragment_solvers: FragmentSolvers::default(),
            electron_localization: LocalizationScheme::default(),
            solvers_options: SolversOptions::default(),
            verbose: false,
        }
    }

    /// Set the per-fragment solvers.
    pub fn with_solvers<S: Into<String>>(mut self, solvers: impl IntoIterator<Item = S>) -> Self {
        self.fragment_solvers =
            FragmentSolvers::PerFragment(solvers.into_iter().map(Into::into).collect());
        self
    }

    /// Set the localization scheme.
    pub fn with_localization(mut self, scheme: LocalizationScheme) -> Self {
        self.electron_localization = scheme;
        self
    }

    /// Set the solver options.
    pub fn with_solvers_options(mut self, options: SolversOptions) -> Self {
        self.solvers_options = options;
        self
    }

    /// Parse YAML text.
    pub fn from_yaml_str(text: &str) -> DmetResult<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Load a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> DmetResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Structural checks that need no numerics.
    pub fn validate(&self) -> DmetResult<()> {
        validate_fragment_atoms(self.molecule.n_atoms(), &self.fragment_atoms)?;
        self.fragment_solvers.resolve(self.fragment_atoms.len())?;
        if self.molecule.spin != 0 {
            return Err(DmetError::Configuration(format!(
                "only closed-shell molecules are supported, got spin {}",
                self.molecule.spin
            )));
        }
        self.molecule
            .n_electrons()
            .map_err(|e| DmetError::Configuration(e.to_string()))?;
        Ok(())
    }
}
