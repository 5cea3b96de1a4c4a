//! The DMET driver: build fragments, fit the chemical potential, solve, and
//! post-process measurements.

use rand::Rng;
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::config::{DmetConfig, SolverOptions};
use crate::embedding::{EmbeddedProblem, EmbeddingSpace, LocalizedMeanField};
use crate::error::{DmetError, DmetResult};
use crate::estimator::{
    Bootstrap, BootstrapFragment, MeasurementRecord, ResourceReport, estimate_resources,
    mean_and_std,
};
use crate::partition::{Fragment, partition};
use crate::solvers::{FragmentResult, SolverRegistry};

/// First secant step away from μ = 0.
const MU_STEP: f64 = 1e-4;
/// Secant stops once μ moves less than this.
const MU_TOLERANCE: f64 = 1e-5;
/// Electron mismatch treated as zero at the starting point.
const ELECTRON_TOLERANCE: f64 = 1e-10;
const MAX_MU_ITERATIONS: usize = 50;

/// `info!` when verbose, `debug!` otherwise.
macro_rules! progress {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

/// One fragment's solution at the final chemical potential.
#[derive(Debug, Clone)]
pub struct FragmentOutcome {
    /// Fragment index.
    pub index: usize,
    /// Solver id.
    pub solver: String,
    /// Democratically partitioned fragment energy.
    pub fragment_energy: f64,
    /// Electrons on the fragment orbitals.
    pub electrons: f64,
    /// Raw solver output.
    pub result: FragmentResult,
}

#[derive(Debug)]
struct Built {
    mean_field: LocalizedMeanField,
    fragments: Vec<Fragment>,
    spaces: Vec<EmbeddingSpace>,
    solvers: Vec<String>,
    options: Vec<SolverOptions>,
}

/// Problem decomposition driven by DMET.
///
/// ```no_run
/// use qembed_dmet::{DmetConfig, DmetProblemDecomposition};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let config = DmetConfig::from_file("h4.yaml")?;
/// let mut dmet = DmetProblemDecomposition::new(config);
/// dmet.build()?;
/// let energy = dmet.simulate()?;
/// let mut rng = StdRng::seed_from_u64(7);
/// let (mean, std) = dmet.energy_error_bars(10_000, 10, false, None, &mut rng)?;
/// println!("{energy} ≈ {mean} ± {std}");
/// # Ok::<(), qembed_dmet::DmetError>(())
/// ```
#[derive(Debug)]
pub struct DmetProblemDecomposition {
    config: DmetConfig,
    registry: SolverRegistry,
    built: Option<Built>,
    chemical_potential: Option<f64>,
    outcomes: Vec<FragmentOutcome>,
    rdm_measurements: Option<MeasurementRecord>,
}

impl DmetProblemDecomposition {
    /// Decomposition with the default solver registry. Nothing is computed yet.
    pub fn new(config: DmetConfig) -> Self {
        Self {
            config,
            registry: SolverRegistry::with_defaults(),
            built: None,
            chemical_potential: None,
            outcomes: Vec::new(),
            rdm_measurements: None,
        }
    }

    /// Replace the solver registry.
    pub fn with_registry(mut self, registry: SolverRegistry) -> Self {
        self.registry = registry;
        self.built = None;
        self
    }

    /// Configuration.
    pub fn config(&self) -> &DmetConfig {
        &self.config
    }

    /// Validate the configuration, run the mean field, and build the fragments.
    ///
    /// Every configuration problem is reported before any numerics run.
    pub fn build(&mut self) -> DmetResult<()> {
        self.config.validate()?;
        let n_fragments = self.config.fragment_atoms.len();
        let solvers = self.config.fragment_solvers.resolve(n_fragments)?;
        let mut options = Vec::with_capacity(n_fragments);
        for id in &solvers {
            let opts = self.config.solvers_options.for_solver(id);
            self.registry.get(id)?.validate_options(&opts)?;
            options.push(opts);
        }

        let verbose = self.config.verbose;
        let mean_field =
            LocalizedMeanField::compute(&self.config.molecule, self.config.electron_localization)?;
        let orbitals = qembed_chem::LocalizedOrbitals {
            coeff: ndarray::Array2::eye(mean_field.n_orbitals()),
            atom_of: mean_field.atom_of.clone(),
        };
        let fragments = partition(&self.config.molecule, &orbitals, &self.config.fragment_atoms)?;
        let spaces = fragments
            .iter()
            .map(|f| EmbeddingSpace::build(f, &mean_field))
            .collect::<DmetResult<Vec<_>>>()?;
        for (space, solver) in spaces.iter().zip(&solvers) {
            progress!(
                verbose,
                fragment = space.fragment,
                solver = %solver,
                n_fragment_orbitals = space.n_fragment_orbitals,
                n_bath_orbitals = space.n_bath_orbitals,
                n_electrons = space.n_electrons,
                "fragment built"
            );
        }

        self.built = Some(Built {
            mean_field,
            fragments,
            spaces,
            solvers,
            options,
        });
        self.chemical_potential = None;
        self.outcomes.clear();
        self.rdm_measurements = None;
        Ok(())
    }

    fn ensure_built(&mut self) -> DmetResult<&Built> {
        if self.built.is_none() {
            self.build()?;
        }
        self.built
            .as_ref()
            .ok_or_else(|| DmetError::Configuration("decomposition is not built".into()))
    }

    fn solve_all(&self, built: &Built, mu: f64) -> DmetResult<Vec<FragmentOutcome>> {
        let verbose = self.config.verbose;
        built
            .spaces
            .par_iter()
            .zip(&built.solvers)
            .zip(&built.options)
            .map(|((space, solver), options)| -> DmetResult<FragmentOutcome> {
                let problem = space.problem(mu)?;
                let result = self.registry.solve(solver, &problem, options)?;
                let fragment_energy = space.fragment_energy(&result.one_rdm, &result.two_rdm);
                let electrons = space.fragment_electrons(&result.one_rdm);
                progress!(
                    verbose,
                    fragment = space.fragment,
                    solver = %solver,
                    mu,
                    fragment_energy,
                    electrons,
                    "fragment solved"
                );
                Ok(FragmentOutcome {
                    index: space.fragment,
                    solver: solver.clone(),
                    fragment_energy,
                    electrons,
                    result,
                })
            })
            .collect()
    }

    fn electron_mismatch(&self, built: &Built, mu: f64) -> DmetResult<f64> {
        let outcomes = self.solve_all(built, mu)?;
        let total: f64 = outcomes.iter().map(|o| o.electrons).sum();
        Ok(total - built.mean_field.n_electrons as f64)
    }

    /// Secant search for μ with Σ N_frag(μ) = N.
    fn fit_chemical_potential(&self, built: &Built) -> DmetResult<f64> {
        let verbose = self.config.verbose;
        let (mut mu0, mut mu1) = (0.0, MU_STEP);
        let mut f0 = self.electron_mismatch(built, mu0)?;
        if f0.abs() < ELECTRON_TOLERANCE {
            return Ok(mu0);
        }
        let mut f1 = self.electron_mismatch(built, mu1)?;
        for iteration in 1..=MAX_MU_ITERATIONS {
            progress!(verbose, iteration, mu = mu1, mismatch = f1, "chemical potential");
            if f1 == f0 {
                return Err(DmetError::ChemicalPotential {
                    iterations: iteration,
                    mismatch: f1,
                });
            }
            let mu2 = mu1 - f1 * (mu1 - mu0) / (f1 - f0);
            if (mu2 - mu1).abs() < MU_TOLERANCE {
                return Ok(mu2);
            }
            (mu0, f0) = (mu1, f1);
            mu1 = mu2;
            f1 = self.electron_mismatch(built, mu1)?;
        }
        Err(DmetError::ChemicalPotential {
            iterations: MAX_MU_ITERATIONS,
            mismatch: f1,
        })
    }

    /// Run DMET and return the total energy.
    ///
    /// Measurement-based fragments leave their raw outcomes in
    /// [`rdm_measurements`](Self::rdm_measurements).
    pub fn simulate(&mut self) -> DmetResult<f64> {
        self.ensure_built()?;
        let Some(built) = self.built.as_ref() else {
            return Err(DmetError::Configuration("decomposition is not built".into()));
        };
        let mu = self.fit_chemical_potential(built)?;
        let outcomes = self.solve_all(built, mu)?;

        let mut record = MeasurementRecord::new();
        for outcome in &outcomes {
            if let Some(m) = &outcome.result.measurements {
                record.insert(outcome.index, m.frequencies.clone());
            }
        }
        let energy = built.mean_field.nuclear_repulsion
            + outcomes.iter().map(|o| o.fragment_energy).sum::<f64>();
        tracing::info!(
            energy,
            mean_field = built.mean_field.energy,
            chemical_potential = mu,
            "dmet energy"
        );

        self.chemical_potential = Some(mu);
        self.outcomes = outcomes;
        self.rdm_measurements = (!record.is_empty()).then_some(record);
        Ok(energy)
    }

    /// Resource reports at μ = 0 for fragments whose solver uses quantum resources.
    pub fn get_resources(&mut self) -> DmetResult<BTreeMap<usize, ResourceReport>> {
        self.ensure_built()?;
        let Some(built) = self.built.as_ref() else {
            return Err(DmetError::Configuration("decomposition is not built".into()));
        };
        let reports = built
            .spaces
            .par_iter()
            .zip(&built.solvers)
            .zip(&built.options)
            .map(|((space, solver), options)| -> DmetResult<Option<(usize, ResourceReport)>> {
                let problem = space.problem(0.0)?;
                let report = estimate_resources(self.registry.get(solver)?, &problem, options)?;
                Ok(report.map(|r| (space.fragment, r)))
            })
            .collect::<DmetResult<Vec<_>>>()?;
        Ok(reports.into_iter().flatten().collect())
    }

    /// Bootstrap mean and standard deviation of the total energy.
    ///
    /// Without `rdm_measurements` the record of the last [`simulate`](Self::simulate)
    /// is used, running it first if needed. A supplied record is resampled
    /// without invoking any solver, but the fragments must have been
    /// simulated once so their classical energies and embeddings are known.
    pub fn energy_error_bars(
        &mut self,
        n_shots: u64,
        n_resamples: usize,
        purify: bool,
        rdm_measurements: Option<&MeasurementRecord>,
        rng: &mut impl Rng,
    ) -> DmetResult<(f64, f64)> {
        let record = match rdm_measurements {
            Some(record) => {
                if self.outcomes.is_empty() {
                    return Err(DmetError::MeasurementRecord(
                        "a measurement record needs a prior simulate()".into(),
                    ));
                }
                record.clone()
            }
            None => {
                if self.outcomes.is_empty() {
                    self.simulate()?;
                }
                self.rdm_measurements.clone().unwrap_or_default()
            }
        };
        let Some(built) = self.built.as_ref() else {
            return Err(DmetError::MeasurementRecord(
                "a measurement record needs a prior simulate()".into(),
            ));
        };

        let fragments = self
            .outcomes
            .iter()
            .map(|o| match &o.result.measurements {
                Some(m) => BootstrapFragment::Measured {
                    estimator: &m.estimator,
                    space: &built.spaces[o.index],
                },
                None => BootstrapFragment::Fixed {
                    energy: o.fragment_energy,
                },
            })
            .collect();
        let bootstrap = Bootstrap::new(fragments, built.mean_field.nuclear_repulsion);
        let trials = bootstrap.run(&record, n_shots, n_resamples, purify, rng)?;
        let (mean, std) = mean_and_std(&trials);
        progress!(self.config.verbose, mean, std, n_shots, n_resamples, purify, "energy error bars");
        Ok((mean, std))
    }

    /// Measurement record of the last `simulate()`, if any fragment was measured.
    pub fn rdm_measurements(&self) -> Option<&MeasurementRecord> {
        self.rdm_measurements.as_ref()
    }

    /// Fragments, empty before `build()`.
    pub fn fragments(&self) -> &[Fragment] {
        self.built.as_ref().map_or(&[][..], |b| b.fragments.as_slice())
    }

    /// Fitted chemical potential of the last `simulate()`.
    pub fn chemical_potential(&self) -> Option<f64> {
        self.chemical_potential
    }

    /// Per-fragment results of the last `simulate()`.
    pub fn fragment_outcomes(&self) -> &[FragmentOutcome] {
        &self.outcomes
    }

    /// RHF energy of the whole molecule, once built.
    pub fn mean_field_energy(&self) -> Option<f64> {
        self.built.as_ref().map(|b| b.mean_field.energy)
    }

    /// Embedded problem of `fragment` at chemical potential `mu`.
    pub fn embedded_problem(&mut self, fragment: usize, mu: f64) -> DmetResult<EmbeddedProblem> {
        let built = self.ensure_built()?;
        let space = built.spaces.get(fragment).ok_or_else(|| {
            DmetError::Partition(format!(
                "fragment {fragment} does not exist, there are {}",
                built.spaces.len()
            ))
        })?;
        space.problem(mu)
    }

    /// Solver options bound to `fragment`.
    pub fn solver_options(&self, fragment: usize) -> Option<&SolverOptions> {
        self.built.as_ref().and_then(|b| b.options.get(fragment))
    }
}
