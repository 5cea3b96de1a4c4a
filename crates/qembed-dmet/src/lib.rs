//! Density matrix embedding theory with pluggable fragment solvers.
//!
//! A molecule is split into fragments of consecutive atoms. Each fragment is
//! embedded in a bath built from the whole-molecule mean field and solved by
//! a method from the [`SolverRegistry`]: `fci`, `ccsd`, or a UCCSD `vqe` on
//! a simulated quantum register. The chemical potential is fitted so that the
//! fragments hold the right number of electrons, and fragment energies are
//! summed into the total.
//!
//! Measurement-based solvers record the outcome distribution of every Pauli
//! term they measured. That [`MeasurementRecord`] can be resampled later to
//! get bootstrap error bars without running the solver again.
//!
//! # Example
//!
//! ```rust,no_run
//! use qembed_chem::{BasisSetName, Molecule};
//! use qembed_dmet::{DmetConfig, DmetProblemDecomposition};
//!
//! let h4 = Molecule::from_symbols(
//!     (0..4).map(|i| ("H", [0.0, 0.0, 0.9 * i as f64])),
//!     BasisSetName::Sto3g,
//! )?;
//! let config = DmetConfig::new(h4, vec![1, 1, 1, 1]).with_solvers(["vqe", "ccsd", "ccsd", "ccsd"]);
//! let mut dmet = DmetProblemDecomposition::new(config);
//! dmet.build()?;
//! println!("E = {}", dmet.simulate()?);
//! println!("{:?}", dmet.get_resources()?);
//! # Ok::<(), qembed_dmet::DmetError>(())
//! ```

pub mod config;
pub mod driver;
pub mod embedding;
pub mod error;
pub mod estimator;
pub mod partition;
pub mod rdm;
pub mod solvers;

pub use config::{DmetConfig, FragmentSolvers, SolverOptions, SolversOptions};
pub use driver::{DmetProblemDecomposition, FragmentOutcome};
pub use embedding::{EmbeddedProblem, EmbeddingSpace, LocalizedMeanField};
pub use error::{DmetError, DmetResult, ErrorKind};
pub use estimator::{MeasurementRecord, ResourceReport};
pub use partition::{Fragment, partition, validate_fragment_atoms};
pub use solvers::{FragmentResult, FragmentSolver, SolverRegistry};
