//! Error types for the DMET workflow.

use std::fmt;

use qembed_chem::ChemError;
use qembed_ir::IrError;
use qembed_sim::SimError;
use thiserror::Error;

/// Errors raised while configuring, partitioning, solving or resampling.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DmetError {
    /// Invalid, missing or unrecognized configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Fragment atom counts do not describe the molecule.
    #[error("Partition error: {0}")]
    Partition(String),

    /// A fragment solver failed.
    #[error("Solver '{solver}' failed on fragment {fragment}: {message}")]
    Solver {
        /// Solver identifier.
        solver: String,
        /// Fragment index.
        fragment: usize,
        /// Underlying failure.
        message: String,
    },

    /// The chemical-potential fit did not converge.
    #[error(
        "Chemical potential did not converge in {iterations} iterations (electron mismatch {mismatch:e})"
    )]
    ChemicalPotential {
        /// Secant iterations performed.
        iterations: usize,
        /// Σ N_frag − N at the last iterate.
        mismatch: f64,
    },

    /// A measurement record does not match the fragments it is applied to.
    #[error("Measurement record mismatch: {0}")]
    MeasurementRecord(String),

    /// Chemistry backend error outside a fragment solver.
    #[error(transparent)]
    Chem(#[from] ChemError),

    /// Qubit operator or simulation error outside a fragment solver.
    #[error(transparent)]
    Sim(#[from] SimError),

    /// Circuit construction error.
    #[error(transparent)]
    Ir(#[from] IrError),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration text could not be parsed.
    #[error("Configuration error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Coarse classification of [`DmetError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad configuration, detected at build time.
    Configuration,
    /// Fragment/atom-count mismatch.
    Partition,
    /// A solver or the self-consistency loop failed to converge.
    Solver,
    /// Structural mismatch in a measurement record.
    MeasurementRecord,
    /// Numerical backend failure.
    Numerical,
}

impl DmetError {
    /// Wrap a solver failure with its context.
    pub fn solver(solver: impl Into<String>, fragment: usize, err: impl fmt::Display) -> Self {
        DmetError::Solver {
            solver: solver.into(),
            fragment,
            message: err.to_string(),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DmetError::Configuration(_) | DmetError::Io(_) | DmetError::Yaml(_) => {
                ErrorKind::Configuration
            }
            DmetError::Partition(_) => ErrorKind::Partition,
            DmetError::Solver { .. } | DmetError::ChemicalPotential { .. } => ErrorKind::Solver,
            DmetError::MeasurementRecord(_) => ErrorKind::MeasurementRecord,
            DmetError::Chem(e) => match e {
                ChemError::ScfNotConverged { .. } | ChemError::CcsdNotConverged { .. } => {
                    ErrorKind::Solver
                }
                ChemError::UnknownElement(_)
                | ChemError::UnknownBasis(_)
                | ChemError::InvalidElectronCount { .. }
                | ChemError::OpenShell(_)
                | ChemError::Mapping { .. } => ErrorKind::Configuration,
                _ => ErrorKind::Numerical,
            },
            DmetError::Sim(_) | DmetError::Ir(_) => ErrorKind::Numerical,
        }
    }
}

/// Result type for DMET operations.
pub type DmetResult<T> = Result<T, DmetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(DmetError::Partition("x".into()).kind(), ErrorKind::Partition);
        assert_eq!(DmetError::solver("ccsd", 0, "diverged").kind(), ErrorKind::Solver);
        assert_eq!(
            DmetError::from(ChemError::CcsdNotConverged {
                iterations: 200,
                residual: 1.0
            })
            .kind(),
            ErrorKind::Solver
        );
        assert_eq!(
            DmetError::from(ChemError::OpenShell(2)).kind(),
            ErrorKind::Configuration
        );
        let msg = DmetError::solver("vqe", 3, "boom").to_string();
        assert!(msg.contains("fragment 3") && msg.contains("vqe"));
    }
}
