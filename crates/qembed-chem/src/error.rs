//! Error types for the chemistry backend.

use thiserror::Error;

/// Errors produced while building molecules, integrals and wavefunctions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChemError {
    /// Element symbol not supported by the basis library.
    #[error("Unsupported element '{0}'")]
    UnknownElement(String),

    /// Basis set label not in the library.
    #[error("Unknown basis set '{0}' (expected one of: sto-3g, 6-31g, minao)")]
    UnknownBasis(String),

    /// Charge and spin leave an impossible electron count.
    #[error("Invalid electron count: {n_electrons} electrons with spin {spin}")]
    InvalidElectronCount {
        /// Total electrons after applying the charge.
        n_electrons: i64,
        /// 2S.
        spin: u32,
    },

    /// Only closed-shell references are supported.
    #[error("Open-shell system (spin {0}) is not supported by restricted Hartree-Fock")]
    OpenShell(u32),

    /// Self-consistent field failed to converge.
    #[error("SCF did not converge in {iterations} iterations (last energy change {delta_e:e})")]
    ScfNotConverged {
        /// Iterations performed.
        iterations: usize,
        /// |ΔE| at the last iteration.
        delta_e: f64,
    },

    /// Coupled-cluster amplitudes failed to converge.
    #[error("CCSD did not converge in {iterations} iterations (residual norm {residual:e})")]
    CcsdNotConverged {
        /// Iterations performed.
        iterations: usize,
        /// Residual norm at the last iteration.
        residual: f64,
    },

    /// Eigensolver failure.
    #[error("Eigendecomposition failed: {0}")]
    Eigen(String),

    /// Matrix or tensor dimensions disagree.
    #[error("Dimension mismatch: {0}")]
    Dimension(String),

    /// Qubit mapping requested with an incompatible orbital layout.
    #[error("Qubit mapping '{mapping}' is not applicable: {reason}")]
    Mapping {
        /// Mapping name.
        mapping: String,
        /// Why it cannot be used.
        reason: String,
    },

    /// Determinant space too large for a u64 bitstring representation.
    #[error("{0} spin orbitals exceed the 64-orbital determinant limit")]
    TooManyOrbitals(usize),

    /// Qubit operator algebra error.
    #[error("Qubit operator error: {0}")]
    Sim(#[from] qembed_sim::SimError),
}

/// Result type for chemistry operations.
pub type ChemResult<T> = Result<T, ChemError>;
