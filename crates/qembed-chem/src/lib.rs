//! Electronic-structure backend for qembed.
//!
//! Small, dense and exact: s-type Gaussian basis sets for H and He, closed
//! form integrals, restricted Hartree-Fock, orbital localization, fermion to
//! qubit mappings, and determinant-space FCI and CCSD. Everything runs on
//! `ndarray` matrices with `faer` doing the symmetric eigendecompositions.
//!
//! # Example
//!
//! ```rust
//! use qembed_chem::{BasisSet, BasisSetName, Integrals, Molecule, Rhf};
//!
//! let mol = Molecule::from_symbols(
//!     [("H", [0.0, 0.0, 0.0]), ("H", [0.0, 0.0, 0.74])],
//!     BasisSetName::Sto3g,
//! )
//! .unwrap();
//! let basis = BasisSet::build(&mol, mol.basis).unwrap();
//! let ints = Integrals::compute(&mol, &basis);
//! let h = ints.core_hamiltonian();
//! let scf = Rhf::new(&h, &ints.eri, 2)
//!     .with_overlap(ints.overlap.clone())
//!     .with_energy_shift(ints.nuclear_repulsion)
//!     .run()
//!     .unwrap();
//! assert!(scf.energy < -1.1);
//! ```

pub mod basis;
pub mod ccsd;
pub mod determinant;
pub mod error;
pub mod fci;
pub mod integrals;
pub mod linalg;
pub mod localization;
pub mod mapping;
pub mod molecule;
pub mod scf;

pub use basis::{BasisSet, BasisSetName};
pub use ccsd::{CcsdOptions, CcsdResult, solve_ccsd};
pub use determinant::{ElectronicHamiltonian, SparseState};
pub use error::{ChemError, ChemResult};
pub use fci::{FciResult, solve_fci};
pub use integrals::Integrals;
pub use localization::{LocalizationScheme, LocalizedOrbitals, localize};
pub use mapping::{FermionMapper, QubitMapping, Spin};
pub use molecule::{Atom, Element, LengthUnit, Molecule};
pub use scf::{Rhf, ScfResult};
