//! Bath construction and embedding Hamiltonians.
//!
//! For a fragment F the environment block of the mean-field 1-RDM in the
//! localized basis is diagonalized. Eigenvectors with fractional occupation
//! become bath orbitals, fully occupied ones form the frozen core. The
//! embedding basis is `W = [e_F | bath]` and the embedded one-body operator
//! carries the core mean field:
//!
//!   f = Wᵀ (h + J[D_core] − ½ K[D_core]) W
//!
//! Fragment energies use democratic partitioning over fragment indices.

use ndarray::{Array2, Array4};

use qembed_chem::linalg::{coulomb_exchange, eigh, transform_one, transform_two};
use qembed_chem::{
    BasisSet, ElectronicHamiltonian, Integrals, LocalizationScheme, Molecule, Rhf, ScfResult,
    localize,
};

use crate::error::{DmetError, DmetResult};
use crate::partition::Fragment;

/// Occupation threshold separating bath from core and virtual orbitals.
pub const BATH_THRESHOLD: f64 = 1e-9;

/// Whole-molecule mean field expressed in localized orbitals.
#[derive(Debug, Clone)]
pub struct LocalizedMeanField {
    /// Core Hamiltonian in the LO basis.
    pub one_body: Array2<f64>,
    /// ERIs in the LO basis.
    pub two_body: Array4<f64>,
    /// Spin-summed RHF density in the LO basis.
    pub density: Array2<f64>,
    /// Owning atom of each LO.
    pub atom_of: Vec<usize>,
    /// Electron count.
    pub n_electrons: usize,
    /// Nuclear repulsion energy.
    pub nuclear_repulsion: f64,
    /// RHF total energy.
    pub energy: f64,
}

impl LocalizedMeanField {
    /// Run RHF on `molecule` and localize with `scheme`.
    pub fn compute(molecule: &Molecule, scheme: LocalizationScheme) -> DmetResult<Self> {
        let n_electrons = molecule.n_electrons()?;
        let basis = BasisSet::build(molecule, molecule.basis)?;
        let ints = Integrals::compute(molecule, &basis);
        let hcore = ints.core_hamiltonian();
        let scf = Rhf::new(&hcore, &ints.eri, n_electrons)
            .with_overlap(ints.overlap.clone())
            .with_energy_shift(ints.nuclear_repulsion)
            .run()?;
        let lo = localize(scheme, molecule, &basis, &ints, &scf)?;

        // D_LO = Cᵀ S D S C for S-orthonormal C
        let sc = ints.overlap.dot(&lo.coeff);
        let density = transform_one(scf.density.view(), sc.view());
        tracing::info!(
            energy = scf.energy,
            n_orbitals = lo.len(),
            n_electrons,
            %scheme,
            "mean field"
        );
        Ok(Self {
            one_body: transform_one(hcore.view(), lo.coeff.view()),
            two_body: transform_two(&ints.eri, lo.coeff.view()),
            density,
            atom_of: lo.atom_of,
            n_electrons,
            nuclear_repulsion: ints.nuclear_repulsion,
            energy: scf.energy,
        })
    }

    /// Number of localized orbitals.
    pub fn n_orbitals(&self) -> usize {
        self.one_body.nrows()
    }
}

/// Fragment plus bath space with its integrals. Independent of the chemical potential.
#[derive(Debug, Clone)]
pub struct EmbeddingSpace {
    /// Fragment index.
    pub fragment: usize,
    /// Leading orbitals of the embedding basis that belong to the fragment.
    pub n_fragment_orbitals: usize,
    /// Bath orbitals following the fragment orbitals.
    pub n_bath_orbitals: usize,
    /// Electrons in the embedding space.
    pub n_electrons: usize,
    /// LO × embedding coefficient matrix W.
    pub basis: Array2<f64>,
    /// Embedded one-body operator including the core mean field.
    pub fock: Array2<f64>,
    /// Bare one-electron integrals `Wᵀ h W`.
    pub bare_one_body: Array2<f64>,
    /// Embedded ERIs.
    pub two_body: Array4<f64>,
    /// Mean-field density projected on the embedding space.
    pub initial_density: Array2<f64>,
}

impl EmbeddingSpace {
    /// Build the embedding space of `fragment`.
    pub fn build(fragment: &Fragment, mf: &LocalizedMeanField) -> DmetResult<Self> {
        let n = mf.n_orbitals();
        let frag = &fragment.orbitals;
        let env: Vec<usize> = (0..n).filter(|p| !frag.contains(p)).collect();
        let nf = frag.len();

        let d_env = Array2::from_shape_fn((env.len(), env.len()), |(i, j)| {
            mf.density[[env[i], env[j]]]
        });
        let (occ, vecs) = if env.is_empty() {
            (ndarray::Array1::zeros(0), Array2::zeros((0, 0)))
        } else {
            eigh(d_env.view())?
        };
        let bath: Vec<usize> = (0..env.len())
            .filter(|&k| occ[k] > BATH_THRESHOLD && occ[k] < 2.0 - BATH_THRESHOLD)
            .collect();
        let core: Vec<usize> = (0..env.len())
            .filter(|&k| occ[k] >= 2.0 - BATH_THRESHOLD)
            .collect();

        let n_emb = nf + bath.len();
        let mut w = Array2::<f64>::zeros((n, n_emb));
        for (i, &p) in frag.iter().enumerate() {
            w[[p, i]] = 1.0;
        }
        for (b, &k) in bath.iter().enumerate() {
            for (j, &p) in env.iter().enumerate() {
                w[[p, nf + b]] = vecs[[j, k]];
            }
        }

        let mut core_density = Array2::<f64>::zeros((n, n));
        for &k in &core {
            for (i, &p) in env.iter().enumerate() {
                for (j, &q) in env.iter().enumerate() {
                    core_density[[p, q]] += 2.0 * vecs[[i, k]] * vecs[[j, k]];
                }
            }
        }
        let (j, kx) = coulomb_exchange(&mf.two_body, core_density.view());
        let f_lo = &mf.one_body + &j - &(kx * 0.5);

        let n_electrons = mf
            .n_electrons
            .checked_sub(2 * core.len())
            .filter(|&ne| ne <= 2 * n_emb)
            .ok_or_else(|| {
                DmetError::Partition(format!(
                    "fragment {}: {} core orbitals leave no consistent electron count in {} embedding orbitals",
                    fragment.index,
                    core.len(),
                    n_emb
                ))
            })?;

        tracing::debug!(
            fragment = fragment.index,
            n_fragment = nf,
            n_bath = bath.len(),
            n_core = core.len(),
            n_electrons,
            "embedding space"
        );
        Ok(Self {
            fragment: fragment.index,
            n_fragment_orbitals: nf,
            n_bath_orbitals: bath.len(),
            n_electrons,
            fock: transform_one(f_lo.view(), w.view()),
            bare_one_body: transform_one(mf.one_body.view(), w.view()),
            two_body: transform_two(&mf.two_body, w.view()),
            initial_density: transform_one(mf.density.view(), w.view()),
            basis: w,
        })
    }

    /// Number of embedding orbitals.
    pub fn n_orbitals(&self) -> usize {
        self.n_fragment_orbitals + self.n_bath_orbitals
    }

    /// Embedded problem at chemical potential `mu`, with its mean-field reference.
    pub fn problem(&self, mu: f64) -> DmetResult<EmbeddedProblem> {
        let mut one_body = self.fock.clone();
        for i in 0..self.n_fragment_orbitals {
            one_body[[i, i]] -= mu;
        }
        let scf = Rhf::new(&one_body, &self.two_body, self.n_electrons)
            .with_initial_density(self.initial_density.clone())
            .run()?;
        let c = scf.mo_coeff.view();
        let hamiltonian = ElectronicHamiltonian::new(
            transform_one(one_body.view(), c),
            transform_two(&self.two_body, c),
            0.0,
        )?;
        Ok(EmbeddedProblem {
            fragment: self.fragment,
            chemical_potential: mu,
            n_electrons: self.n_electrons,
            n_fragment_orbitals: self.n_fragment_orbitals,
            mean_field: scf,
            hamiltonian,
        })
    }

    /// Democratically partitioned energy of the fragment orbitals.
    ///
    /// Each index of a one- or two-body term that lies in the fragment
    /// contributes its share (¼ resp. ⅛) of the term.
    pub fn fragment_energy(&self, one_rdm: &Array2<f64>, two_rdm: &Array4<f64>) -> f64 {
        let n = self.n_orbitals();
        let nf = self.n_fragment_orbitals;
        let weight = |p: usize| if p < nf { 1.0 } else { 0.0 };

        let mut e1 = 0.0;
        for i in 0..n {
            for j in 0..n {
                let w = weight(i) + weight(j);
                if w > 0.0 {
                    e1 += 0.25 * w * one_rdm[[i, j]] * (self.fock[[i, j]] + self.bare_one_body[[i, j]]);
                }
            }
        }
        let mut e2 = 0.0;
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    for l in 0..n {
                        let w = weight(i) + weight(j) + weight(k) + weight(l);
                        if w > 0.0 {
                            e2 += 0.125 * w * two_rdm[[i, j, k, l]] * self.two_body[[i, j, k, l]];
                        }
                    }
                }
            }
        }
        e1 + e2
    }

    /// Electrons on the fragment orbitals, `tr γ_FF`.
    pub fn fragment_electrons(&self, one_rdm: &Array2<f64>) -> f64 {
        (0..self.n_fragment_orbitals).map(|i| one_rdm[[i, i]]).sum()
    }
}

/// Embedding problem handed to a fragment solver.
///
/// `hamiltonian` is expressed in the canonical orbitals of `mean_field`, so
/// the reference determinant fills its lowest `n_electrons / 2` orbitals.
#[derive(Debug, Clone)]
pub struct EmbeddedProblem {
    /// Fragment index.
    pub fragment: usize,
    /// Chemical potential subtracted on the fragment diagonal.
    pub chemical_potential: f64,
    /// Electrons in the embedding space.
    pub n_electrons: usize,
    /// Fragment orbitals among the embedding orbitals.
    pub n_fragment_orbitals: usize,
    /// Fragment RHF solution in the embedding basis.
    pub mean_field: ScfResult,
    /// Hamiltonian in the fragment MO basis (no constant).
    pub hamiltonian: ElectronicHamiltonian,
}

impl EmbeddedProblem {
    /// Number of embedding orbitals.
    pub fn n_orbitals(&self) -> usize {
        self.hamiltonian.n_orbitals()
    }

    /// Bring MO-basis density matrices back to the embedding basis.
    pub fn to_embedding_basis(
        &self,
        one_rdm: &Array2<f64>,
        two_rdm: &Array4<f64>,
    ) -> (Array2<f64>, Array4<f64>) {
        let ct = self.mean_field.mo_coeff.t();
        (transform_one(one_rdm.view(), ct), transform_two(two_rdm, ct))
    }
}
