//! Restricted Hartree-Fock with DIIS acceleration.
//!
//! The solver is written against bare matrices (core Hamiltonian, ERIs,
//! overlap) so the same code runs the full molecule in the AO basis and the
//! DMET embedding problems in an orthonormal basis.

use ndarray::{Array1, Array2, Array4, s};
use std::collections::VecDeque;

use crate::error::{ChemError, ChemResult};
use crate::linalg::{coulomb_exchange, eigh, inverse_sqrt, pinv_symmetric};

/// Converged restricted mean-field solution.
#[derive(Debug, Clone)]
pub struct ScfResult {
    /// Total energy including the constant shift.
    pub energy: f64,
    /// Orbital energies, ascending.
    pub mo_energy: Array1<f64>,
    /// MO coefficients (columns), S-orthonormal.
    pub mo_coeff: Array2<f64>,
    /// Spin-summed density `2 C_occ C_occᵀ`.
    pub density: Array2<f64>,
    /// Number of doubly occupied orbitals.
    pub n_occupied: usize,
    /// Iterations used.
    pub iterations: usize,
}

impl ScfResult {
    /// Occupied MO coefficients.
    pub fn occupied_coeff(&self) -> Array2<f64> {
        self.mo_coeff.slice(s![.., ..self.n_occupied]).to_owned()
    }

    /// Fock matrix for the converged density.
    pub fn fock(&self, hcore: &Array2<f64>, eri: &Array4<f64>) -> Array2<f64> {
        fock_matrix(hcore, eri, &self.density)
    }
}

/// `F = h + J - K/2`.
pub fn fock_matrix(hcore: &Array2<f64>, eri: &Array4<f64>, density: &Array2<f64>) -> Array2<f64> {
    let (j, k) = coulomb_exchange(eri, density.view());
    hcore + &j - &(k * 0.5)
}

/// Restricted Hartree-Fock solver.
#[derive(Debug, Clone)]
pub struct Rhf<'a> {
    hcore: &'a Array2<f64>,
    eri: &'a Array4<f64>,
    overlap: Array2<f64>,
    n_electrons: usize,
    energy_shift: f64,
    initial_density: Option<Array2<f64>>,
    max_iterations: usize,
    energy_tolerance: f64,
    error_tolerance: f64,
    diis_space: usize,
}

impl<'a> Rhf<'a> {
    /// Solver in an orthonormal basis (S = I).
    pub fn new(hcore: &'a Array2<f64>, eri: &'a Array4<f64>, n_electrons: usize) -> Self {
        let n = hcore.nrows();
        Self {
            hcore,
            eri,
            overlap: Array2::eye(n),
            n_electrons,
            energy_shift: 0.0,
            initial_density: None,
            max_iterations: 100,
            energy_tolerance: 1e-10,
            error_tolerance: 1e-8,
            diis_space: 8,
        }
    }

    /// Use a non-orthogonal basis with overlap `s`.
    pub fn with_overlap(mut self, overlap: Array2<f64>) -> Self {
        self.overlap = overlap;
        self
    }

    /// Constant added to the electronic energy (e.g. nuclear repulsion).
    pub fn with_energy_shift(mut self, shift: f64) -> Self {
        self.energy_shift = shift;
        self
    }

    /// Start from a given density instead of the core-Hamiltonian guess.
    pub fn with_initial_density(mut self, density: Array2<f64>) -> Self {
        self.initial_density = Some(density);
        self
    }

    /// Iteration limit.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Run the SCF loop.
    pub fn run(&self) -> ChemResult<ScfResult> {
        if self.n_electrons % 2 != 0 {
            return Err(ChemError::OpenShell(1));
        }
        let n = self.hcore.nrows();
        let n_occ = self.n_electrons / 2;
        if n_occ > n {
            return Err(ChemError::Dimension(format!(
                "{} electrons do not fit in {} orbitals",
                self.n_electrons, n
            )));
        }
        let x = inverse_sqrt(self.overlap.view())?;

        let mut density = match &self.initial_density {
            Some(d) => d.clone(),
            None => self.diagonalize(self.hcore, &x, n_occ)?.2,
        };
        let mut energy = self.energy(&density, &fock_matrix(self.hcore, self.eri, &density));
        let mut diis: VecDeque<(Array2<f64>, Array2<f64>)> = VecDeque::new();

        for iteration in 1..=self.max_iterations {
            let fock = fock_matrix(self.hcore, self.eri, &density);
            let error = {
                let fds = fock.dot(&density).dot(&self.overlap);
                let sdf = self.overlap.dot(&density).dot(&fock);
                x.t().dot(&(fds - sdf)).dot(&x)
            };
            let error_norm = error.iter().map(|e| e * e).sum::<f64>().sqrt();

            diis.push_back((fock.clone(), error));
            if diis.len() > self.diis_space {
                diis.pop_front();
            }
            let extrapolated = if diis.len() > 1 {
                diis_extrapolate(&diis)?
            } else {
                fock
            };

            let (mo_energy, mo_coeff, new_density) = self.diagonalize(&extrapolated, &x, n_occ)?;
            let new_energy =
                self.energy(&new_density, &fock_matrix(self.hcore, self.eri, &new_density));
            let delta_e = (new_energy - energy).abs();
            tracing::trace!(iteration, energy = new_energy, delta_e, error_norm, "scf step");
            density = new_density;
            energy = new_energy;

            if delta_e < self.energy_tolerance && error_norm < self.error_tolerance {
                tracing::debug!(iterations = iteration, energy, "scf converged");
                return Ok(ScfResult {
                    energy,
                    mo_energy,
                    mo_coeff,
                    density,
                    n_occupied: n_occ,
                    iterations: iteration,
                });
            }
            if iteration == self.max_iterations {
                return Err(ChemError::ScfNotConverged {
                    iterations: iteration,
                    delta_e,
                });
            }
        }
        Err(ChemError::ScfNotConverged {
            iterations: self.max_iterations,
            delta_e: f64::NAN,
        })
    }

    fn energy(&self, density: &Array2<f64>, fock: &Array2<f64>) -> f64 {
        let sum = self.hcore + fock;
        0.5 * (density * &sum).sum() + self.energy_shift
    }

    fn diagonalize(
        &self,
        fock: &Array2<f64>,
        x: &Array2<f64>,
        n_occ: usize,
    ) -> ChemResult<(Array1<f64>, Array2<f64>, Array2<f64>)> {
        let fprime = x.t().dot(fock).dot(x);
        let (eps, cprime) = eigh(fprime.view())?;
        let c = x.dot(&cprime);
        let occ = c.slice(s![.., ..n_occ]);
        let density = occ.dot(&occ.t()) * 2.0;
        Ok((eps, c, density))
    }
}

/// Pulay extrapolation: minimise |Σ c_i e_i| subject to Σ c_i = 1.
fn diis_extrapolate(history: &VecDeque<(Array2<f64>, Array2<f64>)>) -> ChemResult<Array2<f64>> {
    let m = history.len();
    let mut b = Array2::<f64>::zeros((m + 1, m + 1));
    for i in 0..m {
        for j in 0..m {
            b[[i, j]] = (&history[i].1 * &history[j].1).sum();
        }
        b[[i, m]] = -1.0;
        b[[m, i]] = -1.0;
    }
    let mut rhs = Array1::<f64>::zeros(m + 1);
    rhs[m] = -1.0;
    let coeffs = pinv_symmetric(b.view())?.dot(&rhs);

    let mut fock = Array2::<f64>::zeros(history[0].0.raw_dim());
    for (i, (f, _)) in history.iter().enumerate() {
        fock.scaled_add(coeffs[i], f);
    }
    Ok(fock)
}
