//! Projective coupled-cluster singles and doubles.
//!
//! The similarity-transformed Hamiltonian is evaluated literally in
//! determinant space, `ρ = e^{-T} H e^{T} |Φ₀⟩`, so the amplitude equations
//! are `⟨μ|ρ⟩ = 0` and the energy is `⟨Φ₀|ρ⟩`. Amplitudes live on spin
//! orbitals and are updated by Jacobi steps with orbital-energy denominators.
//!
//! The orbitals must be canonical Hartree-Fock orbitals of `hamiltonian`
//! with the lowest `n_electrons / 2` doubly occupied.

use ndarray::{Array2, Array4};

use crate::determinant::{
    Determinant, ElectronicHamiltonian, SparseState, apply_ladders, normalize, one_rdm,
    reference_determinant, two_rdm,
};
use crate::error::{ChemError, ChemResult};

/// Smallest denominator magnitude used in amplitude updates.
const DENOMINATOR_FLOOR: f64 = 1e-8;

/// Coupled-cluster convergence settings.
#[derive(Debug, Clone, Copy)]
pub struct CcsdOptions {
    /// Residual 2-norm at which the amplitudes count as converged.
    pub tolerance: f64,
    /// Iteration limit.
    pub max_iterations: usize,
}

impl Default for CcsdOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 200,
        }
    }
}

/// Converged CCSD solution.
#[derive(Debug, Clone)]
pub struct CcsdResult {
    /// Total projected energy, including the Hamiltonian constant.
    pub energy: f64,
    /// Energy relative to the reference determinant.
    pub correlation_energy: f64,
    /// Iterations used.
    pub iterations: usize,
    /// Normalized `e^{T}|Φ₀⟩`.
    pub state: SparseState,
    /// Spin-summed one-particle density matrix of `state`.
    pub one_rdm: Array2<f64>,
    /// Spin-summed two-particle density matrix of `state`.
    pub two_rdm: Array4<f64>,
}

#[derive(Debug, Clone)]
struct Excitation {
    ops: Vec<(usize, bool)>,
    target: Determinant,
    sign: f64,
    denominator: f64,
}

fn excitations(n_orbitals: usize, n_electrons: usize, eps: &[f64]) -> Vec<Excitation> {
    let reference = reference_determinant(n_electrons);
    let occ: Vec<usize> = (0..n_electrons).collect();
    let virt: Vec<usize> = (n_electrons..2 * n_orbitals).collect();
    let energy = |mode: usize| eps[mode / 2];
    let mut out = Vec::new();
    let mut push = |ops: Vec<(usize, bool)>, denominator: f64| {
        if let Some((target, sign)) = apply_ladders(reference, &ops) {
            let denominator = if denominator.abs() < DENOMINATOR_FLOOR {
                DENOMINATOR_FLOOR
            } else {
                denominator
            };
            out.push(Excitation {
                ops,
                target,
                sign,
                denominator,
            });
        }
    };

    for &i in &occ {
        for &a in &virt {
            if i % 2 == a % 2 {
                push(vec![(a, true), (i, false)], energy(a) - energy(i));
            }
        }
    }
    for (x, &i) in occ.iter().enumerate() {
        for &j in &occ[x + 1..] {
            for (y, &a) in virt.iter().enumerate() {
                for &b in &virt[y + 1..] {
                    if (i % 2 + j % 2) != (a % 2 + b % 2) {
                        continue;
                    }
                    push(
                        vec![(a, true), (b, true), (j, false), (i, false)],
                        energy(a) + energy(b) - energy(i) - energy(j),
                    );
                }
            }
        }
    }
    out
}

/// `T |state⟩`.
fn apply_cluster(state: &SparseState, amplitudes: &[f64], excitations: &[Excitation]) -> SparseState {
    let mut out = SparseState::default();
    for (&det, &c) in state {
        for (exc, &t) in excitations.iter().zip(amplitudes) {
            if t == 0.0 {
                continue;
            }
            if let Some((d, sign)) = apply_ladders(det, &exc.ops) {
                *out.entry(d).or_insert(0.0) += t * c * sign;
            }
        }
    }
    out
}

/// `e^{factor·T} |state⟩` by its terminating Taylor series.
fn apply_exponential(
    state: &SparseState,
    amplitudes: &[f64],
    excitations: &[Excitation],
    factor: f64,
    max_order: usize,
) -> SparseState {
    let mut result = state.clone();
    let mut term = state.clone();
    for k in 1..=max_order {
        term = apply_cluster(&term, amplitudes, excitations);
        let scale = factor / k as f64;
        term.values_mut().for_each(|c| *c *= scale);
        term.retain(|_, c| *c != 0.0);
        if term.is_empty() {
            break;
        }
        for (&d, &c) in &term {
            *result.entry(d).or_insert(0.0) += c;
        }
    }
    result
}

/// Solve the CCSD equations for a closed-shell reference.
pub fn solve_ccsd(
    hamiltonian: &ElectronicHamiltonian,
    n_electrons: usize,
    options: CcsdOptions,
) -> ChemResult<CcsdResult> {
    if n_electrons % 2 != 0 {
        return Err(ChemError::OpenShell(1));
    }
    let n = hamiltonian.n_orbitals();
    if n_electrons > 2 * n {
        return Err(ChemError::Dimension(format!(
            "{n_electrons} electrons do not fit in {n} orbitals"
        )));
    }
    let eps = hamiltonian.orbital_energies(n_electrons / 2);
    let excitations = excitations(n, n_electrons, &eps);
    let reference = reference_determinant(n_electrons);
    let phi0 = SparseState::from_iter([(reference, 1.0)]);
    let e_ref = hamiltonian.expectation(&phi0);
    let max_order = n_electrons + 1;

    let mut amplitudes = vec![0.0; excitations.len()];
    let mut energy = e_ref;
    let mut residual_norm = f64::INFINITY;
    for iteration in 1..=options.max_iterations {
        let psi = apply_exponential(&phi0, &amplitudes, &excitations, 1.0, max_order);
        let h_psi = hamiltonian.apply(&psi);
        let rho = apply_exponential(&h_psi, &amplitudes, &excitations, -1.0, max_order);

        energy = rho.get(&reference).copied().unwrap_or(0.0);
        let mut norm_sqr = 0.0;
        for (t, exc) in amplitudes.iter_mut().zip(&excitations) {
            let r = exc.sign * rho.get(&exc.target).copied().unwrap_or(0.0);
            norm_sqr += r * r;
            *t -= r / exc.denominator;
        }
        residual_norm = norm_sqr.sqrt();
        tracing::trace!(iteration, energy, residual_norm, "ccsd step");

        if residual_norm < options.tolerance {
            let mut state = apply_exponential(&phi0, &amplitudes, &excitations, 1.0, max_order);
            normalize(&mut state);
            tracing::debug!(iterations = iteration, energy, correlation = energy - e_ref, "ccsd converged");
            return Ok(CcsdResult {
                energy,
                correlation_energy: energy - e_ref,
                iterations: iteration,
                one_rdm: one_rdm(&state, n),
                two_rdm: two_rdm(&state, n),
                state,
            });
        }
    }
    tracing::warn!(energy, residual_norm, "ccsd did not converge");
    Err(ChemError::CcsdNotConverged {
        iterations: options.max_iterations,
        residual: residual_norm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fci::solve_fci;
    use crate::linalg::{transform_one, transform_two};
    use crate::scf::Rhf;
    use ndarray::array;

    fn hubbard_mo(n_sites: usize, t: f64, u: f64) -> ElectronicHamiltonian {
        let mut h = Array2::zeros((n_sites, n_sites));
        // open chain keeps the RHF reference nondegenerate
        for i in 0..n_sites - 1 {
            h[[i, i + 1]] = -t;
            h[[i + 1, i]] = -t;
        }
        let mut eri = Array4::zeros((n_sites, n_sites, n_sites, n_sites));
        for i in 0..n_sites {
            eri[[i, i, i, i]] = u;
        }
        let scf = Rhf::new(&h, &eri, n_sites).run().unwrap();
        let c = scf.mo_coeff.view();
        ElectronicHamiltonian::new(transform_one(h.view(), c), transform_two(&eri, c), 0.0).unwrap()
    }

    #[test]
    fn test_two_electrons_is_exact() {
        let ham = hubbard_mo(2, 1.0, 2.0);
        let cc = solve_ccsd(&ham, 2, CcsdOptions::default()).unwrap();
        let fci = solve_fci(&ham, 2).unwrap();
        assert!((cc.energy - fci.energy).abs() < 1e-8);
        let diff = (&cc.one_rdm - &fci.one_rdm).mapv(f64::abs).sum();
        assert!(diff < 1e-6);
        assert!(cc.correlation_energy < 0.0);
    }

    #[test]
    fn test_four_electrons_close_to_fci() {
        let ham = hubbard_mo(4, 1.0, 1.0);
        let cc = solve_ccsd(&ham, 4, CcsdOptions::default()).unwrap();
        let fci = solve_fci(&ham, 4).unwrap();
        assert!((cc.energy - fci.energy).abs() < 5e-3, "{} vs {}", cc.energy, fci.energy);
        assert!((cc.one_rdm.diag().sum() - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_no_correlation_without_interaction() {
        let h = array![[-1.0, 0.0], [0.0, 0.5]];
        let eri = Array4::zeros((2, 2, 2, 2));
        let ham = ElectronicHamiltonian::new(h, eri, 0.0).unwrap();
        let cc = solve_ccsd(&ham, 2, CcsdOptions::default()).unwrap();
        assert!((cc.energy + 2.0).abs() < 1e-12);
        assert_eq!(cc.iterations, 1);
    }
}
