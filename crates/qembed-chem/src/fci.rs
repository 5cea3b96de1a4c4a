//! Full configuration interaction in the Sz = 0 determinant space.

use ndarray::{Array2, Array4};
use rustc_hash::FxHashMap;

use crate::determinant::{
    Determinant, ElectronicHamiltonian, SparseState, normalize, one_rdm, spin_orbital, two_rdm,
};
use crate::error::{ChemError, ChemResult};
use crate::linalg::eigh;

/// Largest determinant space diagonalized densely.
pub const MAX_FCI_DIMENSION: usize = 8_000;

/// Ground state of a full CI calculation.
#[derive(Debug, Clone)]
pub struct FciResult {
    /// Total energy including the Hamiltonian constant.
    pub energy: f64,
    /// Normalized ground-state wavefunction.
    pub state: SparseState,
    /// Spin-summed one-particle density matrix.
    pub one_rdm: Array2<f64>,
    /// Spin-summed two-particle density matrix.
    pub two_rdm: Array4<f64>,
}

/// Bitstrings over `n` orbitals with exactly `k` bits set, ascending.
fn strings(n: usize, k: usize) -> Vec<u64> {
    (0u64..(1u64 << n))
        .filter(|s| s.count_ones() as usize == k)
        .collect()
}

/// Determinants with `n_alpha` α and `n_beta` β electrons in `n_orbitals` orbitals.
pub fn determinant_space(n_orbitals: usize, n_alpha: usize, n_beta: usize) -> Vec<Determinant> {
    let alphas = strings(n_orbitals, n_alpha);
    let betas = strings(n_orbitals, n_beta);
    let mut dets = Vec::with_capacity(alphas.len() * betas.len());
    for &a in &alphas {
        for &b in &betas {
            let mut det = 0u64;
            for p in 0..n_orbitals {
                if a >> p & 1 == 1 {
                    det |= 1 << spin_orbital(p, 0);
                }
                if b >> p & 1 == 1 {
                    det |= 1 << spin_orbital(p, 1);
                }
            }
            dets.push(det);
        }
    }
    dets
}

/// Exact diagonalization of `hamiltonian` for a closed-shell electron count.
pub fn solve_fci(hamiltonian: &ElectronicHamiltonian, n_electrons: usize) -> ChemResult<FciResult> {
    if n_electrons % 2 != 0 {
        return Err(ChemError::OpenShell(1));
    }
    let n = hamiltonian.n_orbitals();
    let half = n_electrons / 2;
    if half > n {
        return Err(ChemError::Dimension(format!(
            "{n_electrons} electrons do not fit in {n} orbitals"
        )));
    }
    let dets = determinant_space(n, half, half);
    let dim = dets.len();
    if dim > MAX_FCI_DIMENSION {
        return Err(ChemError::Dimension(format!(
            "FCI space of {dim} determinants exceeds {MAX_FCI_DIMENSION}"
        )));
    }
    let index: FxHashMap<Determinant, usize> =
        dets.iter().enumerate().map(|(i, &d)| (d, i)).collect();

    let mut matrix = Array2::<f64>::zeros((dim, dim));
    for (j, &det) in dets.iter().enumerate() {
        let column = hamiltonian.apply(&SparseState::from_iter([(det, 1.0)]));
        for (d, v) in column {
            if let Some(&i) = index.get(&d) {
                matrix[[i, j]] += v;
            }
        }
    }
    let (w, v) = eigh(matrix.view())?;
    let energy = w[0];

    let mut state: SparseState = dets
        .iter()
        .enumerate()
        .filter(|(i, _)| v[[*i, 0]].abs() > 1e-14)
        .map(|(i, &d)| (d, v[[i, 0]]))
        .collect();
    normalize(&mut state);
    tracing::debug!(n_orbitals = n, n_electrons, dimension = dim, energy, "fci solved");

    Ok(FciResult {
        energy,
        one_rdm: one_rdm(&state, n),
        two_rdm: two_rdm(&state, n),
        state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_space_size() {
        assert_eq!(determinant_space(4, 2, 2).len(), 36);
        assert_eq!(determinant_space(2, 1, 1), vec![0b0011, 0b1001, 0b0110, 0b1100]);
    }

    #[test]
    fn test_two_site_hubbard() {
        // half-filled two-site Hubbard: E₀ = (U - √(U² + 16t²)) / 2
        let (t, u) = (1.0, 4.0);
        let h = array![[0.0, -t], [-t, 0.0]];
        let mut eri = Array4::zeros((2, 2, 2, 2));
        eri[[0, 0, 0, 0]] = u;
        eri[[1, 1, 1, 1]] = u;
        let ham = ElectronicHamiltonian::new(h, eri, 0.0).unwrap();
        let fci = solve_fci(&ham, 2).unwrap();
        let exact = 0.5 * (u - (u * u + 16.0 * t * t).sqrt());
        assert!((fci.energy - exact).abs() < 1e-10);
        assert!((fci.one_rdm.diag().sum() - 2.0).abs() < 1e-12);
        let pair_trace: f64 = (0..2)
            .flat_map(|p| (0..2).map(move |r| (p, r)))
            .map(|(p, r)| fci.two_rdm[[p, p, r, r]])
            .sum();
        assert!((pair_trace - 2.0).abs() < 1e-10);
        let from_rdm = ham.rdm_energy(&fci.one_rdm, &fci.two_rdm);
        assert!((from_rdm - fci.energy).abs() < 1e-10);
    }
}
