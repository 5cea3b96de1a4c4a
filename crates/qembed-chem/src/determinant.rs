//! Slater determinants as occupation bitstrings and sparse wavefunctions.
//!
//! Spin orbital `2p + σ` holds spatial orbital `p` with spin σ (0 = α,
//! 1 = β). A determinant is the bitmask of occupied spin orbitals, and the
//! fermionic sign of a ladder operator on mode `k` is `(-1)^{#occupied < k}`.

use ndarray::{Array2, Array4};
use rustc_hash::FxHashMap;

use crate::error::{ChemError, ChemResult};

/// Occupation bitstring over spin orbitals.
pub type Determinant = u64;

/// Sparse real wavefunction: determinant → amplitude.
pub type SparseState = FxHashMap<Determinant, f64>;

/// Spin-orbital index of spatial orbital `p`, spin `sigma` (0 = α, 1 = β).
#[inline]
pub fn spin_orbital(p: usize, sigma: usize) -> usize {
    2 * p + sigma
}

#[inline]
fn ladder_sign(det: Determinant, mode: usize) -> f64 {
    let below = det & ((1u64 << mode) - 1);
    if below.count_ones() % 2 == 0 { 1.0 } else { -1.0 }
}

/// `a_mode |det⟩`.
#[inline]
pub fn annihilate(det: Determinant, mode: usize) -> Option<(Determinant, f64)> {
    let bit = 1u64 << mode;
    if det & bit == 0 {
        None
    } else {
        Some((det ^ bit, ladder_sign(det, mode)))
    }
}

/// `a†_mode |det⟩`.
#[inline]
pub fn create(det: Determinant, mode: usize) -> Option<(Determinant, f64)> {
    let bit = 1u64 << mode;
    if det & bit != 0 {
        None
    } else {
        Some((det | bit, ladder_sign(det, mode)))
    }
}

/// Apply a product of ladder operators `(mode, is_creation)`; the rightmost acts first.
pub fn apply_ladders(det: Determinant, ops: &[(usize, bool)]) -> Option<(Determinant, f64)> {
    let mut current = det;
    let mut sign = 1.0;
    for &(mode, dagger) in ops.iter().rev() {
        let (next, s) = if dagger {
            create(current, mode)?
        } else {
            annihilate(current, mode)?
        };
        current = next;
        sign *= s;
    }
    Some((current, sign))
}

/// Closed-shell reference with the lowest `n_electrons / 2` spatial orbitals doubly occupied.
pub fn reference_determinant(n_electrons: usize) -> Determinant {
    if n_electrons >= 64 {
        return u64::MAX;
    }
    (1u64 << n_electrons) - 1
}

/// Calls `f(p, q, det', sign)` for every nonzero `Σ_σ a†_{pσ} a_{qσ} |det⟩`.
pub fn for_each_single(
    det: Determinant,
    n_orbitals: usize,
    mut f: impl FnMut(usize, usize, Determinant, f64),
) {
    for q in 0..n_orbitals {
        for sigma in 0..2 {
            let Some((d1, s1)) = annihilate(det, spin_orbital(q, sigma)) else {
                continue;
            };
            for p in 0..n_orbitals {
                if let Some((d2, s2)) = create(d1, spin_orbital(p, sigma)) {
                    f(p, q, d2, s1 * s2);
                }
            }
        }
    }
}

/// Calls `f(p, q, r, s, det', sign)` for every nonzero
/// `Σ_στ a†_{pσ} a†_{rτ} a_{sτ} a_{qσ} |det⟩`.
pub fn for_each_double(
    det: Determinant,
    n_orbitals: usize,
    mut f: impl FnMut(usize, usize, usize, usize, Determinant, f64),
) {
    for q in 0..n_orbitals {
        for sigma in 0..2 {
            let Some((d1, s1)) = annihilate(det, spin_orbital(q, sigma)) else {
                continue;
            };
            for s in 0..n_orbitals {
                for tau in 0..2 {
                    let Some((d2, s2)) = annihilate(d1, spin_orbital(s, tau)) else {
                        continue;
                    };
                    for r in 0..n_orbitals {
                        let Some((d3, s3)) = create(d2, spin_orbital(r, tau)) else {
                            continue;
                        };
                        for p in 0..n_orbitals {
                            if let Some((d4, s4)) = create(d3, spin_orbital(p, sigma)) {
                                f(p, q, r, s, d4, s1 * s2 * s3 * s4);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Scale `state` to unit norm.
pub fn normalize(state: &mut SparseState) {
    let norm = state.values().map(|c| c * c).sum::<f64>().sqrt();
    if norm > 0.0 {
        state.values_mut().for_each(|c| *c /= norm);
    }
}

/// `⟨a|b⟩`.
pub fn overlap(a: &SparseState, b: &SparseState) -> f64 {
    a.iter()
        .filter_map(|(d, ca)| b.get(d).map(|cb| ca * cb))
        .sum()
}

/// Spin-summed one-particle density matrix `γ_pq = Σ_σ ⟨a†_{pσ} a_{qσ}⟩`.
pub fn one_rdm(state: &SparseState, n_orbitals: usize) -> Array2<f64> {
    let mut gamma = Array2::zeros((n_orbitals, n_orbitals));
    for (&det, &c) in state {
        for_each_single(det, n_orbitals, |p, q, d, sign| {
            if let Some(bra) = state.get(&d) {
                gamma[[p, q]] += bra * c * sign;
            }
        });
    }
    gamma
}

/// Spin-summed two-particle density matrix
/// `Γ_pqrs = Σ_στ ⟨a†_{pσ} a†_{rτ} a_{sτ} a_{qσ}⟩`.
pub fn two_rdm(state: &SparseState, n_orbitals: usize) -> Array4<f64> {
    let n = n_orbitals;
    let mut gamma = Array4::zeros((n, n, n, n));
    for (&det, &c) in state {
        for_each_double(det, n, |p, q, r, s, d, sign| {
            if let Some(bra) = state.get(&d) {
                gamma[[p, q, r, s]] += bra * c * sign;
            }
        });
    }
    gamma
}

/// Spin-free electronic Hamiltonian
/// `H = E₀ + Σ h_pq E_pq + ½ Σ (pq|rs) e_pqrs` over an orthonormal orbital set.
#[derive(Debug, Clone)]
pub struct ElectronicHamiltonian {
    /// One-electron integrals.
    pub one_body: Array2<f64>,
    /// Two-electron integrals (chemist notation).
    pub two_body: Array4<f64>,
    /// Constant energy shift.
    pub constant: f64,
}

impl ElectronicHamiltonian {
    /// Validate shapes and wrap the integrals.
    pub fn new(one_body: Array2<f64>, two_body: Array4<f64>, constant: f64) -> ChemResult<Self> {
        let n = one_body.nrows();
        if one_body.ncols() != n || two_body.dim() != (n, n, n, n) {
            return Err(ChemError::Dimension(format!(
                "one-body {:?} and two-body {:?} integrals disagree",
                one_body.dim(),
                two_body.dim()
            )));
        }
        if 2 * n > 64 {
            return Err(ChemError::TooManyOrbitals(2 * n));
        }
        Ok(Self {
            one_body,
            two_body,
            constant,
        })
    }

    /// Number of spatial orbitals.
    pub fn n_orbitals(&self) -> usize {
        self.one_body.nrows()
    }

    /// `H |state⟩`.
    pub fn apply(&self, state: &SparseState) -> SparseState {
        let n = self.n_orbitals();
        let mut out = SparseState::default();
        for (&det, &c) in state {
            *out.entry(det).or_insert(0.0) += self.constant * c;
            for_each_single(det, n, |p, q, d, sign| {
                let h = self.one_body[[p, q]];
                if h != 0.0 {
                    *out.entry(d).or_insert(0.0) += h * c * sign;
                }
            });
            for_each_double(det, n, |p, q, r, s, d, sign| {
                let v = self.two_body[[p, q, r, s]];
                if v != 0.0 {
                    *out.entry(d).or_insert(0.0) += 0.5 * v * c * sign;
                }
            });
        }
        out
    }

    /// `⟨state|H|state⟩ / ⟨state|state⟩`.
    pub fn expectation(&self, state: &SparseState) -> f64 {
        let norm = overlap(state, state);
        overlap(state, &self.apply(state)) / norm
    }

    /// Energy from spin-summed density matrices.
    pub fn rdm_energy(&self, one_rdm: &Array2<f64>, two_rdm: &Array4<f64>) -> f64 {
        self.constant + (&self.one_body * one_rdm).sum() + 0.5 * (&self.two_body * two_rdm).sum()
    }

    /// Diagonal Fock elements of the closed-shell reference with `n_occupied` doubly occupied orbitals.
    pub fn orbital_energies(&self, n_occupied: usize) -> Vec<f64> {
        (0..self.n_orbitals())
            .map(|p| {
                self.one_body[[p, p]]
                    + (0..n_occupied)
                        .map(|i| 2.0 * self.two_body[[p, p, i, i]] - self.two_body[[p, i, i, p]])
                        .sum::<f64>()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_ladder_signs() {
        // |0 1 1 0⟩ occupies modes 1 and 2
        let det = 0b0110;
        assert_eq!(annihilate(det, 2), Some((0b0010, -1.0)));
        assert_eq!(annihilate(det, 1), Some((0b0100, 1.0)));
        assert_eq!(create(det, 3), Some((0b1110, 1.0)));
        assert_eq!(create(det, 0), Some((0b0111, 1.0)));
        assert_eq!(create(det, 1), None);
        // a†_0 a_2: annihilate 2 (sign -1), create 0 (sign +1)
        assert_eq!(apply_ladders(det, &[(0, true), (2, false)]), Some((0b0011, -1.0)));
    }

    #[test]
    fn test_reference_rdms() {
        let mut state = SparseState::default();
        state.insert(reference_determinant(2), 1.0);
        let g1 = one_rdm(&state, 2);
        assert_eq!(g1, array![[2.0, 0.0], [0.0, 0.0]]);
        let g2 = two_rdm(&state, 2);
        // both electrons in orbital 0: Γ_0000 = Σ_{σ≠τ} 1 = 2
        assert_eq!(g2[[0, 0, 0, 0]], 2.0);
        assert_eq!(g2.sum(), 2.0);
    }

    #[test]
    fn test_hamiltonian_matches_rdm_energy() {
        let h = array![[-1.2, 0.1], [0.1, -0.4]];
        let eri = Array4::from_shape_fn((2, 2, 2, 2), |(p, q, r, s)| {
            let base = [0.7, 0.2, 0.2, 0.6];
            if (p == q) && (r == s) {
                if p == r { base[3 * p] } else { 0.5 }
            } else if (p != q) && (r != s) {
                base[1]
            } else {
                0.05
            }
        });
        let ham = ElectronicHamiltonian::new(h, eri, 0.3).unwrap();
        let mut state = SparseState::default();
        state.insert(0b0011, 0.9);
        state.insert(0b1100, -0.3);
        state.insert(0b0110, 0.2);
        state.insert(0b1001, -0.2);
        normalize(&mut state);
        let e1 = ham.expectation(&state);
        let e2 = ham.rdm_energy(&one_rdm(&state, 2), &two_rdm(&state, 2));
        assert!((e1 - e2).abs() < 1e-12, "{e1} vs {e2}");
    }
}
