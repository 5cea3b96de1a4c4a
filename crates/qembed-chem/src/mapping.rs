//! Fermion-to-qubit mappings.
//!
//! Every mapping here is a binary encoding: qubit values are `q = β·n (mod 2)`
//! for an invertible GF(2) matrix β over mode occupations `n`. From β the
//! creation operator is
//!
//!   a†_j = X_{C(j)} · ½(I + Z_{O(j)}) · Z_{P(j)}
//!
//! where `C(j)` is column j of β (qubits flipped), `O(j)` row j of β⁻¹ (qubits
//! holding n_j) and `P(j)` the qubits holding the parity of modes below j.
//!
//! | Mapping | β |
//! |---------|---|
//! | `jw`    | identity |
//! | `parity`| lower-triangular ones |
//! | `bk`    | Fenwick tree |
//! | `scbk`  | blockwise Fenwick on up-then-down modes, spin-parity rows, two qubits tapered |

use ndarray::{Array2, Array4};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use qembed_ir::{Circuit, QubitId};
use qembed_sim::operator::DEFAULT_TOLERANCE;
use qembed_sim::{PauliOp, PauliString, QubitOperator};

use crate::error::{ChemError, ChemResult};

/// Fermion-to-qubit mapping scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum QubitMapping {
    /// Jordan-Wigner.
    #[default]
    Jw,
    /// Bravyi-Kitaev (Fenwick-tree encoding).
    Bk,
    /// Parity encoding.
    Parity,
    /// Symmetry-conserving Bravyi-Kitaev with two tapered qubits.
    Scbk,
}

impl QubitMapping {
    /// Lowercase label.
    pub fn label(self) -> &'static str {
        match self {
            QubitMapping::Jw => "jw",
            QubitMapping::Bk => "bk",
            QubitMapping::Parity => "parity",
            QubitMapping::Scbk => "scbk",
        }
    }
}

impl fmt::Display for QubitMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QubitMapping {
    type Err = ChemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jw" => Ok(QubitMapping::Jw),
            "bk" => Ok(QubitMapping::Bk),
            "parity" => Ok(QubitMapping::Parity),
            "scbk" => Ok(QubitMapping::Scbk),
            _ => Err(ChemError::Mapping {
                mapping: s.to_string(),
                reason: "expected one of jw, bk, parity, scbk".into(),
            }),
        }
    }
}

impl TryFrom<String> for QubitMapping {
    type Error = ChemError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<QubitMapping> for String {
    fn from(m: QubitMapping) -> Self {
        m.label().to_string()
    }
}

/// Spin label of a spin orbital.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spin {
    /// α.
    Up,
    /// β.
    Down,
}

impl Spin {
    /// Both spins, α first.
    pub const BOTH: [Spin; 2] = [Spin::Up, Spin::Down];
}

/// Maps fermionic operators on `2·n_spatial` modes to qubit operators.
#[derive(Debug, Clone)]
pub struct FermionMapper {
    mapping: QubitMapping,
    n_spatial: usize,
    up_then_down: bool,
    n_electrons: usize,
    beta: Vec<Vec<bool>>,
    creation: Vec<QubitOperator>,
}

impl FermionMapper {
    /// Build a mapper for a closed-shell problem with `n_electrons` electrons.
    pub fn new(
        mapping: QubitMapping,
        n_spatial: usize,
        n_electrons: usize,
        up_then_down: bool,
    ) -> ChemResult<Self> {
        let n = 2 * n_spatial;
        if n > 64 {
            return Err(ChemError::TooManyOrbitals(n));
        }
        if mapping == QubitMapping::Scbk && !up_then_down {
            return Err(ChemError::Mapping {
                mapping: mapping.to_string(),
                reason: "scbk requires up_then_down ordering".into(),
            });
        }
        if n_electrons % 2 != 0 || n_electrons > n {
            return Err(ChemError::Mapping {
                mapping: mapping.to_string(),
                reason: format!("{n_electrons} electrons is not a closed shell in {n} spin orbitals"),
            });
        }
        let beta = encoding_matrix(mapping, n);
        let beta_inv = gf2_inverse(&beta).ok_or_else(|| ChemError::Mapping {
            mapping: mapping.to_string(),
            reason: "encoding matrix is singular".into(),
        })?;
        let creation = (0..n).map(|j| creation_operator(&beta, &beta_inv, j)).collect();
        Ok(Self {
            mapping,
            n_spatial,
            up_then_down,
            n_electrons,
            beta,
            creation,
        })
    }

    /// Mapping scheme.
    pub fn mapping(&self) -> QubitMapping {
        self.mapping
    }

    /// Number of spin orbitals.
    pub fn n_modes(&self) -> usize {
        2 * self.n_spatial
    }

    /// Qubits after tapering.
    pub fn n_qubits(&self) -> usize {
        match self.mapping {
            QubitMapping::Scbk => self.n_modes() - 2,
            _ => self.n_modes(),
        }
    }

    /// Mode index of spatial orbital `p` with spin `spin`.
    pub fn mode(&self, p: usize, spin: Spin) -> usize {
        let s = usize::from(spin == Spin::Down);
        if self.up_then_down {
            p + s * self.n_spatial
        } else {
            2 * p + s
        }
    }

    /// Map a product of ladder operators `(mode, is_creation)`, leftmost first.
    pub fn map_product(&self, factors: &[(usize, bool)]) -> ChemResult<QubitOperator> {
        let mut op = QubitOperator::identity(1.0);
        for &(mode, dagger) in factors {
            let ladder = self.creation.get(mode).ok_or_else(|| ChemError::Dimension(format!(
                "mode {mode} out of range for {} spin orbitals",
                self.n_modes()
            )))?;
            op = if dagger {
                &op * ladder
            } else {
                &op * &ladder.adjoint()
            };
        }
        self.taper(op.compress(DEFAULT_TOLERANCE))
    }

    /// Spin-summed `E_pq = Σ_σ a†_{pσ} a_{qσ}`.
    pub fn one_body(&self, p: usize, q: usize) -> ChemResult<QubitOperator> {
        let mut op = QubitOperator::zero();
        for spin in Spin::BOTH {
            op += &self.map_product(&[(self.mode(p, spin), true), (self.mode(q, spin), false)])?;
        }
        Ok(op.compress(DEFAULT_TOLERANCE))
    }

    /// Spin-summed `e_pqrs = Σ_στ a†_{pσ} a†_{rτ} a_{sτ} a_{qσ}`.
    pub fn two_body(&self, p: usize, q: usize, r: usize, s: usize) -> ChemResult<QubitOperator> {
        let mut op = QubitOperator::zero();
        for sigma in Spin::BOTH {
            for tau in Spin::BOTH {
                op += &self.map_product(&[
                    (self.mode(p, sigma), true),
                    (self.mode(r, tau), true),
                    (self.mode(s, tau), false),
                    (self.mode(q, sigma), false),
                ])?;
            }
        }
        Ok(op.compress(DEFAULT_TOLERANCE))
    }

    /// `E₀ + Σ h_pq E_pq + ½ Σ (pq|rs) e_pqrs`.
    pub fn hamiltonian(
        &self,
        one_body: &Array2<f64>,
        two_body: &Array4<f64>,
        constant: f64,
    ) -> ChemResult<QubitOperator> {
        let n = self.n_spatial;
        let mut h = QubitOperator::identity(constant);
        for p in 0..n {
            for q in 0..n {
                let c = one_body[[p, q]];
                if c.abs() > DEFAULT_TOLERANCE {
                    h += &self.one_body(p, q)?.scale(c);
                }
            }
        }
        for p in 0..n {
            for q in 0..n {
                for r in 0..n {
                    for s in 0..n {
                        let c = two_body[[p, q, r, s]];
                        if c.abs() > DEFAULT_TOLERANCE {
                            h += &self.two_body(p, q, r, s)?.scale(0.5 * c);
                        }
                    }
                }
            }
        }
        let h = h.compress(DEFAULT_TOLERANCE);
        tracing::debug!(mapping = %self.mapping, n_terms = h.n_terms(), n_qubits = self.n_qubits(), "qubit hamiltonian");
        Ok(h)
    }

    /// Qubit values of the Hartree-Fock determinant (lowest orbitals filled).
    pub fn hf_qubits(&self) -> Vec<bool> {
        let n = self.n_modes();
        let n_occ = self.n_electrons / 2;
        let mut occupation = vec![false; n];
        for p in 0..n_occ {
            for spin in Spin::BOTH {
                occupation[self.mode(p, spin)] = true;
            }
        }
        let qubits: Vec<bool> = (0..n)
            .map(|k| {
                (0..n)
                    .filter(|&j| self.beta[k][j] && occupation[j])
                    .count()
                    % 2
                    == 1
            })
            .collect();
        match self.mapping {
            QubitMapping::Scbk => qubits
                .into_iter()
                .enumerate()
                .filter(|(k, _)| self.tapered_index(*k as u32).is_some())
                .map(|(_, b)| b)
                .collect(),
            _ => qubits,
        }
    }

    /// X gates preparing the Hartree-Fock state from |0…0⟩.
    pub fn hf_circuit(&self) -> ChemResult<Circuit> {
        let mut circuit = Circuit::with_width(self.n_qubits() as u32);
        for (q, set) in self.hf_qubits().into_iter().enumerate() {
            if set {
                circuit
                    .x(QubitId(q as u32))
                    .map_err(|e| ChemError::Sim(e.into()))?;
            }
        }
        Ok(circuit)
    }

    /// Position of an untapered qubit after tapering; `None` for tapered qubits.
    fn tapered_index(&self, q: u32) -> Option<u32> {
        let m = self.n_spatial as u32;
        let n = 2 * m;
        if q == m - 1 || q == n - 1 {
            None
        } else if q < m - 1 {
            Some(q)
        } else {
            Some(q - 1)
        }
    }

    fn taper(&self, op: QubitOperator) -> ChemResult<QubitOperator> {
        if self.mapping != QubitMapping::Scbk {
            return Ok(op);
        }
        let m = self.n_spatial as u32;
        let n_up = (self.n_electrons / 2) as u32;
        let n_total = self.n_electrons as u32;
        let mut out = QubitOperator::zero();
        for (pauli, coeff) in op.terms() {
            let (mapped, dropped) = pauli
                .remap(|q| self.tapered_index(q))
                .ok_or_else(|| ChemError::Mapping {
                    mapping: self.mapping.to_string(),
                    reason: format!("term {pauli} does not conserve the tapered parities"),
                })?;
            let mut sign = 1.0;
            for q in dropped {
                let parity = if q == m - 1 { n_up } else { n_total };
                if parity % 2 == 1 {
                    sign = -sign;
                }
            }
            out.add_term(mapped, *coeff * sign);
        }
        Ok(out.compress(DEFAULT_TOLERANCE))
    }
}

/// β for `mapping` on `n` modes.
fn encoding_matrix(mapping: QubitMapping, n: usize) -> Vec<Vec<bool>> {
    match mapping {
        QubitMapping::Jw => (0..n).map(|j| (0..n).map(|k| j == k).collect()).collect(),
        QubitMapping::Parity => (0..n).map(|j| (0..n).map(|k| k <= j).collect()).collect(),
        QubitMapping::Bk => fenwick(n),
        QubitMapping::Scbk => {
            let m = n / 2;
            let block = fenwick(m);
            let mut beta = vec![vec![false; n]; n];
            for j in 0..m {
                for k in 0..m {
                    beta[j][k] = block[j][k];
                    beta[m + j][m + k] = block[j][k];
                }
            }
            for k in 0..m {
                beta[m - 1][k] = true;
            }
            for k in 0..n {
                beta[n - 1][k] = true;
            }
            beta
        }
    }
}

/// Fenwick encoding: qubit j stores the parity of modes `j+1-lowbit(j+1) ..= j`.
fn fenwick(n: usize) -> Vec<Vec<bool>> {
    (0..n)
        .map(|j| {
            let low = (j + 1) & (j + 1).wrapping_neg();
            let start = j + 1 - low;
            (0..n).map(|k| (start..=j).contains(&k)).collect()
        })
        .collect()
}

/// Gauss-Jordan inverse over GF(2).
fn gf2_inverse(m: &[Vec<bool>]) -> Option<Vec<Vec<bool>>> {
    let n = m.len();
    let mut a: Vec<Vec<bool>> = m.to_vec();
    let mut inv: Vec<Vec<bool>> = (0..n).map(|i| (0..n).map(|j| i == j).collect()).collect();
    for col in 0..n {
        let pivot = (col..n).find(|&r| a[r][col])?;
        a.swap(col, pivot);
        inv.swap(col, pivot);
        for r in 0..n {
            if r != col && a[r][col] {
                for c in 0..n {
                    a[r][c] ^= a[col][c];
                    inv[r][c] ^= inv[col][c];
                }
            }
        }
    }
    Some(inv)
}

fn creation_operator(beta: &[Vec<bool>], beta_inv: &[Vec<bool>], j: usize) -> QubitOperator {
    let n = beta.len();
    let flip: Vec<u32> = (0..n).filter(|&k| beta[k][j]).map(|k| k as u32).collect();
    let occupation: Vec<u32> = (0..n).filter(|&k| beta_inv[j][k]).map(|k| k as u32).collect();
    let parity: Vec<u32> = (0..n)
        .filter(|&k| (0..j).filter(|&i| beta_inv[i][k]).count() % 2 == 1)
        .map(|k| k as u32)
        .collect();

    let x = QubitOperator::from_term(
        PauliString::from_ops(flip.into_iter().map(|q| (q, PauliOp::X))),
        1.0,
    );
    let mut projector = QubitOperator::identity(0.5);
    projector.add_term(PauliString::zz(occupation), Complex64::new(0.5, 0.0));
    let z = QubitOperator::from_term(PauliString::zz(parity), 1.0);
    &(&x * &projector) * &z
}
