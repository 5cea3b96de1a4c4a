//! Qubit operators: complex-weighted sums of Pauli strings.
//!
//!   O = Σ_k  c_k · P_k,   c_k ∈ ℂ
//!
//! Terms are kept in a `BTreeMap` keyed by Pauli string, so iteration order
//! is deterministic and like terms are merged on insertion.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Mul};

use crate::pauli::PauliString;

/// Coefficients below this magnitude are treated as zero by [`QubitOperator::compress`].
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// A sum of Pauli strings with complex coefficients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QubitOperator {
    terms: BTreeMap<PauliString, Complex64>,
}

impl QubitOperator {
    /// The zero operator.
    pub fn zero() -> Self {
        Self::default()
    }

    /// `coeff · I`.
    pub fn identity(coeff: impl Into<Complex64>) -> Self {
        Self::from_term(PauliString::identity(), coeff)
    }

    /// A single weighted Pauli string.
    pub fn from_term(pauli: PauliString, coeff: impl Into<Complex64>) -> Self {
        let mut op = Self::zero();
        op.add_term(pauli, coeff);
        op
    }

    /// Add `coeff · pauli`, merging with an existing term.
    pub fn add_term(&mut self, pauli: PauliString, coeff: impl Into<Complex64>) {
        *self.terms.entry(pauli).or_insert(Complex64::new(0.0, 0.0)) += coeff.into();
    }

    /// Terms in Pauli-string order.
    pub fn terms(&self) -> impl Iterator<Item = (&PauliString, &Complex64)> {
        self.terms.iter()
    }

    /// Number of stored terms.
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// True when the operator has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Coefficient of a Pauli string (zero when absent).
    pub fn coefficient(&self, pauli: &PauliString) -> Complex64 {
        self.terms
            .get(pauli)
            .copied()
            .unwrap_or(Complex64::new(0.0, 0.0))
    }

    /// Coefficient of the identity string.
    pub fn constant(&self) -> Complex64 {
        self.coefficient(&PauliString::identity())
    }

    /// Multiply every coefficient by `factor`.
    pub fn scale(mut self, factor: impl Into<Complex64>) -> Self {
        let factor = factor.into();
        for c in self.terms.values_mut() {
            *c *= factor;
        }
        self
    }

    /// Hermitian conjugate.
    pub fn adjoint(&self) -> Self {
        Self {
            terms: self
                .terms
                .iter()
                .map(|(p, c)| (p.clone(), c.conj()))
                .collect(),
        }
    }

    /// Drop negligible real/imaginary parts and then negligible terms.
    pub fn compress(mut self, tolerance: f64) -> Self {
        self.terms.retain(|_, c| {
            if c.re.abs() < tolerance {
                c.re = 0.0;
            }
            if c.im.abs() < tolerance {
                c.im = 0.0;
            }
            c.norm() >= tolerance
        });
        self
    }

    /// Number of qubits spanned (highest index + 1).
    pub fn n_qubits(&self) -> u32 {
        self.terms
            .keys()
            .filter_map(PauliString::max_qubit)
            .max()
            .map_or(0, |q| q + 1)
    }

    /// Whether every coefficient is real to within `tolerance`.
    pub fn is_real(&self, tolerance: f64) -> bool {
        self.terms.values().all(|c| c.im.abs() <= tolerance)
    }

    /// Σ |c_k| over all terms.
    pub fn one_norm(&self) -> f64 {
        self.terms.values().map(|c| c.norm()).sum()
    }
}

impl FromIterator<(PauliString, Complex64)> for QubitOperator {
    fn from_iter<T: IntoIterator<Item = (PauliString, Complex64)>>(iter: T) -> Self {
        let mut op = Self::zero();
        for (p, c) in iter {
            op.add_term(p, c);
        }
        op
    }
}

impl AddAssign<&QubitOperator> for QubitOperator {
    fn add_assign(&mut self, rhs: &QubitOperator) {
        for (p, c) in &rhs.terms {
            self.add_term(p.clone(), *c);
        }
    }
}

impl Add<&QubitOperator> for QubitOperator {
    type Output = QubitOperator;

    fn add(mut self, rhs: &QubitOperator) -> QubitOperator {
        self += rhs;
        self
    }
}

impl Mul<&QubitOperator> for &QubitOperator {
    type Output = QubitOperator;

    fn mul(self, rhs: &QubitOperator) -> QubitOperator {
        let mut out = QubitOperator::zero();
        for (pa, ca) in &self.terms {
            for (pb, cb) in &rhs.terms {
                let (phase, p) = pa.product(pb);
                out.add_term(p, phase * ca * cb);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pauli::PauliOp;

    fn x0() -> PauliString {
        PauliString::from_ops([(0, PauliOp::X)])
    }

    fn y0() -> PauliString {
        PauliString::from_ops([(0, PauliOp::Y)])
    }

    #[test]
    fn test_like_terms_merge() {
        let mut op = QubitOperator::from_term(x0(), 0.5);
        op.add_term(x0(), 0.25);
        assert_eq!(op.n_terms(), 1);
        assert_eq!(op.coefficient(&x0()), Complex64::new(0.75, 0.0));
    }

    #[test]
    fn test_raising_operator_squares_to_zero() {
        // σ⁺ = (X - iY)/2 on qubit 0
        let mut raise = QubitOperator::from_term(x0(), 0.5);
        raise.add_term(y0(), Complex64::new(0.0, -0.5));
        let square = (&raise * &raise).compress(DEFAULT_TOLERANCE);
        assert!(square.is_empty());
    }

    #[test]
    fn test_number_operator() {
        // σ⁺σ⁻ = (I - Z)/2
        let mut raise = QubitOperator::from_term(x0(), 0.5);
        raise.add_term(y0(), Complex64::new(0.0, -0.5));
        let number = (&raise * &raise.adjoint()).compress(DEFAULT_TOLERANCE);
        assert_eq!(number.n_terms(), 2);
        assert!((number.constant() - Complex64::new(0.5, 0.0)).norm() < 1e-12);
        let z0 = PauliString::from_ops([(0, PauliOp::Z)]);
        assert!((number.coefficient(&z0) - Complex64::new(-0.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_compress_drops_small_parts() {
        let mut op = QubitOperator::from_term(x0(), Complex64::new(1.0, 1e-12));
        op.add_term(y0(), 1e-10);
        let op = op.compress(DEFAULT_TOLERANCE);
        assert_eq!(op.n_terms(), 1);
        assert!(op.is_real(0.0));
    }

    #[test]
    fn test_n_qubits() {
        let op = QubitOperator::from_term(PauliString::zz([0, 4]), 1.0) + &QubitOperator::identity(2.0);
        assert_eq!(op.n_qubits(), 5);
        assert_eq!(op.constant(), Complex64::new(2.0, 0.0));
    }
}
