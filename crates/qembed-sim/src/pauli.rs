//! Pauli operators and Pauli strings.
//!
//! A Pauli string is a tensor product of single-qubit Pauli operators,
//! stored sparsely as sorted `(qubit, op)` pairs with identities omitted.
//! Its text form lists the non-identity factors, e.g. `X0 Y1 Z3`, and the
//! identity string is written `I`.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SimError;

/// Single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PauliOp {
    /// Identity.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
}

impl PauliOp {
    /// Product `self · other` as `(phase, op)`.
    pub fn product(self, other: PauliOp) -> (Complex64, PauliOp) {
        let one = Complex64::new(1.0, 0.0);
        let i = Complex64::new(0.0, 1.0);
        match (self, other) {
            (PauliOp::I, p) | (p, PauliOp::I) => (one, p),
            (a, b) if a == b => (one, PauliOp::I),
            (PauliOp::X, PauliOp::Y) => (i, PauliOp::Z),
            (PauliOp::Y, PauliOp::X) => (-i, PauliOp::Z),
            (PauliOp::Y, PauliOp::Z) => (i, PauliOp::X),
            (PauliOp::Z, PauliOp::Y) => (-i, PauliOp::X),
            (PauliOp::Z, PauliOp::X) => (i, PauliOp::Y),
            (PauliOp::X, PauliOp::Z) => (-i, PauliOp::Y),
            _ => (one, PauliOp::I),
        }
    }

    fn symbol(self) -> char {
        match self {
            PauliOp::I => 'I',
            PauliOp::X => 'X',
            PauliOp::Y => 'Y',
            PauliOp::Z => 'Z',
        }
    }
}

/// A tensor product of Pauli operators on indexed qubits.
///
/// Qubits not listed are implicitly I.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PauliString {
    /// Non-identity terms, sorted by qubit index ascending.
    ops: Vec<(u32, PauliOp)>,
}

impl PauliString {
    /// The identity string.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Construct a PauliString from an iterator of (qubit, op) pairs.
    ///
    /// Identity operators are dropped and the rest are sorted by qubit. A
    /// qubit listed twice keeps its last operator.
    pub fn from_ops(ops: impl IntoIterator<Item = (u32, PauliOp)>) -> Self {
        let mut v: Vec<(u32, PauliOp)> = Vec::new();
        for (q, op) in ops {
            v.retain(|(existing, _)| *existing != q);
            if op != PauliOp::I {
                v.push((q, op));
            }
        }
        v.sort_by_key(|(q, _)| *q);
        Self { ops: v }
    }

    /// A Z⊗Z⊗...⊗Z string spanning the given qubits.
    pub fn zz(qubits: impl IntoIterator<Item = u32>) -> Self {
        Self::from_ops(qubits.into_iter().map(|q| (q, PauliOp::Z)))
    }

    /// Return the non-identity (qubit, op) pairs, sorted by qubit index.
    pub fn ops(&self) -> &[(u32, PauliOp)] {
        &self.ops
    }

    /// Operator acting on `qubit`.
    pub fn op_at(&self, qubit: u32) -> PauliOp {
        self.ops
            .binary_search_by_key(&qubit, |(q, _)| *q)
            .map_or(PauliOp::I, |i| self.ops[i].1)
    }

    /// True if there are no non-identity operators.
    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of non-identity factors.
    pub fn weight(&self) -> usize {
        self.ops.len()
    }

    /// The highest qubit index referenced, or `None` for an identity string.
    pub fn max_qubit(&self) -> Option<u32> {
        self.ops.last().map(|(q, _)| *q)
    }

    /// Product `self · other` as `(phase, string)`.
    pub fn product(&self, other: &PauliString) -> (Complex64, PauliString) {
        let mut phase = Complex64::new(1.0, 0.0);
        let mut ops = Vec::with_capacity(self.ops.len() + other.ops.len());
        let (mut a, mut b) = (0, 0);
        while a < self.ops.len() || b < other.ops.len() {
            match (self.ops.get(a), other.ops.get(b)) {
                (Some(&(qa, pa)), Some(&(qb, pb))) if qa == qb => {
                    let (p, op) = pa.product(pb);
                    phase *= p;
                    if op != PauliOp::I {
                        ops.push((qa, op));
                    }
                    a += 1;
                    b += 1;
                }
                (Some(&(qa, pa)), Some(&(qb, _))) if qa < qb => {
                    ops.push((qa, pa));
                    a += 1;
                }
                (Some(&(qa, pa)), None) => {
                    ops.push((qa, pa));
                    a += 1;
                }
                (_, Some(&(qb, pb))) => {
                    ops.push((qb, pb));
                    b += 1;
                }
                (None, None) => break,
            }
        }
        (phase, Self { ops })
    }

    /// Bit masks `(x_mask, z_mask)` in the symplectic representation.
    ///
    /// X sets the x bit, Z the z bit, and Y sets both.
    pub fn masks(&self) -> (u64, u64) {
        let mut x = 0u64;
        let mut z = 0u64;
        for &(q, op) in &self.ops {
            let bit = 1u64 << q;
            match op {
                PauliOp::X => x |= bit,
                PauliOp::Y => {
                    x |= bit;
                    z |= bit;
                }
                PauliOp::Z => z |= bit,
                PauliOp::I => {}
            }
        }
        (x, z)
    }

    /// Relabel qubits; factors mapped to `None` must be I or Z and are dropped.
    ///
    /// Returns the relabelled string and the qubits whose Z factor was
    /// dropped, or `None` if a dropped qubit carried X or Y.
    pub fn remap(&self, map: impl Fn(u32) -> Option<u32>) -> Option<(PauliString, Vec<u32>)> {
        let mut ops = Vec::with_capacity(self.ops.len());
        let mut dropped = Vec::new();
        for &(q, op) in &self.ops {
            match map(q) {
                Some(new_q) => ops.push((new_q, op)),
                None if op == PauliOp::Z => dropped.push(q),
                None => return None,
            }
        }
        Some((Self::from_ops(ops), dropped))
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ops.is_empty() {
            return f.write_str("I");
        }
        for (i, (q, op)) in self.ops.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}{q}", op.symbol())?;
        }
        Ok(())
    }
}

impl FromStr for PauliString {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "I" {
            return Ok(Self::identity());
        }
        let mut ops = Vec::new();
        for factor in trimmed.split_whitespace() {
            let mut chars = factor.chars();
            let op = match chars.next() {
                Some('X') => PauliOp::X,
                Some('Y') => PauliOp::Y,
                Some('Z') => PauliOp::Z,
                _ => return Err(SimError::InvalidPauliString(s.to_string())),
            };
            let qubit: u32 = chars
                .as_str()
                .parse()
                .map_err(|_| SimError::InvalidPauliString(s.to_string()))?;
            ops.push((qubit, op));
        }
        Ok(Self::from_ops(ops))
    }
}

impl From<PauliString> for String {
    fn from(p: PauliString) -> Self {
        p.to_string()
    }
}

impl TryFrom<String> for PauliString {
    type Error = SimError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
