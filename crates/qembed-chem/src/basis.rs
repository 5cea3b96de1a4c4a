//! Contracted s-type Gaussian basis sets.
//!
//! Each basis function is `φ(r) = Σ_k d_k N(α_k) exp(-α_k |r - A|²)` with
//! primitive normalisation `N(α) = (2α/π)^{3/4}`; the contraction
//! coefficients are rescaled so that ⟨φ|φ⟩ = 1.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::{ChemError, ChemResult};
use crate::molecule::{Element, Molecule};

/// Supported basis-set labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BasisSetName {
    /// STO-3G minimal basis.
    #[default]
    Sto3g,
    /// Split-valence 6-31G.
    Basis631g,
    /// Minimal atomic-orbital reference basis used by IAO localization.
    Minao,
}

impl BasisSetName {
    /// Canonical lowercase label.
    pub fn label(self) -> &'static str {
        match self {
            BasisSetName::Sto3g => "sto-3g",
            BasisSetName::Basis631g => "6-31g",
            BasisSetName::Minao => "minao",
        }
    }
}

impl fmt::Display for BasisSetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BasisSetName {
    type Err = ChemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "sto-3g" | "sto3g" => Ok(BasisSetName::Sto3g),
            "6-31g" | "631g" => Ok(BasisSetName::Basis631g),
            "minao" => Ok(BasisSetName::Minao),
            _ => Err(ChemError::UnknownBasis(s.to_string())),
        }
    }
}

impl TryFrom<String> for BasisSetName {
    type Error = ChemError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BasisSetName> for String {
    fn from(b: BasisSetName) -> Self {
        b.label().to_string()
    }
}

/// `(exponents, contraction coefficients)` of one s shell.
type ShellData = (&'static [f64], &'static [f64]);

const STO3G_COEFFS: [f64; 3] = [0.154_328_97, 0.535_328_14, 0.444_634_54];

fn shells(basis: BasisSetName, element: Element) -> &'static [ShellData] {
    match (basis, element) {
        (BasisSetName::Sto3g, Element::H) => &[(&[3.425_250_91, 0.623_913_73, 0.168_855_40], &STO3G_COEFFS)],
        (BasisSetName::Sto3g, Element::He) => &[(&[6.362_421_39, 1.158_923_00, 0.313_649_79], &STO3G_COEFFS)],
        (BasisSetName::Basis631g, Element::H) => &[
            (
                &[18.731_137_0, 2.825_393_7, 0.640_121_7],
                &[0.033_494_60, 0.234_726_95, 0.813_757_33],
            ),
            (&[0.161_277_8], &[1.0]),
        ],
        (BasisSetName::Basis631g, Element::He) => &[
            (
                &[38.421_634_0, 5.778_030_0, 1.241_774_0],
                &[0.023_766_0, 0.154_679_0, 0.469_630_0],
            ),
            (&[0.297_964_0], &[1.0]),
        ],
        (BasisSetName::Minao, Element::H) => &[(
            &[33.865_014, 5.094_788, 1.158_786, 0.325_840, 0.102_741],
            &[0.006_068, 0.045_308, 0.202_822, 0.503_903, 0.383_421],
        )],
        (BasisSetName::Minao, Element::He) => &[(
            &[38.360_000, 5.770_000, 1.240_000, 0.297_600],
            &[0.023_809, 0.154_891, 0.469_987, 0.513_027],
        )],
    }
}

/// One normalised contracted s function.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisFunction {
    /// Index of the owning atom.
    pub atom: usize,
    /// Centre in Bohr.
    pub center: [f64; 3],
    /// Primitive exponents.
    pub exponents: Vec<f64>,
    /// Coefficients multiplying *normalised* primitives.
    pub coefficients: Vec<f64>,
}

impl BasisFunction {
    fn new(atom: usize, center: [f64; 3], exponents: &[f64], coefficients: &[f64]) -> Self {
        let mut f = Self {
            atom,
            center,
            exponents: exponents.to_vec(),
            coefficients: coefficients.to_vec(),
        };
        let norm = f.self_overlap().sqrt();
        for c in &mut f.coefficients {
            *c /= norm;
        }
        f
    }

    /// Iterate `(α, d·N(α))` pairs.
    pub fn primitives(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.exponents
            .iter()
            .zip(&self.coefficients)
            .map(|(&a, &d)| (a, d * primitive_norm(a)))
    }

    fn self_overlap(&self) -> f64 {
        let mut s = 0.0;
        for (a, ca) in self.primitives() {
            for (b, cb) in self.primitives() {
                s += ca * cb * (PI / (a + b)).powf(1.5);
            }
        }
        s
    }
}

/// `(2α/π)^{3/4}`.
pub fn primitive_norm(alpha: f64) -> f64 {
    (2.0 * alpha / PI).powf(0.75)
}

/// An ordered list of basis functions for a molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisSet {
    /// Label it was built from.
    pub name: BasisSetName,
    /// Functions in atom order.
    pub functions: Vec<BasisFunction>,
}

impl BasisSet {
    /// Place `name` on every atom of `molecule`.
    pub fn build(molecule: &Molecule, name: BasisSetName) -> ChemResult<Self> {
        let coords = molecule.coords_bohr();
        let mut functions = Vec::new();
        for (i, (atom, center)) in molecule.atoms.iter().zip(coords).enumerate() {
            for (exps, coefs) in shells(name, atom.element) {
                functions.push(BasisFunction::new(i, center, exps, coefs));
            }
        }
        Ok(Self { name, functions })
    }

    /// Number of functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// True when no functions are present.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Indices of the functions centred on `atom`.
    pub fn functions_on_atom(&self, atom: usize) -> Vec<usize> {
        self.functions
            .iter()
            .enumerate()
            .filter(|(_, f)| f.atom == atom)
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h2(basis: BasisSetName) -> Molecule {
        Molecule::from_symbols([("H", [0.0; 3]), ("H", [0.0, 0.0, 0.74])], basis).unwrap()
    }

    #[test]
    fn test_functions_are_normalised() {
        for name in [BasisSetName::Sto3g, BasisSetName::Basis631g, BasisSetName::Minao] {
            let basis = BasisSet::build(&h2(name), name).unwrap();
            for f in &basis.functions {
                assert!((f.self_overlap() - 1.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_function_counts() {
        assert_eq!(BasisSet::build(&h2(BasisSetName::Sto3g), BasisSetName::Sto3g).unwrap().len(), 2);
        let split = BasisSet::build(&h2(BasisSetName::Basis631g), BasisSetName::Basis631g).unwrap();
        assert_eq!(split.len(), 4);
        assert_eq!(split.functions_on_atom(1), vec![2, 3]);
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!("STO-3G".parse::<BasisSetName>().unwrap(), BasisSetName::Sto3g);
        assert_eq!("6-31G".parse::<BasisSetName>().unwrap(), BasisSetName::Basis631g);
        assert!("cc-pvdz".parse::<BasisSetName>().is_err());
    }
}
