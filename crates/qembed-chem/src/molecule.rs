//! Molecular geometry, charge and spin.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::basis::BasisSetName;
use crate::error::{ChemError, ChemResult};

/// Bohr radius in Ångström.
pub const BOHR_IN_ANGSTROM: f64 = 0.529_177_210_92;

/// Chemical element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Element {
    /// Hydrogen.
    H,
    /// Helium.
    He,
}

impl Element {
    /// Nuclear charge.
    pub fn atomic_number(self) -> u32 {
        match self {
            Element::H => 1,
            Element::He => 2,
        }
    }

    /// Element symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Element::H => "H",
            Element::He => "He",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Element {
    type Err = ChemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H" => Ok(Element::H),
            "He" => Ok(Element::He),
            other => Err(ChemError::UnknownElement(other.to_string())),
        }
    }
}

impl TryFrom<String> for Element {
    type Error = ChemError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Element> for String {
    fn from(e: Element) -> Self {
        e.symbol().to_string()
    }
}

/// Unit of the input coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    /// Ångström (default).
    #[default]
    Angstrom,
    /// Bohr.
    Bohr,
}

/// One nucleus: element and position.
///
/// Serialized as `[symbol, [x, y, z]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Element, [f64; 3])", into = "(Element, [f64; 3])")]
pub struct Atom {
    /// Element.
    pub element: Element,
    /// Position in the molecule's length unit.
    pub position: [f64; 3],
}

impl From<(Element, [f64; 3])> for Atom {
    fn from((element, position): (Element, [f64; 3])) -> Self {
        Self { element, position }
    }
}

impl From<Atom> for (Element, [f64; 3]) {
    fn from(a: Atom) -> Self {
        (a.element, a.position)
    }
}

/// A molecule: atoms, total charge, spin (2S) and basis-set label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Molecule {
    /// Nuclei.
    pub atoms: Vec<Atom>,
    /// Net charge.
    #[serde(default)]
    pub charge: i32,
    /// Number of unpaired electrons (2S).
    #[serde(default)]
    pub spin: u32,
    /// Basis set.
    #[serde(default)]
    pub basis: BasisSetName,
    /// Coordinate unit.
    #[serde(default)]
    pub unit: LengthUnit,
}

impl Molecule {
    /// Build a neutral singlet from `(symbol, position in Å)` pairs.
    pub fn from_symbols<'a>(
        atoms: impl IntoIterator<Item = (&'a str, [f64; 3])>,
        basis: BasisSetName,
    ) -> ChemResult<Self> {
        let atoms = atoms
            .into_iter()
            .map(|(s, position)| {
                Ok(Atom {
                    element: s.parse()?,
                    position,
                })
            })
            .collect::<ChemResult<Vec<_>>>()?;
        Ok(Self {
            atoms,
            charge: 0,
            spin: 0,
            basis,
            unit: LengthUnit::Angstrom,
        })
    }

    /// Set the net charge.
    pub fn with_charge(mut self, charge: i32) -> Self {
        self.charge = charge;
        self
    }

    /// Number of atoms.
    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Nuclear positions in Bohr.
    pub fn coords_bohr(&self) -> Vec<[f64; 3]> {
        let scale = match self.unit {
            LengthUnit::Angstrom => 1.0 / BOHR_IN_ANGSTROM,
            LengthUnit::Bohr => 1.0,
        };
        self.atoms
            .iter()
            .map(|a| a.position.map(|x| x * scale))
            .collect()
    }

    /// Total electron count after applying the charge.
    pub fn n_electrons(&self) -> ChemResult<usize> {
        let nuclear: i64 = self
            .atoms
            .iter()
            .map(|a| i64::from(a.element.atomic_number()))
            .sum();
        let n = nuclear - i64::from(self.charge);
        if n < 0 || (n - i64::from(self.spin)) % 2 != 0 || i64::from(self.spin) > n {
            return Err(ChemError::InvalidElectronCount {
                n_electrons: n,
                spin: self.spin,
            });
        }
        Ok(n as usize)
    }

    /// Σ_{A<B} Z_A Z_B / R_AB in Hartree.
    pub fn nuclear_repulsion(&self) -> f64 {
        let coords = self.coords_bohr();
        let mut e = 0.0;
        for a in 0..self.atoms.len() {
            for b in 0..a {
                let r = distance(&coords[a], &coords[b]);
                let za = f64::from(self.atoms[a].element.atomic_number());
                let zb = f64::from(self.atoms[b].element.atomic_number());
                e += za * zb / r;
            }
        }
        e
    }
}

pub(crate) fn distance_sqr(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    (0..3).map(|k| (a[k] - b[k]).powi(2)).sum()
}

pub(crate) fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    distance_sqr(a, b).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_h2_counts() {
        let mol = Molecule::from_symbols(
            [("H", [0.0, 0.0, 0.0]), ("H", [0.0, 0.0, 0.74])],
            BasisSetName::Sto3g,
        )
        .unwrap();
        assert_eq!(mol.n_electrons().unwrap(), 2);
        let expected = BOHR_IN_ANGSTROM / 0.74;
        assert!((mol.nuclear_repulsion() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_charge_parity_checked() {
        let mol = Molecule::from_symbols([("H", [0.0; 3])], BasisSetName::Sto3g).unwrap();
        assert!(mol.n_electrons().is_err());
        assert_eq!(mol.clone().with_charge(1).n_electrons().unwrap(), 0);
    }

    #[test]
    fn test_unknown_element() {
        assert!(matches!(
            "Li".parse::<Element>(),
            Err(ChemError::UnknownElement(s)) if s == "Li"
        ));
    }

    #[test]
    fn test_deserialize_atom_list() {
        let json = r#"{"atoms": [["H", [0.0, 0.0, 0.0]], ["He", [0.0, 0.0, 1.0]]], "spin": 1, "basis": "6-31g"}"#;
        let mol: Molecule = serde_json::from_str(json).unwrap();
        assert_eq!(mol.atoms[1].element, Element::He);
        assert_eq!(mol.basis, BasisSetName::Basis631g);
        assert_eq!(mol.unit, LengthUnit::Angstrom);
        assert_eq!(mol.n_electrons().unwrap(), 3);
    }
}
