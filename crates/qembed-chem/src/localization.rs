//! Orbital localization: meta-Löwdin and intrinsic atomic orbitals.
//!
//! Both schemes return an orthonormal set of localized orbitals (LOs)
//! spanning the full AO space, each tagged with the atom it belongs to.

use ndarray::{Array2, Axis, s};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::basis::{BasisSet, BasisSetName};
use crate::error::{ChemError, ChemResult};
use crate::integrals::Integrals;
use crate::linalg::{eigh, inverse_sqrt, vec_lowdin};
use crate::molecule::Molecule;
use crate::scf::ScfResult;

/// Localization scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalizationScheme {
    /// Atom-blocked Löwdin pre-orthogonalisation followed by a global Löwdin step.
    #[default]
    MetaLowdin,
    /// Intrinsic atomic orbitals against the `minao` reference basis.
    Iao,
}

impl fmt::Display for LocalizationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LocalizationScheme::MetaLowdin => "meta_lowdin",
            LocalizationScheme::Iao => "iao",
        })
    }
}

impl FromStr for LocalizationScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meta_lowdin" => Ok(LocalizationScheme::MetaLowdin),
            "iao" => Ok(LocalizationScheme::Iao),
            other => Err(format!("unknown localization scheme '{other}'")),
        }
    }
}

/// Localized orbitals in the AO basis.
#[derive(Debug, Clone)]
pub struct LocalizedOrbitals {
    /// AO × LO coefficient matrix, S-orthonormal columns.
    pub coeff: Array2<f64>,
    /// Owning atom of each LO.
    pub atom_of: Vec<usize>,
}

impl LocalizedOrbitals {
    /// Number of localized orbitals.
    pub fn len(&self) -> usize {
        self.atom_of.len()
    }

    /// True when there are no orbitals.
    pub fn is_empty(&self) -> bool {
        self.atom_of.is_empty()
    }

    /// LO indices owned by atoms in `atoms`.
    pub fn orbitals_on_atoms(&self, atoms: std::ops::Range<usize>) -> Vec<usize> {
        self.atom_of
            .iter()
            .enumerate()
            .filter(|(_, a)| atoms.contains(*a))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Localize the AO space of `molecule`.
///
/// `scf` is only consulted by the IAO scheme, which needs the occupied space.
pub fn localize(
    scheme: LocalizationScheme,
    molecule: &Molecule,
    basis: &BasisSet,
    integrals: &Integrals,
    scf: &ScfResult,
) -> ChemResult<LocalizedOrbitals> {
    let lo = match scheme {
        LocalizationScheme::MetaLowdin => meta_lowdin(basis, &integrals.overlap)?,
        LocalizationScheme::Iao => iao(molecule, basis, &integrals.overlap, scf)?,
    };
    tracing::debug!(%scheme, n_orbitals = lo.len(), "localized orbitals");
    Ok(lo)
}

fn meta_lowdin(basis: &BasisSet, overlap: &Array2<f64>) -> ChemResult<LocalizedOrbitals> {
    let n = basis.len();
    let mut pre = Array2::<f64>::zeros((n, n));
    let n_atoms = basis.functions.iter().map(|f| f.atom + 1).max().unwrap_or(0);
    for atom in 0..n_atoms {
        let idx = basis.functions_on_atom(atom);
        if idx.is_empty() {
            continue;
        }
        let block = overlap.select(Axis(0), &idx).select(Axis(1), &idx);
        let x = inverse_sqrt(block.view())?;
        for (a, &i) in idx.iter().enumerate() {
            for (b, &j) in idx.iter().enumerate() {
                pre[[i, j]] = x[[a, b]];
            }
        }
    }
    let coeff = vec_lowdin(pre.view(), overlap.view())?;
    let atom_of = basis.functions.iter().map(|f| f.atom).collect();
    Ok(LocalizedOrbitals { coeff, atom_of })
}

fn iao(
    molecule: &Molecule,
    basis: &BasisSet,
    s1: &Array2<f64>,
    scf: &ScfResult,
) -> ChemResult<LocalizedOrbitals> {
    let minao = BasisSet::build(molecule, BasisSetName::Minao)?;
    let s2 = Integrals::overlap_of(&minao);
    let s12 = Integrals::cross_overlap(basis, &minao);
    let c = scf.occupied_coeff();

    let s1_inv = inverse_sqrt(s1.view())?;
    let s1_inv = s1_inv.dot(&s1_inv);
    let s2_inv = inverse_sqrt(s2.view())?;
    let s2_inv = s2_inv.dot(&s2_inv);

    // P12 = S1⁻¹ S12, C̃ = orth(S1⁻¹ S12 S2⁻¹ S21 C)
    let p12 = s1_inv.dot(&s12);
    let ctilde = p12.dot(&s2_inv).dot(&s12.t()).dot(&c);
    let ctilde = vec_lowdin(ctilde.view(), s1.view())?;

    let ccs1 = c.dot(&c.t()).dot(s1);
    let ccs2 = ctilde.dot(&ctilde.t()).dot(s1);
    let a = &p12 + &(ccs1.dot(&ccs2).dot(&p12) * 2.0) - ccs1.dot(&p12) - ccs2.dot(&p12);
    let iaos = vec_lowdin(a.view(), s1.view())?;

    let mut atom_of: Vec<usize> = minao.functions.iter().map(|f| f.atom).collect();
    let n = basis.len();
    let m = iaos.ncols();
    if m > n {
        return Err(ChemError::Dimension(format!(
            "minao reference has {m} functions but the basis only {n}"
        )));
    }
    if m == n {
        return Ok(LocalizedOrbitals {
            coeff: iaos,
            atom_of,
        });
    }

    // Complement: project the IAO span out of the AO space and keep the rank n-m part.
    let projector = iaos.dot(&iaos.t()).dot(s1);
    let complement = Array2::<f64>::eye(n) - projector;
    let metric = complement.t().dot(s1).dot(&complement);
    let (w, v) = eigh(metric.view())?;
    let keep = v.slice(s![.., m..]).to_owned();
    let scale = w.slice(s![m..]).mapv(|x| 1.0 / x.max(f64::MIN_POSITIVE).sqrt());
    let virt = complement.dot(&keep) * &scale.insert_axis(Axis(0));
    let virt = vec_lowdin(virt.view(), s1.view())?;

    // Mulliken population decides the owning atom of each complement orbital.
    let sv = s1.dot(&virt);
    for k in 0..virt.ncols() {
        let mut best = (0, f64::NEG_INFINITY);
        for atom in 0..molecule.n_atoms() {
            let pop: f64 = basis
                .functions_on_atom(atom)
                .iter()
                .map(|&mu| virt[[mu, k]] * sv[[mu, k]])
                .sum();
            if pop > best.1 {
                best = (atom, pop);
            }
        }
        atom_of.push(best.0);
    }

    let coeff = ndarray::concatenate(Axis(1), &[iaos.view(), virt.view()])
        .map_err(|e| ChemError::Dimension(e.to_string()))?;
    Ok(LocalizedOrbitals { coeff, atom_of })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scf::Rhf;

    fn setup(basis_name: BasisSetName) -> (Molecule, BasisSet, Integrals, ScfResult) {
        let mol = Molecule::from_symbols(
            [("H", [0.0; 3]), ("H", [0.0, 0.0, 0.74]), ("He", [0.0, 1.2, 0.3]), ("H", [0.0, 1.9, 0.0])],
            basis_name,
        )
        .unwrap()
        .with_charge(1);
        let basis = BasisSet::build(&mol, basis_name).unwrap();
        let ints = Integrals::compute(&mol, &basis);
        let h = ints.core_hamiltonian();
        let scf = Rhf::new(&h, &ints.eri, mol.n_electrons().unwrap())
            .with_overlap(ints.overlap.clone())
            .run()
            .unwrap();
        (mol, basis, ints, scf)
    }

    fn assert_orthonormal(lo: &LocalizedOrbitals, s: &Array2<f64>) {
        let m = lo.coeff.t().dot(s).dot(&lo.coeff);
        for i in 0..m.nrows() {
            for j in 0..m.ncols() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((m[[i, j]] - expected).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn test_meta_lowdin_orthonormal_and_tagged() {
        let (mol, basis, ints, scf) = setup(BasisSetName::Basis631g);
        let lo = localize(LocalizationScheme::MetaLowdin, &mol, &basis, &ints, &scf).unwrap();
        assert_eq!(lo.len(), basis.len());
        assert_orthonormal(&lo, &ints.overlap);
        assert_eq!(lo.orbitals_on_atoms(1..2), vec![2, 3]);
    }

    #[test]
    fn test_iao_spans_occupied_space() {
        let (mol, basis, ints, scf) = setup(BasisSetName::Basis631g);
        let lo = localize(LocalizationScheme::Iao, &mol, &basis, &ints, &scf).unwrap();
        assert_eq!(lo.len(), basis.len());
        assert_orthonormal(&lo, &ints.overlap);

        // occupied orbitals lie in the span of the first n_atoms IAOs
        let iaos = lo.coeff.slice(s![.., ..mol.n_atoms()]).to_owned();
        let proj = iaos.dot(&iaos.t()).dot(&ints.overlap);
        let c = scf.occupied_coeff();
        let residual = &c - &proj.dot(&c);
        assert!(residual.iter().all(|x| x.abs() < 1e-8));
    }

    #[test]
    fn test_scheme_names() {
        assert_eq!("iao".parse::<LocalizationScheme>().unwrap(), LocalizationScheme::Iao);
        assert!("boys".parse::<LocalizationScheme>().is_err());
        let s: LocalizationScheme = serde_json::from_str("\"meta_lowdin\"").unwrap();
        assert_eq!(s, LocalizationScheme::MetaLowdin);
    }
}
