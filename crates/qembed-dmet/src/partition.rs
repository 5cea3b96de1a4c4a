//! Fragment partitioner: contiguous atom blocks and their localized orbitals.

use serde::Serialize;
use std::ops::Range;

use qembed_chem::{LocalizedOrbitals, Molecule};

use crate::error::{DmetError, DmetResult};

/// A contiguous block of atoms and the localized orbitals they own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    /// Position in the fragment list.
    pub index: usize,
    /// Atom indices.
    pub atoms: Range<usize>,
    /// Localized-orbital indices owned by `atoms`.
    pub orbitals: Vec<usize>,
}

impl Fragment {
    /// Number of atoms.
    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Number of fragment orbitals.
    pub fn n_orbitals(&self) -> usize {
        self.orbitals.len()
    }
}

/// Check that `counts` is a non-empty list of positive atom counts summing to `n_atoms`.
pub fn validate_fragment_atoms(n_atoms: usize, counts: &[usize]) -> DmetResult<()> {
    if counts.is_empty() {
        return Err(DmetError::Partition("fragment list is empty".into()));
    }
    if let Some(pos) = counts.iter().position(|&c| c == 0) {
        return Err(DmetError::Partition(format!("fragment {pos} has no atoms")));
    }
    let total: usize = counts.iter().sum();
    if total != n_atoms {
        return Err(DmetError::Partition(format!(
            "fragment atom counts {counts:?} sum to {total}, molecule has {n_atoms} atoms"
        )));
    }
    Ok(())
}

/// Split the localized orbitals of `molecule` into fragments of `counts` atoms each.
pub fn partition(
    molecule: &Molecule,
    orbitals: &LocalizedOrbitals,
    counts: &[usize],
) -> DmetResult<Vec<Fragment>> {
    validate_fragment_atoms(molecule.n_atoms(), counts)?;
    let mut start = 0;
    let mut fragments = Vec::with_capacity(counts.len());
    for (index, &count) in counts.iter().enumerate() {
        let atoms = start..start + count;
        start += count;
        let owned = orbitals.orbitals_on_atoms(atoms.clone());
        if owned.is_empty() {
            return Err(DmetError::Partition(format!(
                "fragment {index} (atoms {atoms:?}) owns no localized orbitals"
            )));
        }
        tracing::debug!(index, ?atoms, n_orbitals = owned.len(), "fragment");
        fragments.push(Fragment {
            index,
            atoms,
            orbitals: owned,
        });
    }
    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ndarray::Array2;
    use qembed_chem::BasisSetName;

    fn chain(n: usize) -> (Molecule, LocalizedOrbitals) {
        let mol = Molecule::from_symbols(
            (0..n).map(|i| ("H", [0.0, 0.0, i as f64])),
            BasisSetName::Basis631g,
        )
        .unwrap();
        // two orbitals per atom, owner order deliberately not sorted
        let mut atom_of: Vec<usize> = (0..n).collect();
        atom_of.extend(0..n);
        let lo = LocalizedOrbitals {
            coeff: Array2::eye(2 * n),
            atom_of,
        };
        (mol, lo)
    }

    #[test]
    fn test_partition_orbitals() {
        let (mol, lo) = chain(4);
        let frags = partition(&mol, &lo, &[1, 3]).unwrap();
        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0].orbitals, vec![0, 4]);
        assert_eq!(frags[1].atoms, 1..4);
        assert_eq!(frags[1].orbitals, vec![1, 2, 3, 5, 6, 7]);
        assert_eq!(frags[1].n_atoms(), 3);
    }

    #[test]
    fn test_bad_counts() {
        let (mol, lo) = chain(4);
        for counts in [&[][..], &[1, 1, 1][..], &[2, 0, 2][..], &[3, 3][..]] {
            let err = partition(&mol, &lo, counts).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Partition, "{counts:?}");
        }
    }
}
