//! One- and two-electron integrals over s-type Gaussians.
//!
//! Closed forms for primitives `exp(-a|r-A|²)`, `exp(-b|r-B|²)` with
//! `p = a + b`, `μ = ab/p` and `P = (aA + bB)/p`:
//!
//!   S  = (π/p)^{3/2} · exp(-μ|AB|²)
//!   T  = μ(3 - 2μ|AB|²) · S
//!   V  = -Z · 2π/p · exp(-μ|AB|²) · F₀(p|PC|²)
//!   (ab|cd) = 2π^{5/2} / (pq√(p+q)) · exp(-μ|AB|² - ν|CD|²) · F₀(pq/(p+q)·|PQ|²)

use ndarray::{Array2, Array4};
use std::f64::consts::PI;

use crate::basis::{BasisFunction, BasisSet};
use crate::molecule::{Molecule, distance_sqr};

/// Boys function of order zero, `F₀(t) = ∫₀¹ exp(-t u²) du`.
pub fn boys_f0(t: f64) -> f64 {
    if t < 1e-12 {
        return 1.0 - t / 3.0;
    }
    if t > 30.0 {
        return 0.5 * (PI / t).sqrt();
    }
    // F₀(t) = e^{-t} Σ_k (2t)^k / (2k+1)!!
    let mut term = 1.0;
    let mut sum = 1.0;
    let mut k = 0.0;
    while term > 1e-17 * sum {
        k += 1.0;
        term *= 2.0 * t / (2.0 * k + 1.0);
        sum += term;
        if k > 500.0 {
            break;
        }
    }
    (-t).exp() * sum
}

fn gaussian_product(a: f64, ca: &[f64; 3], b: f64, cb: &[f64; 3]) -> [f64; 3] {
    let p = a + b;
    [0usize, 1, 2].map(|k| (a * ca[k] + b * cb[k]) / p)
}

fn overlap_pair(f: &BasisFunction, g: &BasisFunction) -> f64 {
    let r2 = distance_sqr(&f.center, &g.center);
    let mut s = 0.0;
    for (a, ca) in f.primitives() {
        for (b, cb) in g.primitives() {
            let p = a + b;
            s += ca * cb * (PI / p).powf(1.5) * (-a * b / p * r2).exp();
        }
    }
    s
}

fn kinetic_pair(f: &BasisFunction, g: &BasisFunction) -> f64 {
    let r2 = distance_sqr(&f.center, &g.center);
    let mut t = 0.0;
    for (a, ca) in f.primitives() {
        for (b, cb) in g.primitives() {
            let p = a + b;
            let mu = a * b / p;
            t += ca * cb * mu * (3.0 - 2.0 * mu * r2) * (PI / p).powf(1.5) * (-mu * r2).exp();
        }
    }
    t
}

fn nuclear_pair(f: &BasisFunction, g: &BasisFunction, nuclei: &[(f64, [f64; 3])]) -> f64 {
    let r2 = distance_sqr(&f.center, &g.center);
    let mut v = 0.0;
    for (a, ca) in f.primitives() {
        for (b, cb) in g.primitives() {
            let p = a + b;
            let centre = gaussian_product(a, &f.center, b, &g.center);
            let prefactor = ca * cb * 2.0 * PI / p * (-a * b / p * r2).exp();
            for (z, c) in nuclei {
                v -= prefactor * z * boys_f0(p * distance_sqr(&centre, c));
            }
        }
    }
    v
}

fn eri_quartet(f: &BasisFunction, g: &BasisFunction, h: &BasisFunction, k: &BasisFunction) -> f64 {
    let rab = distance_sqr(&f.center, &g.center);
    let rcd = distance_sqr(&h.center, &k.center);
    let mut total = 0.0;
    for (a, ca) in f.primitives() {
        for (b, cb) in g.primitives() {
            let p = a + b;
            let pc = gaussian_product(a, &f.center, b, &g.center);
            let kab = (-a * b / p * rab).exp();
            for (c, cc) in h.primitives() {
                for (d, cd) in k.primitives() {
                    let q = c + d;
                    let qc = gaussian_product(c, &h.center, d, &k.center);
                    let kcd = (-c * d / q * rcd).exp();
                    let rho = p * q / (p + q);
                    total += ca * cb * cc * cd * 2.0 * PI.powf(2.5) / (p * q * (p + q).sqrt())
                        * kab
                        * kcd
                        * boys_f0(rho * distance_sqr(&pc, &qc));
                }
            }
        }
    }
    total
}

/// AO-basis integrals of a molecule.
#[derive(Debug, Clone)]
pub struct Integrals {
    /// Overlap matrix S.
    pub overlap: Array2<f64>,
    /// Kinetic energy T.
    pub kinetic: Array2<f64>,
    /// Nuclear attraction V.
    pub nuclear: Array2<f64>,
    /// Electron repulsion (pq|rs), chemist notation.
    pub eri: Array4<f64>,
    /// Nuclear repulsion energy.
    pub nuclear_repulsion: f64,
}

impl Integrals {
    /// Compute every integral for `basis` placed on `molecule`.
    pub fn compute(molecule: &Molecule, basis: &BasisSet) -> Self {
        let fns = &basis.functions;
        let n = fns.len();
        let nuclei: Vec<(f64, [f64; 3])> = molecule
            .atoms
            .iter()
            .zip(molecule.coords_bohr())
            .map(|(a, c)| (f64::from(a.element.atomic_number()), c))
            .collect();

        let overlap = Array2::from_shape_fn((n, n), |(i, j)| overlap_pair(&fns[i], &fns[j]));
        let kinetic = Array2::from_shape_fn((n, n), |(i, j)| kinetic_pair(&fns[i], &fns[j]));
        let nuclear =
            Array2::from_shape_fn((n, n), |(i, j)| nuclear_pair(&fns[i], &fns[j], &nuclei));

        let mut eri = Array4::zeros((n, n, n, n));
        for p in 0..n {
            for q in 0..=p {
                for r in 0..n {
                    for s in 0..=r {
                        if p * (p + 1) / 2 + q < r * (r + 1) / 2 + s {
                            continue;
                        }
                        let v = eri_quartet(&fns[p], &fns[q], &fns[r], &fns[s]);
                        for (i, j, k, l) in [
                            (p, q, r, s),
                            (q, p, r, s),
                            (p, q, s, r),
                            (q, p, s, r),
                            (r, s, p, q),
                            (s, r, p, q),
                            (r, s, q, p),
                            (s, r, q, p),
                        ] {
                            eri[[i, j, k, l]] = v;
                        }
                    }
                }
            }
        }

        tracing::debug!(n_basis = n, basis = %basis.name, "computed AO integrals");
        Self {
            overlap,
            kinetic,
            nuclear,
            eri,
            nuclear_repulsion: molecule.nuclear_repulsion(),
        }
    }

    /// Core Hamiltonian T + V.
    pub fn core_hamiltonian(&self) -> Array2<f64> {
        &self.kinetic + &self.nuclear
    }

    /// Overlap between two different basis sets on the same molecule.
    pub fn cross_overlap(left: &BasisSet, right: &BasisSet) -> Array2<f64> {
        Array2::from_shape_fn((left.len(), right.len()), |(i, j)| {
            overlap_pair(&left.functions[i], &right.functions[j])
        })
    }

    /// Overlap matrix of a single basis set.
    pub fn overlap_of(basis: &BasisSet) -> Array2<f64> {
        Self::cross_overlap(basis, basis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::BasisSetName;

    fn h2_sto3g() -> (Molecule, BasisSet) {
        // 1.4 Bohr bond, the Szabo-Ostlund reference geometry
        let mut mol = Molecule::from_symbols(
            [("H", [0.0; 3]), ("H", [0.0, 0.0, 1.4])],
            BasisSetName::Sto3g,
        )
        .unwrap();
        mol.unit = crate::molecule::LengthUnit::Bohr;
        let basis = BasisSet::build(&mol, BasisSetName::Sto3g).unwrap();
        (mol, basis)
    }

    #[test]
    fn test_boys_limits() {
        assert!((boys_f0(0.0) - 1.0).abs() < 1e-12);
        // F₀(1) = √π/2 · erf(1)
        assert!((boys_f0(1.0) - 0.746_824_132_812_427).abs() < 1e-12);
        let t: f64 = 29.9;
        assert!((boys_f0(t) - 0.5 * (PI / t).sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_h2_sto3g_reference_values() {
        let (mol, basis) = h2_sto3g();
        let ints = Integrals::compute(&mol, &basis);
        assert!((ints.overlap[[0, 1]] - 0.6593).abs() < 1e-4);
        assert!((ints.kinetic[[0, 0]] - 0.7600).abs() < 1e-4);
        assert!((ints.kinetic[[0, 1]] - 0.2365).abs() < 1e-4);
        let h = ints.core_hamiltonian();
        assert!((h[[0, 0]] + 1.1204).abs() < 1e-4);
        assert!((h[[0, 1]] + 0.9584).abs() < 1e-4);
        assert!((ints.eri[[0, 0, 0, 0]] - 0.7746).abs() < 1e-4);
        assert!((ints.eri[[0, 0, 1, 1]] - 0.5697).abs() < 1e-4);
        assert!((ints.eri[[1, 0, 0, 0]] - 0.4441).abs() < 1e-4);
        assert!((ints.eri[[1, 0, 1, 0]] - 0.2970).abs() < 1e-4);
        assert!((ints.nuclear_repulsion - 1.0 / 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_eri_symmetry() {
        let mol = Molecule::from_symbols(
            [("H", [0.0; 3]), ("H", [0.0, 0.0, 0.74]), ("He", [0.9, 0.3, 0.0])],
            BasisSetName::Basis631g,
        )
        .unwrap();
        let basis = BasisSet::build(&mol, BasisSetName::Basis631g).unwrap();
        let ints = Integrals::compute(&mol, &basis);
        let v = ints.eri[[0, 3, 5, 1]];
        for w in [ints.eri[[3, 0, 5, 1]], ints.eri[[5, 1, 0, 3]], ints.eri[[1, 5, 3, 0]]] {
            assert!((v - w).abs() < 1e-14);
        }
    }
}
