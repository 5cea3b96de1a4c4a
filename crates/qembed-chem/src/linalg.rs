//! Dense linear-algebra helpers on `ndarray` matrices.
//!
//! Symmetric eigendecompositions go through `faer`; everything else is plain
//! `ndarray` arithmetic.

use faer::{Mat, Side};
use ndarray::{Array1, Array2, Array4, ArrayView2, Axis};

use crate::error::{ChemError, ChemResult};

/// Eigenvalues below this are treated as zero when inverting.
pub const EIGEN_CUTOFF: f64 = 1e-10;

/// Eigendecomposition `A = V diag(w) Vᵀ` of a real symmetric matrix.
///
/// Eigenvalues are sorted ascending and columns of `V` follow them.
pub fn eigh(a: ArrayView2<'_, f64>) -> ChemResult<(Array1<f64>, Array2<f64>)> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(ChemError::Dimension(format!(
            "eigh needs a square matrix, got {}x{}",
            n,
            a.ncols()
        )));
    }
    if n == 0 {
        return Ok((Array1::zeros(0), Array2::zeros((0, 0))));
    }
    let m = Mat::<f64>::from_fn(n, n, |i, j| 0.5 * (a[[i, j]] + a[[j, i]]));
    let evd = m
        .as_ref()
        .self_adjoint_eigen(Side::Lower)
        .map_err(|e| ChemError::Eigen(format!("{e:?}")))?;
    let s = evd.S().column_vector();
    let u = evd.U();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&x, &y| s[x].total_cmp(&s[y]));
    let values = Array1::from_iter(order.iter().map(|&k| s[k]));
    let vectors = Array2::from_shape_fn((n, n), |(i, j)| u[(i, order[j])]);
    Ok((values, vectors))
}

/// `V diag(f(w)) Vᵀ` for a symmetric matrix.
pub fn matrix_function(a: ArrayView2<'_, f64>, f: impl Fn(f64) -> f64) -> ChemResult<Array2<f64>> {
    let (w, v) = eigh(a)?;
    let scaled = &v * &w.mapv(f).insert_axis(Axis(0));
    Ok(scaled.dot(&v.t()))
}

/// `A^{-1/2}` for a symmetric positive-definite matrix.
pub fn inverse_sqrt(a: ArrayView2<'_, f64>) -> ChemResult<Array2<f64>> {
    let (w, v) = eigh(a)?;
    let min = w.iter().copied().fold(f64::INFINITY, f64::min);
    if min <= EIGEN_CUTOFF {
        return Err(ChemError::Eigen(format!(
            "matrix is not positive definite (smallest eigenvalue {min:e})"
        )));
    }
    let scaled = &v * &w.mapv(|x| 1.0 / x.sqrt()).insert_axis(Axis(0));
    Ok(scaled.dot(&v.t()))
}

/// Moore-Penrose pseudo-inverse of a symmetric matrix.
pub fn pinv_symmetric(a: ArrayView2<'_, f64>) -> ChemResult<Array2<f64>> {
    let scale = a.iter().fold(0.0_f64, |m, x| m.max(x.abs())).max(1.0);
    matrix_function(a, |x| if x.abs() > EIGEN_CUTOFF * scale { 1.0 / x } else { 0.0 })
}

/// Orthonormalise the columns of `c` in the metric `s`: `C (Cᵀ S C)^{-1/2}`.
pub fn vec_lowdin(c: ArrayView2<'_, f64>, s: ArrayView2<'_, f64>) -> ChemResult<Array2<f64>> {
    let metric = c.t().dot(&s).dot(&c);
    Ok(c.dot(&inverse_sqrt(metric.view())?))
}

/// `Cᵀ A C`.
pub fn transform_one(a: ArrayView2<'_, f64>, c: ArrayView2<'_, f64>) -> Array2<f64> {
    c.t().dot(&a).dot(&c)
}

/// Four-index transform `(pq|rs) → Σ C_ip C_jq C_kr C_ls (ij|kl)`.
pub fn transform_two(eri: &Array4<f64>, c: ArrayView2<'_, f64>) -> Array4<f64> {
    let (n, m) = c.dim();
    // one index at a time, each step O(n⁴m)
    let mut t1 = Array4::<f64>::zeros((m, n, n, n));
    for p in 0..m {
        for i in 0..n {
            let cip = c[[i, p]];
            if cip == 0.0 {
                continue;
            }
            for j in 0..n {
                for k in 0..n {
                    for l in 0..n {
                        t1[[p, j, k, l]] += cip * eri[[i, j, k, l]];
                    }
                }
            }
        }
    }
    let mut t2 = Array4::<f64>::zeros((m, m, n, n));
    for p in 0..m {
        for q in 0..m {
            for j in 0..n {
                let cjq = c[[j, q]];
                if cjq == 0.0 {
                    continue;
                }
                for k in 0..n {
                    for l in 0..n {
                        t2[[p, q, k, l]] += cjq * t1[[p, j, k, l]];
                    }
                }
            }
        }
    }
    let mut t3 = Array4::<f64>::zeros((m, m, m, n));
    for p in 0..m {
        for q in 0..m {
            for r in 0..m {
                for k in 0..n {
                    let ckr = c[[k, r]];
                    if ckr == 0.0 {
                        continue;
                    }
                    for l in 0..n {
                        t3[[p, q, r, l]] += ckr * t2[[p, q, k, l]];
                    }
                }
            }
        }
    }
    let mut out = Array4::<f64>::zeros((m, m, m, m));
    for p in 0..m {
        for q in 0..m {
            for r in 0..m {
                for s in 0..m {
                    out[[p, q, r, s]] = (0..n).map(|l| c[[l, s]] * t3[[p, q, r, l]]).sum();
                }
            }
        }
    }
    out
}

/// Coulomb and exchange matrices `J_pq = Σ (pq|rs) D_rs`, `K_pq = Σ (pr|qs) D_rs`.
pub fn coulomb_exchange(eri: &Array4<f64>, density: ArrayView2<'_, f64>) -> (Array2<f64>, Array2<f64>) {
    let n = density.nrows();
    let mut j = Array2::zeros((n, n));
    let mut k = Array2::zeros((n, n));
    for p in 0..n {
        for q in 0..n {
            let mut jpq = 0.0;
            let mut kpq = 0.0;
            for r in 0..n {
                for s in 0..n {
                    let d = density[[r, s]];
                    jpq += eri[[p, q, r, s]] * d;
                    kpq += eri[[p, r, q, s]] * d;
                }
            }
            j[[p, q]] = jpq;
            k[[p, q]] = kpq;
        }
    }
    (j, k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_eigh_sorted_and_reconstructs() {
        let a = array![[2.0, 1.0, 0.0], [1.0, 3.0, 0.5], [0.0, 0.5, -1.0]];
        let (w, v) = eigh(a.view()).unwrap();
        assert!(w[0] <= w[1] && w[1] <= w[2]);
        let back = (&v * &w.clone().insert_axis(Axis(0))).dot(&v.t());
        for (x, y) in back.iter().zip(a.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_inverse_sqrt() {
        let a = array![[4.0, 1.0], [1.0, 3.0]];
        let x = inverse_sqrt(a.view()).unwrap();
        let id = x.dot(&a).dot(&x);
        assert!((id[[0, 0]] - 1.0).abs() < 1e-12);
        assert!(id[[0, 1]].abs() < 1e-12);
        assert!(inverse_sqrt(array![[1.0, 1.0], [1.0, 1.0]].view()).is_err());
    }

    #[test]
    fn test_pinv_of_singular() {
        let a = array![[1.0, 1.0], [1.0, 1.0]];
        let p = pinv_symmetric(a.view()).unwrap();
        let back = a.dot(&p).dot(&a);
        for (x, y) in back.iter().zip(a.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_transform_two_identity_and_rotation() {
        let n = 2;
        let eri = Array4::from_shape_fn((n, n, n, n), |(p, q, r, s)| (1 + p + 2 * q + 3 * r + 5 * s) as f64);
        let id = Array2::<f64>::eye(n);
        assert_eq!(transform_two(&eri, id.view()), eri);

        let c = array![[0.0, 1.0], [1.0, 0.0]];
        let swapped = transform_two(&eri, c.view());
        assert_eq!(swapped[[0, 0, 0, 0]], eri[[1, 1, 1, 1]]);
        assert_eq!(swapped[[0, 1, 1, 0]], eri[[1, 0, 0, 1]]);
    }

    proptest::proptest! {
        #[test]
        fn prop_inverse_sqrt_whitens(
            entries in proptest::collection::vec(-1.0f64..1.0, 9),
        ) {
            // B Bᵀ + 3I is positive definite
            let b = Array2::from_shape_vec((3, 3), entries).unwrap();
            let a = &b.dot(&b.t()) + &(Array2::<f64>::eye(3) * 3.0);
            let x = inverse_sqrt(a.view()).unwrap();
            let id = x.dot(&a).dot(&x);
            for i in 0..3 {
                for j in 0..3 {
                    let want = if i == j { 1.0 } else { 0.0 };
                    proptest::prop_assert!((id[[i, j]] - want).abs() < 1e-10);
                }
            }
        }
    }
}
