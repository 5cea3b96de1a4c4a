//! Derivative-free minimization for variational parameters.

/// Result of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Optimal parameter values.
    pub optimal_params: Vec<f64>,
    /// Optimal objective value.
    pub optimal_value: f64,
    /// Number of function evaluations.
    pub num_evaluations: usize,
    /// Number of simplex iterations.
    pub num_iterations: usize,
    /// Whether the optimization converged.
    pub converged: bool,
}

/// A minimizer of scalar functions of real parameters.
pub trait Optimizer {
    /// Minimize `objective` starting from `initial_params`.
    fn minimize<F>(&self, objective: F, initial_params: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64;
}

/// Nelder-Mead simplex optimizer.
#[derive(Debug, Clone)]
pub struct NelderMead {
    /// Maximum number of iterations.
    pub maxiter: usize,
    /// Convergence tolerance on the spread of simplex values.
    pub tol: f64,
    /// Edge length of the initial simplex.
    pub initial_step: f64,
    /// Simplex rebuilds around the best point after convergence.
    pub restarts: usize,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            maxiter: 2000,
            tol: 1e-10,
            initial_step: 0.1,
            restarts: 2,
        }
    }
}

impl NelderMead {
    /// Create an optimizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum iterations.
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    fn simplex_around<F>(&self, x: &[f64], fx: f64, step: f64, objective: &mut F) -> (Vec<Vec<f64>>, Vec<f64>)
    where
        F: FnMut(&[f64]) -> f64,
    {
        let mut simplex = vec![x.to_vec()];
        let mut values = vec![fx];
        for i in 0..x.len() {
            let mut point = x.to_vec();
            point[i] += step;
            values.push(objective(&point));
            simplex.push(point);
        }
        (simplex, values)
    }
}

fn argsort(values: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    indices
}

fn affine(a: &[f64], b: &[f64], t: f64) -> Vec<f64> {
    // a + t (b - a)
    a.iter().zip(b).map(|(x, y)| x + t * (y - x)).collect()
}

impl Optimizer for NelderMead {
    fn minimize<F>(&self, mut objective: F, initial_params: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64,
    {
        let n = initial_params.len();
        let f0 = objective(&initial_params);
        if n == 0 {
            return OptimizationResult {
                optimal_params: initial_params,
                optimal_value: f0,
                num_evaluations: 1,
                num_iterations: 0,
                converged: true,
            };
        }

        let (mut simplex, mut values) =
            self.simplex_around(&initial_params, f0, self.initial_step, &mut objective);
        let mut num_evaluations = 1 + n;
        let mut num_iterations = 0;
        let mut restarts_left = self.restarts;
        let mut converged = false;

        while num_iterations < self.maxiter {
            let order = argsort(&values);
            let (best, worst, second_worst) = (order[0], order[n], order[n - 1]);

            if values[worst] - values[best] < self.tol {
                if restarts_left == 0 {
                    converged = true;
                    break;
                }
                restarts_left -= 1;
                let x = simplex[best].clone();
                let fx = values[best];
                let step = (self.initial_step * 0.1).max(1e-6);
                (simplex, values) = self.simplex_around(&x, fx, step, &mut objective);
                num_evaluations += n;
                continue;
            }
            num_iterations += 1;

            let mut centroid = vec![0.0; n];
            for &idx in &order[..n] {
                for (c, x) in centroid.iter_mut().zip(&simplex[idx]) {
                    *c += x / n as f64;
                }
            }

            let reflected = affine(&centroid, &simplex[worst], -1.0);
            let f_reflected = objective(&reflected);
            num_evaluations += 1;

            if f_reflected < values[best] {
                let expanded = affine(&centroid, &simplex[worst], -2.0);
                let f_expanded = objective(&expanded);
                num_evaluations += 1;
                if f_expanded < f_reflected {
                    simplex[worst] = expanded;
                    values[worst] = f_expanded;
                } else {
                    simplex[worst] = reflected;
                    values[worst] = f_reflected;
                }
            } else if f_reflected < values[second_worst] {
                simplex[worst] = reflected;
                values[worst] = f_reflected;
            } else {
                let contracted = if f_reflected < values[worst] {
                    affine(&centroid, &reflected, 0.5)
                } else {
                    affine(&centroid, &simplex[worst], 0.5)
                };
                let f_contracted = objective(&contracted);
                num_evaluations += 1;
                if f_contracted < values[worst].min(f_reflected) {
                    simplex[worst] = contracted;
                    values[worst] = f_contracted;
                } else {
                    // shrink toward the best vertex
                    let anchor = simplex[best].clone();
                    for i in 0..=n {
                        if i != best {
                            simplex[i] = affine(&anchor, &simplex[i], 0.5);
                            values[i] = objective(&simplex[i]);
                            num_evaluations += 1;
                        }
                    }
                }
            }
        }

        let best = argsort(&values)[0];
        tracing::trace!(
            num_iterations,
            num_evaluations,
            value = values[best],
            converged,
            "nelder-mead finished"
        );
        OptimizationResult {
            optimal_params: simplex.swap_remove(best),
            optimal_value: values[best],
            num_evaluations,
            num_iterations,
            converged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic() {
        let result = NelderMead::new().minimize(
            |p| (p[0] - 1.0).powi(2) + (p[1] - 2.0).powi(2) + 3.0,
            vec![0.0, 0.0],
        );
        assert!(result.converged);
        assert!((result.optimal_value - 3.0).abs() < 1e-9);
        assert!((result.optimal_params[0] - 1.0).abs() < 1e-4);
        assert!((result.optimal_params[1] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_rosenbrock() {
        let result = NelderMead::new().with_maxiter(5000).minimize(
            |p| (1.0 - p[0]).powi(2) + 100.0 * (p[1] - p[0].powi(2)).powi(2),
            vec![-1.0, 1.0],
        );
        assert!(result.optimal_value < 1e-6, "{}", result.optimal_value);
    }

    #[test]
    fn test_no_parameters() {
        let result = NelderMead::new().minimize(|_| 4.2, vec![]);
        assert_eq!(result.optimal_value, 4.2);
        assert_eq!(result.num_evaluations, 1);
    }

    #[test]
    fn test_iteration_limit() {
        let result = NelderMead::new()
            .with_maxiter(3)
            .minimize(|p| p.iter().map(|x| (x - 5.0).powi(2)).sum(), vec![0.0; 3]);
        assert!(!result.converged);
        assert_eq!(result.num_iterations, 3);
    }
}
