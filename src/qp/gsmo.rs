//! Generalized Sequential Minimal Optimization for box- and equality-constrained QPs
//!
//! Solves
//!
//! ```text
//! min  0.5 * x'Hx + f'x
//! s.t. a'x = b,  lb <= x <= ub
//! ```
//!
//! following the generalized SMO algorithm of Keerthi et al. The Hessian is
//! reached only through a [`ColumnOracle`], so the caller decides how the
//! matrix is stored. Each iteration picks the most KKT-violating pair of
//! coordinates and takes a closed-form two-variable step, maintaining the
//! gradient `Hx + f` incrementally.

use crate::core::{BmrmError, ColumnOracle, QpStatus, Result};
use crate::utils::dot;

/// Maximum allowed violation of `a'x = b` at the warm-start point
const EQUALITY_TOL: f64 = 1e-9;

/// Outcome of one generalized-SMO solve
#[derive(Debug, Clone, Copy)]
pub struct GsmoSolution {
    /// Why the solver stopped
    pub status: QpStatus,
    /// Number of pair updates performed
    pub iterations: usize,
    /// Objective value `0.5 * x'Hx + f'x` at the returned point
    ///
    /// Meaningful only when `status.is_solved()`; NaN otherwise.
    pub objective: f64,
}

/// Generalized SMO solver with fixed stopping parameters
#[derive(Debug, Clone, Copy)]
pub struct GsmoSolver {
    tol_kkt: f64,
    max_iterations: usize,
}

impl GsmoSolver {
    /// Create a solver stopping at the given KKT gap or iteration cap
    pub fn new(tol_kkt: f64, max_iterations: usize) -> Self {
        Self {
            tol_kkt,
            max_iterations,
        }
    }

    /// Solve the QP, updating `x` in place from a feasible warm start
    ///
    /// Infeasible warm starts are reported through the solution status, not
    /// as errors; `x` is left untouched in that case. A zero entry in `a` is
    /// a caller bug and yields an error.
    pub fn solve<C: ColumnOracle>(
        &self,
        hessian: &C,
        f: &[f64],
        a: &[f64],
        b: f64,
        lb: &[f64],
        ub: &[f64],
        x: &mut [f64],
    ) -> Result<GsmoSolution> {
        self.solve_with_progress(hessian, f, a, b, lb, ub, x, |_, _| {})
    }

    /// Like [`solve`](Self::solve), invoking `progress(iteration, objective)`
    /// once before the loop and once per pair update. The callback is purely
    /// diagnostic and never affects control flow.
    #[allow(clippy::too_many_arguments)]
    pub fn solve_with_progress<C, F>(
        &self,
        hessian: &C,
        f: &[f64],
        a: &[f64],
        b: f64,
        lb: &[f64],
        ub: &[f64],
        x: &mut [f64],
        mut progress: F,
    ) -> Result<GsmoSolution>
    where
        C: ColumnOracle,
        F: FnMut(usize, f64),
    {
        let n = x.len();
        debug_assert_eq!(f.len(), n);
        debug_assert_eq!(a.len(), n);
        debug_assert_eq!(lb.len(), n);
        debug_assert_eq!(ub.len(), n);

        for (i, &ai) in a.iter().enumerate() {
            if ai == 0.0 {
                return Err(BmrmError::InvalidParameter(format!(
                    "equality coefficient a[{i}] must be non-zero"
                )));
            }
        }

        // Feasibility of the warm start is a hard precondition; a violated
        // box or equality constraint would silently corrupt the invariant
        // that every SMO step preserves feasibility.
        for i in 0..n {
            if x[i] < lb[i] || x[i] > ub[i] {
                return Ok(GsmoSolution {
                    status: QpStatus::InfeasibleBounds,
                    iterations: 0,
                    objective: f64::NAN,
                });
            }
        }
        if (dot(a, x) - b).abs() > EQUALITY_TOL {
            return Ok(GsmoSolution {
                status: QpStatus::InfeasibleEquality,
                iterations: 0,
                objective: f64::NAN,
            });
        }

        // Gradient of the objective, maintained incrementally from here on
        let mut nabla: Vec<f64> = f.to_vec();
        for j in 0..n {
            if x[j] != 0.0 {
                let col = hessian.column(j);
                for i in 0..n {
                    nabla[i] += col[i] * x[j];
                }
            }
        }

        let diag = hessian.diagonal();
        let mut iterations = 0usize;
        let mut status = QpStatus::IterationLimit;

        progress(0, objective(x, &nabla, f));

        loop {
            // Most-violating-pair selection. F_i = nabla_i / a_i; `u` is the
            // argmin over coordinates that may still move up, `v` the argmax
            // over coordinates that may still move down. Ties keep the first
            // index found.
            let mut min_f_up = f64::INFINITY;
            let mut max_f_low = f64::NEG_INFINITY;
            let mut u = usize::MAX;
            let mut v = usize::MAX;

            for i in 0..n {
                let fi = nabla[i] / a[i];
                if a[i] > 0.0 {
                    if x[i] < ub[i] && fi < min_f_up {
                        min_f_up = fi;
                        u = i;
                    }
                    if x[i] > lb[i] && fi > max_f_low {
                        max_f_low = fi;
                        v = i;
                    }
                } else {
                    if x[i] > lb[i] && fi < min_f_up {
                        min_f_up = fi;
                        u = i;
                    }
                    if x[i] < ub[i] && fi > max_f_low {
                        max_f_low = fi;
                        v = i;
                    }
                }
            }

            // Relaxed KKT test; also covers the degenerate case where one
            // side has no movable coordinate (the gap is then -infinity).
            if max_f_low - min_f_up <= self.tol_kkt {
                status = QpStatus::KktConverged;
                break;
            }
            if iterations >= self.max_iterations {
                break;
            }
            iterations += 1;

            let col_u = hessian.column(u);
            let col_v = hessian.column(v);

            // Largest step keeping both coordinates inside their boxes. The
            // four sign combinations must not be collapsed: a negative a[u]
            // swaps which bound limits the move.
            let mut tau_ub = if a[u] > 0.0 {
                (ub[u] - x[u]) * a[u]
            } else {
                (lb[u] - x[u]) * a[u]
            };
            tau_ub = tau_ub.min(if a[v] > 0.0 {
                (x[v] - lb[v]) * a[v]
            } else {
                (x[v] - ub[v]) * a[v]
            });

            // Unconstrained optimum of the 2x2 reduced QP, clipped to the
            // feasible interval. A non-positive curvature pushes the step to
            // the boundary.
            let curvature = diag[u] / (a[u] * a[u]) + diag[v] / (a[v] * a[v])
                - 2.0 * col_u[v] / (a[u] * a[v]);
            let tau = if curvature > 0.0 {
                ((nabla[v] / a[v] - nabla[u] / a[u]) / curvature).clamp(0.0, tau_ub)
            } else {
                tau_ub
            };

            let step_u = tau / a[u];
            let step_v = tau / a[v];
            x[u] += step_u;
            x[v] -= step_v;

            for i in 0..n {
                nabla[i] += col_u[i] * step_u - col_v[i] * step_v;
            }

            progress(iterations, objective(x, &nabla, f));
        }

        Ok(GsmoSolution {
            status,
            iterations,
            objective: objective(x, &nabla, f),
        })
    }
}

/// `0.5 * x'Hx + f'x` computed from the maintained gradient `nabla = Hx + f`
fn objective(x: &[f64], nabla: &[f64], f: &[f64]) -> f64 {
    x.iter()
        .zip(nabla.iter().zip(f))
        .map(|(&xi, (&gi, &fi))| 0.5 * xi * (gi + fi))
        .sum()
}
