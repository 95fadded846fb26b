//! Bundle-method driver (BMRM outer loop)
//!
//! Minimizes `risk(w) + 0.5 * lambda * ||w||^2` by maintaining a bundle of
//! cutting planes (risk subgradients at past iterates) and solving the dual
//! quadratic program over plane weights each iteration:
//!
//! ```text
//! min  0.5 * x'Hx + f'x    s.t.  sum(x) = 1,  x >= 0
//! ```
//!
//! where `H[i,j] = <plane_i, plane_j> / lambda` and
//! `f[i] = <plane_i, w_i> - risk(w_i)`. The primal iterate is recovered as
//! `W = -(1/lambda) * sum_i x[i] * plane_i`.

use crate::bundle::CuttingPlanePool;
use crate::core::{
    BmrmConfig, BmrmError, BmrmResult, BmrmStatus, QpStatus, Result, RiskOracle, TrainingHistory,
};
use crate::qp::{GramMatrix, GsmoSolver};
use crate::utils::{distance, dot, scaled_add, squared_norm};
use log::{debug, log, Level};

/// QP weights at or below this level count as inactive for eviction
/// bookkeeping; a plane parked at a negligible interior weight must not
/// hold its buffer slot forever.
const ACTIVITY_EPS: f64 = 1e-12;

/// Reusable BMRM solver configured once and applied to oracles
pub struct BmrmSolver {
    config: BmrmConfig,
}

impl BmrmSolver {
    /// Create a solver after validating the configuration
    pub fn new(config: BmrmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration
    pub fn config(&self) -> &BmrmConfig {
        &self.config
    }

    /// Run the full optimization, writing the trained weights into `w`
    ///
    /// `w` provides the initial iterate (typically all zeros) and receives
    /// the final one; its length must match `oracle.dim()`. Terminal states
    /// such as buffer exhaustion or the iteration cap are reported through
    /// the result status, not as errors.
    pub fn solve<O: RiskOracle>(&self, oracle: &mut O, w: &mut [f64]) -> Result<BmrmResult> {
        let mut optimization = BmrmOptimization::new(&self.config, oracle, w)?;
        while optimization.is_running() {
            optimization.step()?;
        }
        Ok(optimization.finish())
    }
}

/// One in-flight BMRM run: seeded at construction, advanced by [`step`](Self::step)
///
/// Exposes the caller-driven loop from the classic formulation. The pool,
/// Gram matrix, plane weights and linear term stay index-aligned at every
/// point between steps; the freshest subgradient is held aside and only
/// enters the pool at the start of the next step.
pub struct BmrmOptimization<'a, O: RiskOracle> {
    config: &'a BmrmConfig,
    oracle: &'a mut O,
    w: &'a mut [f64],
    qp: GsmoSolver,
    pool: CuttingPlanePool,
    gram: GramMatrix,
    /// Linear term of the dual QP, one entry per pooled plane
    f: Vec<f64>,
    /// Plane weights (the dual variable), one entry per pooled plane
    x: Vec<f64>,
    /// Equality coefficients and box bounds, allocated once at capacity
    a: Vec<f64>,
    lb: Vec<f64>,
    ub: Vec<f64>,
    prev_w: Vec<f64>,
    /// Subgradient from the latest oracle call, pending pool insertion
    pending_plane: Vec<f64>,
    pending_f: f64,
    primal: f64,
    dual: f64,
    iterations: usize,
    status: Option<BmrmStatus>,
    history: TrainingHistory,
}

impl<'a, O: RiskOracle> BmrmOptimization<'a, O> {
    /// Allocate all buffers and seed the bundle with one oracle call at `w`
    pub fn new(config: &'a BmrmConfig, oracle: &'a mut O, w: &'a mut [f64]) -> Result<Self> {
        config.validate()?;

        let dim = oracle.dim();
        if dim == 0 {
            return Err(BmrmError::InvalidParameter(
                "oracle dimension must be at least 1".to_string(),
            ));
        }
        if w.len() != dim {
            return Err(BmrmError::DimensionMismatch {
                expected: dim,
                actual: w.len(),
            });
        }

        let buf_size = config.buf_size;
        let mut pending_plane = vec![0.0; dim];
        let risk = oracle.risk(w, &mut pending_plane);
        let pending_f = dot(&pending_plane, w) - risk;
        let primal = risk + 0.5 * config.lambda * squared_norm(w);

        let mut history = TrainingHistory::with_capacity(buf_size + 1);
        history.push(primal, f64::NEG_INFINITY, 0.0);

        Ok(Self {
            qp: GsmoSolver::new(config.qp_tol, config.qp_max_iterations),
            pool: CuttingPlanePool::new(dim, buf_size),
            gram: GramMatrix::new(buf_size),
            f: Vec::with_capacity(buf_size),
            x: Vec::with_capacity(buf_size),
            a: vec![1.0; buf_size],
            lb: vec![0.0; buf_size],
            ub: vec![f64::INFINITY; buf_size],
            prev_w: w.to_vec(),
            pending_plane,
            pending_f,
            primal,
            dual: f64::NEG_INFINITY,
            iterations: 0,
            status: None,
            history,
            config,
            oracle,
            w,
        })
    }

    /// Whether another [`step`](Self::step) may be taken
    pub fn is_running(&self) -> bool {
        self.status.is_none()
    }

    /// Terminal status, once set
    pub fn status(&self) -> Option<BmrmStatus> {
        self.status
    }

    /// Outer iterations performed so far
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Number of cutting planes currently in the bundle
    pub fn n_planes(&self) -> usize {
        self.pool.len()
    }

    /// Current plane weights (the dual variable)
    pub fn plane_weights(&self) -> &[f64] {
        &self.x
    }

    /// Current primal iterate
    pub fn weights(&self) -> &[f64] {
        self.w
    }

    /// Current primal objective `Fp`
    pub fn primal(&self) -> f64 {
        self.primal
    }

    /// Current dual objective `Fd`
    pub fn dual(&self) -> f64 {
        self.dual
    }

    /// Current duality gap `Fp - Fd`
    pub fn gap(&self) -> f64 {
        self.primal - self.dual
    }

    /// Per-iteration diagnostics recorded so far
    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    /// Perform one outer iteration; a no-op once a terminal status is set.
    ///
    /// Errors are reserved for unrecoverable conditions (the inner QP
    /// rejecting its warm start); every expected termination mode lands in
    /// [`status`](Self::status) instead.
    pub fn step(&mut self) -> Result<()> {
        if self.status.is_some() {
            debug!("step() called on a finished optimization; ignoring");
            return Ok(());
        }

        self.admit_pending_plane()?;
        let qp_objective = self.solve_qp()?;
        self.update_weights();

        let risk = self.oracle.risk(self.w, &mut self.pending_plane);
        self.pending_f = dot(&self.pending_plane, self.w) - risk;
        self.iterations += 1;

        self.primal = risk + 0.5 * self.config.lambda * squared_norm(self.w);
        self.dual = -qp_objective;
        let gap = self.primal - self.dual;
        let w_dist = distance(self.w, &self.prev_w);
        self.history.push(self.primal, self.dual, w_dist);
        self.prev_w.copy_from_slice(self.w);

        if gap < 0.0 {
            // A (more than float-noise) negative gap indicates corrupted
            // Hessian bookkeeping.
            debug!(
                "negative duality gap {:.3e} at iteration {}",
                gap, self.iterations
            );
        }
        let level = if self.config.verbose {
            Level::Info
        } else {
            Level::Debug
        };
        log!(
            level,
            "iter {:4}: Fp={:.6e} Fd={:.6e} gap={:.3e} wdist={:.3e} nCP={}",
            self.iterations,
            self.primal,
            self.dual,
            gap,
            w_dist,
            self.pool.len()
        );

        if gap <= self.config.tol_rel * self.primal.abs() {
            self.status = Some(BmrmStatus::ConvergedRel);
        } else if gap <= self.config.tol_abs {
            self.status = Some(BmrmStatus::ConvergedAbs);
        }

        if self.status.is_none() {
            if self.config.clean_icp {
                self.remove_inactive_planes();
            }
            if self.pool.len() + 1 >= self.config.buf_size {
                self.status = Some(BmrmStatus::BufferExhausted);
            } else if self.iterations >= self.config.max_iterations {
                self.status = Some(BmrmStatus::IterationLimit);
            }
        }

        Ok(())
    }

    /// Consume the optimization; the caller keeps the weights written to `w`
    ///
    /// When called on a still-running optimization the result is the
    /// best-effort state, reported as an iteration-limit stop.
    pub fn finish(self) -> BmrmResult {
        BmrmResult {
            status: self.status.unwrap_or(BmrmStatus::IterationLimit),
            iterations: self.iterations,
            primal: self.primal,
            dual: self.dual,
            n_planes: self.pool.len(),
            history: self.history,
        }
    }

    /// Move the pending subgradient into the pool and extend the Gram
    /// matrix with its inner products against every held plane.
    fn admit_pending_plane(&mut self) -> Result<()> {
        // The exhaustion check at the end of the previous step guarantees a
        // free slot here.
        if self.pool.insert(&self.pending_plane).is_none() {
            return Err(BmrmError::OptimizationError(
                "cutting-plane pool exhausted despite buffer check".to_string(),
            ));
        }
        self.f.push(self.pending_f);

        let n = self.gram.len();
        let newest = self.pool.plane(n);
        let products: Vec<f64> = (0..=n)
            .map(|i| dot(self.pool.plane(i), newest) / self.config.lambda)
            .collect();
        self.gram.extend(&products);

        self.x.push(0.0);
        if self.gram.len() == 1 {
            // A lone plane must carry the whole simplex weight for the
            // equality constraint to hold at the warm start.
            self.x[0] = 1.0;
        }
        Ok(())
    }

    /// Run the inner generalized-SMO solve over the current bundle
    fn solve_qp(&mut self) -> Result<f64> {
        let n = self.gram.len();
        let solution = self.qp.solve(
            &self.gram,
            &self.f,
            &self.a[..n],
            1.0,
            &self.lb[..n],
            &self.ub[..n],
            &mut self.x,
        )?;

        match solution.status {
            QpStatus::KktConverged | QpStatus::IterationLimit => {
                debug!(
                    "inner QP: {:?} after {} iterations, objective {:.6e}",
                    solution.status, solution.iterations, solution.objective
                );
                Ok(solution.objective)
            }
            QpStatus::InfeasibleBounds | QpStatus::InfeasibleEquality => {
                Err(BmrmError::OptimizationError(format!(
                    "inner QP rejected its warm start (status {:?}); \
                     plane-weight bookkeeping is corrupted",
                    solution.status
                )))
            }
        }
    }

    /// Rebuild `W = -(1/lambda) * sum_i x[i] * plane_i` and update each
    /// plane's inactivity counter.
    fn update_weights(&mut self) {
        self.w.fill(0.0);
        for i in 0..self.pool.len() {
            let weight = self.x[i];
            if weight != 0.0 {
                scaled_add(self.w, self.pool.plane(i), -weight / self.config.lambda);
            }
            self.pool.record_activity(i, weight > ACTIVITY_EPS);
        }
    }

    /// Evict planes inactive beyond the threshold and compact the Gram
    /// matrix, plane weights and linear term with the same index remap.
    fn remove_inactive_planes(&mut self) {
        let before = self.pool.len();
        if let Some(retained) = self.pool.evict_stale(self.config.clean_after) {
            self.gram.compact(&retained);
            compact(&mut self.x, &retained);
            compact(&mut self.f, &retained);
            debug!(
                "evicted {} inactive cutting planes, {} remain",
                before - self.pool.len(),
                self.pool.len()
            );
        }
    }
}

/// Keep only the given (ascending) positions of `values`, in order
fn compact(values: &mut Vec<f64>, keep: &[usize]) {
    for (new_i, &old_i) in keep.iter().enumerate() {
        values[new_i] = values[old_i];
    }
    values.truncate(keep.len());
}
