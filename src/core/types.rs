//! Core type definitions for the bundle-method optimizer

use crate::core::error::{BmrmError, Result};

/// Terminal state of the outer BMRM loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmrmStatus {
    /// The outer iteration cap was reached before the duality gap closed
    IterationLimit,
    /// Converged: `Fp - Fd <= tol_rel * |Fp|`
    ConvergedRel,
    /// Converged: `Fp - Fd <= tol_abs`
    ConvergedAbs,
    /// The cutting-plane buffer filled up; `W` holds the best-effort result
    BufferExhausted,
}

impl BmrmStatus {
    /// Numeric exit code matching the classic BMRM convention
    pub fn code(&self) -> i32 {
        match self {
            BmrmStatus::IterationLimit => 0,
            BmrmStatus::ConvergedRel => 1,
            BmrmStatus::ConvergedAbs => 2,
            BmrmStatus::BufferExhausted => -1,
        }
    }

    /// Whether the optimizer stopped because a gap criterion was met
    pub fn converged(&self) -> bool {
        matches!(self, BmrmStatus::ConvergedRel | BmrmStatus::ConvergedAbs)
    }
}

/// Terminal state of one inner generalized-SMO solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QpStatus {
    /// Iteration cap reached before the KKT gap closed
    IterationLimit,
    /// Relaxed KKT conditions satisfied within tolerance
    KktConverged,
    /// The warm-start point violates a box constraint
    InfeasibleBounds,
    /// The warm-start point violates the equality constraint
    InfeasibleEquality,
}

impl QpStatus {
    /// Numeric exit code matching the classic libqp convention
    pub fn code(&self) -> i32 {
        match self {
            QpStatus::IterationLimit => 0,
            QpStatus::KktConverged => 4,
            QpStatus::InfeasibleBounds => -2,
            QpStatus::InfeasibleEquality => -3,
        }
    }

    /// Whether the returned point is usable (feasible, possibly suboptimal)
    pub fn is_solved(&self) -> bool {
        matches!(self, QpStatus::IterationLimit | QpStatus::KktConverged)
    }
}

/// Per-iteration diagnostics collected by the driver
///
/// Entry 0 describes the state right after seeding (the dual value is
/// negative infinity there since no plane weights exist yet); entry `t`
/// describes the state after outer iteration `t`.
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    /// Primal objective `R(W) + 0.5 * lambda * ||W||^2` per iteration
    pub primal: Vec<f64>,
    /// Dual objective (negated inner QP value) per iteration
    pub dual: Vec<f64>,
    /// `||W - prevW||` per iteration
    pub w_dist: Vec<f64>,
}

impl TrainingHistory {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            primal: Vec::with_capacity(capacity),
            dual: Vec::with_capacity(capacity),
            w_dist: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, primal: f64, dual: f64, w_dist: f64) {
        self.primal.push(primal);
        self.dual.push(dual);
        self.w_dist.push(w_dist);
    }

    /// Number of recorded entries (iterations + 1 for the seed entry)
    pub fn len(&self) -> usize {
        self.primal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primal.is_empty()
    }
}

/// Result of a finished BMRM run
#[derive(Debug, Clone)]
pub struct BmrmResult {
    /// Why the optimizer stopped
    pub status: BmrmStatus,
    /// Number of outer iterations performed
    pub iterations: usize,
    /// Final primal objective value `Fp`
    pub primal: f64,
    /// Final dual objective value `Fd`
    pub dual: f64,
    /// Number of cutting planes held when the run ended
    pub n_planes: usize,
    /// Per-iteration diagnostics
    pub history: TrainingHistory,
}

impl BmrmResult {
    /// Final duality gap `Fp - Fd`
    pub fn gap(&self) -> f64 {
        self.primal - self.dual
    }
}

/// Configuration for the BMRM optimizer
#[derive(Debug, Clone)]
pub struct BmrmConfig {
    /// L2 regularization strength (must be positive)
    pub lambda: f64,
    /// Relative duality-gap stopping threshold
    pub tol_rel: f64,
    /// Absolute duality-gap stopping threshold
    pub tol_abs: f64,
    /// Maximum number of simultaneously held cutting planes (at least 2)
    pub buf_size: usize,
    /// Cap on outer iterations
    pub max_iterations: usize,
    /// Evict cutting planes that stay inactive for too long
    pub clean_icp: bool,
    /// Consecutive zero-weight iterations before a plane becomes evictable
    pub clean_after: u32,
    /// KKT tolerance of the inner generalized-SMO solver
    pub qp_tol: f64,
    /// Iteration cap of the inner generalized-SMO solver
    pub qp_max_iterations: usize,
    /// Emit per-iteration diagnostics at info level instead of debug
    pub verbose: bool,
}

impl Default for BmrmConfig {
    fn default() -> Self {
        Self {
            lambda: 1.0,
            tol_rel: 0.001,
            tol_abs: 0.0,
            buf_size: 1000,
            max_iterations: 10000,
            clean_icp: true,
            clean_after: 10,
            qp_tol: 1e-9,
            qp_max_iterations: 1_000_000,
            verbose: false,
        }
    }
}

impl BmrmConfig {
    /// Check that every field is in its admissible range
    pub fn validate(&self) -> Result<()> {
        if !(self.lambda.is_finite() && self.lambda > 0.0) {
            return Err(BmrmError::InvalidParameter(format!(
                "lambda must be positive and finite, got {}",
                self.lambda
            )));
        }
        if !(self.tol_rel.is_finite() && self.tol_rel >= 0.0) {
            return Err(BmrmError::InvalidParameter(format!(
                "tol_rel must be non-negative, got {}",
                self.tol_rel
            )));
        }
        if !(self.tol_abs.is_finite() && self.tol_abs >= 0.0) {
            return Err(BmrmError::InvalidParameter(format!(
                "tol_abs must be non-negative, got {}",
                self.tol_abs
            )));
        }
        if self.buf_size < 2 {
            return Err(BmrmError::InvalidParameter(format!(
                "buf_size must be at least 2, got {}",
                self.buf_size
            )));
        }
        if self.max_iterations == 0 {
            return Err(BmrmError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.qp_tol.is_finite() && self.qp_tol > 0.0) {
            return Err(BmrmError::InvalidParameter(format!(
                "qp_tol must be positive, got {}",
                self.qp_tol
            )));
        }
        if self.qp_max_iterations == 0 {
            return Err(BmrmError::InvalidParameter(
                "qp_max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
