//! High-level API for bundle-method training
//!
//! This module provides a user-friendly interface around the BMRM driver,
//! following a builder pattern for configuration.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bmrm::api::Bmrm;
//! use bmrm::RiskOracle;
//!
//! struct MyModel;
//!
//! impl RiskOracle for MyModel {
//!     fn dim(&self) -> usize { 2 }
//!     fn risk(&mut self, w: &[f64], subgradient: &mut [f64]) -> f64 {
//!         // fill `subgradient` with a subgradient of the risk at `w`
//!         // and return the risk value
//!         subgradient.copy_from_slice(w);
//!         0.5 * (w[0] * w[0] + w[1] * w[1])
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut model = MyModel;
//! let trained = Bmrm::new()
//!     .with_lambda(0.1)
//!     .with_tol_rel(1e-4)
//!     .train(&mut model)?;
//!
//! println!("converged: {}", trained.status().converged());
//! println!("weights: {:?}", trained.weights());
//! # Ok(())
//! # }
//! ```

use crate::bundle::BmrmSolver;
use crate::core::{BmrmConfig, BmrmResult, BmrmStatus, Result, RiskOracle, TrainingHistory};
use crate::utils::dot;

/// Builder-style front end for the BMRM optimizer
#[derive(Debug, Clone, Default)]
pub struct Bmrm {
    config: BmrmConfig,
}

impl Bmrm {
    /// Create a trainer with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a trainer from an explicit configuration
    pub fn with_config(config: BmrmConfig) -> Self {
        Self { config }
    }

    /// Set the L2 regularization strength
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.lambda = lambda;
        self
    }

    /// Set the relative duality-gap stopping threshold
    pub fn with_tol_rel(mut self, tol_rel: f64) -> Self {
        self.config.tol_rel = tol_rel;
        self
    }

    /// Set the absolute duality-gap stopping threshold
    pub fn with_tol_abs(mut self, tol_abs: f64) -> Self {
        self.config.tol_abs = tol_abs;
        self
    }

    /// Set the cutting-plane buffer capacity
    pub fn with_buf_size(mut self, buf_size: usize) -> Self {
        self.config.buf_size = buf_size;
        self
    }

    /// Set the outer iteration cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Enable or disable eviction of inactive cutting planes
    pub fn with_cleaning(mut self, clean_icp: bool) -> Self {
        self.config.clean_icp = clean_icp;
        self
    }

    /// Set how many inactive iterations a plane survives before eviction
    pub fn with_clean_after(mut self, clean_after: u32) -> Self {
        self.config.clean_after = clean_after;
        self
    }

    /// Set the KKT tolerance of the inner QP solver
    pub fn with_qp_tolerance(mut self, qp_tol: f64) -> Self {
        self.config.qp_tol = qp_tol;
        self
    }

    /// Emit per-iteration diagnostics at info level
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// The current configuration
    pub fn config(&self) -> &BmrmConfig {
        &self.config
    }

    /// Train starting from the zero weight vector
    pub fn train<O: RiskOracle>(&self, oracle: &mut O) -> Result<TrainedModel> {
        self.train_from(oracle, vec![0.0; oracle.dim()])
    }

    /// Train starting from a caller-supplied weight vector
    pub fn train_from<O: RiskOracle>(&self, oracle: &mut O, mut w: Vec<f64>) -> Result<TrainedModel> {
        let solver = BmrmSolver::new(self.config.clone())?;
        let result = solver.solve(oracle, &mut w)?;
        Ok(TrainedModel {
            weights: w,
            lambda: self.config.lambda,
            result,
        })
    }
}

/// A trained linear model together with its optimization record
#[derive(Debug, Clone)]
pub struct TrainedModel {
    weights: Vec<f64>,
    lambda: f64,
    result: BmrmResult,
}

impl TrainedModel {
    /// The trained weight vector
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Consume the model, keeping only the weights
    pub fn into_weights(self) -> Vec<f64> {
        self.weights
    }

    /// Regularization strength used during training
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Weight-vector dimension
    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    /// Why training stopped
    pub fn status(&self) -> BmrmStatus {
        self.result.status
    }

    /// Number of outer iterations performed
    pub fn iterations(&self) -> usize {
        self.result.iterations
    }

    /// Final primal objective value
    pub fn primal_objective(&self) -> f64 {
        self.result.primal
    }

    /// Final dual objective value
    pub fn dual_objective(&self) -> f64 {
        self.result.dual
    }

    /// Final duality gap
    pub fn gap(&self) -> f64 {
        self.result.gap()
    }

    /// Per-iteration training diagnostics
    pub fn history(&self) -> &TrainingHistory {
        &self.result.history
    }

    /// Full optimization record
    pub fn result(&self) -> &BmrmResult {
        &self.result
    }

    /// Linear decision value `<w, features>`
    ///
    /// # Panics
    /// Panics when `features` does not match the model dimension.
    pub fn score(&self, features: &[f64]) -> f64 {
        assert_eq!(
            features.len(),
            self.weights.len(),
            "feature dimension mismatch"
        );
        dot(&self.weights, features)
    }
}
