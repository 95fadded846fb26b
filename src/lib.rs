//! Rust implementation of the Bundle Method for Regularized Risk Minimization (BMRM)
//!
//! Based on "Bundle Methods for Regularized Risk Minimization" by Teo, Vishwanathan,
//! Smola and Le. The regularized risk `R(w) + 0.5 * lambda * ||w||^2` is minimized by
//! accumulating cutting planes (subgradients of the risk) and solving a small dual
//! quadratic program over the plane weights each iteration with a generalized SMO
//! solver.

pub mod api;
pub mod bundle;
pub mod core;
pub mod persistence;
pub mod qp;
pub mod utils;

// Re-export main types for convenience
pub use crate::api::{Bmrm, TrainedModel};
pub use crate::bundle::{BmrmOptimization, BmrmSolver, CuttingPlanePool};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::qp::{GramMatrix, GsmoSolution, GsmoSolver};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
