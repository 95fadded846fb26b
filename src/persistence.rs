//! Model serialization and persistence
//!
//! This module provides functionality to save and load trained models for
//! later scoring or inspection. Only the weight vector, the regularization
//! strength, and a training summary are persisted; the full per-iteration
//! history is not (its seed entry carries a non-finite dual value that JSON
//! cannot represent).

use crate::api::TrainedModel;
use crate::core::{BmrmError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serializable representation of a trained model
#[derive(Serialize, Deserialize)]
pub struct SerializableModel {
    /// Trained weight vector
    pub weights: Vec<f64>,
    /// L2 regularization strength used during training
    pub lambda: f64,
    /// Model metadata
    pub metadata: ModelMetadata,
}

/// Model metadata for tracking and validation
#[derive(Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Weight-vector dimension
    pub dimension: usize,
    /// How the training run ended
    pub training_summary: TrainingSummary,
    /// Creation timestamp
    pub created_at: String,
}

/// Final state of the training run, for reference
#[derive(Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Numeric exit code of the optimizer
    pub status_code: i32,
    /// Outer iterations performed
    pub iterations: usize,
    /// Final primal objective value
    pub primal_objective: f64,
    /// Final dual objective value
    pub dual_objective: f64,
}

impl SerializableModel {
    /// Create a serializable model from a trained model
    pub fn from_trained_model(model: &TrainedModel) -> Self {
        Self {
            weights: model.weights().to_vec(),
            lambda: model.lambda(),
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                dimension: model.dim(),
                training_summary: TrainingSummary {
                    status_code: model.status().code(),
                    iterations: model.iterations(),
                    primal_objective: model.primal_objective(),
                    dual_objective: model.dual_objective(),
                },
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        }
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(BmrmError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| BmrmError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(BmrmError::IoError)?;
        let reader = BufReader::new(file);
        let model = serde_json::from_reader(reader)
            .map_err(|e| BmrmError::SerializationError(e.to_string()))?;
        Ok(model)
    }

    /// Linear decision value `<weights, features>`
    pub fn score(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.weights.len() {
            return Err(BmrmError::DimensionMismatch {
                expected: self.weights.len(),
                actual: features.len(),
            });
        }
        Ok(crate::utils::dot(&self.weights, features))
    }
}
