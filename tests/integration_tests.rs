//! Integration tests for the bmrm library
//!
//! These tests verify end-to-end functionality across multiple modules
//! and validate real-world usage scenarios.

use bmrm::api::Bmrm;
use bmrm::persistence::SerializableModel;
use bmrm::{BmrmConfig, BmrmOptimization, BmrmStatus, RiskOracle};
use tempfile::NamedTempFile;

/// Route `log` output through env_logger so per-iteration diagnostics show
/// up under `cargo test -- --nocapture` with `RUST_LOG` set.
fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Quadratic risk `0.5 * ||w - target||^2`; the subgradient is `w - target`.
struct QuadraticRisk {
    target: Vec<f64>,
}

impl RiskOracle for QuadraticRisk {
    fn dim(&self) -> usize {
        self.target.len()
    }

    fn risk(&mut self, w: &[f64], subgradient: &mut [f64]) -> f64 {
        let mut risk = 0.0;
        for i in 0..w.len() {
            let diff = w[i] - self.target[i];
            subgradient[i] = diff;
            risk += 0.5 * diff * diff;
        }
        risk
    }
}

/// Nonsmooth risk `sum_i |w_i - target_i|` with a sign subgradient.
struct AbsoluteRisk {
    target: Vec<f64>,
}

impl RiskOracle for AbsoluteRisk {
    fn dim(&self) -> usize {
        self.target.len()
    }

    fn risk(&mut self, w: &[f64], subgradient: &mut [f64]) -> f64 {
        let mut risk = 0.0;
        for i in 0..w.len() {
            let diff = w[i] - self.target[i];
            subgradient[i] = if diff > 0.0 {
                1.0
            } else if diff < 0.0 {
                -1.0
            } else {
                0.0
            };
            risk += diff.abs();
        }
        risk
    }
}

/// Complete workflow: build trainer, train, inspect the result
#[test]
fn test_complete_workflow_quadratic() {
    init_logs();
    let mut oracle = QuadraticRisk {
        target: vec![3.0, -2.0, 1.0],
    };

    let model = Bmrm::new()
        .with_lambda(1.0)
        .with_tol_rel(1e-6)
        .with_buf_size(50)
        .with_max_iterations(100)
        .with_verbose(true)
        .train(&mut oracle)
        .expect("Training should succeed");

    assert!(model.status().converged(), "got {:?}", model.status());

    // analytic optimum of 0.5||w - t||^2 + 0.5||w||^2 is t / 2
    assert!((model.weights()[0] - 1.5).abs() < 1e-3);
    assert!((model.weights()[1] + 1.0).abs() < 1e-3);
    assert!((model.weights()[2] - 0.5).abs() < 1e-3);

    assert!(model.gap() <= 1e-6 * model.primal_objective().abs() + 1e-12);
    assert_eq!(model.history().len(), model.iterations() + 1);
}

/// With an append-only bundle and the oracle `risk(w) = 0.5||w||^2`, the
/// duality gap shrinks weakly monotonically across outer iterations.
#[test]
fn test_gap_weakly_decreasing_with_append_only_bundle() {
    init_logs();
    struct NormRisk {
        dim: usize,
    }
    impl RiskOracle for NormRisk {
        fn dim(&self) -> usize {
            self.dim
        }
        fn risk(&mut self, w: &[f64], subgradient: &mut [f64]) -> f64 {
            subgradient.copy_from_slice(w);
            0.5 * w.iter().map(|v| v * v).sum::<f64>()
        }
    }

    let config = BmrmConfig {
        lambda: 0.5,
        tol_rel: 1e-9,
        clean_icp: false,
        max_iterations: 50,
        ..BmrmConfig::default()
    };

    let mut oracle = NormRisk { dim: 3 };
    let mut w = vec![2.0, -1.0, 0.5];
    let mut optimization =
        BmrmOptimization::new(&config, &mut oracle, &mut w).expect("setup should succeed");

    while optimization.is_running() {
        optimization.step().expect("step should succeed");
    }

    let result = optimization.finish();
    let gaps: Vec<f64> = result
        .history
        .primal
        .iter()
        .zip(result.history.dual.iter())
        .skip(1)
        .map(|(fp, fd)| fp - fd)
        .collect();

    for pair in gaps.windows(2) {
        assert!(
            pair[1] <= pair[0] + 1e-7,
            "gap increased: {} -> {}",
            pair[0],
            pair[1]
        );
    }
}

/// A nonsmooth objective still converges, with plane eviction enabled
#[test]
fn test_nonsmooth_risk_with_cleaning() {
    init_logs();
    let mut oracle = AbsoluteRisk {
        target: vec![1.0, -1.0],
    };

    let model = Bmrm::new()
        .with_lambda(0.1)
        .with_tol_rel(1e-5)
        .with_cleaning(true)
        .with_clean_after(3)
        .with_max_iterations(500)
        .train(&mut oracle)
        .expect("Training should succeed");

    assert!(model.status().converged(), "got {:?}", model.status());

    // for lambda <= 1 the regularized optimum sits at the kink
    assert!((model.weights()[0] - 1.0).abs() < 1e-2);
    assert!((model.weights()[1] + 1.0).abs() < 1e-2);
}

/// A tiny buffer ends the run gracefully with a best-effort iterate
#[test]
fn test_buffer_exhaustion_via_api() {
    init_logs();
    let mut oracle = QuadraticRisk {
        target: vec![5.0, 5.0],
    };

    let model = Bmrm::new()
        .with_lambda(1.0)
        .with_tol_rel(1e-12)
        .with_buf_size(2)
        .train(&mut oracle)
        .expect("Training should succeed");

    assert_eq!(model.status(), BmrmStatus::BufferExhausted);
    assert_eq!(model.status().code(), -1);
    assert!(model.iterations() <= 2);
    // the best-effort weights are still finite and populated
    assert!(model.weights().iter().all(|v| v.is_finite()));
}

/// Train, persist, reload, and score with the persisted model
#[test]
fn test_persistence_round_trip() {
    init_logs();
    let mut oracle = QuadraticRisk {
        target: vec![3.0, -2.0],
    };
    let model = Bmrm::new()
        .with_lambda(1.0)
        .with_tol_rel(1e-6)
        .train(&mut oracle)
        .expect("Training should succeed");

    let serializable = SerializableModel::from_trained_model(&model);
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    serializable
        .save_to_file(temp_file.path())
        .expect("Save should succeed");

    let loaded = SerializableModel::load_from_file(temp_file.path()).expect("Load should succeed");

    assert_eq!(loaded.weights, model.weights());
    assert_eq!(loaded.lambda, model.lambda());
    assert_eq!(
        loaded.metadata.training_summary.status_code,
        model.status().code()
    );

    let features = [1.0, 2.0];
    let score = loaded.score(&features).expect("Score should succeed");
    assert!((score - model.score(&features)).abs() < 1e-12);
}

/// Stepping manually exposes the same state the result reports
#[test]
fn test_manual_stepping_matches_result() {
    init_logs();
    let config = BmrmConfig {
        tol_rel: 1e-6,
        ..BmrmConfig::default()
    };

    let mut oracle = QuadraticRisk {
        target: vec![3.0, -2.0],
    };
    let mut w = vec![0.0; 2];
    let mut optimization =
        BmrmOptimization::new(&config, &mut oracle, &mut w).expect("setup should succeed");

    let mut steps = 0;
    while optimization.is_running() {
        optimization.step().expect("step should succeed");
        steps += 1;
        assert!(steps <= config.max_iterations, "runaway loop");
    }

    let iterations = optimization.iterations();
    let primal = optimization.primal();
    let dual = optimization.dual();
    let result = optimization.finish();

    assert_eq!(result.iterations, iterations);
    assert_eq!(result.iterations, steps);
    assert_eq!(result.primal, primal);
    assert_eq!(result.dual, dual);
    assert!(result.status.converged());
}
