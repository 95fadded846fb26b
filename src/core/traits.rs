//! Core traits for the bundle-method optimizer

/// Risk oracle for the regularized objective `risk(w) + 0.5 * lambda * ||w||^2`
///
/// This is the single coupling point between the optimizer and the model
/// being trained (a structured-output SVM, a regression loss, ...). The
/// oracle is called once per outer iteration with the current weight
/// vector and must return the unregularized risk while writing a valid
/// subgradient of the risk at `w` into `subgradient`.
pub trait RiskOracle {
    /// Dimension of the weight vector (and of every subgradient)
    fn dim(&self) -> usize;

    /// Evaluate the risk at `w`, filling `subgradient` (length `dim()`)
    fn risk(&mut self, w: &[f64], subgradient: &mut [f64]) -> f64;
}

/// Column access to a symmetric positive semi-definite matrix
///
/// The generalized-SMO solver never assumes a particular matrix layout;
/// it only asks for single columns and the precomputed diagonal. Both
/// slices must cover at least the current problem size.
pub trait ColumnOracle {
    /// Column `j` of the matrix
    fn column(&self, j: usize) -> &[f64];

    /// The matrix diagonal
    fn diagonal(&self) -> &[f64];
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SquaredNorm;

    impl RiskOracle for SquaredNorm {
        fn dim(&self) -> usize {
            3
        }

        fn risk(&mut self, w: &[f64], subgradient: &mut [f64]) -> f64 {
            subgradient.copy_from_slice(w);
            0.5 * w.iter().map(|v| v * v).sum::<f64>()
        }
    }

    #[test]
    fn test_risk_oracle_contract() {
        let mut oracle = SquaredNorm;
        let w = [1.0, 2.0, 2.0];
        let mut grad = [0.0; 3];

        let risk = oracle.risk(&w, &mut grad);
        assert_eq!(oracle.dim(), 3);
        assert_eq!(risk, 4.5);
        assert_eq!(grad, w);
    }
}
