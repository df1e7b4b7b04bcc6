use crate::error::Result;
use crate::math::Array2;

/// Contract for the per-product binary classifiers.
///
/// Labels use 0/1. `predict` returns hard decisions at the classifier's own
/// default decision rule; no probabilities cross this boundary.
pub trait BinaryClassifier: Send + Sync {
    /// Fit the model on `x` (n_samples, n_features) and one label per row.
    fn fit(&mut self, x: &Array2<f32>, y: &[u8]) -> Result<()>;

    /// Predict one 0/1 decision per row of `x`.
    fn predict(&self, x: &Array2<f32>) -> Result<Vec<u8>>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
