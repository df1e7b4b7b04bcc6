use aprender::tree;
use aprender::Matrix;

use crate::error::{EngineError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::BinaryClassifier;

/// Bagged CART forest backed by `aprender`.
///
/// Every tree is grown on a bootstrap sample seeded from `random_state`, so
/// identical data and seed give an identical forest. A row is predicted
/// positive when strictly more than half of the trees vote for it.
pub struct RandomForestClassifier {
    model: Option<tree::RandomForestClassifier>,
    n_estimators: usize,
    max_depth: Option<usize>,
    random_state: u64,
    n_features: usize,
}

impl RandomForestClassifier {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            model: None,
            n_estimators,
            max_depth: None,
            random_state: 42,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    fn to_matrix(x: &Array2<f32>) -> Result<Matrix<f32>> {
        Matrix::from_vec(x.nrows(), x.ncols(), x.as_slice().to_vec())
            .map_err(|e| EngineError::Prediction(e.to_string()))
    }

    /// Fraction of trees voting positive, one value per row.
    pub fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| EngineError::Prediction("random forest used before fit".to_string()))?;
        if x.ncols() != self.n_features {
            return Err(EngineError::Prediction(format!(
                "random forest fitted on {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        let proba = model.predict_proba(&Self::to_matrix(x)?);
        let (n_rows, n_classes) = proba.shape();
        // a forest that only ever saw negatives has a single class column
        Ok((0..n_rows)
            .map(|row| if n_classes > 1 { proba.get(row, 1) } else { 0.0 })
            .collect())
    }
}

impl BinaryClassifier for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f32>, y: &[u8]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(EngineError::Prediction(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if self.n_estimators == 0 {
            return Err(EngineError::Prediction(
                "random forest needs at least one tree".to_string(),
            ));
        }

        let mut forest =
            tree::RandomForestClassifier::new(self.n_estimators).with_random_state(self.random_state);
        if let Some(depth) = self.max_depth {
            forest = forest.with_max_depth(depth);
        }

        let labels: Vec<usize> = y.iter().map(|&label| usize::from(label)).collect();
        forest
            .fit(&Self::to_matrix(x)?, &labels)
            .map_err(|e| EngineError::Prediction(e.to_string()))?;

        log::trace!(
            "Grew {} trees on {} samples",
            self.n_estimators,
            x.nrows()
        );
        self.model = Some(forest);
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f32>) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
