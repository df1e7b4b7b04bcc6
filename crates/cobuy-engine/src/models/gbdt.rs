use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;

use crate::config::{ModelConfig, ModelType};
use crate::error::{EngineError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::BinaryClassifier;

/// Gradient Boosting Decision Tree (GBDT) classifier
pub struct GBDTClassifier {
    model: Option<GBDT>,
    params: ModelConfig,
    n_features: usize,
}

impl GBDTClassifier {
    pub fn new(params: ModelConfig) -> Self {
        GBDTClassifier {
            model: None,
            params,
            n_features: 0,
        }
    }

    fn to_data(x: &Array2<f32>, labels: Option<&[u8]>) -> DataVec {
        let mut data = DataVec::new();
        for row in 0..x.nrows() {
            let features = x.row_slice(row).to_vec();
            // log-likelihood loss expects labels in {-1, 1}
            let label = labels.map_or(0.0, |y| if y[row] == 1 { 1.0 } else { -1.0 });
            data.push(Data::new_training_data(features, 1.0, label, None));
        }
        data
    }

    /// Positive-class probability per row.
    pub fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| EngineError::Prediction("GBDT used before fit".to_string()))?;
        if x.ncols() != self.n_features {
            return Err(EngineError::Prediction(format!(
                "GBDT fitted on {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        Ok(model.predict(&Self::to_data(x, None)))
    }
}

impl BinaryClassifier for GBDTClassifier {
    fn fit(&mut self, x: &Array2<f32>, y: &[u8]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(EngineError::Prediction(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }

        match &self.params.model_type {
            ModelType::GBDT {
                max_depth,
                num_boost_round,
                learning_rate,
                debug,
                training_optimization_level,
                loss_type,
            } => {
                let mut config = Config::new();

                config.set_feature_size(x.ncols());
                config.set_shrinkage(*learning_rate);
                config.set_max_depth(*max_depth);
                config.set_iterations(*num_boost_round as usize);
                config.set_debug(*debug);
                config.set_training_optimization_level(*training_optimization_level);
                config.set_loss(loss_type);

                let mut gbdt = GBDT::new(&config);
                let mut train_x = Self::to_data(x, Some(y));
                gbdt.fit(&mut train_x);

                self.model = Some(gbdt);
                self.n_features = x.ncols();
                Ok(())
            }
            other => Err(EngineError::Prediction(format!(
                "Expected ModelType::GBDT params, got {}",
                other.name()
            ))),
        }
    }

    fn predict(&self, x: &Array2<f32>) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_gbdt_classifier() {
        // second feature decides the label
        let x = Array2::from_shape_vec(
            (10, 3),
            vec![
                0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0,
                0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0,
            ],
        )
        .unwrap();
        let y: Vec<u8> = (0..10).map(|r| x[(r, 1)] as u8).collect();

        let params = ModelConfig::new(42, ModelType::from_str("gbdt").unwrap());
        let mut classifier = GBDTClassifier::new(params);
        classifier.fit(&x, &y).unwrap();

        let probs = classifier.predict_proba(&x).unwrap();
        assert_eq!(probs.len(), x.nrows());
        assert_eq!(classifier.predict(&x).unwrap().len(), y.len());
    }

    #[test]
    fn test_gbdt_rejects_forest_params() {
        let x = Array2::from_shape_vec((2, 1), vec![0.0, 1.0]).unwrap();
        let mut classifier = GBDTClassifier::new(ModelConfig::default());
        assert!(classifier.fit(&x, &[0, 1]).is_err());
        assert!(classifier.predict(&x).is_err());
    }
}
