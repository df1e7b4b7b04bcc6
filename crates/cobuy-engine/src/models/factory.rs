use crate::config::{ModelConfig, ModelType};
use crate::models::classifier_trait::BinaryClassifier;
use crate::models::gbdt::GBDTClassifier;
use crate::models::random_forest::RandomForestClassifier;

/// Build an unfitted boxed classifier from a `ModelConfig`.
pub fn build_model(params: &ModelConfig) -> Box<dyn BinaryClassifier> {
    match &params.model_type {
        ModelType::RandomForest {
            n_estimators,
            max_depth,
        } => Box::new(
            RandomForestClassifier::new(*n_estimators)
                .with_max_depth(*max_depth)
                .with_random_state(params.seed),
        ),
        ModelType::GBDT { .. } => Box::new(GBDTClassifier::new(params.clone())),
    }
}
