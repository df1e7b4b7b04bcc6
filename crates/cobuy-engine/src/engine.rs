//! Recommendation engine: training orchestration and the prediction policy.
//!
//! The engine is either untrained or holds exactly one trained model. A
//! trained model is immutable; retraining builds a complete replacement and
//! swaps it in only when every step succeeded, so readers never observe a
//! half-trained state and a failed retrain keeps the previous model serving.
//!
//! Training runs are serialized by a dedicated mutex. Lazy training (first
//! `predict`/`all_products` on an untrained engine) re-checks the state after
//! taking that mutex, so concurrent first callers share a single run.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::io::{load_examples, TrainingExample};
use crate::models::MultiOutputClassifier;
use crate::preprocessing::MultiLabelBinarizer;
use crate::ProductId;

/// Number of products a recommendation request must carry.
pub const INPUT_ARITY: usize = 2;

/// Immutable result of one training run.
pub struct TrainedModel {
    binarizer: MultiLabelBinarizer,
    model: MultiOutputClassifier,
    n_examples: usize,
    source: PathBuf,
    trained_at: DateTime<Utc>,
}

impl TrainedModel {
    fn fit(examples: &[TrainingExample], engine_config: &EngineConfig, source: &Path) -> Result<Self> {
        let mut binarizer = MultiLabelBinarizer::new();
        binarizer.fit(examples);

        let inputs: Vec<&[ProductId]> = examples.iter().map(|ex| ex.input.as_slice()).collect();
        let targets: Vec<&[ProductId]> = examples.iter().map(|ex| ex.target.as_slice()).collect();
        let x = binarizer.transform(&inputs);
        let y = binarizer.transform(&targets);

        let mut model = MultiOutputClassifier::new(engine_config.model.clone());
        model.fit(&x, &y)?;

        Ok(Self {
            binarizer,
            model,
            n_examples: examples.len(),
            source: source.to_path_buf(),
            trained_at: Utc::now(),
        })
    }

    pub fn products(&self) -> &[ProductId] {
        self.binarizer.classes()
    }

    pub fn n_examples(&self) -> usize {
        self.n_examples
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Raw model candidates for an input set, ascending. Unknown IDs are ignored.
    fn candidates(&self, input_ids: &[ProductId]) -> Result<Option<Vec<ProductId>>> {
        let features = self.binarizer.transform_one(input_ids);
        if features.iter().all(|&v| v == 0) {
            return Ok(None);
        }
        let labels = self.model.predict_one(&features)?;
        Ok(Some(self.binarizer.inverse_positions(&labels)))
    }
}

/// Outcome of a successful `train()` call.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainSummary {
    pub n_examples: usize,
    pub products: Vec<ProductId>,
    pub source: PathBuf,
    pub trained_at: DateTime<Utc>,
}

pub struct RecommendationEngine {
    config: EngineConfig,
    state: RwLock<Option<Arc<TrainedModel>>>,
    training: Mutex<()>,
    training_runs: AtomicUsize,
}

impl RecommendationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: RwLock::new(None),
            training: Mutex::new(()),
            training_runs: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.current().is_some()
    }

    /// Number of training runs that completed successfully.
    pub fn training_runs(&self) -> usize {
        self.training_runs.load(Ordering::SeqCst)
    }

    /// The model currently serving predictions, if any.
    pub fn current(&self) -> Option<Arc<TrainedModel>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Train from `source`, or from the configured dataset when `None`.
    ///
    /// Always retrains. On failure the previous model, if any, is kept.
    pub fn train(&self, source: Option<&Path>) -> Result<TrainSummary> {
        let _guard = self.training.lock().unwrap_or_else(PoisonError::into_inner);
        let model = self.train_locked(source)?;
        Ok(TrainSummary {
            n_examples: model.n_examples(),
            products: model.products().to_vec(),
            source: model.source().to_path_buf(),
            trained_at: model.trained_at(),
        })
    }

    fn train_locked(&self, source: Option<&Path>) -> Result<Arc<TrainedModel>> {
        let source = source.unwrap_or(&self.config.dataset);
        let started = Instant::now();
        log::info!("Training recommendation model from {}", source.display());

        let examples = load_examples(source)?;
        let model = Arc::new(TrainedModel::fit(&examples, &self.config, source)?);

        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&model));
        self.training_runs.fetch_add(1, Ordering::SeqCst);

        log::info!(
            "Trained on {} examples over {} products in {:.2?}",
            model.n_examples(),
            model.products().len(),
            started.elapsed()
        );
        Ok(model)
    }

    /// Return the serving model, training from the default dataset first if
    /// nothing has been trained yet.
    fn ensure_trained(&self) -> Result<Arc<TrainedModel>> {
        if let Some(model) = self.current() {
            return Ok(model);
        }
        let _guard = self.training.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = self.current() {
            return Ok(model);
        }
        log::info!("No trained model yet; training on demand");
        self.train_locked(None)
    }

    /// Recommend products to go with exactly two input products.
    ///
    /// The result is ascending, never empty, and never contains an input
    /// product unless the input covers the whole fallback list.
    pub fn predict(&self, input_ids: &[ProductId]) -> Result<Vec<ProductId>> {
        if input_ids.len() != INPUT_ARITY {
            return Err(EngineError::Validation(format!(
                "exactly {} products are required, got {}",
                INPUT_ARITY,
                input_ids.len()
            )));
        }

        let model = self.ensure_trained()?;

        let Some(candidates) = model.candidates(input_ids)? else {
            log::warn!("None of {:?} seen in training; using fallback", input_ids);
            return Ok(self.fallback_for(input_ids));
        };
        if candidates.is_empty() {
            log::warn!("Model predicted nothing for {:?}; using fallback", input_ids);
            return Ok(self.fallback_for(input_ids));
        }

        let filtered: Vec<ProductId> = candidates
            .into_iter()
            .filter(|id| !input_ids.contains(id))
            .collect();
        if filtered.is_empty() {
            log::warn!("Only input products predicted for {:?}; using fallback", input_ids);
            return Ok(self.fallback_for(input_ids));
        }

        Ok(filtered)
    }

    /// Full product universe of the serving model, ascending.
    pub fn all_products(&self) -> Result<Vec<ProductId>> {
        Ok(self.ensure_trained()?.products().to_vec())
    }

    /// Configured fallback without the input products, unless that would
    /// leave nothing to suggest.
    fn fallback_for(&self, input_ids: &[ProductId]) -> Vec<ProductId> {
        let mut fallback: Vec<ProductId> = self
            .config
            .fallback
            .iter()
            .copied()
            .filter(|id| !input_ids.contains(id))
            .collect();
        if fallback.is_empty() {
            log::warn!(
                "Every fallback product is part of the input {:?}; returning it unfiltered",
                input_ids
            );
            fallback = self.config.fallback.clone();
        }
        fallback.sort_unstable();
        fallback.dedup();
        fallback
    }
}
