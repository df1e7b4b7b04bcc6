use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ProductId;

/// Supported per-column classifiers and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    RandomForest {
        n_estimators: usize,
        max_depth: Option<usize>,
    },
    GBDT {
        max_depth: u32,
        num_boost_round: u32,
        learning_rate: f32,
        debug: bool,
        training_optimization_level: u8,
        loss_type: String,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::RandomForest {
            n_estimators: 100,
            max_depth: None,
        }
    }
}

impl ModelType {
    pub fn name(&self) -> &'static str {
        match self {
            ModelType::RandomForest { .. } => "random_forest",
            ModelType::GBDT { .. } => "gbdt",
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random_forest" | "random-forest" | "rf" => Ok(ModelType::default()),
            "gbdt" => Ok(ModelType::GBDT {
                max_depth: 6,
                num_boost_round: 50,
                learning_rate: 0.1,
                debug: false,
                training_optimization_level: 2,
                loss_type: "LogLikelyhood".to_string(),
            }),
            _ => Err(format!(
                "Unknown model type: {}. Expected one of: random_forest, gbdt",
                s
            )),
        }
    }
}

/// Classifier settings shared by every per-product column.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Seed for every randomized step of training.
    pub seed: u64,
    pub model_type: ModelType,
}

impl ModelConfig {
    pub fn new(seed: u64, model_type: ModelType) -> Self {
        Self { seed, model_type }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            model_type: ModelType::default(),
        }
    }
}

/// Top-level engine configuration, usually read from a JSON file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Default training dataset (CSV or TSV).
    pub dataset: PathBuf,
    /// Suggestions returned when the model has nothing usable to offer.
    pub fallback: Vec<ProductId>,
    pub model: ModelConfig,
    /// JSON-lines file receiving one record per served recommendation.
    pub history: Option<PathBuf>,
    /// Address the HTTP server binds to.
    pub bind: String,
    /// Train once at server start instead of on the first request.
    pub pretrain: bool,
}

/// Co-purchase dataset shipped with this crate.
pub fn bundled_dataset() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("datasets")
        .join("train_input_target.csv")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dataset: bundled_dataset(),
            fallback: vec![1005],
            model: ModelConfig::default(),
            history: None,
            bind: "127.0.0.1:8000".to_string(),
            pretrain: true,
        }
    }
}

impl EngineConfig {
    pub fn with_dataset(mut self, dataset: impl Into<PathBuf>) -> Self {
        self.dataset = dataset.into();
        self
    }

    /// Anchor relative dataset and history paths at `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.dataset.is_relative() {
            self.dataset = base.join(&self.dataset);
        }
        if let Some(history) = self.history.as_mut().filter(|h| h.is_relative()) {
            *history = base.join(&*history);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fallback.is_empty() {
            anyhow::bail!("Fallback list must contain at least one product");
        }
        if let ModelType::RandomForest { n_estimators, .. } = self.model.model_type {
            if n_estimators == 0 {
                anyhow::bail!("Random forest needs at least one tree");
            }
        }
        Ok(())
    }
}

/// Load an engine configuration from a JSON file.
pub fn load_engine_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let mut config: EngineConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    // paths in a config file are relative to the file, not the working directory
    if let Some(base) = path.as_ref().parent() {
        config.resolve_paths(base);
    }
    config
        .validate()
        .with_context(|| format!("Invalid config: {}", path.as_ref().display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_model_type_from_str() {
        assert_eq!(ModelType::from_str("RF").unwrap(), ModelType::default());
        assert_eq!(ModelType::from_str("gbdt").unwrap().name(), "gbdt");
        assert!(ModelType::from_str("svm").is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"dataset": "data/other.csv", "model": {{"seed": 7}}}}"#).unwrap();
        let config = load_engine_config(file.path()).unwrap();
        let base = file.path().parent().unwrap();
        assert_eq!(config.dataset, base.join("data/other.csv"));
        assert_eq!(config.fallback, vec![1005]);
        assert_eq!(config.model.seed, 7);
        assert_eq!(config.model.model_type, ModelType::default());
    }

    #[test]
    fn test_default_dataset_does_not_depend_on_working_directory() {
        let dataset = EngineConfig::default().dataset;
        assert!(dataset.is_absolute());
        assert!(dataset.exists(), "{}", dataset.display());
    }

    #[test]
    fn test_config_file_paths_are_relative_to_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(
            &path,
            r#"{"dataset": "train.csv", "history": "logs/history.jsonl"}"#,
        )
        .unwrap();
        let config = load_engine_config(&path).unwrap();
        assert_eq!(config.dataset, dir.path().join("train.csv"));
        assert_eq!(config.history, Some(dir.path().join("logs/history.jsonl")));

        std::fs::write(&path, r#"{"model": {"seed": 3}}"#).unwrap();
        assert_eq!(load_engine_config(&path).unwrap().dataset, bundled_dataset());
    }

    #[test]
    fn test_empty_fallback_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"fallback": []}}"#).unwrap();
        assert!(load_engine_config(file.path()).is_err());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = EngineConfig {
            model: ModelConfig::new(1, ModelType::from_str("gbdt").unwrap()),
            ..EngineConfig::default()
        };
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
