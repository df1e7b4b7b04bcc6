//! One independent binary classifier per output column.
//!
//! Column `j` of the label matrix is learned from the full feature matrix
//! with no knowledge of the other columns. Columns are fitted in parallel;
//! every column builds its own classifier from the same seeded config, so
//! the result does not depend on thread scheduling.

use rayon::prelude::*;

use crate::config::ModelConfig;
use crate::error::{EngineError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::BinaryClassifier;
use crate::models::factory::build_model;

enum ColumnModel {
    /// Every training label in the column was this value.
    Constant(u8),
    Fitted(Box<dyn BinaryClassifier>),
}

pub struct MultiOutputClassifier {
    config: ModelConfig,
    columns: Vec<ColumnModel>,
    n_features: usize,
    fitted: bool,
}

impl MultiOutputClassifier {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            columns: Vec::new(),
            n_features: 0,
            fitted: false,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn n_outputs(&self) -> usize {
        self.columns.len()
    }

    /// Number of columns that needed a real classifier.
    pub fn n_fitted_columns(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| matches!(c, ColumnModel::Fitted(_)))
            .count()
    }

    /// Fit one classifier per column of `y`.
    pub fn fit(&mut self, x: &Array2<u8>, y: &Array2<u8>) -> Result<()> {
        if x.nrows() != y.nrows() {
            return Err(EngineError::Prediction(format!(
                "{} feature rows but {} label rows",
                x.nrows(),
                y.nrows()
            )));
        }
        if x.nrows() == 0 {
            return Err(EngineError::Prediction(
                "cannot fit on an empty training set".to_string(),
            ));
        }

        let features = x.mapv(|&v| f32::from(v));
        let config = &self.config;

        let columns = (0..y.ncols())
            .into_par_iter()
            .map(|col| {
                let labels = y.column(col);
                let first = labels[0];
                if labels.iter().all(|&label| label == first) {
                    return Ok(ColumnModel::Constant(first));
                }
                let mut model = build_model(config);
                model.fit(&features, &labels).map_err(|e| {
                    EngineError::Prediction(format!("column {}: {}", col, e))
                })?;
                log::trace!("Fitted {} for column {}", model.name(), col);
                Ok(ColumnModel::Fitted(model))
            })
            .collect::<Result<Vec<_>>>()?;

        self.columns = columns;
        self.n_features = x.ncols();
        self.fitted = true;

        log::debug!(
            "Fitted {} of {} output columns ({} constant)",
            self.n_fitted_columns(),
            self.n_outputs(),
            self.n_outputs() - self.n_fitted_columns()
        );
        Ok(())
    }

    /// Hard 0/1 decision for every output column of a single feature row.
    pub fn predict_one(&self, x: &[u8]) -> Result<Vec<u8>> {
        let row = Array2::from_shape_vec((1, x.len()), x.to_vec())
            .map_err(|e| EngineError::Prediction(e.to_string()))?;
        let predicted = self.predict(&row)?;
        Ok(predicted.row_slice(0).to_vec())
    }

    /// Hard 0/1 decisions, shape (n_samples, n_outputs).
    pub fn predict(&self, x: &Array2<u8>) -> Result<Array2<u8>> {
        if !self.fitted {
            return Err(EngineError::Prediction(
                "multi-output model used before fit".to_string(),
            ));
        }
        if x.ncols() != self.n_features {
            return Err(EngineError::Prediction(format!(
                "model expects {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        let features = x.mapv(|&v| f32::from(v));
        let mut out = Array2::zeros(x.nrows(), self.columns.len());
        for (col, column) in self.columns.iter().enumerate() {
            let decisions = match column {
                ColumnModel::Constant(value) => vec![*value; x.nrows()],
                ColumnModel::Fitted(model) => model.predict(&features)?,
            };
            for (row, decision) in decisions.into_iter().enumerate() {
                out[(row, col)] = decision;
            }
        }
        Ok(out)
    }
}
