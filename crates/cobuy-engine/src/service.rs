//! Request/response boundary shared by every front-end.
//!
//! These functions hold the behavior of the public operations independent of
//! any web framework: validation happens before the engine is touched, engine
//! failures become a status code plus message, and served recommendations are
//! handed to the history store.

use serde::{Deserialize, Serialize};

use crate::engine::{RecommendationEngine, INPUT_ARITY};
use crate::error::EngineError;
use crate::history::{HistoryRecord, HistoryStore};
use crate::ProductId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub input: Vec<ProductId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub input: Vec<ProductId>,
    pub suggested: Vec<ProductId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainResponse {
    pub message: String,
    pub products: Vec<ProductId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<ProductId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failure ready to be sent back to a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceError {
    pub status: u16,
    pub message: String,
}

impl ServiceError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: 500,
            message: message.into(),
        }
    }

    fn from_engine(err: EngineError, context: &str) -> Self {
        if err.is_client_error() {
            Self::bad_request(err.to_string())
        } else {
            Self::internal(format!("{}: {}", context, err))
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn body(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.message.clone(),
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.status)
    }
}

impl std::error::Error for ServiceError {}

/// Reject anything but exactly two product IDs.
pub fn validate_request(request: &RecommendationRequest) -> Result<[ProductId; 2], ServiceError> {
    match request.input.as_slice() {
        [a, b] => Ok([*a, *b]),
        other => Err(ServiceError::bad_request(format!(
            "Exactly {} products are required in the input, got {}",
            INPUT_ARITY,
            other.len()
        ))),
    }
}

/// Serve one recommendation request.
pub fn recommend(
    engine: &RecommendationEngine,
    history: Option<&dyn HistoryStore>,
    request: &RecommendationRequest,
) -> Result<RecommendationResponse, ServiceError> {
    let input = validate_request(request)?;

    let suggested = engine
        .predict(&input)
        .map_err(|e| ServiceError::from_engine(e, "Error generating recommendations"))?;

    if let Some(store) = history {
        let record = HistoryRecord::new(input.to_vec(), suggested.clone());
        if let Err(e) = store.record(&record) {
            log::warn!("Failed to record recommendation history: {:#}", e);
        }
    }

    Ok(RecommendationResponse {
        input: input.to_vec(),
        suggested,
    })
}

/// Retrain from the configured dataset and list the resulting products.
pub fn train(engine: &RecommendationEngine) -> Result<TrainResponse, ServiceError> {
    let summary = engine
        .train(None)
        .map_err(|e| ServiceError::from_engine(e, "Error training model"))?;
    Ok(TrainResponse {
        message: format!(
            "Model trained successfully on {} examples at {}",
            summary.n_examples,
            summary.trained_at.to_rfc3339()
        ),
        products: summary.products,
    })
}

/// List every product known to the serving model.
pub fn products(engine: &RecommendationEngine) -> Result<ProductsResponse, ServiceError> {
    let products = engine
        .all_products()
        .map_err(|e| ServiceError::from_engine(e, "Error listing products"))?;
    Ok(ProductsResponse { products })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::history::MemoryHistory;
    use std::io::Write;

    fn engine_with(rows: &str) -> (RecommendationEngine, tempfile::NamedTempFile) {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "input,target\n{}", rows).unwrap();
        let engine = RecommendationEngine::new(EngineConfig::default().with_dataset(file.path()));
        (engine, file)
    }

    #[test]
    fn test_validate_request_arity() {
        assert_eq!(
            validate_request(&RecommendationRequest { input: vec![1, 2] }).unwrap(),
            [1, 2]
        );
        for input in [vec![], vec![1], vec![1, 2, 3]] {
            let err = validate_request(&RecommendationRequest { input }).unwrap_err();
            assert_eq!(err.status, 400);
        }
    }

    #[test]
    fn test_recommend_records_history() {
        let rows = "\"[1, 2]\",\"[3]\"\n\"[3, 4]\",\"[1]\"\n".repeat(5);
        let (engine, _file) = engine_with(&rows);
        let history = MemoryHistory::new();

        let response = recommend(
            &engine,
            Some(&history),
            &RecommendationRequest { input: vec![1, 2] },
        )
        .unwrap();
        assert_eq!(response.input, vec![1, 2]);
        assert_eq!(response.suggested, vec![3]);
        assert_eq!(history.recent(1).unwrap()[0].recommended_products, vec![3]);
    }

    #[test]
    fn test_invalid_request_leaves_engine_and_history_alone() {
        let (engine, _file) = engine_with("\"[1, 2]\",\"[3]\"\n");
        let history = MemoryHistory::new();
        let err = recommend(&engine, Some(&history), &RecommendationRequest { input: vec![1] })
            .unwrap_err();
        assert!(err.is_client_error());
        assert!(!engine.is_trained());
        assert!(history.is_empty());
    }

    #[test]
    fn test_engine_failure_is_server_error() {
        let engine =
            RecommendationEngine::new(EngineConfig::default().with_dataset("/missing/data.csv"));
        let err = train(&engine).unwrap_err();
        assert_eq!(err.status, 500);
        assert!(err.body().error.starts_with("Error training model"));

        let err = recommend(&engine, None, &RecommendationRequest { input: vec![1, 2] })
            .unwrap_err();
        assert_eq!(err.status, 500);
    }

    #[test]
    fn test_train_lists_products() {
        let (engine, _file) = engine_with("\"[3, 1]\",\"[2]\"\n");
        let response = train(&engine).unwrap();
        assert_eq!(response.products, vec![1, 2, 3]);
        assert!(response.message.contains("1 examples"));
        let trained_at = engine.current().unwrap().trained_at();
        assert!(response.message.ends_with(&trained_at.to_rfc3339()));
        assert_eq!(products(&engine).unwrap().products, vec![1, 2, 3]);
    }
}
