//! cobuy-engine: co-purchase recommendations from a multi-label classifier.
//!
//! Given two product IDs, the engine answers with other products that are
//! likely to be bought together with them. Training data is a table of
//! (input-set, target-set) observations. Product sets are binarized against
//! a sorted product universe, and one independent binary classifier is
//! trained per universe position. Predictions are decoded back to product
//! IDs, products already in the input are removed, and a configured
//! fallback list covers the case where nothing usable is predicted.
//!
//! The crate also carries the framework-agnostic request/response boundary
//! (`service`) and an append-only recommendation history (`history`).
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod io;
pub mod math;
pub mod models;
pub mod preprocessing;
pub mod service;

/// Opaque catalog identifier.
pub type ProductId = i64;

pub use config::{EngineConfig, ModelConfig, ModelType};
pub use engine::{RecommendationEngine, TrainSummary};
pub use error::EngineError;
