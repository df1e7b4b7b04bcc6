//! Minimal dense matrix used for feature and label rows.
pub mod matrix;

pub use matrix::{Array2, ShapeError};
