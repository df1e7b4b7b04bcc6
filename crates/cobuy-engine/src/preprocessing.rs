//! Product-set vectorization.
//!
//! `MultiLabelBinarizer` learns the product universe from training data and
//! encodes arbitrary product sets as fixed-width 0/1 indicator rows over it.
//! The universe is kept sorted so the ID ↔ column mapping only depends on
//! which IDs were seen, never on the order they were read in.

use std::collections::BTreeSet;

use crate::io::TrainingExample;
use crate::math::Array2;
use crate::ProductId;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiLabelBinarizer {
    classes: Vec<ProductId>,
}

impl MultiLabelBinarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the universe from every input and target set.
    pub fn fit(&mut self, examples: &[TrainingExample]) -> &[ProductId] {
        let universe: BTreeSet<ProductId> = examples
            .iter()
            .flat_map(|ex| ex.input.iter().chain(ex.target.iter()))
            .copied()
            .collect();
        self.classes = universe.into_iter().collect();
        &self.classes
    }

    /// Fitted universe, ascending.
    pub fn classes(&self) -> &[ProductId] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn index_of(&self, id: ProductId) -> Option<usize> {
        self.classes.binary_search(&id).ok()
    }

    /// Encode one set. IDs outside the universe have no column and are skipped.
    pub fn transform_one(&self, set: &[ProductId]) -> Vec<u8> {
        let mut row = vec![0u8; self.classes.len()];
        for &id in set {
            if let Some(idx) = self.index_of(id) {
                row[idx] = 1;
            }
        }
        row
    }

    /// Encode many sets, one row per set.
    pub fn transform<S: AsRef<[ProductId]>>(&self, sets: &[S]) -> Array2<u8> {
        let mut out = Array2::zeros(sets.len(), self.classes.len());
        for (row, set) in sets.iter().enumerate() {
            for &id in set.as_ref() {
                if let Some(col) = self.index_of(id) {
                    out[(row, col)] = 1;
                }
            }
        }
        out
    }

    /// Product IDs whose indicator is set, ascending.
    pub fn inverse_positions(&self, vector: &[u8]) -> Vec<ProductId> {
        vector
            .iter()
            .zip(self.classes.iter())
            .filter(|(flag, _)| **flag != 0)
            .map(|(_, &id)| id)
            .collect()
    }
}
