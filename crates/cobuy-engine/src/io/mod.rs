//! IO utilities for loading co-purchase datasets.

pub mod dataset;

pub use dataset::{
    load_examples, load_examples_with_config, parse_id_list, DatasetReaderConfig, TrainingExample,
};
