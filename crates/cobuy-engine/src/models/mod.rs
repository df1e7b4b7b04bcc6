pub mod classifier_trait;
pub mod factory;
pub mod gbdt;
pub mod multi_output;
pub mod random_forest;

pub use classifier_trait::BinaryClassifier;
pub use multi_output::MultiOutputClassifier;
