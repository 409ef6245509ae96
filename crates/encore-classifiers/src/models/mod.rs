pub mod forest;
pub mod gbdt;
pub mod tree;

pub mod classifier_trait;
pub mod factory;
