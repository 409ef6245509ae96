//! encore-classifiers: positive-unlabeled learning for music preference models.
//!
//! This crate trains a binary "will the user like this song" classifier from a
//! handful of positively labeled tracks and a much larger pool of unlabeled
//! ones. Reliable negatives are mined from the unlabeled pool with a
//! self-trained probabilistic model, the classifier is refit on the cleaned-up
//! training set, and low-importance features are pruned one per round until
//! the model stabilizes.
//!
//! The design favors small, testable modules: tree-ensemble models behind a
//! common trait, a validated feature-table container, and CSV adapters kept
//! separate from the training loop.
pub mod config;
pub mod error;
pub mod io;
pub mod metrics;
pub mod models;
pub mod pu_learner;
pub mod sampling;
pub mod table;
