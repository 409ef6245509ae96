use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Central configuration for models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ModelConfig {
    pub learning_rate: f32,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub enum ModelType {
    GBDT {
        max_depth: u32,
        num_boost_round: u32,
        /// Fraction of rows drawn (without replacement) per boosting round.
        subsample: f32,
        /// L1 regularization on leaf weights.
        reg_alpha: f32,
        /// L2 regularization on leaf weights.
        reg_lambda: f32,
    },
    RandomForest {
        n_trees: u32,
        max_depth: u32,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::GBDT {
            max_depth: 6,
            num_boost_round: 100,
            subsample: 0.5,
            reg_alpha: 0.1,
            reg_lambda: 0.1,
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gbdt" => Ok(ModelType::default()),
            "random_forest" | "rf" => Ok(ModelType::RandomForest {
                n_trees: 100,
                max_depth: 8,
            }),
            _ => Err(format!(
                "Unknown model type: {}. Expected 'gbdt' or 'random_forest'",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(learning_rate: f32, model_type: ModelType) -> Self {
        Self {
            learning_rate,
            model_type,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            model_type: ModelType::default(),
        }
    }
}

/// How predicted probabilities are compared against the negative threshold
/// when mining reliable negatives from the unlabeled pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativePolarity {
    /// Keep unlabeled rows whose positive-class probability is at or below
    /// the threshold. A row scoring exactly at the threshold qualifies.
    PositiveProbAtMost,
    /// Keep unlabeled rows whose negative-class probability is strictly below
    /// the threshold. Kept for parity with an earlier evaluation harness.
    NegativeProbBelow,
}

/// Parameters for the full positive-unlabeled training loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Probability cutoff for reliable-negative mining.
    pub negative_threshold: f32,
    pub polarity: NegativePolarity,
    /// Features whose normalized importance falls strictly below this value
    /// are candidates for pruning, weakest first.
    pub importance_threshold: f32,
    /// Equalize class counts with synthetic minority rows before refitting.
    pub enable_rebalancing: bool,
    pub smote_neighbors: usize,
    /// Seed for model subsampling and oversampling. `None` means a fresh
    /// entropy seed per run.
    pub seed: Option<u64>,
    pub model: ModelConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            negative_threshold: 0.1,
            polarity: NegativePolarity::PositiveProbAtMost,
            importance_threshold: 0.1,
            enable_rebalancing: false,
            smote_neighbors: 5,
            seed: None,
            model: ModelConfig::default(),
        }
    }
}
