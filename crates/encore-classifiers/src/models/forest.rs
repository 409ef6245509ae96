//! Bagged random-forest probability classifier.
//!
//! Each tree is a regression tree on the 0/1 labels grown from a bootstrap
//! sample, so leaf values are per-node positive fractions and the forest
//! average is already a probability.
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::{ModelConfig, ModelType};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::tree::{RegressionTree, TreeParams};

pub struct RandomForestClassifier {
    params: ModelConfig,
    seed: Option<u64>,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForestClassifier {
    pub fn new(params: ModelConfig, seed: Option<u64>) -> Self {
        RandomForestClassifier {
            params,
            seed,
            trees: Vec::new(),
            n_features: 0,
        }
    }
}

impl ClassifierModel for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f32>, y: &[i32]) {
        let (n_trees, max_depth) = match self.params.model_type {
            ModelType::RandomForest { n_trees, max_depth } => (n_trees, max_depth),
            ref other => panic!("Expected ModelType::RandomForest params, got {:?}", other),
        };

        let n_rows = x.nrows();
        self.n_features = x.ncols();

        // Mean-leaf statistics: g = -label, h = 1 gives leaf = label mean.
        let grad: Vec<f32> = y.iter().map(|&v| -(v as f32)).collect();
        let hess = vec![1.0f32; n_rows];
        let tree_params = TreeParams {
            max_depth,
            reg_alpha: 0.0,
            reg_lambda: 0.0,
            min_child_weight: 1.0,
        };

        // Draw one seed per tree up front so trees can grow in parallel
        // while staying reproducible.
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let tree_seeds: Vec<u64> = (0..n_trees).map(|_| rng.gen()).collect();

        self.trees = tree_seeds
            .into_par_iter()
            .map(|tree_seed| {
                let mut tree_rng = StdRng::seed_from_u64(tree_seed);
                let rows: Vec<usize> =
                    (0..n_rows).map(|_| tree_rng.gen_range(0..n_rows)).collect();
                RegressionTree::fit(x, &grad, &hess, &rows, &tree_params)
            })
            .collect();

        log::trace!("Grew {} bagged trees on {} rows", self.trees.len(), n_rows);
    }

    fn predict(&self, x: &Array2<f32>) -> Vec<f32> {
        self.predict_proba(x)
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Vec<f32> {
        let n_trees = self.trees.len().max(1) as f32;
        (0..x.nrows())
            .map(|i| {
                let row = x.row(i);
                let sum: f32 = self.trees.iter().map(|t| t.predict_row(row)).sum();
                (sum / n_trees).clamp(0.0, 1.0)
            })
            .collect()
    }

    fn feature_importances(&self) -> Vec<f32> {
        let mut importance = vec![0.0f32; self.n_features];
        for tree in &self.trees {
            tree.accumulate_gain(&mut importance);
        }
        let total: f32 = importance.iter().sum();
        if total > 0.0 {
            for value in importance.iter_mut() {
                *value /= total;
            }
        }
        importance
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
