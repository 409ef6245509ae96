//! Gradient-boosted decision tree classifier with logistic loss.
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::{ModelConfig, ModelType};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::tree::{RegressionTree, TreeParams};

/// Gradient Boosting Decision Tree (GBDT) classifier
pub struct GBDTClassifier {
    params: ModelConfig,
    seed: Option<u64>,
    base_score: f32,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl GBDTClassifier {
    pub fn new(params: ModelConfig, seed: Option<u64>) -> Self {
        GBDTClassifier {
            params,
            seed,
            base_score: 0.0,
            trees: Vec::new(),
            n_features: 0,
        }
    }
}

impl ClassifierModel for GBDTClassifier {
    fn fit(&mut self, x: &Array2<f32>, y: &[i32]) {
        let (max_depth, num_boost_round, subsample, reg_alpha, reg_lambda) =
            match self.params.model_type {
                ModelType::GBDT {
                    max_depth,
                    num_boost_round,
                    subsample,
                    reg_alpha,
                    reg_lambda,
                } => (max_depth, num_boost_round, subsample, reg_alpha, reg_lambda),
                ref other => panic!("Expected ModelType::GBDT params, got {:?}", other),
            };

        let n_rows = x.nrows();
        self.n_features = x.ncols();
        self.trees.clear();

        // Log-odds prior over the training labels.
        let positives = y.iter().filter(|&&v| v == 1).count();
        let negatives = n_rows - positives;
        self.base_score = if positives == 0 || negatives == 0 {
            0.0
        } else {
            ((positives as f32) / (negatives as f32)).ln()
        };

        let tree_params = TreeParams {
            max_depth,
            reg_alpha,
            reg_lambda,
            min_child_weight: 1.0,
        };

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let sample_size = (((n_rows as f32) * subsample).ceil() as usize).clamp(1, n_rows);
        let all_rows: Vec<usize> = (0..n_rows).collect();

        let mut scores = vec![self.base_score; n_rows];
        for round in 0..num_boost_round {
            let mut grad = vec![0.0f32; n_rows];
            let mut hess = vec![0.0f32; n_rows];
            for i in 0..n_rows {
                let p = sigmoid(scores[i]);
                grad[i] = p - y[i] as f32;
                hess[i] = (p * (1.0 - p)).max(1e-16);
            }

            let rows: Vec<usize> = if sample_size < n_rows {
                let mut chosen: Vec<usize> = all_rows
                    .choose_multiple(&mut rng, sample_size)
                    .copied()
                    .collect();
                chosen.sort_unstable();
                chosen
            } else {
                all_rows.clone()
            };

            let mut tree = RegressionTree::fit(x, &grad, &hess, &rows, &tree_params);
            tree.scale_leaves(self.params.learning_rate);
            for i in 0..n_rows {
                scores[i] += tree.predict_row(x.row(i));
            }
            log::trace!(
                "Boosting round {}/{}: tree with {} nodes",
                round + 1,
                num_boost_round,
                tree.n_nodes()
            );
            self.trees.push(tree);
        }
    }

    fn predict(&self, x: &Array2<f32>) -> Vec<f32> {
        (0..x.nrows())
            .map(|i| {
                let row = x.row(i);
                self.base_score + self.trees.iter().map(|t| t.predict_row(row)).sum::<f32>()
            })
            .collect()
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Vec<f32> {
        self.predict(x).into_iter().map(sigmoid).collect()
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
        "gbdt"
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn separable_data() -> (Array2<f32>, Vec<i32>) {
        // Liked tracks cluster at high energy, the rest at low energy; the
        // second column is uninformative.
        let x = Array2::from_shape_vec(
            (10, 2),
            vec![
                2.0, 0.3, //
                2.2, -0.1, //
                2.1, 0.4, //
                1.9, 0.0, //
                2.3, -0.2, //
                0.1, 0.3, //
                0.2, -0.1, //
                0.0, 0.4, //
                0.3, 0.0, //
                0.1, -0.2,
            ],
        )
        .unwrap();
        let y = vec![1, 1, 1, 1, 1, 0, 0, 0, 0, 0];
        (x, y)
    }

    fn test_config() -> ModelConfig {
        ModelConfig {
            learning_rate: 0.1,
            model_type: ModelType::GBDT {
                max_depth: 3,
                num_boost_round: 50,
                subsample: 1.0,
                reg_alpha: 0.1,
                reg_lambda: 0.1,
            },
        }
    }

    #[test]
    fn fit_separates_the_classes() {
        let (x, y) = separable_data();
        let mut model = GBDTClassifier::new(test_config(), Some(7));
        model.fit(&x, &y);

        let proba = model.predict_proba(&x);
        assert_eq!(proba.len(), 10);
        for i in 0..5 {
            assert!(proba[i] > 0.5, "positive row {} scored {}", i, proba[i]);
        }
        for i in 5..10 {
            assert!(proba[i] < 0.5, "negative row {} scored {}", i, proba[i]);
        }
    }

    #[test]
    fn probabilities_stay_in_unit_interval() {
        let (x, y) = separable_data();
        let mut model = GBDTClassifier::new(test_config(), Some(7));
        model.fit(&x, &y);
        for p in model.predict_proba(&x) {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn importances_concentrate_on_the_informative_feature() {
        let (x, y) = separable_data();
        let mut model = GBDTClassifier::new(test_config(), Some(7));
        model.fit(&x, &y);

        let importance = model.feature_importances();
        assert_eq!(importance.len(), 2);
        let total: f32 = importance.iter().sum();
        assert!((total - 1.0).abs() < 1e-5, "importances should sum to 1, got {}", total);
        assert!(
            importance[0] > importance[1],
            "energy should outweigh the noise column: {:?}",
            importance
        );
    }

    #[test]
    fn same_seed_reproduces_predictions() {
        let (x, y) = separable_data();
        let subsampled = ModelConfig {
            learning_rate: 0.1,
            model_type: ModelType::GBDT {
                max_depth: 3,
                num_boost_round: 20,
                subsample: 0.5,
                reg_alpha: 0.1,
                reg_lambda: 0.1,
            },
        };

        let mut a = GBDTClassifier::new(subsampled.clone(), Some(42));
        a.fit(&x, &y);
        let mut b = GBDTClassifier::new(subsampled, Some(42));
        b.fit(&x, &y);

        assert_eq!(a.predict_proba(&x), b.predict_proba(&x));
    }

    #[test]
    fn single_class_input_falls_back_to_flat_scores() {
        let (x, _) = separable_data();
        let y = vec![1; 10];
        let mut model = GBDTClassifier::new(test_config(), Some(7));
        model.fit(&x, &y);

        // No class contrast, so the prior is zero log-odds.
        let proba = model.predict_proba(&x);
        for p in proba {
            assert!(p > 0.4, "all-positive fit should not score rows low, got {}", p);
        }
    }
}
