//! The positive-unlabeled training loop.
//!
//! Each round fits a probabilistic classifier treating every unlabeled row as
//! negative, mines reliable negatives from the unlabeled pool, and refits on
//! the positives plus those negatives (optionally SMOTE-balanced). After the
//! refit, the single weakest feature is pruned while its importance falls
//! below the configured threshold; training ends when nothing more can be
//! pruned, returning the final model and the surviving feature set.
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::Array2;

use crate::config::{NegativePolarity, TrainerConfig};
use crate::error::TrainError;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::factory::build_model;
use crate::sampling::Smote;
use crate::table::FeatureTable;

/// A converged preference model plus the features it expects, in column order.
pub struct PuModel {
    pub model: Box<dyn ClassifierModel>,
    pub feature_names: Vec<String>,
    /// One summary per training round, in order.
    pub rounds: Vec<RoundSummary>,
}

impl PuModel {
    /// Score rows laid out in this model's feature order.
    pub fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>, TrainError> {
        if x.ncols() != self.feature_names.len() {
            return Err(TrainError::InvariantViolation(format!(
                "Model expects {} features, got {} columns",
                self.feature_names.len(),
                x.ncols()
            )));
        }
        Ok(self.model.predict_proba(x))
    }
}

// The boxed model is not `Debug`; print its name instead.
impl fmt::Debug for PuModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PuModel")
            .field("model", &self.model.name())
            .field("feature_names", &self.feature_names)
            .field("rounds", &self.rounds)
            .finish()
    }
}

/// What happened in one round of the loop.
#[derive(Debug, Clone)]
pub struct RoundSummary {
    /// 1-based round number.
    pub round: usize,
    /// Features available when the round started.
    pub n_features: usize,
    pub n_reliable_negatives: usize,
    /// Whether synthetic minority rows were added before the refit.
    pub oversampled: bool,
    pub pruned_feature: Option<String>,
    pub pruned_importance: Option<f32>,
}

/// Stages of one pass through the pruning loop.
enum LoopState {
    Training,
    Evaluating { importances: Vec<f32> },
    Pruned { feature: usize, importance: f32 },
    Converged,
}

pub struct PuLearner {
    config: TrainerConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl PuLearner {
    pub fn new(config: TrainerConfig) -> Self {
        PuLearner {
            config,
            cancel: None,
        }
    }

    /// Install a flag checked at the top of every round; setting it makes
    /// `fit` return [`TrainError::Cancelled`].
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Run the full loop on a labeled table until the feature set converges.
    pub fn fit(&self, table: &FeatureTable) -> Result<PuModel, TrainError> {
        let n_positives = table.n_positives();
        let n_unlabeled = table.n_rows() - n_positives;
        if n_positives == 0 || n_unlabeled == 0 {
            return Err(TrainError::InsufficientData {
                positives: n_positives,
                unlabeled: n_unlabeled,
            });
        }
        table.log_input_summary();

        let initial_features = table.n_features();
        let mut working = table.clone();
        let mut rounds: Vec<RoundSummary> = Vec::new();
        let mut model: Option<Box<dyn ClassifierModel>> = None;
        let mut state = LoopState::Training;

        loop {
            state = match state {
                LoopState::Training => {
                    self.check_cancelled()?;
                    // Each round removes a feature, so the loop is bounded by
                    // the starting feature count.
                    if rounds.len() == initial_features {
                        return Err(TrainError::InvariantViolation(format!(
                            "Pruning loop exceeded {} rounds",
                            initial_features
                        )));
                    }
                    let (fitted, summary) = self.train_round(&working, rounds.len() + 1)?;
                    let importances = fitted.feature_importances();
                    model = Some(fitted);
                    rounds.push(summary);
                    LoopState::Evaluating { importances }
                }
                LoopState::Evaluating { importances } => {
                    if importances.len() != working.n_features() {
                        return Err(TrainError::InvariantViolation(format!(
                            "Importance vector has {} entries for {} features",
                            importances.len(),
                            working.n_features()
                        )));
                    }
                    match prune_decision(&importances, self.config.importance_threshold) {
                        Some((feature, importance)) => LoopState::Pruned {
                            feature,
                            importance,
                        },
                        None => LoopState::Converged,
                    }
                }
                LoopState::Pruned {
                    feature,
                    importance,
                } => {
                    let name = working.feature_names[feature].clone();
                    log::info!(
                        "Pruning feature '{}' (importance {:.4} < {:.4}); {} features remain",
                        name,
                        importance,
                        self.config.importance_threshold,
                        working.n_features() - 1
                    );
                    if let Some(summary) = rounds.last_mut() {
                        summary.pruned_feature = Some(name.clone());
                        summary.pruned_importance = Some(importance);
                    }
                    working = working
                        .drop_feature(&name)
                        .map_err(|e| TrainError::InvariantViolation(e.to_string()))?;
                    LoopState::Training
                }
                LoopState::Converged => break,
            };
        }

        let model = model.ok_or_else(|| {
            TrainError::InvariantViolation("Converged without training a model".to_string())
        })?;
        log::info!(
            "Converged after {} rounds with {} features retained",
            rounds.len(),
            working.n_features()
        );

        Ok(PuModel {
            model,
            feature_names: working.feature_names.clone(),
            rounds,
        })
    }

    /// Base fit, reliable-negative mining, and the refit for a single round.
    fn train_round(
        &self,
        table: &FeatureTable,
        round: usize,
    ) -> Result<(Box<dyn ClassifierModel>, RoundSummary), TrainError> {
        // Base fit treats the whole unlabeled pool as negative.
        let y_base: Vec<i32> = table
            .is_positive
            .iter()
            .map(|&p| if p { 1 } else { 0 })
            .collect();
        let mut base = build_model(self.config.model.clone(), self.config.seed);
        base.fit(&table.x, &y_base);
        let probabilities = base.predict_proba(&table.x);

        let reliable = select_reliable_negatives(
            table,
            &probabilities,
            self.config.negative_threshold,
            self.config.polarity,
        )?;
        log::info!(
            "Round {}: mined {} reliable negatives from {} unlabeled rows",
            round,
            reliable.len(),
            table.n_rows() - table.n_positives()
        );
        if reliable.is_empty() {
            return Err(TrainError::DegenerateTrainingSet {
                threshold: self.config.negative_threshold,
            });
        }

        // Positives first and exactly once, then the mined negatives.
        let mut train_rows = table.positive_indices();
        let n_positives = train_rows.len();
        train_rows.extend_from_slice(&reliable);
        let training = table.select_rows(&train_rows);
        let mut y_train: Vec<i32> = vec![1; n_positives];
        y_train.extend(std::iter::repeat(0).take(reliable.len()));

        let (x_train, y_train, oversampled) = if self.config.enable_rebalancing {
            let rows_before = y_train.len();
            let smote = Smote::new(self.config.smote_neighbors, self.config.seed);
            match smote.fit_resample(&training.x, &y_train) {
                Ok((x, y)) => {
                    let grew = y.len() > rows_before;
                    if grew {
                        log::debug!(
                            "Round {}: oversampling added {} synthetic rows",
                            round,
                            y.len() - rows_before
                        );
                    }
                    (x, y, grew)
                }
                Err(err) => {
                    log::warn!("Skipping oversampling this round: {}", err);
                    (training.x.clone(), y_train, false)
                }
            }
        } else {
            (training.x.clone(), y_train, false)
        };

        let mut model = build_model(self.config.model.clone(), self.config.seed);
        model.fit(&x_train, &y_train);

        let summary = RoundSummary {
            round,
            n_features: table.n_features(),
            n_reliable_negatives: reliable.len(),
            oversampled,
            pruned_feature: None,
            pruned_importance: None,
        };
        Ok((model, summary))
    }

    fn check_cancelled(&self) -> Result<(), TrainError> {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Err(TrainError::Cancelled);
            }
        }
        Ok(())
    }
}

/// Unlabeled row indices the base model scores confidently negative.
///
/// The probability slice must cover every row of `table`, in row order.
pub fn select_reliable_negatives(
    table: &FeatureTable,
    probabilities: &[f32],
    threshold: f32,
    polarity: NegativePolarity,
) -> Result<Vec<usize>, TrainError> {
    if probabilities.len() != table.n_rows() {
        return Err(TrainError::InvariantViolation(format!(
            "Got {} probabilities for {} rows",
            probabilities.len(),
            table.n_rows()
        )));
    }
    Ok(table
        .unlabeled_indices()
        .into_iter()
        .filter(|&i| {
            let p = probabilities[i];
            match polarity {
                NegativePolarity::PositiveProbAtMost => p <= threshold,
                NegativePolarity::NegativeProbBelow => (1.0 - p) < threshold,
            }
        })
        .collect())
}

/// Pick the weakest feature if it falls strictly below the threshold and more
/// than one feature remains. Ties go to the lowest column index.
fn prune_decision(importances: &[f32], threshold: f32) -> Option<(usize, f32)> {
    if importances.len() <= 1 {
        return None;
    }
    let mut weakest = 0;
    for (i, &value) in importances.iter().enumerate().skip(1) {
        if value < importances[weakest] {
            weakest = i;
        }
    }
    let lowest = importances[weakest];
    if lowest < threshold {
        Some((weakest, lowest))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prune_picks_the_weakest_feature() {
        assert_eq!(prune_decision(&[0.05, 0.95], 0.1), Some((0, 0.05)));
        assert_eq!(prune_decision(&[0.95, 0.05], 0.1), Some((1, 0.05)));
    }

    #[test]
    fn importance_exactly_at_threshold_is_retained() {
        assert_eq!(prune_decision(&[0.1, 0.9], 0.1), None);
    }

    #[test]
    fn last_feature_is_never_pruned() {
        assert_eq!(prune_decision(&[0.0], 0.1), None);
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        assert_eq!(prune_decision(&[0.4, 0.02, 0.02, 0.56], 0.1), Some((1, 0.02)));
    }

    #[test]
    fn strong_features_converge() {
        assert_eq!(prune_decision(&[0.5, 0.5], 0.1), None);
    }
}
