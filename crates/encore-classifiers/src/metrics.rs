//! Evaluation metrics for binary preference scores.
use std::cmp::Ordering;

/// Counts of a thresholded binary prediction against known labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    /// Tally predictions, calling a row positive when its score reaches
    /// `threshold`.
    pub fn from_predictions(scores: &[f32], labels: &[bool], threshold: f32) -> Self {
        let mut matrix = ConfusionMatrix::default();
        for (&score, &label) in scores.iter().zip(labels.iter()) {
            let predicted = score >= threshold;
            match (predicted, label) {
                (true, true) => matrix.true_positives += 1,
                (true, false) => matrix.false_positives += 1,
                (false, false) => matrix.true_negatives += 1,
                (false, true) => matrix.false_negatives += 1,
            }
        }
        matrix
    }

    pub fn accuracy(&self) -> f32 {
        let total =
            self.true_positives + self.false_positives + self.true_negatives + self.false_negatives;
        if total == 0 {
            return 0.0;
        }
        (self.true_positives + self.true_negatives) as f32 / total as f32
    }

    pub fn precision(&self) -> f32 {
        let predicted_positive = self.true_positives + self.false_positives;
        if predicted_positive == 0 {
            return 0.0;
        }
        self.true_positives as f32 / predicted_positive as f32
    }

    pub fn recall(&self) -> f32 {
        let actual_positive = self.true_positives + self.false_negatives;
        if actual_positive == 0 {
            return 0.0;
        }
        self.true_positives as f32 / actual_positive as f32
    }

    pub fn f1(&self) -> f32 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            return 0.0;
        }
        2.0 * p * r / (p + r)
    }
}

/// Area under the ROC curve, with tied scores credited half a pair.
///
/// Returns 0.5 when only one class is present.
pub fn roc_auc(scores: &[f32], labels: &[bool]) -> f32 {
    let total_pos = labels.iter().filter(|&&l| l).count();
    let total_neg = labels.len() - total_pos;
    if total_pos == 0 || total_neg == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    let mut correct_pairs = 0.0f64;
    let mut negatives_below = 0usize;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        let mut group_pos = 0usize;
        let mut group_neg = 0usize;
        while j < order.len() && scores[order[j]] == scores[order[i]] {
            if labels[order[j]] {
                group_pos += 1;
            } else {
                group_neg += 1;
            }
            j += 1;
        }
        correct_pairs += group_pos as f64 * (negatives_below as f64 + 0.5 * group_neg as f64);
        negatives_below += group_neg;
        i = j;
    }

    (correct_pairs / (total_pos as f64 * total_neg as f64)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confusion_matrix_counts() {
        let scores = [0.9, 0.8, 0.3, 0.6, 0.2];
        let labels = [true, false, true, true, false];
        let matrix = ConfusionMatrix::from_predictions(&scores, &labels, 0.5);
        assert_eq!(matrix.true_positives, 2);
        assert_eq!(matrix.false_positives, 1);
        assert_eq!(matrix.true_negatives, 1);
        assert_eq!(matrix.false_negatives, 1);
    }

    #[test]
    fn derived_rates() {
        let matrix = ConfusionMatrix {
            true_positives: 2,
            false_positives: 1,
            true_negatives: 1,
            false_negatives: 1,
        };
        assert!((matrix.accuracy() - 0.6).abs() < 1e-6);
        assert!((matrix.precision() - 2.0 / 3.0).abs() < 1e-6);
        assert!((matrix.recall() - 2.0 / 3.0).abs() < 1e-6);
        assert!((matrix.f1() - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn empty_matrix_reports_zero() {
        let matrix = ConfusionMatrix::default();
        assert_eq!(matrix.accuracy(), 0.0);
        assert_eq!(matrix.precision(), 0.0);
        assert_eq!(matrix.recall(), 0.0);
        assert_eq!(matrix.f1(), 0.0);
    }

    #[test]
    fn auc_perfect_ranking() {
        let scores = [0.9, 0.8, 0.2, 0.1];
        let labels = [true, true, false, false];
        assert!((roc_auc(&scores, &labels) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn auc_reversed_ranking() {
        let scores = [0.1, 0.2, 0.8, 0.9];
        let labels = [true, true, false, false];
        assert!(roc_auc(&scores, &labels).abs() < 1e-6);
    }

    #[test]
    fn auc_mixed_ranking() {
        let scores = [0.1, 0.4, 0.35, 0.8];
        let labels = [false, false, true, true];
        assert!((roc_auc(&scores, &labels) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn auc_all_tied_is_half() {
        let scores = [0.5, 0.5, 0.5, 0.5];
        let labels = [true, false, true, false];
        assert!((roc_auc(&scores, &labels) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn auc_single_class_is_half() {
        let scores = [0.4, 0.6];
        let labels = [true, true];
        assert!((roc_auc(&scores, &labels) - 0.5).abs() < 1e-6);
    }
}
