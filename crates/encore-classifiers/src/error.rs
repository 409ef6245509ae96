use std::error::Error;
use std::fmt;

/// Custom error type for training loop failures
#[derive(Debug)]
pub enum TrainError {
    /// A label class needed for fitting is missing from the input table.
    InsufficientData { positives: usize, unlabeled: usize },
    /// No unlabeled row scored as a reliable negative this round.
    DegenerateTrainingSet { threshold: f32 },
    /// Shape or column bookkeeping went out of sync.
    InvariantViolation(String),
    /// The caller requested cancellation between rounds.
    Cancelled,
}

impl fmt::Display for TrainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrainError::InsufficientData {
                positives,
                unlabeled,
            } => write!(
                f,
                "Training needs at least one positive and one unlabeled row, got {} positives and {} unlabeled",
                positives, unlabeled
            ),
            TrainError::DegenerateTrainingSet { threshold } => write!(
                f,
                "No unlabeled rows qualified as reliable negatives at threshold {}",
                threshold
            ),
            TrainError::InvariantViolation(msg) => write!(f, "Invariant violation: {}", msg),
            TrainError::Cancelled => write!(f, "Training cancelled by caller"),
        }
    }
}

impl Error for TrainError {}
