use ndarray::Array2;

/// A small trait abstraction for the classifier models used by the
/// positive-unlabeled trainer. Centralizing the contract in the `models`
/// module lets implementations live next to model code.
pub trait ClassifierModel {
    /// Fit the model. `y` uses the crate convention (1 positive, 0 negative).
    fn fit(&mut self, x: &Array2<f32>, y: &[i32]);

    /// Predict raw scores (may be margins or probabilistic depending on impl)
    fn predict(&self, x: &Array2<f32>) -> Vec<f32>;

    /// Predict positive-class probabilities in 0..1. Implementations that
    /// produce margins should convert appropriately.
    fn predict_proba(&self, x: &Array2<f32>) -> Vec<f32>;

    /// Per-feature importance over the columns seen at fit time, normalized
    /// to sum to one whenever the ensemble made any split.
    fn feature_importances(&self) -> Vec<f32>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
