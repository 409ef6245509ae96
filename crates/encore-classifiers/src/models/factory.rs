use crate::config::{ModelConfig, ModelType};
use crate::models::classifier_trait::ClassifierModel;

/// Build a boxed classifier model from a `ModelConfig`.
/// Currently this is a thin factory implemented as a single function.
pub fn build_model(params: ModelConfig, seed: Option<u64>) -> Box<dyn ClassifierModel> {
    match params.model_type {
        ModelType::GBDT { .. } => {
            Box::new(crate::models::gbdt::GBDTClassifier::new(params, seed))
        }
        ModelType::RandomForest { .. } => Box::new(
            crate::models::forest::RandomForestClassifier::new(params, seed),
        ),
    }
}
