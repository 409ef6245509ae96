//! Score a labeled song CSV end to end.
//!
//! Usage: cargo run --example train_from_csv -- songs.csv [gbdt|random_forest]
use std::env;
use std::str::FromStr;

use anyhow::{bail, Context};

use encore_classifiers::config::{ModelType, TrainerConfig};
use encore_classifiers::io::read_table_csv;
use encore_classifiers::metrics::roc_auc;
use encore_classifiers::pu_learner::PuLearner;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let path = match args.next() {
        Some(path) => path,
        None => bail!("Usage: train_from_csv <songs.csv> [gbdt|random_forest]"),
    };

    let mut config = TrainerConfig {
        seed: Some(42),
        ..TrainerConfig::default()
    };
    if let Some(model) = args.next() {
        config.model.model_type = ModelType::from_str(&model).map_err(anyhow::Error::msg)?;
    }

    let parsed = read_table_csv(&path).with_context(|| format!("Failed to read {}", path))?;
    let result = PuLearner::new(config).fit(&parsed.table)?;

    println!(
        "Converged after {} rounds; retained features: {:?}",
        result.rounds.len(),
        result.feature_names
    );

    let projected = parsed.table.project(&result.feature_names)?;
    let scores = result.predict_proba(&projected.x)?;
    let labels: Vec<bool> = parsed.table.is_positive.to_vec();
    println!(
        "AUC against the known positives: {:.3}",
        roc_auc(&scores, &labels)
    );

    Ok(())
}
