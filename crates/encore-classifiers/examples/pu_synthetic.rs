//! Train a preference model on a synthetic song table and print the result.
//!
//! Run with: cargo run --example pu_synthetic
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use encore_classifiers::config::TrainerConfig;
use encore_classifiers::metrics::roc_auc;
use encore_classifiers::pu_learner::PuLearner;
use encore_classifiers::table::FeatureTable;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let table = synthetic_song_table(42);
    let config = TrainerConfig {
        seed: Some(7),
        ..TrainerConfig::default()
    };

    let result = PuLearner::new(config).fit(&table)?;

    println!("Training rounds:");
    for round in &result.rounds {
        match (&round.pruned_feature, round.pruned_importance) {
            (Some(name), Some(importance)) => println!(
                "  round {}: {} features, {} reliable negatives, pruned '{}' ({:.4})",
                round.round, round.n_features, round.n_reliable_negatives, name, importance
            ),
            _ => println!(
                "  round {}: {} features, {} reliable negatives, converged",
                round.round, round.n_features, round.n_reliable_negatives
            ),
        }
    }
    println!("Retained features: {:?}", result.feature_names);

    let projected = table.project(&result.feature_names)?;
    let scores = result.predict_proba(&projected.x)?;
    let labels: Vec<bool> = table.is_positive.to_vec();
    println!(
        "AUC against the known positives: {:.3}",
        roc_auc(&scores, &labels)
    );

    Ok(())
}

/// 120 songs, 12 of them liked. Only "energy" tracks the preference; the
/// other columns are noise.
fn synthetic_song_table(seed: u64) -> FeatureTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let names = vec![
        "energy".to_string(),
        "danceability".to_string(),
        "valence".to_string(),
        "speechiness".to_string(),
        "liveness".to_string(),
    ];

    let mut values = Vec::with_capacity(120 * names.len());
    let mut labels = Vec::with_capacity(120);
    for i in 0..120 {
        let positive = i < 12;
        let energy = if positive {
            0.8 + rng.gen::<f32>() * 0.2
        } else {
            rng.gen::<f32>() * 0.2
        };
        values.push(energy);
        for _ in 1..names.len() {
            values.push(rng.gen::<f32>());
        }
        labels.push(positive);
    }

    let n_cols = names.len();
    FeatureTable::new(
        names,
        Array2::from_shape_vec((120, n_cols), values).expect("rows are rectangular"),
        Array1::from_vec(labels),
    )
    .expect("synthetic table is valid")
}
