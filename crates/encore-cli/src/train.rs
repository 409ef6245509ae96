//! CLI training helpers for encore-classifiers.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use encore_classifiers::config::TrainerConfig;
use encore_classifiers::io::{read_table_csv_with_config, write_scores_csv, CsvReaderConfig};
use encore_classifiers::metrics::roc_auc;
use encore_classifiers::pu_learner::{PuLearner, PuModel};

/// Parameters for one training job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainJobConfig {
    pub trainer: TrainerConfig,
    pub label_column: String,
    pub id_column: Option<String>,
    pub ignore_columns: Vec<String>,
}

impl Default for TrainJobConfig {
    fn default() -> Self {
        let reader = CsvReaderConfig::default();
        Self {
            trainer: TrainerConfig::default(),
            label_column: reader.label_column,
            id_column: reader.id_column,
            ignore_columns: reader.ignore_columns,
        }
    }
}

/// Load a training job configuration from a JSON file.
pub fn load_train_config<P: AsRef<Path>>(path: P) -> Result<TrainJobConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: TrainJobConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

/// Train on a labeled song table and optionally write per-song scores.
pub fn run_train(input: &Path, config: &TrainJobConfig, output: Option<&PathBuf>) -> Result<()> {
    let reader = reader_config(input, config);
    let parsed = read_table_csv_with_config(input, &reader)?;

    let learner = PuLearner::new(config.trainer.clone());
    let result = learner.fit(&parsed.table)?;
    print_round_log(&result);

    let projected = parsed.table.project(&result.feature_names)?;
    let scores = result.predict_proba(&projected.x)?;
    let labels: Vec<bool> = parsed.table.is_positive.to_vec();
    println!(
        "AUC against the known positives: {:.3}",
        roc_auc(&scores, &labels)
    );

    if let Some(path) = output {
        write_scores_csv(path, parsed.row_ids.as_deref(), &scores)?;
        eprintln!(
            "[Encore::Train] Wrote {} scores to {}",
            scores.len(),
            path.display()
        );
    }
    Ok(())
}

fn reader_config(input: &Path, config: &TrainJobConfig) -> CsvReaderConfig {
    let delimiter = match input.extension().and_then(|s| s.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    };
    CsvReaderConfig {
        label_column: config.label_column.clone(),
        id_column: config.id_column.clone(),
        feature_columns: None,
        ignore_columns: config.ignore_columns.clone(),
        delimiter,
    }
}

fn print_round_log(result: &PuModel) {
    for round in &result.rounds {
        match (&round.pruned_feature, round.pruned_importance) {
            (Some(name), Some(importance)) => println!(
                "Round {}: {} features, {} reliable negatives, pruned '{}' ({:.4})",
                round.round, round.n_features, round.n_reliable_negatives, name, importance
            ),
            _ => println!(
                "Round {}: {} features, {} reliable negatives, converged",
                round.round, round.n_features, round.n_reliable_negatives
            ),
        }
    }
    println!("Retained features: {}", result.feature_names.join(", "));
}
