//! CSV input and output for song feature tables.
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::Array2;

use crate::table::FeatureTable;

/// Column handling for [`read_table_csv_with_config`].
#[derive(Debug, Clone)]
pub struct CsvReaderConfig {
    /// Header of the 0/1 membership label column.
    pub label_column: String,
    /// Optional identifier column carried through to score output.
    pub id_column: Option<String>,
    /// Explicit feature columns, in model order. `None` keeps every column
    /// that is not the label, the id, or ignored.
    pub feature_columns: Option<Vec<String>>,
    /// Columns skipped when auto-detecting features.
    pub ignore_columns: Vec<String>,
    pub delimiter: u8,
}

impl Default for CsvReaderConfig {
    fn default() -> Self {
        CsvReaderConfig {
            label_column: "target".to_string(),
            id_column: Some("title".to_string()),
            feature_columns: None,
            ignore_columns: vec!["title".to_string(), "main_artist".to_string()],
            delimiter: b',',
        }
    }
}

/// A parsed feature table plus any row identifiers from the id column.
#[derive(Debug)]
pub struct CsvTable {
    pub table: FeatureTable,
    pub row_ids: Option<Vec<String>>,
}

/// Read a labeled song table with the default column layout.
pub fn read_table_csv<P: AsRef<Path>>(path: P) -> Result<CsvTable> {
    read_table_csv_with_config(path, &CsvReaderConfig::default())
}

/// Read a labeled song table. Header matching is case-insensitive; the label
/// column must hold 0 (unlabeled) or 1 (positive) and every feature cell must
/// parse as a number.
pub fn read_table_csv_with_config<P: AsRef<Path>>(
    path: P,
    config: &CsvReaderConfig,
) -> Result<CsvTable> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("Failed to open {}", path.as_ref().display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .from_reader(file);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let label_idx = find_column(&headers, &config.label_column)
        .with_context(|| format!("Missing label column '{}'", config.label_column))?;
    let id_idx = config
        .id_column
        .as_deref()
        .and_then(|name| find_column(&headers, name));

    let feature_indices = resolve_feature_indices(&headers, config, label_idx, id_idx)?;
    if feature_indices.is_empty() {
        bail!("No feature columns found in the header");
    }
    let feature_names: Vec<String> = feature_indices
        .iter()
        .map(|&i| headers[i].clone())
        .collect();

    let mut values: Vec<f32> = Vec::new();
    let mut labels: Vec<bool> = Vec::new();
    let mut row_ids: Vec<String> = Vec::new();

    for (row_number, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("Failed to read row {}", row_number + 1))?;

        let raw_label = record.get(label_idx).unwrap_or("");
        let label: f32 = raw_label.parse().with_context(|| {
            format!(
                "Bad value '{}' for '{}' at row {}",
                raw_label,
                config.label_column,
                row_number + 1
            )
        })?;
        if label == 1.0 {
            labels.push(true);
        } else if label == 0.0 {
            labels.push(false);
        } else {
            bail!("Label must be 0 or 1 at row {}, got {}", row_number + 1, label);
        }

        if let Some(idx) = id_idx {
            row_ids.push(record.get(idx).unwrap_or("").to_string());
        }

        for &idx in &feature_indices {
            let raw = record.get(idx).unwrap_or("");
            let value: f32 = raw.parse().with_context(|| {
                format!(
                    "Bad value '{}' for '{}' at row {}",
                    raw,
                    headers[idx],
                    row_number + 1
                )
            })?;
            values.push(value);
        }
    }

    let n_rows = labels.len();
    let x = Array2::from_shape_vec((n_rows, feature_indices.len()), values)
        .context("Feature matrix shape mismatch")?;
    let table = FeatureTable::new(feature_names, x, labels.into())?;

    log::info!(
        "Read {} rows with {} feature columns from {}",
        table.n_rows(),
        table.n_features(),
        path.as_ref().display()
    );

    Ok(CsvTable {
        table,
        row_ids: if id_idx.is_some() { Some(row_ids) } else { None },
    })
}

/// Write one score per row, keyed by the id column when one was read.
pub fn write_scores_csv<P: AsRef<Path>>(
    path: P,
    row_ids: Option<&[String]>,
    scores: &[f32],
) -> Result<()> {
    if let Some(ids) = row_ids {
        if ids.len() != scores.len() {
            bail!("Got {} ids for {} scores", ids.len(), scores.len());
        }
    }
    let mut writer = csv::Writer::from_path(path.as_ref())
        .with_context(|| format!("Failed to create {}", path.as_ref().display()))?;
    match row_ids {
        Some(ids) => {
            writer.write_record(["title", "score"])?;
            for (id, &score) in ids.iter().zip(scores.iter()) {
                let formatted = format!("{:.6}", score);
                writer.write_record([id.as_str(), formatted.as_str()])?;
            }
        }
        None => {
            writer.write_record(["row", "score"])?;
            for (i, &score) in scores.iter().enumerate() {
                let row = i.to_string();
                let formatted = format!("{:.6}", score);
                writer.write_record([row.as_str(), formatted.as_str()])?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

fn resolve_feature_indices(
    headers: &[String],
    config: &CsvReaderConfig,
    label_idx: usize,
    id_idx: Option<usize>,
) -> Result<Vec<usize>> {
    match &config.feature_columns {
        Some(names) => names
            .iter()
            .map(|name| {
                find_column(headers, name)
                    .with_context(|| format!("Missing feature column '{}'", name))
            })
            .collect(),
        None => {
            let ignored: HashSet<String> = config
                .ignore_columns
                .iter()
                .map(|c| c.to_ascii_lowercase())
                .collect();
            Ok(headers
                .iter()
                .enumerate()
                .filter(|(i, name)| {
                    *i != label_idx
                        && Some(*i) != id_idx
                        && !ignored.contains(&name.to_ascii_lowercase())
                })
                .map(|(i, _)| i)
                .collect())
        }
    }
}

fn find_column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}
