//! Validated feature-table container shared by the trainer and its adapters.
//!
//! A `FeatureTable` holds an ordered set of engineered numeric song features
//! plus one boolean label per row (`true` for a known liked track, `false`
//! for unlabeled). The training loop never mutates rows; it narrows tables
//! column-wise as features are pruned.
use std::collections::HashSet;
use std::error::Error;
use std::fmt;

use ndarray::{Array1, Array2, Axis};

/// Custom error type for feature-table contract violations
#[derive(Debug)]
pub enum TableError {
    Empty,
    ShapeMismatch { names: usize, columns: usize },
    LabelLengthMismatch { labels: usize, rows: usize },
    DuplicateFeature(String),
    NonFiniteValue { row: usize, column: String },
    UnknownFeature(String),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TableError::Empty => write!(f, "Feature table must have at least one row and one column"),
            TableError::ShapeMismatch { names, columns } => write!(
                f,
                "Got {} feature names for {} columns",
                names, columns
            ),
            TableError::LabelLengthMismatch { labels, rows } => write!(
                f,
                "Got {} labels for {} rows",
                labels, rows
            ),
            TableError::DuplicateFeature(name) => {
                write!(f, "Duplicate feature name '{}'", name)
            }
            TableError::NonFiniteValue { row, column } => write!(
                f,
                "Non-finite value at row {} in feature '{}'",
                row, column
            ),
            TableError::UnknownFeature(name) => write!(f, "Unknown feature '{}'", name),
        }
    }
}

impl Error for TableError {}

#[derive(Debug, Clone)]
pub struct FeatureTable {
    /// Feature names, one per column of `x`, in column order.
    pub feature_names: Vec<String>,
    /// Engineered numeric features, shape (n_rows, n_features).
    pub x: Array2<f32>,
    /// Per-row label: `true` for a known positive, `false` for unlabeled.
    pub is_positive: Array1<bool>,
}

impl FeatureTable {
    /// Build a table, validating the provider contract: matching shapes,
    /// unique feature names, and finite values throughout.
    pub fn new(
        feature_names: Vec<String>,
        x: Array2<f32>,
        is_positive: Array1<bool>,
    ) -> Result<Self, TableError> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(TableError::Empty);
        }
        if feature_names.len() != x.ncols() {
            return Err(TableError::ShapeMismatch {
                names: feature_names.len(),
                columns: x.ncols(),
            });
        }
        if is_positive.len() != x.nrows() {
            return Err(TableError::LabelLengthMismatch {
                labels: is_positive.len(),
                rows: x.nrows(),
            });
        }

        let mut seen = HashSet::new();
        for name in &feature_names {
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateFeature(name.clone()));
            }
        }

        for ((row, col), value) in x.indexed_iter() {
            if !value.is_finite() {
                return Err(TableError::NonFiniteValue {
                    row,
                    column: feature_names[col].clone(),
                });
            }
        }

        Ok(FeatureTable {
            feature_names,
            x,
            is_positive,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn n_positives(&self) -> usize {
        self.is_positive.iter().filter(|&&p| p).count()
    }

    /// Row indices of known positives, in row order.
    pub fn positive_indices(&self) -> Vec<usize> {
        self.is_positive
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| if p { Some(i) } else { None })
            .collect()
    }

    /// Row indices of unlabeled rows, in row order.
    pub fn unlabeled_indices(&self) -> Vec<usize> {
        self.is_positive
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| if !p { Some(i) } else { None })
            .collect()
    }

    /// Column index of a feature by name.
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|n| n == name)
    }

    /// A copy of this table narrowed to the named features, in the given order.
    pub fn project(&self, keep: &[String]) -> Result<FeatureTable, TableError> {
        let mut indices = Vec::with_capacity(keep.len());
        for name in keep {
            let idx = self
                .feature_index(name)
                .ok_or_else(|| TableError::UnknownFeature(name.clone()))?;
            indices.push(idx);
        }
        if indices.is_empty() {
            return Err(TableError::Empty);
        }

        Ok(FeatureTable {
            feature_names: keep.to_vec(),
            x: self.x.select(Axis(1), &indices),
            is_positive: self.is_positive.clone(),
        })
    }

    /// A copy of this table with one feature column removed.
    pub fn drop_feature(&self, name: &str) -> Result<FeatureTable, TableError> {
        if self.feature_index(name).is_none() {
            return Err(TableError::UnknownFeature(name.to_string()));
        }
        let keep: Vec<String> = self
            .feature_names
            .iter()
            .filter(|n| n.as_str() != name)
            .cloned()
            .collect();
        self.project(&keep)
    }

    /// A copy of this table containing only the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> FeatureTable {
        FeatureTable {
            feature_names: self.feature_names.clone(),
            x: self.x.select(Axis(0), indices),
            is_positive: self.is_positive.select(Axis(0), indices),
        }
    }

    pub fn log_input_summary(&self) {
        log::info!(
            "Input table: {} rows ({} positive, {} unlabeled), {} features",
            self.n_rows(),
            self.n_positives(),
            self.n_rows() - self.n_positives(),
            self.n_features()
        );
    }
}
