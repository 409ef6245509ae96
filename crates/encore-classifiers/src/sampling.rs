//! Synthetic minority oversampling (SMOTE) for unbalanced training sets.
//!
//! New minority rows are interpolated between a random minority row and one
//! of its k nearest minority neighbors until both classes have equal counts.
use std::error::Error;
use std::fmt;

use ndarray::{s, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Custom error type for oversampling failures
#[derive(Debug)]
pub enum OversamplingError {
    /// The minority class is too small to supply `k` distinct neighbors.
    TooFewMinoritySamples { minority: usize, needed: usize },
}

impl fmt::Display for OversamplingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OversamplingError::TooFewMinoritySamples { minority, needed } => write!(
                f,
                "Oversampling needs at least {} minority rows, got {}",
                needed, minority
            ),
        }
    }
}

impl Error for OversamplingError {}

/// k-nearest-neighbor interpolation oversampler.
pub struct Smote {
    k_neighbors: usize,
    seed: Option<u64>,
}

impl Smote {
    pub fn new(k_neighbors: usize, seed: Option<u64>) -> Self {
        Smote { k_neighbors, seed }
    }

    /// Equalize class counts by appending interpolated minority rows.
    ///
    /// The input rows are passed through unchanged, in order, with synthetic
    /// rows appended after them. Labels are the crate's binary convention
    /// (1 positive, 0 negative). Returns the original data untouched when the
    /// classes are already balanced.
    pub fn fit_resample(
        &self,
        x: &Array2<f32>,
        y: &[i32],
    ) -> Result<(Array2<f32>, Vec<i32>), OversamplingError> {
        let positives: Vec<usize> = y
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| if v == 1 { Some(i) } else { None })
            .collect();
        let negatives: Vec<usize> = y
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| if v != 1 { Some(i) } else { None })
            .collect();

        let (minority, minority_label, majority_count) = if positives.len() < negatives.len() {
            (positives, 1, negatives.len())
        } else if negatives.len() < positives.len() {
            (negatives, 0, positives.len())
        } else {
            return Ok((x.clone(), y.to_vec()));
        };

        if self.k_neighbors == 0 || minority.len() <= self.k_neighbors {
            return Err(OversamplingError::TooFewMinoritySamples {
                minority: minority.len(),
                needed: self.k_neighbors.max(1) + 1,
            });
        }

        // Brute-force neighbor lists within the minority class, ties broken
        // by row index for reproducibility.
        let neighbors: Vec<Vec<usize>> = minority
            .iter()
            .map(|&i| {
                let mut dists: Vec<(f32, usize)> = minority
                    .iter()
                    .filter(|&&j| j != i)
                    .map(|&j| (squared_distance(x, i, j), j))
                    .collect();
                dists.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                dists
                    .into_iter()
                    .take(self.k_neighbors)
                    .map(|(_, j)| j)
                    .collect()
            })
            .collect();

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let n_needed = majority_count - minority.len();
        let mut out = Array2::zeros((x.nrows() + n_needed, x.ncols()));
        out.slice_mut(s![..x.nrows(), ..]).assign(x);

        for offset in 0..n_needed {
            let pick = rng.gen_range(0..minority.len());
            let base = minority[pick];
            let neighbor = neighbors[pick][rng.gen_range(0..neighbors[pick].len())];
            let gap: f32 = rng.gen();

            let mut synth = x.row(base).to_owned();
            synth.zip_mut_with(&x.row(neighbor), |value, &other| {
                *value += gap * (other - *value);
            });
            out.row_mut(x.nrows() + offset).assign(&synth);
        }

        let mut labels = y.to_vec();
        labels.extend(std::iter::repeat(minority_label).take(n_needed));

        Ok((out, labels))
    }
}

fn squared_distance(x: &Array2<f32>, a: usize, b: usize) -> f32 {
    x.row(a)
        .iter()
        .zip(x.row(b).iter())
        .map(|(&p, &q)| (p - q) * (p - q))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn unbalanced() -> (Array2<f32>, Vec<i32>) {
        // 3 positives, 6 negatives.
        let x = Array2::from_shape_vec(
            (9, 2),
            vec![
                1.0, 1.0, //
                1.2, 0.8, //
                0.8, 1.2, //
                5.0, 5.0, //
                5.1, 4.9, //
                4.9, 5.1, //
                5.2, 5.2, //
                4.8, 4.8, //
                5.0, 5.2,
            ],
        )
        .unwrap();
        let y = vec![1, 1, 1, 0, 0, 0, 0, 0, 0];
        (x, y)
    }

    #[test]
    fn balances_class_counts() {
        let (x, y) = unbalanced();
        let smote = Smote::new(2, Some(3));
        let (x_out, y_out) = smote.fit_resample(&x, &y).unwrap();

        let positives = y_out.iter().filter(|&&v| v == 1).count();
        let negatives = y_out.len() - positives;
        assert_eq!(positives, 6);
        assert_eq!(negatives, 6);
        assert_eq!(x_out.nrows(), 12);
    }

    #[test]
    fn original_rows_pass_through_unchanged() {
        let (x, y) = unbalanced();
        let smote = Smote::new(2, Some(3));
        let (x_out, y_out) = smote.fit_resample(&x, &y).unwrap();

        for i in 0..x.nrows() {
            assert_eq!(x_out.row(i), x.row(i), "row {} was altered", i);
            assert_eq!(y_out[i], y[i]);
        }
    }

    #[test]
    fn synthetic_rows_interpolate_the_minority() {
        let (x, y) = unbalanced();
        let smote = Smote::new(2, Some(3));
        let (x_out, _) = smote.fit_resample(&x, &y).unwrap();

        // All minority rows sit near (1, 1); interpolations stay inside the
        // minority bounding box.
        for i in x.nrows()..x_out.nrows() {
            for value in x_out.row(i) {
                assert!(
                    (0.8..=1.2).contains(value),
                    "synthetic value {} escaped the minority region",
                    value
                );
            }
        }
    }

    #[test]
    fn too_few_minority_rows_errors() {
        let (x, y) = unbalanced();
        let smote = Smote::new(5, Some(3));
        let err = smote.fit_resample(&x, &y).unwrap_err();
        assert!(matches!(
            err,
            OversamplingError::TooFewMinoritySamples { minority: 3, needed: 6 }
        ));
    }

    #[test]
    fn zero_neighbors_is_infeasible() {
        let (x, y) = unbalanced();
        let smote = Smote::new(0, Some(3));
        assert!(smote.fit_resample(&x, &y).is_err());
    }

    #[test]
    fn balanced_input_is_returned_unchanged() {
        let x = Array2::from_shape_vec((4, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let y = vec![1, 1, 0, 0];
        let smote = Smote::new(1, Some(3));
        let (x_out, y_out) = smote.fit_resample(&x, &y).unwrap();
        assert_eq!(x_out, x);
        assert_eq!(y_out, y);
    }

    #[test]
    fn same_seed_reproduces_the_synthetic_rows() {
        let (x, y) = unbalanced();
        let a = Smote::new(2, Some(9)).fit_resample(&x, &y).unwrap();
        let b = Smote::new(2, Some(9)).fit_resample(&x, &y).unwrap();
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
    }
}
