//! Regression trees fit to first/second-order gradient statistics.
//!
//! Both ensemble models share this builder: the boosted classifier feeds it
//! logistic-loss gradients, the bagged forest feeds unit hessians so leaf
//! values come out as per-node label means. Split search follows the
//! second-order gain formulation with L1/L2 regularized leaf weights.
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;

/// Per-tree growing limits and regularization.
#[derive(Debug, Clone)]
pub struct TreeParams {
    pub max_depth: u32,
    /// L1 regularization on leaf weights.
    pub reg_alpha: f32,
    /// L2 regularization on leaf weights.
    pub reg_lambda: f32,
    /// Minimum hessian sum required on each side of a split.
    pub min_child_weight: f32,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
        gain: f32,
    },
    Leaf {
        value: f32,
    },
}

#[derive(Debug, Clone)]
struct SplitCandidate {
    feature: usize,
    threshold: f32,
    gain: f64,
}

/// A single regression tree stored as a flat node arena.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grow a tree on the given rows. `grad` and `hess` are indexed by row
    /// position in `x`; `rows` may contain repeats (bootstrap samples).
    pub fn fit(
        x: &Array2<f32>,
        grad: &[f32],
        hess: &[f32],
        rows: &[usize],
        params: &TreeParams,
    ) -> Self {
        let mut nodes = Vec::new();
        build_node(x, grad, hess, rows, 0, params, &mut nodes);
        RegressionTree { nodes }
    }

    /// Value of the leaf this row falls into.
    pub fn predict_row(&self, row: ArrayView1<'_, f32>) -> f32 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Multiply every leaf value by `factor` (shrinkage for boosted trees).
    pub fn scale_leaves(&mut self, factor: f32) {
        for node in self.nodes.iter_mut() {
            if let Node::Leaf { value } = node {
                *value *= factor;
            }
        }
    }

    /// Add this tree's per-feature split gains into `importance`.
    pub fn accumulate_gain(&self, importance: &mut [f32]) {
        for node in &self.nodes {
            if let Node::Split { feature, gain, .. } = node {
                importance[*feature] += *gain;
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

fn build_node(
    x: &Array2<f32>,
    grad: &[f32],
    hess: &[f32],
    rows: &[usize],
    depth: u32,
    params: &TreeParams,
    nodes: &mut Vec<Node>,
) -> usize {
    let g_sum: f64 = rows.iter().map(|&i| grad[i] as f64).sum();
    let h_sum: f64 = rows.iter().map(|&i| hess[i] as f64).sum();

    let best = if depth < params.max_depth && rows.len() >= 2 {
        best_split(x, grad, hess, rows, g_sum, h_sum, params)
    } else {
        None
    };

    match best {
        Some(split) => {
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .iter()
                .copied()
                .partition(|&i| x[[i, split.feature]] <= split.threshold);

            let node_idx = nodes.len();
            // Placeholder so children can be pushed after this node.
            nodes.push(Node::Leaf { value: 0.0 });
            let left = build_node(x, grad, hess, &left_rows, depth + 1, params, nodes);
            let right = build_node(x, grad, hess, &right_rows, depth + 1, params, nodes);
            nodes[node_idx] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
                gain: split.gain as f32,
            };
            node_idx
        }
        None => {
            nodes.push(Node::Leaf {
                value: leaf_weight(g_sum, h_sum, params),
            });
            nodes.len() - 1
        }
    }
}

/// Best positive-gain split over all features, ties broken toward the lowest
/// feature index, then the lowest threshold, so the parallel reduction is
/// order-independent.
fn best_split(
    x: &Array2<f32>,
    grad: &[f32],
    hess: &[f32],
    rows: &[usize],
    g_sum: f64,
    h_sum: f64,
    params: &TreeParams,
) -> Option<SplitCandidate> {
    let parent_score = split_score(g_sum, h_sum, params);

    (0..x.ncols())
        .into_par_iter()
        .filter_map(|feature| {
            best_split_for_feature(x, grad, hess, rows, feature, g_sum, h_sum, parent_score, params)
        })
        .reduce_with(prefer_candidate)
}

#[allow(clippy::too_many_arguments)]
fn best_split_for_feature(
    x: &Array2<f32>,
    grad: &[f32],
    hess: &[f32],
    rows: &[usize],
    feature: usize,
    g_sum: f64,
    h_sum: f64,
    parent_score: f64,
    params: &TreeParams,
) -> Option<SplitCandidate> {
    let mut values: Vec<(f32, f64, f64)> = rows
        .iter()
        .map(|&i| (x[[i, feature]], grad[i] as f64, hess[i] as f64))
        .collect();
    values.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let min_child = params.min_child_weight as f64;
    let mut g_left = 0.0;
    let mut h_left = 0.0;
    let mut best: Option<SplitCandidate> = None;

    for w in 0..values.len() - 1 {
        g_left += values[w].1;
        h_left += values[w].2;

        let value = values[w].0;
        let next = values[w + 1].0;
        if value == next {
            continue;
        }

        let g_right = g_sum - g_left;
        let h_right = h_sum - h_left;
        if h_left < min_child || h_right < min_child {
            continue;
        }

        let gain = 0.5
            * (split_score(g_left, h_left, params) + split_score(g_right, h_right, params)
                - parent_score);
        if gain <= 0.0 {
            continue;
        }

        // Midpoint, pulled back to the left value when the neighbors are so
        // close the midpoint rounds onto the right one.
        let mut threshold = value + 0.5 * (next - value);
        if threshold >= next {
            threshold = value;
        }

        let candidate = SplitCandidate {
            feature,
            threshold,
            gain,
        };
        best = Some(match best {
            Some(current) => prefer_candidate(current, candidate),
            None => candidate,
        });
    }

    best
}

fn prefer_candidate(a: SplitCandidate, b: SplitCandidate) -> SplitCandidate {
    let b_wins = b.gain > a.gain
        || (b.gain == a.gain
            && (b.feature < a.feature
                || (b.feature == a.feature && b.threshold < a.threshold)));
    if b_wins {
        b
    } else {
        a
    }
}

fn split_score(g: f64, h: f64, params: &TreeParams) -> f64 {
    let g = threshold_l1(g, params.reg_alpha as f64);
    (g * g) / (h + params.reg_lambda as f64)
}

fn leaf_weight(g: f64, h: f64, params: &TreeParams) -> f32 {
    let denom = h + params.reg_lambda as f64;
    if denom <= 0.0 {
        return 0.0;
    }
    (-threshold_l1(g, params.reg_alpha as f64) / denom) as f32
}

fn threshold_l1(g: f64, alpha: f64) -> f64 {
    if g > alpha {
        g - alpha
    } else if g < -alpha {
        g + alpha
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn unregularized(max_depth: u32) -> TreeParams {
        TreeParams {
            max_depth,
            reg_alpha: 0.0,
            reg_lambda: 0.0,
            min_child_weight: 1.0,
        }
    }

    // Squared-loss statistics around a zero prediction: g = -target, h = 1,
    // so leaves come out as per-node target means.
    fn mean_stats(targets: &[f32]) -> (Vec<f32>, Vec<f32>) {
        let grad: Vec<f32> = targets.iter().map(|&t| -t).collect();
        let hess = vec![1.0; targets.len()];
        (grad, hess)
    }

    #[test]
    fn separable_targets_get_a_clean_split() {
        let x = Array2::from_shape_vec(
            (8, 1),
            vec![0.0, 1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 13.0],
        )
        .unwrap();
        let (grad, hess) = mean_stats(&[0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        let rows: Vec<usize> = (0..8).collect();

        let tree = RegressionTree::fit(&x, &grad, &hess, &rows, &unregularized(3));

        let low = tree.predict_row(x.row(1));
        let high = tree.predict_row(x.row(6));
        assert!(low.abs() < 1e-6, "left leaf should be the class-0 mean, got {}", low);
        assert!((high - 1.0).abs() < 1e-6, "right leaf should be the class-1 mean, got {}", high);
    }

    #[test]
    fn depth_zero_is_a_single_mean_leaf() {
        let x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let (grad, hess) = mean_stats(&[0.0, 0.0, 1.0, 1.0]);
        let rows: Vec<usize> = (0..4).collect();

        let tree = RegressionTree::fit(&x, &grad, &hess, &rows, &unregularized(0));

        assert_eq!(tree.n_nodes(), 1);
        assert!((tree.predict_row(x.row(0)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn gain_lands_on_the_informative_feature() {
        // Feature 0 separates the targets, feature 1 is constant.
        let x = Array2::from_shape_vec(
            (6, 2),
            vec![
                0.0, 7.0, //
                1.0, 7.0, //
                2.0, 7.0, //
                8.0, 7.0, //
                9.0, 7.0, //
                10.0, 7.0,
            ],
        )
        .unwrap();
        let (grad, hess) = mean_stats(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let rows: Vec<usize> = (0..6).collect();

        let tree = RegressionTree::fit(&x, &grad, &hess, &rows, &unregularized(2));

        let mut importance = vec![0.0f32; 2];
        tree.accumulate_gain(&mut importance);
        assert!(importance[0] > 0.0, "informative feature should carry gain");
        assert_eq!(importance[1], 0.0, "constant feature cannot split");
    }

    #[test]
    fn min_child_weight_blocks_small_splits() {
        let x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 10.0, 11.0]).unwrap();
        let grad = vec![0.3, 0.3, -0.7, -0.7];
        // Hessians so small that no side of any split can reach weight 1.0.
        let hess = vec![0.2, 0.2, 0.2, 0.2];
        let rows: Vec<usize> = (0..4).collect();

        let tree = RegressionTree::fit(&x, &grad, &hess, &rows, &unregularized(3));
        assert_eq!(tree.n_nodes(), 1, "expected a lone leaf, got a split");
    }

    #[test]
    fn scale_leaves_applies_shrinkage() {
        let x = Array2::from_shape_vec((2, 1), vec![0.0, 10.0]).unwrap();
        let (grad, hess) = mean_stats(&[0.0, 1.0]);
        let rows = vec![0, 1];

        let mut tree = RegressionTree::fit(&x, &grad, &hess, &rows, &unregularized(1));
        tree.scale_leaves(0.5);
        assert!((tree.predict_row(x.row(1)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn repeated_rows_weight_the_statistics() {
        // Row 0 appears three times in the bootstrap sample, pulling the
        // single-leaf mean toward its target.
        let x = Array2::from_shape_vec((2, 1), vec![0.0, 1.0]).unwrap();
        let (grad, hess) = mean_stats(&[0.0, 1.0]);
        let rows = vec![0, 0, 0, 1];

        let tree = RegressionTree::fit(&x, &grad, &hess, &rows, &unregularized(0));
        assert!((tree.predict_row(x.row(0)) - 0.25).abs() < 1e-6);
    }
}
