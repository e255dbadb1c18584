//! Second-order regression trees for gradient boosting
//!
//! Trees are grown level by level with exact greedy split finding:
//! - Columns are sorted once per fit ([`SortedColumns`]) and reused by every tree
//! - Each level scans every candidate feature once, accumulating left-side
//!   gradient statistics per open node
//! - Leaf weight: w* = -G / (H + lambda)
//! - Split gain: 0.5 * [GL²/(HL+λ) + GR²/(HR+λ) - G²/(H+λ)] - γ

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Row order of every feature column, sorted ascending by value
#[derive(Debug, Clone)]
pub struct SortedColumns {
    order: Vec<Vec<usize>>,
}

impl SortedColumns {
    pub fn new(x: &Array2<f64>) -> Self {
        let order = (0..x.ncols())
            .into_par_iter()
            .map(|f| {
                let col = x.column(f);
                let mut idx: Vec<usize> = (0..x.nrows()).collect();
                idx.sort_by(|&a, &b| col[a].total_cmp(&col[b]).then(a.cmp(&b)));
                idx
            })
            .collect();
        Self { order }
    }

    fn feature(&self, f: usize) -> &[usize] {
        &self.order[f]
    }
}

/// Growth limits and regularization for one tree
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_child_weight: f64,
    pub reg_lambda: f64,
    pub gamma: f64,
}

/// A single node in the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf { weight: f64 },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        match self {
            TreeNode::Leaf { weight } => *weight,
            TreeNode::Split { feature, threshold, left, right } => {
                if sample[*feature] <= *threshold {
                    left.predict(sample)
                } else {
                    right.predict(sample)
                }
            }
        }
    }

    fn count_splits(&self, counts: &mut [f64]) {
        if let TreeNode::Split { feature, left, right, .. } = self {
            if *feature < counts.len() {
                counts[*feature] += 1.0;
            }
            left.count_splits(counts);
            right.count_splits(counts);
        }
    }

    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

/// Regression tree fit to one output's gradients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    root: TreeNode,
}

impl RegressionTree {
    pub fn predict_row(&self, sample: ArrayView1<f64>) -> f64 {
        self.root.predict(sample)
    }

    pub fn count_splits(&self, counts: &mut [f64]) {
        self.root.count_splits(counts);
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn n_leaves(&self) -> usize {
        self.root.n_leaves()
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Grow a tree on the rows in `rows`, splitting only on `features`.
    pub fn grow(
        x: &Array2<f64>,
        sorted: &SortedColumns,
        grad: &[f64],
        hess: &[f64],
        rows: &[usize],
        features: &[usize],
        params: &TreeParams,
    ) -> Self {
        let root = TreeGrower::new(x, sorted, grad, hess, params).grow(rows, features);
        Self { root }
    }
}

/// Optimal leaf weight with L2 (lambda) regularization
fn leaf_weight(g: f64, h: f64, lambda: f64) -> f64 {
    -g / (h + lambda)
}

fn score(g: f64, h: f64, lambda: f64) -> f64 {
    g * g / (h + lambda)
}

const INACTIVE: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
    g_left: f64,
    h_left: f64,
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    arena_id: usize,
    g: f64,
    h: f64,
}

enum ArenaNode {
    Pending,
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

struct TreeGrower<'a> {
    x: &'a Array2<f64>,
    sorted: &'a SortedColumns,
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a TreeParams,
}

impl<'a> TreeGrower<'a> {
    fn new(
        x: &'a Array2<f64>,
        sorted: &'a SortedColumns,
        grad: &'a [f64],
        hess: &'a [f64],
        params: &'a TreeParams,
    ) -> Self {
        Self { x, sorted, grad, hess, params }
    }

    fn grow(&self, rows: &[usize], features: &[usize]) -> TreeNode {
        let lambda = self.params.reg_lambda;
        let mut slot_of = vec![INACTIVE; self.x.nrows()];
        let (mut g, mut h) = (0.0, 0.0);
        for &i in rows {
            slot_of[i] = 0;
            g += self.grad[i];
            h += self.hess[i];
        }

        let mut arena = vec![ArenaNode::Pending];
        let mut open = vec![OpenNode { arena_id: 0, g, h }];

        for _depth in 0..self.params.max_depth {
            if open.is_empty() {
                break;
            }

            let best = self.best_splits(&open, &slot_of, features);

            let mut next_open = Vec::new();
            let mut route: Vec<Option<(usize, f64, usize, usize)>> = vec![None; open.len()];

            for (slot, node) in open.iter().enumerate() {
                match best[slot] {
                    Some(c) => {
                        let left = arena.len();
                        arena.push(ArenaNode::Pending);
                        let right = arena.len();
                        arena.push(ArenaNode::Pending);
                        arena[node.arena_id] = ArenaNode::Split {
                            feature: c.feature,
                            threshold: c.threshold,
                            left,
                            right,
                        };

                        let left_slot = next_open.len();
                        next_open.push(OpenNode { arena_id: left, g: c.g_left, h: c.h_left });
                        next_open.push(OpenNode {
                            arena_id: right,
                            g: node.g - c.g_left,
                            h: node.h - c.h_left,
                        });
                        route[slot] = Some((c.feature, c.threshold, left_slot, left_slot + 1));
                    }
                    None => {
                        arena[node.arena_id] = ArenaNode::Leaf(leaf_weight(node.g, node.h, lambda));
                    }
                }
            }

            for (i, slot) in slot_of.iter_mut().enumerate() {
                if *slot == INACTIVE {
                    continue;
                }
                *slot = match route[*slot] {
                    Some((feature, threshold, left, right)) => {
                        if self.x[[i, feature]] <= threshold {
                            left
                        } else {
                            right
                        }
                    }
                    None => INACTIVE,
                };
            }

            open = next_open;
        }

        for node in &open {
            arena[node.arena_id] = ArenaNode::Leaf(leaf_weight(node.g, node.h, lambda));
        }

        Self::assemble(&arena, 0)
    }

    /// Best split per open node; ties keep the lower feature index
    fn best_splits(&self, open: &[OpenNode], slot_of: &[usize], features: &[usize]) -> Vec<Option<Candidate>> {
        let per_feature: Vec<Vec<Option<Candidate>>> = features
            .par_iter()
            .map(|&f| self.scan_feature(f, open, slot_of))
            .collect();

        let mut best: Vec<Option<Candidate>> = vec![None; open.len()];
        let mut ordered: Vec<(usize, &Vec<Option<Candidate>>)> =
            features.iter().copied().zip(per_feature.iter()).collect();
        ordered.sort_by_key(|(f, _)| *f);

        for (_, candidates) in ordered {
            for (slot, cand) in candidates.iter().enumerate() {
                if let Some(c) = cand {
                    let better = match best[slot] {
                        Some(b) => c.gain > b.gain,
                        None => true,
                    };
                    if better {
                        best[slot] = Some(*c);
                    }
                }
            }
        }
        best
    }

    /// One pass over the sorted column, evaluating every value boundary inside each open node
    fn scan_feature(&self, feature: usize, open: &[OpenNode], slot_of: &[usize]) -> Vec<Option<Candidate>> {
        let lambda = self.params.reg_lambda;
        let mcw = self.params.min_child_weight;
        let n_open = open.len();

        let mut g_left = vec![0.0; n_open];
        let mut h_left = vec![0.0; n_open];
        let mut last: Vec<Option<f64>> = vec![None; n_open];
        let mut best: Vec<Option<Candidate>> = vec![None; n_open];

        for &i in self.sorted.feature(feature) {
            let slot = slot_of[i];
            if slot == INACTIVE {
                continue;
            }
            let node = &open[slot];
            if node.h < mcw {
                continue;
            }

            let v = self.x[[i, feature]];
            if let Some(prev) = last[slot] {
                if v > prev {
                    let (gl, hl) = (g_left[slot], h_left[slot]);
                    let (gr, hr) = (node.g - gl, node.h - hl);
                    if hl >= mcw && hr >= mcw {
                        let gain = 0.5
                            * (score(gl, hl, lambda) + score(gr, hr, lambda) - score(node.g, node.h, lambda))
                            - self.params.gamma;
                        let improves = match best[slot] {
                            Some(b) => gain > b.gain,
                            None => gain > 0.0,
                        };
                        if improves {
                            let mid = 0.5 * (prev + v);
                            let threshold = if mid < v { mid } else { prev };
                            best[slot] = Some(Candidate {
                                feature,
                                threshold,
                                gain,
                                g_left: gl,
                                h_left: hl,
                            });
                        }
                    }
                }
            }

            g_left[slot] += self.grad[i];
            h_left[slot] += self.hess[i];
            last[slot] = Some(v);
        }

        best
    }

    fn assemble(arena: &[ArenaNode], id: usize) -> TreeNode {
        match arena[id] {
            ArenaNode::Split { feature, threshold, left, right } => TreeNode::Split {
                feature,
                threshold,
                left: Box::new(Self::assemble(arena, left)),
                right: Box::new(Self::assemble(arena, right)),
            },
            ArenaNode::Leaf(weight) => TreeNode::Leaf { weight },
            ArenaNode::Pending => TreeNode::Leaf { weight: 0.0 },
        }
    }
}
