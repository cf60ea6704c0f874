//! Local-maximum source finder.
//!
//! A coarse heuristic for locating star candidates: a pixel qualifies when it
//! is brighter than `threshold_factor × median` of the whole grid and is the
//! maximum of its `window × window` neighbourhood. Neighbouring candidates
//! (equal-valued plateaus) are merged by 4-connected labeling and each group
//! reports the floor-midpoint of its bounding box.

use ndarray::{Array2, ArrayView2};

use crate::config::DetectionConfig;
use crate::coordinate::PixelIndex;
use crate::grid::Grid;

/// Locate local maxima above the median-relative threshold.
///
/// Results are ordered by component discovery in a row-major scan.
pub fn find_local_maxima(grid: &Grid, config: DetectionConfig) -> Vec<PixelIndex> {
    let data = grid.view();
    let threshold = config.threshold_factor * grid.median();
    let candidates = local_maximum_mask(&data, config.window.max(1), threshold);

    let labels = label_components(&candidates.view());
    let boxes = bounding_boxes(&labels.view());

    log::debug!(
        "Local maximum search: threshold {:.3}, {} component(s)",
        threshold,
        boxes.len()
    );

    boxes
        .iter()
        .map(|b| {
            if b.min_row != b.max_row || b.min_col != b.max_col {
                log::warn!(
                    "Local maximum at rows {}..={}, cols {}..={} not identified as a single point",
                    b.min_row,
                    b.max_row,
                    b.min_col,
                    b.max_col
                );
            }
            PixelIndex {
                y: ((b.min_row + b.max_row) / 2) as i64,
                x: ((b.min_col + b.max_col) / 2) as i64,
            }
        })
        .collect()
}

/// Pixels above `threshold` equal to the maximum of their edge-clipped window.
fn local_maximum_mask(data: &ArrayView2<f64>, window: usize, threshold: f64) -> Array2<bool> {
    let (height, width) = data.dim();
    let before = (window - 1) / 2;
    let after = window / 2;

    Array2::from_shape_fn((height, width), |(row, col)| {
        let value = data[[row, col]];
        if value.is_nan() || value <= threshold {
            return false;
        }
        let rows = row.saturating_sub(before)..(row + after + 1).min(height);
        let cols = col.saturating_sub(before)..(col + after + 1).min(width);
        rows.flat_map(|r| cols.clone().map(move |c| (r, c)))
            .all(|(r, c)| data[[r, c]] <= value)
    })
}

/// Two-pass 4-connected labeling with union-find; background is 0 and labels
/// are consecutive from 1 in order of first appearance.
fn label_components(mask: &ArrayView2<bool>) -> Array2<usize> {
    let (height, width) = mask.dim();
    let mut labels = Array2::zeros((height, width));
    let mut parents = vec![0usize];

    for row in 0..height {
        for col in 0..width {
            if !mask[[row, col]] {
                continue;
            }
            let up = if row > 0 { labels[[row - 1, col]] } else { 0 };
            let left = if col > 0 { labels[[row, col - 1]] } else { 0 };

            labels[[row, col]] = match (up, left) {
                (0, 0) => {
                    let label = parents.len();
                    parents.push(label);
                    label
                }
                (a, 0) | (0, a) => a,
                (a, b) => union(&mut parents, a, b),
            };
        }
    }

    let mut relabel = vec![0usize; parents.len()];
    let mut next = 1;
    for label in 1..parents.len() {
        let root = find_root(&mut parents, label);
        if relabel[root] == 0 {
            relabel[root] = next;
            next += 1;
        }
        relabel[label] = relabel[root];
    }

    labels.mapv_inplace(|l| relabel[l]);
    labels
}

fn find_root(parents: &mut [usize], label: usize) -> usize {
    let mut current = label;
    while current != parents[current] {
        parents[current] = parents[parents[current]];
        current = parents[current];
    }
    current
}

fn union(parents: &mut [usize], a: usize, b: usize) -> usize {
    let root_a = find_root(parents, a);
    let root_b = find_root(parents, b);
    let (low, high) = if root_a <= root_b {
        (root_a, root_b)
    } else {
        (root_b, root_a)
    };
    parents[high] = low;
    low
}

#[derive(Debug, Clone, Copy)]
struct BoundingBox {
    min_row: usize,
    max_row: usize,
    min_col: usize,
    max_col: usize,
}

fn bounding_boxes(labels: &ArrayView2<usize>) -> Vec<BoundingBox> {
    let count = labels.iter().copied().max().unwrap_or(0);
    let mut boxes: Vec<Option<BoundingBox>> = vec![None; count];

    for ((row, col), &label) in labels.indexed_iter() {
        if label == 0 {
            continue;
        }
        let b = boxes[label - 1].get_or_insert(BoundingBox {
            min_row: row,
            max_row: row,
            min_col: col,
            max_col: col,
        });
        b.min_row = b.min_row.min(row);
        b.max_row = b.max_row.max(row);
        b.min_col = b.min_col.min(col);
        b.max_col = b.max_col.max(col);
    }

    boxes.into_iter().flatten().collect()
}
