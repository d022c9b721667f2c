//! C6 — MST Decomposer (`spec.md` §4.5).
//!
//! Computes all pairwise Euclidean distances for a cluster of points, sorts
//! them ascending, and runs Kruskal's algorithm with union-find to select
//! exactly `n - 1` tree edges. Ties break on the pair's input-order indices.

use crate::unionfind::UnionFind;

/// Returns the MST edges as index pairs into `points`, in the order they
/// were added to the tree.
pub fn minimum_spanning_tree(points: &[(f64, f64)]) -> Vec<(usize, usize)> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }

    let mut edges: Vec<(f64, usize, usize)> = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            edges.push((distance(points[i], points[j]), i, j));
        }
    }
    // Distances compare with `partial_cmp`: NaN never arises for finite
    // input coordinates. Ties break on (i, j), the input-order indices.
    edges.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
            .then(a.2.cmp(&b.2))
    });

    let mut uf = UnionFind::new(n);
    let mut tree = Vec::with_capacity(n - 1);
    for (_, i, j) in edges {
        if uf.union(i, j) {
            tree.push((i, j));
            if tree.len() == n - 1 {
                break;
            }
        }
    }
    tree
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}
