//! C5 — Spatial Clusterer (`spec.md` §4.4).
//!
//! Partitions a net's ports into connected components under a distance
//! threshold. Singleton components are dropped; they carry no edges.

use crate::unionfind::UnionFind;

/// Groups the indices `0..points.len()` into connected components where an
/// edge exists between `i` and `j` iff their Euclidean distance is `<=
/// threshold`. Components of size 1 are omitted. Each returned component
/// lists its member indices in ascending order, which is the netlist's
/// deterministic iteration order (`spec.md` §4.4 "Tie-breaking").
pub fn cluster_points(points: &[(f64, f64)], threshold: f64) -> Vec<Vec<usize>> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }

    let mut uf = UnionFind::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if distance(points[i], points[j]) <= threshold {
                uf.union(i, j);
            }
        }
    }

    let mut components: indexmap::IndexMap<usize, Vec<usize>> = indexmap::IndexMap::new();
    for i in 0..n {
        let root = uf.find(i);
        components.entry(root).or_default().push(i);
    }

    components
        .into_values()
        .filter(|members| members.len() >= 2)
        .collect()
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}
