//! C9 — Junction Finder (`spec.md` §4.8).
//!
//! Detects points where two or more edges of the same net meet or cross:
//! cross intersections between a horizontal and a vertical segment of
//! different edges, and T-intersections where one edge's endpoint lands
//! strictly inside another edge's segment.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    edge_index: usize,
    a: (f64, f64),
    b: (f64, f64),
}

impl Segment {
    fn is_horizontal(&self) -> bool {
        (self.a.1 - self.b.1).abs() < 1e-9
    }

    fn is_vertical(&self) -> bool {
        (self.a.0 - self.b.0).abs() < 1e-9
    }
}

/// One routed edge's net id and polyline, as seen by the junction finder.
pub struct EdgeView<'a> {
    pub net_id: &'a str,
    pub polyline: &'a [(f64, f64)],
}

/// Returns, for each input edge (by index), the junction points that lie
/// on it. A point that is only ever a bend point of a single edge is not a
/// junction (`spec.md` §4.8 "Assignment to edges"); the open question in
/// `spec.md` §9 about counting distinct edge ids (not traversals) is
/// honored by keying the `edge_count` map on a `BTreeSet` of edge indices
/// per point, not an increment per visit.
pub fn find_junctions(edges: &[EdgeView]) -> Vec<Vec<(f64, f64)>> {
    let mut by_net: std::collections::HashMap<&str, Vec<(usize, Segment)>> =
        std::collections::HashMap::new();
    for (edge_index, edge) in edges.iter().enumerate() {
        for w in edge.polyline.windows(2) {
            by_net.entry(edge.net_id).or_default().push((
                edge_index,
                Segment {
                    edge_index,
                    a: w[0],
                    b: w[1],
                },
            ));
        }
    }

    // point -> set of distinct edge indices passing through it
    let mut point_edges: BTreeMap<(i64, i64), std::collections::BTreeSet<usize>> =
        BTreeMap::new();

    for segments in by_net.values() {
        for i in 0..segments.len() {
            let (edge_i, seg_i) = &segments[i];
            for j in 0..segments.len() {
                if i == j {
                    continue;
                }
                let (edge_j, seg_j) = &segments[j];
                if edge_i == edge_j {
                    continue;
                }

                if let Some(point) = cross_intersection(seg_i, seg_j) {
                    record(&mut point_edges, point, *edge_i);
                    record(&mut point_edges, point, *edge_j);
                }
            }
        }

        // T-intersections: an endpoint of one edge's polyline lying
        // strictly inside another edge's segment.
        let endpoints: Vec<(usize, (f64, f64))> = segments
            .iter()
            .flat_map(|(idx, seg)| [(*idx, seg.a), (*idx, seg.b)])
            .collect();
        for (point_edge, point) in &endpoints {
            for (seg_edge, seg) in segments {
                if seg_edge == point_edge {
                    continue;
                }
                if strictly_interior(*point, seg) {
                    record(&mut point_edges, *point, *point_edge);
                    record(&mut point_edges, *point, *seg_edge);
                }
            }
        }
    }

    let junction_points: Vec<(f64, f64)> = point_edges
        .iter()
        .filter(|(_, edge_ids)| edge_ids.len() >= 2)
        .map(|(key, _)| (key.0 as f64 / 1000.0, key.1 as f64 / 1000.0))
        .collect();

    edges
        .iter()
        .enumerate()
        .map(|(edge_index, edge)| {
            junction_points
                .iter()
                .copied()
                .filter(|&p| lies_on_polyline(p, edge.polyline))
                .filter(|&p| {
                    point_edges
                        .get(&quantize(p))
                        .map(|ids| ids.contains(&edge_index) && ids.len() >= 2)
                        .unwrap_or(false)
                })
                .collect()
        })
        .collect()
}

fn record(map: &mut BTreeMap<(i64, i64), std::collections::BTreeSet<usize>>, point: (f64, f64), edge_index: usize) {
    map.entry(quantize(point)).or_default().insert(edge_index);
}

fn quantize(point: (f64, f64)) -> (i64, i64) {
    ((point.0 * 1000.0).round() as i64, (point.1 * 1000.0).round() as i64)
}

fn cross_intersection(a: &Segment, b: &Segment) -> Option<(f64, f64)> {
    let (h, v) = if a.is_horizontal() && b.is_vertical() {
        (a, b)
    } else if a.is_vertical() && b.is_horizontal() {
        (b, a)
    } else {
        return None;
    };

    let y = h.a.1;
    let x = v.a.0;
    let (h_min, h_max) = (h.a.0.min(h.b.0), h.a.0.max(h.b.0));
    let (v_min, v_max) = (v.a.1.min(v.b.1), v.a.1.max(v.b.1));

    if x >= h_min && x <= h_max && y >= v_min && y <= v_max {
        Some((x, y))
    } else {
        None
    }
}

fn strictly_interior(point: (f64, f64), seg: &Segment) -> bool {
    if point == seg.a || point == seg.b {
        return false;
    }
    if seg.is_horizontal() {
        let (min_x, max_x) = (seg.a.0.min(seg.b.0), seg.a.0.max(seg.b.0));
        (point.1 - seg.a.1).abs() < 1e-9 && point.0 > min_x + 1e-9 && point.0 < max_x - 1e-9
    } else if seg.is_vertical() {
        let (min_y, max_y) = (seg.a.1.min(seg.b.1), seg.a.1.max(seg.b.1));
        (point.0 - seg.a.0).abs() < 1e-9 && point.1 > min_y + 1e-9 && point.1 < max_y - 1e-9
    } else {
        false
    }
}

fn lies_on_polyline(point: (f64, f64), polyline: &[(f64, f64)]) -> bool {
    polyline.windows(2).any(|w| {
        let seg = Segment {
            edge_index: 0,
            a: w[0],
            b: w[1],
        };
        if seg.is_horizontal() {
            let (min_x, max_x) = (seg.a.0.min(seg.b.0), seg.a.0.max(seg.b.0));
            (point.1 - seg.a.1).abs() < 1e-6 && point.0 >= min_x - 1e-6 && point.0 <= max_x + 1e-6
        } else {
            let (min_y, max_y) = (seg.a.1.min(seg.b.1), seg.a.1.max(seg.b.1));
            (point.0 - seg.a.0).abs() < 1e-6 && point.1 >= min_y - 1e-6 && point.1 <= max_y + 1e-6
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_cross_intersection_between_two_edges() {
        let edges = vec![
            EdgeView {
                net_id: "N1",
                polyline: &[(0.0, 50.0), (100.0, 50.0)],
            },
            EdgeView {
                net_id: "N1",
                polyline: &[(50.0, 0.0), (50.0, 100.0)],
            },
        ];
        let junctions = find_junctions(&edges);
        assert_eq!(junctions[0], vec![(50.0, 50.0)]);
        assert_eq!(junctions[1], vec![(50.0, 50.0)]);
    }

    #[test]
    fn single_edge_bend_is_not_a_junction() {
        let edges = vec![EdgeView {
            net_id: "N1",
            polyline: &[(0.0, 0.0), (50.0, 0.0), (50.0, 50.0)],
        }];
        let junctions = find_junctions(&edges);
        assert!(junctions[0].is_empty());
    }

    #[test]
    fn finds_t_intersection_at_endpoint() {
        let edges = vec![
            EdgeView {
                net_id: "N1",
                polyline: &[(0.0, 0.0), (100.0, 0.0)],
            },
            EdgeView {
                net_id: "N1",
                polyline: &[(50.0, 0.0), (50.0, 50.0)],
            },
        ];
        let junctions = find_junctions(&edges);
        assert_eq!(junctions[0], vec![(50.0, 0.0)]);
        assert_eq!(junctions[1], vec![(50.0, 0.0)]);
    }

    #[test]
    fn different_nets_never_share_a_junction() {
        let edges = vec![
            EdgeView {
                net_id: "N1",
                polyline: &[(0.0, 50.0), (100.0, 50.0)],
            },
            EdgeView {
                net_id: "N2",
                polyline: &[(50.0, 0.0), (50.0, 100.0)],
            },
        ];
        let junctions = find_junctions(&edges);
        assert!(junctions[0].is_empty());
        assert!(junctions[1].is_empty());
    }
}
