//! C7 — Placement Pass (`spec.md` §4.6).
//!
//! A self-contained layered placement backend: rank nodes by BFS distance
//! from each connected component's first node (in emission order), order
//! each rank by iterative barycenter sweeps, then assign coordinates along
//! the configured direction with the configured spacing and padding.
//!
//! Ported in spirit, not in code, from the longest-path ranking
//! (`rank::util::longest_path`) and barycenter ordering
//! (`order::barycenter::barycenter`/`resolve_conflicts`) shape of a
//! dagre-style layered-graph layout backend: those operate over a generic
//! compound `Graph` type this crate does not carry, so ranking here uses
//! BFS layering (this engine's connectivity graphs are undirected net
//! chains, not DAGs, so longest-path ranking does not apply directly) and
//! ordering uses a single barycenter pass per sweep without the subgraph
//! nesting dagre supports (this engine has no compound/cluster nodes).

use rustc_hash::FxHashMap;
use schem_core::model::{Node, NodeId};
use schem_core::{Config, Direction};

use crate::connectivity::BinaryEdge;

const ORDER_SWEEPS: usize = 4;

/// Runs the placement pass in place, assigning `x`/`y` to every node
/// without a fixed position. Nodes marked `fixed` (or already carrying an
/// `(x, y)`) are left untouched and act as anchors for the rest.
pub fn place(nodes: &mut [Node], placement_edges: &[BinaryEdge], config: &Config) {
    if nodes.iter().all(|n| n.x.is_some() && n.y.is_some()) {
        return;
    }

    let index_of: FxHashMap<NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.clone(), i))
        .collect();

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for edge in placement_edges {
        let (Some(&a), Some(&b)) = (
            index_of.get(&edge.source.node_id),
            index_of.get(&edge.target.node_id),
        ) else {
            continue;
        };
        if a != b {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
    }

    let ranks = assign_ranks(nodes.len(), &adjacency);
    let max_rank = ranks.iter().copied().max().unwrap_or(0);

    let mut by_rank: Vec<Vec<usize>> = vec![Vec::new(); max_rank + 1];
    for (i, &r) in ranks.iter().enumerate() {
        by_rank[r].push(i);
    }

    order_ranks(&mut by_rank, &adjacency);
    assign_coordinates(nodes, &by_rank, config);
}

/// BFS layering: every connected component's first node (in input order)
/// is rank 0; every other node's rank is its BFS distance from that root.
fn assign_ranks(n: usize, adjacency: &[Vec<usize>]) -> Vec<usize> {
    let mut ranks = vec![usize::MAX; n];
    for start in 0..n {
        if ranks[start] != usize::MAX {
            continue;
        }
        ranks[start] = 0;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(start);
        while let Some(v) = queue.pop_front() {
            let next_rank = ranks[v] + 1;
            for &w in &adjacency[v] {
                if ranks[w] == usize::MAX {
                    ranks[w] = next_rank;
                    queue.push_back(w);
                }
            }
        }
    }
    ranks
}

/// Iteratively reorders each rank by the barycenter (average order) of its
/// neighbors in the adjacent rank, alternating sweep direction, matching
/// dagre's downward/upward barycenter passes in spirit.
fn order_ranks(by_rank: &mut [Vec<usize>], adjacency: &[Vec<usize>]) {
    let mut order_of: FxHashMap<usize, usize> = FxHashMap::default();
    for rank in by_rank.iter() {
        for (pos, &node) in rank.iter().enumerate() {
            order_of.insert(node, pos);
        }
    }

    for sweep in 0..ORDER_SWEEPS {
        let downward = sweep % 2 == 0;
        let range: Box<dyn Iterator<Item = usize>> = if downward {
            Box::new(1..by_rank.len())
        } else {
            Box::new((0..by_rank.len().saturating_sub(1)).rev())
        };

        for rank_index in range {
            let rank = &by_rank[rank_index];
            let mut entries: Vec<(usize, f64)> = rank
                .iter()
                .map(|&v| {
                    let neighbor_orders: Vec<f64> = adjacency[v]
                        .iter()
                        .filter_map(|u| order_of.get(u).map(|&o| o as f64))
                        .collect();
                    let barycenter = if neighbor_orders.is_empty() {
                        order_of.get(&v).copied().unwrap_or(0) as f64
                    } else {
                        neighbor_orders.iter().sum::<f64>() / neighbor_orders.len() as f64
                    };
                    (v, barycenter)
                })
                .collect();
            entries.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

            by_rank[rank_index] = entries.iter().map(|&(v, _)| v).collect();
            for (pos, &(v, _)) in entries.iter().enumerate() {
                order_of.insert(v, pos);
            }
        }
    }
}

fn assign_coordinates(nodes: &mut [Node], by_rank: &[Vec<usize>], config: &Config) {
    let rank_axis_is_horizontal = matches!(config.direction, Direction::Left | Direction::Right);
    let rank_grows_negative = matches!(config.direction, Direction::Left | Direction::Up);

    let rank_sizes: Vec<f64> = by_rank
        .iter()
        .map(|members| {
            members
                .iter()
                .map(|&i| {
                    if rank_axis_is_horizontal {
                        nodes[i].width
                    } else {
                        nodes[i].height
                    }
                })
                .fold(0.0, f64::max)
        })
        .collect();

    let mut rank_offset = config.padding;
    let mut rank_starts = vec![0.0; by_rank.len()];
    for (r, size) in rank_sizes.iter().enumerate() {
        rank_starts[r] = rank_offset;
        rank_offset += size + config.spacing;
    }
    let total_rank_extent = rank_offset - config.spacing + config.padding;

    for (r, members) in by_rank.iter().enumerate() {
        let mut cross_offset = config.padding;
        for &i in members {
            if nodes[i].x.is_some() && nodes[i].y.is_some() {
                continue;
            }
            let rank_coord = if rank_grows_negative {
                total_rank_extent - rank_starts[r] - rank_sizes[r]
            } else {
                rank_starts[r]
            };
            let cross_size = if rank_axis_is_horizontal {
                nodes[i].height
            } else {
                nodes[i].width
            };

            if rank_axis_is_horizontal {
                nodes[i].x = Some(rank_coord);
                nodes[i].y = Some(cross_offset);
            } else {
                nodes[i].x = Some(cross_offset);
                nodes[i].y = Some(rank_coord);
            }
            cross_offset += cross_size + config.spacing;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schem_core::model::NodeKind;

    fn node(id: &str, w: f64, h: f64) -> Node {
        Node {
            id: id.to_string(),
            kind: NodeKind::Component,
            width: w,
            height: h,
            x: None,
            y: None,
            rotation: None,
            net_id: None,
            ports: Vec::new(),
            labels: Vec::new(),
            fixed: false,
        }
    }

    #[test]
    fn skips_placement_when_all_nodes_have_positions() {
        let mut nodes = vec![node("a", 10.0, 10.0)];
        nodes[0].x = Some(5.0);
        nodes[0].y = Some(5.0);
        place(&mut nodes, &[], &Config::default());
        assert_eq!(nodes[0].x, Some(5.0));
        assert_eq!(nodes[0].y, Some(5.0));
    }

    #[test]
    fn places_disconnected_nodes_without_panicking() {
        let mut nodes = vec![node("a", 10.0, 10.0), node("b", 10.0, 10.0)];
        place(&mut nodes, &[], &Config::default());
        assert!(nodes.iter().all(|n| n.x.is_some() && n.y.is_some()));
    }

    #[test]
    fn honors_fixed_nodes_and_places_the_rest() {
        let mut nodes = vec![node("a", 10.0, 10.0), node("b", 10.0, 10.0)];
        nodes[0].x = Some(42.0);
        nodes[0].y = Some(42.0);
        nodes[0].fixed = true;
        place(&mut nodes, &[], &Config::default());
        assert_eq!(nodes[0].x, Some(42.0));
        assert_eq!(nodes[0].y, Some(42.0));
        assert!(nodes[1].x.is_some());
    }
}
