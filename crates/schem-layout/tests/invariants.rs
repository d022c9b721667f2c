//! Universal invariants as property tests, generated over small random
//! netlists and point sets.

use proptest::prelude::*;

use schem_core::model::{NodePositionEntry, Rotation};
use schem_core::netlist::{Instance, InstanceKind, Net};
use schem_core::text::DeterministicTextMeasurer;
use schem_core::{Config, Netlist, NodePositions};

use schem_layout::oracle::EmptyOracle;
use schem_layout::LayoutEngine;

/// Builds a star netlist: `count` components, each with one port, all on a
/// single net. `count` in `[2, 6]`.
fn star_netlist(count: usize) -> Netlist {
    let mut netlist = Netlist {
        root_ref: "Board".to_string(),
        ..Default::default()
    };
    let mut root = Instance::new(InstanceKind::Module);
    for i in 0..count {
        root.children
            .insert(format!("C{i}"), format!("Board.C{i}"));
    }
    netlist.instances.insert("Board".to_string(), root);

    let mut ports = Vec::new();
    for i in 0..count {
        let mut component = Instance::new(InstanceKind::Component);
        component
            .children
            .insert("P1".to_string(), format!("Board.C{i}.P1"));
        netlist
            .instances
            .insert(format!("Board.C{i}"), component);
        netlist.instances.insert(
            format!("Board.C{i}.P1"),
            Instance::new(InstanceKind::Port),
        );
        ports.push(format!("Board.C{i}.P1"));
    }
    netlist.nets.insert(
        "N1".to_string(),
        Net {
            ports,
            ..Default::default()
        },
    );
    netlist
}

fn fixed_positions(count: usize, coords: &[(f64, f64)]) -> NodePositions {
    let mut positions = NodePositions::new();
    for (i, (x, y)) in coords.iter().take(count).enumerate() {
        positions.insert(
            format!("Board.C{i}"),
            NodePositionEntry {
                x: *x,
                y: *y,
                width: None,
                height: None,
                rotation: None,
            },
        );
    }
    positions
}

proptest! {
    /// Invariant 1 — determinism: the same inputs produce bitwise-equal
    /// results across repeated calls.
    #[test]
    fn determinism(count in 2usize..6, coords in prop::collection::vec((-500.0f64..500.0, -500.0f64..500.0), 2..6)) {
        let netlist = star_netlist(count);
        let positions = fixed_positions(count, &coords);
        let oracle = EmptyOracle;
        let measurer = DeterministicTextMeasurer::default();
        let engine = LayoutEngine::new(&oracle, &measurer);
        let config = Config::default();

        let a = engine.layout(&netlist, &positions, &config).unwrap();
        let b = engine.layout(&netlist, &positions, &config).unwrap();
        prop_assert_eq!(a.node_positions, b.node_positions);
        prop_assert_eq!(a.edges.len(), b.edges.len());
    }

    /// Invariant 2 — idempotence under position round-trip: feeding a
    /// layout's own `node_positions` back in reproduces the same snapshot.
    #[test]
    fn idempotent_under_position_round_trip(count in 2usize..6, coords in prop::collection::vec((-500.0f64..500.0, -500.0f64..500.0), 2..6)) {
        let netlist = star_netlist(count);
        let positions = fixed_positions(count, &coords);
        let oracle = EmptyOracle;
        let measurer = DeterministicTextMeasurer::default();
        let engine = LayoutEngine::new(&oracle, &measurer);
        let config = Config::default();

        let first = engine.layout(&netlist, &positions, &config).unwrap();
        let second = engine
            .layout(&netlist, &first.node_positions, &config)
            .unwrap();
        prop_assert_eq!(first.node_positions, second.node_positions);
    }

    /// Invariants 3 and 4 — every polyline segment is axis-aligned, and the
    /// first/last points equal the source/target ports' absolute positions.
    #[test]
    fn orthogonal_and_endpoint_correct(count in 2usize..6, coords in prop::collection::vec((-500.0f64..500.0, -500.0f64..500.0), 2..6)) {
        let netlist = star_netlist(count);
        let positions = fixed_positions(count, &coords);
        let oracle = EmptyOracle;
        let measurer = DeterministicTextMeasurer::default();
        let engine = LayoutEngine::new(&oracle, &measurer);
        let config = Config::default();

        let result = engine.layout(&netlist, &positions, &config).unwrap();
        for edge in &result.edges {
            let Some(polyline) = &edge.polyline else { continue };
            for pair in polyline.windows(2) {
                let aligned = (pair[0].0 - pair[1].0).abs() < 1e-9 || (pair[0].1 - pair[1].1).abs() < 1e-9;
                prop_assert!(aligned, "segment {:?} -> {:?} is not axis-aligned", pair[0], pair[1]);
            }

            let source_node = result.nodes.iter().find(|n| n.id == edge.source_node).unwrap();
            let source_port = source_node.ports.iter().find(|p| p.id == edge.source_port).unwrap();
            let source = source_node.to_absolute(source_port.x, source_port.y).unwrap();

            let target_node = result.nodes.iter().find(|n| n.id == edge.target_node).unwrap();
            let target_port = target_node.ports.iter().find(|p| p.id == edge.target_port).unwrap();
            let target = target_node.to_absolute(target_port.x, target_port.y).unwrap();

            let first = *polyline.first().unwrap();
            let last = *polyline.last().unwrap();
            prop_assert!((first.0 - source.0).abs() < 1e-6 && (first.1 - source.1).abs() < 1e-6);
            prop_assert!((last.0 - target.0).abs() < 1e-6 && (last.1 - target.1).abs() < 1e-6);
        }
    }

    /// Invariant 5 — net consistency: an edge's net id matches both its
    /// endpoint ports' net ids, and the net's port list mentions both ids.
    #[test]
    fn net_consistency(count in 2usize..6, coords in prop::collection::vec((-500.0f64..500.0, -500.0f64..500.0), 2..6)) {
        let netlist = star_netlist(count);
        let positions = fixed_positions(count, &coords);
        let oracle = EmptyOracle;
        let measurer = DeterministicTextMeasurer::default();
        let engine = LayoutEngine::new(&oracle, &measurer);
        let config = Config::default();

        let result = engine.layout(&netlist, &positions, &config).unwrap();
        let net = netlist.nets.get("N1").unwrap();
        for edge in &result.edges {
            prop_assert!(net.ports.contains(&edge.source_port) || edge.source_node.contains(".N1."));
            prop_assert!(net.ports.contains(&edge.target_port) || edge.target_node.contains(".N1."));
            for node in &result.nodes {
                if node.id == edge.source_node {
                    let port = node.ports.iter().find(|p| p.id == edge.source_port).unwrap();
                    prop_assert_eq!(port.net_id.as_deref(), Some(edge.net_id.as_str()));
                }
                if node.id == edge.target_node {
                    let port = node.ports.iter().find(|p| p.id == edge.target_port).unwrap();
                    prop_assert_eq!(port.net_id.as_deref(), Some(edge.net_id.as_str()));
                }
            }
        }
    }

    /// Invariant 7 — grid alignment: every positioned node's coordinates
    /// are exact multiples of the grid pitch when snapping is enabled.
    #[test]
    fn grid_alignment(count in 2usize..6, coords in prop::collection::vec((-500.0f64..500.0, -500.0f64..500.0), 2..6)) {
        let netlist = star_netlist(count);
        let positions = fixed_positions(count, &coords);
        let oracle = EmptyOracle;
        let measurer = DeterministicTextMeasurer::default();
        let engine = LayoutEngine::new(&oracle, &measurer);
        let mut config = Config::default();
        config.grid_snap.enabled = true;
        config.grid_snap.size = 12.7;

        let result = engine.layout(&netlist, &positions, &config).unwrap();
        for (_, entry) in &result.node_positions {
            let x_remainder = (entry.x / config.grid_snap.size).round() * config.grid_snap.size - entry.x;
            let y_remainder = (entry.y / config.grid_snap.size).round() * config.grid_snap.size - entry.y;
            prop_assert!(x_remainder.abs() < 1e-6);
            prop_assert!(y_remainder.abs() < 1e-6);
        }
    }

    /// Invariant 6 — MST completeness: a cluster of `k` points always
    /// yields `k - 1` tree edges forming a single spanning component.
    #[test]
    fn mst_completeness(points in prop::collection::vec((-1000.0f64..1000.0, -1000.0f64..1000.0), 2..8)) {
        let tree = schem_layout::mst::minimum_spanning_tree(&points);
        prop_assert_eq!(tree.len(), points.len() - 1);

        let mut parent: Vec<usize> = (0..points.len()).collect();
        fn find(parent: &mut [usize], x: usize) -> usize {
            if parent[x] != x {
                parent[x] = find(parent, parent[x]);
            }
            parent[x]
        }
        for (i, j) in &tree {
            let (ri, rj) = (find(&mut parent, *i), find(&mut parent, *j));
            parent[ri] = rj;
        }
        let root = find(&mut parent, 0);
        for i in 1..points.len() {
            prop_assert_eq!(find(&mut parent, i), root);
        }
    }

    /// Invariant 8 — junction correctness: every junction point recorded
    /// against an edge is also recorded against at least one other edge, so
    /// every junction has at least two distinct edges passing through it.
    /// Each generated edge is a single horizontal or vertical segment on a
    /// shared net, over a small integer coordinate range so segments are
    /// likely to cross or touch each other's endpoints.
    #[test]
    fn junction_correctness(
        segments in prop::collection::vec(
            (-5i32..5, -5i32..5, -5i32..5, prop::bool::ANY),
            2..8,
        )
    ) {
        use schem_layout::junctions::{find_junctions, EdgeView};

        let polylines: Vec<[(f64, f64); 2]> = segments
            .iter()
            .filter_map(|(fixed, span_a, span_b, horizontal)| {
                if span_a == span_b {
                    return None;
                }
                let (fixed, a, b) = (*fixed as f64, *span_a as f64, *span_b as f64);
                Some(if *horizontal {
                    [(a, fixed), (b, fixed)]
                } else {
                    [(fixed, a), (fixed, b)]
                })
            })
            .collect();

        let edges: Vec<EdgeView> = polylines
            .iter()
            .map(|polyline| EdgeView { net_id: "N1", polyline: polyline.as_slice() })
            .collect();

        let junctions = find_junctions(&edges);
        prop_assert_eq!(junctions.len(), edges.len());

        for (edge_index, points) in junctions.iter().enumerate() {
            for point in points {
                let supporting_edges = junctions
                    .iter()
                    .filter(|other| {
                        other
                            .iter()
                            .any(|p| (p.0 - point.0).abs() < 1e-6 && (p.1 - point.1).abs() < 1e-6)
                    })
                    .count();
                prop_assert!(
                    supporting_edges >= 2,
                    "junction {:?} on edge {} has only {} supporting edge(s)",
                    point,
                    edge_index,
                    supporting_edges
                );
            }
        }
    }

    /// Boundary behavior — node rotated 360 degrees is equivalent to
    /// rotation 0.
    #[test]
    fn rotation_360_is_identity(degrees in 0u32..1) {
        let _ = degrees;
        prop_assert_eq!(Rotation::from_degrees(360.0), Rotation::Deg0);
        prop_assert_eq!(Rotation::from_degrees(720.0), Rotation::Deg0);
    }
}

/// Boundary behavior — a net with a single port produces no edges and no
/// junctions.
#[test]
fn single_port_net_has_no_edges() {
    let netlist = star_netlist(1);
    let oracle = EmptyOracle;
    let measurer = DeterministicTextMeasurer::default();
    let engine = LayoutEngine::new(&oracle, &measurer);
    let config = Config::default();
    let result = engine
        .layout(&netlist, &NodePositions::new(), &config)
        .unwrap();
    assert!(result.edges.is_empty());
}
