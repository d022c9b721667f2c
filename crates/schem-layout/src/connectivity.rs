//! C4 — Connectivity Builder (`spec.md` §4.3).
//!
//! Produces binary (2-anchor) edges from the netlist's `net -> ports`
//! mapping. Called twice per layout: once at placement time
//! (`ignore_clusters = true`, node positions not yet resolved) and once at
//! routing time (`ignore_clusters = false`, after placement and grid
//! snapping).

use schem_core::model::{Node, NodeKind, VisibilityDirection};
use schem_core::{Config, Netlist};

use crate::cluster::cluster_points;
use crate::mst::minimum_spanning_tree;

#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub port_id: String,
    pub node_id: String,
    pub x: f64,
    pub y: f64,
    pub visibility_direction: VisibilityDirection,
    pub is_symbol_anchor: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeContext {
    pub net_id: String,
    pub net_name: Option<String>,
    /// Present for edges born of MST decomposition of a cluster hyperedge;
    /// absent for the direct 2-port edges the net-with-symbol path emits
    /// (`spec.md` §9, third open question — Label Placer falls back to
    /// `net_id` in that case).
    pub original_hyperedge_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryEdge {
    pub source: Anchor,
    pub target: Anchor,
    pub context: EdgeContext,
}

/// Sets `port.net_id` on every port whose id appears in some net's port
/// list (`spec.md` §4.3 "Port -> net mapping").
pub fn assign_port_nets(nodes: &mut [Node], netlist: &Netlist) {
    let mut port_to_net: rustc_hash::FxHashMap<&str, &str> = rustc_hash::FxHashMap::default();
    for (net_id, net) in &netlist.nets {
        for port_id in &net.ports {
            port_to_net.insert(port_id.as_str(), net_id.as_str());
        }
    }
    for node in nodes {
        for port in &mut node.ports {
            if let Some(net_id) = port_to_net.get(port.id.as_str()) {
                port.net_id = Some((*net_id).to_string());
            }
        }
    }
}

/// Builds the binary edges used by placement (`ignore_clusters = true`) or
/// routing (`ignore_clusters = false`).
pub fn build_connectivity(
    nodes: &[Node],
    netlist: &Netlist,
    config: &Config,
    ignore_clusters: bool,
) -> Vec<BinaryEdge> {
    let mut edges = Vec::new();
    for (net_id, net) in &netlist.nets {
        let anchors = collect_anchors(nodes, net_id);
        if anchors.len() < 2 {
            continue;
        }

        if ignore_clusters {
            // Placement-time: node positions aren't resolved yet, so
            // distance-based clustering/MST isn't meaningful. The backend
            // only needs one topological connection per net, so chain the
            // net's anchors in netlist order.
            for pair in anchors.windows(2) {
                edges.push(BinaryEdge {
                    source: pair[0].clone(),
                    target: pair[1].clone(),
                    context: EdgeContext {
                        net_id: net_id.clone(),
                        net_name: net.name.clone(),
                        original_hyperedge_id: Some(net_id.clone()),
                    },
                });
            }
            continue;
        }

        if net.symbol_source().is_some() {
            edges.extend(build_symbol_edges(net_id, net, &anchors));
        } else {
            edges.extend(build_clustered_edges(net_id, net, &anchors, config));
        }
    }
    edges
}

fn collect_anchors(nodes: &[Node], net_id: &str) -> Vec<Anchor> {
    let mut anchors = Vec::new();
    for node in nodes {
        for port in &node.ports {
            if port.net_id.as_deref() != Some(net_id) {
                continue;
            }
            let (x, y) = node.to_absolute(port.x, port.y).unwrap_or((0.0, 0.0));
            anchors.push(Anchor {
                port_id: port.id.clone(),
                node_id: node.id.clone(),
                x,
                y,
                visibility_direction: port.visibility_direction(node.rotation),
                is_symbol_anchor: node.kind == NodeKind::NetSymbol,
            });
        }
    }
    anchors
}

/// Net-with-symbol path (`spec.md` §4.3): every non-symbol port connects
/// directly to its nearest symbol-node port. No clustering, no MST.
fn build_symbol_edges(net_id: &str, net: &schem_core::Net, anchors: &[Anchor]) -> Vec<BinaryEdge> {
    let (symbol_anchors, component_anchors): (Vec<_>, Vec<_>) =
        anchors.iter().cloned().partition(|a| a.is_symbol_anchor);

    if symbol_anchors.is_empty() {
        return Vec::new();
    }

    let mut edges = Vec::with_capacity(component_anchors.len());
    for anchor in component_anchors {
        let nearest = symbol_anchors
            .iter()
            .min_by(|a, b| {
                distance(&anchor, a)
                    .partial_cmp(&distance(&anchor, b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .cloned();
        if let Some(nearest) = nearest {
            edges.push(BinaryEdge {
                source: anchor,
                target: nearest,
                context: EdgeContext {
                    net_id: net_id.to_string(),
                    net_name: net.name.clone(),
                    original_hyperedge_id: None,
                },
            });
        }
    }
    edges
}

/// Net-without-symbol path (`spec.md` §4.3, §4.4, §4.5): cluster by
/// distance threshold, then decompose each cluster into an MST of binary
/// edges.
fn build_clustered_edges(
    net_id: &str,
    net: &schem_core::Net,
    anchors: &[Anchor],
    config: &Config,
) -> Vec<BinaryEdge> {
    let points: Vec<(f64, f64)> = anchors.iter().map(|a| (a.x, a.y)).collect();
    let clusters = cluster_points(&points, config.net_connection_threshold);

    let mut edges = Vec::new();
    for (cluster_index, members) in clusters.iter().enumerate() {
        let hyperedge_id = format!("{net_id}#{cluster_index}");
        let cluster_points: Vec<(f64, f64)> = members.iter().map(|&i| points[i]).collect();
        let tree = minimum_spanning_tree(&cluster_points);
        for (local_i, local_j) in tree {
            let (i, j) = (members[local_i], members[local_j]);
            edges.push(BinaryEdge {
                source: anchors[i].clone(),
                target: anchors[j].clone(),
                context: EdgeContext {
                    net_id: net_id.to_string(),
                    net_name: net.name.clone(),
                    original_hyperedge_id: Some(hyperedge_id.clone()),
                },
            });
        }
    }
    edges
}

fn distance(a: &Anchor, b: &Anchor) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use schem_core::model::{Label, Port, Side};
    use schem_core::{Instance, InstanceKind, Net};

    fn node_with_port(id: &str, port_id: &str, x: f64, y: f64, net_id: &str) -> Node {
        Node {
            id: id.to_string(),
            kind: NodeKind::Component,
            width: 10.0,
            height: 10.0,
            x: Some(0.0),
            y: Some(0.0),
            rotation: None,
            net_id: None,
            ports: vec![Port {
                id: port_id.to_string(),
                x,
                y,
                side: Some(Side::E),
                labels: Vec::<Label>::new(),
                net_id: Some(net_id.to_string()),
                pin_number: None,
                pin_type: None,
            }],
            labels: Vec::new(),
            fixed: false,
        }
    }

    #[test]
    fn two_port_net_yields_one_binary_edge() {
        let nodes = vec![
            node_with_port("R1", "R1.P1", 0.0, 0.0, "N1"),
            node_with_port("R2", "R2.P1", 100.0, 0.0, "N1"),
        ];
        let mut netlist = Netlist {
            root_ref: "root".to_string(),
            ..Default::default()
        };
        netlist
            .instances
            .insert("root".to_string(), Instance::new(InstanceKind::Module));
        netlist.nets.insert(
            "N1".to_string(),
            Net {
                ports: vec!["R1.P1".to_string(), "R2.P1".to_string()],
                ..Default::default()
            },
        );

        let config = Config::default();
        let edges = build_connectivity(&nodes, &netlist, &config, false);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].context.net_id, "N1");
    }

    #[test]
    fn ports_beyond_threshold_yield_no_edges() {
        let nodes = vec![
            node_with_port("R1", "R1.P1", 0.0, 0.0, "N1"),
            node_with_port("R2", "R2.P1", 10_000.0, 0.0, "N1"),
        ];
        let mut netlist = Netlist {
            root_ref: "root".to_string(),
            ..Default::default()
        };
        netlist.nets.insert(
            "N1".to_string(),
            Net {
                ports: vec!["R1.P1".to_string(), "R2.P1".to_string()],
                ..Default::default()
            },
        );

        let config = Config::default();
        let edges = build_connectivity(&nodes, &netlist, &config, false);
        assert!(edges.is_empty());
    }

    #[test]
    fn assign_port_nets_sets_net_id_from_netlist() {
        let mut nodes = vec![Node {
            id: "R1".to_string(),
            kind: NodeKind::Component,
            width: 10.0,
            height: 10.0,
            x: None,
            y: None,
            rotation: None,
            net_id: None,
            ports: vec![Port {
                id: "R1.P1".to_string(),
                x: 0.0,
                y: 0.0,
                side: None,
                labels: Vec::new(),
                net_id: None,
                pin_number: None,
                pin_type: None,
            }],
            labels: Vec::new(),
            fixed: false,
        }];
        let mut netlist = Netlist {
            root_ref: "root".to_string(),
            ..Default::default()
        };
        netlist.nets.insert(
            "N1".to_string(),
            Net {
                ports: vec!["R1.P1".to_string()],
                ..Default::default()
            },
        );

        assign_port_nets(&mut nodes, &netlist);
        assert_eq!(nodes[0].ports[0].net_id.as_deref(), Some("N1"));
    }
}
