//! C11 — Layout Driver (`spec.md` §4.10).
//!
//! Orchestrates C1–C10 into a single `layout()` call. The pass order here
//! follows the dependency order the steps actually need rather than the
//! literal numbering in `spec.md` §4.10 (the Auto-Exploder's leaf list is a
//! precondition of the Nodes Builder, not a later step) — the set of passes
//! and their net effect match exactly.

use std::collections::HashSet;

use schem_core::geom::Rect;
use schem_core::model::{
    Edge, Label, LabelPurpose, LayoutResult, Node, NodePositionEntry, NodePositions, Obstacle,
    Side, TextAlign,
};
use schem_core::netlist::{existing_net_symbol_numerals, net_symbol_id};
use schem_core::text::TextMeasurer;
use schem_core::{Config, Error, Netlist, Result};

use crate::connectivity;
use crate::explode;
use crate::junctions::{self, EdgeView};
use crate::labels;
use crate::nodes::{self, apply_fixed_position};
use crate::oracle::SymbolOracle;
use crate::placement;
use crate::router::{self, is_orthogonal};

/// The entry point of the layout pipeline. Holds no state between calls
/// (`spec.md` §3 "Lifecycles" — nodes, ports, and routing state are fresh
/// every invocation); a value exists only to carry the caller's collaborator
/// references for the duration of one `layout()` call.
pub struct LayoutEngine<'a> {
    pub oracle: &'a dyn SymbolOracle,
    pub measurer: &'a dyn TextMeasurer,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(oracle: &'a dyn SymbolOracle, measurer: &'a dyn TextMeasurer) -> Self {
        Self { oracle, measurer }
    }

    pub fn layout(
        &self,
        netlist: &Netlist,
        positions: &NodePositions,
        config: &Config,
    ) -> Result<LayoutResult> {
        config.validate()?;
        netlist.validate()?;

        let leaf_refs = explode::explode(netlist);
        let mut nodes = nodes::build_nodes(
            netlist,
            &leaf_refs,
            positions,
            self.oracle,
            self.measurer,
            config,
        );
        nodes.extend(build_net_symbol_nodes(
            netlist, positions, self.oracle, config,
        ));

        connectivity::assign_port_nets(&mut nodes, netlist);
        add_net_reference_labels(&mut nodes, config);

        if !nodes.iter().all(|n| n.x.is_some() && n.y.is_some()) {
            let placement_edges = connectivity::build_connectivity(&nodes, netlist, config, true);
            placement::place(&mut nodes, &placement_edges, config);
        }

        if config.grid_snap.enabled {
            snap_nodes(&mut nodes, config.grid_snap.size);
        }

        let routing_edges = connectivity::build_connectivity(&nodes, netlist, config, false);
        let will_be_wired: HashSet<&str> = routing_edges
            .iter()
            .flat_map(|e| [e.source.port_id.as_str(), e.target.port_id.as_str()])
            .collect();
        if config.hide_labels_on_connected_ports {
            remove_net_reference_labels(&mut nodes, &will_be_wired);
        }

        let obstacles = build_obstacles(&nodes, self.measurer);
        let routed = router::route_all(&obstacles, &routing_edges);

        let net_labels = labels::place_labels(&routing_edges, &routed, self.measurer);

        let mut edges: Vec<(usize, Edge)> = routing_edges
            .iter()
            .zip(routed.iter())
            .enumerate()
            .filter_map(|(index, (binary_edge, routed_edge))| {
                let edge_id = format!("{}#{index}", binary_edge.context.net_id);
                let Some(r) = routed_edge.as_ref() else {
                    let hyperedge_id = binary_edge
                        .context
                        .original_hyperedge_id
                        .clone()
                        .unwrap_or_else(|| binary_edge.context.net_id.clone());
                    let err = Error::RouterDisconnected { hyperedge_id };
                    tracing::warn!(error = %err, "dropping edge with no route");
                    return None;
                };
                if !is_orthogonal(&r.polyline) {
                    let err = Error::RouterNonOrthogonal { edge_id };
                    tracing::warn!(error = %err, "dropping edge");
                    return None;
                }
                Some((
                    index,
                    Edge {
                        id: edge_id,
                        net_id: binary_edge.context.net_id.clone(),
                        source_port: binary_edge.source.port_id.clone(),
                        target_port: binary_edge.target.port_id.clone(),
                        source_node: binary_edge.source.node_id.clone(),
                        target_node: binary_edge.target.node_id.clone(),
                        polyline: Some(r.polyline.clone()),
                        junction_points: Vec::new(),
                        label: None,
                    },
                ))
            })
            .collect();

        for net_label in &net_labels {
            if let Some((_, edge)) = edges.iter_mut().find(|(i, _)| *i == net_label.edge_index) {
                edge.label = Some(net_label.label.clone());
            }
        }

        let views: Vec<EdgeView> = edges
            .iter()
            .map(|(_, e)| EdgeView {
                net_id: &e.net_id,
                polyline: e.polyline.as_deref().unwrap_or(&[]),
            })
            .collect();
        let junctions = junctions::find_junctions(&views);
        for ((_, edge), points) in edges.iter_mut().zip(junctions.into_iter()) {
            edge.junction_points = points;
        }

        let connected_after: HashSet<&str> = edges
            .iter()
            .flat_map(|(_, e)| [e.source_port.as_str(), e.target_port.as_str()])
            .collect();
        let disconnected_now: Vec<&str> = will_be_wired
            .iter()
            .copied()
            .filter(|p| !connected_after.contains(p))
            .collect();
        if config.hide_labels_on_connected_ports {
            restore_net_reference_labels(&mut nodes, &disconnected_now);
        }

        let final_edges: Vec<Edge> = edges.into_iter().map(|(_, e)| e).collect();
        let node_positions = snapshot_positions(&nodes);

        Ok(LayoutResult {
            nodes,
            edges: final_edges,
            node_positions,
        })
    }
}

/// C11 step 3: one net-symbol node per numeral already present in the
/// caller's `NodePositions`, defaulting to `1` for any net carrying a
/// symbol source that has none yet (`spec.md` §3 invariant 4).
fn build_net_symbol_nodes(
    netlist: &Netlist,
    positions: &NodePositions,
    oracle: &dyn SymbolOracle,
    config: &Config,
) -> Vec<Node> {
    let mut out = Vec::new();
    for (net_id, net) in &netlist.nets {
        let net_name = net.display_name(net_id).to_string();
        let mut numerals =
            existing_net_symbol_numerals(&netlist.root_ref, &net_name, positions.keys().map(|s| s.as_str()));
        if numerals.is_empty() {
            if net.symbol_source().is_none() {
                continue;
            }
            numerals.push(1);
        }
        for k in numerals {
            let node_id = net_symbol_id(&netlist.root_ref, &net_name, k);
            let mut node = nodes::build_net_symbol_node(&node_id, net_id, net, oracle, config);
            apply_fixed_position(&mut node, &node_id, positions);
            out.push(node);
        }
    }
    out
}

/// A short net-reference label on every net-bound port, shown unless the
/// port ends up wired (`spec.md` §4.10 steps 8 and 12).
fn add_net_reference_labels(nodes: &mut [Node], config: &Config) {
    if !config.show_port_labels {
        return;
    }
    for node in nodes {
        let net_names: Vec<(usize, String)> = node
            .ports
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.net_id.clone().map(|n| (i, n)))
            .collect();
        for (i, net_id) in net_names {
            node.ports[i].labels.push(Label {
                text: net_id,
                x: None,
                y: None,
                width: 0.0,
                height: 0.0,
                align: TextAlign::Start,
                purpose: LabelPurpose::NetReference,
            });
        }
    }
}

fn remove_net_reference_labels(nodes: &mut [Node], wired_ports: &HashSet<&str>) {
    for node in nodes {
        for port in &mut node.ports {
            if wired_ports.contains(port.id.as_str()) {
                port.labels
                    .retain(|l| l.purpose != LabelPurpose::NetReference);
            }
        }
    }
}

fn restore_net_reference_labels(nodes: &mut [Node], ports: &[&str]) {
    let wanted: HashSet<&str> = ports.iter().copied().collect();
    for node in nodes {
        for port in &mut node.ports {
            if !wanted.contains(port.id.as_str()) {
                continue;
            }
            if port.labels.iter().any(|l| l.purpose == LabelPurpose::NetReference) {
                continue;
            }
            if let Some(net_id) = port.net_id.clone() {
                port.labels.push(Label {
                    text: net_id,
                    x: None,
                    y: None,
                    width: 0.0,
                    height: 0.0,
                    align: TextAlign::Start,
                    purpose: LabelPurpose::NetReference,
                });
            }
        }
    }
}

/// Snaps every positioned node's top-left corner to `grid` (`spec.md`
/// §4.10 "Grid snapping"). Port offsets are already relative to the node's
/// top-left, so they need no adjustment.
fn snap_nodes(nodes: &mut [Node], grid: f64) {
    for node in nodes {
        if let (Some(x), Some(y)) = (node.x, node.y) {
            node.x = Some(schem_core::geom::snap(x, grid));
            node.y = Some(schem_core::geom::snap(y, grid));
        }
    }
}

const PORT_LABEL_FONT_SIZE: f64 = 10.0;
const PORT_LABEL_OFFSET: f64 = 4.0;

/// One obstacle per positioned node rectangle, plus one per port-name/
/// net-reference label rectangle (`spec.md` §3 invariant 5). Node-body
/// labels (reference designator, value, ...) render inside the node's own
/// rectangle and are already covered by it; port labels sit outside the
/// node and are never assigned absolute coordinates of their own (their
/// placement is a rendering concern), so their keep-out rect is derived
/// here from the port's absolute position, its side, and the label's
/// measured text size.
fn build_obstacles(nodes: &[Node], measurer: &dyn TextMeasurer) -> Vec<Obstacle> {
    let mut obstacles = Vec::new();
    for node in nodes {
        if let Some(rect) = node.rect() {
            obstacles.push(Obstacle {
                id: node.id.clone(),
                rect,
            });
        }
        for port in &node.ports {
            let Some((px, py)) = node.to_absolute(port.x, port.y) else {
                continue;
            };
            for (i, label) in port.labels.iter().enumerate() {
                let metrics = measurer.measure(&label.text, PORT_LABEL_FONT_SIZE);
                let (origin_x, origin_y) = match port.side {
                    Some(Side::N) => (
                        px - metrics.width / 2.0,
                        py - PORT_LABEL_OFFSET - metrics.height,
                    ),
                    Some(Side::S) => (px - metrics.width / 2.0, py + PORT_LABEL_OFFSET),
                    Some(Side::E) => (px + PORT_LABEL_OFFSET, py - metrics.height / 2.0),
                    Some(Side::W) => (
                        px - PORT_LABEL_OFFSET - metrics.width,
                        py - metrics.height / 2.0,
                    ),
                    None => (px - metrics.width / 2.0, py - metrics.height / 2.0),
                };
                obstacles.push(Obstacle {
                    id: format!("{}.{}.label.{i}", node.id, port.id),
                    rect: Rect::from_origin_size(origin_x, origin_y, metrics.width, metrics.height),
                });
            }
        }
    }
    obstacles
}

fn snapshot_positions(nodes: &[Node]) -> NodePositions {
    let mut out: NodePositions = NodePositions::new();
    for node in nodes {
        let (Some(x), Some(y)) = (node.x, node.y) else {
            continue;
        };
        out.insert(
            node.id.clone(),
            NodePositionEntry {
                x,
                y,
                width: Some(node.width),
                height: Some(node.height),
                rotation: node.rotation.map(|r| r.degrees()),
            },
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::EmptyOracle;
    use schem_core::netlist::{Instance, InstanceKind, Net};
    use schem_core::text::DeterministicTextMeasurer;

    fn two_component_netlist() -> Netlist {
        let mut netlist = Netlist {
            root_ref: "design".to_string(),
            ..Default::default()
        };
        let mut root = Instance::new(InstanceKind::Module);
        root.children.insert("r1".to_string(), "design.r1".to_string());
        root.children.insert("r2".to_string(), "design.r2".to_string());
        netlist.instances.insert("design".to_string(), root);

        for (name, port) in [("r1", "p1"), ("r2", "p1")] {
            let mut component = Instance::new(InstanceKind::Component);
            component
                .children
                .insert(port.to_string(), format!("design.{name}.{port}"));
            netlist.instances.insert(format!("design.{name}"), component);
            netlist.instances.insert(
                format!("design.{name}.{port}"),
                Instance::new(InstanceKind::Port),
            );
        }

        netlist.nets.insert(
            "N1".to_string(),
            Net {
                name: Some("N1".to_string()),
                ports: vec!["design.r1.p1".to_string(), "design.r2.p1".to_string()],
                ..Default::default()
            },
        );
        netlist
    }

    #[test]
    fn lays_out_two_components_and_connects_them() {
        let netlist = two_component_netlist();
        let oracle = EmptyOracle;
        let measurer = DeterministicTextMeasurer::default();
        let engine = LayoutEngine::new(&oracle, &measurer);
        let config = Config::default();

        let result = engine
            .layout(&netlist, &NodePositions::new(), &config)
            .expect("layout should succeed");

        assert_eq!(result.nodes.len(), 2);
        assert!(result.nodes.iter().all(|n| n.x.is_some() && n.y.is_some()));
        assert!(!result.node_positions.is_empty());
    }

    #[test]
    fn is_deterministic_across_runs() {
        let netlist = two_component_netlist();
        let oracle = EmptyOracle;
        let measurer = DeterministicTextMeasurer::default();
        let engine = LayoutEngine::new(&oracle, &measurer);
        let config = Config::default();

        let a = engine.layout(&netlist, &NodePositions::new(), &config).unwrap();
        let b = engine.layout(&netlist, &NodePositions::new(), &config).unwrap();
        assert_eq!(a.node_positions, b.node_positions);
    }

    #[test]
    fn rejects_invalid_config() {
        let netlist = two_component_netlist();
        let oracle = EmptyOracle;
        let measurer = DeterministicTextMeasurer::default();
        let engine = LayoutEngine::new(&oracle, &measurer);
        let mut config = Config::default();
        config.spacing = -1.0;
        assert!(engine.layout(&netlist, &NodePositions::new(), &config).is_err());
    }
}
