//! C2 — Nodes Builder (`spec.md` §4.1).
//!
//! Builds one node per leaf instance reference from the Auto-Exploder (C3),
//! plus the net-symbol nodes the Layout Driver (C11) synthesizes separately.
//! Symbol nodes query the Symbol Oracle (C1); module nodes size themselves
//! from their labels and ports.

use schem_core::model::{Label, LabelPurpose, Node, NodeKind, Port, Side, TextAlign};
use schem_core::text::TextMeasurer;
use schem_core::{Config, Error, Instance, InstanceKind, Net, Netlist, NodePositions, Rotation};
use tracing::warn;

use crate::oracle::SymbolOracle;

const SYMBOL_SCALE: f64 = 10.0;
const MODULE_LABEL_FONT_SIZE: f64 = 14.0;
const MODULE_LABEL_MARGIN: f64 = 8.0;
const MODULE_PORT_SPACING: f64 = 20.0;
const MODULE_MIN_WIDTH: f64 = 80.0;
const MODULE_MIN_HEIGHT: f64 = 40.0;
const NET_SYMBOL_MIN_SIZE: f64 = 20.0;

/// Builds the single node for a net symbol (`spec.md` §3 "Lifecycles",
/// §4.1 "one node per net symbol"). `node_id` is the synthesized
/// `<root_ref>.<net_name>.<k>` id; the node carries exactly one port,
/// itself already bound to `net_id` (net-symbol ports aren't listed in
/// `Net::ports`, so the Connectivity Builder can't discover them via the
/// usual port-id lookup).
pub fn build_net_symbol_node(
    node_id: &str,
    net_id: &str,
    net: &Net,
    oracle: &dyn SymbolOracle,
    config: &Config,
) -> Node {
    if let Some(symbol_source) = net.symbol_source() {
        if let Ok(info) = oracle.get_symbol_info(symbol_source) {
            let width = (info.bbox.w * SYMBOL_SCALE).max(NET_SYMBOL_MIN_SIZE);
            let height = (info.bbox.h * SYMBOL_SCALE).max(NET_SYMBOL_MIN_SIZE);
            let anchor = info.pin_endpoints.first();
            let (local_x, local_y, side) = match anchor {
                Some(pin) => {
                    let x = (pin.position.0 - info.bbox.x) * SYMBOL_SCALE;
                    let y = (pin.position.1 - info.bbox.y) * SYMBOL_SCALE;
                    (x, y, nearest_side(x, y, width, height))
                }
                None => (width / 2.0, height, Side::S),
            };
            return Node {
                id: node_id.to_string(),
                kind: NodeKind::NetSymbol,
                width,
                height,
                x: None,
                y: None,
                rotation: None,
                net_id: Some(net_id.to_string()),
                ports: vec![Port {
                    id: format!("{node_id}.1"),
                    x: local_x,
                    y: local_y,
                    side: Some(side),
                    labels: Vec::new(),
                    net_id: Some(net_id.to_string()),
                    pin_number: None,
                    pin_type: None,
                }],
                labels: vec![net_symbol_label(net, net_id, width)],
                fixed: false,
            };
        }
        warn!(symbol_source, net_id, "symbol oracle failed for net symbol, using default box");
    }

    let (width, height) = config
        .min_node_size("net_symbol")
        .unwrap_or((NET_SYMBOL_MIN_SIZE, NET_SYMBOL_MIN_SIZE));
    Node {
        id: node_id.to_string(),
        kind: NodeKind::NetSymbol,
        width,
        height,
        x: None,
        y: None,
        rotation: None,
        net_id: Some(net_id.to_string()),
        ports: vec![Port {
            id: format!("{node_id}.1"),
            x: width / 2.0,
            y: height,
            side: Some(Side::S),
            labels: Vec::new(),
            net_id: Some(net_id.to_string()),
            pin_number: None,
            pin_type: None,
        }],
        labels: vec![net_symbol_label(net, net_id, width)],
        fixed: false,
    }
}

fn net_symbol_label(net: &Net, net_id: &str, width: f64) -> Label {
    Label {
        text: net.display_name(net_id).to_string(),
        x: None,
        y: None,
        width,
        height: MODULE_LABEL_FONT_SIZE * 1.2,
        align: TextAlign::Center,
        purpose: LabelPurpose::Main,
    }
}

/// Builds one `Node` for every leaf reference, in the given order.
pub fn build_nodes(
    netlist: &Netlist,
    leaf_refs: &[String],
    positions: &NodePositions,
    oracle: &dyn SymbolOracle,
    measurer: &dyn TextMeasurer,
    config: &Config,
) -> Vec<Node> {
    leaf_refs
        .iter()
        .filter_map(|leaf_ref| {
            let instance = netlist.instance(leaf_ref).ok()?;
            let mut node = if let Some(symbol_source) = instance.symbol_source() {
                build_symbol_node(netlist, leaf_ref, instance, symbol_source, oracle, config)
                    .unwrap_or_else(|| {
                        build_module_node(netlist, leaf_ref, instance, measurer, config)
                    })
            } else {
                build_module_node(netlist, leaf_ref, instance, measurer, config)
            };
            apply_fixed_position(&mut node, leaf_ref, positions);
            Some(node)
        })
        .collect()
}

pub(crate) fn apply_fixed_position(node: &mut Node, node_id: &str, positions: &NodePositions) {
    if let Some(entry) = positions.get(node_id) {
        node.x = Some(entry.x);
        node.y = Some(entry.y);
        node.rotation = entry.rotation.map(Rotation::from_degrees);
        node.fixed = true;
    }
}

fn build_symbol_node(
    netlist: &Netlist,
    leaf_ref: &str,
    instance: &Instance,
    symbol_source: &str,
    oracle: &dyn SymbolOracle,
    config: &Config,
) -> Option<Node> {
    let info = match oracle.get_symbol_info(symbol_source) {
        Ok(info) => info,
        Err(err) => {
            let typed = Error::SymbolOracleFailure {
                symbol_source: symbol_source.to_string(),
                message: err.message,
            };
            warn!(error = %typed, "falling back to module node");
            return None;
        }
    };

    let width = info.bbox.w * SYMBOL_SCALE;
    let height = info.bbox.h * SYMBOL_SCALE;

    let mut ports = Vec::with_capacity(info.pin_endpoints.len());
    for pin in &info.pin_endpoints {
        let local_x = (pin.position.0 - info.bbox.x) * SYMBOL_SCALE;
        let local_y = (pin.position.1 - info.bbox.y) * SYMBOL_SCALE;
        let side = nearest_side(local_x, local_y, width, height);
        let (snapped_x, snapped_y) = snap_to_side(local_x, local_y, width, height, side);

        let child_name = map_pin_to_child(instance, pin);
        let port_id = match &child_name {
            Some(name) => format!("{leaf_ref}.{name}"),
            None => {
                warn!(
                    symbol_source,
                    pin = %pin.name,
                    "could not map symbol pin to a child instance; using pin name as port id"
                );
                format!("{leaf_ref}.{}", pin.name)
            }
        };

        ports.push(Port {
            id: port_id,
            x: snapped_x,
            y: snapped_y,
            side: Some(side),
            labels: Vec::new(),
            net_id: None,
            pin_number: Some(pin.number.clone()),
            pin_type: Some(pin.pin_type.clone()),
        });
    }

    let labels = build_instance_labels(netlist, leaf_ref, instance, width, config);

    Some(Node {
        id: leaf_ref.to_string(),
        kind: NodeKind::Symbol,
        width,
        height,
        x: None,
        y: None,
        rotation: None,
        net_id: None,
        ports,
        labels,
        fixed: false,
    })
}

/// Finds the side of a `width` x `height` rectangle nearest to
/// `(local_x, local_y)`, by distance to each of the four edges
/// (`spec.md` §4.1 "Port placement on a symbol node").
fn nearest_side(local_x: f64, local_y: f64, width: f64, height: f64) -> Side {
    let dist_n = local_y.abs();
    let dist_s = (height - local_y).abs();
    let dist_w = local_x.abs();
    let dist_e = (width - local_x).abs();

    let mut best = Side::N;
    let mut best_dist = dist_n;
    for (side, dist) in [(Side::S, dist_s), (Side::W, dist_w), (Side::E, dist_e)] {
        if dist < best_dist {
            best = side;
            best_dist = dist;
        }
    }
    best
}

fn snap_to_side(local_x: f64, local_y: f64, width: f64, height: f64, side: Side) -> (f64, f64) {
    match side {
        Side::N => (local_x, 0.0),
        Side::S => (local_x, height),
        Side::W => (0.0, local_y),
        Side::E => (width, local_y),
    }
}

/// Maps a symbol pin back to the corresponding child instance, trying in
/// order: exact name match; case-insensitive match; `pin_number` attribute
/// match; and for unnamed pins ("~"), `P<number>` / `<number>`
/// (`spec.md` §4.1).
fn map_pin_to_child(instance: &Instance, pin: &crate::oracle::PinEndpoint) -> Option<String> {
    if instance.children.contains_key(pin.name.as_str()) {
        return Some(pin.name.clone());
    }

    if let Some((name, _)) = instance
        .children
        .iter()
        .find(|(child_name, _)| child_name.eq_ignore_ascii_case(&pin.name))
    {
        return Some(name.clone());
    }

    for child_name in instance.children.keys() {
        if instance
            .attributes
            .get(&format!("{child_name}.pin_number"))
            .and_then(|v| v.as_string())
            .map(|s| s == pin.number)
            .unwrap_or(false)
        {
            return Some(child_name.clone());
        }
    }

    if pin.name == "~" {
        let by_p = format!("P{}", pin.number);
        if instance.children.contains_key(by_p.as_str()) {
            return Some(by_p);
        }
        if instance.children.contains_key(pin.number.as_str()) {
            return Some(pin.number.clone());
        }
    }

    None
}

fn build_module_node(
    netlist: &Netlist,
    leaf_ref: &str,
    instance: &Instance,
    measurer: &dyn TextMeasurer,
    config: &Config,
) -> Node {
    let mut port_names: Vec<String> = Vec::new();
    for (child_name, child_ref) in &instance.children {
        let Ok(child) = netlist.instance(child_ref) else {
            continue;
        };
        match child.kind {
            InstanceKind::Port => port_names.push(child_name.clone()),
            InstanceKind::Interface => {
                for sub_name in child.children.keys() {
                    port_names.push(format!("{child_name}.{sub_name}"));
                }
            }
            InstanceKind::Module | InstanceKind::Component => {}
        }
    }
    // Natural sort, then split first half to W, second half to E
    // (`spec.md` §4.1 "Port placement on a module node").
    port_names.sort_by(|a, b| natural_cmp(a, b));
    let split = port_names.len().div_ceil(2);
    let (west_names, east_names) = port_names.split_at(split);

    let labels = build_instance_labels(netlist, leaf_ref, instance, MODULE_MIN_WIDTH, config);
    let label_width = labels.iter().map(|l| l.width).fold(0.0, f64::max);
    let label_height: f64 = labels.iter().map(|l| l.height).sum();

    let side_ports = west_names.len().max(east_names.len()).max(1) as f64;
    let min_size = config.min_node_size("module");
    let width = min_size
        .map(|(w, _)| w)
        .unwrap_or(MODULE_MIN_WIDTH)
        .max(label_width + 2.0 * MODULE_LABEL_MARGIN);
    let height = min_size
        .map(|(_, h)| h)
        .unwrap_or(MODULE_MIN_HEIGHT)
        .max(label_height + 2.0 * MODULE_LABEL_MARGIN)
        .max((side_ports + 1.0) * MODULE_PORT_SPACING);

    let mut ports = Vec::with_capacity(port_names.len());
    place_ports_on_side(leaf_ref, west_names, Side::W, width, height, &mut ports);
    place_ports_on_side(leaf_ref, east_names, Side::E, width, height, &mut ports);

    let _ = measurer;
    Node {
        id: leaf_ref.to_string(),
        kind: NodeKind::Module,
        width,
        height,
        x: None,
        y: None,
        rotation: None,
        net_id: None,
        ports,
        labels,
        fixed: false,
    }
}

fn place_ports_on_side(
    leaf_ref: &str,
    names: &[String],
    side: Side,
    width: f64,
    height: f64,
    out: &mut Vec<Port>,
) {
    let n = names.len();
    for (i, name) in names.iter().enumerate() {
        let y = height * (i as f64 + 1.0) / (n as f64 + 1.0);
        let x = match side {
            Side::W => 0.0,
            Side::E => width,
            _ => 0.0,
        };
        out.push(Port {
            id: format!("{leaf_ref}.{name}"),
            x,
            y,
            side: Some(side),
            labels: vec![Label {
                text: name.clone(),
                x: None,
                y: None,
                width: 0.0,
                height: 0.0,
                align: TextAlign::Start,
                purpose: LabelPurpose::PortName,
            }],
            net_id: None,
            pin_number: None,
            pin_type: None,
        });
    }
}

fn build_instance_labels(
    _netlist: &Netlist,
    leaf_ref: &str,
    instance: &Instance,
    width: f64,
    config: &Config,
) -> Vec<Label> {
    let mut labels = Vec::new();
    let short_name = leaf_ref.rsplit('.').next().unwrap_or(leaf_ref);
    labels.push(Label {
        text: short_name.to_string(),
        x: None,
        y: None,
        width,
        height: MODULE_LABEL_FONT_SIZE * 1.2,
        align: TextAlign::Center,
        purpose: LabelPurpose::Main,
    });

    if let Some(rd) = &instance.reference_designator {
        labels.push(Label {
            text: rd.clone(),
            x: None,
            y: None,
            width,
            height: MODULE_LABEL_FONT_SIZE * 1.2,
            align: TextAlign::Center,
            purpose: LabelPurpose::ReferenceDesignator,
        });
    }

    if config.show_component_values {
        if let Some(value) = instance.attributes.get("value").and_then(|v| v.as_string()) {
            labels.push(Label {
                text: value.to_string(),
                x: None,
                y: None,
                width,
                height: MODULE_LABEL_FONT_SIZE * 1.2,
                align: TextAlign::Center,
                purpose: LabelPurpose::Value,
            });
        }
    }

    if let Some(mpn) = instance.attributes.get("mpn").and_then(|v| v.as_string()) {
        labels.push(Label {
            text: mpn.to_string(),
            x: None,
            y: None,
            width,
            height: MODULE_LABEL_FONT_SIZE * 1.2,
            align: TextAlign::Center,
            purpose: LabelPurpose::Mpn,
        });
    }

    if config.show_footprints {
        if let Some(fp) = instance
            .attributes
            .get("footprint")
            .and_then(|v| v.as_string())
        {
            labels.push(Label {
                text: fp.to_string(),
                x: None,
                y: None,
                width,
                height: MODULE_LABEL_FONT_SIZE * 1.2,
                align: TextAlign::Center,
                purpose: LabelPurpose::Footprint,
            });
        }
    }

    labels
}

/// Natural-order comparison: runs of digits compare numerically, everything
/// else compares as plain text (`spec.md` §4.1 "natural-sort by port name").
fn natural_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();
    loop {
        match (ai.peek(), bi.peek()) {
            (None, None) => return std::cmp::Ordering::Equal,
            (None, Some(_)) => return std::cmp::Ordering::Less,
            (Some(_), None) => return std::cmp::Ordering::Greater,
            (Some(ac), Some(bc)) => {
                if ac.is_ascii_digit() && bc.is_ascii_digit() {
                    let a_num: String = std::iter::from_fn(|| ai.by_ref().next_if(|c| c.is_ascii_digit())).collect();
                    let b_num: String = std::iter::from_fn(|| bi.by_ref().next_if(|c| c.is_ascii_digit())).collect();
                    let a_val: u64 = a_num.parse().unwrap_or(0);
                    let b_val: u64 = b_num.parse().unwrap_or(0);
                    match a_val.cmp(&b_val) {
                        std::cmp::Ordering::Equal => continue,
                        other => return other,
                    }
                } else {
                    match ac.cmp(bc) {
                        std::cmp::Ordering::Equal => {
                            ai.next();
                            bi.next();
                            continue;
                        }
                        other => return other,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_sort_orders_numeric_suffixes_numerically() {
        let mut names = vec!["P10".to_string(), "P2".to_string(), "P1".to_string()];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["P1", "P2", "P10"]);
    }

    #[test]
    fn nearest_side_picks_closest_edge() {
        assert_eq!(nearest_side(0.0, 5.0, 10.0, 10.0), Side::W);
        assert_eq!(nearest_side(10.0, 5.0, 10.0, 10.0), Side::E);
        assert_eq!(nearest_side(5.0, 0.0, 10.0, 10.0), Side::N);
        assert_eq!(nearest_side(5.0, 10.0, 10.0, 10.0), Side::S);
    }

    #[test]
    fn module_ports_split_west_east_by_natural_sort() {
        let mut netlist = Netlist {
            root_ref: "root".to_string(),
            ..Default::default()
        };
        let mut root = Instance::new(InstanceKind::Module);
        root.children.insert("a".to_string(), "root.a".to_string());
        root.children.insert("b".to_string(), "root.b".to_string());
        root.children.insert("c".to_string(), "root.c".to_string());
        netlist.instances.insert("root".to_string(), root.clone());
        for name in ["a", "b", "c"] {
            netlist.instances.insert(
                format!("root.{name}"),
                Instance::new(InstanceKind::Port),
            );
        }

        let measurer = schem_core::text::DeterministicTextMeasurer::default();
        let config = Config::default();
        let node = build_module_node(&netlist, "root", &root, &measurer, &config);
        let west: Vec<_> = node
            .ports
            .iter()
            .filter(|p| p.side == Some(Side::W))
            .collect();
        let east: Vec<_> = node
            .ports
            .iter()
            .filter(|p| p.side == Some(Side::E))
            .collect();
        assert_eq!(west.len(), 2);
        assert_eq!(east.len(), 1);
    }
}
