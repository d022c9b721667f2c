//! C3 — Auto-Exploder (`spec.md` §4.2).
//!
//! Recursively flattens modules that contain sub-modules into their leaf
//! children. Recursion stops at components, or at modules with no
//! module/component children (those are emitted as a single node). Emission
//! order is the netlist's deterministic child iteration order.
//!
//! This runs before the Nodes Builder (C2): the leaf reference list it
//! produces is exactly the set of instances C2 builds one `Node` each for.

use schem_core::{Instance, InstanceKind, Netlist};

/// Returns the ordered list of leaf instance references to lay out.
pub fn explode(netlist: &Netlist) -> Vec<String> {
    let mut out = Vec::new();
    if let Ok(root) = netlist.root() {
        explode_into(netlist, root, &mut out);
    }
    out
}

fn explode_into(netlist: &Netlist, instance: &Instance, out: &mut Vec<String>) {
    for child_ref in instance.children.values() {
        let Ok(child) = netlist.instance(child_ref) else {
            continue;
        };
        match child.kind {
            InstanceKind::Component => out.push(child_ref.clone()),
            InstanceKind::Module => {
                if has_module_or_component_children(netlist, child) {
                    explode_into(netlist, child, out);
                } else {
                    out.push(child_ref.clone());
                }
            }
            // Ports and interfaces are not laid out as standalone nodes;
            // they surface as ports on their owning module/component node.
            InstanceKind::Port | InstanceKind::Interface => {}
        }
    }
}

fn has_module_or_component_children(netlist: &Netlist, instance: &Instance) -> bool {
    instance.children.values().any(|child_ref| {
        netlist
            .instance(child_ref)
            .map(|c| matches!(c.kind, InstanceKind::Module | InstanceKind::Component))
            .unwrap_or(false)
    })
}
