//! The netlist input contract (`spec.md` §3, §6).
//!
//! Field names and the `ModuleRef { source_path, module_name }` /
//! `InstanceKind` / `NetKind` / `AttributeValue` shapes mirror the
//! `pcb_sch`-style netlist crates this kind of schematic tool is built
//! around, adapted to the string-ref-keyed format `spec.md` specifies
//! (`"<source>:<dotted.path>"` instance references) instead of a
//! `Vec<String>` instance path.
//!
//! Instances and nets are stored in `IndexMap`s keyed by their reference
//! string. `IndexMap` is the vector-backed arena `spec.md` §9 asks for
//! (`get_index`/`get_full` give integer-indexed access) while keeping
//! string-ref ergonomics; every cross-reference (children, net port lists,
//! a port's owning instance) is a plain `String` key resolved through one
//! of these maps, never an owning pointer — so the effectively-cyclic
//! instance/port graph described in `spec.md` §9 has no actual Rust cycles.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRef {
    pub source_path: String,
    pub module_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceKind {
    Module,
    Component,
    Port,
    Interface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetKind {
    #[default]
    Normal,
    Power,
    Ground,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalValue {
    pub value: f64,
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Physical(PhysicalValue),
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_physical(&self) -> Option<&PhysicalValue> {
        match self {
            AttributeValue::Physical(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::Array(a) => Some(a.as_slice()),
            _ => None,
        }
    }
}

/// The KiCad-style symbol source attribute key that marks an instance as a
/// symbol node (`spec.md` §4.1 "Node kind selection").
pub const SYMBOL_VALUE_ATTR: &str = "__symbol_value";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub kind: InstanceKind,
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeValue>,
    /// Ordered mapping child-name -> instance-reference. Order is the
    /// netlist's deterministic child iteration order the Auto-Exploder and
    /// module-port-side assignment rely on.
    #[serde(default)]
    pub children: IndexMap<String, String>,
    #[serde(default)]
    pub reference_designator: Option<String>,
    #[serde(default)]
    pub type_ref: Option<ModuleRef>,
}

impl Instance {
    pub fn new(kind: InstanceKind) -> Self {
        Self {
            kind,
            attributes: IndexMap::new(),
            children: IndexMap::new(),
            reference_designator: None,
            type_ref: None,
        }
    }

    pub fn symbol_source(&self) -> Option<&str> {
        self.attributes.get(SYMBOL_VALUE_ATTR)?.as_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Net {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default)]
    pub properties: IndexMap<String, AttributeValue>,
    #[serde(default = "default_net_kind")]
    pub kind: NetKind,
}

fn default_net_kind() -> NetKind {
    NetKind::Normal
}

impl Net {
    pub fn symbol_source(&self) -> Option<&str> {
        self.properties.get(SYMBOL_VALUE_ATTR)?.as_string()
    }

    pub fn display_name<'a>(&'a self, net_id: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(net_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Netlist {
    pub instances: IndexMap<String, Instance>,
    pub nets: IndexMap<String, Net>,
    pub root_ref: String,
}

impl Netlist {
    pub fn instance(&self, reference: &str) -> Result<&Instance> {
        self.instances
            .get(reference)
            .ok_or_else(|| Error::InstanceNotFound {
                reference: reference.to_string(),
            })
    }

    pub fn root(&self) -> Result<&Instance> {
        self.instance(&self.root_ref)
    }

    pub fn net(&self, net_id: &str) -> Option<&Net> {
        self.nets.get(net_id)
    }

    /// Validates every net's port list references an existing leaf instance
    /// (`spec.md` §7 "Input-malformed": "net references a port that does
    /// not exist"). Called by `LayoutEngine::layout` before any other pass.
    pub fn validate(&self) -> Result<()> {
        self.root()?;
        for (net_id, net) in &self.nets {
            for port_id in &net.ports {
                if !self.instances.contains_key(port_id) {
                    return Err(Error::NetPortNotFound {
                        net_id: net_id.clone(),
                        port_id: port_id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Resolves the child instance for a given dotted child name relative
    /// to a parent instance reference, e.g. `child_ref("Board", "R1")` ->
    /// `Some("design:R1")`-shaped lookups performed by callers that already
    /// hold the parent `Instance`.
    pub fn resolve_child<'a>(&'a self, parent: &'a Instance, name: &str) -> Option<&'a str> {
        parent.children.get(name).map(String::as_str)
    }
}

/// Builds a net-symbol node id of the form `<root_ref>.<net_name>.<k>`
/// (`spec.md` §3 invariant 4).
pub fn net_symbol_id(root_ref: &str, net_name: &str, k: u32) -> String {
    format!("{root_ref}.{net_name}.{k}")
}

/// Given a node id and caller-supplied `NodePositions` keys, finds the
/// highest existing net-symbol numeral for `net_name`, if any, so the
/// Layout Driver can decide whether to synthesize symbol `1`
/// (`spec.md` §3 "Lifecycles").
pub fn existing_net_symbol_numerals<'a>(
    root_ref: &str,
    net_name: &str,
    position_ids: impl Iterator<Item = &'a str>,
) -> Vec<u32> {
    let prefix = format!("{root_ref}.{net_name}.");
    let mut found = Vec::new();
    for id in position_ids {
        if let Some(rest) = id.strip_prefix(&prefix) {
            if let Ok(k) = rest.parse::<u32>() {
                found.push(k);
            }
        }
    }
    found.sort_unstable();
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_symbol_id_matches_invariant_4_format() {
        assert_eq!(net_symbol_id("design", "VCC", 1), "design.VCC.1");
    }

    #[test]
    fn existing_net_symbol_numerals_extracts_and_sorts() {
        let ids = vec!["design.VCC.2", "design.VCC.1", "design.GND.1", "other"];
        let found = existing_net_symbol_numerals("design", "VCC", ids.into_iter());
        assert_eq!(found, vec![1, 2]);
    }

    #[test]
    fn validate_rejects_missing_root() {
        let netlist = Netlist {
            root_ref: "missing".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            netlist.validate(),
            Err(Error::InstanceNotFound { .. })
        ));
    }

    #[test]
    fn validate_rejects_net_with_missing_port() {
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
                ports: vec!["root.missing_port".to_string()],
                ..Default::default()
            },
        );
        assert!(matches!(
            netlist.validate(),
            Err(Error::NetPortNotFound { .. })
        ));
    }
}
