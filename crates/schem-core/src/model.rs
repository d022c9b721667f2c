//! The derived graph model produced by the layout pipeline (`spec.md` §3,
//! "Node (derived)" through "LayoutResult").

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub type NodeId = String;
pub type PortId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Module,
    Component,
    Symbol,
    NetJunction,
    NetSymbol,
    Meta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    N,
    S,
    E,
    W,
}

impl Side {
    /// Rotates this side clockwise by `steps` quarter-turns
    /// (`spec.md` §4.3 "Visibility direction").
    pub fn rotate_cw(self, steps: u8) -> Side {
        const ORDER: [Side; 4] = [Side::N, Side::E, Side::S, Side::W];
        let idx = ORDER.iter().position(|s| *s == self).unwrap();
        ORDER[(idx + steps as usize) % 4]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VisibilityDirection {
    N,
    S,
    E,
    W,
    All,
}

impl From<Side> for VisibilityDirection {
    fn from(side: Side) -> Self {
        match side {
            Side::N => VisibilityDirection::N,
            Side::S => VisibilityDirection::S,
            Side::E => VisibilityDirection::E,
            Side::W => VisibilityDirection::W,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn steps(self) -> u8 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    pub fn degrees(self) -> f64 {
        self.steps() as f64 * 90.0
    }

    /// Normalizes any degree value (including multiples of 360, negative
    /// values never occur in this model) into `[0, 360)` and then into a
    /// `Rotation`, per `spec.md` boundary behavior "Node rotated 360°: is
    /// equivalent to rotation 0°."
    pub fn from_degrees(degrees: f64) -> Rotation {
        let normalized = ((degrees % 360.0) + 360.0) % 360.0;
        match normalized as i64 {
            90 => Rotation::Deg90,
            180 => Rotation::Deg180,
            270 => Rotation::Deg270,
            _ => Rotation::Deg0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPurpose {
    Main,
    ReferenceDesignator,
    Mpn,
    PortName,
    NetReference,
    NetNameOnWire,
    Footprint,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    pub width: f64,
    pub height: f64,
    pub align: TextAlign,
    pub purpose: LabelPurpose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: PortId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub net_id: Option<String>,
    #[serde(default)]
    pub pin_number: Option<String>,
    #[serde(default)]
    pub pin_type: Option<String>,
}

impl Port {
    pub fn visibility_direction(&self, node_rotation: Option<Rotation>) -> VisibilityDirection {
        let Some(side) = self.side else {
            return VisibilityDirection::All;
        };
        let steps = node_rotation.map(Rotation::steps).unwrap_or(0);
        side.rotate_cw(steps).into()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub rotation: Option<Rotation>,
    #[serde(default)]
    pub net_id: Option<String>,
    #[serde(default)]
    pub ports: Vec<Port>,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Set when the caller supplied a position for this node id
    /// (`spec.md` §4.1 "Fixed-position handling"); the Placement Pass must
    /// not move it.
    #[serde(default)]
    pub fixed: bool,
}

impl Node {
    /// Absolute center, used for rotating port offsets
    /// (`spec.md` §4.10 "Rotation").
    pub fn center(&self) -> Option<(f64, f64)> {
        let (x, y) = (self.x?, self.y?);
        Some((x + self.width / 2.0, y + self.height / 2.0))
    }

    /// The absolute position of a local point on this node's rectangle,
    /// honoring rotation around the node's geometric center.
    pub fn to_absolute(&self, local_x: f64, local_y: f64) -> Option<(f64, f64)> {
        let (x, y) = (self.x?, self.y?);
        let abs_x = x + local_x;
        let abs_y = y + local_y;
        let Some(rotation) = self.rotation else {
            return Some((abs_x, abs_y));
        };
        let (cx, cy) = self.center()?;
        Some(rotate_point_cw((abs_x, abs_y), (cx, cy), rotation.steps()))
    }

    pub fn rect(&self) -> Option<crate::geom::Rect> {
        let (x, y) = (self.x?, self.y?);
        Some(crate::geom::Rect::from_origin_size(
            x,
            y,
            self.width,
            self.height,
        ))
    }
}

/// Rotates `point` clockwise around `center` by `steps` quarter turns, in
/// screen space (y grows downward), so a 90° clockwise turn maps
/// `(x, y) -> (cx - (y - cy), cy + (x - cx))`.
pub fn rotate_point_cw(point: (f64, f64), center: (f64, f64), steps: u8) -> (f64, f64) {
    let (mut dx, mut dy) = (point.0 - center.0, point.1 - center.1);
    for _ in 0..(steps % 4) {
        let (ndx, ndy) = (-dy, dx);
        dx = ndx;
        dy = ndy;
    }
    (center.0 + dx, center.1 + dy)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub net_id: String,
    pub source_port: PortId,
    pub target_port: PortId,
    pub source_node: NodeId,
    pub target_node: NodeId,
    #[serde(default)]
    pub polyline: Option<Vec<(f64, f64)>>,
    #[serde(default)]
    pub junction_points: Vec<(f64, f64)>,
    #[serde(default)]
    pub label: Option<Label>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: String,
    pub rect: crate::geom::Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePositionEntry {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub rotation: Option<f64>,
}

pub type NodePositions = IndexMap<NodeId, NodePositionEntry>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub node_positions: NodePositions,
}
