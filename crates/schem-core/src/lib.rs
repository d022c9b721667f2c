#![forbid(unsafe_code)]

//! Data model, configuration, and error types for the schematic layout
//! engine (`schem-layout` implements the pipeline over these types).

pub mod config;
pub mod error;
pub mod geom;
pub mod model;
pub mod netlist;
pub mod text;

pub use config::{Config, Direction, GridSnap};
pub use error::{Error, Result};
pub use model::{
    Edge, Label, LabelPurpose, LayoutResult, Node, NodeId, NodeKind, NodePositionEntry,
    NodePositions, Obstacle, Port, PortId, Rotation, Side, TextAlign, VisibilityDirection,
};
pub use netlist::{
    AttributeValue, Instance, InstanceKind, ModuleRef, Net, NetKind, Netlist, PhysicalValue,
};
