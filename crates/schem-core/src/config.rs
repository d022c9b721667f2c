//! The engine configuration record (`spec.md` §6 "Configuration").
//!
//! A flat, `serde`-(de)serializable struct constructed once per engine and
//! treated as frozen thereafter (`spec.md` §9 "Builder vs. configuration"),
//! replacing the source's nested optional-field configuration object.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Left
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GridSnap {
    #[serde(default = "default_grid_snap_enabled")]
    pub enabled: bool,
    #[serde(default = "default_grid_snap_size")]
    pub size: f64,
}

fn default_grid_snap_enabled() -> bool {
    true
}

fn default_grid_snap_size() -> f64 {
    12.7
}

impl Default for GridSnap {
    fn default() -> Self {
        Self {
            enabled: default_grid_snap_enabled(),
            size: default_grid_snap_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    #[serde(default)]
    pub direction: Direction,
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    #[serde(default = "default_padding")]
    pub padding: f64,
    #[serde(default = "default_net_connection_threshold")]
    pub net_connection_threshold: f64,
    #[serde(default = "default_true")]
    pub hide_labels_on_connected_ports: bool,
    #[serde(default)]
    pub grid_snap: GridSnap,
    #[serde(default = "default_true")]
    pub show_port_labels: bool,
    #[serde(default = "default_true")]
    pub show_component_values: bool,
    #[serde(default = "default_true")]
    pub show_footprints: bool,
    /// `node_sizes.*.{width,height}`, keyed by a node-kind name
    /// (`"module"`, `"component"`, `"symbol"`, `"net_symbol"`, ...).
    #[serde(default)]
    pub node_sizes: IndexMap<String, (f64, f64)>,
}

fn default_spacing() -> f64 {
    20.0
}

fn default_padding() -> f64 {
    20.0
}

fn default_net_connection_threshold() -> f64 {
    300.0
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            spacing: default_spacing(),
            padding: default_padding(),
            net_connection_threshold: default_net_connection_threshold(),
            hide_labels_on_connected_ports: true,
            grid_snap: GridSnap::default(),
            show_port_labels: true,
            show_component_values: true,
            show_footprints: true,
            node_sizes: IndexMap::new(),
        }
    }
}

impl Config {
    /// Minimum node size configured for `kind`, if any.
    pub fn min_node_size(&self, kind: &str) -> Option<(f64, f64)> {
        self.node_sizes.get(kind).copied()
    }

    /// Fails fast on a config that would silently produce nonsensical
    /// geometry (e.g. zero-or-negative spacing would collapse every node
    /// onto the same point). Not part of `spec.md`'s distilled text, but a
    /// natural extension of "every option has a default" — defaults are
    /// only useful if out-of-range overrides are rejected up front.
    pub fn validate(&self) -> Result<()> {
        let checks: &[(&str, f64)] = &[
            ("spacing", self.spacing),
            ("padding", self.padding),
            ("net_connection_threshold", self.net_connection_threshold),
            ("grid_snap.size", self.grid_snap.size),
        ];
        for (name, value) in checks {
            if !value.is_finite() || *value < 0.0 {
                return Err(Error::InvalidConfig {
                    message: format!("{name} must be a finite, non-negative number, got {value}"),
                });
            }
        }
        Ok(())
    }
}
