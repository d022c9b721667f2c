#![forbid(unsafe_code)]

//! `schem` is the public entry point for the schematic layout engine: a
//! deterministic netlist-to-schematic layout pipeline (nodes, connectivity,
//! placement, orthogonal routing, junctions, labels).

pub use schem_core::*;
pub use schem_layout::{
    BBox, EmptyOracle, LayoutEngine, OracleError, PinEndpoint, SymbolInfo, SymbolOracle,
};

/// Errors from [`layout_from_json`], on top of the engine's own
/// [`schem_core::Error`] taxonomy (`spec.md` §7).
#[derive(Debug, thiserror::Error)]
pub enum JsonLayoutError {
    #[error("invalid netlist JSON: {0}")]
    Netlist(#[source] serde_json::Error),
    #[error("invalid node-positions JSON: {0}")]
    Positions(#[source] serde_json::Error),
    #[error("invalid config JSON: {0}")]
    Config(#[source] serde_json::Error),
    #[error(transparent)]
    Layout(#[from] schem_core::Error),
}

/// A JSON-speaking convenience wrapper around [`LayoutEngine::layout`] for
/// callers on the other side of a language-server/editor boundary, who hand
/// the engine `serde_json::Value`s rather than typed Rust structs.
pub fn layout_from_json(
    oracle: &dyn SymbolOracle,
    measurer: &dyn schem_core::text::TextMeasurer,
    netlist: serde_json::Value,
    positions: serde_json::Value,
    config: serde_json::Value,
) -> std::result::Result<schem_core::model::LayoutResult, JsonLayoutError> {
    let netlist: schem_core::Netlist =
        serde_json::from_value(netlist).map_err(JsonLayoutError::Netlist)?;
    let positions: schem_core::model::NodePositions =
        serde_json::from_value(positions).map_err(JsonLayoutError::Positions)?;
    let config: schem_core::Config =
        serde_json::from_value(config).map_err(JsonLayoutError::Config)?;

    let engine = LayoutEngine::new(oracle, measurer);
    engine
        .layout(&netlist, &positions, &config)
        .map_err(JsonLayoutError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schem_core::text::DeterministicTextMeasurer;

    #[test]
    fn rejects_malformed_netlist_json() {
        let oracle = EmptyOracle;
        let measurer = DeterministicTextMeasurer::default();
        let result = layout_from_json(
            &oracle,
            &measurer,
            serde_json::json!({"instances": "not-a-map"}),
            serde_json::json!({}),
            serde_json::json!({}),
        );
        assert!(matches!(result, Err(JsonLayoutError::Netlist(_))));
    }
}
