//! C1 — Symbol Oracle interface (`spec.md` §4.1, §6).
//!
//! The KiCad-style symbol parser/renderer lives outside this crate; the
//! engine only needs bounding-box + pin geometry from it, so it is modeled
//! as a trait the caller implements (e.g. backed by a real KiCad symbol
//! library), matching `spec.md` §6's
//! `get_symbol_info(symbol_source) -> { bbox, pin_endpoints }` contract.

use schem_core::Side;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PinEndpoint {
    pub name: String,
    pub number: String,
    pub position: (f64, f64),
    pub orientation: Side,
    pub pin_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolInfo {
    pub bbox: BBox,
    pub pin_endpoints: Vec<PinEndpoint>,
}

#[derive(Debug, thiserror::Error)]
#[error("symbol oracle error for {symbol_source}: {message}")]
pub struct OracleError {
    pub symbol_source: String,
    pub message: String,
}

/// Deterministic for identical inputs (`spec.md` §6); the engine caches
/// nothing and may call this repeatedly for the same `symbol_source`.
pub trait SymbolOracle {
    fn get_symbol_info(&self, symbol_source: &str) -> Result<SymbolInfo, OracleError>;
}

/// An oracle with no symbols, useful for tests and for netlists that never
/// attach `__symbol_value`.
#[derive(Debug, Default)]
pub struct EmptyOracle;

impl SymbolOracle for EmptyOracle {
    fn get_symbol_info(&self, symbol_source: &str) -> Result<SymbolInfo, OracleError> {
        Err(OracleError {
            symbol_source: symbol_source.to_string(),
            message: "no symbols registered".to_string(),
        })
    }
}
