//! The error taxonomy of `spec.md` §7.
//!
//! Only the `*NotFound` family is "Input-malformed": constructing one of
//! those and returning it aborts `LayoutEngine::layout` (`Err(..)`).
//! Everything else here exists to be logged and discarded by the pass that
//! encounters it — see `schem_layout`'s recovery sites — never to escape
//! `layout()` as a thrown error.
//!
//! `spec.md` §7 also names `Router-missing-context` ("a routed edge
//! returned without context") and `Unknown-owning-node` ("the owner of a
//! port id cannot be located"). Both describe failure modes of a router
//! that crosses a process/serialization boundary and hands back bare port
//! ids. This router runs in-process over the engine's own typed data:
//! every `BinaryEdge` carries a non-optional `EdgeContext`, and every
//! anchor is built directly from the `Node`/`Port` it came from, so both
//! conditions are ruled out by the type system rather than checked at
//! runtime. Those two variants are omitted rather than kept as permanently
//! unreachable dead code (see `DESIGN.md`).

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("instance not found: {reference}")]
    InstanceNotFound { reference: String },

    #[error("net {net_id} references a port that does not exist: {port_id}")]
    NetPortNotFound { net_id: String, port_id: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("symbol oracle failed for {symbol_source}: {message}")]
    SymbolOracleFailure {
        symbol_source: String,
        message: String,
    },

    #[error("router returned a non-orthogonal polyline for edge {edge_id}")]
    RouterNonOrthogonal { edge_id: String },

    #[error("router produced no polyline for hyperedge {hyperedge_id}")]
    RouterDisconnected { hyperedge_id: String },
}

pub type Result<T> = std::result::Result<T, Error>;
