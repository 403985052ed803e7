//! Lineage graphs explaining near-duplicate verification results.
//!
//! A graph is only produced when it has at least two nodes. Input records
//! are untrusted: [`build`] validates them against a fixed vocabulary and
//! [`layout`] assigns every surviving node a deterministic position.

pub mod assemble;
pub mod graph;
pub mod layout;

pub use assemble::{QUERY_NODE_ID, from_verification};
pub use graph::{
    EdgeRecord, LineageEdge, LineageGraph, LineageNode, LineageRecords, NodeKind, NodeRecord,
    Relationship, build, build_on,
};
pub use layout::{Canvas, Position};
