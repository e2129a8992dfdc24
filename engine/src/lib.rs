//! Multi-criteria route planning for bicycle networks.
//!
//! The crate computes scalarized shortest routes over road graphs with
//! vector-valued edge costs and speeds repeated queries up with a
//! contraction hierarchy. The building blocks:
//!
//! * [`datastr::graph::Graph`] - append-only node/edge arenas with derived
//!   adjacency, including the upward/downward views a hierarchy query needs.
//! * [`algo::contraction_hierarchy::Contractor`] - parallel independent-set
//!   contraction producing levels and shortcut edges.
//! * [`algo::contraction_hierarchy::query::ChDijkstra`] - the bidirectional
//!   hierarchy query.
//! * [`algo::dijkstra::PlainDijkstra`] - the plain search used as ground
//!   truth against the hierarchy query.
//! * [`separation`] - the LP service computing weight vectors which
//!   separate previously found route costs.

pub mod algo;
pub mod cli;
pub mod datastr;
pub mod io;
pub mod report;
pub mod separation;
