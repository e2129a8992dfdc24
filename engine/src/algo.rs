//! Search algorithms over the road graph.

use crate::datastr::graph::*;
use crate::datastr::index_heap::Indexing;

pub mod contraction_hierarchy;
pub mod dijkstra;

/// A found route: the original edges in path order plus the accumulated
/// cost vector. Immutable once returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub edges: Vec<EdgeId>,
    pub costs: Cost,
}

/// Priority queue entries
#[derive(Copy, Clone, Eq, PartialEq, Debug, PartialOrd, Ord)]
pub struct State<K> {
    pub key: K,
    pub node: NodePos,
}

impl<K> Indexing for State<K> {
    #[inline]
    fn as_index(&self) -> usize {
        self.node as usize
    }
}
