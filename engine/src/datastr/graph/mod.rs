//! The road graph arena and its derived adjacency views.
//!
//! Nodes live in a dense array indexed by `NodePos`; the stable dataset id of
//! a node is a `NodeId` and the graph keeps the bijection between the two.
//! Edges live in an append-only arena indexed by `EdgeId`, so contraction can
//! add shortcut edges without invalidating ids held elsewhere. A shortcut
//! references the two edges it bypasses by id; expansion is iterative, so the
//! unpacking depth is bounded by the hierarchy height rather than the stack.

use crate::io::*;
use std::collections::HashMap;

pub mod cost;

pub use cost::{Cost, ScalarCost, Weights, COST_DIMENSION, EPSILON};

use crate::algo::contraction_hierarchy::query::ChDijkstra;
use crate::algo::dijkstra::PlainDijkstra;

/// Stable external node ids from the source dataset
pub type NodeId = u32;
/// Dense internal node indices
pub type NodePos = u32;
/// Stable edge arena indices
pub type EdgeId = u32;
/// Hierarchy levels, assigned during contraction
pub type Level = u32;

/// A graph node. Immutable after load except for its level, which is
/// assigned exactly once when the node is contracted.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    id: NodeId,
    level: Level,
}

impl Node {
    pub fn new(id: NodeId) -> Node {
        Node { id, level: 0 }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub(crate) fn assign_level(&mut self, level: Level) {
        self.level = level;
    }
}

/// A directed edge with a vector-valued cost. Shortcut edges reference the
/// two edges whose concatenation they represent.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    source: NodePos,
    target: NodePos,
    cost: Cost,
    children: Option<(EdgeId, EdgeId)>,
}

impl Edge {
    pub fn new(source: NodePos, target: NodePos, cost: Cost) -> Edge {
        Edge {
            source,
            target,
            cost,
            children: None,
        }
    }

    pub fn shortcut(source: NodePos, target: NodePos, cost: Cost, children: (EdgeId, EdgeId)) -> Edge {
        Edge {
            source,
            target,
            cost,
            children: Some(children),
        }
    }

    pub fn source(&self) -> NodePos {
        self.source
    }

    pub fn target(&self) -> NodePos {
        self.target
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn children(&self) -> Option<(EdgeId, EdgeId)> {
        self.children
    }

    pub fn is_shortcut(&self) -> bool {
        self.children.is_some()
    }
}

/// The graph: node and edge arenas plus derived adjacency.
///
/// Four views are derived at construction time, all as permutations of
/// stable edge ids: outgoing and incoming edges per node, and the two views
/// the hierarchy query walks - outgoing edges towards nodes at least as high
/// and incoming edges from nodes at least as high. An edge between two
/// equal-level nodes can only connect nodes which were never contracted;
/// such edges belong to both query views so the searches can move freely
/// through the uncontracted core.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    pos_by_id: HashMap<NodeId, NodePos>,
    first_out: Vec<u32>,
    out_edges: Vec<EdgeId>,
    first_in: Vec<u32>,
    in_edges: Vec<EdgeId>,
    first_up_out: Vec<u32>,
    up_out_edges: Vec<EdgeId>,
    first_up_in: Vec<u32>,
    up_in_edges: Vec<EdgeId>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Graph {
        let n = nodes.len();
        assert!(n < NodePos::MAX as usize);
        assert!(edges.len() < EdgeId::MAX as usize);
        for edge in &edges {
            assert!((edge.source as usize) < n && (edge.target as usize) < n, "edge endpoint out of range");
        }

        let mut pos_by_id = HashMap::with_capacity(n);
        for (pos, node) in nodes.iter().enumerate() {
            let previous = pos_by_id.insert(node.id, pos as NodePos);
            assert!(previous.is_none(), "duplicate node id {}", node.id);
        }

        let (first_out, out_edges) = edge_buckets(n, &edges, |_| true, |edge| edge.source);
        let (first_in, in_edges) = edge_buckets(n, &edges, |_| true, |edge| edge.target);
        let (first_up_out, up_out_edges) = edge_buckets(
            n,
            &edges,
            |edge| nodes[edge.target as usize].level >= nodes[edge.source as usize].level,
            |edge| edge.source,
        );
        let (first_up_in, up_in_edges) = edge_buckets(
            n,
            &edges,
            |edge| nodes[edge.source as usize].level >= nodes[edge.target as usize].level,
            |edge| edge.target,
        );

        Graph {
            nodes,
            edges,
            pos_by_id,
            first_out,
            out_edges,
            first_in,
            in_edges,
            first_up_out,
            up_out_edges,
            first_up_in,
            up_in_edges,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, pos: NodePos) -> &Node {
        &self.nodes[pos as usize]
    }

    pub fn edge(&self, edge_id: EdgeId) -> &Edge {
        &self.edges[edge_id as usize]
    }

    /// Position of the node with the given dataset id.
    /// An unknown id is a caller bug and aborts with a message.
    pub fn node_pos(&self, id: NodeId) -> NodePos {
        match self.pos_by_id.get(&id) {
            Some(&pos) => pos,
            None => panic!("no node with id {} in the graph", id),
        }
    }

    /// Batch id lookup. Ids without a node are left out of the result.
    pub fn node_pos_by_ids<I: IntoIterator<Item = NodeId>>(&self, ids: I) -> HashMap<NodeId, NodePos> {
        ids.into_iter()
            .filter_map(|id| self.pos_by_id.get(&id).map(|&pos| (id, pos)))
            .collect()
    }

    /// All outgoing edges of `pos`.
    pub fn outgoing_edges(&self, pos: NodePos) -> &[EdgeId] {
        &self.out_edges[self.first_out[pos as usize] as usize..self.first_out[pos as usize + 1] as usize]
    }

    /// All incoming edges of `pos`.
    pub fn incoming_edges(&self, pos: NodePos) -> &[EdgeId] {
        &self.in_edges[self.first_in[pos as usize] as usize..self.first_in[pos as usize + 1] as usize]
    }

    /// Outgoing edges whose target is at least as high as `pos`.
    /// The forward part of a hierarchy query relaxes exactly these.
    pub fn up_edges(&self, pos: NodePos) -> &[EdgeId] {
        &self.up_out_edges[self.first_up_out[pos as usize] as usize..self.first_up_out[pos as usize + 1] as usize]
    }

    /// Incoming edges whose source is at least as high as `pos`.
    /// The backward part of a hierarchy query traverses these in reverse.
    pub fn down_edges(&self, pos: NodePos) -> &[EdgeId] {
        &self.up_in_edges[self.first_up_in[pos as usize] as usize..self.first_up_in[pos as usize + 1] as usize]
    }

    /// Expand shortcuts until only original edges remain.
    /// Iterative, so deep hierarchies cannot overflow the call stack.
    pub fn unpack_edges(&self, packed: &[EdgeId]) -> Vec<EdgeId> {
        let mut unpacked = Vec::with_capacity(packed.len());
        let mut stack = Vec::new();
        for &edge_id in packed {
            stack.push(edge_id);
            while let Some(edge_id) = stack.pop() {
                match self.edges[edge_id as usize].children {
                    Some((first, second)) => {
                        stack.push(second);
                        stack.push(first);
                    }
                    None => unpacked.push(edge_id),
                }
            }
        }
        unpacked
    }

    /// Component-wise cost of an edge sequence.
    pub fn path_cost(&self, edges: &[EdgeId]) -> Cost {
        edges.iter().fold(Cost::ZERO, |acc, &edge_id| acc + self.edges[edge_id as usize].cost)
    }

    /// Scan all edges and abort on any shortcut whose children do not chain
    /// between its endpoints or whose costs do not add up. Such an edge means
    /// the hierarchy itself is broken, which must never be tolerated.
    pub fn validate_shortcuts(&self) {
        for (edge_id, edge) in self.edges.iter().enumerate() {
            if let Some((first, second)) = edge.children {
                let first = &self.edges[first as usize];
                let second = &self.edges[second as usize];
                assert!(
                    first.source == edge.source && first.target == second.source && second.target == edge.target,
                    "shortcut {} does not chain: {:?} via {:?} + {:?}",
                    edge_id,
                    edge,
                    first,
                    second
                );
                assert!(
                    (first.cost + second.cost).fuzzy_eq(&edge.cost),
                    "shortcut {} cost mismatch: {:?} vs {:?} + {:?}",
                    edge_id,
                    edge,
                    first,
                    second
                );
            }
        }
    }

    /// Split the graph back into its arenas, dropping the derived adjacency.
    pub fn decompose(self) -> (Vec<Node>, Vec<Edge>) {
        (self.nodes, self.edges)
    }

    pub fn create_ch_dijkstra(&self) -> ChDijkstra {
        ChDijkstra::new(self)
    }

    /// A plain full-graph search. With `skip_shortcuts` it runs on the
    /// original network only, which makes it the oracle for hierarchy queries.
    pub fn create_plain_dijkstra(&self, skip_shortcuts: bool) -> PlainDijkstra {
        PlainDijkstra::new(self, skip_shortcuts)
    }
}

// CSR construction: count degrees per bucket, prefix sum, then fill.
fn edge_buckets(
    n: usize,
    edges: &[Edge],
    mut keep: impl FnMut(&Edge) -> bool,
    mut bucket: impl FnMut(&Edge) -> NodePos,
) -> (Vec<u32>, Vec<EdgeId>) {
    let mut first = vec![0u32; n + 1];
    for edge in edges {
        if keep(edge) {
            first[bucket(edge) as usize + 1] += 1;
        }
    }
    for i in 1..first.len() {
        first[i] += first[i - 1];
    }
    let mut ids = vec![0 as EdgeId; *first.last().unwrap() as usize];
    let mut next = first.clone();
    for (edge_id, edge) in edges.iter().enumerate() {
        if keep(edge) {
            let slot = &mut next[bucket(edge) as usize];
            ids[*slot as usize] = edge_id as EdgeId;
            *slot += 1;
        }
    }
    (first, ids)
}

impl Deconstruct for Graph {
    fn store_each(&self, store: &dyn Fn(&str, &dyn Store) -> std::io::Result<()>) -> std::io::Result<()> {
        let node_ids: Vec<NodeId> = self.nodes.iter().map(|node| node.id).collect();
        let node_levels: Vec<Level> = self.nodes.iter().map(|node| node.level).collect();
        let edge_sources: Vec<NodePos> = self.edges.iter().map(|edge| edge.source).collect();
        let edge_targets: Vec<NodePos> = self.edges.iter().map(|edge| edge.target).collect();
        let edge_costs: Vec<f64> = self.edges.iter().flat_map(|edge| edge.cost.values).collect();
        // child ids are persisted with the id range's sentinel marking "none"
        let edge_children: Vec<u32> = self
            .edges
            .iter()
            .flat_map(|edge| match edge.children {
                Some((first, second)) => [first, second],
                None => [u32::MAX, u32::MAX],
            })
            .collect();

        store("node_ids", &node_ids)?;
        store("node_levels", &node_levels)?;
        store("edge_sources", &edge_sources)?;
        store("edge_targets", &edge_targets)?;
        store("edge_costs", &edge_costs)?;
        store("edge_children", &edge_children)?;
        Ok(())
    }
}

impl Reconstruct for Graph {
    fn reconstruct_with(loader: Loader) -> std::io::Result<Self> {
        let node_ids: Vec<NodeId> = loader.load("node_ids")?;
        let node_levels: Vec<Level> = loader.load("node_levels")?;
        let edge_sources: Vec<NodePos> = loader.load("edge_sources")?;
        let edge_targets: Vec<NodePos> = loader.load("edge_targets")?;
        let edge_costs: Vec<f64> = loader.load("edge_costs")?;
        let edge_children: Vec<u32> = loader.load("edge_children")?;

        assert_eq!(node_ids.len(), node_levels.len());
        assert_eq!(edge_sources.len(), edge_targets.len());
        assert_eq!(edge_costs.len(), edge_sources.len() * COST_DIMENSION);
        assert_eq!(edge_children.len(), edge_sources.len() * 2);

        let nodes = node_ids
            .into_iter()
            .zip(node_levels)
            .map(|(id, level)| Node { id, level })
            .collect();
        let edges = edge_sources
            .into_iter()
            .zip(edge_targets)
            .enumerate()
            .map(|(edge_id, (source, target))| {
                let mut values = [0.0; COST_DIMENSION];
                values.copy_from_slice(&edge_costs[edge_id * COST_DIMENSION..(edge_id + 1) * COST_DIMENSION]);
                let children = match (edge_children[edge_id * 2], edge_children[edge_id * 2 + 1]) {
                    (u32::MAX, u32::MAX) => None,
                    (first, second) => Some((first, second)),
                };
                Edge {
                    source,
                    target,
                    cost: Cost::new(values),
                    children,
                }
            })
            .collect();

        Ok(Graph::new(nodes, edges))
    }
}
