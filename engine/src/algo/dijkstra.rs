//! Plain scalarized Dijkstra over the full graph.
//!
//! No hierarchy pruning at all, which makes this search the correctness
//! oracle for the contraction hierarchy query: both must agree on
//! reachability and on the scalarized cost of their routes.

use super::{Route, State};
use crate::datastr::graph::*;
use crate::datastr::in_range_option::InRangeOption;
use crate::datastr::index_heap::{IndexedMinHeap, Indexing};
use crate::datastr::timestamped_vector::TimestampedVector;

pub struct PlainDijkstra<'a> {
    graph: &'a Graph,
    skip_shortcuts: bool,
    distances: TimestampedVector<ScalarCost>,
    // only read along chains of nodes reached in the current query
    predecessor_edges: Vec<InRangeOption<EdgeId>>,
    queue: IndexedMinHeap<State<ScalarCost>>,
}

impl<'a> PlainDijkstra<'a> {
    pub(crate) fn new(graph: &'a Graph, skip_shortcuts: bool) -> PlainDijkstra<'a> {
        let n = graph.num_nodes();
        PlainDijkstra {
            graph,
            skip_shortcuts,
            distances: TimestampedVector::new(n, ScalarCost::INFINITY),
            predecessor_edges: vec![InRangeOption::none(); n],
            queue: IndexedMinHeap::new(n),
        }
    }

    /// Cheapest route by scalarized cost, or `None` if `to` is unreachable.
    pub fn find_best_route(&mut self, from: NodePos, to: NodePos, weights: Weights) -> Option<Route> {
        self.distances.reset();
        self.queue.clear();

        self.distances[from as usize] = ScalarCost::zero();
        self.queue.push(State {
            key: ScalarCost::zero(),
            node: from,
        });

        while let Some(State { key, node }) = self.queue.pop() {
            if node == to {
                break;
            }
            for &edge_id in self.graph.outgoing_edges(node) {
                let edge = self.graph.edge(edge_id);
                if self.skip_shortcuts && edge.is_shortcut() {
                    continue;
                }
                let next = key + ScalarCost::new(edge.cost() * weights);
                if next < self.distances[edge.target() as usize] {
                    self.distances[edge.target() as usize] = next;
                    self.predecessor_edges[edge.target() as usize] = InRangeOption::some(edge_id);
                    let state = State {
                        key: next,
                        node: edge.target(),
                    };
                    if self.queue.contains_index(state.as_index()) {
                        self.queue.decrease_key(state);
                    } else {
                        self.queue.push(state);
                    }
                }
            }
        }

        if !self.distances[to as usize].is_finite() {
            return None;
        }

        let mut packed = Vec::new();
        let mut current = to;
        while current != from {
            let edge_id = self.predecessor_edges[current as usize].value().unwrap();
            packed.push(edge_id);
            current = self.graph.edge(edge_id).source();
        }
        packed.reverse();

        let edges = self.graph.unpack_edges(&packed);
        let costs = self.graph.path_cost(&edges);
        Some(Route { edges, costs })
    }
}
