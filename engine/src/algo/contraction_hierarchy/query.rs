//! Contraction hierarchy query.
//!
//! A bidirectional scalarized search where both directions only ever climb:
//! the forward search relaxes outgoing edges towards nodes at least as high,
//! the backward search traverses incoming edges from nodes at least as high
//! in reverse. Every shortest path has a highest peak reachable upward from
//! both endpoints, so scanning the nodes both searches reached for the
//! smallest combined distance yields the true shortest scalarized distance.
//! Path unpacking then expands shortcuts back to original edges.

use super::super::{Route, State};
use crate::datastr::graph::*;
use crate::datastr::in_range_option::InRangeOption;
use crate::datastr::index_heap::{IndexedMinHeap, Indexing};
use crate::datastr::timestamped_vector::TimestampedVector;

struct SearchSide {
    distances: TimestampedVector<ScalarCost>,
    // only read along chains of nodes reached in the current query
    predecessor_edges: Vec<InRangeOption<EdgeId>>,
    queue: IndexedMinHeap<State<ScalarCost>>,
}

impl SearchSide {
    fn new(n: usize) -> SearchSide {
        SearchSide {
            distances: TimestampedVector::new(n, ScalarCost::INFINITY),
            predecessor_edges: vec![InRangeOption::none(); n],
            queue: IndexedMinHeap::new(n),
        }
    }

    fn init(&mut self, start: NodePos) {
        self.distances.reset();
        self.queue.clear();
        self.distances[start as usize] = ScalarCost::zero();
        self.queue.push(State {
            key: ScalarCost::zero(),
            node: start,
        });
    }

    fn relax(&mut self, key: ScalarCost, target: NodePos, edge_id: EdgeId, edge_cost: ScalarCost) {
        let next = key + edge_cost;
        if next < self.distances[target as usize] {
            self.distances[target as usize] = next;
            self.predecessor_edges[target as usize] = InRangeOption::some(edge_id);
            let state = State { key: next, node: target };
            if self.queue.contains_index(state.as_index()) {
                self.queue.decrease_key(state);
            } else {
                self.queue.push(state);
            }
        }
    }
}

pub struct ChDijkstra<'a> {
    graph: &'a Graph,
    forward: SearchSide,
    backward: SearchSide,
}

impl<'a> ChDijkstra<'a> {
    pub(crate) fn new(graph: &'a Graph) -> ChDijkstra<'a> {
        let n = graph.num_nodes();
        ChDijkstra {
            graph,
            forward: SearchSide::new(n),
            backward: SearchSide::new(n),
        }
    }

    /// Cheapest route by scalarized cost, or `None` if `to` is unreachable.
    pub fn find_best_route(&mut self, from: NodePos, to: NodePos, weights: Weights) -> Option<Route> {
        self.forward.init(from);
        self.backward.init(to);

        let mut tentative_distance = ScalarCost::INFINITY;
        let mut meeting_node = InRangeOption::none();
        let mut forward_progress = ScalarCost::zero();
        let mut backward_progress = ScalarCost::zero();
        let mut forward_done = false;
        let mut backward_done = false;

        // compare the tentative distance to both directions' progress
        // individually rather than to their sum
        while (tentative_distance > forward_progress || tentative_distance > backward_progress) && !(forward_done && backward_done) {
            if backward_done || (forward_progress <= backward_progress && !forward_done) {
                if let Some(State { key, node }) = self.forward.queue.pop() {
                    forward_progress = key;
                    let other = self.backward.distances[node as usize];
                    if key + other < tentative_distance {
                        tentative_distance = key + other;
                        meeting_node = InRangeOption::some(node);
                    }
                    for &edge_id in self.graph.up_edges(node) {
                        let edge = self.graph.edge(edge_id);
                        self.forward.relax(key, edge.target(), edge_id, ScalarCost::new(edge.cost() * weights));
                    }
                } else {
                    forward_done = true;
                }
            } else if let Some(State { key, node }) = self.backward.queue.pop() {
                backward_progress = key;
                let other = self.forward.distances[node as usize];
                if key + other < tentative_distance {
                    tentative_distance = key + other;
                    meeting_node = InRangeOption::some(node);
                }
                for &edge_id in self.graph.down_edges(node) {
                    let edge = self.graph.edge(edge_id);
                    self.backward.relax(key, edge.source(), edge_id, ScalarCost::new(edge.cost() * weights));
                }
            } else {
                backward_done = true;
            }
        }

        let meeting_node = meeting_node.value()?;

        let mut packed = Vec::new();
        let mut current = meeting_node;
        while current != from {
            let edge_id = self.forward.predecessor_edges[current as usize].value().unwrap();
            packed.push(edge_id);
            current = self.graph.edge(edge_id).source();
        }
        packed.reverse();
        let mut current = meeting_node;
        while current != to {
            let edge_id = self.backward.predecessor_edges[current as usize].value().unwrap();
            packed.push(edge_id);
            current = self.graph.edge(edge_id).target();
        }

        let edges = self.graph.unpack_edges(&packed);
        let costs = self.graph.path_cost(&edges);
        Some(Route { edges, costs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::contraction_hierarchy::Contractor;

    fn cost(value: f64) -> Cost {
        Cost::new([value, 0.0, 0.0])
    }

    fn contract(graph: Graph) -> Graph {
        Contractor::new(false, 2).contract_completely(graph, 0.0)
    }

    #[test]
    fn diamond_query_matches_the_plain_search() {
        //     B
        //   /   \
        //  A     D     all edges cost 1
        //   \   /
        //     C
        let nodes = (0..4).map(Node::new).collect();
        let edges = vec![
            Edge::new(0, 1, cost(1.0)),
            Edge::new(0, 2, cost(1.0)),
            Edge::new(1, 3, cost(1.0)),
            Edge::new(2, 3, cost(1.0)),
        ];
        let contracted = contract(Graph::new(nodes, edges));
        let weights = Weights::new([1.0, 0.0, 0.0]);

        let ch_route = contracted.create_ch_dijkstra().find_best_route(0, 3, weights).unwrap();
        let plain_route = contracted.create_plain_dijkstra(true).find_best_route(0, 3, weights).unwrap();

        assert!((ch_route.costs * weights - 2.0).abs() <= EPSILON);
        assert!((plain_route.costs * weights - 2.0).abs() <= EPSILON);
        assert_eq!(ch_route.edges.len(), 2);
    }

    #[test]
    fn shortcuts_are_expanded_to_original_edges() {
        let nodes = (0..5).map(Node::new).collect();
        let edges = (0..4).map(|i| Edge::new(i, i + 1, cost(1.0))).collect();
        let contracted = contract(Graph::new(nodes, edges));

        let route = contracted
            .create_ch_dijkstra()
            .find_best_route(0, 4, Weights::balanced())
            .unwrap();

        assert_eq!(route.edges.len(), 4);
        for (index, &edge_id) in route.edges.iter().enumerate() {
            let edge = contracted.edge(edge_id);
            assert!(!edge.is_shortcut());
            assert_eq!(edge.source(), index as NodePos);
            assert_eq!(edge.target(), index as NodePos + 1);
        }
        assert!(route.costs.fuzzy_eq(&cost(4.0)));
    }

    #[test]
    fn unreachable_pairs_yield_no_route() {
        let nodes = (0..3).map(Node::new).collect();
        let edges = vec![Edge::new(0, 1, cost(1.0))];
        let contracted = contract(Graph::new(nodes, edges));

        assert!(contracted.create_ch_dijkstra().find_best_route(0, 2, Weights::balanced()).is_none());
        assert!(contracted.create_ch_dijkstra().find_best_route(1, 0, Weights::balanced()).is_none());
    }

    #[test]
    fn source_equals_target_gives_the_empty_route() {
        let nodes = (0..2).map(Node::new).collect();
        let edges = vec![Edge::new(0, 1, cost(1.0))];
        let contracted = contract(Graph::new(nodes, edges));

        let route = contracted.create_ch_dijkstra().find_best_route(1, 1, Weights::balanced()).unwrap();
        assert!(route.edges.is_empty());
        assert_eq!(route.costs, Cost::ZERO);
    }

    #[test]
    fn queries_work_on_partially_contracted_graphs() {
        // ring of 8 nodes, contracted only halfway - queries cross the
        // uncontracted core where levels are all equal
        let nodes = (0..8).map(Node::new).collect();
        let edges = (0..8).map(|i| Edge::new(i, (i + 1) % 8, cost(1.0))).collect();
        let contracted = Contractor::new(false, 2).contract_completely(Graph::new(nodes, edges), 0.5);

        let weights = Weights::new([1.0, 0.0, 0.0]);
        let mut ch = contracted.create_ch_dijkstra();
        let mut plain = contracted.create_plain_dijkstra(true);
        for from in 0..8 {
            for to in 0..8 {
                let ch_route = ch.find_best_route(from, to, weights).unwrap();
                let plain_route = plain.find_best_route(from, to, weights).unwrap();
                assert!(
                    (ch_route.costs * weights - plain_route.costs * weights).abs() <= EPSILON,
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }
}
