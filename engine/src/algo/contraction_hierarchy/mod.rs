//! Contraction hierarchy construction.
//!
//! Nodes are contracted in rounds. Each round picks an independent set among
//! the locally cheapest nodes, so the witness searches of a round never touch
//! another selected node's adjacency and can run in parallel. Workers only
//! produce lists of shortcut candidates; the edge arena is extended
//! single-threaded when the round joins. Contracting a node removes it from
//! the live core but never deletes edges - the arena is append-only and every
//! edge keeps its id.

use super::State;
use crate::datastr::graph::*;
use crate::datastr::index_heap::{IndexedMinHeap, Indexing};
use crate::datastr::timestamped_vector::TimestampedVector;
use crate::report::*;
use rayon::prelude::*;

pub mod query;

/// Hop bound for witness searches. A tighter bound trades preprocessing time
/// for extra (harmless) shortcut edges.
pub const DEFAULT_WITNESS_HOP_LIMIT: u32 = 16;

pub struct Contractor {
    print_stats: bool,
    max_threads: usize,
    witness_hop_limit: u32,
}

impl Contractor {
    /// `max_threads` bounds the worker pool used within each round.
    pub fn new(print_stats: bool, max_threads: usize) -> Contractor {
        Contractor {
            print_stats,
            max_threads,
            witness_hop_limit: DEFAULT_WITNESS_HOP_LIMIT,
        }
    }

    pub fn with_witness_hop_limit(mut self, witness_hop_limit: u32) -> Contractor {
        self.witness_hop_limit = witness_hop_limit;
        self
    }

    /// Contract until only `rest * num_nodes` live nodes remain (`rest = 0.0`
    /// contracts everything). Consumes the graph and returns the augmented
    /// one: same nodes with levels assigned, original edges plus shortcuts.
    pub fn contract_completely(&self, graph: Graph, rest: f64) -> Graph {
        let (nodes, edges) = graph.decompose();
        let mut core = ContractionCore::new(nodes, edges);
        let residual_target = (rest * core.num_live() as f64) as usize;

        let pool = rayon::ThreadPoolBuilder::new().num_threads(self.max_threads).build().unwrap();
        report_time("contracting the graph", || {
            pool.install(|| core.run(residual_target, self.witness_hop_limit, self.print_stats))
        });

        let graph = core.into_graph();
        graph.validate_shortcuts();
        graph
    }
}

struct ContractionCore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    // adjacency of the live core, edges to contracted nodes are pruned out
    out_edges: Vec<Vec<EdgeId>>,
    in_edges: Vec<Vec<EdgeId>>,
    contracted: Vec<bool>,
    contracted_neighbors: Vec<u32>,
    depth: Vec<u32>,
    live: usize,
    rounds: Level,
    witness_weights: Weights,
}

impl ContractionCore {
    fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> ContractionCore {
        let n = nodes.len();
        let mut out_edges: Vec<Vec<EdgeId>> = vec![Vec::new(); n];
        let mut in_edges: Vec<Vec<EdgeId>> = vec![Vec::new(); n];
        for (edge_id, edge) in edges.iter().enumerate() {
            out_edges[edge.source() as usize].push(edge_id as EdgeId);
            in_edges[edge.target() as usize].push(edge_id as EdgeId);
        }

        ContractionCore {
            nodes,
            edges,
            out_edges,
            in_edges,
            contracted: vec![false; n],
            contracted_neighbors: vec![0; n],
            depth: vec![0; n],
            live: n,
            rounds: 0,
            witness_weights: Weights::balanced(),
        }
    }

    fn num_live(&self) -> usize {
        self.live
    }

    fn run(&mut self, residual_target: usize, witness_hop_limit: u32, print_stats: bool) {
        let mut total_shortcuts = 0usize;

        while self.live > residual_target && self.live > 0 {
            let priorities = self.priorities();
            let mut selected = self.independent_set(&priorities);
            debug_assert!(!selected.is_empty());
            // never undershoot the requested residual core
            selected.truncate(self.live - residual_target);

            // witness searches must not route through any node contracted in
            // this round, otherwise two equal-cost middle nodes could witness
            // each other away and lose a distance
            for &node in &selected {
                self.contracted[node as usize] = true;
            }

            let batches: Vec<Vec<Edge>> = {
                let core = &*self;
                selected
                    .par_iter()
                    .map_init(
                        || WitnessSearch::new(core.nodes.len()),
                        |witness, &node| core.shortcuts_for(node, witness, witness_hop_limit),
                    )
                    .collect()
            };

            let mut round_shortcuts = 0usize;
            for shortcut in batches.into_iter().flatten() {
                let edge_id = self.edges.len() as EdgeId;
                self.out_edges[shortcut.source() as usize].push(edge_id);
                self.in_edges[shortcut.target() as usize].push(edge_id);
                self.edges.push(shortcut);
                round_shortcuts += 1;
            }

            for &node in &selected {
                self.nodes[node as usize].assign_level(self.rounds);
            }
            for &node in &selected {
                self.retire(node);
            }
            self.live -= selected.len();
            self.rounds += 1;
            total_shortcuts += round_shortcuts;

            if print_stats {
                eprintln!(
                    "round {}: contracted {} nodes, added {} shortcuts, {} nodes live",
                    self.rounds,
                    selected.len(),
                    round_shortcuts,
                    self.live
                );
            }
        }

        // the residual core sits above everything contracted so far
        for (pos, node) in self.nodes.iter_mut().enumerate() {
            if !self.contracted[pos] {
                node.assign_level(self.rounds);
            }
        }

        crate::report!("contraction_rounds", self.rounds);
        crate::report!("shortcut_edges", total_shortcuts);
        crate::report!("residual_core_nodes", self.live);
    }

    // Cheap local heuristic, lower contracts earlier. Correctness only needs
    // the independent-set and witness arguments, not any particular formula.
    fn priorities(&self) -> Vec<i64> {
        (0..self.nodes.len())
            .map(|pos| {
                let ins = self.in_edges[pos].len() as i64;
                let outs = self.out_edges[pos].len() as i64;
                ins * outs - (ins + outs) + self.contracted_neighbors[pos] as i64 + self.depth[pos] as i64
            })
            .collect()
    }

    /// Live nodes beating every live neighbor by `(priority, position)`.
    /// The strict total order guarantees progress and pairwise independence.
    fn independent_set(&self, priorities: &[i64]) -> Vec<NodePos> {
        (0..self.nodes.len() as NodePos)
            .filter(|&node| !self.contracted[node as usize])
            .filter(|&node| {
                let beats = |other: NodePos| {
                    other == node || (priorities[node as usize], node) < (priorities[other as usize], other)
                };
                self.out_edges[node as usize]
                    .iter()
                    .map(|&edge_id| self.edges[edge_id as usize].target())
                    .all(beats)
                    && self.in_edges[node as usize]
                        .iter()
                        .map(|&edge_id| self.edges[edge_id as usize].source())
                        .all(beats)
            })
            .collect()
    }

    /// Shortcut candidates for contracting `node`, one witness search per
    /// in-neighbor. Reads round-start state only.
    fn shortcuts_for(&self, node: NodePos, witness: &mut WitnessSearch, hop_limit: u32) -> Vec<Edge> {
        let mut shortcuts = Vec::new();

        for &in_id in &self.in_edges[node as usize] {
            let in_edge = self.edges[in_id as usize];
            let from = in_edge.source();
            if from == node {
                continue;
            }

            let mut pairs = Vec::new();
            let mut cap = ScalarCost::zero();
            for &out_id in &self.out_edges[node as usize] {
                let out_edge = self.edges[out_id as usize];
                let to = out_edge.target();
                if to == node || to == from {
                    continue;
                }
                let concatenated = in_edge.cost() + out_edge.cost();
                let scalarized = ScalarCost::new(concatenated * self.witness_weights);
                if scalarized > cap {
                    cap = scalarized;
                }
                pairs.push((out_id, to, concatenated));
            }
            if pairs.is_empty() {
                continue;
            }

            witness.run(self, from, cap, hop_limit);

            for (out_id, to, concatenated) in pairs {
                // suppressing a shortcut is only safe when the witness path is
                // at least as good in every cost component
                let witnessed = witness.cost_vector(to).map_or(false, |found| found.fuzzy_leq(&concatenated));
                if !witnessed {
                    shortcuts.push(Edge::shortcut(from, to, concatenated, (in_id, out_id)));
                }
            }
        }

        shortcuts
    }

    /// Drop a contracted node out of the live core and update the neighbor
    /// statistics feeding the priorities.
    fn retire(&mut self, node: NodePos) {
        let node_depth = self.depth[node as usize];

        for edge_id in std::mem::take(&mut self.out_edges[node as usize]) {
            let neighbor = self.edges[edge_id as usize].target();
            if neighbor == node {
                continue;
            }
            let list = &mut self.in_edges[neighbor as usize];
            let position = list.iter().position(|&other| other == edge_id).unwrap();
            list.swap_remove(position);
            self.contracted_neighbors[neighbor as usize] += 1;
            self.depth[neighbor as usize] = self.depth[neighbor as usize].max(node_depth + 1);
        }
        for edge_id in std::mem::take(&mut self.in_edges[node as usize]) {
            let neighbor = self.edges[edge_id as usize].source();
            if neighbor == node {
                continue;
            }
            let list = &mut self.out_edges[neighbor as usize];
            let position = list.iter().position(|&other| other == edge_id).unwrap();
            list.swap_remove(position);
            self.contracted_neighbors[neighbor as usize] += 1;
            self.depth[neighbor as usize] = self.depth[neighbor as usize].max(node_depth + 1);
        }
    }

    fn into_graph(self) -> Graph {
        Graph::new(self.nodes, self.edges)
    }
}

#[derive(Clone, Copy)]
struct WitnessLabel {
    cost: Cost,
    hops: u32,
}

/// Scratch state for the bounded witness searches. One instance per worker,
/// reused across all searches the worker performs.
struct WitnessSearch {
    distances: TimestampedVector<ScalarCost>,
    // valid wherever the distance is finite in the current search
    labels: Vec<WitnessLabel>,
    queue: IndexedMinHeap<State<ScalarCost>>,
}

impl WitnessSearch {
    fn new(n: usize) -> WitnessSearch {
        WitnessSearch {
            distances: TimestampedVector::new(n, ScalarCost::INFINITY),
            labels: vec![
                WitnessLabel {
                    cost: Cost::ZERO,
                    hops: 0,
                };
                n
            ],
            queue: IndexedMinHeap::new(n),
        }
    }

    /// Scalarized search from `from` through the live core, never entering
    /// a node already marked contracted (including everything selected in
    /// the current round) and never beyond `cap` or `hop_limit`.
    fn run(&mut self, core: &ContractionCore, from: NodePos, cap: ScalarCost, hop_limit: u32) {
        self.distances.reset();
        self.queue.clear();

        self.distances[from as usize] = ScalarCost::zero();
        self.labels[from as usize] = WitnessLabel {
            cost: Cost::ZERO,
            hops: 0,
        };
        self.queue.push(State {
            key: ScalarCost::zero(),
            node: from,
        });

        while let Some(State { key, node }) = self.queue.pop() {
            if key > cap {
                break;
            }
            let label = self.labels[node as usize];
            if label.hops >= hop_limit {
                continue;
            }
            for &edge_id in &core.out_edges[node as usize] {
                let edge = core.edges[edge_id as usize];
                let target = edge.target();
                if core.contracted[target as usize] {
                    continue;
                }
                let next = key + ScalarCost::new(edge.cost() * core.witness_weights);
                if next < self.distances[target as usize] {
                    self.distances[target as usize] = next;
                    self.labels[target as usize] = WitnessLabel {
                        cost: label.cost + edge.cost(),
                        hops: label.hops + 1,
                    };
                    let state = State { key: next, node: target };
                    if self.queue.contains_index(state.as_index()) {
                        self.queue.decrease_key(state);
                    } else {
                        self.queue.push(state);
                    }
                }
            }
        }
    }

    /// Cost vector of the best path found to `node`, if any.
    fn cost_vector(&self, node: NodePos) -> Option<Cost> {
        if self.distances[node as usize].is_finite() {
            Some(self.labels[node as usize].cost)
        } else {
            None
        }
    }
}
