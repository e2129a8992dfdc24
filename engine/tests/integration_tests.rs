use pareto_router::{
    algo::contraction_hierarchy::Contractor,
    datastr::graph::*,
    io::{Deconstruct, Reconstruct},
};
use rand::prelude::*;

fn fixture() -> Graph {
    // This is the directed graph we're going to use.
    // The edge annotations are the first cost component, the
    // other two components carry the reversed and a flat profile.
    //
    //                  7
    //          +-----------------+
    //          |                 |
    //          v   1        2    |  2
    //          0 -----> 1 -----> 3 ---> 4
    //          |        ^        ^      ^
    //          |        | 1      |      |
    //          |        |        | 3    | 1
    //          +------> 2 -------+      |
    //           10      |               |
    //                   +---------------+
    //
    let nodes = (0..5).map(Node::new).collect();
    let lengths = [(0, 2, 10.0), (0, 1, 1.0), (1, 3, 2.0), (2, 1, 1.0), (2, 3, 3.0), (2, 4, 1.0), (3, 0, 7.0), (3, 4, 2.0)];
    let edges = lengths
        .iter()
        .map(|&(source, target, length)| Edge::new(source, target, Cost::new([length, 11.0 - length, 1.0])))
        .collect();
    Graph::new(nodes, edges)
}

fn random_graph(rng: &mut StdRng, n: u32, out_degree: usize) -> Graph {
    let nodes = (0..n).map(Node::new).collect();
    let mut edges = Vec::new();
    for source in 0..n {
        for _ in 0..out_degree {
            let target = rng.gen_range(0..n);
            let cost = Cost::new([rng.gen_range(1.0..10.0), rng.gen_range(1.0..10.0), rng.gen_range(1.0..10.0)]);
            edges.push(Edge::new(source, target, cost));
        }
    }
    Graph::new(nodes, edges)
}

fn weight_vectors() -> [Weights; 4] {
    [
        Weights::balanced(),
        Weights::new([1.0, 0.0, 0.0]),
        Weights::new([0.0, 1.0, 0.0]),
        Weights::new([0.2, 0.5, 0.3]),
    ]
}

fn assert_equivalent(graph: &Graph, weights: Weights, pairs: &[(NodePos, NodePos)]) {
    let mut ch = graph.create_ch_dijkstra();
    let mut plain = graph.create_plain_dijkstra(true);

    for &(from, to) in pairs {
        let ch_route = ch.find_best_route(from, to, weights);
        let plain_route = plain.find_best_route(from, to, weights);
        match (ch_route, plain_route) {
            (Some(ch_route), Some(plain_route)) => {
                assert!(
                    (ch_route.costs * weights - plain_route.costs * weights).abs() <= EPSILON,
                    "cost mismatch from {} to {}: {:?} vs {:?}",
                    from,
                    to,
                    ch_route.costs,
                    plain_route.costs
                );
            }
            (None, None) => (),
            (ch_route, plain_route) => panic!(
                "reachability mismatch from {} to {}: ch {:?}, plain {:?}",
                from, to, ch_route, plain_route
            ),
        }
    }
}

#[test]
fn fixture_queries_match_the_plain_search() {
    let contracted = Contractor::new(false, 2).contract_completely(fixture(), 0.0);
    let all_pairs: Vec<(NodePos, NodePos)> = (0..5).flat_map(|from| (0..5).map(move |to| (from, to))).collect();
    for weights in weight_vectors() {
        assert_equivalent(&contracted, weights, &all_pairs);
    }
}

#[test]
fn random_queries_match_the_plain_search() {
    let mut rng = StdRng::seed_from_u64(42);
    let graph = random_graph(&mut rng, 60, 3);
    let contracted = Contractor::new(false, 2).contract_completely(graph, 0.0);

    let pairs: Vec<(NodePos, NodePos)> = (0..100).map(|_| (rng.gen_range(0..60), rng.gen_range(0..60))).collect();
    for weights in weight_vectors() {
        assert_equivalent(&contracted, weights, &pairs);
    }
}

#[test]
fn partially_contracted_queries_match_the_plain_search() {
    let mut rng = StdRng::seed_from_u64(7);
    let graph = random_graph(&mut rng, 60, 3);
    let contracted = Contractor::new(false, 2).contract_completely(graph, 0.3);

    let pairs: Vec<(NodePos, NodePos)> = (0..100).map(|_| (rng.gen_range(0..60), rng.gen_range(0..60))).collect();
    for weights in weight_vectors() {
        assert_equivalent(&contracted, weights, &pairs);
    }
}

#[test]
fn every_edge_lands_in_the_matching_query_view() {
    let mut rng = StdRng::seed_from_u64(23);
    let graph = random_graph(&mut rng, 40, 3);
    let contracted = Contractor::new(false, 2).contract_completely(graph, 0.0);

    for pos in 0..contracted.num_nodes() as NodePos {
        let level = contracted.node(pos).level();
        for &edge_id in contracted.up_edges(pos) {
            let edge = contracted.edge(edge_id);
            assert!(contracted.node(edge.target()).level() >= level);
        }
        for &edge_id in contracted.down_edges(pos) {
            let edge = contracted.edge(edge_id);
            assert!(contracted.node(edge.source()).level() >= level);
        }
    }

    // fully contracted: adjacent nodes always sit on distinct levels
    for edge_id in 0..contracted.num_edges() as EdgeId {
        let edge = contracted.edge(edge_id);
        if edge.source() != edge.target() {
            assert_ne!(
                contracted.node(edge.source()).level(),
                contracted.node(edge.target()).level(),
                "edge {} connects two nodes on the same level",
                edge_id
            );
        }
    }
}

#[test]
fn hierarchy_routes_unpack_to_chained_original_edges() {
    let mut rng = StdRng::seed_from_u64(5);
    let graph = random_graph(&mut rng, 50, 3);
    let contracted = Contractor::new(false, 2).contract_completely(graph, 0.0);

    let mut ch = contracted.create_ch_dijkstra();
    let weights = Weights::balanced();
    for _ in 0..50 {
        let from = rng.gen_range(0..50);
        let to = rng.gen_range(0..50);
        if let Some(route) = ch.find_best_route(from, to, weights) {
            let mut summed = Cost::ZERO;
            for &edge_id in &route.edges {
                assert!(!contracted.edge(edge_id).is_shortcut());
                summed += contracted.edge(edge_id).cost();
            }
            assert!(summed.fuzzy_eq(&route.costs));

            if !route.edges.is_empty() {
                assert_eq!(contracted.edge(route.edges[0]).source(), from);
                assert_eq!(contracted.edge(*route.edges.last().unwrap()).target(), to);
            }
            for pair in route.edges.windows(2) {
                assert_eq!(contracted.edge(pair[0]).target(), contracted.edge(pair[1]).source());
            }
        }
    }
}

#[test]
fn hierarchies_survive_a_round_trip_through_disk() {
    let mut rng = StdRng::seed_from_u64(13);
    let graph = random_graph(&mut rng, 30, 3);
    let contracted = Contractor::new(false, 2).contract_completely(graph, 0.0);

    let dir = tempfile::tempdir().unwrap();
    contracted.deconstruct_to(&dir.path()).unwrap();
    let reloaded = Graph::reconstruct_from(&dir.path()).unwrap();
    reloaded.validate_shortcuts();

    assert_eq!(reloaded.num_nodes(), contracted.num_nodes());
    assert_eq!(reloaded.num_edges(), contracted.num_edges());
    for pos in 0..contracted.num_nodes() as NodePos {
        assert_eq!(reloaded.node(pos).id(), contracted.node(pos).id());
        assert_eq!(reloaded.node(pos).level(), contracted.node(pos).level());
    }
    for edge_id in 0..contracted.num_edges() as EdgeId {
        let original = contracted.edge(edge_id);
        let restored = reloaded.edge(edge_id);
        assert_eq!(original.source(), restored.source());
        assert_eq!(original.target(), restored.target());
        assert_eq!(original.children(), restored.children());
        assert!(original.cost().fuzzy_eq(&restored.cost()));
    }

    let weights = Weights::balanced();
    for _ in 0..20 {
        let from = rng.gen_range(0..30);
        let to = rng.gen_range(0..30);
        let original = contracted.create_ch_dijkstra().find_best_route(from, to, weights);
        let restored = reloaded.create_ch_dijkstra().find_best_route(from, to, weights);
        assert_eq!(original.is_some(), restored.is_some());
        if let (Some(original), Some(restored)) = (original, restored) {
            assert!((original.costs * weights - restored.costs * weights).abs() <= EPSILON);
        }
    }
}

#[test]
fn external_ids_resolve_to_positions_after_contraction() {
    let nodes = [30u32, 10, 20].iter().map(|&id| Node::new(id)).collect();
    let edges = vec![Edge::new(0, 1, Cost::new([1.0, 1.0, 1.0])), Edge::new(1, 2, Cost::new([1.0, 1.0, 1.0]))];
    let contracted = Contractor::new(false, 1).contract_completely(Graph::new(nodes, edges), 0.0);

    assert_eq!(contracted.node_pos(30), 0);
    assert_eq!(contracted.node_pos(20), 2);
    let positions = contracted.node_pos_by_ids([10, 20, 99]);
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[&10], 1);
}
