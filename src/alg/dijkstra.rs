use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Graph;

use crate::graph::csr::CsrGraph;

#[derive(Debug, Clone)]
pub struct DijkstraResult {
    pub distances: Vec<f64>,
    pub predecessors: Vec<i32>,
}

/// Heap entry ordered by distance, ties broken by vertex id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HeapEntry {
    pub dist: f64,
    pub node: u32,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Binary-heap Dijkstra on a directed CSR graph. The correctness oracle for
/// the frontier solver.
pub fn dijkstra(g: &CsrGraph, source: u32) -> DijkstraResult {
    let n = g.n();
    assert!((source as usize) < n, "source {source} out of range for n={n}");

    let mut dist = vec![f64::INFINITY; n];
    let mut pred = vec![-1i32; n];
    dist[source as usize] = 0.0;

    let mut pq: BinaryHeap<Reverse<HeapEntry>> = BinaryHeap::new();
    pq.push(Reverse(HeapEntry { dist: 0.0, node: source }));

    while let Some(Reverse(top)) = pq.pop() {
        if top.dist > dist[top.node as usize] {
            continue; // stale entry
        }

        for (v, w) in g.out_edges(top.node) {
            let nd = top.dist + w;
            if nd < dist[v as usize] {
                dist[v as usize] = nd;
                pred[v as usize] = top.node as i32;
                pq.push(Reverse(HeapEntry { dist: nd, node: v }));
            }
        }
    }

    DijkstraResult { distances: dist, predecessors: pred }
}

/// Dijkstra via petgraph, used only to cross-validate against an external
/// library implementation. Returns the dense distance array.
pub fn dijkstra_petgraph(g: &CsrGraph, source: u32) -> Vec<f64> {
    let n = g.n();
    assert!((source as usize) < n, "source {source} out of range for n={n}");

    let mut pet: Graph<(), f64> = Graph::with_capacity(n, g.m());
    let nodes: Vec<NodeIndex> = (0..n).map(|_| pet.add_node(())).collect();

    for u in 0..n as u32 {
        for (v, w) in g.out_edges(u) {
            pet.add_edge(nodes[u as usize], nodes[v as usize], w);
        }
    }

    let sparse = petgraph::algo::dijkstra(&pet, nodes[source as usize], None, |e| *e.weight());

    let mut dist = vec![f64::INFINITY; n];
    for (node, d) in sparse {
        dist[node.index()] = d;
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph() -> CsrGraph {
        CsrGraph::from_edges(4, &[(0, 1, 1.0), (1, 2, 2.0), (2, 3, 3.0)])
    }

    #[test]
    fn path_distances() {
        let r = dijkstra(&path_graph(), 0);
        assert_eq!(r.distances, vec![0.0, 1.0, 3.0, 6.0]);
        assert_eq!(r.predecessors, vec![-1, 0, 1, 2]);
    }

    #[test]
    fn unreachable_stays_infinite() {
        let g = CsrGraph::from_edges(3, &[(0, 1, 1.0)]);
        let r = dijkstra(&g, 0);
        assert!(r.distances[2].is_infinite());
        assert_eq!(r.predecessors[2], -1);
    }

    #[test]
    fn parallel_edges_take_minimum() {
        let g = CsrGraph::from_edges(2, &[(0, 1, 5.0), (0, 1, 2.0)]);
        let r = dijkstra(&g, 0);
        assert_eq!(r.distances[1], 2.0);
    }

    #[test]
    fn agrees_with_petgraph() {
        let g = crate::graph::gen::random_sparse(200, 600, 1.0, 100.0, 9);
        let ours = dijkstra(&g, 0);
        let theirs = dijkstra_petgraph(&g, 0);
        for v in 0..g.n() {
            if theirs[v].is_finite() {
                assert!(
                    (ours.distances[v] - theirs[v]).abs() < 1e-9,
                    "mismatch at {v}: ours={} petgraph={}",
                    ours.distances[v],
                    theirs[v]
                );
            } else {
                assert!(ours.distances[v].is_infinite());
            }
        }
    }
}
