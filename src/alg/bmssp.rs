use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::alg::blocks::BlockStructure;
use crate::alg::dijkstra::HeapEntry;
use crate::graph::csr::CsrGraph;

#[derive(Debug, Clone)]
pub struct SsspResult {
    pub distances: Vec<f64>,
    pub predecessors: Vec<i32>,
    pub source: u32,
}

/// Single-source shortest paths by bounded multi-source recursion.
///
/// The solver repeatedly contracts a frontier of candidate shortest-path tree
/// roots: a pivot-finding pass prunes the frontier with a few rounds of
/// bounded relaxation, a block structure hands sub-frontiers to the next
/// recursion level in distance bands, and a capped mini-Dijkstra settles
/// single sources at the bottom. Distances match Dijkstra; the work is
/// O(m (log n)^(2/3)) instead of O(m + n log n).
pub struct SsspSolver<'a> {
    graph: &'a CsrGraph,

    // Tuning parameters derived from log2(n).
    k: usize,         // relaxation depth and subtree threshold
    t: usize,         // level granularity exponent
    max_level: usize, // recursion depth

    dist: Vec<f64>,
    pred: Vec<i32>,
    complete: Vec<bool>,

    relaxations: u64,
}

impl<'a> SsspSolver<'a> {
    /// Fails on an empty graph or any non-finite / negative weight.
    pub fn new(graph: &'a CsrGraph) -> Result<SsspSolver<'a>, String> {
        let n = graph.n();
        if n == 0 {
            return Err("graph has no vertices".into());
        }
        for (e, &w) in graph.w.iter().enumerate() {
            if !w.is_finite() || w < 0.0 {
                return Err(format!("edge {e} has weight {w}, expected finite and >= 0"));
            }
        }

        let (k, t, max_level) = if n <= 1 {
            (1, 1, 1)
        } else {
            let log_n = (n as f64).log2();
            let k = (log_n.powf(1.0 / 3.0).floor() as usize).max(2);
            let t = (log_n.powf(2.0 / 3.0).floor() as usize).max(2);
            let max_level = ((log_n / t as f64).ceil() as usize).max(1);
            (k, t, max_level)
        };

        Ok(SsspSolver {
            graph,
            k,
            t,
            max_level,
            dist: vec![f64::INFINITY; n],
            pred: vec![-1; n],
            complete: vec![false; n],
            relaxations: 0,
        })
    }

    pub fn solve(&mut self, source: u32) -> Result<SsspResult, String> {
        let n = self.graph.n();
        if source as usize >= n {
            return Err(format!("source {source} out of range, graph has {n} vertices"));
        }

        self.dist.fill(f64::INFINITY);
        self.pred.fill(-1);
        self.complete.fill(false);
        self.relaxations = 0;

        self.dist[source as usize] = 0.0;
        self.complete[source as usize] = true;

        for (v, w) in self.graph.out_edges(source) {
            self.relaxations += 1;
            if w < self.dist[v as usize] {
                self.dist[v as usize] = w;
                self.pred[v as usize] = source as i32;
            }
        }

        self.bmssp(self.max_level, f64::INFINITY, vec![source]);

        Ok(SsspResult {
            distances: self.dist.clone(),
            predecessors: self.pred.clone(),
            source,
        })
    }

    /// Relaxation attempts performed by the last `solve`.
    pub fn relaxation_count(&self) -> u64 {
        self.relaxations
    }

    /// One recursion step: settle every vertex whose final distance lies
    /// below a bound it discovers, returning that bound and the settled set.
    fn bmssp(&mut self, level: usize, bound: f64, frontier: Vec<u32>) -> (f64, Vec<u32>) {
        if level == 0 {
            return self.base_case(bound, frontier);
        }

        let (pivots, within) = self.find_pivots(bound, &frontier);
        if pivots.is_empty() {
            return (bound, within);
        }

        let n = self.graph.n();
        let block_cap = pow2_clamped((level - 1) * self.t, n);
        let size_limit = mul_pow2_clamped(self.k, level * self.t, n);

        let mut bands = BlockStructure::new(block_cap, bound, size_limit);
        for &p in &pivots {
            if self.dist[p as usize] < bound {
                bands.insert(p, self.dist[p as usize]);
            }
        }

        let mut b_prime = f64::INFINITY;
        for &p in &pivots {
            if self.complete[p as usize] {
                b_prime = b_prime.min(self.dist[p as usize]);
            }
        }
        if b_prime.is_infinite() {
            b_prime = self.dist[pivots[0] as usize];
        }

        let mut settled: Vec<u32> = Vec::new();
        let mut settled_set: HashSet<u32> = HashSet::new();

        while settled_set.len() < size_limit && !bands.is_empty() {
            let (sub_frontier, band_bound) = bands.pull();
            if sub_frontier.is_empty() {
                break;
            }

            let (child_bound, child_settled) =
                self.bmssp(level - 1, band_bound, sub_frontier.clone());
            b_prime = child_bound;

            for &v in &child_settled {
                if settled_set.insert(v) {
                    settled.push(v);
                }
            }

            // Relax out of the child's settled set. New distances land back
            // in the block structure if they fall in this call's band, or in
            // the prepend buffer if the child's band has to re-process them.
            let mut prepend: Vec<(u32, f64)> = Vec::new();
            for &u in &child_settled {
                for (v, w) in self.graph.out_edges(u) {
                    self.relaxations += 1;
                    let nd = self.dist[u as usize] + w;
                    if nd <= self.dist[v as usize] {
                        self.dist[v as usize] = nd;
                        self.pred[v as usize] = u as i32;

                        if nd >= band_bound && nd < bound {
                            bands.insert(v, nd);
                        } else if nd >= b_prime && nd < band_bound {
                            prepend.push((v, nd));
                        }
                    }
                }
            }
            for &x in &sub_frontier {
                let dx = self.dist[x as usize];
                if dx >= b_prime && dx < band_bound {
                    prepend.push((x, dx));
                }
            }
            bands.batch_prepend(prepend);
        }

        let b_final = b_prime.min(bound);
        for &x in &within {
            if self.dist[x as usize] < b_final && settled_set.insert(x) {
                settled.push(x);
            }
        }

        (b_final, settled)
    }

    /// Level 0: capped mini-Dijkstra from a single source. Stops after
    /// settling k+1 vertices or draining the heap.
    fn base_case(&mut self, bound: f64, frontier: Vec<u32>) -> (f64, Vec<u32>) {
        assert!(
            frontier.len() == 1,
            "level-0 call expects a single-vertex frontier, got {}",
            frontier.len()
        );
        let x = frontier[0];

        let mut settled: Vec<u32> = vec![x];
        let mut settled_set: HashSet<u32> = HashSet::new();
        settled_set.insert(x);
        let mut expanded: HashSet<u32> = HashSet::new();

        let mut heap: BinaryHeap<Reverse<HeapEntry>> = BinaryHeap::new();
        heap.push(Reverse(HeapEntry { dist: self.dist[x as usize], node: x }));

        while settled.len() < self.k + 1 {
            let Some(Reverse(top)) = heap.pop() else { break };
            if top.dist > self.dist[top.node as usize] {
                continue; // stale entry
            }
            if !expanded.insert(top.node) {
                continue; // equal-distance duplicate, already relaxed
            }

            if settled_set.insert(top.node) {
                settled.push(top.node);
            }
            self.complete[top.node as usize] = true;

            for (v, w) in self.graph.out_edges(top.node) {
                self.relaxations += 1;
                let nd = self.dist[top.node as usize] + w;
                if nd <= self.dist[v as usize] && nd < bound {
                    self.dist[v as usize] = nd;
                    self.pred[v as usize] = top.node as i32;
                    heap.push(Reverse(HeapEntry { dist: nd, node: v }));
                }
            }
        }

        if settled.len() <= self.k {
            return (bound, settled);
        }

        let max_dist = settled
            .iter()
            .map(|&v| self.dist[v as usize])
            .fold(0.0, f64::max);
        let kept: Vec<u32> = settled
            .into_iter()
            .filter(|&v| self.dist[v as usize] < max_dist)
            .collect();
        (max_dist, kept)
    }

    /// Run k rounds of bounded relaxation from the frontier, then keep only
    /// the frontier vertices whose tentative shortest-path subtree reaches at
    /// least k vertices. Returns (pivots, touched): `touched` is every vertex
    /// whose distance moved below the bound, frontier included.
    fn find_pivots(&mut self, bound: f64, frontier: &[u32]) -> (Vec<u32>, Vec<u32>) {
        let mut touched: Vec<u32> = frontier.to_vec();
        let mut touched_set: HashSet<u32> = frontier.iter().copied().collect();
        let mut wave: Vec<u32> = frontier.to_vec();

        for _ in 0..self.k {
            let mut next: Vec<u32> = Vec::new();
            let mut in_next: HashSet<u32> = HashSet::new();

            for &u in &wave {
                for (v, w) in self.graph.out_edges(u) {
                    self.relaxations += 1;
                    let nd = self.dist[u as usize] + w;
                    if nd <= self.dist[v as usize] {
                        self.dist[v as usize] = nd;
                        self.pred[v as usize] = u as i32;
                        if nd < bound && in_next.insert(v) {
                            next.push(v);
                        }
                    }
                }
            }

            for &v in &next {
                if touched_set.insert(v) {
                    touched.push(v);
                }
            }

            // Frontier already expanded past the pivot threshold: every
            // frontier vertex stays a pivot and the subtree test is skipped.
            if touched.len() > self.k * frontier.len() {
                return (frontier.to_vec(), touched);
            }

            wave = next;
        }

        // Forest over `touched` induced by predecessor links.
        let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
        for &v in &touched {
            let p = self.pred[v as usize];
            if p >= 0 && touched_set.contains(&(p as u32)) {
                children.entry(p as u32).or_default().push(v);
            }
        }

        // Subtree sizes by iterative post-order from each frontier root.
        // Roots can sit inside each other's subtrees; recomputation writes
        // the same size either way. The per-root visited set only guards the
        // traversal against malformed predecessor links.
        let mut subtree: HashMap<u32, usize> = HashMap::new();
        for &root in frontier {
            let mut visited: HashSet<u32> = HashSet::new();
            visited.insert(root);
            let mut stack: Vec<(u32, bool)> = vec![(root, false)];
            while let Some((v, children_done)) = stack.pop() {
                if children_done {
                    let mut size = 1;
                    if let Some(ch) = children.get(&v) {
                        for &c in ch {
                            size += subtree.get(&c).copied().unwrap_or(0);
                        }
                    }
                    subtree.insert(v, size);
                } else {
                    stack.push((v, true));
                    if let Some(ch) = children.get(&v) {
                        for &c in ch {
                            if visited.insert(c) {
                                stack.push((c, false));
                            }
                        }
                    }
                }
            }
        }

        let mut pivots: Vec<u32> = frontier
            .iter()
            .copied()
            .filter(|s| subtree.get(s).copied().unwrap_or(0) >= self.k)
            .collect();
        if pivots.is_empty() {
            pivots.push(frontier[0]);
        }

        for &v in &touched {
            self.complete[v as usize] = true;
        }

        (pivots, touched)
    }
}

/// 2^exp clamped to [1, n], saturating on shift overflow.
fn pow2_clamped(exp: usize, n: usize) -> usize {
    if exp >= usize::BITS as usize - 1 {
        return n.max(1);
    }
    (1usize << exp).clamp(1, n.max(1))
}

/// k * 2^exp clamped to [1, n], saturating.
fn mul_pow2_clamped(k: usize, exp: usize, n: usize) -> usize {
    if exp >= usize::BITS as usize - 1 {
        return n.max(1);
    }
    k.saturating_mul(1usize << exp).clamp(1, n.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(n: usize, edges: &[(u32, u32, f64)], source: u32) -> SsspResult {
        let g = CsrGraph::from_edges(n, edges);
        let mut solver = SsspSolver::new(&g).expect("solver construction failed");
        solver.solve(source).expect("solve failed")
    }

    fn assert_distances(result: &SsspResult, expected: &[f64]) {
        assert_eq!(result.distances.len(), expected.len());
        for (v, (&got, &want)) in result.distances.iter().zip(expected).enumerate() {
            if want.is_infinite() {
                assert!(got.is_infinite(), "vertex {v}: expected unreachable, got {got}");
            } else {
                assert!(
                    (got - want).abs() < 1e-9,
                    "vertex {v}: expected {want}, got {got}"
                );
            }
        }
    }

    #[test]
    fn path_graph() {
        let r = solve(4, &[(0, 1, 1.0), (1, 2, 2.0), (2, 3, 3.0)], 0);
        assert_distances(&r, &[0.0, 1.0, 3.0, 6.0]);
    }

    #[test]
    fn diamond_graph() {
        let r = solve(4, &[(0, 1, 1.0), (0, 2, 3.0), (1, 3, 4.0), (2, 3, 1.0)], 0);
        assert_distances(&r, &[0.0, 1.0, 3.0, 4.0]);
    }

    #[test]
    fn two_cycle() {
        let r = solve(2, &[(0, 1, 5.0), (1, 0, 5.0)], 0);
        assert_distances(&r, &[0.0, 5.0]);
    }

    #[test]
    fn shortcut_through_middle() {
        let r = solve(
            4,
            &[(0, 1, 1.0), (0, 2, 4.0), (1, 2, 2.0), (2, 3, 1.0), (1, 3, 5.0)],
            0,
        );
        assert_distances(&r, &[0.0, 1.0, 3.0, 4.0]);
    }

    #[test]
    fn partially_reachable() {
        let r = solve(4, &[(0, 1, 1.0)], 0);
        assert_distances(&r, &[0.0, 1.0, f64::INFINITY, f64::INFINITY]);
    }

    #[test]
    fn star_graph() {
        let edges: Vec<(u32, u32, f64)> = (1..10).map(|i| (0, i, i as f64)).collect();
        let r = solve(10, &edges, 0);
        let expected: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert_distances(&r, &expected);
    }

    #[test]
    fn single_vertex() {
        let r = solve(1, &[], 0);
        assert_distances(&r, &[0.0]);
        assert_eq!(r.predecessors, vec![-1]);
    }

    #[test]
    fn isolated_source() {
        let r = solve(3, &[(1, 2, 1.0)], 0);
        assert_distances(&r, &[0.0, f64::INFINITY, f64::INFINITY]);
    }

    #[test]
    fn positive_self_loop_changes_nothing() {
        let r = solve(3, &[(0, 0, 2.0), (0, 1, 1.0), (1, 1, 0.5), (1, 2, 1.0)], 0);
        assert_distances(&r, &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn parallel_edges_take_minimum() {
        let r = solve(2, &[(0, 1, 5.0), (0, 1, 2.0), (0, 1, 7.0)], 0);
        assert_distances(&r, &[0.0, 2.0]);
    }

    #[test]
    fn nonzero_source() {
        let r = solve(3, &[(1, 0, 2.0), (1, 2, 1.0), (2, 0, 0.5)], 1);
        assert_distances(&r, &[1.5, 0.0, 1.0]);
        assert_eq!(r.source, 1);
        assert_eq!(r.predecessors[1], -1);
    }

    #[test]
    fn predecessors_form_shortest_path_tree() {
        let r = solve(
            5,
            &[(0, 1, 2.0), (0, 2, 1.0), (2, 1, 1.0), (1, 3, 1.0), (2, 4, 5.0), (3, 4, 1.0)],
            0,
        );
        assert_distances(&r, &[0.0, 2.0, 1.0, 3.0, 4.0]);
        for v in 1..5u32 {
            let p = r.predecessors[v as usize];
            assert!(p >= 0);
            // Walking predecessors must reach the source.
            let mut cur = v;
            let mut steps = 0;
            while cur != 0 {
                cur = r.predecessors[cur as usize] as u32;
                steps += 1;
                assert!(steps <= 5, "predecessor chain does not terminate");
            }
        }
    }

    #[test]
    fn rejects_empty_graph() {
        let g = CsrGraph::from_edges(0, &[]);
        assert!(SsspSolver::new(&g).is_err());
    }

    #[test]
    fn rejects_bad_weights() {
        let g = CsrGraph::from_edges(2, &[(0, 1, -1.0)]);
        assert!(SsspSolver::new(&g).is_err());

        let g = CsrGraph::from_edges(2, &[(0, 1, f64::NAN)]);
        assert!(SsspSolver::new(&g).is_err());

        let g = CsrGraph::from_edges(2, &[(0, 1, f64::INFINITY)]);
        assert!(SsspSolver::new(&g).is_err());
    }

    #[test]
    fn rejects_out_of_range_source() {
        let g = CsrGraph::from_edges(2, &[(0, 1, 1.0)]);
        let mut solver = SsspSolver::new(&g).unwrap();
        assert!(solver.solve(2).is_err());
    }

    #[test]
    fn repeated_solves_are_bit_identical() {
        let g = crate::graph::gen::random_sparse(300, 900, 1.0, 50.0, 17);
        let mut solver = SsspSolver::new(&g).unwrap();
        let a = solver.solve(0).unwrap();
        let b = solver.solve(0).unwrap();

        let bits = |xs: &[f64]| xs.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a.distances), bits(&b.distances));
        assert_eq!(a.predecessors, b.predecessors);
    }

    #[test]
    fn dense_small_graph() {
        let g = crate::graph::gen::complete(12, 1.0, 9.0, 5);
        let mut solver = SsspSolver::new(&g).unwrap();
        let r = solver.solve(3).unwrap();
        let oracle = crate::alg::dijkstra::dijkstra(&g, 3);
        for v in 0..12 {
            assert!((r.distances[v] - oracle.distances[v]).abs() < 1e-9);
        }
    }
}
