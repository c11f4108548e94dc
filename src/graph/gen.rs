use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::csr::CsrGraph;

/// Random sparse digraph with a shuffled spanning tree for connectivity from
/// every tree root, then extra distinct random edges up to roughly `m` total.
pub fn random_sparse(n: usize, m: usize, min_w: f64, max_w: f64, seed: u64) -> CsrGraph {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut edges: Vec<(u32, u32, f64)> = Vec::with_capacity(m);
    let mut seen: HashSet<(u32, u32)> = HashSet::with_capacity(m);

    let mut perm: Vec<u32> = (0..n as u32).collect();
    perm.shuffle(&mut rng);

    for i in 1..n {
        let parent = perm[rng.gen_range(0..i)];
        let child = perm[i];
        edges.push((parent, child, rng.gen_range(min_w..max_w)));
        seen.insert((parent, child));
    }

    let mut remaining = m.saturating_sub(n.saturating_sub(1));
    let mut attempts = 0usize;
    while remaining > 0 && attempts < m * 10 {
        let u = rng.gen_range(0..n) as u32;
        let v = rng.gen_range(0..n) as u32;
        if u != v && seen.insert((u, v)) {
            edges.push((u, v, rng.gen_range(min_w..max_w)));
            remaining -= 1;
        }
        attempts += 1;
    }

    CsrGraph::from_edges(n, &edges)
}

/// Directed 4-neighbour grid of `rows x cols` vertices.
pub fn grid(rows: usize, cols: usize, min_w: f64, max_w: f64, seed: u64) -> CsrGraph {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let n = rows * cols;
    let mut edges: Vec<(u32, u32, f64)> = Vec::with_capacity(4 * n);

    let idx = |r: usize, c: usize| (r * cols + c) as u32;

    for r in 0..rows {
        for c in 0..cols {
            if c + 1 < cols {
                edges.push((idx(r, c), idx(r, c + 1), rng.gen_range(min_w..max_w)));
            }
            if r + 1 < rows {
                edges.push((idx(r, c), idx(r + 1, c), rng.gen_range(min_w..max_w)));
            }
            if c > 0 {
                edges.push((idx(r, c), idx(r, c - 1), rng.gen_range(min_w..max_w)));
            }
            if r > 0 {
                edges.push((idx(r, c), idx(r - 1, c), rng.gen_range(min_w..max_w)));
            }
        }
    }

    CsrGraph::from_edges(n, &edges)
}

pub fn complete(n: usize, min_w: f64, max_w: f64, seed: u64) -> CsrGraph {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut edges: Vec<(u32, u32, f64)> = Vec::with_capacity(n * n.saturating_sub(1));

    for u in 0..n as u32 {
        for v in 0..n as u32 {
            if u != v {
                edges.push((u, v, rng.gen_range(min_w..max_w)));
            }
        }
    }

    CsrGraph::from_edges(n, &edges)
}

/// Scale-free digraph by preferential attachment: an `m0`-clique seed, then
/// each new vertex attaches to `edges_per_node` existing vertices with
/// probability proportional to degree. Both directions are added.
pub fn scale_free(
    n: usize,
    m0: usize,
    edges_per_node: usize,
    min_w: f64,
    max_w: f64,
    seed: u64,
) -> CsrGraph {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut edges: Vec<(u32, u32, f64)> = Vec::new();
    let mut degrees: Vec<usize> = vec![0; n];

    let seed_size = m0.min(n);
    for u in 0..seed_size {
        for v in (u + 1)..seed_size {
            edges.push((u as u32, v as u32, rng.gen_range(min_w..max_w)));
            edges.push((v as u32, u as u32, rng.gen_range(min_w..max_w)));
        }
    }
    for d in degrees.iter_mut().take(seed_size) {
        *d = seed_size.saturating_sub(1);
    }

    for new_node in seed_size..n {
        let total_degree: usize = degrees[..new_node].iter().sum();
        let mut targets: HashSet<usize> = HashSet::new();

        while targets.len() < edges_per_node && targets.len() < new_node {
            let r = rng.gen_range(0.0..1.0) * total_degree as f64;
            let mut cumsum = 0.0;
            for i in 0..new_node {
                cumsum += degrees[i] as f64;
                if cumsum >= r {
                    targets.insert(i);
                    break;
                }
            }
        }

        let mut picked: Vec<usize> = targets.into_iter().collect();
        picked.sort_unstable();
        for target in picked {
            edges.push((new_node as u32, target as u32, rng.gen_range(min_w..max_w)));
            edges.push((target as u32, new_node as u32, rng.gen_range(min_w..max_w)));
            degrees[new_node] += 1;
            degrees[target] += 1;
        }
    }

    CsrGraph::from_edges(n, &edges)
}
