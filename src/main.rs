use std::path::PathBuf;
use std::time::Instant;

use rust_sssp::compare::{compare_distances, RunStats};
use rust_sssp::graph::stats::degree_summary;
use rust_sssp::{dijkstra, dijkstra_petgraph, parse_mtx, SsspSolver};

#[derive(Debug)]
struct Config {
    mtx_path: PathBuf,
    num_runs: usize,
    source: u32,
}

fn usage_and_exit() -> ! {
    eprintln!(
        r#"Usage:
  rust-sssp <mtx_file> [num_runs] [source_node]
  - mtx_file:     Matrix Market (.mtx) graph file
  - num_runs:     benchmark iterations (default 5)
  - source_node:  SSSP source vertex (default 0)
"#
    );
    std::process::exit(2);
}

fn parse_args() -> Config {
    let mut args = std::env::args().skip(1);

    let mtx_path = args.next().map(PathBuf::from).unwrap_or_else(|| usage_and_exit());
    let num_runs = match args.next() {
        Some(v) => v.parse().unwrap_or_else(|_| usage_and_exit()),
        None => 5,
    };
    let source = match args.next() {
        Some(v) => v.parse().unwrap_or_else(|_| usage_and_exit()),
        None => 0,
    };

    Config { mtx_path, num_runs: 1usize.max(num_runs), source }
}

fn time_ms<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let t0 = Instant::now();
    let out = f();
    (out, t0.elapsed().as_secs_f64() * 1000.0)
}

fn print_row(name: &str, s: &RunStats) {
    println!(
        "{name:<20}{:>12.3}{:>12.3}{:>12.3}{:>12.3}{:>12.3}",
        s.mean, s.median, s.std_dev, s.min, s.max
    );
}

fn main() {
    let cfg = parse_args();

    eprintln!("[LOAD] {:?}", cfg.mtx_path);
    let (g, info) = parse_mtx(&cfg.mtx_path).unwrap_or_else(|e| {
        eprintln!("[LOAD] failed: {e}");
        std::process::exit(1);
    });

    let n = g.n();
    let m = g.m();
    if cfg.source as usize >= n {
        eprintln!("[LOAD] source {} out of range, graph has {} vertices", cfg.source, n);
        std::process::exit(1);
    }

    let (min_d, max_d, avg_d) = degree_summary(&g);
    println!("Graph: {:?}", cfg.mtx_path);
    println!("  nodes:      {n}");
    println!("  edges:      {m}");
    println!("  degree:     min {min_d}, max {max_d}, avg {avg_d:.2}");
    println!("  symmetric:  {}", info.symmetric);
    println!("  pattern:    {}", info.pattern);
    println!("  source:     {}", cfg.source);
    println!("  runs:       {}", cfg.num_runs);

    let log_n = (n.max(2) as f64).log2();
    let dijkstra_cost = m as f64 + n as f64 * log_n;
    let frontier_cost = m as f64 * log_n.powf(2.0 / 3.0);
    println!("\nTheoretical operation counts:");
    println!("  Dijkstra  O(m + n log n)      = {dijkstra_cost:.3e}");
    println!("  frontier  O(m (log n)^(2/3))  = {frontier_cost:.3e}");
    println!("  ratio                         = {:.3}x", dijkstra_cost / frontier_cost);

    let mut solver = SsspSolver::new(&g).unwrap_or_else(|e| {
        eprintln!("[RUN] solver rejected graph: {e}");
        std::process::exit(1);
    });

    eprintln!("[RUN] warmup + correctness check");
    let reference = dijkstra(&g, cfg.source);
    let pet = dijkstra_petgraph(&g, cfg.source);
    let result = solver.solve(cfg.source).unwrap_or_else(|e| {
        eprintln!("[RUN] solve failed: {e}");
        std::process::exit(1);
    });

    let vs_ref = compare_distances(&reference.distances, &result.distances, 1e-9);
    let vs_pet = compare_distances(&pet, &result.distances, 1e-9);
    println!("\nCorrectness:");
    println!(
        "  vs Dijkstra:  {} ({} reachable, max error {:.3e})",
        if vs_ref.is_match() { "PASSED" } else { "FAILED" },
        vs_ref.reference_reachable,
        vs_ref.max_abs_error
    );
    println!(
        "  vs petgraph:  {} (max error {:.3e})",
        if vs_pet.is_match() { "PASSED" } else { "FAILED" },
        vs_pet.max_abs_error
    );
    println!("  relaxations:  {}", solver.relaxation_count());
    if !vs_ref.is_match() || !vs_pet.is_match() {
        eprintln!("[RUN] aborting: distance mismatch");
        std::process::exit(1);
    }

    let mut dijkstra_times = Vec::with_capacity(cfg.num_runs);
    let mut petgraph_times = Vec::with_capacity(cfg.num_runs);
    let mut solver_times = Vec::with_capacity(cfg.num_runs);

    for run in 0..cfg.num_runs {
        let (_, d_ms) = time_ms(|| dijkstra(&g, cfg.source));
        let (_, p_ms) = time_ms(|| dijkstra_petgraph(&g, cfg.source));
        let (_, s_ms) = time_ms(|| solver.solve(cfg.source));
        dijkstra_times.push(d_ms);
        petgraph_times.push(p_ms);
        solver_times.push(s_ms);
        eprintln!(
            "[RUN] {}/{}: dijkstra {d_ms:.2} ms, petgraph {p_ms:.2} ms, frontier {s_ms:.2} ms",
            run + 1,
            cfg.num_runs
        );
    }

    let d_stats = RunStats::compute(&dijkstra_times);
    let p_stats = RunStats::compute(&petgraph_times);
    let s_stats = RunStats::compute(&solver_times);

    println!("\nTimings (ms):");
    println!(
        "{:<20}{:>12}{:>12}{:>12}{:>12}{:>12}",
        "algorithm", "mean", "median", "stddev", "min", "max"
    );
    print_row("dijkstra", &d_stats);
    print_row("petgraph", &p_stats);
    print_row("frontier", &s_stats);

    println!("\nSpeedup (median):");
    println!("  dijkstra / frontier = {:.3}x", d_stats.median / s_stats.median.max(1e-9));
    println!("  petgraph / frontier = {:.3}x", p_stats.median / s_stats.median.max(1e-9));

    eprintln!("[DONE]");
}
