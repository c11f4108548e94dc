//! Single-source shortest paths on directed graphs with non-negative real
//! weights, via bounded multi-source frontier recursion in
//! O(m (log n)^(2/3)) time. Ships the solver, a reference Dijkstra used for
//! cross-validation, Matrix-Market loading, and seeded graph generators.

pub mod alg;
pub mod compare;
pub mod graph;

pub use alg::bmssp::{SsspResult, SsspSolver};
pub use alg::dijkstra::{dijkstra, dijkstra_petgraph, DijkstraResult};
pub use graph::csr::CsrGraph;
pub use graph::mtx::{parse_mtx, MtxInfo};
