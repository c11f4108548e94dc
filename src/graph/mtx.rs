use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::csr::CsrGraph;

#[derive(Debug, Clone)]
pub struct MtxInfo {
    pub nodes: usize,
    pub edges: usize,
    pub symmetric: bool,
    pub pattern: bool,
}

/// Parse a Matrix Market coordinate file into a directed graph.
///
/// Indices are 1-based in the file. Symmetric files emit both directions for
/// off-diagonal entries. Pattern files carry no weights; every edge gets 1.0.
/// Zero weights become 1.0 and negative weights their absolute value, so the
/// result is always usable as a non-negative distance graph.
pub fn parse_mtx(path: &Path) -> Result<(CsrGraph, MtxInfo), String> {
    let f = File::open(path).map_err(|e| format!("open {:?}: {e}", path))?;
    parse_mtx_reader(BufReader::new(f))
}

pub fn parse_mtx_reader<R: BufRead>(reader: R) -> Result<(CsrGraph, MtxInfo), String> {
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(l) => l.map_err(|e| format!("read header: {e}"))?,
        None => return Err("empty mtx file".into()),
    };
    if !header.starts_with("%%MatrixMarket") {
        return Err(format!("invalid mtx header: {header}"));
    }
    let header_lower = header.to_ascii_lowercase();
    let symmetric = header_lower.contains("symmetric");
    let pattern = header_lower.contains("pattern");

    // Skip comments up to the dimension line.
    let dims = loop {
        match lines.next() {
            Some(l) => {
                let l = l.map_err(|e| format!("read dimensions: {e}"))?;
                if l.trim().is_empty() || l.starts_with('%') {
                    continue;
                }
                break l;
            }
            None => return Err("mtx file has no dimension line".into()),
        }
    };

    let mut it = dims.split_whitespace();
    let rows: usize = it
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| format!("invalid dimension line: {dims}"))?;
    let cols: usize = it
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| format!("invalid dimension line: {dims}"))?;
    let nnz: usize = it
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| format!("invalid dimension line: {dims}"))?;

    let nodes = rows.max(cols);
    let mut edges: Vec<(u32, u32, f64)> = Vec::with_capacity(if symmetric { nnz * 2 } else { nnz });

    for line in lines {
        let line = line.map_err(|e| format!("read entry: {e}"))?;
        let s = line.trim();
        if s.is_empty() || s.starts_with('%') {
            continue;
        }

        let mut it = s.split_whitespace();
        let (u, v) = match (
            it.next().and_then(|t| t.parse::<i64>().ok()),
            it.next().and_then(|t| t.parse::<i64>().ok()),
        ) {
            (Some(u), Some(v)) => (u - 1, v - 1),
            _ => continue, // skip malformed lines
        };

        if u < 0 || u >= nodes as i64 || v < 0 || v >= nodes as i64 {
            continue; // skip out-of-range entries
        }
        let (u, v) = (u as u32, v as u32);

        let mut w = 1.0;
        if !pattern {
            if let Some(parsed) = it.next().and_then(|t| t.parse::<f64>().ok()) {
                w = parsed;
            }
            if w < 0.0 {
                w = -w;
            }
            if w == 0.0 {
                w = 1.0;
            }
        }

        edges.push((u, v, w));
        if symmetric && u != v {
            edges.push((v, u, w));
        }
    }

    let info = MtxInfo {
        nodes,
        edges: edges.len(),
        symmetric,
        pattern,
    };
    Ok((CsrGraph::from_edges(nodes, &edges), info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse_str(s: &str) -> (CsrGraph, MtxInfo) {
        parse_mtx_reader(Cursor::new(s)).expect("parse failed")
    }

    #[test]
    fn parses_general_real_file() {
        let (g, info) = parse_str(
            "%%MatrixMarket matrix coordinate real general\n\
             % a comment\n\
             3 3 2\n\
             1 2 1.5\n\
             2 3 2.0\n",
        );
        assert_eq!(info.nodes, 3);
        assert_eq!(info.edges, 2);
        assert!(!info.symmetric);
        assert_eq!(g.out_edges(0).collect::<Vec<_>>(), vec![(1, 1.5)]);
        assert_eq!(g.out_edges(1).collect::<Vec<_>>(), vec![(2, 2.0)]);
    }

    #[test]
    fn symmetric_emits_both_directions() {
        let (g, info) = parse_str(
            "%%MatrixMarket matrix coordinate real symmetric\n\
             2 2 2\n\
             1 2 3.0\n\
             2 2 4.0\n",
        );
        assert!(info.symmetric);
        // Off-diagonal mirrored, diagonal (self-loop) not duplicated.
        assert_eq!(info.edges, 3);
        assert_eq!(g.out_edges(0).collect::<Vec<_>>(), vec![(1, 3.0)]);
        assert_eq!(g.out_edges(1).collect::<Vec<_>>(), vec![(0, 3.0), (1, 4.0)]);
    }

    #[test]
    fn pattern_defaults_to_unit_weights() {
        let (g, info) = parse_str(
            "%%MatrixMarket matrix coordinate pattern general\n\
             2 2 1\n\
             1 2\n",
        );
        assert!(info.pattern);
        assert_eq!(g.out_edges(0).collect::<Vec<_>>(), vec![(1, 1.0)]);
    }

    #[test]
    fn zero_and_negative_weights_are_normalized() {
        let (g, _) = parse_str(
            "%%MatrixMarket matrix coordinate real general\n\
             3 3 2\n\
             1 2 0\n\
             2 3 -2.5\n",
        );
        assert_eq!(g.out_edges(0).collect::<Vec<_>>(), vec![(1, 1.0)]);
        assert_eq!(g.out_edges(1).collect::<Vec<_>>(), vec![(2, 2.5)]);
    }

    #[test]
    fn missing_weight_defaults_to_one() {
        let (g, _) = parse_str(
            "%%MatrixMarket matrix coordinate real general\n\
             2 2 1\n\
             1 2\n",
        );
        assert_eq!(g.out_edges(0).collect::<Vec<_>>(), vec![(1, 1.0)]);
    }

    #[test]
    fn malformed_and_out_of_range_lines_are_skipped() {
        let (g, info) = parse_str(
            "%%MatrixMarket matrix coordinate real general\n\
             2 2 3\n\
             not an entry\n\
             5 1 1.0\n\
             1 2 1.0\n",
        );
        assert_eq!(info.edges, 1);
        assert_eq!(g.m(), 1);
    }

    #[test]
    fn rejects_bad_header() {
        let err = parse_mtx_reader(Cursor::new("garbage\n1 1 0\n")).unwrap_err();
        assert!(err.contains("header"));
    }
}
