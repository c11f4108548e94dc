use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct DistanceComparison {
    pub mismatches: usize,
    pub max_abs_error: f64,
    pub reference_reachable: usize,
    pub candidate_reachable: usize,
}

impl DistanceComparison {
    pub fn is_match(&self) -> bool {
        self.mismatches == 0
    }
}

/// Compare a candidate distance array against a reference one. Entries count
/// as mismatched when both are finite and differ by more than `eps`, or when
/// exactly one of them is finite. The first few mismatches are printed.
pub fn compare_distances(reference: &[f64], candidate: &[f64], eps: f64) -> DistanceComparison {
    assert_eq!(reference.len(), candidate.len(), "distance arrays differ in length");

    let mut mismatches = 0usize;
    let mut max_abs_error = 0.0f64;
    let mut reference_reachable = 0usize;
    let mut candidate_reachable = 0usize;

    for i in 0..reference.len() {
        let r = reference[i];
        let c = candidate[i];
        if r.is_finite() {
            reference_reachable += 1;
        }
        if c.is_finite() {
            candidate_reachable += 1;
        }

        let bad = match (r.is_finite(), c.is_finite()) {
            (true, true) => {
                let err = (r - c).abs();
                max_abs_error = max_abs_error.max(err);
                err > eps
            }
            (false, false) => false,
            _ => true,
        };

        if bad {
            mismatches += 1;
            if mismatches <= 10 {
                eprintln!("[compare] idx={i} reference={r} candidate={c}");
            }
        }
    }

    DistanceComparison {
        mismatches,
        max_abs_error,
        reference_reachable,
        candidate_reachable,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunStats {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl RunStats {
    pub fn compute(times: &[f64]) -> RunStats {
        if times.is_empty() {
            return RunStats { mean: f64::NAN, median: f64::NAN, std_dev: f64::NAN, min: f64::NAN, max: f64::NAN };
        }

        let mut sorted = times.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = sorted[n / 2];
        let var = sorted.iter().map(|t| (t - mean) * (t - mean)).sum::<f64>() / n as f64;

        RunStats {
            mean,
            median,
            std_dev: var.sqrt(),
            min: sorted[0],
            max: sorted[n - 1],
        }
    }
}
