use thiserror::Error;

#[derive(Error, Debug)]
pub enum DistributionError {
    #[error("Empty distribution spec")]
    Empty,
    #[error("Bad distribution term {0:?}: {1}")]
    BadTerm(String, &'static str),
}

/// A node-degree distribution, parsed from a spec such as `"3"` (all nodes
/// of degree 3) or `"0.5x3/0.5x6"` (half degree 3, half degree 6).
///
/// Terms keep their relative weights as written; shares are normalized when
/// the distribution is expanded into a degree sequence.
#[derive(Debug, Clone)]
pub struct Distribution {
    /// (relative weight, degree) per term.
    terms: Vec<(f64, usize)>,
    total_weight: f64,
}

impl Distribution {
    pub fn create(spec: &str) -> Result<Self, DistributionError> {
        if spec.trim().is_empty() {
            return Err(DistributionError::Empty);
        }

        let bad = |term: &str, why: &'static str| {
            DistributionError::BadTerm(term.to_string(), why)
        };

        let mut terms = Vec::new();
        let mut total_weight = 0.0;
        for term in spec.split('/') {
            let (weight, degree) = match term.split_once('x') {
                Some((w, d)) => (
                    w.trim()
                        .parse::<f64>()
                        .map_err(|_| bad(term, "proportion is not a number"))?,
                    d.trim()
                        .parse::<usize>()
                        .map_err(|_| bad(term, "degree is not an integer"))?,
                ),
                // A bare integer stands for a unit-weight term.
                None => (
                    1.0,
                    term.trim()
                        .parse::<usize>()
                        .map_err(|_| bad(term, "expected <proportion>x<degree>"))?,
                ),
            };
            if !(weight > 0.0) || degree == 0 {
                return Err(bad(term, "proportion and degree must be positive"));
            }
            total_weight += weight;
            terms.push((weight, degree));
        }

        Ok(Distribution {
            terms,
            total_weight,
        })
    }

    pub fn max_degree(&self) -> usize {
        self.terms.iter().map(|&(_, d)| d).max().unwrap_or(0)
    }

    /// Expands the distribution into an explicit degree sequence for
    /// `n_nodes` nodes.
    ///
    /// Every term gets the whole part of its proportional share; the nodes
    /// left over by truncation go to the terms with the largest fractional
    /// parts, so the sequence has exactly `n_nodes` entries.
    pub fn degree_sequence(&self, n_nodes: usize) -> Vec<usize> {
        let mut counts = Vec::with_capacity(self.terms.len());
        let mut remainders = Vec::with_capacity(self.terms.len());
        let mut assigned = 0;
        for (i, &(weight, _)) in self.terms.iter().enumerate() {
            let share = weight / self.total_weight * (n_nodes as f64);
            let whole = share as usize;
            counts.push(whole);
            remainders.push((share - whole as f64, i));
            assigned += whole;
        }

        // Stable sort: ties keep spec order, so the earlier term wins.
        remainders.sort_by(|a, b| b.0.total_cmp(&a.0));
        for &(_, i) in remainders.iter().cycle().take(n_nodes - assigned) {
            counts[i] += 1;
        }

        let mut degrees = Vec::with_capacity(n_nodes);
        for (&(_, degree), &count) in self.terms.iter().zip(counts.iter()) {
            degrees.extend(std::iter::repeat(degree).take(count));
        }
        degrees
    }
}
