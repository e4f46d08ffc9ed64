use crate::{dense::Mod2Dense, LdpcError};
use log::debug;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

/// Maximum number of stub-matching attempts before construction gives up.
const MAX_CONSTRUCTION_ATTEMPTS: usize = 10_000;

/// A binary LDPC code held as its Tanner graph.
///
/// The graph is stored as two parallel edge arrays: edge `i` connects check
/// node `chk[i]` to variable node `var[i]`. A (check, variable) pair appears
/// at most once; self-loops cannot occur in a bipartite graph.
///
/// After a successful [`create_encoder`](Code::create_encoder) call the edge
/// list is relabeled so that the first `n - m` codeword positions carry the
/// information bits and the last `m` the parity bits, and `parity_generator`
/// holds the dense block used by [`encode`](Code::encode).
#[derive(Debug, Clone)]
pub struct Code {
    pub(crate) m: usize,
    pub(crate) n: usize,
    pub(crate) chk: Vec<usize>,
    pub(crate) var: Vec<usize>,
    /// (n - m) x m parity block; row j gives the parity bits toggled by
    /// information bit j. Populated only by a successful encoder build.
    pub(crate) parity_generator: Option<Mod2Dense>,
    /// Column permutation applied by the encoder build: position j of a
    /// codeword corresponds to column perm[j] of the original matrix.
    pub(crate) perm: Option<Vec<usize>>,
}

impl Code {
    /// Builds a code from an explicit edge list.
    pub fn from_edges(
        m: usize,
        n: usize,
        edges: &[(usize, usize)],
    ) -> Result<Self, LdpcError> {
        if m == 0 || n == 0 {
            return Err(LdpcError::InvalidParameter(
                "dimensions must be > 0".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(edges.len());
        let mut chk = Vec::with_capacity(edges.len());
        let mut var = Vec::with_capacity(edges.len());
        for &(c, v) in edges {
            if c >= m || v >= n {
                return Err(LdpcError::InvalidParameter(format!(
                    "edge ({}, {}) out of range for {} checks, {} variables",
                    c, v, m, n
                )));
            }
            if !seen.insert((c, v)) {
                return Err(LdpcError::InvalidParameter(format!(
                    "duplicate edge ({}, {})",
                    c, v
                )));
            }
            chk.push(c);
            var.push(v);
        }
        Ok(Self {
            m,
            n,
            chk,
            var,
            parity_generator: None,
            perm: None,
        })
    }

    /// Builds a random code by configuration-model stub matching.
    ///
    /// `check_degrees[i]` gives the degree of check `i` and `var_degrees[j]`
    /// the degree of variable `j`; the two sequences must sum to the same
    /// edge count. Stub pairings that repeat an edge are rejected and redrawn
    /// up to a fixed attempt cap; the resulting graph is simple and matches
    /// the requested degrees exactly.
    pub fn random(
        m: usize,
        n: usize,
        check_degrees: &[usize],
        var_degrees: &[usize],
        seed: u64,
    ) -> Result<Self, LdpcError> {
        if m == 0 || n == 0 {
            return Err(LdpcError::InvalidParameter(
                "dimensions must be > 0".to_string(),
            ));
        }
        if check_degrees.len() != m || var_degrees.len() != n {
            return Err(LdpcError::InvalidParameter(format!(
                "degree sequences must have lengths {} and {}",
                m, n
            )));
        }
        let n_edges: usize = check_degrees.iter().sum();
        if n_edges != var_degrees.iter().sum::<usize>() {
            return Err(LdpcError::InvalidParameter(
                "check and variable degree sums differ".to_string(),
            ));
        }
        if check_degrees.iter().any(|&d| d > n) || var_degrees.iter().any(|&d| d > m) {
            return Err(LdpcError::InvalidParameter(
                "a node degree exceeds the opposite side of the graph".to_string(),
            ));
        }

        // One stub per half-edge, repeated per node degree.
        let mut chk_stubs = Vec::with_capacity(n_edges);
        for (i, &d) in check_degrees.iter().enumerate() {
            chk_stubs.extend(std::iter::repeat(i).take(d));
        }
        let mut var_stubs = Vec::with_capacity(n_edges);
        for (j, &d) in var_degrees.iter().enumerate() {
            var_stubs.extend(std::iter::repeat(j).take(d));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut seen = HashSet::with_capacity(n_edges);

        for attempt in 0..MAX_CONSTRUCTION_ATTEMPTS {
            chk_stubs.shuffle(&mut rng);
            var_stubs.shuffle(&mut rng);

            seen.clear();
            let simple = chk_stubs
                .iter()
                .zip(var_stubs.iter())
                .all(|(&c, &v)| seen.insert((c, v)));

            if simple {
                if attempt > 0 {
                    debug!("simple pairing found after {} rejected attempts", attempt);
                }
                return Ok(Self {
                    m,
                    n,
                    chk: chk_stubs,
                    var: var_stubs,
                    parity_generator: None,
                    perm: None,
                });
            }
        }

        Err(LdpcError::Construction(format!(
            "no simple pairing within {} attempts for {} checks, {} variables",
            MAX_CONSTRUCTION_ATTEMPTS, m, n
        )))
    }

    /// Like [`random`](Code::random), with degrees drawn from parsed
    /// distributions instead of explicit sequences.
    ///
    /// The expanded sequences must agree on the edge count; pick proportions
    /// compatible with the aspect ratio, e.g. checks `"6"` against variables
    /// `"3"` when `n = 2 m`.
    pub fn random_with_distribution(
        m: usize,
        n: usize,
        check_dist: &crate::Distribution,
        var_dist: &crate::Distribution,
        seed: u64,
    ) -> Result<Self, LdpcError> {
        let check_degrees = check_dist.degree_sequence(m);
        let var_degrees = var_dist.degree_sequence(n);
        Self::random(m, n, &check_degrees, &var_degrees, seed)
    }

    pub fn checks(&self) -> usize {
        self.m
    }
    pub fn variables(&self) -> usize {
        self.n
    }
    pub fn info_bits(&self) -> usize {
        self.n - self.m
    }
    pub fn n_edges(&self) -> usize {
        self.chk.len()
    }
    pub fn rate(&self) -> f64 {
        (self.info_bits() as f64) / (self.n as f64)
    }

    /// Check index of every edge, parallel to [`edge_vars`](Code::edge_vars).
    pub fn edge_checks(&self) -> &[usize] {
        &self.chk
    }
    /// Variable index of every edge.
    pub fn edge_vars(&self) -> &[usize] {
        &self.var
    }

    pub fn parity_generator(&self) -> Option<&Mod2Dense> {
        self.parity_generator.as_ref()
    }

    /// Column permutation installed by the encoder build, if any.
    pub fn column_permutation(&self) -> Option<&[usize]> {
        self.perm.as_deref()
    }

    /// Reorders the edge list lexicographically by (check, variable).
    ///
    /// The sort is stable and idempotent; it changes the edge order, never
    /// the represented graph, so two constructions of the same code compare
    /// equal edge-for-edge after both are sorted.
    pub fn sort_edges(&mut self) {
        let mut edges: Vec<(usize, usize)> = self
            .chk
            .iter()
            .copied()
            .zip(self.var.iter().copied())
            .collect();
        edges.sort();
        for (i, (c, v)) in edges.into_iter().enumerate() {
            self.chk[i] = c;
            self.var[i] = v;
        }
    }

    /// Number of edges incident to each check node.
    pub fn check_degrees(&self) -> Vec<usize> {
        let mut deg = vec![0; self.m];
        for &c in &self.chk {
            deg[c] += 1;
        }
        deg
    }

    /// Number of edges incident to each variable node.
    pub fn var_degrees(&self) -> Vec<usize> {
        let mut deg = vec![0; self.n];
        for &v in &self.var {
            deg[v] += 1;
        }
        deg
    }

    /// Counts parity checks a codeword fails to satisfy.
    pub fn count_unsatisfied_checks(&self, cw: &[u8]) -> Result<usize, LdpcError> {
        if cw.len() != self.n {
            return Err(LdpcError::InvalidParameter(format!(
                "codeword length {} does not match code length {}",
                cw.len(),
                self.n
            )));
        }
        let mut syndrome = vec![0u8; self.m];
        for (&c, &v) in self.chk.iter().zip(self.var.iter()) {
            syndrome[c] ^= cw[v] & 1;
        }
        Ok(syndrome.iter().filter(|&&s| s != 0).count())
    }
}
