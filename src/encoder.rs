//! Systematic encoder construction by Gauss-Jordan elimination over GF(2).
//!
//! The parity-check matrix is densified and row-reduced with column
//! pivoting until it reads [I | A] under a column permutation. The A block
//! transposed is the parity generator; the permutation is then rotated so
//! information columns come first and the edge list is relabeled to match,
//! establishing the convention that the first `n - m` codeword positions
//! are the information bits.

use crate::{code::Code, dense::Mod2Dense, LdpcError};
use log::{log_enabled, trace, warn, Level};

impl Code {
    /// Derives the systematic encoder for this code.
    ///
    /// On success the code's edge labels follow the information-first
    /// convention and [`encode`](Code::encode) becomes available. If the
    /// matrix turns out rank-deficient the build stops early: the generator
    /// stays empty, the edge list is left untouched, and `EncoderNotReady`
    /// is returned so the caller can inspect and retry with another code.
    pub fn create_encoder(&mut self) -> Result<(), LdpcError> {
        let m = self.checks();
        let n = self.variables();
        if n <= m {
            return Err(LdpcError::InvalidParameter(format!(
                "code must have more variables ({}) than checks ({})",
                n, m
            )));
        }

        let mut h = Mod2Dense::from_code(self)?;
        let mut perm: Vec<usize> = (0..n).collect();

        if log_enabled!(Level::Trace) {
            trace!("parity-check matrix before reduction:\n{}", h.dump());
        }

        for i in 0..m {
            // Any 1 in the untouched submatrix H[i.., perm[i..]] can serve
            // as the pivot.
            let mut pivot = None;
            'search: for p in i..n {
                let col = perm[p];
                for r in i..m {
                    if h.get(r, col) {
                        pivot = Some((r, p));
                        break 'search;
                    }
                }
            }

            let (pivot_row, pivot_pos) = match pivot {
                Some(found) => found,
                None => {
                    warn!(
                        "parity-check matrix is rank-deficient: effective rank {} < {}",
                        i, m
                    );
                    return Err(LdpcError::EncoderNotReady);
                }
            };

            perm.swap(i, pivot_pos);
            h.swap_rows(i, pivot_row);

            let col = perm[i];
            for j in 0..m {
                if j != i && h.get(j, col) {
                    h.xor_rows(j, i);
                }
            }

            if log_enabled!(Level::Trace) {
                trace!("after eliminating column {} (row {}):\n{}", col, i, h.dump());
            }
        }

        // Under perm the matrix now reads [I | A]; the parity generator is
        // A transposed: generator[j][i] = H[i][perm[m + j]].
        let k = n - m;
        let mut generator = Mod2Dense::allocate(k, m)?;
        for j in 0..k {
            let col = perm[m + j];
            for i in 0..m {
                if h.get(i, col) {
                    generator.set(j, i, true)?;
                }
            }
        }

        // Information columns first, parity columns last.
        let mut rotated = Vec::with_capacity(n);
        rotated.extend_from_slice(&perm[m..]);
        rotated.extend_from_slice(&perm[..m]);

        // Relabel edges through the inverse permutation so the stored graph
        // agrees with the codeword layout.
        let mut invperm = vec![0usize; n];
        for (pos, &col) in rotated.iter().enumerate() {
            invperm[col] = pos;
        }
        for v in &mut self.var {
            *v = invperm[*v];
        }

        self.parity_generator = Some(generator);
        self.perm = Some(rotated);
        Ok(())
    }

    /// Encodes `info` into a systematic codeword.
    ///
    /// The first `n - m` codeword bits are the information bits verbatim;
    /// each parity bit is the XOR of the generator rows selected by the set
    /// information bits.
    pub fn encode(&self, info: &[u8]) -> Result<Vec<u8>, LdpcError> {
        let generator = self
            .parity_generator
            .as_ref()
            .ok_or(LdpcError::EncoderNotReady)?;

        let k = self.info_bits();
        let m = self.checks();
        if info.len() != k {
            return Err(LdpcError::InvalidParameter(format!(
                "info length {} does not match code dimension {}",
                info.len(),
                k
            )));
        }

        let mut cw = vec![0u8; self.variables()];
        for (j, &bit) in info.iter().enumerate() {
            if bit & 1 != 0 {
                cw[j] = 1;
                for i in 0..m {
                    if generator.get(j, i) {
                        cw[k + i] ^= 1;
                    }
                }
            }
        }
        Ok(cw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Random matrices are occasionally rank-deficient; scan seeds until one
    /// admits an encoder.
    fn built_random_code(m: usize, n: usize, dc: usize, dv: usize) -> Code {
        for seed in 0..100 {
            let mut code = Code::random(m, n, &vec![dc; m], &vec![dv; n], seed).unwrap();
            if code.create_encoder().is_ok() {
                return code;
            }
        }
        panic!("no full-rank ({}, {}) code in 100 seeds", m, n);
    }

    #[test]
    fn test_encode_requires_built_encoder() {
        let code = Code::from_edges(2, 4, &[(0, 0), (0, 1), (1, 2), (1, 3)]).unwrap();
        match code.encode(&[0, 0]) {
            Err(LdpcError::EncoderNotReady) => {}
            other => panic!("expected EncoderNotReady, got {:?}", other),
        }
    }

    #[test]
    fn test_small_full_rank_code() {
        let mut code = Code::from_edges(2, 4, &[(0, 0), (0, 1), (1, 1), (1, 2), (1, 3)]).unwrap();
        code.create_encoder().unwrap();
        assert!(code.parity_generator().is_some());

        for u in 0..4u8 {
            let info = [u & 1, (u >> 1) & 1];
            let cw = code.encode(&info).unwrap();
            assert_eq!(&cw[..2], &info, "systematic prefix");
            assert_eq!(code.count_unsatisfied_checks(&cw).unwrap(), 0);
        }
    }

    #[test]
    fn test_encoder_commutes_with_h() {
        let code = built_random_code(10, 20, 6, 3);

        let k = code.info_bits();
        for trial in 0..k {
            let mut info = vec![0u8; k];
            info[trial] = 1;
            info[(trial + 3) % k] ^= 1;
            let cw = code.encode(&info).unwrap();
            assert_eq!(&cw[..k], info.as_slice());
            assert_eq!(code.count_unsatisfied_checks(&cw).unwrap(), 0);
        }
    }

    #[test]
    fn test_encode_linearity() {
        let code = built_random_code(10, 20, 6, 3);
        let k = code.info_bits();

        let u1: Vec<u8> = (0..k).map(|j| (j % 2) as u8).collect();
        let u2: Vec<u8> = (0..k).map(|j| (j % 3 == 0) as u8).collect();
        let sum: Vec<u8> = u1.iter().zip(u2.iter()).map(|(a, b)| a ^ b).collect();

        let c1 = code.encode(&u1).unwrap();
        let c2 = code.encode(&u2).unwrap();
        let cs = code.encode(&sum).unwrap();
        let xor: Vec<u8> = c1.iter().zip(c2.iter()).map(|(a, b)| a ^ b).collect();
        assert_eq!(cs, xor);
    }

    #[test]
    fn test_rank_deficient_leaves_code_observable() {
        // Checks 0 and 1 see the same pair of variables, so the matrix has
        // rank 3 < 4.
        let mut code = Code::from_edges(
            4,
            8,
            &[
                (0, 0),
                (0, 1),
                (1, 0),
                (1, 1),
                (2, 2),
                (2, 3),
                (3, 4),
                (3, 5),
            ],
        )
        .unwrap();
        let vars_before = code.edge_vars().to_vec();

        match code.create_encoder() {
            Err(LdpcError::EncoderNotReady) => {}
            other => panic!("expected EncoderNotReady, got {:?}", other),
        }
        assert!(code.parity_generator().is_none());
        assert!(code.column_permutation().is_none());
        assert_eq!(code.edge_vars(), vars_before.as_slice());

        match code.encode(&[0, 0, 0, 0]) {
            Err(LdpcError::EncoderNotReady) => {}
            other => panic!("expected EncoderNotReady, got {:?}", other),
        }
    }
}
