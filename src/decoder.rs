//! Flooded belief-propagation decoding over the Tanner graph edge list.
//!
//! Each decode call passes messages along every edge in both directions:
//! check-node updates use either the exact tanh-product Sum-Product rule or
//! the offset Min-Sum approximation, variable-node updates accumulate the
//! channel prior with all incoming check messages and subtract the edge's
//! own contribution to stay extrinsic. Iteration stops early once the
//! check-rule termination test holds; the reported flag is always recomputed
//! from the hard-decision syndrome of the posterior LLRs.

use crate::code::Code;

/// Check-node update rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckRule {
    /// Exact belief propagation via tanh/atanh.
    SumProduct,
    /// Signed two-minima approximation with subtractive offset correction.
    MinSum,
}

/// Decoder tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct DecoderOptions {
    pub rule: CheckRule,
    /// Subtractive correction applied to Min-Sum magnitudes.
    pub min_sum_offset: f32,
    /// Lower clip bound on message magnitudes; keeps tanh away from zero.
    pub min_llr: f32,
    /// Upper clip bound on message magnitudes; keeps atanh away from one.
    pub max_llr: f32,
    /// External scale applied to priors and un-applied on outgoing messages.
    pub bit_node_scale: f32,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            rule: CheckRule::SumProduct,
            min_sum_offset: 0.3,
            min_llr: 25.0 / 32768.0,
            max_llr: 17.0,
            bit_node_scale: 1.0,
        }
    }
}

/// Outcome of one decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeReport {
    /// True when the posterior hard decisions satisfy every parity check.
    pub converged: bool,
    /// Full message-passing rounds completed.
    pub iterations: usize,
}

/// A belief-propagation decoder with preallocated message buffers.
///
/// The buffers are sized for one code at construction; decoding never
/// allocates. A `Decoder` is single-use at a time, but any number of
/// decoders may work on the same immutable [`Code`] concurrently.
pub struct Decoder {
    options: DecoderOptions,
    var_to_chk: Vec<f32>,
    chk_to_var: Vec<f32>,
    var_accum: Vec<f32>,
    chk_prod: Vec<f64>,
    chk_sign: Vec<bool>,
    chk_min1: Vec<f32>,
    chk_min2: Vec<f32>,
}

impl Decoder {
    pub fn new(code: &Code, options: DecoderOptions) -> Self {
        let e = code.n_edges();
        let m = code.checks();
        Self {
            options,
            var_to_chk: vec![0.0; e],
            chk_to_var: vec![0.0; e],
            var_accum: vec![0.0; code.variables()],
            chk_prod: vec![1.0; m],
            chk_sign: vec![false; m],
            chk_min1: vec![0.0; m],
            chk_min2: vec![0.0; m],
        }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Runs up to `max_iter` flooded iterations and writes the posterior
    /// LLRs into `llr_out`.
    ///
    /// Decoding itself cannot fail: when no codeword is found within the
    /// iteration budget the report simply carries `converged = false`.
    pub fn decode(
        &mut self,
        code: &Code,
        llr_in: &[f32],
        max_iter: usize,
        llr_out: &mut [f32],
    ) -> DecodeReport {
        let n = code.variables();
        let e = code.n_edges();
        assert_eq!(llr_in.len(), n, "llr_in length must match code length");
        assert_eq!(llr_out.len(), n, "llr_out length must match code length");
        assert_eq!(
            self.var_to_chk.len(),
            e,
            "decoder was built for a different code"
        );

        let chk = code.edge_checks();
        let var = code.edge_vars();
        let scale = self.options.bit_node_scale;

        for (msg, &v) in self.var_to_chk.iter_mut().zip(var.iter()) {
            *msg = llr_in[v];
        }

        let mut iterations = 0;
        for iter in 0..max_iter {
            let term = match self.options.rule {
                CheckRule::SumProduct => self.check_update_sum_product(chk),
                CheckRule::MinSum => self.check_update_min_sum(chk),
            };

            if iter > 0 && term {
                break;
            }
            iterations = iter + 1;

            for (accum, &prior) in self.var_accum.iter_mut().zip(llr_in.iter()) {
                *accum = prior / scale;
            }
            for (&msg, &v) in self.chk_to_var.iter().zip(var.iter()) {
                self.var_accum[v] += msg;
            }
            for (i, msg) in self.var_to_chk.iter_mut().enumerate() {
                *msg = scale * (self.var_accum[var[i]] - self.chk_to_var[i]);
            }
        }

        llr_out.copy_from_slice(&self.var_accum);
        DecodeReport {
            converged: self.hard_syndrome_satisfied(code, llr_out),
            iterations,
        }
    }

    /// True syndrome test on posterior LLRs; an exactly-zero LLR carries no
    /// decision and counts as failure.
    fn hard_syndrome_satisfied(&mut self, code: &Code, llrs: &[f32]) -> bool {
        if llrs.iter().any(|&x| x == 0.0) {
            return false;
        }
        self.chk_sign.fill(false);
        for (&c, &v) in code.edge_checks().iter().zip(code.edge_vars().iter()) {
            if llrs[v] < 0.0 {
                self.chk_sign[c] = !self.chk_sign[c];
            }
        }
        self.chk_sign.iter().all(|&s| !s)
    }

    /// Tanh-product check update. Returns the early-termination test: every
    /// check's product of incoming tanh values is positive.
    fn check_update_sum_product(&mut self, chk: &[usize]) -> bool {
        let min_llr = self.options.min_llr;
        let max_llr = self.options.max_llr;

        for msg in self.var_to_chk.iter_mut() {
            let mag = msg.abs().clamp(min_llr, max_llr);
            *msg = if *msg < 0.0 { -mag } else { mag };
        }

        // Products carry up to max-degree factors near one, so they are
        // taken in f64; a single f32 tanh at max_llr already rounds to 1.0.
        self.chk_prod.fill(1.0);
        for (i, &c) in chk.iter().enumerate() {
            self.chk_prod[c] *= (f64::from(self.var_to_chk[i]) / 2.0).tanh();
        }

        for (i, &c) in chk.iter().enumerate() {
            let own = (f64::from(self.var_to_chk[i]) / 2.0).tanh();
            let extrinsic = 2.0 * (self.chk_prod[c] / own).atanh();
            self.chk_to_var[i] = (extrinsic as f32).clamp(-max_llr, max_llr);
        }

        self.chk_prod.iter().all(|&p| p > 0.0)
    }

    /// Offset Min-Sum check update. Returns the early-termination test:
    /// every check's sign parity is even.
    fn check_update_min_sum(&mut self, chk: &[usize]) -> bool {
        let max_llr = self.options.max_llr;
        let offset = self.options.min_sum_offset;

        self.chk_sign.fill(false);
        self.chk_min1.fill(max_llr);
        self.chk_min2.fill(max_llr);

        for (i, &c) in chk.iter().enumerate() {
            let msg = self.var_to_chk[i];
            if msg < 0.0 {
                self.chk_sign[c] = !self.chk_sign[c];
            }
            let mag = msg.abs();
            if mag < self.chk_min1[c] {
                self.chk_min2[c] = self.chk_min1[c];
                self.chk_min1[c] = mag;
            } else if mag < self.chk_min2[c] {
                self.chk_min2[c] = mag;
            }
        }

        for (i, &c) in chk.iter().enumerate() {
            let msg = self.var_to_chk[i];
            // The edge's own magnitude is excluded: if it is the minimum the
            // second minimum speaks for the others.
            let mag = if msg.abs() == self.chk_min1[c] {
                self.chk_min2[c]
            } else {
                self.chk_min1[c]
            };
            let mag = (mag - offset).max(0.0);
            let negative = self.chk_sign[c] ^ (msg < 0.0);
            self.chk_to_var[i] = if negative { -mag } else { mag };
        }

        !self.chk_sign.iter().any(|&s| s)
    }
}
