//! Encoder/decoder facade for test harnesses.
//!
//! A [`Coder`] wraps code construction, the on-disk code cache, the LLR
//! quantizer convention, and the encode/decode round into one object so a
//! sweep driver only deals in bits and integer LLRs. The concrete
//! [`LdpcCoder`] owns its [`Code`] and [`Decoder`]; there is no shared
//! module state.

use crate::{
    alist, code::Code, decoder::Decoder, AlistDialect, DecoderOptions, LdpcError,
};
use log::{debug, info, warn};
use std::fs;
use std::path::PathBuf;

/// Float LLRs are quantized as `round(x * 32768 / 25)`, so the integer
/// representation spans ±32768 once the input is clipped to ±25.
const LLR_UNIT: f32 = 25.0 / 32768.0;

/// How many fresh constructions `init` tries before giving up on a
/// rank-deficient random code.
const MAX_INIT_ATTEMPTS: u64 = 100;

/// Facade configuration.
#[derive(Debug, Clone)]
pub struct CoderOptions {
    /// Raises the iteration cap from 20 to 50; with early termination the
    /// average latency barely moves while late convergences still land.
    pub optimize_avg_latency: bool,
    pub decoder: DecoderOptions,
    /// Directory holding cached codes, one alist per (n, k).
    pub cache_dir: PathBuf,
}

impl Default for CoderOptions {
    fn default() -> Self {
        Self {
            optimize_avg_latency: false,
            decoder: DecoderOptions::default(),
            cache_dir: PathBuf::from("codes"),
        }
    }
}

/// Result of a facade decode.
#[derive(Debug, Clone)]
pub struct DecodeOutput {
    pub codeword: Vec<u8>,
    pub info: Vec<u8>,
    /// True when the decoder's hard decisions satisfy every parity check.
    pub detected: bool,
}

/// The capability set a test harness consumes.
pub trait Coder {
    /// Prepares an [n, k] code, building or reloading it as needed.
    fn init(&mut self, k: usize, n: usize, opts: CoderOptions) -> Result<(), LdpcError>;

    /// Encodes `k` information bits into `n` codeword bits.
    fn encode(&self, info: &[u8]) -> Result<Vec<u8>, LdpcError>;

    /// Decodes `n` integer LLRs into codeword and information estimates.
    fn decode(&mut self, llr: &[i32]) -> Result<DecodeOutput, LdpcError>;

    /// Quantizes a float LLR to the integer representation fed to `decode`.
    fn llr2int(&self, llr: f32) -> i32;
}

/// LDPC-backed [`Coder`].
pub struct LdpcCoder {
    code: Option<Code>,
    decoder: Option<Decoder>,
    max_iter: usize,
    llr_buf: Vec<f32>,
    out_buf: Vec<f32>,
}

impl LdpcCoder {
    pub fn new() -> Self {
        Self {
            code: None,
            decoder: None,
            max_iter: 0,
            llr_buf: Vec::new(),
            out_buf: Vec::new(),
        }
    }

    pub fn code(&self) -> Option<&Code> {
        self.code.as_ref()
    }

    /// Regular degrees for the supported code shapes.
    fn degrees_for(k: usize, n: usize) -> Result<(usize, usize), LdpcError> {
        if n == 4 * k {
            Ok((3, 4))
        } else if n == 2 * k {
            Ok((3, 6))
        } else if 5 * k == 4 * n {
            Ok((4, 20))
        } else {
            Err(LdpcError::UnsupportedCode { k, n })
        }
    }

    fn construction_seed(n: usize, k: usize, attempt: u64) -> u64 {
        ((n as u64) << 40) ^ ((k as u64) << 16) ^ attempt
    }

    /// Constructs codes until one admits a systematic encoder, returning the
    /// code with its original labeling so it can be cached before the build
    /// relabels columns.
    fn generate(
        m: usize,
        n: usize,
        k: usize,
        var_degree: usize,
        chk_degree: usize,
    ) -> Result<Code, LdpcError> {
        for attempt in 0..MAX_INIT_ATTEMPTS {
            let seed = Self::construction_seed(n, k, attempt);
            let code = Code::random(m, n, &vec![chk_degree; m], &vec![var_degree; n], seed)?;
            let mut probe = code.clone();
            match probe.create_encoder() {
                Ok(()) => return Ok(code),
                Err(LdpcError::EncoderNotReady) => {
                    debug!(
                        "random ({}, {}) code was rank-deficient, attempt {}",
                        n, k, attempt
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Err(LdpcError::Construction(format!(
            "no full-rank ({}, {}) code within {} constructions",
            n, k, MAX_INIT_ATTEMPTS
        )))
    }
}

impl Default for LdpcCoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Coder for LdpcCoder {
    fn init(&mut self, k: usize, n: usize, opts: CoderOptions) -> Result<(), LdpcError> {
        if k == 0 || n <= k {
            return Err(LdpcError::UnsupportedCode { k, n });
        }
        let (var_degree, chk_degree) = Self::degrees_for(k, n)?;
        let m = n - k;

        let alist_path = opts.cache_dir.join(format!("ldpc_{}_{}", n, k));
        let marker_path = opts.cache_dir.join(format!("ldpc_{}_{}_g", n, k));

        let mut code = None;
        if alist_path.exists() {
            let mut cached = alist::read_alist(&alist_path)?;
            match cached.create_encoder() {
                Ok(()) => {
                    info!("loaded cached code from {}", alist_path.display());
                    if !marker_path.exists() {
                        fs::write(&marker_path, b"")?;
                    }
                    code = Some(cached);
                }
                Err(LdpcError::EncoderNotReady) => {
                    warn!(
                        "cached code {} is rank-deficient, regenerating",
                        alist_path.display()
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let code = match code {
            Some(code) => code,
            None => {
                // The cache keeps the graph with its construction-time
                // labels; the deterministic encoder build below gives every
                // run the same systematic layout.
                let mut code = Self::generate(m, n, k, var_degree, chk_degree)?;
                fs::create_dir_all(&opts.cache_dir)?;
                alist::write_alist(&code, &alist_path, AlistDialect::VariableWidth)?;
                fs::write(&marker_path, b"")?;
                info!("generated ({}, {}) code, cached at {}", n, k, alist_path.display());
                code.create_encoder()?;
                code
            }
        };

        self.max_iter = if opts.optimize_avg_latency { 50 } else { 20 };
        self.decoder = Some(Decoder::new(&code, opts.decoder));
        self.llr_buf = vec![0.0; n];
        self.out_buf = vec![0.0; n];
        self.code = Some(code);
        Ok(())
    }

    fn encode(&self, info: &[u8]) -> Result<Vec<u8>, LdpcError> {
        let code = self.code.as_ref().ok_or(LdpcError::EncoderNotReady)?;
        code.encode(info)
    }

    fn decode(&mut self, llr: &[i32]) -> Result<DecodeOutput, LdpcError> {
        let code = self.code.as_ref().ok_or(LdpcError::EncoderNotReady)?;
        let decoder = self.decoder.as_mut().ok_or(LdpcError::EncoderNotReady)?;
        if llr.len() != code.variables() {
            return Err(LdpcError::InvalidParameter(format!(
                "LLR length {} does not match code length {}",
                llr.len(),
                code.variables()
            )));
        }

        for (buf, &q) in self.llr_buf.iter_mut().zip(llr.iter()) {
            *buf = q as f32 * LLR_UNIT;
        }

        let report = decoder.decode(code, &self.llr_buf, self.max_iter, &mut self.out_buf);

        let codeword: Vec<u8> = self.out_buf.iter().map(|&x| (x <= 0.0) as u8).collect();
        let info = codeword[..code.info_bits()].to_vec();
        Ok(DecodeOutput {
            codeword,
            info,
            detected: report.converged,
        })
    }

    fn llr2int(&self, llr: f32) -> i32 {
        (llr.clamp(-25.0, 25.0) / LLR_UNIT).round() as i32
    }
}
