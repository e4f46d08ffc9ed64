//! Binary low-density parity-check (LDPC) codes for forward error correction.
//!
//! The crate builds sparse parity-check codes as Tanner-graph edge lists,
//! serializes them in the standard alist text format, derives systematic
//! encoders by Gauss-Jordan elimination over GF(2), and decodes received
//! log-likelihood ratios with flooded belief propagation (Sum-Product or
//! offset Min-Sum check rules).

pub mod alist;
pub mod code;
pub mod coder;
pub mod decoder;
pub mod dense;
pub mod distribution;
pub mod encoder;

// Re-export main types
pub use alist::AlistDialect;
pub use code::Code;
pub use coder::{Coder, CoderOptions, DecodeOutput, LdpcCoder};
pub use decoder::{CheckRule, DecodeReport, Decoder, DecoderOptions};
pub use dense::{DenseError, Mod2Dense};
pub use distribution::{Distribution, DistributionError};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LdpcError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Alist format error: {0}")]
    Format(String),
    #[error("Construction error: {0}")]
    Construction(String),
    #[error("Encoder not ready: create_encoder has not completed successfully")]
    EncoderNotReady,
    #[error("Unsupported code: k={k}, n={n}")]
    UnsupportedCode { k: usize, n: usize },
    #[error("Distribution error: {0}")]
    Distribution(#[from] distribution::DistributionError),
    #[error("Dense matrix error: {0}")]
    DenseMatrix(#[from] dense::DenseError),
}
