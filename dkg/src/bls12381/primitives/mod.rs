//! Operations over the BLS12-381 scalar field.
//!
//! # Acknowledgements
//!
//! _The following crates were used as a reference when implementing this crate. If code is very similar
//! to the reference, it is accompanied by a comment and link._
//!
//! * <https://github.com/celo-org/celo-threshold-bls-rs>: Operations over the BLS12-381 scalar field and GJKR99.
//! * <https://github.com/filecoin-project/blstrs> + <https://github.com/MystenLabs/fastcrypto>: Implementing operations over
//!   the BLS12-381 scalar field with <https://github.com/supranational/blst>.
//!
//! # Example
//!
//! ```rust
//! use commonware_dkg::bls12381::{
//!     dkg::{ops::{generate_polynomial, generate_shares}, Config},
//!     primitives::ops::{partial_sign_message, partial_verify_message, threshold_signature_recover, verify_message},
//! };
//! use rand::rngs::OsRng;
//!
//! // Configure threshold (any `t + 1` of `n` shares can sign)
//! let config = Config::new(5, 2).unwrap();
//!
//! // Generate a polynomial, its commitment, and shares
//! let (polynomial, commitment) = generate_polynomial(&mut OsRng, &config).unwrap();
//! let shares = generate_shares(&config, &polynomial).unwrap();
//!
//! // Generate partial signatures from shares
//! let namespace = Some(&b"demo"[..]);
//! let message = b"hello world";
//! let partials: Vec<_> = shares.iter().map(|s| partial_sign_message(s, namespace, message)).collect();
//!
//! // Verify partial signatures
//! for p in &partials {
//!     partial_verify_message(commitment.public(), namespace, message, p).expect("signature should be valid");
//! }
//!
//! // Recover the threshold signature
//! let threshold_sig = threshold_signature_recover(&config, &partials).unwrap();
//!
//! // Verify threshold signature
//! let threshold_pub = commitment.public().constant();
//! verify_message(threshold_pub, namespace, message, &threshold_sig).expect("signature should be valid");
//! ```

pub mod group;
pub mod lagrange;
pub mod ops;
pub mod poly;

use thiserror::Error;

/// Errors that can occur when working with BLS12-381 primitives.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("not enough partial signatures: {0}/{1}")]
    NotEnoughPartialSignatures(usize, usize),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid recovery")]
    InvalidRecovery,
    #[error("no inverse")]
    NoInverse,
    #[error("duplicate polynomial evaluation point: {0}")]
    DuplicateIndex(u32),
    #[error("invalid index: {0}")]
    InvalidIndex(u32),
}
