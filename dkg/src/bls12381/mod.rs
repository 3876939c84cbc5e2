//! Distributed Key Generation (DKG), Signatures, and Threshold Signatures over the BLS12-381 curve.
//!
//! # Features
//!
//! This crate has the following features:
//!
//! - `portable`: Enables `portable` feature on `blst` (<https://github.com/supranational/blst?tab=readme-ov-file#platform-and-language-compatibility>).
//!
//! # Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! The suite covers a full DKG run (dealing, verification, and key derivation for every
//! participant) at several concurrency levels, threshold signature recovery, and commitment
//! evaluation. Set `RUSTFLAGS="--cfg full_bench"` to include the larger participant counts.

pub mod dkg;
pub mod primitives;
