//! Distributed Key Generation (DKG) for threshold BLS signatures over BLS12-381.
//!
//! `n` participants jointly derive a group public key and a secret key share each, without any
//! party ever learning the group secret. Any `t + 1` participants can produce partial signatures
//! that combine into a signature indistinguishable from one produced by the group secret, while
//! `t` participants learn nothing about it.
//!
//! The construction is "Joint-Feldman" from "Secure Distributed Key Generation for Discrete-Log
//! Based Cryptosystems" (GJKR99): every participant deals a random polynomial of degree `t` and
//! the group secret is the sum of the constant terms. Commitments are published in both G1 (to
//! check shares) and G2 (to derive public keys), and a pairing check binds the two.
//!
//! # Overview
//!
//! The protocol has three roles: dealers, players, and an arbiter. Every participant is usually
//! both a dealer and a player. The arbiter collects commitments and complaints and can be run by
//! every participant over a replicated log or as a trusted standalone process. This crate does not
//! provide networking: each role is a state machine driven by the caller.
//!
//! ## [Dealer] Step 0: Generate Commitment and Shares
//!
//! Generate a random polynomial of degree `t`, commit to every coefficient in G1 and G2, compute
//! a Merkle root over the commitments, and evaluate a share for every participant `1..=n`.
//!
//! ## [Dealer] Step 1: Distribute Commitment and Shares
//!
//! Post the commitment, Merkle root, and encrypted shares to the arbiter. Send the commitment and
//! a share encrypted under a Diffie-Hellman key (see [channel]) to every player.
//!
//! ## [Player] Step 2: Verify Share
//!
//! Decrypt the share and check it against the dealer's G1 commitment (Feldman). If valid, send an
//! acknowledgement to the dealer. If invalid, file a [complaint::Complaint] with the arbiter, which
//! discloses the Diffie-Hellman key shared with the dealer (never the player's private key).
//!
//! ## [Arbiter] Step 3: Adjudicate and Select
//!
//! Verify every posted commitment (pairing check per coefficient) and root. Adjudicate complaints
//! against the registered encryption keys and the posted ciphertexts by recomputing the aggregated
//! commitment at the claimant's index. Disqualify faulty dealers and output the qualified set (at
//! least `t + 1` dealers).
//!
//! ## [Player] Step 4: Derive Keys
//!
//! Sum the shares of the qualified dealers into a secret key share. The group public key is the
//! sum of the qualified dealers' zero-degree G2 commitments, and the public key share of any
//! participant is the sum of the G2 commitments evaluated at its index.
//!
//! # Example
//!
//! ```rust
//! use commonware_dkg::bls12381::{
//!     dkg::{channel, Arbiter, Config, Dealer, Player},
//!     primitives::ops::{partial_sign_message, threshold_signature_recover, verify_message},
//! };
//! use rand::rngs::OsRng;
//! use std::collections::BTreeMap;
//!
//! let config = Config::new(4, 1).unwrap();
//!
//! // Each participant generates an encryption keypair
//! let keys: BTreeMap<u32, _> = config
//!     .indices()
//!     .map(|i| (i, channel::generate(&mut OsRng).unwrap()))
//!     .collect();
//! let public: BTreeMap<u32, _> = keys.iter().map(|(i, (_, pk))| (*i, pk.clone())).collect();
//!
//! // Every participant deals
//! let mut arbiter = Arbiter::new(config, public.clone()).unwrap();
//! let mut dealings = BTreeMap::new();
//! for (i, (sk, _)) in &keys {
//!     let (_, dealing) = Dealer::new(&mut OsRng, config, *i, sk, &public).unwrap();
//!     arbiter
//!         .commitment(*i, dealing.commitment.clone(), dealing.root, dealing.encrypted.clone())
//!         .unwrap();
//!     dealings.insert(*i, dealing);
//! }
//! let (output, _) = arbiter.finalize();
//! let output = output.unwrap();
//!
//! // Every participant derives its share
//! let mut partials = Vec::new();
//! for (i, (sk, _)) in keys {
//!     let mut player = Player::new(config, i, sk, public.clone()).unwrap();
//!     for (dealer, dealing) in &dealings {
//!         if *dealer == i {
//!             player.own(dealing.commitment.clone(), dealing.share).unwrap();
//!         } else {
//!             player.share(*dealer, dealing.commitment.clone(), &dealing.encrypted[&i]).unwrap();
//!         }
//!     }
//!     let result = player.finalize(&output.commitments).unwrap();
//!     partials.push(partial_sign_message(&result.share, None, b"hello"));
//! }
//!
//! // Any `t + 1` partial signatures recover the group signature
//! let signature = threshold_signature_recover(&config, &partials).unwrap();
//! verify_message(&output.public, None, b"hello", &signature).unwrap();
//! ```

pub mod arbiter;
pub use arbiter::Arbiter;
pub mod channel;
pub mod complaint;
pub mod config;
pub use config::Config;
pub mod dealer;
pub use dealer::Dealer;
pub mod merkle;
pub mod ops;
pub mod player;
pub use player::Player;
pub mod snapshot;
pub mod types;
pub use types::{Commitment, Commitments};

use crate::bls12381::primitives;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("coefficient generation failed")]
    GenerationFailure,
    #[error("commitment pair at degree {degree} is inconsistent")]
    CommitmentInconsistency { degree: u32 },
    #[error("commitment has wrong degree")]
    CommitmentWrongDegree,
    #[error("share from dealer {dealer} for index {index} is not on commitment")]
    ShareVerificationFailure { dealer: u32, index: u32 },
    #[error("decrypted share from dealer {dealer} for index {index} is not on commitment")]
    DecryptionMismatch { dealer: u32, index: u32 },
    #[error("misdirected share")]
    MisdirectedShare,
    #[error("invalid index: {0}")]
    InvalidIndex(u32),
    #[error("invalid config: n={0}, t={1}")]
    InvalidConfig(u32, u32),
    #[error("dealer is invalid")]
    DealerInvalid,
    #[error("dealer disqualified")]
    DealerDisqualified,
    #[error("duplicate share")]
    DuplicateShare,
    #[error("duplicate commitment")]
    DuplicateCommitment,
    #[error("duplicate ack")]
    DuplicateAck,
    #[error("mismatched commitment")]
    MismatchedCommitment,
    #[error("merkle root mismatch")]
    MerkleRootMismatch,
    #[error("complaint is invalid")]
    ComplaintInvalid,
    #[error("insufficient dealings")]
    InsufficientDealings,
    #[error("missing share")]
    MissingShare,
    #[error("reconstruction failed: {0}")]
    Reconstruction(#[from] primitives::Error),
    #[error("invalid snapshot: {0}")]
    Snapshot(String),
    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
