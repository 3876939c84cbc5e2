//! Run configuration shared by every participant of a DKG.

use crate::{bls12381::dkg::Error, quorum};
use serde::{Deserialize, Serialize};

/// Immutable parameters of a DKG run.
///
/// `n` participants are assigned indices `1..=n`. Polynomials have degree `t`, so any
/// `t + 1` shares can recover a signature and `t` shares reveal nothing about the secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Params")]
pub struct Config {
    n: u32,
    t: u32,
    #[serde(skip, default = "default_concurrency")]
    concurrency: usize,
}

fn default_concurrency() -> usize {
    1
}

/// Unvalidated parameters, checked by [Config::new] on deserialization.
#[derive(Deserialize)]
struct Params {
    n: u32,
    t: u32,
}

impl TryFrom<Params> for Config {
    type Error = Error;

    fn try_from(params: Params) -> Result<Self, Self::Error> {
        Self::new(params.n, params.t)
    }
}

impl Config {
    /// Creates a configuration for `n` participants and a polynomial of degree `t`.
    pub fn new(n: u32, t: u32) -> Result<Self, Error> {
        if n == 0 || t >= n {
            return Err(Error::InvalidConfig(n, t));
        }
        Ok(Self {
            n,
            t,
            concurrency: default_concurrency(),
        })
    }

    /// Creates a configuration that tolerates `f` faults for `n = 3f + 1` participants
    /// (requiring `2f + 1` shares to sign).
    pub fn quorum(n: u32) -> Result<Self, Error> {
        let required = quorum(n).ok_or(Error::InvalidConfig(n, 0))?;
        Self::new(n, required - 1)
    }

    /// Sets the number of threads used for parallelizable work.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Number of participants.
    pub fn n(&self) -> u32 {
        self.n
    }

    /// Degree of every dealer's polynomial.
    pub fn t(&self) -> u32 {
        self.t
    }

    /// Number of shares required to recover a signature (`t + 1`).
    pub fn required(&self) -> u32 {
        self.t + 1
    }

    /// Number of threads used for parallelizable work.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Iterates over every participant index.
    pub fn indices(&self) -> impl Iterator<Item = u32> {
        1..=self.n
    }

    /// Returns an error if `index` is not a participant index.
    pub fn check_index(&self, index: u32) -> Result<(), Error> {
        if index == 0 || index > self.n {
            return Err(Error::InvalidIndex(index));
        }
        Ok(())
    }
}
