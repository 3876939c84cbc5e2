//! Stateless operations used by dealers, players, and arbiters.

use crate::bls12381::{
    dkg::{types::Commitment, Commitments, Config, Error},
    primitives::{
        group::{Element, Scalar, Share, G1, G2},
        ops::verify_public_commitment,
        poly::{self, Poly},
    },
};
use rand::{CryptoRng, RngCore};
use rayon::{prelude::*, ThreadPoolBuilder};
use std::collections::BTreeMap;

/// Generate a random coefficient and commit to it in both groups.
///
/// Only fails if the provided RNG fails.
pub fn generate_coefficient<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<(Scalar, G1, G2), Error> {
    let coefficient = Scalar::try_rand(rng).map_err(|_| Error::GenerationFailure)?;
    let mut g1 = G1::one();
    g1.mul(&coefficient);
    let mut g2 = G2::one();
    g2.mul(&coefficient);
    Ok((coefficient, g1, g2))
}

/// Generate a secret polynomial of degree `t` and its commitment.
pub fn generate_polynomial<R: RngCore + CryptoRng>(
    rng: &mut R,
    config: &Config,
) -> Result<(poly::Private, Commitment), Error> {
    let required = config.required() as usize;
    let mut coefficients = Vec::with_capacity(required);
    let mut g1s = Vec::with_capacity(required);
    let mut g2s = Vec::with_capacity(required);
    for degree in 0..config.required() {
        let (coefficient, g1, g2) = generate_coefficient(rng)?;
        if !verify_public_commitment(&g1, &g2) {
            return Err(Error::CommitmentInconsistency { degree });
        }
        coefficients.push(coefficient);
        g1s.push(g1);
        g2s.push(g2);
    }
    let commitment = Commitment::new(Poly::from(g1s), Poly::from(g2s))?;
    Ok((Poly::from(coefficients), commitment))
}

/// Evaluate the secret polynomial at `index`.
pub fn evaluate_share(index: u32, polynomial: &poly::Private) -> Result<Share, Error> {
    if index == 0 {
        return Err(Error::InvalidIndex(index));
    }
    let eval = polynomial.evaluate(index)?;
    Ok(Share {
        index: eval.index,
        private: eval.value,
    })
}

/// Evaluate the secret polynomial at every participant index.
pub fn generate_shares(config: &Config, polynomial: &poly::Private) -> Result<Vec<Share>, Error> {
    config
        .indices()
        .map(|index| evaluate_share(index, polynomial))
        .collect()
}

/// Returns true if `G1 * share` equals the G1 commitment evaluated at `index`
/// (`sum_k C_k * index^k`).
pub fn verify_private_commitment(index: u32, share: &Scalar, commitment: &poly::Feldman) -> bool {
    let Ok(expected) = commitment.evaluate(index) else {
        return false;
    };
    let mut given = G1::one();
    given.mul(share);
    given == expected.value
}

/// Verify that a share dealt by `dealer` lies on the dealer's commitment.
pub fn verify_share(
    config: &Config,
    dealer: u32,
    commitment: &Commitment,
    share: &Share,
) -> Result<(), Error> {
    config.check_index(share.index)?;
    if commitment.degree() != config.t() {
        return Err(Error::CommitmentWrongDegree);
    }
    if !verify_private_commitment(share.index, &share.private, commitment.feldman()) {
        return Err(Error::ShareVerificationFailure {
            dealer,
            index: share.index,
        });
    }
    Ok(())
}

/// Sum verified shares (one per dealer) into the secret key share at `index`.
pub fn derive_secret_key_share<'a, I>(index: u32, shares: I) -> Result<Share, Error>
where
    I: IntoIterator<Item = &'a Share>,
{
    if index == 0 {
        return Err(Error::InvalidIndex(index));
    }
    let mut private = Scalar::zero();
    let mut count = 0;
    for share in shares {
        if share.index != index {
            return Err(Error::MisdirectedShare);
        }
        private.add(&share.private);
        count += 1;
    }
    if count == 0 {
        return Err(Error::MissingShare);
    }
    Ok(Share { index, private })
}

/// Sum the zero-degree G2 commitments of every dealer.
pub fn derive_group_public_key(commitments: &Commitments) -> G2 {
    let mut public = G2::zero();
    for commitment in commitments.values() {
        public.add(commitment.public().constant());
    }
    public
}

/// Sum the G2 commitments of every dealer evaluated at `index`.
pub fn derive_public_key_share(index: u32, commitments: &Commitments) -> Result<G2, Error> {
    if index == 0 {
        return Err(Error::InvalidIndex(index));
    }
    let mut public = G2::zero();
    for commitment in commitments.values() {
        let eval = commitment.public().evaluate(index)?;
        public.add(&eval.value);
    }
    Ok(public)
}

/// Derive the public key share of every participant.
pub fn derive_public_key_shares(
    config: &Config,
    commitments: &Commitments,
) -> Result<BTreeMap<u32, G2>, Error> {
    // Construct pool to perform evaluations
    let pool = ThreadPoolBuilder::new()
        .num_threads(config.concurrency())
        .build()
        .expect("unable to build thread pool");

    // Evaluate each index once
    pool.install(|| {
        (1..=config.n())
            .into_par_iter()
            .map(|index| Ok::<_, Error>((index, derive_public_key_share(index, commitments)?)))
            .collect::<Result<BTreeMap<_, _>, _>>()
    })
}
