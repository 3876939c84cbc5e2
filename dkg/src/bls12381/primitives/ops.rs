//! Digital signatures over the BLS12-381 curve using G2 as the Public Key (96 bytes)
//! and G1 as the Signature (48 bytes).
//!
//! # Domain Separation Tag (DST)
//!
//! Messages are hashed to G1 with `BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_`. You can read
//! more about DSTs [here](https://datatracker.ietf.org/doc/html/draft-irtf-cfrg-bls-signature-05#section-4.2).

use super::{
    group::{self, pairings_equal, Element, Point, Scalar, Share, G1, G2},
    lagrange::{self, Weight},
    poly::{self, Eval, PartialSignature},
    Error,
};
use crate::{bls12381::dkg::Config, union_unique};
use blst::{Pairing as blst_pairing, BLS12_381_NEG_G2};
use rand::{CryptoRng, RngCore};
use std::{borrow::Cow, collections::BTreeMap};

/// Computes the public key from the private key.
pub fn compute_public(private: &Scalar) -> group::Public {
    let mut public = group::Public::one();
    public.mul(private);
    public
}

/// Returns a new keypair derived from the provided randomness.
pub fn keypair<R: RngCore + CryptoRng>(rng: &mut R) -> (group::Private, group::Public) {
    let private = group::Private::rand(rng);
    let public = compute_public(&private);
    (private, public)
}

/// Hashes the provided message to G1.
pub fn hash_message(message: &[u8]) -> group::Signature {
    let mut hm = group::Signature::zero();
    hm.map(message);
    hm
}

/// Signs the provided message with the private key (`H(m) * private`).
pub fn sign(private: &Scalar, message: &[u8]) -> group::Signature {
    let mut hm = hash_message(message);
    hm.mul(private);
    hm
}

/// Verifies the signature with the provided public key.
///
/// Checks that `e(sig, G2::one())` is equal to `e(hm, pk)` using a single product check with
/// a negated G2 generator (`e(hm, pk) * e(sig, -G2::one()) == 1`).
pub fn verify(
    public: &group::Public,
    message: &[u8],
    signature: &group::Signature,
) -> Result<(), Error> {
    // A signature or public key at infinity never verifies
    if public.is_zero() || signature.is_zero() {
        return Err(Error::InvalidSignature);
    }

    // Create hashed message `hm`
    let hm = hash_message(message);

    // Create a pairing context
    //
    // We only handle pre-hashed messages, so we leave the domain separator tag (`DST`) empty.
    let mut pairing = blst_pairing::new(false, &[]);

    // Aggregate `e(sig, -G2::one())`
    let sig = signature.as_blst_p1_affine();
    unsafe {
        pairing.raw_aggregate(&BLS12_381_NEG_G2, &sig);
    }

    // Aggregate `e(hm, pk)`
    let pk = public.as_blst_p2_affine();
    let hm = hm.as_blst_p1_affine();
    pairing.raw_aggregate(&pk, &hm);

    // Finalize the pairing accumulation and verify the result
    pairing.commit();
    if !pairing.finalverify(None) {
        return Err(Error::InvalidSignature);
    }
    Ok(())
}

/// Signs the provided message (optionally scoped to a namespace) with the private key.
///
/// # Determinism
///
/// Signatures produced by this function are deterministic and are safe
/// to use in a consensus-critical context.
pub fn sign_message(
    private: &group::Private,
    namespace: Option<&[u8]>,
    message: &[u8],
) -> group::Signature {
    let payload = match namespace {
        Some(namespace) => Cow::Owned(union_unique(namespace, message)),
        None => Cow::Borrowed(message),
    };
    sign(private, &payload)
}

/// Verifies the signature (optionally scoped to a namespace) with the provided public key.
pub fn verify_message(
    public: &group::Public,
    namespace: Option<&[u8]>,
    message: &[u8],
    signature: &group::Signature,
) -> Result<(), Error> {
    let payload = match namespace {
        Some(namespace) => Cow::Owned(union_unique(namespace, message)),
        None => Cow::Borrowed(message),
    };
    verify(public, &payload, signature)
}

/// Signs the provided message with the key share.
pub fn partial_sign_message(
    private: &Share,
    namespace: Option<&[u8]>,
    message: &[u8],
) -> PartialSignature {
    let sig = sign_message(&private.private, namespace, message);
    Eval {
        value: sig,
        index: private.index,
    }
}

/// Verifies the partial signature against the public polynomial.
pub fn partial_verify_message(
    public: &poly::Public,
    namespace: Option<&[u8]>,
    message: &[u8],
    partial: &PartialSignature,
) -> Result<(), Error> {
    let public = public.evaluate(partial.index)?;
    verify_message(&public.value, namespace, message, &partial.value)
}

/// Returns true if `g1` and `g2` commit to the same scalar, that is
/// `e(g1, G2::one()) == e(G1::one(), g2)`.
pub fn verify_public_commitment(g1: &G1, g2: &G2) -> bool {
    pairings_equal(g1, &G2::one(), &G1::one(), g2)
}

/// Recovers a signature using precomputed Lagrange weights.
///
/// Each partial signature must have a weight (and vice versa).
pub fn threshold_signature_recover_with_weights<'a, I>(
    weights: &BTreeMap<u32, Weight>,
    partials: I,
) -> Result<group::Signature, Error>
where
    I: IntoIterator<Item = &'a PartialSignature>,
{
    lagrange::recover_with_weights(weights, partials)
}

/// Recovers the group signature from at least `t + 1` partial signatures by
/// interpolating in the exponent at `x = 0`.
///
/// Fails if any index is outside `1..=n`, if two partial signatures share an index,
/// or if fewer than `t + 1` partial signatures are provided. When more than `t + 1`
/// are provided, the `t + 1` with the lowest indices are used.
///
/// # Determinism
///
/// Signatures recovered by this function are deterministic and are safe
/// to use in a consensus-critical context.
pub fn threshold_signature_recover<'a, I>(
    config: &Config,
    partials: I,
) -> Result<group::Signature, Error>
where
    I: IntoIterator<Item = &'a PartialSignature>,
{
    // Validate indices before selecting the evaluations to use
    let mut evals = partials.into_iter().collect::<Vec<_>>();
    if let Some(invalid) = evals
        .iter()
        .find(|e| e.index == 0 || e.index > config.n())
    {
        return Err(Error::InvalidIndex(invalid.index));
    }
    let indices = evals.iter().map(|e| e.index).collect::<Vec<_>>();
    let weights = lagrange::compute_weights(&indices, config.required())?;

    // Only interpolate over the evaluations the weights were computed for
    evals.sort_by_key(|e| e.index);
    evals.truncate(config.required() as usize);
    threshold_signature_recover_with_weights(&weights, evals)
}

/// Aggregates multiple public keys.
pub fn aggregate_public_keys<'a, I>(public_keys: I) -> group::Public
where
    I: IntoIterator<Item = &'a group::Public>,
{
    let mut p = group::Public::zero();
    for pk in public_keys {
        p.add(pk);
    }
    p
}

/// Aggregates multiple signatures.
pub fn aggregate_signatures<'a, I>(signatures: I) -> group::Signature
where
    I: IntoIterator<Item = &'a group::Signature>,
{
    let mut s = group::Signature::zero();
    for sig in signatures {
        s.add(sig);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bls12381::dkg::ops::{generate_polynomial, generate_shares};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_single_signature() {
        let mut rng = StdRng::seed_from_u64(0);
        let (private, public) = keypair(&mut rng);
        let message = b"hello world";
        let signature = sign(&private, message);
        verify(&public, message, &signature).expect("signature should be valid");
        assert_eq!(
            verify(&public, b"other", &signature),
            Err(Error::InvalidSignature)
        );
        let (_, other) = keypair(&mut rng);
        assert_eq!(
            verify(&other, message, &signature),
            Err(Error::InvalidSignature)
        );
    }

    #[test]
    fn test_namespace() {
        let mut rng = StdRng::seed_from_u64(1);
        let (private, public) = keypair(&mut rng);
        let signature = sign_message(&private, Some(&b"ns"[..]), b"message");
        verify_message(&public, Some(&b"ns"[..]), b"message", &signature).unwrap();
        assert!(verify_message(&public, None, b"message", &signature).is_err());
        assert!(verify_message(&public, Some(&b"n"[..]), b"smessage", &signature).is_err());
    }

    #[test]
    fn test_identity_rejected() {
        let mut rng = StdRng::seed_from_u64(2);
        let (_, public) = keypair(&mut rng);
        assert_eq!(
            verify(&public, b"message", &G1::zero()),
            Err(Error::InvalidSignature)
        );
        assert_eq!(
            verify(&G2::zero(), b"message", &G1::zero()),
            Err(Error::InvalidSignature)
        );
    }

    #[test]
    fn test_public_commitment() {
        let mut rng = StdRng::seed_from_u64(3);
        let s = Scalar::rand(&mut rng);
        let mut g1 = G1::one();
        g1.mul(&s);
        let mut g2 = G2::one();
        g2.mul(&s);
        assert!(verify_public_commitment(&g1, &g2));

        let mut other = G2::one();
        other.mul(&Scalar::rand(&mut rng));
        assert!(!verify_public_commitment(&g1, &other));
    }

    #[test]
    fn test_threshold_recover() {
        let mut rng = StdRng::seed_from_u64(4);
        let config = Config::new(7, 3).unwrap();
        let (polynomial, commitment) = generate_polynomial(&mut rng, &config).unwrap();
        let shares = generate_shares(&config, &polynomial).unwrap();
        let partials = shares
            .iter()
            .map(|s| partial_sign_message(s, None, b"payload"))
            .collect::<Vec<_>>();
        for partial in &partials {
            partial_verify_message(commitment.public(), None, b"payload", partial).unwrap();
        }

        let first = threshold_signature_recover(&config, &partials[..4]).unwrap();
        let last = threshold_signature_recover(&config, &partials[3..]).unwrap();
        let all = threshold_signature_recover(&config, &partials).unwrap();
        assert_eq!(first, last);
        assert_eq!(first, all);
        verify_message(commitment.public().constant(), None, b"payload", &first).unwrap();
        assert_eq!(first, sign(polynomial.constant(), b"payload"));
    }

    #[test]
    fn test_threshold_recover_invalid() {
        let mut rng = StdRng::seed_from_u64(5);
        let config = Config::new(5, 2).unwrap();
        let (polynomial, _) = generate_polynomial(&mut rng, &config).unwrap();
        let shares = generate_shares(&config, &polynomial).unwrap();
        let mut partials = shares
            .iter()
            .map(|s| partial_sign_message(s, None, b"payload"))
            .collect::<Vec<_>>();

        // Insufficient
        assert_eq!(
            threshold_signature_recover(&config, &partials[..2]),
            Err(Error::NotEnoughPartialSignatures(3, 2))
        );

        // Duplicate
        let duplicate = vec![
            partials[0].clone(),
            partials[0].clone(),
            partials[1].clone(),
        ];
        assert_eq!(
            threshold_signature_recover(&config, &duplicate),
            Err(Error::DuplicateIndex(1))
        );

        // Out of range
        partials[4].index = 6;
        assert_eq!(
            threshold_signature_recover(&config, &partials),
            Err(Error::InvalidIndex(6))
        );
        partials[4].index = 0;
        assert_eq!(
            threshold_signature_recover(&config, &partials),
            Err(Error::InvalidIndex(0))
        );
    }

    #[test]
    fn test_aggregate() {
        let mut rng = StdRng::seed_from_u64(6);
        let (sk1, pk1) = keypair(&mut rng);
        let (sk2, pk2) = keypair(&mut rng);
        let message = b"aggregate";
        let sig = aggregate_signatures(&[sign(&sk1, message), sign(&sk2, message)]);
        let public = aggregate_public_keys(&[pk1, pk2]);
        verify(&public, message, &sig).unwrap();
    }
}
