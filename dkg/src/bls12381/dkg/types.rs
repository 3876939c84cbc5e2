//! Public data produced by dealers.

use crate::bls12381::{
    dkg::{Config, Error},
    primitives::{
        group::{G1, G2},
        ops::verify_public_commitment,
        poly::{self, Poly},
    },
};
use std::collections::BTreeMap;

/// The public commitment of a dealer to its secret polynomial, in both groups.
///
/// The G1 half is used to verify shares (Feldman). The G2 half is used to derive the
/// group public key and public key shares. Both halves commit to the same coefficients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commitment {
    g1: poly::Feldman,
    g2: poly::Public,
}

impl Commitment {
    /// Pairs the two halves of a commitment without checking them.
    ///
    /// Use [Commitment::verify] before trusting a commitment received from a peer.
    pub fn new(g1: poly::Feldman, g2: poly::Public) -> Result<Self, Error> {
        if g1.required() != g2.required() {
            return Err(Error::CommitmentWrongDegree);
        }
        Ok(Self { g1, g2 })
    }

    /// Commits to a private polynomial in both groups.
    pub fn commit(secret: &poly::Private) -> Self {
        Self {
            g1: Poly::commit(secret),
            g2: Poly::commit(secret),
        }
    }

    /// The G1 commitment polynomial.
    pub fn feldman(&self) -> &poly::Feldman {
        &self.g1
    }

    /// The G2 commitment polynomial.
    pub fn public(&self) -> &poly::Public {
        &self.g2
    }

    /// The G1 commitment to the coefficient of the given degree.
    pub fn g1(&self, degree: u32) -> Option<G1> {
        (degree <= self.g1.degree()).then(|| self.g1.get(degree))
    }

    /// The G2 commitment to the coefficient of the given degree.
    pub fn g2(&self, degree: u32) -> Option<G2> {
        (degree <= self.g2.degree()).then(|| self.g2.get(degree))
    }

    /// Degree of the committed polynomial.
    pub fn degree(&self) -> u32 {
        self.g1.degree()
    }

    /// Checks that the commitment has degree `t` and that every pair of G1 and G2
    /// points commits to the same scalar.
    pub fn verify(&self, config: &Config) -> Result<(), Error> {
        if self.g1.degree() != config.t() || self.g2.degree() != config.t() {
            return Err(Error::CommitmentWrongDegree);
        }
        for (degree, (g1, g2)) in self
            .g1
            .coefficients()
            .iter()
            .zip(self.g2.coefficients())
            .enumerate()
        {
            if !verify_public_commitment(g1, g2) {
                return Err(Error::CommitmentInconsistency {
                    degree: degree as u32,
                });
            }
        }
        Ok(())
    }
}

/// Commitments of every dealer, keyed by dealer index.
pub type Commitments = BTreeMap<u32, Commitment>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bls12381::primitives::{group::Element, poly::new_from};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_verify() {
        let config = Config::new(5, 2).unwrap();
        let secret = new_from(&mut StdRng::seed_from_u64(0), 2);
        let commitment = Commitment::commit(&secret);
        commitment.verify(&config).unwrap();
        assert_eq!(commitment.degree(), 2);
        assert!(commitment.g1(2).is_some());
        assert!(commitment.g1(3).is_none());
        assert!(commitment.g2(3).is_none());
    }

    #[test]
    fn test_verify_wrong_degree() {
        let config = Config::new(5, 3).unwrap();
        let secret = new_from(&mut StdRng::seed_from_u64(0), 2);
        let commitment = Commitment::commit(&secret);
        assert!(matches!(
            commitment.verify(&config),
            Err(Error::CommitmentWrongDegree)
        ));
        assert!(matches!(
            Commitment::new(
                commitment.feldman().clone(),
                Poly::commit(&new_from(&mut StdRng::seed_from_u64(1), 3))
            ),
            Err(Error::CommitmentWrongDegree)
        ));
    }

    #[test]
    fn test_verify_inconsistent() {
        let config = Config::new(5, 2).unwrap();
        let secret = new_from(&mut StdRng::seed_from_u64(0), 2);
        let mut g2 = Poly::<G2>::commit(&secret);
        g2.set(1, G2::one());
        let commitment = Commitment::new(Poly::commit(&secret), g2).unwrap();
        assert!(matches!(
            commitment.verify(&config),
            Err(Error::CommitmentInconsistency { degree: 1 })
        ));
    }
}
