//! Complaints against dealers that sent invalid shares.
//!
//! A player that receives a share that does not lie on the dealer's commitment discloses
//! the Diffie-Hellman point it shares with the dealer (never its private key). Anyone can check
//! the disclosed point against both public keys with a pairing, decrypt the share, and compare
//! it with the dealer's aggregated commitment at the claimant's index.

use crate::bls12381::{
    dkg::{
        channel::{self, EncryptedShare, PrivateKey, PublicKey},
        Error,
    },
    primitives::{
        group::{Element, Scalar, G1},
        poly,
    },
};

/// The outcome of adjudicating a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The decrypted share does not lie on the dealer's commitment.
    DealerFaulty,
    /// The decrypted share lies on the dealer's commitment.
    ComplaintUnfounded,
}

/// Running sums of a dealer's G1 commitment evaluated at a claimant's index.
///
/// Entry `k` is `sum_{j <= k} C_j * index^j`, so the last entry is the commitment to the
/// share the claimant should have received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedCommitment(pub(crate) Vec<G1>);

impl AggregatedCommitment {
    /// Returns every running sum in order of degree.
    pub fn entries(&self) -> &[G1] {
        &self.0
    }

    /// Returns the commitment to the claimant's share.
    pub fn expected(&self) -> &G1 {
        &self.0[self.0.len() - 1]
    }
}

/// Computes the running sums of `commitment` evaluated at `claimant`.
pub fn aggregate_commitment(
    claimant: u32,
    commitment: &poly::Feldman,
) -> Result<AggregatedCommitment, Error> {
    if claimant == 0 {
        return Err(Error::InvalidIndex(claimant));
    }
    let x = Scalar::from_index(claimant);
    let mut power = Scalar::one();
    let mut sum = G1::zero();
    let mut entries = Vec::with_capacity(commitment.required() as usize);
    for coefficient in commitment.coefficients() {
        let mut term = *coefficient;
        term.mul(&power);
        sum.add(&term);
        entries.push(sum);
        power.mul(&x);
    }
    Ok(AggregatedCommitment(entries))
}

/// A claim by the player at `claimant` that the share dealt by `accused` is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Complaint {
    pub claimant: u32,
    pub accused: u32,
    pub encrypted: EncryptedShare,
    /// Diffie-Hellman point shared by the claimant and the accused.
    pub key: G1,
    pub claimant_pk: PublicKey,
}

impl Complaint {
    /// Files a complaint about an encrypted share, disclosing the shared key.
    pub fn new(
        claimant_sk: &PrivateKey,
        claimant_pk: PublicKey,
        accused_pk: &PublicKey,
        encrypted: EncryptedShare,
    ) -> Self {
        Self {
            claimant: encrypted.index,
            accused: encrypted.dealer,
            key: channel::shared_key(claimant_sk, accused_pk),
            encrypted,
            claimant_pk,
        }
    }

    /// Adjudicates the complaint against the accused's G1 commitment.
    ///
    /// `claimant_pk` and `accused_pk` are the registered keys of both parties. Fails with
    /// [Error::ComplaintInvalid] if the complaint carries a different claimant key or if the
    /// disclosed key is not the shared key of the two public keys.
    pub fn resolve(
        &self,
        claimant_pk: &PublicKey,
        accused_pk: &PublicKey,
        commitment: &poly::Feldman,
    ) -> Result<Verdict, Error> {
        if self.claimant != self.encrypted.index || self.accused != self.encrypted.dealer {
            return Err(Error::ComplaintInvalid);
        }
        if &self.claimant_pk != claimant_pk {
            return Err(Error::ComplaintInvalid);
        }
        if !claimant_pk.verify() || !channel::verify_shared_key(&self.key, accused_pk, claimant_pk)
        {
            return Err(Error::ComplaintInvalid);
        }

        // Recover the share the claimant received
        let share = channel::decrypt_with_key(&self.key, &self.encrypted);
        let mut given = G1::one();
        given.mul(&share);

        // Compare with the commitment at the claimant's index
        let aggregated = aggregate_commitment(self.claimant, commitment)?;
        if &given == aggregated.expected() {
            return Ok(Verdict::ComplaintUnfounded);
        }
        Ok(Verdict::DealerFaulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bls12381::dkg::{
        channel::{encrypt, generate},
        ops::{evaluate_share, generate_polynomial},
        Config,
    };
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_aggregate_commitment() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = Config::new(6, 3).unwrap();
        let (polynomial, commitment) = generate_polynomial(&mut rng, &config).unwrap();
        for claimant in config.indices() {
            let aggregated = aggregate_commitment(claimant, commitment.feldman()).unwrap();
            assert_eq!(aggregated.entries().len(), 4);
            assert_eq!(&aggregated.entries()[0], commitment.feldman().constant());
            let share = evaluate_share(claimant, &polynomial).unwrap();
            assert_eq!(*aggregated.expected(), share.commitment());
        }
        assert!(matches!(
            aggregate_commitment(0, commitment.feldman()),
            Err(Error::InvalidIndex(0))
        ));
    }

    #[test]
    fn test_corrupted_share() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = Config::new(5, 2).unwrap();
        let (dealer_sk, dealer_pk) = generate(&mut rng).unwrap();
        let (player_sk, player_pk) = generate(&mut rng).unwrap();
        let (polynomial, commitment) = generate_polynomial(&mut rng, &config).unwrap();
        let share = evaluate_share(4, &polynomial).unwrap();

        // Dealer adds one to the share before encrypting
        let mut corrupted = share.private;
        corrupted.add(&Scalar::one());
        let encrypted = encrypt(&dealer_sk, &player_pk, 2, 4, &corrupted);
        let complaint = Complaint::new(&player_sk, player_pk.clone(), &dealer_pk, encrypted);
        assert_eq!(complaint.claimant, 4);
        assert_eq!(complaint.accused, 2);
        assert_eq!(
            complaint.resolve(&player_pk, &dealer_pk, commitment.feldman()).unwrap(),
            Verdict::DealerFaulty
        );

        // An honest share yields an unfounded complaint
        let encrypted = encrypt(&dealer_sk, &player_pk, 2, 4, &share.private);
        let complaint = Complaint::new(&player_sk, player_pk.clone(), &dealer_pk, encrypted);
        assert_eq!(
            complaint.resolve(&player_pk, &dealer_pk, commitment.feldman()).unwrap(),
            Verdict::ComplaintUnfounded
        );
    }

    #[test]
    fn test_forged_key() {
        let mut rng = StdRng::seed_from_u64(2);
        let config = Config::new(5, 2).unwrap();
        let (dealer_sk, dealer_pk) = generate(&mut rng).unwrap();
        let (player_sk, player_pk) = generate(&mut rng).unwrap();
        let (polynomial, commitment) = generate_polynomial(&mut rng, &config).unwrap();
        let share = evaluate_share(3, &polynomial).unwrap();
        let encrypted = encrypt(&dealer_sk, &player_pk, 1, 3, &share.private);

        // Claimant discloses a point that is not the shared key
        let mut complaint = Complaint::new(&player_sk, player_pk.clone(), &dealer_pk, encrypted);
        complaint.key.add(&G1::one());
        assert!(matches!(
            complaint.resolve(&player_pk, &dealer_pk, commitment.feldman()),
            Err(Error::ComplaintInvalid)
        ));

        // Claimant accuses a dealer other than the sender
        let mut complaint = complaint.clone();
        complaint.key = channel::shared_key(&player_sk, &dealer_pk);
        complaint.accused = 2;
        assert!(matches!(
            complaint.resolve(&player_pk, &dealer_pk, commitment.feldman()),
            Err(Error::ComplaintInvalid)
        ));
    }

    #[test]
    fn test_unregistered_claimant_key() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = Config::new(5, 2).unwrap();
        let (dealer_sk, dealer_pk) = generate(&mut rng).unwrap();
        let (_, player_pk) = generate(&mut rng).unwrap();
        let (polynomial, commitment) = generate_polynomial(&mut rng, &config).unwrap();
        let share = evaluate_share(2, &polynomial).unwrap();
        let encrypted = encrypt(&dealer_sk, &player_pk, 1, 2, &share.private);

        // A fresh keypair yields a shared key that passes the pairing check on its own
        let (fake_sk, fake_pk) = generate(&mut rng).unwrap();
        let complaint = Complaint::new(&fake_sk, fake_pk.clone(), &dealer_pk, encrypted);
        assert!(channel::verify_shared_key(&complaint.key, &dealer_pk, &fake_pk));

        // Checked against the registered key, it is rejected
        assert!(matches!(
            complaint.resolve(&player_pk, &dealer_pk, commitment.feldman()),
            Err(Error::ComplaintInvalid)
        ));
    }
}
