//! Public bookkeeping of a DKG.
//!
//! The arbiter records the commitment, Merkle root, and encrypted shares posted by each dealer,
//! adjudicates complaints filed by players, and selects the qualified dealers once the round ends.
//!
//! Complaints are resolved only against public data: the encryption keys registered when the
//! arbiter is created and the ciphertexts the accused dealer posted. A complaint that names a
//! different key or a different ciphertext is rejected without touching the accused.
//!
//! # Deployment Options
//!
//! Each participant can run its own instance of the arbiter over a replicated log (deterministic
//! order of events across all participants) of commitments and complaints. All correct
//! participants, when given the same log, will arrive at the same qualified set. Alternatively,
//! the arbiter can run as a standalone process that participants trust.
//!
//! # Disqualification on Attributable Faults
//!
//! Submitting duplicate information (i.e. a dealer posting its commitment twice) returns an error but
//! does not disqualify the dealer. Posting an invalid commitment, a root that does not match the
//! commitment, a mislabeled ciphertext, or a share that a complaint proves invalid disqualifies
//! the dealer.
//!
//! # Warning
//!
//! It is up to the developer to authorize interaction with the arbiter. This is purposely
//! not provided by the arbiter because this authorization function is highly dependent on
//! the context in which the arbiter is being used.

use crate::bls12381::{
    dkg::{
        channel::{EncryptedShare, PublicKey},
        complaint::{Complaint, Verdict},
        merkle::{self, Digest},
        ops,
        types::{Commitment, Commitments},
        Config, Error,
    },
    primitives::group::G2,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Output of the arbiter.
#[derive(Debug, Clone)]
pub struct Output {
    /// The group public key.
    pub public: G2,

    /// Commitments of the qualified dealers.
    pub commitments: Commitments,
}

/// Gather commitments and complaints from all participants.
pub struct Arbiter {
    config: Config,
    public: BTreeMap<u32, PublicKey>,

    commitments: BTreeMap<u32, (Commitment, Digest)>,
    ciphertexts: BTreeMap<u32, BTreeMap<u32, EncryptedShare>>,
    disqualified: BTreeSet<u32>,
}

impl Arbiter {
    /// Create a new arbiter for a DKG over the registered encryption keys of all participants.
    pub fn new(config: Config, public: BTreeMap<u32, PublicKey>) -> Result<Self, Error> {
        for index in public.keys() {
            config.check_index(*index)?;
        }
        Ok(Self {
            config,
            public,
            commitments: BTreeMap::new(),
            ciphertexts: BTreeMap::new(),
            disqualified: BTreeSet::new(),
        })
    }

    /// Disqualify a dealer from the DKG for external reason (i.e. sending invalid messages).
    pub fn disqualify(&mut self, dealer: u32) {
        if self.disqualified.insert(dealer) {
            warn!(dealer, "disqualified dealer");
        }
    }

    /// Returns true if the dealer is disqualified.
    pub fn is_disqualified(&self, dealer: u32) -> bool {
        self.disqualified.contains(&dealer)
    }

    /// Verify and track a commitment (and its Merkle root) from a dealer, along with the
    /// encrypted shares it sent (keyed by recipient).
    pub fn commitment(
        &mut self,
        dealer: u32,
        commitment: Commitment,
        root: Digest,
        encrypted: BTreeMap<u32, EncryptedShare>,
    ) -> Result<(), Error> {
        // Check if dealer is disqualified
        self.config.check_index(dealer)?;
        if self.disqualified.contains(&dealer) {
            return Err(Error::DealerDisqualified);
        }

        // Check if commitment already exists
        if self.commitments.contains_key(&dealer) {
            return Err(Error::DuplicateCommitment);
        }

        // Verify the commitment and the posted root
        if let Err(e) = commitment.verify(&self.config) {
            warn!(dealer, error = ?e, "invalid commitment");
            self.disqualify(dealer);
            return Err(e);
        }
        if merkle::merkle_commit(&commitment) != root {
            warn!(dealer, "merkle root mismatch");
            self.disqualify(dealer);
            return Err(Error::MerkleRootMismatch);
        }

        // Every ciphertext must be labeled with its dealer and a registered recipient
        let misdirected = encrypted.iter().any(|(recipient, share)| {
            share.dealer != dealer
                || share.index != *recipient
                || *recipient == dealer
                || !self.public.contains_key(recipient)
        });
        if misdirected {
            warn!(dealer, "misdirected ciphertext");
            self.disqualify(dealer);
            return Err(Error::MisdirectedShare);
        }

        // Record commitment
        self.commitments.insert(dealer, (commitment, root));
        self.ciphertexts.insert(dealer, encrypted);
        Ok(())
    }

    /// Returns the Merkle root posted by a dealer.
    pub fn root(&self, dealer: u32) -> Option<&Digest> {
        self.commitments.get(&dealer).map(|(_, root)| root)
    }

    /// Adjudicate a complaint against the dealer that sent the share.
    ///
    /// The complaint must name the claimant's registered key and the ciphertext the accused
    /// posted, else it fails with [Error::ComplaintInvalid]. If the complaint shows the dealer
    /// sent an invalid share, the dealer is disqualified.
    pub fn complaint(&mut self, complaint: &Complaint) -> Result<Verdict, Error> {
        let accused = complaint.accused;
        self.config.check_index(complaint.claimant)?;
        if self.disqualified.contains(&accused) {
            return Err(Error::DealerDisqualified);
        }
        let Some((commitment, _)) = self.commitments.get(&accused) else {
            return Err(Error::DealerInvalid);
        };
        let Some(accused_pk) = self.public.get(&accused) else {
            return Err(Error::DealerInvalid);
        };
        let Some(claimant_pk) = self.public.get(&complaint.claimant) else {
            return Err(Error::InvalidIndex(complaint.claimant));
        };

        // Only the ciphertext the accused posted can be disputed
        let posted = self
            .ciphertexts
            .get(&accused)
            .and_then(|ciphertexts| ciphertexts.get(&complaint.claimant));
        if posted != Some(&complaint.encrypted) {
            warn!(
                claimant = complaint.claimant,
                accused, "complaint names unposted ciphertext"
            );
            return Err(Error::ComplaintInvalid);
        }

        let verdict = complaint.resolve(claimant_pk, accused_pk, commitment.feldman())?;
        match verdict {
            Verdict::DealerFaulty => self.disqualify(accused),
            Verdict::ComplaintUnfounded => {
                warn!(
                    claimant = complaint.claimant,
                    accused, "unfounded complaint"
                );
            }
        }
        Ok(verdict)
    }

    /// If there are at least `t + 1` qualified dealers, derive the group public key.
    ///
    /// Return the disqualified dealers.
    pub fn finalize(mut self) -> (Result<Output, Error>, BTreeSet<u32>) {
        // Drop commitments from disqualified dealers
        for disqualified in self.disqualified.iter() {
            self.commitments.remove(disqualified);
        }

        // Ensure we have enough commitments to proceed
        if self.commitments.len() < self.config.required() as usize {
            return (Err(Error::InsufficientDealings), self.disqualified);
        }

        // Recover group
        let commitments = self
            .commitments
            .into_iter()
            .map(|(dealer, (commitment, _))| (dealer, commitment))
            .collect::<Commitments>();
        let public = ops::derive_group_public_key(&commitments);
        info!(
            qualified = commitments.len(),
            disqualified = self.disqualified.len(),
            "selected qualified dealers"
        );

        // Return output
        (
            Ok(Output {
                public,
                commitments,
            }),
            self.disqualified,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bls12381::{
        dkg::{
            channel::{self, PrivateKey},
            dealer::Dealing,
            ops::generate_polynomial,
            Dealer,
        },
        primitives::{
            group::{Element, Scalar, G1},
            poly::Poly,
        },
    };
    use rand::{rngs::StdRng, SeedableRng};

    type Keys = BTreeMap<u32, (PrivateKey, PublicKey)>;

    fn setup(rng: &mut StdRng, config: Config) -> (Keys, BTreeMap<u32, PublicKey>) {
        let keys = config
            .indices()
            .map(|i| (i, channel::generate(rng).unwrap()))
            .collect::<BTreeMap<_, _>>();
        let public = keys
            .iter()
            .map(|(i, (_, pk))| (*i, pk.clone()))
            .collect::<BTreeMap<_, _>>();
        (keys, public)
    }

    fn deal(
        rng: &mut StdRng,
        config: Config,
        keys: &Keys,
        public: &BTreeMap<u32, PublicKey>,
    ) -> BTreeMap<u32, Dealing> {
        keys.iter()
            .map(|(index, (sk, _))| {
                let (_, dealing) = Dealer::new(rng, config, *index, sk, public).unwrap();
                (*index, dealing)
            })
            .collect()
    }

    fn post(arbiter: &mut Arbiter, dealings: &BTreeMap<u32, Dealing>) {
        for (index, dealing) in dealings {
            arbiter
                .commitment(
                    *index,
                    dealing.commitment.clone(),
                    dealing.root,
                    dealing.encrypted.clone(),
                )
                .unwrap();
        }
    }

    #[test]
    fn test_new() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = Config::new(4, 1).unwrap();
        let (_, mut public) = setup(&mut rng, config);
        assert!(Arbiter::new(config, public.clone()).is_ok());
        let (_, extra) = channel::generate(&mut rng).unwrap();
        public.insert(5, extra);
        assert!(matches!(
            Arbiter::new(config, public),
            Err(Error::InvalidIndex(5))
        ));
    }

    #[test]
    fn test_commitment() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = Config::new(4, 1).unwrap();
        let (_, public) = setup(&mut rng, config);
        let mut arbiter = Arbiter::new(config, public).unwrap();
        let (_, commitment) = generate_polynomial(&mut rng, &config).unwrap();
        let root = merkle::merkle_commit(&commitment);
        arbiter
            .commitment(1, commitment.clone(), root, BTreeMap::new())
            .unwrap();
        assert_eq!(arbiter.root(1), Some(&root));
        assert!(matches!(
            arbiter.commitment(1, commitment.clone(), root, BTreeMap::new()),
            Err(Error::DuplicateCommitment)
        ));
        assert!(matches!(
            arbiter.commitment(5, commitment, root, BTreeMap::new()),
            Err(Error::InvalidIndex(5))
        ));
    }

    #[test]
    fn test_invalid_commitment() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = Config::new(4, 1).unwrap();
        let (_, public) = setup(&mut rng, config);
        let mut arbiter = Arbiter::new(config, public).unwrap();

        // Root does not match
        let (_, commitment) = generate_polynomial(&mut rng, &config).unwrap();
        assert!(matches!(
            arbiter.commitment(1, commitment.clone(), [0u8; 32], BTreeMap::new()),
            Err(Error::MerkleRootMismatch)
        ));
        assert!(arbiter.is_disqualified(1));
        assert!(matches!(
            arbiter.commitment(1, commitment, [0u8; 32], BTreeMap::new()),
            Err(Error::DealerDisqualified)
        ));

        // Halves commit to different coefficients
        let (_, commitment) = generate_polynomial(&mut rng, &config).unwrap();
        let mut g1 = commitment.feldman().clone();
        g1.set(1, G1::one());
        let inconsistent = Commitment::new(g1, commitment.public().clone()).unwrap();
        let root = merkle::merkle_commit(&inconsistent);
        assert!(matches!(
            arbiter.commitment(2, inconsistent, root, BTreeMap::new()),
            Err(Error::CommitmentInconsistency { degree: 1 })
        ));

        // Wrong degree
        let secret = Poly::from(vec![Scalar::one(); 3]);
        let wrong = Commitment::commit(&secret);
        let root = merkle::merkle_commit(&wrong);
        assert!(matches!(
            arbiter.commitment(3, wrong, root, BTreeMap::new()),
            Err(Error::CommitmentWrongDegree)
        ));

        let (output, disqualified) = arbiter.finalize();
        assert!(matches!(output, Err(Error::InsufficientDealings)));
        assert_eq!(disqualified, BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn test_mislabeled_ciphertexts() {
        let mut rng = StdRng::seed_from_u64(2);
        let config = Config::new(4, 1).unwrap();
        let (keys, public) = setup(&mut rng, config);
        let dealings = deal(&mut rng, config, &keys, &public);
        let mut arbiter = Arbiter::new(config, public).unwrap();

        // Dealer 1 files the share for player 2 under player 3
        let dealing = &dealings[&1];
        let mut encrypted = dealing.encrypted.clone();
        let swapped = encrypted[&2].clone();
        encrypted.insert(3, swapped);
        assert!(matches!(
            arbiter.commitment(1, dealing.commitment.clone(), dealing.root, encrypted),
            Err(Error::MisdirectedShare)
        ));
        assert!(arbiter.is_disqualified(1));

        // Dealer 2 claims another dealer's ciphertexts
        let dealing = &dealings[&2];
        assert!(matches!(
            arbiter.commitment(
                2,
                dealing.commitment.clone(),
                dealing.root,
                dealings[&3].encrypted.clone()
            ),
            Err(Error::MisdirectedShare)
        ));
        assert!(arbiter.is_disqualified(2));
    }

    #[test]
    fn test_complaint_disqualifies() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = Config::new(3, 1).unwrap();
        let (keys, public) = setup(&mut rng, config);
        let mut dealings = deal(&mut rng, config, &keys, &public);

        // Dealer 3 sends a bad share to player 1
        dealings
            .get_mut(&3)
            .unwrap()
            .encrypted
            .get_mut(&1)
            .unwrap()
            .ciphertext
            .add(&Scalar::one());
        let mut arbiter = Arbiter::new(config, public.clone()).unwrap();
        post(&mut arbiter, &dealings);

        let encrypted = dealings[&3].encrypted[&1].clone();
        let complaint = Complaint::new(&keys[&1].0, public[&1].clone(), &public[&3], encrypted);
        assert_eq!(arbiter.complaint(&complaint).unwrap(), Verdict::DealerFaulty);
        assert!(matches!(
            arbiter.complaint(&complaint),
            Err(Error::DealerDisqualified)
        ));

        // Player 2 complains about a valid share from dealer 1
        let encrypted = dealings[&1].encrypted[&2].clone();
        let complaint = Complaint::new(&keys[&2].0, public[&2].clone(), &public[&1], encrypted);
        assert_eq!(
            arbiter.complaint(&complaint).unwrap(),
            Verdict::ComplaintUnfounded
        );

        let (output, disqualified) = arbiter.finalize();
        let output = output.unwrap();
        assert_eq!(output.commitments.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(disqualified, BTreeSet::from([3]));
        assert_eq!(output.public, ops::derive_group_public_key(&output.commitments));
    }

    #[test]
    fn test_complaint_with_unregistered_key() {
        let mut rng = StdRng::seed_from_u64(4);
        let config = Config::new(4, 1).unwrap();
        let (keys, public) = setup(&mut rng, config);
        let dealings = deal(&mut rng, config, &keys, &public);
        let mut arbiter = Arbiter::new(config, public.clone()).unwrap();
        post(&mut arbiter, &dealings);

        // Player 1 discloses the shared key of a fresh keypair against honest dealer 2
        let (fake_sk, fake_pk) = channel::generate(&mut rng).unwrap();
        let encrypted = dealings[&2].encrypted[&1].clone();
        let complaint = Complaint::new(&fake_sk, fake_pk, &public[&2], encrypted);
        assert!(matches!(
            arbiter.complaint(&complaint),
            Err(Error::ComplaintInvalid)
        ));
        assert!(!arbiter.is_disqualified(2));

        let (output, disqualified) = arbiter.finalize();
        assert_eq!(output.unwrap().commitments.len(), 4);
        assert!(disqualified.is_empty());
    }

    #[test]
    fn test_complaint_with_tampered_ciphertext() {
        let mut rng = StdRng::seed_from_u64(5);
        let config = Config::new(4, 1).unwrap();
        let (keys, public) = setup(&mut rng, config);
        let dealings = deal(&mut rng, config, &keys, &public);
        let mut arbiter = Arbiter::new(config, public.clone()).unwrap();
        post(&mut arbiter, &dealings);

        // Player 1 alters the ciphertext honest dealer 2 posted
        let mut encrypted = dealings[&2].encrypted[&1].clone();
        encrypted.ciphertext.add(&Scalar::one());
        let complaint = Complaint::new(&keys[&1].0, public[&1].clone(), &public[&2], encrypted);
        assert!(matches!(
            arbiter.complaint(&complaint),
            Err(Error::ComplaintInvalid)
        ));
        assert!(!arbiter.is_disqualified(2));

        // The posted ciphertext yields an unfounded complaint
        let encrypted = dealings[&2].encrypted[&1].clone();
        let complaint = Complaint::new(&keys[&1].0, public[&1].clone(), &public[&2], encrypted);
        assert_eq!(
            arbiter.complaint(&complaint).unwrap(),
            Verdict::ComplaintUnfounded
        );

        let (_, disqualified) = arbiter.finalize();
        assert!(disqualified.is_empty());
    }
}
