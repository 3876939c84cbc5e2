//! Participants in a DKG that receive dealings from dealers and eventually
//! maintain a share of the group secret.

use crate::bls12381::{
    dkg::{
        channel::{self, EncryptedShare, PrivateKey, PublicKey},
        complaint::Complaint,
        ops,
        types::{Commitment, Commitments},
        Config, Error,
    },
    primitives::group::{Share, G2},
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Output of a DKG.
#[derive(Debug, Clone)]
pub struct Output {
    /// The group public key.
    pub public: G2,

    /// The player's share of the group secret. Any `t + 1` players can combine
    /// their partial signatures to recover a signature under the group public key.
    pub share: Share,

    /// The public key share of every participant.
    pub shares: BTreeMap<u32, G2>,
}

/// Track commitments and dealings distributed by dealers.
pub struct Player {
    config: Config,
    me: u32,
    channel_sk: PrivateKey,
    dealers: BTreeMap<u32, PublicKey>,

    dealings: BTreeMap<u32, (Commitment, Share)>,
}

impl Player {
    /// Create a new player for a DKG.
    ///
    /// `dealers` maps each dealer index to its encryption public key.
    pub fn new(
        config: Config,
        me: u32,
        channel_sk: PrivateKey,
        dealers: BTreeMap<u32, PublicKey>,
    ) -> Result<Self, Error> {
        config.check_index(me)?;
        for index in dealers.keys() {
            config.check_index(*index)?;
        }
        Ok(Self {
            config,
            me,
            channel_sk,
            dealers,
            dealings: BTreeMap::new(),
        })
    }

    /// Returns the player's index.
    pub fn index(&self) -> u32 {
        self.me
    }

    /// Returns the player's encryption public key.
    pub fn public_key(&self) -> PublicKey {
        self.channel_sk.public()
    }

    /// Verify and track an encrypted share from a dealer.
    pub fn share(
        &mut self,
        dealer: u32,
        commitment: Commitment,
        encrypted: &EncryptedShare,
    ) -> Result<(), Error> {
        // Ensure dealer is valid
        let Some(sender) = self.dealers.get(&dealer) else {
            return Err(Error::DealerInvalid);
        };

        // Check that share is for us
        if encrypted.index != self.me || encrypted.dealer != dealer {
            return Err(Error::MisdirectedShare);
        }
        if self.dealings.contains_key(&dealer) {
            return Err(Error::DuplicateShare);
        }

        // Verify commitment and share
        let result = commitment.verify(&self.config).and_then(|_| {
            channel::open(&self.channel_sk, sender, encrypted, commitment.feldman())
        });
        let share = match result {
            Ok(share) => share,
            Err(e) => {
                warn!(dealer, index = self.me, error = ?e, "invalid dealing");
                return Err(e);
            }
        };

        // Store dealing
        debug!(dealer, index = self.me, "accepted share");
        self.dealings.insert(dealer, (commitment, share));
        Ok(())
    }

    /// Verify and track the share the player dealt to itself.
    pub fn own(&mut self, commitment: Commitment, share: Share) -> Result<(), Error> {
        if share.index != self.me {
            return Err(Error::MisdirectedShare);
        }
        if self.dealings.contains_key(&self.me) {
            return Err(Error::DuplicateShare);
        }
        commitment.verify(&self.config)?;
        ops::verify_share(&self.config, self.me, &commitment, &share)?;
        self.dealings.insert(self.me, (commitment, share));
        Ok(())
    }

    /// Build a complaint against a dealer that sent an invalid share.
    pub fn complain(&self, dealer: u32, encrypted: EncryptedShare) -> Result<Complaint, Error> {
        let Some(accused) = self.dealers.get(&dealer) else {
            return Err(Error::DealerInvalid);
        };
        if encrypted.index != self.me || encrypted.dealer != dealer {
            return Err(Error::MisdirectedShare);
        }
        Ok(Complaint::new(
            &self.channel_sk,
            self.public_key(),
            accused,
            encrypted,
        ))
    }

    /// Return the count of tracked dealings.
    pub fn count(&self) -> usize {
        self.dealings.len()
    }

    /// If we are tracking shares for all `qualified` commitments, derive the
    /// group public key, our secret key share, and every public key share.
    pub fn finalize(self, qualified: &Commitments) -> Result<Output, Error> {
        // Ensure there are enough commitments to proceed
        if qualified.len() < self.config.required() as usize {
            return Err(Error::InsufficientDealings);
        }

        // Collect the share of every qualified dealer
        let mut shares = Vec::with_capacity(qualified.len());
        for (dealer, commitment) in qualified {
            let Some((stored, share)) = self.dealings.get(dealer) else {
                return Err(Error::MissingShare);
            };
            if stored != commitment {
                return Err(Error::MismatchedCommitment);
            }
            shares.push(*share);
        }

        // Derive keys
        let share = ops::derive_secret_key_share(self.me, &shares)?;
        let public = ops::derive_group_public_key(qualified);
        let public_shares = ops::derive_public_key_shares(&self.config, qualified)?;
        info!(
            index = self.me,
            dealers = qualified.len(),
            "derived secret key share"
        );
        Ok(Output {
            public,
            share,
            shares: public_shares,
        })
    }
}
