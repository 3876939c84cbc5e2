//! Participants in a DKG that contribute a secret polynomial.
//!
//! # Warning
//!
//! It is up to the developer to authorize interaction with the dealer. This is purposely
//! not provided by the dealer because this authorization function is highly dependent on
//! the context in which the dealer is being used.

use crate::bls12381::{
    dkg::{
        channel::{self, EncryptedShare, PrivateKey, PublicKey},
        merkle::{self, Digest},
        ops,
        types::Commitment,
        Config, Error,
    },
    primitives::group::Share,
};
use rand::{CryptoRng, RngCore};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Everything a dealer publishes or sends at the start of a DKG.
#[derive(Debug, Clone)]
pub struct Dealing {
    /// Commitment to the dealer's polynomial (posted to the arbiter and sent to every player).
    pub commitment: Commitment,
    /// Merkle root over the commitment (posted to the arbiter).
    pub root: Digest,
    /// The share the dealer deals to itself.
    pub share: Share,
    /// Encrypted shares keyed by recipient index.
    pub encrypted: BTreeMap<u32, EncryptedShare>,
}

/// Dealer output of a DKG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub active: Vec<u32>,
    pub inactive: Vec<u32>,
}

/// Track acks from recipients.
pub struct Dealer {
    config: Config,
    me: u32,
    acks: BTreeSet<u32>,
}

impl Dealer {
    /// Create a new dealer and the dealing it should distribute.
    ///
    /// A share is encrypted for every recipient other than the dealer itself.
    pub fn new<R: RngCore + CryptoRng>(
        rng: &mut R,
        config: Config,
        me: u32,
        channel_sk: &PrivateKey,
        recipients: &BTreeMap<u32, PublicKey>,
    ) -> Result<(Self, Dealing), Error> {
        config.check_index(me)?;
        for index in recipients.keys() {
            config.check_index(*index)?;
        }

        // Generate polynomial, commitment, and shares
        let (polynomial, commitment) = ops::generate_polynomial(rng, &config)?;
        let root = merkle::merkle_commit(&commitment);
        let share = ops::evaluate_share(me, &polynomial)?;
        let mut encrypted = BTreeMap::new();
        for (index, public) in recipients {
            if *index == me {
                continue;
            }
            let share = ops::evaluate_share(*index, &polynomial)?;
            encrypted.insert(
                *index,
                channel::encrypt(channel_sk, public, me, *index, &share.private),
            );
        }
        debug!(dealer = me, recipients = encrypted.len(), "generated dealing");

        // The dealer acknowledges its own share
        let mut acks = BTreeSet::new();
        acks.insert(me);
        Ok((
            Self { config, me, acks },
            Dealing {
                commitment,
                root,
                share,
                encrypted,
            },
        ))
    }

    /// Returns the dealer's index.
    pub fn index(&self) -> u32 {
        self.me
    }

    /// Track ack from a player.
    pub fn ack(&mut self, player: u32) -> Result<(), Error> {
        // Ensure player is valid
        self.config.check_index(player)?;

        // Store ack
        match self.acks.insert(player) {
            true => Ok(()),
            false => Err(Error::DuplicateAck),
        }
    }

    /// Return whether an ack has been received from a player.
    pub fn has(&self, player: u32) -> bool {
        self.acks.contains(&player)
    }

    /// Return the count of acks.
    pub fn count(&self) -> usize {
        self.acks.len()
    }

    /// If there exist at least `t + 1` acks, finalize.
    pub fn finalize(self) -> Option<Output> {
        // Ensure there are enough acks to proceed
        if self.acks.len() < self.config.required() as usize {
            return None;
        }

        // Return the list of players and players that weren't active
        let (active, inactive) = self
            .config
            .indices()
            .partition(|player| self.acks.contains(player));
        Some(Output { active, inactive })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn recipients(rng: &mut StdRng, n: u32) -> BTreeMap<u32, (PrivateKey, PublicKey)> {
        (1..=n)
            .map(|i| (i, channel::generate(rng).unwrap()))
            .collect()
    }

    #[test]
    fn test_dealing() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = Config::new(4, 1).unwrap();
        let keys = recipients(&mut rng, 4);
        let public = keys
            .iter()
            .map(|(i, (_, pk))| (*i, pk.clone()))
            .collect::<BTreeMap<_, _>>();
        let (dealer, dealing) = Dealer::new(&mut rng, config, 2, &keys[&2].0, &public).unwrap();
        assert_eq!(dealer.index(), 2);
        assert_eq!(dealing.share.index, 2);
        assert_eq!(dealing.root, merkle::merkle_commit(&dealing.commitment));
        assert_eq!(
            dealing.encrypted.keys().copied().collect::<Vec<_>>(),
            vec![1, 3, 4]
        );

        // Every recipient can open its share
        for (index, encrypted) in &dealing.encrypted {
            let share = channel::open(
                &keys[index].0,
                &public[&2],
                encrypted,
                dealing.commitment.feldman(),
            )
            .unwrap();
            assert_eq!(share.index, *index);
        }
    }

    #[test]
    fn test_acks() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = Config::new(5, 2).unwrap();
        let keys = recipients(&mut rng, 5);
        let public = keys
            .iter()
            .map(|(i, (_, pk))| (*i, pk.clone()))
            .collect::<BTreeMap<_, _>>();
        let (mut dealer, _) = Dealer::new(&mut rng, config, 1, &keys[&1].0, &public).unwrap();
        assert!(dealer.has(1));
        dealer.ack(3).unwrap();
        assert!(matches!(dealer.ack(3), Err(Error::DuplicateAck)));
        assert!(matches!(dealer.ack(6), Err(Error::InvalidIndex(6))));
        assert_eq!(dealer.count(), 2);

        // Not enough acks
        let (mut other, _) = Dealer::new(&mut rng, config, 1, &keys[&1].0, &public).unwrap();
        other.ack(2).unwrap();
        assert!(other.finalize().is_none());

        // Enough acks
        dealer.ack(5).unwrap();
        let output = dealer.finalize().unwrap();
        assert_eq!(output.active, vec![1, 3, 5]);
        assert_eq!(output.inactive, vec![2, 4]);
    }

    #[test]
    fn test_invalid_index() {
        let mut rng = StdRng::seed_from_u64(2);
        let config = Config::new(3, 1).unwrap();
        let keys = recipients(&mut rng, 3);
        let public = keys
            .iter()
            .map(|(i, (_, pk))| (*i, pk.clone()))
            .collect::<BTreeMap<_, _>>();
        assert!(matches!(
            Dealer::new(&mut rng, config, 0, &keys[&1].0, &public),
            Err(Error::InvalidIndex(0))
        ));
        assert!(matches!(
            Dealer::new(&mut rng, config, 4, &keys[&1].0, &public),
            Err(Error::InvalidIndex(4))
        ));
    }
}
