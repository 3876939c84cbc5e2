//! Encrypted delivery of shares from a dealer to a player.
//!
//! Each participant holds a long-lived encryption keypair `(sk, pk = (G1 * sk, G2 * sk))`. A
//! dealer and a player derive the same Diffie-Hellman point `K = pk_player.g1 * sk_dealer =
//! pk_dealer.g1 * sk_player`, hash it (with the dealer and recipient indices) to a scalar mask,
//! and add the mask to the share.
//!
//! Because the public key carries a G2 half, anyone can check that a disclosed `K` is the
//! correct Diffie-Hellman point for two public keys with a pairing. This lets a player file a
//! complaint without revealing its private key.

use crate::bls12381::{
    dkg::{ops::generate_coefficient, ops::verify_private_commitment, Error},
    primitives::{
        group::{pairings_equal, Element, Point, Scalar, Share, G1, G2},
        ops::verify_public_commitment,
        poly,
    },
};
use rand::{CryptoRng, RngCore};
use std::fmt;
use zeroize::Zeroize;

/// Domain separation tag used to derive share masks.
pub const DST_CHANNEL: &[u8] = b"COMMONWARE_DKG_BLS12381_SHARE_MASK_";

/// Private key of an encryption keypair.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(Scalar);

impl PrivateKey {
    /// Wraps a scalar as a private key.
    pub fn new(scalar: Scalar) -> Self {
        Self(scalar)
    }

    /// Returns the underlying scalar.
    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }

    /// Derives the public key.
    pub fn public(&self) -> PublicKey {
        let mut g1 = G1::one();
        g1.mul(&self.0);
        let mut g2 = G2::one();
        g2.mul(&self.0);
        PublicKey { g1, g2 }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

impl Zeroize for PrivateKey {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Public key of an encryption keypair, committed in both groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub g1: G1,
    pub g2: G2,
}

impl PublicKey {
    /// Returns true if both halves commit to the same (non-zero) scalar.
    pub fn verify(&self) -> bool {
        !self.g1.is_zero() && verify_public_commitment(&self.g1, &self.g2)
    }
}

/// Generates a new encryption keypair.
pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<(PrivateKey, PublicKey), Error> {
    let (private, g1, g2) = generate_coefficient(rng)?;
    Ok((PrivateKey(private), PublicKey { g1, g2 }))
}

/// A share encrypted by `dealer` for the player at `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedShare {
    pub dealer: u32,
    pub index: u32,
    pub ciphertext: Scalar,
}

/// Derives the Diffie-Hellman point shared by the holder of `private` and the holder of `public`.
pub fn shared_key(private: &PrivateKey, public: &PublicKey) -> G1 {
    let mut key = public.g1;
    key.mul(&private.0);
    key
}

/// Returns true if `key` is the Diffie-Hellman point of `a` and `b`
/// (`e(key, G2) == e(a.g1, b.g2)`).
pub fn verify_shared_key(key: &G1, a: &PublicKey, b: &PublicKey) -> bool {
    if key.is_zero() {
        return false;
    }
    pairings_equal(key, &G2::one(), &a.g1, &b.g2)
}

fn mask(key: &G1, dealer: u32, index: u32) -> Scalar {
    let mut message = key.serialize_uncompressed();
    message.extend_from_slice(&dealer.to_be_bytes());
    message.extend_from_slice(&index.to_be_bytes());
    Scalar::map(DST_CHANNEL, &message)
}

/// Encrypts `value` from `dealer` for the player at `index`.
pub fn encrypt(
    sender: &PrivateKey,
    recipient: &PublicKey,
    dealer: u32,
    index: u32,
    value: &Scalar,
) -> EncryptedShare {
    let key = shared_key(sender, recipient);
    let mut ciphertext = mask(&key, dealer, index);
    ciphertext.add(value);
    EncryptedShare {
        dealer,
        index,
        ciphertext,
    }
}

/// Decrypts a share with a disclosed Diffie-Hellman point.
pub fn decrypt_with_key(key: &G1, encrypted: &EncryptedShare) -> Scalar {
    let mut value = encrypted.ciphertext;
    value.sub(&mask(key, encrypted.dealer, encrypted.index));
    value
}

/// Decrypts a share sent by the holder of `sender`.
pub fn decrypt(recipient: &PrivateKey, sender: &PublicKey, encrypted: &EncryptedShare) -> Scalar {
    decrypt_with_key(&shared_key(recipient, sender), encrypted)
}

/// Decrypts a share and checks it against the dealer's G1 commitment.
pub fn open(
    recipient: &PrivateKey,
    sender: &PublicKey,
    encrypted: &EncryptedShare,
    commitment: &poly::Feldman,
) -> Result<Share, Error> {
    let private = decrypt(recipient, sender, encrypted);
    if !verify_private_commitment(encrypted.index, &private, commitment) {
        return Err(Error::DecryptionMismatch {
            dealer: encrypted.dealer,
            index: encrypted.index,
        });
    }
    Ok(Share {
        index: encrypted.index,
        private,
    })
}
