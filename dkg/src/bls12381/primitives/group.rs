//! Group operations over the BLS12-381 scalar field.
//!
//! This module wraps [blst](https://github.com/supranational/blst) and exposes the
//! small surface the DKG needs: scalar arithmetic, point addition and scalar
//! multiplication in G1 and G2, hashing to either group, pairings, and canonical
//! encodings (compressed bytes and uncompressed affine coordinates).
//!
//! # Warning
//!
//! Ensure that points are checked to belong to the correct subgroup
//! (G1 or G2) to prevent small subgroup attacks. This is particularly important
//! when handling deserialized points or points received from untrusted sources. This
//! is already taken care of for you if you use the provided `deserialize` and
//! `from_coordinates` functions.

use blst::{
    blst_bendian_from_scalar, blst_expand_message_xmd, blst_final_exp, blst_fp12, blst_fr,
    blst_fr_add, blst_fr_from_scalar, blst_fr_from_uint64, blst_fr_inverse, blst_fr_mul,
    blst_fr_sub, blst_hash_to_g1, blst_hash_to_g2, blst_keygen_v3, blst_miller_loop, blst_p1,
    blst_p1_add_or_double, blst_p1_affine, blst_p1_compress, blst_p1_deserialize,
    blst_p1_from_affine, blst_p1_in_g1, blst_p1_is_inf, blst_p1_mult, blst_p1_serialize,
    blst_p1_to_affine, blst_p1_uncompress, blst_p2, blst_p2_add_or_double, blst_p2_affine,
    blst_p2_compress, blst_p2_deserialize, blst_p2_from_affine, blst_p2_in_g2, blst_p2_is_inf,
    blst_p2_mult, blst_p2_serialize, blst_p2_to_affine, blst_p2_uncompress, blst_scalar,
    blst_scalar_fr_check, blst_scalar_from_be_bytes, blst_scalar_from_bendian,
    blst_scalar_from_fr, BLS12_381_G1, BLS12_381_G2, BLST_ERROR,
};
use rand::RngCore;
use std::ptr;
use zeroize::Zeroize;

/// An element of a group.
pub trait Element: Clone + Eq + PartialEq + Send + Sync {
    /// Returns the additive identity.
    fn zero() -> Self;

    /// Returns the multiplicative identity.
    fn one() -> Self;

    /// Adds to self in-place.
    fn add(&mut self, rhs: &Self);

    /// Multiplies self in-place.
    fn mul(&mut self, rhs: &Scalar);

    /// Canonically serializes the element.
    fn serialize(&self) -> Vec<u8>;

    /// Serialized size of the element.
    fn size() -> usize;

    /// Deserializes a canonically encoded element.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

/// An element of a group that supports message hashing.
pub trait Point: Element {
    /// Maps the provided data to a group element.
    fn map(&mut self, message: &[u8]);

    /// Returns true if the point is the identity.
    fn is_zero(&self) -> bool;

    /// Serializes the point as uncompressed affine coordinates (in the order
    /// they are returned by `coordinates`).
    fn serialize_uncompressed(&self) -> Vec<u8>;
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(transparent)]
pub struct Scalar(blst_fr);

pub const SCALAR_LENGTH: usize = 32;

/// The order of the BLS12-381 scalar field (big-endian).
pub const GROUP_ORDER: [u8; SCALAR_LENGTH] = [
    0x73, 0xed, 0xa7, 0x53, 0x29, 0x9d, 0x7d, 0x48, 0x33, 0x39, 0xd8, 0x08, 0x09, 0xa1, 0xd8, 0x05,
    0x53, 0xbd, 0xa4, 0x02, 0xff, 0xfe, 0x5b, 0xfe, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x01,
];

/// `R = 2^256 mod q` in little-endian Montgomery form which is equivalent to 1 in little-endian
/// non-Montgomery form.
///
/// mod(2^256, 0x73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001) = 0x1824b159acc5056f998c4fefecbc4ff55884b7fa0003480200000001fffffffe
// Reference: https://github.com/filecoin-project/blstrs/blob/ffbb41d1495d84e40a712583346439924603b49a/src/scalar.rs#L77-L89
const BLST_FR_ONE: Scalar = Scalar(blst_fr {
    l: [
        0x0000_0001_ffff_fffe,
        0x5884_b7fa_0003_4802,
        0x998c_4fef_ecbc_4ff5,
        0x1824_b159_acc5_056f,
    ],
});

/// Length of a base field element (a single affine coordinate).
pub const FIELD_ELEMENT_LENGTH: usize = 48;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(transparent)]
pub struct G1(blst_p1);

pub const G1_ELEMENT_BYTE_LENGTH: usize = 48;

/// Domain separation tag for hashing a message to G1.
pub const DST_G1: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(transparent)]
pub struct G2(blst_p2);

pub const G2_ELEMENT_BYTE_LENGTH: usize = 96;

/// Domain separation tag for hashing a message to G2.
pub const DST_G2: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct GT(blst_fp12);

pub type Private = Scalar;
pub const PRIVATE_KEY_LENGTH: usize = SCALAR_LENGTH;

/// Public keys (and the group public key) live in G2.
pub type Public = G2;
pub const PUBLIC_KEY_LENGTH: usize = G2_ELEMENT_BYTE_LENGTH;

/// Signatures (and Feldman share commitments) live in G1.
pub type Signature = G1;
pub const SIGNATURE_LENGTH: usize = G1_ELEMENT_BYTE_LENGTH;

/// Returns the size in bits of a given blst_scalar (represented in little-endian).
fn bits(scalar: &blst_scalar) -> usize {
    let mut bits: usize = SCALAR_LENGTH * 8;
    for i in scalar.b.iter().rev() {
        let leading = i.leading_zeros();
        bits -= leading as usize;
        if leading < 8 {
            break;
        }
    }
    bits
}

/// A share of a threshold signing key.
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub struct Share {
    /// The index the share was evaluated at (1-based).
    pub index: u32,
    /// The scalar corresponding to the share's secret.
    pub private: Private,
}

impl Share {
    /// Returns the public key corresponding to the share.
    ///
    /// This can be verified against the G2 commitments of every dealer.
    pub fn public(&self) -> Public {
        let mut public = <Public as Element>::one();
        public.mul(&self.private);
        public
    }

    /// Returns the G1 commitment to the share (the left-hand side of the
    /// Feldman check).
    pub fn commitment(&self) -> G1 {
        let mut commitment = G1::one();
        commitment.mul(&self.private);
        commitment
    }

    /// Canonically serializes the share.
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = [0u8; SCALAR_LENGTH + 4];
        bytes[..4].copy_from_slice(&self.index.to_be_bytes());
        bytes[4..].copy_from_slice(&self.private.serialize());
        bytes.to_vec()
    }

    /// Deserializes a canonically encoded share.
    pub fn deserialize(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != SCALAR_LENGTH + 4 {
            return None;
        }
        let index = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if index == 0 {
            return None;
        }
        let private = Private::deserialize(&bytes[4..])?;
        Some(Self { index, private })
    }
}

impl Zeroize for Share {
    fn zeroize(&mut self) {
        self.private.zeroize();
    }
}

impl Scalar {
    /// Generates a random scalar using the provided RNG.
    pub fn rand<R: RngCore>(rng: &mut R) -> Self {
        // Generate a random 64 byte buffer
        let mut ikm = [0u8; 64];
        rng.fill_bytes(&mut ikm);
        let scalar = Self::from_ikm(&ikm);
        ikm.zeroize();
        scalar
    }

    /// Generates a random scalar, surfacing a failure of the RNG instead of panicking.
    pub fn try_rand<R: RngCore>(rng: &mut R) -> Result<Self, rand::Error> {
        let mut ikm = [0u8; 64];
        rng.try_fill_bytes(&mut ikm)?;
        let scalar = Self::from_ikm(&ikm);
        ikm.zeroize();
        Ok(scalar)
    }

    fn from_ikm(ikm: &[u8]) -> Self {
        let mut ret = blst_fr::default();
        unsafe {
            let mut sc = blst_scalar::default();
            blst_keygen_v3(&mut sc, ikm.as_ptr(), ikm.len(), ptr::null(), 0);
            blst_fr_from_scalar(&mut ret, &sc);
        }
        Self(ret)
    }

    /// Returns the scalar corresponding to a participant index.
    pub fn from_index(i: u32) -> Self {
        let mut ret = Self::zero();
        ret.set_int(i);
        ret
    }

    /// Sets the scalar to be the provided integer.
    pub fn set_int(&mut self, i: u32) {
        // blst requires a buffer of 4 uint64 values. Failure to provide one will
        // result in unexpected behavior (will read past the provided buffer).
        //
        // Reference: https://github.com/supranational/blst/blob/415d4f0e2347a794091836a3065206edfd9c72f3/bindings/blst.h#L102
        let buffer = [i as u64, 0, 0, 0];
        unsafe { blst_fr_from_uint64(&mut self.0, buffer.as_ptr()) };
    }

    /// Maps arbitrary data to a scalar (`hash_to_field` with `expand_message_xmd`).
    ///
    /// 64 bytes are expanded so that the reduction modulo the group order is
    /// statistically uniform.
    pub fn map(dst: &[u8], message: &[u8]) -> Self {
        let mut expanded = [0u8; 64];
        let mut ret = blst_fr::default();
        unsafe {
            blst_expand_message_xmd(
                expanded.as_mut_ptr(),
                expanded.len(),
                message.as_ptr(),
                message.len(),
                dst.as_ptr(),
                dst.len(),
            );
            let mut sc = blst_scalar::default();

            // Returns false only when the reduction is zero, which is still a
            // valid field element.
            blst_scalar_from_be_bytes(&mut sc, expanded.as_ptr(), expanded.len());
            blst_fr_from_scalar(&mut ret, &sc);
        }
        Self(ret)
    }

    /// Computes the inverse of the scalar.
    pub fn inverse(&self) -> Option<Self> {
        if *self == Self::zero() {
            return None;
        }
        let mut ret = blst_fr::default();
        unsafe { blst_fr_inverse(&mut ret, &self.0) };
        Some(Self(ret))
    }

    /// Subtracts the provided scalar from self in-place.
    pub fn sub(&mut self, rhs: &Self) {
        unsafe { blst_fr_sub(&mut self.0, &self.0, &rhs.0) }
    }
}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        self.0.l.zeroize();
    }
}

impl Element for Scalar {
    fn zero() -> Self {
        Self(blst_fr::default())
    }

    fn one() -> Self {
        BLST_FR_ONE
    }

    fn add(&mut self, rhs: &Self) {
        unsafe {
            blst_fr_add(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn mul(&mut self, rhs: &Self) {
        unsafe {
            blst_fr_mul(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn serialize(&self) -> Vec<u8> {
        let mut bytes = [0u8; SCALAR_LENGTH];
        unsafe {
            let mut scalar = blst_scalar::default();
            blst_scalar_from_fr(&mut scalar, &self.0);
            blst_bendian_from_scalar(bytes.as_mut_ptr(), &scalar);
        }
        bytes.to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != SCALAR_LENGTH {
            return None;
        }
        let mut ret = blst_fr::default();
        unsafe {
            let mut scalar = blst_scalar::default();
            blst_scalar_from_bendian(&mut scalar, bytes.as_ptr());
            if !blst_scalar_fr_check(&scalar) {
                return None;
            }
            blst_fr_from_scalar(&mut ret, &scalar);
        }
        Some(Self(ret))
    }

    fn size() -> usize {
        SCALAR_LENGTH
    }
}

impl G1 {
    /// Returns the affine coordinates `[x, y]` as big-endian field elements.
    ///
    /// The identity is encoded as all-zero coordinates.
    pub fn coordinates(&self) -> [[u8; FIELD_ELEMENT_LENGTH]; 2] {
        let mut coordinates = [[0u8; FIELD_ELEMENT_LENGTH]; 2];
        if self.is_zero() {
            return coordinates;
        }
        let bytes = self.serialize_uncompressed();
        coordinates[0].copy_from_slice(&bytes[..FIELD_ELEMENT_LENGTH]);
        coordinates[1].copy_from_slice(&bytes[FIELD_ELEMENT_LENGTH..]);
        coordinates
    }

    /// Constructs a point from affine coordinates, checking that it is on the
    /// curve and in G1.
    pub fn from_coordinates(coordinates: &[[u8; FIELD_ELEMENT_LENGTH]; 2]) -> Option<Self> {
        if coordinates.iter().all(|c| c.iter().all(|b| *b == 0)) {
            return Some(Self::zero());
        }
        let mut bytes = [0u8; 2 * FIELD_ELEMENT_LENGTH];
        bytes[..FIELD_ELEMENT_LENGTH].copy_from_slice(&coordinates[0]);
        bytes[FIELD_ELEMENT_LENGTH..].copy_from_slice(&coordinates[1]);

        // Flag bits (compression, infinity, sign) must be unset for an uncompressed point
        if bytes[0] & 0xe0 != 0 {
            return None;
        }
        let mut ret = blst_p1::default();
        unsafe {
            let mut affine = blst_p1_affine::default();
            if blst_p1_deserialize(&mut affine, bytes.as_ptr()) != BLST_ERROR::BLST_SUCCESS {
                return None;
            }
            blst_p1_from_affine(&mut ret, &affine);
            if !blst_p1_in_g1(&ret) {
                return None;
            }
        }
        Some(Self(ret))
    }

    pub(crate) fn as_blst_p1_affine(&self) -> blst_p1_affine {
        let mut affine = blst_p1_affine::default();
        unsafe { blst_p1_to_affine(&mut affine, &self.0) };
        affine
    }
}

impl Element for G1 {
    fn zero() -> Self {
        Self(blst_p1::default())
    }

    fn one() -> Self {
        let mut ret = blst_p1::default();
        unsafe {
            blst_p1_from_affine(&mut ret, &BLS12_381_G1);
        }
        Self(ret)
    }

    fn add(&mut self, rhs: &Self) {
        unsafe {
            blst_p1_add_or_double(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn mul(&mut self, rhs: &Scalar) {
        let mut scalar: blst_scalar = blst_scalar::default();
        unsafe {
            blst_scalar_from_fr(&mut scalar, &rhs.0);
            blst_p1_mult(&mut self.0, &self.0, scalar.b.as_ptr(), bits(&scalar));
        }
    }

    fn serialize(&self) -> Vec<u8> {
        let mut bytes = [0u8; G1_ELEMENT_BYTE_LENGTH];
        unsafe {
            blst_p1_compress(bytes.as_mut_ptr(), &self.0);
        }
        bytes.to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != G1_ELEMENT_BYTE_LENGTH {
            return None;
        }
        let mut ret = blst_p1::default();
        unsafe {
            let mut affine = blst_p1_affine::default();
            if blst_p1_uncompress(&mut affine, bytes.as_ptr()) != BLST_ERROR::BLST_SUCCESS {
                return None;
            }
            blst_p1_from_affine(&mut ret, &affine);

            // Verify that deserialized element isn't infinite
            if blst_p1_is_inf(&ret) {
                return None;
            }

            // Verify that the deserialized element is in G1
            if !blst_p1_in_g1(&ret) {
                return None;
            }
        }
        Some(Self(ret))
    }

    fn size() -> usize {
        G1_ELEMENT_BYTE_LENGTH
    }
}

impl Point for G1 {
    fn map(&mut self, data: &[u8]) {
        unsafe {
            blst_hash_to_g1(
                &mut self.0,
                data.as_ptr(),
                data.len(),
                DST_G1.as_ptr(),
                DST_G1.len(),
                ptr::null(),
                0,
            );
        }
    }

    fn is_zero(&self) -> bool {
        unsafe { blst_p1_is_inf(&self.0) }
    }

    fn serialize_uncompressed(&self) -> Vec<u8> {
        let mut bytes = [0u8; 2 * FIELD_ELEMENT_LENGTH];
        unsafe {
            blst_p1_serialize(bytes.as_mut_ptr(), &self.0);
        }
        bytes.to_vec()
    }
}

impl G2 {
    /// Returns the affine coordinates `[x_c0, x_c1, y_c0, y_c1]` as big-endian
    /// field elements.
    ///
    /// The identity is encoded as all-zero coordinates.
    pub fn coordinates(&self) -> [[u8; FIELD_ELEMENT_LENGTH]; 4] {
        let mut coordinates = [[0u8; FIELD_ELEMENT_LENGTH]; 4];
        if self.is_zero() {
            return coordinates;
        }

        // blst serializes each Fp2 element as `c1 || c0`
        let bytes = self.serialize_uncompressed();
        let limb = |i: usize| &bytes[i * FIELD_ELEMENT_LENGTH..(i + 1) * FIELD_ELEMENT_LENGTH];
        coordinates[0].copy_from_slice(limb(1));
        coordinates[1].copy_from_slice(limb(0));
        coordinates[2].copy_from_slice(limb(3));
        coordinates[3].copy_from_slice(limb(2));
        coordinates
    }

    /// Constructs a point from affine coordinates, checking that it is on the
    /// curve and in G2.
    pub fn from_coordinates(coordinates: &[[u8; FIELD_ELEMENT_LENGTH]; 4]) -> Option<Self> {
        if coordinates.iter().all(|c| c.iter().all(|b| *b == 0)) {
            return Some(Self::zero());
        }
        let mut bytes = [0u8; 4 * FIELD_ELEMENT_LENGTH];
        for (i, source) in [1, 0, 3, 2].into_iter().enumerate() {
            bytes[i * FIELD_ELEMENT_LENGTH..(i + 1) * FIELD_ELEMENT_LENGTH]
                .copy_from_slice(&coordinates[source]);
        }
        if bytes[0] & 0xe0 != 0 {
            return None;
        }
        let mut ret = blst_p2::default();
        unsafe {
            let mut affine = blst_p2_affine::default();
            if blst_p2_deserialize(&mut affine, bytes.as_ptr()) != BLST_ERROR::BLST_SUCCESS {
                return None;
            }
            blst_p2_from_affine(&mut ret, &affine);
            if !blst_p2_in_g2(&ret) {
                return None;
            }
        }
        Some(Self(ret))
    }

    pub(crate) fn as_blst_p2_affine(&self) -> blst_p2_affine {
        let mut affine = blst_p2_affine::default();
        unsafe { blst_p2_to_affine(&mut affine, &self.0) };
        affine
    }
}

impl Element for G2 {
    fn zero() -> Self {
        Self(blst_p2::default())
    }

    fn one() -> Self {
        let mut ret = blst_p2::default();
        unsafe {
            blst_p2_from_affine(&mut ret, &BLS12_381_G2);
        }
        Self(ret)
    }

    fn add(&mut self, rhs: &Self) {
        unsafe {
            blst_p2_add_or_double(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn mul(&mut self, rhs: &Scalar) {
        let mut scalar = blst_scalar::default();
        unsafe {
            blst_scalar_from_fr(&mut scalar, &rhs.0);
            blst_p2_mult(&mut self.0, &self.0, scalar.b.as_ptr(), bits(&scalar));
        }
    }

    fn serialize(&self) -> Vec<u8> {
        let mut bytes = [0u8; G2_ELEMENT_BYTE_LENGTH];
        unsafe {
            blst_p2_compress(bytes.as_mut_ptr(), &self.0);
        }
        bytes.to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != G2_ELEMENT_BYTE_LENGTH {
            return None;
        }
        let mut ret = blst_p2::default();
        unsafe {
            let mut affine = blst_p2_affine::default();
            if blst_p2_uncompress(&mut affine, bytes.as_ptr()) != BLST_ERROR::BLST_SUCCESS {
                return None;
            }
            blst_p2_from_affine(&mut ret, &affine);

            // Verify that deserialized element isn't infinite
            if blst_p2_is_inf(&ret) {
                return None;
            }

            // Verify that the deserialized element is in G2
            if !blst_p2_in_g2(&ret) {
                return None;
            }
        }
        Some(Self(ret))
    }

    fn size() -> usize {
        G2_ELEMENT_BYTE_LENGTH
    }
}

impl Point for G2 {
    fn map(&mut self, data: &[u8]) {
        unsafe {
            blst_hash_to_g2(
                &mut self.0,
                data.as_ptr(),
                data.len(),
                DST_G2.as_ptr(),
                DST_G2.len(),
                ptr::null(),
                0,
            );
        }
    }

    fn is_zero(&self) -> bool {
        unsafe { blst_p2_is_inf(&self.0) }
    }

    fn serialize_uncompressed(&self) -> Vec<u8> {
        let mut bytes = [0u8; 4 * FIELD_ELEMENT_LENGTH];
        unsafe {
            blst_p2_serialize(bytes.as_mut_ptr(), &self.0);
        }
        bytes.to_vec()
    }
}

/// Computes `e(p, q)`.
///
/// Returns `None` if either input is the identity (the Miller loop is only
/// defined over non-zero affine points).
pub fn pairing(p: &G1, q: &G2) -> Option<GT> {
    if p.is_zero() || q.is_zero() {
        return None;
    }

    // Reference: https://github.com/MystenLabs/fastcrypto/blob/bd4999bd3e901eab34ae3dd96dbe38b86ac646a7/fastcrypto/src/groups/bls12381.rs#L223-L234
    let pa = p.as_blst_p1_affine();
    let qa = q.as_blst_p2_affine();
    let mut res = blst_fp12::default();
    unsafe {
        blst_miller_loop(&mut res, &qa, &pa);
        blst_final_exp(&mut res, &res);
    }
    Some(GT(res))
}

/// Returns true if `e(a, b) == e(c, d)`.
///
/// A pairing with the identity is the identity in GT, so two pairings that
/// both involve the identity are considered equal.
pub fn pairings_equal(a: &G1, b: &G2, c: &G1, d: &G2) -> bool {
    match (pairing(a, b), pairing(c, d)) {
        (Some(left), Some(right)) => left == right,
        (None, None) => true,
        _ => false,
    }
}
