//! Persistence of a DKG run as versioned JSON.
//!
//! A [Snapshot] captures the public and private data of a run (encryption keys, polynomials,
//! commitments, shares, and Merkle roots), the derived keys, and the aggregated commitments used
//! to adjudicate complaints. It is the only place this crate performs I/O.
//!
//! Every scalar and field element is written as a decimal string. G1 points are `[x, y]` and G2
//! points are `[x_c0, x_c1, y_c0, y_c1]`. Merkle roots are `0x`-prefixed hex. Dealers and
//! participants are listed in index order (position `i` holds index `i + 1`).

use crate::bls12381::{
    dkg::{
        channel::{PrivateKey, PublicKey},
        complaint::{aggregate_commitment, AggregatedCommitment},
        merkle::{self, Digest, DIGEST_LENGTH},
        types::{Commitment, Commitments},
        Config, Error,
    },
    primitives::{
        group::{Element, Scalar, FIELD_ELEMENT_LENGTH, G1, G2, SCALAR_LENGTH},
        poly::{self, Poly},
    },
};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    io::{Read, Write},
};

/// Current version of the snapshot format.
pub const VERSION: u32 = 1;

/// Everything a single dealer generated.
#[derive(Debug, Clone)]
pub struct DealerRecord {
    pub channel_sk: PrivateKey,
    pub channel_pk: PublicKey,
    pub polynomial: poly::Private,
    pub commitment: Commitment,
    /// Plaintext share for every index `1..=n`.
    pub shares: Vec<Scalar>,
    /// Ciphertext for every index `1..=n` other than the dealer's own.
    pub encrypted: BTreeMap<u32, Scalar>,
    pub root: Digest,
}

/// Keys derived once the qualified dealers are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDkg {
    /// Public key share of every index `1..=n`.
    pub public_shares: Vec<G2>,
    /// Secret key share of every index `1..=n`.
    pub secret_shares: Vec<Scalar>,
    pub public: G2,
    /// The group secret (only ever known when every share is gathered in one place).
    pub secret: Option<Scalar>,
}

/// Aggregated commitments of every other dealer at one claimant's index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintRecord {
    pub claimant: u32,
    pub commitments: BTreeMap<u32, AggregatedCommitment>,
}

/// A persisted DKG run.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub config: Config,
    pub dealers: Vec<DealerRecord>,
    pub post: Option<PostDkg>,
    pub complaint: Vec<ComplaintRecord>,
}

impl Snapshot {
    /// Computes the aggregated commitment of every dealer at every other participant's index.
    pub fn complaint_data(
        config: &Config,
        commitments: &Commitments,
    ) -> Result<Vec<ComplaintRecord>, Error> {
        config
            .indices()
            .map(|claimant| {
                let commitments = commitments
                    .iter()
                    .filter(|(dealer, _)| **dealer != claimant)
                    .map(|(dealer, commitment)| {
                        Ok((*dealer, aggregate_commitment(claimant, commitment.feldman())?))
                    })
                    .collect::<Result<BTreeMap<_, _>, Error>>()?;
                Ok(ComplaintRecord {
                    claimant,
                    commitments,
                })
            })
            .collect()
    }

    /// Returns the commitments of every dealer keyed by index.
    pub fn commitments(&self) -> Commitments {
        self.dealers
            .iter()
            .zip(1..)
            .map(|(record, index)| (index, record.commitment.clone()))
            .collect()
    }

    /// Writes the snapshot as JSON.
    pub fn save<W: Write>(&self, writer: W) -> Result<(), Error> {
        let document = Document::encode(self)?;
        serde_json::to_writer_pretty(writer, &document)?;
        Ok(())
    }

    /// Reads and validates a snapshot.
    pub fn load<R: Read>(reader: R) -> Result<Self, Error> {
        let value: serde_json::Value = serde_json::from_reader(reader)?;
        let version = value
            .get("version")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| Error::Snapshot("missing version".into()))?;
        if version != VERSION as u64 {
            return Err(Error::UnsupportedVersion(version as u32));
        }
        let document: Document = serde_json::from_value(value)?;
        document.decode()
    }
}

#[derive(Serialize, Deserialize)]
struct Params {
    n: u32,
    t: u32,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DkgData {
    enc_sks: Vec<String>,
    enc_pks: Vec<[String; 2]>,
    enc_pks_g2: Vec<[String; 4]>,
    coefs: Vec<Vec<String>>,
    pub_commit_g1: Vec<Vec<[String; 2]>>,
    pub_commit_g2: Vec<Vec<[String; 4]>>,
    prv_commit: Vec<Vec<String>>,
    prv_commit_enc: Vec<Vec<String>>,
    merkle_commit: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct PostDkgData {
    pks: Vec<[String; 4]>,
    sks: Vec<String>,
    #[serde(rename = "groupPK")]
    group_pk: [String; 4],
    #[serde(rename = "groupSK", default, skip_serializing_if = "Option::is_none")]
    group_sk: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct AggregatedData {
    index: u32,
    commitments: BTreeMap<u32, Vec<[String; 2]>>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComplaintData {
    aggregated_commitments: Vec<AggregatedData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    version: u32,
    params: Params,
    dkg_data: DkgData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    post_dkg: Option<PostDkgData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    complaint: Option<ComplaintData>,
}

fn to_decimal(bytes: &[u8]) -> String {
    BigUint::from_bytes_be(bytes).to_str_radix(10)
}

fn from_decimal<const N: usize>(value: &str) -> Result<[u8; N], Error> {
    let parsed = BigUint::parse_bytes(value.as_bytes(), 10)
        .ok_or_else(|| Error::Snapshot(format!("invalid decimal: {value}")))?;
    let bytes = parsed.to_bytes_be();
    if bytes.len() > N {
        return Err(Error::Snapshot(format!("value too large: {value}")));
    }
    let mut out = [0u8; N];
    out[N - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

fn encode_scalar(scalar: &Scalar) -> String {
    to_decimal(&scalar.serialize())
}

fn decode_scalar(value: &str) -> Result<Scalar, Error> {
    let bytes = from_decimal::<SCALAR_LENGTH>(value)?;
    Scalar::deserialize(&bytes).ok_or_else(|| Error::Snapshot(format!("invalid scalar: {value}")))
}

fn encode_g1(point: &G1) -> [String; 2] {
    point.coordinates().map(|c| to_decimal(&c))
}

fn decode_g1(coordinates: &[String; 2]) -> Result<G1, Error> {
    let mut bytes = [[0u8; FIELD_ELEMENT_LENGTH]; 2];
    for (out, value) in bytes.iter_mut().zip(coordinates) {
        *out = from_decimal(value)?;
    }
    G1::from_coordinates(&bytes).ok_or_else(|| Error::Snapshot("invalid G1 point".into()))
}

fn encode_g2(point: &G2) -> [String; 4] {
    point.coordinates().map(|c| to_decimal(&c))
}

fn decode_g2(coordinates: &[String; 4]) -> Result<G2, Error> {
    let mut bytes = [[0u8; FIELD_ELEMENT_LENGTH]; 4];
    for (out, value) in bytes.iter_mut().zip(coordinates) {
        *out = from_decimal(value)?;
    }
    G2::from_coordinates(&bytes).ok_or_else(|| Error::Snapshot("invalid G2 point".into()))
}

fn encode_root(root: &Digest) -> String {
    format!("0x{}", hex::encode(root))
}

fn decode_root(value: &str) -> Result<Digest, Error> {
    let stripped = value
        .strip_prefix("0x")
        .ok_or_else(|| Error::Snapshot(format!("root missing 0x prefix: {value}")))?;
    let bytes = hex::decode(stripped).map_err(|e| Error::Snapshot(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| Error::Snapshot(format!("root must be {DIGEST_LENGTH} bytes")))
}

fn expect_len<T>(items: &[T], len: usize, field: &str) -> Result<(), Error> {
    if items.len() != len {
        return Err(Error::Snapshot(format!(
            "{field}: expected {len} entries, found {}",
            items.len()
        )));
    }
    Ok(())
}

impl Document {
    fn encode(snapshot: &Snapshot) -> Result<Self, Error> {
        let config = &snapshot.config;
        let n = config.n() as usize;
        expect_len(&snapshot.dealers, n, "dealers")?;

        let mut data = DkgData {
            enc_sks: Vec::with_capacity(n),
            enc_pks: Vec::with_capacity(n),
            enc_pks_g2: Vec::with_capacity(n),
            coefs: Vec::with_capacity(n),
            pub_commit_g1: Vec::with_capacity(n),
            pub_commit_g2: Vec::with_capacity(n),
            prv_commit: Vec::with_capacity(n),
            prv_commit_enc: Vec::with_capacity(n),
            merkle_commit: Vec::with_capacity(n),
        };
        for (record, dealer) in snapshot.dealers.iter().zip(1u32..) {
            expect_len(&record.shares, n, "prvCommit")?;
            let mut encrypted = Vec::with_capacity(n - 1);
            for index in config.indices().filter(|i| *i != dealer) {
                let ciphertext = record.encrypted.get(&index).ok_or_else(|| {
                    Error::Snapshot(format!("missing ciphertext from {dealer} to {index}"))
                })?;
                encrypted.push(encode_scalar(ciphertext));
            }

            data.enc_sks.push(encode_scalar(record.channel_sk.as_scalar()));
            data.enc_pks.push(encode_g1(&record.channel_pk.g1));
            data.enc_pks_g2.push(encode_g2(&record.channel_pk.g2));
            data.coefs.push(
                record
                    .polynomial
                    .coefficients()
                    .iter()
                    .map(encode_scalar)
                    .collect(),
            );
            data.pub_commit_g1.push(
                record
                    .commitment
                    .feldman()
                    .coefficients()
                    .iter()
                    .map(encode_g1)
                    .collect(),
            );
            data.pub_commit_g2.push(
                record
                    .commitment
                    .public()
                    .coefficients()
                    .iter()
                    .map(encode_g2)
                    .collect(),
            );
            data.prv_commit
                .push(record.shares.iter().map(encode_scalar).collect());
            data.prv_commit_enc.push(encrypted);
            data.merkle_commit.push(encode_root(&record.root));
        }

        let post_dkg = snapshot.post.as_ref().map(|post| PostDkgData {
            pks: post.public_shares.iter().map(encode_g2).collect(),
            sks: post.secret_shares.iter().map(encode_scalar).collect(),
            group_pk: encode_g2(&post.public),
            group_sk: post.secret.as_ref().map(encode_scalar),
        });

        let complaint = (!snapshot.complaint.is_empty()).then(|| ComplaintData {
            aggregated_commitments: snapshot
                .complaint
                .iter()
                .map(|record| AggregatedData {
                    index: record.claimant,
                    commitments: record
                        .commitments
                        .iter()
                        .map(|(dealer, aggregated)| {
                            (*dealer, aggregated.entries().iter().map(encode_g1).collect())
                        })
                        .collect(),
                })
                .collect(),
        });

        Ok(Self {
            version: VERSION,
            params: Params {
                n: config.n(),
                t: config.t(),
            },
            dkg_data: data,
            post_dkg,
            complaint,
        })
    }

    fn decode(self) -> Result<Snapshot, Error> {
        let config = Config::new(self.params.n, self.params.t)?;
        let n = config.n() as usize;
        let required = config.required() as usize;
        let data = self.dkg_data;
        expect_len(&data.enc_sks, n, "encSks")?;
        expect_len(&data.enc_pks, n, "encPks")?;
        expect_len(&data.enc_pks_g2, n, "encPksG2")?;
        expect_len(&data.coefs, n, "coefs")?;
        expect_len(&data.pub_commit_g1, n, "pubCommitG1")?;
        expect_len(&data.pub_commit_g2, n, "pubCommitG2")?;
        expect_len(&data.prv_commit, n, "prvCommit")?;
        expect_len(&data.prv_commit_enc, n, "prvCommitEnc")?;
        expect_len(&data.merkle_commit, n, "merkleCommit")?;

        let mut dealers = Vec::with_capacity(n);
        for (position, dealer) in config.indices().enumerate() {
            let channel_sk = PrivateKey::new(decode_scalar(&data.enc_sks[position])?);
            let channel_pk = PublicKey {
                g1: decode_g1(&data.enc_pks[position])?,
                g2: decode_g2(&data.enc_pks_g2[position])?,
            };

            expect_len(&data.coefs[position], required, "coefs")?;
            let coefficients = data.coefs[position]
                .iter()
                .map(|c| decode_scalar(c))
                .collect::<Result<Vec<_>, _>>()?;

            expect_len(&data.pub_commit_g1[position], required, "pubCommitG1")?;
            expect_len(&data.pub_commit_g2[position], required, "pubCommitG2")?;
            let g1 = data.pub_commit_g1[position]
                .iter()
                .map(decode_g1)
                .collect::<Result<Vec<_>, _>>()?;
            let g2 = data.pub_commit_g2[position]
                .iter()
                .map(decode_g2)
                .collect::<Result<Vec<_>, _>>()?;

            expect_len(&data.prv_commit[position], n, "prvCommit")?;
            let shares = data.prv_commit[position]
                .iter()
                .map(|s| decode_scalar(s))
                .collect::<Result<Vec<_>, _>>()?;

            expect_len(&data.prv_commit_enc[position], n - 1, "prvCommitEnc")?;
            let encrypted = config
                .indices()
                .filter(|i| *i != dealer)
                .zip(&data.prv_commit_enc[position])
                .map(|(index, c)| Ok((index, decode_scalar(c)?)))
                .collect::<Result<BTreeMap<_, _>, Error>>()?;

            // The commitment must be consistent and fingerprinted by its root
            let commitment = Commitment::new(Poly::from(g1), Poly::from(g2))?;
            commitment.verify(&config)?;
            let root = decode_root(&data.merkle_commit[position])?;
            if merkle::merkle_commit(&commitment) != root {
                return Err(Error::MerkleRootMismatch);
            }

            dealers.push(DealerRecord {
                channel_sk,
                channel_pk,
                polynomial: Poly::from(coefficients),
                commitment,
                shares,
                encrypted,
                root,
            });
        }

        let post = match self.post_dkg {
            Some(post) => {
                expect_len(&post.pks, n, "pks")?;
                expect_len(&post.sks, n, "sks")?;
                Some(PostDkg {
                    public_shares: post
                        .pks
                        .iter()
                        .map(decode_g2)
                        .collect::<Result<Vec<_>, _>>()?,
                    secret_shares: post
                        .sks
                        .iter()
                        .map(|s| decode_scalar(s))
                        .collect::<Result<Vec<_>, _>>()?,
                    public: decode_g2(&post.group_pk)?,
                    secret: post.group_sk.as_deref().map(decode_scalar).transpose()?,
                })
            }
            None => None,
        };

        let mut complaint = Vec::new();
        for entry in self
            .complaint
            .map(|c| c.aggregated_commitments)
            .unwrap_or_default()
        {
            config.check_index(entry.index)?;
            let mut commitments = BTreeMap::new();
            for (dealer, points) in entry.commitments {
                config.check_index(dealer)?;
                expect_len(&points, required, "aggregatedCommitments")?;
                let points = points
                    .iter()
                    .map(decode_g1)
                    .collect::<Result<Vec<_>, _>>()?;
                commitments.insert(dealer, AggregatedCommitment(points));
            }
            complaint.push(ComplaintRecord {
                claimant: entry.index,
                commitments,
            });
        }

        Ok(Snapshot {
            config,
            dealers,
            post,
            complaint,
        })
    }
}
