//! Lagrange interpolation at `x = 0` ("in the exponent" when the evaluations are points).
//!
//! Weights depend only on the set of indices, so they can be computed once and reused
//! across many interpolations over the same signers.

use crate::bls12381::primitives::{
    group::{Element, Scalar},
    poly::Eval,
    Error,
};
use std::collections::{BTreeMap, BTreeSet};

/// A Lagrange basis coefficient evaluated at `x = 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Weight(Scalar);

impl Weight {
    /// Returns the weight as a scalar.
    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }
}

/// Computes the weights `l_i(0) = prod_{j != i} x_j / (x_j - x_i)` for the first
/// `required` indices (in sorted order).
///
/// Fails if fewer than `required` indices are provided, if any index is `0`, or if
/// any index appears more than once (which would require inverting zero).
pub fn compute_weights(indices: &[u32], required: u32) -> Result<BTreeMap<u32, Weight>, Error> {
    // Sort indices and reject duplicates
    let mut sorted = BTreeSet::new();
    for &index in indices {
        if index == 0 {
            return Err(Error::InvalidIndex(index));
        }
        if !sorted.insert(index) {
            return Err(Error::DuplicateIndex(index));
        }
    }
    if sorted.len() < required as usize {
        return Err(Error::NotEnoughPartialSignatures(
            required as usize,
            sorted.len(),
        ));
    }
    let xs = sorted
        .into_iter()
        .take(required as usize)
        .map(|index| (index, Scalar::from_index(index)))
        .collect::<Vec<_>>();

    let mut weights = BTreeMap::new();
    for (i, xi) in &xs {
        let (mut num, den) = xs.iter().fold(
            (Scalar::one(), Scalar::one()),
            |(mut num, mut den), (j, xj)| {
                if i != j {
                    // Include `xj` in the numerator product for `l_i(0)`
                    num.mul(xj);

                    // Compute `xj - xi` and include it in the denominator product
                    let mut diff = *xj;
                    diff.sub(xi);
                    den.mul(&diff);
                }
                (num, den)
            },
        );

        // Compute the inverse of the denominator product; fails if den is zero
        let inv = den.inverse().ok_or(Error::NoInverse)?;
        num.mul(&inv);
        weights.insert(*i, Weight(num));
    }
    Ok(weights)
}

/// Interpolates the value at `x = 0` from evaluations using precomputed weights.
///
/// Every evaluation must have a weight; evaluations are expected to match the weights one-to-one.
pub fn recover_with_weights<'a, C, I>(
    weights: &BTreeMap<u32, Weight>,
    evals: I,
) -> Result<C, Error>
where
    C: Element + 'a,
    I: IntoIterator<Item = &'a Eval<C>>,
{
    let mut result = C::zero();
    let mut used = 0;
    for eval in evals {
        let weight = weights
            .get(&eval.index)
            .ok_or(Error::InvalidIndex(eval.index))?;

        // Scale the y-value by the precomputed weight
        let mut scaled = eval.value.clone();
        scaled.mul(&weight.0);
        result.add(&scaled);
        used += 1;
    }
    if used != weights.len() {
        return Err(Error::InvalidRecovery);
    }
    Ok(result)
}
