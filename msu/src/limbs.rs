//! Redundant limb vectors.

use core::ops::{Deref, DerefMut};

use num_bigint::BigUint;
use num_traits::Zero as _;

use crate::{Error, Params, Result};

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
/// Limb `i` holds digit `i` in base `2^WORD_LEN`, but may use all `BIT_LEN` bits.
///
/// Least-significant limb first. The same integer has many encodings; compare
/// values with [`Limbs::value`], not with `==`.
pub struct Limbs(pub Vec<u64>);

impl Limbs {
    pub fn zero(len: usize) -> Self {
        Self(vec![0; len])
    }

    /// Canonical encoding of `x` (every limb below `2^WORD_LEN`).
    pub fn encode(x: &BigUint, params: &Params) -> Result<Self> {
        if x.bits() > params.domain_bits() {
            return Err(Error::InputRange);
        }
        Ok(Self::encode_digits(x, params.word_len, params.num_elements()))
    }

    pub(crate) fn encode_digits(x: &BigUint, word_len: u32, len: usize) -> Self {
        let mask = BigUint::from((1u64 << word_len) - 1);
        let mut x = x.clone();
        let mut limbs = Vec::with_capacity(len);
        for _ in 0..len {
            let digit = &x & &mask;
            limbs.push(digit.iter_u64_digits().next().unwrap_or(0));
            x >>= word_len as usize;
        }
        Self(limbs)
    }

    /// Integer represented by the limbs, `Σ limb[i] * 2^(WORD_LEN*i)`.
    pub fn value(&self, word_len: u32) -> BigUint {
        self.0.iter().rev().fold(BigUint::zero(), |acc, &limb| {
            (acc << word_len as usize) + BigUint::from(limb)
        })
    }

    /// Whether every limb fits in `bit_len` bits.
    pub fn fits(&self, bit_len: u32) -> bool {
        self.0.iter().all(|&limb| limb >> bit_len == 0)
    }
}

impl Deref for Limbs {
    type Target = [u64];
    fn deref(&self) -> &[u64] {
        &self.0
    }
}

impl DerefMut for Limbs {
    fn deref_mut(&mut self) -> &mut [u64] {
        &mut self.0
    }
}

impl From<Vec<u64>> for Limbs {
    fn from(limbs: Vec<u64>) -> Self {
        Self(limbs)
    }
}
