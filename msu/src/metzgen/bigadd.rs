//! Fixed-width adders over 64-bit symbols.
//!
//! Operands are little-endian word vectors of `ceil(width / 64)` words; bits at and
//! above `width` are discarded, as in a `width`-bit vector.

use num_bigint::BigUint;

pub const SYMBOL_BITS: usize = 64;

pub const fn words(width: usize) -> usize {
    (width + SYMBOL_BITS - 1) / SYMBOL_BITS
}

/// `x mod 2^width` as words.
pub fn to_words(x: &BigUint, width: usize) -> Vec<u64> {
    let mut out: Vec<u64> = x.iter_u64_digits().take(words(width)).collect();
    out.resize(words(width), 0);
    truncate(&mut out, width);
    out
}

pub fn from_words(words: &[u64]) -> BigUint {
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    BigUint::from_bytes_le(&bytes)
}

/// Two's complement `-x mod 2^width`.
pub fn negate(x: &BigUint, width: usize) -> Vec<u64> {
    let mut inverted: Vec<u64> = to_words(x, width).iter().map(|w| !w).collect();
    truncate(&mut inverted, width);
    let zero = vec![0; inverted.len()];
    bigadd(&inverted, &zero, true, width).0
}

#[inline]
pub fn bit(x: &[u64], index: usize) -> bool {
    (x[index / SYMBOL_BITS] >> (index % SYMBOL_BITS)) & 1 == 1
}

pub(crate) fn truncate(x: &mut [u64], width: usize) {
    let rem = width % SYMBOL_BITS;
    if rem != 0 {
        if let Some(top) = x.last_mut() {
            *top &= (1 << rem) - 1;
        }
    }
}

/// Carry-select adder: `(a + b + carry_in) mod 2^width` and the carry out of bit
/// `width - 1`. Operands must already be truncated to `width`.
///
/// Every symbol computes its sum for both carry-in values; the carry out of the
/// symbol below picks one.
pub fn bigadd(a: &[u64], b: &[u64], carry_in: bool, width: usize) -> (Vec<u64>, bool) {
    let n = words(width);
    debug_assert!(a.len() >= n && b.len() >= n);
    let mut sum = Vec::with_capacity(n);
    let mut carry = carry_in;
    for (&x, &y) in a.iter().zip(b).take(n) {
        let (s0, c0) = x.overflowing_add(y);
        let (s1, c1) = (s0.wrapping_add(1), c0 || s0 == u64::MAX);
        if carry {
            sum.push(s1);
            carry = c1;
        } else {
            sum.push(s0);
            carry = c0;
        }
    }
    let rem = width % SYMBOL_BITS;
    if rem != 0 {
        if let Some(&top) = sum.last() {
            carry = (top >> rem) & 1 == 1;
        }
        truncate(&mut sum, width);
    }
    (sum, carry)
}

/// Three operands plus carry: full adders per bit (`a^b^c`, majority), then [`bigadd`].
pub fn bigadd3(a: &[u64], b: &[u64], c: &[u64], carry_in: bool, width: usize) -> (Vec<u64>, bool) {
    let n = words(width);
    let sum: Vec<u64> = (0..n).map(|i| a[i] ^ b[i] ^ c[i]).collect();
    let majority: Vec<u64> = (0..n)
        .map(|i| (a[i] & b[i]) | (a[i] & c[i]) | (b[i] & c[i]))
        .collect();
    let mut shifted = vec![0u64; n];
    for i in 0..n {
        shifted[i] = majority[i] << 1;
        if i > 0 {
            shifted[i] |= majority[i - 1] >> (SYMBOL_BITS - 1);
        }
    }
    truncate(&mut shifted, width);
    bigadd(&sum, &shifted, carry_in, width)
}
