//! Carry-save compressor trees.
//!
//! Sums many same-weight terms down to a `(carry, sum)` pair in `O(log n)` levels of
//! bitwise full adders, so no carry ever ripples across a word. The pair must be
//! added once at the end (see [`crate::normalize`]).

use num_bigint::BigUint;

/// Bit vector that can pass through a carry-save adder.
pub trait Term: Clone {
    fn zero() -> Self;
    fn xor(&self, other: &Self) -> Self;
    fn and(&self, other: &Self) -> Self;
    fn or(&self, other: &Self) -> Self;
    fn shl1(&self) -> Self;
}

// Column words of the redundant-limb squarer. The width analysis keeps every
// column below 2^64, so the carry shift never drops a set bit.
impl Term for u64 {
    #[inline(always)]
    fn zero() -> Self {
        0
    }
    #[inline(always)]
    fn xor(&self, other: &Self) -> Self {
        self ^ other
    }
    #[inline(always)]
    fn and(&self, other: &Self) -> Self {
        self & other
    }
    #[inline(always)]
    fn or(&self, other: &Self) -> Self {
        self | other
    }
    #[inline(always)]
    fn shl1(&self) -> Self {
        self << 1
    }
}

impl Term for BigUint {
    fn zero() -> Self {
        <BigUint as num_traits::Zero>::zero()
    }
    fn xor(&self, other: &Self) -> Self {
        self ^ other
    }
    fn and(&self, other: &Self) -> Self {
        self & other
    }
    fn or(&self, other: &Self) -> Self {
        self | other
    }
    fn shl1(&self) -> Self {
        self << 1u32
    }
}

/// Full adder on every bit: returns `(carry, sum)` with the carry already at weight 2.
#[inline]
pub fn carry_save_3_to_2<T: Term>(a: &T, b: &T, c: &T) -> (T, T) {
    let (carry, sum) = full_adder(a, b, c);
    (carry.shl1(), sum)
}

// unshifted: (majority, parity)
#[inline]
fn full_adder<T: Term>(a: &T, b: &T, c: &T) -> (T, T) {
    let a_xor_b = a.xor(b);
    let sum = a_xor_b.xor(c);
    let carry = a.and(b).or(&c.and(&a_xor_b));
    (carry, sum)
}

/// Counts the ones of six inputs per bit: returns the count's bits at weights 1, 2, 4.
pub fn compressor_6_to_3<T: Term>(x: &[T; 6]) -> [T; 3] {
    let (c0, s0) = full_adder(&x[0], &x[1], &x[2]);
    let (c1, s1) = full_adder(&x[3], &x[4], &x[5]);
    // s0 + s1 at weight 1, c0 + c1 + (s0 & s1) at weight 2
    let bit0 = s0.xor(&s1);
    let (bit2, bit1) = full_adder(&c0, &c1, &s0.and(&s1));
    [bit0, bit1.shl1(), bit2.shl1().shl1()]
}

/// One level of the tree: every chunk of six becomes three, the remainder is
/// reduced with the smallest compressor that still makes progress.
pub fn faster_carry_save_adder_tree_level<T: Term>(terms: &[T]) -> Vec<T> {
    let chunks = terms.chunks_exact(6);
    let rest = chunks.remainder();
    let mut out = Vec::with_capacity(terms.len() / 2 + 3);
    for chunk in chunks {
        let six: &[T; 6] = chunk.try_into().unwrap_or_else(|_| unreachable!());
        out.extend(compressor_6_to_3(six));
    }
    match rest {
        [] => {}
        [a] => out.push(a.clone()),
        [a, b] => out.extend([a.clone(), b.clone()]),
        [a, b, c] => {
            let (carry, sum) = carry_save_3_to_2(a, b, c);
            out.extend([carry, sum]);
        }
        [a, b, c, d] => {
            let (carry, sum) = carry_save_3_to_2(a, b, c);
            out.extend([carry, sum, d.clone()]);
        }
        [a, b, c, d, e] => {
            let six = [a.clone(), b.clone(), c.clone(), d.clone(), e.clone(), T::zero()];
            out.extend(compressor_6_to_3(&six));
        }
        _ => unreachable!(),
    }
    out
}

/// Reduce `terms` to `(carry, sum)` whose sum equals the sum of all terms.
pub fn compressor_tree_3_to_2<T: Term>(terms: &[T]) -> (T, T) {
    match terms {
        [] => (T::zero(), T::zero()),
        [sum] => (T::zero(), sum.clone()),
        [carry, sum] => (carry.clone(), sum.clone()),
        _ => {
            let mut level = faster_carry_save_adder_tree_level(terms);
            while level.len() > 2 {
                level = faster_carry_save_adder_tree_level(&level);
            }
            let mut level = level.into_iter();
            let carry = level.next().unwrap_or_else(T::zero);
            let sum = level.next().unwrap_or_else(T::zero);
            (carry, sum)
        }
    }
}

/// Levels the tree needs for `n` terms.
pub fn tree_depth(n: usize) -> usize {
    let mut depth = 0;
    let mut n = n;
    while n > 2 {
        n = 3 * (n / 6)
            + match n % 6 {
                r @ 0..=2 => r,
                3 => 2,
                _ => 3,
            };
        depth += 1;
    }
    depth
}
