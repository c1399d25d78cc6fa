//! Biased multi-symbol form.
//!
//! A product is held as `2 * NUMSYMBOLS` signed symbols of `LOGRADIX + 2` bits, symbol
//! `i` weighing `2^(LOGRADIX*i)`, so neighbouring symbols overlap by two bits. Each
//! symbol is stored with its sign bit flipped, i.e. biased by `2^(LOGRADIX+1)`; the sum
//! of all those biases is `ALLSIGNBITS`.

use num_bigint::BigUint;
use num_traits::Zero as _;

use super::bigadd::{bigadd3, from_words, negate, to_words};

/// The sign bit of a `LOGRADIX + 2` bit symbol.
pub const fn sign_symbol(log_radix: u32) -> u64 {
    1 << (log_radix + 1)
}

/// `Σ sign_symbol * 2^(LOGRADIX*i)` over `symbols` symbols.
pub fn all_sign_bits(log_radix: u32, symbols: usize) -> BigUint {
    (0..symbols).fold(BigUint::zero(), |acc, _| {
        (acc << log_radix as usize) + sign_symbol(log_radix)
    })
}

/// Signed symbol to its biased (sign-flipped) form.
#[inline(always)]
pub fn bias(symbol: i128, log_radix: u32) -> u64 {
    debug_assert!(symbol >= -(sign_symbol(log_radix) as i128));
    debug_assert!(symbol < sign_symbol(log_radix) as i128);
    (symbol + sign_symbol(log_radix) as i128) as u64
}

/// Overlapping concatenation `Σ symbol[i] * 2^(LOGRADIX*i)` of biased symbols.
pub fn concatenate(symbols: &[u64], log_radix: u32) -> BigUint {
    symbols.iter().rev().fold(BigUint::zero(), |acc, &symbol| {
        (acc << log_radix as usize) + symbol
    })
}

/// Flat value of a biased multi-symbol number: `low + high - ALLSIGNBITS`, where `low`
/// gathers the low `LOGRADIX` bits of every symbol and `high` the upper two bits,
/// added as one three-operand sum.
pub fn convertfrommultisymbols(symbols: &[u64], log_radix: u32) -> BigUint {
    let r = log_radix as usize;
    let width = r * (symbols.len() + 1) + 2;
    let mask = (1u64 << log_radix) - 1;
    let low = symbols.iter().rev().fold(BigUint::zero(), |acc, &symbol| {
        (acc << r) + (symbol & mask)
    });
    let high = symbols.iter().rev().fold(BigUint::zero(), |acc, &symbol| {
        (acc << r) + (symbol >> log_radix)
    }) << r;
    let (value, _) = bigadd3(
        &to_words(&low, width),
        &to_words(&high, width),
        &negate(&all_sign_bits(log_radix, symbols.len()), width),
        false,
        width,
    );
    from_words(&value)
}
