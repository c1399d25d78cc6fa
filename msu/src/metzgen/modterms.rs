//! Reduction of a biased multi-symbol product to a handful of adder terms, all
//! congruent in sum to the product modulo `M`.
//!
//! With `L = low_symbols`:
//! - term 0 is `-ALLSIGNBITS mod M`, undoing the sign-bit bias of every symbol;
//! - term 1 holds the low `LOGRADIX` bits of symbols `0..L`, at their own weight;
//! - term 2 holds the upper two bits of symbols `0..L-1`, at the next symbol's weight;
//! - every other bit, from the upper bits of symbol `L-1` upward, addresses a
//!   6-input table returning its weight mod `M`.
//!
//! Terms 1 and 2 stay below `2^(LOGRADIX*L+1)` and every other term below `M`, so the
//! sum is bounded by a constant independent of the input.

use derivative::Derivative;
use num_bigint::BigUint;
use num_traits::Zero as _;
use rayon::prelude::*;

use super::{
    convert::{all_sign_bits, sign_symbol},
    MetzgenParams,
};
use crate::{compressor::compressor_tree_3_to_2, Error, Modulus, Result};

/// Inputs per reduction table.
pub const LUT_INPUTS: usize = 6;

#[derive(Derivative)]
#[derivative(Clone, Debug)]
/// `modulolut6`: up to six product bits in, the sum of their weights mod `M` out.
pub struct Lut6 {
    /// `(symbol, bit)` of each address bit
    taps: Vec<(usize, u32)>,
    #[derivative(Debug = "ignore")]
    table: Vec<BigUint>,
}

impl Lut6 {
    fn new(taps: Vec<(usize, u32)>, log_radix: u32, modulus: &BigUint) -> Self {
        let weights: Vec<BigUint> = taps
            .iter()
            .map(|&(symbol, bit)| {
                (BigUint::from(1u8) << (symbol * log_radix as usize + bit as usize)) % modulus
            })
            .collect();
        let mut table = vec![BigUint::zero(); 1 << taps.len()];
        for addr in 1..table.len() {
            let lowest = addr.trailing_zeros() as usize;
            let entry = &table[addr & (addr - 1)] + &weights[lowest];
            table[addr] = if &entry >= modulus { entry - modulus } else { entry };
        }
        Self { taps, table }
    }

    pub fn taps(&self) -> &[(usize, u32)] {
        &self.taps
    }

    #[inline]
    pub fn address(&self, symbols: &[u64]) -> usize {
        self.taps
            .iter()
            .enumerate()
            .fold(0, |addr, (j, &(symbol, bit))| {
                addr | ((((symbols[symbol] >> bit) & 1) as usize) << j)
            })
    }

    pub fn read(&self, addr: usize) -> &BigUint {
        &self.table[addr]
    }
}

#[derive(Clone, Debug)]
pub struct ModTerms {
    params: MetzgenParams,
    term0: BigUint,
    luts: Vec<Lut6>,
    bound: BigUint,
}

impl ModTerms {
    pub fn new(params: &MetzgenParams, modulus: &Modulus) -> Result<Self> {
        let m = modulus.value();
        let r = params.log_radix;
        let symbol_bits = params.symbol_bits() as usize;
        let product_symbols = 2 * params.num_symbols();
        let low = params.low_symbols();

        // -ALLSIGNBITS mod M
        let signs = all_sign_bits(r, product_symbols) % m;
        let term0 = (m - signs) % m;

        // bit positions in the (R+2)-bit-per-symbol concatenation
        let first = symbol_bits * low - 2;
        let last = symbol_bits * product_symbols;
        let groups: Vec<Vec<(usize, u32)>> = (first..last)
            .step_by(LUT_INPUTS)
            .map(|start| {
                (start..(start + LUT_INPUTS).min(last))
                    .map(|pos| (pos / symbol_bits, (pos % symbol_bits) as u32))
                    .collect()
            })
            .collect();
        let luts: Vec<Lut6> = crate::timing::timed("generating modulolut6 tables", || {
            groups
                .into_par_iter()
                .map(|taps| Lut6::new(taps, r, m))
                .collect()
        });

        let bound = (BigUint::from(1u8) << (r as usize * low + 1)) + m * (luts.len() as u64 + 1);
        if bound.bits() > params.mod_bit_width() as u64 {
            return Err(Error::Width {
                what: "reduction output",
                needed: bound.bits(),
                available: params.mod_bit_width() as u64,
            });
        }
        tracing::info!(luts = luts.len(), bound_bits = bound.bits(), "reduction terms ready");

        Ok(Self {
            params: *params,
            term0,
            luts,
            bound,
        })
    }

    pub fn term0(&self) -> &BigUint {
        &self.term0
    }

    pub fn luts(&self) -> &[Lut6] {
        &self.luts
    }

    /// Exclusive upper bound on the sum of all terms.
    pub fn bound(&self) -> &BigUint {
        &self.bound
    }

    /// All adder terms for the biased product `symbols`.
    pub fn terms(&self, symbols: &[u64]) -> Vec<BigUint> {
        let r = self.params.log_radix;
        let low = self.params.low_symbols();
        let mask = sign_symbol(r) / 2 - 1;

        let term1 = symbols[..low]
            .iter()
            .rev()
            .fold(BigUint::zero(), |acc, &symbol| (acc << r as usize) + (symbol & mask));
        let term2 = symbols[..low - 1]
            .iter()
            .rev()
            .fold(BigUint::zero(), |acc, &symbol| (acc << r as usize) + (symbol >> r))
            << r as usize;

        let mut terms = Vec::with_capacity(3 + self.luts.len());
        terms.push(self.term0.clone());
        terms.push(term1);
        terms.push(term2);
        terms.extend(
            self.luts
                .iter()
                .map(|lut| lut.read(lut.address(symbols)).clone()),
        );
        terms
    }

    /// Sum the terms through the compressor tree: the `(sqa, sqb)` pair.
    pub fn reduce(&self, symbols: &[u64]) -> (BigUint, BigUint) {
        compressor_tree_3_to_2(self.terms(symbols).as_slice())
    }
}
