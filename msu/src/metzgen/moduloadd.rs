//! Comparator-free modular reduction: subtract in parallel, select on the sign bit.

use num_bigint::BigUint;

use super::bigadd::{bigadd, bigadd3, bit, from_words, negate, to_words, truncate, words};

#[derive(Clone, Debug)]
pub struct Modulo {
    modulus: BigUint,
    /// `ceil(log2(M))`, the width of a reduced value
    width: usize,
    /// `-M` in `width + 1` bits
    neg_modulus: Vec<u64>,
    /// width of the values fed to [`Modulo::reduce`]
    input_width: usize,
    /// `!(M * 2^k)` in `input_width + 2` bits, largest `k` first
    ladder: Vec<Vec<u64>>,
}

impl Modulo {
    /// Reducer for values below `2^input_width`.
    pub fn new(modulus: &BigUint, input_width: usize) -> Self {
        let width = modulus.bits() as usize;
        let top = input_width.saturating_sub(width) + 1;
        let ladder_width = input_width + 2;
        let ladder = (0..=top)
            .rev()
            .map(|k| {
                let mut step: Vec<u64> = to_words(&(modulus << k), ladder_width)
                    .iter()
                    .map(|word| !word)
                    .collect();
                truncate(&mut step, ladder_width);
                step
            })
            .collect();
        Self {
            modulus: modulus.clone(),
            width,
            neg_modulus: negate(modulus, width + 1),
            input_width,
            ladder,
        }
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// `(a + b) mod M` for `a, b < M`.
    ///
    /// `a + b` and `a + b - M` are formed side by side in `width + 1` bits; the sign of
    /// the difference selects. At most one subtraction is ever needed.
    pub fn add(&self, a: &BigUint, b: &BigUint) -> BigUint {
        let w = self.width + 1;
        let (a, b) = (to_words(a, w), to_words(b, w));
        let (sum, _) = bigadd(&a, &b, false, w);
        let (difference, _) = bigadd3(&a, &b, &self.neg_modulus, false, w);
        if bit(&difference, self.width) {
            from_words(&sum)
        } else {
            from_words(&difference)
        }
    }

    /// `x mod M` for `x < 2^input_width`, by a ladder of subtract-and-select steps
    /// with `M * 2^k` for descending `k`.
    pub fn reduce(&self, x: &BigUint) -> BigUint {
        debug_assert!(x.bits() as usize <= self.input_width);
        let w = self.input_width + 2;
        let mut x = to_words(x, w);
        for step in &self.ladder {
            // x + !(M*2^k) + 1 = x - M*2^k
            let (difference, _) = bigadd(&x, step, true, w);
            if !bit(&difference, w - 1) {
                x = difference;
            }
        }
        debug_assert!(x.len() == words(w));
        from_words(&x)
    }
}
