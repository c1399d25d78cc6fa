//! `modular_square_metzgen_iter`: one modular squaring per clock.
//!
//! The iteration register holds `(sqa, sqb)`, two `MODBITWIDTH`-bit numbers whose sum
//! is congruent to the current value. Each cycle it is replaced by the reduction terms
//! of its own square, so the loop never leaves the redundant form.

use fpga::Clocked;
use num_bigint::BigUint;
use num_traits::Zero as _;

use super::{
    convert::{bias, convertfrommultisymbols},
    modterms::ModTerms,
    params::Kernel,
    MetzgenParams,
};
use crate::{Modulus, Pins, Result};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
/// Registered outputs of the iteration stage.
pub struct IterOut {
    pub sqa: BigUint,
    pub sqb: BigUint,
    pub valid: bool,
}

#[derive(Clone, Debug)]
pub struct Iter {
    params: MetzgenParams,
    kernel: Kernel,
    terms: ModTerms,
    running: bool,
    out: IterOut,
}

impl Iter {
    pub fn new(params: &MetzgenParams, modulus: &Modulus) -> Result<Self> {
        let params = params.validate(modulus)?;
        Ok(Self {
            kernel: params.kernel()?,
            terms: ModTerms::new(&params, modulus)?,
            params,
            running: false,
            out: IterOut::default(),
        })
    }

    pub fn out(&self) -> &IterOut {
        &self.out
    }

    pub fn terms(&self) -> &ModTerms {
        &self.terms
    }

    /// Symbols of `sqa + sqb`, added symbol by symbol: `LOGRADIX + 1` bits each.
    pub fn input_symbols(&self, sqa: &BigUint, sqb: &BigUint) -> Vec<u64> {
        let r = self.params.log_radix as usize;
        let mask = (1u64 << r) - 1;
        let digits = |x: &BigUint| -> Vec<u64> {
            let mut x = x.clone();
            (0..self.params.num_symbols())
                .map(|_| {
                    let digit = x.iter_u64_digits().next().unwrap_or(0) & mask;
                    x >>= r;
                    digit
                })
                .collect()
        };
        digits(sqa)
            .into_iter()
            .zip(digits(sqb))
            .map(|(a, b)| a + b)
            .collect()
    }

    /// Square as a polynomial in `2^LOGRADIX`, then recode the coefficients into
    /// biased signed symbols.
    pub fn square_symbols(&self, symbols: &[u64]) -> Vec<u64> {
        let r = self.params.log_radix;
        let n = symbols.len();
        let mut coefficients = vec![0u128; 2 * n - 1];
        for i in 0..n {
            coefficients[2 * i] += self.kernel.square(symbols[i]);
            for j in i + 1..n {
                coefficients[i + j] += 2 * symbols[i] as u128 * symbols[j] as u128;
            }
        }

        // balanced digits in [-2^(R-1), 2^(R-1)); the top symbol takes what is left
        let radix = 1i128 << r;
        let half = radix >> 1;
        let mut carry = 0i128;
        let mut out = Vec::with_capacity(2 * n);
        for &c in &coefficients {
            let t = c as i128 + carry;
            let mut digit = t & (radix - 1);
            if digit >= half {
                digit -= radix;
            }
            carry = (t - digit) >> r;
            out.push(bias(digit, r));
        }
        out.push(bias(carry, r));
        out
    }

    /// One iteration, combinationally.
    pub fn step(&self, sqa: &BigUint, sqb: &BigUint) -> (BigUint, BigUint) {
        let product = self.square_symbols(&self.input_symbols(sqa, sqb));
        debug_assert_eq!(
            convertfrommultisymbols(&product, self.params.log_radix),
            (sqa + sqb) * (sqa + sqb)
        );
        self.terms.reduce(&product)
    }
}

impl Clocked for Iter {
    type Inputs = Pins<BigUint>;

    fn tick(&mut self, pins: &Pins<BigUint>) {
        if pins.reset {
            self.running = false;
            self.out.valid = false;
            return;
        }
        if pins.start {
            let (sqa, sqb) = self.step(&pins.sq_in, &BigUint::zero());
            self.out = IterOut { sqa, sqb, valid: true };
            self.running = true;
        } else if self.running {
            let (sqa, sqb) = self.step(&self.out.sqa, &self.out.sqb);
            self.out = IterOut { sqa, sqb, valid: true };
        } else {
            self.out.valid = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use num_bigint::RandBigInt as _;
    use rand::SeedableRng as _;

    fn small() -> Iter {
        let params = MetzgenParams {
            mod_len: 128,
            log_radix: 17,
            log_num_symbols: 3,
            io_stages: 1,
        };
        Iter::new(&params, &Modulus::test_128()).unwrap()
    }

    #[test]
    fn recoding_preserves_square() {
        let iter = small();
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let sqa = rng.gen_biguint(130);
            let sqb = rng.gen_biguint(130);
            let symbols = iter.input_symbols(&sqa, &sqb);
            assert_eq!(symbols.len(), 8);
            let product = iter.square_symbols(&symbols);
            assert_eq!(product.len(), 16);
            assert!(product.iter().all(|&s| s >> 19 == 0));
            let x = &sqa + &sqb;
            assert_eq!(convertfrommultisymbols(&product, 17), &x * &x);
        }
    }

    #[test]
    fn step_is_modular_square() {
        let iter = small();
        let m = Modulus::test_128().value().clone();
        let mut rng = rand::rngs::StdRng::seed_from_u64(9);
        let x = rng.gen_biguint_below(&m);
        let (mut sqa, mut sqb) = (x.clone(), BigUint::zero());
        let mut expected = x;
        for _ in 0..50 {
            let (a, b) = iter.step(&sqa, &sqb);
            assert!(&a + &b < *iter.terms().bound());
            expected = (&expected * &expected) % &m;
            assert_eq!((&a + &b) % &m, expected);
            sqa = a;
            sqb = b;
        }
    }

    #[test]
    fn start_reset_and_free_run() {
        let mut iter = small();
        let idle = Pins::default();
        iter.tick(&idle);
        assert!(!iter.out().valid);
        iter.tick(&Pins {
            start: true,
            sq_in: BigUint::from(3u8),
            ..Pins::default()
        });
        assert!(iter.out().valid);
        let first = iter.out().clone();
        assert_eq!((&first.sqa + &first.sqb) % Modulus::test_128().value(), BigUint::from(9u8));
        iter.tick(&idle);
        assert!(iter.out().valid);
        iter.tick(&Pins {
            reset: true,
            ..Pins::default()
        });
        assert!(!iter.out().valid);
        iter.tick(&idle);
        assert!(!iter.out().valid);
    }
}
