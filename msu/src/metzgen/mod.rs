//! `modular_square_metzgen`: a radix-`2^LOGRADIX` squarer completing one modular
//! squaring per clock.
//!
//! ```text
//!  pins -> [IO_STAGES] -> iter -> [IO_STAGES] -> post -> sq_out, valid
//! ```
//!
//! The delay lines on either side only model routing registers and are never reset,
//! so after a reset they keep shifting out stale data for a while. `ignore_valid`
//! masks `valid` until that data has drained.

use fpga::{Clocked, DelayLine};
use num_bigint::BigUint;

use crate::{app::Squarer, Error, Modulus, Pins, Result};

pub mod bigadd;
pub mod convert;
pub mod dsp;
pub mod iter;
pub mod modterms;
pub mod moduloadd;
pub mod params;
pub mod post;

pub use iter::{Iter, IterOut};
pub use modterms::ModTerms;
pub use params::{Kernel, MetzgenParams};
pub use post::Post;

#[derive(Clone, Debug)]
pub struct ModularSquareMetzgen {
    params: MetzgenParams,
    modulus: Modulus,
    input: DelayLine<Pins<BigUint>>,
    iter: Iter,
    output: DelayLine<IterOut>,
    post: Post,
    ignore_valid: u64,
}

impl ModularSquareMetzgen {
    pub fn new(params: MetzgenParams, modulus: Modulus) -> Result<Self> {
        let params = params.validate(&modulus)?;
        let kernel = params.kernel()?;
        tracing::info!(
            mod_len = params.mod_len,
            log_radix = params.log_radix,
            symbols = params.num_symbols(),
            ?kernel,
            diagonal_dsps = kernel.multiplies() * params.num_symbols(),
            "building metzgen squarer"
        );
        Ok(Self {
            input: DelayLine::new(params.io_stages, Pins::default()),
            iter: Iter::new(&params, &modulus)?,
            output: DelayLine::new(params.io_stages, IterOut::default()),
            post: Post::new(&params, &modulus),
            ignore_valid: 0,
            params,
            modulus,
        })
    }

    pub fn params(&self) -> &MetzgenParams {
        &self.params
    }

    pub fn iter(&self) -> &Iter {
        &self.iter
    }

    fn ignore_mask(&self) -> u64 {
        let bits = self.params.latency() as u32;
        u64::MAX >> (64 - bits)
    }

    pub fn valid(&self) -> bool {
        self.post.valid() && self.ignore_valid & 1 == 0
    }

    pub fn sq_out(&self) -> &BigUint {
        self.post.sq_out()
    }
}

impl Clocked for ModularSquareMetzgen {
    type Inputs = Pins<BigUint>;

    fn tick(&mut self, pins: &Pins<BigUint>) {
        // back to front, so every stage samples its neighbour's pre-tick outputs
        let to_post = self.output.pass(self.iter.out()).clone();
        self.post.tick(&to_post);
        let to_output = self.iter.out().clone();
        self.output.tick(&to_output);
        let to_iter = self.input.pass(pins).clone();
        self.iter.tick(&to_iter);
        self.input.tick(pins);

        self.ignore_valid = if pins.reset {
            self.ignore_mask()
        } else {
            self.ignore_valid >> 1
        };
    }
}

impl Squarer for ModularSquareMetzgen {
    type Value = BigUint;

    fn modulus(&self) -> &Modulus {
        &self.modulus
    }

    fn encode(&self, x: &BigUint) -> Result<BigUint> {
        if x.bits() > self.params.mod_len as u64 {
            return Err(Error::InputRange);
        }
        Ok(x.clone())
    }

    fn decode(&self, value: &BigUint) -> BigUint {
        value.clone()
    }

    fn idle_input(&self) -> BigUint {
        BigUint::default()
    }

    fn valid(&self) -> bool {
        ModularSquareMetzgen::valid(self)
    }

    fn sq_out(&self) -> &BigUint {
        self.post.sq_out()
    }

    fn latency(&self) -> u64 {
        self.params.latency()
    }

    fn cycles_per_iteration(&self) -> u64 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(io_stages: usize) -> ModularSquareMetzgen {
        let params = MetzgenParams {
            mod_len: 128,
            log_radix: 17,
            log_num_symbols: 3,
            io_stages,
        };
        ModularSquareMetzgen::new(params, Modulus::test_128()).unwrap()
    }

    fn pins(reset: bool, start: bool, x: u32) -> Pins<BigUint> {
        Pins {
            reset,
            start,
            sq_in: BigUint::from(x),
        }
    }

    #[test]
    fn first_valid_after_latency() {
        for io_stages in [0, 1, 3] {
            let mut msu = small(io_stages);
            let latency = msu.params().latency();
            msu.tick(&pins(true, false, 0));
            msu.tick(&pins(false, true, 3));
            let mut cycle = 1;
            while !msu.valid() {
                msu.tick(&pins(false, false, 0));
                cycle += 1;
                assert!(cycle <= latency, "no valid after {} cycles", cycle);
            }
            assert_eq!(cycle, latency);
            assert_eq!(*msu.sq_out(), BigUint::from(9u8));
            // then one squaring per cycle
            msu.tick(&pins(false, false, 0));
            assert!(msu.valid());
            assert_eq!(*msu.sq_out(), BigUint::from(81u8));
        }
    }

    #[test]
    fn stale_valid_is_ignored_after_reset() {
        let mut msu = small(3);
        msu.tick(&pins(false, true, 2));
        for _ in 0..20 {
            msu.tick(&pins(false, false, 0));
        }
        assert!(msu.valid());

        msu.tick(&pins(true, false, 0));
        for _ in 0..20 {
            assert!(!msu.valid());
            msu.tick(&pins(false, false, 0));
        }
        assert!(!msu.valid());
    }

    #[test]
    fn reset_held_for_several_cycles() {
        let mut msu = small(3);
        msu.tick(&pins(false, true, 2));
        for _ in 0..5 {
            msu.tick(&pins(false, false, 0));
        }
        for _ in 0..10 {
            msu.tick(&pins(true, false, 0));
            assert!(!msu.valid());
        }
        for _ in 0..3 {
            msu.tick(&pins(false, false, 0));
            assert!(!msu.valid());
        }
        msu.tick(&pins(false, true, 5));
        for _ in 1..msu.params().latency() {
            assert!(!msu.valid());
            msu.tick(&pins(false, false, 0));
        }
        assert!(msu.valid());
        assert_eq!(*msu.sq_out(), BigUint::from(25u8));
    }
}
