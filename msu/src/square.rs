//! `my_modular_square`: redundant-limb squarer with table-driven reduction.
//!
//! A one-hot state machine walks six phases per squaring round; each phase enables
//! at most one pipeline register:
//!
//! | edge          | register loaded                                  |
//! |---------------|--------------------------------------------------|
//! | IDLE -> C0    | `sq_in_d1` and `start_d1`                        |
//! | C0 -> C1      | multiplier column `(carry, sum)` pairs           |
//! | C1 -> C2      | product limbs (carry propagate)                  |
//! | C2 -> C3      | reduction ROM outputs (synchronous read)         |
//! | C3 -> C4      | reduction column `(carry, sum)` pairs            |
//! | C4 -> C5      | `sq_out` and `valid`, `start_d1` cleared         |
//!
//! The multiplier reads its round input through a mux: `sq_in_d1` while `start_d1`
//! is set (the first round after `start`), `sq_out` looped back otherwise.
//!
//! So `valid` is high during `CYCLE_5` only, six cycles after `start` was sampled,
//! and the machine never stops once started: only `reset` brings it back to `IDLE`.

use derivative::Derivative;
use fpga::Clocked;
use num_bigint::BigUint;

use crate::{
    app::Squarer,
    compressor::compressor_tree_3_to_2,
    lut::ReductionLuts,
    multiply::{multiply_compress, multiply_propagate},
    normalize::normalize,
    Limbs, Modulus, Params, Pins, Result, Widths,
};

/// Cycles from `start` to `valid`, and between loop-back results.
pub const ROUND_CYCLES: u64 = 6;

#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum State {
    Idle = 1 << 0,
    Cycle0 = 1 << 1,
    Cycle1 = 1 << 2,
    Cycle2 = 1 << 3,
    Cycle3 = 1 << 4,
    Cycle4 = 1 << 5,
    Cycle5 = 1 << 6,
}

impl State {
    pub const fn next(self, start: bool) -> Self {
        use State::*;
        match self {
            Idle if start => Cycle0,
            Idle => Idle,
            Cycle0 => Cycle1,
            Cycle1 => Cycle2,
            Cycle2 => Cycle3,
            Cycle3 => Cycle4,
            Cycle4 => Cycle5,
            Cycle5 => Cycle0,
        }
    }

    /// One-hot encoding of the state register.
    pub const fn one_hot(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Debug, Default)]
struct RomOutputs {
    low: Vec<u64>,
    tables: Vec<Vec<u32>>,
}

#[derive(Derivative)]
#[derivative(Clone, Debug)]
pub struct ModularSquare {
    params: Params,
    modulus: Modulus,
    widths: Widths,
    #[derivative(Debug = "ignore")]
    luts: ReductionLuts,

    state: State,
    start_d1: bool,
    sq_in_d1: Limbs,

    #[derivative(Debug = "ignore")]
    product_columns: Vec<(u64, u64)>,
    #[derivative(Debug = "ignore")]
    product: Vec<u64>,
    #[derivative(Debug = "ignore")]
    rom: RomOutputs,
    #[derivative(Debug = "ignore")]
    reduction_columns: Vec<(u64, u64)>,
    // also the loop-back register
    sq_out: Limbs,
    valid: bool,

    rounds: u64,
}

impl ModularSquare {
    pub fn new(params: Params, modulus: Modulus) -> Result<Self> {
        let params = params.validate()?;
        let widths = Widths::derive(&params, &modulus)?;
        tracing::debug!(?widths, "width analysis");
        let luts = ReductionLuts::new(&params, &modulus);
        let num = params.num_elements();
        Ok(Self {
            params,
            modulus,
            widths,
            luts,
            state: State::Idle,
            start_d1: false,
            sq_in_d1: Limbs::zero(num),
            product_columns: vec![(0, 0); params.product_elements()],
            product: vec![0; params.product_elements()],
            rom: RomOutputs::default(),
            reduction_columns: vec![(0, 0); num],
            sq_out: Limbs::zero(num),
            valid: false,
            rounds: 0,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn widths(&self) -> &Widths {
        &self.widths
    }

    pub fn luts(&self) -> &ReductionLuts {
        &self.luts
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn valid(&self) -> bool {
        self.valid
    }

    pub fn sq_out(&self) -> &Limbs {
        &self.sq_out
    }

    /// Completed squaring rounds since the last reset.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Set from `start` until the first round's result is registered.
    pub fn start_d1(&self) -> bool {
        self.start_d1
    }

    /// Round input mux in front of the multiplier.
    pub fn round_input(&self) -> &Limbs {
        if self.start_d1 {
            &self.sq_in_d1
        } else {
            &self.sq_out
        }
    }

    /// One round without the pipeline: square, fold through the tables, normalize.
    pub fn square_reduce(&self, a: &[u64]) -> Limbs {
        let product = multiply_propagate(&multiply_compress(a, &self.params), &self.params);
        let rom = self.read_roms(&product);
        Limbs(normalize(
            &self.reduce_compress(&rom),
            self.params.word_len,
            self.params.bit_len,
        ))
    }

    fn read_roms(&self, product: &[u64]) -> RomOutputs {
        let n = self.params.nonredundant_elements;
        RomOutputs {
            low: product[..n].to_vec(),
            tables: self
                .luts
                .lookup(product)
                .into_iter()
                .map(<[u32]>::to_vec)
                .collect(),
        }
    }

    // per output column: the low product limb plus the matching word of every table output
    fn reduce_compress(&self, rom: &RomOutputs) -> Vec<(u64, u64)> {
        let mut terms = Vec::with_capacity(rom.tables.len() + 1);
        (0..self.params.num_elements())
            .map(|k| {
                terms.clear();
                if let Some(&low) = rom.low.get(k) {
                    terms.push(low);
                    terms.extend(rom.tables.iter().map(|words| words[k] as u64));
                }
                compressor_tree_3_to_2(terms.as_slice())
            })
            .collect()
    }
}

impl Clocked for ModularSquare {
    type Inputs = Pins<Limbs>;

    fn tick(&mut self, pins: &Pins<Limbs>) {
        if pins.reset {
            // control only: data registers keep whatever they hold
            self.state = State::Idle;
            self.start_d1 = false;
            self.valid = false;
            self.rounds = 0;
            return;
        }

        let state = self.state;
        match state {
            State::Idle => {
                if pins.start {
                    self.sq_in_d1 = pins.sq_in.clone();
                    self.start_d1 = true;
                }
            }
            State::Cycle0 => {
                self.product_columns = multiply_compress(self.round_input(), &self.params);
            }
            State::Cycle1 => {
                self.product = multiply_propagate(&self.product_columns, &self.params);
            }
            State::Cycle2 => {
                self.rom = self.read_roms(&self.product);
            }
            State::Cycle3 => {
                self.reduction_columns = self.reduce_compress(&self.rom);
            }
            State::Cycle4 => {
                self.sq_out = Limbs(normalize(
                    &self.reduction_columns,
                    self.params.word_len,
                    self.params.bit_len,
                ));
                self.start_d1 = false;
                self.rounds += 1;
                tracing::trace!(round = self.rounds, "round complete");
            }
            State::Cycle5 => {}
        }
        self.valid = state == State::Cycle4;
        self.state = state.next(pins.start);
    }
}

impl Squarer for ModularSquare {
    type Value = Limbs;

    fn modulus(&self) -> &Modulus {
        &self.modulus
    }

    fn encode(&self, x: &BigUint) -> Result<Limbs> {
        Limbs::encode(x, &self.params)
    }

    fn decode(&self, value: &Limbs) -> BigUint {
        value.value(self.params.word_len)
    }

    fn idle_input(&self) -> Limbs {
        Limbs::zero(self.params.num_elements())
    }

    fn valid(&self) -> bool {
        self.valid
    }

    fn sq_out(&self) -> &Limbs {
        &self.sq_out
    }

    fn latency(&self) -> u64 {
        ROUND_CYCLES
    }

    fn cycles_per_iteration(&self) -> u64 {
        ROUND_CYCLES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use num_bigint::RandBigInt as _;
    use rand::SeedableRng as _;

    fn small() -> ModularSquare {
        let params = Params::new(2).unwrap();
        let modulus = Modulus::new(BigUint::from(4_294_967_291u64)).unwrap();
        ModularSquare::new(params, modulus).unwrap()
    }

    fn pins(core: &ModularSquare, reset: bool, start: bool, x: u64) -> Pins<Limbs> {
        Pins {
            reset,
            start,
            sq_in: Limbs::encode(&BigUint::from(x), core.params()).unwrap(),
        }
    }

    #[test]
    fn one_hot_states() {
        use State::*;
        let states = [Idle, Cycle0, Cycle1, Cycle2, Cycle3, Cycle4, Cycle5];
        for s in states {
            assert_eq!(s.one_hot().count_ones(), 1);
        }
        assert_eq!(Idle.next(false), Idle);
        let mut s = Idle.next(true);
        for _ in 0..6 {
            s = s.next(false);
        }
        assert_eq!(s, Cycle0);
    }

    #[test]
    fn square_of_one_after_six_cycles() {
        let mut core = small();
        core.tick(&pins(&core, true, false, 0));
        core.tick(&pins(&core, false, true, 1));
        for cycle in 1..ROUND_CYCLES {
            assert!(!core.valid(), "early valid at cycle {}", cycle);
            core.tick(&pins(&core, false, false, 0));
        }
        assert!(core.valid());
        assert_eq!(core.state(), State::Cycle5);
        assert_eq!(&core.sq_out()[..], &[1, 0, 0, 0]);
        core.tick(&pins(&core, false, false, 0));
        assert!(!core.valid());
    }

    #[test]
    fn loops_every_six_cycles() {
        let mut core = small();
        let m = core.modulus().value().clone();
        let x = BigUint::from(0x1234_5678u64);
        core.tick(&Pins {
            reset: false,
            start: true,
            sq_in: core.encode(&x).unwrap(),
        });
        let mut expected = x.clone();
        let mut last_valid = 0;
        // the tick that sampled `start` is cycle 1
        for cycle in 2..=61u64 {
            core.tick(&pins(&core, false, false, 0));
            if core.valid() {
                assert_eq!(cycle - last_valid, ROUND_CYCLES);
                last_valid = cycle;
                expected = (&expected * &expected) % &m;
                assert_eq!(core.decode(core.sq_out()) % &m, expected);
            }
        }
        assert_eq!(core.rounds(), 10);
    }

    #[test]
    fn start_ignored_while_running() {
        let mut core = small();
        core.tick(&pins(&core, false, true, 3));
        for _ in 0..5 {
            core.tick(&pins(&core, false, true, 5));
        }
        assert!(core.valid());
        assert_eq!(core.decode(core.sq_out()), BigUint::from(9u8));
    }

    #[test]
    fn first_round_reads_latched_input_then_loops_back() {
        let mut core = small();
        core.tick(&pins(&core, false, true, 3));
        let mut from_input = vec![];
        // `start` held high with a changing `sq_in`: neither is sampled again
        for x in 0..60u64 {
            if core.state() == State::Cycle0 {
                from_input.push(core.start_d1());
            }
            core.tick(&pins(&core, false, true, 100 + x));
        }
        assert_eq!(from_input.len(), 10);
        assert!(from_input[0]);
        assert!(from_input[1..].iter().all(|&sel| !sel));
        let m = core.modulus().value().clone();
        let expected = crate::testing::reference(&BigUint::from(3u8), 10, core.modulus());
        assert_eq!(core.decode(core.sq_out()) % &m, expected);
    }

    #[test]
    fn restart_after_reset_reads_new_input() {
        let mut core = small();
        core.tick(&pins(&core, false, true, 3));
        for _ in 0..8 {
            core.tick(&pins(&core, false, false, 0));
        }
        core.tick(&pins(&core, true, false, 0));
        assert!(!core.start_d1());

        core.tick(&pins(&core, false, true, 5));
        assert!(core.start_d1());
        assert_eq!(core.decode(core.round_input()), BigUint::from(5u8));
        for _ in 1..ROUND_CYCLES {
            core.tick(&pins(&core, false, false, 0));
        }
        assert!(core.valid());
        assert_eq!(core.decode(core.sq_out()), BigUint::from(25u8));
        assert!(!core.start_d1());
        assert_eq!(core.round_input(), core.sq_out());
    }

    #[test]
    fn reset_in_any_phase() {
        for phase in 0..8 {
            let mut core = small();
            core.tick(&pins(&core, false, true, 7));
            for _ in 0..phase {
                core.tick(&pins(&core, false, false, 0));
            }
            core.tick(&pins(&core, true, false, 0));
            assert!(!core.valid());
            assert_eq!(core.state(), State::Idle);
            core.tick(&pins(&core, false, false, 0));
            assert_eq!(core.state(), State::Idle);
            assert!(!core.valid());
        }
    }

    #[test]
    fn reduction_carry_lands_in_the_top_limb() {
        let params = Params {
            redundant_elements: 1,
            ..Params::new(8).unwrap()
        };
        let modulus = Modulus::test_128();
        let core = ModularSquare::new(params, modulus.clone()).unwrap();
        let m = modulus.value();
        let x = m * 2u32 - 1u32;
        let mut limbs = core.encode(&x).unwrap();
        for _ in 0..50 {
            limbs = core.square_reduce(&limbs);
            assert!(limbs.fits(params.bit_len));
        }
        assert_eq!(
            core.decode(&limbs) % m,
            crate::testing::reference(&x, 50, &modulus)
        );
    }

    #[test]
    fn pipeline_matches_combinational_round() {
        let params = Params::new(8).unwrap();
        let modulus = Modulus::test_128();
        let mut core = ModularSquare::new(params, modulus.clone()).unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let x = rng.gen_biguint_below(&(modulus.value() * 2u32));
        let a = core.encode(&x).unwrap();
        let direct = core.square_reduce(&a);
        core.tick(&Pins {
            reset: false,
            start: true,
            sq_in: a,
        });
        for _ in 1..ROUND_CYCLES {
            core.tick(&Pins {
                reset: false,
                start: false,
                sq_in: core.idle_input(),
            });
        }
        assert!(core.valid());
        assert_eq!(core.sq_out(), &direct);
        assert_eq!(
            core.decode(&direct) % modulus.value(),
            (&x * &x) % modulus.value()
        );
    }
}
