//! Host-side harness driving a squaring core cycle by cycle.
//!
//! Mirrors the RTL testbench: hold `reset` for a while, pulse `start` with the input,
//! count `valid` pulses, and pass every result through a dual-clock FIFO into the host
//! clock domain. A watchdog bounds the number of cycles per job.

use fpga::{Clocked, DcFifo};
use num_bigint::BigUint;

use crate::{Error, Modulus, Pins, Result};

/// Cycles `reset` is held high.
pub const RESET_CYCLES: u64 = 10;
/// Idle cycles after reset before the first `start`.
pub const SETTLE_CYCLES: u64 = 3;
/// Cycles the watchdog allows on top of the expected job length.
pub const WATCHDOG_SLACK: u64 = 1000;

const RESULT_FIFO_DEPTH: usize = 16;
const RESULT_FIFO_PROG_FULL: usize = 12;

/// A squaring core as seen from its pins.
///
/// Cores also implement [`fpga::Clocked`] with [`Pins`] of their native value as inputs.
pub trait Squarer {
    /// native `sq_in`/`sq_out` representation
    type Value: Clone;

    fn modulus(&self) -> &Modulus;

    /// `x` in the core's input format, if it lies in the core's operating domain.
    fn encode(&self, x: &BigUint) -> Result<Self::Value>;

    /// Integer held by an output; congruent to, not necessarily reduced mod, `M`.
    fn decode(&self, value: &Self::Value) -> BigUint;

    /// `sq_in` driven while not starting a job.
    fn idle_input(&self) -> Self::Value;

    fn valid(&self) -> bool;

    fn sq_out(&self) -> &Self::Value;

    /// Cycles from the `start` edge to the first `valid`.
    fn latency(&self) -> u64;

    /// Cycles between consecutive results of a running job.
    fn cycles_per_iteration(&self) -> u64;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Job {
    /// `sq_in^(2^iterations) mod M`
    pub sq_out: BigUint,
    pub iterations: u64,
    /// core cycles from `start` to the last result
    pub cycles: u64,
}

#[derive(Clone, Debug)]
/// Modular squaring unit: a core plus its testbench.
pub struct Msu<S: Squarer> {
    core: S,
    results: DcFifo<S::Value>,
    cycles: u64,
    watchdog: Option<u64>,
}

impl<S> Msu<S>
where
    S: Squarer + Clocked<Inputs = Pins<<S as Squarer>::Value>>,
{
    pub fn new(core: S) -> Result<Self> {
        Ok(Self {
            core,
            results: DcFifo::new(RESULT_FIFO_DEPTH, RESULT_FIFO_PROG_FULL)?,
            cycles: 0,
            watchdog: None,
        })
    }

    /// Fixed cycle limit per job instead of one derived from the core's timing.
    pub fn with_watchdog(mut self, cycles: u64) -> Self {
        self.watchdog = Some(cycles);
        self
    }

    pub fn core(&self) -> &S {
        &self.core
    }

    /// Core cycles since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn clock_cycle(&mut self, pins: &Pins<S::Value>) {
        self.core.tick(pins);
        self.cycles += 1;
    }

    fn idle(&self, reset: bool) -> Pins<S::Value> {
        Pins {
            reset,
            start: false,
            sq_in: self.core.idle_input(),
        }
    }

    pub fn reset(&mut self) {
        let reset = self.idle(true);
        for _ in 0..RESET_CYCLES {
            self.clock_cycle(&reset);
        }
        let idle = self.idle(false);
        for _ in 0..SETTLE_CYCLES {
            self.clock_cycle(&idle);
        }
        tracing::debug!(cycles = self.cycles, "reset");
    }

    fn watchdog_limit(&self, iterations: u64) -> u64 {
        self.watchdog.unwrap_or_else(|| {
            self.core.latency()
                + iterations * self.core.cycles_per_iteration()
                + WATCHDOG_SLACK
        })
    }

    /// Square `sq_in` `iterations` times: returns `sq_in^(2^iterations) mod M`.
    pub fn compute(&mut self, sq_in: &BigUint, iterations: u64) -> Result<Job> {
        if iterations == 0 {
            return Err(Error::Params("a job needs at least one iteration"));
        }
        let input = self.core.encode(sq_in)?;
        self.reset();

        let limit = self.watchdog_limit(iterations);
        tracing::info!(iterations, latency = self.core.latency(), limit, "job start");

        let idle = self.idle(false);
        self.clock_cycle(&Pins {
            reset: false,
            start: true,
            sq_in: input,
        });

        let mut elapsed = 1;
        let mut seen = 0;
        let mut done_at = 0;
        let mut drained = 0;
        let mut last = None;
        while drained < iterations {
            if elapsed > limit {
                tracing::warn!(cycles = elapsed, seen, drained, "watchdog");
                return Err(Error::Watchdog { cycles: elapsed });
            }
            if seen < iterations && self.core.valid() {
                self.results.wr_push(self.core.sq_out().clone())?;
                seen += 1;
                if seen == iterations {
                    done_at = elapsed;
                }
                tracing::trace!(iteration = seen, cycle = elapsed, "valid");
            }
            self.results.wr_tick();
            self.results.rd_tick();
            while let Some(value) = self.results.rd_pop() {
                last = Some(value);
                drained += 1;
            }
            if seen < iterations {
                self.clock_cycle(&idle);
            }
            elapsed += 1;
        }

        let value = last.ok_or(Error::Watchdog { cycles: elapsed })?;
        let sq_out = self.core.decode(&value) % self.core.modulus().value();
        tracing::info!(iterations, cycles = done_at, "job done");
        Ok(Job {
            sq_out,
            iterations,
            cycles: done_at,
        })
    }
}
