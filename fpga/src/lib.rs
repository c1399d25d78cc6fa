//! # fpga
//!
//! Rust traits and primitives to model clocked FPGA logic.
//!
//! A model is a set of registers plus a `tick`, which computes every next-register
//! value from the current (pre-tick) register values and then commits them all at
//! once, like flip-flops on a clock edge.

use thiserror::Error;

pub mod delay;
pub use delay::DelayLine;

pub mod fifo;
pub use fifo::DcFifo;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    #[error("FIFO overflow: push while full (depth {depth})")]
    Overflow { depth: usize },
    #[error("invalid FIFO configuration: {0}")]
    FifoConfig(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;

/// Synchronous logic, advanced one clock edge at a time.
pub trait Clocked {
    /// values sampled on the clock edge
    type Inputs;

    /// advance one clock edge
    fn tick(&mut self, inputs: &Self::Inputs);
}
