//! Cycle-level models of modular squaring units (MSUs) for verifiable delay functions.
//!
//! Two squaring cores, each bit-accurate to its hardware datapath and cycle-accurate to
//! its pipeline:
//!
//! - [`ModularSquare`]: redundant 16-bit digits in 17-bit limbs, a compressor-tree
//!   squaring array and table-driven reduction, six cycles per squaring in a loop.
//! - [`ModularSquareMetzgen`]: radix-`2^33` symbols squared on chained DSP slices,
//!   reduced through 6-input tables, one squaring per cycle.
//!
//! Both run behind the same [`Msu`] harness, which drives them like the RTL testbench:
//! reset, pulse `start`, collect `valid` results through a dual-clock FIFO.
//!
//! Iterated squaring `x <- x^2 mod M` never leaves the core's redundant form; only
//! the final result is converted to a canonical residue.

pub mod app;
pub use app::{Job, Msu, Squarer};

pub mod compressor;

pub mod error;
pub use error::{Error, Result};

pub mod io;

pub mod limbs;
pub use limbs::Limbs;

pub mod lut;

pub mod metzgen;
pub use metzgen::{MetzgenParams, ModularSquareMetzgen};

pub mod multiply;

pub mod normalize;

pub mod params;
pub use params::{Modulus, Params, Widths};

pub mod square;
pub use square::ModularSquare;

pub mod testing;

pub mod timing;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
/// Input pins of a squaring core, sampled on the clock edge.
pub struct Pins<V> {
    /// synchronous, active high
    pub reset: bool,
    pub start: bool,
    pub sq_in: V,
}
