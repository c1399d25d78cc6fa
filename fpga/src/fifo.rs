//! Dual-clock FIFO.
//!
//! Behavioural stand-in for an asynchronous FIFO primitive (`xpm_fifo_async`):
//! a dual-port memory plus write and read pointers that cross clock domains as
//! Gray codes through chains of synchronizer registers.
//!
//! Write side: [`DcFifo::wr_push`], [`DcFifo::full`], [`DcFifo::afull`], [`DcFifo::wr_tick`].
//! Read side: [`DcFifo::rd_pop`], [`DcFifo::rd_valid`], [`DcFifo::rd_tick`].
//!
//! Each side only sees the other side's pointer as it was `sync_stages` of its own
//! clock edges ago, so flags are conservative: `full` may stay up a little after a
//! pop, `rd_valid` rises a little after a push. Both are safe.

use std::collections::VecDeque;

use crate::{Error, Result};

/// Synchronizer depth used by the FIFO wrapper.
pub const CDC_SYNC_STAGES: usize = 2;

#[inline(always)]
pub const fn gray_encode(binary: usize) -> usize {
    binary ^ (binary >> 1)
}

#[inline]
pub const fn gray_decode(gray: usize) -> usize {
    let mut binary = gray;
    let mut shift = gray >> 1;
    while shift != 0 {
        binary ^= shift;
        shift >>= 1;
    }
    binary
}

#[derive(Clone, Debug)]
struct Synchronizer {
    // gray-coded pointer, oldest sample at the back
    chain: VecDeque<usize>,
}

impl Synchronizer {
    fn new(stages: usize) -> Self {
        Self {
            chain: core::iter::repeat(0).take(stages).collect(),
        }
    }

    fn sample(&mut self, gray: usize) {
        if self.chain.is_empty() {
            return;
        }
        self.chain.pop_back();
        self.chain.push_front(gray);
    }

    fn q(&self, current: usize) -> usize {
        self.chain.back().copied().unwrap_or(current)
    }
}

#[derive(Clone, Debug)]
pub struct DcFifo<T> {
    memory: Vec<Option<T>>,
    depth: usize,
    prog_full: usize,
    // binary pointers, modulo 2 * depth
    wr_ptr: usize,
    rd_ptr: usize,
    // read pointer as seen in the write domain, and vice versa
    rd_ptr_wr: Synchronizer,
    wr_ptr_rd: Synchronizer,
}

impl<T> DcFifo<T> {
    /// FIFO of `depth` entries (a power of two), raising `afull` at `prog_full` entries.
    pub fn new(depth: usize, prog_full: usize) -> Result<Self> {
        Self::with_sync_stages(depth, prog_full, CDC_SYNC_STAGES)
    }

    pub fn with_sync_stages(depth: usize, prog_full: usize, sync_stages: usize) -> Result<Self> {
        if depth < 2 || !depth.is_power_of_two() {
            return Err(Error::FifoConfig("depth must be a power of two >= 2"));
        }
        if prog_full == 0 || prog_full > depth {
            return Err(Error::FifoConfig("prog_full must be in 1..=depth"));
        }
        Ok(Self {
            memory: (0..depth).map(|_| None).collect(),
            depth,
            prog_full,
            wr_ptr: 0,
            rd_ptr: 0,
            rd_ptr_wr: Synchronizer::new(sync_stages),
            wr_ptr_rd: Synchronizer::new(sync_stages),
        })
    }

    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[inline(always)]
    fn wrap(&self, ptr: usize) -> usize {
        ptr % (2 * self.depth)
    }

    /// Fill level as seen from the write domain.
    pub fn wr_count(&self) -> usize {
        let rd = gray_decode(self.rd_ptr_wr.q(gray_encode(self.rd_ptr)));
        self.wrap(self.wr_ptr + 2 * self.depth - rd)
    }

    /// Fill level as seen from the read domain.
    pub fn rd_count(&self) -> usize {
        let wr = gray_decode(self.wr_ptr_rd.q(gray_encode(self.wr_ptr)));
        self.wrap(wr + 2 * self.depth - self.rd_ptr)
    }

    pub fn full(&self) -> bool {
        self.wr_count() >= self.depth
    }

    pub fn afull(&self) -> bool {
        self.wr_count() >= self.prog_full
    }

    /// Write `data` into the FIFO; must not be called while [`DcFifo::full`].
    pub fn wr_push(&mut self, data: T) -> Result<()> {
        if self.full() {
            tracing::warn!(depth = self.depth, "push into full fifo");
            return Err(Error::Overflow { depth: self.depth });
        }
        let slot = self.wr_ptr % self.depth;
        self.memory[slot] = Some(data);
        self.wr_ptr = self.wrap(self.wr_ptr + 1);
        Ok(())
    }

    /// Write clock edge: the read pointer advances one synchronizer stage.
    pub fn wr_tick(&mut self) {
        self.rd_ptr_wr.sample(gray_encode(self.rd_ptr));
    }

    pub fn rd_valid(&self) -> bool {
        self.rd_count() > 0
    }

    /// Read the oldest entry, if the read domain knows of one.
    pub fn rd_pop(&mut self) -> Option<T> {
        if !self.rd_valid() {
            return None;
        }
        let slot = self.rd_ptr % self.depth;
        self.rd_ptr = self.wrap(self.rd_ptr + 1);
        self.memory[slot].take()
    }

    /// Read clock edge: the write pointer advances one synchronizer stage.
    pub fn rd_tick(&mut self) {
        self.wr_ptr_rd.sample(gray_encode(self.wr_ptr));
    }
}
