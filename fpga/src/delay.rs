use std::collections::VecDeque;

use crate::Clocked;

#[derive(Clone, Debug)]
/// Pure-delay pipeline of `stages` registers.
///
/// Used to absorb routing delay (e.g. SLR crossings): functionally a no-op delay line.
/// The registers have no reset, so whatever they held before a reset keeps flowing out.
pub struct DelayLine<T> {
    stages: VecDeque<T>,
}

impl<T: Clone> DelayLine<T> {
    /// Delay line of `stages` registers, all holding `init`.
    pub fn new(stages: usize, init: T) -> Self {
        Self {
            stages: core::iter::repeat(init).take(stages).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Output of the last register.
    ///
    /// A zero-stage delay line has no registers and therefore no output of its own;
    /// use [`DelayLine::pass`] for a combinational pass-through.
    pub fn q(&self) -> Option<&T> {
        self.stages.back()
    }

    /// Output given the value currently presented at the input.
    pub fn pass<'a>(&'a self, d: &'a T) -> &'a T {
        self.stages.back().unwrap_or(d)
    }
}

impl<T: Clone> Clocked for DelayLine<T> {
    type Inputs = T;

    fn tick(&mut self, d: &T) {
        if self.stages.is_empty() {
            return;
        }
        self.stages.pop_back();
        self.stages.push_front(d.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_by_stage_count() {
        let mut line = DelayLine::new(3, 0u32);
        let mut seen = vec![];
        for d in 1..=6 {
            line.tick(&d);
            seen.push(*line.q().unwrap());
        }
        assert_eq!(seen, [0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn zero_stages_is_combinational() {
        let mut line = DelayLine::new(0, false);
        line.tick(&true);
        assert!(line.q().is_none());
        assert!(*line.pass(&true));
    }
}
