//! DSP-slice model and the word-split symbol squares built from chained slices.
//!
//! A slice multiplies a 27-bit `A` port (optionally doubled by the pre-adder) by an
//! 18-bit `B` port and adds the cascaded partial product of the previous slice shifted
//! down by 17 bits. The low 17 bits of each slice are final; the rest moves on through
//! `pcout`.

/// Bits a slice retires before cascading.
pub const CASCADE_SHIFT: u32 = 17;

const LOW: u64 = (1 << CASCADE_SHIFT) - 1;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Dsp {
    /// multiply `A + A` instead of `A`
    pub double: bool,
}

impl Dsp {
    pub const A_BITS: u32 = 27;
    pub const B_BITS: u32 = 18;

    pub const fn doubled() -> Self {
        Self { double: true }
    }

    /// `p = (double ? 2a : a) * b + (pcin >> 17)`
    #[inline(always)]
    pub fn mac(self, a: u64, b: u64, pcin: u128) -> u128 {
        debug_assert!(a >> (Self::A_BITS - 1) == 0);
        debug_assert!(b >> (Self::B_BITS - 1) == 0);
        let a = if self.double { a << 1 } else { a };
        (a as u128) * (b as u128) + (pcin >> CASCADE_SHIFT)
    }
}

/// Square a value of up to 34 bits with three slices.
///
/// `x = A*2^17 + B`: `B^2`, then `2AB`, then `A^2`, each stage absorbing the
/// previous stage's upper bits.
pub fn square34(x: u64) -> u128 {
    debug_assert!(x >> 34 == 0);
    let a = x >> CASCADE_SHIFT;
    let b = x & LOW;
    let p0 = Dsp::default().mac(b, b, 0);
    let p1 = Dsp::doubled().mac(a, b, p0);
    let p2 = Dsp::default().mac(a, a, p1);
    (p2 << 34) | ((p1 & LOW as u128) << 17) | (p0 & LOW as u128)
}

/// Square a value of up to 42 bits with four slices.
///
/// `x = A*2^17 + B` with a 25-bit `A = Ah*2^17 + Al`, and `A^2` is computed as
/// `A*Al + A*Ah*2^17`.
pub fn square42(x: u64) -> u128 {
    debug_assert!(x >> 42 == 0);
    let a = x >> CASCADE_SHIFT;
    let b = x & LOW;
    let a_lo = a & LOW;
    let a_hi = a >> CASCADE_SHIFT;
    let p0 = Dsp::default().mac(b, b, 0);
    let p1 = Dsp::doubled().mac(a, b, p0);
    let p2 = Dsp::default().mac(a, a_lo, p1);
    let p3 = Dsp::default().mac(a, a_hi, p2);
    (p3 << 51) | ((p2 & LOW as u128) << 34) | ((p1 & LOW as u128) << 17) | (p0 & LOW as u128)
}
