use crate::{Error, Modulus, Result};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
/// Word-split squaring kernel for one symbol.
pub enum Kernel {
    /// two sub-words, three multiplies
    Square34,
    /// three sub-words, four multiplies
    Square42,
}

impl Kernel {
    /// Widest operand the kernel squares.
    pub const fn width(self) -> u32 {
        match self {
            Kernel::Square34 => 34,
            Kernel::Square42 => 42,
        }
    }

    /// DSP slices in the kernel's cascade.
    pub const fn multiplies(self) -> usize {
        match self {
            Kernel::Square34 => 3,
            Kernel::Square42 => 4,
        }
    }

    pub fn square(self, x: u64) -> u128 {
        match self {
            Kernel::Square34 => super::dsp::square34(x),
            Kernel::Square42 => super::dsp::square42(x),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
/// Shape of the radix-`2^LOGRADIX` squarer.
pub struct MetzgenParams {
    /// width of the flat `sq_in`/`sq_out` ports
    pub mod_len: usize,
    pub log_radix: u32,
    pub log_num_symbols: u32,
    /// pure-delay registers on either side of the core
    pub io_stages: usize,
}

impl Default for MetzgenParams {
    fn default() -> Self {
        Self {
            mod_len: 1024,
            log_radix: 33,
            log_num_symbols: 5,
            io_stages: 3,
        }
    }
}

impl MetzgenParams {
    pub const fn num_symbols(&self) -> usize {
        1 << self.log_num_symbols
    }

    /// Width of the redundant `sqa`/`sqb` outputs, `LOGRADIX * NUMSYMBOLS`.
    pub const fn mod_bit_width(&self) -> usize {
        self.log_radix as usize * self.num_symbols()
    }

    /// Bits per signed product symbol: a sign bit followed by `1 + LOGRADIX` bits.
    pub const fn symbol_bits(&self) -> u32 {
        self.log_radix + 2
    }

    /// Product symbols whose low `LOGRADIX` bits are added directly; everything
    /// above goes through the 6-input lookup tables.
    pub const fn low_symbols(&self) -> usize {
        self.mod_len / self.log_radix as usize
    }

    /// Cycles from `start` at the pins to the first `valid`.
    pub const fn latency(&self) -> u64 {
        2 * self.io_stages as u64 + 2
    }

    pub fn kernel(&self) -> Result<Kernel> {
        // a symbol of `sqa + sqb` carries one extra bit
        match self.log_radix + 1 {
            w if w <= Kernel::Square34.width() => Ok(Kernel::Square34),
            w if w <= Kernel::Square42.width() => Ok(Kernel::Square42),
            w => Err(Error::Width {
                what: "symbol square",
                needed: w as u64,
                available: Kernel::Square42.width() as u64,
            }),
        }
    }

    pub fn validate(self, modulus: &Modulus) -> Result<Self> {
        if self.log_radix < 2 {
            return Err(Error::Params("log_radix must be at least 2"));
        }
        self.kernel()?;
        if self.low_symbols() == 0 {
            return Err(Error::Params("mod_len must cover at least one symbol"));
        }
        if self.mod_len > self.mod_bit_width() {
            return Err(Error::Width {
                what: "mod_len",
                needed: self.mod_len as u64,
                available: self.mod_bit_width() as u64,
            });
        }
        if modulus.bits() > self.mod_len as u64 {
            return Err(Error::Width {
                what: "modulus",
                needed: modulus.bits(),
                available: self.mod_len as u64,
            });
        }
        // product coefficients accumulate in 128 bits
        let coefficient_bits = 2 * (self.log_radix as u64 + 1) + self.log_num_symbols as u64 + 1;
        if coefficient_bits > 127 {
            return Err(Error::Width {
                what: "product coefficient",
                needed: coefficient_bits,
                available: 127,
            });
        }
        if 2 * self.io_stages + 2 > 64 {
            return Err(Error::Params("io_stages too deep for ignore_valid"));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_shape() {
        let params = MetzgenParams::default();
        assert_eq!(params.num_symbols(), 32);
        assert_eq!(params.mod_bit_width(), 1056);
        assert_eq!(params.low_symbols(), 31);
        assert_eq!(params.latency(), 8);
        assert_eq!(params.kernel().unwrap(), Kernel::Square34);
        assert!(params.validate(&Modulus::vdf_1024()).is_ok());
    }

    #[test]
    fn kernel_selection() {
        let params = |log_radix| MetzgenParams {
            log_radix,
            ..MetzgenParams::default()
        };
        assert_eq!(params(17).kernel().unwrap(), Kernel::Square34);
        assert_eq!(params(34).kernel().unwrap(), Kernel::Square42);
        assert_eq!(params(41).kernel().unwrap(), Kernel::Square42);
        assert!(params(42).kernel().is_err());
        assert_eq!(Kernel::Square34.multiplies(), 3);
        assert_eq!(Kernel::Square42.multiplies(), 4);
    }

    #[test]
    fn modulus_must_fit_ports() {
        let params = MetzgenParams {
            mod_len: 128,
            log_radix: 17,
            log_num_symbols: 3,
            io_stages: 1,
        };
        assert!(params.validate(&Modulus::test_128()).is_ok());
        assert!(matches!(
            params.validate(&Modulus::vdf_1024()),
            Err(Error::Width { what: "modulus", .. })
        ));
        let narrow = MetzgenParams {
            log_num_symbols: 2,
            ..params
        };
        assert!(matches!(
            narrow.validate(&Modulus::test_128()),
            Err(Error::Width { what: "mod_len", .. })
        ));
    }
}
