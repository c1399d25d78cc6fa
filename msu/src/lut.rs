//! Reduction lookup tables (`lut8`, `lut9`).
//!
//! Product limb `P[n+p]` weighs `2^(w*(n+p))`, which exceeds the modulus. Its low
//! `w/2` bits address `lut8[p]`, its high bits address `lut9[p]`; both tables return
//! that address's contribution mod `M` as `n` words, so summing the lower `n`
//! product limbs and all table outputs gives a value congruent to the product.
//!
//! The contents only depend on the modulus, the word length and the position, so they
//! are regenerated here instead of being shipped. [`ReductionLuts::write_dat`] and
//! [`ReductionLuts::read_dat`] exchange them with `precompute_lut*_NNN.dat` files.

use std::path::{Path, PathBuf};

use derivative::Derivative;
use num_bigint::BigUint;
use num_integer::Integer;
use rayon::prelude::*;

use crate::{
    io::{load_dat, store_dat},
    Error, Limbs, Modulus, Params, Result,
};

#[derive(Derivative)]
#[derivative(Clone, Debug)]
/// One bank of read-only memories, one ROM per folded position.
pub struct ReductionLut {
    name: &'static str,
    addr_bits: u32,
    // weight of address bit 0 relative to the limb
    shift: u32,
    words: usize,
    #[derivative(Debug = "ignore")]
    roms: Vec<Vec<u32>>,
}

impl ReductionLut {
    /// Table of the low `w/2` bits of each folded limb.
    pub fn lut8(params: &Params, modulus: &Modulus) -> Self {
        Self::generate("lut8", params, modulus, params.lut_lo_bits(), 0)
    }

    /// Table of the remaining high bits of each folded limb.
    pub fn lut9(params: &Params, modulus: &Modulus) -> Self {
        Self::generate("lut9", params, modulus, params.lut_hi_bits(), params.lut_lo_bits())
    }

    fn generate(
        name: &'static str,
        params: &Params,
        modulus: &Modulus,
        addr_bits: u32,
        shift: u32,
    ) -> Self {
        let n = params.nonredundant_elements;
        let m = modulus.value();
        let roms = (0..params.lut_positions())
            .into_par_iter()
            .map(|p| {
                let exponent = params.word_len as usize * (n + p) + shift as usize;
                let base = (BigUint::from(1u8) << exponent) % m;
                let mut rom = Vec::with_capacity(n << addr_bits);
                let mut entry = BigUint::from(0u8);
                for _ in 0..(1usize << addr_bits) {
                    let words = Limbs::encode_digits(&entry, params.word_len, n);
                    rom.extend(words.iter().map(|&word| word as u32));
                    entry += &base;
                    if &entry >= m {
                        entry -= m;
                    }
                }
                rom
            })
            .collect();
        Self {
            name,
            addr_bits,
            shift,
            words: n,
            roms,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn positions(&self) -> usize {
        self.roms.len()
    }

    pub fn entries(&self) -> usize {
        1 << self.addr_bits
    }

    /// Address this table sees for a product limb.
    #[inline(always)]
    pub fn address(&self, limb: u64) -> usize {
        ((limb >> self.shift) & ((1 << self.addr_bits) - 1)) as usize
    }

    /// ROM read: `n` words of `(addr << shift) * 2^(w*(n+position)) mod M`.
    #[inline]
    pub fn read(&self, position: usize, addr: usize) -> &[u32] {
        &self.roms[position][addr * self.words..(addr + 1) * self.words]
    }

    pub fn entry(&self, position: usize, addr: usize, word_len: u32) -> BigUint {
        let words: Vec<u64> = self.read(position, addr).iter().map(|&w| w as u64).collect();
        Limbs(words).value(word_len)
    }

    fn file_name(&self, position: usize) -> String {
        format!("precompute_{}_{:03}.dat", self.name, position)
    }
}

#[derive(Clone, Debug)]
/// Both banks of the reduction stage.
pub struct ReductionLuts {
    pub lut8: ReductionLut,
    pub lut9: ReductionLut,
    params: Params,
}

impl ReductionLuts {
    pub fn new(params: &Params, modulus: &Modulus) -> Self {
        let (lut8, lut9) = crate::timing::timed("generating reduction tables", || {
            rayon::join(
                || ReductionLut::lut8(params, modulus),
                || ReductionLut::lut9(params, modulus),
            )
        });
        tracing::info!(
            positions = lut8.positions(),
            lut8_entries = lut8.entries(),
            lut9_entries = lut9.entries(),
            "reduction tables ready"
        );
        Self {
            lut8,
            lut9,
            params: *params,
        }
    }

    /// Read both banks for every folded product limb: `2 * lut_positions` outputs.
    pub fn lookup<'a>(&'a self, product: &[u64]) -> Vec<&'a [u32]> {
        let n = self.params.nonredundant_elements;
        product[n..]
            .iter()
            .enumerate()
            .flat_map(|(p, &limb)| {
                [
                    self.lut8.read(p, self.lut8.address(limb)),
                    self.lut9.read(p, self.lut9.address(limb)),
                ]
            })
            .collect()
    }

    fn digits(&self) -> usize {
        let bits = self.params.word_len as usize * self.params.nonredundant_elements;
        Integer::div_ceil(&bits, &4)
    }

    /// Write `precompute_lut8_NNN.dat` and `precompute_lut9_NNN.dat` into `dir`.
    pub fn write_dat(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = vec![];
        for lut in [&self.lut8, &self.lut9] {
            for p in 0..lut.positions() {
                let path = dir.join(lut.file_name(p));
                let entries: Vec<BigUint> = (0..lut.entries())
                    .map(|addr| lut.entry(p, addr, self.params.word_len))
                    .collect();
                store_dat(&path, &entries, self.digits())?;
                written.push(path);
            }
        }
        tracing::info!(files = written.len(), dir = %dir.display(), "wrote reduction tables");
        Ok(written)
    }

    /// Load tables from `dir` and check them against the modulus they were built for.
    pub fn read_dat(&self, dir: &Path) -> Result<()> {
        for lut in [&self.lut8, &self.lut9] {
            for p in 0..lut.positions() {
                let file = dir.join(lut.file_name(p));
                let entries = load_dat(&file)?;
                if entries.len() != lut.entries() {
                    return Err(Error::LutMismatch {
                        file,
                        line: entries.len().min(lut.entries()) + 1,
                    });
                }
                for (addr, entry) in entries.iter().enumerate() {
                    if *entry != lut.entry(p, addr, self.params.word_len) {
                        return Err(Error::LutMismatch {
                            file,
                            line: addr + 1,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> (Params, Modulus) {
        let params = Params::new(2).unwrap();
        let modulus = Modulus::new(BigUint::from(4_294_967_291u64)).unwrap();
        (params, modulus)
    }

    #[test]
    fn entries_are_weighted_residues() {
        let (params, modulus) = small();
        let luts = ReductionLuts::new(&params, &modulus);
        let m = modulus.value();
        for p in 0..params.lut_positions() {
            for addr in [0usize, 1, 77, 255] {
                let weight = BigUint::from(1u8) << (16 * (2 + p));
                assert_eq!(luts.lut8.entry(p, addr, 16), (&weight * addr) % m);
            }
            for addr in [0usize, 1, 300, 511] {
                let weight = BigUint::from(1u8) << (16 * (2 + p) + 8);
                assert_eq!(luts.lut9.entry(p, addr, 16), (&weight * addr) % m);
            }
        }
    }

    #[test]
    fn address_split() {
        let (params, modulus) = small();
        let luts = ReductionLuts::new(&params, &modulus);
        let limb = 0x1_a5c3;
        assert_eq!(luts.lut8.address(limb), 0xc3);
        assert_eq!(luts.lut9.address(limb), 0x1a5);
        assert_eq!(luts.lookup(&[0; 8]).len(), 2 * params.lut_positions());
    }

    #[test]
    fn dat_files_cross_check() {
        let (params, modulus) = small();
        let luts = ReductionLuts::new(&params, &modulus);
        let dir = std::env::temp_dir().join(format!("vdf-msu-lut-{}", std::process::id()));
        let written = luts.write_dat(&dir).unwrap();
        assert_eq!(written.len(), 2 * params.lut_positions());
        assert!(written[0].ends_with("precompute_lut8_000.dat"));
        luts.read_dat(&dir).unwrap();

        // tables built for another modulus must be rejected
        let other = Modulus::new(BigUint::from(4_294_967_279u64)).unwrap();
        let wrong = ReductionLuts::new(&params, &other);
        assert!(matches!(wrong.read_dat(&dir), Err(Error::LutMismatch { .. })));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
