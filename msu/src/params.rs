//! Parameters of the redundant-limb squarer, and the width analysis that keeps
//! its fixed-width datapath from silently truncating.

use num_bigint::BigUint;
use num_traits::{One as _, Zero as _};

use crate::{Error, Result};

/// 128-bit modulus used for quick simulation runs.
pub const TEST_MODULUS_128: &str = "302934307671667531413257853548643485645";

/// 1024-bit RSA modulus of the VDF FPGA competition.
pub const VDF_MODULUS_1024: &str = "124066695684124741398798927404814432744698427125735684128131855064976895337309138910015071214657674309443149407457493434579063840841220334555160125016331040933690674569571217337630239191517205721310197608387239846364360850220896772964978569683229449266819903414117058030106528073928633017118689826625594484331";

/// `$clog2`: number of bits needed to address `x` entries.
pub const fn clog2(x: u64) -> u64 {
    if x <= 1 {
        0
    } else {
        64 - (x - 1).leading_zeros() as u64
    }
}

#[inline(always)]
pub(crate) const fn bits128(x: u128) -> u64 {
    (128 - x.leading_zeros()) as u64
}

#[derive(Clone, Debug, Eq, PartialEq)]
/// Fixed modulus of the squarer, baked into its reduction tables.
pub struct Modulus(BigUint);

impl Modulus {
    pub fn new(value: BigUint) -> Result<Self> {
        if value <= BigUint::one() {
            return Err(Error::Modulus("must be greater than one"));
        }
        Ok(Self(value))
    }

    pub fn from_decimal(s: &str) -> Result<Self> {
        let value = BigUint::parse_bytes(s.trim().as_bytes(), 10)
            .ok_or_else(|| Error::Parse(format!("modulus {:?}", s)))?;
        Self::new(value)
    }

    pub fn test_128() -> Self {
        let value = BigUint::parse_bytes(TEST_MODULUS_128.as_bytes(), 10);
        Self(value.unwrap_or_else(|| unreachable!()))
    }

    pub fn vdf_1024() -> Self {
        let value = BigUint::parse_bytes(VDF_MODULUS_1024.as_bytes(), 10);
        Self(value.unwrap_or_else(|| unreachable!()))
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }

    pub fn bits(&self) -> u64 {
        self.0.bits()
    }
}

impl AsRef<BigUint> for Modulus {
    fn as_ref(&self) -> &BigUint {
        &self.0
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
/// Shape of the redundant limb vector.
pub struct Params {
    pub redundant_elements: usize,
    pub nonredundant_elements: usize,
    /// nominal digit width
    pub word_len: u32,
    /// stored limb width, `word_len` plus slack
    pub bit_len: u32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            redundant_elements: 2,
            nonredundant_elements: 64,
            word_len: 16,
            bit_len: 17,
        }
    }
}

impl Params {
    /// Default limb shape (16-bit words in 17-bit limbs, 2 redundant limbs).
    pub fn new(nonredundant_elements: usize) -> Result<Self> {
        Self {
            nonredundant_elements,
            ..Self::default()
        }
        .validate()
    }

    pub fn validate(self) -> Result<Self> {
        if self.nonredundant_elements == 0 {
            return Err(Error::Params("need at least one nonredundant element"));
        }
        if self.redundant_elements == 0 {
            return Err(Error::Params("need at least one redundant element"));
        }
        if self.word_len < 2 || self.word_len % 2 != 0 {
            return Err(Error::Params("word_len must be even"));
        }
        if self.bit_len <= self.word_len {
            return Err(Error::Params("bit_len must exceed word_len"));
        }
        // a doubled limb product must fit the column word
        if 2 * self.bit_len + 1 > 62 {
            return Err(Error::Width {
                what: "limb product",
                needed: 2 * self.bit_len as u64 + 1,
                available: 62,
            });
        }
        Ok(self)
    }

    pub const fn num_elements(&self) -> usize {
        self.redundant_elements + self.nonredundant_elements
    }

    /// Columns of the squared product.
    pub const fn product_elements(&self) -> usize {
        2 * self.num_elements()
    }

    /// Product limbs folded back through the reduction tables.
    pub const fn lut_positions(&self) -> usize {
        self.product_elements() - self.nonredundant_elements
    }

    /// Address width of the low-byte table (`lut8` for 16-bit words).
    pub const fn lut_lo_bits(&self) -> u32 {
        self.word_len / 2
    }

    /// Address width of the high-byte table (`lut9` for 17-bit limbs).
    pub const fn lut_hi_bits(&self) -> u32 {
        self.bit_len - self.word_len / 2
    }

    /// Nominal accumulator slack, `$clog2(2*NUM_ELEMENTS+1)`.
    pub const fn acc_extra_bit_len(&self) -> u64 {
        clog2(2 * self.num_elements() as u64 + 1)
    }

    #[inline(always)]
    pub const fn word_mask(&self) -> u64 {
        (1 << self.word_len) - 1
    }

    #[inline(always)]
    pub const fn limb_mask(&self) -> u64 {
        (1 << self.bit_len) - 1
    }

    /// Number of bits the limb vector can represent without truncating the square.
    pub const fn domain_bits(&self) -> u64 {
        self.word_len as u64 * self.num_elements() as u64
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
/// Worst-case widths of the squarer datapath for a given modulus.
pub struct Widths {
    /// widest multiplier column sum
    pub product_acc_bits: u64,
    /// widest normalized product limb
    pub product_limb_bits: u64,
    /// widest reduction column sum
    pub reduction_acc_bits: u64,
    /// nominal reduction accumulator, `BIT_LEN + $clog2(2N+1)`
    pub nominal_acc_bits: u64,
    /// widest output limb
    pub output_limb_bits: u64,
    /// bound on the value of any output
    pub output_value_bits: u64,
    /// most partial terms landing on one multiplier column
    pub max_fan_in: usize,
}

impl Widths {
    /// Derive the widths for all-limbs-maximal inputs and check them against the
    /// configured limb width.
    pub fn derive(params: &Params, modulus: &Modulus) -> Result<Self> {
        let w = params.word_len;
        let b = params.bit_len as u64;
        let n = params.nonredundant_elements;
        let num = params.num_elements();
        let cols = params.product_elements();
        let word_max = params.word_mask() as u128;

        if modulus.bits() > w as u64 * n as u64 {
            return Err(Error::Width {
                what: "modulus",
                needed: modulus.bits(),
                available: w as u64 * n as u64,
            });
        }

        let limb_max = params.limb_mask() as u128;
        let mut column = vec![0u128; cols];
        let mut fan_in = vec![0usize; cols];
        for i in 0..num {
            for j in i..num {
                let product = limb_max * limb_max * if i == j { 1 } else { 2 };
                column[i + j] += product.min(word_max);
                fan_in[i + j] += 1;
                column[i + j + 1] += product >> w;
                fan_in[i + j + 1] += 1;
            }
        }
        let product_acc_bits = column.iter().copied().map(bits128).max().unwrap_or(0);
        if product_acc_bits > 64 {
            return Err(Error::Width {
                what: "multiplier column",
                needed: product_acc_bits,
                available: 64,
            });
        }

        let normalized = |sums: &[u128], k: usize| -> u128 {
            let carry = if k == 0 { 0 } else { sums[k - 1] >> w };
            sums[k].min(word_max) + carry
        };

        let product: Vec<u128> = (0..cols).map(|k| normalized(&column, k)).collect();
        let product_limb_bits = product.iter().copied().map(bits128).max().unwrap_or(0);
        if product_limb_bits > b {
            return Err(Error::Width {
                what: "product limb",
                needed: product_limb_bits,
                available: b,
            });
        }

        let lut_terms = 2 * params.lut_positions() as u128;
        let mut reduction = vec![0u128; num];
        for (k, sum) in reduction.iter_mut().enumerate().take(n) {
            *sum = product[k] + lut_terms * word_max;
        }
        let reduction_acc_bits = reduction.iter().copied().map(bits128).max().unwrap_or(0);
        let nominal_acc_bits = b + params.acc_extra_bit_len();
        if reduction_acc_bits > nominal_acc_bits {
            tracing::warn!(
                derived = reduction_acc_bits,
                nominal = nominal_acc_bits,
                "nominal $clog2 accumulator width is narrower than the worst case"
            );
        }
        // the carry out of column n-1 is output limb n, checked with the others
        let output: Vec<u128> = (0..num).map(|k| normalized(&reduction, k)).collect();
        let output_limb_bits = output.iter().copied().map(bits128).max().unwrap_or(0);
        if output_limb_bits > b {
            return Err(Error::Width {
                what: "output limb",
                needed: output_limb_bits,
                available: b,
            });
        }

        // low product limbs plus every table entry at its largest
        let mut bound = BigUint::zero();
        for (k, limb) in product.iter().enumerate().take(n) {
            bound += BigUint::from(*limb) << (w as usize * k);
        }
        bound += BigUint::from(lut_terms) * (modulus.value() - 1u32);
        let output_value_bits = bound.bits();
        if output_value_bits > params.domain_bits() {
            return Err(Error::Width {
                what: "output value",
                needed: output_value_bits,
                available: params.domain_bits(),
            });
        }

        Ok(Self {
            product_acc_bits,
            product_limb_bits,
            reduction_acc_bits,
            nominal_acc_bits,
            output_limb_bits,
            output_value_bits,
            max_fan_in: fan_in.into_iter().max().unwrap_or(0),
        })
    }
}
