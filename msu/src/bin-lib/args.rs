//! Arguments of the `vdf-msu` demo.

use core::str::FromStr;
use num_integer::Integer;

use vdf_msu::{io::decode_entry, Error, MetzgenParams, Modulus, Params};

#[derive(argh::FromArgs)]
/// Simulate modular squaring units
pub struct Args {
    /// modulus in decimal (default: the 1024-bit VDF modulus)
    #[argh(option, short = 'm')]
    pub modulus: Option<String>,

    /// use the 128-bit test modulus
    #[argh(switch)]
    pub small: bool,

    /// verbose output
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    #[argh(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(argh::FromArgs)]
#[argh(subcommand)]
pub enum Subcommand {
    Square(Square),
    Lut(Lut),
    Widths(Widths),
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "square")]
/// Run an iterated squaring job and check it against the reference
pub struct Square {
    /// squarer: `a` (redundant limbs) or `b` (radix symbols)
    #[argh(positional)]
    pub strategy: Strategy,

    /// number of squarings
    #[argh(option, short = 't', default = "1000")]
    pub iterations: u64,

    /// input in hex (default: random below 2M)
    #[argh(option, short = 'x')]
    pub input: Option<String>,
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "lut")]
/// Write the reduction tables as precompute_lut*_NNN.dat files
pub struct Lut {
    /// output directory
    #[argh(positional)]
    pub dir: String,

    /// read the files back and check them against the modulus
    #[argh(switch)]
    pub check: bool,
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "widths")]
/// Print the derived datapath widths
pub struct Widths {}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Strategy {
    A,
    B,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "a" | "A" => Ok(Strategy::A),
            "b" | "B" => Ok(Strategy::B),
            other => Err(format!("unknown strategy {:?}, expected a or b", other)),
        }
    }
}

impl Args {
    pub fn modulus(&self) -> vdf_msu::Result<Modulus> {
        match (&self.modulus, self.small) {
            (Some(decimal), _) => Modulus::from_decimal(decimal),
            (None, true) => Ok(Modulus::test_128()),
            (None, false) => Ok(Modulus::vdf_1024()),
        }
    }
}

/// Limb shape covering the modulus with 16-bit words.
pub fn params(modulus: &Modulus) -> vdf_msu::Result<Params> {
    Params::new(Integer::div_ceil(&modulus.bits(), &16) as usize)
}

pub fn metzgen_params(modulus: &Modulus) -> vdf_msu::Result<MetzgenParams> {
    let params = if modulus.bits() <= 128 {
        MetzgenParams {
            mod_len: 128,
            log_radix: 17,
            log_num_symbols: 3,
            io_stages: 3,
        }
    } else {
        MetzgenParams::default()
    };
    params.validate(modulus)
}

pub fn parse_input(hex: &str) -> vdf_msu::Result<num_bigint::BigUint> {
    let hex = hex.trim_start_matches("0x");
    decode_entry(hex).map_err(|_| Error::Parse(format!("input {:?}", hex)))
}
