use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{what} needs {needed} bits, only {available} available")]
    Width {
        what: &'static str,
        needed: u64,
        available: u64,
    },
    #[error("invalid modulus: {0}")]
    Modulus(&'static str),
    #[error("invalid parameters: {0}")]
    Params(&'static str),
    #[error("input outside the operating domain of the squarer")]
    InputRange,
    #[error("lookup table {file:?} disagrees with the modulus at line {line}")]
    LutMismatch { file: PathBuf, line: usize },
    #[error("could not parse {0}")]
    Parse(String),
    #[error("watchdog: no result after {cycles} cycles")]
    Watchdog { cycles: u64 },
    #[error(transparent)]
    Fpga(#[from] fpga::Error),
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;
