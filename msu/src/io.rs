//! Load and store lookup-table contents as hex `.dat` files.
//!
//! One entry per line, lowercase hex, zero-padded to a fixed number of digits: the
//! format `$readmemh` expects.

use std::{
    fs::File,
    io::{BufRead as _, BufReader, BufWriter, Write as _},
    path::Path,
};

use num_bigint::BigUint;

use crate::{Error, Result};

/// Hex digits of one entry, zero-padded to `digits`.
pub fn encode_entry(entry: &BigUint, digits: usize) -> String {
    let hex = hex::encode(entry.to_bytes_be());
    let hex = hex.trim_start_matches('0');
    format!("{:0>width$}", hex, width = digits)
}

pub fn decode_entry(line: &str) -> Result<BigUint> {
    let line = line.trim();
    let bytes = if line.len() % 2 == 1 {
        hex::decode(format!("0{}", line))?
    } else {
        hex::decode(line)?
    };
    Ok(BigUint::from_bytes_be(&bytes))
}

pub fn store_dat<'a>(
    path: &Path,
    entries: impl IntoIterator<Item = &'a BigUint>,
    digits: usize,
) -> Result<usize> {
    let mut file = BufWriter::new(File::create(path)?);
    let mut count = 0;
    for entry in entries {
        writeln!(file, "{}", encode_entry(entry, digits))?;
        count += 1;
    }
    file.flush()?;
    tracing::debug!(entries = count, path = %path.display(), "store");
    Ok(count)
}

pub fn load_dat(path: &Path) -> Result<Vec<BigUint>> {
    let file = BufReader::new(File::open(path)?);
    let mut entries = vec![];
    for line in file.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = decode_entry(&line)
            .map_err(|_| Error::Parse(format!("{}:{}", path.display(), entries.len() + 1)))?;
        entries.push(entry);
    }
    tracing::debug!(entries = entries.len(), path = %path.display(), "load");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_zero_padded() {
        assert_eq!(encode_entry(&BigUint::from(0u8), 8), "00000000");
        assert_eq!(encode_entry(&BigUint::from(0xabcu32), 8), "00000abc");
        assert_eq!(decode_entry("00000abc").unwrap(), BigUint::from(0xabcu32));
        assert_eq!(decode_entry("abc").unwrap(), BigUint::from(0xabcu32));
        assert!(decode_entry("xyz").is_err());
    }

    #[test]
    fn store_then_load() {
        let dir = std::env::temp_dir().join(format!("vdf-msu-io-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("entries.dat");
        let entries: Vec<BigUint> = (0..10u32).map(|i| BigUint::from(i) << (7 * i)).collect();
        assert_eq!(store_dat(&path, &entries, 32).unwrap(), 10);
        assert_eq!(load_dat(&path).unwrap(), entries);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
