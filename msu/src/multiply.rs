//! Squaring multiplier array.
//!
//! Only the upper triangle `A[i]*A[j], i <= j` is multiplied, `(n^2+n)/2` products
//! instead of `n^2`. Off-diagonal products are doubled in place of being entered
//! twice. Each product is split at `WORD_LEN`: the low half lands on column `i+j`,
//! the high half on column `i+j+1`.

use crate::{compressor::compressor_tree_3_to_2, normalize::normalize, Params};

/// Partial products, one list of terms per column of the `2N`-limb result.
///
/// This is the non-zero part of the `2N x 2N` partial-product grid: row order within
/// a column is generation order.
pub fn partial_products(a: &[u64], params: &Params) -> Vec<Vec<u64>> {
    let n = a.len();
    let word_len = params.word_len;
    let word_mask = params.word_mask();
    let mut grid = vec![Vec::with_capacity(n + 1); 2 * n];
    for i in 0..n {
        for j in i..n {
            let mut product = a[i] * a[j];
            if i != j {
                product <<= 1;
            }
            grid[i + j].push(product & word_mask);
            grid[i + j + 1].push(product >> word_len);
        }
    }
    grid
}

/// Multiply stage: compress every column to a `(carry, sum)` pair.
pub fn multiply_compress(a: &[u64], params: &Params) -> Vec<(u64, u64)> {
    partial_products(a, params)
        .iter()
        .map(|column| compressor_tree_3_to_2(column.as_slice()))
        .collect()
}

/// Carry-propagate stage: column pairs to `2N` product limbs.
pub fn multiply_propagate(columns: &[(u64, u64)], params: &Params) -> Vec<u64> {
    normalize(columns, params.word_len, params.bit_len)
}

/// Both stages back to back: the unreduced square of `a` in redundant form.
pub fn square(a: &[u64], params: &Params) -> Vec<u64> {
    multiply_propagate(&multiply_compress(a, params), params)
}

/// Limb-pair multiplications needed for an `n`-limb square.
pub const fn multiplier_count(n: usize) -> usize {
    (n * n + n) / 2
}
