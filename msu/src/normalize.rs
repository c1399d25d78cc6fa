//! Final carry-propagate stage: `(carry, sum)` columns back to limbs.

/// Each column adds its pair once, keeps the low `word_len` bits and passes the rest
/// one limb up. Carries move by one limb only, so limbs keep some redundancy; the
/// carry out of the top limb is dropped and the top limb is cut to `bit_len` bits.
pub fn normalize(columns: &[(u64, u64)], word_len: u32, bit_len: u32) -> Vec<u64> {
    let word_mask = (1u64 << word_len) - 1;
    let limb_mask = (1u64 << bit_len) - 1;
    let mut carry = 0u64;
    let mut limbs: Vec<u64> = columns
        .iter()
        .map(|&(c, s)| {
            let sum = c + s;
            let limb = (sum & word_mask) + carry;
            carry = sum >> word_len;
            limb
        })
        .collect();
    if let Some(top) = limbs.last_mut() {
        *top &= limb_mask;
    }
    limbs
}
