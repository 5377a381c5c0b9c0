//! Chained references: tagged 256-bit placeholders the relayer resolves at
//! execution time from the output of an earlier call in the same multicall.
//!
//! A temporary reference is cleared after one read; a read-only reference
//! survives multiple reads. Both flavors share the top-16-bit tag range, a
//! range no realistic token amount reaches.

use alloy_primitives::U256;

/// `0xba10` shifted into the top 16 bits. Temporary: deleted after a read.
const TEMP_PREFIX: U256 = U256::from_limbs([0, 0, 0, 0xba10_0000_0000_0000]);
/// `0xba11` shifted into the top 16 bits. Read-only: survives reads.
const READONLY_PREFIX: U256 = U256::from_limbs([0, 0, 0, 0xba11_0000_0000_0000]);
/// Tag-range mask; matches both flavors.
const REFERENCE_MASK: U256 = U256::from_limbs([0, 0, 0, 0xfff0_0000_0000_0000]);

/// Slot written by a call: the relayer stores the output at `index` of the
/// call's result array under `key` (a full tagged reference).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputReference {
    pub index: U256,
    pub key: U256,
}

/// Builds the tagged reference for `key`. Deterministic: equal (key, flavor)
/// pairs always yield bit-identical references.
pub fn chained_reference(key: U256, temporary: bool) -> U256 {
    let prefix = if temporary { TEMP_PREFIX } else { READONLY_PREFIX };
    prefix | key
}

/// Recovers the key from a tagged reference, either flavor.
pub fn reference_key(reference: U256) -> U256 {
    reference & !REFERENCE_MASK
}

/// True if `amount` is not actually an amount but a chained reference.
pub fn is_chained_reference(amount: U256) -> bool {
    amount & REFERENCE_MASK == TEMP_PREFIX
}

pub fn output_reference(key: u64, index: usize) -> OutputReference {
    OutputReference {
        index: U256::from(index),
        key: chained_reference(U256::from(key), true),
    }
}
