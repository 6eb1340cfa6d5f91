//! Hash-lock helpers.
//!
//! A conditional transfer stores a 32-byte condition in `custom_2 ‖ custom_3`;
//! the commit that accepts or rejects it carries the pre-image in the same two
//! slots. The condition is the BLAKE3 hash of the pre-image.

/// Condition (hash lock) for a pre-image.
pub fn condition_for(preimage: &[u8; 32]) -> [u8; 32] {
    *blake3::hash(preimage).as_bytes()
}

/// Pack 32 bytes into two custom slots, little-endian halves.
pub fn split_custom(bytes: &[u8; 32]) -> (u128, u128) {
    let mut lo = [0u8; 16];
    let mut hi = [0u8; 16];
    lo.copy_from_slice(&bytes[..16]);
    hi.copy_from_slice(&bytes[16..]);
    (u128::from_le_bytes(lo), u128::from_le_bytes(hi))
}

/// Inverse of [`split_custom`].
pub fn join_custom(custom_2: u128, custom_3: u128) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[..16].copy_from_slice(&custom_2.to_le_bytes());
    out[16..].copy_from_slice(&custom_3.to_le_bytes());
    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn condition_depends_on_preimage() {
        assert_ne!(condition_for(&[1; 32]), condition_for(&[2; 32]));
        assert_eq!(condition_for(&[1; 32]), condition_for(&[1; 32]));
    }

    proptest! {
        #[test]
        fn split_then_join_restores_the_bytes(bytes in any::<[u8; 32]>()) {
            let (custom_2, custom_3) = split_custom(&bytes);
            prop_assert_eq!(join_custom(custom_2, custom_3), bytes);
        }

        #[test]
        fn join_then_split_restores_the_slots(
            custom_2 in any::<u128>(),
            custom_3 in any::<u128>(),
        ) {
            let bytes = join_custom(custom_2, custom_3);
            prop_assert_eq!(split_custom(&bytes), (custom_2, custom_3));
        }
    }
}
