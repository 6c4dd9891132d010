//! Property-based tests for the STM32 CRC engine.

use fwpatch_checksum::{ChecksumEngine, Stm32Crc, WORD_LEN, checksum};
use proptest::prelude::*;

fn aligned_prefix() -> impl Strategy<Value = Vec<u8>> {
    (0usize..16).prop_flat_map(|words| prop::collection::vec(any::<u8>(), words * WORD_LEN))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_checksum_is_deterministic(data in prop::collection::vec(any::<u8>(), 0..512)) {
        prop_assert_eq!(checksum(&data), checksum(&data));
        prop_assert_eq!(Stm32Crc.checksum(&data), checksum(&data));
    }

    /// A partial trailing word is processed exactly like the full word made
    /// of the tail bytes reversed and zero-padded.
    #[test]
    fn prop_tail_matches_padded_word(
        prefix in aligned_prefix(),
        tail in prop::collection::vec(any::<u8>(), 1..WORD_LEN),
    ) {
        let mut short = prefix.clone();
        short.extend_from_slice(&tail);

        let mut padded = prefix;
        padded.extend(tail.iter().rev());
        padded.resize(padded.len() + WORD_LEN - tail.len(), 0);

        prop_assert_eq!(checksum(&short), checksum(&padded));
    }

    #[test]
    fn prop_single_bit_flip_changes_checksum(
        data in prop::collection::vec(any::<u8>(), 1..256),
        pos in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let idx = pos.index(data.len());
        let mut flipped = data.clone();
        if let Some(byte) = flipped.get_mut(idx) {
            *byte ^= 1 << bit;
        }
        prop_assert_ne!(checksum(&data), checksum(&flipped));
    }
}
