//! Checksum used by every integrity field in a firmware bundle.
//!
//! The device validates its resource pack and firmware with the STM32 CRC
//! peripheral, which is *not* the CRC-32 used by zip or Ethernet. The
//! peripheral works on 32-bit words:
//!
//! | Parameter  | Value        |
//! |------------|--------------|
//! | Polynomial | `0x04C11DB7` |
//! | Initial    | `0xFFFFFFFF` |
//! | Reflected  | no           |
//! | Final XOR  | none         |
//!
//! Each little-endian word is fed most-significant byte first. A trailing
//! partial word of `n` bytes is fed as `4 - n` zero bytes followed by the
//! remaining bytes in order, which is how the device-side tooling pads it.
//!
//! Substituting a generic CRC-32 produces values the bootloader rejects, so
//! the parameters above are a fixed contract and are tested against known
//! vectors rather than re-derived.
//!
//! Callers pass a [`ChecksumEngine`] explicitly to the pack codec and the
//! firmware patch engine; [`Stm32Crc`] is the production engine.

#![deny(static_mut_refs)]
#![warn(missing_docs, rust_2018_idioms)]

use crc::{CRC_32_MPEG_2, Crc};

/// Generator polynomial of the STM32 CRC unit.
pub const POLYNOMIAL: u32 = CRC_32_MPEG_2.poly;

/// Register value before the first word is processed.
pub const INITIAL: u32 = CRC_32_MPEG_2.init;

/// Width of one peripheral input word in bytes.
pub const WORD_LEN: usize = 4;

/// CRC-32/MPEG-2 is the peripheral's register behaviour on a byte stream;
/// word order and tail padding are applied in [`checksum`].
const STM32: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

const ZERO_WORD: [u8; WORD_LEN] = [0; WORD_LEN];

/// Compute the device checksum of `data`.
pub fn checksum(data: &[u8]) -> u32 {
    let mut digest = STM32.digest();
    let mut words = data.chunks_exact(WORD_LEN);

    for word in &mut words {
        if let &[b0, b1, b2, b3] = word {
            digest.update(&[b3, b2, b1, b0]);
        }
    }

    let tail = words.remainder();
    if !tail.is_empty() {
        digest.update(ZERO_WORD.get(tail.len()..).unwrap_or_default());
        digest.update(tail);
    }

    digest.finalize()
}

/// A checksum implementation that integrity fields are computed with.
///
/// Implemented by [`Stm32Crc`] and by any `Fn(&[u8]) -> u32`, so tests can
/// substitute a recording or constant engine.
pub trait ChecksumEngine {
    /// Checksum of `data`.
    fn checksum(&self, data: &[u8]) -> u32;

    /// Checksum of `data` as it is stored on disk (little-endian).
    fn checksum_le_bytes(&self, data: &[u8]) -> [u8; 4] {
        self.checksum(data).to_le_bytes()
    }
}

/// The STM32 CRC unit engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stm32Crc;

impl ChecksumEngine for Stm32Crc {
    fn checksum(&self, data: &[u8]) -> u32 {
        checksum(data)
    }
}

impl<F> ChecksumEngine for F
where
    F: Fn(&[u8]) -> u32,
{
    fn checksum(&self, data: &[u8]) -> u32 {
        self(data)
    }
}
