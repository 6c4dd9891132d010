//! Pack decoder and verifier

use fwpatch_checksum::ChecksumEngine;
use tracing::{debug, warn};

use crate::error::{PackError, PackResult};
use crate::pack::{ResourceEntry, ResourcePack};
use crate::report::{ChecksumCheck, EntryCheck, VerificationReport};
use crate::{
    CHECKSUM_OFFSET, COUNT_OFFSET, DATA_OFFSET, ENTRY_SIZE, HEADER_LEN, MAX_ENTRIES, TABLE_OFFSET,
    read_i32, read_u32,
};

/// A decoded pack together with its verification report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPack {
    /// Table entries and resource data
    pub pack: ResourcePack,
    /// Checksum comparisons for every entry and the data region
    pub report: VerificationReport,
}

fn truncated(actual: usize, required: usize) -> PackError {
    PackError::Truncated { actual, required }
}

/// The whole-pack checksum exactly as stored in the header.
///
/// This is the 4-byte value the firmware embeds a copy of.
///
/// # Errors
///
/// Returns [`PackError::Truncated`] when `buf` has no complete header.
pub fn header_checksum_bytes(buf: &[u8]) -> PackResult<[u8; 4]> {
    read_u32(buf, CHECKSUM_OFFSET)
        .map(u32::to_le_bytes)
        .ok_or_else(|| truncated(buf.len(), HEADER_LEN))
}

/// Decode and verify a pack.
///
/// Every stored checksum is recomputed with `engine`. Mismatches are logged
/// and recorded in the returned report; decoding always continues past them.
///
/// A pack with no resources may end right after the count and checksum
/// fields; its data region is then empty.
///
/// # Errors
///
/// - [`PackError::Truncated`] if `buf` is shorter than the header, or holds
///   entries but stops before the data region
/// - [`PackError::CapacityExceeded`] if the header claims more entries than
///   the table holds
/// - [`PackError::EntryOutOfBounds`] if an entry's offset or size is negative
///   or reaches past the end of `buf`
pub fn decode<E>(engine: &E, buf: &[u8]) -> PackResult<DecodedPack>
where
    E: ChecksumEngine + ?Sized,
{
    let count = read_u32(buf, COUNT_OFFSET).ok_or_else(|| truncated(buf.len(), HEADER_LEN))?;
    let stored_whole =
        read_u32(buf, CHECKSUM_OFFSET).ok_or_else(|| truncated(buf.len(), HEADER_LEN))?;
    let data = match buf.get(DATA_OFFSET..) {
        Some(data) => data,
        None if count == 0 => &[],
        None => return Err(truncated(buf.len(), DATA_OFFSET)),
    };

    let entry_count = usize::try_from(count).unwrap_or(usize::MAX);
    if entry_count > MAX_ENTRIES {
        return Err(PackError::too_many_entries(entry_count));
    }

    let whole = ChecksumCheck {
        stored: stored_whole,
        computed: engine.checksum(data),
    };
    if whole.is_match() {
        debug!(checksum = format_args!("{stored_whole:08x}"), "Pack data checksum matches");
    } else {
        warn!(
            stored = format_args!("{:08x}", whole.stored),
            computed = format_args!("{:08x}", whole.computed),
            "Pack data checksum mismatch"
        );
    }

    let mut entries = Vec::with_capacity(entry_count);
    let mut checks = Vec::with_capacity(entry_count);

    for position in 0..entry_count {
        let at = TABLE_OFFSET + position * ENTRY_SIZE;
        let (Some(index), Some(offset), Some(size), Some(stored)) = (
            read_i32(buf, at),
            read_i32(buf, at + 4),
            read_i32(buf, at + 8),
            read_u32(buf, at + 12),
        ) else {
            return Err(truncated(buf.len(), DATA_OFFSET));
        };

        let out_of_bounds = || PackError::EntryOutOfBounds {
            position,
            index,
            offset,
            size,
            data_len: data.len(),
        };
        let start = usize::try_from(offset).map_err(|_negative| out_of_bounds())?;
        let len = usize::try_from(size).map_err(|_negative| out_of_bounds())?;
        let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
        let bytes = data.get(start..end).ok_or_else(out_of_bounds)?;

        let checksum = ChecksumCheck {
            stored,
            computed: engine.checksum(bytes),
        };
        if checksum.is_match() {
            debug!(position, index, offset, size, "Resource checksum matches");
        } else {
            warn!(
                position,
                index,
                offset,
                size,
                stored = format_args!("{:08x}", checksum.stored),
                computed = format_args!("{:08x}", checksum.computed),
                "Resource checksum mismatch"
            );
        }

        checks.push(EntryCheck {
            position,
            index,
            offset,
            size,
            checksum,
        });
        entries.push(ResourceEntry::new(index, offset, size, stored, bytes.to_vec()));
    }

    let report = VerificationReport {
        resource_count: count,
        whole,
        entries: checks,
        file_checksum: engine.checksum(buf),
    };

    Ok(DecodedPack {
        pack: ResourcePack::new(stored_whole, entries),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode, write_u32};
    use fwpatch_checksum::Stm32Crc;
    use tracing_test::traced_test;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_short_buffer_is_truncated() {
        let mut buf = [0u8; 16];
        write_u32(&mut buf, COUNT_OFFSET, 1);
        let result = decode(&Stm32Crc, &buf);
        assert!(matches!(
            result,
            Err(PackError::Truncated {
                actual: 16,
                required: DATA_OFFSET
            })
        ));
    }

    #[test]
    fn test_partial_header_is_truncated() {
        assert!(matches!(
            decode(&Stm32Crc, &[0u8; 6]),
            Err(PackError::Truncated {
                actual: 6,
                required: HEADER_LEN
            })
        ));
    }

    #[test]
    fn test_header_only_empty_pack_decodes() -> TestResult {
        let mut buf = [0u8; HEADER_LEN];
        write_u32(&mut buf, CHECKSUM_OFFSET, Stm32Crc.checksum(&[]));

        let decoded = decode(&Stm32Crc, &buf)?;
        assert_eq!(decoded.pack.resource_count(), 0);
        assert_eq!(decoded.report.resource_count, 0);
        assert!(decoded.report.is_clean());
        Ok(())
    }

    #[test]
    fn test_count_above_capacity_rejected() -> TestResult {
        let mut buf = encode(&Stm32Crc, &[b"a".as_slice()])?;
        write_u32(&mut buf, COUNT_OFFSET, 600);
        assert!(matches!(
            decode(&Stm32Crc, &buf),
            Err(PackError::CapacityExceeded { actual: 600, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_entry_past_end_rejected() -> TestResult {
        let mut buf = encode(&Stm32Crc, &[b"abc".as_slice()])?;
        write_u32(&mut buf, TABLE_OFFSET + 8, 4);
        assert!(matches!(
            decode(&Stm32Crc, &buf),
            Err(PackError::EntryOutOfBounds {
                position: 0,
                size: 4,
                data_len: 3,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_negative_offset_rejected() -> TestResult {
        let mut buf = encode(&Stm32Crc, &[b"abc".as_slice()])?;
        write_u32(&mut buf, TABLE_OFFSET + 4, u32::MAX);
        assert!(matches!(
            decode(&Stm32Crc, &buf),
            Err(PackError::EntryOutOfBounds { offset: -1, .. })
        ));
        Ok(())
    }

    #[test]
    #[traced_test]
    fn test_mismatch_is_logged_not_fatal() -> TestResult {
        let mut buf = encode(&Stm32Crc, &[b"abc".as_slice(), b"def".as_slice()])?;
        if let Some(byte) = buf.get_mut(DATA_OFFSET + 4) {
            *byte ^= 0xFF;
        }

        let decoded = decode(&Stm32Crc, &buf)?;
        assert_eq!(decoded.pack.resource_count(), 2);
        assert_eq!(decoded.report.mismatch_count(), 2);
        assert!(logs_contain("Resource checksum mismatch"));
        assert!(logs_contain("Pack data checksum mismatch"));
        Ok(())
    }

    #[test]
    fn test_header_checksum_bytes() -> TestResult {
        let buf = encode(&Stm32Crc, &[b"abc".as_slice()])?;
        let stored = header_checksum_bytes(&buf)?;
        assert_eq!(buf.get(CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4), Some(&stored[..]));
        assert!(matches!(
            header_checksum_bytes(&[0u8; 6]),
            Err(PackError::Truncated { actual: 6, .. })
        ));
        Ok(())
    }
}
