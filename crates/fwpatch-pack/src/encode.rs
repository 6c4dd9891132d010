//! Pack encoder

use fwpatch_checksum::ChecksumEngine;
use tracing::debug;

use crate::error::{PackError, PackResult};
use crate::{
    CHECKSUM_OFFSET, COUNT_OFFSET, DATA_OFFSET, ENTRY_SIZE, MAX_DATA_LEN, MAX_ENTRIES,
    TABLE_OFFSET, write_u32,
};

/// Check the fixed table and data budgets, returning the total data length.
fn check_capacity<R: AsRef<[u8]>>(resources: &[R]) -> PackResult<usize> {
    if resources.len() > MAX_ENTRIES {
        return Err(PackError::too_many_entries(resources.len()));
    }

    let total = resources
        .iter()
        .map(|resource| resource.as_ref().len() as u64)
        .fold(0u64, u64::saturating_add);
    if total > MAX_DATA_LEN {
        return Err(PackError::too_much_data(total));
    }

    usize::try_from(total).map_err(|_overflow| PackError::too_much_data(total))
}

/// Encode `resources` into a pack.
///
/// Resources get indices `1..=N` in input order and are stored back to back
/// at [`DATA_OFFSET`]. The whole-pack checksum is computed once the data
/// region is complete and written back into the header.
///
/// # Errors
///
/// Returns [`PackError::CapacityExceeded`] when there are more than
/// [`MAX_ENTRIES`] resources or more than [`MAX_DATA_LEN`] bytes of data.
/// Nothing is built in that case.
pub fn encode<E, R>(engine: &E, resources: &[R]) -> PackResult<Vec<u8>>
where
    E: ChecksumEngine + ?Sized,
    R: AsRef<[u8]>,
{
    let data_len = check_capacity(resources)?;
    let count = u32::try_from(resources.len())
        .map_err(|_overflow| PackError::too_many_entries(resources.len()))?;

    let mut buf = Vec::with_capacity(DATA_OFFSET.saturating_add(data_len));
    buf.resize(DATA_OFFSET, 0);
    write_u32(&mut buf, COUNT_OFFSET, count);

    let mut offset = 0usize;
    for (position, resource) in resources.iter().enumerate() {
        let data = resource.as_ref();
        let index = i32::try_from(position + 1)
            .map_err(|_overflow| PackError::too_many_entries(resources.len()))?;
        let stored_offset =
            i32::try_from(offset).map_err(|_overflow| PackError::too_much_data(offset as u64))?;
        let size = i32::try_from(data.len())
            .map_err(|_overflow| PackError::too_much_data(data.len() as u64))?;
        let crc = engine.checksum(data);

        let at = TABLE_OFFSET + position * ENTRY_SIZE;
        write_u32(&mut buf, at, u32::from_le_bytes(index.to_le_bytes()));
        write_u32(&mut buf, at + 4, u32::from_le_bytes(stored_offset.to_le_bytes()));
        write_u32(&mut buf, at + 8, u32::from_le_bytes(size.to_le_bytes()));
        write_u32(&mut buf, at + 12, crc);

        debug!(index, offset, size, crc = format_args!("{crc:08x}"), "Packed resource");

        buf.extend_from_slice(data);
        offset += data.len();
    }

    let whole = engine.checksum(buf.get(DATA_OFFSET..).unwrap_or_default());
    write_u32(&mut buf, CHECKSUM_OFFSET, whole);

    debug!(
        resources = count,
        bytes = buf.len(),
        whole_checksum = format_args!("{whole:08x}"),
        "Encoded resource pack"
    );

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_u32;
    use fwpatch_checksum::{Stm32Crc, checksum};

    #[test]
    fn test_empty_pack_is_header_only() -> PackResult<()> {
        let resources: [&[u8]; 0] = [];
        let buf = encode(&Stm32Crc, &resources)?;
        assert_eq!(buf.len(), DATA_OFFSET);
        assert_eq!(read_u32(&buf, COUNT_OFFSET), Some(0));
        assert_eq!(read_u32(&buf, CHECKSUM_OFFSET), Some(checksum(&[])));
        Ok(())
    }

    #[test]
    fn test_header_padding_is_zero() -> PackResult<()> {
        let buf = encode(&Stm32Crc, &[b"x".as_slice()])?;
        assert_eq!(buf.get(8..TABLE_OFFSET), Some(&[0u8; 4][..]));
        Ok(())
    }

    #[test]
    fn test_table_entry_layout() -> PackResult<()> {
        let buf = encode(&Stm32Crc, &[b"abcd".as_slice(), b"ef".as_slice()])?;
        let second = TABLE_OFFSET + ENTRY_SIZE;
        assert_eq!(read_u32(&buf, second), Some(2));
        assert_eq!(read_u32(&buf, second + 4), Some(4));
        assert_eq!(read_u32(&buf, second + 8), Some(2));
        assert_eq!(read_u32(&buf, second + 12), Some(checksum(b"ef")));
        assert_eq!(buf.get(DATA_OFFSET..), Some(&b"abcdef"[..]));
        Ok(())
    }

    #[test]
    fn test_uses_supplied_engine() -> PackResult<()> {
        let constant = |_: &[u8]| 0x1234_5678u32;
        let buf = encode(&constant, &[b"abc".as_slice()])?;
        assert_eq!(read_u32(&buf, CHECKSUM_OFFSET), Some(0x1234_5678));
        assert_eq!(read_u32(&buf, TABLE_OFFSET + 12), Some(0x1234_5678));
        Ok(())
    }

    #[test]
    fn test_too_many_entries_rejected() {
        let resources = vec![Vec::<u8>::new(); MAX_ENTRIES + 1];
        let result = encode(&Stm32Crc, &resources);
        assert!(matches!(
            result,
            Err(PackError::CapacityExceeded {
                what: "resources",
                actual: 513,
                limit: 512,
            })
        ));
    }

    #[test]
    fn test_full_table_accepted() -> PackResult<()> {
        let resources = vec![vec![0xA5u8]; MAX_ENTRIES];
        let buf = encode(&Stm32Crc, &resources)?;
        assert_eq!(buf.len(), DATA_OFFSET + MAX_ENTRIES);
        Ok(())
    }
}
