//! Bounds-checked big-endian reads and metadata helpers.

use crate::error::CodecError;

/// Returns `buf[offset..offset + length]` or an out-of-bounds error.
pub(crate) fn slice_at(buf: &[u8], offset: usize, length: usize) -> Result<&[u8], CodecError> {
    let end = offset.checked_add(length).ok_or(CodecError::OutOfBounds {
        offset,
        length,
        buffer_len: buf.len(),
    })?;
    buf.get(offset..end).ok_or(CodecError::OutOfBounds {
        offset,
        length,
        buffer_len: buf.len(),
    })
}

pub(crate) fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N], CodecError> {
    let mut out = [0u8; N];
    out.copy_from_slice(slice_at(buf, offset, N)?);
    Ok(out)
}

pub(crate) fn read_u16(buf: &[u8], offset: usize) -> Result<u16, CodecError> {
    read_array::<2>(buf, offset).map(u16::from_be_bytes)
}

pub(crate) fn read_i16(buf: &[u8], offset: usize) -> Result<i16, CodecError> {
    read_array::<2>(buf, offset).map(i16::from_be_bytes)
}

pub(crate) fn read_u32(buf: &[u8], offset: usize) -> Result<u32, CodecError> {
    read_array::<4>(buf, offset).map(u32::from_be_bytes)
}

/// Reads a payload length stored in a metadata slot of `width` bytes.
pub(crate) fn read_metadata(buf: &[u8], offset: usize, width: usize) -> Result<usize, CodecError> {
    match width {
        2 => read_u16(buf, offset).map(usize::from),
        4 => read_u32(buf, offset).map(|v| v as usize),
        other => Err(CodecError::Corrupt(format!(
            "unsupported metadata width {}",
            other
        ))),
    }
}

/// Appends a payload length as a metadata slot of `width` bytes.
pub(crate) fn write_metadata(
    out: &mut Vec<u8>,
    width: usize,
    length: usize,
    type_name: &str,
) -> Result<(), CodecError> {
    let max = match width {
        2 => usize::from(u16::MAX),
        4 => u32::MAX as usize,
        other => {
            return Err(CodecError::Corrupt(format!(
                "unsupported metadata width {}",
                other
            )))
        }
    };
    if length > max {
        return Err(CodecError::LengthOverflow {
            type_name: type_name.to_string(),
            length,
            max,
        });
    }
    if width == 2 {
        out.extend_from_slice(&(length as u16).to_be_bytes());
    } else {
        out.extend_from_slice(&(length as u32).to_be_bytes());
    }
    Ok(())
}
