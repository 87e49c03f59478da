//! Canonical record byte buffer.
//!
//! Layout (big-endian):
//! - `u32` total length including this prefix
//! - `u16` writer table version
//! - `u16` entry count N
//! - N entries of `i16` field id + `u32` absolute offset, ascending by id
//! - fixed region: fixed-width payloads in ascending id order
//! - variable region: per variable-width field, length metadata + payload

use std::fmt;
use std::sync::Arc;

use crate::codec::{read_i16, read_u16, read_u32};
use crate::config::CodecConfig;
use crate::error::CodecError;

/// Size of the fixed buffer header in bytes.
pub const HEADER_LEN: usize = 8;

/// Size of one field index entry in bytes.
pub const ENTRY_LEN: usize = 6;

/// Immutable, validated record buffer.
///
/// Cloning shares the underlying bytes. Concurrent reads are safe since no
/// decode path mutates the buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct RecordBuffer {
    bytes: Arc<[u8]>,
    entries: usize,
}

impl RecordBuffer {
    /// Wraps bytes using the default size limit.
    pub fn wrap(bytes: Vec<u8>) -> Result<Self, CodecError> {
        Self::wrap_with_limit(bytes, CodecConfig::default().max_record_size)
    }

    /// Wraps bytes, validating the header and field index.
    ///
    /// # Arguments
    /// * `bytes` - Encoded record
    /// * `max_record_size` - Largest accepted buffer length
    ///
    /// # Returns
    /// `Err(CodecError)` if the length prefix, entry count, id ordering or
    /// any entry offset is inconsistent with the byte length.
    pub fn wrap_with_limit(bytes: Vec<u8>, max_record_size: usize) -> Result<Self, CodecError> {
        let len = bytes.len();
        if len > max_record_size {
            return Err(CodecError::LimitExceeded {
                what: "record size",
                requested: len,
                limit: max_record_size,
            });
        }
        if len < HEADER_LEN {
            return Err(CodecError::Corrupt(format!(
                "buffer of {} bytes is shorter than the header",
                len
            )));
        }

        let declared = read_u32(&bytes, 0)? as usize;
        if declared != len {
            return Err(CodecError::Corrupt(format!(
                "length prefix {} does not match buffer length {}",
                declared, len
            )));
        }

        let entries = usize::from(read_u16(&bytes, 6)?);
        let data_start = HEADER_LEN + entries * ENTRY_LEN;
        if data_start > len {
            return Err(CodecError::Corrupt(format!(
                "{} index entries do not fit buffer of {} bytes",
                entries, len
            )));
        }

        let mut previous: Option<i16> = None;
        for i in 0..entries {
            let at = HEADER_LEN + i * ENTRY_LEN;
            let id = read_i16(&bytes, at)?;
            let offset = read_u32(&bytes, at + 2)? as usize;
            if previous.is_some_and(|p| p >= id) {
                return Err(CodecError::Corrupt(format!(
                    "field ids not strictly ascending at entry {}",
                    i
                )));
            }
            if offset < data_start || offset >= len {
                return Err(CodecError::Corrupt(format!(
                    "field {} offset {} outside data region {}..{}",
                    id, offset, data_start, len
                )));
            }
            previous = Some(id);
        }

        Ok(Self {
            bytes: Arc::from(bytes),
            entries,
        })
    }

    /// Copies external bytes into a new buffer.
    pub fn copy_from(bytes: &[u8]) -> Result<Self, CodecError> {
        Self::wrap(bytes.to_vec())
    }

    /// Total length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Version of the table that wrote this buffer.
    pub fn version(&self) -> i16 {
        i16::from_be_bytes([self.bytes[4], self.bytes[5]])
    }

    /// Number of stored fields.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Start of the fixed region.
    pub fn data_start(&self) -> usize {
        HEADER_LEN + self.entries * ENTRY_LEN
    }

    /// Field id and absolute offset of the `index`-th entry.
    pub(crate) fn entry(&self, index: usize) -> (i16, usize) {
        let at = HEADER_LEN + index * ENTRY_LEN;
        let b = &self.bytes;
        let id = i16::from_be_bytes([b[at], b[at + 1]]);
        let offset = u32::from_be_bytes([b[at + 2], b[at + 3], b[at + 4], b[at + 5]]);
        (id, offset as usize)
    }

    /// Stored field ids in ascending order.
    pub fn field_ids(&self) -> impl Iterator<Item = i16> + '_ {
        (0..self.entries).map(|i| self.entry(i).0)
    }

    /// Absolute offset of a field's stored bytes, found by binary search over
    /// the index without decoding any field.
    pub fn locate(&self, field_id: i16) -> Option<usize> {
        let (mut lo, mut hi) = (0usize, self.entries);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (id, offset) = self.entry(mid);
            match id.cmp(&field_id) {
                std::cmp::Ordering::Equal => return Some(offset),
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
            }
        }
        None
    }

    pub fn contains(&self, field_id: i16) -> bool {
        self.locate(field_id).is_some()
    }
}

impl fmt::Debug for RecordBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordBuffer")
            .field("len", &self.len())
            .field("version", &self.version())
            .field("fields", &self.field_ids().collect::<Vec<_>>())
            .finish()
    }
}
