//! Versioned binary codec for every structure PinVault persists.
//!
//! Each structure starts with a single version byte followed by its
//! fields in a fixed order.  A field is one of:
//!
//! - **fixed-size**: a block whose length is a compile-time constant
//!   (e.g. the two PIN grids),
//! - **length-prefixed**: a big-endian `u16` length followed by that many
//!   bytes,
//! - **trailing**: all remaining bytes.  Only legal as the final field.
//!
//! ```text
//! [version: 1 byte][field 1][field 2]...[trailing field]
//! ```
//!
//! Decoding a structure whose version byte is newer than the reader
//! understands yields `UnsupportedVersion`, naming the structure that
//! carried the byte, even when it is nested inside another one.
//! `load_from_bytes` turns that case into `Ok(None)`.  Every other
//! malformation (short input, out-of-range values, invalid UTF-8) is a
//! `Decode` error.

pub mod grid;
pub mod strings;

use crate::errors::{PinVaultError, Result};

/// A structure with a versioned binary representation.
pub trait Serializable: Sized {
    /// Human-readable name used in logs and errors.
    const NAME: &'static str;

    /// Format version written by this release (and the highest one it reads).
    const VERSION: u8;

    /// Encode `self` into its binary form, version byte first.
    fn to_bytes(&self) -> Result<Vec<u8>>;

    /// Decode a structure from `bytes`.
    ///
    /// A version newer than the reader supports, here or in a nested
    /// structure, is an `UnsupportedVersion` error for the innermost one.
    fn decode(bytes: &[u8]) -> Result<Self>;

    /// Decode, returning `Ok(None)` when any stored version is too new.
    fn load_from_bytes(bytes: &[u8]) -> Result<Option<Self>> {
        match Self::decode(bytes) {
            Ok(value) => Ok(Some(value)),
            Err(PinVaultError::UnsupportedVersion { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Read the leading version byte of `T`.
///
/// Fails with `UnsupportedVersion` if the version is newer than `T::VERSION`.
pub fn read_version<T: Serializable>(reader: &mut ByteReader<'_>) -> Result<u8> {
    let version = reader.read_u8()?;
    tracing::debug!(structure = T::NAME, version, "found structure");
    if version > T::VERSION {
        tracing::debug!(
            structure = T::NAME,
            version,
            supported = T::VERSION,
            "structure version not supported"
        );
        return Err(PinVaultError::UnsupportedVersion {
            structure: T::NAME,
            version,
        });
    }
    Ok(version)
}

/// Append a big-endian `u16` length followed by `bytes`.
pub fn write_length_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    let len = u16::try_from(bytes.len()).map_err(|_| {
        PinVaultError::Decode(format!(
            "field of {} bytes exceeds the 65535-byte length prefix",
            bytes.len()
        ))
    })?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Cursor over an encoded buffer.
///
/// Every read is bounds-checked: asking for more bytes than remain is a
/// `Decode` error, never a short read or zero fill.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_exact(1)?[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        let bytes = self.read_exact(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Borrow the next `len` bytes.
    pub fn read_exact(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(PinVaultError::Decode(format!(
                "truncated input: needed {len} bytes at offset {}, only {} left",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Read a `u16` length prefix and then that many bytes.
    pub fn read_length_prefixed(&mut self) -> Result<&'a [u8]> {
        let len = usize::from(self.read_u16_be()?);
        self.read_exact(len)
    }

    /// Consume everything left (the trailing field).
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }

    /// Read the trailing field as UTF-8.
    pub fn read_remaining_str(&mut self) -> Result<String> {
        decode_utf8(self.read_remaining())
    }

    /// Fail if any bytes are left over.
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(PinVaultError::Decode(format!("{n} unexpected trailing bytes"))),
        }
    }
}

pub(crate) fn decode_utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| PinVaultError::Decode(format!("invalid UTF-8 string: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_reads_fields_in_order() {
        let data = [7u8, 0x01, 0x02, b'h', b'i'];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u8().unwrap(), 7);
        assert_eq!(reader.read_u16_be().unwrap(), 0x0102);
        assert_eq!(reader.read_remaining_str().unwrap(), "hi");
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn reader_rejects_truncated_fixed_field() {
        let data = [1u8, 2, 3];
        let mut reader = ByteReader::new(&data);
        let err = reader.read_exact(4).unwrap_err();
        assert!(matches!(err, PinVaultError::Decode(_)));
        // A failed read does not consume anything.
        assert_eq!(reader.remaining(), 3);
    }

    #[test]
    fn length_prefixed_field_roundtrip() {
        let mut buf = Vec::new();
        write_length_prefixed(&mut buf, b"abc").unwrap();
        assert_eq!(buf, [0, 3, b'a', b'b', b'c']);

        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.read_length_prefixed().unwrap(), b"abc");
    }

    #[test]
    fn length_prefix_larger_than_input_fails() {
        let data = [0u8, 10, b'x'];
        let mut reader = ByteReader::new(&data);
        assert!(reader.read_length_prefixed().is_err());
    }

    #[test]
    fn finish_reports_trailing_bytes() {
        let data = [1u8, 2];
        let mut reader = ByteReader::new(&data);
        reader.read_u8().unwrap();
        assert!(reader.finish().is_err());
    }

    #[test]
    fn invalid_utf8_trailing_field_fails() {
        let data = [0xFFu8, 0xFE];
        let mut reader = ByteReader::new(&data);
        assert!(reader.read_remaining_str().is_err());
    }
}
