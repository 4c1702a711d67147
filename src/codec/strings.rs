//! Serializer for sets of strings.
//!
//! Layout: `[count: u16 BE]` then `count` length-prefixed UTF-8 entries,
//! written in sorted order so equal sets always encode identically.

use std::collections::BTreeSet;

use super::{decode_utf8, write_length_prefixed, ByteReader};
use crate::errors::{PinVaultError, Result};

/// Append the encoding of `set` to `buf`.
pub fn write_string_set(buf: &mut Vec<u8>, set: &BTreeSet<String>) -> Result<()> {
    let count = u16::try_from(set.len())
        .map_err(|_| PinVaultError::Decode(format!("set of {} strings is too large", set.len())))?;
    buf.extend_from_slice(&count.to_be_bytes());
    for entry in set {
        write_length_prefixed(buf, entry.as_bytes())?;
    }
    Ok(())
}

/// Read a string set from `reader`.
///
/// Duplicate entries are a decode error; an encoder never produces them.
pub fn read_string_set(reader: &mut ByteReader<'_>) -> Result<BTreeSet<String>> {
    let count = reader.read_u16_be()?;
    let mut set = BTreeSet::new();
    for _ in 0..count {
        let entry = decode_utf8(reader.read_length_prefixed()?)?;
        if !set.insert(entry) {
            return Err(PinVaultError::Decode("duplicate entry in string set".into()));
        }
    }
    Ok(set)
}
