//! Minimal TLV parsing for smartcard replies.
//!
//! Handles single-byte tags with short and two-step long lengths, which
//! covers the management config pages and the OATH select response.

use crate::error::{Error, Result};

/// Parses a buffer of concatenated TLV entries.
pub(crate) fn parse(mut data: &[u8]) -> Result<Vec<(u8, Vec<u8>)>> {
    let mut entries = Vec::new();
    while !data.is_empty() {
        if data.len() < 2 {
            return Err(Error::InvalidResponse("TLV entry truncated".into()));
        }
        let tag = data[0];
        let (length, header) = match data[1] {
            0x81 => {
                if data.len() < 3 {
                    return Err(Error::InvalidResponse("TLV length truncated".into()));
                }
                (data[2] as usize, 3)
            }
            0x82 => {
                if data.len() < 4 {
                    return Err(Error::InvalidResponse("TLV length truncated".into()));
                }
                (u16::from_be_bytes([data[2], data[3]]) as usize, 4)
            }
            len if len < 0x80 => (len as usize, 2),
            len => {
                return Err(Error::InvalidResponse(format!(
                    "unsupported TLV length form 0x{len:02x}"
                )));
            }
        };
        if data.len() < header + length {
            return Err(Error::InvalidResponse(format!(
                "TLV value for tag 0x{tag:02x} truncated"
            )));
        }
        entries.push((tag, data[header..header + length].to_vec()));
        data = &data[header + length..];
    }
    Ok(entries)
}

/// First value for `tag`, if present.
pub(crate) fn get(entries: &[(u8, Vec<u8>)], tag: u8) -> Option<&[u8]> {
    entries
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, value)| value.as_slice())
}
