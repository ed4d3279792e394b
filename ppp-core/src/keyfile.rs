// File:    keyfile.rs
// Author:  apezoo
// Date:    2025-08-05
//
// Description: Encoding and decoding of the versioned radix-64 key-file records.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Key-file records.
//!
//! A record is a 20-byte header followed by a radix-64 number and a NUL:
//!
//! ```text
//!  PPP 0002 0001 0003 8gQuzGxfw/PW...\0
//! ^   ^    ^    ^    ^
//! 0   5    10   15   20
//! ```
//!
//! Bytes 5..9 hold the algorithm version, 10..14 the data format and
//! 15..19 the flags in hex. Older files may omit the flags (value at byte
//! 15) or the whole header (the file is just the number, version 1).

use std::fmt;
use std::path::Path;

use ppp_mpi::Mpi;
use zeroize::Zeroizing;

use crate::error::{PppError, PppResult};
use crate::sequence::PppFlags;

/// Length of a full header including its trailing space.
pub const HEADER_LEN: usize = 20;

/// Data format written by this version: radix-64 text.
pub const DATA_FORMAT: u32 = 1;

/// Radix the value is stored in.
pub const VALUE_RADIX: u32 = 64;

/// One decoded key-file record. `Debug` leaves out the value, which is
/// the secret key for `private_key`.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyRecord {
    /// Algorithm version the file was written for.
    pub version: u32,
    /// Data format; 0 for unversioned files.
    pub format: u32,
    /// Flags, or `None` for files written before flags existed.
    pub flags: Option<PppFlags>,
    /// The stored number.
    pub value: Mpi,
}

impl fmt::Debug for KeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRecord")
            .field("version", &self.version)
            .field("format", &self.format)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl KeyRecord {
    /// A current-format record.
    #[must_use]
    pub const fn new(version: u32, flags: PppFlags, value: Mpi) -> Self {
        Self {
            version,
            format: DATA_FORMAT,
            flags: Some(flags),
            value,
        }
    }

    /// The on-disk bytes. Always written in the current format, with flags.
    ///
    /// # Errors
    ///
    /// Only on allocation failure.
    pub fn encode(&self) -> PppResult<Zeroizing<Vec<u8>>> {
        let flags = self.flags.unwrap_or_default().with(PppFlags::FLAGS_PRESENT, true);
        let value = Zeroizing::new(self.value.to_radix(VALUE_RADIX)?);
        let mut out = Zeroizing::new(Vec::with_capacity(HEADER_LEN + value.len() + 1));
        out.extend_from_slice(
            format!(" PPP {:04} {:04} {:04x} ", self.version, DATA_FORMAT, flags.bits()).as_bytes(),
        );
        out.extend_from_slice(value.as_bytes());
        out.push(0);
        Ok(out)
    }

    /// Parses a record read from `path` (used only in error messages).
    ///
    /// # Errors
    ///
    /// [`PppError::KeyFile`] for a header that is not PPP's or a value that
    /// is not valid radix-64.
    pub fn decode(bytes: &[u8], path: &Path) -> PppResult<Self> {
        let bad = |reason| PppError::KeyFile {
            path: path.to_path_buf(),
            reason,
        };
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let text = std::str::from_utf8(&bytes[..end])
            .map_err(|_| bad("not text"))?
            .trim_end();

        if !text.starts_with(' ') {
            let value = Mpi::read_radix(text, VALUE_RADIX).map_err(|_| bad("bad value"))?;
            return Ok(Self {
                version: 1,
                format: 0,
                flags: None,
                value,
            });
        }
        if !text.starts_with(" PPP ") || text.len() < 15 {
            return Err(bad("not a PPP key file"));
        }

        let version = field(text, 5..9, 10).ok_or_else(|| bad("bad version"))?;
        let format = field(text, 10..14, 10).ok_or_else(|| bad("bad data format"))?;
        if format != DATA_FORMAT {
            return Err(bad("unknown data format"));
        }

        let has_flags = text.len() > HEADER_LEN && text.as_bytes()[HEADER_LEN - 1] == b' ';
        let (flags, body) = if has_flags {
            let bits = field(text, 15..19, 16)
                .and_then(|b| u16::try_from(b).ok())
                .ok_or_else(|| bad("bad flags"))?;
            (Some(PppFlags::from_bits(bits)), text.get(HEADER_LEN..).ok_or_else(|| bad("bad value"))?)
        } else {
            if text.as_bytes().get(14) != Some(&b' ') {
                return Err(bad("not a PPP key file"));
            }
            (None, text.get(15..).ok_or_else(|| bad("bad value"))?)
        };
        let value = Mpi::read_radix(body, VALUE_RADIX).map_err(|_| bad("bad value"))?;

        Ok(Self {
            version,
            format,
            flags,
            value,
        })
    }
}

fn field(text: &str, range: std::ops::Range<usize>, radix: u32) -> Option<u32> {
    u32::from_str_radix(text.get(range)?, radix).ok()
}
