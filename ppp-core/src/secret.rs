// File:    secret.rs
// Author:  apezoo
// Date:    2025-08-04
//
// Description: Wrappers for the sequence key and passcodes that wipe themselves and mask Debug output.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use std::fmt::{self, Write as _};

use ppp_mpi::{MpError, Mpi};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::constant_time_eq;
use crate::error::PppResult;
use crate::version::KeyVersion;

/// Bytes in the big-endian layout every key version is read from.
pub const KEY_LAYOUT_BYTES: usize = 48;

/// Characters in one passcode.
pub const PASSCODE_LEN: usize = 4;

/// The secret a passcode sequence is derived from.
///
/// Held as a non-negative [`Mpi`] whose value is the key digest read
/// little-endian; the digits are wiped when the key is dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct SequenceKey {
    value: Mpi,
}

impl SequenceKey {
    /// Builds a key from digest bytes (SHA-256 or SHA-384 output).
    ///
    /// # Errors
    ///
    /// [`crate::PppError::Mpi`] if the digest is longer than 48 bytes.
    pub fn from_digest(digest: &[u8]) -> PppResult<Self> {
        if digest.len() > KEY_LAYOUT_BYTES {
            return Err(MpError::InvalidArgument("digest longer than 48 bytes").into());
        }
        let mut reversed = Zeroizing::new(digest.to_vec());
        reversed.reverse();
        Ok(Self {
            value: Mpi::read_unsigned_bytes(&reversed)?,
        })
    }

    /// Wraps a value read back from a key file.
    ///
    /// # Errors
    ///
    /// [`crate::PppError::Mpi`] if the value is negative or wider than 384 bits.
    pub fn from_value(value: Mpi) -> PppResult<Self> {
        if value.is_neg() || value.unsigned_byte_len() > KEY_LAYOUT_BYTES {
            return Err(MpError::InvalidArgument("sequence key out of range").into());
        }
        Ok(Self { value })
    }

    /// The key as an integer, for persisting.
    #[must_use]
    pub const fn value(&self) -> &Mpi {
        &self.value
    }

    /// The key as 48 big-endian bytes.
    ///
    /// # Errors
    ///
    /// Never in practice; construction guarantees the value fits.
    pub fn layout(&self) -> PppResult<Zeroizing<[u8; KEY_LAYOUT_BYTES]>> {
        let mut out = Zeroizing::new([0u8; KEY_LAYOUT_BYTES]);
        self.value.to_unsigned_bytes_fixed(out.as_mut_slice())?;
        Ok(out)
    }

    /// The digest this key was built from, as lower-case hex.
    ///
    /// # Errors
    ///
    /// As [`SequenceKey::layout`].
    pub fn to_hex(&self, version: KeyVersion) -> PppResult<Zeroizing<String>> {
        let layout = self.layout()?;
        let key_bytes = version.traits().key_bytes;
        let mut out = Zeroizing::new(String::with_capacity(key_bytes * 2));
        for b in layout[KEY_LAYOUT_BYTES - key_bytes..].iter().rev() {
            let _ = write!(out, "{b:02x}");
        }
        Ok(out)
    }
}

impl fmt::Debug for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SequenceKey(***)")
    }
}

/// One four-character passcode.
///
/// `Display` shows the code (it is printed on passcards); `Debug` does not.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Passcode {
    chars: [u8; PASSCODE_LEN],
}

impl Passcode {
    pub(crate) const fn new(chars: [u8; PASSCODE_LEN]) -> Self {
        Self { chars }
    }

    /// The code as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Alphabets are validated to be ASCII.
        std::str::from_utf8(&self.chars).unwrap_or_default()
    }

    /// Constant-time comparison against a typed attempt.
    #[must_use]
    pub fn matches(&self, attempt: &str) -> bool {
        constant_time_eq(&self.chars, attempt.as_bytes())
    }
}

impl fmt::Display for Passcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Passcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passcode(****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256;

    #[test]
    fn digest_is_read_little_endian() {
        let key = SequenceKey::from_digest(&[0x01, 0x02]).unwrap();
        assert_eq!(key.value().to_u64(), Some(0x0201));
    }

    #[test]
    fn hex_reproduces_the_digest() {
        let digest = sha256(b"correct horse battery staple");
        let key = SequenceKey::from_digest(&digest).unwrap();
        assert_eq!(
            key.to_hex(KeyVersion::V2).unwrap().as_str(),
            "c4bbcb1fbec99d65bf59d85c8cb62ee2db963f0fe106f483d9afa73bd4e39a8a"
        );
    }

    #[test]
    fn debug_output_is_masked() {
        let key = SequenceKey::from_digest(&[7; 32]).unwrap();
        assert_eq!(format!("{key:?}"), "SequenceKey(***)");
        let code = Passcode::new(*b"E6Cw");
        assert_eq!(format!("{code:?}"), "Passcode(****)");
        assert_eq!(code.to_string(), "E6Cw");
        assert!(code.matches("E6Cw"));
        assert!(!code.matches("e6cw"));
    }

    #[test]
    fn negative_values_are_rejected() {
        assert!(SequenceKey::from_value(Mpi::from_i64(-1)).is_err());
    }
}
