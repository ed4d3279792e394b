// File:    version.rs
// Author:  apezoo
// Date:    2025-08-04
//
// Description: Sequence-key format versions and the per-version traits table.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use std::fmt;

use zeroize::Zeroizing;

use crate::crypto::{sha256, sha384};
use crate::error::{PppError, PppResult};

/// Version written into newly generated key files.
pub const CURRENT_PPP_VERSION: u32 = 2;

/// Hash used to turn entropy or a passphrase into a sequence key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDigest {
    /// SHA-256, 32-byte key.
    Sha256,
    /// SHA-384, 48-byte key (AES key plus a 128-bit counter offset).
    Sha384,
}

impl KeyDigest {
    /// Hashes `data`, returning the digest bytes.
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(match self {
            Self::Sha256 => sha256(data).to_vec(),
            Self::Sha384 => sha384(data).to_vec(),
        })
    }
}

/// Static facts about a key version, looked up once when a key is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionTraits {
    /// Length of the sequence key in bytes.
    pub key_bytes: usize,
    /// Digest that produces the key.
    pub digest: KeyDigest,
    /// Whether the key carries a 128-bit plaintext counter offset.
    pub has_counter_offset: bool,
    /// Whether the default alphabet is sorted before use.
    pub sorted_alphabet: bool,
}

/// Supported sequence-key versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyVersion {
    /// SHA-384 key; the low 16 bytes offset the cipher counter.
    V1,
    /// SHA-256 key used directly as the AES key.
    V2,
    /// V2 layout with a sorted alphabet.
    V3,
}

impl KeyVersion {
    /// Maps a stored version number onto a known version.
    ///
    /// # Errors
    ///
    /// [`PppError::UnsupportedVersion`] for any other number.
    pub fn from_number(n: u32) -> PppResult<Self> {
        match n {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            other => Err(PppError::UnsupportedVersion(other)),
        }
    }

    /// The stored version number.
    #[must_use]
    pub const fn number(self) -> u32 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }

    /// The version used for new keys.
    #[must_use]
    pub const fn current() -> Self {
        Self::V2
    }

    /// Traits table entry for this version.
    #[must_use]
    pub const fn traits(self) -> VersionTraits {
        match self {
            Self::V1 => VersionTraits {
                key_bytes: 48,
                digest: KeyDigest::Sha384,
                has_counter_offset: true,
                sorted_alphabet: false,
            },
            Self::V2 => VersionTraits {
                key_bytes: 32,
                digest: KeyDigest::Sha256,
                has_counter_offset: false,
                sorted_alphabet: false,
            },
            Self::V3 => VersionTraits {
                key_bytes: 32,
                digest: KeyDigest::Sha256,
                has_counter_offset: false,
                sorted_alphabet: true,
            },
        }
    }

    /// `true` if keys of this version predate [`CURRENT_PPP_VERSION`].
    #[must_use]
    pub const fn is_outdated(self) -> bool {
        self.number() < CURRENT_PPP_VERSION
    }
}

impl fmt::Display for KeyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_round_trip_and_unknown_is_rejected() {
        for v in [KeyVersion::V1, KeyVersion::V2, KeyVersion::V3] {
            assert_eq!(KeyVersion::from_number(v.number()).unwrap(), v);
        }
        assert!(matches!(KeyVersion::from_number(9), Err(PppError::UnsupportedVersion(9))));
        assert_eq!(KeyVersion::current().number(), CURRENT_PPP_VERSION);
    }

    #[test]
    fn traits_table() {
        assert_eq!(KeyVersion::V1.traits().key_bytes, 48);
        assert!(KeyVersion::V1.traits().has_counter_offset);
        assert!(KeyVersion::V3.traits().sorted_alphabet);
        assert!(KeyVersion::V1.is_outdated());
        assert!(!KeyVersion::V3.is_outdated());
    }
}
