// File:    alphabet.rs
// Author:  apezoo
// Date:    2025-08-04
//
// Description: The symbol set passcode characters are drawn from.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use crate::error::{PppError, PppResult};
use crate::version::KeyVersion;

/// The stock 64-symbol alphabet; look-alike characters (`0`, `O`, `1`, `l`,
/// `I`, `Q`) are left out.
pub const DEFAULT_ALPHABET: &str =
    "23456789!@#%+=:?abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPRSTUVWXYZ";

/// Symbols addressable by one 6-bit group.
pub const ALPHABET_SIZE: usize = 64;

/// An ordered set of at least 64 printable ASCII symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<u8>,
}

impl Alphabet {
    /// The default alphabet as used by `version`.
    #[must_use]
    pub fn for_version(version: KeyVersion) -> Self {
        let mut symbols = DEFAULT_ALPHABET.as_bytes().to_vec();
        if version.traits().sorted_alphabet {
            symbols.sort_unstable();
        }
        Self { symbols }
    }

    /// A caller-supplied alphabet. Symbols are sorted so that the same set
    /// always yields the same passcodes regardless of the order given.
    ///
    /// # Errors
    ///
    /// [`PppError::InvalidAlphabet`] if a symbol is not printable ASCII or
    /// fewer than 64 symbols are given.
    pub fn custom(text: &str) -> PppResult<Self> {
        if !text.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(PppError::InvalidAlphabet("symbols must be printable ASCII without spaces"));
        }
        if text.len() < ALPHABET_SIZE {
            return Err(PppError::InvalidAlphabet("at least 64 symbols are required"));
        }
        let mut symbols = text.as_bytes().to_vec();
        symbols.sort_unstable();
        Ok(Self { symbols })
    }

    /// Symbol for a 6-bit group value.
    #[must_use]
    pub fn symbol(&self, group: u8) -> u8 {
        self.symbols[usize::from(group & 0x3f)]
    }

    /// All symbols in order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v3_sorts_the_default() {
        let a = Alphabet::for_version(KeyVersion::V3);
        assert_eq!(
            a.as_bytes(),
            b"!#%+23456789:=?@ABCDEFGHJKLMNPRSTUVWXYZabcdefghijkmnopqrstuvwxyz"
        );
        assert_eq!(Alphabet::for_version(KeyVersion::V2).symbol(0), b'2');
    }

    #[test]
    fn custom_alphabets_are_validated_and_sorted() {
        assert!(Alphabet::custom("abc").is_err());
        assert!(Alphabet::custom(&format!("{} ", &DEFAULT_ALPHABET[..63])).is_err());
        let custom = Alphabet::custom(DEFAULT_ALPHABET).unwrap();
        assert_eq!(custom, Alphabet::for_version(KeyVersion::V3));
    }
}
