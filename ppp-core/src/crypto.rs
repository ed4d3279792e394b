// File:    crypto.rs
// Author:  apezoo
// Date:    2025-08-04
//
// Description: Adapters for the block cipher and hash functions used to derive passcodes.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! This module contains the cryptographic primitives PPP consumes.
//!
//! The derivation engine only ever sees the [`BlockCipher`] trait, so tests
//! can swap in an instrumented cipher.

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use sha2::{Digest, Sha256, Sha384};

/// A deterministic 128-bit block cipher keyed with 256 bits.
pub trait BlockCipher {
    /// Encrypts one block under `key`.
    fn encrypt_block(&self, key: &[u8; 32], plaintext: &[u8; 16]) -> [u8; 16];
}

/// AES-256 via the `aes` crate. Round keys are wiped when each call returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aes256Cipher;

impl BlockCipher for Aes256Cipher {
    fn encrypt_block(&self, key: &[u8; 32], plaintext: &[u8; 16]) -> [u8; 16] {
        let cipher = Aes256::new(GenericArray::from_slice(key));
        let mut block = GenericArray::clone_from_slice(plaintext);
        cipher.encrypt_block(&mut block);
        let mut out = [0u8; 16];
        out.copy_from_slice(&block);
        out
    }
}

/// SHA-256 of `data`.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-384 of `data`.
#[must_use]
pub fn sha384(data: &[u8]) -> [u8; 48] {
    Sha384::digest(data).into()
}

/// Compares two byte strings without an early exit on the first mismatch.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aes256_fips197_vector() {
        let key: [u8; 32] = std::array::from_fn(|i| u8::try_from(i).unwrap());
        let pt = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff,
        ];
        let ct = Aes256Cipher.encrypt_block(&key, &pt);
        assert_eq!(
            ct,
            [0x8e, 0xa2, 0xb7, 0xca, 0x51, 0x67, 0x45, 0xbf, 0xea, 0xfc, 0x49, 0x90, 0x4b, 0x49, 0x60, 0x89]
        );
    }

    #[test]
    fn sha256_of_abc() {
        let d = sha256(b"abc");
        assert_eq!(d[..4], [0xba, 0x78, 0x16, 0xbf]);
        assert_eq!(sha384(b"abc")[..4], [0xcb, 0x00, 0x75, 0x3f]);
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"E6Cw", b"E6Cw"));
        assert!(!constant_time_eq(b"E6Cw", b"E6Cx"));
        assert!(!constant_time_eq(b"E6C", b"E6Cw"));
    }
}
