// File:    derivation.rs
// Author:  apezoo
// Date:    2025-08-04
//
// Description: Maps a passcode index to its four characters through AES in counter mode.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Passcode derivation.
//!
//! Every 16 passcodes share one 48-byte block made of three consecutive
//! cipher outputs; each passcode takes three bytes of it and splits them
//! into four 6-bit alphabet indices. Derivation is a pure function of the
//! key, version, alphabet and index, so any passcode can be computed
//! without touching its neighbours.

use log::debug;
use ppp_mpi::{MpError, Mpi};
use zeroize::Zeroizing;

use crate::alphabet::Alphabet;
use crate::crypto::BlockCipher;
use crate::error::PppResult;
use crate::secret::{KEY_LAYOUT_BYTES, Passcode, SequenceKey};
use crate::version::KeyVersion;

/// Passcodes drawn from one 48-byte block.
pub const CODES_PER_BLOCK: u32 = 16;

/// Bytes in one derived block: three cipher outputs.
pub const BLOCK_BYTES: usize = 48;

/// Three cipher outputs concatenated.
pub type Block = Zeroizing<[u8; BLOCK_BYTES]>;

/// Derives passcodes for one key.
pub struct PasscodeGenerator<C> {
    cipher: C,
    aes_key: Zeroizing<[u8; 32]>,
    counter_offset: Mpi,
    version: KeyVersion,
    alphabet: Alphabet,
}

impl<C: BlockCipher> PasscodeGenerator<C> {
    /// Splits the sequence key into cipher key and counter offset according
    /// to `version`.
    ///
    /// # Errors
    ///
    /// Fails only if the key cannot be laid out, which construction of
    /// [`SequenceKey`] rules out.
    pub fn new(cipher: C, key: &SequenceKey, version: KeyVersion, alphabet: Alphabet) -> PppResult<Self> {
        let layout = key.layout()?;
        let (key_range, offset) = if version.traits().has_counter_offset {
            (0..32, Mpi::read_unsigned_bytes(&layout[32..KEY_LAYOUT_BYTES])?)
        } else {
            (16..KEY_LAYOUT_BYTES, Mpi::new())
        };
        let mut aes_key = Zeroizing::new([0u8; 32]);
        aes_key.copy_from_slice(&layout[key_range]);
        aes_key.reverse();

        Ok(Self {
            cipher,
            aes_key,
            counter_offset: offset,
            version,
            alphabet,
        })
    }

    /// The key version this generator was built for.
    #[must_use]
    pub const fn version(&self) -> KeyVersion {
        self.version
    }

    /// The alphabet passcodes are drawn from.
    #[must_use]
    pub const fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Splits a passcode index into `(cipher_block_index, offset)` with
    /// `cipher_block_index = (index >> 4) * 3` and `offset = index & 0xF`.
    ///
    /// # Errors
    ///
    /// [`crate::PppError::Mpi`] for a negative index.
    pub fn locate(index: &Mpi) -> PppResult<(Mpi, usize)> {
        if index.is_neg() {
            return Err(MpError::InvalidArgument("negative passcode index").into());
        }
        let (group, low) = index.div_2d(4)?;
        let offset = low.to_u64().and_then(|v| usize::try_from(v).ok()).unwrap_or(0);
        Ok((group.mul_d(3)?, offset))
    }

    /// Encrypts the counters `P`, `P+1`, `P+2` (mod 2^128), where
    /// `P = counter_offset + cipher_block_index`, each encoded as 16
    /// little-endian bytes.
    ///
    /// # Errors
    ///
    /// [`crate::PppError::Mpi`] for a negative block index.
    pub fn compute_block(&self, cipher_block_index: &Mpi) -> PppResult<Block> {
        if cipher_block_index.is_neg() {
            return Err(MpError::InvalidArgument("negative cipher block index").into());
        }
        let p = self.counter_offset.add(cipher_block_index)?.mod_2d(128)?;
        let mut be = Zeroizing::new([0u8; 16]);
        p.to_unsigned_bytes_fixed(be.as_mut_slice())?;
        let base = u128::from_be_bytes(*be);

        let mut block = Zeroizing::new([0u8; BLOCK_BYTES]);
        for (i, chunk) in block.chunks_exact_mut(16).enumerate() {
            let counter = Zeroizing::new(base.wrapping_add(i as u128).to_le_bytes());
            chunk.copy_from_slice(&self.cipher.encrypt_block(&self.aes_key, &counter));
        }
        Ok(block)
    }

    /// Turns bytes `3*offset .. 3*offset+3` of a block into a passcode.
    #[must_use]
    pub fn extract(&self, block: &[u8; BLOCK_BYTES], offset: usize) -> Passcode {
        let i = 3 * (offset % CODES_PER_BLOCK as usize);
        let (b0, b1, b2) = (block[i], block[i + 1], block[i + 2]);
        let groups = [
            b0 & 0x3f,
            (b0 >> 6) | ((b1 & 0x0f) << 2),
            (b1 >> 4) | ((b2 & 0x03) << 4),
            b2 >> 2,
        ];
        Passcode::new(groups.map(|g| self.alphabet.symbol(g)))
    }

    /// The passcode at `index`.
    ///
    /// # Errors
    ///
    /// [`crate::PppError::Mpi`] for a negative index.
    pub fn passcode(&self, index: &Mpi) -> PppResult<Passcode> {
        let (cbi, offset) = Self::locate(index)?;
        let block = self.compute_block(&cbi)?;
        Ok(self.extract(&block, offset))
    }

    /// `count` consecutive passcodes starting at `start`. Indices sharing a
    /// block reuse the one computed for the first of them.
    ///
    /// # Errors
    ///
    /// [`crate::PppError::Mpi`] for a negative start.
    pub fn derive_block(&self, start: &Mpi, count: usize) -> PppResult<Vec<Passcode>> {
        let mut codes = Vec::with_capacity(count);
        let mut cached: Option<(Mpi, Block)> = None;
        let mut index = start.clone();
        let mut computed = 0usize;

        for _ in 0..count {
            let (cbi, offset) = Self::locate(&index)?;
            let block = match cached.take() {
                Some((at, block)) if at == cbi => block,
                _ => {
                    computed += 1;
                    self.compute_block(&cbi)?
                }
            };
            codes.push(self.extract(&block, offset));
            cached = Some((cbi, block));
            index.add_d_assign(1)?;
        }
        debug!("derived {count} passcodes from {computed} blocks");
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Aes256Cipher;

    #[test]
    fn locate_splits_index() {
        let (cbi, off) = PasscodeGenerator::<Aes256Cipher>::locate(&Mpi::from_u64(35)).unwrap();
        assert_eq!((cbi, off), (Mpi::from_u64(6), 3));
        assert!(PasscodeGenerator::<Aes256Cipher>::locate(&Mpi::from_i64(-1)).is_err());
    }

    #[test]
    fn extract_uses_little_end_bits_first() {
        let g = PasscodeGenerator::new(
            Aes256Cipher,
            &SequenceKey::from_digest(&[0; 32]).unwrap(),
            KeyVersion::V2,
            Alphabet::for_version(KeyVersion::V2),
        )
        .unwrap();
        let mut block = [0u8; BLOCK_BYTES];
        // groups 1, 2, 3, 4 -> bytes 0b10_000001, 0b0011_0000, 0b000100_00
        block[3] = 0b1000_0001;
        block[4] = 0b0011_0000;
        block[5] = 0b0001_0000;
        assert_eq!(g.extract(&block, 1).as_str(), "3456");
    }
}
