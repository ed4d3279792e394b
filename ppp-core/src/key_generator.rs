// File:    key_generator.rs
// Author:  apezoo
// Date:    2025-08-05
//
// Description: Creates sequence keys from operating-system entropy or from a passphrase.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use log::debug;
use rand::{TryRngCore, rngs::OsRng};
use zeroize::Zeroizing;

use crate::error::{PppError, PppResult};
use crate::secret::SequenceKey;
use crate::version::KeyVersion;

/// Bytes of entropy hashed into a random key.
pub const ENTROPY_BYTES: usize = 32;

/// Generates a fresh random sequence key for `version`.
///
/// # Errors
///
/// [`PppError::Entropy`] if the operating system's random source fails.
pub fn random_sequence_key(version: KeyVersion) -> PppResult<SequenceKey> {
    let mut rng = OsRng;
    let mut entropy = Zeroizing::new([0u8; ENTROPY_BYTES]);
    // Use the failable `try_fill_bytes` and surface the error.
    rng.try_fill_bytes(entropy.as_mut_slice())
        .map_err(|e| PppError::Entropy(e.to_string()))?;

    let digest = version.traits().digest.digest(entropy.as_slice());
    debug!("generated random version {version} sequence key");
    SequenceKey::from_digest(&digest)
}

/// Derives the sequence key for `passphrase`: the version's digest of the
/// passphrase bytes. The same passphrase always yields the same passcodes.
///
/// # Errors
///
/// Never in practice; digests always fit the key layout.
pub fn sequence_key_from_passphrase(passphrase: &str, version: KeyVersion) -> PppResult<SequenceKey> {
    let digest = version.traits().digest.digest(passphrase.as_bytes());
    SequenceKey::from_digest(&digest)
}
