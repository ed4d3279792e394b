// File:    error.rs
// Author:  apezoo
// Date:    2025-08-04
//
// Description: Error type for passcode derivation, key files and sequence bookkeeping.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use std::path::PathBuf;

use ppp_mpi::MpError;
use thiserror::Error;

/// Everything that can go wrong in `ppp-core`.
#[derive(Debug, Error)]
pub enum PppError {
    /// Bignum arithmetic failed (in practice only on allocation failure).
    #[error("arithmetic error: {0}")]
    Mpi(#[from] MpError),

    /// Reading or writing key files failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The key, counter and card files were written by different versions.
    #[error("key files have mismatched versions ({key}, {counter}, {cards}); regenerate key")]
    VersionMismatch {
        /// Version of `private_key`.
        key: u32,
        /// Version of `private_cnt`.
        counter: u32,
        /// Version of `private_gen`.
        cards: u32,
    },

    /// The key was produced by a PPP version this build does not know.
    #[error("unsupported PPP key version {0}; regenerate key")]
    UnsupportedVersion(u32),

    /// A skip must move strictly forward.
    #[error("you can only skip forward (current passcode is {current}, requested {requested})")]
    NotForward {
        /// 1-based current passcode number.
        current: String,
        /// 1-based requested passcode number.
        requested: String,
    },

    /// A passcode identifier or card number could not be parsed.
    #[error("invalid passcode id `{0}`")]
    InvalidPasscodeId(String),

    /// A custom alphabet was rejected.
    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(&'static str),

    /// A key file exists but its contents are malformed.
    #[error("malformed key file {path}: {reason}")]
    KeyFile {
        /// The offending file.
        path: PathBuf,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// No sequence key has been generated in the key directory.
    #[error("no sequence key in {0}; create one with `pppauth key` or use --passphrase")]
    NoKey(PathBuf),

    /// Refused to overwrite an existing key.
    #[error("a sequence key already exists in {0}; pass --force to replace it")]
    KeyExists(PathBuf),

    /// `reserve` was called twice without an intervening `authenticate`.
    #[error("a passcode is already reserved")]
    AlreadyReserved,

    /// The operating system's random source failed.
    #[error("entropy source failed: {0}")]
    Entropy(String),
}

/// Result alias used throughout the crate.
pub type PppResult<T> = Result<T, PppError>;
