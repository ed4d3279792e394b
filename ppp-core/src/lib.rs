// File:    lib.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: The main library crate for ppp-core, tying key handling, passcode derivation and sequence state together.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! # PPP Core Library
//!
//! Perfect Paper Passwords: a secret sequence key drives AES-256 in counter
//! mode to produce an endless list of four-character passcodes, printed on
//! cards of 70 and used one after another. This crate derives the passcodes,
//! keeps the per-user counters on disk and renders the cards.
//!
//! ```
//! use ppp_core::{Alphabet, Aes256Cipher, KeyVersion, PasscodeGenerator};
//! use ppp_core::key_generator::sequence_key_from_passphrase;
//! use ppp_mpi::Mpi;
//!
//! let version = KeyVersion::V2;
//! let key = sequence_key_from_passphrase("correct horse battery staple", version)?;
//! let generator = PasscodeGenerator::new(Aes256Cipher, &key, version, Alphabet::for_version(version))?;
//! assert_eq!(generator.passcode(&Mpi::new())?.as_str(), "E6Cw");
//! # Ok::<(), ppp_core::PppError>(())
//! ```

/// Passcode character sets.
pub mod alphabet;
/// Card geometry and passcode ids such as `3B [12]`.
pub mod card;
/// Block cipher and hash adapters.
pub mod crypto;
/// Index to passcode derivation.
pub mod derivation;
/// Error type for the whole crate.
pub mod error;
/// Creation of new sequence keys.
pub mod key_generator;
/// On-disk record format.
pub mod keyfile;
/// Text and HTML passcards.
pub mod print;
/// Secret-holding types.
pub mod secret;
/// Counters, flags, warnings and the authentication flow.
pub mod sequence;
/// The key directory and its lock.
pub mod state_manager;
/// Algorithm versions.
pub mod version;

pub use alphabet::Alphabet;
pub use card::PasscodeId;
pub use crypto::{Aes256Cipher, BlockCipher};
pub use derivation::PasscodeGenerator;
pub use error::{PppError, PppResult};
pub use print::PrintedCard;
pub use secret::{Passcode, SequenceKey};
pub use sequence::{MemoryStore, PppEngine, PppFlags, PppWarning, SequenceState, StateStore, StatusReport};
pub use state_manager::{KeyStore, LoadedKey};
pub use version::KeyVersion;
