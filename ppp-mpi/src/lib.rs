// File:    lib.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: Arbitrary-precision signed integers used by the Perfect Paper Passwords engine.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! # PPP multi-precision integers
//!
//! A small sign-magnitude bignum library: 32-bit digits, schoolbook
//! multiplication, Knuth long division, modular exponentiation, gcd and
//! inverse, radix 2..=64 text conversion and a probabilistic primality
//! engine.
//!
//! Values own their digits exclusively and wipe them on drop, so sequence
//! keys held as [`Mpi`] never linger in freed memory.
//!
//! ```
//! use ppp_mpi::Mpi;
//!
//! let a: Mpi = "123456789012345678901234567890".parse()?;
//! let m = Mpi::from_u64(1_000_000_007);
//! let r = a.exptmod(&Mpi::from_u64(65_537), &m)?;
//! assert!(r < m);
//! # Ok::<(), ppp_mpi::MpError>(())
//! ```

mod arith;
/// Zeroizing digit storage.
pub mod digits;
mod div;
/// Error type shared by all operations.
pub mod error;
/// The [`Mpi`] type itself.
pub mod int;
mod modular;
/// Primality testing and prime search.
pub mod prime;
mod radix;

pub use digits::{DIGIT_BIT, Digit, DigitVec};
pub use error::{MpError, MpResult};
pub use int::{Mpi, Sign};
pub use prime::{Primality, find_next_prime, is_probably_prime};
pub use radix::{MAX_RADIX, MIN_RADIX, RADIX_ALPHABET};
