// File:    error.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: Error taxonomy shared by every multi-precision operation.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use thiserror::Error;

/// Errors produced by multi-precision integer operations.
///
/// The set is closed: allocation failure is the only unrecoverable case,
/// everything else is an ordinary result the caller can act on.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MpError {
    /// The digit buffer could not be grown.
    #[error("out of memory while growing digit buffer")]
    OutOfMemory,

    /// An argument is outside the domain of the operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A radix outside 2..=64, or a character that is not a digit in the radix.
    #[error("invalid radix or digit")]
    InvalidRadix,

    /// Division or reduction by zero.
    #[error("division by zero")]
    DivideByZero,

    /// The result does not exist (e.g. no modular inverse).
    #[error("result undefined")]
    Undefined,
}

/// Convenience alias used across the crate.
pub type MpResult<T> = Result<T, MpError>;
