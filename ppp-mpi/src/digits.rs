// File:    digits.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: Owned, zeroizing digit storage with explicit used/allocated lengths.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Digit vector: the magnitude storage underneath [`crate::Mpi`].
//!
//! Digits are stored least-significant first. The buffer always has
//! `alloc()` zero-filled slots of which the first `used()` are meaningful;
//! every slot past `used()` is kept at zero so that growing the logical
//! length never exposes stale data.

use zeroize::Zeroize;

use crate::error::{MpError, MpResult};

/// A single machine digit.
pub type Digit = u32;

/// A double-width word used for carries and partial products.
pub type Word = u64;

/// Number of bits in a [`Digit`].
pub const DIGIT_BIT: usize = 32;

/// The digit radix, `2^DIGIT_BIT`.
pub const RADIX: Word = 1 << DIGIT_BIT;

/// Minimum number of digits allocated when a buffer first grows.
pub const DEFAULT_PRECISION: usize = 8;

/// Growable, zeroizing buffer of digits.
#[derive(Clone, Default)]
pub struct DigitVec {
    buf: Vec<Digit>,
    used: usize,
}

impl DigitVec {
    /// An empty vector (the value zero) that owns no allocation yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            used: 0,
        }
    }

    /// Allocates at least `capacity` zeroed digits with `used == 0`.
    ///
    /// # Errors
    ///
    /// Returns [`MpError::OutOfMemory`] if the allocation fails.
    pub fn with_capacity(capacity: usize) -> MpResult<Self> {
        let mut v = Self::new();
        v.grow(capacity)?;
        Ok(v)
    }

    /// Copies `digits` (least significant first) and strips leading zeros.
    ///
    /// # Errors
    ///
    /// Returns [`MpError::OutOfMemory`] if the allocation fails.
    pub fn from_digits(digits: &[Digit]) -> MpResult<Self> {
        let mut v = Self::with_capacity(digits.len())?;
        v.buf[..digits.len()].copy_from_slice(digits);
        v.used = digits.len();
        v.clamp();
        Ok(v)
    }

    /// Builds a vector holding a single double-width word.
    #[must_use]
    pub fn from_word(w: Word) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let mut v = Self {
            buf: vec![w as Digit, (w >> DIGIT_BIT) as Digit],
            used: 2,
        };
        v.clamp();
        v
    }

    /// Number of meaningful digits.
    #[must_use]
    pub const fn used(&self) -> usize {
        self.used
    }

    /// Number of allocated digits.
    #[must_use]
    pub fn alloc(&self) -> usize {
        self.buf.len()
    }

    /// `true` when no digit is in use, i.e. the magnitude is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.used == 0
    }

    /// The meaningful digits, least significant first.
    #[must_use]
    pub fn digits(&self) -> &[Digit] {
        &self.buf[..self.used]
    }

    /// Mutable view of the meaningful digits.
    pub fn digits_mut(&mut self) -> &mut [Digit] {
        &mut self.buf[..self.used]
    }

    /// Digit `i`, or zero past the used length.
    #[must_use]
    pub fn digit(&self, i: usize) -> Digit {
        if i < self.used { self.buf[i] } else { 0 }
    }

    /// Ensures at least `min` digits are allocated.
    ///
    /// This is the only place the buffer is ever reallocated. Capacity at
    /// least doubles; the previous buffer is wiped before it is released.
    ///
    /// # Errors
    ///
    /// Returns [`MpError::OutOfMemory`] if the allocation fails.
    pub fn grow(&mut self, min: usize) -> MpResult<()> {
        if min <= self.buf.len() {
            return Ok(());
        }
        let target = min
            .max(self.buf.len().saturating_mul(2))
            .max(DEFAULT_PRECISION);

        let mut fresh: Vec<Digit> = Vec::new();
        fresh
            .try_reserve_exact(target)
            .map_err(|_| MpError::OutOfMemory)?;
        fresh.extend_from_slice(&self.buf);
        fresh.resize(target, 0);

        let mut old = std::mem::replace(&mut self.buf, fresh);
        old.zeroize();
        Ok(())
    }

    /// Sets the used length, growing if needed. Newly exposed digits are zero;
    /// digits dropped from the used range are wiped.
    ///
    /// # Errors
    ///
    /// Returns [`MpError::OutOfMemory`] if growing fails.
    pub fn set_used(&mut self, n: usize) -> MpResult<()> {
        self.grow(n)?;
        if n < self.used {
            self.buf[n..self.used].fill(0);
        }
        self.used = n;
        Ok(())
    }

    /// Appends a most-significant digit.
    ///
    /// # Errors
    ///
    /// Returns [`MpError::OutOfMemory`] if growing fails.
    pub fn push(&mut self, d: Digit) -> MpResult<()> {
        let at = self.used;
        self.set_used(at + 1)?;
        self.buf[at] = d;
        Ok(())
    }

    /// Drops leading (most significant) zero digits.
    pub fn clamp(&mut self) {
        while self.used > 0 && self.buf[self.used - 1] == 0 {
            self.used -= 1;
        }
    }

    /// Resets to zero, wiping the digits but keeping the allocation.
    pub fn clear(&mut self) {
        self.buf.as_mut_slice().zeroize();
        self.used = 0;
    }
}

impl Drop for DigitVec {
    fn drop(&mut self) {
        self.buf.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_capacity_is_zero_filled_and_unused() {
        let v = DigitVec::with_capacity(3).unwrap();
        assert_eq!(v.used(), 0);
        assert!(v.alloc() >= 3);
        assert!(v.is_zero());
    }

    #[test]
    fn grow_keeps_digits_and_doubles() {
        let mut v = DigitVec::from_digits(&[1, 2, 3]).unwrap();
        let before = v.alloc();
        v.grow(before + 1).unwrap();
        assert!(v.alloc() >= before * 2);
        assert_eq!(v.digits(), &[1, 2, 3]);
    }

    #[test]
    fn clamp_strips_leading_zeros() {
        let v = DigitVec::from_digits(&[7, 0, 0]).unwrap();
        assert_eq!(v.used(), 1);
        let z = DigitVec::from_digits(&[0, 0]).unwrap();
        assert!(z.is_zero());
    }

    #[test]
    fn shrinking_used_wipes_dropped_digits() {
        let mut v = DigitVec::from_digits(&[1, 2, 3]).unwrap();
        v.set_used(1).unwrap();
        v.set_used(3).unwrap();
        assert_eq!(v.digits(), &[1, 0, 0]);
    }

    #[test]
    fn from_word_splits_halves() {
        let v = DigitVec::from_word(0x1_0000_0002);
        assert_eq!(v.digits(), &[2, 1]);
        assert!(DigitVec::from_word(0).is_zero());
    }
}
