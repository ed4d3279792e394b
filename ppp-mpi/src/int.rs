// File:    int.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: The signed multi-precision integer type, its constructors, queries and ordering.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use std::cmp::Ordering;
use std::fmt;

use crate::digits::{DIGIT_BIT, Digit, DigitVec, Word};
use crate::error::MpResult;

/// Sign of an [`Mpi`]. Zero is always [`Sign::Zpos`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sign {
    /// Zero or positive.
    #[default]
    Zpos,
    /// Strictly negative.
    Neg,
}

impl Sign {
    /// The opposite sign.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Zpos => Self::Neg,
            Self::Neg => Self::Zpos,
        }
    }
}

/// Arbitrary-precision signed integer in sign-magnitude form.
///
/// Each value exclusively owns its digit buffer and wipes it when dropped.
/// Arithmetic never aliases: operations read their operands by reference
/// and hand back a fresh value, and the `*_assign` forms update in place.
#[derive(Clone, Default)]
pub struct Mpi {
    sign: Sign,
    dp: DigitVec,
}

impl Mpi {
    /// The value zero, without allocating.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sign: Sign::Zpos,
            dp: DigitVec::new(),
        }
    }

    /// The value zero with room for `capacity` digits.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`] if the allocation fails.
    pub fn with_capacity(capacity: usize) -> MpResult<Self> {
        Ok(Self {
            sign: Sign::Zpos,
            dp: DigitVec::with_capacity(capacity)?,
        })
    }

    /// Builds a non-negative value from a `u64`.
    #[must_use]
    pub fn from_u64(v: u64) -> Self {
        Self {
            sign: Sign::Zpos,
            dp: DigitVec::from_word(v),
        }
    }

    /// Builds a value from an `i64`.
    #[must_use]
    pub fn from_i64(v: i64) -> Self {
        let mut m = Self::from_u64(v.unsigned_abs());
        if v < 0 {
            m.sign = Sign::Neg;
        }
        m
    }

    pub(crate) fn from_parts(sign: Sign, mut dp: DigitVec) -> Self {
        dp.clamp();
        let sign = if dp.is_zero() { Sign::Zpos } else { sign };
        Self { sign, dp }
    }

    pub(crate) const fn mag(&self) -> &DigitVec {
        &self.dp
    }

    /// Replaces the value with `v`.
    pub fn set_int(&mut self, v: i64) {
        *self = Self::from_i64(v);
    }

    /// Resets the value to zero, wiping the digits.
    pub fn zero(&mut self) {
        self.dp.clear();
        self.sign = Sign::Zpos;
    }

    /// The sign of the value.
    #[must_use]
    pub const fn sign(&self) -> Sign {
        self.sign
    }

    /// Digits of the magnitude, least significant first.
    #[must_use]
    pub fn digits(&self) -> &[Digit] {
        self.dp.digits()
    }

    /// Number of digits in use.
    #[must_use]
    pub const fn used(&self) -> usize {
        self.dp.used()
    }

    /// Number of digits allocated.
    #[must_use]
    pub fn alloc(&self) -> usize {
        self.dp.alloc()
    }

    /// `true` for zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.dp.is_zero()
    }

    /// `true` for strictly negative values.
    #[must_use]
    pub fn is_neg(&self) -> bool {
        self.sign == Sign::Neg
    }

    /// `true` when the magnitude is odd.
    #[must_use]
    pub fn is_odd(&self) -> bool {
        self.dp.digit(0) & 1 == 1
    }

    /// `true` when the magnitude is even (zero included).
    #[must_use]
    pub fn is_even(&self) -> bool {
        !self.is_odd()
    }

    /// Number of significant bits in the magnitude; zero for zero.
    #[must_use]
    pub fn count_bits(&self) -> usize {
        match self.dp.digits().last() {
            None => 0,
            Some(top) => (self.dp.used() - 1) * DIGIT_BIT + (DIGIT_BIT - top.leading_zeros() as usize),
        }
    }

    /// Number of trailing zero bits of the magnitude; zero for zero.
    #[must_use]
    pub fn trailing_zeros(&self) -> usize {
        self.dp
            .digits()
            .iter()
            .position(|&d| d != 0)
            .map_or(0, |i| i * DIGIT_BIT + self.dp.digit(i).trailing_zeros() as usize)
    }

    /// Bit `i` of the magnitude.
    #[must_use]
    pub fn bit(&self, i: usize) -> bool {
        (self.dp.digit(i / DIGIT_BIT) >> (i % DIGIT_BIT)) & 1 == 1
    }

    /// The value as a `u64`, if it is non-negative and fits.
    #[must_use]
    pub fn to_u64(&self) -> Option<u64> {
        if self.is_neg() || self.dp.used() > 2 {
            return None;
        }
        Some(Word::from(self.dp.digit(0)) | (Word::from(self.dp.digit(1)) << DIGIT_BIT))
    }

    /// Absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        let mut r = self.clone();
        r.sign = Sign::Zpos;
        r
    }

    /// Additive inverse.
    #[must_use]
    pub fn neg(&self) -> Self {
        let mut r = self.clone();
        if !r.is_zero() {
            r.sign = r.sign.flip();
        }
        r
    }

    /// Compares magnitudes, ignoring sign.
    #[must_use]
    pub fn cmp_mag(&self, other: &Self) -> Ordering {
        cmp_digits(self.dp.digits(), other.dp.digits())
    }

    /// Compares against a single non-negative digit.
    #[must_use]
    pub fn cmp_d(&self, d: Digit) -> Ordering {
        if self.is_neg() {
            return Ordering::Less;
        }
        cmp_digits(self.dp.digits(), if d == 0 { &[] } else { std::slice::from_ref(&d) })
    }

    /// Compares against zero.
    #[must_use]
    pub fn cmp_z(&self) -> Ordering {
        match (self.is_zero(), self.sign) {
            (true, _) => Ordering::Equal,
            (false, Sign::Zpos) => Ordering::Greater,
            (false, Sign::Neg) => Ordering::Less,
        }
    }
}

/// Compares two clamped magnitudes.
pub(crate) fn cmp_digits(a: &[Digit], b: &[Digit]) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.iter().rev().cmp(b.iter().rev()))
}

impl PartialEq for Mpi {
    fn eq(&self, other: &Self) -> bool {
        self.sign == other.sign && self.dp.digits() == other.dp.digits()
    }
}

impl Eq for Mpi {}

impl PartialOrd for Mpi {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Mpi {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.sign, other.sign) {
            (Sign::Zpos, Sign::Neg) => Ordering::Greater,
            (Sign::Neg, Sign::Zpos) => Ordering::Less,
            (Sign::Zpos, Sign::Zpos) => self.cmp_mag(other),
            (Sign::Neg, Sign::Neg) => other.cmp_mag(self),
        }
    }
}

impl From<u32> for Mpi {
    fn from(v: u32) -> Self {
        Self::from_u64(u64::from(v))
    }
}

impl From<u64> for Mpi {
    fn from(v: u64) -> Self {
        Self::from_u64(v)
    }
}

impl From<i64> for Mpi {
    fn from(v: i64) -> Self {
        Self::from_i64(v)
    }
}

impl fmt::Debug for Mpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mpi({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_positive() {
        let z = Mpi::from_i64(0);
        assert_eq!(z.sign(), Sign::Zpos);
        assert_eq!(z.neg().sign(), Sign::Zpos);
    }

    #[test]
    fn ordering_is_signed() {
        let a = Mpi::from_i64(-5);
        let b = Mpi::from_i64(3);
        assert!(a < b);
        assert_eq!(a.cmp_mag(&b), Ordering::Greater);
        assert!(Mpi::from_i64(-7) < Mpi::from_i64(-2));
    }

    #[test]
    fn bit_queries() {
        let v = Mpi::from_u64(0b1011_0000);
        assert_eq!(v.count_bits(), 8);
        assert_eq!(v.trailing_zeros(), 4);
        assert!(v.bit(4));
        assert!(!v.bit(6));
        assert_eq!(Mpi::from_u64(1 << 40).trailing_zeros(), 40);
    }

    #[test]
    fn to_u64_rejects_negatives() {
        assert_eq!(Mpi::from_u64(u64::MAX).to_u64(), Some(u64::MAX));
        assert_eq!(Mpi::from_i64(-1).to_u64(), None);
    }

    #[test]
    fn cmp_d_and_cmp_z() {
        assert_eq!(Mpi::from_u64(70).cmp_d(70), Ordering::Equal);
        assert_eq!(Mpi::from_i64(-1).cmp_d(0), Ordering::Less);
        assert_eq!(Mpi::new().cmp_d(0), Ordering::Equal);
        assert_eq!(Mpi::from_i64(-9).cmp_z(), Ordering::Less);
    }
}
