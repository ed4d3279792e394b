// File:    arith.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: Sign-magnitude addition, subtraction, multiplication and power-of-two scaling.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

#![allow(clippy::cast_possible_truncation)]

use std::cmp::Ordering;

use crate::digits::{DIGIT_BIT, Digit, DigitVec, RADIX, Word};
use crate::error::MpResult;
use crate::int::{Mpi, Sign, cmp_digits};

// ---- magnitude kernels ------------------------------------------------------

/// `|a| + |b|`.
pub(crate) fn mag_add(a: &[Digit], b: &[Digit]) -> MpResult<DigitVec> {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut out = DigitVec::with_capacity(long.len() + 1)?;
    out.set_used(long.len() + 1)?;
    let dst = out.digits_mut();

    let mut carry: Word = 0;
    for (i, &d) in long.iter().enumerate() {
        let s = Word::from(d) + Word::from(short.get(i).copied().unwrap_or(0)) + carry;
        dst[i] = s as Digit;
        carry = s >> DIGIT_BIT;
    }
    dst[long.len()] = carry as Digit;
    out.clamp();
    Ok(out)
}

/// `|a| - |b|`; requires `|a| >= |b|`.
pub(crate) fn mag_sub(a: &[Digit], b: &[Digit]) -> MpResult<DigitVec> {
    debug_assert!(cmp_digits(a, b) != Ordering::Less);
    let mut out = DigitVec::with_capacity(a.len())?;
    out.set_used(a.len())?;
    let dst = out.digits_mut();

    let mut borrow: Word = 0;
    for (i, &d) in a.iter().enumerate() {
        let t = Word::from(d) + RADIX - Word::from(b.get(i).copied().unwrap_or(0)) - borrow;
        dst[i] = t as Digit;
        borrow = Word::from(t < RADIX);
    }
    out.clamp();
    Ok(out)
}

/// Schoolbook `|a| * |b|`.
pub(crate) fn mag_mul(a: &[Digit], b: &[Digit]) -> MpResult<DigitVec> {
    if a.is_empty() || b.is_empty() {
        return Ok(DigitVec::new());
    }
    let mut out = DigitVec::with_capacity(a.len() + b.len())?;
    out.set_used(a.len() + b.len())?;
    let dst = out.digits_mut();

    for (i, &x) in a.iter().enumerate() {
        if x == 0 {
            continue;
        }
        let mut carry: Word = 0;
        for (j, &y) in b.iter().enumerate() {
            let t = Word::from(x) * Word::from(y) + Word::from(dst[i + j]) + carry;
            dst[i + j] = t as Digit;
            carry = t >> DIGIT_BIT;
        }
        dst[i + b.len()] = carry as Digit;
    }
    out.clamp();
    Ok(out)
}

/// `|a| * d`.
pub(crate) fn mag_mul_d(a: &[Digit], d: Digit) -> MpResult<DigitVec> {
    let mut out = DigitVec::with_capacity(a.len() + 1)?;
    out.set_used(a.len() + 1)?;
    let dst = out.digits_mut();

    let mut carry: Word = 0;
    for (i, &x) in a.iter().enumerate() {
        let t = Word::from(x) * Word::from(d) + carry;
        dst[i] = t as Digit;
        carry = t >> DIGIT_BIT;
    }
    dst[a.len()] = carry as Digit;
    out.clamp();
    Ok(out)
}

/// `|a| << bits`.
pub(crate) fn mag_shl(a: &[Digit], bits: usize) -> MpResult<DigitVec> {
    if a.is_empty() {
        return Ok(DigitVec::new());
    }
    let (words, shift) = (bits / DIGIT_BIT, bits % DIGIT_BIT);
    let len = a.len() + words + 1;
    let mut out = DigitVec::with_capacity(len)?;
    out.set_used(len)?;
    let dst = out.digits_mut();

    if shift == 0 {
        dst[words..words + a.len()].copy_from_slice(a);
    } else {
        let mut carry: Digit = 0;
        for (i, &d) in a.iter().enumerate() {
            dst[words + i] = (d << shift) | carry;
            carry = d >> (DIGIT_BIT - shift);
        }
        dst[words + a.len()] = carry;
    }
    out.clamp();
    Ok(out)
}

/// `|a| >> bits`.
pub(crate) fn mag_shr(a: &[Digit], bits: usize) -> MpResult<DigitVec> {
    let (words, shift) = (bits / DIGIT_BIT, bits % DIGIT_BIT);
    if words >= a.len() {
        return Ok(DigitVec::new());
    }
    let src = &a[words..];
    let mut out = DigitVec::with_capacity(src.len())?;
    out.set_used(src.len())?;
    let dst = out.digits_mut();

    if shift == 0 {
        dst.copy_from_slice(src);
    } else {
        for i in 0..src.len() {
            let hi = src.get(i + 1).map_or(0, |&n| n << (DIGIT_BIT - shift));
            dst[i] = (src[i] >> shift) | hi;
        }
    }
    out.clamp();
    Ok(out)
}

/// `|a| mod 2^bits`.
pub(crate) fn mag_low_bits(a: &[Digit], bits: usize) -> MpResult<DigitVec> {
    let (words, shift) = (bits / DIGIT_BIT, bits % DIGIT_BIT);
    if words >= a.len() {
        return DigitVec::from_digits(a);
    }
    let mut out = DigitVec::from_digits(&a[..=words])?;
    if out.used() > words {
        out.digits_mut()[words] &= (1 << shift) - 1;
    }
    out.clamp();
    Ok(out)
}

/// Signed addition of two (sign, magnitude) pairs.
fn signed_add(sa: Sign, a: &[Digit], sb: Sign, b: &[Digit]) -> MpResult<Mpi> {
    if sa == sb {
        return Ok(Mpi::from_parts(sa, mag_add(a, b)?));
    }
    match cmp_digits(a, b) {
        Ordering::Less => Ok(Mpi::from_parts(sb, mag_sub(b, a)?)),
        _ => Ok(Mpi::from_parts(sa, mag_sub(a, b)?)),
    }
}

const fn sign_of_product(a: Sign, b: Sign) -> Sign {
    match (a, b) {
        (Sign::Zpos, Sign::Zpos) | (Sign::Neg, Sign::Neg) => Sign::Zpos,
        _ => Sign::Neg,
    }
}

impl Mpi {
    /// `self + b`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`] if the result cannot be allocated.
    pub fn add(&self, b: &Self) -> MpResult<Self> {
        signed_add(self.sign(), self.digits(), b.sign(), b.digits())
    }

    /// `self - b`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`] if the result cannot be allocated.
    pub fn sub(&self, b: &Self) -> MpResult<Self> {
        signed_add(self.sign(), self.digits(), b.sign().flip(), b.digits())
    }

    /// `self += b`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`]; `self` is left unchanged.
    pub fn add_assign(&mut self, b: &Self) -> MpResult<()> {
        *self = self.add(b)?;
        Ok(())
    }

    /// `self -= b`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`]; `self` is left unchanged.
    pub fn sub_assign(&mut self, b: &Self) -> MpResult<()> {
        *self = self.sub(b)?;
        Ok(())
    }

    /// `self + d` for a single digit.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`] if the result cannot be allocated.
    pub fn add_d(&self, d: Digit) -> MpResult<Self> {
        signed_add(self.sign(), self.digits(), Sign::Zpos, digit_slice(&d))
    }

    /// `self - d` for a single digit.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`] if the result cannot be allocated.
    pub fn sub_d(&self, d: Digit) -> MpResult<Self> {
        signed_add(self.sign(), self.digits(), Sign::Neg, digit_slice(&d))
    }

    /// `self += d`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`]; `self` is left unchanged.
    pub fn add_d_assign(&mut self, d: Digit) -> MpResult<()> {
        *self = self.add_d(d)?;
        Ok(())
    }

    /// `self -= d`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`]; `self` is left unchanged.
    pub fn sub_d_assign(&mut self, d: Digit) -> MpResult<()> {
        *self = self.sub_d(d)?;
        Ok(())
    }

    /// `self * b`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`] if the result cannot be allocated.
    pub fn mul(&self, b: &Self) -> MpResult<Self> {
        Ok(Self::from_parts(
            sign_of_product(self.sign(), b.sign()),
            mag_mul(self.digits(), b.digits())?,
        ))
    }

    /// `self * self`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`] if the result cannot be allocated.
    pub fn sqr(&self) -> MpResult<Self> {
        Ok(Self::from_parts(Sign::Zpos, mag_mul(self.digits(), self.digits())?))
    }

    /// `self * d` for a single digit.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`] if the result cannot be allocated.
    pub fn mul_d(&self, d: Digit) -> MpResult<Self> {
        Ok(Self::from_parts(self.sign(), mag_mul_d(self.digits(), d)?))
    }

    /// `self * 2^bits`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`] if the result cannot be allocated.
    pub fn mul_2d(&self, bits: usize) -> MpResult<Self> {
        Ok(Self::from_parts(self.sign(), mag_shl(self.digits(), bits)?))
    }

    /// Divides by `2^bits`, truncating toward zero.
    ///
    /// Returns `(q, r)` with `q * 2^bits + r == self`; `r` carries the sign
    /// of `self`, matching [`Mpi::div`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`] if a result cannot be allocated.
    pub fn div_2d(&self, bits: usize) -> MpResult<(Self, Self)> {
        let q = Self::from_parts(self.sign(), mag_shr(self.digits(), bits)?);
        let r = Self::from_parts(self.sign(), mag_low_bits(self.digits(), bits)?);
        Ok((q, r))
    }

    /// The remainder of [`Mpi::div_2d`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`] if the result cannot be allocated.
    pub fn mod_2d(&self, bits: usize) -> MpResult<Self> {
        Ok(Self::from_parts(self.sign(), mag_low_bits(self.digits(), bits)?))
    }

    /// `self * 2`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`] if the result cannot be allocated.
    pub fn mul_2(&self) -> MpResult<Self> {
        self.mul_2d(1)
    }

    /// `self / 2`, truncating toward zero.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MpError::OutOfMemory`] if the result cannot be allocated.
    pub fn div_2(&self) -> MpResult<Self> {
        Ok(Self::from_parts(self.sign(), mag_shr(self.digits(), 1)?))
    }
}

fn digit_slice(d: &Digit) -> &[Digit] {
    if *d == 0 { &[] } else { std::slice::from_ref(d) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: i64) -> Mpi {
        Mpi::from_i64(v)
    }

    #[test]
    fn add_carries_across_digits() {
        let a = Mpi::from_u64(u64::from(u32::MAX));
        let s = a.add(&n(1)).unwrap();
        assert_eq!(s.to_u64(), Some(1 << 32));
        assert_eq!(s.used(), 2);
    }

    #[test]
    fn sub_swaps_when_minuend_is_smaller() {
        assert_eq!(n(3).sub(&n(10)).unwrap(), n(-7));
        assert_eq!(n(-3).sub(&n(-10)).unwrap(), n(7));
        assert_eq!(n(5).sub(&n(5)).unwrap().sign(), Sign::Zpos);
    }

    #[test]
    fn digit_forms() {
        assert_eq!(n(-1).add_d(1).unwrap(), n(0));
        assert_eq!(n(0).sub_d(1).unwrap(), n(-1));
        let mut x = n(99);
        x.add_d_assign(1).unwrap();
        x.sub_d_assign(30).unwrap();
        assert_eq!(x, n(70));
    }

    #[test]
    fn mul_sign_is_xor_and_zero_is_positive() {
        assert_eq!(n(-6).mul(&n(7)).unwrap(), n(-42));
        assert_eq!(n(-6).mul(&n(-7)).unwrap(), n(42));
        assert_eq!(n(-6).mul(&n(0)).unwrap().sign(), Sign::Zpos);
        assert_eq!(n(-9).sqr().unwrap(), n(81));
    }

    #[test]
    fn shifts_truncate_toward_zero() {
        let (q, r) = n(-13).div_2d(2).unwrap();
        assert_eq!(q, n(-3));
        assert_eq!(r, n(-1));
        assert_eq!(n(5).mul_2d(70).unwrap().div_2d(70).unwrap().0, n(5));
        assert_eq!(n(0x1234).mod_2d(8).unwrap(), n(0x34));
        assert_eq!(n(7).mul_2().unwrap().div_2().unwrap(), n(7));
    }
}
