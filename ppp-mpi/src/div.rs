// File:    div.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: Truncating long division (Knuth algorithm D) and the remainder forms built on it.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

#![allow(clippy::cast_possible_truncation)]

use std::cmp::Ordering;

use zeroize::Zeroizing;

use crate::digits::{DIGIT_BIT, Digit, DigitVec, RADIX, Word};
use crate::error::{MpError, MpResult};
use crate::int::{Mpi, Sign, cmp_digits};

/// Divides a magnitude by one digit, returning the quotient and remainder.
fn mag_divrem_d(a: &[Digit], d: Digit) -> MpResult<(DigitVec, Digit)> {
    let mut q = DigitVec::with_capacity(a.len())?;
    q.set_used(a.len())?;
    let dst = q.digits_mut();

    let mut rem: Word = 0;
    for i in (0..a.len()).rev() {
        let cur = (rem << DIGIT_BIT) | Word::from(a[i]);
        dst[i] = (cur / Word::from(d)) as Digit;
        rem = cur % Word::from(d);
    }
    q.clamp();
    Ok((q, rem as Digit))
}

/// Magnitude long division `a / b`, `b` non-empty.
fn mag_divrem(a: &[Digit], b: &[Digit]) -> MpResult<(DigitVec, DigitVec)> {
    if cmp_digits(a, b) == Ordering::Less {
        return Ok((DigitVec::new(), DigitVec::from_digits(a)?));
    }
    if let [d] = b {
        let (q, r) = mag_divrem_d(a, *d)?;
        return Ok((q, DigitVec::from_word(Word::from(r))));
    }

    let n = b.len();
    let m = a.len();
    // Normalise so the divisor's top digit has its high bit set.
    let s = b[n - 1].leading_zeros() as usize;
    let vn = Zeroizing::new(shl_exact(b, s, n));
    let mut un = Zeroizing::new(shl_exact(a, s, m + 1));

    let mut q = DigitVec::with_capacity(m - n + 1)?;
    q.set_used(m - n + 1)?;

    let top = Word::from(vn[n - 1]);
    let next = Word::from(vn[n - 2]);
    for j in (0..=m - n).rev() {
        let num = (Word::from(un[j + n]) << DIGIT_BIT) | Word::from(un[j + n - 1]);
        let mut qhat = num / top;
        let mut rhat = num % top;
        while qhat >= RADIX || qhat * next > ((rhat << DIGIT_BIT) | Word::from(un[j + n - 2])) {
            qhat -= 1;
            rhat += top;
            if rhat >= RADIX {
                break;
            }
        }

        // un[j..=j+n] -= qhat * vn
        let mut carry: Word = 0;
        let mut borrow: Word = 0;
        for i in 0..n {
            let p = qhat * Word::from(vn[i]) + carry;
            carry = p >> DIGIT_BIT;
            let (digit, b) = sub_with_borrow(un[i + j], (p & (RADIX - 1)) + borrow);
            un[i + j] = digit;
            borrow = b;
        }
        let (digit, negative) = sub_with_borrow(un[j + n], carry + borrow);
        un[j + n] = digit;

        if negative == 1 {
            qhat -= 1;
            let mut c: Word = 0;
            for i in 0..n {
                let t = Word::from(un[i + j]) + Word::from(vn[i]) + c;
                un[i + j] = t as Digit;
                c = t >> DIGIT_BIT;
            }
            un[j + n] = un[j + n].wrapping_add(c as Digit);
        }
        q.digits_mut()[j] = qhat as Digit;
    }
    q.clamp();

    let mut r = DigitVec::from_digits(&un[..n])?;
    if s > 0 {
        r = crate::arith::mag_shr(r.digits(), s)?;
    }
    Ok((q, r))
}

/// `cur - sub` as a digit plus the outgoing borrow; `sub <= RADIX`.
fn sub_with_borrow(cur: Digit, sub: Word) -> (Digit, Word) {
    let cur = Word::from(cur);
    if cur >= sub {
        ((cur - sub) as Digit, 0)
    } else {
        ((cur + RADIX - sub) as Digit, 1)
    }
}

/// Shifts left by `s < DIGIT_BIT` into a buffer of exactly `len` digits.
fn shl_exact(a: &[Digit], s: usize, len: usize) -> Vec<Digit> {
    let mut out = vec![0; len];
    if s == 0 {
        out[..a.len()].copy_from_slice(a);
        return out;
    }
    let mut carry: Digit = 0;
    for (i, &d) in a.iter().enumerate() {
        out[i] = (d << s) | carry;
        carry = d >> (DIGIT_BIT - s);
    }
    if a.len() < len {
        out[a.len()] = carry;
    }
    out
}

impl Mpi {
    /// Truncating division: returns `(q, r)` with `q * b + r == self` and
    /// `|r| < |b|`. The remainder takes the sign of `self`.
    ///
    /// # Errors
    ///
    /// [`MpError::DivideByZero`] if `b` is zero, or
    /// [`MpError::OutOfMemory`].
    pub fn div(&self, b: &Self) -> MpResult<(Self, Self)> {
        if b.is_zero() {
            return Err(MpError::DivideByZero);
        }
        let (q, r) = mag_divrem(self.digits(), b.digits())?;
        let qsign = if self.sign() == b.sign() { Sign::Zpos } else { Sign::Neg };
        Ok((Self::from_parts(qsign, q), Self::from_parts(self.sign(), r)))
    }

    /// Remainder with the sign of the divisor: the result lies in `[0, m)`
    /// for positive `m` and in `(m, 0]` for negative `m`.
    ///
    /// # Errors
    ///
    /// [`MpError::DivideByZero`] if `m` is zero, or
    /// [`MpError::OutOfMemory`].
    pub fn modulo(&self, m: &Self) -> MpResult<Self> {
        let (_, r) = self.div(m)?;
        if !r.is_zero() && r.sign() != m.sign() {
            return r.add(m);
        }
        Ok(r)
    }

    /// Divides by a single digit; the quotient truncates toward zero and the
    /// remainder is the magnitude remainder.
    ///
    /// # Errors
    ///
    /// [`MpError::DivideByZero`] if `d` is zero, or
    /// [`MpError::OutOfMemory`].
    pub fn div_d(&self, d: Digit) -> MpResult<(Self, Digit)> {
        if d == 0 {
            return Err(MpError::DivideByZero);
        }
        let (q, r) = mag_divrem_d(self.digits(), d)?;
        Ok((Self::from_parts(self.sign(), q), r))
    }

    /// `self mod d` in `[0, d)`.
    ///
    /// # Errors
    ///
    /// [`MpError::DivideByZero`] if `d` is zero, or
    /// [`MpError::OutOfMemory`].
    pub fn mod_d(&self, d: Digit) -> MpResult<Digit> {
        let (_, r) = self.div_d(d)?;
        if self.is_neg() && r != 0 {
            return Ok(d - r);
        }
        Ok(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: i64) -> Mpi {
        Mpi::from_i64(v)
    }

    #[test]
    fn remainder_follows_dividend() {
        let (q, r) = n(-7).div(&n(2)).unwrap();
        assert_eq!((q, r), (n(-3), n(-1)));
        let (q, r) = n(7).div(&n(-2)).unwrap();
        assert_eq!((q, r), (n(-3), n(1)));
    }

    #[test]
    fn modulo_follows_divisor() {
        assert_eq!(n(-7).modulo(&n(5)).unwrap(), n(3));
        assert_eq!(n(7).modulo(&n(-5)).unwrap(), n(-3));
        assert_eq!(n(10).modulo(&n(5)).unwrap(), n(0));
    }

    #[test]
    fn division_by_zero_is_reported() {
        assert_eq!(n(1).div(&n(0)), Err(MpError::DivideByZero));
        assert_eq!(n(1).mod_d(0), Err(MpError::DivideByZero));
    }

    #[test]
    fn multi_digit_division_needs_qhat_correction() {
        // Divisor top digit is small so normalisation shifts by many bits.
        let a: Mpi = "340282366920938463463374607431768211455".parse().unwrap();
        let b: Mpi = "18446744073709551629".parse().unwrap();
        let (q, r) = a.div(&b).unwrap();
        assert_eq!(q.mul(&b).unwrap().add(&r).unwrap(), a);
        assert_eq!(r.cmp_mag(&b), Ordering::Less);
    }

    #[test]
    fn digit_division() {
        let (q, r) = n(-71).div_d(7).unwrap();
        assert_eq!((q, r), (n(-10), 1));
        assert_eq!(n(-71).mod_d(7).unwrap(), 6);
    }
}
