// File:    modular.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: Modular arithmetic, exponentiation, gcd and modular inverse.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use std::cmp::Ordering;

use crate::digits::Digit;
use crate::error::{MpError, MpResult};
use crate::int::Mpi;

impl Mpi {
    /// `(self + b) mod m`.
    ///
    /// # Errors
    ///
    /// [`MpError::DivideByZero`] if `m` is zero, or [`MpError::OutOfMemory`].
    pub fn addmod(&self, b: &Self, m: &Self) -> MpResult<Self> {
        self.add(b)?.modulo(m)
    }

    /// `(self - b) mod m`.
    ///
    /// # Errors
    ///
    /// [`MpError::DivideByZero`] if `m` is zero, or [`MpError::OutOfMemory`].
    pub fn submod(&self, b: &Self, m: &Self) -> MpResult<Self> {
        self.sub(b)?.modulo(m)
    }

    /// `(self * b) mod m`.
    ///
    /// # Errors
    ///
    /// [`MpError::DivideByZero`] if `m` is zero, or [`MpError::OutOfMemory`].
    pub fn mulmod(&self, b: &Self, m: &Self) -> MpResult<Self> {
        self.mul(b)?.modulo(m)
    }

    /// `self^2 mod m`.
    ///
    /// # Errors
    ///
    /// [`MpError::DivideByZero`] if `m` is zero, or [`MpError::OutOfMemory`].
    pub fn sqrmod(&self, m: &Self) -> MpResult<Self> {
        self.sqr()?.modulo(m)
    }

    /// `self^exp mod m` by left-to-right binary exponentiation.
    ///
    /// The result is reduced into `[0, m)` for positive `m`.
    ///
    /// # Errors
    ///
    /// * [`MpError::DivideByZero`] if `m` is zero.
    /// * [`MpError::InvalidArgument`] if `exp` is negative.
    /// * [`MpError::OutOfMemory`].
    pub fn exptmod(&self, exp: &Self, m: &Self) -> MpResult<Self> {
        if m.is_zero() {
            return Err(MpError::DivideByZero);
        }
        if exp.is_neg() {
            return Err(MpError::InvalidArgument("negative exponent"));
        }
        let base = self.modulo(m)?;
        let mut acc = Self::from_u64(1).modulo(m)?;
        for i in (0..exp.count_bits()).rev() {
            acc = acc.sqrmod(m)?;
            if exp.bit(i) {
                acc = acc.mulmod(&base, m)?;
            }
        }
        Ok(acc)
    }

    /// `self^d mod m` for a single-digit exponent.
    ///
    /// # Errors
    ///
    /// As [`Mpi::exptmod`].
    pub fn exptmod_d(&self, d: Digit, m: &Self) -> MpResult<Self> {
        self.exptmod(&Self::from(d), m)
    }

    /// `self^exp` without reduction.
    ///
    /// # Errors
    ///
    /// [`MpError::InvalidArgument`] if `exp` is negative, or
    /// [`MpError::OutOfMemory`].
    pub fn expt(&self, exp: &Self) -> MpResult<Self> {
        if exp.is_neg() {
            return Err(MpError::InvalidArgument("negative exponent"));
        }
        let mut acc = Self::from_u64(1);
        for i in (0..exp.count_bits()).rev() {
            acc = acc.sqr()?;
            if exp.bit(i) {
                acc = acc.mul(self)?;
            }
        }
        Ok(acc)
    }

    /// `self^d` for a single-digit exponent.
    ///
    /// # Errors
    ///
    /// [`MpError::OutOfMemory`].
    pub fn expt_d(&self, d: Digit) -> MpResult<Self> {
        self.expt(&Self::from(d))
    }

    /// Greatest common divisor of the magnitudes, computed with the binary
    /// method. `gcd(0, b) == |b|`.
    ///
    /// # Errors
    ///
    /// [`MpError::OutOfMemory`].
    pub fn gcd(&self, b: &Self) -> MpResult<Self> {
        if self.is_zero() {
            return Ok(b.abs());
        }
        if b.is_zero() {
            return Ok(self.abs());
        }
        let mut u = self.abs();
        let mut v = b.abs();
        let shift = u.trailing_zeros().min(v.trailing_zeros());
        u = u.div_2d(u.trailing_zeros())?.0;
        v = v.div_2d(shift)?.0;

        while !v.is_zero() {
            v = v.div_2d(v.trailing_zeros())?.0;
            if u.cmp_mag(&v) == Ordering::Greater {
                std::mem::swap(&mut u, &mut v);
            }
            v = v.sub(&u)?;
        }
        u.mul_2d(shift)
    }

    /// Least common multiple of the magnitudes; zero if either is zero.
    ///
    /// # Errors
    ///
    /// [`MpError::OutOfMemory`].
    pub fn lcm(&self, b: &Self) -> MpResult<Self> {
        if self.is_zero() || b.is_zero() {
            return Ok(Self::new());
        }
        let g = self.gcd(b)?;
        Ok(self.abs().div(&g)?.0.mul(&b.abs())?)
    }

    /// Extended Euclid: returns `(g, x, y)` with `self*x + b*y == g` and
    /// `g = gcd(self, b) >= 0`.
    ///
    /// # Errors
    ///
    /// [`MpError::OutOfMemory`].
    pub fn xgcd(&self, b: &Self) -> MpResult<(Self, Self, Self)> {
        let (mut r0, mut r1) = (self.clone(), b.clone());
        let (mut x0, mut x1) = (Self::from_u64(1), Self::new());
        let (mut y0, mut y1) = (Self::new(), Self::from_u64(1));

        while !r1.is_zero() {
            let (q, r) = r0.div(&r1)?;
            r0 = std::mem::replace(&mut r1, r);
            let x = x0.sub(&q.mul(&x1)?)?;
            x0 = std::mem::replace(&mut x1, x);
            let y = y0.sub(&q.mul(&y1)?)?;
            y0 = std::mem::replace(&mut y1, y);
        }
        if r0.is_neg() {
            return Ok((r0.neg(), x0.neg(), y0.neg()));
        }
        Ok((r0, x0, y0))
    }

    /// Multiplicative inverse of `self` modulo `m`, in `[0, m)`.
    ///
    /// # Errors
    ///
    /// * [`MpError::DivideByZero`] if `m` is zero.
    /// * [`MpError::InvalidArgument`] if `m` is negative.
    /// * [`MpError::Undefined`] if `gcd(self, m) != 1`.
    /// * [`MpError::OutOfMemory`].
    pub fn invmod(&self, m: &Self) -> MpResult<Self> {
        if m.is_zero() {
            return Err(MpError::DivideByZero);
        }
        if m.is_neg() {
            return Err(MpError::InvalidArgument("negative modulus"));
        }
        let a = self.modulo(m)?;
        let (g, x, _) = a.xgcd(m)?;
        if g.cmp_d(1) != Ordering::Equal {
            return Err(MpError::Undefined);
        }
        x.modulo(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: i64) -> Mpi {
        Mpi::from_i64(v)
    }

    #[test]
    fn exptmod_small_cases() {
        assert_eq!(n(4).exptmod(&n(13), &n(497)).unwrap(), n(445));
        assert_eq!(n(-2).exptmod(&n(3), &n(5)).unwrap(), n(2));
        assert_eq!(n(7).exptmod(&n(0), &n(1)).unwrap(), n(0));
        assert_eq!(n(2).exptmod(&n(-1), &n(5)), Err(MpError::InvalidArgument("negative exponent")));
        assert_eq!(n(2).exptmod(&n(1), &n(0)), Err(MpError::DivideByZero));
    }

    #[test]
    fn gcd_and_lcm() {
        assert_eq!(n(0).gcd(&n(-12)).unwrap(), n(12));
        assert_eq!(n(48).gcd(&n(-180)).unwrap(), n(12));
        assert_eq!(n(4).lcm(&n(6)).unwrap(), n(12));
    }

    #[test]
    fn xgcd_satisfies_bezout() {
        let (a, b) = (n(240), n(46));
        let (g, x, y) = a.xgcd(&b).unwrap();
        assert_eq!(g, n(2));
        assert_eq!(a.mul(&x).unwrap().add(&b.mul(&y).unwrap()).unwrap(), g);
    }

    #[test]
    fn invmod_cases() {
        assert_eq!(n(3).invmod(&n(11)).unwrap(), n(4));
        assert_eq!(n(-3).invmod(&n(11)).unwrap(), n(7));
        assert_eq!(n(6).invmod(&n(9)), Err(MpError::Undefined));
        assert_eq!(n(6).invmod(&n(-9)), Err(MpError::InvalidArgument("negative modulus")));
    }
}
