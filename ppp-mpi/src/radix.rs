// File:    radix.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: Text conversion in radix 2..=64 and big-endian byte conversion.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use std::fmt;
use std::str::FromStr;

use crate::arith::{mag_add, mag_mul_d};
use crate::digits::{DIGIT_BIT, Digit, DigitVec};
use crate::error::{MpError, MpResult};
use crate::int::{Mpi, Sign};

/// Digit symbols, in value order, shared by every radix.
pub const RADIX_ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz+/";

/// Smallest supported radix.
pub const MIN_RADIX: u32 = 2;
/// Largest supported radix.
pub const MAX_RADIX: u32 = 64;

const fn check_radix(radix: u32) -> MpResult<()> {
    if radix < MIN_RADIX || radix > MAX_RADIX {
        return Err(MpError::InvalidRadix);
    }
    Ok(())
}

/// Value of `c` in `radix`, or `None` if `c` is not a digit there.
fn digit_value(c: u8, radix: u32) -> Option<u32> {
    let c = if radix <= 36 { c.to_ascii_uppercase() } else { c };
    let v = RADIX_ALPHABET.iter().position(|&s| s == c)?;
    let v = u32::try_from(v).ok()?;
    (v < radix).then_some(v)
}

impl Mpi {
    /// Parses `text` in `radix` (2..=64). An optional leading `-` is
    /// accepted; bases up to 36 ignore letter case.
    ///
    /// # Errors
    ///
    /// [`MpError::InvalidRadix`] for an unsupported radix, an empty digit
    /// string, or a character that is not a digit in `radix`.
    pub fn read_radix(text: &str, radix: u32) -> MpResult<Self> {
        check_radix(radix)?;
        let (sign, body) = text
            .strip_prefix('-')
            .map_or((Sign::Zpos, text), |rest| (Sign::Neg, rest));
        if body.is_empty() {
            return Err(MpError::InvalidRadix);
        }

        let mut acc = DigitVec::new();
        for c in body.bytes() {
            let v = digit_value(c, radix).ok_or(MpError::InvalidRadix)?;
            let scaled = mag_mul_d(acc.digits(), radix)?;
            acc = mag_add(scaled.digits(), DigitVec::from_word(u64::from(v)).digits())?;
        }
        Ok(Self::from_parts(sign, acc))
    }

    /// Renders the value in `radix`: upper-case letters for bases up to 36,
    /// a leading `-` for negatives, `"0"` for zero.
    ///
    /// # Errors
    ///
    /// [`MpError::InvalidRadix`] for an unsupported radix, or
    /// [`MpError::OutOfMemory`].
    pub fn to_radix(&self, radix: u32) -> MpResult<String> {
        check_radix(radix)?;
        if self.is_zero() {
            return Ok("0".to_owned());
        }
        let mut out = Vec::with_capacity(self.radix_size(radix)?);
        let mut cur = self.abs();
        while !cur.is_zero() {
            let (q, r) = cur.div_d(radix)?;
            out.push(RADIX_ALPHABET[r as usize]);
            cur = q;
        }
        if self.is_neg() {
            out.push(b'-');
        }
        out.reverse();
        Ok(out.into_iter().map(char::from).collect())
    }

    /// Upper bound on the length of [`Mpi::to_radix`] output, sign included.
    ///
    /// # Errors
    ///
    /// [`MpError::InvalidRadix`] for an unsupported radix.
    pub fn radix_size(&self, radix: u32) -> MpResult<usize> {
        check_radix(radix)?;
        let bits_per_char = radix.ilog2() as usize;
        Ok(self.count_bits().div_ceil(bits_per_char).max(1) + 1)
    }

    /// Reads a non-negative value from big-endian bytes.
    ///
    /// # Errors
    ///
    /// [`MpError::OutOfMemory`].
    pub fn read_unsigned_bytes(bytes: &[u8]) -> MpResult<Self> {
        let per = DIGIT_BIT / 8;
        let mut dv = DigitVec::with_capacity(bytes.len().div_ceil(per))?;
        dv.set_used(bytes.len().div_ceil(per))?;
        let dst = dv.digits_mut();
        for (i, &b) in bytes.iter().rev().enumerate() {
            dst[i / per] |= Digit::from(b) << (8 * (i % per));
        }
        Ok(Self::from_parts(Sign::Zpos, dv))
    }

    /// Bytes needed for the magnitude; zero for zero.
    #[must_use]
    pub fn unsigned_byte_len(&self) -> usize {
        self.count_bits().div_ceil(8)
    }

    /// Big-endian magnitude with no leading zero bytes (empty for zero).
    #[must_use]
    pub fn to_unsigned_bytes(&self) -> Vec<u8> {
        let len = self.unsigned_byte_len();
        let mut out = vec![0; len];
        self.fill_be(&mut out);
        out
    }

    /// Writes the magnitude big-endian into `out`, left-padded with zeros.
    ///
    /// # Errors
    ///
    /// [`MpError::InvalidArgument`] if the magnitude needs more than
    /// `out.len()` bytes; `out` is left untouched in that case.
    pub fn to_unsigned_bytes_fixed(&self, out: &mut [u8]) -> MpResult<()> {
        if self.unsigned_byte_len() > out.len() {
            return Err(MpError::InvalidArgument("value does not fit in buffer"));
        }
        out.fill(0);
        self.fill_be(out);
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn fill_be(&self, out: &mut [u8]) {
        let per = DIGIT_BIT / 8;
        let n = out.len();
        for i in 0..self.unsigned_byte_len().min(n) {
            out[n - 1 - i] = (self.mag().digit(i / per) >> (8 * (i % per))) as u8;
        }
    }

    /// Decimal text with `group` inserted every three digits from the right,
    /// e.g. `1,234,567`. For display only.
    ///
    /// # Errors
    ///
    /// [`MpError::OutOfMemory`].
    pub fn to_grouped_decimal(&self, group: Option<char>) -> MpResult<String> {
        let plain = self.abs().to_radix(10)?;
        let Some(sep) = group else {
            return self.to_radix(10);
        };
        let mut out = String::with_capacity(plain.len() + plain.len() / 3 + 1);
        if self.is_neg() {
            out.push('-');
        }
        for (i, c) in plain.chars().enumerate() {
            if i > 0 && (plain.len() - i) % 3 == 0 {
                out.push(sep);
            }
            out.push(c);
        }
        Ok(out)
    }
}

impl fmt::Display for Mpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_radix(10).map_err(|_| fmt::Error)?;
        f.pad_integral(!self.is_neg(), "", text.trim_start_matches('-'))
    }
}

impl FromStr for Mpi {
    type Err = MpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::read_radix(s, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_case_depends_on_radix() {
        assert_eq!(Mpi::read_radix("ff", 16).unwrap(), Mpi::from_u64(255));
        assert_eq!(Mpi::read_radix("a", 64).unwrap(), Mpi::from_u64(36));
        assert_eq!(Mpi::from_u64(255).to_radix(16).unwrap(), "FF");
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(Mpi::read_radix("", 10), Err(MpError::InvalidRadix));
        assert_eq!(Mpi::read_radix("-", 10), Err(MpError::InvalidRadix));
        assert_eq!(Mpi::read_radix("12", 65), Err(MpError::InvalidRadix));
        assert_eq!(Mpi::read_radix("19", 8), Err(MpError::InvalidRadix));
        assert_eq!(Mpi::read_radix("1 2", 10), Err(MpError::InvalidRadix));
    }

    #[test]
    fn minus_one_in_radix_64() {
        assert_eq!(Mpi::read_radix("-1", 64).unwrap(), Mpi::from_i64(-1));
        assert_eq!(Mpi::from_i64(-1).to_radix(64).unwrap(), "-1");
    }

    #[test]
    fn bytes_are_big_endian() {
        let v = Mpi::read_unsigned_bytes(&[0x01, 0x02, 0x03, 0x04, 0x05]).unwrap();
        assert_eq!(v.to_u64(), Some(0x01_0203_0405));
        assert_eq!(v.to_unsigned_bytes(), vec![1, 2, 3, 4, 5]);
        let mut fixed = [0xAA; 8];
        v.to_unsigned_bytes_fixed(&mut fixed).unwrap();
        assert_eq!(fixed, [0, 0, 0, 1, 2, 3, 4, 5]);
        let mut small = [0; 2];
        assert!(v.to_unsigned_bytes_fixed(&mut small).is_err());
        assert!(Mpi::new().to_unsigned_bytes().is_empty());
    }

    #[test]
    fn grouped_decimal() {
        let v = Mpi::from_i64(-1_234_567);
        assert_eq!(v.to_grouped_decimal(Some(',')).unwrap(), "-1,234,567");
        assert_eq!(Mpi::from_u64(123).to_grouped_decimal(Some(',')).unwrap(), "123");
        assert_eq!(v.to_grouped_decimal(None).unwrap(), "-1234567");
    }

    #[test]
    fn display_pads_like_integers() {
        assert_eq!(format!("{:>5}", Mpi::from_u64(42)), "   42");
        assert_eq!(format!("{}", Mpi::from_i64(-7)), "-7");
    }
}
