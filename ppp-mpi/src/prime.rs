// File:    prime.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: Probabilistic primality testing and prime search.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Primality engine.
//!
//! Candidates go through trial division by the primes below 1024, a base-2
//! Fermat test and finally Miller–Rabin with random bases. A strong prime
//! here is a prime `p` for which `(p - 1) / 2` is prime as well.

use std::cmp::Ordering;

use log::debug;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::digits::Digit;
use crate::error::{MpError, MpResult};
use crate::int::Mpi;

/// Number of Miller–Rabin rounds used when the caller does not choose.
pub const DEFAULT_ROUNDS: usize = 5;

/// Every prime below 1024.
pub const SMALL_PRIMES: [Digit; 172] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37,
    41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151,
    157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223,
    227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281,
    283, 293, 307, 311, 313, 317, 331, 337, 347, 349, 353, 359,
    367, 373, 379, 383, 389, 397, 401, 409, 419, 421, 431, 433,
    439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503,
    509, 521, 523, 541, 547, 557, 563, 569, 571, 577, 587, 593,
    599, 601, 607, 613, 617, 619, 631, 641, 643, 647, 653, 659,
    661, 673, 677, 683, 691, 701, 709, 719, 727, 733, 739, 743,
    751, 757, 761, 769, 773, 787, 797, 809, 811, 821, 823, 827,
    829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911,
    919, 929, 937, 941, 947, 953, 967, 971, 977, 983, 991, 997,
    1009, 1013, 1019, 1021,
];

/// Verdict of a probabilistic primality test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primality {
    /// Passed every test; prime with overwhelming probability.
    Prime,
    /// Definitely composite (or less than 2).
    Composite,
}

impl Primality {
    /// `true` for [`Primality::Prime`].
    #[must_use]
    pub fn is_prime(self) -> bool {
        self == Self::Prime
    }
}

/// The first table prime that divides `n`, ignoring `n` itself.
///
/// # Errors
///
/// [`MpError::OutOfMemory`].
pub fn divisible_by_small_prime(n: &Mpi) -> MpResult<Option<Digit>> {
    for &p in &SMALL_PRIMES {
        if n.cmp_mag(&Mpi::from(p)) == Ordering::Equal {
            continue;
        }
        if n.mod_d(p)? == 0 {
            return Ok(Some(p));
        }
    }
    Ok(None)
}

/// Fermat test: `base^(n-1) mod n == 1`.
///
/// # Errors
///
/// [`MpError::DivideByZero`] if `n` is zero, or [`MpError::OutOfMemory`].
pub fn fermat(n: &Mpi, base: Digit) -> MpResult<bool> {
    let exp = n.sub_d(1)?;
    let r = Mpi::from(base).exptmod(&exp, n)?;
    Ok(r.cmp_d(1) == Ordering::Equal)
}

/// A uniformly random value in `[0, bound)`, `bound > 0`.
fn random_below<R: RngCore + ?Sized>(bound: &Mpi, rng: &mut R) -> MpResult<Mpi> {
    // Eight spare bytes keep the modulo bias below 2^-64.
    let mut bytes = Zeroizing::new(vec![0u8; bound.unsigned_byte_len() + 8]);
    rng.fill_bytes(&mut bytes);
    Mpi::read_unsigned_bytes(&bytes)?.modulo(bound)
}

/// Miller–Rabin with `rounds` random bases drawn from `[2, n - 2]`.
///
/// `n` must be odd and at least 5.
///
/// # Errors
///
/// [`MpError::InvalidArgument`] for `n` outside that domain, or
/// [`MpError::OutOfMemory`].
pub fn miller_rabin<R: RngCore + ?Sized>(n: &Mpi, rounds: usize, rng: &mut R) -> MpResult<bool> {
    if n.is_even() || n.cmp_d(5) == Ordering::Less {
        return Err(MpError::InvalidArgument("miller-rabin needs an odd n >= 5"));
    }
    let n_minus_1 = n.sub_d(1)?;
    let s = n_minus_1.trailing_zeros();
    let (d, _) = n_minus_1.div_2d(s)?;
    let span = n.sub_d(3)?;

    'witness: for _ in 0..rounds {
        let a = random_below(&span, rng)?.add_d(2)?;
        let mut x = a.exptmod(&d, n)?;
        if x.cmp_d(1) == Ordering::Equal || x == n_minus_1 {
            continue;
        }
        for _ in 1..s {
            x = x.sqrmod(n)?;
            if x == n_minus_1 {
                continue 'witness;
            }
            if x.cmp_d(1) == Ordering::Equal {
                return Ok(false);
            }
        }
        return Ok(false);
    }
    Ok(true)
}

/// Full test with the thread-local CSPRNG supplying witnesses.
///
/// # Errors
///
/// [`MpError::OutOfMemory`].
pub fn is_probably_prime(n: &Mpi, rounds: usize) -> MpResult<Primality> {
    is_probably_prime_with(n, rounds, &mut rand::rng())
}

/// Trial division, then Fermat base 2, then `rounds` of Miller–Rabin.
///
/// # Errors
///
/// [`MpError::OutOfMemory`].
pub fn is_probably_prime_with<R: RngCore + ?Sized>(
    n: &Mpi,
    rounds: usize,
    rng: &mut R,
) -> MpResult<Primality> {
    if n.is_neg() || n.cmp_d(2) == Ordering::Less {
        return Ok(Primality::Composite);
    }
    if n.cmp_d(1024) == Ordering::Less {
        let small = n.to_u64().and_then(|v| Digit::try_from(v).ok());
        return Ok(match small {
            Some(v) if SMALL_PRIMES.contains(&v) => Primality::Prime,
            _ => Primality::Composite,
        });
    }
    if divisible_by_small_prime(n)?.is_some() || !fermat(n, 2)? {
        return Ok(Primality::Composite);
    }
    if miller_rabin(n, rounds, rng)? {
        Ok(Primality::Prime)
    } else {
        Ok(Primality::Composite)
    }
}

/// Searches upward from `|start|` for the next (probable) prime.
///
/// With `strong`, candidates are kept at `p ≡ 3 (mod 4)` and stepped by four
/// so `q = (p - 1) / 2` stays odd; `q` is trial-divided before `p` is tested
/// and fully tested after `p` passes.
///
/// # Errors
///
/// [`MpError::OutOfMemory`].
pub fn find_next_prime(start: &Mpi, rounds: usize, strong: bool) -> MpResult<Mpi> {
    find_next_prime_with(start, rounds, strong, &mut rand::rng())
}

/// [`find_next_prime`] with a caller-supplied witness source.
///
/// # Errors
///
/// [`MpError::OutOfMemory`].
pub fn find_next_prime_with<R: RngCore + ?Sized>(
    start: &Mpi,
    rounds: usize,
    strong: bool,
    rng: &mut R,
) -> MpResult<Mpi> {
    let mut p = start.abs();
    if p.is_even() {
        p.add_d_assign(1)?;
    }
    if strong && p.mod_d(4)? == 1 {
        p.add_d_assign(2)?;
    }
    let step = if strong { 4 } else { 2 };

    let mut tried = 0usize;
    loop {
        tried += 1;
        if strong {
            let q = p.div_2()?;
            let q_ok = q.cmp_d(2) != Ordering::Less && divisible_by_small_prime(&q)?.is_none();
            if q_ok
                && is_probably_prime_with(&p, rounds, rng)?.is_prime()
                && is_probably_prime_with(&q, rounds, rng)?.is_prime()
            {
                break;
            }
        } else if is_probably_prime_with(&p, rounds, rng)?.is_prime() {
            break;
        }
        p.add_d_assign(step)?;
    }
    debug!("prime search finished after {tried} candidates ({} bits)", p.count_bits());
    Ok(p)
}

/// Draws a random `bits`-bit starting point (top bit set, and `…11` low
/// bits when `strong`) and returns the next prime at or above it.
///
/// # Errors
///
/// [`MpError::InvalidArgument`] if `bits < 3`, or
/// [`MpError::OutOfMemory`].
pub fn random_prime<R: RngCore + ?Sized>(
    bits: usize,
    rounds: usize,
    strong: bool,
    rng: &mut R,
) -> MpResult<Mpi> {
    if bits < 3 {
        return Err(MpError::InvalidArgument("prime needs at least 3 bits"));
    }
    let mut bytes = Zeroizing::new(vec![0u8; bits.div_ceil(8)]);
    rng.fill_bytes(&mut bytes);

    let top_bits = bits - 8 * (bytes.len() - 1);
    bytes[0] &= u8::MAX >> (8 - top_bits);
    bytes[0] |= 1 << (top_bits - 1);
    let last = bytes.len() - 1;
    bytes[last] |= if strong { 0b11 } else { 0b1 };

    let start = Mpi::read_unsigned_bytes(&bytes)?;
    find_next_prime_with(&start, rounds, strong, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn table_is_complete() {
        assert_eq!(SMALL_PRIMES.len(), 172);
        assert_eq!(SMALL_PRIMES[SMALL_PRIMES.len() - 1], 1021);
    }

    #[test]
    fn small_prime_division_skips_self() {
        assert_eq!(divisible_by_small_prime(&Mpi::from_u64(97)).unwrap(), None);
        assert_eq!(divisible_by_small_prime(&Mpi::from_u64(91)).unwrap(), Some(7));
    }

    #[test]
    fn fermat_base_two() {
        assert!(fermat(&Mpi::from_u64(7919), 2).unwrap());
        assert!(!fermat(&Mpi::from_u64(7917), 2).unwrap());
    }

    #[test]
    fn miller_rabin_rejects_carmichael() {
        let mut rng = StdRng::seed_from_u64(7);
        // 561 = 3 * 11 * 17, a Carmichael number.
        assert!(!miller_rabin(&Mpi::from_u64(561), 10, &mut rng).unwrap());
        assert!(miller_rabin(&Mpi::from_u64(7919), 10, &mut rng).unwrap());
        assert!(miller_rabin(&Mpi::from_u64(4), 1, &mut rng).is_err());
    }

    #[test]
    fn random_prime_has_requested_size() {
        let mut rng = StdRng::seed_from_u64(42);
        let p = random_prime(64, DEFAULT_ROUNDS, false, &mut rng).unwrap();
        assert!(p.count_bits() >= 64);
        assert!(is_probably_prime_with(&p, DEFAULT_ROUNDS, &mut rng).unwrap().is_prime());
    }
}
