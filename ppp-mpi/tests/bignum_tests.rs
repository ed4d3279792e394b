#![allow(missing_docs, clippy::unwrap_used)]

use ppp_mpi::prime::{DEFAULT_ROUNDS, find_next_prime_with, is_probably_prime_with};
use ppp_mpi::{MpError, Mpi, Primality, find_next_prime, is_probably_prime};
use rand::SeedableRng;
use rand::rngs::StdRng;

const SAFE_PRIME_512: &str = "9582535973407425186579183154514758625751914972353549439218944780464277226186306031159665062086496644812853707403588489800067024524885346893789376151479063";

#[test]
fn modulo_and_division_identity() {
    let a = Mpi::from_i64(-1234);
    let m = Mpi::from_u64(97);
    let r = a.modulo(&m).unwrap();
    assert!(!r.is_neg() && r < m);

    let (q, r) = a.div(&m).unwrap();
    assert_eq!(q.mul(&m).unwrap().add(&r).unwrap(), a);
}

#[test]
fn exptmod_reduces_into_modulus() {
    let b = Mpi::from_u64(3);
    let m = Mpi::from_u64(1_000_000_007);
    let mut expected = Mpi::from_u64(1);
    for _ in 0..20 {
        expected = expected.mulmod(&b, &m).unwrap();
    }
    assert_eq!(b.exptmod(&Mpi::from_u64(20), &m).unwrap(), expected);
}

#[test]
fn invmod_small_and_undefined() {
    assert_eq!(Mpi::from_u64(3).invmod(&Mpi::from_u64(11)).unwrap(), Mpi::from_u64(4));
    assert_eq!(Mpi::from_u64(4).invmod(&Mpi::from_u64(8)), Err(MpError::Undefined));
    assert_eq!(Mpi::from_u64(4).invmod(&Mpi::new()), Err(MpError::DivideByZero));
}

#[test]
fn radix_round_trip_of_specific_values() {
    let huge: Mpi = SAFE_PRIME_512.parse().unwrap();
    for v in [Mpi::new(), Mpi::from_i64(-1), Mpi::from_i64(-987_654_321), huge.clone(), huge.neg()] {
        for base in [2, 8, 10, 16, 64] {
            let text = v.to_radix(base).unwrap();
            assert_eq!(Mpi::read_radix(&text, base).unwrap(), v, "base {base}: {text}");
        }
    }
    assert_eq!(
        huge.to_radix(16).unwrap(),
        "B6F675CD03CE9DEBD1C4BB281DB208EB2A6330BABB3B93F03031D023125F2057A47E104825165E6618B8FFA14D4748A0CA264E1C4D3C1A6FE54E9BC8A5CEE317"
    );
}

#[test]
fn invalid_text_leaves_no_partial_value() {
    assert_eq!(Mpi::read_radix("12x4", 10), Err(MpError::InvalidRadix));
    assert_eq!("".parse::<Mpi>(), Err(MpError::InvalidRadix));
}

#[test]
fn primality_verdicts() {
    for c in [0u64, 1, 4, 15, 91, 561, 1_000_001] {
        assert_eq!(is_probably_prime(&Mpi::from_u64(c), DEFAULT_ROUNDS).unwrap(), Primality::Composite, "{c}");
    }
    for p in [2u64, 97, 1021, 7919, 1_000_000_007] {
        assert_eq!(is_probably_prime(&Mpi::from_u64(p), DEFAULT_ROUNDS).unwrap(), Primality::Prime, "{p}");
    }
}

#[test]
fn safe_prime_512_is_strong() {
    let mut rng = StdRng::seed_from_u64(1);
    let p: Mpi = SAFE_PRIME_512.parse().unwrap();
    assert!(is_probably_prime_with(&p, DEFAULT_ROUNDS, &mut rng).unwrap().is_prime());
    let q = p.sub_d(1).unwrap().div_2().unwrap();
    assert!(is_probably_prime_with(&q, DEFAULT_ROUNDS, &mut rng).unwrap().is_prime());
    assert_eq!(p.count_bits(), 512);
}

#[test]
fn next_prime_searches_upward() {
    assert_eq!(find_next_prime(&Mpi::from_u64(90), DEFAULT_ROUNDS, false).unwrap(), Mpi::from_u64(97));
    assert_eq!(find_next_prime(&Mpi::from_i64(-14), DEFAULT_ROUNDS, false).unwrap(), Mpi::from_u64(17));
    assert_eq!(find_next_prime(&Mpi::from_u64(1_000_000_000), DEFAULT_ROUNDS, false).unwrap(), Mpi::from_u64(1_000_000_007));
}

#[test]
fn strong_search_yields_safe_primes() {
    let mut rng = StdRng::seed_from_u64(9);
    assert_eq!(find_next_prime_with(&Mpi::new(), DEFAULT_ROUNDS, true, &mut rng).unwrap(), Mpi::from_u64(7));
    // 23 = 2*11 + 1, 47 = 2*23 + 1
    assert_eq!(find_next_prime_with(&Mpi::from_u64(20), DEFAULT_ROUNDS, true, &mut rng).unwrap(), Mpi::from_u64(23));
    assert_eq!(find_next_prime_with(&Mpi::from_u64(24), DEFAULT_ROUNDS, true, &mut rng).unwrap(), Mpi::from_u64(47));
}

#[test]
fn grouped_display_of_card_numbers() {
    assert_eq!(Mpi::from_u64(1_234_567_890).to_grouped_decimal(Some(',')).unwrap(), "1,234,567,890");
}
