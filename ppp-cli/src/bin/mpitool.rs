// File:    mpitool.rs
// Author:  apezoo
// Date:    2025-08-07
//
// Description: The mpitool command: modular arithmetic and prime generation on arbitrary-precision integers.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! `mpitool`, a calculator for the `ppp-mpi` integers.

use std::process::ExitCode;
use std::time::Instant;

use clap::{ArgAction, Parser, Subcommand};
use log::{error, info};
use ppp_mpi::prime::{DEFAULT_ROUNDS, random_prime};
use ppp_mpi::{MpError, MpResult, Mpi, find_next_prime, is_probably_prime};

#[derive(Parser)]
#[command(author, version, about = "Arbitrary-precision modular arithmetic and prime generation", long_about = None)]
#[command(
    after_help = "Numbers are decimal, or hexadecimal with a 0x prefix.\n\nEXAMPLES:\n  \n# 4^13 mod 497\nmpitool exptmod 4 13 497\n\n# A 512-bit safe prime, printed in hex\nmpitool --radix 16 prime-gen 512 --strong"
)]
struct Cli {
    /// Radix for printed results
    #[arg(short, long, global = true, default_value_t = 10, value_parser = clap::value_parser!(u32).range(2..=64))]
    radix: u32,

    /// Log timings and search progress
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute A^B mod M
    Exptmod { a: String, b: String, m: String },
    /// Compute the inverse of A modulo M
    Invmod { a: String, m: String },
    /// Greatest common divisor of A and B
    Gcd { a: String, b: String },
    /// Product of A and B
    Mul { a: String, b: String },
    /// Test N for primality
    IsPrime {
        n: String,
        /// Miller-Rabin rounds
        #[arg(long, default_value_t = DEFAULT_ROUNDS)]
        rounds: usize,
    },
    /// Find the first prime at or above START
    MakePrime {
        start: String,
        /// Require (p - 1) / 2 to be prime as well
        #[arg(long)]
        strong: bool,
        /// Miller-Rabin rounds
        #[arg(long, default_value_t = DEFAULT_ROUNDS)]
        rounds: usize,
    },
    /// Generate random primes of BITS bits
    PrimeGen {
        bits: usize,
        /// How many primes to generate
        #[arg(short, long, default_value_t = 1)]
        count: usize,
        /// Require (p - 1) / 2 to be prime as well
        #[arg(long)]
        strong: bool,
        /// Miller-Rabin rounds
        #[arg(long, default_value_t = DEFAULT_ROUNDS)]
        rounds: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose > 0 { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> MpResult<()> {
    let print = |value: &Mpi| -> MpResult<()> {
        println!("{}", value.to_radix(cli.radix)?);
        Ok(())
    };

    match &cli.command {
        Commands::Exptmod { a, b, m } => print(&parse_number(a)?.exptmod(&parse_number(b)?, &parse_number(m)?)?),
        Commands::Invmod { a, m } => print(&parse_number(a)?.invmod(&parse_number(m)?)?),
        Commands::Gcd { a, b } => print(&parse_number(a)?.gcd(&parse_number(b)?)?),
        Commands::Mul { a, b } => print(&parse_number(a)?.mul(&parse_number(b)?)?),
        Commands::IsPrime { n, rounds } => {
            let n = parse_number(n)?;
            let verdict = if is_probably_prime(&n, *rounds)?.is_prime() {
                "probably prime"
            } else {
                "composite"
            };
            println!("{verdict}");
            Ok(())
        }
        Commands::MakePrime { start, strong, rounds } => {
            let started = Instant::now();
            let p = find_next_prime(&parse_number(start)?, *rounds, *strong)?;
            info!("search took {:?}", started.elapsed());
            print(&p)
        }
        Commands::PrimeGen {
            bits,
            count,
            strong,
            rounds,
        } => {
            let mut rng = rand::rng();
            for _ in 0..*count {
                let started = Instant::now();
                let p = random_prime(*bits, *rounds, *strong, &mut rng)?;
                info!("{bits}-bit prime in {:?}", started.elapsed());
                print(&p)?;
            }
            Ok(())
        }
    }
}

/// Decimal, or hexadecimal after `0x`; either may start with `-`.
fn parse_number(text: &str) -> MpResult<Mpi> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => Mpi::read_radix(hex, 16)?,
        None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => Mpi::read_radix(digits, 10)?,
        None => return Err(MpError::InvalidArgument("expected a decimal or 0x-prefixed number")),
    };
    Ok(if negative { value.neg() } else { value })
}
