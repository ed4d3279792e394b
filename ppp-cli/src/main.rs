// File:    main.rs
// Author:  apezoo
// Date:    2025-08-07
//
// Description: The pppauth command: key management, passcard printing, skipping and login.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! `pppauth`, the command-line front end for Perfect Paper Passwords.

use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};
use log::{error, info};
use ppp_core::card::{PasscodeId, first_index_of, parse_card_number};
use ppp_core::key_generator::{random_sequence_key, sequence_key_from_passphrase};
use ppp_core::print::{PrintedCard, render_html_page, render_text_card};
use ppp_core::state_manager::{open_engine, resolve_key_dir};
use ppp_core::{
    Aes256Cipher, Alphabet, KeyStore, KeyVersion, MemoryStore, PasscodeGenerator, PppEngine, PppError,
    PppFlags, StateStore,
};
use ppp_mpi::{MpError, Mpi};
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(author, version, about = "Perfect Paper Passwords: one-time passcodes on printed cards", long_about = None)]
#[command(
    after_help = "EXAMPLES:\n  \n# Generate a new key\npppauth key\n\n# Print the next three passcards\npppauth text --next 3\n\n# Skip to the first passcode of card 12\npppauth skip --card 12\n\n# Show a single passcode\npppauth text --passcode 3B[12]\n\n# Try the algorithm without touching your key\npppauth --passphrase \"zombie\" text --card 1"
)]
struct Cli {
    /// Directory holding the key files. Defaults to $PPP_KEY_DIR, then ~/.pppauth.
    #[arg(long, global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Use the key of another user (/home/<USER>/.pppauth).
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Use a temporary key derived from PHRASE. It is never saved.
    #[arg(long, global = true, value_name = "PHRASE")]
    passphrase: Option<String>,

    /// Key version for --passphrase keys.
    #[arg(long, global = true, hide = true, value_name = "N")]
    use_version: Option<u32>,

    /// Characters passcodes are drawn from (at least 64, printable ASCII).
    #[arg(short, long, global = true)]
    alphabet: Option<String>,

    /// Host name printed on passcards.
    #[arg(short = 'm', long, global = true)]
    name: Option<String>,

    /// Log what is happening; repeat for more detail.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new random sequence key and save it
    Key {
        /// Keep the passcode after a failed login instead of moving on
        #[arg(long)]
        dont_skip: bool,
        /// Show the passcode while it is typed
        #[arg(long)]
        show_passcode: bool,
        /// Replace an existing key
        #[arg(long)]
        force: bool,
        /// Use time-varying passcodes
        #[arg(long)]
        time: bool,
    },
    /// Skip forward to a passcard or a passcode
    #[command(group(ArgGroup::new("target").required(true).args(["card", "passcode"])))]
    Skip {
        /// 1-based passcard number
        #[arg(short, long, value_name = "NUM")]
        card: Option<String>,
        /// Passcode id, e.g. 3B[12]
        #[arg(short, long, value_name = "RRC[NNNN]")]
        passcode: Option<String>,
    },
    /// Print passcards or a single passcode as text
    Text {
        #[command(flatten)]
        select: CardSelection,
        /// Print only this passcode (`current` for the next one due)
        #[arg(short, long, value_name = "RRC[NNNN]", conflicts_with_all = ["next", "card"])]
        passcode: Option<String>,
    },
    /// Write printable HTML passcards
    Html {
        #[command(flatten)]
        select: CardSelection,
        /// Write to FILE instead of standard output
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Show the key version, next passcode and printed passcodes left
    Status,
    /// Ask for the next passcode on stderr and check the answer from stdin
    Login,
}

#[derive(Args)]
struct CardSelection {
    /// Print the next N passcards (1 to 100) after the last one printed
    #[arg(
        long,
        value_name = "N",
        num_args = 0..=1,
        default_missing_value = "1",
        value_parser = clap::value_parser!(u32).range(1..=100)
    )]
    next: Option<u32>,
    /// 1-based passcard number (the first of --next cards with --passphrase)
    #[arg(short, long, value_name = "NUM")]
    card: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Ppp(#[from] PppError),
    #[error(transparent)]
    Mpi(#[from] MpError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Usage(&'static str),
}

type CliResult<T> = Result<T, CliError>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(mut cli: Cli) -> CliResult<ExitCode> {
    let passphrase = cli.passphrase.take().map(Zeroizing::new);
    if cli.use_version.is_some() && passphrase.is_none() {
        return Err(CliError::Usage("--use-version only applies to --passphrase keys"));
    }
    let alphabet = cli.alphabet.as_deref().map(Alphabet::custom).transpose()?;
    let host = host_name(cli.name.as_deref());

    if let Commands::Key {
        dont_skip,
        show_passcode,
        force,
        time,
    } = cli.command
    {
        if passphrase.is_some() {
            return Err(CliError::Usage("--passphrase keys are never saved; drop it to generate a key"));
        }
        if time && !cfg!(feature = "time-based") {
            return Err(CliError::Usage("time-based passcodes need pppauth built with the `time-based` feature"));
        }
        let flags = PppFlags::empty()
            .with(PppFlags::DONT_SKIP_ON_FAILURES, dont_skip)
            .with(PppFlags::SHOW_PASSCODE, show_passcode)
            .with(PppFlags::TIME_BASED, time);
        let dir = resolve_key_dir(cli.dir.as_deref(), cli.user.as_deref());
        return generate_key(dir, flags, force);
    }

    if let Some(phrase) = passphrase {
        let version = match cli.use_version {
            Some(n) => KeyVersion::from_number(n)?,
            None => KeyVersion::current(),
        };
        info!("using a temporary version {version} key from the passphrase");
        let key = sequence_key_from_passphrase(&phrase, version)?;
        let alphabet = alphabet.unwrap_or_else(|| Alphabet::for_version(version));
        let generator = PasscodeGenerator::new(Aes256Cipher, &key, version, alphabet)?;
        let mut engine = PppEngine::new(generator, PppFlags::empty(), MemoryStore::default())?;
        execute(&cli.command, &mut engine, false, &host)
    } else {
        let dir = resolve_key_dir(cli.dir.as_deref(), cli.user.as_deref());
        info!("using key in {}", dir.display());
        let mut engine = open_engine(KeyStore::open(dir), alphabet)?;
        execute(&cli.command, &mut engine, true, &host)
    }
}

fn generate_key(dir: PathBuf, flags: PppFlags, force: bool) -> CliResult<ExitCode> {
    let version = KeyVersion::current();
    let key = random_sequence_key(version)?;
    let mut store = KeyStore::open(dir);
    store.create(&key, version, flags, force)?;
    println!("New sequence key saved in {}", store.dir().display());
    println!("Print passcards now, e.g. `pppauth text --next 3`.");
    Ok(ExitCode::SUCCESS)
}

/// Runs a command against a loaded key. `stored` is false for passphrase
/// keys, whose counters live only as long as the process.
fn execute<S: StateStore>(
    command: &Commands,
    engine: &mut PppEngine<Aes256Cipher, S>,
    stored: bool,
    host: &str,
) -> CliResult<ExitCode> {
    match command {
        Commands::Key { .. } => Err(CliError::Usage("key generation does not use a loaded key")),
        Commands::Skip { card, passcode } => {
            if !stored {
                return Err(CliError::Usage("skip needs a stored key"));
            }
            let target = match (card, passcode) {
                (_, Some(id)) => PasscodeId::parse(id)?.to_index()?,
                (Some(card), None) => first_index_of(&parse_card_number(card)?)?,
                (None, None) => return Err(CliError::Usage("skip needs --card or --passcode")),
            };
            engine.skip_to(&target)?;
            println!("Next passcode is {}", engine.current_code()?);
            print_warnings(engine)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Text { select, passcode } => {
            if let Some(id) = passcode {
                let id = if id.eq_ignore_ascii_case("current") {
                    engine.current_code()?
                } else {
                    PasscodeId::parse(id)?
                };
                println!("{}", engine.generator().passcode(&id.to_index()?)?);
                return Ok(ExitCode::SUCCESS);
            }
            let mut out = io::stdout().lock();
            for card in select_cards(engine, select, stored)? {
                let printed = PrintedCard::derive(engine.generator(), &card)?;
                out.write_all(render_text_card(&printed, host)?.as_bytes())?;
            }
            out.flush()?;
            if stored {
                print_warnings(engine)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Html { select, output } => {
            let printed = select_cards(engine, select, stored)?
                .iter()
                .map(|card| PrintedCard::derive(engine.generator(), card))
                .collect::<Result<Vec<_>, _>>()?;
            let page = render_html_page(&printed, host)?;
            match output {
                Some(path) => {
                    fs::write(path, page.as_bytes())?;
                    info!("wrote {} passcards to {}", printed.len(), path.display());
                }
                None => io::stdout().lock().write_all(page.as_bytes())?,
            }
            if stored {
                print_warnings(engine)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status => {
            let report = engine.status()?;
            let flags = engine.flags();
            println!("Key version:            {}", report.key_version);
            println!("Next passcode:          {}", report.current_passcode);
            println!("Printed passcodes left: {}", report.remaining_printed);
            println!(
                "Last card printed:      {}",
                report.last_card_printed.as_deref().unwrap_or("none")
            );
            println!(
                "Skip on failed login:   {}",
                yes_no(!flags.contains(PppFlags::DONT_SKIP_ON_FAILURES))
            );
            println!("Show typed passcode:    {}", yes_no(flags.contains(PppFlags::SHOW_PASSCODE)));
            if report.locking_failed {
                println!("Locking:                unavailable");
            }
            if stored {
                print_warnings(engine)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Login => login(engine, stored),
    }
}

/// Reserves the passcode (unless failures must not burn it), prompts on
/// stderr and checks one line from stdin.
fn login<S: StateStore>(engine: &mut PppEngine<Aes256Cipher, S>, stored: bool) -> CliResult<ExitCode> {
    let flags = engine.flags();
    let counter_based = !(cfg!(feature = "time-based") && flags.contains(PppFlags::TIME_BASED));
    if counter_based && !flags.contains(PppFlags::DONT_SKIP_ON_FAILURES) {
        engine.reserve()?;
    }

    let mut stderr = io::stderr();
    write!(stderr, "{}", engine.prompt()?)?;
    stderr.flush()?;

    let mut line = Zeroizing::new(String::new());
    io::stdin().lock().read_line(&mut line)?;
    let attempt = line.trim_end_matches(['\r', '\n']);

    if engine.authenticate(attempt)? {
        println!("Passcode accepted.");
        if stored {
            print_warnings(engine)?;
        }
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("Passcode rejected.");
        Ok(ExitCode::FAILURE)
    }
}

/// Cards chosen by `--next` / `--card`, 0-based. `--next` on a stored key
/// claims the cards after the last one printed.
fn select_cards<S: StateStore>(
    engine: &mut PppEngine<Aes256Cipher, S>,
    select: &CardSelection,
    stored: bool,
) -> CliResult<Vec<Mpi>> {
    match (select.next, select.card.as_deref()) {
        (Some(n), None) if stored => Ok(engine.next_cards(n as usize)?),
        (Some(_), None) => Err(CliError::Usage("--next with --passphrase needs --card to start from")),
        (Some(n), Some(card)) => {
            let first = parse_card_number(card)?;
            Ok((0..n).map(|i| first.add_d(i)).collect::<Result<_, _>>()?)
        }
        (None, Some(card)) => Ok(vec![parse_card_number(card)?]),
        (None, None) => Err(CliError::Usage("choose cards with --next or --card")),
    }
}

fn print_warnings<S: StateStore>(engine: &PppEngine<Aes256Cipher, S>) -> CliResult<()> {
    for warning in engine.warnings()? {
        eprintln!("{warning}");
    }
    Ok(())
}

const fn yes_no(on: bool) -> &'static str {
    if on { "yes" } else { "no" }
}

/// `--name`, else `$HOSTNAME`, else `/etc/hostname`, else `localhost`.
fn host_name(explicit: Option<&str>) -> String {
    if let Some(name) = explicit {
        return name.to_owned();
    }
    env::var("HOSTNAME")
        .ok()
        .or_else(|| fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_owned())
}
