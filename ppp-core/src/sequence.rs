// File:    sequence.rs
// Author:  apezoo
// Date:    2025-08-05
//
// Description: The passcode sequence state machine: reservation, authentication, skipping and warnings.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Sequence bookkeeping.
//!
//! Passcodes are consumed strictly in order. Every mutation runs inside
//! [`StateStore::transact`], which holds the store lock, re-reads the
//! persisted counters, applies the change and writes it back, so two
//! logins racing for the same code cannot both succeed.

use std::fmt;

use log::{debug, info, warn};
use ppp_mpi::Mpi;
use serde::Serialize;

use crate::card::{CODES_PER_CARD, PasscodeId, card_of, first_index_of};
use crate::crypto::BlockCipher;
use crate::derivation::PasscodeGenerator;
use crate::error::{PppError, PppResult};
use crate::version::{CURRENT_PPP_VERSION, KeyVersion};

/// Threshold below which the critical warning replaces the last-card one.
pub const CRITICAL_REMAINING: u32 = 14;

/// Most cards one printing run may claim.
pub const MAX_CARDS_PER_RUN: usize = 100;

/// Behaviour flags stored in the key-file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PppFlags(u16);

impl PppFlags {
    /// Set on every file written by a flag-aware version.
    pub const FLAGS_PRESENT: Self = Self(0x1);
    /// A failed attempt does not burn the passcode.
    pub const DONT_SKIP_ON_FAILURES: Self = Self(0x2);
    /// Passcodes are indexed by time rather than by a counter.
    pub const TIME_BASED: Self = Self(0x4);
    /// Echo the passcode while it is typed.
    pub const SHOW_PASSCODE: Self = Self(0x8);

    /// No flags.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Builds flags from their stored bits.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// The stored bits.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// `true` if every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets the bits of `other`.
    pub const fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clears the bits of `other`.
    pub const fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// `self` with `other` set or cleared.
    #[must_use]
    pub const fn with(mut self, other: Self, on: bool) -> Self {
        if on {
            self.insert(other);
        } else {
            self.remove(other);
        }
        self
    }
}

/// The persisted counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceState {
    /// Next passcode to be used for authentication.
    pub current_index: Mpi,
    /// Last card printed with `--next`; `-1` before the first.
    pub last_card_generated: Mpi,
}

impl Default for SequenceState {
    fn default() -> Self {
        Self {
            current_index: Mpi::new(),
            last_card_generated: Mpi::from_i64(-1),
        }
    }
}

/// Where sequence counters live between runs.
pub trait StateStore {
    /// Runs `f` against the freshest persisted state while holding the
    /// store lock and persists the result if `f` returns `true`. The lock
    /// is released on every path. Returns the committed state.
    ///
    /// # Errors
    ///
    /// Any error from `f` (nothing is written) or from persisting.
    fn transact(
        &mut self,
        f: &mut dyn FnMut(&mut SequenceState) -> PppResult<bool>,
    ) -> PppResult<SequenceState>;

    /// `true` once the store has had to proceed without a lock.
    fn locking_failed(&self) -> bool {
        false
    }
}

/// Keeps state in memory only; used for passphrase keys and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: SequenceState,
}

impl MemoryStore {
    /// A store starting from `state`.
    #[must_use]
    pub const fn new(state: SequenceState) -> Self {
        Self { state }
    }
}

impl StateStore for MemoryStore {
    fn transact(
        &mut self,
        f: &mut dyn FnMut(&mut SequenceState) -> PppResult<bool>,
    ) -> PppResult<SequenceState> {
        let mut working = self.state.clone();
        if f(&mut working)? {
            self.state = working;
        }
        Ok(self.state.clone())
    }
}

/// Reminders shown after login or after printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PppWarning {
    /// At most one card of printed passcodes remains.
    LastCard,
    /// Only this many printed passcodes remain.
    Critical(Mpi),
    /// No printed passcodes remain.
    OutOfCodes,
    /// The key predates the current algorithm version.
    NewVersion(u32),
}

const RULE: &str = "===========================================================";
const ALARM: &str = "@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@";

impl fmt::Display for PppWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastCard => write!(
                f,
                "{RULE}\n  You are on your last printed passcard. Print more\n  \
                 so you can keep logging into your account.\n{RULE}"
            ),
            Self::Critical(n) => {
                let plural = if n.cmp_d(1).is_eq() { "" } else { "s" };
                write!(
                    f,
                    "{ALARM}\n  Only {n} printed passcode{plural} left. Print more\n  \
                     passcards IMMEDIATELY so you can keep logging in.\n{ALARM}"
                )
            }
            Self::OutOfCodes => write!(
                f,
                "{ALARM}\n            WARNING: YOU ARE OUT OF PASSCODES\n{ALARM}\n  \
                 Print more passcards before your next login.\n{ALARM}"
            ),
            Self::NewVersion(v) => write!(
                f,
                "{RULE}\n            NOTICE: NEW PPP VERSION AVAILABLE\n\n  \
                 Version {v} of the PPP algorithm is supported. Generate a new\n  \
                 random key and print new passcards to upgrade.\n{RULE}"
            ),
        }
    }
}

/// Snapshot of a sequence, as shown by `status` and the web API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Key format version.
    pub key_version: u32,
    /// Next passcode, e.g. `1A [1]`.
    pub current_passcode: String,
    /// Printed passcodes not yet used.
    pub remaining_printed: String,
    /// Last card printed (1-based), or `None` before the first.
    pub last_card_printed: Option<String>,
    /// Whether the store is running without its lock.
    pub locking_failed: bool,
}

/// A key's passcode sequence with its persisted counters.
pub struct PppEngine<C, S> {
    generator: PasscodeGenerator<C>,
    flags: PppFlags,
    state: SequenceState,
    reserved: Option<Mpi>,
    store: S,
}

impl<C: BlockCipher, S: StateStore> PppEngine<C, S> {
    /// Loads the current counters from `store`.
    ///
    /// # Errors
    ///
    /// Whatever the store reports while reading.
    pub fn new(generator: PasscodeGenerator<C>, flags: PppFlags, mut store: S) -> PppResult<Self> {
        let state = store.transact(&mut |_| Ok(false))?;
        Ok(Self {
            generator,
            flags,
            state,
            reserved: None,
            store,
        })
    }

    /// Counters as of the last transaction.
    #[must_use]
    pub const fn state(&self) -> &SequenceState {
        &self.state
    }

    /// The key's behaviour flags.
    #[must_use]
    pub const fn flags(&self) -> PppFlags {
        self.flags
    }

    /// The passcode generator.
    #[must_use]
    pub const fn generator(&self) -> &PasscodeGenerator<C> {
        &self.generator
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Key version shortcut.
    #[must_use]
    pub const fn version(&self) -> KeyVersion {
        self.generator.version()
    }

    /// The reserved index if there is one, else the current index. With
    /// time-based passcodes enabled this is the current 32-second slot.
    ///
    /// # Errors
    ///
    /// Only on allocation failure.
    pub fn current_auth_index(&self) -> PppResult<Mpi> {
        #[cfg(feature = "time-based")]
        if self.flags.contains(PppFlags::TIME_BASED) {
            return Ok(time_slot());
        }
        Ok(self
            .reserved
            .clone()
            .unwrap_or_else(|| self.state.current_index.clone()))
    }

    /// Claims the current passcode for one authentication attempt and
    /// advances the persisted counter past it, so a parallel session gets
    /// the next code instead.
    ///
    /// # Errors
    ///
    /// [`PppError::AlreadyReserved`] if a reservation is pending, or a store
    /// error.
    pub fn reserve(&mut self) -> PppResult<Mpi> {
        if self.reserved.is_some() {
            return Err(PppError::AlreadyReserved);
        }
        let mut claimed = Mpi::new();
        self.state = self.store.transact(&mut |state| {
            claimed = state.current_index.clone();
            state.current_index.add_d_assign(1)?;
            Ok(true)
        })?;
        debug!("reserved passcode {}", PasscodeId::from_index(&claimed)?);
        self.reserved = Some(claimed.clone());
        Ok(claimed)
    }

    /// Checks `attempt` against the passcode due now.
    ///
    /// Without a reservation the due passcode is the one at the stored
    /// counter, read under the store lock, so a code accepted by another
    /// session is never accepted again. A match advances the counter and a
    /// mismatch advances it unless failures are configured not to skip.
    /// With a reservation the counter has already moved; a mismatch under
    /// don't-skip gives the code back. The reservation is always cleared.
    ///
    /// # Errors
    ///
    /// Store errors; the reservation is cleared regardless.
    pub fn authenticate(&mut self, attempt: &str) -> PppResult<bool> {
        let dont_skip = self.flags.contains(PppFlags::DONT_SKIP_ON_FAILURES);
        let time_based = cfg!(feature = "time-based") && self.flags.contains(PppFlags::TIME_BASED);

        let ok = match self.reserved.take() {
            Some(index) => {
                let ok = self.generator.passcode(&index)?.matches(attempt);
                if !ok && dont_skip {
                    self.state = self.store.transact(&mut |state| {
                        if state.current_index > index {
                            state.current_index.sub_d_assign(1)?;
                            return Ok(true);
                        }
                        Ok(false)
                    })?;
                }
                ok
            }
            None if time_based => self.generator.passcode(&self.current_auth_index()?)?.matches(attempt),
            None => {
                let generator = &self.generator;
                let mut ok = false;
                self.state = self.store.transact(&mut |state| {
                    ok = generator.passcode(&state.current_index)?.matches(attempt);
                    if ok || !dont_skip {
                        state.current_index.add_d_assign(1)?;
                        return Ok(true);
                    }
                    Ok(false)
                })?;
                ok
            }
        };

        if ok {
            info!("passcode accepted");
        } else {
            info!("passcode rejected");
        }
        Ok(ok)
    }

    /// Moves the sequence forward to `new_index`. If that lands past the
    /// printed cards, the last printed card is set to the one before it so
    /// the next `--next` prints the card holding `new_index`.
    ///
    /// # Errors
    ///
    /// [`PppError::NotForward`] unless `new_index` is after the current
    /// index, or a store error.
    pub fn skip_to(&mut self, new_index: &Mpi) -> PppResult<()> {
        self.state = self.store.transact(&mut |state| {
            if *new_index <= state.current_index {
                return Err(PppError::NotForward {
                    current: one_based(&state.current_index)?,
                    requested: one_based(new_index)?,
                });
            }
            state.current_index = new_index.clone();
            let card = card_of(new_index)?;
            if state.last_card_generated < card {
                state.last_card_generated = card.sub_d(1)?;
            }
            Ok(true)
        })?;
        info!("skipped to passcode {}", PasscodeId::from_index(new_index)?);
        Ok(())
    }

    /// Printed passcodes not yet used, never below zero.
    ///
    /// # Errors
    ///
    /// Only on allocation failure.
    pub fn remaining_printed(&self) -> PppResult<Mpi> {
        let printed_end = first_index_of(&self.state.last_card_generated.add_d(1)?)?;
        let remaining = printed_end.sub(&self.state.current_index)?;
        Ok(if remaining.is_neg() { Mpi::new() } else { remaining })
    }

    /// Warnings for the current state, in display order.
    ///
    /// # Errors
    ///
    /// Only on allocation failure.
    pub fn warnings(&self) -> PppResult<Vec<PppWarning>> {
        let remaining = self.remaining_printed()?;
        let mut out = Vec::new();
        if remaining.is_zero() {
            out.push(PppWarning::OutOfCodes);
        } else if remaining.cmp_d(CRITICAL_REMAINING).is_le() {
            out.push(PppWarning::Critical(remaining));
        } else if remaining.cmp_d(CODES_PER_CARD).is_le() {
            out.push(PppWarning::LastCard);
        }
        if self.version().is_outdated() {
            out.push(PppWarning::NewVersion(CURRENT_PPP_VERSION));
        }
        Ok(out)
    }

    /// Claims the next `n` cards for printing, advancing and persisting the
    /// last printed card once per card. Returns the 0-based card numbers.
    ///
    /// # Errors
    ///
    /// Store errors; cards claimed before the failure stay claimed.
    pub fn next_cards(&mut self, n: usize) -> PppResult<Vec<Mpi>> {
        let mut cards = Vec::with_capacity(n.min(MAX_CARDS_PER_RUN));
        for _ in 0..n {
            let mut card = Mpi::new();
            self.state = self.store.transact(&mut |state| {
                state.last_card_generated.add_d_assign(1)?;
                card = state.last_card_generated.clone();
                Ok(true)
            })?;
            cards.push(card);
        }
        if let Some(last) = cards.last() {
            info!("printing through card {}", last.add_d(1)?);
        }
        Ok(cards)
    }

    /// Position of the passcode that will be asked for next.
    ///
    /// # Errors
    ///
    /// Only on allocation failure.
    pub fn current_code(&self) -> PppResult<PasscodeId> {
        PasscodeId::from_index(&self.current_auth_index()?)
    }

    /// The login prompt, e.g. `Passcode 1A [1]: `, prefixed with
    /// `(no lock) ` when the store could not lock.
    ///
    /// # Errors
    ///
    /// Only on allocation failure.
    pub fn prompt(&self) -> PppResult<String> {
        let prefix = if self.store.locking_failed() {
            warn!("no lock: race condition possible");
            "(no lock) "
        } else {
            ""
        };
        Ok(format!("{prefix}Passcode {}: ", self.current_code()?))
    }

    /// Summary for display.
    ///
    /// # Errors
    ///
    /// Only on allocation failure.
    pub fn status(&self) -> PppResult<StatusReport> {
        let last = &self.state.last_card_generated;
        Ok(StatusReport {
            key_version: self.version().number(),
            current_passcode: self.current_code()?.to_string(),
            remaining_printed: self.remaining_printed()?.to_grouped_decimal(Some(','))?,
            last_card_printed: if last.is_neg() {
                None
            } else {
                Some(last.add_d(1)?.to_grouped_decimal(Some(','))?)
            },
            locking_failed: self.store.locking_failed(),
        })
    }
}

fn one_based(index: &Mpi) -> PppResult<String> {
    Ok(index.add_d(1)?.to_grouped_decimal(Some(','))?)
}

#[cfg(feature = "time-based")]
fn time_slot() -> Mpi {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    Mpi::from_u64(secs >> 5)
}
