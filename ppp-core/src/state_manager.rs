// File:    state_manager.rs
// Author:  apezoo
// Date:    2025-08-05
//
// Description: File-backed key store: the key, counter and card files plus their advisory lock.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::alphabet::Alphabet;
use crate::crypto::Aes256Cipher;
use crate::derivation::PasscodeGenerator;
use crate::error::{PppError, PppResult};
use crate::keyfile::KeyRecord;
use crate::secret::SequenceKey;
use crate::sequence::{PppEngine, PppFlags, SequenceState, StateStore};
use crate::version::KeyVersion;

/// File holding the sequence key.
pub const KEY_FILE: &str = "private_key";
/// File holding the next passcode index.
pub const COUNTER_FILE: &str = "private_cnt";
/// File holding the last printed card.
pub const CARDS_FILE: &str = "private_gen";
/// Advisory lock file.
pub const LOCK_FILE: &str = ".lock";

/// Directory under `$HOME` used when no other location is given.
pub const DEFAULT_DIR_NAME: &str = ".pppauth";

/// How long to wait for the lock before carrying on without it.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(1);

const LOCK_RETRY: Duration = Duration::from_millis(50);

/// A key read from disk together with everything needed to use it.
#[derive(Debug)]
pub struct LoadedKey {
    /// The secret.
    pub key: SequenceKey,
    /// Its format version.
    pub version: KeyVersion,
    /// Behaviour flags from the key-file header.
    pub flags: PppFlags,
    /// Counters at load time.
    pub state: SequenceState,
}

/// The three key files in one directory.
#[derive(Debug)]
pub struct KeyStore {
    dir: PathBuf,
    version: u32,
    lock_wait: Duration,
    locking_failed: bool,
    /// Key record to rewrite with flags on the next save.
    upgrade: Option<KeyRecord>,
}

/// Holds the OS advisory lock on the lock file. The lock goes away when
/// the guard is dropped or the process exits, however it exits.
struct LockGuard {
    file: File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!("unlock failed, released on close: {e}");
        }
    }
}

impl KeyStore {
    /// A store rooted at `dir`. Nothing is touched until it is used.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            version: KeyVersion::current().number(),
            lock_wait: DEFAULT_LOCK_WAIT,
            locking_failed: false,
            upgrade: None,
        }
    }

    /// Overrides how long to wait for the lock.
    #[must_use]
    pub const fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    /// The key directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `true` if a key file is present.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.dir.join(KEY_FILE).is_file()
    }

    /// Reads the key, its flags and the counters.
    ///
    /// # Errors
    ///
    /// * [`PppError::NoKey`] if any of the three files is missing.
    /// * [`PppError::VersionMismatch`] if they disagree on the version.
    /// * [`PppError::UnsupportedVersion`] for an unknown version.
    /// * [`PppError::KeyFile`] / [`PppError::Io`] for unreadable files.
    pub fn load(&mut self) -> PppResult<LoadedKey> {
        for name in [KEY_FILE, COUNTER_FILE, CARDS_FILE] {
            if !self.dir.join(name).is_file() {
                return Err(PppError::NoKey(self.dir.clone()));
            }
        }
        let key_rec = self.read_record(KEY_FILE)?;
        let cnt_rec = self.read_record(COUNTER_FILE)?;
        let gen_rec = self.read_record(CARDS_FILE)?;
        if key_rec.version != cnt_rec.version || cnt_rec.version != gen_rec.version {
            return Err(PppError::VersionMismatch {
                key: key_rec.version,
                counter: cnt_rec.version,
                cards: gen_rec.version,
            });
        }
        let version = KeyVersion::from_number(key_rec.version)?;
        self.version = key_rec.version;

        let mut flags = key_rec.flags.unwrap_or_default();
        if !cfg!(feature = "time-based") && flags.contains(PppFlags::TIME_BASED) {
            warn!("time-based key loaded without time-based support; using counter passcodes");
            flags.remove(PppFlags::TIME_BASED);
        }
        if key_rec.flags.is_none() {
            debug!("key file has no flags; it will be rewritten on the next save");
            self.upgrade = Some(KeyRecord::new(key_rec.version, flags, key_rec.value.clone()));
        }
        if version.is_outdated() {
            warn!("key was created for PPP version {version}");
        }

        Ok(LoadedKey {
            key: SequenceKey::from_value(key_rec.value)?,
            version,
            flags,
            state: SequenceState {
                current_index: cnt_rec.value,
                last_card_generated: gen_rec.value,
            },
        })
    }

    /// Writes a new key with fresh counters.
    ///
    /// # Errors
    ///
    /// [`PppError::KeyExists`] if a key is present and `force` is off, or
    /// [`PppError::Io`] if the files cannot be written.
    pub fn create(
        &mut self,
        key: &SequenceKey,
        version: KeyVersion,
        flags: PppFlags,
        force: bool,
    ) -> PppResult<()> {
        self.ensure_dir()?;
        let _guard = self.lock();
        if self.exists() && !force {
            return Err(PppError::KeyExists(self.dir.clone()));
        }
        self.version = version.number();
        let flags = flags.with(PppFlags::FLAGS_PRESENT, true);

        self.write_record(KEY_FILE, &KeyRecord::new(self.version, flags, key.value().clone()))?;
        self.write_state(&SequenceState::default())?;
        self.upgrade = None;
        info!("new sequence key written to {}", self.dir.display());
        Ok(())
    }

    fn ensure_dir(&self) -> io::Result<()> {
        if self.dir.is_dir() {
            return Ok(());
        }
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(&self.dir)
    }

    fn read_record(&self, name: &str) -> PppResult<KeyRecord> {
        let path = self.dir.join(name);
        let bytes = zeroize::Zeroizing::new(fs::read(&path)?);
        KeyRecord::decode(&bytes, &path)
    }

    /// Replaces `name` atomically: write a sibling temp file, then rename.
    fn write_record(&self, name: &str, record: &KeyRecord) -> PppResult<()> {
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!(".{name}.tmp"));
        let bytes = record.encode()?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn write_state(&self, state: &SequenceState) -> PppResult<()> {
        let flags = PppFlags::empty();
        self.write_record(
            COUNTER_FILE,
            &KeyRecord::new(self.version, flags, state.current_index.clone()),
        )?;
        self.write_record(
            CARDS_FILE,
            &KeyRecord::new(self.version, flags, state.last_card_generated.clone()),
        )
    }

    fn read_state(&self) -> PppResult<SequenceState> {
        Ok(SequenceState {
            current_index: self.read_record(COUNTER_FILE)?.value,
            last_card_generated: self.read_record(CARDS_FILE)?.value,
        })
    }

    /// Takes an exclusive advisory lock on the lock file, retrying until
    /// `lock_wait` runs out. On timeout, or where the platform has no file
    /// locks, the store carries on unlocked and says so. A lock file left
    /// behind by a dead process holds no lock and is simply reused.
    fn lock(&mut self) -> Option<LockGuard> {
        let path = self.dir.join(LOCK_FILE);
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(false);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = match options.open(&path) {
            Ok(file) => file,
            Err(e) => return self.unlocked(&e),
        };
        let deadline = Instant::now() + self.lock_wait;
        loop {
            match file.try_lock() {
                Ok(()) => return Some(LockGuard { file }),
                Err(TryLockError::WouldBlock) if Instant::now() < deadline => thread::sleep(LOCK_RETRY),
                Err(TryLockError::WouldBlock) => {
                    return self.unlocked(&format!("{} is held by another process", path.display()));
                }
                Err(TryLockError::Error(e)) => return self.unlocked(&e),
            }
        }
    }

    fn unlocked(&mut self, reason: &dyn std::fmt::Display) -> Option<LockGuard> {
        warn!("no lock: race condition possible ({reason})");
        self.locking_failed = true;
        None
    }
}

impl StateStore for KeyStore {
    fn transact(
        &mut self,
        f: &mut dyn FnMut(&mut SequenceState) -> PppResult<bool>,
    ) -> PppResult<SequenceState> {
        let _guard = self.lock();
        let mut state = self.read_state()?;
        if f(&mut state)? {
            if let Some(record) = self.upgrade.take() {
                self.write_record(KEY_FILE, &record)?;
            }
            self.write_state(&state)?;
            debug!("sequence state saved");
        }
        Ok(state)
    }

    fn locking_failed(&self) -> bool {
        self.locking_failed
    }
}

/// Loads the key in `store` and wraps it in an engine. `alphabet` overrides
/// the version's default character set.
///
/// # Errors
///
/// Anything [`KeyStore::load`] reports.
pub fn open_engine(
    mut store: KeyStore,
    alphabet: Option<Alphabet>,
) -> PppResult<PppEngine<Aes256Cipher, KeyStore>> {
    let loaded = store.load()?;
    let alphabet = alphabet.unwrap_or_else(|| Alphabet::for_version(loaded.version));
    let generator = PasscodeGenerator::new(Aes256Cipher, &loaded.key, loaded.version, alphabet)?;
    PppEngine::new(generator, loaded.flags, store)
}

/// Resolves the key directory: an explicit path, then `PPP_KEY_DIR`, then
/// `/home/<user>/.pppauth` for a named user, then `$HOME/.pppauth`.
#[must_use]
pub fn resolve_key_dir(explicit: Option<&Path>, user: Option<&str>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Some(dir) = std::env::var_os("PPP_KEY_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(user) = user {
        return Path::new("/home").join(user).join(DEFAULT_DIR_NAME);
    }
    std::env::var_os("HOME")
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(DEFAULT_DIR_NAME)
}
