//! Purpose: Hold the bearer credential and user profile behind an explicit session object.
//! Exports: `SessionStore`, `MemoryStore`, `FileStore`, `Session`, `TOKEN_KEY`, `USER_KEY`.
//! Role: Replaces ambient browser-style storage; the gateway reads it on every call.
//! Invariants: Entries are plain strings under the fixed keys `token` and `user`.
//! Invariants: `Session::clear` is idempotent and safe to race from several threads.
//! Invariants: File-backed writes are serialized by an exclusive lock on a sidecar file.
use crate::core::error::{Error, ErrorKind};
use fs2::FileExt;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

type StoreResult<T> = Result<T, Error>;

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// JSON-object file store, one string value per key.
///
/// A missing file reads as an empty store. Mutations take an exclusive
/// `fs2` lock on `<path>.lock`, rewrite through a temp file, then rename.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn lock(&self) -> StoreResult<StoreLock> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|err| self.io_error("failed to create session directory", err))?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())
            .map_err(|err| self.io_error("failed to open session lock", err))?;
        file.lock_exclusive()
            .map_err(|err| self.io_error("failed to lock session file", err))?;
        Ok(StoreLock { file })
    }

    fn read_entries(&self) -> StoreResult<Map<String, Value>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(self.io_error("failed to read session file", err)),
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(Error::new(ErrorKind::Io)
                .with_message("session file is not a JSON object")
                .with_hint(format!("Remove {} and log in again.", self.path.display()))),
            Err(err) => Err(Error::new(ErrorKind::Io)
                .with_message("session file is not valid JSON")
                .with_hint(format!("Remove {} and log in again.", self.path.display()))
                .with_source(err)),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(entries).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to encode session file")
                .with_source(err)
        })?;
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json).map_err(|err| self.io_error("failed to write session file", err))?;
        fs::rename(&tmp, &self.path)
            .map_err(|err| self.io_error("failed to replace session file", err))
    }

    fn io_error(&self, message: &str, err: io::Error) -> Error {
        Error::new(ErrorKind::Io)
            .with_message(format!("{message}: {}", self.path.display()))
            .with_source(err)
    }
}

struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(key)
            .and_then(|value| value.as_str())
            .map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let _lock = self.lock()?;
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), Value::String(value.to_string()));
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let _lock = self.lock()?;
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}

/// Credential lifecycle over a [`SessionStore`].
///
/// Cloning shares the same store and the same expiry latch.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
    expired: Arc<Mutex<ExpiryLatch>>,
}

/// Credential whose expiry already claimed the redirect.
#[derive(Debug, Default)]
enum ExpiryLatch {
    #[default]
    Open,
    Claimed(Option<String>),
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            expired: Arc::new(Mutex::new(ExpiryLatch::Open)),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn token(&self) -> StoreResult<Option<String>> {
        Ok(self
            .store
            .get(TOKEN_KEY)?
            .filter(|token| !token.is_empty()))
    }

    pub fn user(&self) -> StoreResult<Option<String>> {
        self.store.get(USER_KEY)
    }

    pub fn is_authenticated(&self) -> StoreResult<bool> {
        Ok(self.token()?.is_some())
    }

    pub fn login(&self, token: &str, user: Option<&str>) -> StoreResult<()> {
        self.store.set(TOKEN_KEY, token)?;
        match user {
            Some(user) => self.store.set(USER_KEY, user)?,
            None => self.store.remove(USER_KEY)?,
        }
        *self.latch() = ExpiryLatch::Open;
        Ok(())
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)
    }

    /// Claims the expiry redirect for `credential`, the token the rejected
    /// call carried.
    ///
    /// Returns `true` once per expired credential: the first claim after a
    /// `login`, or the first claim for a token other than the one already
    /// claimed (a token stored by another writer of the same store). A call
    /// sent without a token never re-claims an expiry already reported.
    pub fn claim_expiry(&self, credential: Option<&str>) -> bool {
        let mut latch = self.latch();
        let claimed = match (&*latch, credential) {
            (ExpiryLatch::Open, _) => true,
            (ExpiryLatch::Claimed(previous), Some(current)) => {
                previous.as_deref() != Some(current)
            }
            (ExpiryLatch::Claimed(_), None) => false,
        };
        if claimed {
            *latch = ExpiryLatch::Claimed(credential.map(str::to_string));
        }
        claimed
    }

    fn latch(&self) -> MutexGuard<'_, ExpiryLatch> {
        self.expired
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("expired", &*self.latch())
            .finish_non_exhaustive()
    }
}

pub fn default_session_file() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_default();
    PathBuf::from(home).join(".eventdesk").join("session.json")
}
