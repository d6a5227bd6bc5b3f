use crate::config::StoreConfig;
use crate::wal::Wal;
use crate::{Error, PasteId, PasteRecord, Result};
use parking_lot::{RwLock, RwLockWriteGuard};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const WAL_FILE: &str = "wal.log";

/// Keyed paste store: a write-ahead log plus an in-memory table.
///
/// The store knows nothing about expiry or view quotas; it only offers keyed
/// reads and transactional writes. All mutation goes through [`Transaction`],
/// which holds the store's write lock for its lifetime, so concurrent
/// transactions are fully serialized and a read-check-write sequence inside
/// one transaction cannot interleave with another.
pub struct PasteStore {
    inner: Arc<RwLock<StoreInner>>,
}

struct StoreInner {
    // None in ephemeral mode
    wal: Option<Wal>,
    memtable: BTreeMap<PasteId, PasteRecord>,
    config: StoreConfig,
}

/// Point-in-time store facts, for health checks and operators
#[derive(Debug, Clone)]
pub struct StoreStatus {
    pub pastes: usize,
    /// Log size on disk; `None` in ephemeral mode
    pub wal_size_bytes: Option<u64>,
}

impl PasteStore {
    /// Create a new store in the given directory
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        Self::create_with_config(dir, StoreConfig::default())
    }

    /// Create a new store with custom configuration
    pub fn create_with_config(dir: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        config.validate().map_err(Error::InvalidArgument)?;

        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let wal_path = dir.join(WAL_FILE);
        if wal_path.exists() {
            return Err(Error::AlreadyExists(dir.display().to_string()));
        }

        let wal = Wal::create(&wal_path)?;
        if !config.fsync_writes {
            wal.set_sync_on_flush(false);
        }

        info!(dir = %dir.display(), "created paste store");

        Ok(Self::from_parts(Some(wal), BTreeMap::new(), config))
    }

    /// Open an existing store, replaying the log to rebuild state
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(dir, StoreConfig::default())
    }

    /// Open an existing store with custom configuration
    pub fn open_with_config(dir: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        config.validate().map_err(Error::InvalidArgument)?;

        let dir = dir.as_ref();
        let wal = Wal::open(dir.join(WAL_FILE))?;

        // Replay, last write wins
        let records = wal.read_all()?;
        let replayed = records.len();

        let mut memtable = BTreeMap::new();
        for (_lsn, record) in records {
            memtable.insert(record.id.clone(), record);
        }

        if !config.fsync_writes {
            wal.set_sync_on_flush(false);
        }

        info!(
            dir = %dir.display(),
            frames = replayed,
            pastes = memtable.len(),
            "recovered paste store"
        );

        Ok(Self::from_parts(Some(wal), memtable, config))
    }

    /// Create an ephemeral store with no backing log.
    /// State lives only as long as the process; handy for tests and benchmarks.
    pub fn create_in_memory() -> Self {
        Self::from_parts(None, BTreeMap::new(), StoreConfig::default())
    }

    fn from_parts(
        wal: Option<Wal>,
        memtable: BTreeMap<PasteId, PasteRecord>,
        config: StoreConfig,
    ) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                wal,
                memtable,
                config,
            })),
        }
    }

    /// Point lookup of committed state
    pub fn get(&self, id: &PasteId) -> Option<PasteRecord> {
        self.inner.read().memtable.get(id).cloned()
    }

    /// Number of pastes ever stored (records are never deleted)
    pub fn len(&self) -> usize {
        self.inner.read().memtable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().memtable.is_empty()
    }

    pub fn config(&self) -> StoreConfig {
        self.inner.read().config.clone()
    }

    /// Probe the store and its log
    pub fn status(&self) -> Result<StoreStatus> {
        let inner = self.inner.read();
        let wal_size_bytes = match &inner.wal {
            Some(wal) => Some(wal.size_bytes()?),
            None => None,
        };
        Ok(StoreStatus {
            pastes: inner.memtable.len(),
            wal_size_bytes,
        })
    }

    /// Begin a transaction.
    ///
    /// The returned [`Transaction`] holds the store's write lock until it is
    /// committed or dropped, so keep the critical section short.
    pub fn begin(&self) -> Transaction<'_> {
        Transaction {
            inner: self.inner.write(),
            staged: Vec::new(),
        }
    }
}

/// A staged batch of writes over a consistent snapshot of the store.
///
/// Reads through the transaction see committed state plus this transaction's
/// own staged writes. Nothing becomes durable or visible to other callers
/// until [`Transaction::commit`]; dropping the transaction discards all
/// staged work.
pub struct Transaction<'a> {
    inner: RwLockWriteGuard<'a, StoreInner>,
    staged: Vec<PasteRecord>,
}

impl Transaction<'_> {
    /// Look up a paste, seeing this transaction's staged writes first
    pub fn find(&self, id: &PasteId) -> Option<&PasteRecord> {
        self.staged
            .iter()
            .rev()
            .find(|record| &record.id == id)
            .or_else(|| self.inner.memtable.get(id))
    }

    /// Stage a new paste; the id must be unoccupied
    pub fn insert(&mut self, record: PasteRecord) -> Result<()> {
        if self.find(&record.id).is_some() {
            return Err(Error::AlreadyExists(record.id.to_string()));
        }
        self.staged.push(record);
        Ok(())
    }

    /// Stage a view-count increment, returning the count before the increment
    pub fn increment_views(&mut self, id: &PasteId) -> Result<u64> {
        let mut updated = self
            .find(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let before = updated.views_count;
        updated.views_count += 1;
        self.staged.push(updated);
        Ok(before)
    }

    /// Commit all staged writes: log append, flush, then apply in memory.
    ///
    /// The memtable is only touched after the log flush succeeds, so a failed
    /// commit leaves no trace in committed state.
    pub fn commit(mut self) -> Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }

        if let Some(wal) = &self.inner.wal {
            for record in &self.staged {
                wal.append(record.clone())?;
            }
            if let Err(e) = wal.flush() {
                wal.discard_pending();
                return Err(e);
            }
        }

        for record in self.staged.drain(..) {
            self.inner.memtable.insert(record.id.clone(), record);
        }

        Ok(())
    }
}
