use ember_core::retry::RetryPolicy;
use ember_core::{PasteStore, Result, StoreConfig, StoreStatus};
use std::path::Path;

pub use ember_core::Error as StoreError;

pub mod access;
pub use access::{AccessGrant, AccessOutcome};

pub mod create;
pub use create::{CreatePaste, FieldError, PasteReceipt, ValidationError};

pub mod error;
pub use error::CreateError;

/// Emberbin service handle: the paste lifecycle rules layered over a
/// [`PasteStore`].
///
/// All rules about when a paste is visible live here; the store below only
/// does keyed reads and transactional writes. Cheap to share behind an `Arc`.
pub struct Pastebin {
    store: PasteStore,
    retry_policy: RetryPolicy,
}

impl Pastebin {
    /// Create a new pastebin at the specified path
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_store(PasteStore::create(path)?))
    }

    /// Create a new pastebin with custom store configuration
    pub fn create_with_config(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        Ok(Self::with_store(PasteStore::create_with_config(
            path, config,
        )?))
    }

    /// Open an existing pastebin
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_store(PasteStore::open(path)?))
    }

    /// Create an ephemeral pastebin with no backing log
    pub fn create_in_memory() -> Self {
        Self::with_store(PasteStore::create_in_memory())
    }

    fn with_store(store: PasteStore) -> Self {
        Self {
            store,
            retry_policy: RetryPolicy::fast(),
        }
    }

    /// Replace the retry policy used for create-side transient failures.
    /// Fetches are never retried regardless of policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Probe the store, for liveness checks
    pub fn status(&self) -> Result<StoreStatus> {
        self.store.status()
    }

    pub fn store(&self) -> &PasteStore {
        &self.store
    }

    pub(crate) fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}
