/// Test utilities and helpers for Emberbin testing
///
/// This module provides common test utilities to simplify writing tests.

use ember_api::{AccessGrant, AccessOutcome, CreatePaste, PasteReceipt, Pastebin};
use ember_core::clock;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test pastebin wrapper that manages temporary directory lifecycle
pub struct TestPastebin {
    pub bin: Pastebin,
    pub path: PathBuf,
    _temp_dir: Option<TempDir>,
}

impl TestPastebin {
    /// Create a new test pastebin with a temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().to_path_buf();
        let bin = Pastebin::create(&path).expect("Failed to create pastebin");

        Self {
            bin,
            path,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Create a test pastebin at a specific path (path must exist)
    pub fn at_path(path: PathBuf) -> Self {
        let bin = Pastebin::create(&path).expect("Failed to create pastebin");

        Self {
            bin,
            path,
            _temp_dir: None,
        }
    }

    /// Open an existing test pastebin at a specific path
    pub fn open(path: PathBuf) -> Self {
        let bin = Pastebin::open(&path).expect("Failed to open pastebin");

        Self {
            bin,
            path,
            _temp_dir: None,
        }
    }

    /// Create an ephemeral test pastebin with no backing log
    pub fn in_memory() -> Self {
        Self {
            bin: Pastebin::create_in_memory(),
            path: PathBuf::from(":memory:"),
            _temp_dir: None,
        }
    }

    /// Get the pastebin path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Close and reopen the pastebin (for testing persistence).
    /// Keeps ownership of the scratch directory, if any.
    pub fn reopen(self) -> Self {
        drop(self.bin);
        let bin = Pastebin::open(&self.path).expect("Failed to open pastebin");

        Self {
            bin,
            path: self.path,
            _temp_dir: self._temp_dir,
        }
    }
}

impl Default for TestPastebin {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a paste with just content, panicking on failure
pub fn seed_paste(bin: &Pastebin, content: &str) -> PasteReceipt {
    bin.create_paste(CreatePaste::new(content))
        .expect("Failed to create paste")
}

/// Create a batch of pastes, returning their receipts
pub fn seed_batch(bin: &Pastebin, count: usize) -> Vec<PasteReceipt> {
    (0..count)
        .map(|i| seed_paste(bin, &format!("paste body {}", i)))
        .collect()
}

/// Access a paste at the current wall-clock time
pub fn access_now(bin: &Pastebin, receipt: &PasteReceipt) -> AccessOutcome {
    bin.access(&receipt.id, clock::now_millis())
        .expect("Access failed")
}

/// Unwrap a grant out of an access outcome
pub fn expect_grant(outcome: AccessOutcome) -> AccessGrant {
    match outcome {
        AccessOutcome::Ok(grant) => grant,
        other => panic!("Expected access grant, got {:?}", other),
    }
}
