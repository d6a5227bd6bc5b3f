use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Logical Sequence Number - monotonic commit order in the log
pub type Lsn = u64;

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Opaque paste identifier.
///
/// Backed by a UUIDv4 string: the id doubles as the public link token, so it
/// must be collision-resistant and unguessable. The store treats it as an
/// ordered opaque key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasteId(String);

impl PasteId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing id (e.g. one taken from a request path)
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PasteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record stored in the log and the memtable.
///
/// `views_count` is the only field that changes after creation; every other
/// field is written once and never touched again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasteRecord {
    pub id: PasteId,
    pub content: String,
    pub created_at: Timestamp,
    /// Absolute expiry time; `None` means the paste never times out
    pub expires_at: Option<Timestamp>,
    /// Ceiling on successful fetches; `None` means unlimited
    pub max_views: Option<u32>,
    pub views_count: u64,
}

impl PasteRecord {
    pub fn new(id: PasteId, content: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            id,
            content: content.into(),
            created_at,
            expires_at: None,
            max_views: None,
            views_count: 0,
        }
    }
}
