use crate::{CreateError, Pastebin};
use ember_core::retry::retry_with_policy;
use ember_core::{clock, PasteId, PasteRecord, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request to create a paste.
///
/// Deserializes straight from the HTTP body; the unsigned option fields make
/// negative inputs unrepresentable, so deserialization rejects them before
/// validation even runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaste {
    pub content: String,

    /// Lifetime in seconds from creation; omit for no time limit
    #[serde(default)]
    pub ttl_seconds: Option<u64>,

    /// Ceiling on successful fetches; omit for unlimited
    #[serde(default)]
    pub max_views: Option<u32>,
}

impl CreatePaste {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ttl_seconds: None,
            max_views: None,
        }
    }

    pub fn ttl_seconds(mut self, seconds: u64) -> Self {
        self.ttl_seconds = Some(seconds);
        self
    }

    pub fn max_views(mut self, views: u32) -> Self {
        self.max_views = Some(views);
        self
    }

    fn validate(&self, max_content_bytes: usize) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        if self.content.is_empty() {
            errors.push(FieldError {
                field: "content",
                message: "must not be empty".to_string(),
            });
        } else if self.content.len() > max_content_bytes {
            errors.push(FieldError {
                field: "content",
                message: format!("must not exceed {} bytes", max_content_bytes),
            });
        }

        if self.ttl_seconds == Some(0) {
            errors.push(FieldError {
                field: "ttl_seconds",
                message: "must be a positive integer".to_string(),
            });
        }

        if self.max_views == Some(0) {
            errors.push(FieldError {
                field: "max_views",
                message: "must be a positive integer".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { errors })
        }
    }
}

/// A single rejected field with a human-readable reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Request rejected before anything was persisted
#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed:")?;
        for e in &self.errors {
            write!(f, " {} {};", e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Proof of a successful create
#[derive(Debug, Clone, Serialize)]
pub struct PasteReceipt {
    pub id: PasteId,
    pub expires_at: Option<Timestamp>,
}

impl Pastebin {
    /// Validate and persist a new paste.
    ///
    /// The record is built once, then committed under the configured retry
    /// policy; a transient log failure reuses the same id and timestamps, so
    /// retrying can never produce a second paste.
    pub fn create_paste(&self, request: CreatePaste) -> Result<PasteReceipt, CreateError> {
        let config = self.store().config();
        request.validate(config.max_content_bytes)?;

        let id = PasteId::generate();
        // Persisted timestamps come from the real clock only; read-side
        // clock overrides cannot reach this path.
        let created_at = clock::now_millis();
        let expires_at = request
            .ttl_seconds
            .map(|seconds| expiry_after(created_at, seconds));

        let mut record = PasteRecord::new(id.clone(), request.content, created_at);
        record.expires_at = expires_at;
        record.max_views = request.max_views;

        retry_with_policy(self.retry_policy(), || {
            let mut txn = self.store().begin();
            txn.insert(record.clone())?;
            txn.commit()
        })?;

        Ok(PasteReceipt { id, expires_at })
    }
}

/// Absolute expiry for a TTL; far-future values clamp to the maximum
/// representable timestamp instead of wrapping.
fn expiry_after(created_at: Timestamp, ttl_seconds: u64) -> Timestamp {
    let expiry = created_at as i128 + ttl_seconds as i128 * 1_000;
    expiry.min(i64::MAX as i128) as i64
}
