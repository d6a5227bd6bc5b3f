use crate::Pastebin;
use ember_core::{PasteId, PasteRecord, Result, Timestamp};

/// What a fetch attempt resolved to.
///
/// `NotFound`, `Expired`, and `ViewLimitExceeded` are distinct here so the
/// engine can be tested precisely, but callers facing the outside world are
/// expected to collapse all three into one indistinguishable "gone" answer:
/// which of them happened is exactly what a probing client must not learn.
#[derive(Debug, Clone)]
pub enum AccessOutcome {
    /// The paste was delivered and the view was counted
    Ok(AccessGrant),
    /// No paste was ever created under this id
    NotFound,
    /// The paste exists but its time limit has passed
    Expired,
    /// The paste exists but its view quota is spent
    ViewLimitExceeded,
}

impl AccessOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, AccessOutcome::Ok(_))
    }
}

/// A successful access: the paste plus its counters as of this grant.
///
/// `paste.views_count` already includes this view.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub paste: PasteRecord,
    views_before: u64,
}

impl AccessGrant {
    /// View count before this access was counted
    pub fn views_before(&self) -> u64 {
        self.views_before
    }

    /// View count including this access
    pub fn views_after(&self) -> u64 {
        self.paste.views_count
    }

    /// Views still available after this one; `None` when unlimited.
    /// Saturating, so it can never go negative.
    pub fn remaining_views(&self) -> Option<u64> {
        self.paste
            .max_views
            .map(|max| u64::from(max).saturating_sub(self.paste.views_count))
    }
}

impl Pastebin {
    /// Attempt to view a paste at time `now`.
    ///
    /// Lookup, the expiry check, the quota check, and the view-count
    /// increment run inside one store transaction, so two concurrent calls
    /// can never both win a paste's last remaining view. Refusals stage no
    /// write at all.
    ///
    /// `now` is only compared against `expires_at`; it never touches
    /// persisted state, which is what makes caller-supplied (overridden)
    /// times safe here.
    pub fn access(&self, id: &PasteId, now: Timestamp) -> Result<AccessOutcome> {
        let mut txn = self.store().begin();

        let record = match txn.find(id) {
            None => return Ok(AccessOutcome::NotFound),
            Some(record) => record.clone(),
        };

        // A paste fetched exactly at its expiry instant is still alive
        if let Some(expires_at) = record.expires_at {
            if now > expires_at {
                return Ok(AccessOutcome::Expired);
            }
        }

        if let Some(max_views) = record.max_views {
            if record.views_count >= u64::from(max_views) {
                return Ok(AccessOutcome::ViewLimitExceeded);
            }
        }

        let views_before = txn.increment_views(id)?;
        txn.commit()?;

        let mut paste = record;
        paste.views_count = views_before + 1;

        Ok(AccessOutcome::Ok(AccessGrant {
            paste,
            views_before,
        }))
    }
}
