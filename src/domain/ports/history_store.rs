//! History Store Port
//!
//! Defines the interface for persisting past lookups.

use crate::domain::entities::HistoryEntry;

/// Store for lookup history.
///
/// The resolver never depends on this port; only the caller that owns
/// the history list does.
pub trait HistoryStore: Send + Sync {
    /// Load every stored entry, oldest first.
    fn load(&self) -> anyhow::Result<Vec<HistoryEntry>>;

    /// Append one entry.
    fn append(&self, entry: HistoryEntry) -> anyhow::Result<()>;
}
