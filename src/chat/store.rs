//! Append-only conversation log for one chat panel.

use chrono::Utc;

use crate::chat::types::{ConversationEntry, EntryId, EntryKind};

/// Ordered, append-only log of conversation entries.
///
/// Entries are never edited, reordered or deduplicated; repeating a question
/// records it twice. The only removal is [`ConversationStore::clear`] at
/// session reset.
#[derive(Clone, Debug, Default)]
pub struct ConversationStore {
    entries: Vec<ConversationEntry>,
    last_millis: i64,
}

impl ConversationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh id for an entry of `kind`.
    ///
    /// Ids use the wall clock in milliseconds, bumped past the previous stamp
    /// so that two entries created in the same millisecond stay distinct and
    /// ordered.
    pub fn next_id(&mut self, kind: EntryKind) -> EntryId {
        let now = Utc::now().timestamp_millis();
        self.last_millis = now.max(self.last_millis.saturating_add(1));
        EntryId::compose(self.last_millis, kind)
    }

    /// Append an entry at the end of the log.
    pub fn append(&mut self, entry: ConversationEntry) {
        tracing::debug!(id = %entry.id, role = %entry.role, "conversation entry appended");
        self.entries.push(entry);
    }

    /// Remove every entry (session reset).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// All entries in append order.
    #[must_use]
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::EntryRole;

    #[test]
    fn test_append_keeps_order_and_duplicates() {
        let mut store = ConversationStore::new();
        for text in ["hello", "hello", "bye"] {
            let id = store.next_id(EntryKind::User);
            store.append(ConversationEntry::user(id, text));
        }
        let contents: Vec<&str> = store.entries().iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["hello", "hello", "bye"]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.last().map(|e| e.role), Some(EntryRole::User));
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut store = ConversationStore::new();
        let stamps: Vec<i64> = (0..100)
            .map(|_| store.next_id(EntryKind::Assistant))
            .filter_map(|id| id.as_str().split('-').next().and_then(|s| s.parse().ok()))
            .collect();
        assert_eq!(stamps.len(), 100);
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_id_suffix_matches_kind() {
        let mut store = ConversationStore::new();
        assert!(store.next_id(EntryKind::User).as_str().ends_with("-user"));
        assert!(store.next_id(EntryKind::Error).as_str().ends_with("-error"));
    }

    #[test]
    fn test_clear_empties_log() {
        let mut store = ConversationStore::new();
        let id = store.next_id(EntryKind::User);
        store.append(ConversationEntry::user(id, "question"));
        store.clear();
        assert!(store.is_empty());
        assert!(store.last().is_none());
    }
}
