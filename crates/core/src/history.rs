//! A single conversation's bounded message history.

use chatline_gateway::{ChatMessage, ChatRole};

/// An ordered, size-bounded sequence of role-tagged message records.
///
/// The system record, when present, is tracked by an explicit index so
/// that trimming and clearing never rescan the sequence for it. At most
/// one system record can exist, and trimming retains it by role no
/// matter where it sits.
///
/// Histories are read-only outside this crate; all mutation goes
/// through [`crate::store::ConversationStore`].
#[derive(Clone, Debug, Default)]
pub struct History {
    messages: Vec<ChatMessage>,
    system_idx: Option<usize>,
}

impl History {
    /// Returns the records in chronological order.
    #[inline]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the history holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the system record, if one is present.
    #[inline]
    pub fn system_message(&self) -> Option<&ChatMessage> {
        self.system_idx.map(|idx| &self.messages[idx])
    }

    /// Returns an independent copy of the records.
    #[inline]
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }

    /// Appends a record without applying the size bound.
    pub(crate) fn push(&mut self, msg: ChatMessage) {
        if msg.role() == ChatRole::System && self.system_idx.is_none() {
            self.system_idx = Some(self.messages.len());
        }
        self.messages.push(msg);
    }

    /// Applies the size bound: drops the oldest non-system records so
    /// that at most `limit` remain. The system record is retained by
    /// role regardless of its position.
    pub(crate) fn trim(&mut self, limit: usize) {
        let len = self.messages.len();
        if len <= limit {
            return;
        }

        let mut excess = len - limit;
        let mut kept = Vec::with_capacity(limit);
        let mut kept_system_idx = None;
        for (idx, msg) in self.messages.drain(..).enumerate() {
            if Some(idx) == self.system_idx {
                kept_system_idx = Some(kept.len());
                kept.push(msg);
            } else if excess > 0 {
                excess -= 1;
            } else {
                kept.push(msg);
            }
        }
        self.messages = kept;
        self.system_idx = kept_system_idx;
    }

    /// Drops every record except the system one, if present.
    pub(crate) fn clear_keeping_system(&mut self) {
        if let Some(idx) = self.system_idx {
            let system = self.messages.swap_remove(idx);
            self.messages.clear();
            self.messages.push(system);
            self.system_idx = Some(0);
        } else {
            self.messages.clear();
        }
    }
}
