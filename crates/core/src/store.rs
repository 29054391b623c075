//! The process-wide conversation store.

use std::collections::HashMap;

use chatline_gateway::ChatMessage;

use crate::history::History;

/// The default per-conversation record bound.
pub const DEFAULT_MESSAGE_LIMIT: usize = 10;

/// Maps opaque conversation ids to bounded histories.
///
/// The store is a plain owned value: inject it into whatever owns the
/// message flow (here, the router) and its lifecycle follows that
/// owner's. All mutation goes through this API; histories are handed
/// out read-only or as independent snapshots, so nothing outside the
/// store can edit a live sequence.
#[derive(Debug)]
pub struct ConversationStore {
    conversations: HashMap<String, History>,
    message_limit: usize,
}

impl Default for ConversationStore {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    /// Creates an empty store with the default record bound.
    #[inline]
    pub fn new() -> Self {
        Self {
            conversations: HashMap::new(),
            message_limit: DEFAULT_MESSAGE_LIMIT,
        }
    }

    /// Returns the current per-conversation record bound.
    #[inline]
    pub fn message_limit(&self) -> usize {
        self.message_limit
    }

    /// Replaces the per-conversation record bound.
    ///
    /// Zero is silently ignored and the current bound is kept. A new
    /// bound applies from the next mutating operation on; existing
    /// histories are not re-trimmed.
    pub fn set_message_limit(&mut self, limit: usize) {
        if limit > 0 {
            self.message_limit = limit;
        }
    }

    /// Returns the history for `conversation_id`, if it exists.
    #[inline]
    pub fn get(&self, conversation_id: &str) -> Option<&History> {
        self.conversations.get(conversation_id)
    }

    /// Returns the history for `conversation_id`, creating it first if
    /// needed.
    ///
    /// A newly created history is seeded with one system record when
    /// `system_instruction` is non-empty. For an existing conversation
    /// the instruction is ignored; it only takes effect at creation.
    #[inline]
    pub fn get_or_create(
        &mut self,
        conversation_id: &str,
        system_instruction: Option<&str>,
    ) -> &History {
        self.entry(conversation_id, system_instruction)
    }

    /// Appends a user record and returns the resulting snapshot.
    ///
    /// The conversation is created first if needed, seeding the system
    /// instruction like [`Self::get_or_create`] does.
    pub fn add_user_message(
        &mut self,
        conversation_id: &str,
        text: &str,
        system_instruction: Option<&str>,
    ) -> Vec<ChatMessage> {
        let limit = self.message_limit;
        let history = self.entry(conversation_id, system_instruction);
        history.push(ChatMessage::user(text));
        history.trim(limit);
        history.snapshot()
    }

    /// Appends an assistant record and returns the resulting snapshot.
    ///
    /// A conversation created by this call has no system record; that
    /// is permitted, the caller is expected to have created the
    /// conversation beforehand.
    pub fn add_assistant_message(
        &mut self,
        conversation_id: &str,
        text: &str,
    ) -> Vec<ChatMessage> {
        let limit = self.message_limit;
        let history = self.entry(conversation_id, None);
        history.push(ChatMessage::assistant(text));
        history.trim(limit);
        history.snapshot()
    }

    /// Returns an independent copy of the stored records, or `None` if
    /// the conversation is unknown.
    #[inline]
    pub fn read(&self, conversation_id: &str) -> Option<Vec<ChatMessage>> {
        self.conversations.get(conversation_id).map(History::snapshot)
    }

    /// Clears a conversation. Returns `false` when the conversation is
    /// unknown, without creating it.
    ///
    /// With `keep_system_message` the history is reset to its system
    /// record alone (or to empty when it has none); otherwise the entry
    /// is removed entirely and a subsequent [`Self::read`] returns
    /// `None`.
    pub fn clear(
        &mut self,
        conversation_id: &str,
        keep_system_message: bool,
    ) -> bool {
        if keep_system_message {
            let Some(history) = self.conversations.get_mut(conversation_id)
            else {
                return false;
            };
            history.clear_keeping_system();
            true
        } else {
            self.conversations.remove(conversation_id).is_some()
        }
    }

    fn entry(
        &mut self,
        conversation_id: &str,
        system_instruction: Option<&str>,
    ) -> &mut History {
        self.conversations
            .entry(conversation_id.to_owned())
            .or_insert_with(|| {
                debug!("creating conversation {conversation_id}");
                let mut history = History::default();
                let instruction =
                    system_instruction.filter(|s| !s.is_empty());
                if let Some(instruction) = instruction {
                    history.push(ChatMessage::system(instruction));
                }
                history
            })
    }
}
