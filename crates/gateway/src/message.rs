use serde::{Deserialize, Serialize};

/// The author of a chat message.
///
/// The set is closed: completion endpoints only distinguish the system
/// instructions, the human user, and the assistant itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The system instructions that shape the assistant's behavior.
    System,
    /// A message sent by the human user.
    User,
    /// A reply generated by the assistant.
    Assistant,
}

/// An immutable role-tagged message record.
///
/// Records can only be read or cloned once created. Conversation
/// histories change by inserting and dropping records, never by
/// rewriting one in place.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatMessage {
    role: ChatRole,
    content: String,
}

impl ChatMessage {
    /// Creates a record with the given role and text body.
    #[inline]
    pub fn new<S: Into<String>>(role: ChatRole, content: S) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system-role record carrying an instruction.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(ChatRole::System, content)
    }

    /// Creates a user-role record.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Creates an assistant-role record.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// Returns the role of this record.
    #[inline]
    pub fn role(&self) -> ChatRole {
        self.role
    }

    /// Returns the text body of this record.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let msg = ChatMessage::system("be nice");
        assert_eq!(msg.role(), ChatRole::System);
        assert_eq!(msg.content(), "be nice");

        assert_eq!(ChatMessage::user("hi").role(), ChatRole::User);
        assert_eq!(
            ChatMessage::assistant("hello").role(),
            ChatRole::Assistant
        );
        assert_eq!(
            ChatMessage::new(ChatRole::User, "hi"),
            ChatMessage::user("hi")
        );
    }
}
