//! In-memory conversation transcript.
//!
//! The conversation is append-only from the orchestrator's point of view. The
//! only wholesale rewrite is the compressor's `replace`, and the only in-place
//! edit is the current turn's assistant message, addressed by id.

use crate::core_types::{Attachment, Message, MessageId, Role};

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
    greeting: String,
}

impl Conversation {
    /// Starts a session holding a single greeting message.
    pub fn new(greeting: impl Into<String>) -> Self {
        let mut conversation = Self {
            messages: Vec::new(),
            next_id: 1,
            greeting: greeting.into(),
        };
        conversation.push_greeting();
        conversation
    }

    fn push_greeting(&mut self) {
        let greeting = self.greeting.clone();
        self.push(Role::Assistant, greeting, Vec::new());
    }

    /// Ids follow creation order, not position: a summary folded in later
    /// carries a larger id than the messages that follow it.
    pub fn allocate_id(&mut self) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn push(
        &mut self,
        role: Role,
        content: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> MessageId {
        let id = self.allocate_id();
        self.messages
            .push(Message::new(id, role, content).with_attachments(attachments));
        id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Up to `count` messages immediately preceding `id`, oldest first.
    pub fn preceding(&self, id: MessageId, count: usize) -> &[Message] {
        let end = self
            .messages
            .iter()
            .position(|m| m.id == id)
            .unwrap_or(self.messages.len());
        &self.messages[end.saturating_sub(count)..end]
    }

    /// Swaps in a rewritten history. Ids keep counting from where they were.
    pub fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Discards the session, leaving only a fresh greeting.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.push_greeting();
        log::info!("Conversation reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_has_greeting() {
        let conversation = Conversation::new("hello");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, Role::Assistant);
        assert_eq!(conversation.messages()[0].content, "hello");
    }

    #[test]
    fn test_ids_are_monotonic_across_reset() {
        let mut conversation = Conversation::new("hi");
        let a = conversation.push(Role::User, "one", Vec::new());
        let b = conversation.push(Role::Assistant, "two", Vec::new());
        assert!(b > a);

        conversation.reset();
        assert_eq!(conversation.len(), 1);
        let c = conversation.push(Role::User, "three", Vec::new());
        assert!(c > b);
    }

    #[test]
    fn test_preceding_returns_window_before_message() {
        let mut conversation = Conversation::new("hi");
        for i in 0..5 {
            conversation.push(Role::User, format!("m{}", i), Vec::new());
        }
        let last = conversation.messages().last().unwrap().id;
        let window: Vec<&str> = conversation
            .preceding(last, 2)
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(window, vec!["m2", "m3"]);
        assert_eq!(conversation.preceding(conversation.messages()[0].id, 3).len(), 0);
    }
}
