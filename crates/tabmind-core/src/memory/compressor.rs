//! Lossy context compression.
//!
//! Keeps the first message (greeting or an earlier summary anchor) and the
//! last `keep_recent` messages verbatim and folds everything in between into a
//! single `system-summary` message listing `role: excerpt` lines. The model is
//! not asked to summarize; compression must not depend on the endpoint whose
//! budget it is protecting.

use crate::core_types::{char_prefix, Message, MessageId, Role};
use crate::memory::Conversation;

#[derive(Debug, Clone)]
pub struct ContextCompressor {
    keep_recent: usize,
    excerpt_chars: usize,
}

impl Default for ContextCompressor {
    fn default() -> Self {
        Self::new(4, 100)
    }
}

impl ContextCompressor {
    pub fn new(keep_recent: usize, excerpt_chars: usize) -> Self {
        Self {
            keep_recent,
            excerpt_chars,
        }
    }

    /// True when there is at least one message between the head and the tail.
    pub fn can_fold(&self, len: usize) -> bool {
        len > self.keep_recent + 1
    }

    /// Pure folding step. Returns the input unchanged when nothing lies
    /// between the first message and the last `keep_recent`.
    pub fn fold(&self, messages: &[Message], summary_id: MessageId) -> Vec<Message> {
        if !self.can_fold(messages.len()) {
            return messages.to_vec();
        }

        let tail_start = messages.len() - self.keep_recent;
        let folded = &messages[1..tail_start];
        let summary = folded
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), self.excerpt(&m.content)))
            .collect::<Vec<_>>()
            .join("\n");

        let mut result = Vec::with_capacity(self.keep_recent + 2);
        result.push(messages[0].clone());
        result.push(Message::new(summary_id, Role::SystemSummary, summary));
        result.extend_from_slice(&messages[tail_start..]);
        result
    }

    /// Compresses the conversation in place. Returns whether anything was folded.
    pub fn compress(&self, conversation: &mut Conversation) -> bool {
        let before = conversation.len();
        if !self.can_fold(before) {
            return false;
        }

        // The summary is a new message, so it takes the next id even though
        // it sits at index 1.
        let summary_id = conversation.allocate_id();
        let compressed = self.fold(conversation.messages(), summary_id);
        log::info!(
            "Compressed context: {} -> {} messages ({} folded)",
            before,
            compressed.len(),
            before - compressed.len() + 1
        );
        conversation.replace(compressed);
        true
    }

    fn excerpt(&self, content: &str) -> String {
        let flat = content.replace('\n', " ");
        let prefix = char_prefix(&flat, self.excerpt_chars);
        if prefix.len() < flat.len() {
            format!("{}…", prefix)
        } else {
            flat
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation_with(turns: usize) -> Conversation {
        let mut conversation = Conversation::new("greeting");
        for i in 0..turns {
            conversation.push(Role::User, format!("question {}", i), Vec::new());
            conversation.push(Role::Assistant, format!("answer {}", i), Vec::new());
        }
        conversation
    }

    #[test]
    fn test_fold_keeps_head_and_tail() {
        let mut conversation = conversation_with(10);
        let original: Vec<Message> = conversation.messages().to_vec();
        let compressor = ContextCompressor::default();

        assert!(compressor.compress(&mut conversation));
        let messages = conversation.messages();
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0].id, original[0].id);
        assert_eq!(messages[1].role, Role::SystemSummary);
        let tail_ids: Vec<MessageId> = messages[2..].iter().map(|m| m.id).collect();
        let original_tail: Vec<MessageId> = original[original.len() - 4..].iter().map(|m| m.id).collect();
        assert_eq!(tail_ids, original_tail);
    }

    #[test]
    fn test_summary_id_follows_creation_order() {
        let mut conversation = conversation_with(10);
        let newest = conversation.messages().last().map(|m| m.id).unwrap();
        ContextCompressor::default().compress(&mut conversation);

        let summary_id = conversation.messages()[1].id;
        assert!(summary_id > newest);
        let mut ids: Vec<MessageId> = conversation.messages().iter().map(|m| m.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), conversation.len());

        let follow_up = conversation.push(Role::User, "follow-up", Vec::new());
        assert!(follow_up > summary_id);
    }

    #[test]
    fn test_summary_lists_role_and_excerpt() {
        let mut conversation = Conversation::new("greeting");
        conversation.push(Role::User, "x".repeat(150), Vec::new());
        conversation.push(Role::Assistant, "short reply", Vec::new());
        for i in 0..4 {
            conversation.push(Role::User, format!("recent {}", i), Vec::new());
        }

        let compressor = ContextCompressor::default();
        compressor.compress(&mut conversation);
        let summary = &conversation.messages()[1].content;
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format!("user: {}…", "x".repeat(100)));
        assert_eq!(lines[1], "assistant: short reply");
    }

    #[test]
    fn test_short_conversation_is_untouched() {
        let compressor = ContextCompressor::default();
        for turns in 0..=2 {
            let mut conversation = conversation_with(turns);
            let before = conversation.len();
            if before <= 5 {
                assert!(!compressor.compress(&mut conversation));
                assert_eq!(conversation.len(), before);
            }
        }
    }

    #[test]
    fn test_compression_is_bounded_regardless_of_length() {
        let compressor = ContextCompressor::default();
        for turns in [3, 10, 50, 200] {
            let mut conversation = conversation_with(turns);
            compressor.compress(&mut conversation);
            assert!(conversation.len() <= 6);
            // A second pass folds the previous summary but never grows.
            compressor.compress(&mut conversation);
            assert!(conversation.len() <= 6);
        }
    }

    #[test]
    fn test_folded_summary_counts_as_one_message() {
        let compressor = ContextCompressor::default();
        let mut conversation = conversation_with(10);
        compressor.compress(&mut conversation);
        conversation.push(Role::User, "next", Vec::new());
        assert_eq!(conversation.len(), 7);
        assert_eq!(
            conversation
                .messages()
                .iter()
                .filter(|m| m.role == Role::SystemSummary)
                .count(),
            1
        );
    }
}
