//! Token budget estimation.
//!
//! A fixed two-characters-per-token ratio. It only gates the compression
//! threshold, so it needs to be monotonic in text length, not accurate.

use crate::core_types::{AttachmentKind, Message};

pub const CHARS_PER_TOKEN: usize = 2;

pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Content plus text attachments; images count by name only.
pub fn estimate_message_tokens(message: &Message) -> usize {
    let attachments: usize = message
        .attachments
        .iter()
        .map(|a| match a.kind {
            AttachmentKind::Text => estimate_tokens(&a.name) + estimate_tokens(&a.payload),
            AttachmentKind::Image => estimate_tokens(&a.name),
        })
        .sum();
    estimate_tokens(&message.content) + attachments
}

pub fn estimate_conversation_tokens(messages: &[Message]) -> usize {
    messages.iter().map(estimate_message_tokens).sum()
}

/// Derived view of how full the context is. Never stored; rebuild it from the
/// live conversation before each model call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextBudget {
    pub estimated_tokens: usize,
    pub max_tokens: usize,
    pub compression_threshold_ratio: f32,
}

impl ContextBudget {
    pub fn measure(messages: &[Message], max_tokens: usize, compression_threshold_ratio: f32) -> Self {
        Self {
            estimated_tokens: estimate_conversation_tokens(messages),
            max_tokens,
            compression_threshold_ratio,
        }
    }

    pub fn usage_ratio(&self) -> f32 {
        if self.max_tokens == 0 {
            return 1.0;
        }
        self.estimated_tokens as f32 / self.max_tokens as f32
    }

    pub fn exceeds_threshold(&self) -> bool {
        self.usage_ratio() > self.compression_threshold_ratio
    }

    /// Over threshold and long enough that folding actually saves something.
    pub fn should_compress(&self, conversation_len: usize, min_messages: usize) -> bool {
        self.exceeds_threshold() && conversation_len > min_messages
    }

    pub fn describe(&self) -> String {
        format!(
            "~{} / {} tokens ({:.0}%)",
            self.estimated_tokens,
            self.max_tokens,
            self.usage_ratio() * 100.0
        )
    }
}
