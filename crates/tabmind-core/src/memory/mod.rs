//! Conversation memory and context budgeting.
//!
//! Holds the live transcript, the token estimator that measures it, and the
//! compressor that folds old messages once the estimate crosses the
//! configured threshold.

pub mod budget;
pub mod compressor;
pub mod conversation;

pub use budget::{estimate_conversation_tokens, estimate_message_tokens, estimate_tokens, ContextBudget};
pub use compressor::ContextCompressor;
pub use conversation::Conversation;
