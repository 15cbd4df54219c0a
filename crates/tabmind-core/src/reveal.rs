//! Cosmetic character-by-character reveal of a finished reply.
//!
//! The stream only produces strings for rendering. It is pull-based, so a
//! front-end that stops polling (or drops it) cancels the animation, and it
//! never touches the conversation.

use futures_util::stream::{self, Stream};
use std::time::Duration;

/// Yields growing prefixes of `text`, one character longer each time, waiting
/// `interval` before each one. `Duration::ZERO` yields without sleeping.
pub fn reveal(text: &str, interval: Duration) -> impl Stream<Item = String> + Send + 'static {
    let chars: Vec<char> = text.chars().collect();

    stream::unfold((chars, 0usize), move |(chars, shown)| async move {
        if shown >= chars.len() {
            return None;
        }
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        let next = shown + 1;
        let prefix: String = chars[..next].iter().collect();
        Some((prefix, (chars, next)))
    })
}
