//! Token counting and budget management
//!
//! Token counting uses tiktoken's cl100k_base encoding, which is a close
//! enough estimate for Claude and GPT-family models alike.

use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tiktoken_rs::{cl100k_base, CoreBPE};

/// Global tokenizer instance (initialized once, thread-safe).
static TOKENIZER: LazyLock<CoreBPE> = LazyLock::new(|| {
    cl100k_base().expect("cl100k_base tokenizer is a compile-time constant and should never fail")
});

/// Token counter for estimating message token usage.
///
/// A zero-cost wrapper around the global tokenizer instance.
#[derive(Clone, Copy)]
pub struct TokenCounter;

impl TokenCounter {
    /// Create a new token counter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Count tokens in a string.
    #[must_use]
    pub fn count_tokens(&self, text: &str) -> usize {
        TOKENIZER.encode_with_special_tokens(text).len()
    }

    /// Count tokens in a message (includes role/separator overhead).
    #[must_use]
    pub fn count_message_tokens(&self, message: &Message) -> usize {
        const MESSAGE_OVERHEAD: usize = 6;
        self.count_tokens(&message.content) + MESSAGE_OVERHEAD
    }

    /// Count total tokens in a conversation.
    #[must_use]
    pub fn count_conversation_tokens(&self, messages: &[Message]) -> usize {
        const CONVERSATION_OVERHEAD: usize = 3;
        messages.iter().map(|m| self.count_message_tokens(m)).sum::<usize>() + CONVERSATION_OVERHEAD
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static::lazy_static! {
    /// Global token counter instance for convenience.
    pub static ref TOKEN_COUNTER: TokenCounter = TokenCounter::new();
}

/// Convenience function to count tokens in text.
#[must_use]
pub fn count_tokens(text: &str) -> usize {
    TOKEN_COUNTER.count_tokens(text)
}

/// Convenience function to count tokens in messages.
#[must_use]
pub fn count_message_tokens(messages: &[Message]) -> usize {
    TOKEN_COUNTER.count_conversation_tokens(messages)
}

/// Token budget configuration for a task type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBudget {
    /// Maximum tokens to generate for this task type.
    pub max_tokens: u32,
    /// Recommended temperature for this task type.
    pub temperature: f32,
}

impl TokenBudget {
    /// Create a new token budget.
    #[must_use]
    pub const fn new(max_tokens: u32, temperature: f32) -> Self {
        Self { max_tokens, temperature }
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self { max_tokens: 512, temperature: 0.3 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_counter_basic() {
        let counter = TokenCounter::new();
        let tokens = counter.count_tokens("Hello, world!");
        assert!(tokens > 0);
        assert!(tokens < 10);
        assert_eq!(counter.count_tokens(""), 0);
    }

    #[test]
    fn test_token_counter_conversation() {
        let counter = TokenCounter::new();
        let messages = vec![
            Message::system("You are a helpful assistant."),
            Message::user("Hello!"),
            Message::assistant("Hi there! How can I help you?"),
        ];
        let total = counter.count_conversation_tokens(&messages);
        let sum: usize = messages.iter().map(|m| counter.count_message_tokens(m)).sum();
        assert!(total >= sum);
    }

    #[test]
    fn test_token_budget_default() {
        let budget = TokenBudget::default();
        assert_eq!(budget.max_tokens, 512);
        assert_eq!(budget.temperature, 0.3);
    }

    #[test]
    fn test_token_budget_new() {
        let budget = TokenBudget::new(500, 0.3);
        assert_eq!(budget.max_tokens, 500);
        assert_eq!(budget.temperature, 0.3);
    }
}
