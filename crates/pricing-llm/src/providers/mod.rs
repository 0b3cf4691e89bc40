/// Anthropic provider
pub mod anthropic;
