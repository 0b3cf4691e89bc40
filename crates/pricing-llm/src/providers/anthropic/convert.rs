use super::types::{AnthropicContent, AnthropicMessage};
use crate::router::{Message, MessageRole};

/// Convert our message to Anthropic format, returning system message separately
pub(crate) fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
    let mut system_parts = Vec::new();
    let mut anthropic_messages = Vec::new();

    for msg in messages {
        match msg.role {
            MessageRole::System => {
                if !msg.content.is_empty() {
                    system_parts.push(msg.content.clone());
                }
            }
            MessageRole::User => {
                anthropic_messages.push(AnthropicMessage {
                    role: "user".to_string(),
                    content: AnthropicContent::Text(msg.content.clone()),
                });
            }
            MessageRole::Assistant => {
                anthropic_messages.push(AnthropicMessage {
                    role: "assistant".to_string(),
                    content: AnthropicContent::Text(msg.content.clone()),
                });
            }
        }
    }

    let system_message =
        if !system_parts.is_empty() { Some(system_parts.join("\n\n")) } else { None };

    (system_message, anthropic_messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_system_messages_out() {
        let messages =
            vec![Message::system("be concise"), Message::user("hi"), Message::assistant("hello")];
        let (system, converted) = convert_messages(&messages);
        assert_eq!(system, Some("be concise".to_string()));
        assert_eq!(converted.len(), 2);
    }
}
