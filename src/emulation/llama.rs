//! Llama-2 instruction template.
//!
//! Each user turn is wrapped as `<s>[INST] ... [/INST]`, each assistant reply
//! follows inline and is closed with `</s>`. The system content rides inside
//! a `<<SYS>>` block embedded in the first user turn.

use super::{split_dialogue, ChatEmulator};
use crate::errors::GatewayResult;
use crate::models::message::ChatMessage;

const BOS: &str = "<s>";
const EOS: &str = "</s>";
const B_INST: &str = "[INST]";
const E_INST: &str = "[/INST]";
const B_SYS: &str = "<<SYS>>\n";
const E_SYS: &str = "\n<</SYS>>\n\n";

pub struct LlamaChatEmulator;

impl ChatEmulator for LlamaChatEmulator {
    fn display(&self, messages: &[ChatMessage]) -> GatewayResult<(String, Vec<String>)> {
        let dialogue = split_dialogue(messages)?;

        let mut prompt = String::new();
        for (index, (user, assistant)) in dialogue.turns.iter().enumerate() {
            let user_text = match (index, dialogue.system) {
                // The system content is embedded verbatim; only the combined
                // turn text is trimmed at the edges.
                (0, Some(system)) => format!("{}{}{}{}", B_SYS, system, E_SYS, user),
                _ => (*user).to_string(),
            };
            let user_text = user_text.trim();

            match assistant {
                Some(assistant) => {
                    prompt.push_str(&format!(
                        "{}{} {} {} {} {}",
                        BOS,
                        B_INST,
                        user_text,
                        E_INST,
                        assistant.trim(),
                        EOS
                    ));
                }
                None => {
                    prompt.push_str(&format!("{}{} {} {}", BOS, B_INST, user_text, E_INST));
                }
            }
        }

        Ok((prompt, vec![]))
    }
}

/// Turn units for truncation: the optional system message alone, then each
/// (user, assistant) pair, then the trailing unanswered user message.
pub fn llama_partitioner(messages: &[ChatMessage]) -> Vec<usize> {
    let mut sizes = Vec::new();
    let mut rest = messages;

    if matches!(rest.first(), Some(ChatMessage::System(_))) {
        sizes.push(1);
        rest = &rest[1..];
    }
    while rest.len() >= 2 {
        sizes.push(2);
        rest = &rest[2..];
    }
    if !rest.is_empty() {
        sizes.push(1);
    }
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_message() {
        let messages = vec![ChatMessage::user("  human message1  ")];

        let (text, stop_sequences) = LlamaChatEmulator.display(&messages).unwrap();

        assert!(stop_sequences.is_empty());
        assert_eq!(text, "<s>[INST] human message1 [/INST]");
    }

    #[test]
    fn test_many_messages_without_system() {
        let messages = vec![
            ChatMessage::user("  human message1  "),
            ChatMessage::assistant("     ai message1     "),
            ChatMessage::user("  human message2  "),
        ];

        let (text, stop_sequences) = LlamaChatEmulator.display(&messages).unwrap();

        assert!(stop_sequences.is_empty());
        assert_eq!(
            text,
            concat!(
                "<s>[INST] human message1 [/INST]",
                " ai message1 </s>",
                "<s>[INST] human message2 [/INST]",
            )
        );
    }

    #[test]
    fn test_many_messages_with_system() {
        let messages = vec![
            ChatMessage::system(" system message1 "),
            ChatMessage::user("  human message1  "),
            ChatMessage::assistant("     ai message1     "),
            ChatMessage::user("  human message2  "),
        ];

        let (text, stop_sequences) = LlamaChatEmulator.display(&messages).unwrap();

        assert!(stop_sequences.is_empty());
        assert_eq!(
            text,
            concat!(
                "<s>[INST] <<SYS>>\n system message1 \n<</SYS>>\n\n  human message1 [/INST]",
                " ai message1 </s>",
                "<s>[INST] human message2 [/INST]",
            )
        );
    }

    #[test]
    fn test_invalid_alternation() {
        let messages = vec![
            ChatMessage::assistant("     ai message1     "),
            ChatMessage::user("  human message1  "),
            ChatMessage::user("  human message2  "),
        ];

        let err = LlamaChatEmulator.display(&messages).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The model only supports initial optional system message \
             and follow-up alternating human/assistant messages"
        );
    }

    #[test]
    fn test_invalid_last_message() {
        let messages = vec![
            ChatMessage::user("  human message1  "),
            ChatMessage::assistant("     ai message1     "),
            ChatMessage::user("  human message2  "),
            ChatMessage::assistant("     ai message2     "),
        ];

        let err = LlamaChatEmulator.display(&messages).unwrap_err();
        assert_eq!(err.to_string(), "The last message must be from user");
    }

    #[test]
    fn test_partitioner_with_system() {
        let messages = vec![
            ChatMessage::system("s"),
            ChatMessage::user("u1"),
            ChatMessage::assistant("a1"),
            ChatMessage::user("u2"),
            ChatMessage::assistant("a2"),
            ChatMessage::user("u3"),
        ];
        assert_eq!(llama_partitioner(&messages), vec![1, 2, 2, 1]);
    }

    #[test]
    fn test_partitioner_without_system() {
        let messages = vec![
            ChatMessage::user("u1"),
            ChatMessage::assistant("a1"),
            ChatMessage::user("u2"),
        ];
        assert_eq!(llama_partitioner(&messages), vec![2, 1]);
    }
}
