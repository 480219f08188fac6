//! Role-prefixed pseudo-chat template for completion backends that have no
//! instruction format of their own. The conversation is flattened into
//! `Human:`/`Assistant:` paragraphs and the backend is stopped as soon as it
//! starts speaking for the human.

use super::{split_dialogue, ChatEmulator};
use crate::errors::GatewayResult;
use crate::models::message::ChatMessage;

const HUMAN_PREFIX: &str = "\n\nHuman:";
const ASSISTANT_PREFIX: &str = "\n\nAssistant:";

pub struct PseudoChatEmulator;

impl ChatEmulator for PseudoChatEmulator {
    fn display(&self, messages: &[ChatMessage]) -> GatewayResult<(String, Vec<String>)> {
        let dialogue = split_dialogue(messages)?;

        let mut prompt = String::new();
        if let Some(system) = dialogue.system {
            prompt.push_str(system.trim());
        }
        for (user, assistant) in &dialogue.turns {
            prompt.push_str(HUMAN_PREFIX);
            prompt.push(' ');
            prompt.push_str(user.trim());
            if let Some(assistant) = assistant {
                prompt.push_str(ASSISTANT_PREFIX);
                prompt.push(' ');
                prompt.push_str(assistant.trim());
            }
        }
        // Cue the model to answer as the assistant.
        prompt.push_str(ASSISTANT_PREFIX);

        Ok((prompt, vec![HUMAN_PREFIX.to_string()]))
    }
}
