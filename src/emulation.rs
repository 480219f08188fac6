//! Chat-template emulation for backends with no native multi-turn chat API.
//!
//! Each backend grammar is one implementation of [`ChatEmulator`]; selecting
//! a backend is a lookup, not inheritance. All emulators share the same
//! structural contract: an optional leading system message, strict
//! human/assistant alternation, and a dangling user message at the end.

pub mod llama;
pub mod pseudo;

use crate::errors::{GatewayError, GatewayResult};
use crate::models::message::ChatMessage;

pub use llama::LlamaChatEmulator;
pub use pseudo::PseudoChatEmulator;

/// Serializes an already-truncated, already-mode-reconciled message sequence
/// into a flat prompt plus the stop sequences the backend needs.
pub trait ChatEmulator: Send + Sync {
    fn display(&self, messages: &[ChatMessage]) -> GatewayResult<(String, Vec<String>)>;
}

/// The template grammars currently supported, selected by the active model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFamily {
    Llama,
    PseudoChat,
}

pub fn emulator_for(family: TemplateFamily) -> &'static dyn ChatEmulator {
    match family {
        TemplateFamily::Llama => &LlamaChatEmulator,
        TemplateFamily::PseudoChat => &PseudoChatEmulator,
    }
}

const ALTERNATION_ERROR: &str = "The model only supports initial optional system message \
                                 and follow-up alternating human/assistant messages";

/// A validated conversation: optional system content plus user turns, each
/// answered except the final one.
#[derive(Debug)]
pub(crate) struct Dialogue<'a> {
    pub system: Option<&'a str>,
    pub turns: Vec<(&'a str, Option<&'a str>)>,
}

/// Enforce the shared structural contract and split the conversation into
/// (user, assistant) turns. The final turn is the unanswered prompt.
pub(crate) fn split_dialogue(messages: &[ChatMessage]) -> GatewayResult<Dialogue<'_>> {
    let (system, rest) = match messages.split_first() {
        Some((ChatMessage::System(sys), rest)) => (Some(sys.content.as_str()), rest),
        _ => (None, messages),
    };

    if !matches!(rest.last(), Some(ChatMessage::HumanRegular(_))) {
        return Err(GatewayError::validation("The last message must be from user"));
    }

    let mut turns = Vec::with_capacity(rest.len().div_ceil(2));
    for pair in rest.chunks(2) {
        let user = match &pair[0] {
            ChatMessage::HumanRegular(msg) => msg.content.as_str(),
            _ => return Err(GatewayError::validation(ALTERNATION_ERROR)),
        };
        let assistant = match pair.get(1) {
            Some(ChatMessage::AiRegular(msg)) => Some(msg.content.as_str()),
            Some(_) => return Err(GatewayError::validation(ALTERNATION_ERROR)),
            None => None,
        };
        turns.push((user, assistant));
    }

    Ok(Dialogue { system, turns })
}
