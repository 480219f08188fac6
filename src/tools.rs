//! Reconciliation of the two mutually exclusive calling conventions: legacy
//! singular function calls and modern multi-call tool calls. Backends only
//! understand the tool representation, so function-style messages are
//! rewritten into it with the function name doubling as the correlation id.

use serde::{Deserialize, Serialize};

use crate::errors::{GatewayError, GatewayResult};
use crate::models::message::{AiToolCallMessage, ChatMessage, HumanToolResultMessage};
use crate::models::tool::ToolCall;

/// The calling convention negotiated for a request. Absent means the request
/// declared neither tools nor functions, so the conversation must contain no
/// tool/function messages at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolsMode {
    Tools,
    Functions,
}

/// Validate a message against the active calling convention and rewrite
/// function-style messages into the tool representation:
///
/// 1. without a config, no tool or function messages are allowed
/// 2. with a tools config, no function messages are allowed
/// 3. with a functions config, no tools messages are allowed
/// 4. with a functions config, function call/result messages become tool
///    call/result messages whose id is the function name
pub fn process_with_tools(
    message: ChatMessage,
    tools_mode: Option<ToolsMode>,
) -> GatewayResult<ChatMessage> {
    match tools_mode {
        None => match message {
            ChatMessage::System(_) | ChatMessage::HumanRegular(_) | ChatMessage::AiRegular(_) => {
                Ok(message)
            }
            ChatMessage::AiToolCall(_)
            | ChatMessage::AiFunctionCall(_)
            | ChatMessage::HumanToolResult(_)
            | ChatMessage::HumanFunctionResult(_) => Err(GatewayError::validation(
                "You cannot use messages with functions or tools without config. \
                 Please change your messages.",
            )),
        },
        Some(ToolsMode::Tools) => match message {
            ChatMessage::AiFunctionCall(_) | ChatMessage::HumanFunctionResult(_) => Err(
                GatewayError::validation("You cannot use function messages with tools config."),
            ),
            other => Ok(other),
        },
        Some(ToolsMode::Functions) => match message {
            ChatMessage::System(_) | ChatMessage::HumanRegular(_) | ChatMessage::AiRegular(_) => {
                Ok(message)
            }
            ChatMessage::AiToolCall(_) | ChatMessage::HumanToolResult(_) => Err(
                GatewayError::validation("You cannot use tools messages with functions config."),
            ),
            ChatMessage::AiFunctionCall(msg) => Ok(ChatMessage::AiToolCall(AiToolCallMessage {
                content: msg.content,
                calls: vec![ToolCall::from_function_call(msg.call)],
            })),
            ChatMessage::HumanFunctionResult(msg) => {
                Ok(ChatMessage::HumanToolResult(HumanToolResultMessage {
                    id: msg.name,
                    content: msg.content,
                }))
            }
        },
    }
}
