use serde::{Deserialize, Serialize};

use super::attachment::CustomContent;
use super::tool::{FunctionCall, ToolCall};
use crate::errors::{GatewayError, GatewayResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
    Tool,
}

/// The generic finish-reason vocabulary reported back to gateway clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    FunctionCall,
}

/// A message as it appears on the wire: a role plus a bag of optional fields.
/// Which combinations are meaningful is decided by [`parse_message`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_content: Option<CustomContent>,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMessage {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanRegularMessage {
    pub content: String,
    pub custom_content: Option<CustomContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRegularMessage {
    pub content: String,
    pub custom_content: Option<CustomContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiToolCallMessage {
    pub content: Option<String>,
    pub calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiFunctionCallMessage {
    pub content: Option<String>,
    pub call: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanToolResultMessage {
    pub id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanFunctionResultMessage {
    pub name: String,
    pub content: String,
}

/// The canonical message model: a closed set of role/shape variants.
///
/// Every consumer matches on this exhaustively, so adding a variant forces
/// every call site to decide what it means there. Several failure paths in
/// the tool translator and template emulators exist precisely to reject
/// combinations this type cannot express.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatMessage {
    System(SystemMessage),
    HumanRegular(HumanRegularMessage),
    AiRegular(AiRegularMessage),
    AiToolCall(AiToolCallMessage),
    AiFunctionCall(AiFunctionCallMessage),
    HumanToolResult(HumanToolResultMessage),
    HumanFunctionResult(HumanFunctionResultMessage),
}

impl ChatMessage {
    pub fn system<S: Into<String>>(content: S) -> Self {
        ChatMessage::System(SystemMessage {
            content: content.into(),
        })
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        ChatMessage::HumanRegular(HumanRegularMessage {
            content: content.into(),
            custom_content: None,
        })
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        ChatMessage::AiRegular(AiRegularMessage {
            content: content.into(),
            custom_content: None,
        })
    }

    /// The plain text content, if this variant always carries one.
    pub fn content(&self) -> Option<&str> {
        match self {
            ChatMessage::System(msg) => Some(&msg.content),
            ChatMessage::HumanRegular(msg) => Some(&msg.content),
            ChatMessage::AiRegular(msg) => Some(&msg.content),
            ChatMessage::AiToolCall(msg) => msg.content.as_deref(),
            ChatMessage::AiFunctionCall(msg) => msg.content.as_deref(),
            ChatMessage::HumanToolResult(msg) => Some(&msg.content),
            ChatMessage::HumanFunctionResult(msg) => Some(&msg.content),
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, ChatMessage::System(_))
    }

    /// Serialize back into the wire shape. Inverse of [`parse_message`] for
    /// every value that parsing can produce.
    pub fn to_wire(&self) -> WireMessage {
        match self {
            ChatMessage::System(msg) => WireMessage {
                role: Role::System,
                content: Some(msg.content.clone()),
                ..Default::default()
            },
            ChatMessage::HumanRegular(msg) => WireMessage {
                role: Role::User,
                content: Some(msg.content.clone()),
                custom_content: msg.custom_content.clone(),
                ..Default::default()
            },
            ChatMessage::AiRegular(msg) => WireMessage {
                role: Role::Assistant,
                content: Some(msg.content.clone()),
                custom_content: msg.custom_content.clone(),
                ..Default::default()
            },
            ChatMessage::AiToolCall(msg) => WireMessage {
                role: Role::Assistant,
                content: msg.content.clone(),
                tool_calls: Some(msg.calls.clone()),
                ..Default::default()
            },
            ChatMessage::AiFunctionCall(msg) => WireMessage {
                role: Role::Assistant,
                content: msg.content.clone(),
                function_call: Some(msg.call.clone()),
                ..Default::default()
            },
            ChatMessage::HumanToolResult(msg) => WireMessage {
                role: Role::Tool,
                content: Some(msg.content.clone()),
                tool_call_id: Some(msg.id.clone()),
                ..Default::default()
            },
            ChatMessage::HumanFunctionResult(msg) => WireMessage {
                role: Role::Function,
                content: Some(msg.content.clone()),
                name: Some(msg.name.clone()),
                ..Default::default()
            },
        }
    }
}

fn parse_assistant_message(wire: &WireMessage) -> GatewayResult<ChatMessage> {
    match (&wire.content, &wire.function_call, &wire.tool_calls) {
        (Some(content), None, None) => Ok(ChatMessage::AiRegular(AiRegularMessage {
            content: content.clone(),
            custom_content: wire.custom_content.clone(),
        })),
        (content, Some(call), None) => Ok(ChatMessage::AiFunctionCall(AiFunctionCallMessage {
            content: content.clone(),
            call: call.clone(),
        })),
        (content, None, Some(calls)) => Ok(ChatMessage::AiToolCall(AiToolCallMessage {
            content: content.clone(),
            calls: calls.clone(),
        })),
        _ => Err(GatewayError::validation(
            "Unknown type of assistant message",
        )),
    }
}

/// Parse a wire message into exactly one canonical variant, or fail when the
/// role/field combination matches none of them.
pub fn parse_message(wire: &WireMessage) -> GatewayResult<ChatMessage> {
    match wire.role {
        Role::System => match &wire.content {
            Some(content) => Ok(ChatMessage::system(content.clone())),
            None => Err(unknown_message()),
        },
        Role::User => match &wire.content {
            Some(content) => Ok(ChatMessage::HumanRegular(HumanRegularMessage {
                content: content.clone(),
                custom_content: wire.custom_content.clone(),
            })),
            None => Err(unknown_message()),
        },
        Role::Assistant => parse_assistant_message(wire),
        Role::Function => match (&wire.name, &wire.content) {
            (Some(name), Some(content)) => {
                Ok(ChatMessage::HumanFunctionResult(HumanFunctionResultMessage {
                    name: name.clone(),
                    content: content.clone(),
                }))
            }
            _ => Err(unknown_message()),
        },
        Role::Tool => match (&wire.tool_call_id, &wire.content) {
            (Some(id), Some(content)) => {
                Ok(ChatMessage::HumanToolResult(HumanToolResultMessage {
                    id: id.clone(),
                    content: content.clone(),
                }))
            }
            _ => Err(unknown_message()),
        },
    }
}

fn unknown_message() -> GatewayError {
    GatewayError::validation("Unknown message type or invalid message")
}
