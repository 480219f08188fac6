//! Translation to and from the Claude messages API, the chat-capable backend
//! family. The message sequence must already be truncated and mode-reconciled
//! (no function-style messages reach this layer).

use futures::future::try_join_all;
use regex::Regex;
use serde_json::{json, Value};

use crate::attachments::{resolve_attachment, ResolvedAttachment};
use crate::errors::{GatewayError, GatewayResult};
use crate::models::attachment::CustomContent;
use crate::models::message::{AiToolCallMessage, ChatMessage, FinishReason};
use crate::models::tool::{Function, FunctionCall, ToolCall};
use crate::storage::FileStorage;
use crate::tools::ToolsMode;

const NO_TOOLS_CONFIGURED: &str =
    "A model has called a tool, but no tools were given to the model in the first place.";

/// Stop reasons the Claude API can report. A value outside this set is a
/// contract violation and fails loudly instead of degrading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
}

pub fn parse_stop_reason(reason: &str) -> GatewayResult<StopReason> {
    match reason {
        "end_turn" => Ok(StopReason::EndTurn),
        "max_tokens" => Ok(StopReason::MaxTokens),
        "stop_sequence" => Ok(StopReason::StopSequence),
        "tool_use" => Ok(StopReason::ToolUse),
        other => Err(GatewayError::internal(format!(
            "Unknown stop reason: {}",
            other
        ))),
    }
}

/// Map a backend stop reason to the generic finish-reason vocabulary,
/// consulting the active calling convention for tool-use stops.
pub fn to_finish_reason(
    stop_reason: Option<&str>,
    tools_mode: Option<ToolsMode>,
) -> GatewayResult<FinishReason> {
    let Some(reason) = stop_reason else {
        return Ok(FinishReason::Stop);
    };

    match parse_stop_reason(reason)? {
        StopReason::EndTurn | StopReason::StopSequence => Ok(FinishReason::Stop),
        StopReason::MaxTokens => Ok(FinishReason::Length),
        StopReason::ToolUse => match tools_mode {
            Some(ToolsMode::Tools) => Ok(FinishReason::ToolCalls),
            Some(ToolsMode::Functions) => Ok(FinishReason::FunctionCall),
            None => Err(GatewayError::validation(NO_TOOLS_CONFIGURED)),
        },
    }
}

fn image_block(attachment: ResolvedAttachment) -> Value {
    json!({
        "type": "image",
        "source": {
            "type": "base64",
            "media_type": attachment.media_type,
            "data": attachment.data,
        }
    })
}

fn text_block(text: &str) -> Value {
    json!({"type": "text", "text": text})
}

/// Resolve attachments concurrently and assemble the content blocks for a
/// regular turn. Block order follows attachment order, text last.
async fn regular_content_blocks(
    content: &str,
    custom_content: Option<&CustomContent>,
    file_storage: Option<&dyn FileStorage>,
) -> GatewayResult<Vec<Value>> {
    let attachments = custom_content
        .and_then(|custom| custom.attachments.as_deref())
        .unwrap_or(&[]);

    let resolved = try_join_all(
        attachments
            .iter()
            .map(|attachment| resolve_attachment(attachment, file_storage)),
    )
    .await?;

    let mut blocks: Vec<Value> = resolved.into_iter().map(image_block).collect();
    blocks.push(text_block(content));
    Ok(blocks)
}

fn tool_use_block(call: &ToolCall) -> GatewayResult<Value> {
    let input: Value = serde_json::from_str(&call.function.arguments).map_err(|e| {
        GatewayError::validation(format!(
            "Invalid arguments of tool call {}: {}",
            call.id, e
        ))
    })?;

    Ok(json!({
        "type": "tool_use",
        "id": call.id,
        "name": call.function.name,
        "input": input,
    }))
}

fn tool_call_blocks(message: &AiToolCallMessage) -> GatewayResult<Vec<Value>> {
    let mut blocks = Vec::with_capacity(message.calls.len() + 1);
    if let Some(content) = &message.content {
        blocks.push(text_block(content));
    }
    for call in &message.calls {
        blocks.push(tool_use_block(call)?);
    }
    Ok(blocks)
}

/// Serialize a message sequence into the Claude native form: the system
/// prompt split off, and one JSON message per remaining turn.
pub async fn to_claude_messages(
    messages: &[ChatMessage],
    file_storage: Option<&dyn FileStorage>,
) -> GatewayResult<(Option<String>, Vec<Value>)> {
    let (system_prompt, rest) = match messages.split_first() {
        Some((ChatMessage::System(sys), rest)) => (Some(sys.content.clone()), rest),
        _ => (None, messages),
    };

    let mut claude_messages = Vec::with_capacity(rest.len());
    for message in rest {
        let converted = match message {
            ChatMessage::HumanRegular(msg) => {
                let content =
                    regular_content_blocks(&msg.content, msg.custom_content.as_ref(), file_storage)
                        .await?;
                json!({"role": "user", "content": content})
            }
            ChatMessage::AiRegular(msg) => {
                let content =
                    regular_content_blocks(&msg.content, msg.custom_content.as_ref(), file_storage)
                        .await?;
                json!({"role": "assistant", "content": content})
            }
            ChatMessage::AiToolCall(msg) => json!({
                "role": "assistant",
                "content": tool_call_blocks(msg)?,
            }),
            ChatMessage::HumanToolResult(msg) => json!({
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": msg.id,
                    "content": [text_block(&msg.content)],
                }],
            }),
            ChatMessage::System(_) => {
                return Err(GatewayError::validation(
                    "System message is only allowed as the first message",
                ))
            }
            ChatMessage::AiFunctionCall(_) | ChatMessage::HumanFunctionResult(_) => {
                return Err(GatewayError::internal(
                    "function messages must be reconciled into tool messages \
                     before backend serialization",
                ))
            }
        };
        claude_messages.push(converted);
    }

    Ok((system_prompt, claude_messages))
}

fn is_valid_function_name(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    re.is_match(name)
}

/// Convert tool declarations into the Claude tool config list.
pub fn to_claude_tool_configs(functions: &[Function]) -> GatewayResult<Vec<Value>> {
    let mut names = std::collections::HashSet::new();
    let mut configs = Vec::with_capacity(functions.len());

    for function in functions {
        if !is_valid_function_name(&function.name) {
            return Err(GatewayError::validation(format!(
                "The function name '{}' had invalid characters, \
                 it must match this regex [a-zA-Z0-9_-]+",
                function.name
            )));
        }
        if !names.insert(&function.name) {
            return Err(GatewayError::validation(format!(
                "Duplicate function name: {}",
                function.name
            )));
        }

        configs.push(json!({
            "name": function.name,
            "description": function.description.as_deref().unwrap_or(""),
            "input_schema": function
                .parameters
                .clone()
                .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
        }));
    }

    Ok(configs)
}

/// Build a generic function call from a Claude tool_use block: the input is
/// re-encoded as the JSON argument string the wire protocol expects.
pub fn to_function_call(block: &Value) -> GatewayResult<FunctionCall> {
    let name = block
        .get("name")
        .and_then(|name| name.as_str())
        .ok_or_else(|| GatewayError::internal("tool_use block has no name"))?;
    let input = block.get("input").cloned().unwrap_or_else(|| json!({}));
    let arguments = serde_json::to_string(&input)
        .map_err(|e| GatewayError::internal(format!("Unserializable tool input: {}", e)))?;

    Ok(FunctionCall::new(name, arguments))
}

/// Build a generic tool call from a Claude tool_use block, preserving the
/// backend-assigned id verbatim.
pub fn to_tool_call(block: &Value) -> GatewayResult<ToolCall> {
    let id = block
        .get("id")
        .and_then(|id| id.as_str())
        .ok_or_else(|| GatewayError::internal("tool_use block has no id"))?;

    Ok(ToolCall::new(id, to_function_call(block)?))
}

/// Parse a Claude completion back into the canonical assistant message,
/// honoring the active calling convention for tool_use blocks.
pub fn claude_response_to_message(
    response: &Value,
    tools_mode: Option<ToolsMode>,
) -> GatewayResult<ChatMessage> {
    let blocks = response
        .get("content")
        .and_then(|content| content.as_array())
        .ok_or_else(|| GatewayError::internal("Claude response has no content blocks"))?;

    let mut text_parts: Vec<&str> = Vec::new();
    let mut tool_uses: Vec<&Value> = Vec::new();
    for block in blocks {
        match block.get("type").and_then(|t| t.as_str()) {
            Some("text") => {
                text_parts.push(block.get("text").and_then(|t| t.as_str()).unwrap_or(""));
            }
            Some("tool_use") => tool_uses.push(block),
            other => {
                return Err(GatewayError::internal(format!(
                    "Unknown content block type: {:?}",
                    other
                )))
            }
        }
    }

    let text = text_parts.concat();
    if tool_uses.is_empty() {
        return Ok(ChatMessage::assistant(text));
    }

    let content = (!text.is_empty()).then_some(text);
    match tools_mode {
        None => Err(GatewayError::validation(NO_TOOLS_CONFIGURED)),
        Some(ToolsMode::Tools) => {
            let calls = tool_uses
                .into_iter()
                .map(to_tool_call)
                .collect::<GatewayResult<Vec<_>>>()?;
            Ok(ChatMessage::AiToolCall(AiToolCallMessage { content, calls }))
        }
        Some(ToolsMode::Functions) => {
            // The legacy convention holds exactly one call per assistant
            // turn; a model producing more cannot be represented.
            if tool_uses.len() > 1 {
                return Err(GatewayError::internal(format!(
                    "The model returned {} tool calls for a single function call",
                    tool_uses.len()
                )));
            }
            let call = to_function_call(tool_uses[0])?;
            Ok(ChatMessage::AiFunctionCall(
                crate::models::message::AiFunctionCallMessage { content, call },
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attachment::Attachment;
    use crate::models::message::HumanRegularMessage;

    #[tokio::test]
    async fn test_system_prompt_is_split_off() -> anyhow::Result<()> {
        let messages = vec![
            ChatMessage::system("be helpful"),
            ChatMessage::user("hi"),
        ];

        let (system, converted) = to_claude_messages(&messages, None).await?;

        assert_eq!(system.as_deref(), Some("be helpful"));
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0]["role"], "user");
        assert_eq!(
            converted[0]["content"],
            json!([{"type": "text", "text": "hi"}])
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_misplaced_system_message_fails() {
        let messages = vec![
            ChatMessage::user("hi"),
            ChatMessage::system("be helpful"),
        ];

        let err = to_claude_messages(&messages, None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "System message is only allowed as the first message"
        );
    }

    #[tokio::test]
    async fn test_inline_attachment_becomes_image_block() -> anyhow::Result<()> {
        let messages = vec![ChatMessage::HumanRegular(HumanRegularMessage {
            content: "what is this?".to_string(),
            custom_content: Some(CustomContent {
                attachments: Some(vec![Attachment::from_data("image/png", "aGVsbG8=")]),
            }),
        })];

        let (_, converted) = to_claude_messages(&messages, None).await?;

        assert_eq!(
            converted[0]["content"],
            json!([
                {
                    "type": "image",
                    "source": {
                        "type": "base64",
                        "media_type": "image/png",
                        "data": "aGVsbG8=",
                    }
                },
                {"type": "text", "text": "what is this?"},
            ])
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_tool_call_turn_and_result_turn() -> anyhow::Result<()> {
        let messages = vec![
            ChatMessage::AiToolCall(AiToolCallMessage {
                content: Some("checking".to_string()),
                calls: vec![ToolCall::new(
                    "call_1",
                    FunctionCall::new("get_weather", r#"{"city":"Kyiv"}"#),
                )],
            }),
            ChatMessage::HumanToolResult(crate::models::message::HumanToolResultMessage {
                id: "call_1".to_string(),
                content: "sunny".to_string(),
            }),
            ChatMessage::user("thanks"),
        ];

        let (_, converted) = to_claude_messages(&messages, None).await?;

        assert_eq!(converted[0]["role"], "assistant");
        assert_eq!(
            converted[0]["content"],
            json!([
                {"type": "text", "text": "checking"},
                {
                    "type": "tool_use",
                    "id": "call_1",
                    "name": "get_weather",
                    "input": {"city": "Kyiv"},
                },
            ])
        );
        assert_eq!(
            converted[1]["content"],
            json!([{
                "type": "tool_result",
                "tool_use_id": "call_1",
                "content": [{"type": "text", "text": "sunny"}],
            }])
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unreconciled_function_message_is_internal_error() {
        let messages = vec![ChatMessage::HumanFunctionResult(
            crate::models::message::HumanFunctionResultMessage {
                name: "get_weather".to_string(),
                content: "sunny".to_string(),
            },
        )];

        let err = to_claude_messages(&messages, None).await.unwrap_err();
        assert!(matches!(err, GatewayError::Internal(_)));
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(to_finish_reason(None, None), Ok(FinishReason::Stop));
        assert_eq!(
            to_finish_reason(Some("end_turn"), None),
            Ok(FinishReason::Stop)
        );
        assert_eq!(
            to_finish_reason(Some("stop_sequence"), Some(ToolsMode::Tools)),
            Ok(FinishReason::Stop)
        );
        assert_eq!(
            to_finish_reason(Some("max_tokens"), None),
            Ok(FinishReason::Length)
        );
        assert_eq!(
            to_finish_reason(Some("tool_use"), Some(ToolsMode::Tools)),
            Ok(FinishReason::ToolCalls)
        );
        assert_eq!(
            to_finish_reason(Some("tool_use"), Some(ToolsMode::Functions)),
            Ok(FinishReason::FunctionCall)
        );
    }

    #[test]
    fn test_tool_use_without_mode_fails() {
        let err = to_finish_reason(Some("tool_use"), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "A model has called a tool, but no tools were given to the model in the first place."
        );
    }

    #[test]
    fn test_unknown_stop_reason_is_internal_error() {
        let err = to_finish_reason(Some("refusal"), Some(ToolsMode::Tools)).unwrap_err();
        assert!(matches!(err, GatewayError::Internal(_)));
    }

    #[test]
    fn test_tool_configs() -> anyhow::Result<()> {
        let functions = vec![
            Function::new("get_weather")
                .with_description("Current weather for a city")
                .with_parameters(json!({
                    "type": "object",
                    "properties": {"city": {"type": "string"}},
                    "required": ["city"],
                })),
            Function::new("get_time"),
        ];

        let configs = to_claude_tool_configs(&functions)?;

        assert_eq!(configs[0]["name"], "get_weather");
        assert_eq!(configs[0]["description"], "Current weather for a city");
        assert_eq!(configs[0]["input_schema"]["required"], json!(["city"]));
        assert_eq!(
            configs[1]["input_schema"],
            json!({"type": "object", "properties": {}})
        );
        Ok(())
    }

    #[test]
    fn test_tool_configs_reject_duplicates_and_bad_names() {
        let duplicated = vec![Function::new("f"), Function::new("f")];
        let err = to_claude_tool_configs(&duplicated).unwrap_err();
        assert!(err.to_string().contains("Duplicate function name"));

        let invalid = vec![Function::new("bad name")];
        let err = to_claude_tool_configs(&invalid).unwrap_err();
        assert!(err.to_string().contains("invalid characters"));
    }

    #[test]
    fn test_response_with_text_only() -> anyhow::Result<()> {
        let response = json!({
            "content": [{"type": "text", "text": "Hello!"}],
            "stop_reason": "end_turn",
        });

        let message = claude_response_to_message(&response, None)?;
        assert_eq!(message, ChatMessage::assistant("Hello!"));
        Ok(())
    }

    #[test]
    fn test_response_tool_use_preserves_backend_id() -> anyhow::Result<()> {
        let response = json!({
            "content": [
                {"type": "text", "text": "checking"},
                {
                    "type": "tool_use",
                    "id": "toolu_123",
                    "name": "get_weather",
                    "input": {"city": "Kyiv"},
                },
            ],
        });

        let message = claude_response_to_message(&response, Some(ToolsMode::Tools))?;
        match message {
            ChatMessage::AiToolCall(msg) => {
                assert_eq!(msg.content.as_deref(), Some("checking"));
                assert_eq!(msg.calls[0].id, "toolu_123");
                assert_eq!(msg.calls[0].function.name, "get_weather");
                assert_eq!(msg.calls[0].function.arguments, r#"{"city":"Kyiv"}"#);
            }
            other => panic!("expected AiToolCall, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_response_tool_use_in_functions_mode() -> anyhow::Result<()> {
        let response = json!({
            "content": [{
                "type": "tool_use",
                "id": "toolu_123",
                "name": "get_weather",
                "input": {},
            }],
        });

        let message = claude_response_to_message(&response, Some(ToolsMode::Functions))?;
        match message {
            ChatMessage::AiFunctionCall(msg) => {
                assert_eq!(msg.content, None);
                assert_eq!(msg.call.name, "get_weather");
                assert_eq!(msg.call.arguments, "{}");
            }
            other => panic!("expected AiFunctionCall, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_response_multiple_tool_uses_in_functions_mode_fails() {
        let response = json!({
            "content": [
                {"type": "tool_use", "id": "1", "name": "get_weather", "input": {}},
                {"type": "tool_use", "id": "2", "name": "get_time", "input": {}},
            ],
        });

        let err = claude_response_to_message(&response, Some(ToolsMode::Functions)).unwrap_err();
        assert!(matches!(err, GatewayError::Internal(_)));
    }

    #[test]
    fn test_response_tool_use_without_mode_fails() {
        let response = json!({
            "content": [{"type": "tool_use", "id": "1", "name": "f", "input": {}}],
        });

        let err = claude_response_to_message(&response, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "A model has called a tool, but no tools were given to the model in the first place."
        );
    }

    #[test]
    fn test_response_unknown_block_fails() {
        let response = json!({"content": [{"type": "thinking", "thinking": "..."}]});
        let err = claude_response_to_message(&response, None).unwrap_err();
        assert!(matches!(err, GatewayError::Internal(_)));
    }
}
