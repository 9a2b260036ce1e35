//! Completion-service boundary.
//!
//! The rest of the crate treats the language model as a black box behind
//! [`CompletionProvider`]: persona + history + advertised tools in, a decoded
//! [`Completion`] out. Decoding turns `transfer_to_*` tool calls into a
//! [`HandoffRequest`] so the orchestrator never inspects wire-level naming.
//!
//! [`OpenAiCompatProvider`] speaks to any OpenAI-compatible chat endpoint via
//! `async-openai`; the default configuration points at Gemini's compatibility
//! endpoint. [`MockProvider`] replays a scripted list of completions for tests
//! and offline runs.

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolArgs,
        ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionObjectArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use uuid::Uuid;

use crate::agent::HANDOFF_TOOL_PREFIX;
use crate::config::DeskConfig;
use crate::error::{Result, SupportError};
use crate::items::{Message, Role, ToolCall, ToolSpec};

/// A delegation request decoded from the model's output.
///
/// Created transiently when an agent's completion signals a transfer and
/// consumed immediately by the orchestrator. The conversation state travels
/// with the session, not with this value.
#[derive(Debug, Clone)]
pub struct HandoffRequest {
    /// Name of the requested target agent (already stripped of wire prefixes).
    pub target: String,
    /// Optional explanation supplied by the delegating agent.
    pub reason: Option<String>,
    /// The raw tool call that carried the request, kept so the conversation
    /// history can be replayed coherently to the backend.
    pub call: ToolCall,
}

/// One decoded response from the completion service.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub handoff: Option<HandoffRequest>,
}

impl Completion {
    /// Decode raw model output: any `transfer_to_*` call becomes the handoff
    /// (first one wins), everything else stays a regular tool call.
    pub fn from_model(text: Option<String>, calls: Vec<ToolCall>) -> Self {
        let mut tool_calls = Vec::new();
        let mut handoff = None;
        for call in calls {
            match call.name.strip_prefix(HANDOFF_TOOL_PREFIX) {
                Some(target) if handoff.is_none() => {
                    let reason = call
                        .arguments
                        .get("reason")
                        .and_then(|v| v.as_str())
                        .map(str::to_string);
                    handoff = Some(HandoffRequest {
                        target: target.to_string(),
                        reason,
                        call: call.clone(),
                    });
                }
                _ => tool_calls.push(call),
            }
        }
        Self {
            text,
            tool_calls,
            handoff,
        }
    }

    /// A plain text reply.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// A single tool call with a generated id.
    pub fn tool_call(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool_calls: vec![ToolCall {
                id: Uuid::new_v4().to_string(),
                name: name.into(),
                arguments,
            }],
            ..Default::default()
        }
    }

    /// A handoff to the named target.
    pub fn transfer(target: impl Into<String>, reason: Option<&str>) -> Self {
        let target = target.into();
        let arguments = match reason {
            Some(r) => serde_json::json!({ "reason": r }),
            None => serde_json::json!({}),
        };
        let call = ToolCall {
            id: Uuid::new_v4().to_string(),
            name: format!("{}{}", HANDOFF_TOOL_PREFIX, target),
            arguments,
        };
        Self {
            handoff: Some(HandoffRequest {
                target,
                reason: reason.map(str::to_string),
                call,
            }),
            ..Default::default()
        }
    }
}

/// Trait for completion backends.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate one completion for the given persona, history, and tool set.
    async fn complete(
        &self,
        persona: &str,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<Completion>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Provider for OpenAI-compatible chat endpoints.
pub struct OpenAiCompatProvider {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCompatProvider {
    /// Create a provider from desk configuration (API key, base URL, model).
    pub fn new(config: &DeskConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_base(&config.api_base);
        if let Some(key) = &config.api_key {
            openai_config = openai_config.with_api_key(key);
        }
        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
        }
    }

    /// Create with a custom client.
    pub fn with_client(client: Client<OpenAIConfig>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn convert_message(msg: &Message) -> Result<ChatCompletionRequestMessage> {
        let converted = match msg.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(msg.content.clone())
                .build()?
                .into(),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(msg.content.clone())
                .build()?
                .into(),
            Role::Assistant => {
                let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                builder.content(msg.content.clone());
                if let Some(tool_calls) = &msg.tool_calls {
                    let converted_calls: Vec<_> = tool_calls
                        .iter()
                        .map(|tc| async_openai::types::ChatCompletionMessageToolCall {
                            id: tc.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: async_openai::types::FunctionCall {
                                name: tc.name.clone(),
                                arguments: tc.arguments.to_string(),
                            },
                        })
                        .collect();
                    builder.tool_calls(converted_calls);
                }
                builder.build()?.into()
            }
            Role::Tool => ChatCompletionRequestToolMessageArgs::default()
                .content(msg.content.clone())
                .tool_call_id(msg.tool_call_id.clone().unwrap_or_default())
                .build()?
                .into(),
        };
        Ok(converted)
    }

    fn convert_tools(tools: &[ToolSpec]) -> Result<Vec<ChatCompletionTool>> {
        let mut converted = Vec::with_capacity(tools.len());
        for spec in tools {
            converted.push(
                ChatCompletionToolArgs::default()
                    .r#type(ChatCompletionToolType::Function)
                    .function(
                        FunctionObjectArgs::default()
                            .name(&spec.name)
                            .description(&spec.description)
                            .parameters(spec.parameters.clone())
                            .build()?,
                    )
                    .build()?,
            );
        }
        Ok(converted)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatProvider {
    async fn complete(
        &self,
        persona: &str,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<Completion> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Self::convert_message(&Message::system(persona))?);
        for msg in history {
            messages.push(Self::convert_message(msg)?);
        }

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(&self.model).messages(messages);
        if !tools.is_empty() {
            request.tools(Self::convert_tools(tools)?);
        }

        let response = self.client.chat().create(request.build()?).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SupportError::MalformedResponse {
                message: "no choices in response".to_string(),
            })?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: serde_json::from_str(&tc.function.arguments).unwrap_or(Value::Null),
            })
            .collect();

        Ok(Completion::from_model(choice.message.content, tool_calls))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

enum ScriptStep {
    Reply(Completion),
    Fail(String),
}

/// Scripted provider for tests and offline runs.
///
/// Responses are returned in the order they were queued; an exhausted script
/// yields a neutral text reply.
pub struct MockProvider {
    model: String,
    script: Mutex<Vec<ScriptStep>>,
}

impl MockProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            script: Mutex::new(vec![]),
        }
    }

    pub fn with_completion(self, completion: Completion) -> Self {
        self.script.lock().unwrap().push(ScriptStep::Reply(completion));
        self
    }

    pub fn with_message(self, text: impl Into<String>) -> Self {
        self.with_completion(Completion::message(text))
    }

    pub fn with_tool_call(self, name: impl Into<String>, arguments: Value) -> Self {
        self.with_completion(Completion::tool_call(name, arguments))
    }

    pub fn with_transfer(self, target: impl Into<String>) -> Self {
        self.with_completion(Completion::transfer(target, None))
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push(ScriptStep::Fail(message.into()));
        self
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(
        &self,
        _persona: &str,
        _history: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<Completion> {
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            return Ok(Completion::message("How else can I help you today?"));
        }
        match script.remove(0) {
            ScriptStep::Reply(completion) => Ok(completion),
            ScriptStep::Fail(message) => Err(SupportError::CompletionUnavailable { message }),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
