use crate::error::{ChatError, Result};
use crate::traits::{
    ChatTurn, EventStream, FunctionCallRequest, FunctionCallResponse, Provider, Role, Session,
    SessionConfig, SessionMessage, StreamEvent, ToolSpec,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    response: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [GeminiContent],
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<&'a GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [GeminiTool]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<&'a GenerationConfig>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[allow(dead_code)]
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

impl ApiErrorBody {
    /// Gemini answers a bad key with 400 INVALID_ARGUMENT, not 401.
    fn is_invalid_key(&self) -> bool {
        self.details
            .iter()
            .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"))
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| ChatError::Config(format!("failed to build HTTP client: {e}")))
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))?,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    fn convert_history(history: Vec<ChatTurn>) -> Vec<GeminiContent> {
        history
            .into_iter()
            .map(|turn| GeminiContent {
                role: Some(role_name(turn.role).to_string()),
                parts: turn
                    .parts
                    .into_iter()
                    .map(|p| GeminiPart {
                        text: Some(p.text),
                        ..Default::default()
                    })
                    .collect(),
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolSpec]) -> Vec<GeminiTool> {
        vec![GeminiTool {
            function_declarations: tools
                .iter()
                .map(|t| FunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                })
                .collect(),
        }]
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "model",
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn open_session(
        &self,
        config: SessionConfig,
        history: Vec<ChatTurn>,
    ) -> Result<Box<dyn Session>> {
        if self.api_key.trim().is_empty() {
            return Err(ChatError::Authentication(
                "API key is missing. Set GEMINI_API_KEY or run `geminal onboard`.".to_string(),
            ));
        }

        let system_instruction = config
            .system_instruction
            .filter(|s| !s.trim().is_empty())
            .map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: Some(text),
                    ..Default::default()
                }],
            });

        let tools = if config.tool_schemas.is_empty() {
            None
        } else {
            Some(Self::convert_tools(&config.tool_schemas))
        };

        let generation_config = (config.thinking_budget > 0).then(|| GenerationConfig {
            thinking_config: ThinkingConfig {
                thinking_budget: config.thinking_budget,
            },
        });

        tracing::debug!(
            "Opening Gemini session: model={}, history={}, tools={}",
            config.model_id,
            history.len(),
            config.tool_schemas.len()
        );

        Ok(Box::new(GeminiSession {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            endpoint: format!(
                "{}/models/{}:streamGenerateContent?alt=sse",
                self.base_url, config.model_id
            ),
            system_instruction,
            tools,
            generation_config,
            contents: Arc::new(Mutex::new(Self::convert_history(history))),
            call_seq: Arc::new(Mutex::new(0)),
        }))
    }
}

/// Conversation state for one submission. The spawned stream reader appends
/// the model's turn to `contents` before the event stream ends.
pub struct GeminiSession {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    system_instruction: Option<GeminiContent>,
    tools: Option<Vec<GeminiTool>>,
    generation_config: Option<GenerationConfig>,
    contents: Arc<Mutex<Vec<GeminiContent>>>,
    call_seq: Arc<Mutex<usize>>,
}

impl GeminiSession {
    fn outgoing_content(message: SessionMessage) -> GeminiContent {
        let parts = match message {
            SessionMessage::Prompt(text) => vec![GeminiPart {
                text: Some(text),
                ..Default::default()
            }],
            SessionMessage::FunctionResponses(responses) => {
                responses.iter().map(function_response_part).collect()
            }
        };

        GeminiContent {
            role: Some("user".to_string()),
            parts,
        }
    }

    fn request_body(&self, message: SessionMessage) -> Result<Vec<u8>> {
        let mut contents = self
            .contents
            .lock()
            .map_err(|_| ChatError::transport("session state poisoned"))?;
        contents.push(Self::outgoing_content(message));

        let request = GenerateContentRequest {
            contents: contents.as_slice(),
            system_instruction: self.system_instruction.as_ref(),
            tools: self.tools.as_deref(),
            generation_config: self.generation_config.as_ref(),
        };

        serde_json::to_vec(&request)
            .map_err(|e| ChatError::transport(format!("failed to encode request: {e}")))
    }
}

fn function_response_part(response: &FunctionCallResponse) -> GeminiPart {
    GeminiPart {
        function_response: Some(GeminiFunctionResponse {
            id: Some(response.id.clone()),
            name: response.name.clone(),
            response: response.payload(),
        }),
        ..Default::default()
    }
}

#[async_trait]
impl Session for GeminiSession {
    async fn send_and_stream(&mut self, message: SessionMessage) -> Result<EventStream> {
        let body = self.request_body(message)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str::<ApiErrorEnvelope>(&error_text)
                .ok()
                .map(|envelope| envelope.error);
            let invalid_key = body.as_ref().is_some_and(ApiErrorBody::is_invalid_key);
            let message = body.map(|b| b.message).unwrap_or(error_text);

            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
                || invalid_key
            {
                return Err(ChatError::Authentication(format!(
                    "Gemini API rejected the credential ({}): {}",
                    status, message
                )));
            }
            return Err(ChatError::transport(format!(
                "Gemini API error {}: {}",
                status, message
            )));
        }

        let (tx, rx) = tokio::sync::mpsc::channel::<Result<StreamEvent>>(100);
        let contents = Arc::clone(&self.contents);
        let call_seq = Arc::clone(&self.call_seq);

        tokio::spawn(async move {
            let mut bytes_stream = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();
            let mut state = StreamState::new(call_seq);

            'read: while let Some(item) = bytes_stream.next().await {
                let chunk = match item {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(Err(ChatError::from(e))).await;
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line);

                    match state.handle_line(&line) {
                        Ok(events) => {
                            for event in events {
                                if tx.send(Ok(event)).await.is_err() {
                                    break 'read;
                                }
                            }
                        }
                        Err(e) => {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                }
            }

            if !buffer.is_empty() {
                let line = String::from_utf8_lossy(&buffer).into_owned();
                match state.handle_line(&line) {
                    Ok(events) => {
                        for event in events {
                            let _ = tx.send(Ok(event)).await;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }

            // Record the model turn before the receiver observes end-of-stream.
            if let Some(turn) = state.into_model_turn()
                && let Ok(mut contents) = contents.lock()
            {
                contents.push(turn);
            }
            drop(tx);
        });

        Ok(ReceiverStream::new(rx).boxed())
    }
}

/// Per-turn SSE decoding state.
struct StreamState {
    call_seq: Arc<Mutex<usize>>,
    model_parts: Vec<GeminiPart>,
}

impl StreamState {
    fn new(call_seq: Arc<Mutex<usize>>) -> Self {
        Self {
            call_seq,
            model_parts: Vec::new(),
        }
    }

    fn next_call_id(&self) -> String {
        let mut seq = self.call_seq.lock().unwrap_or_else(|e| e.into_inner());
        *seq += 1;
        format!("call_{}", *seq)
    }

    fn handle_line(&mut self, line: &str) -> Result<Vec<StreamEvent>> {
        let line = line.trim();

        if line.is_empty() || line.starts_with(':') {
            return Ok(Vec::new());
        }

        let Some(data) = line.strip_prefix("data:") else {
            return Ok(Vec::new());
        };
        let data = data.trim();
        if data == "[DONE]" {
            return Ok(Vec::new());
        }

        let chunk: GenerateContentResponse = serde_json::from_str(data)
            .map_err(|e| ChatError::transport(format!("malformed stream chunk: {e}")))?;

        if let Some(error) = chunk.error {
            if error.is_invalid_key() {
                return Err(ChatError::Authentication(error.message));
            }
            return Err(ChatError::transport(match error.status {
                Some(status) => format!("{}: {}", status, error.message),
                None => error.message,
            }));
        }

        let mut events = Vec::new();
        let mut pending_calls: Vec<FunctionCallRequest> = Vec::new();

        let parts = chunk
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        for mut part in parts {
            if part.thought == Some(true) {
                continue;
            }

            if let Some(call) = part.function_call.as_mut() {
                let id = match &call.id {
                    Some(id) if !id.is_empty() => id.clone(),
                    _ => {
                        let id = self.next_call_id();
                        call.id = Some(id.clone());
                        id
                    }
                };
                pending_calls.push(FunctionCallRequest {
                    id,
                    name: call.name.clone(),
                    args: call.args.clone(),
                });
                self.model_parts.push(part);
                continue;
            }

            if let Some(text) = part.text.clone() {
                if !pending_calls.is_empty() {
                    events.push(StreamEvent::FunctionCalls(std::mem::take(&mut pending_calls)));
                }
                if !text.is_empty() {
                    events.push(StreamEvent::TextDelta(text));
                }
                self.push_text_part(part);
            }
        }

        if !pending_calls.is_empty() {
            events.push(StreamEvent::FunctionCalls(pending_calls));
        }

        Ok(events)
    }

    fn push_text_part(&mut self, part: GeminiPart) {
        if part.thought_signature.is_none()
            && let Some(last) = self.model_parts.last_mut()
            && last.function_call.is_none()
            && last.thought_signature.is_none()
            && let (Some(existing), Some(text)) = (last.text.as_mut(), part.text.as_deref())
        {
            existing.push_str(text);
            return;
        }
        self.model_parts.push(part);
    }

    fn into_model_turn(self) -> Option<GeminiContent> {
        if self.model_parts.is_empty() {
            return None;
        }
        Some(GeminiContent {
            role: Some("model".to_string()),
            parts: self.model_parts,
        })
    }
}
