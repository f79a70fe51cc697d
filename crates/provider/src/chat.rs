//! Wire formats of the supported chat APIs.
//!
//! Request bodies are built and replies parsed here as plain functions, so
//! the envelope rules can be checked without a network.

use crate::settings::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use serde::Serialize;
use serde_json::Value;
use slidegen_core::{Error, GenerationReply, Prompt, Result};

/// Characters of a backend's error body kept in error messages.
const BODY_PREVIEW_CHARS: usize = 200;

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// `system` or `user`.
    pub role: &'static str,
    /// Message text.
    pub content: String,
}

/// The system and user messages of a prompt, in that order.
pub fn prompt_messages(prompt: &Prompt) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system",
            content: prompt.system.clone(),
        },
        ChatMessage {
            role: "user",
            content: prompt.user.clone(),
        },
    ]
}

/// Body of an OpenAI-style `chat/completions` request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// Model name.
    pub model: String,
    /// System message, then user message.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on reply length.
    pub max_tokens: u32,
}

impl ChatCompletionRequest {
    pub fn new(model: &str, prompt: &Prompt) -> Self {
        Self {
            model: model.to_string(),
            messages: prompt_messages(prompt),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Body of an Ollama `/api/chat` request.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaChatRequest {
    /// Model name.
    pub model: String,
    /// System message, then user message.
    pub messages: Vec<ChatMessage>,
    /// Always `false`: one complete reply is expected.
    pub stream: bool,
    /// Always `json`, constraining the reply to a JSON document.
    pub format: &'static str,
}

impl OllamaChatRequest {
    pub fn new(model: &str, prompt: &Prompt) -> Self {
        Self {
            model: model.to_string(),
            messages: prompt_messages(prompt),
            stream: false,
            format: "json",
        }
    }
}

/// Reply text of a `chat/completions` envelope: `choices[0].message.content`.
pub fn parse_chat_completion(status: u16, body: &str) -> Result<GenerationReply> {
    reply_at(status, body, "/choices/0/message/content")
}

/// Reply text of an Ollama envelope: `message.content`.
pub fn parse_ollama_chat(status: u16, body: &str) -> Result<GenerationReply> {
    reply_at(status, body, "/message/content")
}

fn reply_at(status: u16, body: &str, pointer: &str) -> Result<GenerationReply> {
    let envelope: Value = serde_json::from_str(body).map_err(|e| {
        Error::provider(
            Some(status),
            format!("Reply is not valid JSON: {} ({})", e, preview(body)),
        )
    })?;

    envelope
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(GenerationReply::new)
        .ok_or_else(|| {
            Error::provider(
                Some(status),
                format!("Reply has no text at {} ({})", pointer, preview(body)),
            )
        })
}

/// Leading part of a response body for error messages.
pub fn preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() > BODY_PREVIEW_CHARS {
        let head: String = trimmed.chars().take(BODY_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prompt() -> Prompt {
        Prompt {
            system: "Be brief.".into(),
            user: "Slides about tides".into(),
        }
    }

    #[test]
    fn test_chat_completion_request_body() {
        let body = serde_json::to_value(ChatCompletionRequest::new("gpt-3.5-turbo", &prompt())).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "Slides about tides"}
                ],
                "temperature": 0.7f32,
                "max_tokens": 2000
            })
        );
    }

    #[test]
    fn test_ollama_request_body() {
        let body = serde_json::to_value(OllamaChatRequest::new("mistral:instruct", &prompt())).unwrap();
        assert_eq!(body["stream"], json!(false));
        assert_eq!(body["format"], json!("json"));
        assert_eq!(body["messages"][1]["role"], json!("user"));
    }

    #[test]
    fn test_parse_chat_completion() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"titles\":[]}"}}]}"#;
        let reply = parse_chat_completion(200, body).unwrap();
        assert_eq!(reply.as_str(), r#"{"titles":[]}"#);
    }

    #[test]
    fn test_parse_ollama_chat() {
        let body = r#"{"model":"m","message":{"role":"assistant","content":"hello"},"done":true}"#;
        assert_eq!(parse_ollama_chat(200, body).unwrap().as_str(), "hello");
    }

    #[test]
    fn test_missing_content_is_provider_error() {
        let err = parse_chat_completion(200, r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, Error::ProviderError { status: Some(200), .. }));

        let err = parse_ollama_chat(200, r#"{"message":{"content":42}}"#).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_non_json_envelope_is_provider_error() {
        let err = parse_chat_completion(200, "<html>gateway</html>").unwrap_err();
        assert!(matches!(err, Error::ProviderError { .. }));
    }

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(500);
        assert_eq!(preview(&long).len(), BODY_PREVIEW_CHARS + 3);
        assert_eq!(preview("  short "), "short");
    }
}
