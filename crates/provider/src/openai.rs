//! OpenAI-compatible chat completions, used for OpenAI and LM Studio.

use crate::chat::{parse_chat_completion, ChatCompletionRequest};
use crate::http::{build_client, post_json};
use crate::settings::{ProviderKind, ProviderSettings};
use crate::Provider;
use async_trait::async_trait;
use slidegen_core::{Error, GenerationReply, Prompt, Result, TemplateConfig};

/// Client for a `chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsProvider {
    settings: ProviderSettings,
    client: reqwest::Client,
}

impl ChatCompletionsProvider {
    /// Create a client. OpenAI requires an API key; LM Studio sends one
    /// only when configured.
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        if settings.kind == ProviderKind::OpenAi && settings.api_key.is_none() {
            return Err(Error::ConfigError(
                "OpenAI API key not configured (set OPENAI_API_KEY or pass --api-key)".to_string(),
            ));
        }

        let client = build_client(settings.timeout)?;
        Ok(Self { settings, client })
    }
}

#[async_trait]
impl Provider for ChatCompletionsProvider {
    fn kind(&self) -> ProviderKind {
        self.settings.kind
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn generate(&self, raw_text: &str, config: &TemplateConfig) -> Result<GenerationReply> {
        let prompt = Prompt::build(raw_text, config);
        let body = ChatCompletionRequest::new(&self.settings.model, &prompt);
        let url = self.settings.endpoint("chat/completions");

        let (status, text) = post_json(
            &self.client,
            &url,
            &body,
            self.settings.api_key.as_deref(),
            self.settings.timeout,
        )
        .await?;

        let reply = parse_chat_completion(status, &text)?;
        log::info!(
            "{} replied with {} chars",
            self.settings.kind,
            reply.as_str().len()
        );
        Ok(reply)
    }
}
