//! Ollama `/api/chat` adapter.

use crate::chat::{parse_ollama_chat, OllamaChatRequest};
use crate::http::{build_client, post_json};
use crate::settings::{ProviderKind, ProviderSettings};
use crate::Provider;
use async_trait::async_trait;
use slidegen_core::{GenerationReply, Prompt, Result, TemplateConfig};

/// Client for a local Ollama server. Requests JSON-formatted, non-streamed
/// replies.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    settings: ProviderSettings,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let client = build_client(settings.timeout)?;
        Ok(Self { settings, client })
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn generate(&self, raw_text: &str, config: &TemplateConfig) -> Result<GenerationReply> {
        let prompt = Prompt::build(raw_text, config);
        let body = OllamaChatRequest::new(&self.settings.model, &prompt);
        let url = self.settings.endpoint("api/chat");

        let (status, text) =
            post_json(&self.client, &url, &body, None, self.settings.timeout).await?;

        let reply = parse_ollama_chat(status, &text)?;
        log::info!("ollama replied with {} chars", reply.as_str().len());
        Ok(reply)
    }
}
