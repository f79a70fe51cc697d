//! Provider selection and connection settings.

use serde::{Deserialize, Serialize};
use slidegen_core::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Sampling temperature for chat-completions backends.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Reply length cap for chat-completions backends.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// The closed set of supported generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Hosted OpenAI chat completions.
    OpenAi,
    /// Local Ollama server.
    Ollama,
    /// Local LM Studio server (OpenAI-compatible).
    LmStudio,
}

impl ProviderKind {
    /// Every kind, in listing order.
    pub const ALL: [ProviderKind; 3] = [Self::OpenAi, Self::Ollama, Self::LmStudio];

    /// The name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::LmStudio => "lmstudio",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI GPT models (requires API key)",
            Self::Ollama => "Local Ollama models",
            Self::LmStudio => "LM Studio local models",
        }
    }

    /// Whether the kind can be used with the given API key.
    pub fn available(&self, api_key: Option<&str>) -> bool {
        match self {
            Self::OpenAi => api_key.is_some_and(|k| !k.trim().is_empty()),
            Self::Ollama | Self::LmStudio => true,
        }
    }

    /// Default base URL.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434",
            Self::LmStudio => "http://localhost:1234/v1",
        }
    }

    /// Default model name.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-3.5-turbo",
            Self::Ollama => "mistral:instruct",
            Self::LmStudio => "local-model",
        }
    }

    /// Request timeout: short for the hosted backend, longer for local
    /// inference.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::OpenAi => Duration::from_secs(60),
            Self::Ollama | Self::LmStudio => Duration::from_secs(120),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "lmstudio" => Ok(Self::LmStudio),
            other => Err(Error::ConfigError(format!(
                "Unsupported provider: {}. Supported: openai, ollama, lmstudio",
                other
            ))),
        }
    }
}

/// Everything needed to reach one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Which backend to talk to.
    pub kind: ProviderKind,
    /// API root that endpoint paths are joined onto.
    pub base_url: String,
    /// Bearer token, sent only when set.
    pub api_key: Option<String>,
    /// Model name placed in each request.
    pub model: String,
    /// Limit on one whole request.
    pub timeout: Duration,
}

impl ProviderSettings {
    /// Settings with the kind's defaults.
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            base_url: kind.default_base_url().to_string(),
            api_key: None,
            model: kind.default_model().to_string(),
            timeout: kind.default_timeout(),
        }
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API key. Blank keys count as none.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    /// Override the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Join `path` onto the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(" Ollama ".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert_eq!("lmstudio".parse::<ProviderKind>().unwrap(), ProviderKind::LmStudio);

        let err = "claude".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_defaults() {
        let openai = ProviderSettings::new(ProviderKind::OpenAi);
        assert_eq!(openai.model, "gpt-3.5-turbo");
        assert_eq!(openai.timeout, Duration::from_secs(60));

        let ollama = ProviderSettings::new(ProviderKind::Ollama);
        assert_eq!(ollama.base_url, "http://localhost:11434");
        assert_eq!(ollama.model, "mistral:instruct");
        assert!(ollama.timeout > openai.timeout);

        let lmstudio = ProviderSettings::new(ProviderKind::LmStudio);
        assert_eq!(lmstudio.endpoint("chat/completions"), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_availability() {
        assert!(!ProviderKind::OpenAi.available(None));
        assert!(!ProviderKind::OpenAi.available(Some("  ")));
        assert!(ProviderKind::OpenAi.available(Some("sk-test")));
        assert!(ProviderKind::Ollama.available(None));
    }

    #[test]
    fn test_blank_api_key_is_none() {
        let settings = ProviderSettings::new(ProviderKind::OpenAi).with_api_key("");
        assert_eq!(settings.api_key, None);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let settings = ProviderSettings::new(ProviderKind::Ollama).with_base_url("http://gpu-box:11434/");
        assert_eq!(settings.endpoint("api/chat"), "http://gpu-box:11434/api/chat");
    }
}
