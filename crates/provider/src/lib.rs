//! Provider gateway: sends a prompt to a generation backend and returns
//! its raw textual reply.
//!
//! Each call is a single HTTP round trip under the provider's timeout.
//! Nothing is retried here; `Error::is_retryable` tells the caller which
//! failures are worth another attempt.

pub mod chat;
mod http;
pub mod ollama;
pub mod openai;
pub mod settings;

pub use ollama::OllamaProvider;
pub use openai::ChatCompletionsProvider;
pub use settings::{ProviderKind, ProviderSettings};

use async_trait::async_trait;
use slidegen_core::{GenerationReply, Result, TemplateConfig};

/// A generation backend.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> ProviderKind;

    /// Model the requests are sent to.
    fn model(&self) -> &str;

    /// Build the prompt for `raw_text` under `config` and return the reply.
    async fn generate(&self, raw_text: &str, config: &TemplateConfig) -> Result<GenerationReply>;
}

/// Construct the provider for `settings`.
///
/// Fails with `ConfigError` when required credentials are missing.
pub fn create_provider(settings: ProviderSettings) -> Result<Box<dyn Provider>> {
    log::debug!(
        "Creating {} provider for model {} at {}",
        settings.kind,
        settings.model,
        settings.base_url
    );

    match settings.kind {
        ProviderKind::OpenAi | ProviderKind::LmStudio => {
            Ok(Box::new(ChatCompletionsProvider::new(settings)?))
        }
        ProviderKind::Ollama => Ok(Box::new(OllamaProvider::new(settings)?)),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Throwaway HTTP servers for adapter tests.

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Serve one canned response; the handle yields the raw request.
    pub async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });

        (url, handle)
    }

    /// A server that accepts connections and never answers.
    pub async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        });

        url
    }

    /// A URL nothing listens on.
    pub async fn unused_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        url
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).into_owned()
    }
}
