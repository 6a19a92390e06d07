// Gemini CodeGenerationProvider
use crate::config::GeminiConfig;
use crate::prompt::build_prompt;
use crate::response::{clean_code, GenerateContentResponse};
use animagen_core::domain::layout::DEFAULT_SCENE_NAME;
use animagen_core::domain::{Description, JobId, SourceText};
use animagen_core::port::{CodeGenerationProvider, GenerationError};
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Remote model provider. One request per call, no retries.
pub struct GeminiProvider {
    client: reqwest::Client,
    config: GeminiConfig,
    scene_name: String,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GenerationError::Unavailable(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            config,
            scene_name: DEFAULT_SCENE_NAME.to_string(),
        })
    }

    pub fn with_scene_name(mut self, scene_name: impl Into<String>) -> Self {
        self.scene_name = scene_name.into();
        self
    }
}

fn map_request_error(err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout
    } else if err.is_decode() {
        GenerationError::Malformed(err.to_string())
    } else {
        GenerationError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl CodeGenerationProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(
        &self,
        description: &Description,
        job_id: &JobId,
    ) -> Result<SourceText, GenerationError> {
        if self.config.api_key.is_empty() {
            return Err(GenerationError::Unavailable("no API key configured".to_string()));
        }

        let body = json!({
            "contents": [
                {"parts": [{"text": build_prompt(description.as_str(), &self.scene_name)}]}
            ]
        });

        debug!(job_id = %job_id, model = %self.config.model, "Requesting code from remote model");
        let response = self
            .client
            .post(self.config.generate_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(job_id = %job_id, status = status.as_u16(), "Remote model returned an error status");
            return Err(GenerationError::HttpStatus(status.as_u16()));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(map_request_error)?;
        let text = parsed.into_text()?;
        Ok(SourceText::new(clean_code(&text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Read one HTTP/1.1 request (headers + content-length body)
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Serve exactly one canned response, returning the raw request seen
    async fn serve_once(status: u16, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });
        (format!("http://{}/v1beta", addr), handle)
    }

    fn provider(endpoint: String, timeout: Duration) -> GeminiProvider {
        let mut config = GeminiConfig::new("test-key");
        config.endpoint = endpoint;
        config.request_timeout = timeout;
        GeminiProvider::new(config).unwrap()
    }

    fn inputs() -> (Description, JobId) {
        (
            Description::parse("a blue circle").unwrap(),
            JobId::parse("job-1").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_successful_generation() {
        let text = "```python\nclass ManimScene(Scene):\n    def construct(self):\n        self.play(Create(Circle()))\n```";
        let body = json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}).to_string();
        let (endpoint, server) = serve_once(200, body).await;

        let (d, id) = inputs();
        let src = provider(endpoint, Duration::from_secs(5))
            .generate(&d, &id)
            .await
            .unwrap();
        assert!(src.declares_scene("ManimScene"));
        assert!(!src.as_str().contains("```"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1beta/models/gemini-1.5-pro:generateContent"));
        assert!(request.to_lowercase().contains("x-goog-api-key: test-key"));
        assert!(request.contains("a blue circle"));
    }

    #[tokio::test]
    async fn test_error_status() {
        let (endpoint, _server) = serve_once(503, "{}".to_string()).await;
        let (d, id) = inputs();
        let err = provider(endpoint, Duration::from_secs(5))
            .generate(&d, &id)
            .await
            .unwrap_err();
        assert_eq!(err, GenerationError::HttpStatus(503));
    }

    #[tokio::test]
    async fn test_unparseable_body() {
        let (endpoint, _server) = serve_once(200, "not json".to_string()).await;
        let (d, id) = inputs();
        let err = provider(endpoint, Duration::from_secs(5))
            .generate(&d, &id)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        });

        let (d, id) = inputs();
        let err = provider(format!("http://{}", addr), Duration::from_millis(200))
            .generate(&d, &id)
            .await
            .unwrap_err();
        assert_eq!(err, GenerationError::Timeout);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // Bind then drop to get a port nobody listens on
        let addr = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap()
            .local_addr()
            .unwrap();
        let (d, id) = inputs();
        let err = provider(format!("http://{}", addr), Duration::from_secs(5))
            .generate(&d, &id)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let provider = GeminiProvider::new(GeminiConfig::new("")).unwrap();
        let (d, id) = inputs();
        assert!(matches!(
            provider.generate(&d, &id).await,
            Err(GenerationError::Unavailable(_))
        ));
    }
}
