//! Gemini `generateContent` client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{SummaryError, Summarizer, summary_prompt};
use crate::models::config::SummaryConfig;

/// Summarizer backed by the Gemini generative language API.
pub struct GeminiSummarizer {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiSummarizer {
    /// Create a summarizer from explicit configuration.
    ///
    /// The API key is taken from the config as-is; use
    /// [`SummaryConfig::with_env_api_key`] to pick it up from the environment.
    pub fn new(config: &SummaryConfig) -> Result<Self, SummaryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Request a summary, surfacing failures as [`SummaryError`].
    pub async fn try_summarize(&self, text: &str) -> Result<String, SummaryError> {
        let api_key = self.api_key.as_deref().ok_or(SummaryError::MissingApiKey)?;

        let prompt = summary_prompt(text);
        let request = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            self.generate(api_key, &prompt),
        );

        request
            .await
            .map_err(|_| SummaryError::Timeout(self.timeout_secs))?
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, SummaryError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        debug!("Requesting summary from {} ({} chars)", url, prompt.len());

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(SummaryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        first_text(parsed)
    }
}

fn first_text(response: GenerateResponse) -> Result<String, SummaryError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .ok_or_else(|| SummaryError::InvalidResponse("no candidates in response".to_string()))
}

impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, text: &str) -> String {
        match self.try_summarize(text).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Summary request failed: {}", e);
                e.fallback_message()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::MISSING_KEY_MESSAGE;
    use pretty_assertions::assert_eq;

    fn config(api_key: Option<&str>, endpoint: &str) -> SummaryConfig {
        SummaryConfig {
            api_key: api_key.map(str::to_string),
            endpoint: endpoint.to_string(),
            timeout_secs: 2,
            ..SummaryConfig::default()
        }
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: "Summarize this invoice:\nWidget 1.00" }],
            }],
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "contents": [{ "parts": [{ "text": "Summarize this invoice:\nWidget 1.00" }] }]
            })
        );
    }

    #[test]
    fn test_first_text() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"One widget."},{"text":"ignored"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(first_text(response).unwrap(), "One widget.");

        let empty: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(matches!(
            first_text(empty),
            Err(SummaryError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_falls_back() {
        let summarizer = GeminiSummarizer::new(&config(None, "http://127.0.0.1:9")).unwrap();
        assert_eq!(summarizer.summarize("Widget 1.00").await, MISSING_KEY_MESSAGE);

        let summarizer = GeminiSummarizer::new(&config(Some(""), "http://127.0.0.1:9")).unwrap();
        assert!(matches!(
            summarizer.try_summarize("Widget 1.00").await,
            Err(SummaryError::MissingApiKey)
        ));
    }

    // Serve one canned HTTP response and hand back the request line.
    async fn serve_once(body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64 * 1024];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            request.lines().next().unwrap_or_default().to_string()
        });

        (endpoint, handle)
    }

    #[tokio::test]
    async fn test_summary_round_trip() {
        let (endpoint, server) =
            serve_once(r#"{"candidates":[{"content":{"parts":[{"text":"Two widgets."}]}}]}"#).await;
        let summarizer = GeminiSummarizer::new(&config(Some("test-key"), &endpoint)).unwrap();

        assert_eq!(
            summarizer.try_summarize("2 x Widget 10.00").await.unwrap(),
            "Two widgets."
        );

        let request_line = server.await.unwrap();
        assert!(
            request_line.starts_with("POST /models/gemini-1.5-flash:generateContent?key=test-key "),
            "{}",
            request_line
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        // Port 9 (discard) is closed on test machines; the connection is refused.
        let summarizer =
            GeminiSummarizer::new(&config(Some("test-key"), "http://127.0.0.1:9")).unwrap();

        let summary = summarizer.summarize("Widget 1.00").await;
        assert!(summary.starts_with("Summary unavailable:"), "{}", summary);
    }
}
