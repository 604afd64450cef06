use super::{ChatBackend, ChatRequest};
use crate::config::CompletionConfig;
use crate::error::{LearnError, Result};
use crate::state::ChatMessage;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIErrorBody {
    error: Option<OpenAIErrorDetail>,
}

#[derive(Deserialize)]
struct OpenAIErrorDetail {
    message: Option<String>,
}

/// Chat-completions client for OpenAI-compatible endpoints.
#[derive(Clone, Default)]
pub struct OpenAIClient {
    client: Client,
}

impl OpenAIClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAIClient {
    async fn complete(&self, config: &CompletionConfig, request: &ChatRequest) -> Result<String> {
        let api_key = config.api_key().ok_or(LearnError::MissingCredentials)?;
        let url = config.completions_url();

        let body = OpenAIRequest {
            model: &config.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        debug!(
            url = %url,
            model = %config.model,
            messages = request.messages.len(),
            json_mode = request.json_mode,
            "sending chat completion"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LearnError::Endpoint {
                status: status.as_u16(),
                message: endpoint_error_message(&text),
            });
        }

        let openai_response: OpenAIResponse = response.json().await?;
        first_content(openai_response)
    }
}

/// Message from an `{error: {message}}` body, falling back to the raw text.
fn endpoint_error_message(body: &str) -> String {
    serde_json::from_str::<OpenAIErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Failed to generate response".to_string()
            } else {
                body.trim().to_string()
            }
        })
}

fn first_content(response: OpenAIResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.unwrap_or_default())
        .ok_or(LearnError::EmptyCompletion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatRole;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers one HTTP request with `status` and `body`, returning the raw
    /// request it received.
    async fn respond_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                received.extend_from_slice(&chunk[..n]);
                if n == 0 || request_complete(&received) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&received).into_owned()
        });

        (base_url, handle)
    }

    fn request_complete(received: &[u8]) -> bool {
        let text = String::from_utf8_lossy(received);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        body.len() >= length
    }

    fn local_client() -> OpenAIClient {
        OpenAIClient {
            client: Client::builder().no_proxy().build().unwrap(),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::system("be nice"), ChatMessage::user("hi")];
        let body = OpenAIRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.3,
            max_tokens: None,
            response_format: Some(ResponseFormat {
                kind: "json_object",
            }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["response_format"]["type"], "json_object");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_endpoint_error_message_prefers_error_body() {
        assert_eq!(
            endpoint_error_message(r#"{"error":{"message":"Invalid API key"}}"#),
            "Invalid API key"
        );
        assert_eq!(endpoint_error_message("upstream down"), "upstream down");
        assert_eq!(endpoint_error_message(""), "Failed to generate response");
    }

    #[test]
    fn test_first_content() {
        let response: OpenAIResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Hello!"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_content(response).unwrap(), "Hello!");

        let empty: OpenAIResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(first_content(empty), Err(LearnError::EmptyCompletion)));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let client = OpenAIClient::new();
        let request = ChatRequest::text(vec![ChatMessage::user("hi")], 0.7, Some(10));
        let err = client
            .complete(&CompletionConfig::default(), &request)
            .await
            .unwrap_err();
        assert!(err.is_missing_credentials());
        assert_eq!(request.messages[0].role, ChatRole::User);
    }

    #[tokio::test]
    async fn test_complete_posts_json_request() {
        let (base_url, server) = respond_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"question\":\"2+2?\",\"correctAnswer\":\"4\"}"}}]}"#,
        )
        .await;
        let config = CompletionConfig::new(Some("sk-test".into()), Some(base_url));
        let request = ChatRequest::json(vec![ChatMessage::system("make a riddle")], 0.7);

        let content = local_client().complete(&config, &request).await.unwrap();
        assert_eq!(content, r#"{"question":"2+2?","correctAnswer":"4"}"#);

        let received = server.await.unwrap();
        let (head, body) = received.split_once("\r\n\r\n").unwrap();
        assert!(head.starts_with("POST /v1/chat/completions HTTP/1.1"));
        assert!(head
            .lines()
            .any(|line| line.eq_ignore_ascii_case("authorization: Bearer sk-test")));

        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[tokio::test]
    async fn test_complete_maps_error_body_to_endpoint() {
        let (base_url, server) = respond_once(
            "401 Unauthorized",
            r#"{"error":{"message":"Invalid API key"}}"#,
        )
        .await;
        let config = CompletionConfig::new(Some("sk-bad".into()), Some(base_url));
        let request = ChatRequest::text(vec![ChatMessage::user("hi")], 0.7, Some(500));

        let err = local_client().complete(&config, &request).await.unwrap_err();
        match err {
            LearnError::Endpoint { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("expected endpoint error, got {:?}", other),
        }

        let received = server.await.unwrap();
        let (_, body) = received.split_once("\r\n\r\n").unwrap();
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert!(json.get("response_format").is_none());
        assert_eq!(json["max_tokens"], 500);
    }
}
