use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::clients::traits::{GenerationError, GenerationRequest, TextGenerator};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Chat-completions client for OpenRouter (or any OpenAI-compatible endpoint)
#[derive(Clone, Debug)]
pub struct OpenRouterClient {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl OpenRouterClient {
    /// `timeout` is `None` by default: a hung provider hangs the run.
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, GenerationError> {
        let endpoint = if base_url.ends_with("/chat/completions") {
            base_url.to_string()
        } else {
            format!("{}/chat/completions", base_url.trim_end_matches('/'))
        };

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GenerationError::Http(format!("build http client: {}", e)))?;

        Ok(Self {
            endpoint,
            api_key: api_key.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for OpenRouterClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = request_body(request);

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Http(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let text = res.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body: text });
        }

        let response_json: Value = res
            .json()
            .await
            .map_err(|e| GenerationError::ParseError(e.to_string()))?;

        completion_text(&response_json)
    }
}

/// Model ids are accepted with a routing prefix (`openrouter/google/...`); the
/// API itself wants the bare vendor path.
pub fn normalize_model(model: &str) -> &str {
    model.strip_prefix("openrouter/").unwrap_or(model)
}

fn request_body(request: &GenerationRequest) -> Value {
    let mut messages = Vec::new();
    if let Some(system) = &request.system {
        messages.push(json!({"role": "system", "content": system}));
    }
    messages.push(json!({"role": "user", "content": request.prompt}));

    json!({
        "model": normalize_model(&request.model),
        "messages": messages,
        "temperature": request.temperature,
    })
}

fn completion_text(response: &Value) -> Result<String, GenerationError> {
    if let Some(err) = response.get("error") {
        let message = err["message"].as_str().unwrap_or("unknown provider error");
        return Err(GenerationError::ParseError(message.to_string()));
    }
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .ok_or(GenerationError::EmptyResponse)?
        .trim()
        .to_string();
    if content.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            model: "openrouter/google/gemini-2.5-flash-lite".into(),
            system: Some("You are The Builder.".into()),
            prompt: "Build it".into(),
            temperature: 0.7,
        }
    }

    #[test]
    fn test_endpoint_appends_path_once() {
        let a = OpenRouterClient::new("k", "https://openrouter.ai/api/v1/", None).unwrap();
        assert_eq!(a.endpoint(), "https://openrouter.ai/api/v1/chat/completions");
        let b = OpenRouterClient::new("k", "http://127.0.0.1:8111/v1/chat/completions", None)
            .unwrap();
        assert_eq!(b.endpoint(), "http://127.0.0.1:8111/v1/chat/completions");
    }

    #[test]
    fn test_request_body_strips_routing_prefix() {
        let body = request_body(&request());
        assert_eq!(body["model"], "google/gemini-2.5-flash-lite");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Build it");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_request_body_without_system() {
        let mut req = request();
        req.system = None;
        let body = request_body(&req);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_completion_text_extracts_content() {
        let v = json!({"choices": [{"message": {"content": "  1. Dream Radio \n"}}]});
        assert_eq!(completion_text(&v).unwrap(), "1. Dream Radio");
    }

    #[test]
    fn test_completion_text_errors() {
        assert!(matches!(
            completion_text(&json!({"choices": []})),
            Err(GenerationError::EmptyResponse)
        ));
        assert!(matches!(
            completion_text(&json!({"error": {"message": "rate limited"}})),
            Err(GenerationError::ParseError(m)) if m == "rate limited"
        ));
    }
}
