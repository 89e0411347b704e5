//! OpenAI-Compatible Provider
//!
//! Implementation of the ChatModel trait for OpenAI's chat-completions API
//! and any endpoint that speaks the same wire format. Structured output
//! uses the `json_schema` response format.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::provider::{missing_api_key_error, parse_http_error, ChatModel};
use super::schema::SchemaDescriptor;
use super::types::{ChatCompletion, ChatRequest, ModelConfig, ModelError, ModelResult, UsageStats};

/// Default OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-compatible chat model
pub struct OpenAIChatModel {
    config: ModelConfig,
    client: reqwest::Client,
}

impl OpenAIChatModel {
    /// Create a new provider with the given configuration
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Resolve the chat-completions endpoint.
    ///
    /// `base_url` is the API root (e.g., `https://api.example.com/v1`);
    /// the chat-completions path is appended to it.
    fn endpoint(&self) -> ModelResult<String> {
        match &self.config.base_url {
            Some(base) => {
                let joined = format!("{}/chat/completions", base.trim_end_matches('/'));
                let url = Url::parse(&joined).map_err(|e| ModelError::InvalidRequest {
                    message: format!("Invalid base URL {}: {}", base, e),
                })?;
                Ok(url.to_string())
            }
            None => Ok(OPENAI_API_URL.to_string()),
        }
    }

    /// Build the request body for the API
    fn build_request_body(&self, request: &ChatRequest) -> Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "stream": false,
        });

        let mut messages: Vec<Value> = Vec::new();
        if let Some(system) = &request.system {
            messages.push(serde_json::json!({
                "role": "system",
                "content": system
            }));
        }
        messages.push(serde_json::json!({
            "role": "user",
            "content": request.prompt
        }));
        body["messages"] = serde_json::json!(messages);

        body
    }

    /// POST a request body and parse the wire response.
    async fn post_chat(&self, body: &Value) -> ModelResult<WireResponse> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("openai"))?;
        let endpoint = self.endpoint()?;
        tracing::debug!("openai chat POST {}", endpoint);

        let response = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(|e| ModelError::NetworkError {
            message: e.to_string(),
        })?;

        if status != 200 {
            tracing::warn!("openai API error: HTTP {} from {}: {}", status, endpoint, body_text);
            return Err(parse_http_error(status, &body_text, "openai"));
        }

        serde_json::from_str(&body_text).map_err(|e| ModelError::ParseError {
            message: format!("Failed to parse response: {}", e),
        })
    }

    /// Convert a wire response into the unified completion type.
    fn to_completion(&self, response: WireResponse) -> ChatCompletion {
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.clone())
            .unwrap_or_default();

        let usage = response
            .usage
            .map(|u| UsageStats {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        ChatCompletion {
            content,
            model: response.model.unwrap_or_else(|| self.config.model.clone()),
            usage,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, request: ChatRequest) -> ModelResult<ChatCompletion> {
        let body = self.build_request_body(&request);
        let response = self.post_chat(&body).await?;
        Ok(self.to_completion(response))
    }

    async fn invoke_structured(
        &self,
        schema: &SchemaDescriptor,
        request: ChatRequest,
    ) -> ModelResult<Value> {
        let mut body = self.build_request_body(&request);
        body["response_format"] = serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "schema": schema.schema,
                "strict": false,
            }
        });

        let response = self.post_chat(&body).await?;
        let completion = self.to_completion(response);
        if completion.content.trim().is_empty() {
            return Err(ModelError::ParseError {
                message: "structured response had empty content".to_string(),
            });
        }

        serde_json::from_str(&completion.content).map_err(|e| ModelError::ParseError {
            message: format!("structured response was not valid JSON: {}", e),
        })
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }
}

// ============================================================================
// Wire Format
// ============================================================================

#[derive(Debug, Deserialize)]
struct WireResponse {
    model: Option<String>,
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: Option<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
