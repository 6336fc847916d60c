use crate::traits::{non_blank, ChatMessage, ChatRequest, LlmClient, LlmResponse};
use async_trait::async_trait;
use herald_common::{HeraldError, Result};
use herald_http::HttpClient;
use serde::{Deserialize, Serialize};

pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct CompletionsRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionsResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

impl OpenAiClient {
    /// Create a client for any OpenAI-compatible `chat/completions` endpoint.
    pub fn new(endpoint: &str, api_key: String, model: String) -> Result<Self> {
        let client = HttpClient::new(endpoint)
            .map_err(|e| HeraldError::Config(format!("openai endpoint: {e}")))?
            .with_retries(0);

        Ok(Self {
            client,
            api_key,
            model,
            max_tokens: None,
            temperature: None,
        })
    }

    pub fn with_defaults(mut self, max_tokens: Option<u32>, temperature: Option<f32>) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(&self, request: &ChatRequest) -> Result<Option<LlmResponse>> {
        let req = CompletionsRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens.or(self.max_tokens),
            temperature: request.temperature.or(self.temperature),
        };

        let resp: CompletionsResponse = self
            .client
            .post_json("chat/completions", Some(&self.api_key), &req)
            .await
            .map_err(|e| HeraldError::upstream("openai", e))?;

        let tokens_used = resp.usage.and_then(|u| u.total_tokens);
        let model = resp.model.or_else(|| Some(self.model.clone()));
        let text = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);

        Ok(non_blank(text).map(|text| LlmResponse {
            text,
            model,
            tokens_used,
        }))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
