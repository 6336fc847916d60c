//! Cloudflare Workers AI text generation, direct or through an AI Gateway.
use crate::traits::{non_blank, ChatRequest, LlmClient, LlmResponse};
use async_trait::async_trait;
use herald_common::{HeraldError, Result};
use herald_http::header::{HeaderMap, HeaderName, HeaderValue};
use herald_http::{HttpClient, RequestOpts};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "workers-ai";

/// AI Gateway routing. Requests go to
/// `{base}/{account}/{id}/workers-ai/{model}` instead of the REST API.
#[derive(Debug, Clone)]
pub struct Gateway {
    pub base: String,
    pub id: String,
    pub skip_cache: bool,
    pub cache_ttl: Option<u64>,
}

pub struct WorkersAiClient {
    client: HttpClient,
    path: String,
    headers: HeaderMap,
    api_token: String,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct RunRequest<'a> {
    messages: &'a [crate::traits::ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct RunEnvelope {
    #[serde(default)]
    pub result: Option<RunResult>,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct RunResult {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

impl WorkersAiClient {
    /// Client for the REST endpoint `{api_base}/accounts/{account}/ai/run/{model}`.
    pub fn new(api_base: &str, account_id: &str, api_token: String, model: String) -> Result<Self> {
        let client = HttpClient::new(api_base)
            .map_err(|e| HeraldError::Config(format!("workers ai base url: {e}")))?
            .with_retries(0);
        Ok(Self {
            client,
            path: format!("accounts/{account_id}/ai/run/{model}"),
            headers: HeaderMap::new(),
            api_token,
            model,
            max_tokens: None,
            temperature: None,
        })
    }

    /// Client that routes through an AI Gateway.
    pub fn via_gateway(
        gateway: &Gateway,
        account_id: &str,
        api_token: String,
        model: String,
    ) -> Result<Self> {
        let client = HttpClient::new(&gateway.base)
            .map_err(|e| HeraldError::Config(format!("ai gateway base url: {e}")))?
            .with_retries(0);

        let mut headers = HeaderMap::new();
        if gateway.skip_cache {
            headers.insert(
                HeaderName::from_static("cf-aig-skip-cache"),
                HeaderValue::from_static("true"),
            );
        }
        if let Some(ttl) = gateway.cache_ttl {
            headers.insert(HeaderName::from_static("cf-aig-cache-ttl"), HeaderValue::from(ttl));
        }

        Ok(Self {
            client,
            path: format!("{account_id}/{}/workers-ai/{model}", gateway.id),
            headers,
            api_token,
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
impl LlmClient for WorkersAiClient {
    async fn chat(&self, request: &ChatRequest) -> Result<Option<LlmResponse>> {
        let body = RunRequest {
            messages: &request.messages,
            max_tokens: request.max_tokens.or(self.max_tokens),
            temperature: request.temperature.or(self.temperature),
        };

        let env: RunEnvelope = self
            .client
            .post_json_opts(
                &self.path,
                &body,
                RequestOpts {
                    auth: Some(herald_http::Auth::Bearer(&self.api_token)),
                    headers: (!self.headers.is_empty()).then(|| self.headers.clone()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| HeraldError::upstream(SERVICE, e))?;

        if !env.success {
            let message = env
                .errors
                .iter()
                .map(|e| match e.code {
                    Some(code) => format!("{code}: {}", e.message),
                    None => e.message.clone(),
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(HeraldError::upstream(SERVICE, message));
        }

        let Some(result) = env.result else {
            tracing::debug!(model = %self.model, "llm.workers_ai.no_result");
            return Ok(None);
        };
        let tokens_used = result.usage.and_then(|u| u.total_tokens);

        Ok(non_blank(result.response).map(|text| LlmResponse {
            text,
            model: Some(self.model.clone()),
            tokens_used,
        }))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
