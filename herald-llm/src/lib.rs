//! Provider-agnostic LLM integration for Herald.
//!
//! This crate exposes a common [`traits::LlmClient`] interface and concrete
//! provider implementations for Cloudflare Workers AI (optionally routed
//! through an AI Gateway) and OpenAI-compatible chat completions.
//! [`client_from_config`] builds the right one from a [`LlmConfig`].
//!
//! # Examples
//! ```no_run
//! use herald_config::LlmConfig;
//! use herald_llm::client_from_config;
//!
//! # fn main() -> herald_common::Result<()> {
//! let cfg = LlmConfig::Openai {
//!     api_key: "sk-test".into(),
//!     model: "gpt-4o-mini".into(),
//!     endpoint: "https://api.openai.com/v1".into(),
//!     max_tokens: None,
//!     temperature: None,
//! };
//! let client = client_from_config(&cfg)?;
//! assert_eq!(client.model_name(), "gpt-4o-mini");
//! # Ok(())
//! # }
//! ```
pub mod openai;
pub mod traits;
pub mod workers_ai;

use herald_config::LlmConfig;
use openai::OpenAiClient;
use std::sync::Arc;
use traits::LlmClient;
use workers_ai::{Gateway, WorkersAiClient};

pub use traits::{ChatMessage, ChatRequest, LlmResponse, Role};

/// Build the configured provider client.
pub fn client_from_config(
    config: &LlmConfig,
) -> herald_common::Result<Arc<dyn LlmClient>> {
    match config {
        LlmConfig::WorkersAi {
            account_id,
            api_token,
            model,
            api_base,
            gateway,
            max_tokens,
            temperature,
        } => {
            let client = match gateway {
                Some(gw) => WorkersAiClient::via_gateway(
                    &Gateway {
                        base: gw.base.clone(),
                        id: gw.id.clone(),
                        skip_cache: gw.skip_cache,
                        cache_ttl: gw.cache_ttl,
                    },
                    account_id,
                    api_token.clone(),
                    model.clone(),
                )?,
                None => {
                    WorkersAiClient::new(api_base, account_id, api_token.clone(), model.clone())?
                }
            };
            tracing::info!(model = %model, gateway = gateway.is_some(), "llm.workers_ai.ready");
            Ok(Arc::new(client.with_defaults(*max_tokens, *temperature)))
        }
        LlmConfig::Openai {
            api_key,
            model,
            endpoint,
            max_tokens,
            temperature,
        } => {
            let client = OpenAiClient::new(endpoint, api_key.clone(), model.clone())?
                .with_defaults(*max_tokens, *temperature);
            tracing::info!(model = %model, "llm.openai.ready");
            Ok(Arc::new(client))
        }
    }
}
