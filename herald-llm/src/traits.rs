use async_trait::async_trait;
use herald_common::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run a chat completion.
    ///
    /// `Ok(None)` means the provider answered but produced no text (null or
    /// blank result). Callers decide what to do instead.
    async fn chat(&self, request: &ChatRequest) -> Result<Option<LlmResponse>>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// Single-turn convenience over [`LlmClient::chat`].
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<Option<LlmResponse>> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));
        self.chat(&ChatRequest::new(messages)).await
    }
}

/// Treat whitespace-only completions as no completion.
pub(crate) fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Echo {
        seen: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl LlmClient for Echo {
        async fn chat(&self, request: &ChatRequest) -> Result<Option<LlmResponse>> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(None)
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn generate_puts_system_prompt_first() {
        let llm = Echo {
            seen: Mutex::new(Vec::new()),
        };
        llm.generate("hello", Some("be brief")).await.unwrap();

        let seen = llm.seen.lock().unwrap();
        assert_eq!(
            seen[0].messages,
            vec![ChatMessage::system("be brief"), ChatMessage::user("hello")]
        );
    }

    #[test]
    fn request_omits_unset_knobs() {
        let req = ChatRequest::new(vec![ChatMessage::user("hi")]);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"messages": [{"role": "user", "content": "hi"}]})
        );
    }

    #[test]
    fn blank_text_is_none() {
        assert_eq!(non_blank(Some(" \n ".into())), None);
        assert_eq!(non_blank(Some("hi".into())).as_deref(), Some("hi"));
    }
}
