//! Turning a stream-online event into posts.
use herald_common::Network;
use herald_llm::traits::LlmClient;
use herald_social::Poster;
use herald_social::twitch::Video;
use serde::Serialize;
use std::sync::Arc;

pub const STREAM_ONLINE: &str = "stream.online";

pub const SYSTEM_PROMPT: &str = "You write short, upbeat social media posts announcing that a \
Twitch stream just went live. Use the stream title and description you are given. Keep it \
under 280 characters, use at most two hashtags, and do not invent details. Reply with the \
post text only.";

const FALLBACK: &str = "🔴 We're live!

{title}

Come hang out, say hi in chat and bring snacks.

{url}";

/// Remove empty and whitespace-only lines, then trim the whole text.
pub fn strip_blank_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

pub fn user_prompt(video: &Video, channel_url: Option<&str>) -> String {
    let mut prompt = format!(
        "Title: {}\nDescription: {}",
        video.title.trim(),
        video.description.trim()
    );
    if let Some(url) = channel_url {
        prompt.push_str("\nChannel: ");
        prompt.push_str(url);
    }
    prompt
}

/// Canned post used when the model has nothing to say.
pub fn fallback_post(video: &Video, channel_url: Option<&str>) -> String {
    strip_blank_lines(
        &FALLBACK
            .replace("{title}", video.title.trim())
            .replace("{url}", channel_url.unwrap_or_default()),
    )
}

/// Generate the post text. Never fails: a model error or an empty answer
/// falls back to the template.
pub async fn compose(llm: &dyn LlmClient, video: &Video, channel_url: Option<&str>) -> String {
    let prompt = user_prompt(video, channel_url);
    match llm.generate(&prompt, Some(SYSTEM_PROMPT)).await {
        Ok(Some(resp)) => {
            let text = strip_blank_lines(&resp.text);
            if !text.is_empty() {
                tracing::info!(model = llm.model_name(), tokens = ?resp.tokens_used, "announce.text.generated");
                return text;
            }
            tracing::warn!(model = llm.model_name(), "announce.text.blank");
        }
        Ok(None) => tracing::warn!(model = llm.model_name(), "announce.text.empty"),
        Err(e) => tracing::warn!(model = llm.model_name(), error = %e, "announce.text.failed"),
    }
    fallback_post(video, channel_url)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnounceStatus {
    Announced,
    Partial,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostResult {
    pub network: Network,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnounceReport {
    pub status: AnnounceStatus,
    pub text: String,
    pub results: Vec<PostResult>,
}

/// Post `text` to every network in order. Every poster runs regardless of
/// earlier failures; each failure is logged and recorded in the report.
pub async fn publish(posters: &[Arc<dyn Poster>], text: &str) -> AnnounceReport {
    let mut results = Vec::with_capacity(posters.len());
    for poster in posters {
        let network = poster.network();
        let result = match poster.post(text).await {
            Ok(receipt) => PostResult {
                network,
                ok: true,
                id: Some(receipt.id),
                error: None,
            },
            Err(e) => {
                tracing::error!(%network, error = %e, "announce.post.failed");
                PostResult {
                    network,
                    ok: false,
                    id: None,
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(result);
    }

    let ok = results.iter().filter(|r| r.ok).count();
    let status = if ok == results.len() {
        AnnounceStatus::Announced
    } else if ok == 0 {
        AnnounceStatus::Failed
    } else {
        AnnounceStatus::Partial
    };
    tracing::info!(?status, posted = ok, attempted = results.len(), "announce.done");

    AnnounceReport {
        status,
        text: text.to_string(),
        results,
    }
}
